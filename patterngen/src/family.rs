use serde::Deserialize;

use crate::bitmap::MarkerBitmap;
use crate::error::{LayoutError, MarkerError};
use crate::layout::Layout;
use crate::render;

/// Serde-driven family configuration matching the TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct FamilyConfig {
    pub name: String,
    pub min_hamming: u32,
    /// Generation parameter carried by some family files; informational here.
    #[serde(default)]
    pub min_complexity: Option<u32>,
    pub layout: LayoutConfig,
}

/// Layout configuration variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutConfig {
    Classic { grid_size: usize },
    Custom { grid_size: usize, data: String },
}

/// JSON family file: the config fields plus the code list.
#[derive(Debug, Deserialize)]
struct FamilyDocument {
    #[serde(flatten)]
    config: FamilyConfig,
    codes: Vec<u64>,
}

/// A loaded AprilTag family: config, layout, and codes.
#[derive(Debug, Clone)]
pub struct TagFamily {
    pub config: FamilyConfig,
    pub layout: Layout,
    pub codes: Vec<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum FamilyError {
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("invalid binary data: {0}")]
    InvalidBin(String),
    #[error("family {0} uses a reversed-border layout, which cannot be printed as a bordered grid marker")]
    UnsupportedLayout(String),
    #[error("family {0} has no codes")]
    Empty(String),
    #[error("family {name} has {nbits} data bits; codes are 64-bit")]
    TooManyBits { name: String, nbits: usize },
}

impl TagFamily {
    /// Construct a family from a parsed config and its codes.
    pub fn from_config_and_codes(
        config: FamilyConfig,
        codes: Vec<u64>,
    ) -> Result<TagFamily, FamilyError> {
        let layout = match &config.layout {
            LayoutConfig::Classic { grid_size } => Layout::classic(*grid_size)?,
            LayoutConfig::Custom { data, .. } => Layout::from_data_string(data)?,
        };
        if layout.reversed_border {
            return Err(FamilyError::UnsupportedLayout(config.name));
        }
        if layout.nbits > 64 {
            return Err(FamilyError::TooManyBits {
                name: config.name,
                nbits: layout.nbits,
            });
        }
        if codes.is_empty() {
            return Err(FamilyError::Empty(config.name));
        }
        Ok(TagFamily {
            config,
            layout,
            codes,
        })
    }

    /// Parse a TOML config string and binary code data into a family.
    pub fn from_toml_and_bin(toml_str: &str, bin_data: &[u8]) -> Result<TagFamily, FamilyError> {
        let config: FamilyConfig =
            toml::from_str(toml_str).map_err(|e| FamilyError::Config(e.to_string()))?;
        let codes = parse_bin_codes(bin_data)?;
        TagFamily::from_config_and_codes(config, codes)
    }

    /// Parse a single JSON document holding the config and a `codes` array.
    pub fn from_json(json: &str) -> Result<TagFamily, FamilyError> {
        let doc: FamilyDocument =
            serde_json::from_str(json).map_err(|e| FamilyError::Config(e.to_string()))?;
        TagFamily::from_config_and_codes(doc.config, doc.codes)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Bordered bitmap for marker `id`.
    pub fn render(&self, id: u32) -> Result<MarkerBitmap, MarkerError> {
        let code = self
            .codes
            .get(id as usize)
            .ok_or_else(|| MarkerError::IdOutOfRange {
                family: self.config.name.clone(),
                id,
                count: self.codes.len(),
            })?;
        let tag = render::render(&self.layout, *code);
        MarkerBitmap::from_rendered(&tag, &self.layout)
    }
}

/// Parse a binary code file (flat array of little-endian u64).
fn parse_bin_codes(data: &[u8]) -> Result<Vec<u64>, FamilyError> {
    if !data.len().is_multiple_of(8) {
        return Err(FamilyError::InvalidBin(format!(
            "binary data length {} is not a multiple of 8",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect())
}

/// Canonical family name: `36h11` and `tag36h11` both become `tag36h11`.
pub fn canonical_name(code: &str) -> String {
    let code = code.trim();
    if code.starts_with("tag") {
        code.to_string()
    } else {
        format!("tag{code}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG16H5_TOML: &str = r#"
name = "tag16h5"
min_hamming = 5

[layout]
type = "classic"
grid_size = 8
"#;

    fn bin(codes: &[u64]) -> Vec<u8> {
        codes.iter().flat_map(|c| c.to_le_bytes()).collect()
    }

    #[test]
    fn load_toml_and_bin() {
        let f = TagFamily::from_toml_and_bin(TAG16H5_TOML, &bin(&[0x27c8, 0x31b6])).unwrap();
        assert_eq!(f.name(), "tag16h5");
        assert_eq!(f.config.min_hamming, 5);
        assert_eq!(f.layout.nbits, 16);
        assert_eq!(f.codes, vec![0x27c8, 0x31b6]);
    }

    #[test]
    fn load_json_document() {
        let json = r#"{
            "name": "tag16h5",
            "min_hamming": 5,
            "layout": { "type": "classic", "grid_size": 8 },
            "codes": [10184, 12726]
        }"#;
        let f = TagFamily::from_json(json).unwrap();
        assert_eq!(f.codes, vec![0x27c8, 0x31b6]);
        assert_eq!(f.layout.grid_size, 8);
    }

    #[test]
    fn render_in_and_out_of_range() {
        let f = TagFamily::from_toml_and_bin(TAG16H5_TOML, &bin(&[0x27c8])).unwrap();
        let bm = f.render(0).unwrap();
        assert_eq!(bm.size(), 6);
        assert_eq!(bm.payload_size(), 4);
        assert!(matches!(
            f.render(1),
            Err(MarkerError::IdOutOfRange { id: 1, count: 1, .. })
        ));
    }

    #[test]
    fn truncated_bin_is_rejected() {
        let err = TagFamily::from_toml_and_bin(TAG16H5_TOML, &[0u8; 12]).unwrap_err();
        assert!(matches!(err, FamilyError::InvalidBin(_)));
    }

    #[test]
    fn empty_code_list_is_rejected() {
        let err = TagFamily::from_toml_and_bin(TAG16H5_TOML, &[]).unwrap_err();
        assert!(matches!(err, FamilyError::Empty(_)));
    }

    #[test]
    fn reversed_border_layout_is_rejected() {
        let toml = r#"
name = "tagStandard41h12"
min_hamming = 12

[layout]
type = "custom"
grid_size = 9
data = "ddddddddddbbbbbbbddbwwwwwbddbwdddwbddbwdddwbddbwdddwbddbwwwwwbddbbbbbbbdddddddddd"
"#;
        let err = TagFamily::from_toml_and_bin(toml, &bin(&[1])).unwrap_err();
        assert!(matches!(err, FamilyError::UnsupportedLayout(_)));
    }

    #[test]
    fn layouts_wider_than_a_code_are_rejected() {
        let toml = r#"
name = "tag81h0"
min_hamming = 1

[layout]
type = "classic"
grid_size = 13
"#;
        let err = TagFamily::from_toml_and_bin(toml, &bin(&[1])).unwrap_err();
        assert!(matches!(err, FamilyError::TooManyBits { nbits: 81, .. }));
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_name("36h11"), "tag36h11");
        assert_eq!(canonical_name("tag36h11"), "tag36h11");
        assert_eq!(canonical_name(" 25h9 "), "tag25h9");
    }
}
