//! Render configuration files.
//!
//! ```toml
//! page = "a4"
//! caption = "lab rig 2"
//!
//! [pattern]
//! kind = "aprilgrid"
//! rows = 6
//! cols = 4
//! family = "36h11"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::ParseOptionError;
use crate::geometry::Page;
use crate::pattern::{draw_footer, render_pattern, PatternConfig, RenderReport};
use crate::source::{AssetSource, MarkerRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Page(#[from] ParseOptionError),
}

/// A page given by name (`"a4"`, `"1200x900"`) or by explicit dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageSetting {
    Named(String),
    Custom(Page),
}

impl Default for PageSetting {
    fn default() -> Self {
        PageSetting::Named("a4".to_string())
    }
}

impl PageSetting {
    pub fn resolve(&self) -> Result<Page, ParseOptionError> {
        match self {
            PageSetting::Named(name) => name.parse(),
            PageSetting::Custom(page) => Ok(*page),
        }
    }
}

fn default_footer() -> bool {
    true
}

/// Everything needed to render one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub page: PageSetting,
    /// Overrides the named page's margin.
    #[serde(default)]
    pub margin: Option<f64>,
    /// Directory holding family files and the bitmap database.
    #[serde(default)]
    pub assets: Option<PathBuf>,
    /// Left footer text.
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default = "default_footer")]
    pub footer: bool,
    pub pattern: PatternConfig,
}

impl RenderConfig {
    pub fn new(pattern: PatternConfig) -> Self {
        Self {
            page: PageSetting::default(),
            margin: None,
            assets: None,
            caption: None,
            footer: true,
            pattern,
        }
    }

    /// Load from a `.toml` or `.json` file (TOML for any other extension).
    pub fn load(path: &Path) -> Result<RenderConfig, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            RenderConfig::from_json(&text)
        } else {
            RenderConfig::from_toml(&text)
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(text: &str) -> Result<RenderConfig, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn from_json(text: &str) -> Result<RenderConfig, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    pub fn page(&self) -> Result<Page, ParseOptionError> {
        let page = self.page.resolve()?;
        Ok(match self.margin {
            Some(m) => page.with_margin(m),
            None => page,
        })
    }

    /// Draw the pattern and, when enabled, the footer.
    pub fn render<S, C>(
        &self,
        registry: &mut MarkerRegistry<S>,
        canvas: &mut C,
    ) -> Result<RenderReport, ConfigError>
    where
        S: AssetSource,
        C: Canvas + ?Sized,
    {
        let page = self.page()?;
        let report = render_pattern(&self.pattern, registry, &page, canvas);
        if self.footer {
            let summary = self.pattern.summary(page.unit);
            draw_footer(canvas, &page, self.caption.as_deref(), &summary);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Unit;
    use crate::pattern::AprilGridSpec;

    #[test]
    fn toml_config() {
        let cfg = RenderConfig::from_toml(
            r#"
page = "a4-landscape"
caption = "rig 2"

[pattern]
kind = "aprilgrid"
rows = 3
cols = 5
family = "tag25h9"
traversal = "snake-rtl-first"
origin = "BL"
"#,
        )
        .unwrap();
        let page = cfg.page().unwrap();
        assert_eq!((page.width, page.height), (297.0, 210.0));
        assert!(cfg.footer);
        match &cfg.pattern {
            PatternConfig::Aprilgrid(s) => {
                assert_eq!((s.rows, s.cols), (3, 5));
                assert_eq!(s.family, "tag25h9");
                assert_eq!(s.tag_size, AprilGridSpec::default().tag_size);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn json_config_with_custom_page() {
        let cfg = RenderConfig::from_json(
            r#"{
                "page": {"width": 800, "height": 600, "unit": "px"},
                "footer": false,
                "pattern": {"kind": "charuco", "dictionary": "6x6_250", "marker_ratio": 0.6}
            }"#,
        )
        .unwrap();
        let page = cfg.page().unwrap();
        assert_eq!(page.unit, Unit::Px);
        assert_eq!(page.margin, 0.0);
        assert!(!cfg.footer);
    }

    #[test]
    fn bad_page_name() {
        let mut cfg = RenderConfig::new(PatternConfig::Checker(Default::default()));
        cfg.page = PageSetting::Named("b5".into());
        assert!(cfg.page().is_err());
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, r#"{"pattern": {"kind": "checker"}}"#).unwrap();
        let cfg = RenderConfig::load(&path).unwrap();
        assert_eq!(cfg.pattern.kind(), "checker");

        let missing = RenderConfig::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
