//! Where marker data comes from, and the registry that caches it.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::bitmap::MarkerBitmap;
use crate::dictionary::{ArucoDictionary, BitmapDb};
use crate::error::MarkerError;
use crate::family::{canonical_name, FamilyError, TagFamily};
use crate::marker::{ArucoFamily, MarkerFamily};
use crate::synth::{SyntheticFamily, FALLBACK_APRILTAG_SIZE};

/// File name of the ArUco bitmap database.
pub const BITMAP_DB_NAME: &str = "aruco_bitmaps.json";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("asset {0} not found")]
    NotFound(String),

    #[error("asset name {0:?} is not a plain file name")]
    InvalidName(String),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A named store of asset bytes.
pub trait AssetSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, SourceError>;

    /// Names of the assets this source can list; empty if it cannot.
    fn names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Assets read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, SourceError> {
        if !is_plain_name(name) {
            return Err(SourceError::InvalidName(name.to_string()));
        }
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(name.to_string()),
            _ => SourceError::Io { path, source: e },
        })
    }

    fn names(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}

/// One path component: no separators, no `.` or `..`.
fn is_plain_name(name: &str) -> bool {
    let mut parts = Path::new(name).components();
    matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None))
        && !name.contains(['/', '\\'])
}

/// Assets held in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(name.into(), bytes.into());
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, SourceError> {
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.assets.keys().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{name} is not valid UTF-8")]
    Utf8 { name: String },

    #[error("{name}: {source}")]
    Family {
        name: String,
        #[source]
        source: FamilyError,
    },

    #[error("{name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A marker family ready to render, whichever way it was obtained.
#[derive(Debug, Clone)]
pub enum ResolvedFamily {
    Tag(Arc<TagFamily>),
    Aruco(ArucoFamily),
    Synthetic(SyntheticFamily),
}

impl ResolvedFamily {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ResolvedFamily::Synthetic(_))
    }
}

impl MarkerFamily for ResolvedFamily {
    fn name(&self) -> &str {
        match self {
            ResolvedFamily::Tag(f) => f.name(),
            ResolvedFamily::Aruco(f) => MarkerFamily::name(f),
            ResolvedFamily::Synthetic(f) => f.name(),
        }
    }

    fn render(&self, id: u32) -> Result<MarkerBitmap, MarkerError> {
        match self {
            ResolvedFamily::Tag(f) => f.render(id),
            ResolvedFamily::Aruco(f) => MarkerFamily::render(f, id),
            ResolvedFamily::Synthetic(f) => f.render(id),
        }
    }
}

#[derive(Debug, Clone)]
enum DbState {
    Loaded(Arc<BitmapDb>),
    Unavailable(String),
}

/// Snapshot of what the registry managed to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RegistryStatus {
    /// Canonical names of the cached AprilTag families.
    pub families: Vec<String>,
    /// `None` until the database has been requested.
    pub bitmap_db_loaded: Option<bool>,
    pub april_fallback: bool,
    pub aruco_fallback: bool,
    pub warnings: Vec<String>,
}

/// Loads marker data from an [`AssetSource`] and memoizes it.
///
/// Loaded families are cached for the life of the registry; failed loads
/// are retried on the next request.
pub struct MarkerRegistry<S> {
    source: S,
    families: HashMap<String, Arc<TagFamily>>,
    bitmap_db: Option<DbState>,
    april_fallback: bool,
    aruco_fallback: bool,
    warnings: Vec<String>,
}

impl<S: AssetSource> MarkerRegistry<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            families: HashMap::new(),
            bitmap_db: None,
            april_fallback: false,
            aruco_fallback: false,
            warnings: Vec::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Give back the source, dropping everything cached from it.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Load (or fetch from cache) the AprilTag family named `code`.
    ///
    /// `<name>.json` is tried first, then `<name>.toml` with `<name>.bin`.
    pub fn ensure_family(&mut self, code: &str) -> Result<Arc<TagFamily>, LoadError> {
        let name = canonical_name(code);
        if !is_plain_name(&name) {
            return Err(SourceError::InvalidName(name).into());
        }
        if let Some(family) = self.families.get(&name) {
            debug!("family {name} served from cache");
            return Ok(Arc::clone(family));
        }

        let family = match self.source.fetch(&format!("{name}.json")) {
            Ok(bytes) => {
                let json = utf8(bytes, &format!("{name}.json"))?;
                TagFamily::from_json(&json).map_err(|source| LoadError::Family {
                    name: format!("{name}.json"),
                    source,
                })?
            }
            Err(SourceError::NotFound(_)) => {
                let toml_name = format!("{name}.toml");
                let toml = utf8(self.source.fetch(&toml_name)?, &toml_name)?;
                let bin = self.source.fetch(&format!("{name}.bin"))?;
                TagFamily::from_toml_and_bin(&toml, &bin).map_err(|source| LoadError::Family {
                    name: toml_name,
                    source,
                })?
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "loaded family {name}: {} codes, {}x{} grid",
            family.codes.len(),
            family.layout.grid_size,
            family.layout.grid_size
        );
        let family = Arc::new(family);
        self.families.insert(name, Arc::clone(&family));
        Ok(family)
    }

    /// AprilTag family for `code`, or a synthetic stand-in if it cannot be
    /// loaded. Never fails; check [`april_fallback`](Self::april_fallback).
    pub fn load_family(&mut self, code: &str) -> ResolvedFamily {
        match self.ensure_family(code) {
            Ok(family) => {
                self.april_fallback = false;
                ResolvedFamily::Tag(family)
            }
            Err(e) => {
                let name = canonical_name(code);
                warn!("family {name} unavailable, using synthetic markers: {e}");
                self.april_fallback = true;
                self.warnings.push(format!(
                    "AprilTag family {name} could not be loaded ({e}); synthetic markers are shown and will not decode"
                ));
                ResolvedFamily::Synthetic(SyntheticFamily::new(name, FALLBACK_APRILTAG_SIZE))
            }
        }
    }

    /// Whether the most recent [`load_family`](Self::load_family) fell back.
    pub fn april_fallback(&self) -> bool {
        self.april_fallback
    }

    /// The ArUco bitmap database, loaded on first request.
    pub fn bitmap_db(&mut self) -> Option<Arc<BitmapDb>> {
        if self.bitmap_db.is_none() {
            let state = match self.load_bitmap_db() {
                Ok(db) => {
                    info!("loaded {BITMAP_DB_NAME}: {} dictionaries", db.len());
                    DbState::Loaded(Arc::new(db))
                }
                Err(e) => {
                    warn!("bitmap database unavailable: {e}");
                    DbState::Unavailable(e.to_string())
                }
            };
            self.bitmap_db = Some(state);
        }
        match &self.bitmap_db {
            Some(DbState::Loaded(db)) => Some(Arc::clone(db)),
            _ => None,
        }
    }

    fn load_bitmap_db(&self) -> Result<BitmapDb, LoadError> {
        let bytes = self.source.fetch(BITMAP_DB_NAME)?;
        BitmapDb::from_slice(&bytes).map_err(|source| LoadError::Json {
            name: BITMAP_DB_NAME.to_string(),
            source,
        })
    }

    /// Markers of `dict`, from the database when it has the dictionary,
    /// otherwise synthetic markers of the same size and capacity.
    pub fn aruco_family(&mut self, dict: ArucoDictionary) -> ResolvedFamily {
        let reason = match self.bitmap_db() {
            Some(db) if db.contains(dict) => {
                self.aruco_fallback = false;
                return ResolvedFamily::Aruco(ArucoFamily::new(db, dict));
            }
            Some(_) => format!("{BITMAP_DB_NAME} has no {} table", dict.json_key()),
            None => match &self.bitmap_db {
                Some(DbState::Unavailable(e)) => e.clone(),
                _ => "not loaded".to_string(),
            },
        };
        warn!("dictionary {dict} unavailable, using synthetic markers: {reason}");
        self.aruco_fallback = true;
        self.warnings.push(format!(
            "ArUco dictionary {dict} could not be loaded ({reason}); synthetic markers are shown and will not decode"
        ));
        ResolvedFamily::Synthetic(
            SyntheticFamily::new(dict.name(), dict.marker_size() + 2).with_capacity(dict.capacity()),
        )
    }

    /// Whether the most recent [`aruco_family`](Self::aruco_family) fell back.
    pub fn aruco_fallback(&self) -> bool {
        self.aruco_fallback
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Drain the accumulated warnings.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    pub fn status(&self) -> RegistryStatus {
        let mut families: Vec<String> = self.families.keys().cloned().collect();
        families.sort();
        RegistryStatus {
            families,
            bitmap_db_loaded: self
                .bitmap_db
                .as_ref()
                .map(|s| matches!(s, DbState::Loaded(_))),
            april_fallback: self.april_fallback,
            aruco_fallback: self.aruco_fallback,
            warnings: self.warnings.clone(),
        }
    }
}

fn utf8(bytes: Vec<u8>, name: &str) -> Result<String, LoadError> {
    String::from_utf8(bytes).map_err(|_| LoadError::Utf8 {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as Counter;

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

    /// Counts fetches so cache hits are observable.
    struct CountingSource {
        inner: MemorySource,
        fetches: Counter<usize>,
    }

    impl AssetSource for CountingSource {
        fn fetch(&self, name: &str) -> Result<Vec<u8>, SourceError> {
            self.fetches.set(self.fetches.get() + 1);
            self.inner.fetch(name)
        }
    }

    #[test]
    fn family_is_cached() {
        let src = CountingSource {
            inner: MemorySource::new()
                .with("tag16h5.toml", TAG16H5_TOML)
                .with("tag16h5.bin", bin(&[0x27c8, 0x31b6])),
            fetches: Counter::new(0),
        };
        let mut reg = MarkerRegistry::new(src);
        let a = reg.ensure_family("16h5").unwrap();
        let after_first = reg.source().fetches.get();
        let b = reg.ensure_family("tag16h5").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.source().fetches.get(), after_first);
        assert_eq!(reg.status().families, vec!["tag16h5".to_string()]);
    }

    #[test]
    fn missing_family_falls_back() {
        let mut reg = MarkerRegistry::new(MemorySource::new());
        let fam = reg.load_family("36h11");
        assert!(fam.is_fallback());
        assert!(reg.april_fallback());
        assert_eq!(fam.render(0).unwrap().size(), FALLBACK_APRILTAG_SIZE);
        assert_eq!(reg.warnings().len(), 1);
    }

    #[test]
    fn broken_family_falls_back() {
        let src = MemorySource::new()
            .with("tag16h5.toml", TAG16H5_TOML)
            .with("tag16h5.bin", vec![1u8, 2, 3]);
        let mut reg = MarkerRegistry::new(src);
        assert!(matches!(
            reg.ensure_family("16h5"),
            Err(LoadError::Family { .. })
        ));
        assert!(reg.load_family("16h5").is_fallback());
    }

    #[test]
    fn family_wider_than_64_bits_falls_back() {
        let toml = r#"
name = "tag81h0"
min_hamming = 1

[layout]
type = "classic"
grid_size = 13
"#;
        let src = MemorySource::new()
            .with("tag81h0.toml", toml)
            .with("tag81h0.bin", bin(&[1]));
        let mut reg = MarkerRegistry::new(src);
        assert!(matches!(
            reg.ensure_family("81h0"),
            Err(LoadError::Family {
                source: FamilyError::TooManyBits { .. },
                ..
            })
        ));
        let fam = reg.load_family("81h0");
        assert!(fam.is_fallback());
        assert!(fam.render(0).is_ok());
    }

    #[test]
    fn family_codes_cannot_leave_the_asset_root() {
        let mut reg = MarkerRegistry::new(MemorySource::new());
        for code in ["../x", "a/b", "..\\x"] {
            assert!(
                matches!(
                    reg.ensure_family(code),
                    Err(LoadError::Source(SourceError::InvalidName(_)))
                ),
                "{code}"
            );
        }
        assert!(reg.load_family("../x").is_fallback());
    }

    #[test]
    fn successful_load_clears_fallback_flag() {
        let src = MemorySource::new()
            .with("tag16h5.toml", TAG16H5_TOML)
            .with("tag16h5.bin", bin(&[0x27c8]));
        let mut reg = MarkerRegistry::new(src);
        reg.load_family("36h11");
        assert!(reg.april_fallback());
        let fam = reg.load_family("16h5");
        assert!(!fam.is_fallback());
        assert!(!reg.april_fallback());
    }

    #[test]
    fn aruco_uses_database_when_present() {
        let db = r#"{"DICT_4X4_50": {"ids": {"0": [[1,0,1,1],[0,1,0,0],[0,0,1,1],[0,0,1,0]]}}}"#;
        let mut reg = MarkerRegistry::new(MemorySource::new().with(BITMAP_DB_NAME, db));
        let fam = reg.aruco_family(ArucoDictionary::Dict4x4_50);
        assert!(!fam.is_fallback());
        assert!(!reg.aruco_fallback());
        assert_eq!(fam.render(0).unwrap().size(), 6);
        assert!(matches!(fam.render(1), Err(MarkerError::MissingId { id: 1, .. })));

        let other = reg.aruco_family(ArucoDictionary::Dict6x6_250);
        assert!(other.is_fallback());
        assert!(reg.aruco_fallback());
        assert_eq!(other.render(0).unwrap().size(), 8);
        assert_eq!(reg.status().bitmap_db_loaded, Some(true));
    }

    #[test]
    fn aruco_without_database_falls_back() {
        let mut reg = MarkerRegistry::new(MemorySource::new());
        assert_eq!(reg.status().bitmap_db_loaded, None);
        let fam = reg.aruco_family(ArucoDictionary::Dict5x5_100);
        assert!(fam.is_fallback());
        assert_eq!(fam.render(99).unwrap().size(), 7);
        assert!(fam.render(100).is_err());
        assert_eq!(reg.status().bitmap_db_loaded, Some(false));
    }

    #[test]
    fn dir_source_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        let src = DirSource::new(dir.path());
        assert_eq!(src.fetch("a.json").unwrap(), b"{}");
        assert!(matches!(src.fetch("b.json"), Err(SourceError::NotFound(_))));
        assert_eq!(src.names(), vec!["a.json".to_string()]);
        assert!(matches!(
            src.fetch("../a.json"),
            Err(SourceError::InvalidName(_))
        ));
    }
}
