use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default library root, relative to the working directory.
pub const DEFAULT_ROOT: &str = "SPEX-PRISM";
/// Default index file name inside the library root.
pub const DEFAULT_INDEX_FILE: &str = "spectral_data.json";

/// Where the library lives and how the index is loaded.
///
/// Passed explicitly to [`crate::data::library::SpexLibrary`]; the library
/// never consults the environment on its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding the index and every spectrum container.
    pub root: PathBuf,
    /// Index file name, relative to `root`.
    pub index_file: String,
    /// Load the index once and reuse it for the lifetime of the library
    /// handle.  The index file is then assumed immutable.
    pub cache_index: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            cache_index: false,
        }
    }
}

impl LibraryConfig {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    pub fn with_cache_index(mut self, cache: bool) -> Self {
        self.cache_index = cache;
        self
    }

    /// Full path of the serialized index.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    /// Full path of a spectrum container named in the index.
    pub fn spectrum_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a config from `SPEX_PRISM_ROOT`, `SPEX_PRISM_INDEX` and
    /// `SPEX_PRISM_CACHE_INDEX`, falling back to defaults.  Meant for the
    /// binaries.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup("SPEX_PRISM_ROOT").filter(|s| !s.is_empty()) {
            config.root = PathBuf::from(root);
        }
        if let Some(index) = lookup("SPEX_PRISM_INDEX").filter(|s| !s.is_empty()) {
            config.index_file = index;
        }
        if let Some(flag) = lookup("SPEX_PRISM_CACHE_INDEX") {
            let flag = flag.trim().to_ascii_lowercase();
            config.cache_index = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_points_at_spex_prism_dir() {
        let config = LibraryConfig::default();
        assert_eq!(config.index_path(), Path::new("SPEX-PRISM/spectral_data.json"));
        assert_eq!(
            config.spectrum_path("spex_L2.parquet"),
            Path::new("SPEX-PRISM/spex_L2.parquet")
        );
        assert!(!config.cache_index);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("SPEX_PRISM_ROOT", "/data/spex"),
            ("SPEX_PRISM_INDEX", "types.json"),
            ("SPEX_PRISM_CACHE_INDEX", "TRUE"),
        ]
        .into_iter()
        .collect();
        let config = LibraryConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.index_path(), Path::new("/data/spex/types.json"));
        assert!(config.cache_index);
    }

    #[test]
    fn empty_values_keep_defaults() {
        let config = LibraryConfig::from_lookup(|_| Some(String::new()));
        assert_eq!(config.root, PathBuf::from(DEFAULT_ROOT));
        assert_eq!(config.index_file, DEFAULT_INDEX_FILE);
        assert!(!config.cache_index);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: LibraryConfig =
            serde_json::from_str(r#"{ "root": "lib", "cache_index": true }"#).unwrap();
        assert_eq!(config.root, PathBuf::from("lib"));
        assert_eq!(config.index_file, DEFAULT_INDEX_FILE);
        assert!(config.cache_index);
    }
}
