use std::fmt;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SpexError};

// ---------------------------------------------------------------------------
// SpectralIndex – spectral type → ordered filenames
// ---------------------------------------------------------------------------

/// The persisted mapping from spectral-type label to the spectrum files
/// filed under it.
///
/// Entries keep the order in which they appear in the index file; that order
/// is what [`SpectralIndex::list_types`] reports and what reverse lookup
/// scans.  Each filename is expected under at most one type; if that is
/// violated the first type (in file order) wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectralIndex {
    entries: Vec<(String, Vec<String>)>,
}

impl SpectralIndex {
    /// Build an index from `(type, filenames)` pairs, in order.
    ///
    /// Later duplicates of a type label are merged into the first occurrence.
    pub fn from_entries<I, T, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, Vec<F>)>,
        T: Into<String>,
        F: Into<String>,
    {
        let mut index = SpectralIndex::default();
        for (ty, files) in entries {
            let ty = ty.into();
            let files: Vec<String> = files.into_iter().map(Into::into).collect();
            match index.entries.iter_mut().find(|(k, _)| *k == ty) {
                Some((_, existing)) => existing.extend(files),
                None => index.entries.push((ty, files)),
            }
        }
        index
    }

    /// Deserialize the index file at `path`.
    ///
    /// Any failure (missing file, bad JSON, wrong shape, duplicate keys) is
    /// reported as [`SpexError::IndexUnavailable`].
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| SpexError::IndexUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let index = Self::from_json_str(&text).map_err(|e| unavailable(e.to_string()))?;
        log::debug!(
            "Loaded spectral index {} ({} types)",
            path.display(),
            index.len()
        );
        Ok(index)
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// All spectral-type labels in native (file) order.
    pub fn list_types(&self) -> Vec<String> {
        self.entries.iter().map(|(ty, _)| ty.clone()).collect()
    }

    /// Filenames filed under `spectral_type`, in index order.  An existing
    /// type with no files yields an empty slice, not an error.
    pub fn filenames_for_type(&self, spectral_type: &str) -> Result<&[String]> {
        self.entries
            .iter()
            .find(|(ty, _)| ty == spectral_type)
            .map(|(_, files)| files.as_slice())
            .ok_or_else(|| SpexError::UnknownSpectralType(spectral_type.to_string()))
    }

    /// Reverse lookup: the first type whose list contains `filename`.
    pub fn type_for_filename(&self, filename: &str) -> Result<&str> {
        self.entries
            .iter()
            .find(|(_, files)| files.iter().any(|f| f == filename))
            .map(|(ty, _)| ty.as_str())
            .ok_or_else(|| SpexError::UnknownFilename(filename.to_string()))
    }

    pub fn contains_type(&self, spectral_type: &str) -> bool {
        self.entries.iter().any(|(ty, _)| ty == spectral_type)
    }

    /// `(type, filenames)` pairs in native order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(ty, files)| (ty.as_str(), files.as_slice()))
    }

    /// Number of spectral types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -- serde: a JSON object whose key order is significant --

impl Serialize for SpectralIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (ty, files) in &self.entries {
            map.serialize_entry(ty, files)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SpectralIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct IndexVisitor;

        impl<'de> Visitor<'de> for IndexVisitor {
            type Value = SpectralIndex;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of spectral type to a list of filenames")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, Vec<String>)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((ty, files)) = access.next_entry::<String, Vec<String>>()? {
                    if entries.iter().any(|(k, _)| *k == ty) {
                        return Err(de::Error::custom(format!("duplicate spectral type '{ty}'")));
                    }
                    entries.push((ty, files));
                }
                Ok(SpectralIndex { entries })
            }
        }

        deserializer.deserialize_map(IndexVisitor)
    }
}
