use std::sync::{Arc, OnceLock};

use super::index::SpectralIndex;
use super::loader::load_block;
use super::model::{BatchReport, SpectralBatch, Spectrum};
use crate::config::LibraryConfig;
use crate::error::{Result, SpexError};

// ---------------------------------------------------------------------------
// SpexLibrary – index lookups, spectrum reads and per-type batches
// ---------------------------------------------------------------------------

/// Handle on one spectral library directory.
///
/// Without `cache_index` every operation re-reads the index file.  With it
/// the first successful load is kept for the lifetime of the handle and the
/// file is treated as immutable.
#[derive(Debug)]
pub struct SpexLibrary {
    config: LibraryConfig,
    cached: OnceLock<Arc<SpectralIndex>>,
}

impl SpexLibrary {
    pub fn new(config: LibraryConfig) -> Self {
        SpexLibrary {
            config,
            cached: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// The index, freshly deserialized or from the cache.
    pub fn load_index(&self) -> Result<Arc<SpectralIndex>> {
        if !self.config.cache_index {
            return SpectralIndex::load(&self.config.index_path()).map(Arc::new);
        }
        if let Some(index) = self.cached.get() {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(SpectralIndex::load(&self.config.index_path())?);
        Ok(Arc::clone(self.cached.get_or_init(|| index)))
    }

    /// All spectral types, in index order.
    pub fn list_types(&self) -> Result<Vec<String>> {
        Ok(self.load_index()?.list_types())
    }

    pub fn filenames_for_type(&self, spectral_type: &str) -> Result<Vec<String>> {
        Ok(self.load_index()?.filenames_for_type(spectral_type)?.to_vec())
    }

    pub fn type_for_filename(&self, filename: &str) -> Result<String> {
        Ok(self.load_index()?.type_for_filename(filename)?.to_string())
    }

    /// Read one spectrum and resolve its spectral type.
    ///
    /// The container is read before the index is consulted, so a missing
    /// file reports [`SpexError::FileNotFound`] even when the index is
    /// unavailable too.  Both the 2-D (`3 × N`) and the wrapped 3-D
    /// (`1 × 3 × N`) block layouts yield the same [`Spectrum`].
    pub fn read_spectrum(&self, filename: &str) -> Result<Spectrum> {
        let rows = self.read_rows(filename)?;
        let index = self.load_index()?;
        Self::label(&index, filename, rows)
    }

    /// Every spectrum filed under `spectral_type`, in index order.
    ///
    /// The first failing read aborts the batch and is returned; no partial
    /// batch is produced.  A type with no files yields an empty batch.
    pub fn get_all_for_type(&self, spectral_type: &str) -> Result<SpectralBatch> {
        let index = self.load_index()?;
        let filenames = index.filenames_for_type(spectral_type)?;

        let mut batch = SpectralBatch::new(spectral_type);
        for filename in filenames {
            batch.push(self.read_with_index(&index, filename)?);
        }
        log::info!(
            "Loaded {} spectra for spectral type {spectral_type}",
            batch.len()
        );
        Ok(batch)
    }

    /// Best-effort variant of [`SpexLibrary::get_all_for_type`]: unreadable
    /// files are collected in [`BatchReport::failures`] and skipped.  Index
    /// failures and unknown types still fail the whole call.
    pub fn collect_all_for_type(&self, spectral_type: &str) -> Result<BatchReport> {
        let index = self.load_index()?;
        let filenames = index.filenames_for_type(spectral_type)?;

        let mut report = BatchReport {
            batch: SpectralBatch::new(spectral_type),
            failures: Vec::new(),
        };
        for filename in filenames {
            match self.read_with_index(&index, filename) {
                Ok(spectrum) => report.batch.push(spectrum),
                Err(e) => {
                    log::warn!("Skipping {filename}: {e}");
                    report.failures.push((filename.clone(), e));
                }
            }
        }
        log::info!(
            "Loaded {} of {} spectra for spectral type {spectral_type}",
            report.batch.len(),
            filenames.len()
        );
        Ok(report)
    }

    fn read_with_index(&self, index: &SpectralIndex, filename: &str) -> Result<Spectrum> {
        let rows = self.read_rows(filename)?;
        Self::label(index, filename, rows)
    }

    // (wavelength, flux, error) of one container.
    fn read_rows(&self, filename: &str) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        let path = self.config.spectrum_path(filename);
        let block = load_block(&path)?;
        block
            .triple()
            .map_err(|reason| SpexError::malformed(&path, reason))
    }

    fn label(
        index: &SpectralIndex,
        filename: &str,
        (wavelength, flux, error): (Vec<f64>, Vec<f64>, Vec<f64>),
    ) -> Result<Spectrum> {
        let spectral_type = index.type_for_filename(filename)?.to_string();

        Ok(Spectrum {
            filename: filename.to_string(),
            wavelength,
            flux,
            error,
            spectral_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn library(dir: &TempDir, cache: bool) -> SpexLibrary {
        SpexLibrary::new(
            LibraryConfig::default()
                .with_root(dir.path())
                .with_cache_index(cache),
        )
    }

    fn write_index(dir: &TempDir, json: &str) {
        fs::write(dir.path().join("spectral_data.json"), json).unwrap();
    }

    #[test]
    fn missing_index_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = library(&dir, false).list_types().unwrap_err();
        assert!(matches!(err, SpexError::IndexUnavailable { .. }));
    }

    #[test]
    fn corrupt_index_is_unavailable() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, "{ not json");
        let err = library(&dir, false).filenames_for_type("L2").unwrap_err();
        assert!(matches!(err, SpexError::IndexUnavailable { .. }));
    }

    #[test]
    fn uncached_library_sees_index_edits() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, r#"{"L2": []}"#);
        let lib = library(&dir, false);
        assert_eq!(lib.list_types().unwrap(), vec!["L2"]);
        write_index(&dir, r#"{"L2": [], "T4": []}"#);
        assert_eq!(lib.list_types().unwrap(), vec!["L2", "T4"]);
    }

    #[test]
    fn cached_library_keeps_first_index() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, r#"{"L2": []}"#);
        let lib = library(&dir, true);
        assert_eq!(lib.list_types().unwrap(), vec!["L2"]);
        write_index(&dir, r#"{"L2": [], "T4": []}"#);
        assert_eq!(lib.list_types().unwrap(), vec!["L2"]);
    }

    #[test]
    fn missing_file_reported_before_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = library(&dir, false).read_spectrum("absent.parquet").unwrap_err();
        assert!(matches!(err, SpexError::FileNotFound { .. }), "{err}");
    }

    #[test]
    fn read_spectrum_resolves_type() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, r#"{"M6": ["a.json"], "L2": ["b.csv"]}"#);
        fs::write(dir.path().join("b.csv"), "1,2\n10,20\n0.1,0.2\n").unwrap();

        let sp = library(&dir, false).read_spectrum("b.csv").unwrap();
        assert_eq!(sp.spectral_type, "L2");
        assert_eq!(sp.wavelength, vec![1.0, 2.0]);
        assert_eq!(sp.flux, vec![10.0, 20.0]);
        assert_eq!(sp.error, vec![0.1, 0.2]);
    }

    #[test]
    fn unindexed_file_is_unknown_filename() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, r#"{"L2": []}"#);
        fs::write(dir.path().join("stray.csv"), "1,2\n10,20\n0.1,0.2\n").unwrap();
        let err = library(&dir, false).read_spectrum("stray.csv").unwrap_err();
        assert!(matches!(err, SpexError::UnknownFilename(f) if f == "stray.csv"));
    }

    #[test]
    fn two_row_block_is_malformed() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, r#"{"L2": ["short.csv"]}"#);
        fs::write(dir.path().join("short.csv"), "1,2\n10,20\n").unwrap();
        let err = library(&dir, false).read_spectrum("short.csv").unwrap_err();
        assert!(matches!(err, SpexError::MalformedContainer { .. }));
    }

    #[test]
    fn empty_type_gives_empty_batch() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, r#"{"Y0": []}"#);
        let batch = library(&dir, false).get_all_for_type("Y0").unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.spectral_type, "Y0");
    }

    #[test]
    fn best_effort_collects_failures_in_order() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, r#"{"T4": ["ok1.csv", "gone.csv", "ok2.csv"]}"#);
        fs::write(dir.path().join("ok1.csv"), "1,2\n1,1\n0,0\n").unwrap();
        fs::write(dir.path().join("ok2.csv"), "1,2\n2,2\n0,0\n").unwrap();

        let lib = library(&dir, false);
        assert!(matches!(
            lib.get_all_for_type("T4").unwrap_err(),
            SpexError::FileNotFound { .. }
        ));

        let report = lib.collect_all_for_type("T4").unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.batch.filenames, vec!["ok1.csv", "ok2.csv"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "gone.csv");
    }
}
