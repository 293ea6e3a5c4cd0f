use std::path::Path;

use spex_prism::color::ColorMap;
use spex_prism::data::filter::group_by_class;
use spex_prism::{FillPolicy, LibraryConfig, SpectralBatch, SpexLibrary, linspace};

/// Samples on the shared wavelength grid used for overlays.
pub const COMMON_GRID_POINTS: usize = 400;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// A batch resampled onto the overlap of its members, plus its mean.
pub struct SharedGrid {
    pub batch: SpectralBatch,
    pub mean_flux: Vec<f64>,
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Open library (None until a directory is chosen).
    pub library: Option<SpexLibrary>,

    /// Spectral types of the open library, grouped by class.
    pub type_groups: Vec<(String, Vec<String>)>,

    /// Free-text filter on the type list.
    pub type_query: String,

    pub selected_type: Option<String>,

    /// Spectra of the selected type that could be read.
    pub batch: Option<SpectralBatch>,

    /// `(filename, reason)` for members of the selected type that failed.
    pub failures: Vec<(String, String)>,

    /// One colour per loaded spectrum.
    pub color_map: Option<ColorMap>,

    /// Overlay spectra on their common wavelength grid (with mean).
    pub common_grid: bool,

    /// Cached resampling for `common_grid`.
    pub shared: Option<SharedGrid>,

    pub minmax_scaling: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Open the library at `config` and list its spectral types.
    pub fn open_library(&mut self, config: LibraryConfig) {
        let library = SpexLibrary::new(config.with_cache_index(true));
        match library.list_types() {
            Ok(types) => {
                log::info!(
                    "Opened library {} with {} spectral types",
                    library.config().root().display(),
                    types.len()
                );
                *self = AppState {
                    type_groups: group_by_class(&types),
                    library: Some(library),
                    minmax_scaling: self.minmax_scaling,
                    common_grid: self.common_grid,
                    ..Default::default()
                };
            }
            Err(e) => {
                log::error!("Failed to open library: {e:#}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn open_root(&mut self, root: &Path) {
        self.open_library(LibraryConfig::default().with_root(root));
    }

    /// Load every spectrum of `spectral_type`, keeping whatever is readable.
    pub fn select_type(&mut self, spectral_type: &str) {
        let Some(library) = &self.library else {
            return;
        };
        match library.collect_all_for_type(spectral_type) {
            Ok(report) => {
                self.failures = report
                    .failures
                    .iter()
                    .map(|(f, e)| (f.clone(), e.to_string()))
                    .collect();
                self.status_message = (!report.is_complete()).then(|| {
                    format!("{} file(s) could not be read", report.failures.len())
                });
                self.color_map = Some(ColorMap::new(&report.batch.filenames));
                self.batch = Some(report.batch);
                self.selected_type = Some(spectral_type.to_string());
                self.rebuild_shared();
            }
            Err(e) => {
                log::error!("Failed to load spectral type {spectral_type}: {e:#}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn set_common_grid(&mut self, on: bool) {
        self.common_grid = on;
        self.rebuild_shared();
    }

    /// Resample the current batch onto its overlap range.
    fn rebuild_shared(&mut self) {
        self.shared = None;
        if !self.common_grid {
            return;
        }
        let Some(batch) = &self.batch else {
            return;
        };
        let Some(range) = batch.overlap_range() else {
            self.status_message = Some("Spectra share no common wavelength range".into());
            return;
        };
        let grid = linspace(range.0, range.1, COMMON_GRID_POINTS);
        match batch.resampled(&grid, FillPolicy::Extrapolate) {
            Ok(resampled) => {
                let mean_flux = resampled.mean_flux().unwrap_or_default();
                self.shared = Some(SharedGrid {
                    batch: resampled,
                    mean_flux,
                });
            }
            Err(e) => {
                log::warn!("Cannot resample {}: {e}", batch.spectral_type);
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Number of loaded spectra.
    pub fn loaded_count(&self) -> usize {
        self.batch.as_ref().map_or(0, SpectralBatch::len)
    }
}
