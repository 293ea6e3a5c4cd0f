use crate::data::interp::{FillPolicy, Interpolator};
use crate::error::{Result, SpexError};

// ---------------------------------------------------------------------------
// NdBlock – the primary numeric block of a spectrum container
// ---------------------------------------------------------------------------

/// A dense, row-major numeric block of arbitrary dimensionality, as found in
/// a spectrum container before the (wavelength, flux, error) rows are picked
/// out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct NdBlock {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl NdBlock {
    /// Returns `None` when `shape` does not account for exactly `values.len()`
    /// elements.
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Option<Self> {
        (shape.iter().product::<usize>() == values.len()).then_some(NdBlock { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The innermost-axis run addressed by `outer` (one index per leading
    /// axis).  `None` if `outer` has the wrong arity or is out of bounds.
    pub fn lane(&self, outer: &[usize]) -> Option<&[f64]> {
        let (&width, leading) = self.shape.split_last()?;
        if outer.len() != leading.len() {
            return None;
        }
        let mut offset = 0usize;
        for (&i, &dim) in outer.iter().zip(leading) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        let start = offset * width;
        self.values.get(start..start + width)
    }

    /// Pick the (wavelength, flux, error) rows out of the block.
    ///
    /// * 2-D (`rows × N`): rows 0, 1, 2.
    /// * 3-D (`1 × rows × N`): rows 0, 1, 2 of the first slice.
    ///
    /// Returns a human-readable reason on any other shape.
    pub fn triple(&self) -> std::result::Result<(Vec<f64>, Vec<f64>, Vec<f64>), String> {
        let prefix: &[usize] = match self.ndim() {
            2 => &[],
            3 => &[0],
            n => {
                return Err(format!(
                    "expected a 2-D or 3-D data block, found {n}-D {:?}",
                    self.shape
                ));
            }
        };
        let rows = self.shape[self.ndim() - 2];
        if self.shape[0] == 0 || rows < 3 {
            return Err(format!(
                "data block {:?} does not hold wavelength, flux and error rows",
                self.shape
            ));
        }
        let row = |r: usize| {
            let mut at = prefix.to_vec();
            at.push(r);
            self.lane(&at).map(<[f64]>::to_vec)
        };
        match (row(0), row(1), row(2)) {
            (Some(w), Some(f), Some(e)) => Ok((w, f, e)),
            _ => Err(format!("data block {:?} is truncated", self.shape)),
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one observed object
// ---------------------------------------------------------------------------

/// One spectrum read from the library.  The three arrays have equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Container name as listed in the index.
    pub filename: String,
    pub wavelength: Vec<f64>,
    pub flux: Vec<f64>,
    pub error: Vec<f64>,
    /// Resolved through the index's reverse lookup.
    pub spectral_type: String,
}

impl Spectrum {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// Smallest and largest wavelength, ignoring NaNs.
    pub fn wavelength_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.wavelength)
    }

    /// Resample flux and error onto `grid`.  The returned spectrum's
    /// wavelength array is `grid`.
    pub fn resample(&self, grid: &[f64], fill: FillPolicy) -> Result<Spectrum> {
        let flux = Interpolator::new(&self.wavelength, &self.flux)?.eval_many(grid, fill);
        let error = Interpolator::new(&self.wavelength, &self.error)?.eval_many(grid, fill);
        Ok(Spectrum {
            filename: self.filename.clone(),
            wavelength: grid.to_vec(),
            flux,
            error,
            spectral_type: self.spectral_type.clone(),
        })
    }
}

pub(crate) fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ---------------------------------------------------------------------------
// SpectralBatch – every spectrum of one spectral type
// ---------------------------------------------------------------------------

/// All spectra filed under one spectral type.  Position `i` of every
/// collection belongs to `filenames[i]`, in index order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralBatch {
    pub spectral_type: String,
    pub filenames: Vec<String>,
    pub wavelengths: Vec<Vec<f64>>,
    pub fluxes: Vec<Vec<f64>>,
    pub errors: Vec<Vec<f64>>,
}

impl SpectralBatch {
    pub fn new(spectral_type: impl Into<String>) -> Self {
        SpectralBatch {
            spectral_type: spectral_type.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, spectrum: Spectrum) {
        self.filenames.push(spectrum.filename);
        self.wavelengths.push(spectrum.wavelength);
        self.fluxes.push(spectrum.flux);
        self.errors.push(spectrum.error);
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    /// The three parallel collections (wavelengths, fluxes, errors).
    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>, Vec<Vec<f64>>) {
        (self.wavelengths, self.fluxes, self.errors)
    }

    /// Reassemble member `i` as a [`Spectrum`].
    pub fn spectrum(&self, i: usize) -> Option<Spectrum> {
        Some(Spectrum {
            filename: self.filenames.get(i)?.clone(),
            wavelength: self.wavelengths.get(i)?.clone(),
            flux: self.fluxes.get(i)?.clone(),
            error: self.errors.get(i)?.clone(),
            spectral_type: self.spectral_type.clone(),
        })
    }

    /// Wavelength interval covered by every member, if they overlap at all.
    pub fn overlap_range(&self) -> Option<(f64, f64)> {
        let mut ranges = self.wavelengths.iter().map(|w| finite_range(w));
        let (mut lo, mut hi) = ranges.next()??;
        for range in ranges {
            let (a, b) = range?;
            lo = lo.max(a);
            hi = hi.min(b);
        }
        (lo < hi).then_some((lo, hi))
    }

    /// Every member resampled onto `grid`, same order.
    pub fn resampled(&self, grid: &[f64], fill: FillPolicy) -> Result<SpectralBatch> {
        let mut out = SpectralBatch::new(self.spectral_type.clone());
        for i in 0..self.len() {
            if let Some(sp) = self.spectrum(i) {
                out.push(sp.resample(grid, fill)?);
            }
        }
        Ok(out)
    }

    /// Per-sample mean flux.  Only meaningful when every member shares the
    /// same grid (see [`SpectralBatch::resampled`]); `None` if they do not
    /// have equal lengths or the batch is empty.
    pub fn mean_flux(&self) -> Option<Vec<f64>> {
        let n = self.fluxes.first()?.len();
        if self.fluxes.iter().any(|f| f.len() != n) {
            return None;
        }
        let count = self.fluxes.len() as f64;
        Some(
            (0..n)
                .map(|j| self.fluxes.iter().map(|f| f[j]).sum::<f64>() / count)
                .collect(),
        )
    }
}

/// Outcome of a best-effort batch: the spectra that could be read, plus the
/// per-file failures that were skipped.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub batch: SpectralBatch,
    pub failures: Vec<(String, SpexError)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
