//! Read access to the SpeX Prism spectral library.
//!
//! The library directory holds a JSON index (spectral type → spectrum files)
//! and one container per spectrum.  [`SpexLibrary`] resolves types and
//! files through the index, reads containers in either the flat (`3 × N`)
//! or wrapped (`1 × 3 × N`) layout, and gathers every spectrum of a type
//! into a [`SpectralBatch`].  [`interpolate`] resamples a series onto a new
//! grid.

pub mod color;
pub mod config;
pub mod data;
pub mod error;

pub use config::LibraryConfig;
pub use data::index::SpectralIndex;
pub use data::interp::{FillPolicy, Interpolator, interpolate, linspace};
pub use data::library::SpexLibrary;
pub use data::model::{BatchReport, NdBlock, SpectralBatch, Spectrum};
pub use error::{Result, SpexError};
