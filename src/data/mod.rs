/// Data layer: index, container reading, batches and resampling.
///
/// Architecture:
/// ```text
///  spectral_data.json        .parquet / .json / .csv
///        │                            │
///        ▼                            ▼
///   ┌──────────┐               ┌──────────┐
///   │  index    │ type ⇄ file   │  loader   │  file → NdBlock (2-D or 3-D)
///   └──────────┘               └──────────┘
///        │                            │
///        └──────────┬─────────────────┘
///                   ▼
///            ┌─────────────┐
///            │   library    │  read_spectrum, get_all_for_type
///            └─────────────┘
///                   │  Spectrum / SpectralBatch
///                   ▼
///            ┌─────────────┐
///            │   interp     │  resample onto a shared grid
///            └─────────────┘
/// ```

pub mod filter;
pub mod index;
pub mod interp;
pub mod library;
pub mod loader;
pub mod model;
