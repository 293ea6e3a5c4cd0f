use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Builder, ListBuilder};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use spex_prism::data::loader::DATA_COLUMN;
use spex_prism::{LibraryConfig, SpectralIndex, linspace};

/// Spectral types written, with (count, effective "temperature" knob).
const TYPES: &[(&str, usize, f64)] = &[
    ("M6", 3, 2800.0),
    ("M9", 2, 2400.0),
    ("L2", 4, 2000.0),
    ("L6", 2, 1600.0),
    ("T2", 3, 1200.0),
    ("T4.5", 2, 1000.0),
];

/// Prism-mode wavelength coverage in microns.
const WAVE_MIN: f64 = 0.65;
const WAVE_MAX: f64 = 2.55;
const N_SAMPLES: usize = 564;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Blackbody-like continuum carved by water and methane bands, deeper for
/// cooler types.
fn model_flux(wave: f64, temperature: f64) -> f64 {
    let peak = 2898.0 / temperature;
    let continuum = gaussian(wave, peak, 0.45, 1.0);
    let depth = (2800.0 - temperature).max(0.0) / 2800.0;
    let bands = [(1.15, 0.05, 0.6), (1.4, 0.08, 0.9), (1.9, 0.1, 0.9), (2.2, 0.06, 0.5)];
    let absorption: f64 = bands
        .iter()
        .map(|&(mu, sigma, strength)| gaussian(wave, mu, sigma, strength * depth))
        .sum();
    (continuum * (1.0 - absorption.min(0.95))).max(0.0)
}

/// Seeded xoshiro256** noise source, so a generated library is reproducible.
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Write the three rows as a Parquet data column.  `wrapped` stores them as
/// one `1 × 3 × N` row, otherwise as three `N`-long rows.
fn write_container(path: &Path, rows: [&[f64]; 3], wrapped: bool) -> Result<()> {
    let column: ArrayRef = if wrapped {
        let mut builder = ListBuilder::new(ListBuilder::new(Float64Builder::new()));
        for row in rows {
            builder.values().values().append_slice(row);
            builder.values().append(true);
        }
        builder.append(true);
        Arc::new(builder.finish())
    } else {
        let mut builder = ListBuilder::new(Float64Builder::new());
        for row in rows {
            builder.values().append_slice(row);
            builder.append(true);
        }
        Arc::new(builder.finish())
    };

    let schema = Arc::new(Schema::new(vec![Field::new(
        DATA_COLUMN,
        column.data_type().clone(),
        false,
    )]));
    let batch = RecordBatch::try_new(schema.clone(), vec![column])
        .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let root: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| LibraryConfig::from_env().root);
    let config = LibraryConfig::from_env().with_root(&root);
    std::fs::create_dir_all(&root).with_context(|| format!("creating {}", root.display()))?;

    let mut rng = SimpleRng::new(42);
    let wavelength = linspace(WAVE_MIN, WAVE_MAX, N_SAMPLES);
    let mut entries: Vec<(String, Vec<String>)> = Vec::new();
    let mut written = 0usize;

    for &(ty, count, temperature) in TYPES {
        let mut files = Vec::with_capacity(count);
        for k in 0..count {
            let scale = 10f64.powf(rng.gauss(-14.0, 0.3));
            let noise = 0.02;
            let flux: Vec<f64> = wavelength
                .iter()
                .map(|&w| scale * (model_flux(w, temperature) + rng.gauss(0.0, noise)))
                .collect();
            let error = vec![scale * noise; N_SAMPLES];

            // Alternate layouts so both shapes are present in every type.
            let wrapped = k % 2 == 1;
            let filename = format!("spex_prism_{}_{k:02}.parquet", ty.replace('.', "p"));
            write_container(
                &config.spectrum_path(&filename),
                [&wavelength[..], &flux[..], &error[..]],
                wrapped,
            )?;
            log::debug!("Wrote {filename} (wrapped: {wrapped})");
            files.push(filename);
            written += 1;
        }
        entries.push((ty.to_string(), files));
    }

    let index = SpectralIndex::from_entries(entries);
    let text = index.to_json_string_pretty().context("serializing index")?;
    std::fs::write(config.index_path(), text)
        .with_context(|| format!("writing {}", config.index_path().display()))?;

    println!(
        "Wrote {written} spectra across {} spectral types to {}",
        index.len(),
        root.display()
    );
    Ok(())
}
