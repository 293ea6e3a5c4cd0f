//! Piecewise-linear resampling of a 1-D series onto a new coordinate grid.
//!
//! Samples do not have to arrive sorted: [`Interpolator::new`] sorts the
//! `(x, y)` pairs by `x` (stable, so repeated `x` keep their input order)
//! before any evaluation.  Pairs whose `x` is NaN or infinite (gaps in a
//! spectrum) are dropped first, and at least two finite samples must remain.
//! Queries inside `[min(x), max(x)]` of the finite samples interpolate
//! between the bracketing samples; queries outside follow the
//! [`FillPolicy`].

use crate::error::{Result, SpexError};

/// What to emit for queries outside the sampled range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum FillPolicy {
    /// Extend the nearest edge segment's line.
    #[default]
    Extrapolate,
    /// Emit this value for every out-of-range query.
    Constant(f64),
}

/// Sorted, validated samples ready for repeated evaluation.
#[derive(Debug, Clone)]
pub struct Interpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Interpolator {
    /// Requires `x.len() == y.len()` and at least 2 samples with a finite
    /// `x`.  When too few finite samples remain, the error reports the
    /// finite count for both lengths.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() || x.len() < 2 {
            return Err(SpexError::InsufficientPoints {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        let mut pairs: Vec<(f64, f64)> = x
            .iter()
            .copied()
            .zip(y.iter().copied())
            .filter(|(xi, _)| xi.is_finite())
            .collect();
        if pairs.len() < 2 {
            return Err(SpexError::InsufficientPoints {
                x_len: pairs.len(),
                y_len: pairs.len(),
            });
        }
        if !pairs.windows(2).all(|w| w[0].0 <= w[1].0) {
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        let (xs, ys) = pairs.into_iter().unzip();
        Ok(Interpolator { xs, ys })
    }

    /// Sampled coordinate range `(min, max)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn eval(&self, v: f64, fill: FillPolicy) -> f64 {
        let n = self.xs.len();
        let (lo, hi) = self.domain();

        if v < lo || v > hi {
            return match fill {
                FillPolicy::Constant(c) => c,
                FillPolicy::Extrapolate if v < lo => self.extend(0, v),
                FillPolicy::Extrapolate => self.extend(n - 2, v),
            };
        }

        // First sample strictly greater than v, clamped so the segment
        // (i, i + 1) always exists.
        let above = self.xs.partition_point(|&x| x <= v);
        let i = above.saturating_sub(1).min(n - 2);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let dx = x1 - x0;
        if dx == 0.0 {
            return y1;
        }
        let t = (v - x0) / dx;
        y0 * (1.0 - t) + y1 * t
    }

    pub fn eval_many(&self, x_new: &[f64], fill: FillPolicy) -> Vec<f64> {
        x_new.iter().map(|&v| self.eval(v, fill)).collect()
    }

    // Line through segment (i, i + 1), evaluated at v.
    fn extend(&self, i: usize, v: f64) -> f64 {
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let dx = x1 - x0;
        if dx == 0.0 {
            return if v < x0 { y0 } else { y1 };
        }
        let slope = (y1 - y0) / dx;
        if v < x0 {
            y0 + slope * (v - x0)
        } else {
            y1 + slope * (v - x1)
        }
    }
}

/// Resample `y` (sampled at `x`) onto `x_new`.  Output has the length and
/// order of `x_new`.
pub fn interpolate(x: &[f64], y: &[f64], x_new: &[f64], fill: FillPolicy) -> Result<Vec<f64>> {
    Ok(Interpolator::new(x, y)?.eval_many(x_new, fill))
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
