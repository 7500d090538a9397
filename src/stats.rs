//! # Stats
//!
//! $$
//! \bar x=\frac1n\sum_i x_i,\qquad s^2=\frac{1}{n-\delta}\sum_i (x_i-\bar x)^2
//! $$
//!
//! Moment and quantile helpers shared by the metric and portfolio modules.
//! Callers are responsible for rejecting empty inputs.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Random source for sampling routines: deterministic when `seed` is given,
/// entropy-seeded otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
  match seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  }
}

/// Arithmetic mean. Returns `0.0` for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

/// Whether every element equals the first one.
pub fn is_constant(xs: &[f64]) -> bool {
  xs.windows(2).all(|w| w[0] == w[1])
}

/// Population variance (`ddof = 0`). Exactly zero for a constant sample.
pub fn population_variance(xs: &[f64]) -> f64 {
  if is_constant(xs) {
    return 0.0;
  }
  let m = mean(xs);
  xs.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64
}

/// Population standard deviation (`ddof = 0`).
pub fn population_std(xs: &[f64]) -> f64 {
  population_variance(xs).sqrt()
}

/// Sample covariance (`ddof = 1`) over the common prefix of `x` and `y`.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> f64 {
  let n = x.len().min(y.len());
  if n < 2 || is_constant(&x[..n]) || is_constant(&y[..n]) {
    return 0.0;
  }

  let mx = mean(&x[..n]);
  let my = mean(&y[..n]);
  let mut acc = 0.0;
  for i in 0..n {
    acc += (x[i] - mx) * (y[i] - my);
  }
  acc / (n - 1) as f64
}

/// Sample variance (`ddof = 1`).
pub fn sample_variance(xs: &[f64]) -> f64 {
  sample_covariance(xs, xs)
}

/// Percentile `q ∈ [0, 100]` with linear interpolation between closest ranks.
///
/// The position of `q` is `q / 100 * (n - 1)` in the sorted sample, so the
/// 0th percentile is the minimum and the 100th the maximum.
pub fn percentile(xs: &[f64], q: f64) -> f64 {
  if xs.is_empty() {
    return f64::NAN;
  }

  let mut sorted = xs.to_vec();
  sorted.sort_by(f64::total_cmp);

  let pos = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
  let lo = pos.floor() as usize;
  let hi = pos.ceil() as usize;
  let frac = pos - lo as f64;

  sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn percentile_interpolates_between_ranks() {
    let xs = [0.03, -0.05, 0.0, 0.01, -0.02];
    assert_abs_diff_eq!(percentile(&xs, 0.0), -0.05, epsilon = 1e-15);
    assert_abs_diff_eq!(percentile(&xs, 100.0), 0.03, epsilon = 1e-15);
    assert_abs_diff_eq!(percentile(&xs, 50.0), 0.0, epsilon = 1e-15);
    // pos = 0.2 * 4 = 0.8 between -0.05 and -0.02
    assert_abs_diff_eq!(percentile(&xs, 20.0), -0.026, epsilon = 1e-15);
  }

  #[test]
  fn population_and_sample_moments_differ_by_ddof() {
    let xs = [1.0, 2.0, 3.0, 4.0];
    assert_abs_diff_eq!(population_variance(&xs), 1.25, epsilon = 1e-12);
    assert_abs_diff_eq!(sample_variance(&xs), 5.0 / 3.0, epsilon = 1e-12);
  }

  #[test]
  fn constant_sample_has_exactly_zero_variance() {
    let xs = [0.1; 7];
    assert_eq!(population_variance(&xs), 0.0);
    assert_eq!(sample_variance(&xs), 0.0);
  }

  #[test]
  fn covariance_of_opposite_series_is_negative() {
    let x = [1.0, 2.0, 3.0];
    let y = [3.0, 2.0, 1.0];
    assert_abs_diff_eq!(sample_covariance(&x, &y), -1.0, epsilon = 1e-12);
  }
}
