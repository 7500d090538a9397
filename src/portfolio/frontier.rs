//! # Efficient Frontier
//!
//! $$
//! w_i=\frac{u_i}{\sum_j u_j},\qquad u_i\sim\mathcal U(0,1)
//! $$
//!
//! Monte-Carlo cloud of random long-only portfolios in risk/return space.
//!
//! Normalized independent uniforms are not uniform over the simplex; they
//! concentrate around equal weights and rarely reach the vertices. The cloud is
//! meant for visual comparison with the optimizer, not as an optimizer.

use rand::Rng;
use tracing::debug;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::returns::AssetReturnSet;
use crate::stats;
use super::data::AssetMoments;
use super::types::FrontierSample;

/// Default number of simulated portfolios.
pub const DEFAULT_FRONTIER_SAMPLES: usize = 10_000;

/// Simulated portfolios with their statistics, parallel-indexed.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontierSimulation {
  /// Asset identifiers, in weight order.
  pub ids: Vec<String>,
  /// Return, volatility and Sharpe of each sampled portfolio.
  pub samples: Vec<FrontierSample>,
  /// Sampled weight vectors.
  pub weights: Vec<Vec<f64>>,
}

impl FrontierSimulation {
  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  /// Sample with the highest Sharpe ratio.
  pub fn max_sharpe(&self) -> Option<(&FrontierSample, &[f64])> {
    self.best_by(|a, b| a.sharpe.total_cmp(&b.sharpe))
  }

  /// Sample with the lowest volatility.
  pub fn min_volatility(&self) -> Option<(&FrontierSample, &[f64])> {
    self.best_by(|a, b| b.volatility.total_cmp(&a.volatility))
  }

  fn best_by<F>(&self, cmp: F) -> Option<(&FrontierSample, &[f64])>
  where
    F: Fn(&FrontierSample, &FrontierSample) -> std::cmp::Ordering,
  {
    self
      .samples
      .iter()
      .zip(self.weights.iter())
      .max_by(|(a, _), (b, _)| cmp(a, b))
      .map(|(s, w)| (s, w.as_slice()))
  }
}

/// Draw `sample_count` random portfolios and evaluate each one.
///
/// A fixed `seed` makes the output reproducible.
pub fn simulate_frontier(
  set: &AssetReturnSet,
  risk_free: f64,
  sample_count: usize,
  seed: Option<u64>,
) -> Result<FrontierSimulation> {
  let moments = AssetMoments::estimate(set)?;
  let n = moments.n_assets();
  if sample_count == 0 {
    return Err(AnalyticsError::invalid("frontier needs at least one sample"));
  }

  let mut rng = stats::seeded_rng(seed);
  let mut samples = Vec::with_capacity(sample_count);
  let mut weights = Vec::with_capacity(sample_count);

  for _ in 0..sample_count {
    let mut w: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    let mut total: f64 = w.iter().sum();
    if total <= f64::MIN_POSITIVE {
      w.fill(1.0);
      total = n as f64;
    }
    w.iter_mut().for_each(|x| *x /= total);

    samples.push(moments.sample(&w, risk_free));
    weights.push(w);
  }

  debug!(samples = sample_count, assets = n, "frontier simulated");

  Ok(FrontierSimulation {
    ids: set.ids().to_vec(),
    samples,
    weights,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use crate::returns::ReturnSeries;
  use crate::returns::align;
  use super::*;

  fn two_assets() -> AssetReturnSet {
    align(vec![
      ("A", ReturnSeries::new(vec![0.01, -0.02, 0.03, -0.01]).unwrap()),
      ("B", ReturnSeries::new(vec![0.02, 0.01, -0.01, 0.02]).unwrap()),
    ])
    .unwrap()
  }

  #[test]
  fn seeded_frontier_is_reproducible() {
    let set = two_assets();
    let a = simulate_frontier(&set, 0.0, 500, Some(11)).unwrap();
    let b = simulate_frontier(&set, 0.0, 500, Some(11)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 500);
  }

  #[test]
  fn weights_are_long_only_and_fully_invested() {
    let sim = simulate_frontier(&two_assets(), 0.0, 200, Some(3)).unwrap();
    for (w, s) in sim.weights.iter().zip(sim.samples.iter()) {
      assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
      assert!(w.iter().all(|x| (0.0..=1.0).contains(x)));
      assert!(s.volatility >= 0.0);
    }
  }

  #[test]
  fn extremes_are_found() {
    let sim = simulate_frontier(&two_assets(), 0.0, 1_000, Some(5)).unwrap();
    let (best, _) = sim.max_sharpe().unwrap();
    let (calm, _) = sim.min_volatility().unwrap();
    assert!(sim.samples.iter().all(|s| s.sharpe <= best.sharpe));
    assert!(sim.samples.iter().all(|s| s.volatility >= calm.volatility));
  }

  #[test]
  fn zero_samples_are_rejected() {
    assert!(matches!(
      simulate_frontier(&two_assets(), 0.0, 0, None),
      Err(AnalyticsError::InvalidInput(_))
    ));
  }
}
