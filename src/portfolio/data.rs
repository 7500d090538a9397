//! # Portfolio Data Utilities
//!
//! $$
//! \Sigma_{ij} = \frac{1}{T-1}\sum_t (r_{i,t}-\mu_i)(r_{j,t}-\mu_j)
//! $$
//!
//! Mean vector, covariance and correlation estimates of aligned asset returns.

use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::returns::AssetReturnSet;
use crate::stats;
use super::types::FrontierSample;

fn pearson(x: &[f64], y: &[f64]) -> f64 {
  let sx = stats::sample_variance(x).sqrt();
  let sy = stats::sample_variance(y).sqrt();
  let denom = sx * sy;
  if denom < 1e-15 {
    0.0
  } else {
    (stats::sample_covariance(x, y) / denom).clamp(-1.0, 1.0)
  }
}

/// Per-asset arithmetic mean returns.
pub fn mean_vector(set: &AssetReturnSet) -> DVector<f64> {
  DVector::from_iterator(set.n_assets(), set.series().iter().map(|s| stats::mean(s)))
}

/// Sample covariance matrix (`ddof = 1`) of the aligned returns.
pub fn covariance_matrix(set: &AssetReturnSet) -> DMatrix<f64> {
  let series = set.series();
  let n = series.len();
  let mut cov = DMatrix::zeros(n, n);

  for i in 0..n {
    for j in i..n {
      let c = stats::sample_covariance(&series[i], &series[j]);
      cov[(i, j)] = c;
      cov[(j, i)] = c;
    }
  }

  cov
}

/// Pearson correlation matrix of the aligned returns. Pairs involving a
/// zero-variance asset get a correlation of `0` off the diagonal.
pub fn correlation_matrix(set: &AssetReturnSet) -> DMatrix<f64> {
  let series = set.series();
  let n = series.len();
  let mut corr = DMatrix::identity(n, n);

  for i in 0..n {
    for j in (i + 1)..n {
      let r = pearson(&series[i], &series[j]);
      corr[(i, j)] = r;
      corr[(j, i)] = r;
    }
  }

  corr
}

/// Mean vector and covariance matrix estimated from an [`AssetReturnSet`].
#[derive(Clone, Debug, PartialEq)]
pub struct AssetMoments {
  pub mean: DVector<f64>,
  pub covariance: DMatrix<f64>,
}

impl AssetMoments {
  /// Estimate moments; the covariance needs at least two observations.
  pub fn estimate(set: &AssetReturnSet) -> Result<Self> {
    if set.n_assets() == 0 {
      return Err(AnalyticsError::insufficient("no assets to estimate moments for"));
    }
    if set.n_periods() < 2 {
      return Err(AnalyticsError::insufficient(format!(
        "covariance needs at least 2 observations per asset, got {}",
        set.n_periods()
      )));
    }

    Ok(Self {
      mean: mean_vector(set),
      covariance: covariance_matrix(set),
    })
  }

  pub fn n_assets(&self) -> usize {
    self.mean.len()
  }

  /// `w·μ`
  pub fn portfolio_return(&self, w: &[f64]) -> f64 {
    self.mean.iter().zip(w.iter()).map(|(m, wi)| m * wi).sum()
  }

  /// `Σw`
  pub fn sigma_w(&self, w: &[f64]) -> DVector<f64> {
    let wv = DVector::from_column_slice(w);
    &self.covariance * wv
  }

  /// `sqrt(wᵀΣw)`, clamped at zero against rounding.
  pub fn portfolio_volatility(&self, w: &[f64]) -> f64 {
    let sigma_w = self.sigma_w(w);
    let var: f64 = sigma_w.iter().zip(w.iter()).map(|(s, wi)| s * wi).sum();
    var.max(0.0).sqrt()
  }

  /// Return, volatility and Sharpe of one weight vector.
  pub fn sample(&self, w: &[f64], risk_free: f64) -> FrontierSample {
    let expected_return = self.portfolio_return(w);
    let volatility = self.portfolio_volatility(w);
    let sharpe = if volatility > 1e-15 {
      (expected_return - risk_free) / volatility
    } else {
      0.0
    };
    FrontierSample::new(expected_return, volatility, sharpe)
  }
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
  fn covariance_is_symmetric_with_sample_variances_on_diagonal() {
    let set = two_assets();
    let cov = covariance_matrix(&set);
    assert_abs_diff_eq!(cov[(0, 1)], cov[(1, 0)], epsilon = 1e-18);
    assert_abs_diff_eq!(
      cov[(0, 0)],
      stats::sample_variance(set.series()[0].as_slice()),
      epsilon = 1e-18
    );
  }

  #[test]
  fn correlation_has_unit_diagonal_and_bounded_entries() {
    let corr = correlation_matrix(&two_assets());
    assert_eq!(corr[(0, 0)], 1.0);
    assert_eq!(corr[(1, 1)], 1.0);
    assert!(corr[(0, 1)].abs() <= 1.0);
    assert!(corr[(0, 1)] < 0.0);
  }

  #[test]
  fn equal_weight_sample_matches_direct_computation() {
    let set = two_assets();
    let moments = AssetMoments::estimate(&set).unwrap();
    let s = moments.sample(&[0.5, 0.5], 0.0);
    assert_abs_diff_eq!(s.expected_return, 0.00625, epsilon = 1e-15);

    // portfolio series [0.015, -0.005, 0.01, 0.005]
    let direct = stats::sample_variance(&[0.015, -0.005, 0.01, 0.005]).sqrt();
    assert_abs_diff_eq!(s.volatility, direct, epsilon = 1e-12);
  }

  #[test]
  fn single_observation_is_insufficient() {
    let set = align(vec![("A", ReturnSeries::new(vec![0.01]).unwrap())]).unwrap();
    assert!(matches!(
      AssetMoments::estimate(&set),
      Err(AnalyticsError::InsufficientData(_))
    ));
  }
}
