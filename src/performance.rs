//! # Performance
//!
//! $$
//! \bar r=\frac1n\sum_t r_t,\quad \sigma=\sqrt{\frac1n\sum_t (r_t-\bar r)^2},\quad S=\frac{\bar r}{\sigma}
//! $$
//!
use impl_new_derive::ImplNew;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::stats;

/// Mean return, volatility and Sharpe ratio of a return series.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq)]
pub struct PerformanceMetrics {
  /// Arithmetic mean of the returns.
  pub mean_return: f64,
  /// Population standard deviation of the returns.
  pub volatility: f64,
  /// `mean_return / volatility`, or `0` for a zero-variance series.
  pub sharpe_ratio: f64,
}

/// Compute [`PerformanceMetrics`] for a (possibly aggregated) return series.
pub fn performance_metrics(returns: &[f64]) -> Result<PerformanceMetrics> {
  if returns.is_empty() {
    return Err(AnalyticsError::insufficient(
      "performance metrics need at least one return",
    ));
  }

  let mean_return = stats::mean(returns);
  let volatility = stats::population_std(returns);
  let sharpe_ratio = if volatility != 0.0 {
    mean_return / volatility
  } else {
    0.0
  };

  Ok(PerformanceMetrics::new(mean_return, volatility, sharpe_ratio))
}
