//! # Sortino
//!
//! $$
//! \mathrm{Sortino}=\frac{\bar r-r_f}{\sigma_{-}},\qquad \sigma_{-}=\operatorname{std}\{r_t: r_t<\tau\}
//! $$
//!
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::stats;

/// Default risk-free rate used by [`sortino_ratio`] callers.
pub const DEFAULT_SORTINO_RISK_FREE: f64 = 0.02;

/// Excess mean return per unit of downside deviation.
///
/// The downside deviation is the population standard deviation of the returns
/// strictly below `target`. When it is zero (including when no return falls
/// below `target`) the ratio is `0`.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, target: f64) -> Result<f64> {
  if returns.is_empty() {
    return Err(AnalyticsError::insufficient(
      "sortino ratio needs at least one return",
    ));
  }

  let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < target).collect();
  let downside_dev = stats::population_std(&downside);

  if downside_dev == 0.0 {
    return Ok(0.0);
  }

  Ok((stats::mean(returns) - risk_free_rate) / downside_dev)
}
