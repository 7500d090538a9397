//! # Beta
//!
//! $$
//! \beta=\frac{\operatorname{Cov}(R_p,R_m)}{\operatorname{Var}(R_m)}
//! $$
//!
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::stats;

/// Sensitivity of portfolio returns to benchmark returns.
///
/// Both series must have the same length (at least two observations). A
/// constant benchmark has no variance and yields
/// [`AnalyticsError::DegenerateInput`].
pub fn beta(portfolio_returns: &[f64], market_returns: &[f64]) -> Result<f64> {
  if portfolio_returns.len() != market_returns.len() {
    return Err(AnalyticsError::invalid(format!(
      "beta needs equal-length series, got {} and {}",
      portfolio_returns.len(),
      market_returns.len()
    )));
  }
  if market_returns.len() < 2 {
    return Err(AnalyticsError::insufficient(format!(
      "beta needs at least 2 observations, got {}",
      market_returns.len()
    )));
  }

  let market_var = stats::sample_variance(market_returns);
  if market_var == 0.0 {
    return Err(AnalyticsError::degenerate("market returns have zero variance"));
  }

  Ok(stats::sample_covariance(portfolio_returns, market_returns) / market_var)
}
