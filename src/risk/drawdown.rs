//! # Drawdown
//!
//! $$
//! \mathrm{MDD}=\min_t \frac{X_t-\max_{s\le t}X_s}{\max_{s\le t}X_s}
//! $$
//!
use crate::error::AnalyticsError;
use crate::error::Result;

/// Largest relative decline of a cumulative path from its running maximum.
///
/// The result is non-positive for a positive path (`-0.25` is a 25% drawdown).
/// A running maximum of zero makes the ratio undefined and is reported as
/// [`AnalyticsError::DegenerateInput`].
pub fn max_drawdown(cumulative_returns: &[f64]) -> Result<f64> {
  if cumulative_returns.is_empty() {
    return Err(AnalyticsError::insufficient(
      "max drawdown needs a non-empty cumulative path",
    ));
  }

  let mut running_max = f64::NEG_INFINITY;
  let mut worst = f64::INFINITY;

  for (t, &x) in cumulative_returns.iter().enumerate() {
    if !x.is_finite() {
      return Err(AnalyticsError::invalid(format!(
        "cumulative value at index {t} is not finite"
      )));
    }
    running_max = running_max.max(x);
    if running_max.abs() < f64::EPSILON {
      return Err(AnalyticsError::degenerate(format!(
        "running maximum is zero at index {t}"
      )));
    }
    worst = worst.min((x - running_max) / running_max);
  }

  Ok(worst)
}
