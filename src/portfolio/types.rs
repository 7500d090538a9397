//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Shared enums and result containers for portfolio optimization.

use std::fmt::Display;
use std::str::FromStr;

use impl_new_derive::ImplNew;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::returns::WeightVector;
use super::data::AssetMoments;

/// Default risk-free rate used by the optimizer.
pub const DEFAULT_RISK_FREE: f64 = 0.02;

/// Allocation objective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
  /// Maximize `(w·μ - r_f) / sqrt(wᵀΣw)`.
  #[default]
  MaximizeSharpe,
  /// Minimize `sqrt(wᵀΣw)`.
  MinimizeVolatility,
  /// Maximize `w·μ`.
  MaximizeReturn,
}

impl Display for Strategy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Strategy::MaximizeSharpe => write!(f, "Maximize Sharpe"),
      Strategy::MinimizeVolatility => write!(f, "Minimize volatility"),
      Strategy::MaximizeReturn => write!(f, "Maximize return"),
    }
  }
}

impl FromStr for Strategy {
  type Err = AnalyticsError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_lowercase().replace(['_', ' '], "-").as_str() {
      "sharpe" | "max-sharpe" | "maximize-sharpe" => Ok(Self::MaximizeSharpe),
      "min-volatility" | "min-vol" | "minimize-volatility" => Ok(Self::MinimizeVolatility),
      "max-return" | "maximize-return" | "return" => Ok(Self::MaximizeReturn),
      other => Err(AnalyticsError::invalid(format!(
        "unknown strategy '{other}'"
      ))),
    }
  }
}

/// Weights together with their model statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioResult {
  /// Portfolio weights.
  pub weights: WeightVector,
  /// Model expected portfolio return `w·μ`.
  pub expected_return: f64,
  /// Model portfolio volatility `sqrt(wᵀΣw)`.
  pub volatility: f64,
  /// `(expected_return - risk_free) / volatility`, or `0` at zero volatility.
  pub sharpe: f64,
}

impl PortfolioResult {
  /// Evaluate `weights` against estimated moments.
  pub fn evaluate(weights: WeightVector, moments: &AssetMoments, risk_free: f64) -> Self {
    let sample = moments.sample(weights.as_slice(), risk_free);
    Self {
      weights,
      expected_return: sample.expected_return,
      volatility: sample.volatility,
      sharpe: sample.sharpe,
    }
  }
}

/// One point of the simulated risk/return cloud.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq)]
pub struct FrontierSample {
  pub expected_return: f64,
  pub volatility: f64,
  pub sharpe: f64,
}
