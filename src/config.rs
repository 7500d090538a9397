//! # Configuration
//!
//! Runtime knobs for [`crate::portfolio::PortfolioEngine`] and the bundled solvers.

use crate::portfolio::frontier::DEFAULT_FRONTIER_SAMPLES;
use crate::portfolio::solver::SolverKind;
use crate::portfolio::types::DEFAULT_RISK_FREE;
use crate::portfolio::types::Strategy;
use crate::risk::DEFAULT_MONTE_CARLO_SAMPLES;
use crate::risk::VarMethod;

/// Iteration cap and convergence tolerance shared by the bundled solvers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
  /// Hard cap on solver iterations; reaching it is an optimization failure.
  pub max_iters: u64,
  /// Step-size tolerance at which the solver reports convergence.
  pub tolerance: f64,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      max_iters: 5000,
      tolerance: 1e-10,
    }
  }
}

/// Runtime configuration for [`crate::portfolio::PortfolioEngine`].
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
  /// Risk-free rate used by the Sharpe optimization and the Sortino ratio.
  pub risk_free_rate: f64,
  /// Risk-free rate used when scoring frontier samples.
  pub frontier_risk_free_rate: f64,
  /// VaR/CVaR confidence level in percent.
  pub confidence_level: f64,
  /// VaR estimator.
  pub var_method: VarMethod,
  /// Portfolio value the fractional VaR/CVaR is scaled by.
  pub portfolio_value: f64,
  /// Objective of the allocation optimizer.
  pub strategy: Strategy,
  /// Number of random portfolios in the frontier cloud.
  pub frontier_samples: usize,
  /// Number of draws for Monte-Carlo VaR.
  pub monte_carlo_samples: usize,
  /// Seed for every random draw of one analysis; `None` uses entropy.
  pub seed: Option<u64>,
  /// Scale surviving weights back to the input total when assets are excluded.
  pub renormalize_excluded: bool,
  /// Solver used by the optimizer.
  pub solver: SolverKind,
  pub solver_config: SolverConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: DEFAULT_RISK_FREE,
      frontier_risk_free_rate: 0.0,
      confidence_level: 95.0,
      var_method: VarMethod::Historical,
      portfolio_value: 10_000.0,
      strategy: Strategy::MaximizeSharpe,
      frontier_samples: DEFAULT_FRONTIER_SAMPLES,
      monte_carlo_samples: DEFAULT_MONTE_CARLO_SAMPLES,
      seed: None,
      renormalize_excluded: false,
      solver: SolverKind::ProjectedGradient,
      solver_config: SolverConfig::default(),
    }
  }
}

impl EngineConfig {
  /// VaR method with the configured Monte-Carlo sample count and seed applied.
  pub fn resolved_var_method(&self) -> VarMethod {
    match self.var_method {
      VarMethod::MonteCarlo { .. } => VarMethod::MonteCarlo {
        samples: self.monte_carlo_samples,
        seed: self.seed,
      },
      other => other,
    }
  }
}
