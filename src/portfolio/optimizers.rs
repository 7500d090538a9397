//! # Portfolio Optimizers
//!
//! $$
//! \min_{\mathbf{w}\in\Delta}\ f(\mathbf{w}),\qquad \Delta=\{\mathbf{w}: 0\le w_i\le 1,\ \mathbf{1}^\top\mathbf{w}=1\}
//! $$
//!
//! Long-only, fully-invested allocations for the three MPT objectives.

use tracing::debug;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::returns::ALLOCATION_TOLERANCE;
use crate::returns::AssetReturnSet;
use crate::returns::WeightVector;
use super::data::AssetMoments;
use super::solver::Bounds;
use super::solver::Constraint;
use super::solver::Objective;
use super::solver::ProjectedGradientSolver;
use super::solver::Solver;
use super::types::PortfolioResult;
use super::types::Strategy;

const BOUND_SLACK: f64 = 1e-6;

/// Objective of one [`Strategy`] with its analytic gradient.
struct PortfolioObjective<'a> {
  moments: &'a AssetMoments,
  strategy: Strategy,
  risk_free: f64,
}

impl Objective for PortfolioObjective<'_> {
  fn value(&self, w: &[f64]) -> f64 {
    match self.strategy {
      Strategy::MaximizeSharpe => {
        let vol = self.moments.portfolio_volatility(w);
        if vol <= 1e-15 {
          return f64::NAN;
        }
        -(self.moments.portfolio_return(w) - self.risk_free) / vol
      }
      Strategy::MinimizeVolatility => self.moments.portfolio_volatility(w),
      Strategy::MaximizeReturn => -self.moments.portfolio_return(w),
    }
  }

  fn gradient(&self, w: &[f64]) -> Vec<f64> {
    match self.strategy {
      Strategy::MaximizeSharpe => {
        let vol = self.moments.portfolio_volatility(w);
        if vol <= 1e-15 {
          return vec![f64::NAN; w.len()];
        }
        let excess = self.moments.portfolio_return(w) - self.risk_free;
        let sigma_w = self.moments.sigma_w(w);
        self
          .moments
          .mean
          .iter()
          .zip(sigma_w.iter())
          .map(|(m, s)| -(m / vol - excess * s / vol.powi(3)))
          .collect()
      }
      Strategy::MinimizeVolatility => {
        let vol = self.moments.portfolio_volatility(w);
        if vol <= 1e-15 {
          return vec![0.0; w.len()];
        }
        self.moments.sigma_w(w).iter().map(|s| s / vol).collect()
      }
      Strategy::MaximizeReturn => self.moments.mean.iter().map(|m| -m).collect(),
    }
  }
}

/// Check solver output against the allocation invariants and clean rounding
/// noise off the bounds.
fn enforce_allocation(ids: &[String], x: Vec<f64>) -> Result<WeightVector> {
  if x.len() != ids.len() {
    return Err(AnalyticsError::optimization(format!(
      "solver returned {} weights for {} assets",
      x.len(),
      ids.len()
    )));
  }
  if let Some(w) = x
    .iter()
    .find(|w| !w.is_finite() || **w < -BOUND_SLACK || **w > 1.0 + BOUND_SLACK)
  {
    return Err(AnalyticsError::optimization(format!(
      "solver returned weight {w} outside [0, 1]"
    )));
  }

  let weights: Vec<f64> = x.into_iter().map(|w| w.clamp(0.0, 1.0)).collect();
  let total: f64 = weights.iter().sum();
  if (total - 1.0).abs() > ALLOCATION_TOLERANCE {
    return Err(AnalyticsError::optimization(format!(
      "solver returned weights summing to {total}"
    )));
  }

  WeightVector::new(ids.to_vec(), weights)
}

/// Optimal weights for `strategy` using the default projected-gradient solver.
pub fn optimize(set: &AssetReturnSet, strategy: Strategy, risk_free: f64) -> Result<WeightVector> {
  optimize_with_solver(set, strategy, risk_free, &ProjectedGradientSolver::default())
}

/// Optimal weights for `strategy` using an injected [`Solver`].
///
/// Starts from equal weights. A single asset gets the exact allocation `[1.0]`
/// without invoking the solver. Whatever the solver returns is validated
/// against the bounds and the full-investment constraint.
pub fn optimize_with_solver(
  set: &AssetReturnSet,
  strategy: Strategy,
  risk_free: f64,
  solver: &dyn Solver,
) -> Result<WeightVector> {
  let n = set.n_assets();
  if n == 0 {
    return Err(AnalyticsError::insufficient("no assets to optimize"));
  }
  if n == 1 {
    return WeightVector::new(set.ids().to_vec(), vec![1.0]);
  }

  let moments = AssetMoments::estimate(set)?;
  let initial = vec![1.0 / n as f64; n];

  if strategy == Strategy::MaximizeSharpe && moments.portfolio_volatility(&initial) <= 1e-15 {
    return Err(AnalyticsError::degenerate(
      "sharpe ratio is undefined for a zero-variance portfolio",
    ));
  }

  let objective = PortfolioObjective {
    moments: &moments,
    strategy,
    risk_free,
  };
  let solution = solver.minimize(
    &objective,
    &initial,
    &Bounds::unit(n),
    &Constraint::SumTo(1.0),
  )?;
  debug!(
    %strategy,
    iterations = solution.iterations,
    value = solution.value,
    "optimizer finished"
  );

  enforce_allocation(set.ids(), solution.x)
}

/// Optimal weights with their model return, volatility and Sharpe ratio.
pub fn optimize_portfolio(
  set: &AssetReturnSet,
  strategy: Strategy,
  risk_free: f64,
  solver: &dyn Solver,
) -> Result<PortfolioResult> {
  let weights = optimize_with_solver(set, strategy, risk_free, solver)?;
  let moments = AssetMoments::estimate(set)?;
  Ok(PortfolioResult::evaluate(weights, &moments, risk_free))
}
