//! # Solver
//!
//! $$
//! \min_{\mathbf{x}} f(\mathbf{x})\quad\text{s.t.}\quad \mathbf{l}\le\mathbf{x}\le\mathbf{u},\ \ \mathbf{1}^\top\mathbf{x}=s
//! $$
//!
//! Constrained local minimizers behind a [`Solver`] seam. The feasible set is
//! a box intersected with a budget hyperplane; both bundled solvers work
//! through the Euclidean projection onto that set.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::solver::neldermead::NelderMead;
use tracing::debug;

use crate::config::SolverConfig;
use crate::error::AnalyticsError;
use crate::error::Result;

const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-12;
const MAX_STEP: f64 = 1e12;
const PROJECTION_ITERS: usize = 200;
const NELDER_MEAD_PENALTY: f64 = 1e3;

/// Scalar function to be minimized.
pub trait Objective {
  fn value(&self, x: &[f64]) -> f64;

  /// Gradient of [`Objective::value`]; central differences unless overridden.
  fn gradient(&self, x: &[f64]) -> Vec<f64> {
    let mut probe = x.to_vec();
    (0..x.len())
      .map(|i| {
        let h = 1e-7 * x[i].abs().max(1.0);
        probe[i] = x[i] + h;
        let up = self.value(&probe);
        probe[i] = x[i] - h;
        let down = self.value(&probe);
        probe[i] = x[i];
        (up - down) / (2.0 * h)
      })
      .collect()
  }
}

/// Box bounds `lower[i] <= x[i] <= upper[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
  lower: Vec<f64>,
  upper: Vec<f64>,
}

impl Bounds {
  pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
    if lower.len() != upper.len() {
      return Err(AnalyticsError::invalid(format!(
        "{} lower bounds but {} upper bounds",
        lower.len(),
        upper.len()
      )));
    }
    for (i, (l, u)) in lower.iter().zip(upper.iter()).enumerate() {
      if !(l.is_finite() && u.is_finite() && l <= u) {
        return Err(AnalyticsError::invalid(format!(
          "bound {i} must satisfy finite lower <= upper, got [{l}, {u}]"
        )));
      }
    }
    Ok(Self { lower, upper })
  }

  /// `[0, 1]` on every coordinate.
  pub fn unit(n: usize) -> Self {
    Self {
      lower: vec![0.0; n],
      upper: vec![1.0; n],
    }
  }

  pub fn len(&self) -> usize {
    self.lower.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lower.is_empty()
  }
}

/// Equality constraint on the decision vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constraint {
  /// `Σ x_i = target`
  SumTo(f64),
}

/// Minimizer found by a [`Solver`].
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
  pub x: Vec<f64>,
  pub value: f64,
  pub iterations: u64,
}

/// Constrained local minimizer.
pub trait Solver {
  fn minimize(
    &self,
    objective: &dyn Objective,
    initial: &[f64],
    bounds: &Bounds,
    constraint: &Constraint,
  ) -> Result<Solution>;
}

/// Selects one of the bundled solvers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverKind {
  #[default]
  ProjectedGradient,
  NelderMead,
}

impl SolverKind {
  pub fn build(&self, config: SolverConfig) -> Box<dyn Solver> {
    match self {
      SolverKind::ProjectedGradient => Box::new(ProjectedGradientSolver::new(config)),
      SolverKind::NelderMead => Box::new(NelderMeadSolver::new(config)),
    }
  }
}

/// Euclidean projection of `v` onto `{x : bounds, constraint}`.
///
/// The projection is `clamp(v - θ, l, u)` where the scalar `θ` is found by
/// bisection so that the budget holds.
pub fn project(v: &[f64], bounds: &Bounds, constraint: &Constraint) -> Result<Vec<f64>> {
  if v.len() != bounds.len() {
    return Err(AnalyticsError::invalid(format!(
      "point has {} coordinates but bounds have {}",
      v.len(),
      bounds.len()
    )));
  }
  if v.iter().any(|x| !x.is_finite()) {
    return Err(AnalyticsError::optimization("cannot project a non-finite point"));
  }

  let Constraint::SumTo(target) = *constraint;
  let lo_sum: f64 = bounds.lower.iter().sum();
  let hi_sum: f64 = bounds.upper.iter().sum();
  if target < lo_sum - 1e-12 || target > hi_sum + 1e-12 {
    return Err(AnalyticsError::optimization(format!(
      "budget {target} is infeasible for bounds summing to [{lo_sum}, {hi_sum}]"
    )));
  }

  let clamp_at = |theta: f64| -> Vec<f64> {
    v.iter()
      .zip(bounds.lower.iter().zip(bounds.upper.iter()))
      .map(|(x, (l, u))| (x - theta).clamp(*l, *u))
      .collect()
  };

  // sum(clamp_at(θ)) is non-increasing in θ: hi_sum at `a`, lo_sum at `b`.
  let mut a = v
    .iter()
    .zip(bounds.upper.iter())
    .map(|(x, u)| x - u)
    .fold(f64::INFINITY, f64::min);
  let mut b = v
    .iter()
    .zip(bounds.lower.iter())
    .map(|(x, l)| x - l)
    .fold(f64::NEG_INFINITY, f64::max);

  for _ in 0..PROJECTION_ITERS {
    let mid = 0.5 * (a + b);
    if mid <= a || mid >= b {
      break;
    }
    let total: f64 = clamp_at(mid).iter().sum();
    if total > target {
      a = mid;
    } else {
      b = mid;
    }
  }

  Ok(clamp_at(0.5 * (a + b)))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn check_gradient(g: &[f64]) -> Result<()> {
  if g.iter().all(|x| x.is_finite()) {
    Ok(())
  } else {
    Err(AnalyticsError::optimization("objective gradient is not finite"))
  }
}

/// Spectral projected gradient with Armijo backtracking.
///
/// Each iteration moves along the projected negative gradient using a
/// Barzilai-Borwein trial step, halving it until the Armijo condition holds.
/// Terminates when the accepted move is below `tolerance` (max-norm).
#[derive(Clone, Copy, Debug, Default)]
pub struct ProjectedGradientSolver {
  config: SolverConfig,
}

impl ProjectedGradientSolver {
  pub fn new(config: SolverConfig) -> Self {
    Self { config }
  }
}

impl Solver for ProjectedGradientSolver {
  fn minimize(
    &self,
    objective: &dyn Objective,
    initial: &[f64],
    bounds: &Bounds,
    constraint: &Constraint,
  ) -> Result<Solution> {
    if initial.is_empty() {
      return Err(AnalyticsError::invalid("cannot minimize over zero variables"));
    }

    let mut x = project(initial, bounds, constraint)?;
    let mut f = objective.value(&x);
    if !f.is_finite() {
      return Err(AnalyticsError::optimization(
        "objective is not finite at the initial point",
      ));
    }
    let mut g = objective.gradient(&x);
    check_gradient(&g)?;

    let mut step = 1.0;

    for iter in 1..=self.config.max_iters {
      let mut t = step;
      let (x_new, f_new) = loop {
        let trial: Vec<f64> = x.iter().zip(g.iter()).map(|(xi, gi)| xi - t * gi).collect();
        let candidate = project(&trial, bounds, constraint)?;
        let d: Vec<f64> = candidate.iter().zip(x.iter()).map(|(c, xi)| c - xi).collect();
        let d_norm = d.iter().fold(0.0_f64, |m, v| m.max(v.abs()));

        if d_norm <= self.config.tolerance {
          debug!(iterations = iter, value = f, "projected gradient converged");
          return Ok(Solution {
            x,
            value: f,
            iterations: iter,
          });
        }

        let f_candidate = objective.value(&candidate);
        if f_candidate.is_finite() && f_candidate <= f + ARMIJO * dot(&g, &d) {
          break (candidate, f_candidate);
        }
        t *= 0.5;
      };

      let g_new = objective.gradient(&x_new);
      check_gradient(&g_new)?;

      let s: Vec<f64> = x_new.iter().zip(x.iter()).map(|(a, b)| a - b).collect();
      let y: Vec<f64> = g_new.iter().zip(g.iter()).map(|(a, b)| a - b).collect();
      let sy = dot(&s, &y);
      step = if sy > 0.0 {
        (dot(&s, &s) / sy).clamp(MIN_STEP, MAX_STEP)
      } else {
        (2.0 * t).min(MAX_STEP)
      };

      x = x_new;
      f = f_new;
      g = g_new;
    }

    Err(AnalyticsError::optimization(format!(
      "projected gradient did not converge within {} iterations",
      self.config.max_iters
    )))
  }
}

struct PenalizedCost<'a> {
  objective: &'a dyn Objective,
  bounds: &'a Bounds,
  constraint: Constraint,
}

impl CostFunction for PenalizedCost<'_> {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let w = project(x, self.bounds, &self.constraint)?;
    let dist2: f64 = x.iter().zip(w.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
    let value = self.objective.value(&w);

    Ok(if value.is_finite() {
      value + NELDER_MEAD_PENALTY * dist2
    } else {
      f64::INFINITY
    })
  }
}

/// Derivative-free Nelder-Mead over the projected feasible set.
///
/// Infeasible simplex vertices are evaluated at their projection plus a
/// quadratic penalty on the distance to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NelderMeadSolver {
  config: SolverConfig,
}

impl NelderMeadSolver {
  pub fn new(config: SolverConfig) -> Self {
    Self { config }
  }
}

impl Solver for NelderMeadSolver {
  fn minimize(
    &self,
    objective: &dyn Objective,
    initial: &[f64],
    bounds: &Bounds,
    constraint: &Constraint,
  ) -> Result<Solution> {
    let n = initial.len();
    if n == 0 {
      return Err(AnalyticsError::invalid("cannot minimize over zero variables"));
    }

    let x0 = project(initial, bounds, constraint)?;
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(x0.clone());
    for i in 0..n {
      let mut point = x0.clone();
      point[i] += 0.05;
      simplex.push(point);
    }

    let cost = PenalizedCost {
      objective,
      bounds,
      constraint: *constraint,
    };

    let solver = NelderMead::new(simplex)
      .with_sd_tolerance(self.config.tolerance)
      .map_err(|e| AnalyticsError::optimization(format!("nelder-mead setup: {e}")))?;

    let res = Executor::new(cost, solver)
      .configure(|state| state.max_iters(self.config.max_iters))
      .run()
      .map_err(|e| AnalyticsError::optimization(format!("nelder-mead: {e}")))?;

    let iterations = res.state.get_iter();
    if let Some(TerminationReason::MaxItersReached) = res.state.get_termination_reason() {
      return Err(AnalyticsError::optimization(format!(
        "nelder-mead did not converge within {iterations} iterations"
      )));
    }

    let best = res
      .state
      .best_param
      .clone()
      .ok_or_else(|| AnalyticsError::optimization("nelder-mead returned no parameters"))?;
    let x = project(&best, bounds, constraint)?;
    let value = objective.value(&x);
    debug!(iterations, value, "nelder-mead terminated");

    Ok(Solution {
      x,
      value,
      iterations,
    })
  }
}
