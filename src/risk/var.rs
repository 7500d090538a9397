//! # Value at Risk
//!
//! $$
//! \mathrm{VaR}_c=-q_{1-c}(R)\cdot V,\qquad \mathrm{CVaR}_c=-\mathbb E\left[R\mid R\le -\mathrm{VaR}_c/V\right]\cdot V
//! $$
//!
//! Historical, parametric (variance-covariance) and Monte-Carlo estimators.
//! Every estimate is a positive loss magnitude in currency units.

use std::fmt::Display;
use std::str::FromStr;

use rand::Rng;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;
use tracing::debug;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::stats;

/// Number of synthetic returns drawn by [`VarMethod::MonteCarlo`] by default.
pub const DEFAULT_MONTE_CARLO_SAMPLES: usize = 10_000;

/// VaR estimation method.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VarMethod {
  /// Empirical percentile of the observed returns.
  #[default]
  Historical,
  /// Normal approximation from the sample mean and standard deviation.
  VarianceCovariance,
  /// Percentile of normal draws parameterized by the sample moments.
  MonteCarlo {
    /// Number of simulated returns.
    samples: usize,
    /// Fixed seed for reproducible draws.
    seed: Option<u64>,
  },
}

impl VarMethod {
  /// Monte-Carlo method with the default sample count.
  pub fn monte_carlo(seed: Option<u64>) -> Self {
    Self::MonteCarlo {
      samples: DEFAULT_MONTE_CARLO_SAMPLES,
      seed,
    }
  }

  /// Fractional VaR (loss per unit of portfolio value).
  pub fn fractional_var(&self, returns: &[f64], confidence_level: f64) -> Result<f64> {
    let tail = 100.0 - confidence_level;

    match *self {
      Self::Historical => Ok(-stats::percentile(returns, tail)),
      Self::VarianceCovariance => {
        let mu = stats::mean(returns);
        let sigma = stats::population_std(returns);
        let std_normal = Normal::new(0.0, 1.0)
          .map_err(|e| AnalyticsError::invalid(format!("standard normal: {e}")))?;
        let z = std_normal.inverse_cdf(tail / 100.0);
        Ok(-(mu + z * sigma))
      }
      Self::MonteCarlo { samples, seed } => {
        if samples == 0 {
          return Err(AnalyticsError::invalid(
            "Monte-Carlo VaR needs a positive sample count",
          ));
        }
        let mu = stats::mean(returns);
        let sigma = stats::population_std(returns);
        let normal = rand_distr::Normal::new(mu, sigma)
          .map_err(|e| AnalyticsError::degenerate(format!("return distribution: {e}")))?;

        let mut rng = stats::seeded_rng(seed);
        let simulated: Vec<f64> = (0..samples).map(|_| rng.sample(normal)).collect();
        debug!(samples, mu, sigma, "simulated Monte-Carlo returns");

        Ok(-stats::percentile(&simulated, tail))
      }
    }
  }
}

impl Display for VarMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      VarMethod::Historical => write!(f, "Historical"),
      VarMethod::VarianceCovariance => write!(f, "Variance-Covariance"),
      VarMethod::MonteCarlo { .. } => write!(f, "Monte Carlo"),
    }
  }
}

impl FromStr for VarMethod {
  type Err = AnalyticsError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_lowercase().replace(['_', ' '], "-").as_str() {
      "historical" | "hist" => Ok(Self::Historical),
      "variance-covariance" | "parametric" | "var-cov" => Ok(Self::VarianceCovariance),
      "monte-carlo" | "montecarlo" | "mc" => Ok(Self::monte_carlo(None)),
      other => Err(AnalyticsError::invalid(format!(
        "unknown VaR method '{other}'"
      ))),
    }
  }
}

fn validate(returns: &[f64], confidence_level: f64, portfolio_value: f64) -> Result<()> {
  if returns.is_empty() {
    return Err(AnalyticsError::insufficient("VaR needs at least one return"));
  }
  if !(confidence_level > 0.0 && confidence_level < 100.0) {
    return Err(AnalyticsError::invalid(format!(
      "confidence level must be in (0, 100), got {confidence_level}"
    )));
  }
  if !(portfolio_value.is_finite() && portfolio_value > 0.0) {
    return Err(AnalyticsError::invalid(format!(
      "portfolio value must be positive, got {portfolio_value}"
    )));
  }
  Ok(())
}

/// Loss not exceeded with probability `confidence_level / 100`, in currency
/// units of `portfolio_value`.
pub fn value_at_risk(
  returns: &[f64],
  confidence_level: f64,
  method: VarMethod,
  portfolio_value: f64,
) -> Result<f64> {
  validate(returns, confidence_level, portfolio_value)?;
  Ok(method.fractional_var(returns, confidence_level)? * portfolio_value)
}

/// Average loss over the observed returns at or beyond the VaR threshold.
///
/// Fails with [`AnalyticsError::DegenerateInput`] when no observed return
/// reaches the threshold.
pub fn conditional_value_at_risk(
  returns: &[f64],
  confidence_level: f64,
  method: VarMethod,
  portfolio_value: f64,
) -> Result<f64> {
  validate(returns, confidence_level, portfolio_value)?;
  let var = method.fractional_var(returns, confidence_level)?;

  let tail: Vec<f64> = returns.iter().copied().filter(|&r| r <= -var).collect();
  if tail.is_empty() {
    return Err(AnalyticsError::degenerate(format!(
      "no observed return at or below the {method} VaR threshold {:.6}",
      -var
    )));
  }

  Ok(-stats::mean(&tail) * portfolio_value)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use rand::SeedableRng;
  use rand_distr::Distribution;

  use super::*;

  const SAMPLE: [f64; 5] = [-0.05, -0.02, 0.0, 0.01, 0.03];

  fn normal_sample(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let dist = rand_distr::Normal::new(0.0005, 0.01).unwrap();
    (0..n).map(|_| dist.sample(&mut rng)).collect()
  }

  #[test]
  fn historical_var_matches_hand_computed_percentile() {
    // 20th percentile: position 0.8 between -0.05 and -0.02 -> -0.026
    let var = value_at_risk(&SAMPLE, 80.0, VarMethod::Historical, 1000.0).unwrap();
    assert_abs_diff_eq!(var, 26.0, epsilon = 1e-9);
  }

  #[test]
  fn parametric_var_uses_lower_tail_quantile() {
    let mu = stats::mean(&SAMPLE);
    let sigma = stats::population_std(&SAMPLE);
    let var = value_at_risk(&SAMPLE, 95.0, VarMethod::VarianceCovariance, 1.0).unwrap();
    assert_abs_diff_eq!(var, 1.6448536269514722 * sigma - mu, epsilon = 1e-9);
    assert!(var > 0.0);
  }

  #[test]
  fn estimators_agree_on_normal_data() {
    let returns = normal_sample(20_000, 7);
    let hist = value_at_risk(&returns, 95.0, VarMethod::Historical, 1.0).unwrap();
    let param = value_at_risk(&returns, 95.0, VarMethod::VarianceCovariance, 1.0).unwrap();
    let mc = value_at_risk(&returns, 95.0, VarMethod::monte_carlo(Some(11)), 1.0).unwrap();

    assert!((hist - param).abs() < 1e-3, "hist={hist} param={param}");
    assert!((mc - param).abs() < 1e-3, "mc={mc} param={param}");
  }

  #[test]
  fn seeded_monte_carlo_is_reproducible() {
    let returns = normal_sample(250, 3);
    let method = VarMethod::monte_carlo(Some(42));
    let a = value_at_risk(&returns, 99.0, method, 10_000.0).unwrap();
    let b = value_at_risk(&returns, 99.0, method, 10_000.0).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn cvar_is_at_least_as_severe_as_var() {
    let returns = normal_sample(2_000, 5);
    for method in [
      VarMethod::Historical,
      VarMethod::VarianceCovariance,
      VarMethod::monte_carlo(Some(1)),
    ] {
      for confidence in [90.0, 95.0, 99.0] {
        let var = value_at_risk(&returns, confidence, method, 10_000.0).unwrap();
        let cvar = conditional_value_at_risk(&returns, confidence, method, 10_000.0).unwrap();
        assert!(cvar >= var - 1e-9, "{method}: cvar={cvar} var={var}");
      }
    }
  }

  #[test]
  fn historical_cvar_averages_tail() {
    // threshold -0.026 keeps only -0.05
    let cvar = conditional_value_at_risk(&SAMPLE, 80.0, VarMethod::Historical, 1000.0).unwrap();
    assert_abs_diff_eq!(cvar, 50.0, epsilon = 1e-9);
  }

  #[test]
  fn empty_tail_is_degenerate() {
    // mu = 0.25, sigma ~ 0.433: the parametric threshold mu - 1.645 sigma
    // lies below every observation.
    let returns = [0.0, 0.0, 0.0, 1.0];
    let res = conditional_value_at_risk(&returns, 95.0, VarMethod::VarianceCovariance, 100.0);
    assert!(matches!(res, Err(AnalyticsError::DegenerateInput(_))));
  }

  #[test]
  fn zero_variance_parametric_var_is_negated_mean() {
    let var = value_at_risk(&[0.02; 4], 95.0, VarMethod::VarianceCovariance, 1.0).unwrap();
    assert_abs_diff_eq!(var, -0.02, epsilon = 1e-15);
  }

  #[test]
  fn rejects_out_of_domain_parameters() {
    assert!(matches!(
      value_at_risk(&SAMPLE, 100.0, VarMethod::Historical, 1.0),
      Err(AnalyticsError::InvalidInput(_))
    ));
    assert!(matches!(
      value_at_risk(&SAMPLE, 95.0, VarMethod::Historical, 0.0),
      Err(AnalyticsError::InvalidInput(_))
    ));
    assert!(matches!(
      value_at_risk(&[], 95.0, VarMethod::Historical, 1.0),
      Err(AnalyticsError::InsufficientData(_))
    ));
  }

  #[test]
  fn parses_method_names() {
    assert_eq!("Historical".parse::<VarMethod>().unwrap(), VarMethod::Historical);
    assert_eq!(
      "Variance-Covariance".parse::<VarMethod>().unwrap(),
      VarMethod::VarianceCovariance
    );
    assert!(matches!(
      "Monte Carlo".parse::<VarMethod>().unwrap(),
      VarMethod::MonteCarlo { .. }
    ));
    assert!("garch".parse::<VarMethod>().is_err());
  }
}
