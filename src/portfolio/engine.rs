//! # Portfolio Engine
//!
//! $$
//! \text{prices}\ \to\ r_{i,t}\ \to\ p_t=\sum_i w_i r_{i,t}\ \to\ \{\text{metrics},\ \mathbf{w}^\*,\ \text{frontier}\}
//! $$
//!
//! High-level orchestration: load holdings, build the aggregate and run every
//! analysis independently.

use chrono::NaiveDate;
use nalgebra::DMatrix;
use tracing::info;
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::market_data::MarketDataProvider;
use crate::performance::PerformanceMetrics;
use crate::performance::performance_metrics;
use crate::returns::AssetReturnSet;
use crate::returns::Exclusion;
use crate::returns::ReturnSeries;
use crate::returns::WeightCheck;
use crate::returns::WeightVector;
use crate::returns::build_asset_returns;
use crate::returns::build_returns;
use crate::returns::portfolio_returns;
use crate::returns::wealth_index;
use crate::risk::beta;
use crate::risk::conditional_value_at_risk;
use crate::risk::max_drawdown;
use crate::risk::sortino_ratio;
use crate::risk::value_at_risk;
use super::data::AssetMoments;
use super::data::correlation_matrix;
use super::frontier::FrontierSimulation;
use super::frontier::simulate_frontier;
use super::optimizers::optimize_with_solver;
use super::types::PortfolioResult;
use super::types::Strategy;

/// Aligned holdings and their weighted aggregate.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioData {
  /// Aligned returns of the usable assets.
  pub returns: AssetReturnSet,
  /// Assets dropped while fetching or building returns.
  pub excluded: Vec<Exclusion>,
  /// Weights as supplied by the caller.
  pub input_weights: WeightVector,
  /// Weights mapped onto [`PortfolioData::returns`].
  pub weights: WeightVector,
  /// `p_t = Σ w_i r_{i,t}`.
  pub portfolio_returns: ReturnSeries,
}

/// Initial versus optimized allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationReport {
  pub strategy: Strategy,
  pub initial: PortfolioResult,
  pub optimized: PortfolioResult,
  pub initial_returns: ReturnSeries,
  pub optimized_returns: ReturnSeries,
  pub initial_performance: PerformanceMetrics,
  pub optimized_performance: PerformanceMetrics,
}

/// Every analysis of one portfolio. Each entry fails independently.
#[derive(Clone, Debug)]
pub struct PortfolioReport {
  pub performance: Result<PerformanceMetrics>,
  /// Currency VaR at the configured confidence level.
  pub value_at_risk: Result<f64>,
  /// Currency CVaR at the configured confidence level.
  pub conditional_value_at_risk: Result<f64>,
  /// `None` when no benchmark was supplied.
  pub beta: Option<Result<f64>>,
  /// Maximum drawdown of the compounded wealth path `Π (1 + p_t)`, not of
  /// the running sum of returns.
  pub max_drawdown: Result<f64>,
  pub sortino: Result<f64>,
  pub correlation: DMatrix<f64>,
  pub optimization: Result<OptimizationReport>,
  pub frontier: Result<FrontierSimulation>,
}

/// Single entry point for portfolio analytics.
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngine {
  config: EngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: EngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Build the aligned holdings from in-memory prices.
  pub fn prepare<I, S, P>(&self, prices_by_asset: I, weights: &WeightVector) -> Result<PortfolioData>
  where
    I: IntoIterator<Item = (S, P)>,
    S: AsRef<str>,
    P: AsRef<[f64]>,
  {
    match weights.check() {
      WeightCheck::Balanced => {}
      WeightCheck::Under { total } => {
        warn!(total_percent = total * 100.0, "weights sum to less than 100%")
      }
      WeightCheck::Over { total } => {
        warn!(total_percent = total * 100.0, "weights sum to more than 100%")
      }
    }

    let build = build_asset_returns(prices_by_asset)?;
    let restricted = weights.restrict_to(&build.returns, self.config.renormalize_excluded);
    let aggregate = portfolio_returns(&build.returns, &restricted)?;

    Ok(PortfolioData {
      returns: build.returns,
      excluded: build.excluded,
      input_weights: weights.clone(),
      weights: restricted,
      portfolio_returns: aggregate,
    })
  }

  /// Fetch every weighted asset from `provider` and build the holdings.
  ///
  /// Failed fetches exclude the asset instead of aborting the load.
  pub fn load(
    &self,
    provider: &dyn MarketDataProvider,
    weights: &WeightVector,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PortfolioData> {
    let mut fetched = Vec::new();
    let mut failed = Vec::new();

    for id in weights.ids() {
      if id.trim().is_empty() {
        continue;
      }
      match provider.fetch(id, start, end) {
        Ok(prices) => fetched.push((id.clone(), prices)),
        Err(reason) => {
          warn!(asset = %id, %reason, "price fetch failed");
          let reason = match reason {
            AnalyticsError::ExternalData(_) => reason,
            other => AnalyticsError::ExternalData(other.to_string()),
          };
          failed.push(Exclusion {
            id: id.clone(),
            reason,
          });
        }
      }
    }

    if fetched.is_empty() {
      return Err(match failed.into_iter().next() {
        Some(first) => first.reason,
        None => AnalyticsError::insufficient("no assets to load"),
      });
    }

    let mut data = self.prepare(fetched, weights)?;
    data.excluded.extend(failed);
    info!(
      assets = data.returns.n_assets(),
      excluded = data.excluded.len(),
      periods = data.returns.n_periods(),
      "portfolio loaded"
    );

    Ok(data)
  }

  /// Fetch benchmark prices and convert them to returns.
  pub fn load_benchmark(
    &self,
    provider: &dyn MarketDataProvider,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<ReturnSeries> {
    build_returns(&provider.fetch(ticker, start, end)?)
  }

  /// Run every analysis on `data`.
  pub fn analyze(&self, data: &PortfolioData, market_returns: Option<&[f64]>) -> PortfolioReport {
    let cfg = &self.config;
    let returns = data.portfolio_returns.as_slice();
    let method = cfg.resolved_var_method();

    PortfolioReport {
      performance: performance_metrics(returns),
      value_at_risk: value_at_risk(returns, cfg.confidence_level, method, cfg.portfolio_value),
      conditional_value_at_risk: conditional_value_at_risk(
        returns,
        cfg.confidence_level,
        method,
        cfg.portfolio_value,
      ),
      beta: market_returns.map(|market| {
        let n = returns.len().min(market.len());
        beta(&returns[..n], &market[..n])
      }),
      max_drawdown: max_drawdown(&wealth_index(returns)),
      sortino: sortino_ratio(returns, cfg.risk_free_rate, 0.0),
      correlation: correlation_matrix(&data.returns),
      optimization: self.optimize(data),
      frontier: simulate_frontier(
        &data.returns,
        cfg.frontier_risk_free_rate,
        cfg.frontier_samples,
        cfg.seed,
      ),
    }
  }

  /// Optimize the holdings and compare against the supplied weights.
  pub fn optimize(&self, data: &PortfolioData) -> Result<OptimizationReport> {
    let cfg = &self.config;
    let solver = cfg.solver.build(cfg.solver_config);

    let optimized_weights =
      optimize_with_solver(&data.returns, cfg.strategy, cfg.risk_free_rate, solver.as_ref())?;
    let moments = AssetMoments::estimate(&data.returns)?;

    let initial_returns = data.portfolio_returns.clone();
    let optimized_returns = portfolio_returns(&data.returns, &optimized_weights)?;

    Ok(OptimizationReport {
      strategy: cfg.strategy,
      initial: PortfolioResult::evaluate(data.weights.clone(), &moments, cfg.risk_free_rate),
      optimized: PortfolioResult::evaluate(optimized_weights, &moments, cfg.risk_free_rate),
      initial_performance: performance_metrics(&initial_returns)?,
      optimized_performance: performance_metrics(&optimized_returns)?,
      initial_returns,
      optimized_returns,
    })
  }
}
