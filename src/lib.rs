//! # portfolio-rs
//!
//! $$
//! p_t=\sum_i w_i r_{i,t},\qquad \mathbf{w}^\*=\arg\max_{\mathbf{w}\in\Delta}\frac{\mathbf{w}^\top\mu-r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Risk, performance and Modern Portfolio Theory analytics for a weighted
//! multi-asset portfolio.
//!
//! - [`returns`]: price-to-return conversion, alignment and weighted aggregation.
//! - [`performance`]: mean return, volatility and Sharpe ratio.
//! - [`risk`]: VaR, CVaR, beta, maximum drawdown and Sortino ratio.
//! - [`portfolio`]: constrained optimizer, efficient-frontier simulation and the
//!   [`portfolio::PortfolioEngine`] that runs a full analysis.
//! - [`market_data`]: price-series collaborators.

pub mod config;
pub mod error;
pub mod market_data;
pub mod performance;
pub mod portfolio;
pub mod returns;
pub mod risk;
pub mod stats;

pub use config::EngineConfig;
pub use config::SolverConfig;
pub use error::AnalyticsError;
pub use error::Result;
pub use market_data::CsvPriceProvider;
pub use market_data::MarketDataProvider;
pub use performance::PerformanceMetrics;
pub use performance::performance_metrics;
pub use portfolio::PortfolioEngine;
pub use portfolio::Strategy;
pub use portfolio::optimize;
pub use portfolio::optimize_with_solver;
pub use portfolio::simulate_frontier;
pub use returns::AssetReturnSet;
pub use returns::ReturnSeries;
pub use returns::WeightVector;
pub use returns::align;
pub use returns::build_asset_returns;
pub use returns::build_returns;
pub use returns::cumulative_returns;
pub use returns::portfolio_returns;
pub use returns::wealth_index;
pub use risk::VarMethod;
pub use risk::beta;
pub use risk::conditional_value_at_risk;
pub use risk::max_drawdown;
pub use risk::sortino_ratio;
pub use risk::value_at_risk;
