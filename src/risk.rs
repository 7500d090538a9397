//! # Risk
//!
//! $$
//! \mathbb P\left(L\le \mathrm{VaR}_c\right)=c
//! $$
//!
//! Tail-risk, benchmark-sensitivity and downside metrics of a return series.

pub mod beta;
pub mod drawdown;
pub mod sortino;
pub mod var;

pub use beta::beta;
pub use drawdown::max_drawdown;
pub use sortino::DEFAULT_SORTINO_RISK_FREE;
pub use sortino::sortino_ratio;
pub use var::DEFAULT_MONTE_CARLO_SAMPLES;
pub use var::VarMethod;
pub use var::conditional_value_at_risk;
pub use var::value_at_risk;
