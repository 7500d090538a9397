//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Mean-variance allocation, frontier simulation and the analytics engine.

pub mod data;
pub mod engine;
pub mod frontier;
pub mod optimizers;
pub mod solver;
pub mod types;

pub use data::AssetMoments;
pub use data::correlation_matrix;
pub use data::covariance_matrix;
pub use data::mean_vector;
pub use engine::OptimizationReport;
pub use engine::PortfolioData;
pub use engine::PortfolioEngine;
pub use engine::PortfolioReport;
pub use frontier::DEFAULT_FRONTIER_SAMPLES;
pub use frontier::FrontierSimulation;
pub use frontier::simulate_frontier;
pub use optimizers::optimize;
pub use optimizers::optimize_portfolio;
pub use optimizers::optimize_with_solver;
pub use solver::Bounds;
pub use solver::Constraint;
pub use solver::NelderMeadSolver;
pub use solver::Objective;
pub use solver::ProjectedGradientSolver;
pub use solver::Solution;
pub use solver::Solver;
pub use solver::SolverKind;
pub use solver::project;
pub use types::DEFAULT_RISK_FREE;
pub use types::FrontierSample;
pub use types::PortfolioResult;
pub use types::Strategy;
