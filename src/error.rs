//! # Error
//!
//! $$
//! f:\ \text{inputs}\to \text{value} \ \cup\ \{\bot\}
//! $$
//!
//! Error kinds surfaced by the analytics engine.

use thiserror::Error;

/// Errors raised by return construction, metrics and optimization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
  /// Too few observations to build a series or estimate a statistic.
  #[error("insufficient data: {0}")]
  InsufficientData(String),
  /// The computation is mathematically undefined for the given input
  /// (zero variance, empty tail set, zero running maximum, ...).
  #[error("degenerate input: {0}")]
  DegenerateInput(String),
  /// The solver failed to converge or the constraints are infeasible.
  #[error("optimization failed: {0}")]
  Optimization(String),
  /// Opaque failure reported by the market-data collaborator.
  #[error("external data error: {0}")]
  ExternalData(String),
  /// A scalar parameter or series shape is outside its domain.
  #[error("invalid input: {0}")]
  InvalidInput(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl AnalyticsError {
  pub(crate) fn insufficient(msg: impl Into<String>) -> Self {
    Self::InsufficientData(msg.into())
  }

  pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
    Self::DegenerateInput(msg.into())
  }

  pub(crate) fn optimization(msg: impl Into<String>) -> Self {
    Self::Optimization(msg.into())
  }

  pub(crate) fn invalid(msg: impl Into<String>) -> Self {
    Self::InvalidInput(msg.into())
  }
}
