//! # Returns
//!
//! $$
//! r_t=\frac{P_{t+1}}{P_t}-1,\qquad p_t=\sum_i w_i\,r_{i,t}
//! $$
//!
//! Simple-return construction, multi-asset alignment and weighted
//! aggregation into a portfolio return series.

use std::collections::HashSet;
use std::ops::Deref;

use tracing::warn;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Tolerance (as a fraction) used when checking user-supplied weights.
pub const INPUT_WEIGHT_TOLERANCE: f64 = 1e-4;

/// Tolerance on the weight sum of a valid allocation.
pub const ALLOCATION_TOLERANCE: f64 = 1e-2;

/// Ordered sequence of finite simple returns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReturnSeries {
  values: Vec<f64>,
}

impl ReturnSeries {
  /// Wrap raw returns, rejecting `NaN`/`Inf` values.
  pub fn new(values: Vec<f64>) -> Result<Self> {
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
      return Err(AnalyticsError::invalid(format!(
        "return at index {idx} is not finite"
      )));
    }
    Ok(Self { values })
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.values
  }

  fn truncated(&self, len: usize) -> Self {
    Self {
      values: self.values[..len.min(self.values.len())].to_vec(),
    }
  }
}

impl Deref for ReturnSeries {
  type Target = [f64];

  fn deref(&self) -> &Self::Target {
    &self.values
  }
}

impl TryFrom<Vec<f64>> for ReturnSeries {
  type Error = AnalyticsError;

  fn try_from(values: Vec<f64>) -> Result<Self> {
    Self::new(values)
  }
}

/// Convert a price series into simple returns.
///
/// Fails with [`AnalyticsError::InsufficientData`] when fewer than two prices
/// are supplied and with [`AnalyticsError::InvalidInput`] when a price is not
/// strictly positive and finite.
pub fn build_returns(prices: &[f64]) -> Result<ReturnSeries> {
  if prices.len() < 2 {
    return Err(AnalyticsError::insufficient(format!(
      "need at least 2 prices, got {}",
      prices.len()
    )));
  }

  if let Some(idx) = prices.iter().position(|p| !(p.is_finite() && *p > 0.0)) {
    return Err(AnalyticsError::invalid(format!(
      "price at index {idx} must be positive and finite, got {}",
      prices[idx]
    )));
  }

  let values = prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
  ReturnSeries::new(values)
}

/// Aligned per-asset returns sharing a common length and asset ordering.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetReturnSet {
  ids: Vec<String>,
  series: Vec<ReturnSeries>,
  n_periods: usize,
}

impl AssetReturnSet {
  /// Asset identifiers in their explicit order.
  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  /// Return series parallel to [`AssetReturnSet::ids`].
  pub fn series(&self) -> &[ReturnSeries] {
    &self.series
  }

  pub fn n_assets(&self) -> usize {
    self.ids.len()
  }

  /// Shared length of every member series.
  pub fn n_periods(&self) -> usize {
    self.n_periods
  }

  pub fn get(&self, id: &str) -> Option<&ReturnSeries> {
    self.position(id).map(|i| &self.series[i])
  }

  pub fn position(&self, id: &str) -> Option<usize> {
    self.ids.iter().position(|x| x == id)
  }
}

/// Align return series to the shortest member by keeping the first `min_len`
/// observations of every series (earliest-date alignment).
pub fn align<I, S>(returns_by_asset: I) -> Result<AssetReturnSet>
where
  I: IntoIterator<Item = (S, ReturnSeries)>,
  S: Into<String>,
{
  let mut ids = Vec::new();
  let mut series = Vec::new();
  let mut seen = HashSet::new();

  for (id, returns) in returns_by_asset {
    let id: String = id.into();
    if id.trim().is_empty() {
      return Err(AnalyticsError::invalid("asset identifier must be non-empty"));
    }
    if !seen.insert(id.clone()) {
      return Err(AnalyticsError::invalid(format!(
        "duplicate asset identifier '{id}'"
      )));
    }
    ids.push(id);
    series.push(returns);
  }

  let Some(min_len) = series.iter().map(|s| s.len()).min() else {
    return Err(AnalyticsError::insufficient("no asset return series to align"));
  };

  let series = series.iter().map(|s| s.truncated(min_len)).collect();

  Ok(AssetReturnSet {
    ids,
    series,
    n_periods: min_len,
  })
}

/// An asset dropped while building an [`AssetReturnSet`].
#[derive(Clone, Debug, PartialEq)]
pub struct Exclusion {
  pub id: String,
  pub reason: AnalyticsError,
}

/// Outcome of [`build_asset_returns`]: the aligned set plus excluded assets.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetBuild {
  pub returns: AssetReturnSet,
  pub excluded: Vec<Exclusion>,
}

/// Build and align returns for several assets at once.
///
/// Assets with an empty identifier or without usable prices are excluded and
/// reported instead of failing the whole set.
pub fn build_asset_returns<I, S, P>(prices_by_asset: I) -> Result<AssetBuild>
where
  I: IntoIterator<Item = (S, P)>,
  S: AsRef<str>,
  P: AsRef<[f64]>,
{
  let mut included = Vec::new();
  let mut excluded = Vec::new();

  for (idx, (id, prices)) in prices_by_asset.into_iter().enumerate() {
    let id = id.as_ref().trim();
    if id.is_empty() {
      warn!(position = idx + 1, "empty asset identifier skipped");
      excluded.push(Exclusion {
        id: String::new(),
        reason: AnalyticsError::invalid(format!("asset {} has an empty identifier", idx + 1)),
      });
      continue;
    }

    match build_returns(prices.as_ref()) {
      Ok(returns) => included.push((id.to_string(), returns)),
      Err(reason) => {
        warn!(asset = id, %reason, "asset excluded from return set");
        excluded.push(Exclusion {
          id: id.to_string(),
          reason,
        });
      }
    }
  }

  if included.is_empty() {
    return Err(AnalyticsError::insufficient(
      "no asset produced a usable return series",
    ));
  }

  Ok(AssetBuild {
    returns: align(included)?,
    excluded,
  })
}

/// Result of checking user-supplied weights against full investment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WeightCheck {
  /// Weights sum to one within [`INPUT_WEIGHT_TOLERANCE`].
  Balanced,
  /// Weights sum to less than one.
  Under { total: f64 },
  /// Weights sum to more than one.
  Over { total: f64 },
}

/// Weights parallel-indexed to an explicit asset ordering.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector {
  ids: Vec<String>,
  weights: Vec<f64>,
}

impl WeightVector {
  pub fn new(ids: Vec<String>, weights: Vec<f64>) -> Result<Self> {
    if ids.len() != weights.len() {
      return Err(AnalyticsError::invalid(format!(
        "{} asset ids but {} weights",
        ids.len(),
        weights.len()
      )));
    }
    if let Some(idx) = weights.iter().position(|w| !w.is_finite()) {
      return Err(AnalyticsError::invalid(format!(
        "weight at index {idx} is not finite"
      )));
    }
    Ok(Self { ids, weights })
  }

  /// `1/n` on each asset.
  pub fn equal(ids: &[String]) -> Self {
    let n = ids.len().max(1) as f64;
    Self {
      ids: ids.to_vec(),
      weights: vec![1.0 / n; ids.len()],
    }
  }

  /// Build from weights expressed in percent (`50.0` means half).
  pub fn from_percentages(ids: Vec<String>, percentages: &[f64]) -> Result<Self> {
    Self::new(ids, percentages.iter().map(|p| p / 100.0).collect())
  }

  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.weights
  }

  pub fn len(&self) -> usize {
    self.weights.len()
  }

  pub fn is_empty(&self) -> bool {
    self.weights.is_empty()
  }

  pub fn total(&self) -> f64 {
    self.weights.iter().sum()
  }

  pub fn weight_of(&self, id: &str) -> Option<f64> {
    self
      .ids
      .iter()
      .position(|x| x == id)
      .map(|i| self.weights[i])
  }

  /// Compare the weight sum against full investment.
  pub fn check(&self) -> WeightCheck {
    let total = self.total();
    if (total - 1.0).abs() <= INPUT_WEIGHT_TOLERANCE {
      WeightCheck::Balanced
    } else if total > 1.0 {
      WeightCheck::Over { total }
    } else {
      WeightCheck::Under { total }
    }
  }

  /// Whether every weight lies in `[0, 1]` and the sum is within `tolerance`
  /// of one.
  pub fn is_valid_allocation(&self, tolerance: f64) -> bool {
    !self.weights.is_empty()
      && self.weights.iter().all(|w| (0.0..=1.0).contains(w))
      && (self.total() - 1.0).abs() <= tolerance
  }

  /// Reorder onto the assets of `set`, giving zero weight to assets missing
  /// from `self` and dropping weights of assets absent from `set`.
  ///
  /// With `renormalize` the remaining weights are rescaled to their original
  /// total; otherwise the dropped exposure is simply lost.
  pub fn restrict_to(&self, set: &AssetReturnSet, renormalize: bool) -> Self {
    let weights: Vec<f64> = set
      .ids()
      .iter()
      .map(|id| self.weight_of(id).unwrap_or(0.0))
      .collect();

    let kept: f64 = weights.iter().sum();
    let dropped = self.total() - kept;
    if dropped.abs() > INPUT_WEIGHT_TOLERANCE {
      warn!(
        dropped_weight = dropped,
        renormalize, "weights of excluded assets omitted from the aggregate"
      );
    }

    let weights = if renormalize && kept.abs() > f64::EPSILON {
      let scale = self.total() / kept;
      weights.iter().map(|w| w * scale).collect()
    } else {
      weights
    };

    Self {
      ids: set.ids().to_vec(),
      weights,
    }
  }
}

/// Weighted per-period sum of the asset returns in `set`.
///
/// Weights are matched by asset id; assets of `set` without a weight
/// contribute nothing and weights for unknown ids are ignored.
pub fn portfolio_returns(set: &AssetReturnSet, weights: &WeightVector) -> Result<ReturnSeries> {
  let w: Vec<f64> = set
    .ids()
    .iter()
    .map(|id| weights.weight_of(id).unwrap_or(0.0))
    .collect();

  let values = (0..set.n_periods())
    .map(|t| {
      set
        .series()
        .iter()
        .zip(w.iter())
        .map(|(s, wi)| wi * s[t])
        .sum()
    })
    .collect();

  ReturnSeries::new(values)
}

/// Running sum of returns.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
  returns
    .iter()
    .scan(0.0, |acc, r| {
      *acc += r;
      Some(*acc)
    })
    .collect()
}

/// Compounded growth of one unit: `Π (1 + r_t)`.
pub fn wealth_index(returns: &[f64]) -> Vec<f64> {
  returns
    .iter()
    .scan(1.0, |acc, r| {
      *acc *= 1.0 + r;
      Some(*acc)
    })
    .collect()
}
