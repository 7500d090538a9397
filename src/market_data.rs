//! # Market Data
//!
//! Price-series collaborators. The analytics never interpret provider failures;
//! they surface as [`AnalyticsError::ExternalData`].

use std::path::PathBuf;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use csv::StringRecord;
use csv::Trim;
use tracing::debug;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Source of daily closing prices.
pub trait MarketDataProvider {
  /// Closing prices of `ticker` for `start..=end`, oldest first.
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<f64>>;
}

/// Reads `<root>/<TICKER>.csv` files with `YYYY-MM-DD` dates. Columns are
/// located by header name (`date` and `close`, case-insensitive); any other
/// columns are ignored.
#[derive(Clone, Debug)]
pub struct CsvPriceProvider {
  root: PathBuf,
}

impl CsvPriceProvider {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn external(ticker: &str, msg: impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::ExternalData(format!("{ticker}: {msg}"))
  }

  fn column(ticker: &str, headers: &StringRecord, name: &str) -> Result<usize> {
    headers
      .iter()
      .position(|h| h.eq_ignore_ascii_case(name))
      .ok_or_else(|| Self::external(ticker, format!("missing '{name}' column")))
  }

  fn parse_row(
    ticker: &str,
    record: &StringRecord,
    date_idx: usize,
    close_idx: usize,
  ) -> Result<(NaiveDate, f64)> {
    let line_no = record.position().map(|p| p.line()).unwrap_or_default();
    let (Some(date), Some(close)) = (record.get(date_idx), record.get(close_idx)) else {
      return Err(Self::external(ticker, format!("line {line_no}: missing field")));
    };

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
      .map_err(|e| Self::external(ticker, format!("line {line_no}: bad date '{date}': {e}")))?;
    let close = close
      .parse::<f64>()
      .map_err(|e| Self::external(ticker, format!("line {line_no}: bad close '{close}': {e}")))?;

    Ok((date, close))
  }
}

impl MarketDataProvider for CsvPriceProvider {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<f64>> {
    if start > end {
      return Err(AnalyticsError::invalid(format!(
        "start date {start} is after end date {end}"
      )));
    }

    let path = self.root.join(format!("{ticker}.csv"));
    let mut reader = ReaderBuilder::new()
      .trim(Trim::All)
      .from_path(&path)
      .map_err(|e| Self::external(ticker, format!("cannot read {}: {e}", path.display())))?;

    let headers = reader
      .headers()
      .map_err(|e| Self::external(ticker, format!("bad header: {e}")))?
      .clone();
    let date_idx = Self::column(ticker, &headers, "date")?;
    let close_idx = Self::column(ticker, &headers, "close")?;

    let mut rows = Vec::new();
    for record in reader.records() {
      let record = record.map_err(|e| Self::external(ticker, e))?;
      let (date, close) = Self::parse_row(ticker, &record, date_idx, close_idx)?;
      if date >= start && date <= end {
        rows.push((date, close));
      }
    }

    if rows.is_empty() {
      return Err(Self::external(
        ticker,
        format!("no data between {start} and {end}"),
      ));
    }

    rows.sort_by_key(|(date, _)| *date);
    debug!(ticker, rows = rows.len(), "prices loaded");

    Ok(rows.into_iter().map(|(_, close)| close).collect())
  }
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::io::Write;

  use super::*;

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn write_csv(dir: &tempfile::TempDir, ticker: &str, body: &str) {
    let mut f = fs::File::create(dir.path().join(format!("{ticker}.csv"))).unwrap();
    f.write_all(body.as_bytes()).unwrap();
  }

  #[test]
  fn filters_by_range_and_sorts_by_date() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
      &dir,
      "AAA",
      "date,close\n2024-01-04,103\n2024-01-02,101\n2024-01-03,102\n2024-01-08,110\n",
    );

    let provider = CsvPriceProvider::new(dir.path());
    let prices = provider
      .fetch("AAA", date("2024-01-01"), date("2024-01-05"))
      .unwrap();
    assert_eq!(prices, vec![101.0, 102.0, 103.0]);
  }

  #[test]
  fn missing_file_is_external_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = CsvPriceProvider::new(dir.path());
    assert!(matches!(
      provider.fetch("NOPE", date("2024-01-01"), date("2024-02-01")),
      Err(AnalyticsError::ExternalData(_))
    ));
  }

  #[test]
  fn empty_range_is_external_error() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir, "AAA", "date,close\n2023-06-01,50\n");
    let provider = CsvPriceProvider::new(dir.path());
    let err = provider
      .fetch("AAA", date("2024-01-01"), date("2024-02-01"))
      .unwrap_err();
    assert!(err.to_string().contains("no data"));
  }

  #[test]
  fn malformed_row_is_reported_with_line_number() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir, "AAA", "date,close\n2024-01-02,abc\n");
    let provider = CsvPriceProvider::new(dir.path());
    let err = provider
      .fetch("AAA", date("2024-01-01"), date("2024-02-01"))
      .unwrap_err();
    assert!(err.to_string().contains("line 2"));
  }

  #[test]
  fn close_column_is_found_by_header_name() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
      &dir,
      "OHLC",
      "date,open,high,low,close\n2024-01-02,1,5,0.5,100\n2024-01-03,2,6,1.5,110\n",
    );
    let provider = CsvPriceProvider::new(dir.path());
    let prices = provider
      .fetch("OHLC", date("2024-01-01"), date("2024-01-31"))
      .unwrap();
    assert_eq!(prices, vec![100.0, 110.0]);
  }

  #[test]
  fn reordered_header_is_supported() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir, "REV", "Close,Date\n100,2024-01-03\n99,2024-01-02\n");
    let provider = CsvPriceProvider::new(dir.path());
    let prices = provider
      .fetch("REV", date("2024-01-01"), date("2024-01-31"))
      .unwrap();
    assert_eq!(prices, vec![99.0, 100.0]);
  }

  #[test]
  fn missing_close_column_is_external_error() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir, "NOCLOSE", "date,open\n2024-01-02,1\n");
    let provider = CsvPriceProvider::new(dir.path());
    let err = provider
      .fetch("NOCLOSE", date("2024-01-01"), date("2024-01-31"))
      .unwrap_err();
    assert!(matches!(err, AnalyticsError::ExternalData(_)));
    assert!(err.to_string().contains("missing 'close' column"));
  }
}
