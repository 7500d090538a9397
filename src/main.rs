use std::env;
use std::fmt::Display;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;
use portfolio_rs::AnalyticsError;
use portfolio_rs::CsvPriceProvider;
use portfolio_rs::EngineConfig;
use portfolio_rs::PortfolioEngine;
use portfolio_rs::WeightVector;
use portfolio_rs::portfolio::PortfolioReport;
use prettytable::Table;
use prettytable::row;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const USAGE: &str = "usage: portfolio-rs <data-dir> <start YYYY-MM-DD> <end YYYY-MM-DD> \
<TICKER:WEIGHT%>... [--market TICKER] [--strategy sharpe|min_volatility|max_return] \
[--var-method historical|variance-covariance|monte-carlo] [--confidence PCT] [--value AMOUNT] [--seed N]";

struct Args {
  data_dir: String,
  start: NaiveDate,
  end: NaiveDate,
  holdings: Vec<(String, f64)>,
  market: Option<String>,
  config: EngineConfig,
}

fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn parse_args(raw: Vec<String>) -> Result<Args> {
  let mut positional = Vec::new();
  let mut market = None;
  let mut config = EngineConfig::default();

  let mut it = raw.into_iter();
  while let Some(arg) = it.next() {
    let mut value = |flag: &str| it.next().with_context(|| format!("{flag} expects a value"));
    match arg.as_str() {
      "--market" => market = Some(value("--market")?),
      "--strategy" => config.strategy = value("--strategy")?.parse()?,
      "--var-method" => config.var_method = value("--var-method")?.parse()?,
      "--confidence" => config.confidence_level = value("--confidence")?.parse()?,
      "--value" => config.portfolio_value = value("--value")?.parse()?,
      "--seed" => config.seed = Some(value("--seed")?.parse()?),
      "-h" | "--help" => bail!(USAGE),
      _ => positional.push(arg),
    }
  }

  if positional.len() < 4 {
    bail!(USAGE);
  }

  let holdings = positional[3..]
    .iter()
    .map(|h| {
      let (ticker, weight) = h
        .split_once(':')
        .with_context(|| format!("holding '{h}' must look like TICKER:WEIGHT"))?;
      let weight = weight
        .trim_end_matches('%')
        .parse::<f64>()
        .with_context(|| format!("invalid weight in '{h}'"))?;
      Ok((ticker.trim().to_uppercase(), weight))
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(Args {
    data_dir: positional[0].clone(),
    start: parse_date(&positional[1])?,
    end: parse_date(&positional[2])?,
    holdings,
    market,
    config,
  })
}

fn cell<T: Display>(value: &Result<T, AnalyticsError>) -> String {
  match value {
    Ok(v) => format!("{v:.6}"),
    Err(e) => format!("n/a ({e})"),
  }
}

fn print_report(report: &PortfolioReport, config: &EngineConfig) {
  let mut perf = Table::new();
  perf.add_row(row!["Metric", "Value"]);
  match &report.performance {
    Ok(m) => {
      perf.add_row(row!["Mean return", format!("{:.6}", m.mean_return)]);
      perf.add_row(row!["Volatility", format!("{:.6}", m.volatility)]);
      perf.add_row(row!["Sharpe ratio", format!("{:.6}", m.sharpe_ratio)]);
    }
    Err(e) => {
      perf.add_row(row!["Performance", format!("n/a ({e})")]);
    }
  }
  perf.printstd();

  let mut risk = Table::new();
  risk.add_row(row!["Risk", "Value"]);
  risk.add_row(row![
    format!("VaR {}% ({})", config.confidence_level, config.var_method),
    cell(&report.value_at_risk)
  ]);
  risk.add_row(row![
    format!("CVaR {}%", config.confidence_level),
    cell(&report.conditional_value_at_risk)
  ]);
  if let Some(beta) = &report.beta {
    risk.add_row(row!["Beta", cell(beta)]);
  }
  risk.add_row(row!["Max drawdown", cell(&report.max_drawdown)]);
  risk.add_row(row!["Sortino ratio", cell(&report.sortino)]);
  risk.printstd();

  match &report.optimization {
    Ok(opt) => {
      let mut table = Table::new();
      table.add_row(row!["Asset", "Current", "Optimized"]);
      for id in opt.optimized.weights.ids() {
        table.add_row(row![
          id,
          format!("{:.2}%", opt.initial.weights.weight_of(id).unwrap_or(0.0) * 100.0),
          format!("{:.2}%", opt.optimized.weights.weight_of(id).unwrap_or(0.0) * 100.0)
        ]);
      }
      table.add_row(row![
        "Sharpe",
        format!("{:.4}", opt.initial.sharpe),
        format!("{:.4}", opt.optimized.sharpe)
      ]);
      table.add_row(row![
        "Volatility",
        format!("{:.6}", opt.initial.volatility),
        format!("{:.6}", opt.optimized.volatility)
      ]);
      println!("Optimization ({})", opt.strategy);
      table.printstd();
    }
    Err(e) => println!("Optimization unavailable: {e}"),
  }

  match &report.frontier {
    Ok(sim) => {
      if let Some((best, _)) = sim.max_sharpe() {
        println!(
          "Frontier: {} samples, best simulated Sharpe {:.4} (return {:.6}, volatility {:.6})",
          sim.len(),
          best.sharpe,
          best.expected_return,
          best.volatility
        );
      }
    }
    Err(e) => println!("Frontier unavailable: {e}"),
  }
}

fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = parse_args(env::args().skip(1).collect())?;
  let (ids, percentages): (Vec<String>, Vec<f64>) = args.holdings.into_iter().unzip();
  let weights = WeightVector::from_percentages(ids, &percentages)?;

  let provider = CsvPriceProvider::new(&args.data_dir);
  let engine = PortfolioEngine::new(args.config);

  let data = engine
    .load(&provider, &weights, args.start, args.end)
    .context("failed to load portfolio prices")?;
  for exclusion in &data.excluded {
    println!("Excluded {}: {}", exclusion.id, exclusion.reason);
  }

  let market = match &args.market {
    Some(ticker) => Some(
      engine
        .load_benchmark(&provider, ticker, args.start, args.end)
        .with_context(|| format!("failed to load benchmark {ticker}"))?,
    ),
    None => None,
  };

  info!(periods = data.portfolio_returns.len(), "running analysis");
  let report = engine.analyze(&data, market.as_ref().map(|m| m.as_slice()));
  print_report(&report, engine.config());

  Ok(())
}
