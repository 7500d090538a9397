use approx::assert_abs_diff_eq;
use portfolio_rs::*;
use portfolio_rs::portfolio::ProjectedGradientSolver;
use portfolio_rs::returns::ALLOCATION_TOLERANCE;

fn two_assets() -> AssetReturnSet {
  align(vec![
    ("A", ReturnSeries::new(vec![0.01, -0.02, 0.03, -0.01]).unwrap()),
    ("B", ReturnSeries::new(vec![0.02, 0.01, -0.01, 0.02]).unwrap()),
  ])
  .unwrap()
}

fn four_assets() -> AssetReturnSet {
  align(vec![
    (
      "AAA",
      ReturnSeries::new(vec![0.012, -0.008, 0.015, 0.002, -0.011, 0.009, 0.004, -0.003]).unwrap(),
    ),
    (
      "BBB",
      ReturnSeries::new(vec![0.004, 0.006, -0.002, 0.003, 0.005, -0.001, 0.002, 0.004]).unwrap(),
    ),
    (
      "CCC",
      ReturnSeries::new(vec![-0.02, 0.03, 0.01, -0.015, 0.025, -0.01, 0.02, 0.005]).unwrap(),
    ),
    (
      "DDD",
      ReturnSeries::new(vec![0.001, 0.002, 0.001, 0.0015, 0.002, 0.001, 0.0012, 0.0018]).unwrap(),
    ),
  ])
  .unwrap()
}

#[test]
fn equal_weight_portfolio_matches_hand_computation() {
  let set = two_assets();
  let weights = WeightVector::equal(set.ids());
  let p = portfolio_returns(&set, &weights).unwrap();

  for (a, b) in p.iter().zip([0.015, -0.005, 0.01, 0.005].iter()) {
    assert_abs_diff_eq!(a, b, epsilon = 1e-12);
  }

  let metrics = performance_metrics(&p).unwrap();
  assert_abs_diff_eq!(metrics.mean_return, 0.00625, epsilon = 1e-12);
  assert!(metrics.sharpe_ratio.is_finite());
}

#[test]
fn returns_have_one_fewer_observation_than_prices() {
  let prices = [100.0, 101.0, 99.5, 102.0, 103.5];
  assert_eq!(build_returns(&prices).unwrap().len(), prices.len() - 1);
  assert!(matches!(
    build_returns(&[100.0]),
    Err(AnalyticsError::InsufficientData(_))
  ));
}

#[test]
fn optimizer_output_is_a_valid_allocation_for_every_strategy() {
  for set in [two_assets(), four_assets()] {
    for strategy in [
      Strategy::MaximizeSharpe,
      Strategy::MinimizeVolatility,
      Strategy::MaximizeReturn,
    ] {
      let w = optimize(&set, strategy, 0.0).unwrap();
      assert_eq!(w.len(), set.n_assets());
      assert!(w.is_valid_allocation(ALLOCATION_TOLERANCE), "{strategy}: {w:?}");
    }
  }
}

#[test]
fn min_volatility_on_single_asset_is_fully_invested() {
  let set = align(vec![(
    "SOLO",
    ReturnSeries::new(vec![0.01, -0.005, 0.007]).unwrap(),
  )])
  .unwrap();
  let w = optimize(&set, Strategy::MinimizeVolatility, 0.02).unwrap();
  assert_eq!(w.as_slice(), &[1.0]);
}

#[test]
fn optimizer_dominates_the_frontier_cloud() {
  let set = four_assets();
  let sim = simulate_frontier(&set, 0.0, 2_000, Some(7)).unwrap();
  let moments = portfolio_rs::portfolio::AssetMoments::estimate(&set).unwrap();

  let w = optimize_with_solver(
    &set,
    Strategy::MinimizeVolatility,
    0.0,
    &ProjectedGradientSolver::default(),
  )
  .unwrap();
  let (calm, _) = sim.min_volatility().unwrap();
  assert!(moments.portfolio_volatility(w.as_slice()) <= calm.volatility + 1e-12);

  let w = optimize(&set, Strategy::MaximizeSharpe, 0.0).unwrap();
  let (best, _) = sim.max_sharpe().unwrap();
  assert!(moments.sample(w.as_slice(), 0.0).sharpe >= best.sharpe - 1e-9);
}

#[test]
fn seeded_frontier_is_deterministic() {
  let set = four_assets();
  let a = simulate_frontier(&set, 0.0, 1_000, Some(2024)).unwrap();
  let b = simulate_frontier(&set, 0.0, 1_000, Some(2024)).unwrap();
  assert_eq!(a, b);
  assert_eq!(a.samples.len(), 1_000);
  assert_eq!(a.weights.len(), 1_000);
  assert!(a.samples.iter().all(|s| s.volatility >= 0.0));
}

#[test]
fn cvar_is_at_least_var_for_every_method() {
  let set = four_assets();
  let p = portfolio_returns(&set, &WeightVector::equal(set.ids())).unwrap();

  for method in [
    VarMethod::Historical,
    VarMethod::VarianceCovariance,
    VarMethod::monte_carlo(Some(3)),
  ] {
    let var = value_at_risk(&p, 90.0, method, 10_000.0).unwrap();
    let cvar = conditional_value_at_risk(&p, 90.0, method, 10_000.0).unwrap();
    assert!(cvar >= var, "{method}: cvar {cvar} < var {var}");
  }
}

#[test]
fn drawdown_of_the_wealth_path_is_bounded() {
  let set = four_assets();
  let p = portfolio_returns(&set, &WeightVector::equal(set.ids())).unwrap();
  let dd = max_drawdown(&wealth_index(&p)).unwrap();
  assert!((-1.0..=0.0).contains(&dd));
}

#[test]
fn engine_runs_from_csv_files() {
  use std::fs;

  let dir = tempfile::tempdir().unwrap();
  let series = [
    ("AAA", [100.0, 101.0, 100.2, 102.5, 103.0, 101.8]),
    ("BBB", [50.0, 50.4, 50.9, 50.7, 51.2, 51.5]),
    ("MKT", [10.0, 10.1, 10.05, 10.2, 10.25, 10.2]),
  ];
  for (ticker, prices) in series {
    let mut body = String::from("date,close\n");
    for (i, p) in prices.iter().enumerate() {
      body.push_str(&format!("2024-03-{:02},{p}\n", i + 4));
    }
    fs::write(dir.path().join(format!("{ticker}.csv")), body).unwrap();
  }

  let start = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
  let end = chrono::NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
  let provider = CsvPriceProvider::new(dir.path());
  let engine = PortfolioEngine::new(EngineConfig {
    frontier_samples: 200,
    seed: Some(1),
    ..EngineConfig::default()
  });

  let weights =
    WeightVector::from_percentages(vec!["AAA".into(), "BBB".into()], &[60.0, 40.0]).unwrap();
  let data = engine.load(&provider, &weights, start, end).unwrap();
  let market = engine.load_benchmark(&provider, "MKT", start, end).unwrap();
  let report = engine.analyze(&data, Some(market.as_slice()));

  assert_eq!(data.portfolio_returns.len(), 5);
  assert!(report.performance.is_ok());
  assert!(report.beta.unwrap().is_ok());
  assert!(report.optimization.is_ok());
  assert_eq!(report.frontier.unwrap().len(), 200);
}
