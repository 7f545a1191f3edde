use std::hint::black_box;

use chrono::Months;
use chrono::NaiveDate;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use metro_risk::frame::AssetSelector;
use metro_risk::frame::AssetTable;
use metro_risk::frame::BenchmarkSeries;
use metro_risk::risk::build_engine;

const PERIODS: usize = 120;

fn monthly_dates(n: usize) -> Vec<NaiveDate> {
  let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
  (0..n)
    .map(|i| start.checked_add_months(Months::new(i as u32)).unwrap())
    .collect()
}

fn compound(returns: impl Iterator<Item = f64>) -> Vec<f64> {
  let mut level = 100.0;
  let mut out = vec![level];
  for r in returns {
    level *= 1.0 + r;
    out.push(level);
  }
  out
}

fn market(n_assets: usize) -> (AssetTable, BenchmarkSeries) {
  let dates = monthly_dates(PERIODS + 1);
  let bench: Vec<f64> = (0..PERIODS)
    .map(|t| 0.004 + 0.015 * (t as f64 * 0.8).sin())
    .collect();

  let columns = (0..n_assets).map(|j| {
    let beta = 0.6 + 0.8 * j as f64 / n_assets as f64;
    let alpha = 0.0005 * ((j % 7) as f64 - 3.0);
    let levels = compound(
      bench
        .iter()
        .enumerate()
        .map(|(t, m)| alpha + beta * m + 0.006 * (t as f64 * (1.1 + 0.13 * j as f64)).cos()),
    );
    (format!("Metro{j:03}"), levels)
  });

  let table = AssetTable::from_columns(dates.clone(), columns).unwrap();
  let benchmark = BenchmarkSeries::new(dates, compound(bench.into_iter())).unwrap();
  (table, benchmark)
}

fn bench_build(c: &mut Criterion) {
  let mut group = c.benchmark_group("RiskEngine_build");

  for &n in &[10, 50, 200] {
    let (table, benchmark) = market(n);
    group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
      b.iter(|| {
        let engine =
          build_engine(&table, &AssetSelector::First(n), benchmark.clone(), 0.0).unwrap();
        black_box(engine)
      });
    });
  }

  group.finish();
}

fn bench_frontier(c: &mut Criterion) {
  let mut group = c.benchmark_group("RiskEngine_frontier");
  group.sample_size(10);

  for &n in &[5, 20] {
    let (table, benchmark) = market(n);
    let engine = build_engine(&table, &AssetSelector::First(n), benchmark, 0.0).unwrap();
    group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
      b.iter(|| black_box(engine.compute_frontier(25)));
    });
  }

  group.finish();
}

fn bench_ranking(c: &mut Criterion) {
  let (table, benchmark) = market(200);
  let engine = build_engine(&table, &AssetSelector::First(200), benchmark, 0.0).unwrap();

  c.bench_function("RiskEngine_rank_dominators", |b| {
    b.iter(|| black_box(engine.rank_dominators("Metro100", 10).unwrap()));
  });
}

criterion_group!(benches, bench_build, bench_frontier, bench_ranking);
criterion_main!(benches);
