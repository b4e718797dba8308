//! Criterion benchmarks for PortLab hot paths.
//!
//! Benchmarks:
//! 1. Portfolio return construction (weighted simple returns over a wide table)
//! 2. Metrics battery over a long daily return series
//! 3. CSV ingestion of a wide price file

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use portlab_core::{
    compute_metrics, compute_returns, Frequency, PriceIngestor, PriceTable, ReturnPoint,
    ReturnSeries, WeightMap,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn random_walk_table(rows: usize, assets: usize, seed: u64) -> PriceTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let dates = (0..rows)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let columns = (0..assets)
        .map(|a| {
            let mut price = 100.0;
            let column = (0..rows)
                .map(|_| {
                    price *= 1.0 + rng.gen_range(-0.03..0.03);
                    Some(price)
                })
                .collect();
            (format!("ASSET{a}"), column)
        })
        .collect();
    PriceTable::new(dates, columns).unwrap()
}

fn equal_weights(table: &PriceTable) -> WeightMap {
    table.assets().iter().map(|a| (a.clone(), 1.0)).collect()
}

fn random_series(n: usize, seed: u64) -> ReturnSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    ReturnSeries::from_points(
        (0..n)
            .map(|i| ReturnPoint {
                date: start + chrono::Duration::days(i as i64),
                value: rng.gen_range(-0.05..0.05),
            })
            .collect(),
    )
}

// ── 1. Returns ───────────────────────────────────────────────────────

fn bench_returns(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_returns");
    for &assets in &[4usize, 32, 128] {
        let table = random_walk_table(2520, assets, 7);
        let weights = equal_weights(&table);
        group.bench_with_input(BenchmarkId::from_parameter(assets), &assets, |b, _| {
            b.iter(|| compute_returns(black_box(&table), black_box(&weights)).unwrap())
        });
    }
    group.finish();
}

// ── 2. Metrics ───────────────────────────────────────────────────────

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_metrics");
    for &n in &[252usize, 2520, 25200] {
        let series = random_series(n, 11);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| compute_metrics(black_box(&series), Frequency::Daily))
        });
    }
    group.finish();
}

// ── 3. Ingestion ─────────────────────────────────────────────────────

fn bench_ingest(c: &mut Criterion) {
    let csv = random_walk_table(2520, 32, 3).to_csv().unwrap();
    let ingestor = PriceIngestor::new();
    c.bench_function("ingest_csv_2520x32", |b| {
        b.iter(|| ingestor.ingest_reader(black_box(csv.as_bytes())).unwrap())
    });
}

criterion_group!(benches, bench_returns, bench_metrics, bench_ingest);
criterion_main!(benches);
