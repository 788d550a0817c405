//! Pipeline benchmarks: planning, extraction and a full in-memory run.
//!
//! Run with: `cargo bench --package quarry-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quarry_bench::{
    MemorySource, fixture_archive, sample_csv, sample_date, sample_symbols, write_fixture_archive,
};
use quarry_lib::extract_archive;
use quarry_lib::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

fn plan_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_tasks");
    let settings = Settings::default();
    let range = DateRange::new(sample_date(), sample_date() + chrono::Days::new(29)).unwrap();

    for symbols in [10, 100, 400] {
        let pairs = sample_symbols(symbols);
        group.throughput(Throughput::Elements(symbols as u64 * 30));
        group.bench_with_input(BenchmarkId::from_parameter(symbols), &pairs, |b, pairs| {
            b.iter(|| {
                generate_tasks(
                    &range,
                    pairs,
                    &settings.data_types,
                    &settings.kline_intervals,
                    &NoOpSink,
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

fn extract_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_archive");
    group.sample_size(20);

    for rows in [1_000, 100_000] {
        let body = sample_csv(rows);
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &body, |b, body| {
            let dir = TempDir::new().unwrap();
            let archive = dir.path().join("fixture.zip");
            write_fixture_archive(&archive, "fixture.csv", body).unwrap();
            let expected = dir.path().join("fixture.csv");
            b.iter(|| extract_archive(&archive, dir.path(), &expected).unwrap());
        });
    }
    group.finish();
}

fn run_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let archive = fixture_archive("entry.csv", &sample_csv(1_000)).unwrap();
    let settings = Settings::default();
    let tasks = generate_tasks(
        &DateRange::single_day(sample_date()),
        &sample_symbols(20),
        &settings.data_types,
        &settings.kline_intervals,
        &NoOpSink,
    )
    .unwrap();

    let mut group = c.benchmark_group("dispatch");
    group.sample_size(10);
    group.throughput(Throughput::Elements(tasks.len() as u64));

    for workers in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.to_async(&runtime).iter(|| {
                let archive = archive.clone();
                let tasks = tasks.clone();
                async move {
                    let dir = TempDir::new().unwrap();
                    let mut settings = Settings::default();
                    settings.output_directory = dir.path().to_path_buf();
                    settings.download.rate_limit_delay = 0.0;

                    let fetcher = Fetcher::new(
                        Arc::new(MemorySource::new(archive, 8192)),
                        FetchConfig::from_settings(&settings),
                        Arc::new(NoOpSink),
                    );
                    Dispatcher::new(fetcher, workers).run(tasks).await.unwrap()
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, plan_benchmark, extract_benchmark, run_benchmark);
criterion_main!(benches);
