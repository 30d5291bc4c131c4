//! Benchmarks for full pipeline passes.
//!
//! Run with: cargo bench -p pipeline-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pipeline_engine::{
    compute_pipeline, ColumnFilter, Dataset, PipelineCache, PipelineConfig, PipelineSettings, Row,
    SortSpec, Value,
};

const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];
const PRODUCTS: [&str; 4] = ["Widget", "Gadget", "Gizmo", "Doohickey"];

fn generate(count: usize) -> Dataset {
    let rows = (0..count)
        .map(|i| {
            Row::from_pairs([
                ("region", Value::from(REGIONS[i % REGIONS.len()])),
                ("product", Value::from(PRODUCTS[(i / 7) % PRODUCTS.len()])),
                ("amount", Value::from(((i * 7919) % 10_000) as f64 / 10.0)),
                ("target", Value::from(500.0 + (i % 13) as f64 * 25.0)),
                ("day", Value::from(format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1))),
            ])
        })
        .collect();
    Dataset::from_rows(rows)
}

fn grouped_config() -> PipelineConfig {
    PipelineConfig::new()
        .with_group_fields(["region", "product"])
        .with_sort(vec![SortSpec::descending("amount")])
        .with_filter("amount", ColumnFilter::Contains(">100".into()))
        .with_pagination(0, 50)
}

fn bench_flat_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_pass");
    let settings = PipelineSettings::default();
    let config = PipelineConfig::new()
        .with_sort(vec![SortSpec::ascending("product"), SortSpec::descending("amount")])
        .with_filter("region", ColumnFilter::In(vec![Value::from("North"), Value::from("East")]))
        .with_pagination(0, 100);

    for size in [1_000, 10_000, 50_000].iter() {
        let data = generate(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), &data, |b, data| {
            b.iter(|| compute_pipeline(black_box(data), &config, &settings));
        });
    }
    group.finish();
}

fn bench_grouped_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouped_pass");
    let settings = PipelineSettings::default();
    let config = grouped_config();

    for size in [1_000, 10_000, 50_000].iter() {
        let data = generate(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), &data, |b, data| {
            b.iter(|| compute_pipeline(black_box(data), &config, &settings));
        });
    }
    group.finish();
}

fn bench_cached_pass(c: &mut Criterion) {
    let data = generate(10_000);
    let config = grouped_config();
    let mut cache = PipelineCache::default();
    cache.compute(&data, &config);

    c.bench_function("cached_pass_hit", |b| {
        b.iter(|| cache.compute(black_box(&data), black_box(&config)));
    });
}

criterion_group!(benches, bench_flat_pass, bench_grouped_pass, bench_cached_pass);
criterion_main!(benches);
