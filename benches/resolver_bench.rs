//! Filter-resolution benchmarks.
//!
//! Measures how fast a query resolves to filters against value mappings of
//! increasing size — the hot path of every search request once the
//! encyclopedia cache is warm.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `resolve_filters` | Full category resolution × 100/1k/10k value labels |
//! | `resolve_label` | Single-label lookup (exact vs substring fallback) |
//!
//! # Viewing results
//!
//! ```sh
//! cargo bench --bench resolver_bench
//! open target/criterion/report/index.html
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use hublex_core::config::Config;
use hublex_core::resolver::resolve_filters;
use hublex_core::values::{resolve_label, ValueMappings};

/// Value mappings with `n` synthetic owner labels plus the fixed status and
/// industry mappings the category resolvers consult.
fn mappings_with(n: usize) -> ValueMappings {
    let mut mappings = ValueMappings::new();

    let owners = (0..n)
        .map(|i| (format!("Owner Number{i}"), format!("{i}")))
        .collect();
    mappings.insert("hubspot_owner_id".to_string(), owners);

    mappings.insert(
        "account_status".to_string(),
        [("Active", "evaluating"), ("Churned", "lost")]
            .into_iter()
            .map(|(l, v)| (l.to_string(), v.to_string()))
            .collect(),
    );
    mappings.insert(
        "industry".to_string(),
        [("Technology", "TECH"), ("Restaurants", "RESTAURANTS")]
            .into_iter()
            .map(|(l, v)| (l.to_string(), v.to_string()))
            .collect(),
    );
    mappings
}

// ---------------------------------------------------------------------------
// Full category resolution × mapping size
// ---------------------------------------------------------------------------

fn resolve_filters_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_filters");
    let keywords = Config::defaults().keywords;
    let property_names = ["name", "city", "account_status", "next_renewal_date"];

    for &n in &[100usize, 1_000, 10_000] {
        let mappings = mappings_with(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("owner_status_city", n), &mappings, |b, m| {
            b.iter(|| {
                resolve_filters(
                    black_box("Owner Number42's active companies in Dallas"),
                    m,
                    property_names.to_vec(),
                    &keywords,
                    None,
                )
            })
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Single-label lookup paths
// ---------------------------------------------------------------------------

fn resolve_label_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_label");
    let mapping = mappings_with(10_000)
        .remove("hubspot_owner_id")
        .expect("owner mapping present");

    group.bench_function("exact_hit", |b| {
        b.iter(|| resolve_label(&mapping, black_box("Owner Number5000")))
    });
    group.bench_function("case_insensitive_hit", |b| {
        b.iter(|| resolve_label(&mapping, black_box("owner number5000")))
    });
    group.bench_function("substring_fallback", |b| {
        b.iter(|| resolve_label(&mapping, black_box("companies of owner number5000 please")))
    });
    group.bench_function("pass_through_miss", |b| {
        b.iter(|| resolve_label(&mapping, black_box("no such person")))
    });
    group.finish();
}

criterion_group!(benches, resolve_filters_bench, resolve_label_bench);
criterion_main!(benches);
