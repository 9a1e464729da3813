//! Criterion benchmarks for table assembly.
//!
//! Two benchmark groups:
//! - `compile`: records to recipe book to graph
//! - `assemble`: full-catalog resolution over a frozen graph

use criterion::{criterion_group, criterion_main, Criterion};
use rawcraft_core::compile::compile_recipes;
use rawcraft_core::rules::RuleSet;
use rawcraft_core::table::{assemble_table, AssembleOptions, Catalog};
use rawcraft_core::test_utils::*;

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_compile(c: &mut Criterion) {
    let rules = RuleSet::standard();
    let records = layered_records(100, 8);

    let mut group = c.benchmark_group("compile");
    group.bench_function("800_records", |b| {
        b.iter(|| {
            let (book, _) = compile_recipes(&records, &rules);
            book.to_graph()
        });
    });
    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let rules = RuleSet::standard();
    let records = layered_records(100, 8);
    let graph = compile_recipes(&records, &rules).0.to_graph();
    let names: Vec<&str> = records.keys().map(String::as_str).collect();
    let catalog = Catalog::new(names.iter().copied(), names.iter().copied());
    let options = AssembleOptions::default();

    let mut group = c.benchmark_group("assemble");
    group.bench_function("800_items_8_tiers", |b| {
        b.iter(|| assemble_table(&graph, &catalog, &rules, &options).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_compile, bench_assemble);
criterion_main!(benches);
