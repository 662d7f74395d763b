//! Benchmarks for topology mutations and group queries.
//!
//! Splice and removal touch an O(1) neighborhood, so their cost must stay
//! flat as the cycle grows; membership queries are O(group size).

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use equigraph_core::{EngineConfig, EquivalenceGraph, Subject};

fn graph_with_cycle(members: u64, spare: u64) -> EquivalenceGraph {
    let graph = EquivalenceGraph::in_memory(&EngineConfig::default());
    for id in 1..=(members + spare) {
        graph
            .catalog()
            .upsert(Subject::new(id, &format!("Subject {id}"), 100));
    }
    if members >= 2 {
        graph.add_equivalence(1, 2, "19").unwrap();
        for id in 3..=members {
            graph.add_equivalence(1, id, "19").unwrap();
        }
    }
    graph
}

fn bench_pair_creation(c: &mut Criterion) {
    c.bench_function("pair_creation", |b| {
        b.iter_batched(
            || graph_with_cycle(0, 2),
            |graph| {
                graph.add_equivalence(1, 2, "19").unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_splice_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("splice_roundtrip");
    for size in [10u64, 100, 1_000] {
        let graph = graph_with_cycle(size, 1);
        let spare = size + 1;
        group.bench_function(format!("cycle_{size}"), |b| {
            b.iter(|| {
                graph.add_equivalence(1, spare, "19").unwrap();
                graph.remove_from_group(spare, "19").unwrap();
            });
        });
    }
    group.finish();
}

fn bench_are_equivalent(c: &mut Criterion) {
    let graph = graph_with_cycle(100, 0);
    c.bench_function("are_equivalent_cycle_100", |b| {
        b.iter(|| {
            let equivalent = graph
                .are_equivalent_by_cycle(black_box(25), black_box(75), "19")
                .unwrap();
            assert!(equivalent);
        });
    });
}

fn bench_group_members(c: &mut Criterion) {
    let graph = graph_with_cycle(100, 0);
    c.bench_function("group_members_cycle_100", |b| {
        b.iter(|| {
            let members = graph.group_members(black_box(1), "19").unwrap();
            assert_eq!(members.len(), 100);
        });
    });
}

criterion_group!(
    benches,
    bench_pair_creation,
    bench_splice_roundtrip,
    bench_are_equivalent,
    bench_group_members
);
criterion_main!(benches);
