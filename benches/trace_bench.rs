use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use reach_navigator::algs::{TraceOptions, build_path_map, compact, trace};
use reach_navigator::topology::network::Network;
use reach_navigator::topology::reach::{ReachId, ReachRecord};

fn rid(raw: u64) -> ReachId {
    ReachId::new(raw).expect("nonzero ReachId")
}

/// Full binary drainage tree: reach `k` drains to `k / 2`, reach 1 is the outlet.
fn binary_basin(levels: u32) -> Vec<ReachRecord> {
    (1..(1u64 << levels))
        .map(|k| {
            let rec = ReachRecord::new(rid(k), 0.5, 1.0);
            if k == 1 { rec } else { rec.draining_to(rid(k / 2)) }
        })
        .collect()
}

/// Long main stem with a one-reach tributary at every node.
fn comb_basin(stem: u64) -> Vec<ReachRecord> {
    let mut recs = vec![ReachRecord::new(rid(1), 0.5, 1.0)];
    for k in 2..=stem {
        recs.push(ReachRecord::new(rid(k), 0.5, 1.0).draining_to(rid(k - 1)));
        recs.push(ReachRecord::new(rid(stem + k), 0.5, 1.0).draining_to(rid(k - 1)));
    }
    recs
}

fn bench_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace");
    let opts = TraceOptions::default();

    for &levels in &[12u32, 16u32] {
        let net = Network::from_records(&binary_basin(levels)).expect("valid basin");
        group.bench_with_input(BenchmarkId::new("binary", levels), &levels, |b, _| {
            b.iter(|| black_box(trace(&net, &opts).expect("trace")));
        });
    }

    let stem = 2_000u64;
    let net = Network::from_records(&comb_basin(stem)).expect("valid basin");
    group.bench_with_input(BenchmarkId::new("comb", stem), &stem, |b, _| {
        b.iter(|| black_box(trace(&net, &opts).expect("trace")));
    });

    group.finish();
}

fn bench_map_and_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_and_compact");
    let net = Network::from_records(&binary_basin(16)).expect("valid basin");
    let (table, _) = trace(&net, &TraceOptions::default()).expect("trace");

    group.bench_function("path_map", |b| {
        b.iter(|| black_box(build_path_map(&table, net.len()).expect("map")));
    });
    group.bench_function("compact", |b| {
        b.iter(|| black_box(compact(&table).expect("compact")));
    });
    group.finish();
}

criterion_group!(benches, bench_trace, bench_map_and_compact);
criterion_main!(benches);
