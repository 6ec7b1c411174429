#![allow(dead_code)]
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reach_navigator::prelude::*;

pub fn rid(x: u64) -> ReachId {
    ReachId::new(x).unwrap()
}

/// Reach `id` draining to `to` (0 = nowhere).
pub fn reach(id: u64, to: u64, time: f32, length: f32) -> ReachRecord {
    let mut r = ReachRecord::new(rid(id), time, length);
    r.downstream = ReachId::from_raw(to);
    r
}

/// Random drainage forest of `n` reaches in shuffled table order.
///
/// Reach `i` drains to a random earlier reach or is an outlet; about half the
/// outlets are flagged and point outside the region. Attributes are multiples
/// of 0.25 so cumulative sums are exact in `f32`.
pub fn random_forest(seed: u64, n: usize, outlet_prob: f64) -> Vec<ReachRecord> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let id = |i: usize| 10 + 7 * i as u64;
    let mut recs: Vec<ReachRecord> = (0..n)
        .map(|i| {
            let time = rng.gen_range(0..8) as f32 * 0.25;
            let length = rng.gen_range(1..16) as f32 * 0.25;
            let base = ReachRecord::new(rid(id(i)), time, length);
            if i == 0 || rng.gen_bool(outlet_prob) {
                if rng.gen_bool(0.5) {
                    base.draining_to(rid(1)).as_outlet()
                } else {
                    base
                }
            } else {
                base.draining_to(rid(id(rng.gen_range(0..i))))
            }
        })
        .collect();
    recs.shuffle(&mut rng);
    recs
}

/// Reaches from the outlet up to `id`, outlet first, found by following
/// downstream pointers in the raw table.
pub fn walk_from_outlet(records: &[ReachRecord], id: ReachId) -> Vec<&ReachRecord> {
    let by_id: std::collections::HashMap<ReachId, &ReachRecord> =
        records.iter().map(|r| (r.id, r)).collect();
    let mut walk = Vec::new();
    let mut cur = by_id[&id];
    loop {
        walk.push(cur);
        if cur.outlet {
            break;
        }
        match cur.downstream.and_then(|d| by_id.get(&d)) {
            Some(next) => cur = next,
            None => break,
        }
    }
    walk.reverse();
    walk
}

/// Cumulative `(time, length)` at `id`, summed from the outlet.
pub fn independent_sum(records: &[ReachRecord], id: ReachId) -> (f32, f32) {
    walk_from_outlet(records, id)
        .iter()
        .fold((0.0, 0.0), |(t, l), r| (t + r.travel_time, l + r.length))
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

/// Run the pipeline without writing anything.
pub fn pipeline(
    records: &[ReachRecord],
    opts: &TraceOptions,
) -> Result<(Network, PathTable, PathLocatorMap, CompactPaths), NavError> {
    let mut net = Network::from_records(records)?;
    net.apply_branch_order(opts.branch_order);
    let (table, _) = trace(&net, opts)?;
    let map = build_path_map(&table, net.len())?;
    let paths = compact(&table)?;
    Ok((net, table, map, paths))
}

/// Serialize a navigator to bytes with the binary index format.
pub fn index_bytes(nav: &Navigator) -> Vec<u8> {
    let mut out = Vec::new();
    BinaryIndex.write(&mut out, nav).unwrap();
    out
}
