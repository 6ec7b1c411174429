mod util;

use proptest::prelude::*;
use reach_navigator::prelude::*;
use util::{independent_sum, pipeline, random_forest};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_alias_located_once(seed in any::<u64>(), n in 1usize..250, p in 0.0f64..0.3) {
        let recs = random_forest(seed, n, p);
        let (net, table, map, _) = pipeline(&recs, &TraceOptions::default()).unwrap();

        // each alias owns exactly one cell
        let mut owned = vec![0usize; net.len()];
        for row in table.rows() {
            for a in &row.aliases {
                owned[a.index()] += 1;
            }
        }
        prop_assert!(owned.iter().all(|&c| c == 1));
        prop_assert_eq!(map.len(), net.len());

        // a locator's row range is exactly the rows whose walk passes through it
        for a in net.iter_aliases() {
            let loc = map.get(a).unwrap();
            for r in 0..table.len() {
                let hit = table.walk_cell(r, loc.column()).map(|c| c.alias) == Some(a);
                prop_assert_eq!(hit, loc.rows().contains(&r), "alias {} row {}", a, r);
            }
        }
    }

    #[test]
    fn cumulative_values_match_walk(seed in any::<u64>(), n in 1usize..250) {
        let recs = random_forest(seed, n, 0.1);
        let (net, table, map, paths) = pipeline(&recs, &TraceOptions::default()).unwrap();

        for a in net.iter_aliases() {
            let loc = map.get(a).unwrap();
            let got = paths.cumulative(loc.row_start as usize, loc.column()).unwrap();
            prop_assert_eq!(got, independent_sum(&recs, net.reach_id(a)));
        }
        // last column of every row is a headwater
        for row in table.rows() {
            let last = *row.aliases.last().unwrap();
            prop_assert!(net.is_headwater(last));
        }
    }

    #[test]
    fn upstream_query_is_subtree(seed in any::<u64>(), n in 1usize..120) {
        let recs = random_forest(seed, n, 0.1);
        let nav = NavigatorBuilder::default().build("p", &recs).unwrap();
        let query = recs[0].id;
        let up = nav.upstream(query).unwrap();
        prop_assert_eq!(up[0].reach, query);

        // brute force: reaches whose downstream walk passes through `query`
        let mut want: Vec<u64> = recs
            .iter()
            .filter(|r| util::walk_from_outlet(&recs, r.id).iter().any(|w| w.id == query))
            .map(|r| r.id.get())
            .collect();
        want.sort_unstable();
        let mut got: Vec<u64> = up.iter().map(|u| u.reach.get()).collect();
        got.sort_unstable();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn branch_orders_cover_same_cells(seed in any::<u64>(), n in 1usize..150) {
        let recs = random_forest(seed, n, 0.1);
        let by_input = pipeline(&recs, &TraceOptions::default()).unwrap();
        let by_id = pipeline(&recs, &TraceOptions {
            branch_order: BranchOrder::ReachIdAscending,
            ..Default::default()
        }).unwrap();
        prop_assert_eq!(by_input.1.len(), by_id.1.len());
        prop_assert_eq!(by_input.1.cell_count(), by_id.1.cell_count());
    }
}

#[cfg(feature = "rayon")]
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn parallel_matches_sequential(seed in any::<u64>(), n in 1usize..300) {
        let recs = random_forest(seed, n, 0.05);
        let seq = NavigatorBuilder::default().build("r", &recs).unwrap();
        let mut cfg = NavigatorConfig::default();
        cfg.trace.parallel = true;
        let par = NavigatorBuilder::new(cfg).build("r", &recs).unwrap();
        prop_assert_eq!(util::index_bytes(&seq), util::index_bytes(&par));
    }
}
