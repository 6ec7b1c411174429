mod util;

use reach_navigator::prelude::*;
use util::{index_bytes, pipeline, reach, rid};

#[test]
fn chain_of_five_is_one_row() {
    // table lists the headwater first; the outlet is 5
    let recs: Vec<_> = (1..=5)
        .map(|i| reach(i, if i == 5 { 0 } else { i + 1 }, 2.0, 1.0))
        .collect();
    let (net, table, map, _) = pipeline(&recs, &TraceOptions::default()).unwrap();
    assert_eq!(net.outlets().len(), 1);
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].times, vec![2.0, 4.0, 6.0, 8.0, 10.0]);
    let head = net.aliases().alias_of(rid(1)).unwrap();
    assert_eq!(map.get(head).unwrap().to_raw(), [0, 1, 4]);
}

#[test]
fn confluence_rows_share_the_outlet() {
    // O=1, A=2, B=3, C=4: A and B drain to O, C drains to A
    let recs = vec![
        reach(1, 0, 1.0, 10.0),
        reach(2, 1, 2.0, 20.0),
        reach(3, 1, 3.0, 30.0),
        reach(4, 2, 4.0, 40.0),
    ];
    let (net, table, map, paths) = pipeline(&recs, &TraceOptions::default()).unwrap();
    assert_eq!(table.len(), 2);

    let walk0: Vec<_> = table.walk(0).iter().map(|c| net.reach_id(c.alias)).collect();
    let walk1: Vec<_> = table.walk(1).iter().map(|c| net.reach_id(c.alias)).collect();
    assert_eq!(walk0, vec![rid(1), rid(2), rid(4)]);
    assert_eq!(walk1, vec![rid(1), rid(3)]);

    let c = net.aliases().alias_of(rid(4)).unwrap();
    let loc = map.get(c).unwrap();
    assert_eq!(paths.cumulative(loc.row_start as usize, loc.column()), Some((7.0, 70.0)));

    let outlet = net.aliases().alias_of(rid(1)).unwrap();
    assert_eq!(map.get(outlet).unwrap().to_raw(), [0, 2, 0]);
}

#[test]
fn branch_order_picks_continuation() {
    let recs = vec![reach(1, 0, 1.0, 1.0), reach(9, 1, 1.0, 1.0), reach(5, 1, 1.0, 1.0)];

    let (net, table, ..) = pipeline(&recs, &TraceOptions::default()).unwrap();
    assert_eq!(net.reach_id(table.rows()[0].aliases[1]), rid(9));

    let opts = TraceOptions {
        branch_order: BranchOrder::ReachIdAscending,
        ..Default::default()
    };
    let (net, table, ..) = pipeline(&recs, &opts).unwrap();
    assert_eq!(net.reach_id(table.rows()[0].aliases[1]), rid(5));
}

#[test]
fn mismatched_branch_order_is_rejected() {
    let net = Network::from_records(&[reach(1, 0, 1.0, 1.0)]).unwrap();
    let opts = TraceOptions {
        branch_order: BranchOrder::ReachIdAscending,
        ..Default::default()
    };
    assert!(matches!(trace(&net, &opts), Err(NavError::InvalidConfig(_))));
}

#[test]
fn too_many_paths_is_fatal() {
    // star: four headwaters on one outlet
    let mut recs = vec![reach(1, 0, 1.0, 1.0)];
    recs.extend((2..=5).map(|i| reach(i, 1, 1.0, 1.0)));
    let opts = TraceOptions {
        max_paths: 3,
        ..Default::default()
    };
    let err = pipeline(&recs, &opts).unwrap_err();
    assert_eq!(
        err,
        NavError::TooManyPaths {
            max_paths: 3,
            reaches: 5
        }
    );
    assert!(err.is_capacity());
}

#[test]
fn path_too_long_is_fatal() {
    let recs: Vec<_> = (1..=6).map(|i| reach(i, i - 1, 1.0, 1.0)).collect();
    let opts = TraceOptions {
        max_length: 5,
        ..Default::default()
    };
    match pipeline(&recs, &opts) {
        Err(NavError::PathTooLong {
            outlet,
            max_length,
            reaches,
        }) => {
            assert_eq!(outlet, rid(1));
            assert_eq!(max_length, 5);
            assert_eq!(reaches, 6);
        }
        other => panic!("expected PathTooLong, got {other:?}"),
    }
}

#[test]
fn injected_cycle_is_detected() {
    // 2 <-> 3 form a loop, 4 drains into it, 1 is a clean outlet
    let recs = vec![
        reach(1, 0, 1.0, 1.0),
        reach(2, 3, 1.0, 1.0),
        reach(3, 2, 1.0, 1.0),
        reach(4, 2, 1.0, 1.0),
    ];
    let net = Network::from_records(&recs).unwrap();
    match trace(&net, &TraceOptions::default()).unwrap_err() {
        NavError::CycleDetected { reach, .. } => {
            assert!(reach == rid(2) || reach == rid(3), "{reach} not on cycle")
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
}

#[test]
fn network_without_outlets_is_a_cycle() {
    let recs = vec![reach(1, 2, 1.0, 1.0), reach(2, 1, 1.0, 1.0)];
    let net = Network::from_records(&recs).unwrap();
    assert!(net.outlets().is_empty());
    assert!(matches!(
        trace(&net, &TraceOptions::default()),
        Err(NavError::CycleDetected { .. })
    ));
}

#[test]
fn malformed_tables_fail_at_build() {
    assert_eq!(
        Network::from_records(&[]).unwrap_err(),
        NavError::EmptyNetwork
    );
    assert_eq!(
        Network::from_records(&[reach(1, 0, 1.0, 1.0), reach(1, 0, 1.0, 1.0)]).unwrap_err(),
        NavError::DuplicateReach(rid(1))
    );
    assert!(matches!(
        Network::from_records(&[reach(1, 0, f32::NAN, 1.0)]),
        Err(NavError::InvalidAttribute { field: "travel_time", .. })
    ));
    assert!(matches!(
        Network::from_records(&[reach(1, 0, 1.0, 1.0), reach(2, 3, 1.0, 1.0)]),
        Err(NavError::DanglingDownstream { .. })
    ));
}

#[test]
fn rerun_is_byte_identical() {
    let recs = util::random_forest(7, 300, 0.05);
    let builder = NavigatorBuilder::default();
    let a = builder.build("07", &recs).unwrap();
    let b = builder.build("07", &recs).unwrap();
    assert_eq!(a, b);
    assert_eq!(index_bytes(&a), index_bytes(&b));
}

#[test]
fn upstream_query_matches_tree() {
    // 1 <- 2 <- {3, 4}; 5 is a separate outlet
    let recs = vec![
        reach(1, 0, 1.0, 1.0),
        reach(2, 1, 2.0, 1.0),
        reach(3, 2, 3.0, 1.0),
        reach(4, 2, 4.0, 1.0),
        reach(5, 0, 5.0, 1.0),
    ];
    let nav = NavigatorBuilder::default().build("x", &recs).unwrap();

    let ids: Vec<_> = nav.upstream(rid(2)).unwrap().iter().map(|u| u.reach).collect();
    util::assert_permutation(&ids, &[rid(2), rid(3), rid(4)]);
    assert_eq!(ids[0], rid(2));

    let four = nav
        .upstream(rid(2))
        .unwrap()
        .into_iter()
        .find(|u| u.reach == rid(4))
        .unwrap();
    assert_eq!(four.time, 4.0);
    assert_eq!(four.length, 1.0);

    assert_eq!(nav.upstream(rid(5)).unwrap().len(), 1);
}
