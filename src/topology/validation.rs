//! Structural checks on the upstream forest.
//!
//! Every alias of an acyclic network reaches an outlet by following its
//! downstream pointer, so an upstream traversal from all outlets visits every
//! alias exactly once. Aliases left unvisited sit on a cycle or drain into
//! one.

use crate::nav_error::NavError;
use crate::topology::alias::{Alias, Downstream};
use crate::topology::network::Network;

/// Walk downstream from `start` until an alias repeats; return that alias.
///
/// Returns `None` if the walk reaches an outlet.
pub fn cycle_from(net: &Network, start: Alias) -> Option<Alias> {
    let mut seen = hashbrown::HashSet::new();
    let mut cur = start;
    loop {
        if !seen.insert(cur) {
            return Some(cur);
        }
        match net.downstream(cur) {
            Downstream::Reach(next) => cur = next,
            Downstream::Outlet => return None,
        }
    }
}

/// Report the first alias not covered by a traversal as a cycle.
///
/// `visited` answers whether the traversal reached an alias.
pub fn check_coverage<F>(net: &Network, visited: F) -> Result<(), NavError>
where
    F: Fn(Alias) -> bool,
{
    for a in net.iter_aliases() {
        if visited(a) {
            continue;
        }
        // Every unvisited alias drains into a cycle; name an alias on it.
        let on_cycle = cycle_from(net, a).unwrap_or(a);
        return Err(NavError::CycleDetected {
            alias: on_cycle,
            reach: net.reach_id(on_cycle),
        });
    }
    Ok(())
}
