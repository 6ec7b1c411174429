//! Frozen reach network: per-alias downstream targets and CSR upstream lists.
//!
//! Built once from the reach table and then only read. Each alias has at most
//! one downstream edge; the upstream relation is stored as a pair of CSR
//! arrays so that fetching the direct upstream reaches of an alias is a
//! contiguous slice.

use crate::debug_invariants::{DebugInvariants, violation};
use crate::nav_error::NavError;
use crate::topology::alias::{Alias, AliasMap, Downstream};
use crate::topology::reach::{ReachId, ReachRecord};
use serde::{Deserialize, Serialize};

/// Rule for which upstream reach continues the current flow path at a
/// confluence; the others are queued as branches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchOrder {
    /// First upstream reach in reach-table order continues.
    #[default]
    InputOrder,
    /// Upstream reach with the smallest external id continues.
    ReachIdAscending,
}

/// Immutable network over the aliases of one region.
#[derive(Clone, Debug)]
pub struct Network {
    aliases: AliasMap,
    downstream: Vec<Downstream>,
    travel_time: Vec<f32>,
    length: Vec<f32>,
    /// CSR offsets into `up_srcs`, length `N + 1`.
    up_offsets: Vec<u32>,
    up_srcs: Vec<Alias>,
    outlets: Vec<Alias>,
    branch_order: BranchOrder,
}

impl Network {
    /// Build aliases and the network from a reach table in one step.
    pub fn from_records(records: &[ReachRecord]) -> Result<Self, NavError> {
        let aliases = AliasMap::from_records(records)?;
        Self::build(records, aliases)
    }

    /// Build the network from `records`, which must be the records `aliases`
    /// was built from, in the same order.
    ///
    /// # Errors
    /// * [`NavError::InvalidConfig`] if `aliases` does not list the records'
    ///   ids in record order.
    /// * [`NavError::InvalidAttribute`] for negative or non-finite time/length.
    /// * [`NavError::DanglingDownstream`] for a non-outlet reach draining to an
    ///   id that is not in the region.
    pub fn build(records: &[ReachRecord], aliases: AliasMap) -> Result<Self, NavError> {
        if records.len() != aliases.len() {
            return Err(NavError::InvalidConfig(format!(
                "alias map covers {} reaches but the table has {}",
                aliases.len(),
                records.len()
            )));
        }
        let n = records.len();
        let mut downstream = Vec::with_capacity(n);
        let mut travel_time = Vec::with_capacity(n);
        let mut length = Vec::with_capacity(n);
        let mut outlets = Vec::new();

        // 1) downstream targets and attributes
        for (i, (rec, &id)) in records.iter().zip(aliases.reach_ids()).enumerate() {
            // per-alias arrays are filled by record position
            if rec.id != id {
                return Err(NavError::InvalidConfig(format!(
                    "record {i} is reach {} but the alias map assigns alias {i} to reach {id}",
                    rec.id
                )));
            }
            rec.validate()?;
            let ds = if rec.outlet {
                Downstream::Outlet
            } else {
                match aliases.resolve(rec.downstream) {
                    Downstream::Outlet => {
                        if let Some(target) = rec.downstream {
                            return Err(NavError::DanglingDownstream {
                                reach: rec.id,
                                downstream: target,
                            });
                        }
                        Downstream::Outlet
                    }
                    reach => reach,
                }
            };
            if ds.is_outlet() {
                outlets.push(Alias::from_index(i));
            }
            downstream.push(ds);
            travel_time.push(rec.travel_time);
            length.push(rec.length);
        }

        // 2) upstream degree counts and prefix sums
        let mut up_offsets = vec![0u32; n + 1];
        for ds in &downstream {
            if let Downstream::Reach(d) = ds {
                up_offsets[d.index() + 1] += 1;
            }
        }
        for i in 0..n {
            up_offsets[i + 1] += up_offsets[i];
        }

        // 3) populate sources; iterating aliases in order keeps input order per list
        let m = up_offsets[n] as usize;
        let mut up_srcs: Vec<Option<Alias>> = vec![None; m];
        let mut write = up_offsets.clone();
        for (i, ds) in downstream.iter().enumerate() {
            if let Downstream::Reach(d) = ds {
                let pos = write[d.index()] as usize;
                up_srcs[pos] = Some(Alias::from_index(i));
                write[d.index()] += 1;
            }
        }
        let up_srcs: Vec<Alias> = up_srcs.into_iter().flatten().collect();

        let net = Self {
            aliases,
            downstream,
            travel_time,
            length,
            up_offsets,
            up_srcs,
            outlets,
            branch_order: BranchOrder::InputOrder,
        };
        crate::debug_invariants!(net.validate_invariants(), "Network::build");
        log::debug!(
            "network: {} reaches, {} outlets, {} upstream edges",
            net.len(),
            net.outlets.len(),
            net.up_srcs.len()
        );
        Ok(net)
    }

    /// Reorder every upstream list so its first entry follows `order`.
    pub fn apply_branch_order(&mut self, order: BranchOrder) {
        self.branch_order = order;
        match order {
            BranchOrder::InputOrder => {
                for i in 0..self.len() {
                    let (lo, hi) = self.span(i);
                    self.up_srcs[lo..hi].sort_unstable();
                }
            }
            BranchOrder::ReachIdAscending => {
                let ids = self.aliases.reach_ids();
                for i in 0..self.len() {
                    let (lo, hi) = self.span(i);
                    self.up_srcs[lo..hi].sort_unstable_by_key(|a| ids[a.index()]);
                }
            }
        }
    }

    /// Order the upstream lists currently follow.
    #[inline]
    pub fn branch_order(&self) -> BranchOrder {
        self.branch_order
    }

    #[inline]
    fn span(&self, i: usize) -> (usize, usize) {
        (self.up_offsets[i] as usize, self.up_offsets[i + 1] as usize)
    }

    /// Direct upstream reaches of `alias`.
    #[inline]
    pub fn upstream(&self, alias: Alias) -> &[Alias] {
        let (lo, hi) = self.span(alias.index());
        &self.up_srcs[lo..hi]
    }

    /// Where `alias` drains to.
    #[inline]
    pub fn downstream(&self, alias: Alias) -> Downstream {
        self.downstream[alias.index()]
    }

    #[inline]
    pub fn travel_time(&self, alias: Alias) -> f32 {
        self.travel_time[alias.index()]
    }

    #[inline]
    pub fn length(&self, alias: Alias) -> f32 {
        self.length[alias.index()]
    }

    /// Outlet aliases in input order.
    #[inline]
    pub fn outlets(&self) -> &[Alias] {
        &self.outlets
    }

    #[inline]
    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Reach id for `alias`; aliases come from this network so the lookup is total.
    #[inline]
    pub fn reach_id(&self, alias: Alias) -> ReachId {
        self.aliases.reach_ids()[alias.index()]
    }

    /// Number of reaches.
    #[inline]
    pub fn len(&self) -> usize {
        self.downstream.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.downstream.is_empty()
    }

    /// Iterate all aliases.
    pub fn iter_aliases(&self) -> impl Iterator<Item = Alias> + '_ {
        (0..self.len()).map(Alias::from_index)
    }

    /// Whether `alias` has no upstream reaches.
    #[inline]
    pub fn is_headwater(&self, alias: Alias) -> bool {
        self.upstream(alias).is_empty()
    }
}

impl DebugInvariants for Network {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Network");
    }

    fn validate_invariants(&self) -> Result<(), NavError> {
        let n = self.len();
        if self.up_offsets.len() != n + 1 || self.aliases.len() != n {
            return Err(violation("network arrays disagree on reach count"));
        }
        if self.up_offsets[n] as usize != self.up_srcs.len() {
            return Err(violation("CSR offsets do not cover upstream sources"));
        }
        for a in self.iter_aliases() {
            for &u in self.upstream(a) {
                if self.downstream(u) != Downstream::Reach(a) {
                    return Err(violation(format!(
                        "alias {u} listed upstream of {a} but drains elsewhere"
                    )));
                }
            }
        }
        let outlet_count = self.downstream.iter().filter(|d| d.is_outlet()).count();
        if outlet_count != self.outlets.len() {
            return Err(violation("outlet list does not match downstream table"));
        }
        Ok(())
    }
}
