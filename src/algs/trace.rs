//! Upstream path enumeration ("rapid trace").
//!
//! For each outlet the tracer walks upstream depth-first, keeping the current
//! root-to-cursor walk in one reusable set of working buffers. Sibling paths
//! of a tree share their whole downstream prefix, so after committing a path
//! only the buffer suffix above the next branch point is discarded; the
//! retained prefix (aliases and cumulative values) is reused as is.
//!
//! Pending branches are explicit stack frames holding the buffer depth of
//! their resume point, so resuming is a truncation rather than a search.
//!
//! # Errors
//! * [`NavError::CycleDetected`]: an alias is visited twice, or some alias is
//!   never reached from an outlet (it lies on or drains into a cycle).
//! * [`NavError::PathTooLong`]: a walk exceeds [`TraceOptions::max_length`].
//! * [`NavError::TooManyPaths`]: more than [`TraceOptions::max_paths`] rows.

use crate::data::path_table::PathTable;
use crate::nav_error::NavError;
use crate::topology::alias::Alias;
use crate::topology::network::{BranchOrder, Network};
use crate::topology::validation::check_coverage;
use serde::{Deserialize, Serialize};

/// Progress is logged every this many reaches.
const PROGRESS_EVERY: usize = 10_000;

/// Limits and policies for a trace run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Maximum reaches in one root-to-headwater walk.
    pub max_length: usize,
    /// Maximum rows in the path table.
    pub max_paths: usize,
    /// Which upstream reach continues the current path at a confluence; the
    /// network must have been reordered with [`Network::apply_branch_order`].
    pub branch_order: BranchOrder,
    /// Trace outlets on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            max_length: 3000,
            max_paths: 500_000,
            branch_order: BranchOrder::InputOrder,
            parallel: false,
        }
    }
}

impl TraceOptions {
    /// Reject limits that can never produce a table.
    pub fn validate(&self) -> Result<(), NavError> {
        if self.max_length == 0 {
            return Err(NavError::InvalidConfig("max_length must be positive".into()));
        }
        if self.max_paths == 0 {
            return Err(NavError::InvalidConfig("max_paths must be positive".into()));
        }
        if self.parallel && !cfg!(feature = "rayon") {
            log::warn!("parallel tracing requested without the `rayon` feature; tracing sequentially");
        }
        Ok(())
    }
}

/// Summary of a trace run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Outlets traced.
    pub outlets: usize,
    /// Rows committed.
    pub paths: usize,
    /// Longest root-to-headwater walk.
    pub longest_path: usize,
    /// Reaches visited.
    pub reaches: usize,
}

/// Membership record used for revisit detection.
pub trait Visit {
    /// Mark `a` visited; returns `false` if it already was.
    fn visit(&mut self, a: Alias) -> bool;
}

/// Visited flags over every alias of a network, shared by all outlets of a
/// sequential run.
#[derive(Clone, Debug)]
pub struct VisitedSet {
    flags: Vec<bool>,
    count: usize,
}

impl VisitedSet {
    /// All-clear set sized to `n` aliases.
    pub fn new(n: usize) -> Self {
        Self {
            flags: vec![false; n],
            count: 0,
        }
    }

    #[inline]
    pub fn contains(&self, a: Alias) -> bool {
        self.flags.get(a.index()).copied().unwrap_or(false)
    }

    /// Number of aliases visited.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn clear(&mut self) {
        self.flags.fill(false);
        self.count = 0;
    }
}

impl Visit for VisitedSet {
    #[inline]
    fn visit(&mut self, a: Alias) -> bool {
        let slot = &mut self.flags[a.index()];
        if *slot {
            return false;
        }
        *slot = true;
        self.count += 1;
        true
    }
}

/// Visited set private to one outlet's traversal.
#[derive(Clone, Debug, Default)]
pub struct OutletVisited(hashbrown::HashSet<Alias>);

impl OutletVisited {
    pub fn into_aliases(self) -> impl Iterator<Item = Alias> {
        self.0.into_iter()
    }
}

impl Visit for OutletVisited {
    #[inline]
    fn visit(&mut self, a: Alias) -> bool {
        self.0.insert(a)
    }
}

/// A queued branch: continue upstream from `next` after truncating the
/// buffers to `depth` (one past `resume`).
#[derive(Copy, Clone, Debug)]
struct Pending {
    resume: Alias,
    depth: usize,
    next: Alias,
}

/// Reusable per-worker traversal state.
pub struct Tracer<'a> {
    net: &'a Network,
    max_length: usize,
    max_paths: usize,
    aliases: Vec<Alias>,
    times: Vec<f32>,
    dists: Vec<f32>,
    pending: Vec<Pending>,
    longest: usize,
    progress: usize,
}

impl<'a> Tracer<'a> {
    /// Allocate working buffers once for all outlets this tracer handles.
    ///
    /// The pending stack is sized for the whole network, the most a single
    /// traversal can queue.
    pub fn new(net: &'a Network, opts: &TraceOptions) -> Self {
        Self::with_pending_capacity(net, opts, net.len())
    }

    /// Tracer whose pending stack starts empty and grows on demand.
    ///
    /// Used for pool workers, which may be created once per rayon split and
    /// usually see only part of the network.
    pub fn growable(net: &'a Network, opts: &TraceOptions) -> Self {
        Self::with_pending_capacity(net, opts, 0)
    }

    fn with_pending_capacity(net: &'a Network, opts: &TraceOptions, pending: usize) -> Self {
        let cap = opts.max_length.min(net.len());
        Self {
            net,
            max_length: opts.max_length,
            max_paths: opts.max_paths,
            aliases: Vec::with_capacity(cap),
            times: Vec::with_capacity(cap),
            dists: Vec::with_capacity(cap),
            pending: Vec::with_capacity(pending),
            longest: 0,
            progress: 0,
        }
    }

    /// Longest walk seen so far.
    pub fn longest_path(&self) -> usize {
        self.longest
    }

    /// Append `a` at the cursor, extending the running sums from the buffer start.
    #[inline]
    fn push(&mut self, a: Alias, outlet: Alias) -> Result<(), NavError> {
        if self.aliases.len() >= self.max_length {
            return Err(NavError::PathTooLong {
                outlet: self.net.reach_id(outlet),
                max_length: self.max_length,
                reaches: self.net.len(),
            });
        }
        let (t0, d0) = match (self.times.last(), self.dists.last()) {
            (Some(&t), Some(&d)) => (t, d),
            _ => (0.0, 0.0),
        };
        self.aliases.push(a);
        self.times.push(t0 + self.net.travel_time(a));
        self.dists.push(d0 + self.net.length(a));
        self.longest = self.longest.max(self.aliases.len());
        Ok(())
    }

    #[inline]
    fn truncate(&mut self, depth: usize) {
        self.aliases.truncate(depth);
        self.times.truncate(depth);
        self.dists.truncate(depth);
    }

    /// Enumerate every path of the tree rooted at `outlet` into `table`.
    pub fn trace_outlet<V: Visit>(
        &mut self,
        outlet: Alias,
        visited: &mut V,
        table: &mut PathTable,
    ) -> Result<(), NavError> {
        let net = self.net;
        self.truncate(0);
        self.pending.clear();
        let mut start_cursor = 0usize;
        let mut active = outlet;

        loop {
            if !visited.visit(active) {
                return Err(NavError::CycleDetected {
                    alias: active,
                    reach: net.reach_id(active),
                });
            }
            self.progress += 1;
            if self.progress % PROGRESS_EVERY == 0 {
                log::debug!("traced {} reaches", self.progress);
            }
            self.push(active, outlet)?;

            let upstream = net.upstream(active);
            if let Some((&first, rest)) = upstream.split_first() {
                let depth = self.aliases.len();
                // reversed so siblings pop in branch order
                for &next in rest.iter().rev() {
                    self.pending.push(Pending {
                        resume: active,
                        depth,
                        next,
                    });
                }
                active = first;
                continue;
            }

            // headwater
            table.commit(
                start_cursor,
                &self.aliases,
                &self.times,
                &self.dists,
                self.max_paths,
                net.len(),
            )?;

            let Some(frame) = self.pending.pop() else {
                break;
            };
            debug_assert_eq!(self.aliases.get(frame.depth - 1), Some(&frame.resume));
            self.truncate(frame.depth);
            start_cursor = frame.depth;
            active = frame.next;
        }
        Ok(())
    }
}

/// Trace every outlet of `net` into a new path table.
pub fn trace(net: &Network, opts: &TraceOptions) -> Result<(PathTable, TraceStats), NavError> {
    opts.validate()?;
    if net.branch_order() != opts.branch_order {
        return Err(NavError::InvalidConfig(format!(
            "network upstream lists follow {:?}, trace requested {:?}",
            net.branch_order(),
            opts.branch_order
        )));
    }
    log::info!(
        "tracing {} outlets over {} reaches",
        net.outlets().len(),
        net.len()
    );

    #[cfg(feature = "rayon")]
    let result = if opts.parallel {
        trace_parallel(net, opts)
    } else {
        trace_sequential(net, opts)
    };
    #[cfg(not(feature = "rayon"))]
    let result = trace_sequential(net, opts);

    let (table, stats) = result?;
    crate::debug_invariants!(
        crate::debug_invariants::DebugInvariants::validate_invariants(&table),
        "trace"
    );
    log::info!(
        "traced {} paths, longest {} reaches",
        stats.paths,
        stats.longest_path
    );
    Ok((table, stats))
}

fn trace_sequential(net: &Network, opts: &TraceOptions) -> Result<(PathTable, TraceStats), NavError> {
    let mut visited = VisitedSet::new(net.len());
    let mut table = PathTable::new();
    let mut tracer = Tracer::new(net, opts);
    for &outlet in net.outlets() {
        tracer.trace_outlet(outlet, &mut visited, &mut table)?;
    }
    check_coverage(net, |a| visited.contains(a))?;
    let stats = TraceStats {
        outlets: net.outlets().len(),
        paths: table.len(),
        longest_path: tracer.longest_path(),
        reaches: visited.count(),
    };
    Ok((table, stats))
}

#[cfg(feature = "rayon")]
fn trace_parallel(net: &Network, opts: &TraceOptions) -> Result<(PathTable, TraceStats), NavError> {
    use rayon::prelude::*;

    let parts: Vec<(PathTable, OutletVisited, usize)> = net
        .outlets()
        .par_iter()
        .map_init(
            || Tracer::growable(net, opts),
            |tracer, &outlet| {
                let mut visited = OutletVisited::default();
                let mut part = PathTable::new();
                tracer.trace_outlet(outlet, &mut visited, &mut part)?;
                Ok((part, visited, tracer.longest_path()))
            },
        )
        .collect::<Result<_, NavError>>()?;

    // merge in outlet order so the table matches a sequential run
    let mut visited = VisitedSet::new(net.len());
    let mut table = PathTable::new();
    let mut longest = 0;
    for (part, local, part_longest) in parts {
        for a in local.into_aliases() {
            if !visited.visit(a) {
                return Err(NavError::CycleDetected {
                    alias: a,
                    reach: net.reach_id(a),
                });
            }
        }
        table.append(part, opts.max_paths, net.len())?;
        longest = longest.max(part_longest);
    }
    check_coverage(net, |a| visited.contains(a))?;
    let stats = TraceStats {
        outlets: net.outlets().len(),
        paths: table.len(),
        longest_path: longest,
        reaches: visited.count(),
    };
    Ok((table, stats))
}
