#![cfg_attr(docsrs, feature(doc_cfg))]
//! # reach-navigator
//!
//! reach-navigator builds a compact upstream-path index over a drainage
//! network. Every reach points to at most one downstream reach; for each
//! outlet the crate enumerates the flow paths reaching it, records cumulative
//! travel time and flow length along each path, and builds a lookup so any
//! reach can be located inside those paths in constant time.
//!
//! ## Pipeline
//! - [`topology::alias`]: dense aliases for external reach ids
//! - [`topology::network`]: frozen CSR upstream adjacency and outlet list
//! - [`algs::trace`]: depth-first path enumeration with bounded buffers
//! - [`algs::path_map`]: per-alias `(row_start, row_end, column)` locator
//! - [`algs::compact`]: rows trimmed to their owned span
//! - [`io`]: CSV reach tables and the random-access binary index
//! - [`navigator`]: the per-region driver and upstream queries
//!
//! ## Determinism
//!
//! Output depends only on the reach table order and [`TraceOptions`]. With
//! the `rayon` feature outlets are traced concurrently and merged in outlet
//! order, so the written index is byte-identical to a sequential run.
//!
//! ## Usage
//!
//! ```no_run
//! use reach_navigator::prelude::*;
//!
//! # fn main() -> Result<(), NavError> {
//! let records = read_reach_table_path("reaches_07.csv")?;
//! let builder = NavigatorBuilder::new(NavigatorConfig::default());
//! let nav = builder.build("07", &records)?;
//! nav.write("nav_07.rnav")?;
//!
//! let reach = ReachId::new(4_867_727)?;
//! for up in nav.upstream(reach).unwrap_or_default() {
//!     println!("{} {:.2} {:.2}", up.reach, up.time, up.length);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`TraceOptions`]: algs::trace::TraceOptions

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod io;
pub mod nav_error;
pub mod navigator;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::compact::{CompactPaths, compact};
    pub use crate::algs::path_map::{PathLocator, PathLocatorMap, build_path_map};
    pub use crate::algs::trace::{TraceOptions, TraceStats, trace};
    pub use crate::data::path_table::PathTable;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::index::{BinaryIndex, IndexReader, IndexWriter};
    pub use crate::io::reach_table::{read_reach_table, read_reach_table_path};
    pub use crate::nav_error::NavError;
    pub use crate::navigator::{
        Navigator, NavigatorBuilder, NavigatorConfig, UpstreamReach, build_regions,
    };
    pub use crate::topology::alias::{Alias, AliasMap, Downstream};
    pub use crate::topology::network::{BranchOrder, Network};
    pub use crate::topology::reach::{ReachId, ReachRecord};
}
