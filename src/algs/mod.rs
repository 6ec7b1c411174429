//! Index-building algorithms: tracing, locating, and compacting flow paths.

pub mod compact;
pub mod path_map;
pub mod trace;

pub use compact::{CompactPaths, compact};
pub use path_map::{PathLocator, PathLocatorMap, build_path_map};
pub use trace::{TraceOptions, TraceStats, trace};
