//! NavError: Unified error type for reach-navigator public APIs
//!
//! Every fallible operation in the crate returns this error. All variants are
//! terminal for the region being processed; nothing here is retried.

use crate::topology::alias::Alias;
use crate::topology::reach::ReachId;
use thiserror::Error;

/// Unified error type for navigator construction, tracing, and I/O.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    /// Attempted to construct a ReachId with a zero value (reserved as "no downstream").
    #[error("ReachId must be non-zero (0 is reserved as the no-downstream sentinel)")]
    InvalidReachId,
    /// The same external reach id appears on more than one record.
    #[error("Malformed input: reach `{0}` appears more than once")]
    DuplicateReach(ReachId),
    /// A non-outlet reach points at a downstream reach missing from the region.
    #[error("Malformed input: reach `{reach}` drains to `{downstream}`, which is not in the region")]
    DanglingDownstream { reach: ReachId, downstream: ReachId },
    /// A reach attribute is negative or not finite.
    #[error("Malformed input: reach `{reach}` has invalid {field} = {value}")]
    InvalidAttribute {
        reach: ReachId,
        field: &'static str,
        value: f64,
    },
    /// The reach table contains no records.
    #[error("Malformed input: reach table is empty")]
    EmptyNetwork,
    /// An alias outside `[0, N)` was used against a structure of size `N`.
    #[error("Alias {alias} out of range for {len} reaches")]
    AliasOutOfRange { alias: Alias, len: usize },
    /// The upstream relation contains a cycle; expected a forest rooted at outlets.
    #[error("Structural violation: cycle detected at alias {alias} (reach `{reach}`)")]
    CycleDetected { alias: Alias, reach: ReachId },
    /// A flow path grew beyond the configured maximum length.
    #[error(
        "Capacity exceeded: flow path from outlet `{outlet}` is longer than max_length = {max_length} ({reaches} reaches in network)"
    )]
    PathTooLong {
        outlet: ReachId,
        max_length: usize,
        reaches: usize,
    },
    /// The path table grew beyond the configured maximum row count.
    #[error(
        "Capacity exceeded: more than max_paths = {max_paths} flow paths ({reaches} reaches in network)"
    )]
    TooManyPaths { max_paths: usize, reaches: usize },
    /// An invariant of a built structure does not hold.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    /// A configuration value is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Reading or parsing a reach table failed.
    #[error("Reach table error: {0}")]
    ReachTable(String),
    /// An index artifact could not be encoded or decoded.
    #[error("Index format error: {0}")]
    IndexFormat(String),
    /// Underlying file-system failure.
    #[error("I/O error: {0}")]
    Io(String),
    /// Any of the above, attributed to the region being processed.
    #[error("Region {region}: {source}")]
    Region {
        region: String,
        #[source]
        source: Box<NavError>,
    },
}

impl NavError {
    /// Attach a region name to this error (idempotent for already-attributed errors).
    pub fn in_region(self, region: &str) -> Self {
        match self {
            NavError::Region { .. } => self,
            other => NavError::Region {
                region: region.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The error with any region attribution removed.
    pub fn root(&self) -> &NavError {
        match self {
            NavError::Region { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this is a capacity overflow (`PathTooLong` / `TooManyPaths`).
    pub fn is_capacity(&self) -> bool {
        matches!(
            self.root(),
            NavError::PathTooLong { .. } | NavError::TooManyPaths { .. }
        )
    }
}

impl From<std::io::Error> for NavError {
    fn from(e: std::io::Error) -> Self {
        NavError::Io(e.to_string())
    }
}

impl From<bincode::Error> for NavError {
    fn from(e: bincode::Error) -> Self {
        NavError::IndexFormat(e.to_string())
    }
}

impl From<csv::Error> for NavError {
    fn from(e: csv::Error) -> Self {
        NavError::ReachTable(e.to_string())
    }
}

impl From<serde_json::Error> for NavError {
    fn from(e: serde_json::Error) -> Self {
        NavError::InvalidConfig(e.to_string())
    }
}
