//! Top-level module for drainage network topology.
//!
//! This module provides the types that turn a reach table into an indexable
//! network:
//! - [`ReachId`] and [`ReachRecord`] for the external view of a reach
//! - [`Alias`] and [`AliasMap`] for dense indexing
//! - [`Network`] for downstream targets and CSR upstream lists
//! - structural checks on the upstream forest
//!
//! Most users only need [`Network::from_records`].

pub mod alias;
pub mod network;
pub mod reach;
pub mod validation;

pub use alias::{Alias, AliasMap, Downstream};
pub use network::{BranchOrder, Network};
pub use reach::{ReachId, ReachRecord};
