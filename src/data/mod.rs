//! Data module: path table and packed row storage

pub mod path_table;
pub mod ragged;

pub use crate::debug_invariants::DebugInvariants;

pub use path_table::{PathRow, PathTable, WalkCell};
pub use ragged::RaggedArray;
