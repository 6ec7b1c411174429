//! Reading reach tables and reading/writing navigator indexes.
//!
//! Input is a CSV reach table ([`reach_table`]). Output is one binary index
//! per region ([`index`]) stored in a random-access container
//! ([`container`]) so each array can be fetched without decoding the rest.

pub mod container;
pub mod index;
pub mod reach_table;

pub use container::{ContainerReader, ContainerWriter};
pub use index::{BinaryIndex, IndexReader, IndexWriter};
pub use reach_table::{read_reach_table, read_reach_table_path, write_reach_table};
