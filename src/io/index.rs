//! Navigator index encoding on top of the binary container.
//!
//! An index holds five named arrays:
//!
//! * `paths`: compacted aliases with row offsets and start columns
//! * `time`: cumulative travel time per packed cell
//! * `length`: cumulative flow length per packed cell
//! * `path_map`: `[row_start, row_end, column]` per alias
//! * `alias_index`: external reach id per alias

use crate::algs::compact::CompactPaths;
use crate::algs::path_map::PathLocatorMap;
use crate::data::ragged::RaggedArray;
use crate::io::container::{ContainerReader, ContainerWriter};
use crate::nav_error::NavError;
use crate::navigator::Navigator;
use crate::topology::alias::AliasMap;
use std::io::{Read, Seek, Write};

pub const PATHS: &str = "paths";
pub const TIME: &str = "time";
pub const LENGTH: &str = "length";
pub const PATH_MAP: &str = "path_map";
pub const ALIAS_INDEX: &str = "alias_index";

/// Names of the arrays every index carries, in write order.
pub const ARRAY_NAMES: [&str; 5] = [PATHS, TIME, LENGTH, PATH_MAP, ALIAS_INDEX];

/// Trait for formats that persist a [`Navigator`].
pub trait IndexWriter {
    /// Serialize `nav` to `writer`.
    fn write<W: Write>(&self, writer: W, nav: &Navigator) -> Result<(), NavError>;
}

/// Trait for formats that restore a [`Navigator`].
pub trait IndexReader {
    /// Parse a navigator from `reader`, validating the arrays against each other.
    fn read<R: Read + Seek>(&self, reader: R) -> Result<Navigator, NavError>;
}

/// The native random-access container format.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryIndex;

impl IndexWriter for BinaryIndex {
    fn write<W: Write>(&self, writer: W, nav: &Navigator) -> Result<(), NavError> {
        let paths = nav.paths();
        let mut c = ContainerWriter::new(nav.region());
        c.add(PATHS, &paths.paths)?;
        c.add(TIME, &paths.time)?;
        c.add(LENGTH, &paths.length)?;
        c.add(PATH_MAP, &nav.path_map().to_raw()?)?;
        c.add(ALIAS_INDEX, &nav.aliases().to_raw())?;
        c.finish(writer)
    }
}

impl IndexReader for BinaryIndex {
    fn read<R: Read + Seek>(&self, reader: R) -> Result<Navigator, NavError> {
        let mut c = ContainerReader::new(reader)?;
        let region = c.key().to_string();
        let ragged: RaggedArray<u32> = c.read(PATHS)?;
        let paths = CompactPaths::from_parts(ragged, c.read(TIME)?, c.read(LENGTH)?)?;
        let raw_map: Vec<[u32; 3]> = c.read(PATH_MAP)?;
        let path_map = PathLocatorMap::from_raw(&raw_map, paths.rows())?;
        let raw_ids: Vec<u64> = c.read(ALIAS_INDEX)?;
        let aliases = AliasMap::from_reverse(&raw_ids)?;
        Navigator::from_parts(region, paths, path_map, aliases)
    }
}
