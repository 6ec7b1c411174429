//! CSV reach table reader and writer.
//!
//! Columns, matched by header name:
//!
//! | column        | type | notes                                  |
//! |---------------|------|----------------------------------------|
//! | `comid`       | u64  | non-zero external id                   |
//! | `tocomid`     | u64  | downstream id; `0` or empty means none |
//! | `travel_time` | f32  | nonnegative                            |
//! | `length`      | f32  | nonnegative                            |
//! | `outlet`      | 0/1  | optional, defaults to 0                |
//!
//! Extra columns are ignored.

use crate::nav_error::NavError;
use crate::topology::reach::{ReachId, ReachRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct RawReach {
    comid: u64,
    #[serde(default)]
    tocomid: Option<u64>,
    travel_time: f32,
    length: f32,
    #[serde(default)]
    outlet: Option<u8>,
}

impl RawReach {
    fn into_record(self, line: u64) -> Result<ReachRecord, NavError> {
        let id = ReachId::from_raw(self.comid)
            .ok_or_else(|| NavError::ReachTable(format!("line {line}: comid must be non-zero")))?;
        let outlet = match self.outlet.unwrap_or(0) {
            0 => false,
            1 => true,
            other => {
                return Err(NavError::ReachTable(format!(
                    "line {line}: outlet flag must be 0 or 1, got {other}"
                )));
            }
        };
        Ok(ReachRecord {
            id,
            downstream: self.tocomid.and_then(ReachId::from_raw),
            travel_time: self.travel_time,
            length: self.length,
            outlet,
        })
    }
}

impl From<&ReachRecord> for RawReach {
    fn from(r: &ReachRecord) -> Self {
        Self {
            comid: r.id.get(),
            tocomid: Some(r.downstream.map_or(0, ReachId::get)),
            travel_time: r.travel_time,
            length: r.length,
            outlet: Some(u8::from(r.outlet)),
        }
    }
}

/// Parse a reach table from CSV.
///
/// Attribute ranges are not checked here; [`Network::build`] does that.
///
/// [`Network::build`]: crate::topology::network::Network::build
pub fn read_reach_table<R: Read>(reader: R) -> Result<Vec<ReachRecord>, NavError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for row in rdr.deserialize::<RawReach>() {
        let raw = row?;
        // header is line 1
        out.push(raw.into_record(out.len() as u64 + 2)?);
    }
    log::debug!("read {} reaches from reach table", out.len());
    Ok(out)
}

/// Open and parse a CSV reach table file.
pub fn read_reach_table_path(path: impl AsRef<Path>) -> Result<Vec<ReachRecord>, NavError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| NavError::ReachTable(format!("{}: {e}", path.display())))?;
    read_reach_table(file)
}

/// Write `records` as CSV with the columns [`read_reach_table`] expects.
pub fn write_reach_table<W: Write>(records: &[ReachRecord], writer: W) -> Result<(), NavError> {
    let mut w = csv::Writer::from_writer(writer);
    for r in records {
        w.serialize(RawReach::from(r))?;
    }
    w.flush()?;
    Ok(())
}
