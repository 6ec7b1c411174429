//! Array compaction: pack the path table into the stored form.
//!
//! Each row keeps only its owned span; the per-row start column makes every
//! absolute column used by the locator map reconstructible. Time and length
//! are flat arrays parallel to `paths.values()` and share its row offsets.

use crate::data::path_table::PathTable;
use crate::data::ragged::RaggedArray;
use crate::debug_invariants::{DebugInvariants, violation};
use crate::nav_error::NavError;
use crate::topology::alias::Alias;

/// Compacted alias, cumulative time, and cumulative length arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompactPaths {
    /// Alias of every owned cell, rows packed with start columns.
    pub paths: RaggedArray<u32>,
    /// Cumulative travel time per packed cell.
    pub time: Vec<f32>,
    /// Cumulative flow length per packed cell.
    pub length: Vec<f32>,
}

impl CompactPaths {
    /// Reassemble from stored parts, checking they agree.
    pub fn from_parts(
        paths: RaggedArray<u32>,
        time: Vec<f32>,
        length: Vec<f32>,
    ) -> Result<Self, NavError> {
        let out = Self {
            paths,
            time,
            length,
        };
        out.validate_invariants()?;
        Ok(out)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.paths.rows()
    }

    /// Alias at absolute column `col` of row `r`, if the row owns it.
    pub fn alias(&self, r: usize, col: usize) -> Option<Alias> {
        self.paths.get(r, col).and_then(|&raw| Alias::from_u32(raw))
    }

    /// Cumulative `(time, length)` at absolute column `col` of row `r`.
    pub fn cumulative(&self, r: usize, col: usize) -> Option<(f32, f32)> {
        let k = self.paths.packed_index(r, col)?;
        Some((self.time[k], self.length[k]))
    }

    /// Cumulative times of row `r`'s owned span.
    pub fn row_time(&self, r: usize) -> Option<&[f32]> {
        self.paths.span(r).map(|(lo, hi)| &self.time[lo..hi])
    }

    /// Cumulative lengths of row `r`'s owned span.
    pub fn row_length(&self, r: usize) -> Option<&[f32]> {
        self.paths.span(r).map(|(lo, hi)| &self.length[lo..hi])
    }

    /// Bytes held by the packed arrays.
    pub fn stored_bytes(&self) -> usize {
        use std::mem::size_of;
        self.paths.offsets().len() * size_of::<u32>()
            + self.paths.starts().len() * size_of::<u32>()
            + self.paths.values().len() * size_of::<u32>()
            + (self.time.len() + self.length.len()) * size_of::<f32>()
    }
}

/// Compact `table` into packed rows.
pub fn compact(table: &PathTable) -> Result<CompactPaths, NavError> {
    let cells = table.cell_count();
    let mut paths = RaggedArray::with_capacity(table.len(), cells);
    let mut time = Vec::with_capacity(cells);
    let mut length = Vec::with_capacity(cells);

    for row in table.rows() {
        paths.push_row(row.start, row.aliases.iter().map(|a| a.as_u32()))?;
        time.extend_from_slice(&row.times);
        length.extend_from_slice(&row.dists);
    }
    paths.shrink_to_fit();

    let out = CompactPaths {
        paths,
        time,
        length,
    };
    crate::debug_invariants!(out.validate_invariants(), "compact");
    log::debug!(
        "compacted {} rows into {} cells ({} bytes, dense width {})",
        out.rows(),
        cells,
        out.stored_bytes(),
        table.width()
    );
    Ok(out)
}

impl DebugInvariants for CompactPaths {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CompactPaths");
    }

    fn validate_invariants(&self) -> Result<(), NavError> {
        self.paths.validate_invariants()?;
        let n = self.paths.values().len();
        if self.time.len() != n || self.length.len() != n {
            return Err(violation(format!(
                "time/length arrays ({}, {}) do not match {n} packed cells",
                self.time.len(),
                self.length.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(i: usize) -> Alias {
        Alias::from_index(i)
    }

    #[test]
    fn compaction_keeps_absolute_columns() {
        let mut t = PathTable::new();
        t.commit(0, &[a(0), a(1), a(2)], &[1., 3., 6.], &[2., 4., 8.], 5, 4)
            .unwrap();
        t.commit(1, &[a(0), a(3)], &[1., 11.], &[2., 9.], 5, 4).unwrap();
        let c = compact(&t).unwrap();
        assert_eq!(c.rows(), 2);
        assert_eq!(c.paths.values(), &[0, 1, 2, 3]);
        assert_eq!(c.paths.starts(), &[0, 1]);
        assert_eq!(c.alias(1, 1), Some(a(3)));
        assert_eq!(c.alias(1, 0), None);
        assert_eq!(c.cumulative(1, 1), Some((11.0, 9.0)));
        assert_eq!(c.row_time(0), Some(&[1.0f32, 3.0, 6.0][..]));
        assert_eq!(c.row_length(1), Some(&[9.0f32][..]));
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        let mut paths = RaggedArray::default();
        paths.push_row(0, [0u32, 1]).unwrap();
        assert!(CompactPaths::from_parts(paths, vec![1.0], vec![1.0, 2.0]).is_err());
    }
}
