//! Path table: every flow path committed by the tracer, in commit order.
//!
//! Row `r` owns absolute columns `[start_r, end_r)` (its segment above the
//! branch point it resumed from). Columns `[0, start_r)` are the shared
//! downstream prefix and belong to earlier rows of the same outlet tree; the
//! owner of column `c` for row `r` is the latest row `r' <= r` with
//! `start_{r'} <= c`.
//!
//! Cumulative values are absolute: measured from the outlet of the tree.

use crate::debug_invariants::{DebugInvariants, violation};
use crate::nav_error::NavError;
use crate::topology::alias::Alias;

/// One committed flow path segment.
#[derive(Clone, Debug, PartialEq)]
pub struct PathRow {
    /// Absolute column of the first owned cell.
    pub start: usize,
    /// Aliases at columns `start..start + len`.
    pub aliases: Vec<Alias>,
    /// Cumulative travel time at each owned column.
    pub times: Vec<f32>,
    /// Cumulative flow distance at each owned column.
    pub dists: Vec<f32>,
}

impl PathRow {
    /// One past the last owned column.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.aliases.len()
    }

    /// Number of owned cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Owned alias at absolute column `col`.
    #[inline]
    pub fn get(&self, col: usize) -> Option<Alias> {
        col.checked_sub(self.start)
            .and_then(|k| self.aliases.get(k).copied())
    }
}

/// A cell of the dense root-to-headwater view of a row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WalkCell {
    pub alias: Alias,
    pub time: f32,
    pub dist: f32,
}

/// All committed rows, bounded by a maximum row count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathTable {
    rows: Vec<PathRow>,
    width: usize,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row built from the owned window `[start, aliases.len())` of
    /// the tracer's working buffers.
    ///
    /// # Errors
    /// [`NavError::TooManyPaths`] if the table already holds `max_paths` rows;
    /// `reaches` is reported with the error.
    pub fn commit(
        &mut self,
        start: usize,
        aliases: &[Alias],
        times: &[f32],
        dists: &[f32],
        max_paths: usize,
        reaches: usize,
    ) -> Result<(), NavError> {
        if self.rows.len() >= max_paths {
            return Err(NavError::TooManyPaths { max_paths, reaches });
        }
        debug_assert!(start < aliases.len(), "committing an empty segment");
        debug_assert_eq!(aliases.len(), times.len());
        debug_assert_eq!(aliases.len(), dists.len());
        self.width = self.width.max(aliases.len());
        self.rows.push(PathRow {
            start,
            aliases: aliases[start..].to_vec(),
            times: times[start..].to_vec(),
            dists: dists[start..].to_vec(),
        });
        Ok(())
    }

    /// Move all rows of `other` to the end of this table.
    pub fn append(
        &mut self,
        other: PathTable,
        max_paths: usize,
        reaches: usize,
    ) -> Result<(), NavError> {
        if self.rows.len() + other.rows.len() > max_paths {
            return Err(NavError::TooManyPaths { max_paths, reaches });
        }
        self.width = self.width.max(other.width);
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Longest root-to-headwater walk, in reaches.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn row(&self, r: usize) -> Option<&PathRow> {
        self.rows.get(r)
    }

    #[inline]
    pub fn rows(&self) -> &[PathRow] {
        &self.rows
    }

    /// Total number of owned cells across all rows.
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(PathRow::len).sum()
    }

    /// Cell at absolute column `col` of the full walk of row `r`, looking
    /// back through earlier rows for the shared prefix.
    pub fn walk_cell(&self, r: usize, col: usize) -> Option<WalkCell> {
        let first = self.rows.get(r)?;
        if col >= first.end() {
            return None;
        }
        self.rows[..=r]
            .iter()
            .rev()
            .find(|row| row.start <= col)
            .and_then(|row| {
                let k = col - row.start;
                Some(WalkCell {
                    alias: *row.aliases.get(k)?,
                    time: row.times[k],
                    dist: row.dists[k],
                })
            })
    }

    /// Full root-to-headwater walk of row `r`.
    pub fn walk(&self, r: usize) -> Vec<WalkCell> {
        let Some(row) = self.rows.get(r) else {
            return Vec::new();
        };
        (0..row.end()).filter_map(|c| self.walk_cell(r, c)).collect()
    }
}

impl DebugInvariants for PathTable {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PathTable");
    }

    fn validate_invariants(&self) -> Result<(), NavError> {
        let mut prev_end = 0usize;
        for (r, row) in self.rows.iter().enumerate() {
            if row.is_empty() {
                return Err(violation(format!("row {r} is empty")));
            }
            if row.times.len() != row.len() || row.dists.len() != row.len() {
                return Err(violation(format!("row {r} has ragged attribute arrays")));
            }
            // A row resumes inside the walk of its predecessor, or starts a new tree.
            if row.start > prev_end {
                return Err(violation(format!(
                    "row {r} starts at column {} past the previous walk end {prev_end}",
                    row.start
                )));
            }
            if row.end() > self.width {
                return Err(violation(format!("row {r} exceeds table width")));
            }
            prev_end = row.end();
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
    fn walk_reconstructs_shared_prefix() {
        let mut t = PathTable::new();
        // O(0) -> A(1) -> C(2)
        t.commit(0, &[a(0), a(1), a(2)], &[1., 2., 3.], &[1., 2., 3.], 10, 4)
            .unwrap();
        // resume after O: B(3)
        t.commit(1, &[a(0), a(3)], &[1., 5.], &[1., 5.], 10, 4).unwrap();
        assert_eq!(t.width(), 3);
        assert_eq!(t.cell_count(), 4);
        let walk: Vec<Alias> = t.walk(1).iter().map(|c| c.alias).collect();
        assert_eq!(walk, vec![a(0), a(3)]);
        assert_eq!(t.row(1).unwrap().get(0), None);
        assert_eq!(t.row(1).unwrap().get(1), Some(a(3)));
        t.validate_invariants().unwrap();
    }

    #[test]
    fn commit_past_capacity_fails() {
        let mut t = PathTable::new();
        t.commit(0, &[a(0)], &[1.], &[1.], 1, 2).unwrap();
        let err = t.commit(0, &[a(1)], &[1.], &[1.], 1, 2).unwrap_err();
        assert_eq!(
            err,
            NavError::TooManyPaths {
                max_paths: 1,
                reaches: 2
            }
        );
        assert_eq!(t.len(), 1);
    }
}
