//! Path locator map: where each alias sits in the path table.
//!
//! Rows are committed depth-first, so every row passing through an alias is
//! the row that owns it followed by a contiguous run of rows that resumed
//! above it. The run ends at the first later row whose start column is at or
//! below the alias' column.
//!
//! Built in one pass over the rows with a stack of open entries ordered by
//! column: a row starting at column `s` closes every open entry at a column
//! `>= s`.

use crate::data::path_table::PathTable;
use crate::debug_invariants::{DebugInvariants, violation};
use crate::nav_error::NavError;
use crate::topology::alias::Alias;
use serde::{Deserialize, Serialize};

/// Alias appears at `column` in every row of `[row_start, row_end)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathLocator {
    pub row_start: u32,
    pub row_end: u32,
    pub column: u32,
}

impl PathLocator {
    /// Rows passing through the alias.
    #[inline]
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.row_start as usize..self.row_end as usize
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column as usize
    }

    /// The on-disk triple.
    #[inline]
    pub fn to_raw(self) -> [u32; 3] {
        [self.row_start, self.row_end, self.column]
    }

    #[inline]
    pub fn from_raw([row_start, row_end, column]: [u32; 3]) -> Self {
        Self {
            row_start,
            row_end,
            column,
        }
    }
}

/// One entry per alias, indexed by alias.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathLocatorMap {
    entries: Vec<Option<PathLocator>>,
    rows: usize,
}

impl PathLocatorMap {
    /// Locator for `alias`; O(1).
    #[inline]
    pub fn get(&self, alias: Alias) -> Option<PathLocator> {
        self.entries.get(alias.index()).copied().flatten()
    }

    /// Number of aliases covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row count of the table the map was built over.
    #[inline]
    pub fn table_rows(&self) -> usize {
        self.rows
    }

    /// Dense `[row_start, row_end, column]` triples in alias order.
    ///
    /// # Errors
    /// Fails if some alias has no entry.
    pub fn to_raw(&self) -> Result<Vec<[u32; 3]>, NavError> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                e.map(PathLocator::to_raw)
                    .ok_or_else(|| violation(format!("alias {i} has no locator")))
            })
            .collect()
    }

    /// Rebuild from stored triples over a table of `rows` rows.
    pub fn from_raw(raw: &[[u32; 3]], rows: usize) -> Result<Self, NavError> {
        let map = Self {
            entries: raw.iter().map(|&t| Some(PathLocator::from_raw(t))).collect(),
            rows,
        };
        map.validate_invariants()?;
        Ok(map)
    }
}

fn to_u32(v: usize, what: &str) -> Result<u32, NavError> {
    u32::try_from(v).map_err(|_| NavError::IndexFormat(format!("{what} {v} exceeds u32")))
}

/// Build the locator map for `table` over `n_aliases` aliases.
///
/// # Errors
/// [`NavError::InvariantViolation`] if an alias occurs in more than one owned
/// cell or in none.
pub fn build_path_map(table: &PathTable, n_aliases: usize) -> Result<PathLocatorMap, NavError> {
    let mut entries: Vec<Option<PathLocator>> = vec![None; n_aliases];
    let mut open: Vec<(Alias, usize, usize)> = Vec::with_capacity(table.width());

    let close = |entries: &mut Vec<Option<PathLocator>>,
                     (alias, row_start, column): (Alias, usize, usize),
                     row_end: usize|
     -> Result<(), NavError> {
        let slot = entries
            .get_mut(alias.index())
            .ok_or(NavError::AliasOutOfRange {
                alias,
                len: n_aliases,
            })?;
        if slot.is_some() {
            return Err(violation(format!(
                "alias {alias} occupies more than one path-table cell"
            )));
        }
        *slot = Some(PathLocator {
            row_start: to_u32(row_start, "row")?,
            row_end: to_u32(row_end, "row")?,
            column: to_u32(column, "column")?,
        });
        Ok(())
    };

    for (r, row) in table.rows().iter().enumerate() {
        while let Some(&(alias, r0, col)) = open.last() {
            if col < row.start {
                break;
            }
            open.pop();
            close(&mut entries, (alias, r0, col), r)?;
        }
        open.extend(
            row.aliases
                .iter()
                .enumerate()
                .map(|(k, &a)| (a, r, row.start + k)),
        );
    }
    let n_rows = table.len();
    while let Some(entry) = open.pop() {
        close(&mut entries, entry, n_rows)?;
    }

    if let Some(missing) = entries.iter().position(Option::is_none) {
        return Err(violation(format!(
            "alias {missing} does not appear in the path table"
        )));
    }

    let map = PathLocatorMap {
        entries,
        rows: n_rows,
    };
    crate::debug_invariants!(map.validate_invariants(), "build_path_map");
    Ok(map)
}

impl DebugInvariants for PathLocatorMap {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PathLocatorMap");
    }

    fn validate_invariants(&self) -> Result<(), NavError> {
        for (i, e) in self.entries.iter().enumerate() {
            let Some(loc) = e else {
                return Err(violation(format!("alias {i} has no locator")));
            };
            if loc.row_end <= loc.row_start {
                return Err(violation(format!(
                    "alias {i} has empty row range [{}, {})",
                    loc.row_start, loc.row_end
                )));
            }
            if loc.row_end as usize > self.rows {
                return Err(violation(format!(
                    "alias {i} row range ends past {} rows",
                    self.rows
                )));
            }
        }
        Ok(())
    }
}
