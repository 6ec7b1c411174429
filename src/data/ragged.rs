//! Ragged row storage: variable-length rows packed into one contiguous buffer.
//!
//! Row `r` occupies `values[offsets[r]..offsets[r + 1]]` and starts at
//! absolute column `starts[r]`, so any absolute position stays reconstructible
//! after the rows are trimmed to their occupied span.

use crate::debug_invariants::{DebugInvariants, violation};
use crate::nav_error::NavError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaggedArray<T> {
    /// Row boundaries into `values`; `offsets.len() == rows + 1`.
    offsets: Vec<u32>,
    /// Absolute column of each row's first value.
    starts: Vec<u32>,
    values: Vec<T>,
}

impl<T> Default for RaggedArray<T> {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            starts: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T> RaggedArray<T> {
    /// Empty array with room for `rows` rows and `cells` values.
    pub fn with_capacity(rows: usize, cells: usize) -> Self {
        let mut offsets = Vec::with_capacity(rows + 1);
        offsets.push(0);
        Self {
            offsets,
            starts: Vec::with_capacity(rows),
            values: Vec::with_capacity(cells),
        }
    }

    /// Append a row starting at absolute column `start`.
    ///
    /// # Errors
    /// [`NavError::IndexFormat`] if the packed length or start column no
    /// longer fits the `u32` on-disk offsets.
    pub fn push_row<I>(&mut self, start: usize, row: I) -> Result<(), NavError>
    where
        I: IntoIterator<Item = T>,
    {
        let start = u32::try_from(start)
            .map_err(|_| NavError::IndexFormat(format!("start column {start} exceeds u32")))?;
        self.values.extend(row);
        let end = u32::try_from(self.values.len()).map_err(|_| {
            NavError::IndexFormat(format!("{} packed cells exceed u32", self.values.len()))
        })?;
        self.offsets.push(end);
        self.starts.push(start);
        Ok(())
    }

    /// Release spare capacity.
    pub fn shrink_to_fit(&mut self) {
        self.offsets.shrink_to_fit();
        self.starts.shrink_to_fit();
        self.values.shrink_to_fit();
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Packed range of row `r` within [`values`](Self::values).
    #[inline]
    pub fn span(&self, r: usize) -> Option<(usize, usize)> {
        let lo = *self.offsets.get(r)? as usize;
        let hi = *self.offsets.get(r + 1)? as usize;
        Some((lo, hi))
    }

    /// Values of row `r`.
    #[inline]
    pub fn row(&self, r: usize) -> Option<&[T]> {
        self.span(r).map(|(lo, hi)| &self.values[lo..hi])
    }

    /// Absolute column of row `r`'s first value.
    #[inline]
    pub fn start(&self, r: usize) -> Option<usize> {
        self.starts.get(r).map(|&s| s as usize)
    }

    /// Value at absolute column `col` of row `r`, if the row owns it.
    pub fn get(&self, r: usize, col: usize) -> Option<&T> {
        let k = col.checked_sub(self.start(r)?)?;
        self.row(r)?.get(k)
    }

    /// Position in `values` of absolute column `col` of row `r`.
    pub fn packed_index(&self, r: usize, col: usize) -> Option<usize> {
        let (lo, hi) = self.span(r)?;
        let k = col.checked_sub(self.start(r)?)?;
        (lo + k < hi).then_some(lo + k)
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    #[inline]
    pub fn starts(&self) -> &[u32] {
        &self.starts
    }

    /// Widest absolute extent of any row.
    pub fn width(&self) -> usize {
        (0..self.rows())
            .filter_map(|r| Some(self.start(r)? + self.row(r)?.len()))
            .max()
            .unwrap_or(0)
    }
}

impl<T> DebugInvariants for RaggedArray<T> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "RaggedArray");
    }

    fn validate_invariants(&self) -> Result<(), NavError> {
        if self.offsets.len() != self.starts.len() + 1 {
            return Err(violation("ragged offsets do not match row count"));
        }
        if self.offsets.first() != Some(&0) {
            return Err(violation("ragged offsets must start at 0"));
        }
        if self.offsets.iter().tuple_windows().any(|(a, b)| a > b) {
            return Err(violation("ragged offsets are not monotone"));
        }
        if self.offsets.last().map(|&o| o as usize) != Some(self.values.len()) {
            return Err(violation("ragged offsets do not cover values"));
        }
        Ok(())
    }
}
