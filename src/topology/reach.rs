//! `ReachId` and `ReachRecord`: the external view of a drainage network.
//!
//! A reach is a single stream segment. Its identifier comes from the source
//! hydrography (e.g. an NHD Plus COMID) and is treated as opaque. `ReachId`
//! wraps a nonzero `u64` because raw tables use `0` to mean "drains outside
//! the region"; that sentinel never survives past [`ReachId::from_raw`].

use crate::nav_error::NavError;
use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU64};

/// External reach identifier.
///
/// # Memory layout
/// `repr(transparent)` over `NonZeroU64`, so `Option<ReachId>` has the same
/// size as a `u64`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ReachId(NonZeroU64);

impl ReachId {
    /// Creates a new `ReachId` from a raw `u64` value.
    ///
    /// # Errors
    /// Returns [`NavError::InvalidReachId`] if `raw == 0`.
    ///
    /// ```rust
    /// # use reach_navigator::topology::reach::ReachId;
    /// let r = ReachId::new(4867727).unwrap();
    /// assert_eq!(r.get(), 4867727);
    /// assert!(ReachId::new(0).is_err());
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, NavError> {
        NonZeroU64::new(raw)
            .map(ReachId)
            .ok_or(NavError::InvalidReachId)
    }

    /// Interpret a raw downstream column value: `0` means no downstream.
    #[inline]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ReachId)
    }

    /// Returns the inner `u64` value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for ReachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReachId").field(&self.get()).finish()
    }
}

impl fmt::Display for ReachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// One row of the finalized per-reach attribute table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReachRecord {
    /// External id of this reach.
    pub id: ReachId,
    /// External id of the reach this one drains into, if any.
    pub downstream: Option<ReachId>,
    /// Time to traverse the reach (nonnegative).
    pub travel_time: f32,
    /// Flow length of the reach (nonnegative).
    pub length: f32,
    /// Marks the reach as the root of an upstream tree; severs `downstream`.
    pub outlet: bool,
}

impl ReachRecord {
    /// Record with no downstream target and no outlet flag set.
    ///
    /// Such a reach is still an outlet: it has nowhere to drain.
    pub fn new(id: ReachId, travel_time: f32, length: f32) -> Self {
        Self {
            id,
            downstream: None,
            travel_time,
            length,
            outlet: false,
        }
    }

    /// Builder-style setter for the downstream target.
    pub fn draining_to(mut self, downstream: ReachId) -> Self {
        self.downstream = Some(downstream);
        self
    }

    /// Builder-style setter for the outlet flag.
    pub fn as_outlet(mut self) -> Self {
        self.outlet = true;
        self
    }

    /// Check the attributes the tracer accumulates.
    pub fn validate(&self) -> Result<(), NavError> {
        for (field, value) in [("travel_time", self.travel_time), ("length", self.length)] {
            if !value.is_finite() || value < 0.0 {
                return Err(NavError::InvalidAttribute {
                    reach: self.id,
                    field,
                    value: f64::from(value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(ReachId, u64);
    assert_eq_size!(Option<ReachId>, u64);
}
