//! Alias mapping: external reach ids ↔ dense zero-based indices.
//!
//! Every array in the navigator is indexed by [`Alias`]. Aliases are assigned
//! in input order, are dense in `[0, N)`, and are only meaningful for the
//! network build that produced them.

use crate::debug_invariants::{DebugInvariants, violation};
use crate::nav_error::NavError;
use crate::topology::reach::{ReachId, ReachRecord};
use hashbrown::HashMap;
use std::{fmt, num::NonZeroU32};

/// Largest number of reaches a single region may hold.
pub const MAX_ALIASES: usize = (u32::MAX - 1) as usize;

/// Dense reach index in `[0, N)`.
///
/// Stored as `index + 1` in a `NonZeroU32` so that `Option<Alias>` costs no
/// more than a `u32`; the offset is invisible through the public API.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Alias(NonZeroU32);

impl Alias {
    /// Alias for dense position `index`.
    ///
    /// # Panics
    /// Panics if `index >= MAX_ALIASES`; [`AliasMap`] never issues such an index.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).expect("alias index exceeds u32 range");
        // index + 1 >= 1
        Alias(NonZeroU32::new(raw).expect("alias index + 1 is non-zero"))
    }

    /// Alias for a raw `u32` index as stored in serialized arrays.
    #[inline]
    pub fn from_u32(index: u32) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU32::new).map(Alias)
    }

    /// Dense position of this alias.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Dense position as `u32`, the on-disk representation.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alias").field(&self.index()).finish()
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Where a reach drains to, after alias translation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Downstream {
    /// Drains into another reach inside the region.
    Reach(Alias),
    /// No downstream reach in the region: the root of an upstream tree.
    Outlet,
}

impl Downstream {
    /// The downstream alias, if any.
    #[inline]
    pub fn alias(self) -> Option<Alias> {
        match self {
            Downstream::Reach(a) => Some(a),
            Downstream::Outlet => None,
        }
    }

    #[inline]
    pub fn is_outlet(self) -> bool {
        matches!(self, Downstream::Outlet)
    }
}

/// Bijection between the reaches of one region and their aliases.
#[derive(Clone, Debug, Default)]
pub struct AliasMap {
    /// alias → reach id (the reverse lookup written to the index).
    reach_of: Vec<ReachId>,
    /// reach id → alias; construction-time only.
    alias_of: HashMap<ReachId, Alias>,
}

// the forward map is derived from the reverse table
impl PartialEq for AliasMap {
    fn eq(&self, other: &Self) -> bool {
        self.reach_of == other.reach_of
    }
}

impl Eq for AliasMap {}

impl AliasMap {
    /// Assign aliases to `records` in input order.
    ///
    /// # Errors
    /// [`NavError::DuplicateReach`] if an id repeats,
    /// [`NavError::EmptyNetwork`] if there are no records.
    pub fn from_records(records: &[ReachRecord]) -> Result<Self, NavError> {
        Self::from_ids(records.iter().map(|r| r.id))
    }

    /// Assign aliases to ids in iteration order.
    pub fn from_ids<I>(ids: I) -> Result<Self, NavError>
    where
        I: IntoIterator<Item = ReachId>,
    {
        let ids = ids.into_iter();
        let (lower, _) = ids.size_hint();
        let mut map = Self {
            reach_of: Vec::with_capacity(lower),
            alias_of: HashMap::with_capacity(lower),
        };
        for id in ids {
            if map.reach_of.len() >= MAX_ALIASES {
                return Err(NavError::ReachTable(format!(
                    "region has more than {MAX_ALIASES} reaches"
                )));
            }
            let alias = Alias::from_index(map.reach_of.len());
            if map.alias_of.insert(id, alias).is_some() {
                return Err(NavError::DuplicateReach(id));
            }
            map.reach_of.push(id);
        }
        if map.reach_of.is_empty() {
            return Err(NavError::EmptyNetwork);
        }
        crate::debug_invariants!(map.validate_invariants(), "AliasMap::from_ids");
        Ok(map)
    }

    /// Rebuild from a stored reverse table (alias position → raw reach id).
    pub fn from_reverse(raw: &[u64]) -> Result<Self, NavError> {
        let ids = raw
            .iter()
            .map(|&r| ReachId::new(r))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_ids(ids)
    }

    /// Alias of `id`, if `id` is in the region.
    #[inline]
    pub fn alias_of(&self, id: ReachId) -> Option<Alias> {
        self.alias_of.get(&id).copied()
    }

    /// External id of `alias`.
    ///
    /// # Errors
    /// [`NavError::AliasOutOfRange`] for aliases not issued by this map.
    #[inline]
    pub fn reach_of(&self, alias: Alias) -> Result<ReachId, NavError> {
        self.reach_of
            .get(alias.index())
            .copied()
            .ok_or(NavError::AliasOutOfRange {
                alias,
                len: self.len(),
            })
    }

    /// Translate a downstream id; ids outside the region become [`Downstream::Outlet`].
    #[inline]
    pub fn resolve(&self, downstream: Option<ReachId>) -> Downstream {
        downstream
            .and_then(|id| self.alias_of(id))
            .map_or(Downstream::Outlet, Downstream::Reach)
    }

    /// Number of aliases issued.
    #[inline]
    pub fn len(&self) -> usize {
        self.reach_of.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reach_of.is_empty()
    }

    /// Reverse lookup table: position = alias, value = reach id.
    #[inline]
    pub fn reach_ids(&self) -> &[ReachId] {
        &self.reach_of
    }

    /// Reverse lookup table as raw integers, the on-disk `alias_index` array.
    pub fn to_raw(&self) -> Vec<u64> {
        self.reach_of.iter().map(|r| r.get()).collect()
    }

    /// Iterate `(alias, reach id)` pairs in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (Alias, ReachId)> + '_ {
        self.reach_of
            .iter()
            .enumerate()
            .map(|(i, &r)| (Alias::from_index(i), r))
    }
}

impl DebugInvariants for AliasMap {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "AliasMap");
    }

    fn validate_invariants(&self) -> Result<(), NavError> {
        if self.reach_of.len() != self.alias_of.len() {
            return Err(violation(format!(
                "alias map sizes differ: {} reverse vs {} forward",
                self.reach_of.len(),
                self.alias_of.len()
            )));
        }
        for (alias, id) in self.iter() {
            if self.alias_of.get(&id) != Some(&alias) {
                return Err(violation(format!(
                    "reach {id} does not round-trip through alias {alias}"
                )));
            }
        }
        Ok(())
    }
}
