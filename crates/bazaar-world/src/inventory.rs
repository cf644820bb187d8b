//! Per-agent resource counts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use bazaar_core::Resource;

/// Non-negative integer count for every [`Resource`].
///
/// Removal is checked: [`Inventory::checked_remove`] refuses to go below
/// zero rather than saturating, so callers can turn the refusal into an
/// invariant error.
///
/// Serializes as a `{ "Wood": n, "Stone": m }` map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<Resource, u64>", into = "IndexMap<Resource, u64>")]
pub struct Inventory {
    counts: [u64; Resource::COUNT],
}

impl Inventory {
    /// An empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from `(resource, count)` pairs. Repeated
    /// resources accumulate.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Resource, u64)>) -> Self {
        let mut inv = Self::new();
        for (r, n) in pairs {
            inv.add(r, n);
        }
        inv
    }

    /// Units of `resource` held.
    pub fn get(&self, resource: Resource) -> u64 {
        self.counts[resource.index()]
    }

    /// Add `amount` units.
    pub fn add(&mut self, resource: Resource, amount: u64) {
        self.counts[resource.index()] += amount;
    }

    /// Remove `amount` units if at least that many are held.
    ///
    /// Returns `false` and leaves the inventory untouched otherwise.
    #[must_use]
    pub fn checked_remove(&mut self, resource: Resource, amount: u64) -> bool {
        let slot = &mut self.counts[resource.index()];
        match slot.checked_sub(amount) {
            Some(rest) => {
                *slot = rest;
                true
            }
            None => false,
        }
    }

    /// Whether this inventory holds at least `other`'s count of every resource.
    pub fn covers(&self, other: &Inventory) -> bool {
        self.counts
            .iter()
            .zip(other.counts.iter())
            .all(|(have, need)| have >= need)
    }

    /// Total units across all resources.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Whether every count is zero.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate `(resource, count)` in canonical resource order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u64)> + '_ {
        Resource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    /// Reset every count to zero.
    pub fn clear(&mut self) {
        self.counts = [0; Resource::COUNT];
    }
}

impl From<IndexMap<Resource, u64>> for Inventory {
    fn from(map: IndexMap<Resource, u64>) -> Self {
        Self::from_pairs(map)
    }
}

impl From<Inventory> for IndexMap<Resource, u64> {
    fn from(inv: Inventory) -> Self {
        inv.iter().collect()
    }
}
