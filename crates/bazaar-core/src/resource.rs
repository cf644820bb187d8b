//! Collectible, tradeable resources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A resource type that can lie on the grid and sit in inventories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    /// Wood, gathered from forest tiles.
    #[serde(alias = "wood")]
    Wood,
    /// Stone, gathered from quarry tiles.
    #[serde(alias = "stone")]
    Stone,
}

impl Resource {
    /// Number of resource types.
    pub const COUNT: usize = 2;

    /// All resources in canonical order. Inventories, observation vectors
    /// and auction subspaces all follow this order.
    pub const ALL: [Resource; Resource::COUNT] = [Resource::Wood, Resource::Stone];

    /// Canonical position in [`Resource::ALL`].
    pub fn index(self) -> usize {
        match self {
            Resource::Wood => 0,
            Resource::Stone => 1,
        }
    }

    /// Display name used in observation keys and action subspace names.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Wood => "Wood",
            Resource::Stone => "Stone",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown resource '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_canonical_order() {
        for (i, r) in Resource::ALL.iter().enumerate() {
            assert_eq!(r.index(), i);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("wood".parse::<Resource>().unwrap(), Resource::Wood);
        assert_eq!("STONE".parse::<Resource>().unwrap(), Resource::Stone);
        assert!("iron".parse::<Resource>().is_err());
    }
}
