//! Hashing utilities for dense-log comparison.
//!
//! Uses FNV-1a for fast, deterministic hashing of simulation state.
//! These hashes are not cryptographically secure; they exist for fast
//! equality checks between runs. Floats are hashed by bit pattern, so
//! `0.0` and `-0.0` differ.

use indexmap::IndexMap;

use bazaar_core::{Action, AgentKey, ComponentEvent, Resource};
use bazaar_world::{AgentSnapshot, Inventory, Tile, WorldSnapshot};

/// FNV-1a offset basis for 64-bit.
pub const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Feed a single byte into an FNV-1a hash state.
#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// Feed a byte slice into an FNV-1a hash state.
#[inline]
pub fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Feed a u64 (as 8 LE bytes) into an FNV-1a hash state.
#[inline]
pub fn fnv1a_u64(hash: u64, v: u64) -> u64 {
    fnv1a_bytes(hash, &v.to_le_bytes())
}

#[inline]
fn fnv1a_f64(hash: u64, v: f64) -> u64 {
    fnv1a_u64(hash, v.to_bits())
}

fn fnv1a_inventory(mut hash: u64, inv: &Inventory) -> u64 {
    for r in Resource::ALL {
        hash = fnv1a_u64(hash, inv.get(r));
    }
    hash
}

fn fnv1a_key(hash: u64, key: AgentKey) -> u64 {
    match key {
        AgentKey::Agent(id) => fnv1a_u64(fnv1a_byte(hash, 0), u64::from(id.0)),
        AgentKey::Planner => fnv1a_byte(hash, 1),
    }
}

fn fnv1a_tile(hash: u64, tile: Tile) -> u64 {
    match tile {
        Tile::Empty => fnv1a_byte(hash, 0),
        Tile::Resource(r) => fnv1a_byte(fnv1a_byte(hash, 1), r.index() as u8),
        Tile::Water => fnv1a_byte(hash, 2),
        Tile::House { owner } => fnv1a_u64(fnv1a_byte(hash, 3), u64::from(owner.0)),
    }
}

/// Hash every agent's state, in order.
///
/// Returns [`FNV_OFFSET`] for an empty slice.
pub fn agents_hash(agents: &[AgentSnapshot]) -> u64 {
    let mut hash = FNV_OFFSET;
    for a in agents {
        hash = fnv1a_u64(hash, u64::from(a.id.0));
        hash = fnv1a_u64(hash, a.position.row as u64);
        hash = fnv1a_u64(hash, a.position.col as u64);
        hash = fnv1a_inventory(hash, &a.inventory);
        hash = fnv1a_inventory(hash, &a.escrow);
        hash = fnv1a_f64(hash, a.coin);
        hash = fnv1a_f64(hash, a.escrow_coin);
        hash = fnv1a_f64(hash, a.labor);
        hash = fnv1a_f64(hash, a.skill);
    }
    hash
}

/// Hash a full world snapshot: clock, shape, tiles, agents, halt flag.
pub fn world_hash(world: &WorldSnapshot) -> u64 {
    let mut hash = FNV_OFFSET;
    hash = fnv1a_u64(hash, world.timestep.0);
    hash = fnv1a_u64(hash, world.height as u64);
    hash = fnv1a_u64(hash, world.width as u64);
    for &t in &world.tiles {
        hash = fnv1a_tile(hash, t);
    }
    hash = fnv1a_u64(hash, agents_hash(&world.agents));
    fnv1a_byte(hash, u8::from(world.market_halted))
}

/// Hash one step's submitted actions.
pub fn actions_hash(actions: &IndexMap<AgentKey, Action>) -> u64 {
    let mut hash = FNV_OFFSET;
    for (&key, action) in actions {
        hash = fnv1a_key(hash, key);
        match action {
            Action::Single(a) => {
                hash = fnv1a_u64(fnv1a_byte(hash, 0), *a as u64);
            }
            Action::Multi(v) => {
                hash = fnv1a_u64(fnv1a_byte(hash, 1), v.len() as u64);
                for &a in v {
                    hash = fnv1a_u64(hash, a as u64);
                }
            }
        }
    }
    hash
}

/// Hash one step's rewards.
pub fn rewards_hash(rewards: &IndexMap<AgentKey, f64>) -> u64 {
    rewards
        .iter()
        .fold(FNV_OFFSET, |h, (&k, &r)| fnv1a_f64(fnv1a_key(h, k), r))
}

/// Hash one step's component events via their JSON encoding.
pub fn events_hash(events: &IndexMap<String, Vec<ComponentEvent>>) -> u64 {
    let mut hash = FNV_OFFSET;
    for (component, list) in events {
        hash = fnv1a_bytes(hash, component.as_bytes());
        hash = fnv1a_u64(hash, list.len() as u64);
        for ev in list {
            // Events hold only plain numbers and strings; encoding cannot fail.
            if let Ok(bytes) = serde_json::to_vec(ev) {
                hash = fnv1a_bytes(hash, &bytes);
            }
        }
    }
    hash
}
