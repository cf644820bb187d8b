//! Builtin components for Bazaar simulations.
//!
//! Each component is independent and talks to the others only through
//! the shared world:
//!
//! - [`Gather`]: movement and resource collection (mobile)
//! - [`Build`]: turning wood and stone into houses and coin (mobile)
//! - [`ContinuousDoubleAuction`]: per-resource order books (mobile)
//! - [`CircuitBreaker`]: planner control over trading
//!
//! [`builtin_registry`] maps each component's name to its factory.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod auction;
pub mod build;
pub mod circuit_breaker;
pub mod gather;

use std::sync::OnceLock;

use bazaar_component::ComponentRegistry;

pub use auction::{AuctionConfig, CapPolicy, ContinuousDoubleAuction, Order, OrderBook};
pub use build::{Build, BuildConfig, SkillDist};
pub use circuit_breaker::CircuitBreaker;
pub use gather::{Gather, GatherConfig};

/// The read-only table of builtin components.
///
/// Built on first use. Clone it to add custom components.
pub fn builtin_registry() -> &'static ComponentRegistry {
    static BUILTINS: OnceLock<ComponentRegistry> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        let mut reg = ComponentRegistry::new();
        reg.register(Gather::NAME, gather::factory)
            .register(Build::NAME, build::factory)
            .register(ContinuousDoubleAuction::NAME, auction::factory)
            .register(CircuitBreaker::NAME, circuit_breaker::factory);
        reg
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use bazaar_component::{ActionSlice, SubAction};
    use bazaar_core::{AgentKey, Position};
    use bazaar_world::World;

    /// A world with agents at the given cells.
    pub fn world_with(h: usize, w: usize, cells: &[(usize, usize)], planner: bool) -> World {
        let mut world = World::new(h, w, cells.len(), planner).unwrap();
        for (agent, &(r, c)) in world.agents.iter_mut().zip(cells) {
            agent.position = Position::new(r, c);
        }
        world
    }

    pub fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    /// Slice where each listed agent submits the given legal sub-actions.
    pub fn slice(entries: &[(AgentKey, &[usize])]) -> ActionSlice {
        let mut s = ActionSlice::new();
        for (key, acts) in entries {
            s.insert(
                *key,
                acts.iter().map(|&a| SubAction {
                    requested: a,
                    legal: true,
                }),
            );
        }
        s
    }
}
