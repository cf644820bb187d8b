//! Mutable state handed to a component during reset and step.

use rand_chacha::ChaCha8Rng;
use tracing::trace;

use bazaar_core::{ComponentEvent, Timestep};
use bazaar_world::World;

/// Everything a component may touch while it runs.
///
/// The world and RNG are public fields so a component can borrow both
/// at once. Events go through [`emit`](Self::emit) so the orchestrator
/// can attribute them to the component that produced them.
pub struct ComponentContext<'a> {
    /// Shared world state.
    pub world: &'a mut World,
    /// The environment's single RNG.
    pub rng: &'a mut ChaCha8Rng,
    events: &'a mut Vec<ComponentEvent>,
}

impl<'a> ComponentContext<'a> {
    /// Construct a context.
    ///
    /// Typically called by the orchestrator. For tests, pass a local
    /// world, a seeded RNG and an event buffer.
    pub fn new(
        world: &'a mut World,
        rng: &'a mut ChaCha8Rng,
        events: &'a mut Vec<ComponentEvent>,
    ) -> Self {
        Self { world, rng, events }
    }

    /// Record an event for the dense log.
    pub fn emit(&mut self, event: ComponentEvent) {
        trace!(?event, "component event");
        self.events.push(event);
    }

    /// The world's current timestep.
    pub fn timestep(&self) -> Timestep {
        self.world.timestep
    }

    /// Events emitted so far through this context.
    pub fn events(&self) -> &[ComponentEvent] {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn emit_appends_in_order() {
        let mut world = World::new(2, 2, 2, false).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = Vec::new();
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        ctx.emit(ComponentEvent::MarketHalted { halted: true });
        ctx.emit(ComponentEvent::MarketHalted { halted: false });
        assert_eq!(ctx.events().len(), 2);
        assert_eq!(ctx.timestep(), Timestep(0));
        drop(ctx);
        assert_eq!(events[1], ComponentEvent::MarketHalted { halted: false });
    }
}
