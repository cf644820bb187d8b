//! Accumulates a [`DenseLog`] while an episode runs.

use indexmap::IndexMap;

use bazaar_core::{Action, AgentKey};
use bazaar_world::World;

use crate::log::{DenseLog, StepEvents};

/// Builds a [`DenseLog`] step by step.
///
/// Call [`record_reset`](Self::record_reset) once after the world is
/// laid out, then [`record_step`](Self::record_step) after every step.
#[derive(Clone, Debug)]
pub struct DenseLogRecorder {
    log: DenseLog,
}

impl DenseLogRecorder {
    /// Start a recorder for an episode. A `dense_log_frequency` of zero
    /// is treated as 1.
    pub fn new(seed: u64, episode_length: u64, dense_log_frequency: u64) -> Self {
        Self {
            log: DenseLog::new(seed, episode_length, dense_log_frequency.max(1)),
        }
    }

    /// Record the post-reset state, discarding anything recorded before.
    pub fn record_reset(&mut self, world: &World) {
        let log = &mut self.log;
        *log = DenseLog::new(log.seed, log.episode_length, log.dense_log_frequency);
        log.world.push(world.snapshot());
        log.states.push(world.agent_snapshots());
    }

    /// Record one completed step. `world.timestep` must already be
    /// advanced; a world snapshot is taken when it lands on the stride.
    pub fn record_step(
        &mut self,
        world: &World,
        actions: IndexMap<AgentKey, Action>,
        rewards: IndexMap<AgentKey, f64>,
        events: StepEvents,
    ) {
        let log = &mut self.log;
        if world.timestep.0 % log.dense_log_frequency == 0 {
            log.world.push(world.snapshot());
        }
        log.states.push(world.agent_snapshots());
        log.actions.push(actions);
        log.rewards.push(rewards);
        log.events.push(events);
    }

    /// The log recorded so far.
    pub fn log(&self) -> &DenseLog {
        &self.log
    }

    /// Stop recording and return the log.
    pub fn finish(self) -> DenseLog {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::Timestep;

    #[test]
    fn world_snapshots_follow_the_stride() {
        let mut world = World::new(2, 2, 2, false).unwrap();
        let mut rec = DenseLogRecorder::new(0, 5, 2);
        rec.record_reset(&world);
        for t in 1..=5 {
            world.timestep = Timestep(t);
            rec.record_step(&world, IndexMap::new(), IndexMap::new(), StepEvents::new());
        }
        let log = rec.finish();
        let sampled: Vec<u64> = log.world.iter().map(|w| w.timestep.0).collect();
        assert_eq!(sampled, vec![0, 2, 4]);
        assert_eq!(log.states.len(), 6);
        assert!(log.is_complete());
    }

    #[test]
    fn reset_discards_previous_steps() {
        let world = World::new(2, 2, 2, false).unwrap();
        let mut rec = DenseLogRecorder::new(9, 3, 0);
        rec.record_reset(&world);
        rec.record_step(&world, IndexMap::new(), IndexMap::new(), StepEvents::new());
        rec.record_reset(&world);
        assert_eq!(rec.log().steps(), 0);
        assert_eq!(rec.log().states.len(), 1);
        assert_eq!(rec.log().dense_log_frequency, 1);
        assert_eq!(rec.log().seed, 9);
    }
}
