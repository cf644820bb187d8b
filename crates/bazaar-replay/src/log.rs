//! The finished per-episode record.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use bazaar_core::{Action, AgentKey, ComponentEvent};
use bazaar_world::{AgentSnapshot, WorldSnapshot};

use crate::error::ReplayError;
use crate::hash::{
    actions_hash, agents_hash, events_hash, fnv1a_u64, rewards_hash, world_hash, FNV_OFFSET,
};

/// Events emitted during one step, keyed by component name.
pub type StepEvents = IndexMap<String, Vec<ComponentEvent>>;

/// A complete record of one episode.
///
/// `states[0]` is the state right after reset; `states[t]` for `t >= 1`
/// is the state after step `t`. `actions`, `rewards` and `events` are
/// indexed by step (`actions[t - 1]` produced `states[t]`), so they are
/// always one shorter than `states`. `world` holds full snapshots taken
/// at reset and every `dense_log_frequency` steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseLog {
    /// Seed the episode was reset with.
    pub seed: u64,
    /// Configured episode length.
    pub episode_length: u64,
    /// Stride between world snapshots.
    pub dense_log_frequency: u64,
    /// Sampled world snapshots.
    pub world: Vec<WorldSnapshot>,
    /// Agent states, one entry per recorded timestep.
    pub states: Vec<Vec<AgentSnapshot>>,
    /// Submitted actions per step.
    pub actions: Vec<IndexMap<AgentKey, Action>>,
    /// Rewards per step.
    pub rewards: Vec<IndexMap<AgentKey, f64>>,
    /// Component events per step.
    pub events: Vec<StepEvents>,
}

impl DenseLog {
    /// An empty log.
    pub fn new(seed: u64, episode_length: u64, dense_log_frequency: u64) -> Self {
        Self {
            seed,
            episode_length,
            dense_log_frequency,
            world: Vec::new(),
            states: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Number of steps recorded.
    pub fn steps(&self) -> usize {
        self.actions.len()
    }

    /// Whether the log holds every step of its episode.
    pub fn is_complete(&self) -> bool {
        self.steps() as u64 == self.episode_length
    }

    /// Hash of everything recorded at timestep `t` (0 is the reset
    /// state; `t >= 1` also covers that step's actions, rewards and
    /// events). Returns `None` past the end of the log.
    pub fn step_hash(&self, t: usize) -> Option<u64> {
        let mut hash = fnv1a_u64(FNV_OFFSET, agents_hash(self.states.get(t)?));
        if t > 0 {
            hash = fnv1a_u64(hash, actions_hash(self.actions.get(t - 1)?));
            hash = fnv1a_u64(hash, rewards_hash(self.rewards.get(t - 1)?));
            hash = fnv1a_u64(hash, events_hash(self.events.get(t - 1)?));
        }
        Some(hash)
    }

    /// Stable FNV-1a hash over the whole log.
    ///
    /// Two runs with the same seed, configuration and actions produce the
    /// same fingerprint.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = FNV_OFFSET;
        hash = fnv1a_u64(hash, self.seed);
        hash = fnv1a_u64(hash, self.episode_length);
        hash = fnv1a_u64(hash, self.dense_log_frequency);
        for w in &self.world {
            hash = fnv1a_u64(hash, world_hash(w));
        }
        for t in 0..self.states.len() {
            if let Some(h) = self.step_hash(t) {
                hash = fnv1a_u64(hash, h);
            }
        }
        hash
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a log from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write compact JSON to `writer`.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), ReplayError> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a log from `reader`.
    pub fn read_json<R: Read>(reader: R) -> Result<Self, ReplayError> {
        Ok(serde_json::from_reader(BufReader::new(reader))?)
    }

    /// Write the log to a file, replacing it if present.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        self.write_json(File::create(path)?)
    }

    /// Load a log from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        Self::read_json(File::open(path)?)
    }
}
