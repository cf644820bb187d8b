//! The scenario orchestrator.
//!
//! [`ScenarioEnv`] composes a [`Scenario`] and an ordered list of
//! [`Component`]s into one lockstep environment. Each
//! [`step()`](ScenarioEnv::step) validates every submitted action, gates
//! it by the cached mask, hands each component its slice, runs the
//! scenario rule, advances the clock and assembles the next observation.
//!
//! # Ownership model
//!
//! `ScenarioEnv` is [`Send`] (it can be moved to a worker thread) and
//! owns all of its state. Parallel rollouts use one environment per
//! worker.
//!
//! # Failure
//!
//! Caller mistakes (unknown agent, malformed action, stepping a finished
//! episode) are reported before anything is mutated. A component that
//! breaks its own invariants faults the environment: every later `step`
//! returns [`StepError::Faulted`] until the next reset.

use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use bazaar_component::{ActionSlice, AgentClass, Component, ComponentContext, ComponentRegistry};
use bazaar_components::builtin_registry;
use bazaar_core::{Action, AgentKey, ComponentError, StepError, Timestep};
use bazaar_obs::{assemble_mask, flatten, AgentObs, ObsValue, Observation, ACTION_MASK_KEY};
use bazaar_replay::{DenseLog, DenseLogRecorder, StepEvents};
use bazaar_world::World;

use crate::config::EnvConfig;
use crate::layout::{ActionLayout, ClassLayout};
use crate::scenario::{builtin_scenarios, Scenario, ScenarioRegistry};

// Compile-time assertion: ScenarioEnv is Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<ScenarioEnv>();
    }
};

/// One action per agent. Agents left out perform the no-op.
pub type ActionMap = IndexMap<AgentKey, Action>;

/// Named episode-level values.
pub type EpisodeMetrics = IndexMap<String, f64>;

/// Key for the all-agents flag in [`Done::to_map`].
pub const ALL_DONE_KEY: &str = "__all__";

// ── StepResult ──────────────────────────────────────────────────

/// Per-agent termination flags.
///
/// `done` is episode-global today, so every entry equals `all`; the
/// per-agent map leaves room for agents that finish early.
#[derive(Clone, Debug, PartialEq)]
pub struct Done {
    /// Flag per agent and planner.
    pub agents: IndexMap<AgentKey, bool>,
    /// Whether the episode is over.
    pub all: bool,
}

impl Done {
    fn uniform(keys: &[AgentKey], all: bool) -> Self {
        Self {
            agents: keys.iter().map(|&k| (k, all)).collect(),
            all,
        }
    }

    /// Flag for `key`; unknown keys read as the global flag.
    pub fn get(&self, key: AgentKey) -> bool {
        self.agents.get(&key).copied().unwrap_or(self.all)
    }

    /// String-keyed map with an extra `"__all__"` entry.
    pub fn to_map(&self) -> IndexMap<String, bool> {
        let mut map: IndexMap<String, bool> =
            self.agents.iter().map(|(k, &v)| (k.to_string(), v)).collect();
        map.insert(ALL_DONE_KEY.to_string(), self.all);
        map
    }
}

/// Result of a successful [`ScenarioEnv::step()`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// Observation for every agent and the planner.
    pub observation: Observation,
    /// Reward for every agent and the planner.
    pub reward: IndexMap<AgentKey, f64>,
    /// Termination flags.
    pub done: Done,
    /// Extra per-agent information; empty maps unless a caller adds some.
    pub info: IndexMap<AgentKey, IndexMap<String, f64>>,
}

// ── ScenarioEnv ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EnvState {
    NotReset,
    Running,
    Done,
    Faulted,
}

/// A lockstep multi-agent economic environment.
///
/// # Example
///
/// ```
/// use bazaar_engine::{ActionMap, EnvConfig, ScenarioEnv};
///
/// let config = EnvConfig {
///     components: vec![("Gather".into(), serde_json::Value::Null)],
///     n_agents: 2,
///     world_size: [5, 5],
///     episode_length: 3,
///     ..EnvConfig::default()
/// };
/// let mut env = ScenarioEnv::new(config).unwrap();
/// env.reset(false).unwrap();
/// for _ in 0..3 {
///     let result = env.step(&ActionMap::new()).unwrap();
///     assert_eq!(result.reward.len(), 3);
/// }
/// assert!(env.is_done());
/// ```
pub struct ScenarioEnv {
    config: EnvConfig,
    world: World,
    scenario: Box<dyn Scenario>,
    components: Vec<Box<dyn Component>>,
    layout: ActionLayout,
    rng: ChaCha8Rng,
    seed: u64,
    state: EnvState,
    completions: u64,
    recorder: Option<DenseLogRecorder>,
    previous_dense_log: Option<DenseLog>,
    last_events: StepEvents,
}

impl ScenarioEnv {
    /// Build an environment from the builtin component and scenario
    /// tables.
    pub fn new(config: EnvConfig) -> Result<Self, bazaar_core::ConfigError> {
        Self::with_registries(config, builtin_registry(), builtin_scenarios())
    }

    /// Build an environment, resolving names through the given tables.
    ///
    /// Validates the configuration, instantiates the scenario and every
    /// component in order, creates the agents and fixes the action
    /// layout. The environment must be [`reset`](Self::reset) before the
    /// first step.
    pub fn with_registries(
        config: EnvConfig,
        components: &ComponentRegistry,
        scenarios: &ScenarioRegistry,
    ) -> Result<Self, bazaar_core::ConfigError> {
        config.validate()?;
        let scenario = scenarios.create(&config.scenario_name, &config.scenario)?;
        let components = config
            .components
            .iter()
            .map(|(name, params)| components.create(name, params))
            .collect::<Result<Vec<_>, _>>()?;
        let world = World::new(
            config.height(),
            config.width(),
            config.n_agents,
            scenario.has_planner(),
        )?;
        let layout = ActionLayout::build(
            &components,
            scenario.has_planner(),
            config.action_mode(AgentClass::Mobile),
            config.action_mode(AgentClass::Planner),
        )?;
        info!(
            scenario = scenario.name(),
            components = components.len(),
            n_agents = config.n_agents,
            mobile_actions = layout.mobile.total(),
            "environment constructed"
        );
        let seed = config.seed;
        Ok(Self {
            config,
            world,
            scenario,
            components,
            layout,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            state: EnvState::NotReset,
            completions: 0,
            recorder: None,
            previous_dense_log: None,
            last_events: StepEvents::new(),
        })
    }

    /// Start a new episode, continuing the current RNG stream.
    ///
    /// With `force_dense_logging` the episode is recorded; the log moves
    /// to [`previous_episode_dense_log`](Self::previous_episode_dense_log)
    /// when the episode completes.
    pub fn reset(&mut self, force_dense_logging: bool) -> Result<Observation, StepError> {
        self.reset_inner(force_dense_logging)
    }

    /// Reseed the RNG, then [`reset`](Self::reset).
    ///
    /// Two environments with the same configuration, reset with the same
    /// seed and fed the same actions produce identical episodes.
    pub fn reset_with_seed(
        &mut self,
        seed: u64,
        force_dense_logging: bool,
    ) -> Result<Observation, StepError> {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.reset_inner(force_dense_logging)
    }

    fn reset_inner(&mut self, force_dense_logging: bool) -> Result<Observation, StepError> {
        self.state = EnvState::NotReset;
        self.recorder = None;
        self.last_events.clear();

        self.world.reset_state();
        self.scenario.reset_layout(&mut self.world, &mut self.rng)?;
        self.scenario.reset_agents(&mut self.world, &mut self.rng)?;

        let mut events = Vec::new();
        for ci in 0..self.components.len() {
            let mut ctx = ComponentContext::new(&mut self.world, &mut self.rng, &mut events);
            if let Err(e) = self.components[ci].reset(&mut ctx) {
                let name = self.components[ci].name().to_string();
                return Err(self.fault(name, e));
            }
        }
        self.scenario.additional_reset_steps(&self.world);
        self.refresh_masks()?;

        if force_dense_logging {
            let mut recorder = DenseLogRecorder::new(
                self.seed,
                self.config.episode_length,
                self.config.dense_log_frequency,
            );
            recorder.record_reset(&self.world);
            self.recorder = Some(recorder);
        }
        self.state = EnvState::Running;
        info!(
            seed = self.seed,
            completions = self.completions,
            dense_log = force_dense_logging,
            "episode reset"
        );
        Ok(self.observe())
    }

    /// Advance one step.
    ///
    /// # Errors
    ///
    /// Contract violations ([`StepError::NotReset`],
    /// [`StepError::EpisodeDone`], [`StepError::Faulted`],
    /// [`StepError::UnknownAgent`] and malformed actions) leave the
    /// environment untouched. [`StepError::InvariantViolated`] faults it.
    pub fn step(&mut self, actions: &ActionMap) -> Result<StepResult, StepError> {
        match self.state {
            EnvState::NotReset => return Err(StepError::NotReset),
            EnvState::Done => {
                return Err(StepError::EpisodeDone {
                    timestep: self.world.timestep.0,
                })
            }
            EnvState::Faulted => return Err(StepError::Faulted),
            EnvState::Running => {}
        }

        // 1. Decode every action before touching any state.
        let keys = self.world.agent_keys();
        let mut decoded: IndexMap<AgentKey, Vec<usize>> = IndexMap::with_capacity(keys.len());
        for (&key, action) in actions {
            let layout = self.class_layout(key)?;
            decoded.insert(key, layout.decode(key, action)?);
        }

        // 2. Gate by the cached masks and split per component.
        let mut slices: Vec<ActionSlice> = vec![ActionSlice::new(); self.components.len()];
        for &key in &keys {
            let layout = self.class_layout(key)?;
            let choices = decoded
                .get(&key)
                .cloned()
                .unwrap_or_else(|| vec![0; layout.slots().len()]);
            let gated = layout.gate(&choices, self.cached_mask(key));
            for (ci, slice) in slices.iter_mut().enumerate() {
                let range = layout.slot_range(ci);
                if !range.is_empty() {
                    slice.insert(key, gated[range].iter().copied());
                }
            }
        }

        // 3. Components in order.
        let mut step_events = StepEvents::new();
        for (ci, slice) in slices.iter().enumerate() {
            let mut events = Vec::new();
            let mut ctx = ComponentContext::new(&mut self.world, &mut self.rng, &mut events);
            let outcome = self.components[ci].component_step(&mut ctx, slice);
            let name = self.components[ci].name().to_string();
            if let Err(e) = outcome {
                return Err(self.fault(name, e));
            }
            debug!(
                component = %name,
                events = events.len(),
                masked = slice.masked_count(),
                "component stepped"
            );
            step_events.insert(name, events);
        }

        // 4. Scenario rule, then the clock.
        self.scenario.scenario_step(&mut self.world, &mut self.rng);
        self.world.timestep = Timestep(self.world.timestep.0 + 1);

        // 5. Masks and observations for the next step.
        self.refresh_masks()?;
        let observation = self.observe();

        // 6. Rewards and termination.
        let reward = self.scenario.compute_rewards(&self.world);
        let all_done = self.world.timestep.0 >= self.config.episode_length;
        let done = Done::uniform(&keys, all_done);
        let info = keys.iter().map(|&k| (k, IndexMap::new())).collect();

        if let Some(recorder) = &mut self.recorder {
            let submitted = keys
                .iter()
                .filter_map(|&k| {
                    let layout = self.layout.for_key(k)?;
                    Some((k, actions.get(&k).cloned().unwrap_or_else(|| layout.noop())))
                })
                .collect();
            recorder.record_step(&self.world, submitted, reward.clone(), step_events.clone());
        }
        self.last_events = step_events;

        if all_done {
            self.state = EnvState::Done;
            self.completions += 1;
            if let Some(recorder) = self.recorder.take() {
                self.previous_dense_log = Some(recorder.finish());
            }
            info!(
                timestep = %self.world.timestep,
                completions = self.completions,
                "episode complete"
            );
        }

        Ok(StepResult {
            observation,
            reward,
            done,
            info,
        })
    }

    fn class_layout(&self, key: AgentKey) -> Result<&ClassLayout, StepError> {
        let known = match key {
            AgentKey::Agent(id) => id.index() < self.world.n_agents(),
            AgentKey::Planner => self.world.planner.is_some(),
        };
        self.layout
            .for_key(key)
            .filter(|_| known)
            .ok_or(StepError::UnknownAgent { agent: key })
    }

    fn cached_mask(&self, key: AgentKey) -> &[f32] {
        match key {
            AgentKey::Agent(id) => self
                .world
                .agent(id)
                .map_or(&[][..], |a| a.action_mask.as_slice()),
            AgentKey::Planner => self
                .world
                .planner
                .as_ref()
                .map_or(&[][..], |p| p.action_mask.as_slice()),
        }
    }

    fn fault(&mut self, component: String, reason: ComponentError) -> StepError {
        self.state = EnvState::Faulted;
        warn!(
            component = %component,
            error = %reason,
            timestep = %self.world.timestep,
            "component invariant violated; environment faulted until reset"
        );
        StepError::InvariantViolated { component, reason }
    }

    /// Recompute every agent's mask from the components.
    fn refresh_masks(&mut self) -> Result<(), StepError> {
        let full = match self.collect_masks() {
            Ok(full) => full,
            Err((name, err)) => return Err(self.fault(name, err)),
        };
        for (key, mask) in full {
            match key {
                AgentKey::Agent(id) => {
                    if let Some(agent) = self.world.agent_mut(id) {
                        agent.action_mask = mask;
                    }
                }
                AgentKey::Planner => {
                    if let Some(planner) = &mut self.world.planner {
                        planner.action_mask = mask;
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_masks(&self) -> Result<IndexMap<AgentKey, Vec<f32>>, (String, ComponentError)> {
        let mut full: IndexMap<AgentKey, Vec<f32>> = self
            .world
            .agent_keys()
            .into_iter()
            .filter_map(|k| Some((k, vec![0.0; self.layout.for_key(k)?.total()])))
            .collect();

        for (ci, component) in self.components.iter().enumerate() {
            let masks = component.generate_masks(&self.world, self.completions);
            for (&key, mask) in full.iter_mut() {
                let Some(layout) = self.layout.for_key(key) else {
                    continue;
                };
                let range = layout.component_mask_range(ci);
                if range.is_empty() {
                    continue;
                }
                let part = masks.get(&key).map_or(&[][..], Vec::as_slice);
                if part.len() != range.len() {
                    let err = ComponentError::MaskShape {
                        agent: key,
                        expected: range.len(),
                        got: part.len(),
                    };
                    return Err((component.name().to_string(), err));
                }
                mask[range].copy_from_slice(part);
            }
        }
        Ok(full)
    }

    /// Assemble the observation for every agent and the planner.
    fn observe(&self) -> Observation {
        let keys = self.world.agent_keys();
        let mut obs: Observation = keys.iter().map(|&k| (k, AgentObs::new())).collect();

        merge(&mut obs, "world", self.scenario.generate_observations(&self.world));
        for component in &self.components {
            merge(
                &mut obs,
                component.name(),
                component.generate_observations(&self.world),
            );
        }

        let time = self.world.timestep.0 as f32 / self.config.episode_length as f32;
        for (&key, agent_obs) in obs.iter_mut() {
            agent_obs.insert("time".to_string(), ObsValue::Scalar(time));
            if let Some(layout) = self.layout.for_key(key) {
                let mask = self.cached_mask(key);
                let value = assemble_mask(
                    &layout.segments(mask),
                    layout.mode(),
                    self.config.flatten_masks,
                );
                agent_obs.insert(ACTION_MASK_KEY.to_string(), value);
            }
        }

        if self.config.flatten_observations {
            obs = obs.into_iter().map(|(k, o)| (k, flatten(o))).collect();
        }
        obs
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Scenario metrics plus component metrics as `"{component}/{key}"`.
    pub fn metrics(&self) -> EpisodeMetrics {
        let mut m = self.scenario.metrics(&self.world);
        for component in &self.components {
            for (key, value) in component.metrics(&self.world) {
                m.insert(format!("{}/{key}", component.name()), value);
            }
        }
        m
    }

    /// Steps taken in the current episode.
    pub fn timestep(&self) -> Timestep {
        self.world.timestep
    }

    /// Configured episode length.
    pub fn episode_length(&self) -> u64 {
        self.config.episode_length
    }

    /// Whether the current episode has reached its length.
    pub fn is_done(&self) -> bool {
        self.state == EnvState::Done
    }

    /// Whether a component failure is blocking further steps.
    pub fn is_faulted(&self) -> bool {
        self.state == EnvState::Faulted
    }

    /// Read-only world state.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The fixed action layout.
    pub fn action_layout(&self) -> &ActionLayout {
        &self.layout
    }

    /// The configuration this environment was built from.
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Seed of the current RNG stream.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of episodes run to completion.
    pub fn completions(&self) -> u64 {
        self.completions
    }

    /// Component names in step order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// The log of the last completed, logged episode.
    pub fn previous_episode_dense_log(&self) -> Option<&DenseLog> {
        self.previous_dense_log.as_ref()
    }

    /// The log being recorded for the running episode, if any.
    pub fn dense_log(&self) -> Option<&DenseLog> {
        self.recorder.as_ref().map(DenseLogRecorder::log)
    }

    /// Events from the most recent step, per component.
    pub fn last_events(&self) -> &StepEvents {
        &self.last_events
    }
}

impl std::fmt::Debug for ScenarioEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioEnv")
            .field("scenario", &self.scenario.name())
            .field("components", &self.component_names())
            .field("timestep", &self.world.timestep)
            .field("seed", &self.seed)
            .field("state", &self.state)
            .field("completions", &self.completions)
            .finish()
    }
}

fn merge(obs: &mut Observation, prefix: &str, fragments: IndexMap<AgentKey, AgentObs>) {
    for (key, fragment) in fragments {
        let Some(target) = obs.get_mut(&key) else {
            continue;
        };
        for (name, value) in fragment {
            target.insert(format!("{prefix}-{name}"), value);
        }
    }
}
