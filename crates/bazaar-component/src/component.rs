//! The [`Component`] trait and its action-space vocabulary.

use indexmap::IndexMap;

use bazaar_core::{AgentKey, ComponentError};
use bazaar_obs::AgentObs;
use bazaar_world::World;

use crate::context::ComponentContext;
use crate::slice::ActionSlice;

/// The two kinds of acting entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentClass {
    /// Agents that live on the grid.
    Mobile,
    /// The social planner.
    Planner,
}

impl AgentClass {
    /// The class `key` belongs to.
    pub fn of(key: AgentKey) -> Self {
        if key.is_planner() {
            AgentClass::Planner
        } else {
            AgentClass::Mobile
        }
    }

    /// `"mobile"` or `"planner"`.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentClass::Mobile => "mobile",
            AgentClass::Planner => "planner",
        }
    }
}

/// A named block of discrete actions contributed by one component.
///
/// Actions are numbered `1..=n` inside the subspace; `0` is the no-op
/// and is added by the action encoding, never declared here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSubspace {
    /// Subspace name, unique within the environment.
    pub name: String,
    /// Number of non-no-op actions.
    pub n: usize,
}

impl ActionSubspace {
    /// Create a subspace.
    pub fn new(name: impl Into<String>, n: usize) -> Self {
        Self {
            name: name.into(),
            n,
        }
    }
}

/// A behavioural module composed into the environment step.
///
/// # Contract
///
/// - `action_subspaces()` is called once at construction; the layout it
///   describes is fixed for the environment's lifetime.
/// - `generate_masks()` returns, for every agent of a class with a
///   non-empty action space, one value per action across all of this
///   component's subspaces for that class, concatenated in declaration
///   order. `0.0` marks an illegal action.
/// - `component_step()` receives actions already gated by the mask just
///   computed; anything illegal arrives as a no-op. It returns `Err` only
///   when its own bookkeeping is broken.
/// - Randomness comes only from the context RNG.
///
/// # Object safety
///
/// The orchestrator stores components as `Vec<Box<dyn Component>>`.
///
/// # Examples
///
/// A component that lets agents burn one unit of labor:
///
/// ```
/// use bazaar_component::{ActionSlice, ActionSubspace, AgentClass, Component, ComponentContext};
/// use bazaar_core::{AgentKey, ComponentError};
/// use bazaar_obs::AgentObs;
/// use bazaar_world::World;
/// use indexmap::IndexMap;
///
/// struct Toil;
///
/// impl Component for Toil {
///     fn name(&self) -> &str { "Toil" }
///
///     fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace> {
///         match class {
///             AgentClass::Mobile => vec![ActionSubspace::new("Toil", 1)],
///             AgentClass::Planner => Vec::new(),
///         }
///     }
///
///     fn generate_masks(&self, world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
///         world.agents.iter().map(|a| (AgentKey::Agent(a.id()), vec![1.0])).collect()
///     }
///
///     fn component_step(
///         &mut self,
///         ctx: &mut ComponentContext<'_>,
///         actions: &ActionSlice,
///     ) -> Result<(), ComponentError> {
///         for key in actions.agents() {
///             if let (Some(1), Some(id)) = (actions.get(key, 0), key.agent_id()) {
///                 if let Some(agent) = ctx.world.agent_mut(id) {
///                     agent.add_labor(1.0)?;
///                 }
///             }
///         }
///         Ok(())
///     }
///
///     fn generate_observations(&self, _world: &World) -> IndexMap<AgentKey, AgentObs> {
///         IndexMap::new()
///     }
/// }
///
/// assert_eq!(Toil.n_actions(AgentClass::Mobile), 1);
/// assert_eq!(Toil.n_actions(AgentClass::Planner), 0);
/// ```
pub trait Component: Send + 'static {
    /// Registry key, observation namespace and event namespace.
    fn name(&self) -> &str;

    /// Subspaces this component contributes for `class`, in encoding
    /// order. Empty for a class the component does not act for.
    fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace>;

    /// Total actions for `class` over all subspaces. Zero is valid.
    fn n_actions(&self, class: AgentClass) -> usize {
        self.action_subspaces(class).iter().map(|s| s.n).sum()
    }

    /// Legality of every action for every agent that has some.
    ///
    /// `completions` counts finished episodes, so masks can be relaxed
    /// or tightened as training progresses.
    fn generate_masks(&self, world: &World, completions: u64) -> IndexMap<AgentKey, Vec<f32>>;

    /// Apply this step's actions.
    fn component_step(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        actions: &ActionSlice,
    ) -> Result<(), ComponentError>;

    /// Observation fragments, keyed without the component prefix.
    fn generate_observations(&self, world: &World) -> IndexMap<AgentKey, AgentObs>;

    /// Clear private state at the start of an episode.
    ///
    /// Called after the world and agents have been reset, in component
    /// order. Default: nothing to clear.
    fn reset(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Episode-level summary values. Default: none.
    fn metrics(&self, world: &World) -> IndexMap<String, f64> {
        let _ = world;
        IndexMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_of_key() {
        assert_eq!(AgentClass::of(AgentKey::agent(0)), AgentClass::Mobile);
        assert_eq!(AgentClass::of(AgentKey::Planner), AgentClass::Planner);
        assert_eq!(AgentClass::Planner.as_str(), "planner");
    }
}
