//! Error types for the Bazaar simulation framework.
//!
//! Organized by when they can occur: [`ConfigError`] at construction,
//! [`StepError`] from `reset`/`step`, and [`ComponentError`] from inside
//! a component's step (always a defect, never a legality issue).

use std::error::Error;
use std::fmt;

use crate::id::{AgentId, AgentKey};
use crate::resource::Resource;

/// Errors detected while validating configuration and constructing an
/// environment. No `reset` or `step` is possible after one of these.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    Parse {
        /// Parser message.
        reason: String,
    },
    /// No scenario is registered under this name.
    UnknownScenario {
        /// The requested scenario name.
        name: String,
    },
    /// No component is registered under this name.
    UnknownComponent {
        /// The requested component name.
        name: String,
    },
    /// The same component appears twice in the component list.
    DuplicateComponent {
        /// The repeated component name.
        name: String,
    },
    /// `n_agents` must be at least 2 and must fit on the grid.
    InvalidAgentCount {
        /// The configured value.
        n_agents: usize,
        /// Why it was rejected.
        reason: String,
    },
    /// `world_size` has a zero dimension or overflows.
    InvalidWorldSize {
        /// Configured height.
        height: usize,
        /// Configured width.
        width: usize,
    },
    /// `episode_length` is zero.
    InvalidEpisodeLength,
    /// `dense_log_frequency` is zero.
    InvalidLogFrequency,
    /// Action-mode configuration does not match the declared action spaces.
    ActionModeArity {
        /// Agent class concerned (`"mobile"` or `"planner"`).
        class: String,
        /// Description of the mismatch.
        reason: String,
    },
    /// No component contributes any action for mobile agents.
    NoActions,
    /// A component rejected its configuration.
    ComponentConfig {
        /// Component name.
        component: String,
        /// What was wrong.
        reason: String,
    },
    /// The scenario rejected its configuration.
    ScenarioConfig {
        /// Scenario name.
        scenario: String,
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { reason } => write!(f, "config parse error: {reason}"),
            Self::UnknownScenario { name } => write!(f, "unknown scenario '{name}'"),
            Self::UnknownComponent { name } => write!(f, "unknown component '{name}'"),
            Self::DuplicateComponent { name } => {
                write!(f, "component '{name}' registered more than once")
            }
            Self::InvalidAgentCount { n_agents, reason } => {
                write!(f, "invalid n_agents {n_agents}: {reason}")
            }
            Self::InvalidWorldSize { height, width } => {
                write!(f, "invalid world_size [{height}, {width}]")
            }
            Self::InvalidEpisodeLength => write!(f, "episode_length must be at least 1"),
            Self::InvalidLogFrequency => write!(f, "dense_log_frequency must be at least 1"),
            Self::ActionModeArity { class, reason } => {
                write!(f, "action mode mismatch for {class} agents: {reason}")
            }
            Self::NoActions => write!(f, "no component contributes actions for mobile agents"),
            Self::ComponentConfig { component, reason } => {
                write!(f, "component '{component}': {reason}")
            }
            Self::ScenarioConfig { scenario, reason } => {
                write!(f, "scenario '{scenario}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Errors raised inside a component's step.
///
/// Illegal actions are never reported here; masking turns them into
/// no-ops before a component sees them. A `ComponentError` means the
/// component's own bookkeeping is inconsistent and the step cannot be
/// trusted.
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentError {
    /// A deduction would drive an inventory below zero.
    InsufficientInventory {
        /// Agent whose inventory was debited.
        agent: AgentId,
        /// Resource debited.
        resource: Resource,
        /// Units held.
        held: u64,
        /// Units requested.
        requested: u64,
    },
    /// A coin deduction would drive a balance below zero.
    InsufficientCoin {
        /// Agent whose balance was debited.
        agent: AgentId,
        /// Coin held.
        held: f64,
        /// Coin requested.
        requested: f64,
    },
    /// A generated mask does not match the declared action count.
    MaskShape {
        /// Agent whose mask was malformed.
        agent: AgentKey,
        /// Declared number of actions.
        expected: usize,
        /// Number of mask entries produced.
        got: usize,
    },
    /// Any other broken invariant.
    InvariantViolation {
        /// Description of the violated invariant.
        reason: String,
    },
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientInventory {
                agent,
                resource,
                held,
                requested,
            } => write!(
                f,
                "agent {agent} holds {held} {resource}, cannot remove {requested}"
            ),
            Self::InsufficientCoin {
                agent,
                held,
                requested,
            } => write!(f, "agent {agent} holds {held} coin, cannot remove {requested}"),
            Self::MaskShape {
                agent,
                expected,
                got,
            } => write!(
                f,
                "mask for agent {agent} has {got} entries, expected {expected}"
            ),
            Self::InvariantViolation { reason } => write!(f, "invariant violated: {reason}"),
        }
    }
}

impl Error for ComponentError {}

/// Errors from `reset()` and `step()`.
///
/// Everything except [`StepError::InvariantViolated`] is a caller-contract
/// violation detected before any state is mutated.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// `step()` called before the first `reset()`.
    NotReset,
    /// `step()` called after the episode reached its configured length.
    EpisodeDone {
        /// The final timestep of the episode.
        timestep: u64,
    },
    /// An action was submitted for an agent that does not exist.
    UnknownAgent {
        /// The unknown key.
        agent: AgentKey,
    },
    /// An action used the wrong variant for the configured action mode.
    ActionModeMismatch {
        /// The submitting agent.
        agent: AgentKey,
        /// The mode the agent's class is configured for.
        expected: &'static str,
    },
    /// A multi-action submission has the wrong number of sub-actions.
    ActionArity {
        /// The submitting agent.
        agent: AgentKey,
        /// Number of action subspaces.
        expected: usize,
        /// Number of sub-actions submitted.
        got: usize,
    },
    /// An action index is outside its (sub)space.
    ActionOutOfRange {
        /// The submitting agent.
        agent: AgentKey,
        /// The submitted index.
        value: usize,
        /// Size of the (sub)space, including the no-op.
        size: usize,
    },
    /// A component broke one of its invariants. The environment refuses
    /// further steps until the next reset.
    InvariantViolated {
        /// Name of the failing component.
        component: String,
        /// The underlying component error.
        reason: ComponentError,
    },
    /// A previous step violated an invariant; reset before stepping again.
    Faulted,
    /// The scenario could not lay out a new episode.
    ResetFailed {
        /// Why the layout failed.
        reason: String,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReset => write!(f, "environment must be reset before stepping"),
            Self::EpisodeDone { timestep } => {
                write!(f, "episode finished at timestep {timestep}; call reset")
            }
            Self::UnknownAgent { agent } => write!(f, "unknown agent '{agent}'"),
            Self::ActionModeMismatch { agent, expected } => {
                write!(f, "agent '{agent}' must submit a {expected} action")
            }
            Self::ActionArity {
                agent,
                expected,
                got,
            } => write!(
                f,
                "agent '{agent}' submitted {got} sub-actions, expected {expected}"
            ),
            Self::ActionOutOfRange { agent, value, size } => write!(
                f,
                "agent '{agent}' action {value} out of range (space size {size})"
            ),
            Self::InvariantViolated { component, reason } => {
                write!(f, "component '{component}' failed: {reason}")
            }
            Self::Faulted => write!(f, "environment faulted by a previous step; call reset"),
            Self::ResetFailed { reason } => write!(f, "reset failed: {reason}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvariantViolated { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_violation_exposes_source() {
        let err = StepError::InvariantViolated {
            component: "Build".into(),
            reason: ComponentError::InsufficientInventory {
                agent: AgentId(2),
                resource: Resource::Wood,
                held: 0,
                requested: 1,
            },
        };
        assert!(err.source().is_some());
        let msg = err.to_string();
        assert!(msg.contains("Build"));
        assert!(msg.contains("holds 0 Wood"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::UnknownComponent {
            name: "Teleport".into(),
        };
        assert_eq!(err.to_string(), "unknown component 'Teleport'");
    }
}
