//! Log comparison for determinism checks.
//!
//! Hash-first: whole-log fingerprints are compared, then per-step hashes
//! to find the first diverging timestep, then the step's parts to say
//! what diverged.

use std::fmt;

use bazaar_core::AgentId;

use crate::hash::{actions_hash, rewards_hash};
use crate::log::DenseLog;

/// What differed at the first diverging timestep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DivergenceKind {
    /// Seed, episode length or log stride differ.
    Header,
    /// One log ends before the other.
    Length {
        /// Recorded timesteps in the first log.
        left: usize,
        /// Recorded timesteps in the second log.
        right: usize,
    },
    /// An agent's state differs (or the agent count does).
    AgentState {
        /// First differing agent, `None` if the counts differ.
        agent: Option<AgentId>,
    },
    /// Submitted actions differ.
    Actions,
    /// Rewards differ.
    Rewards,
    /// Component events differ.
    Events,
    /// A sampled world snapshot differs while agent states agree.
    World,
}

/// Where and how two logs first differ.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivergenceReport {
    /// First diverging timestep (0 is the reset state).
    pub timestep: usize,
    /// What diverged.
    pub kind: DivergenceKind,
}

impl fmt::Display for DivergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "logs diverge at timestep {}: ", self.timestep)?;
        match &self.kind {
            DivergenceKind::Header => write!(f, "episode header"),
            DivergenceKind::Length { left, right } => {
                write!(f, "length {left} vs {right}")
            }
            DivergenceKind::AgentState { agent: Some(id) } => write!(f, "state of agent {id}"),
            DivergenceKind::AgentState { agent: None } => write!(f, "agent count"),
            DivergenceKind::Actions => write!(f, "actions"),
            DivergenceKind::Rewards => write!(f, "rewards"),
            DivergenceKind::Events => write!(f, "events"),
            DivergenceKind::World => write!(f, "world snapshot"),
        }
    }
}

/// Find the first point where two logs differ.
///
/// Returns `None` when the fingerprints match.
pub fn first_divergence(a: &DenseLog, b: &DenseLog) -> Option<DivergenceReport> {
    if a.fingerprint() == b.fingerprint() {
        return None;
    }
    if (a.seed, a.episode_length, a.dense_log_frequency)
        != (b.seed, b.episode_length, b.dense_log_frequency)
    {
        return Some(DivergenceReport {
            timestep: 0,
            kind: DivergenceKind::Header,
        });
    }

    let shared = a.states.len().min(b.states.len());
    for t in 0..shared {
        if a.step_hash(t) == b.step_hash(t) {
            continue;
        }
        return Some(DivergenceReport {
            timestep: t,
            kind: step_detail(a, b, t),
        });
    }
    if a.states.len() != b.states.len() {
        return Some(DivergenceReport {
            timestep: shared,
            kind: DivergenceKind::Length {
                left: a.states.len(),
                right: b.states.len(),
            },
        });
    }

    // Only the world snapshots are left.
    let idx = a
        .world
        .iter()
        .zip(&b.world)
        .position(|(x, y)| x != y)
        .unwrap_or(a.world.len().min(b.world.len()));
    let timestep = a
        .world
        .get(idx)
        .or_else(|| b.world.get(idx))
        .map_or(0, |w| w.timestep.0 as usize);
    Some(DivergenceReport {
        timestep,
        kind: DivergenceKind::World,
    })
}

fn step_detail(a: &DenseLog, b: &DenseLog, t: usize) -> DivergenceKind {
    let (sa, sb) = (&a.states[t], &b.states[t]);
    if sa.len() != sb.len() {
        return DivergenceKind::AgentState { agent: None };
    }
    if let Some((x, _)) = sa.iter().zip(sb).find(|(x, y)| x != y) {
        return DivergenceKind::AgentState { agent: Some(x.id) };
    }
    // Step 0 has nothing but states, and states agree past this point.
    let i = t - 1;
    if actions_hash(&a.actions[i]) != actions_hash(&b.actions[i]) {
        DivergenceKind::Actions
    } else if rewards_hash(&a.rewards[i]) != rewards_hash(&b.rewards[i]) {
        DivergenceKind::Rewards
    } else {
        DivergenceKind::Events
    }
}
