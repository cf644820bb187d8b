//! Environment configuration and validation.
//!
//! [`EnvConfig`] is the input for constructing a
//! [`ScenarioEnv`](crate::ScenarioEnv). It deserializes from JSON with
//! per-field defaults; [`validate()`](EnvConfig::validate) checks the
//! structural invariants that do not depend on the registries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use bazaar_component::AgentClass;
use bazaar_core::{ActionMode, ConfigError};

/// Complete configuration for one environment.
///
/// `components` is an ordered list of `[name, parameters]` pairs; the
/// order fixes reset, step, action-encoding and observation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvConfig {
    /// Registered scenario name.
    pub scenario_name: String,
    /// Components in step order, each with its JSON parameters.
    pub components: Vec<(String, serde_json::Value)>,
    /// Number of mobile agents. Must be at least 2.
    pub n_agents: usize,
    /// Grid size as `[height, width]`.
    pub world_size: [usize; 2],
    /// Steps per episode. Must be at least 1.
    pub episode_length: u64,
    /// Mobile agents submit one integer per subspace.
    pub multi_action_mode_agents: bool,
    /// The planner submits one integer per subspace.
    pub multi_action_mode_planner: bool,
    /// Fold every rank-0/1 observation into `"flat"`.
    pub flatten_observations: bool,
    /// Emit masks as one flat vector instead of per-subspace segments.
    pub flatten_masks: bool,
    /// RNG seed used by [`reset`](crate::ScenarioEnv::reset).
    pub seed: u64,
    /// Stride between world snapshots in the dense log.
    pub dense_log_frequency: u64,
    /// Scenario-specific parameters.
    pub scenario: serde_json::Value,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            scenario_name: "uniform".to_string(),
            components: Vec::new(),
            n_agents: 4,
            world_size: [25, 25],
            episode_length: 1000,
            multi_action_mode_agents: false,
            multi_action_mode_planner: true,
            flatten_observations: true,
            flatten_masks: true,
            seed: 0,
            dense_log_frequency: 50,
            scenario: serde_json::Value::Null,
        }
    }
}

impl EnvConfig {
    /// Parse a configuration from JSON text.
    ///
    /// Missing fields take their defaults. The result is not validated.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Grid rows.
    pub fn height(&self) -> usize {
        self.world_size[0]
    }

    /// Grid columns.
    pub fn width(&self) -> usize {
        self.world_size[1]
    }

    /// Action mode configured for `class`.
    pub fn action_mode(&self, class: AgentClass) -> ActionMode {
        match class {
            AgentClass::Mobile => ActionMode::from(self.multi_action_mode_agents),
            AgentClass::Planner => ActionMode::from(self.multi_action_mode_planner),
        }
    }

    /// Validate every invariant that does not need the registries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [height, width] = self.world_size;
        // 1. Grid must be non-empty and addressable.
        if height == 0 || width == 0 || height.checked_mul(width).is_none() {
            return Err(ConfigError::InvalidWorldSize { height, width });
        }
        // 2. At least two agents, each with its own cell.
        if self.n_agents < 2 {
            return Err(ConfigError::InvalidAgentCount {
                n_agents: self.n_agents,
                reason: "at least 2 agents are required".to_string(),
            });
        }
        if self.n_agents > height * width {
            return Err(ConfigError::InvalidAgentCount {
                n_agents: self.n_agents,
                reason: format!("grid has only {} cells", height * width),
            });
        }
        // 3. Episode length >= 1.
        if self.episode_length == 0 {
            return Err(ConfigError::InvalidEpisodeLength);
        }
        // 4. Log stride >= 1.
        if self.dense_log_frequency == 0 {
            return Err(ConfigError::InvalidLogFrequency);
        }
        // 5. Each component listed once.
        let mut seen = HashSet::new();
        for (name, _) in &self.components {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateComponent { name: name.clone() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> EnvConfig {
        EnvConfig {
            components: vec![("Gather".into(), serde_json::Value::Null)],
            n_agents: 2,
            world_size: [4, 4],
            episode_length: 10,
            ..EnvConfig::default()
        }
    }

    #[test]
    fn validate_valid_config_succeeds() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_single_agent_fails() {
        let cfg = EnvConfig {
            n_agents: 1,
            ..valid()
        };
        match cfg.validate() {
            Err(ConfigError::InvalidAgentCount { n_agents: 1, .. }) => {}
            other => panic!("expected InvalidAgentCount, got {other:?}"),
        }
    }

    #[test]
    fn validate_too_many_agents_fails() {
        let cfg = EnvConfig {
            n_agents: 17,
            ..valid()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidAgentCount { n_agents: 17, .. })
        ));
    }

    #[test]
    fn validate_zero_dimension_fails() {
        let cfg = EnvConfig {
            world_size: [0, 4],
            ..valid()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidWorldSize {
                height: 0,
                width: 4
            })
        );
    }

    #[test]
    fn validate_zero_lengths_fail() {
        let cfg = EnvConfig {
            episode_length: 0,
            ..valid()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidEpisodeLength));
        let cfg = EnvConfig {
            dense_log_frequency: 0,
            ..valid()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidLogFrequency));
    }

    #[test]
    fn validate_duplicate_component_fails() {
        let mut cfg = valid();
        cfg.components.push(("Gather".into(), serde_json::json!({})));
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateComponent {
                name: "Gather".into()
            })
        );
    }

    #[test]
    fn json_fills_defaults() {
        let cfg = EnvConfig::from_json(
            r#"{
                "scenario_name": "quadrant",
                "components": [["Gather", {"move_labor": 0.5}], ["Build", null]],
                "n_agents": 3,
                "world_size": [10, 12]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.height(), 10);
        assert_eq!(cfg.width(), 12);
        assert_eq!(cfg.dense_log_frequency, 50);
        assert_eq!(cfg.components[0].1["move_labor"], 0.5);
        assert_eq!(cfg.action_mode(AgentClass::Mobile), ActionMode::Single);
        assert_eq!(cfg.action_mode(AgentClass::Planner), ActionMode::Multi);
    }

    #[test]
    fn json_rejects_unknown_keys() {
        assert!(matches!(
            EnvConfig::from_json(r#"{ "n_agent": 3 }"#),
            Err(ConfigError::Parse { .. })
        ));
    }
}
