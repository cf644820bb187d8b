//! Determinism and dense-log integration tests.
//!
//! Each test: build two environments from one config, reset both with the
//! same seed, drive them with the same seeded action stream, then compare
//! the recorded dense logs by fingerprint and step hash.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use bazaar_core::{Action, ActionMode, AgentKey};
use bazaar_engine::{ActionMap, EnvConfig, ScenarioEnv};
use bazaar_replay::{first_divergence, DenseLog};
use bazaar_test_utils::full_economy;

// ── Helpers ─────────────────────────────────────────────────────

fn config() -> EnvConfig {
    EnvConfig {
        scenario_name: "quadrant".to_string(),
        components: full_economy(),
        n_agents: 4,
        world_size: [10, 10],
        episode_length: 40,
        dense_log_frequency: 10,
        scenario: serde_json::json!({ "starting_coin": 20.0 }),
        ..EnvConfig::default()
    }
}

/// One uniformly random action per agent and the planner.
fn random_actions(env: &ScenarioEnv, rng: &mut ChaCha8Rng) -> ActionMap {
    let mut actions = ActionMap::new();
    for key in env.world().agent_keys() {
        let Some(layout) = env.action_layout().for_key(key) else {
            continue;
        };
        let action = match layout.mode() {
            ActionMode::Single => Action::Single(rng.gen_range(0..layout.single_size())),
            ActionMode::Multi => Action::Multi(
                layout
                    .multi_sizes()
                    .into_iter()
                    .map(|n| rng.gen_range(0..n))
                    .collect(),
            ),
        };
        actions.insert(key, action);
    }
    actions
}

/// Run one full logged episode and return its dense log.
fn run_episode(env: &mut ScenarioEnv, seed: u64, action_seed: u64) -> DenseLog {
    env.reset_with_seed(seed, true).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(action_seed);
    while !env.is_done() {
        let actions = random_actions(env, &mut rng);
        env.step(&actions).unwrap();
    }
    env.previous_episode_dense_log().unwrap().clone()
}

// ── Tests ───────────────────────────────────────────────────────

#[test]
fn same_seed_same_actions_same_log() {
    let mut a = ScenarioEnv::new(config()).unwrap();
    let mut b = ScenarioEnv::new(config()).unwrap();
    let log_a = run_episode(&mut a, 7, 99);
    let log_b = run_episode(&mut b, 7, 99);
    assert_eq!(log_a.fingerprint(), log_b.fingerprint());
    assert_eq!(first_divergence(&log_a, &log_b), None);
    assert_eq!(a.metrics(), b.metrics());
}

#[test]
fn reseeding_replays_the_episode() {
    let mut env = ScenarioEnv::new(config()).unwrap();
    let first = run_episode(&mut env, 3, 5);
    let second = run_episode(&mut env, 3, 5);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn different_seed_diverges() {
    let mut a = ScenarioEnv::new(config()).unwrap();
    let mut b = ScenarioEnv::new(config()).unwrap();
    let log_a = run_episode(&mut a, 1, 42);
    let log_b = run_episode(&mut b, 2, 42);
    assert_ne!(log_a.fingerprint(), log_b.fingerprint());
    assert!(first_divergence(&log_a, &log_b).is_some());
}

#[test]
fn dense_log_has_expected_shape() {
    let mut env = ScenarioEnv::new(config()).unwrap();
    let log = run_episode(&mut env, 5, 6);
    assert!(log.is_complete());
    assert_eq!(log.steps(), 40);
    assert_eq!(log.states.len(), 41);
    assert_eq!(log.actions.len(), 40);
    assert_eq!(log.rewards.len(), 40);
    // Reset snapshot plus one every tenth step.
    assert_eq!(log.world.len(), 5);
    assert_eq!(log.seed, 5);
    // Every agent and the planner has an action each step.
    assert!(log.actions.iter().all(|a| a.len() == 5));
    assert!(log.actions[0].contains_key(&AgentKey::Planner));
}

#[test]
fn dense_log_json_roundtrip_preserves_fingerprint() {
    let mut env = ScenarioEnv::new(config()).unwrap();
    let log = run_episode(&mut env, 8, 8);
    let restored = DenseLog::from_json(&log.to_json().unwrap()).unwrap();
    assert_eq!(restored.fingerprint(), log.fingerprint());
}

#[test]
fn unlogged_episode_keeps_previous_log() {
    let mut env = ScenarioEnv::new(config()).unwrap();
    let logged = run_episode(&mut env, 4, 4);

    env.reset(false).unwrap();
    assert!(env.dense_log().is_none());
    while !env.is_done() {
        env.step(&ActionMap::new()).unwrap();
    }
    assert_eq!(
        env.previous_episode_dense_log().map(DenseLog::fingerprint),
        Some(logged.fingerprint())
    );
}

#[test]
fn log_is_live_while_running() {
    let mut env = ScenarioEnv::new(config()).unwrap();
    env.reset(true).unwrap();
    env.step(&ActionMap::new()).unwrap();
    env.step(&ActionMap::new()).unwrap();
    let live = env.dense_log().unwrap();
    assert_eq!(live.steps(), 2);
    assert!(!live.is_complete());
    assert!(env.previous_episode_dense_log().is_none());
}
