//! Property tests: coin and resources are never created or destroyed
//! except through building, regeneration and burned trading fees.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use bazaar_core::{Action, ActionMode, Resource};
use bazaar_engine::{ActionMap, EnvConfig, ScenarioEnv};
use bazaar_test_utils::{full_economy, trading_economy};

fn config(components: Vec<(String, serde_json::Value)>, scenario_name: &str) -> EnvConfig {
    EnvConfig {
        scenario_name: scenario_name.to_string(),
        components,
        n_agents: 4,
        world_size: [8, 8],
        episode_length: 30,
        scenario: serde_json::json!({
            "regen_prob": 0.0,
            "starting_coin": 15.0,
            "wood_density": 0.3,
            "stone_density": 0.3,
        }),
        ..EnvConfig::default()
    }
}

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

fn totals(env: &ScenarioEnv) -> (f64, [u64; Resource::COUNT]) {
    let world = env.world();
    (
        world.total_coin(),
        Resource::ALL.map(|r| world.total_resource(r)),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn trading_conserves_coin_and_goods(env_seed in 0u64..1000, action_seed in any::<u64>()) {
        let mut env = ScenarioEnv::new(config(trading_economy_without_build(), "uniform")).unwrap();
        env.reset_with_seed(env_seed, false).unwrap();
        let (coin0, goods0) = totals(&env);
        let mut rng = ChaCha8Rng::seed_from_u64(action_seed);
        while !env.is_done() {
            let actions = random_actions(&env, &mut rng);
            env.step(&actions).unwrap();
            let (coin, goods) = totals(&env);
            prop_assert!((coin - coin0).abs() < 1e-9, "coin {} -> {}", coin0, coin);
            prop_assert_eq!(goods, goods0);
            for agent in &env.world().agents {
                prop_assert!(agent.coin() >= 0.0);
                prop_assert!(agent.escrow_coin() >= 0.0);
            }
        }
    }

    #[test]
    fn burned_fees_account_for_missing_coin(env_seed in 0u64..1000, action_seed in any::<u64>()) {
        let components = vec![
            ("Gather".to_string(), serde_json::Value::Null),
            (
                "ContinuousDoubleAuction".to_string(),
                serde_json::json!({ "max_bid_ask": 10, "transaction_cost": 0.05 }),
            ),
        ];
        let mut env = ScenarioEnv::new(config(components, "uniform")).unwrap();
        env.reset_with_seed(env_seed, false).unwrap();
        let (coin0, goods0) = totals(&env);
        let mut rng = ChaCha8Rng::seed_from_u64(action_seed);
        while !env.is_done() {
            let actions = random_actions(&env, &mut rng);
            env.step(&actions).unwrap();
            let burned = env.metrics()["ContinuousDoubleAuction/fees_burned"];
            let (coin, goods) = totals(&env);
            prop_assert!(burned >= 0.0);
            prop_assert!((coin + burned - coin0).abs() < 1e-9, "coin {} + fees {} != {}", coin, burned, coin0);
            prop_assert_eq!(goods, goods0);
        }
    }

    #[test]
    fn building_accounts_for_every_unit(env_seed in 0u64..1000, action_seed in any::<u64>()) {
        let mut env = ScenarioEnv::new(config(full_economy(), "quadrant")).unwrap();
        env.reset_with_seed(env_seed, false).unwrap();
        let (coin0, goods0) = totals(&env);
        let mut rng = ChaCha8Rng::seed_from_u64(action_seed);
        while !env.is_done() {
            let actions = random_actions(&env, &mut rng);
            env.step(&actions).unwrap();
        }
        let metrics = env.metrics();
        let houses = metrics["Build/houses_built"] as u64;
        let paid = metrics["Build/total_payment"];
        let (coin, goods) = totals(&env);
        prop_assert!((coin - coin0 - paid).abs() < 1e-6);
        // Each house consumes one wood and one stone.
        for r in Resource::ALL {
            prop_assert_eq!(goods[r.index()] + houses, goods0[r.index()]);
        }
    }
}

fn trading_economy_without_build() -> Vec<(String, serde_json::Value)> {
    trading_economy()
        .into_iter()
        .filter(|(name, _)| name != "Build")
        .collect()
}
