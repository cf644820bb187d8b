//! End-to-end rollout example.
//!
//! Demonstrates: build config → ScenarioEnv → reset with logging → step
//! under a random policy → read metrics → export the dense log.
//!
//! Run with `RUST_LOG=bazaar_engine=debug` to see per-component tracing.

use bazaar_bench::{reference_profile, RandomPolicy};
use bazaar_engine::ScenarioEnv;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bazaar_engine=info")),
        )
        .init();

    println!("=== Bazaar Rollout Example ===\n");

    let mut config = reference_profile(42);
    config.episode_length = 200;
    config.dense_log_frequency = 25;
    let mut env = ScenarioEnv::new(config).unwrap();
    let mut policy = RandomPolicy::new(7);

    for episode in 1..=2 {
        env.reset(episode == 2).unwrap();
        let mut total_reward = 0.0;
        while !env.is_done() {
            let actions = policy.actions(&env);
            let result = env.step(&actions).unwrap();
            total_reward += result.reward.values().sum::<f64>();
            let t = env.timestep().0;
            if t % 50 == 0 {
                let m = env.metrics();
                println!(
                    "  episode {episode} t={t:>3}: productivity={:>8.2} equality={:.3} houses={}",
                    m["social/productivity"], m["social/equality"], m["Build/houses_built"],
                );
            }
        }
        println!("Episode {episode}: total reward {total_reward:.3}\n");
    }

    if let Some(log) = env.previous_episode_dense_log() {
        println!(
            "Dense log: {} steps, {} world snapshots, fingerprint {:016x}",
            log.steps(),
            log.world.len(),
            log.fingerprint()
        );
        let path = std::env::temp_dir().join("bazaar_rollout_log.json");
        match log.save(&path) {
            Ok(()) => println!("Saved to {}", path.display()),
            Err(e) => eprintln!("Could not save log: {e}"),
        }
    }
}
