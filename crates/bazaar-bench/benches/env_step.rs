//! Criterion benchmarks for the environment step loop.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use bazaar_bench::{reference_profile, rollout, stress_profile, RandomPolicy};
use bazaar_engine::{ActionMap, ScenarioEnv};

fn bench_step_reference(c: &mut Criterion) {
    let mut env = ScenarioEnv::new(reference_profile(42)).unwrap();
    env.reset(false).unwrap();
    let mut policy = RandomPolicy::new(7);

    c.bench_function("step_reference", |b| {
        b.iter(|| {
            let actions = policy.actions(&env);
            let result = env.step(&actions).unwrap();
            if result.done.all {
                env.reset(false).unwrap();
            }
            black_box(&result);
        });
    });
}

fn bench_step_stress(c: &mut Criterion) {
    let mut env = ScenarioEnv::new(stress_profile(42)).unwrap();
    env.reset(false).unwrap();
    let mut policy = RandomPolicy::new(7);

    c.bench_function("step_stress", |b| {
        b.iter(|| {
            let actions = policy.actions(&env);
            let result = env.step(&actions).unwrap();
            if result.done.all {
                env.reset(false).unwrap();
            }
            black_box(&result);
        });
    });
}

fn bench_noop_step(c: &mut Criterion) {
    let mut env = ScenarioEnv::new(reference_profile(42)).unwrap();
    env.reset(false).unwrap();
    let actions = ActionMap::new();

    c.bench_function("noop_step_reference", |b| {
        b.iter(|| {
            let result = env.step(&actions).unwrap();
            if result.done.all {
                env.reset(false).unwrap();
            }
            black_box(&result);
        });
    });
}

fn bench_logged_episode(c: &mut Criterion) {
    c.bench_function("logged_episode_200", |b| {
        b.iter(|| {
            let mut cfg = reference_profile(42);
            cfg.episode_length = 200;
            let mut env = ScenarioEnv::new(cfg).unwrap();
            env.reset(true).unwrap();
            let mut policy = RandomPolicy::new(1);
            let stats = rollout(&mut env, &mut policy, 200).unwrap();
            black_box(env.previous_episode_dense_log().map(|l| l.fingerprint()));
            black_box(stats);
        });
    });
}

criterion_group!(
    benches,
    bench_step_reference,
    bench_step_stress,
    bench_noop_step,
    bench_logged_episode
);
criterion_main!(benches);
