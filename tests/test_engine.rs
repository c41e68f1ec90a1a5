//! Integration tests for the trading environment.

use std::collections::HashMap;

use allocgym::core::types::{Actions, EnvConfig, EnvState};
use allocgym::env::{AgentRecord, TradingEnv};
use allocgym::space::AllocationSpace;
use allocgym::GymError;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn scenario_env() -> TradingEnv {
    // A strictly increasing, B constant
    TradingEnv::from_prices(
        vec!["A".to_string(), "B".to_string()],
        vec![100, 200, 300, 400, 500],
        vec![
            vec![10.0, 50.0],
            vec![11.0, 50.0],
            vec![12.5, 50.0],
            vec![13.0, 50.0],
            vec![15.6, 50.0],
        ],
        EnvConfig::default(),
    )
    .unwrap()
}

fn single(name: &str, weights: Vec<f64>) -> Actions {
    let mut actions = HashMap::new();
    actions.insert(name.to_string(), weights);
    actions
}

#[test]
fn test_uniform_agent_scenario() {
    let _ = env_logger::try_init();
    let mut env = scenario_env();
    env.register("uniform");
    env.reset().unwrap();

    let prices_a = [10.0, 11.0, 12.5, 13.0, 15.6];
    let third = 1.0 / 3.0;
    for t in 1..5 {
        let result = env.step(&single("uniform", vec![third; 3])).unwrap();
        let r_a = (prices_a[t] - prices_a[t - 1]) / prices_a[t - 1];
        let expected = third * r_a + third * 0.0 + third * 0.0;
        assert!((result.rewards["uniform"] - expected).abs() < 1e-12);
        assert_eq!(result.done, t == 4);
    }

    let record = env.record("uniform").unwrap();
    let wealth = record.wealth();
    let expected: f64 = (1..5)
        .map(|t| 1.0 + third * (prices_a[t] - prices_a[t - 1]) / prices_a[t - 1])
        .product();
    assert!((wealth.values[4] - expected).abs() < 1e-12);
}

#[test]
fn test_termination_after_n_minus_one_steps() {
    let _ = env_logger::try_init();
    let mut env = scenario_env();
    env.register("cash");
    env.reset().unwrap();

    for step in 1..=4 {
        let result = env.step(&single("cash", vec![0.0, 0.0, 1.0])).unwrap();
        assert_eq!(env.cursor(), step);
        assert_eq!(result.done, step == 4);
    }
    assert_eq!(env.state(), EnvState::Terminated);
    assert_eq!(env.index(), 500);

    let err = env.step(&single("cash", vec![0.0, 0.0, 1.0])).unwrap_err();
    assert_eq!(
        err,
        GymError::EpisodeNotRunning {
            state: "terminated".to_string()
        }
    );

    // a new episode starts from a clean record
    let obs = env.reset().unwrap();
    assert_eq!(obs.index, 0);
    assert_eq!(env.state(), EnvState::Running);
    assert!(env.record("cash").unwrap().reward(1).is_none());
}

#[test]
fn test_rewards_independent_of_insertion_order() {
    let _ = env_logger::try_init();
    let names = ["alpha", "beta", "gamma"];
    let weights = [
        vec![1.0, 0.0, 0.0],
        vec![0.2, 0.3, 0.5],
        vec![1.5, -0.5, 0.0],
    ];

    let mut forward = scenario_env();
    let mut backward = scenario_env();
    names.iter().for_each(|n| forward.register(*n));
    names.iter().rev().for_each(|n| backward.register(*n));
    forward.reset().unwrap();
    backward.reset().unwrap();

    let actions: Actions = names
        .iter()
        .zip(weights.iter())
        .map(|(n, w)| (n.to_string(), w.clone()))
        .collect();
    let a = forward.step(&actions).unwrap();
    let b = backward.step(&actions).unwrap();
    for name in names {
        assert_eq!(a.rewards[name], b.rewards[name]);
    }
}

#[test]
fn test_rejected_step_changes_nothing() {
    let _ = env_logger::try_init();
    let mut env = scenario_env();
    env.register("a");
    env.register("b");
    env.reset().unwrap();

    let mut actions = single("a", vec![0.5, 0.5, 0.0]);
    actions.insert("b".to_string(), vec![f64::NAN, 0.5, 0.5]);
    let err = env.step(&actions).unwrap_err();
    assert!(matches!(err, GymError::InvalidAllocation { .. }));
    assert_eq!(env.cursor(), 0);
    assert_eq!(env.state(), EnvState::Running);
    assert!(env.record("a").unwrap().allocation(1).is_none());

    // missing agent
    let err = env.step(&single("a", vec![0.5, 0.5, 0.0])).unwrap_err();
    assert!(matches!(err, GymError::InvalidActionSet { .. }));
    assert_eq!(env.cursor(), 0);
}

fn snapshot(env: &TradingEnv) -> Vec<(String, AgentRecord)> {
    env.agents()
        .into_iter()
        .map(|name| (name.to_string(), env.record(name).unwrap().clone()))
        .collect()
}

fn assert_records_unchanged(env: &TradingEnv, before: &[(String, AgentRecord)]) {
    assert_eq!(env.agents().len(), before.len());
    for (name, record) in before {
        assert_eq!(env.record(name).unwrap(), record, "record of {} changed", name);
    }
}

#[test]
fn test_rejected_step_leaves_every_record_intact() {
    let _ = env_logger::try_init();
    let mut env = scenario_env();
    env.register("a");
    env.register("b");
    env.reset().unwrap();

    let mut actions = single("a", vec![0.5, 0.5, 0.0]);
    actions.insert("b".to_string(), vec![0.0, 0.0, 1.0]);
    env.step(&actions).unwrap();

    let before = snapshot(&env);
    let cursor = env.cursor();

    // b is over budget
    let mut actions = single("a", vec![0.5, 0.5, 0.0]);
    actions.insert("b".to_string(), vec![0.7, 0.7, 0.0]);
    let err = env.step(&actions).unwrap_err();
    assert!(matches!(err, GymError::InvalidAllocation { .. }));
    assert_eq!(env.cursor(), cursor);
    assert_records_unchanged(&env, &before);

    // b is missing
    let err = env.step(&single("a", vec![0.5, 0.5, 0.0])).unwrap_err();
    assert!(matches!(err, GymError::InvalidActionSet { .. }));
    assert_eq!(env.cursor(), cursor);
    assert_records_unchanged(&env, &before);
}

#[test]
fn test_register_twice_then_unregister_all() {
    let _ = env_logger::try_init();
    let mut env = scenario_env();
    env.register("a");
    env.register("a");
    assert_eq!(env.agents(), vec!["a"]);

    env.unregister(None);
    let err = env.step(&single("a", vec![0.0, 0.0, 1.0])).unwrap_err();
    assert_eq!(err, GymError::NoAgentsRegistered);
}

#[test]
fn test_sampled_allocations_always_accepted() {
    let _ = env_logger::try_init();
    let mut rng = StdRng::seed_from_u64(2024);
    for short_sales in [true, false] {
        let mut env = TradingEnv::from_prices(
            vec!["A".to_string(), "B".to_string()],
            vec![1, 2, 3],
            vec![vec![1.0, 2.0], vec![1.1, 1.9], vec![1.2, 2.1]],
            EnvConfig::default().with_short_sales(short_sales),
        )
        .unwrap();
        env.register("sampler");
        env.reset().unwrap();
        let space = AllocationSpace::for_short_sales(3, short_sales);
        assert_eq!(env.action_space(), &space);
        let action = space.sample(&mut rng);
        assert!(env.step(&single("sampler", action)).is_ok());
    }
}

#[test]
fn test_invalid_tapes_rejected() {
    let universe = vec!["A".to_string()];
    let config = EnvConfig::default();
    // single timestamp
    assert!(TradingEnv::from_prices(universe.clone(), vec![1], vec![vec![1.0]], config.clone()).is_err());
    // non-positive price
    assert!(TradingEnv::from_prices(
        universe.clone(),
        vec![1, 2],
        vec![vec![1.0], vec![0.0]],
        config.clone()
    )
    .is_err());
    // cash symbol collision
    assert!(TradingEnv::from_prices(
        vec!["CASH".to_string()],
        vec![1, 2],
        vec![vec![1.0], vec![2.0]],
        config
    )
    .is_err());
}
