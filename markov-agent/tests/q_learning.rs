//! Q-learning converges on small deterministic models

use std::rc::Rc;

use approx::assert_relative_eq;
use markov_agent::{ConstantStep, QLearner};
use markov_core::{
    LearnerConfig, MarkovDecisionProcess, MdpEnvironment, StepSizeConfig, TableDrivenMdp,
    TrackedEnvironment,
};
use markov_env::{corridor, CorridorMove};
use rand::rngs::StdRng;
use rand::SeedableRng;

const OPTIMAL: [f64; 4] = [-3.439, -2.71, -1.9, -1.0];

fn corridor_model() -> Rc<TableDrivenMdp<usize, CorridorMove>> {
    Rc::new(corridor(5, -1.0).expect("valid corridor"))
}

fn config(backward: bool) -> LearnerConfig {
    LearnerConfig {
        discount: 0.9,
        epsilon: 0.2,
        step_size: StepSizeConfig::Decaying { minimum: 0.05 },
        max_steps: 100,
        episodes: 2000,
        backward,
        seed: Some(7),
    }
}

#[test]
fn test_learns_corridor_values() -> anyhow::Result<()> {
    let mdp = corridor_model();
    let config = config(false);
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());

    let mut learner = QLearner::from_config(MdpEnvironment::new(Rc::clone(&mdp), 0), &config)?;
    let model = Rc::clone(&mdp);
    let policy = learner.greedy_policy(config.epsilon, move |cell: &usize| {
        model.actions_available(cell)
    })?;

    let steps = learner.train(&policy, &0, &config, &mut rng)?;
    assert!(steps >= config.episodes * 4);

    let table = learner.snapshot();
    for (cell, value) in OPTIMAL.iter().enumerate() {
        assert_relative_eq!(table.max_value(&cell).unwrap(), *value, epsilon = 0.05);
        assert_eq!(table.greedy_action(&cell), Some(&CorridorMove::Right));
    }
    assert!(table.actions(&4).is_none());
    Ok(())
}

#[test]
fn test_backward_learning_matches_forward() -> anyhow::Result<()> {
    let mdp = corridor_model();
    let config = config(true);
    let mut rng = StdRng::seed_from_u64(3);

    let mut learner = QLearner::from_config(MdpEnvironment::new(Rc::clone(&mdp), 0), &config)?;
    let model = Rc::clone(&mdp);
    let policy = learner.greedy_policy(config.epsilon, move |cell: &usize| {
        model.actions_available(cell)
    })?;
    learner.train(&policy, &0, &config, &mut rng)?;

    for (cell, value) in OPTIMAL.iter().enumerate() {
        let estimate = learner.estimate(&cell, &CorridorMove::Right);
        assert_relative_eq!(estimate, *value, epsilon = 0.05);
    }
    Ok(())
}

#[test]
fn test_tracked_environment_records_episodes() -> anyhow::Result<()> {
    let mdp = corridor_model();
    let env = TrackedEnvironment::new(MdpEnvironment::new(Rc::clone(&mdp), 0));
    let mut learner = QLearner::new(env, 0.9, ConstantStep::new(0.5)?)?;
    let mut rng = StdRng::seed_from_u64(5);

    let model = Rc::clone(&mdp);
    let explore = learner.greedy_policy(1.0, move |cell: &usize| model.actions_available(cell))?;
    for _ in 0..3 {
        learner.learn(&explore, 0, 50, &mut rng)?;
    }
    // the third episode is still open
    let tracked = learner.environment();
    assert_eq!(tracked.history().len(), 2);
    assert!(tracked.episode().steps > 0);
    assert!(tracked.episode().total_reward < 0.0);
    Ok(())
}

#[test]
fn test_learner_config_from_json() -> anyhow::Result<()> {
    let config = LearnerConfig::from_json_str(
        r#"{"epsilon": 0.3, "step_size": {"schedule": "constant", "step_size": 0.25}}"#,
    )?;
    assert_relative_eq!(config.epsilon, 0.3);
    assert_eq!(config.step_size, StepSizeConfig::Constant { step_size: 0.25 });

    let env = MdpEnvironment::new(corridor_model(), 0);
    let learner = QLearner::from_config(env, &config)?;
    assert_relative_eq!(learner.discount(), 0.9);

    assert!(LearnerConfig::from_json_str(r#"{"epsilon": 1.5}"#).is_err());
    Ok(())
}
