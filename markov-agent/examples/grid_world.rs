//! Example: solve a grid world by planning and by learning
//!
//! Run with `RUST_LOG=debug` to see every sweep. An optional argument names a
//! JSON `SolverConfig` file.

use std::rc::Rc;

use markov_agent::{policy_iteration, value_iteration, QLearner};
use markov_core::{
    rollout, LearnerConfig, MarkovDecisionProcess, MdpEnvironment, Policy, RandomSelectPolicy,
    SolverConfig, StochasticPolicy,
};
use markov_env::{meadow, GridAction, GridSquare, GridWorld, MeadowState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ROWS: usize = 5;
const COLUMNS: usize = 5;

fn arrow(action: Option<&GridAction>) -> char {
    match action {
        Some(GridAction::Up) => '^',
        Some(GridAction::Down) => 'v',
        Some(GridAction::Left) => '<',
        Some(GridAction::Right) => '>',
        Some(GridAction::Dig) => '*',
        None => '.',
    }
}

fn print_policy(policy: &StochasticPolicy<GridSquare, GridAction>) {
    for y in (0..ROWS).rev() {
        let row: String = (0..COLUMNS)
            .map(|x| arrow(policy.actions(&GridSquare::new(x, y)).and_then(<[_]>::first)))
            .collect();
        println!("    {row}");
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let solver = match std::env::args().nth(1) {
        Some(path) => SolverConfig::from_json_file(path)?,
        None => SolverConfig::new(1e-3, 0.9),
    };
    let mut rng = StdRng::seed_from_u64(42);

    // Wander the meadow at random until something terminal happens
    let mdp = Rc::new(meadow()?);
    let wander = RandomSelectPolicy::for_mdp(&*mdp);
    let mut env = MdpEnvironment::new(Rc::clone(&mdp), MeadowState::Start);
    let walk = rollout(&mut env, &wander, MeadowState::Start, 1000, &mut rng)?;
    for step in &walk {
        info!(from = ?step.state, action = ?step.action, to = ?step.next_state, "meadow step");
    }
    println!("Meadow score after {} steps: {}", walk.len(), walk.total_reward());

    // Treasure hunt: digging pays off only now and then
    let mut world = GridWorld::new(ROWS, COLUMNS, -1.0)?;
    world
        .add_stochastic_reward(5.0, GridSquare::new(2, 2), GridAction::Dig, 0.2, -1.0)?
        .add_stochastic_reward(100.0, GridSquare::new(0, 4), GridAction::Dig, 0.01, -1.0)?
        .add_stochastic_reward(1000.0, GridSquare::new(4, 0), GridAction::Dig, 0.005, -1.0)?;
    let world = Rc::new(world);
    let origin = GridSquare::new(0, 0);

    let by_policy = policy_iteration::optimal_policy(&*world, &solver)?;
    println!(
        "\nPolicy iteration: {} rounds, {} evaluation sweeps",
        by_policy.iterations, by_policy.evaluation_sweeps
    );
    print_policy(&by_policy.policy);

    let by_value = value_iteration::optimal_policy(&*world, &solver)?;
    println!("\nValue iteration: {} sweeps", by_value.sweeps);
    print_policy(&by_value.policy);
    println!("V(origin) = {:.3}", by_value.values.get(&origin));

    let mut env = MdpEnvironment::new(Rc::clone(&world), origin);
    let played = rollout(&mut env, &by_value.policy, origin, 200, &mut rng)?;
    println!("Score over {} steps: {}", played.len(), played.total_reward());

    // Learn the same grid without looking at the model
    let config = LearnerConfig {
        discount: solver.discount,
        episodes: 300,
        max_steps: 200,
        ..LearnerConfig::default()
    };
    let env = MdpEnvironment::new(Rc::clone(&world), origin);
    let mut learner = QLearner::from_config(env, &config)?;
    let model = Rc::clone(&world);
    let explore = learner.greedy_policy(config.epsilon, move |square: &GridSquare| {
        model.actions_available(square)
    })?;
    let steps = learner.train(&explore, &origin, &config, &mut rng)?;

    let table = learner.snapshot();
    let mut greedy = StochasticPolicy::new();
    for square in world.states() {
        if let Some(action) = table.greedy_action(&square) {
            greedy.set_actions(square, vec![*action]);
        }
    }
    println!("\nQ-learning: {steps} steps over {} episodes", config.episodes);
    print_policy(&greedy);

    let agrees = world
        .states()
        .into_iter()
        .filter(|square| {
            greedy
                .choose_action(square, &mut rng)
                .is_some_and(|action| by_value.policy.probability(square, &action) > 0.0)
        })
        .count();
    println!(
        "Learned policy matches value iteration on {agrees} of {} squares",
        world.states().len()
    );

    Ok(())
}
