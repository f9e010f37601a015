//! Rectangular grid world built on a transition table

use indexmap::IndexSet;
use markov_core::{
    ActionTable, MarkovDecisionProcess, MarkovError, Result, Reward, TableDrivenMdp, Transition,
    WeightedDistribution,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A square of the grid; `x` is the column and `y` the row, origin bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridSquare {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
}

impl GridSquare {
    /// Create a new square
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Grid world actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridAction {
    /// One row up
    Up,
    /// One row down
    Down,
    /// One column left
    Left,
    /// One column right
    Right,
    /// Stay and search the square; only offered where a stochastic reward was added
    Dig,
}

impl GridAction {
    /// The four moves every square offers
    pub const MOVES: [GridAction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

/// Grid of `rows` × `columns` squares.
///
/// Every square offers the four moves. A move inside the grid costs
/// `movement_cost`; bumping into the edge leaves the agent in place and costs
/// `min(movement_cost, -1)`.
#[derive(Debug, Clone)]
pub struct GridWorld {
    rows: usize,
    columns: usize,
    movement_cost: f64,
    mdp: TableDrivenMdp<GridSquare, GridAction>,
}

impl GridWorld {
    /// Build an open grid with no goals
    pub fn new(rows: usize, columns: usize, movement_cost: f64) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(MarkovError::InvalidParameter(format!(
                "grid must have at least one row and column, got {rows}x{columns}"
            )));
        }
        if !movement_cost.is_finite() {
            return Err(MarkovError::InvalidParameter(format!(
                "movement cost must be finite, got {movement_cost}"
            )));
        }

        let mut world = Self {
            rows,
            columns,
            movement_cost,
            mdp: TableDrivenMdp::default(),
        };
        for x in 0..columns {
            for y in 0..rows {
                let square = GridSquare::new(x, y);
                let moves: ActionTable<GridSquare, GridAction> = GridAction::MOVES
                    .into_iter()
                    .map(|action| {
                        let transition = world.move_from(square, action);
                        (action, WeightedDistribution::certain(transition))
                    })
                    .collect();
                world.mdp.set_actions(square, moves);
            }
        }
        debug!(rows, columns, movement_cost, "built grid world");
        Ok(world)
    }

    fn move_from(&self, square: GridSquare, action: GridAction) -> Transition<GridSquare> {
        let GridSquare { x, y } = square;
        let target = match action {
            GridAction::Up if y + 1 < self.rows => Some(GridSquare::new(x, y + 1)),
            GridAction::Down if y > 0 => Some(GridSquare::new(x, y - 1)),
            GridAction::Left if x > 0 => Some(GridSquare::new(x - 1, y)),
            GridAction::Right if x + 1 < self.columns => Some(GridSquare::new(x + 1, y)),
            _ => None,
        };
        match target {
            Some(next) => Transition::new(next, self.movement_cost),
            None => Transition::new(square, self.movement_cost.min(-1.0)),
        }
    }

    fn check_square(&self, square: GridSquare) -> Result<()> {
        if self.contains(square) {
            Ok(())
        } else {
            Err(MarkovError::InvalidParameter(format!(
                "{square:?} lies outside the {}x{} grid",
                self.rows, self.columns
            )))
        }
    }

    /// Whether `square` lies inside the grid
    #[must_use]
    pub fn contains(&self, square: GridSquare) -> bool {
        square.x < self.columns && square.y < self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Cost of an ordinary move
    #[must_use]
    pub fn movement_cost(&self) -> f64 {
        self.movement_cost
    }

    /// Make `square` terminal, paying `reward` on every edge into it
    pub fn add_goal(&mut self, square: GridSquare, reward: f64) -> Result<&mut Self> {
        self.check_square(square)?;
        self.mdp.overwrite_rewards_into(&square, Reward(reward));
        self.mdp.remove_state(&square);
        Ok(self)
    }

    /// Same as a goal; a vortex usually carries a penalty
    pub fn add_vortex(&mut self, square: GridSquare, reward: f64) -> Result<&mut Self> {
        self.add_goal(square, reward)
    }

    /// Every move from `from` teleports to `to` and pays `reward`
    pub fn add_nexus(
        &mut self,
        from: GridSquare,
        to: GridSquare,
        reward: f64,
    ) -> Result<&mut Self> {
        self.check_square(from)?;
        self.check_square(to)?;
        let moves: ActionTable<GridSquare, GridAction> = GridAction::MOVES
            .into_iter()
            .map(|action| {
                (
                    action,
                    WeightedDistribution::certain(Transition::new(to, reward)),
                )
            })
            .collect();
        self.mdp.set_actions(from, moves);
        Ok(self)
    }

    /// Offer `action` at `square`: stay put, paying `reward` with `probability`
    /// and `cost` otherwise.
    pub fn add_stochastic_reward(
        &mut self,
        reward: f64,
        square: GridSquare,
        action: GridAction,
        probability: f64,
        cost: f64,
    ) -> Result<&mut Self> {
        self.check_square(square)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(MarkovError::InvalidParameter(format!(
                "probability must be between 0 and 1, got {probability}"
            )));
        }
        let distribution = WeightedDistribution::new(vec![
            (Transition::new(square, reward), probability),
            (Transition::new(square, cost), 1.0 - probability),
        ])?;
        self.mdp.insert(square, action, distribution);
        Ok(self)
    }

    /// The underlying transition table
    #[must_use]
    pub fn mdp(&self) -> &TableDrivenMdp<GridSquare, GridAction> {
        &self.mdp
    }
}

impl MarkovDecisionProcess for GridWorld {
    type State = GridSquare;
    type Action = GridAction;

    fn states(&self) -> IndexSet<GridSquare> {
        self.mdp.states()
    }

    fn actions_available(&self, state: &GridSquare) -> Option<IndexSet<GridAction>> {
        self.mdp.actions_available(state)
    }

    fn transition_distribution(
        &self,
        state: &GridSquare,
        action: &GridAction,
    ) -> Option<&WeightedDistribution<Transition<GridSquare>>> {
        self.mdp.transition_distribution(state, action)
    }
}

impl From<GridWorld> for TableDrivenMdp<GridSquare, GridAction> {
    fn from(world: GridWorld) -> Self {
        world.mdp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ORIGIN: GridSquare = GridSquare::new(0, 0);

    #[test]
    fn test_moves_and_walls() {
        let world = GridWorld::new(3, 4, 0.0).unwrap();
        assert_eq!(world.states().len(), 12);

        let up = world.transition_distribution(&ORIGIN, &GridAction::Up).unwrap();
        assert_eq!(up.events()[0], Transition::new(GridSquare::new(0, 1), 0.0));

        let bump = world.transition_distribution(&ORIGIN, &GridAction::Left).unwrap();
        assert_eq!(bump.events()[0], Transition::new(ORIGIN, -1.0));

        let corner = GridSquare::new(3, 2);
        assert_relative_eq!(world.expected_reward(&corner, &GridAction::Right).0, -1.0);
        assert_relative_eq!(world.expected_reward(&corner, &GridAction::Up).0, -1.0);
        assert_relative_eq!(world.expected_reward(&corner, &GridAction::Left).0, 0.0);
    }

    #[test]
    fn test_wall_cost_never_cheaper_than_a_move() {
        let world = GridWorld::new(2, 2, -3.0).unwrap();
        assert_relative_eq!(world.expected_reward(&ORIGIN, &GridAction::Down).0, -3.0);
        assert_relative_eq!(world.expected_reward(&ORIGIN, &GridAction::Up).0, -3.0);
    }

    #[test]
    fn test_goal_is_terminal_and_pays() {
        let mut world = GridWorld::new(2, 2, -1.0).unwrap();
        let goal = GridSquare::new(1, 1);
        world.add_goal(goal, 10.0).unwrap();

        assert!(world.is_terminal(&goal));
        assert_eq!(world.states().len(), 3);
        let left_of_goal = GridSquare::new(0, 1);
        let below_goal = GridSquare::new(1, 0);
        assert_relative_eq!(world.reward(&left_of_goal, &GridAction::Right, &goal).0, 10.0);
        assert_relative_eq!(world.reward(&below_goal, &GridAction::Up, &goal).0, 10.0);
        assert!(world.add_goal(GridSquare::new(5, 5), 1.0).is_err());
    }

    #[test]
    fn test_nexus_teleports() {
        let mut world = GridWorld::new(3, 3, 0.0).unwrap();
        let far = GridSquare::new(2, 2);
        world.add_nexus(ORIGIN, far, 7.0).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        for action in GridAction::MOVES {
            let (next, reward) = world.step(&ORIGIN, &action, &mut rng).unwrap();
            assert_eq!(next, far);
            assert_relative_eq!(reward.0, 7.0);
        }
    }

    #[test]
    fn test_stochastic_reward() {
        let mut world = GridWorld::new(3, 3, -1.0).unwrap();
        let spot = GridSquare::new(1, 1);
        world
            .add_stochastic_reward(5.0, spot, GridAction::Dig, 0.2, -1.0)
            .unwrap();

        let actions = world.actions_available(&spot).unwrap();
        assert_eq!(actions.len(), 5);
        assert!(actions.contains(&GridAction::Dig));
        assert!(!world.actions_available(&ORIGIN).unwrap().contains(&GridAction::Dig));

        // 0.2 * 5 + 0.8 * -1
        let expected = world.expected_reward(&spot, &GridAction::Dig).0;
        assert_relative_eq!(expected, 0.2, epsilon = 1e-12);
        assert!(world
            .add_stochastic_reward(5.0, spot, GridAction::Dig, 1.5, -1.0)
            .is_err());
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(GridWorld::new(0, 3, -1.0).is_err());
        assert!(GridWorld::new(3, 3, f64::NAN).is_err());
    }
}
