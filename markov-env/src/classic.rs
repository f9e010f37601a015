//! Small hand-built MDPs with known solutions

use markov_core::{MarkovError, Result, TableDrivenMdp, Transition, WeightedDistribution};
use serde::{Deserialize, Serialize};

/// `start` loops on itself or reaches `end` with equal odds under `go`.
///
/// Reaching `end` pays 100. Under discount γ the value of `start` is
/// `50 / (1 - 0.5·γ)`.
pub fn two_state_chain() -> Result<TableDrivenMdp<&'static str, &'static str>> {
    let mut mdp = TableDrivenMdp::default();
    mdp.insert(
        "start",
        "go",
        WeightedDistribution::new(vec![
            (Transition::new("end", 100.0), 0.5),
            (Transition::new("start", 0.0), 0.5),
        ])?,
    );
    Ok(mdp)
}

/// Corridor moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorridorMove {
    /// Towards cell 0
    Left,
    /// Towards the goal
    Right,
}

/// Cells `0..length` in a row; the last cell is a terminal goal.
///
/// Every move costs `step_cost`, including the one onto the goal. Moving left
/// from cell 0 stays put.
pub fn corridor(length: usize, step_cost: f64) -> Result<TableDrivenMdp<usize, CorridorMove>> {
    if length < 2 {
        return Err(MarkovError::InvalidParameter(format!(
            "corridor needs at least two cells, got {length}"
        )));
    }
    let mut mdp = TableDrivenMdp::default();
    for cell in 0..length - 1 {
        mdp.insert(
            cell,
            CorridorMove::Left,
            WeightedDistribution::certain(Transition::new(cell.saturating_sub(1), step_cost)),
        );
        mdp.insert(
            cell,
            CorridorMove::Right,
            WeightedDistribution::certain(Transition::new(cell + 1, step_cost)),
        );
    }
    Ok(mdp)
}

/// Meadow scenario states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeadowState {
    /// Where every run begins
    Start,
    /// Pays 20 on arrival
    Meadow,
    /// Terminal, costs 1000
    Pit,
    /// Terminal, pays 100
    End,
}

/// Meadow scenario actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeadowAction {
    /// Leave the start
    North,
    /// Head for the end
    East,
    /// Back towards the start
    South,
}

/// Four-state scenario with a risky first move.
///
/// Going north from the start reaches the meadow (70%), falls into the pit
/// (10%) or stays put. From the meadow, east reaches the end half the time;
/// south returns to the start half the time. Otherwise both stay in the meadow.
pub fn meadow() -> Result<TableDrivenMdp<MeadowState, MeadowAction>> {
    use MeadowAction::{East, North, South};
    use MeadowState::{End, Meadow, Pit, Start};

    let mut mdp = TableDrivenMdp::default();
    mdp.insert(
        Start,
        North,
        WeightedDistribution::new(vec![
            (Transition::new(Meadow, 20.0), 0.7),
            (Transition::new(Pit, -1000.0), 0.1),
            (Transition::new(Start, 0.0), 0.2),
        ])?,
    );
    mdp.insert(
        Meadow,
        East,
        WeightedDistribution::new(vec![
            (Transition::new(End, 100.0), 0.5),
            (Transition::new(Meadow, 20.0), 0.5),
        ])?,
    );
    mdp.insert(
        Meadow,
        South,
        WeightedDistribution::new(vec![
            (Transition::new(Start, 0.0), 0.5),
            (Transition::new(Meadow, 20.0), 0.5),
        ])?,
    );
    Ok(mdp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use markov_core::MarkovDecisionProcess;

    #[test]
    fn test_two_state_chain() {
        let mdp = two_state_chain().unwrap();
        assert_eq!(mdp.states().len(), 1);
        assert!(mdp.is_terminal(&"end"));
        assert_relative_eq!(mdp.expected_reward(&"start", &"go").0, 50.0);
    }

    #[test]
    fn test_corridor_layout() {
        let mdp = corridor(4, -1.0).unwrap();
        assert_eq!(mdp.states().len(), 3);
        assert!(mdp.is_terminal(&3));

        let stay = mdp.transition_distribution(&0, &CorridorMove::Left).unwrap();
        assert_eq!(stay.events()[0], Transition::new(0, -1.0));
        let forward = mdp.transition_distribution(&2, &CorridorMove::Right).unwrap();
        assert_eq!(forward.events()[0], Transition::new(3, -1.0));

        assert!(corridor(1, -1.0).is_err());
    }

    #[test]
    fn test_meadow() {
        let mdp = meadow().unwrap();
        assert_eq!(mdp.states().len(), 2);
        assert!(mdp.is_terminal(&MeadowState::Pit));
        assert!(mdp.is_terminal(&MeadowState::End));

        // 0.7 * 20 - 0.1 * 1000
        let north = mdp.expected_reward(&MeadowState::Start, &MeadowAction::North).0;
        assert_relative_eq!(north, -86.0, epsilon = 1e-9);
        let east = mdp.expected_reward(&MeadowState::Meadow, &MeadowAction::East).0;
        assert_relative_eq!(east, 60.0);
        assert_relative_eq!(
            mdp.reward(&MeadowState::Start, &MeadowAction::North, &MeadowState::Pit).0,
            -1000.0
        );
    }
}
