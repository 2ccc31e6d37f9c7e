mod grid;
mod state;

use std::collections::BTreeMap;

use log::{debug, trace};
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    Rng, SeedableRng,
};
use strum::{IntoEnumIterator, VariantArray};

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment, Report, Step},
    error::{Error, Result},
};

pub use grid::{Cell, Grid};
pub use state::{Action, State};

/// Distribution over resulting states
///
/// Ordered by state so sampling is reproducible under a seeded rng.
pub type TransitionProbs = BTreeMap<State, f64>;

/// Configuration for the [`GridWorld`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridWorldConfig {
    /// Probability that an action moves in its intended direction, must be in `(0, 1]`
    pub move_prob: f64,
    /// Reward for entering a non-terminal cell
    pub default_reward: f64,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self {
            move_prob: 0.8,
            default_reward: 0.4,
        }
    }
}

/// A grid world with stochastic action execution
///
/// The agent starts in the bottom-left corner. Each action succeeds with probability `move_prob`,
/// otherwise the agent slips to one of the two orthogonal directions with equal probability. It
/// never moves opposite to the chosen direction. Moves off the grid or into a [`Cell::Blocked`]
/// cell leave the agent where it was. Entering a [`Cell::Reward`] or [`Cell::Penalty`] cell ends
/// the episode.
///
/// ### Generics
/// - `R` - The random source used to sample transitions, injectable for reproducibility
pub struct GridWorld<R: Rng = StdRng> {
    grid: Grid,
    agent_state: State,
    config: GridWorldConfig,
    rng: R,
    pub report: Report,
}

impl GridWorld {
    /// Initialize a `GridWorld` with the default configuration and an entropy-seeded rng
    pub fn new(grid: Grid) -> Result<Self> {
        Self::with_config(grid, GridWorldConfig::default())
    }

    pub fn with_config(grid: Grid, config: GridWorldConfig) -> Result<Self> {
        Self::with_rng(grid, config, StdRng::from_entropy())
    }
}

impl<R: Rng> GridWorld<R> {
    /// Initialize a `GridWorld` sampling its transitions from `rng`
    ///
    /// **Errors** if `move_prob` is not in the interval `(0, 1]`, or if the start cell is blocked
    pub fn with_rng(grid: Grid, config: GridWorldConfig, rng: R) -> Result<Self> {
        // Written so that NaN is rejected too
        if !(config.move_prob > 0.0 && config.move_prob <= 1.0) {
            return Err(Error::InvalidMoveProb {
                value: config.move_prob,
            });
        }

        let start = start_state(&grid);
        if grid.get(start) == Some(Cell::Blocked) {
            return Err(Error::BlockedStart { state: start });
        }

        Ok(Self {
            grid,
            agent_state: start,
            config,
            rng,
            report: Report::new(vec!["steps", "reward"]),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }

    pub fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.grid.column_count()
    }

    /// The current location of the agent
    pub fn agent_state(&self) -> State {
        self.agent_state
    }

    /// Only normal cells accept actions; terminal, blocked and out-of-grid coordinates don't
    pub fn can_act_at(&self, state: State) -> bool {
        self.grid.get(state) == Some(Cell::Normal)
    }

    /// Probability of each state reachable by taking `action` in `state`
    ///
    /// Empty if `state` is not actionable. Otherwise the values sum to 1. Slips into the same
    /// resulting state (e.g. two directions both blocked by walls) have their probabilities merged.
    pub fn transition_probs(&self, state: State, action: Action) -> TransitionProbs {
        let mut probs = TransitionProbs::new();
        if !self.can_act_at(state) {
            return probs;
        }

        let move_prob = self.config.move_prob;
        for a in Action::iter() {
            let prob = if a == action {
                move_prob
            } else if a != action.opposite() {
                (1.0 - move_prob) / 2.0
            } else {
                0.0
            };
            trace!("action {a:?} has prob {prob}");

            *probs.entry(self.resolve(state, a)).or_insert(0.0) += prob;
        }

        probs
    }

    /// Where taking `action` in `state` leads if it is executed as intended
    ///
    /// **Errors** with [`Error::InvalidMove`] if `state` is not actionable
    pub fn move_from(&self, state: State, action: Action) -> Result<State> {
        if !self.can_act_at(state) {
            return Err(Error::InvalidMove { state });
        }

        Ok(self.resolve(state, action))
    }

    fn resolve(&self, state: State, action: Action) -> State {
        state
            .offset(action.delta())
            .filter(|next| matches!(self.grid.get(*next), Some(c) if c != Cell::Blocked))
            .unwrap_or(state)
    }

    /// **Returns** `(reward, done)` for entering `state`
    pub fn reward_and_done(&self, state: State) -> (f64, bool) {
        match self.grid.get(state) {
            Some(Cell::Reward) => (1.0, true),
            Some(Cell::Penalty) => (-1.0, true),
            _ => (self.config.default_reward, false),
        }
    }

    /// Sample the outcome of taking `action` in `state` without moving the agent
    ///
    /// **Returns** `None` if `state` is not actionable
    pub fn transit(&mut self, state: State, action: Action) -> Option<Step<State>> {
        let probs = self.transition_probs(state, action);
        if probs.is_empty() {
            return None;
        }

        let (next_states, mut weights): (Vec<State>, Vec<f64>) = probs.into_iter().unzip();
        let total: f64 = weights.iter().sum();
        if total != 0.0 {
            weights.iter_mut().for_each(|w| *w /= total);
        }
        debug!("next states = {next_states:?}, probs = {weights:?}");

        let dist = WeightedIndex::new(&weights)
            .expect("Transition probabilities of an actionable state have positive mass");
        let next_state = next_states[dist.sample(&mut self.rng)];
        let (reward, done) = self.reward_and_done(next_state);

        Some(Step {
            state: next_state,
            reward,
            done,
        })
    }
}

impl<R: Rng> Environment for GridWorld<R> {
    type State = State;
    type Action = Action;

    fn is_active(&self) -> bool {
        self.can_act_at(self.agent_state)
    }

    fn step(&mut self, action: Self::Action) -> Option<Step<Self::State>> {
        let step = self.transit(self.agent_state, action)?;
        self.agent_state = step.state;

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report
            .entry("reward")
            .and_modify(|x| *x += step.reward);

        Some(step)
    }

    fn reset(&mut self) -> Self::State {
        self.agent_state = start_state(&self.grid);
        self.agent_state
    }
}

impl<R: Rng> DiscreteActionSpace for GridWorld<R> {
    fn actions(&self) -> Vec<Self::Action> {
        Action::VARIANTS.to_vec()
    }
}

impl<R: Rng> DiscreteStateSpace for GridWorld<R> {
    /// Every non-blocked coordinate, in row-major order
    fn states(&self) -> Vec<Self::State> {
        self.grid
            .cells()
            .filter(|&(_, cell)| cell != Cell::Blocked)
            .map(|(state, _)| state)
            .collect()
    }
}

/// Bottom-left corner
fn start_state(grid: &Grid) -> State {
    State::new(grid.row_count() - 1, 0)
}

#[cfg(test)]
mod tests {
    use crate::agent::{Agent, RandomAgent};

    use super::*;

    const EPS: f64 = 1e-9;

    fn scenario_grid() -> Grid {
        Grid::try_from([[0, 0, 0, 1], [0, 9, 0, -1], [0, 0, 0, 0]]).unwrap()
    }

    fn seeded(move_prob: f64, seed: u64) -> GridWorld {
        let config = GridWorldConfig {
            move_prob,
            ..Default::default()
        };
        GridWorld::with_rng(scenario_grid(), config, StdRng::seed_from_u64(seed)).unwrap()
    }

    fn actionable_states(env: &GridWorld) -> Vec<State> {
        env.states()
            .into_iter()
            .filter(|&s| env.can_act_at(s))
            .collect()
    }

    #[test]
    fn reset_places_agent_bottom_left() {
        let mut env = GridWorld::new(scenario_grid()).unwrap();
        assert_eq!(env.agent_state(), State::new(2, 0), "Initial state");
        assert_eq!(env.reset(), State::new(2, 0), "Reset state");
        assert_eq!(env.row_count(), 3);
        assert_eq!(env.column_count(), 4);
        assert_eq!(env.config(), &GridWorldConfig::default());
        assert!(env.is_active(), "Start is active");
    }

    #[test]
    fn transition_probs_scenario() {
        let env = seeded(0.8, 0);
        let probs = env.transition_probs(State::new(2, 0), Action::Up);

        assert_eq!(probs.len(), 3, "Clipped moves are merged: {probs:?}");
        assert!((probs[&State::new(1, 0)] - 0.8).abs() < EPS, "Intended");
        assert!((probs[&State::new(2, 1)] - 0.1).abs() < EPS, "Slip right");
        assert!(
            (probs[&State::new(2, 0)] - 0.1).abs() < EPS,
            "Slip left into the edge"
        );
    }

    #[test]
    fn transition_probs_into_reward() {
        let env = seeded(0.8, 0);
        let probs = env.transition_probs(State::new(0, 2), Action::Right);

        assert!((probs[&State::new(0, 3)] - 0.8).abs() < EPS, "Intended");
        assert!(
            (probs[&State::new(0, 2)] - 0.1).abs() < EPS,
            "Slip up into the edge"
        );
        assert!((probs[&State::new(1, 2)] - 0.1).abs() < EPS, "Slip down");
        assert_eq!(
            probs.get(&State::new(0, 1)).copied().unwrap_or(0.0),
            0.0,
            "No reversal"
        );
    }

    #[test]
    fn transition_probs_sum_to_one() {
        for move_prob in [1.0, 0.8, 0.5, 0.1] {
            let env = seeded(move_prob, 0);
            for state in actionable_states(&env) {
                for action in env.actions() {
                    let sum: f64 = env.transition_probs(state, action).values().sum();
                    assert!(
                        (sum - 1.0).abs() < EPS,
                        "Probabilities from {state} via {action:?} sum to {sum}"
                    );
                }
            }
        }
    }

    #[test]
    fn opposite_direction_is_never_taken() {
        let env = seeded(0.8, 0);
        for state in actionable_states(&env) {
            for action in env.actions() {
                let reversed = env.move_from(state, action.opposite()).unwrap();
                let shared = Action::iter()
                    .filter(|&a| a != action.opposite())
                    .any(|a| env.move_from(state, a).unwrap() == reversed);
                if shared {
                    continue;
                }

                let probs = env.transition_probs(state, action);
                assert_eq!(
                    probs.get(&reversed).copied().unwrap_or(0.0),
                    0.0,
                    "Reversal from {state} via {action:?}"
                );
            }
        }
    }

    #[test]
    fn transition_probs_empty_when_not_actionable() {
        let env = seeded(0.8, 0);
        for state in [
            State::new(0, 3),
            State::new(1, 3),
            State::new(1, 1),
            State::new(5, 5),
        ] {
            assert!(
                env.transition_probs(state, Action::Up).is_empty(),
                "No transitions from {state}"
            );
        }
    }

    #[test]
    fn states_exclude_blocked() {
        let env = seeded(0.8, 0);
        let states = env.states();
        assert_eq!(states.len(), 11, "One blocked cell removed");
        assert!(!states.contains(&State::new(1, 1)), "Blocked cell excluded");
        assert_eq!(states[0], State::new(0, 0), "Row-major order");
        assert_eq!(states[4], State::new(1, 0), "Row-major order");
        assert_eq!(states[10], State::new(2, 3), "Row-major order");
    }

    #[test]
    fn move_from_resolution() {
        let env = seeded(0.8, 0);
        let cases = [
            ((2, 0), Action::Left, (2, 0), "Left edge"),
            ((2, 0), Action::Down, (2, 0), "Bottom edge"),
            ((0, 0), Action::Up, (0, 0), "Top edge"),
            ((2, 3), Action::Right, (2, 3), "Right edge"),
            ((1, 0), Action::Right, (1, 0), "Blocked cell"),
            ((2, 1), Action::Up, (2, 1), "Blocked cell"),
            ((0, 0), Action::Right, (0, 1), "Free move"),
            ((2, 3), Action::Up, (1, 3), "Into penalty"),
        ];
        for ((r, c), action, (nr, nc), msg) in cases {
            assert_eq!(
                env.move_from(State::new(r, c), action),
                Ok(State::new(nr, nc)),
                "{msg}"
            );
        }
    }

    #[test]
    fn move_from_stays_on_free_cells() {
        let env = seeded(0.8, 0);
        for state in actionable_states(&env) {
            for action in env.actions() {
                let next = env.move_from(state, action).unwrap();
                let cell = env.grid().get(next);
                assert!(
                    next == state || matches!(cell, Some(c) if c != Cell::Blocked),
                    "{state} via {action:?} landed on {next} ({cell:?})"
                );
            }
        }
    }

    #[test]
    fn move_from_terminal_fails() {
        let env = seeded(0.8, 0);
        for state in [State::new(0, 3), State::new(1, 3), State::new(1, 1)] {
            assert_eq!(
                env.move_from(state, Action::Left),
                Err(Error::InvalidMove { state }),
                "Can't move from {state}"
            );
        }
    }

    #[test]
    fn reward_and_done_by_cell() {
        let config = GridWorldConfig {
            move_prob: 0.8,
            default_reward: -0.04,
        };
        let env = GridWorld::with_config(scenario_grid(), config).unwrap();
        assert_eq!(
            env.reward_and_done(State::new(0, 3)),
            (1.0, true),
            "Reward cell"
        );
        assert_eq!(
            env.reward_and_done(State::new(1, 3)),
            (-1.0, true),
            "Penalty cell"
        );
        assert_eq!(
            env.reward_and_done(State::new(0, 0)),
            (-0.04, false),
            "Normal cell"
        );
        assert_eq!(
            env.reward_and_done(State::new(1, 1)),
            (-0.04, false),
            "Blocked cell"
        );
    }

    #[test]
    fn deterministic_episode_reaches_reward() {
        let mut env = seeded(1.0, 0);
        env.reset();

        let path = [Action::Up, Action::Up, Action::Right, Action::Right];
        for action in path {
            let step = env.step(action).unwrap();
            assert!(!step.done, "Not done at {}", step.state);
            assert_eq!(step.reward, 0.4, "Default reward");
        }
        assert_eq!(env.agent_state(), State::new(0, 2), "Followed the path");

        let step = env.step(Action::Right).unwrap();
        assert_eq!(step.state, State::new(0, 3), "Reached reward cell");
        assert_eq!(step.reward, 1.0, "Reward collected");
        assert!(step.done, "Episode over");
        assert!(!env.is_active(), "Env is terminal");

        let report = env.report.take();
        assert_eq!(*report.get("steps").unwrap(), 5.0, "Report steps correct");
        assert!(
            (report.get("reward").unwrap() - 2.6).abs() < EPS,
            "Report reward correct"
        );
    }

    #[test]
    fn step_after_done_is_noop() {
        let mut env = seeded(1.0, 0);
        for action in [Action::Right, Action::Right, Action::Right, Action::Up] {
            env.step(action);
        }
        assert_eq!(env.agent_state(), State::new(1, 3), "Fell into the penalty");

        for action in env.actions() {
            assert_eq!(env.step(action), None, "No step after done");
            assert_eq!(env.agent_state(), State::new(1, 3), "Agent unmoved");
        }
        assert_eq!(env.report["steps"], 4.0, "No-op steps are not counted");

        assert_eq!(env.reset(), State::new(2, 0), "Reset after done");
        assert!(
            env.step(Action::Up).is_some(),
            "Stepping resumes after reset"
        );
    }

    #[test]
    fn transit_does_not_move_agent() {
        let mut env = seeded(0.8, 3);
        let step = env.transit(State::new(0, 2), Action::Right).unwrap();
        assert!(
            [State::new(0, 3), State::new(0, 2), State::new(1, 2)].contains(&step.state),
            "Sampled a reachable state"
        );
        assert_eq!(env.agent_state(), State::new(2, 0), "Agent unmoved");
        assert_eq!(
            env.transit(State::new(0, 3), Action::Left),
            None,
            "Terminal"
        );
    }

    #[test]
    fn seeded_envs_replay_identically() {
        let actions = [
            Action::Up,
            Action::Right,
            Action::Up,
            Action::Right,
            Action::Right,
        ];
        let run = |seed| {
            let mut env = seeded(0.6, seed);
            env.reset();
            actions.iter().map(|&a| env.step(a)).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42), "Same seed, same episode");
    }

    #[test]
    fn sampling_follows_probabilities() {
        let mut env = seeded(0.8, 7);
        let n = 10_000;
        let mut hits = TransitionProbs::new();
        for _ in 0..n {
            let step = env.transit(State::new(2, 0), Action::Up).unwrap();
            *hits.entry(step.state).or_insert(0.0) += 1.0 / n as f64;
        }

        let expected = env.transition_probs(State::new(2, 0), Action::Up);
        for (state, p) in expected {
            let freq = hits.get(&state).copied().unwrap_or(0.0);
            assert!(
                (freq - p).abs() < 0.03,
                "{state}: frequency {freq} vs prob {p}"
            );
        }
    }

    #[test]
    fn invalid_config_rejected() {
        for move_prob in [0.0, -0.1, 1.5, f64::NAN] {
            let config = GridWorldConfig {
                move_prob,
                ..Default::default()
            };
            let result = GridWorld::with_config(scenario_grid(), config);
            assert!(
                matches!(result, Err(Error::InvalidMoveProb { .. })),
                "move_prob {move_prob} rejected"
            );
        }

        let grid = Grid::try_from([[0, 1], [9, 0]]).unwrap();
        assert!(
            matches!(
                GridWorld::new(grid),
                Err(Error::BlockedStart { state }) if state == State::new(1, 0)
            ),
            "Blocked start rejected"
        );
    }

    #[test]
    fn degenerate_grids() {
        let grid = Grid::try_from([[0, 9, 0], [9, 0, 9], [0, 9, 0]]).unwrap();
        let rng = StdRng::seed_from_u64(0);
        let mut env = GridWorld::with_rng(grid, Default::default(), rng).unwrap();
        for action in env.actions() {
            let probs = env.transition_probs(State::new(2, 0), action);
            assert_eq!(probs.len(), 1, "Boxed-in cell only reaches itself");
            assert!((probs[&State::new(2, 0)] - 1.0).abs() < EPS, "Merged to 1");
        }
        let step = env.step(Action::Up).unwrap();
        assert_eq!(step.state, State::new(2, 0), "Boxed-in agent stays put");
        assert!(!step.done, "Boxed-in cell is not terminal");

        let mut env = GridWorld::new(Grid::try_from([[0]]).unwrap()).unwrap();
        assert_eq!(env.reset(), State::new(0, 0), "Single cell start");
        let step = env.step(Action::Right).unwrap();
        assert_eq!(step.state, State::new(0, 0), "Single cell stays put");

        let mut env = GridWorld::new(Grid::try_from([[1]]).unwrap()).unwrap();
        assert!(!env.is_active(), "Terminal start");
        let episode = RandomAgent::with_rng(StdRng::seed_from_u64(0)).go(&mut env);
        assert_eq!(episode.steps, 0, "No steps from a terminal start");
        assert_eq!(episode.last_action, None);
        assert_eq!(episode.final_state, State::new(0, 0));
    }
}
