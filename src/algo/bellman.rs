use std::{fmt, str::FromStr};

use strum::{EnumIter, IntoEnumIterator};

use crate::{
    assert_interval,
    error::{Error, Result},
};

/// A move in the [`HistoryGame`]
#[derive(EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
}

impl Move {
    pub const fn opposite(self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
        }
    }
}

/// A state of the [`HistoryGame`]: the moves made so far, or the verdict once the game ended
///
/// Labels are `state`, `state_up_down`, ..., `happy_end` and `bad_end`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum History {
    Playing(Vec<Move>),
    HappyEnd,
    BadEnd,
}

impl History {
    /// A game with no moves made
    pub fn start() -> Self {
        History::Playing(Vec::new())
    }

    pub fn is_end(&self) -> bool {
        matches!(self, History::HappyEnd | History::BadEnd)
    }

    fn then(moves: &[Move], m: Move) -> Self {
        let mut moves = moves.to_vec();
        moves.push(m);
        History::Playing(moves)
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            History::HappyEnd => write!(f, "happy_end"),
            History::BadEnd => write!(f, "bad_end"),
            History::Playing(moves) => {
                write!(f, "state")?;
                moves.iter().try_for_each(|m| write!(f, "_{}", m.label()))
            }
        }
    }
}

impl FromStr for History {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidHistory {
            input: s.to_string(),
        };

        match s {
            "happy_end" => return Ok(History::HappyEnd),
            "bad_end" => return Ok(History::BadEnd),
            _ => {}
        }

        let mut parts = s.split('_');
        if parts.next() != Some("state") {
            return Err(invalid());
        }
        parts
            .map(|part| Move::iter().find(|m| m.label() == part).ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()
            .map(History::Playing)
    }
}

/// Configuration for the [`HistoryGame`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryGameConfig {
    /// Number of moves after which the game ends
    pub horizon: usize,
    /// Minimum number of `Up` moves for a happy end
    pub happy_end_border: usize,
    /// Probability that the chosen move is the one made
    pub move_prob: f64,
    /// Discount factor
    pub gamma: f64,
}

impl Default for HistoryGameConfig {
    fn default() -> Self {
        Self {
            horizon: 5,
            happy_end_border: 4,
            move_prob: 0.9,
            gamma: 0.99,
        }
    }
}

/// A fixed-horizon game over move histories, solved by plain recursion on the Bellman equation
///
/// Each turn the player picks a move, which is made with probability `move_prob` and reversed
/// otherwise. After `horizon` moves the game ends happily if at least `happy_end_border` of them
/// were `Up`. Only the end states carry a reward.
pub struct HistoryGame {
    config: HistoryGameConfig,
}

impl HistoryGame {
    /// **Panics** if `move_prob` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: HistoryGameConfig) -> Self {
        assert_interval!(config.move_prob, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self { config }
    }

    pub fn reward(&self, state: &History) -> f64 {
        match state {
            History::HappyEnd => 1.0,
            History::BadEnd => -1.0,
            History::Playing(_) => 0.0,
        }
    }

    /// Resulting states of playing `action` in `state` with their probabilities, empty once ended
    pub fn transitions(&self, state: &History, action: Move) -> Vec<(History, f64)> {
        let History::Playing(moves) = state else {
            return Vec::new();
        };

        if moves.len() >= self.config.horizon {
            let ups = moves.iter().filter(|&&m| m == Move::Up).count();
            let end = if ups >= self.config.happy_end_border {
                History::HappyEnd
            } else {
                History::BadEnd
            };
            return vec![(end, 1.0)];
        }

        let move_prob = self.config.move_prob;
        vec![
            (History::then(moves, action), move_prob),
            (History::then(moves, action.opposite()), 1.0 - move_prob),
        ]
    }

    /// V(s) = R(s) + γ · max<sub>a</sub> Σ<sub>s'</sub> P(s'|s,a) · V(s')
    pub fn value(&self, state: &History) -> f64 {
        self.reward(state) + self.config.gamma * self.max_next_value(state)
    }

    fn max_next_value(&self, state: &History) -> f64 {
        if state.is_end() {
            return 0.0;
        }

        Move::iter()
            .map(|a| {
                self.transitions(state, a)
                    .iter()
                    .map(|(next, prob)| prob * self.value(next))
                    .sum::<f64>()
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl Default for HistoryGame {
    fn default() -> Self {
        Self::new(HistoryGameConfig::default())
    }
}
