use std::{
    collections::{hash_map::Entry, HashMap},
    ops::Index,
};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Determine if the current state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** the resulting [`Step`], or `None` if the environment was already terminal
    fn step(&mut self, action: Self::Action) -> Option<Step<Self::State>>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// An environment with a finite set of actions
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions
    ///
    /// The returned vec should never be empty.
    fn actions(&self) -> Vec<Self::Action>;
}

/// An environment with a finite, enumerable set of states
pub trait DiscreteStateSpace: Environment {
    /// Get every state the environment can be in
    fn states(&self) -> Vec<Self::State>;
}

/// The outcome of a single environment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<S> {
    /// The state the environment moved into
    pub state: S,
    /// The reward received for entering `state`
    pub reward: f64,
    /// Whether `state` is terminal
    pub done: bool,
}

/// Named running counters an environment keeps about its episodes
#[derive(Debug, Clone, Default)]
pub struct Report {
    values: HashMap<&'static str, f64>,
}

impl Report {
    /// Initialize a report with every key set to zero
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self {
            values: keys.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    /// Get the counter for `key`, for in-place update
    pub fn entry(&mut self, key: &'static str) -> Entry<'_, &'static str, f64> {
        self.values.entry(key)
    }

    /// Take the current values, leaving every key at zero
    pub fn take(&mut self) -> HashMap<&'static str, f64> {
        let zeroed = self.values.keys().map(|&k| (k, 0.0)).collect();
        std::mem::replace(&mut self.values, zeroed)
    }
}

impl Index<&str> for Report {
    type Output = f64;

    fn index(&self, key: &str) -> &Self::Output {
        &self.values[key]
    }
}
