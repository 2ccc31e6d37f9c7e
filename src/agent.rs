use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::env::{DiscreteActionSpace, Environment};

/// Summary of one episode run by [`Agent::go`]
#[derive(Debug, Clone, PartialEq)]
pub struct Episode<S, A> {
    /// Number of steps the environment accepted
    pub steps: u32,
    /// Sum of the rewards received
    pub total_reward: f64,
    /// The state the episode ended in
    pub final_state: S,
    /// The last action taken, or `None` if the episode started in a terminal state
    pub last_action: Option<A>,
}

pub trait Agent<E>
where
    E: Environment + DiscreteActionSpace,
    E::Action: Clone,
{
    /// Choose an action among `actions` for the given state
    fn act(&mut self, state: &E::State, actions: &[E::Action]) -> E::Action;

    /// Run the agent in the given environment for one episode
    fn go(&mut self, env: &mut E) -> Episode<E::State, E::Action> {
        let mut state = env.reset();
        let mut steps = 0;
        let mut total_reward = 0.0;
        let mut last_action = None;

        loop {
            let action = self.act(&state, &env.actions());
            let Some(step) = env.step(action.clone()) else {
                break;
            };

            steps += 1;
            total_reward += step.reward;
            state = step.state;
            last_action = Some(action);

            if step.done {
                break;
            }
        }

        debug!("episode finished after {steps} steps with reward {total_reward}");

        Episode {
            steps,
            total_reward,
            final_state: state,
            last_action,
        }
    }
}

/// An agent following the uniform random policy
pub struct RandomAgent<R: Rng = StdRng> {
    rng: R,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomAgent<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<E, R> Agent<E> for RandomAgent<R>
where
    E: Environment + DiscreteActionSpace,
    E::Action: Clone,
    R: Rng,
{
    fn act(&mut self, _state: &E::State, actions: &[E::Action]) -> E::Action {
        actions
            .choose(&mut self.rng)
            .cloned()
            .expect("There is always at least one action available")
    }
}
