use rand::Rng;

use crate::error::Result;
use crate::learning::agent_state::DiscretizedState;
use crate::learning::learning_agent::QLearningAgent;

pub trait Policy {
    fn choose_action<R: Rng + ?Sized>(&self, state: &DiscretizedState, rng: &mut R)
    -> Result<usize>;
}

/// Epsilon-greedy with the agent's current epsilon.
impl Policy for QLearningAgent {
    fn choose_action<R: Rng + ?Sized>(
        &self,
        state: &DiscretizedState,
        rng: &mut R,
    ) -> Result<usize> {
        QLearningAgent::choose_action(self, state, rng)
    }
}

/// Pure exploitation of a learned table.
pub struct Greedy<'a>(pub &'a QLearningAgent);

impl Policy for Greedy<'_> {
    fn choose_action<R: Rng + ?Sized>(
        &self,
        state: &DiscretizedState,
        _rng: &mut R,
    ) -> Result<usize> {
        self.0.greedy_action(state)
    }
}

/// Always the same action. Useful as a baseline.
pub struct Constant(pub usize);

impl Policy for Constant {
    fn choose_action<R: Rng + ?Sized>(
        &self,
        _state: &DiscretizedState,
        _rng: &mut R,
    ) -> Result<usize> {
        Ok(self.0)
    }
}
