use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::error::{LemonsError, Result};
use crate::learning::agent_state::{DiscretizedState, StateShape};
use crate::learning::q_table::QTable;

/// Tabular one-step Q-learning agent with epsilon-greedy exploration.
///
/// The agent never talks to the environment. A driver hands it discretized
/// states and feeds back `(state, action, reward, next_state, done)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QLearningAgent {
    q_table: QTable,
    params: AgentConfig,
    epsilon: f64,
    episodes_seen: u64,
}

impl QLearningAgent {
    pub fn new(shape: StateShape, action_size: usize, params: AgentConfig) -> Result<Self> {
        if action_size == 0 {
            return Err(LemonsError::InvalidConfig(
                "the agent needs at least one action".into(),
            ));
        }
        if shape.is_empty() {
            return Err(LemonsError::InvalidConfig(
                "the agent needs a non-empty state shape".into(),
            ));
        }
        params.validate()?;
        Ok(QLearningAgent {
            q_table: QTable::new(shape, action_size),
            epsilon: params.epsilon,
            params,
            episodes_seen: 0,
        })
    }

    pub fn shape(&self) -> StateShape {
        self.q_table.shape()
    }

    pub fn action_size(&self) -> usize {
        self.q_table.action_size()
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of terminal transitions seen so far.
    pub fn episodes_seen(&self) -> u64 {
        self.episodes_seen
    }

    pub fn params(&self) -> &AgentConfig {
        &self.params
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn q_values(&self, state: &DiscretizedState) -> Result<&[f64]> {
        self.q_table.row(state)
    }

    /// Epsilon-greedy choice: a uniform random action with probability
    /// epsilon, otherwise the greedy action.
    pub fn choose_action<R: Rng + ?Sized>(
        &self,
        state: &DiscretizedState,
        rng: &mut R,
    ) -> Result<usize> {
        // Validate the state even when exploring.
        let greedy = self.greedy_action(state)?;
        if rng.random::<f64>() < self.epsilon {
            return Ok(rng.random_range(0..self.action_size()));
        }
        Ok(greedy)
    }

    /// Highest-valued action at `state`, ties to the lowest index.
    pub fn greedy_action(&self, state: &DiscretizedState) -> Result<usize> {
        self.q_table.argmax(state)
    }

    /// One TD(0) update of `Q[state][action]`. Returns the TD error.
    ///
    /// Terminal transitions do not bootstrap from `next_state` and decay
    /// epsilon towards its floor.
    pub fn update_q_table(
        &mut self,
        state: &DiscretizedState,
        action: usize,
        reward: f64,
        next_state: &DiscretizedState,
        done: bool,
    ) -> Result<f64> {
        let best_next = self.q_table.max_value(next_state)?;
        let continuation = if done { 0.0 } else { 1.0 };
        let td_target = reward + self.params.gamma * best_next * continuation;

        let learning_rate = self.params.learning_rate;
        let q = self.q_table.get_mut(state, action)?;
        let td_error = td_target - *q;
        *q += learning_rate * td_error;

        if done {
            self.epsilon = (self.epsilon * self.params.epsilon_decay).max(self.params.epsilon_min);
            self.episodes_seen += 1;
        }
        debug!(
            "update {:?} a={} r={:.2} target={:.3} err={:.3} eps={:.3}",
            state, action, reward, td_target, td_error, self.epsilon
        );
        Ok(td_error)
    }

    /// Force the exploration rate, clamped to `[0, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn agent(epsilon: f64) -> QLearningAgent {
        QLearningAgent::new(
            StateShape::new(8, 4),
            3,
            AgentConfig {
                epsilon,
                ..AgentConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(QLearningAgent::new(StateShape::new(8, 4), 0, AgentConfig::default()).is_err());
        assert!(QLearningAgent::new(StateShape::new(0, 4), 3, AgentConfig::default()).is_err());
        let params = AgentConfig {
            gamma: -0.5,
            ..AgentConfig::default()
        };
        assert!(QLearningAgent::new(StateShape::new(8, 4), 3, params).is_err());
    }

    #[test]
    fn test_greedy_when_epsilon_zero() {
        let mut agent = agent(0.0);
        let s = DiscretizedState::new(2, 0, true);
        let next = DiscretizedState::new(2, 1, true);
        agent.update_q_table(&s, 1, 5.0, &next, false).unwrap();
        agent.update_q_table(&s, 2, 1.0, &next, false).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            assert_eq!(agent.choose_action(&s, &mut rng).unwrap(), 1);
        }
        // Untouched state: all zeros, lowest index wins.
        let fresh = DiscretizedState::new(5, 2, false);
        assert_eq!(agent.choose_action(&fresh, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_uniform_when_epsilon_one() {
        let mut agent = agent(1.0);
        let s = DiscretizedState::new(0, 0, false);
        let next = DiscretizedState::new(0, 1, false);
        agent.update_q_table(&s, 2, 100.0, &next, false).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let n = 30_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[agent.choose_action(&s, &mut rng).unwrap()] += 1;
        }
        for c in counts {
            let share = c as f64 / n as f64;
            assert!((share - 1.0 / 3.0).abs() < 0.02, "counts: {counts:?}");
        }
    }

    #[test]
    fn test_single_update_moves_by_lr_times_error() {
        let mut agent = agent(1.0);
        let s = DiscretizedState::new(3, 0, false);
        let next = DiscretizedState::new(4, 1, true);
        agent.update_q_table(&next, 0, 20.0, &s, true).unwrap();
        let best_next = agent.q_values(&next).unwrap()[0];
        assert_eq!(best_next, 0.1 * 20.0);

        let td_error = agent.update_q_table(&s, 1, 10.0, &next, false).unwrap();
        let td_target = 10.0 + 0.95 * best_next;
        assert_eq!(td_error, td_target);
        assert_eq!(agent.q_values(&s).unwrap()[1], 0.1 * td_target);
    }

    #[test]
    fn test_done_does_not_bootstrap() {
        let mut agent = agent(1.0);
        let s = DiscretizedState::new(1, 0, false);
        let next = DiscretizedState::new(1, 1, false);
        agent.update_q_table(&next, 2, 50.0, &s, false).unwrap();
        agent.update_q_table(&s, 0, 4.0, &next, true).unwrap();
        assert_eq!(agent.q_values(&s).unwrap()[0], 0.1 * 4.0);
    }

    #[test]
    fn test_repeated_updates_converge_to_target() {
        let mut agent = agent(0.5);
        let s = DiscretizedState::new(6, 1, true);
        let next = DiscretizedState::new(0, 2, false);
        let mut previous_gap = f64::INFINITY;
        for _ in 0..500 {
            agent.update_q_table(&s, 2, 7.5, &next, false).unwrap();
            let gap = (7.5 - agent.q_values(&s).unwrap()[2]).abs();
            assert!(gap <= previous_gap);
            previous_gap = gap;
        }
        assert!(previous_gap < 1e-9);
    }

    #[test]
    fn test_epsilon_decays_on_done_to_floor() {
        let mut agent = agent(1.0);
        let s = DiscretizedState::new(0, 0, false);
        let next = DiscretizedState::new(0, 1, false);

        agent.update_q_table(&s, 0, 0.0, &next, false).unwrap();
        assert_eq!(agent.epsilon(), 1.0);

        agent.update_q_table(&s, 0, 0.0, &next, true).unwrap();
        assert_eq!(agent.epsilon(), 0.995);
        assert_eq!(agent.episodes_seen(), 1);

        for _ in 0..2000 {
            agent.update_q_table(&s, 0, 0.0, &next, true).unwrap();
        }
        assert_eq!(agent.epsilon(), 0.1);
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let mut agent = agent(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let outside = DiscretizedState::new(8, 0, false);
        let inside = DiscretizedState::new(0, 0, false);
        assert!(matches!(
            agent.choose_action(&outside, &mut rng),
            Err(LemonsError::StateOutOfBounds { .. })
        ));
        assert!(agent.update_q_table(&inside, 0, 1.0, &outside, false).is_err());
        assert!(matches!(
            agent.update_q_table(&inside, 3, 1.0, &inside, false),
            Err(LemonsError::ActionOutOfBounds { .. })
        ));
        // Failed updates leave the table untouched.
        assert_eq!(agent.q_values(&inside).unwrap(), &[0.0; 3]);
    }
}
