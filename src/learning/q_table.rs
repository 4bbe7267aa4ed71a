use serde::{Deserialize, Serialize};

use crate::error::{LemonsError, Result};
use crate::learning::agent_state::{DiscretizedState, StateShape};

/// Dense action-value table over `StateShape x action`.
///
/// Every entry starts at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    shape: StateShape,
    action_size: usize,
    tab: Vec<f64>,
}

impl QTable {
    pub fn new(shape: StateShape, action_size: usize) -> Self {
        QTable {
            shape,
            action_size,
            tab: vec![0.0; shape.len() * action_size],
        }
    }

    pub fn shape(&self) -> StateShape {
        self.shape
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    fn row_start(&self, state: &DiscretizedState) -> Result<usize> {
        self.shape
            .flat_index(state)
            .map(|idx| idx * self.action_size)
            .ok_or(LemonsError::StateOutOfBounds {
                state: *state,
                shape: self.shape,
            })
    }

    fn check_action(&self, action: usize) -> Result<()> {
        if action >= self.action_size {
            return Err(LemonsError::ActionOutOfBounds {
                action,
                action_size: self.action_size,
            });
        }
        Ok(())
    }

    /// Action values at `state`, indexed by action.
    pub fn row(&self, state: &DiscretizedState) -> Result<&[f64]> {
        let start = self.row_start(state)?;
        Ok(&self.tab[start..start + self.action_size])
    }

    pub fn get(&self, state: &DiscretizedState, action: usize) -> Result<f64> {
        self.check_action(action)?;
        Ok(self.row(state)?[action])
    }

    pub fn get_mut(&mut self, state: &DiscretizedState, action: usize) -> Result<&mut f64> {
        self.check_action(action)?;
        let start = self.row_start(state)?;
        Ok(&mut self.tab[start + action])
    }

    /// Highest action value at `state`.
    pub fn max_value(&self, state: &DiscretizedState) -> Result<f64> {
        Ok(self.row(state)?.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    /// Action with the highest value at `state`; ties go to the lowest index.
    pub fn argmax(&self, state: &DiscretizedState) -> Result<usize> {
        let row = self.row(state)?;
        let mut best = 0;
        for (a, q) in row.iter().enumerate().skip(1) {
            if *q > row[best] {
                best = a;
            }
        }
        Ok(best)
    }
}
