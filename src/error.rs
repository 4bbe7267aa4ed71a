use thiserror::Error;

use crate::UInt;
use crate::learning::agent_state::{DiscretizedState, StateShape};

#[derive(Error, Debug)]
pub enum LemonsError {
    #[error("No episode in progress: call reset() before step()")]
    NotReset,

    #[error("Episode already finished after round {round}")]
    EpisodeFinished { round: UInt },

    #[error("State {state:?} is outside the table shape {shape:?}")]
    StateOutOfBounds {
        state: DiscretizedState,
        shape: StateShape,
    },

    #[error("Action {action} is outside [0, {action_size})")]
    ActionOutOfBounds { action: usize, action_size: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LemonsError>;
