pub mod actions;
pub mod config;
pub mod draws;
pub mod environment;
pub mod error;
pub mod goods;
pub mod learning;
pub mod market;
pub mod simulation;

pub type UInt = u32;
pub type Price = f64;

pub use config::Config;
pub use environment::{EpisodeState, Negotiation, NegotiationEnvironment, Transition};
pub use error::{LemonsError, Result};
pub use learning::agent_state::DiscretizedState;
pub use learning::learning_agent::QLearningAgent;
