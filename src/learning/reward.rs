use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::Price;

/// Reward when the seller rejects an offer below cost.
pub const REJECTION_PENALTY: f64 = -1.0;
/// Reward when the round limit passes with the good unsold.
pub const UNSOLD_PENALTY: f64 = -10.0;

/// How a negotiation step ended.
#[derive(Debug, Clone, Copy, PartialEq, Display, Serialize, Deserialize)]
pub enum Outcome {
    /// Offer at or above cost. Carries the seller's realised profit.
    Sold { profit: Price },
    Rejected,
    /// Buyer left without making an offer.
    WalkedAway,
    /// Round limit reached without a deal.
    Unsold,
    /// Nothing decided yet this round.
    Pending,
}

impl Outcome {
    pub fn reward(&self) -> f64 {
        match self {
            Outcome::Sold { profit } => *profit,
            Outcome::Rejected => REJECTION_PENALTY,
            Outcome::WalkedAway => 0.0,
            Outcome::Unsold => UNSOLD_PENALTY,
            Outcome::Pending => 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    pub fn is_deal(&self) -> bool {
        matches!(self, Outcome::Sold { .. })
    }
}
