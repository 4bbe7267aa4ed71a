use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Price;
use crate::error::{LemonsError, Result};

/// What the buyer does in one negotiation round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BuyerMove {
    /// Counteroffer at the given price.
    Offer(Price),
    /// Leave without making an offer.
    WalkAway,
    /// Neither offer nor leave; the round passes.
    Hold,
}

impl From<Option<Price>> for BuyerMove {
    fn from(offer: Option<Price>) -> Self {
        match offer {
            Some(price) => BuyerMove::Offer(price),
            None => BuyerMove::WalkAway,
        }
    }
}

/// Turns an agent's action index into a counteroffer, as a fraction of the
/// posted price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferSchedule {
    pub multipliers: Vec<f64>,
}

impl Default for OfferSchedule {
    fn default() -> Self {
        OfferSchedule {
            multipliers: vec![0.7, 0.85, 1.0],
        }
    }
}

impl OfferSchedule {
    pub fn action_size(&self) -> usize {
        self.multipliers.len()
    }

    pub fn offer(&self, action: usize, posted_price: Price) -> Result<BuyerMove> {
        let multiplier = self
            .multipliers
            .get(action)
            .ok_or(LemonsError::ActionOutOfBounds {
                action,
                action_size: self.action_size(),
            })?;
        Ok(BuyerMove::Offer(posted_price * multiplier))
    }

    /// Action whose offer lies closest to `offer`. Ties go to the lowest index.
    pub fn nearest_action(&self, posted_price: Price, offer: Price) -> usize {
        self.multipliers
            .iter()
            .map(|m| (posted_price * m - offer).abs())
            .position_min_by(|a, b| a.total_cmp(b))
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.multipliers.is_empty() {
            return Err(LemonsError::InvalidConfig(
                "offers.multipliers must not be empty".into(),
            ));
        }
        if self.multipliers.iter().any(|m| !m.is_finite()) {
            return Err(LemonsError::InvalidConfig(
                "offers.multipliers must be finite".into(),
            ));
        }
        Ok(())
    }
}
