//! One seller, one buyer, hidden quality.
//!
//! The environment is configuration plus a draw source. Each call to
//! [`NegotiationEnvironment::reset`] produces a fresh [`EpisodeState`] value
//! and [`NegotiationEnvironment::step`] maps an episode and a buyer move to
//! the next episode value. Nothing about an episode lives inside the
//! environment.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::actions::BuyerMove;
use crate::config::{Config, MarketConfig, PriceBins};
use crate::draws::DrawSource;
use crate::error::{LemonsError, Result};
use crate::goods::Quality;
use crate::learning::agent_state::{DiscrRep, DiscretizedState, StateShape};
use crate::learning::reward::Outcome;
use crate::{Price, UInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Phase {
    /// Just reset, round 0.
    Fresh,
    /// At least one round played, no decision yet.
    Negotiating,
    /// Episode over; only a reset leaves this phase.
    Terminal,
}

/// Hidden and public facts of one negotiation episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeState {
    pub quality: Quality,
    pub cost: Price,
    pub markup: Price,
    pub signaling: bool,
    /// Signal cost for this quality. Charged only when `signaling`.
    pub signal_cost: Price,
    /// Posted price: cost + markup, plus the signal cost when signaling.
    pub price: Price,
    pub round: UInt,
    pub done: bool,
}

impl EpisodeState {
    /// Signal cost actually paid by the seller this episode.
    ///
    /// It is included in the posted price and deducted again from the profit
    /// at settlement.
    pub fn signal_charge(&self) -> Price {
        if self.signaling { self.signal_cost } else { 0.0 }
    }

    pub fn phase(&self) -> Phase {
        match (self.done, self.round) {
            (true, _) => Phase::Terminal,
            (false, 0) => Phase::Fresh,
            (false, _) => Phase::Negotiating,
        }
    }
}

impl DiscrRep for EpisodeState {
    fn representation(&self, bins: &PriceBins) -> DiscretizedState {
        DiscretizedState::new(bins.bin_of(self.price), self.round, self.signaling)
    }
}

/// Result of one `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub episode: EpisodeState,
    pub state: DiscretizedState,
    pub reward: f64,
    pub done: bool,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct NegotiationEnvironment<D = StdRng> {
    market: MarketConfig,
    bins: PriceBins,
    draws: D,
}

impl NegotiationEnvironment<StdRng> {
    pub fn seeded(market: MarketConfig, bins: PriceBins, seed: u64) -> Result<Self> {
        NegotiationEnvironment::new(market, bins, StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng(market: MarketConfig, bins: PriceBins) -> Result<Self> {
        NegotiationEnvironment::new(market, bins, StdRng::from_os_rng())
    }
}

impl<D: DrawSource> NegotiationEnvironment<D> {
    pub fn new(market: MarketConfig, bins: PriceBins, draws: D) -> Result<Self> {
        market.validate()?;
        bins.validate()?;
        Ok(NegotiationEnvironment {
            market,
            bins,
            draws,
        })
    }

    pub fn from_config(config: &Config, draws: D) -> Result<Self> {
        NegotiationEnvironment::new(config.market.clone(), config.bins.clone(), draws)
    }

    pub fn market(&self) -> &MarketConfig {
        &self.market
    }

    pub fn bins(&self) -> &PriceBins {
        &self.bins
    }

    /// Dimensions of every state `observe` can return.
    pub fn state_shape(&self) -> StateShape {
        StateShape::for_market(&self.bins, &self.market)
    }

    /// Start a new episode: draw quality, markup and the signaling decision,
    /// then post the price.
    pub fn reset(&mut self) -> EpisodeState {
        let quality = self.draws.draw_quality();
        let cost = quality.cost(&self.market);
        let markup = self
            .draws
            .draw_markup(self.market.min_markup, self.market.max_markup);
        let signaling = self
            .draws
            .draw_signal(quality.signal_propensity(&self.market));
        let signal_cost = quality.signal_cost(&self.market);

        let mut price = cost + markup;
        if signaling {
            price += signal_cost;
        }

        let episode = EpisodeState {
            quality,
            cost,
            markup,
            signaling,
            signal_cost,
            price,
            round: 0,
            done: false,
        };
        debug!(
            "reset: quality={} cost={:.2} markup={:.2} signaling={} price={:.2}",
            quality, cost, markup, signaling, price
        );
        episode
    }

    pub fn observe(&self, episode: &EpisodeState) -> DiscretizedState {
        episode.representation(&self.bins)
    }

    /// Play one round with an optional counteroffer; `None` means the buyer
    /// walks away.
    pub fn step(&self, episode: &EpisodeState, offer: Option<Price>) -> Result<Transition> {
        self.step_move(episode, BuyerMove::from(offer))
    }

    /// Play one round.
    ///
    /// An offer at or above cost is accepted and pays the seller
    /// `offer - cost - signal_charge`, which may be negative. An offer below
    /// cost is rejected. Walking away ends the episode with no reward. Only
    /// when none of these ended the episode does the round limit apply.
    pub fn step_move(&self, episode: &EpisodeState, buyer: BuyerMove) -> Result<Transition> {
        if episode.done {
            return Err(LemonsError::EpisodeFinished {
                round: episode.round,
            });
        }
        let mut next = *episode;
        next.round += 1;

        let mut outcome = match buyer {
            BuyerMove::WalkAway => Outcome::WalkedAway,
            BuyerMove::Offer(offer) if offer >= next.cost => Outcome::Sold {
                profit: offer - next.cost - next.signal_charge(),
            },
            BuyerMove::Offer(_) => Outcome::Rejected,
            BuyerMove::Hold => Outcome::Pending,
        };
        if !outcome.is_terminal() && next.round >= self.market.max_rounds {
            outcome = Outcome::Unsold;
        }
        next.done = outcome.is_terminal();

        let transition = Transition {
            episode: next,
            state: self.observe(&next),
            reward: outcome.reward(),
            done: next.done,
            outcome,
        };
        debug!(
            "step: round={} move={:?} outcome={} reward={:.2}",
            next.round, buyer, outcome, transition.reward
        );
        Ok(transition)
    }
}

/// Stateful wrapper holding the current episode, for drivers that want a
/// plain reset/step loop.
#[derive(Debug, Clone)]
pub struct Negotiation<D = StdRng> {
    env: NegotiationEnvironment<D>,
    episode: Option<EpisodeState>,
}

impl<D: DrawSource> Negotiation<D> {
    pub fn new(env: NegotiationEnvironment<D>) -> Self {
        Negotiation { env, episode: None }
    }

    pub fn environment(&self) -> &NegotiationEnvironment<D> {
        &self.env
    }

    /// Current episode, if `reset` has been called.
    pub fn episode(&self) -> Option<&EpisodeState> {
        self.episode.as_ref()
    }

    pub fn reset(&mut self) -> DiscretizedState {
        let episode = self.env.reset();
        self.episode = Some(episode);
        self.env.observe(&episode)
    }

    pub fn step(&mut self, offer: Option<Price>) -> Result<(DiscretizedState, f64, bool)> {
        let transition = self.step_move(BuyerMove::from(offer))?;
        Ok((transition.state, transition.reward, transition.done))
    }

    pub fn step_move(&mut self, buyer: BuyerMove) -> Result<Transition> {
        let episode = self.episode.as_ref().ok_or(LemonsError::NotReset)?;
        let transition = self.env.step_move(episode, buyer)?;
        self.episode = Some(transition.episode);
        Ok(transition)
    }
}
