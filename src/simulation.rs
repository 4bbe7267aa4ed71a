//! Training driver. The only place where the agent and the environment meet.

use itertools::Itertools;
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::actions::OfferSchedule;
use crate::config::Config;
use crate::draws::DrawSource;
use crate::environment::{EpisodeState, NegotiationEnvironment, Transition};
use crate::error::Result;
use crate::learning::agent_state::DiscretizedState;
use crate::learning::learning_agent::QLearningAgent;
use crate::learning::policy::{Greedy, Policy};
use crate::learning::reward::Outcome;
use crate::market::{BuyerPool, Resale};
use crate::{Price, UInt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Final episode state.
    pub episode: EpisodeState,
    pub outcome: Outcome,
    pub total_reward: f64,
    pub actions: Vec<usize>,
    /// Sale to another buyer after the negotiation produced no deal.
    pub resale: Option<Resale>,
}

/// Running counts over a batch of episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub episodes: UInt,
    pub deals: UInt,
    pub rejections: UInt,
    pub walk_aways: UInt,
    pub unsold: UInt,
    pub resales: UInt,
    pub total_reward: f64,
}

impl Tally {
    pub fn record(&mut self, summary: &EpisodeSummary) {
        self.episodes += 1;
        self.total_reward += summary.total_reward;
        match summary.outcome {
            Outcome::Sold { .. } => self.deals += 1,
            Outcome::Rejected => self.rejections += 1,
            Outcome::WalkedAway => self.walk_aways += 1,
            Outcome::Unsold => self.unsold += 1,
            Outcome::Pending => {}
        }
        if summary.resale.is_some() {
            self.resales += 1;
        }
    }

    pub fn mean_reward(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.total_reward / self.episodes as f64
    }

    pub fn deal_rate(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.deals as f64 / self.episodes as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub state: DiscretizedState,
    pub action: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub tally: Tally,
    pub mean_reward: f64,
    pub final_epsilon: f64,
    /// Greedy action for every opening state (round 0).
    pub greedy_policy: Vec<PolicyEntry>,
}

pub struct Simulation<D = StdRng> {
    pub env: NegotiationEnvironment<D>,
    pub agent: QLearningAgent,
    pub schedule: OfferSchedule,
    pub buyers: BuyerPool,
    /// Episodes trained so far.
    pub time: UInt,
    pub reward_history: Vec<f64>,
    log_every: UInt,
    rng: StdRng,
}

impl Simulation<StdRng> {
    /// Build from a validated config. A configured seed makes the whole run
    /// reproducible.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let market = config.market.clone();
        let bins = config.bins.clone();
        let (env, rng) = match config.training.seed {
            Some(seed) => (
                NegotiationEnvironment::seeded(market, bins, seed)?,
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (
                NegotiationEnvironment::from_os_rng(market, bins)?,
                StdRng::from_os_rng(),
            ),
        };
        Simulation::from_parts(config, env, rng)
    }
}

impl<D: DrawSource> Simulation<D> {
    pub fn from_parts(config: &Config, env: NegotiationEnvironment<D>, rng: StdRng) -> Result<Self> {
        config.offers.validate()?;
        config.buyers.validate()?;
        let agent = QLearningAgent::new(
            env.state_shape(),
            config.offers.action_size(),
            config.agent.clone(),
        )?;
        Ok(Simulation {
            env,
            agent,
            schedule: config.offers.clone(),
            buyers: config.buyers.clone(),
            time: 0,
            reward_history: vec![],
            log_every: config.training.log_every,
            rng,
        })
    }

    /// Run one training episode: the agent picks offers and learns from
    /// every transition.
    pub fn step_forward(&mut self) -> Result<EpisodeSummary> {
        let summary = self.run_episode(
            |agent, state, rng| agent.choose_action(state, rng),
            true,
        )?;
        self.time += 1;
        self.reward_history.push(summary.total_reward);
        Ok(summary)
    }

    pub fn train(&mut self, episodes: UInt) -> Result<TrainingReport> {
        let mut tally = Tally::default();
        let mut window = Tally::default();
        for _ in 0..episodes {
            let summary = self.step_forward()?;
            tally.record(&summary);
            window.record(&summary);
            if self.log_every > 0 && self.time % self.log_every == 0 {
                info!(
                    "Episode: {}, Avg. Reward: {:.2}, Deal rate: {:.3}, Epsilon: {:.3}",
                    self.time,
                    window.mean_reward(),
                    window.deal_rate(),
                    self.agent.epsilon()
                );
                window = Tally::default();
            }
        }
        Ok(self.report(tally))
    }

    /// Play episodes with the learned greedy policy, without learning.
    pub fn evaluate(&mut self, episodes: UInt) -> Result<Tally> {
        let agent = self.agent.clone();
        self.evaluate_policy(&Greedy(&agent), episodes)
    }

    pub fn evaluate_policy<P: Policy>(&mut self, policy: &P, episodes: UInt) -> Result<Tally> {
        let mut tally = Tally::default();
        for _ in 0..episodes {
            let summary =
                self.run_episode(|_, state, rng| policy.choose_action(state, rng), false)?;
            tally.record(&summary);
        }
        Ok(tally)
    }

    /// Step `episode` with an externally supplied offer (a human buyer, say)
    /// and train the agent on the transition, crediting the schedule action
    /// nearest to the offer. Walking away trains nothing.
    pub fn play_offer(&mut self, episode: &EpisodeState, offer: Option<Price>) -> Result<Transition> {
        let state = self.env.observe(episode);
        let transition = self.env.step(episode, offer)?;
        if let Some(offer) = offer {
            let action = self.schedule.nearest_action(episode.price, offer);
            self.agent.update_q_table(
                &state,
                action,
                transition.reward,
                &transition.state,
                transition.done,
            )?;
        }
        Ok(transition)
    }

    fn run_episode<F>(&mut self, mut choose: F, learn: bool) -> Result<EpisodeSummary>
    where
        F: FnMut(&QLearningAgent, &DiscretizedState, &mut StdRng) -> Result<usize>,
    {
        let mut episode = self.env.reset();
        let mut actions = vec![];
        let mut total_reward = 0.0;
        let outcome = loop {
            let state = self.env.observe(&episode);
            let action = choose(&self.agent, &state, &mut self.rng)?;
            let buyer = self.schedule.offer(action, episode.price)?;
            let transition = self.env.step_move(&episode, buyer)?;
            if learn {
                self.agent.update_q_table(
                    &state,
                    action,
                    transition.reward,
                    &transition.state,
                    transition.done,
                )?;
            }
            actions.push(action);
            total_reward += transition.reward;
            episode = transition.episode;
            if transition.done {
                break transition.outcome;
            }
        };

        let resale = if outcome.is_deal() {
            None
        } else {
            self.buyers.simulate(&episode, &mut self.rng)
        };
        if let Some(resale) = &resale {
            debug!(
                "Buyer {} purchased the good for {:.2}",
                resale.buyer, resale.price
            );
        }
        debug!(
            "Episode: quality={} price={:.2} signaling={} actions={:?} outcome={} reward={:.2}",
            episode.quality, episode.price, episode.signaling, actions, outcome, total_reward
        );

        Ok(EpisodeSummary {
            episode,
            outcome,
            total_reward,
            actions,
            resale,
        })
    }

    pub fn greedy_policy(&self) -> Vec<PolicyEntry> {
        let table = self.agent.q_table();
        table
            .shape()
            .states()
            .filter(|state| state.round == 0)
            .filter_map(|state| {
                let action = table.argmax(&state).ok()?;
                let value = table.get(&state, action).ok()?;
                Some(PolicyEntry {
                    state,
                    action,
                    value,
                })
            })
            .collect_vec()
    }

    fn report(&self, tally: Tally) -> TrainingReport {
        TrainingReport {
            mean_reward: tally.mean_reward(),
            tally,
            final_epsilon: self.agent.epsilon(),
            greedy_policy: self.greedy_policy(),
        }
    }
}
