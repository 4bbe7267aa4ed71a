use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::environment::EpisodeState;
use crate::error::{LemonsError, Result};
use crate::{Price, UInt};

/// Other buyers who see only the posted price and the signal.
///
/// Each arriving buyer draws a willingness to pay from one of two ranges
/// depending on whether the seller signals, and buys at the posted price if
/// it does not exceed that willingness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyerPool {
    pub num_buyers: UInt,
    pub signaled_willingness: (Price, Price),
    pub unsignaled_willingness: (Price, Price),
}

/// A sale to someone other than the negotiating buyer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resale {
    /// Arrival order of the buyer who purchased, from 0.
    pub buyer: UInt,
    pub price: Price,
    pub willingness: Price,
}

impl Default for BuyerPool {
    fn default() -> Self {
        BuyerPool::dealership()
    }
}

impl BuyerPool {
    pub fn classroom() -> Self {
        BuyerPool {
            num_buyers: 5,
            signaled_willingness: (75.0, 100.0),
            unsignaled_willingness: (60.0, 85.0),
        }
    }

    pub fn dealership() -> Self {
        BuyerPool {
            num_buyers: 5,
            signaled_willingness: (7500.0, 10_000.0),
            unsignaled_willingness: (6000.0, 8500.0),
        }
    }

    fn willingness_range(&self, signaling: bool) -> (Price, Price) {
        if signaling {
            self.signaled_willingness
        } else {
            self.unsignaled_willingness
        }
    }

    /// Offer the good to each buyer in turn. The first buyer willing to pay
    /// the posted price takes it.
    pub fn simulate<R: Rng + ?Sized>(&self, episode: &EpisodeState, rng: &mut R) -> Option<Resale> {
        let (lo, hi) = self.willingness_range(episode.signaling);
        (0..self.num_buyers).find_map(|buyer| {
            let willingness = rng.random_range(lo..=hi);
            (episode.price <= willingness).then_some(Resale {
                buyer,
                price: episode.price,
                willingness,
            })
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (name, (lo, hi)) in [
            ("signaled_willingness", self.signaled_willingness),
            ("unsignaled_willingness", self.unsignaled_willingness),
        ] {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(LemonsError::InvalidConfig(format!(
                    "buyers.{name} must be a finite range with low <= high"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Preset};
    use crate::draws::FixedDraws;
    use crate::environment::NegotiationEnvironment;
    use crate::goods::Quality;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn episode(quality: Quality, markup: Price, signaling: bool) -> EpisodeState {
        let config = Config::preset(Preset::Classroom);
        let draws = FixedDraws {
            quality,
            markup,
            signaling,
        };
        NegotiationEnvironment::from_config(&config, draws)
            .unwrap()
            .reset()
    }

    #[test]
    fn test_cheap_good_always_resold_to_first_buyer() {
        let pool = BuyerPool::classroom();
        let mut rng = StdRng::seed_from_u64(0);
        // Price 60 sits below every unsignaled willingness.
        let ep = episode(Quality::Low, 10.0, false);
        let resale = pool.simulate(&ep, &mut rng).unwrap();
        assert_eq!(resale.buyer, 0);
        assert_eq!(resale.price, 60.0);
        assert!(resale.willingness >= 60.0);
    }

    #[test]
    fn test_overpriced_good_never_resold() {
        let pool = BuyerPool::classroom();
        let mut rng = StdRng::seed_from_u64(0);
        // Price 70 + 40 + 5 = 115 exceeds every signaled willingness.
        let ep = episode(Quality::High, 40.0, true);
        for _ in 0..100 {
            assert_eq!(pool.simulate(&ep, &mut rng), None);
        }
    }

    #[test]
    fn test_signal_raises_resale_chance() {
        let pool = BuyerPool::classroom();
        let mut rng = StdRng::seed_from_u64(17);
        // Same posted price of 90, with and without a signal.
        let signaled = episode(Quality::High, 15.0, true);
        let unsignaled = episode(Quality::High, 20.0, false);
        assert_eq!(signaled.price, unsignaled.price);

        let trials = 2000;
        let sold_signaled = (0..trials)
            .filter(|_| pool.simulate(&signaled, &mut rng).is_some())
            .count();
        let sold_unsignaled = (0..trials)
            .filter(|_| pool.simulate(&unsignaled, &mut rng).is_some())
            .count();
        assert!(sold_signaled > sold_unsignaled);
    }

    #[test]
    fn test_no_buyers() {
        let pool = BuyerPool {
            num_buyers: 0,
            ..BuyerPool::classroom()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pool.simulate(&episode(Quality::Low, 0.0, false), &mut rng), None);
    }

    #[test]
    fn test_validate() {
        BuyerPool::dealership().validate().unwrap();
        let pool = BuyerPool {
            signaled_willingness: (100.0, 75.0),
            ..BuyerPool::classroom()
        };
        assert!(pool.validate().is_err());
    }
}
