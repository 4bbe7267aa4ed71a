use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::config::{MarketConfig, PriceBins};
use crate::{Price, UInt};

/// Reduce a continuous state to a finite index for the Q-table.
pub trait DiscrRep {
    fn representation(&self, bins: &PriceBins) -> DiscretizedState;
}

/// What the learning agent sees of an episode. Raw price, cost and quality
/// stay hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscretizedState {
    pub price_bin: usize,
    pub round: UInt,
    pub signaling: bool,
}

impl DiscretizedState {
    pub fn new(price_bin: usize, round: UInt, signaling: bool) -> Self {
        DiscretizedState {
            price_bin,
            round,
            signaling,
        }
    }
}

impl PriceBins {
    /// Bin index of `price`, clamped to `[0, num_bins - 1]`.
    pub fn bin_of(&self, price: Price) -> usize {
        let raw = ((price - self.lo_price) / self.width()).floor();
        if raw <= 0.0 {
            return 0;
        }
        (raw as usize).min(self.num_bins - 1)
    }
}

/// Dimensions of the discretized state space:
/// price bins x rounds (0 through max_rounds) x signal flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateShape {
    pub num_bins: usize,
    pub num_rounds: usize,
}

impl StateShape {
    pub const NUM_SIGNALS: usize = 2;

    pub fn new(num_bins: usize, num_rounds: usize) -> Self {
        StateShape {
            num_bins,
            num_rounds,
        }
    }

    pub fn for_market(bins: &PriceBins, market: &MarketConfig) -> Self {
        StateShape::new(bins.num_bins, market.max_rounds as usize + 1)
    }

    /// Number of distinct states.
    pub fn len(&self) -> usize {
        self.num_bins * self.num_rounds * Self::NUM_SIGNALS
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, state: &DiscretizedState) -> bool {
        state.price_bin < self.num_bins && (state.round as usize) < self.num_rounds
    }

    /// Row-major position of `state`, or None when it falls outside the shape.
    pub fn flat_index(&self, state: &DiscretizedState) -> Option<usize> {
        if !self.contains(state) {
            return None;
        }
        let signal = usize::from(state.signaling);
        Some((state.price_bin * self.num_rounds + state.round as usize) * Self::NUM_SIGNALS + signal)
    }

    /// Every state in row-major order.
    pub fn states(&self) -> impl Iterator<Item = DiscretizedState> + use<> {
        iproduct!(0..self.num_bins, 0..self.num_rounds, [false, true])
            .map(|(bin, round, signaling)| DiscretizedState::new(bin, round as UInt, signaling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Preset};

    #[test]
    fn test_bin_of_dealership() {
        let bins = Config::preset(Preset::Dealership).bins;
        assert_eq!(bins.bin_of(4000.0), 0);
        assert_eq!(bins.bin_of(5000.0), 0);
        assert_eq!(bins.bin_of(5999.99), 0);
        assert_eq!(bins.bin_of(6000.0), 1);
        assert_eq!(bins.bin_of(11_500.0), 6);
        assert_eq!(bins.bin_of(12_000.0), 7);
        assert_eq!(bins.bin_of(25_000.0), 7);
        assert_eq!(bins.bin_of(-3.0), 0);
    }

    #[test]
    fn test_bin_of_classroom() {
        let bins = Config::preset(Preset::Classroom).bins;
        assert_eq!(bins.bin_of(60.0), 1);
        assert_eq!(bins.bin_of(89.5), 3);
    }

    #[test]
    fn test_flat_index_is_a_bijection() {
        let shape = StateShape::new(8, 4);
        assert_eq!(shape.len(), 64);
        let mut seen: Vec<usize> = shape
            .states()
            .map(|s| shape.flat_index(&s).unwrap())
            .collect();
        assert_eq!(seen.len(), 64);
        seen.sort();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_out_of_shape() {
        let shape = StateShape::new(8, 4);
        assert_eq!(shape.flat_index(&DiscretizedState::new(8, 0, false)), None);
        assert_eq!(shape.flat_index(&DiscretizedState::new(0, 4, true)), None);
        assert!(shape.contains(&DiscretizedState::new(7, 3, true)));
    }
}
