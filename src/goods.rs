use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::Price;
use crate::config::MarketConfig;

/// Hidden quality of the good for sale. Only the seller knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize, Deserialize)]
pub enum Quality {
    Low,
    High,
}

impl Quality {
    pub fn cost(&self, market: &MarketConfig) -> Price {
        match self {
            Quality::Low => market.low_cost,
            Quality::High => market.high_cost,
        }
    }

    /// Cost the seller pays to signal high quality. A low-quality seller
    /// faking the signal pays more.
    pub fn signal_cost(&self, market: &MarketConfig) -> Price {
        match self {
            Quality::Low => market.signal_cost_low,
            Quality::High => market.signal_cost_high,
        }
    }

    /// Probability that a seller of this quality signals.
    pub fn signal_propensity(&self, market: &MarketConfig) -> f64 {
        match self {
            Quality::Low => market.signal_propensity_low,
            Quality::High => market.signal_propensity_high,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let market = MarketConfig::dealership();
        assert_eq!(Quality::Low.cost(&market), 5000.0);
        assert_eq!(Quality::High.cost(&market), 7000.0);
        assert_eq!(Quality::Low.signal_cost(&market), 1500.0);
        assert_eq!(Quality::High.signal_cost(&market), 500.0);
        assert_eq!(Quality::Low.signal_propensity(&market), 0.2);
        assert_eq!(Quality::High.signal_propensity(&market), 0.8);

        let market = MarketConfig::classroom();
        assert_eq!(Quality::Low.cost(&market), 50.0);
        assert_eq!(Quality::High.cost(&market), 70.0);
    }
}
