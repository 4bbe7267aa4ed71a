use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::actions::OfferSchedule;
use crate::error::{LemonsError, Result};
use crate::market::BuyerPool;
use crate::{Price, UInt};

/// Named parameter sets. Both appear as legitimate calibrations of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Preset {
    /// Costs 50/70: small numbers for reading the model by hand.
    Classroom,
    /// Costs 5000/7000: used-car scale prices.
    Dealership,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub market: MarketConfig,
    pub bins: PriceBins,
    pub agent: AgentConfig,
    pub offers: OfferSchedule,
    pub buyers: BuyerPool,
    pub training: TrainingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config::preset(Preset::Dealership)
    }
}

impl Config {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Classroom => Config {
                market: MarketConfig::classroom(),
                bins: PriceBins {
                    lo_price: 50.0,
                    hi_price: 120.0,
                    num_bins: 8,
                },
                agent: AgentConfig::default(),
                offers: OfferSchedule::default(),
                buyers: BuyerPool::classroom(),
                training: TrainingConfig::default(),
            },
            Preset::Dealership => Config {
                market: MarketConfig::dealership(),
                bins: PriceBins {
                    lo_price: 5000.0,
                    hi_price: 12000.0,
                    num_bins: 8,
                },
                agent: AgentConfig::default(),
                offers: OfferSchedule::default(),
                buyers: BuyerPool::dealership(),
                training: TrainingConfig::default(),
            },
        }
    }

    /// Parse and validate a TOML document. Missing sections and fields take
    /// their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Config::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.market.validate()?;
        self.bins.validate()?;
        self.agent.validate()?;
        self.offers.validate()?;
        self.buyers.validate()?;
        Ok(())
    }
}

/// Seller-side economics of the market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub low_cost: Price,
    pub high_cost: Price,
    /// Signal cost paid by a low-quality seller faking the signal.
    pub signal_cost_low: Price,
    /// Signal cost paid by a high-quality seller.
    pub signal_cost_high: Price,
    pub min_markup: Price,
    pub max_markup: Price,
    pub max_rounds: UInt,
    pub signal_propensity_low: f64,
    pub signal_propensity_high: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig::dealership()
    }
}

impl MarketConfig {
    pub fn dealership() -> Self {
        MarketConfig {
            low_cost: 5000.0,
            high_cost: 7000.0,
            signal_cost_low: 1500.0,
            signal_cost_high: 500.0,
            min_markup: 2000.0,
            max_markup: 4000.0,
            max_rounds: 3,
            signal_propensity_low: 0.2,
            signal_propensity_high: 0.8,
        }
    }

    pub fn classroom() -> Self {
        MarketConfig {
            low_cost: 50.0,
            high_cost: 70.0,
            signal_cost_low: 15.0,
            signal_cost_high: 5.0,
            min_markup: 10.0,
            max_markup: 40.0,
            max_rounds: 3,
            signal_propensity_low: 0.2,
            signal_propensity_high: 0.8,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let prices = [
            ("low_cost", self.low_cost),
            ("high_cost", self.high_cost),
            ("signal_cost_low", self.signal_cost_low),
            ("signal_cost_high", self.signal_cost_high),
            ("min_markup", self.min_markup),
            ("max_markup", self.max_markup),
        ];
        if let Some((name, _)) = prices.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("market.{name} must be finite")));
        }
        if self.min_markup > self.max_markup {
            return Err(invalid(format!(
                "market.min_markup ({}) exceeds market.max_markup ({})",
                self.min_markup, self.max_markup
            )));
        }
        if self.max_rounds == 0 {
            return Err(invalid("market.max_rounds must be at least 1".into()));
        }
        for (name, p) in [
            ("signal_propensity_low", self.signal_propensity_low),
            ("signal_propensity_high", self.signal_propensity_high),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("market.{name} must lie in [0, 1]")));
            }
        }
        Ok(())
    }
}

/// Equal-width price buckets. Bin `i` starts at `lo_price + i * width` with
/// `width = (hi_price - lo_price) / (num_bins - 1)`, so `hi_price` opens the
/// last bin. Prices outside the range clamp to the end bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceBins {
    pub lo_price: Price,
    pub hi_price: Price,
    pub num_bins: usize,
}

impl Default for PriceBins {
    fn default() -> Self {
        Config::preset(Preset::Dealership).bins
    }
}

impl PriceBins {
    pub fn width(&self) -> Price {
        (self.hi_price - self.lo_price) / (self.num_bins - 1) as Price
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_bins < 2 {
            return Err(invalid("bins.num_bins must be at least 2".into()));
        }
        if !(self.lo_price.is_finite() && self.hi_price.is_finite()) || self.hi_price <= self.lo_price
        {
            return Err(invalid(format!(
                "bins.hi_price ({}) must be finite and above bins.lo_price ({})",
                self.hi_price, self.lo_price
            )));
        }
        Ok(())
    }
}

/// Q-learning hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub learning_rate: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            learning_rate: 0.1,
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.1,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(invalid("agent.learning_rate must lie in (0, 1]".into()));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(invalid("agent.epsilon_decay must lie in (0, 1]".into()));
        }
        for (name, v) in [
            ("gamma", self.gamma),
            ("epsilon", self.epsilon),
            ("epsilon_min", self.epsilon_min),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(format!("agent.{name} must lie in [0, 1]")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: UInt,
    /// Seed for every random draw; entropy from the OS when absent.
    pub seed: Option<u64>,
    pub log_every: UInt,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: 5000,
            seed: None,
            log_every: 1000,
        }
    }
}

fn invalid(msg: String) -> LemonsError {
    LemonsError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_config_serialization_toml() {
        let config = Config::preset(Preset::Classroom);
        let serialized = toml::to_string(&config).unwrap();
        assert!(serialized.contains("[market]"));
        assert!(serialized.contains("low_cost = 50.0"));

        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("[market]\nmax_rounds = 5\n").unwrap();
        assert_eq!(config.market.max_rounds, 5);
        assert_eq!(config.market.low_cost, 5000.0);
        assert_eq!(config.agent, AgentConfig::default());
        assert_eq!(config.training.seed, None);
    }

    #[test]
    fn test_read_from_file() {
        let config = Config::from_file("./lemons.toml").expect("Failed to read the file");
        assert_eq!(config.market.max_rounds, 3);
        assert_eq!(config.bins.num_bins, 8);
    }

    #[test]
    fn test_presets_validate() {
        for preset in Preset::iter() {
            Config::preset(preset).validate().unwrap();
        }
        assert_eq!("classroom".parse::<Preset>().unwrap(), Preset::Classroom);
        assert_eq!(Preset::Dealership.to_string(), "dealership");
    }

    #[test]
    fn test_bin_width() {
        assert_eq!(Config::preset(Preset::Dealership).bins.width(), 1000.0);
        assert_eq!(Config::preset(Preset::Classroom).bins.width(), 10.0);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.market.min_markup = 5000.0;
        assert!(matches!(
            config.validate(),
            Err(LemonsError::InvalidConfig(_))
        ));

        let mut config = Config::default();
        config.bins.num_bins = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.market.signal_propensity_high = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.agent.learning_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.market.max_rounds = 0;
        assert!(config.validate().is_err());

        assert!(Config::from_toml_str("[agent]\ngamma = 2.0\n").is_err());
    }
}
