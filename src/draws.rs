//! Random draws made by the environment at reset.
//!
//! Any `rand::Rng` is a draw source. [`FixedDraws`] pins every draw, so a
//! test can set up an exact episode.

use rand::Rng;

use crate::Price;
use crate::goods::Quality;

pub trait DrawSource {
    /// Uniform over {Low, High}.
    fn draw_quality(&mut self) -> Quality;
    /// Uniform over `[min, max]`.
    fn draw_markup(&mut self, min: Price, max: Price) -> Price;
    /// True with the given probability.
    fn draw_signal(&mut self, probability: f64) -> bool;
}

impl<R: Rng + ?Sized> DrawSource for R {
    fn draw_quality(&mut self) -> Quality {
        match self.random_range(0..=1) {
            0 => Quality::Low,
            _ => Quality::High,
        }
    }

    fn draw_markup(&mut self, min: Price, max: Price) -> Price {
        self.random_range(min..=max)
    }

    fn draw_signal(&mut self, probability: f64) -> bool {
        self.random::<f64>() < probability
    }
}

/// Draw source returning the same values on every reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDraws {
    pub quality: Quality,
    pub markup: Price,
    pub signaling: bool,
}

impl DrawSource for FixedDraws {
    fn draw_quality(&mut self) -> Quality {
        self.quality
    }

    fn draw_markup(&mut self, _min: Price, _max: Price) -> Price {
        self.markup
    }

    fn draw_signal(&mut self, _probability: f64) -> bool {
        self.signaling
    }
}
