//! Synthetic price source: reference price per symbol with bounded relative noise.

use std::collections::HashMap;

use crate::random::RandomSource;
use crate::types::MarketQuote;
use crate::utils::{round5, sanitize_symbol};

/// Reference used for symbols the oracle has never seen.
pub const DEFAULT_REFERENCE: f64 = 100.0;

pub struct PriceOracle {
    references: HashMap<String, f64>,
    /// Max relative fluctuation, in percent of the reference.
    fluctuation_pct: f64,
}

impl PriceOracle {
    pub fn new(fluctuation_pct: f64) -> Self {
        Self {
            references: HashMap::new(),
            fluctuation_pct: fluctuation_pct.abs(),
        }
    }

    pub fn set_reference(&mut self, symbol: &str, price: f64) {
        if price > 0.0 && price.is_finite() {
            self.references.insert(sanitize_symbol(symbol), price);
        }
    }

    pub fn load_quotes(&mut self, quotes: &[MarketQuote]) {
        for q in quotes {
            self.set_reference(&q.symbol, q.reference_price);
        }
    }

    pub fn reference(&self, symbol: &str) -> f64 {
        self.references
            .get(&sanitize_symbol(symbol))
            .copied()
            .unwrap_or(DEFAULT_REFERENCE)
    }

    /// Reference perturbed by at most `fluctuation_pct` percent, rounded to 5dp.
    pub fn price_for(&self, symbol: &str, rng: &mut dyn RandomSource) -> f64 {
        let reference = self.reference(symbol);
        let delta = reference * self.fluctuation_pct / 100.0 * rng.next_signed();
        round5(reference + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};

    #[test]
    fn unknown_symbol_uses_default_reference() {
        let o = PriceOracle::new(0.1);
        let mut r = ScriptedRandom::neutral();
        assert_eq!(o.price_for("NOPE", &mut r), DEFAULT_REFERENCE);
    }

    #[test]
    fn scripted_draws_give_exact_prices() {
        let mut o = PriceOracle::new(0.1);
        o.set_reference("eurusd", 1.1);
        let mut r = ScriptedRandom::new(vec![1.0, 0.0, 0.5]);
        // next_signed maps 1.0 -> +1, 0.0 -> -1, 0.5 -> 0
        assert_eq!(o.price_for("EURUSD", &mut r), 1.1011);
        assert_eq!(o.price_for("EURUSD", &mut r), 1.0989);
        assert_eq!(o.price_for("EURUSD", &mut r), 1.1);
    }

    #[test]
    fn seeded_prices_stay_in_band() {
        let mut o = PriceOracle::new(0.1);
        o.set_reference("USDJPY", 150.0);
        let mut r = SeededRandom::new(Some(99));
        for _ in 0..500 {
            let p = o.price_for("USDJPY", &mut r);
            assert!((149.85..=150.15).contains(&p), "out of band: {p}");
        }
    }

    #[test]
    fn rejects_non_positive_reference() {
        let mut o = PriceOracle::new(0.1);
        o.set_reference("GBPUSD", -1.0);
        assert_eq!(o.reference("GBPUSD"), DEFAULT_REFERENCE);
    }
}
