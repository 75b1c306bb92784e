//! Market list provider seam. The simulator only consumes `{symbol, reference, signal}`.

use crate::types::MarketQuote;
use crate::utils::{is_valid_symbol, sanitize_symbol};

pub trait MarketListProvider: Send {
    fn markets(&mut self) -> Vec<MarketQuote>;
}

/// Fixed universe, typically from `config.yaml`.
pub struct StaticMarkets {
    quotes: Vec<MarketQuote>,
}

impl StaticMarkets {
    pub fn new(quotes: Vec<MarketQuote>) -> Self {
        let quotes = quotes
            .into_iter()
            .map(|q| MarketQuote {
                symbol: sanitize_symbol(&q.symbol),
                ..q
            })
            .filter(|q| is_valid_symbol(&q.symbol) && q.reference_price > 0.0)
            .collect();
        Self { quotes }
    }
}

impl MarketListProvider for StaticMarkets {
    fn markets(&mut self) -> Vec<MarketQuote> {
        self.quotes.clone()
    }
}

/// Default universe used when the config lists no markets.
pub fn default_markets() -> Vec<MarketQuote> {
    use crate::types::SignalClass::*;
    [
        ("EURUSD", 1.0850, Bullish),
        ("GBPUSD", 1.2650, Neutral),
        ("USDJPY", 149.50, Overbought),
        ("AUDUSD", 0.6550, Oversold),
        ("USDCAD", 1.3600, Bearish),
        ("XAUUSD", 2350.0, Neutral),
    ]
    .into_iter()
    .map(|(s, p, signal)| MarketQuote {
        symbol: s.to_string(),
        reference_price: p,
        signal,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalClass;

    #[test]
    fn static_markets_drop_bad_rows() {
        let mut m = StaticMarkets::new(vec![
            MarketQuote { symbol: " eurusd".into(), reference_price: 1.1, signal: SignalClass::Bullish },
            MarketQuote { symbol: "??".into(), reference_price: 1.0, signal: SignalClass::Neutral },
            MarketQuote { symbol: "GBPUSD".into(), reference_price: 0.0, signal: SignalClass::Neutral },
        ]);
        let got = m.markets();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].symbol, "EURUSD");
    }

    #[test]
    fn default_universe_is_valid() {
        let mut m = StaticMarkets::new(default_markets());
        assert_eq!(m.markets().len(), default_markets().len());
    }
}
