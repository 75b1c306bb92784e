//! Small helpers.

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

/// Letters, digits and the usual pair separators; 3 to 12 chars.
pub fn is_valid_symbol(sym: &str) -> bool {
    (3..=12).contains(&sym.len())
        && sym
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-'))
        && sym.chars().any(|c| c.is_ascii_alphabetic())
}

/// JPY-quoted instruments use a 100x pip multiplier instead of 10000x.
pub fn pip_multiplier(symbol: &str) -> f64 {
    if symbol.to_ascii_uppercase().contains("JPY") {
        100.0
    } else {
        10_000.0
    }
}

/// Round half away from zero to `dp` decimal places.
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let f = 10f64.powi(dp);
    (value * f).round() / f
}

pub fn round2(value: f64) -> f64 {
    round_dp(value, 2)
}

pub fn round5(value: f64) -> f64 {
    round_dp(value, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols() {
        assert_eq!(sanitize_symbol("  eurusd "), "EURUSD");
        assert!(is_valid_symbol("EURUSD"));
        assert!(is_valid_symbol("EUR/USD"));
        assert!(is_valid_symbol("XAUUSD"));
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("EU"));
        assert!(!is_valid_symbol("EUR USD"));
        assert!(!is_valid_symbol("123456"));
    }

    #[test]
    fn jpy_pairs_use_small_multiplier() {
        assert_eq!(pip_multiplier("USDJPY"), 100.0);
        assert_eq!(pip_multiplier("eurjpy"), 100.0);
        assert_eq!(pip_multiplier("EURUSD"), 10_000.0);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(20.0), 20.0);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round5(99.849_999_999), 99.85);
    }
}
