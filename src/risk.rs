//! Position sizing and stop/target placement.

use crate::types::Direction;
use crate::utils::{round2, round5};

/// Returned when balance or risk is not positive.
pub const ZERO_SIZE: f64 = 0.0;

/// Fixed per-unit risk proxy. Not a pip-value calculation: `balance * risk% / 10`.
pub struct RiskSizer {
    unit_risk: f64,
}

impl Default for RiskSizer {
    fn default() -> Self {
        Self { unit_risk: 10.0 }
    }
}

impl RiskSizer {
    pub fn size_for(&self, balance: f64, risk_percent: f64) -> f64 {
        if !(balance > 0.0) || !(risk_percent > 0.0) {
            return ZERO_SIZE;
        }
        round2(balance * risk_percent / 100.0 / self.unit_risk)
    }
}

/// ATR proxy multiples for stop and target, giving 1 : 1.667 risk/reward.
pub struct LevelCalculator {
    atr_ratio: f64,
    stop_mult: f64,
    target_mult: f64,
}

impl Default for LevelCalculator {
    fn default() -> Self {
        Self {
            atr_ratio: 0.001,
            stop_mult: 1.5,
            target_mult: 2.5,
        }
    }
}

impl LevelCalculator {
    /// Returns `(stop_loss, take_profit)` rounded to 5dp.
    pub fn levels_for(&self, price: f64, direction: Direction) -> (f64, f64) {
        let atr = price * self.atr_ratio;
        let sign = direction.sign();
        let stop = price - sign * self.stop_mult * atr;
        let target = price + sign * self.target_mult * atr;
        (round5(stop), round5(target))
    }

    #[cfg(test)]
    pub fn reward_to_risk(&self) -> f64 {
        self.target_mult / self.stop_mult
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_two_percent_of_ten_thousand() {
        assert_eq!(RiskSizer::default().size_for(10_000.0, 2.0), 20.0);
    }

    #[test]
    fn sizes_are_rounded_to_cents() {
        assert_eq!(RiskSizer::default().size_for(12_345.67, 1.5), 18.52);
    }

    #[test]
    fn non_positive_inputs_give_zero() {
        let s = RiskSizer::default();
        assert_eq!(s.size_for(0.0, 2.0), ZERO_SIZE);
        assert_eq!(s.size_for(-500.0, 2.0), ZERO_SIZE);
        assert_eq!(s.size_for(10_000.0, 0.0), ZERO_SIZE);
        assert_eq!(s.size_for(10_000.0, f64::NAN), ZERO_SIZE);
    }

    #[test]
    fn buy_levels_at_100() {
        let (sl, tp) = LevelCalculator::default().levels_for(100.0, Direction::Buy);
        assert_eq!(sl, 99.85);
        assert_eq!(tp, 100.25);
    }

    #[test]
    fn sell_levels_are_mirrored() {
        let (sl, tp) = LevelCalculator::default().levels_for(100.0, Direction::Sell);
        assert_eq!(sl, 100.15);
        assert_eq!(tp, 99.75);
    }

    #[test]
    fn fx_levels_round_to_five_places() {
        let (sl, tp) = LevelCalculator::default().levels_for(1.08765, Direction::Buy);
        assert_eq!(sl, 1.08602);
        assert_eq!(tp, 1.09037);
    }

    #[test]
    fn ratio_is_one_to_one_point_six_seven() {
        let calc = LevelCalculator::default();
        assert!((calc.reward_to_risk() - 1.6667).abs() < 1e-3);
        let (sl, tp) = calc.levels_for(250.0, Direction::Buy);
        let ratio = (tp - 250.0) / (250.0 - sl);
        assert!((ratio - 2.5 / 1.5).abs() < 1e-6);
    }
}
