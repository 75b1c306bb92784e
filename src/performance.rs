//! Win rate, average win/loss and profit factor over the full closed-trade set.

use serde::{Deserialize, Serialize};

use crate::types::ClosedTrade;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSnapshot {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent, 0..=100.
    pub win_rate: f64,
    pub avg_profit: f64,
    /// Mean of non-positive trades; zero or negative.
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub total_pnl: f64,
}

/// Recomputed from scratch every call. Break-even trades (`pnl == 0`) count as losses.
pub fn compute(trades: &[ClosedTrade]) -> PerformanceSnapshot {
    let total = trades.len();
    if total == 0 {
        return PerformanceSnapshot::default();
    }

    let (mut win_sum, mut loss_sum) = (0.0, 0.0);
    let (mut wins, mut losses) = (0usize, 0usize);
    for t in trades {
        if t.pnl > 0.0 {
            wins += 1;
            win_sum += t.pnl;
        } else {
            losses += 1;
            loss_sum += t.pnl;
        }
    }

    let avg_profit = if wins > 0 { win_sum / wins as f64 } else { 0.0 };
    let avg_loss = if losses > 0 { loss_sum / losses as f64 } else { 0.0 };
    let profit_factor = if avg_loss == 0.0 {
        0.0
    } else {
        avg_profit / avg_loss.abs()
    };

    PerformanceSnapshot {
        total_trades: total,
        wins,
        losses,
        win_rate: wins as f64 / total as f64 * 100.0,
        avg_profit,
        avg_loss,
        profit_factor,
        total_pnl: win_sum + loss_sum,
    }
}
