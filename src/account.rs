//! Running account figures. Mutated only through the ledger.

use serde::{Deserialize, Serialize};

use crate::types::Position;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AccountState {
    /// Realized capital.
    pub balance: f64,
    /// `balance` plus unrealized P&L of open positions.
    pub equity: f64,
    /// Realized P&L since the last daily reset.
    pub daily_pl: f64,
}

impl AccountState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            equity: initial_balance,
            daily_pl: 0.0,
        }
    }

    /// Negative balances are allowed; there are no margin calls.
    pub fn apply_realized(&mut self, pnl: f64) {
        self.balance += pnl;
        self.daily_pl += pnl;
    }

    pub fn recompute_equity<'a>(&mut self, open: impl IntoIterator<Item = &'a Position>) {
        let unrealized: f64 = open.into_iter().map(|p| p.pnl).sum();
        self.equity = self.balance + unrealized;
    }

    pub fn reset_daily(&mut self) {
        self.daily_pl = 0.0;
    }
}
