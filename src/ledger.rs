//! Position ledger: owns open positions, closed history and the account figures.
//!
//! Every mutation (`open`, `tick`, `close`, `apply_break_even`) finishes by
//! recomputing equity, so `equity == balance + sum(open pnl)` holds between calls.
//! A position is `OPEN` only while it sits in the open book; closing moves an
//! immutable snapshot into history and the id can never be reopened.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::account::AccountState;
use crate::error::{SimError, SimResult};
use crate::random::RandomSource;
use crate::types::{ClosedTrade, Direction, ExitReason, Position, PositionStatus};
use crate::utils::{is_valid_symbol, pip_multiplier, round5, sanitize_symbol};

/// Parameters for a new position.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenOrder {
    pub symbol: String,
    pub direction: Direction,
    pub price: f64,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub manual: bool,
}

/// Mark-to-market `(pnl, pnl_percent)` for a position at `current`.
pub fn mark(symbol: &str, direction: Direction, open: f64, current: f64, size: f64) -> (f64, f64) {
    let diff = direction.sign() * (current - open);
    let pnl = diff * size * pip_multiplier(symbol);
    let pnl_percent = diff / open * 100.0;
    (pnl, pnl_percent)
}

/// Exit test for a price against stop/target. Take-profit is checked first,
/// so a price satisfying both resolves as `TakeProfit`.
pub fn exit_reason(
    direction: Direction,
    price: f64,
    stop_loss: f64,
    take_profit: f64,
) -> Option<ExitReason> {
    let (hit_tp, hit_sl) = match direction {
        Direction::Buy => (price >= take_profit, price <= stop_loss),
        Direction::Sell => (price <= take_profit, price >= stop_loss),
    };
    if hit_tp {
        Some(ExitReason::TakeProfit)
    } else if hit_sl {
        Some(ExitReason::StopLoss)
    } else {
        None
    }
}

pub struct PositionLedger {
    open: BTreeMap<u64, Position>,
    history: Vec<ClosedTrade>,
    account: AccountState,
    next_id: u64,
    /// Max close slippage, in percent of the open price.
    slippage_pct: f64,
}

impl PositionLedger {
    pub fn new(initial_balance: f64, slippage_pct: f64) -> Self {
        Self {
            open: BTreeMap::new(),
            history: Vec::new(),
            account: AccountState::new(initial_balance),
            next_id: 1,
            slippage_pct: slippage_pct.abs(),
        }
    }

    /// Rebuild from persisted parts. Ids continue after the highest one seen.
    pub fn restore(
        account: AccountState,
        open: Vec<Position>,
        history: Vec<ClosedTrade>,
        slippage_pct: f64,
    ) -> Self {
        let max_id = open
            .iter()
            .map(|p| p.id)
            .chain(history.iter().map(|t| t.id()))
            .max()
            .unwrap_or(0);
        let open = open
            .into_iter()
            .filter(|p| p.status == PositionStatus::Open)
            .map(|p| (p.id, p))
            .collect();
        let mut me = Self {
            open,
            history,
            account,
            next_id: max_id + 1,
            slippage_pct: slippage_pct.abs(),
        };
        me.refresh_equity();
        me
    }

    pub fn account(&self) -> AccountState {
        self.account
    }

    pub fn open_positions(&self) -> Vec<Position> {
        self.open.values().cloned().collect()
    }

    pub fn open_ids(&self) -> Vec<u64> {
        self.open.keys().copied().collect()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.history
    }

    pub fn is_closed(&self, id: u64) -> bool {
        self.history.iter().any(|t| t.id() == id)
    }

    pub fn open(&mut self, order: OpenOrder, now: DateTime<Utc>) -> SimResult<Position> {
        let symbol = sanitize_symbol(&order.symbol);
        if !is_valid_symbol(&symbol) {
            return Err(SimError::InvalidInput(format!("malformed symbol '{}'", order.symbol)));
        }
        if !(order.price > 0.0) || !order.price.is_finite() {
            return Err(SimError::InvalidInput(format!("bad price {}", order.price)));
        }
        if !(order.size > 0.0) || !order.size.is_finite() {
            return Err(SimError::InvalidInput(format!("bad size {}", order.size)));
        }
        let ordered = match order.direction {
            Direction::Buy => order.stop_loss < order.price && order.price < order.take_profit,
            Direction::Sell => order.take_profit < order.price && order.price < order.stop_loss,
        };
        if !ordered {
            return Err(SimError::InvalidInput(format!(
                "{} levels out of order: sl={} price={} tp={}",
                order.direction, order.stop_loss, order.price, order.take_profit
            )));
        }

        let id = self.next_id;
        self.next_id += 1;
        let pos = Position {
            id,
            symbol,
            direction: order.direction,
            open_price: order.price,
            current_price: order.price,
            size: order.size,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            open_time: now,
            pnl: 0.0,
            pnl_percent: 0.0,
            status: PositionStatus::Open,
            manual: order.manual,
            break_even_applied: false,
        };
        self.open.insert(id, pos.clone());
        self.refresh_equity();
        Ok(pos)
    }

    /// Re-price an open position and recompute its P&L.
    pub fn tick(&mut self, id: u64, new_price: f64) -> SimResult<Position> {
        self.position(id)?;
        if !(new_price > 0.0) || !new_price.is_finite() {
            return Err(SimError::InvalidInput(format!("bad price {new_price}")));
        }
        let pos = self.open_mut(id)?;
        pos.current_price = new_price;
        let (pnl, pct) = mark(&pos.symbol, pos.direction, pos.open_price, new_price, pos.size);
        pos.pnl = pnl;
        pos.pnl_percent = pct;
        let snapshot = pos.clone();
        self.refresh_equity();
        Ok(snapshot)
    }

    pub fn evaluate_exit(&self, id: u64) -> SimResult<Option<ExitReason>> {
        let pos = self.position(id)?;
        Ok(exit_reason(pos.direction, pos.current_price, pos.stop_loss, pos.take_profit))
    }

    /// Close at `close_price` perturbed by up to `slippage_pct` of the open price.
    pub fn close(
        &mut self,
        id: u64,
        close_price: f64,
        reason: ExitReason,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> SimResult<ClosedTrade> {
        self.position(id)?;
        if !(close_price > 0.0) || !close_price.is_finite() {
            return Err(SimError::InvalidInput(format!("bad close price {close_price}")));
        }
        let Some(mut pos) = self.open.remove(&id) else {
            return Err(SimError::UnknownPosition(id));
        };

        let slippage = pos.open_price * self.slippage_pct / 100.0 * rng.next_signed();
        let fill = round5(close_price + slippage);
        let (pnl, pct) = mark(&pos.symbol, pos.direction, pos.open_price, fill, pos.size);
        pos.current_price = fill;
        pos.pnl = pnl;
        pos.pnl_percent = pct;
        pos.status = PositionStatus::Closed;

        let trade = ClosedTrade {
            position: pos,
            close_price: fill,
            close_time: now,
            pnl,
            reason,
        };
        self.account.apply_realized(pnl);
        self.history.push(trade.clone());
        self.refresh_equity();
        debug!(id, fill, pnl, ?reason, "position closed");
        Ok(trade)
    }

    /// Move the stop to the open price and push the target out once
    /// `pnl_percent` reaches `trigger`. Returns whether the levels moved.
    pub fn apply_break_even(&mut self, id: u64, trigger: f64, tp_move_pct: f64) -> SimResult<bool> {
        let pos = self.open_mut(id)?;
        if pos.break_even_applied || pos.pnl_percent < trigger {
            return Ok(false);
        }
        let sign = pos.direction.sign();
        pos.stop_loss = pos.open_price;
        pos.take_profit = round5(pos.take_profit + sign * pos.open_price * tp_move_pct / 100.0);
        pos.break_even_applied = true;
        self.refresh_equity();
        Ok(true)
    }

    pub fn reset_daily(&mut self) {
        self.account.reset_daily();
    }

    /// Open position by id; `InvalidState` if it was closed, `UnknownPosition` otherwise.
    pub fn position(&self, id: u64) -> SimResult<&Position> {
        match self.open.get(&id) {
            Some(p) => Ok(p),
            None => Err(self.missing(id)),
        }
    }

    fn open_mut(&mut self, id: u64) -> SimResult<&mut Position> {
        if !self.open.contains_key(&id) {
            return Err(self.missing(id));
        }
        self.open.get_mut(&id).ok_or(SimError::UnknownPosition(id))
    }

    fn missing(&self, id: u64) -> SimError {
        if self.is_closed(id) {
            SimError::InvalidState(format!("position {id} is already closed"))
        } else {
            SimError::UnknownPosition(id)
        }
    }

    fn refresh_equity(&mut self) {
        self.account.recompute_equity(self.open.values());
    }
}
