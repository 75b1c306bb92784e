//! Simulation context. One `Simulator` is created per session and owns the ledger,
//! price oracle, strategy and random source; nothing here is global.
//!
//! `step` is the cooperative unit of work the scheduler calls on every activation.
//! It never fails: per-position errors are collected in the `StepReport`.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tracing::{error, info, warn};

use crate::account::AccountState;
use crate::config::SimCfg;
use crate::error::{SimError, SimResult};
use crate::ledger::{OpenOrder, PositionLedger};
use crate::market::MarketListProvider;
use crate::oracle::PriceOracle;
use crate::performance::{self, PerformanceSnapshot};
use crate::random::RandomSource;
use crate::risk::{LevelCalculator, RiskSizer};
use crate::state::Snapshot;
use crate::strategy::{CustomParams, ProfileKind, StrategyProfile};
use crate::types::{
    ClosedTrade, Direction, ExitReason, LogEntry, LogLevel, MarketQuote, Position,
};
use crate::utils::{is_valid_symbol, sanitize_symbol};

const MAX_LOGS: usize = 200;

#[derive(Debug, Default)]
pub struct StepReport {
    pub opened: Option<Position>,
    pub closed: Vec<ClosedTrade>,
    pub ticked: usize,
    pub errors: Vec<SimError>,
    /// Why origination was skipped this step, if it was.
    pub skipped: Option<String>,
    pub account: AccountState,
    pub performance: PerformanceSnapshot,
}

pub struct Simulator {
    ledger: PositionLedger,
    oracle: PriceOracle,
    sizer: RiskSizer,
    levels: LevelCalculator,
    strategy: StrategyProfile,
    rng: Box<dyn RandomSource>,
    markets: Box<dyn MarketListProvider>,
    universe: Vec<MarketQuote>,
    running: bool,
    connected: bool,
    trade_probability: f64,
    slippage_pct: f64,
    delay_window: (f64, f64),
    last_auto_open: Option<DateTime<Utc>>,
    logs: VecDeque<LogEntry>,
}

impl Simulator {
    pub fn new(
        cfg: &SimCfg,
        strategy: StrategyProfile,
        markets: Box<dyn MarketListProvider>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            ledger: PositionLedger::new(cfg.initial_balance, cfg.slippage_pct),
            oracle: PriceOracle::new(cfg.fluctuation_pct),
            sizer: RiskSizer::default(),
            levels: LevelCalculator::default(),
            strategy,
            rng,
            markets,
            universe: Vec::new(),
            running: cfg.start_running,
            connected: true,
            trade_probability: cfg.trade_probability,
            slippage_pct: cfg.slippage_pct,
            delay_window: (cfg.min_delay_sec, cfg.max_delay_sec),
            last_auto_open: None,
            logs: VecDeque::new(),
        }
    }

    // ---------- Lifecycle ----------

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.log(LogLevel::Info, "bot started".into());
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.log(LogLevel::Info, "bot stopped".into());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            self.connected = connected;
            let msg = if connected { "session connected" } else { "session lost" };
            self.log(LogLevel::Warn, msg.into());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Replace the active profile wholesale and return the effective values.
    pub fn set_strategy(
        &mut self,
        kind: ProfileKind,
        custom: Option<CustomParams>,
    ) -> SimResult<StrategyProfile> {
        let profile = StrategyProfile::resolve(kind, custom)?;
        self.strategy = profile;
        self.log(
            LogLevel::Info,
            format!(
                "strategy {:?}: risk={}% tp_move={}% break_even={}% interval={}s",
                profile.kind,
                profile.risk_percent,
                profile.tp_move_percent,
                profile.break_even_trigger,
                profile.trade_interval
            ),
        );
        Ok(profile)
    }

    pub fn strategy(&self) -> StrategyProfile {
        self.strategy
    }

    pub fn reset_daily(&mut self) {
        self.ledger.reset_daily();
        self.log(LogLevel::Info, "daily P/L reset".into());
    }

    // ---------- Read accessors ----------

    pub fn open_positions(&self) -> Vec<Position> {
        self.ledger.open_positions()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        self.ledger.closed_trades()
    }

    pub fn account_state(&self) -> AccountState {
        self.ledger.account()
    }

    pub fn performance(&self) -> PerformanceSnapshot {
        performance::compute(self.ledger.closed_trades())
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.iter().cloned().collect()
    }

    // ---------- Mutations ----------

    /// Open a position at the oracle price, sized by the active profile.
    pub fn execute_trade(
        &mut self,
        symbol: &str,
        direction: Direction,
        is_manual: bool,
        now: DateTime<Utc>,
    ) -> SimResult<Position> {
        if !self.connected {
            let e = SimError::NotConnected(format!("cannot open {direction} {symbol}"));
            self.log_at(now, LogLevel::Warn, e.to_string());
            return Err(e);
        }
        let symbol = sanitize_symbol(symbol);
        if !is_valid_symbol(&symbol) {
            return Err(SimError::InvalidInput(format!("malformed symbol '{symbol}'")));
        }
        self.ensure_universe();

        let price = self.oracle.price_for(&symbol, self.rng.as_mut());
        let balance = self.ledger.account().balance;
        let size = self.sizer.size_for(balance, self.strategy.risk_percent);
        if size <= 0.0 {
            return Err(SimError::InvalidInput(format!(
                "no size for balance {balance:.2} at {}% risk",
                self.strategy.risk_percent
            )));
        }
        let (stop_loss, take_profit) = self.levels.levels_for(price, direction);
        let pos = self.ledger.open(
            OpenOrder {
                symbol,
                direction,
                price,
                size,
                stop_loss,
                take_profit,
                manual: is_manual,
            },
            now,
        )?;
        self.log_at(
            now,
            LogLevel::Info,
            format!(
                "opened #{} {} {} size={} @ {} sl={} tp={}{}",
                pos.id,
                pos.direction,
                pos.symbol,
                pos.size,
                pos.open_price,
                pos.stop_loss,
                pos.take_profit,
                if is_manual { " (manual)" } else { "" }
            ),
        );
        Ok(pos)
    }

    /// Close an open position at a fresh oracle price.
    pub fn close_trade(&mut self, id: u64, now: DateTime<Utc>) -> SimResult<ClosedTrade> {
        let symbol = self.ledger.position(id)?.symbol.clone();
        let price = self.oracle.price_for(&symbol, self.rng.as_mut());
        self.close_at(id, price, ExitReason::Manual, now)
    }

    /// One scheduler activation. Inert while stopped.
    pub fn step(&mut self, now: DateTime<Utc>) -> StepReport {
        let mut report = StepReport::default();
        if !self.running {
            report.skipped = Some("bot not running".into());
            report.account = self.account_state();
            report.performance = self.performance();
            return report;
        }

        self.ensure_universe();

        if self.rng.chance(self.trade_probability) {
            match self.originate(now) {
                Ok(Some(p)) => report.opened = Some(p),
                Ok(None) => {}
                Err(e) if e.is_noop() => report.skipped = Some(e.to_string()),
                Err(e) => {
                    self.log_at(now, LogLevel::Error, format!("origination failed: {e}"));
                    report.errors.push(e);
                }
            }
        }

        for id in self.ledger.open_ids() {
            match self.tick_one(id, now) {
                Ok(closed) => {
                    report.ticked += 1;
                    report.closed.extend(closed);
                }
                Err(e) => {
                    self.log_at(now, LogLevel::Error, format!("tick #{id} failed: {e}"));
                    report.errors.push(e);
                }
            }
        }

        report.account = self.account_state();
        report.performance = self.performance();
        report
    }

    /// Randomized re-arm delay within the configured `[min, max)` window.
    pub fn next_delay(&mut self) -> Duration {
        let (lo, hi) = self.delay_window;
        Duration::from_secs_f64(lo + (hi - lo) * self.rng.next_unit())
    }

    // ---------- Snapshot ----------

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let a = self.account_state();
        Snapshot {
            saved_at: now,
            balance: a.balance,
            equity: a.equity,
            daily_pl: a.daily_pl,
            open_positions: self.open_positions(),
            closed_trades: self.closed_trades().to_vec(),
            logs: self.logs(),
            strategy: Some(self.strategy),
        }
    }

    /// Load a saved book. Daily P&L is dropped if the snapshot is from an earlier local day.
    pub fn restore(&mut self, snap: Snapshot, now: DateTime<Utc>) {
        let saved_day = snap.saved_at.with_timezone(&Local).date_naive();
        let stale_day = saved_day != now.with_timezone(&Local).date_naive();
        let account = AccountState {
            balance: snap.balance,
            equity: snap.equity,
            daily_pl: snap.daily_pl,
        };
        self.ledger = PositionLedger::restore(
            account,
            snap.open_positions,
            snap.closed_trades,
            self.slippage_pct,
        );
        if stale_day {
            self.ledger.reset_daily();
        }
        if let Some(s) = snap.strategy {
            self.strategy = s;
        }
        self.logs = snap.logs.into_iter().collect();
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
        info!(
            open = self.ledger.open_ids().len(),
            closed = self.ledger.closed_trades().len(),
            balance = self.ledger.account().balance,
            %saved_day,
            daily_reset = stale_day,
            "snapshot restored"
        );
    }

    // ---------- Internals ----------

    fn ensure_universe(&mut self) {
        if self.universe.is_empty() {
            self.universe = self.markets.markets();
            self.oracle.load_quotes(&self.universe);
            info!(count = self.universe.len(), "market universe refreshed");
        }
    }

    fn originate(&mut self, now: DateTime<Utc>) -> SimResult<Option<Position>> {
        if !self.connected {
            return Err(SimError::NotConnected("skipping trade origination".into()));
        }
        if let Some(last) = self.last_auto_open {
            let spacing = chrono::Duration::seconds(self.strategy.trade_interval as i64);
            if now - last < spacing {
                return Ok(None);
            }
        }
        if self.universe.is_empty() {
            return Ok(None);
        }
        let quote = self.universe[self.rng.pick(self.universe.len())].clone();
        let direction = match quote.signal.bias() {
            Some(d) => d,
            None if self.rng.chance(0.5) => Direction::Buy,
            None => Direction::Sell,
        };
        let pos = self.execute_trade(&quote.symbol, direction, false, now)?;
        self.last_auto_open = Some(now);
        Ok(Some(pos))
    }

    /// Re-price, check exits, then arm break-even for the next tick.
    fn tick_one(&mut self, id: u64, now: DateTime<Utc>) -> SimResult<Option<ClosedTrade>> {
        let symbol = self.ledger.position(id)?.symbol.clone();
        let price = self.oracle.price_for(&symbol, self.rng.as_mut());
        self.ledger.tick(id, price)?;
        if let Some(reason) = self.ledger.evaluate_exit(id)? {
            return self.close_at(id, price, reason, now).map(Some);
        }
        let s = self.strategy;
        if self
            .ledger
            .apply_break_even(id, s.break_even_trigger, s.tp_move_percent)?
        {
            self.log_at(now, LogLevel::Info, format!("#{id} stop moved to break-even"));
        }
        Ok(None)
    }

    fn close_at(
        &mut self,
        id: u64,
        price: f64,
        reason: ExitReason,
        now: DateTime<Utc>,
    ) -> SimResult<ClosedTrade> {
        let trade = self.ledger.close(id, price, reason, now, self.rng.as_mut())?;
        let level = if trade.pnl > 0.0 { LogLevel::Info } else { LogLevel::Warn };
        self.log_at(
            now,
            level,
            format!(
                "closed #{} {} {} @ {} ({:?}) pnl={:.2}",
                id,
                trade.position.direction,
                trade.position.symbol,
                trade.close_price,
                reason,
                trade.pnl
            ),
        );
        Ok(trade)
    }

    fn log(&mut self, level: LogLevel, message: String) {
        self.log_at(Utc::now(), level, message);
    }

    fn log_at(&mut self, time: DateTime<Utc>, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }
        self.logs.push_back(LogEntry {
            time,
            level,
            message,
        });
        if self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}
