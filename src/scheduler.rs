//! Drives the simulator: one re-arming timer around `Simulator::step`, periodic
//! snapshot flushes, operator commands and the local-midnight daily reset.
//!
//! The loop is the only owner of the `Simulator`, so ledger mutations never overlap.
//! The step timer is re-armed after each run with a fresh random delay; stopping the
//! bot disarms it until the next START. Snapshot writes run on the blocking pool, one
//! at a time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::commands::Command;
use crate::engine::{Simulator, StepReport};
use crate::error::SimError;
use crate::state::SnapshotSink;

type SharedSink = Arc<Mutex<Box<dyn SnapshotSink>>>;
type WriteResult = Result<anyhow::Result<()>, JoinError>;

pub struct Scheduler {
    sim: Simulator,
    sink: SharedSink,
    flush_every: Duration,
    day: NaiveDate,
    writing: Option<JoinHandle<anyhow::Result<()>>>,
}

impl Scheduler {
    pub fn new(sim: Simulator, sink: Box<dyn SnapshotSink>, flush_every: Duration) -> Self {
        Self {
            sim,
            sink: Arc::new(Mutex::new(sink)),
            flush_every,
            day: Local::now().date_naive(),
            writing: None,
        }
    }

    /// Run until `Quit` arrives or the command channel closes. Returns the simulator.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Simulator {
        let mut armed = self.sim.is_running();
        let timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(timer);

        let mut flush =
            tokio::time::interval_at(Instant::now() + self.flush_every, self.flush_every);
        flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            running = armed,
            strategy = ?self.sim.strategy().kind,
            flush_every = ?self.flush_every,
            "scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                maybe = commands.recv() => {
                    let Some(cmd) = maybe else { break; };
                    match cmd {
                        Command::Quit => break,
                        Command::Start => {
                            self.sim.start();
                            if !armed {
                                armed = true;
                                timer.as_mut().reset(Instant::now());
                            }
                        }
                        Command::Stop => {
                            self.sim.stop();
                            armed = false;
                        }
                        other => self.handle(other),
                    }
                }

                () = &mut timer, if armed => {
                    self.roll_day();
                    let report = self.sim.step(Utc::now());
                    log_report(&report);
                    if self.sim.is_running() {
                        let delay = self.sim.next_delay();
                        timer.as_mut().reset(Instant::now() + delay);
                    } else {
                        armed = false;
                    }
                }

                done = wait_write(&mut self.writing), if self.writing.is_some() => {
                    self.writing = None;
                    report_write(done);
                }

                _ = flush.tick() => {
                    self.roll_day();
                    self.flush();
                }
            }
        }

        if let Some(h) = self.writing.take() {
            report_write(h.await);
        }
        self.flush();
        if let Some(h) = self.writing.take() {
            report_write(h.await);
        }
        info!("scheduler stopped");
        self.sim
    }

    fn handle(&mut self, cmd: Command) {
        let now = Utc::now();
        match cmd {
            Command::Open { symbol, direction } => {
                match self.sim.execute_trade(&symbol, direction, true, now) {
                    Ok(p) => info!(id = p.id, "manual {} {} accepted", direction, symbol),
                    Err(e) => report_failure("open", &e),
                }
            }
            Command::Close(id) => match self.sim.close_trade(id, now) {
                Ok(t) => info!(id, pnl = t.pnl, "manual close done"),
                Err(e) => report_failure("close", &e),
            },
            Command::Strategy { kind, custom } => {
                if let Err(e) = self.sim.set_strategy(kind, custom) {
                    report_failure("strategy", &e);
                }
            }
            Command::Connect => self.sim.set_connected(true),
            Command::Disconnect => self.sim.set_connected(false),
            Command::ResetDaily => self.sim.reset_daily(),
            Command::Status => self.print_status(),
            Command::Start | Command::Stop | Command::Quit => {}
        }
    }

    fn print_status(&self) {
        let a = self.sim.account_state();
        let p = self.sim.performance();
        info!(
            running = self.sim.is_running(),
            connected = self.sim.is_connected(),
            balance = %format!("{:.2}", a.balance),
            equity = %format!("{:.2}", a.equity),
            daily_pl = %format!("{:.2}", a.daily_pl),
            "account"
        );
        info!(
            trades = p.total_trades,
            win_rate = %format!("{:.1}%", p.win_rate),
            avg_profit = %format!("{:.2}", p.avg_profit),
            avg_loss = %format!("{:.2}", p.avg_loss),
            profit_factor = %format!("{:.2}", p.profit_factor),
            "performance"
        );
        for pos in self.sim.open_positions() {
            info!(
                "#{} {} {} size={} open={} now={} sl={} tp={} pnl={:.2} ({:.3}%)",
                pos.id,
                pos.direction,
                pos.symbol,
                pos.size,
                pos.open_price,
                pos.current_price,
                pos.stop_loss,
                pos.take_profit,
                pos.pnl,
                pos.pnl_percent
            );
        }
    }

    fn roll_day(&mut self) {
        let today = Local::now().date_naive();
        if today != self.day {
            self.day = today;
            self.sim.reset_daily();
        }
    }

    /// Hand a snapshot to the blocking pool. Skipped while the previous write runs.
    fn flush(&mut self) {
        if self.writing.is_some() {
            warn!("previous snapshot write still running, skipping flush");
            return;
        }
        let snap = self.sim.snapshot(Utc::now());
        let sink = Arc::clone(&self.sink);
        self.writing = Some(tokio::task::spawn_blocking(move || {
            let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
            sink.persist(&snap)
        }));
    }
}

async fn wait_write(writing: &mut Option<JoinHandle<anyhow::Result<()>>>) -> WriteResult {
    match writing {
        Some(h) => h.await,
        None => std::future::pending().await,
    }
}

fn report_write(done: WriteResult) {
    match done {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("snapshot save failed: {:#}", e),
        Err(e) => error!("snapshot writer aborted: {e}"),
    }
}

fn report_failure(what: &str, e: &SimError) {
    if e.is_noop() {
        warn!("{what} ignored: {e}");
    } else {
        error!("{what} rejected: {e}");
    }
}

fn log_report(r: &StepReport) {
    if let Some(reason) = &r.skipped {
        info!("origination skipped: {reason}");
    }
    for e in &r.errors {
        warn!("step error: {e}");
    }
    info!(
        ticked = r.ticked,
        opened = r.opened.as_ref().map(|p| p.id),
        closed = r.closed.len(),
        equity = %format!("{:.2}", r.account.equity),
        win_rate = %format!("{:.1}", r.performance.win_rate),
        "step"
    );
}
