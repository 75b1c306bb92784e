//! Entry point. Wires config -> Simulator -> Scheduler, with stdin commands and JSON snapshots.

mod account;
mod commands;
mod config;
mod engine;
mod error;
mod ledger;
mod market;
mod oracle;
mod performance;
mod random;
mod risk;
mod scheduler;
mod state;
mod strategy;
mod types;
mod utils;

use dotenvy::dotenv;
use std::{path::Path, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::commands::{parse_command, Command};
use crate::engine::Simulator;
use crate::market::StaticMarkets;
use crate::random::SeededRandom;
use crate::scheduler::Scheduler;
use crate::state::JsonFileSink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    // Load config (missing file -> defaults)
    let cfg_path = std::env::var("SIM_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let mut cfg = if Path::new(&cfg_path).exists() {
        config::AppConfig::load(&cfg_path)?
    } else {
        warn!("{} not found, using built-in defaults", cfg_path);
        config::AppConfig::default()
    };
    if let Some(seed) = std::env::var("SIM_SEED").ok().and_then(|s| s.parse().ok()) {
        cfg.sim.seed = Some(seed);
    }
    cfg.validate()?;

    // Simulator context for this session
    let mut sim = Simulator::new(
        &cfg.sim,
        cfg.strategy_profile()?,
        Box::new(StaticMarkets::new(cfg.markets.clone())),
        Box::new(SeededRandom::new(cfg.sim.seed)),
    );

    let sink = JsonFileSink::new(cfg.state_path());
    match sink.load() {
        Ok(Some(snap)) => sim.restore(snap, chrono::Utc::now()),
        Ok(None) => info!("no snapshot at {}, starting fresh", sink.path().display()),
        Err(e) => {
            error!("snapshot unusable: {:#}", e);
            let bad = sink.set_aside()?;
            warn!("moved unreadable snapshot to {}, starting fresh", bad.display());
        }
    }

    info!(
        "Simulator ready. Balance={:.2}, Strategy={:?}, Seed={:?}, Snapshot={}, FlushEvery={}s",
        sim.account_state().balance,
        sim.strategy().kind,
        cfg.sim.seed,
        sink.path().display(),
        cfg.state.flush_interval_sec
    );

    // stdin + Ctrl-C -> command channel
    let (tx, rx) = tokio::sync::mpsc::channel::<Command>(64);
    let stdin_handle = tokio::spawn({
        let tx = tx.clone();
        async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_command(&line) {
                        Some(cmd) => {
                            if tx.send(cmd).await.is_err() {
                                break;
                            }
                        }
                        None if line.trim().is_empty() => {}
                        None => warn!("Unrecognized command: {}", line.trim()),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        error!("stdin read error: {:#}", e);
                        break;
                    }
                }
            }
        }
    });
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            let _ = tx.send(Command::Quit).await;
        }
    });

    let flush_every = Duration::from_secs(cfg.state.flush_interval_sec);
    let sim = Scheduler::new(sim, Box::new(sink), flush_every).run(rx).await;

    stdin_handle.abort();
    let a = sim.account_state();
    let p = sim.performance();
    info!(
        "Session closed. Balance={:.2}, Equity={:.2}, Trades={}, WinRate={:.1}%, ProfitFactor={:.2}",
        a.balance, a.equity, p.total_trades, p.win_rate, p.profit_factor
    );
    Ok(())
}
