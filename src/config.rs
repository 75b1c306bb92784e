//! Load and validate runtime configuration.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::market::default_markets;
use crate::strategy::{CustomParams, ProfileKind, StrategyProfile};
use crate::types::MarketQuote;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    pub initial_balance: f64,
    pub fluctuation_pct: f64, // +/- percent of reference per price draw
    pub slippage_pct: f64,    // +/- percent of open price at close
    pub trade_probability: f64,
    pub min_delay_sec: f64,
    pub max_delay_sec: f64,
    pub seed: Option<u64>,
    pub start_running: bool,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            fluctuation_pct: 0.1,
            slippage_pct: 0.005,
            trade_probability: 0.3,
            min_delay_sec: 5.0,
            max_delay_sec: 15.0,
            seed: None,
            start_running: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyCfg {
    pub profile: ProfileKind,
    pub custom: Option<CustomParams>,
}

impl Default for StrategyCfg {
    fn default() -> Self {
        Self {
            profile: ProfileKind::Balanced,
            custom: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StateCfg {
    pub path: String, // empty -> platform data dir
    pub flush_interval_sec: u64,
}

impl Default for StateCfg {
    fn default() -> Self {
        Self {
            path: String::new(),
            flush_interval_sec: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub sim: SimCfg,
    pub strategy: StrategyCfg,
    pub state: StateCfg,
    pub markets: Vec<MarketQuote>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sim: SimCfg::default(),
            strategy: StrategyCfg::default(),
            state: StateCfg::default(),
            markets: default_markets(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read config {}", path.as_ref().display()))?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let mut cfg: Self = serde_yaml::from_str(s)?;
        if cfg.markets.is_empty() {
            cfg.markets = default_markets();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.sim;
        if !(s.initial_balance > 0.0) {
            bail!("sim.initial_balance must be positive");
        }
        if !(0.0..=1.0).contains(&s.trade_probability) {
            bail!("sim.trade_probability must be within [0, 1]");
        }
        if !(s.min_delay_sec > 0.0 && s.min_delay_sec < s.max_delay_sec) {
            bail!(
                "sim delay window [{}, {}) is empty",
                s.min_delay_sec,
                s.max_delay_sec
            );
        }
        if s.fluctuation_pct < 0.0 || s.slippage_pct < 0.0 {
            bail!("sim.fluctuation_pct and sim.slippage_pct must be >= 0");
        }
        if self.state.flush_interval_sec == 0 {
            bail!("state.flush_interval_sec must be > 0");
        }
        self.strategy_profile()?;
        Ok(())
    }

    pub fn strategy_profile(&self) -> anyhow::Result<StrategyProfile> {
        StrategyProfile::resolve(self.strategy.profile, self.strategy.custom)
            .context("invalid strategy section")
    }

    /// Configured snapshot path, or `<data dir>/snapshot.json`.
    pub fn state_path(&self) -> PathBuf {
        if !self.state.path.trim().is_empty() {
            return PathBuf::from(&self.state.path);
        }
        directories::ProjectDirs::from("", "", "paper-fx-sim")
            .map(|d| d.data_dir().join("snapshot.json"))
            .unwrap_or_else(|| PathBuf::from("data/snapshot.json"))
    }
}
