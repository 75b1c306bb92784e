//! Persisted simulator snapshot and the sink it is flushed to.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::strategy::StrategyProfile;
use crate::types::{ClosedTrade, LogEntry, Position};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub saved_at: DateTime<Utc>,
    pub balance: f64,
    pub equity: f64,
    pub daily_pl: f64,
    pub open_positions: Vec<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub strategy: Option<StrategyProfile>,
}

/// Receives full snapshots on a fixed interval. Failures are the caller's to log.
pub trait SnapshotSink: Send {
    fn persist(&mut self, snapshot: &Snapshot) -> anyhow::Result<()>;
}

pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previously saved snapshot. `Ok(None)` only when no file exists; a file that
    /// cannot be read or parsed is an error so it never gets silently overwritten.
    pub fn load(&self) -> anyhow::Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read snapshot {}", self.path.display()))?;
        let snap = serde_json::from_str(&s)
            .with_context(|| format!("parse snapshot {}", self.path.display()))?;
        Ok(Some(snap))
    }

    /// Rename an unreadable snapshot to `<name>.bad` and return the new path.
    pub fn set_aside(&self) -> anyhow::Result<PathBuf> {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bad");
        let bad = PathBuf::from(name);
        fs::rename(&self.path, &bad)
            .with_context(|| format!("move {} aside", self.path.display()))?;
        Ok(bad)
    }
}

impl SnapshotSink for JsonFileSink {
    fn persist(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, s)?;
        Ok(())
    }
}

/// Keeps every snapshot in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    pub saved: std::sync::Arc<std::sync::Mutex<Vec<Snapshot>>>,
}

#[cfg(test)]
impl SnapshotSink for MemorySink {
    fn persist(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        if let Ok(mut v) = self.saved.lock() {
            v.push(snapshot.clone());
        }
        Ok(())
    }
}
