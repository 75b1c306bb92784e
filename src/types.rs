//! Core domain types for simulated positions, closed trades, markets and activity logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for BUY, -1 for SELL.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }

    #[cfg(test)]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Why a position left the book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Manual,
}

/// Opaque direction hint attached to a market quote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SignalClass {
    Bullish,
    Bearish,
    Oversold,
    Overbought,
    #[default]
    Neutral,
}

impl SignalClass {
    /// Direction bias, `None` when the hint is neutral.
    pub fn bias(self) -> Option<Direction> {
        match self {
            SignalClass::Bullish | SignalClass::Oversold => Some(Direction::Buy),
            SignalClass::Bearish | SignalClass::Overbought => Some(Direction::Sell),
            SignalClass::Neutral => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketQuote {
    pub symbol: String,
    pub reference_price: f64,
    #[serde(default)]
    pub signal: SignalClass,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: u64,
    pub symbol: String,
    pub direction: Direction,
    pub open_price: f64,
    pub current_price: f64,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub open_time: DateTime<Utc>,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub status: PositionStatus,
    /// Opened by an operator rather than the scheduler.
    #[serde(default)]
    pub manual: bool,
    /// Stop already moved to the open price.
    #[serde(default)]
    pub break_even_applied: bool,
}

/// Immutable record of a finished position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedTrade {
    pub position: Position,
    pub close_price: f64,
    pub close_time: DateTime<Utc>,
    pub pnl: f64,
    pub reason: ExitReason,
}

impl ClosedTrade {
    pub fn id(&self) -> u64 {
        self.position.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}
