//! Parse operator commands from stdin lines.
//! Supported: START, STOP, BUY/SELL <symbol>, CLOSE <id>, STATUS,
//! STRATEGY <profile> [risk tp_move break_even interval], CONNECT, DISCONNECT,
//! RESET DAILY, QUIT.

use regex::Regex;
use std::sync::OnceLock;

use crate::strategy::{CustomParams, ProfileKind};
use crate::types::Direction;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Open { symbol: String, direction: Direction },
    Close(u64),
    Status,
    Strategy { kind: ProfileKind, custom: Option<CustomParams> },
    Connect,
    Disconnect,
    ResetDaily,
    Quit,
}

fn re_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(BUY|SELL)\s+([A-Z0-9/._-]{3,12})$").expect("static regex"))
}

fn re_close() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^CLOSE\s+#?(\d+)$").expect("static regex"))
}

fn re_strategy() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^STRATEGY\s+(SAFE|BALANCED|AGGRESSIVE|CUSTOM)(?:\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+(\d+))?$",
        )
        .expect("static regex")
    })
}

pub fn parse_command(text: &str) -> Option<Command> {
    let t = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if t.is_empty() {
        return None;
    }

    match t.to_ascii_uppercase().as_str() {
        "START" => return Some(Command::Start),
        "STOP" => return Some(Command::Stop),
        "STATUS" => return Some(Command::Status),
        "CONNECT" => return Some(Command::Connect),
        "DISCONNECT" => return Some(Command::Disconnect),
        "RESET DAILY" => return Some(Command::ResetDaily),
        "QUIT" | "EXIT" => return Some(Command::Quit),
        _ => {}
    }

    if let Some(c) = re_open().captures(&t) {
        let direction = match &c[1].to_ascii_uppercase()[..] {
            "BUY" => Direction::Buy,
            "SELL" => Direction::Sell,
            _ => return None,
        };
        return Some(Command::Open {
            symbol: c[2].to_uppercase(),
            direction,
        });
    }

    if let Some(c) = re_close().captures(&t) {
        return Some(Command::Close(c[1].parse().ok()?));
    }

    if let Some(c) = re_strategy().captures(&t) {
        let kind: ProfileKind = c[1].parse().ok()?;
        let custom = match (c.get(2), c.get(3), c.get(4), c.get(5)) {
            (Some(r), Some(tp), Some(be), Some(iv)) => Some(CustomParams {
                risk_percent: r.as_str().parse().ok()?,
                tp_move_percent: tp.as_str().parse().ok()?,
                break_even_trigger: be.as_str().parse().ok()?,
                trade_interval: iv.as_str().parse().ok()?,
            }),
            _ => None,
        };
        return Some(Command::Strategy { kind, custom });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn must_parse(s: &str) -> Command {
        parse_command(s).unwrap_or_else(|| panic!("should parse: {s}"))
    }

    #[test]
    fn bare_keywords() {
        assert_eq!(must_parse("start"), Command::Start);
        assert_eq!(must_parse("  STOP "), Command::Stop);
        assert_eq!(must_parse("Status"), Command::Status);
        assert_eq!(must_parse("disconnect"), Command::Disconnect);
        assert_eq!(must_parse("reset   daily"), Command::ResetDaily);
        assert_eq!(must_parse("exit"), Command::Quit);
    }

    #[test]
    fn open_commands_uppercase_symbol() {
        assert_eq!(
            must_parse("buy eurusd"),
            Command::Open { symbol: "EURUSD".into(), direction: Direction::Buy }
        );
        assert_eq!(
            must_parse("SELL USD/JPY"),
            Command::Open { symbol: "USD/JPY".into(), direction: Direction::Sell }
        );
    }

    #[test]
    fn close_accepts_hash_prefix() {
        assert_eq!(must_parse("close 12"), Command::Close(12));
        assert_eq!(must_parse("CLOSE #7"), Command::Close(7));
        assert!(parse_command("close x").is_none());
    }

    #[test]
    fn strategy_presets_and_custom() {
        assert_eq!(
            must_parse("strategy safe"),
            Command::Strategy { kind: ProfileKind::Safe, custom: None }
        );
        assert_eq!(
            must_parse("STRATEGY custom 1.5 0.4 0.1 20"),
            Command::Strategy {
                kind: ProfileKind::Custom,
                custom: Some(CustomParams {
                    risk_percent: 1.5,
                    tp_move_percent: 0.4,
                    break_even_trigger: 0.1,
                    trade_interval: 20,
                }),
            }
        );
    }

    #[test]
    fn garbage_is_ignored() {
        assert!(parse_command("").is_none());
        assert!(parse_command("hello world").is_none());
        assert!(parse_command("buy").is_none());
        assert!(parse_command("buy EURUSD now").is_none());
        assert!(parse_command("strategy yolo").is_none());
        assert!(parse_command("strategy custom 1.5 0.4").is_none());
    }
}
