//! Named strategy profiles. A profile change replaces every parameter at once.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Safe,
    Balanced,
    Aggressive,
    Custom,
}

impl std::str::FromStr for ProfileKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => Ok(ProfileKind::Safe),
            "balanced" => Ok(ProfileKind::Balanced),
            "aggressive" => Ok(ProfileKind::Aggressive),
            "custom" => Ok(ProfileKind::Custom),
            other => Err(SimError::InvalidInput(format!("unknown profile '{other}'"))),
        }
    }
}

/// Numeric overrides for the custom profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CustomParams {
    pub risk_percent: f64,
    pub tp_move_percent: f64,
    pub break_even_trigger: f64,
    pub trade_interval: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StrategyProfile {
    pub kind: ProfileKind,
    /// Percent of balance risked per trade.
    pub risk_percent: f64,
    /// Percent of open price the target moves out once break-even fires.
    pub tp_move_percent: f64,
    /// `pnl_percent` at which the stop moves to the open price.
    pub break_even_trigger: f64,
    /// Minimum seconds between automatic originations.
    pub trade_interval: u64,
}

impl StrategyProfile {
    pub fn safe() -> Self {
        Self {
            kind: ProfileKind::Safe,
            risk_percent: 1.0,
            tp_move_percent: 0.3,
            break_even_trigger: 0.10,
            trade_interval: 15,
        }
    }

    pub fn balanced() -> Self {
        Self {
            kind: ProfileKind::Balanced,
            risk_percent: 2.0,
            tp_move_percent: 0.5,
            break_even_trigger: 0.15,
            trade_interval: 10,
        }
    }

    pub fn aggressive() -> Self {
        Self {
            kind: ProfileKind::Aggressive,
            risk_percent: 3.5,
            tp_move_percent: 0.8,
            break_even_trigger: 0.20,
            trade_interval: 5,
        }
    }

    pub fn custom(p: CustomParams) -> SimResult<Self> {
        let ok = |v: f64| v > 0.0 && v.is_finite();
        if !ok(p.risk_percent) || !ok(p.tp_move_percent) || !ok(p.break_even_trigger) {
            return Err(SimError::InvalidInput(format!(
                "custom profile values must be positive: {p:?}"
            )));
        }
        if p.risk_percent > 100.0 {
            return Err(SimError::InvalidInput(format!(
                "risk_percent {} exceeds 100",
                p.risk_percent
            )));
        }
        if p.trade_interval == 0 {
            return Err(SimError::InvalidInput("trade_interval must be > 0".into()));
        }
        Ok(Self {
            kind: ProfileKind::Custom,
            risk_percent: p.risk_percent,
            tp_move_percent: p.tp_move_percent,
            break_even_trigger: p.break_even_trigger,
            trade_interval: p.trade_interval,
        })
    }

    /// Resolve a profile by kind. `Custom` requires overrides.
    pub fn resolve(kind: ProfileKind, custom: Option<CustomParams>) -> SimResult<Self> {
        match kind {
            ProfileKind::Safe => Ok(Self::safe()),
            ProfileKind::Balanced => Ok(Self::balanced()),
            ProfileKind::Aggressive => Ok(Self::aggressive()),
            ProfileKind::Custom => {
                let p = custom.ok_or_else(|| {
                    SimError::InvalidInput("custom profile needs numeric overrides".into())
                })?;
                Self::custom(p)
            }
        }
    }
}

impl Default for StrategyProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_distinct_and_ordered_by_risk() {
        let (s, b, a) = (
            StrategyProfile::safe(),
            StrategyProfile::balanced(),
            StrategyProfile::aggressive(),
        );
        assert!(s.risk_percent < b.risk_percent && b.risk_percent < a.risk_percent);
        assert!(s.trade_interval > a.trade_interval);
    }

    #[test]
    fn parses_kind_case_insensitively() {
        assert_eq!("SAFE".parse::<ProfileKind>().unwrap(), ProfileKind::Safe);
        assert_eq!(" Aggressive ".parse::<ProfileKind>().unwrap(), ProfileKind::Aggressive);
        assert!("yolo".parse::<ProfileKind>().is_err());
    }

    #[test]
    fn custom_requires_params() {
        let err = StrategyProfile::resolve(ProfileKind::Custom, None).unwrap_err();
        assert!(matches!(err, SimError::InvalidInput(_)));
    }

    #[test]
    fn custom_replaces_every_field() {
        let p = CustomParams {
            risk_percent: 1.25,
            tp_move_percent: 0.4,
            break_even_trigger: 0.05,
            trade_interval: 8,
        };
        let prof = StrategyProfile::resolve(ProfileKind::Custom, Some(p)).unwrap();
        assert_eq!(prof.kind, ProfileKind::Custom);
        assert_eq!(prof.risk_percent, 1.25);
        assert_eq!(prof.tp_move_percent, 0.4);
        assert_eq!(prof.break_even_trigger, 0.05);
        assert_eq!(prof.trade_interval, 8);
    }

    #[test]
    fn custom_rejects_bad_values() {
        let base = CustomParams {
            risk_percent: 1.0,
            tp_move_percent: 0.4,
            break_even_trigger: 0.1,
            trade_interval: 8,
        };
        assert!(StrategyProfile::custom(CustomParams { risk_percent: 0.0, ..base }).is_err());
        assert!(StrategyProfile::custom(CustomParams { risk_percent: 150.0, ..base }).is_err());
        assert!(StrategyProfile::custom(CustomParams { tp_move_percent: -1.0, ..base }).is_err());
        assert!(StrategyProfile::custom(CustomParams { trade_interval: 0, ..base }).is_err());
    }

    #[test]
    fn preset_ignores_custom_overrides() {
        let p = CustomParams {
            risk_percent: 9.0,
            tp_move_percent: 9.0,
            break_even_trigger: 9.0,
            trade_interval: 99,
        };
        let prof = StrategyProfile::resolve(ProfileKind::Safe, Some(p)).unwrap();
        assert_eq!(prof, StrategyProfile::safe());
    }
}
