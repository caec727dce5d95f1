use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The direction of a position. Serialized in the gateway's wire form
/// (`"LONG"` / `"SHORT"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Returns the opposite side of the position
    pub fn opposite(&self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for PositionSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(PositionSide::Long),
            "SHORT" => Ok(PositionSide::Short),
            _ => Err(CoreError::InvalidInput("side".to_string(), s.to_string())),
        }
    }
}

/// The margin assignment mode for a submitted leg. The gateway expects the
/// exchange's own spelling, hence `"CROSSED"` rather than `"CROSS"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginMode {
    #[serde(rename = "ISOLATED")]
    Isolated,
    #[serde(rename = "CROSSED")]
    Cross,
}

impl fmt::Display for MarginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginMode::Isolated => write!(f, "ISOLATED"),
            MarginMode::Cross => write!(f, "CROSSED"),
        }
    }
}

impl FromStr for MarginMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ISOLATED" => Ok(MarginMode::Isolated),
            "CROSS" | "CROSSED" => Ok(MarginMode::Cross),
            _ => Err(CoreError::InvalidInput(
                "margin mode".to_string(),
                s.to_string(),
            )),
        }
    }
}

/// The delivery mechanism that keeps the position monitor's valuation data
/// fresh. Exactly one strategy is live per watching session, chosen at
/// session start and never mixed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStrategy {
    /// One WebSocket subscription delivering a snapshot plus per-symbol ticks.
    Push,
    /// A fixed-interval full-snapshot fetch loop.
    Poll,
}

impl fmt::Display for FeedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStrategy::Push => write!(f, "push"),
            FeedStrategy::Poll => write!(f, "poll"),
        }
    }
}

impl FromStr for FeedStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(FeedStrategy::Push),
            "poll" => Ok(FeedStrategy::Poll),
            _ => Err(CoreError::InvalidInput(
                "feed strategy".to_string(),
                s.to_string(),
            )),
        }
    }
}
