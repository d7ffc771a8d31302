// =============================================================================
// Shared types used across the Ridgeline scanner
// =============================================================================

use serde::{Deserialize, Serialize};

/// Direction of a detected signal or pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}

/// Whether a price level sits below (support) or above (resistance) the
/// current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelKind {
    Support,
    Resistance,
}

impl std::fmt::Display for LevelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Support => write!(f, "Support"),
            Self::Resistance => write!(f, "Resistance"),
        }
    }
}

/// A single horizontal price level tagged relative to the last close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub kind: LevelKind,
}
