// Strategy policy: risk posture -> single ranking score.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::StrategyWeights;
use crate::recency::AdjustedProjection;

/// Risk posture selected once per optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Protect the downside: weight the floor.
    Conservative,
    /// Chase upside: weight the ceiling.
    Aggressive,
    #[default]
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid strategy '{0}': expected one of conservative, aggressive, balanced")]
pub struct InvalidStrategyError(pub String);

impl FromStr for Strategy {
    type Err = InvalidStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" | "safe" | "floor" => Ok(Strategy::Conservative),
            "aggressive" | "upside" | "ceiling" => Ok(Strategy::Aggressive),
            "balanced" | "default" => Ok(Strategy::Balanced),
            _ => Err(InvalidStrategyError(s.to_string())),
        }
    }
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Conservative => "conservative",
            Strategy::Aggressive => "aggressive",
            Strategy::Balanced => "balanced",
        }
    }

    /// Ranking score for a player. Total over every input; the behavioral
    /// flag is not consulted.
    pub fn score(&self, point: f64, floor: f64, ceiling: f64, weights: &StrategyWeights) -> f64 {
        match self {
            Strategy::Conservative => {
                let w = weights.conservative_floor_weight;
                w * floor + (1.0 - w) * point
            }
            Strategy::Aggressive => {
                let w = weights.aggressive_ceiling_weight;
                (1.0 - w) * point + w * ceiling
            }
            Strategy::Balanced => point,
        }
    }

    pub fn score_projection(&self, adjusted: &AdjustedProjection, weights: &StrategyWeights) -> f64 {
        self.score(adjusted.adjusted_point, adjusted.floor(), adjusted.ceiling(), weights)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
