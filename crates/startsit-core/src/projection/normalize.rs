// Canonical projection: one point/floor/ceiling per player-week.
//
// Negative or non-finite source values never reach the output. Fantasy points
// are non-negative by convention here, so negative inputs are clamped to zero
// and non-finite ones are dropped as if the source had no data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::config::ProjectionConfig;
use crate::player::{PlayerId, SourceProjection, Week};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Reconciled projection for one player-week.
///
/// Invariant: `0 <= floor <= point <= ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProjection {
    pub point: f64,
    pub floor: f64,
    pub ceiling: f64,
    /// Number of sources that contributed.
    pub sources: usize,
}

impl CanonicalProjection {
    /// Width of the outcome band.
    pub fn volatility(&self) -> f64 {
        self.ceiling - self.floor
    }

    /// The all-zero projection of a player who will not play.
    pub fn zero() -> Self {
        CanonicalProjection {
            point: 0.0,
            floor: 0.0,
            ceiling: 0.0,
            sources: 0,
        }
    }
}

/// No source has data for the player in the target week. The caller decides
/// whether to drop the player or retry with fresher feeds.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("no projection source has data for player {player_id} in {week}")]
pub struct MissingProjectionError {
    pub player_id: PlayerId,
    pub week: Week,
}

// ---------------------------------------------------------------------------
// Input cleaning
// ---------------------------------------------------------------------------

/// A source value after clamping, with its effective low/high outcome.
#[derive(Debug, Clone, Copy)]
struct CleanEntry {
    weight: f64,
    point: f64,
    floor: Option<f64>,
    ceiling: Option<f64>,
}

fn clamp_non_negative(player_id: &PlayerId, source: &str, what: &str, value: f64) -> f64 {
    if value < 0.0 {
        warn!(
            "clamping negative {} {:.2} from source '{}' for player {} to zero",
            what, value, source, player_id
        );
        0.0
    } else {
        value
    }
}

fn clean_band_value(player_id: &PlayerId, source: &str, what: &str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(clamp_non_negative(player_id, source, what, v)),
        Some(_) => {
            warn!("ignoring non-finite {} from source '{}' for player {}", what, source, player_id);
            None
        }
        None => None,
    }
}

/// Keep one entry per source (the latest record wins) and drop unusable ones.
fn clean_entries(
    player_id: &PlayerId,
    projections: &[SourceProjection],
    config: &ProjectionConfig,
) -> BTreeMap<String, CleanEntry> {
    let mut entries: BTreeMap<String, CleanEntry> = BTreeMap::new();
    for proj in projections {
        if !proj.points.is_finite() {
            warn!(
                "skipping non-finite projection from source '{}' for player {}",
                proj.source, player_id
            );
            continue;
        }
        let entry = CleanEntry {
            weight: config.source_weight(&proj.source),
            point: clamp_non_negative(player_id, &proj.source, "projection", proj.points),
            floor: clean_band_value(player_id, &proj.source, "floor", proj.floor),
            ceiling: clean_band_value(player_id, &proj.source, "ceiling", proj.ceiling),
        };
        if entries.insert(proj.source.clone(), entry).is_some() {
            warn!(
                "duplicate projection from source '{}' for player {}, using latest value",
                proj.source, player_id
            );
        }
    }
    entries
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Reconcile every source's projection for one player-week.
///
/// - One source: its value is the point; floor/ceiling come from the source's
///   own band when published, else `floor_factor` / `ceiling_factor` of it.
/// - Several sources: the point is the weighted mean of the sources that
///   reported (absent sources are excluded, not counted as zero); the floor is
///   the lowest low outcome and the ceiling the highest high outcome, where a
///   source without a band contributes its value to both.
pub fn normalize_projection(
    player_id: &PlayerId,
    week: Week,
    projections: &[SourceProjection],
    config: &ProjectionConfig,
) -> Result<CanonicalProjection, MissingProjectionError> {
    let entries = clean_entries(player_id, projections, config);

    let (point, floor, ceiling) = match entries.len() {
        0 => {
            return Err(MissingProjectionError {
                player_id: player_id.clone(),
                week,
            })
        }
        1 => {
            let entry = entries.values().next().copied().ok_or_else(|| MissingProjectionError {
                player_id: player_id.clone(),
                week,
            })?;
            let floor = entry.floor.unwrap_or(entry.point * config.floor_factor);
            let ceiling = entry.ceiling.unwrap_or(entry.point * config.ceiling_factor);
            (entry.point, floor, ceiling)
        }
        _ => {
            let total_weight: f64 = entries.values().map(|e| e.weight).sum();
            let point = entries.values().map(|e| e.weight * e.point).sum::<f64>() / total_weight;
            let floor = entries
                .values()
                .map(|e| e.floor.unwrap_or(e.point))
                .fold(f64::INFINITY, f64::min);
            let ceiling = entries
                .values()
                .map(|e| e.ceiling.unwrap_or(e.point))
                .fold(f64::NEG_INFINITY, f64::max);
            (point, floor, ceiling)
        }
    };

    // A source band that does not bracket the point is widened to do so.
    Ok(CanonicalProjection {
        point,
        floor: floor.max(0.0).min(point),
        ceiling: ceiling.max(point),
        sources: entries.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
