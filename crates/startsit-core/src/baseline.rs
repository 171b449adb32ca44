// Positional baselines.
//
// Converts raw adjusted points into a position-relative score by subtracting
// a per-position baseline, so that flexible slots compare a running back and
// a tight end on the same footing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::BaselineMethod;
use crate::player::{Availability, Position, ALL_POSITIONS};
use crate::roster::RosterSlot;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One player's contribution to their position's pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolEntry {
    pub position: Position,
    pub value: f64,
    pub availability: Availability,
}

/// Reference score for a position in the current optimization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionBaseline {
    pub position: Position,
    pub baseline: f64,
    /// Active players the baseline was computed from.
    pub pool_size: usize,
}

/// Baselines for every position, recomputed per optimization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    pub by_position: BTreeMap<Position, PositionBaseline>,
}

impl Baselines {
    /// Baseline for `position`; positions with no active pool use zero.
    pub fn baseline(&self, position: Position) -> f64 {
        self.by_position
            .get(&position)
            .map(|b| b.baseline)
            .unwrap_or(0.0)
    }

    /// Position-relative score. Difference normalization is used everywhere,
    /// so raising `value` never lowers the result.
    pub fn normalized(&self, position: Position, value: f64) -> f64 {
        value - self.baseline(position)
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

fn median(sorted_desc: &[f64]) -> f64 {
    let n = sorted_desc.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted_desc[n / 2]
    } else {
        (sorted_desc[n / 2 - 1] + sorted_desc[n / 2]) / 2.0
    }
}

/// Number of single-position slots dedicated to `pos`.
fn dedicated_slots(slots: &[RosterSlot], pos: Position) -> usize {
    slots
        .iter()
        .filter(|s| !s.is_flex() && s.eligible.contains(&pos))
        .count()
}

/// Replacement level: the best player who would not start in a dedicated
/// slot, i.e. index `starters` of the descending pool. If the pool cannot
/// fill every dedicated slot the replacement is an empty slot, worth zero.
fn replacement(sorted_desc: &[f64], starters: usize) -> f64 {
    sorted_desc.get(starters).copied().unwrap_or(0.0)
}

/// Compute the baseline of every position from the active pool.
///
/// Players on bye or out are excluded, so a shared bye week never drags a
/// position's baseline toward zero.
pub fn compute_baselines(
    pool: &[PoolEntry],
    slots: &[RosterSlot],
    method: BaselineMethod,
) -> Baselines {
    let mut by_position = BTreeMap::new();

    for &pos in ALL_POSITIONS {
        let mut values: Vec<f64> = pool
            .iter()
            .filter(|e| e.position == pos && e.availability.is_playable())
            .map(|e| e.value)
            .collect();
        values.sort_by(|a, b| b.total_cmp(a));

        let baseline = match method {
            BaselineMethod::Median => median(&values),
            BaselineMethod::Replacement => replacement(&values, dedicated_slots(slots, pos)),
        };

        by_position.insert(
            pos,
            PositionBaseline {
                position: pos,
                baseline,
                pool_size: values.len(),
            },
        );
    }

    Baselines { by_position }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
