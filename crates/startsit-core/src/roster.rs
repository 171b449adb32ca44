// Lineup slot construction from league roster settings.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LeagueConfig;
use crate::player::{Player, PlayerId, Position, ALL_POSITIONS};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// The lineup definition or roster cannot be optimized as given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InconsistentRosterError {
    #[error("lineup has no slots to fill")]
    NoSlots,

    #[error("roster slot '{slot}' has no eligible positions")]
    EmptyEligibility { slot: String },

    #[error("unknown roster position key '{key}'")]
    UnknownSlotKey { key: String },

    #[error("unknown position '{position}' in slot '{slot}'")]
    UnknownPosition { slot: String, position: String },

    #[error("duplicate slot name '{slot}'")]
    DuplicateSlot { slot: String },

    #[error("player '{player}' appears more than once in the roster")]
    DuplicatePlayer { player: PlayerId },

    #[error("player '{player}' is not eligible at their primary position {position}")]
    PrimaryNotEligible { player: PlayerId, position: Position },
}

// ---------------------------------------------------------------------------
// RosterSlot
// ---------------------------------------------------------------------------

/// A named lineup slot filled by exactly one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub name: String,
    pub eligible: BTreeSet<Position>,
}

impl RosterSlot {
    pub fn new(name: impl Into<String>, eligible: impl IntoIterator<Item = Position>) -> Self {
        RosterSlot {
            name: name.into(),
            eligible: eligible.into_iter().collect(),
        }
    }

    /// Whether more than one position may fill this slot.
    pub fn is_flex(&self) -> bool {
        self.eligible.len() > 1
    }

    pub fn accepts_any(&self, positions: &BTreeSet<Position>) -> bool {
        positions.iter().any(|p| self.eligible.contains(p))
    }
}

impl fmt::Display for RosterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eligible: Vec<&str> = self.eligible.iter().map(|p| p.display_str()).collect();
        write!(f, "{} [{}]", self.name, eligible.join("/"))
    }
}

// ---------------------------------------------------------------------------
// Roster key mapping
// ---------------------------------------------------------------------------

/// What a league roster key contributes to the lineup.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotKey {
    Lineup(Vec<Position>),
    /// Bench and injured reserve hold players but never score.
    NonScoring,
}

/// Map a league roster key (e.g. "RB", "FLEX", "W/R/T", "BN") to the
/// positions it accepts.
fn parse_slot_key(key: &str) -> Option<SlotKey> {
    use Position::*;

    let upper = key.trim().to_uppercase();
    if let Some(pos) = Position::from_str_pos(&upper) {
        return Some(SlotKey::Lineup(vec![pos]));
    }
    match upper.as_str() {
        "BN" | "BE" | "BENCH" | "IR" | "IL" | "INJURED" => Some(SlotKey::NonScoring),
        "FLEX" | "W/R/T" | "RB/WR/TE" => {
            Some(SlotKey::Lineup(vec![RunningBack, WideReceiver, TightEnd]))
        }
        "SUPERFLEX" | "OP" | "Q/W/R/T" | "QB/RB/WR/TE" => Some(SlotKey::Lineup(vec![
            Quarterback,
            RunningBack,
            WideReceiver,
            TightEnd,
        ])),
        "W/R" | "RB/WR" => Some(SlotKey::Lineup(vec![RunningBack, WideReceiver])),
        "W/T" | "WR/TE" => Some(SlotKey::Lineup(vec![WideReceiver, TightEnd])),
        _ => None,
    }
}

/// Deterministic slot ordering: single-position slots in position order,
/// then flexible slots from narrowest to widest.
fn slot_sort_key(slot: &RosterSlot) -> (usize, usize, String) {
    let first = slot
        .eligible
        .iter()
        .next()
        .and_then(|p| ALL_POSITIONS.iter().position(|q| q == p))
        .unwrap_or(usize::MAX);
    (slot.eligible.len(), first, slot.name.clone())
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Expand the league roster map into concrete lineup slots.
///
/// Counts above one produce numbered slots (`RB1`, `RB2`). Bench and reserve
/// keys produce nothing. Custom slots are appended in declaration order.
pub fn slots_from_league(league: &LeagueConfig) -> Result<Vec<RosterSlot>, InconsistentRosterError> {
    let mut slots: Vec<RosterSlot> = Vec::new();

    for (key, &count) in &league.roster {
        let positions = match parse_slot_key(key) {
            Some(SlotKey::Lineup(positions)) => positions,
            Some(SlotKey::NonScoring) => continue,
            None => {
                return Err(InconsistentRosterError::UnknownSlotKey { key: key.clone() });
            }
        };
        let base = key.trim().to_uppercase();
        for i in 0..count {
            let name = if count > 1 {
                format!("{}{}", base, i + 1)
            } else {
                base.clone()
            };
            slots.push(RosterSlot::new(name, positions.iter().copied()));
        }
    }

    slots.sort_by_key(slot_sort_key);

    for custom in &league.custom_slots {
        let mut eligible = BTreeSet::new();
        for raw in &custom.eligible {
            let pos = Position::from_str_pos(raw).ok_or_else(|| {
                InconsistentRosterError::UnknownPosition {
                    slot: custom.name.clone(),
                    position: raw.clone(),
                }
            })?;
            eligible.insert(pos);
        }
        slots.push(RosterSlot {
            name: custom.name.clone(),
            eligible,
        });
    }

    validate_slots(&slots)?;
    Ok(slots)
}

/// Reject lineup definitions that cannot produce a legal assignment.
pub fn validate_slots(slots: &[RosterSlot]) -> Result<(), InconsistentRosterError> {
    if slots.is_empty() {
        return Err(InconsistentRosterError::NoSlots);
    }
    let mut names = BTreeSet::new();
    for slot in slots {
        if slot.eligible.is_empty() {
            return Err(InconsistentRosterError::EmptyEligibility {
                slot: slot.name.clone(),
            });
        }
        if !names.insert(slot.name.as_str()) {
            return Err(InconsistentRosterError::DuplicateSlot {
                slot: slot.name.clone(),
            });
        }
    }
    Ok(())
}

/// Reject rosters listing the same player twice, or a player whose eligible
/// set leaves out their primary position.
pub fn validate_players(players: &[Player]) -> Result<(), InconsistentRosterError> {
    let mut seen = BTreeSet::new();
    for player in players {
        if !seen.insert(&player.id) {
            return Err(InconsistentRosterError::DuplicatePlayer {
                player: player.id.clone(),
            });
        }
        if !player.eligible_positions.contains(&player.primary_position) {
            return Err(InconsistentRosterError::PrimaryNotEligible {
                player: player.id.clone(),
                position: player.primary_position,
            });
        }
    }
    Ok(())
}
