// Recommended lineup changes: diff the caller's current lineup against the
// optimized one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::engine::{OptimizationReport, PlayerReport};
use crate::player::{Availability, PlayerId};
use crate::recency::BehaviorFlag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// Player enters the lineup.
    Start,
    /// Player leaves the lineup.
    Bench,
    /// Player stays in the lineup but changes slot.
    Move,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupChange {
    pub player_id: PlayerId,
    pub action: ChangeAction,
    /// Slot the player currently occupies, if any.
    pub from_slot: Option<String>,
    /// Recommended slot, if any.
    pub to_slot: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupChanges {
    pub changes: Vec<LineupChange>,
    pub changes_needed: bool,
}

fn start_reason(player: Option<&PlayerReport>) -> String {
    match player {
        Some(p) => format!(
            "projected {:.1} pts ({}), score {:+.2}",
            p.projection.adjusted_point,
            p.flag(),
            p.ranking_score
        ),
        None => "recommended starter".to_string(),
    }
}

fn bench_reason(player: Option<&PlayerReport>) -> String {
    match player {
        None => "no projection for this week".to_string(),
        Some(p) => match p.availability {
            Availability::Bye => "on bye".to_string(),
            Availability::Out => "ruled out".to_string(),
            Availability::Active if p.flag() == BehaviorFlag::DecliningRole => {
                format!("declining role, projected {:.1} pts", p.projection.adjusted_point)
            }
            Availability::Active => format!(
                "outscored by starters, projected {:.1} pts",
                p.projection.adjusted_point
            ),
        },
    }
}

/// Changes that turn `current` (slot name -> player) into the recommended
/// lineup. Starts and moves come in recommended slot order, then benchings
/// by player id.
pub fn lineup_changes(current: &BTreeMap<String, PlayerId>, report: &OptimizationReport) -> LineupChanges {
    let current_slot: BTreeMap<&PlayerId, &str> = current
        .iter()
        .map(|(slot, id)| (id, slot.as_str()))
        .collect();

    let mut changes = Vec::new();
    for a in &report.assignment.slots {
        let Some(occupant) = &a.occupant else { continue };
        let id = &occupant.player_id;
        let to = a.slot.name.as_str();
        match current_slot.get(id) {
            Some(&from) if from == to => {}
            Some(&from) => changes.push(LineupChange {
                player_id: id.clone(),
                action: ChangeAction::Move,
                from_slot: Some(from.to_string()),
                to_slot: Some(to.to_string()),
                reason: format!("better fit in {} than {}", to, from),
            }),
            None => changes.push(LineupChange {
                player_id: id.clone(),
                action: ChangeAction::Start,
                from_slot: None,
                to_slot: Some(to.to_string()),
                reason: start_reason(report.player(id)),
            }),
        }
    }

    let mut benched: Vec<(&PlayerId, &str)> = current_slot
        .iter()
        .filter(|(id, _)| report.assignment.slot_of(id).is_none())
        .map(|(id, slot)| (*id, *slot))
        .collect();
    benched.sort();
    for (id, from) in benched {
        changes.push(LineupChange {
            player_id: id.clone(),
            action: ChangeAction::Bench,
            from_slot: Some(from.to_string()),
            to_slot: None,
            reason: bench_reason(report.player(id)),
        });
    }

    LineupChanges {
        changes_needed: !changes.is_empty(),
        changes,
    }
}

impl fmt::Display for LineupChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.changes_needed {
            return write!(f, "Current lineup is already optimal.");
        }
        writeln!(f, "Recommended changes:")?;
        for c in &self.changes {
            let line = match c.action {
                ChangeAction::Start => format!(
                    "  START {} at {}",
                    c.player_id,
                    c.to_slot.as_deref().unwrap_or("?")
                ),
                ChangeAction::Bench => format!(
                    "  BENCH {} from {}",
                    c.player_id,
                    c.from_slot.as_deref().unwrap_or("?")
                ),
                ChangeAction::Move => format!(
                    "  MOVE  {} {} -> {}",
                    c.player_id,
                    c.from_slot.as_deref().unwrap_or("?"),
                    c.to_slot.as_deref().unwrap_or("?")
                ),
            };
            writeln!(f, "{:<36} {}", line, c.reason)?;
        }
        Ok(())
    }
}
