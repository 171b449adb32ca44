// Lineup optimization pipeline.
//
// raw projections -> canonical -> recency-adjusted -> availability filter ->
// positional baselines -> strategy scores -> solver -> report.
//
// Every call recomputes everything from its inputs; nothing is cached.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::availability::apply_availability;
use crate::baseline::{compute_baselines, Baselines, PoolEntry};
use crate::config::EngineConfig;
use crate::player::{Availability, Player, PlayerId, Position, Week};
use crate::projection::{normalize_projection, MissingProjectionError};
use crate::recency::{enhance, AdjustedProjection, BehaviorFlag};
use crate::roster::{validate_players, validate_slots, InconsistentRosterError, RosterSlot};
use crate::solver::{Candidate, LineupAssignment, LineupSolver, UnfilledReason};
use crate::strategy::{InvalidStrategyError, Strategy};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that reject a whole optimization call before any scoring happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    InconsistentRoster(#[from] InconsistentRosterError),

    #[error(transparent)]
    InvalidStrategy(#[from] InvalidStrategyError),
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Everything the engine worked out about one projected player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub player_id: PlayerId,
    pub name: String,
    pub primary_position: Position,
    pub availability: Availability,
    pub projection: AdjustedProjection,
    /// Baseline of the primary position.
    pub baseline: f64,
    /// Adjusted point minus baseline.
    pub normalized_score: f64,
    /// Strategy score before positional normalization.
    pub strategy_score: f64,
    /// Strategy score minus baseline; what the solver maximizes.
    pub ranking_score: f64,
    /// Slot the player starts in, if any.
    pub slot: Option<String>,
}

impl PlayerReport {
    pub fn flag(&self) -> BehaviorFlag {
        self.projection.flag
    }

    pub fn is_starting(&self) -> bool {
        self.slot.is_some()
    }
}

/// Result of one `optimize_lineup` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub week: Week,
    pub strategy: Strategy,
    pub assignment: LineupAssignment,
    /// Starters in slot order, then everyone else by ranking score.
    pub players: Vec<PlayerReport>,
    pub baselines: Baselines,
    pub missing_projections: Vec<MissingProjectionError>,
    /// Sum of the starters' ranking scores.
    ///
    /// Scores are relative to baselines recomputed from this roster, so the
    /// total only compares across rosters whose baselines match. With
    /// baselines fixed, raising any player's projection never lowers it;
    /// raising a bench player can lift their position's baseline and lower it.
    pub total_score: f64,
    /// Sum of the starters' adjusted points.
    pub projected_points: f64,
}

impl OptimizationReport {
    pub fn player(&self, player_id: &PlayerId) -> Option<&PlayerReport> {
        self.players.iter().find(|p| &p.player_id == player_id)
    }

    pub fn starter_in(&self, slot: &str) -> Option<&PlayerReport> {
        self.assignment
            .occupant(slot)
            .and_then(|o| self.player(&o.player_id))
    }

    pub fn bench(&self) -> impl Iterator<Item = &PlayerReport> {
        self.players.iter().filter(|p| !p.is_starting())
    }
}

// ---------------------------------------------------------------------------
// Optimization
// ---------------------------------------------------------------------------

/// A player who made it through normalization.
struct Evaluated<'a> {
    player: &'a Player,
    adjusted: AdjustedProjection,
}

/// Parse `strategy` and optimize. Unknown names are rejected before any
/// computation.
pub fn optimize_lineup_named(
    roster: &[Player],
    slots: &[RosterSlot],
    strategy: &str,
    week: Week,
    config: &EngineConfig,
) -> Result<OptimizationReport, EngineError> {
    let strategy: Strategy = strategy.parse()?;
    optimize_lineup(roster, slots, strategy, week, config)
}

/// Pick the best legal lineup for `week` from `roster`.
///
/// Players without any projection are reported in `missing_projections` and
/// left out; players on bye or out are annotated but never started.
pub fn optimize_lineup(
    roster: &[Player],
    slots: &[RosterSlot],
    strategy: Strategy,
    week: Week,
    config: &EngineConfig,
) -> Result<OptimizationReport, EngineError> {
    validate_slots(slots)?;
    validate_players(roster)?;

    let mut evaluated = Vec::with_capacity(roster.len());
    let mut missing_projections = Vec::new();
    for player in roster {
        match normalize_projection(&player.id, week, &player.projections, &config.projection) {
            Ok(canonical) => {
                let adjusted = enhance(canonical, &player.recent_actuals, &config.recency);
                let adjusted = apply_availability(&player.id, player.availability, adjusted);
                debug!(
                    "{} ({}): {:.2} -> {:.2} {}",
                    player.name, player.id, canonical.point, adjusted.adjusted_point, adjusted.flag
                );
                evaluated.push(Evaluated { player, adjusted });
            }
            Err(e) => {
                warn!("{}", e);
                missing_projections.push(e);
            }
        }
    }

    let pool: Vec<PoolEntry> = evaluated
        .iter()
        .map(|e| PoolEntry {
            position: e.player.primary_position,
            value: e.adjusted.adjusted_point,
            availability: e.player.availability,
        })
        .collect();
    let baselines = compute_baselines(&pool, slots, config.baseline.method);
    for b in baselines.by_position.values() {
        debug!("baseline {}: {:.2} over {} players", b.position, b.baseline, b.pool_size);
    }

    let mut players: Vec<PlayerReport> = evaluated
        .iter()
        .map(|e| {
            let position = e.player.primary_position;
            let baseline = baselines.baseline(position);
            let strategy_score = strategy.score_projection(&e.adjusted, &config.strategy);
            PlayerReport {
                player_id: e.player.id.clone(),
                name: e.player.name.clone(),
                primary_position: position,
                availability: e.player.availability,
                projection: e.adjusted,
                baseline,
                normalized_score: baselines.normalized(position, e.adjusted.adjusted_point),
                strategy_score,
                ranking_score: baselines.normalized(position, strategy_score),
                slot: None,
            }
        })
        .collect();

    let candidates: Vec<Candidate> = evaluated
        .iter()
        .zip(&players)
        .filter(|(e, _)| e.player.availability.is_playable())
        .map(|(e, report)| {
            Candidate::new(e.player.id.clone(), e.player.primary_position, report.ranking_score)
                .with_eligible(e.player.eligible_positions.iter().copied())
                .with_normalized_score(report.normalized_score)
        })
        .collect();

    let mut assignment = LineupSolver::new(&config.solver).solve(slots, &candidates);
    explain_unavailable(&mut assignment, roster, &candidates);

    for report in &mut players {
        report.slot = assignment.slot_of(&report.player_id).map(str::to_string);
    }
    order_players(&mut players, &assignment);

    let total_score = assignment.total_score;
    let projected_points: f64 = players
        .iter()
        .filter(|p| p.is_starting())
        .map(|p| p.projection.adjusted_point)
        .sum();

    info!(
        "{} ({}): filled {}/{} slots, projected {:.1} pts, {} unfilled, {} missing projections",
        week,
        strategy,
        assignment.filled_count(),
        slots.len(),
        projected_points,
        assignment.unfilled.len(),
        missing_projections.len()
    );

    Ok(OptimizationReport {
        week,
        strategy,
        assignment,
        players,
        baselines,
        missing_projections,
        total_score,
        projected_points,
    })
}

/// The solver only sees playable candidates. When it finds nobody for a slot,
/// name the rostered players who could have played it but are on bye, out,
/// or without a projection.
fn explain_unavailable(assignment: &mut LineupAssignment, roster: &[Player], candidates: &[Candidate]) {
    let playable: BTreeSet<&PlayerId> = candidates.iter().map(|c| &c.player_id).collect();
    for unfilled in &mut assignment.unfilled {
        if unfilled.reason != UnfilledReason::NoEligiblePlayers {
            continue;
        }
        let Some(slot) = assignment
            .slots
            .iter()
            .find(|a| a.slot.name == unfilled.slot)
            .map(|a| &a.slot)
        else {
            continue;
        };
        let mut sidelined: Vec<PlayerId> = roster
            .iter()
            .filter(|p| !playable.contains(&p.id) && slot.accepts_any(&p.eligible_positions))
            .map(|p| p.id.clone())
            .collect();
        if !sidelined.is_empty() {
            sidelined.sort();
            unfilled.reason = UnfilledReason::EligiblePlayersUnavailable { players: sidelined };
        }
    }
    for unfilled in &assignment.unfilled {
        warn!("slot {} left empty: {:?}", unfilled.slot, unfilled.reason);
    }
}

/// Starters in slot order, then the rest by ranking score (ties by id).
fn order_players(players: &mut [PlayerReport], assignment: &LineupAssignment) {
    let slot_index = |p: &PlayerReport| {
        p.slot
            .as_deref()
            .and_then(|name| assignment.slots.iter().position(|a| a.slot.name == name))
            .unwrap_or(usize::MAX)
    };
    players.sort_by(|a, b| {
        slot_index(a)
            .cmp(&slot_index(b))
            .then_with(|| b.ranking_score.total_cmp(&a.ranking_score))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn unfilled_text(reason: &UnfilledReason) -> String {
    match reason {
        UnfilledReason::NoEligiblePlayers => "no eligible players".to_string(),
        UnfilledReason::EligiblePlayersUnavailable { players } => {
            format!("unavailable: {}", join_ids(players))
        }
        UnfilledReason::EligiblePlayersAssigned { players } => {
            format!("eligible players already starting: {}", join_ids(players))
        }
    }
}

fn join_ids(ids: &[PlayerId]) -> String {
    ids.iter().map(PlayerId::as_str).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for OptimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lineup for {} ({} strategy)", self.week, self.strategy)?;
        writeln!(
            f,
            "{:<8} {:<24} {:<4} {:>7} {:>7} {:>7}  {}",
            "SLOT", "PLAYER", "POS", "PROJ", "RANGE", "SCORE", "FLAG"
        )?;
        for a in &self.assignment.slots {
            let Some(occupant) = &a.occupant else {
                let reason = self
                    .assignment
                    .unfilled
                    .iter()
                    .find(|u| u.slot == a.slot.name)
                    .map(|u| unfilled_text(&u.reason))
                    .unwrap_or_default();
                writeln!(f, "{:<8} -- empty ({})", a.slot.name, reason)?;
                continue;
            };
            match self.player(&occupant.player_id) {
                Some(p) => writeln!(
                    f,
                    "{:<8} {:<24} {:<4} {:>7.2} {:>7.2} {:>+7.2}  {}",
                    a.slot.name,
                    p.name,
                    occupant.position,
                    p.projection.adjusted_point,
                    p.projection.canonical.volatility(),
                    occupant.score,
                    p.flag()
                )?,
                None => writeln!(f, "{:<8} {}", a.slot.name, occupant.player_id)?,
            }
        }

        let bench: Vec<&PlayerReport> = self.bench().collect();
        if !bench.is_empty() {
            writeln!(f)?;
            writeln!(f, "Bench")?;
            for p in bench {
                writeln!(
                    f,
                    "{:<8} {:<24} {:<4} {:>7.2} {:>7.2} {:>+7.2}  {}",
                    "BN",
                    p.name,
                    p.primary_position,
                    p.projection.adjusted_point,
                    p.projection.canonical.volatility(),
                    p.ranking_score,
                    p.flag()
                )?;
            }
        }

        if !self.missing_projections.is_empty() {
            writeln!(f)?;
            for missing in &self.missing_projections {
                writeln!(f, "! {}", missing)?;
            }
        }

        writeln!(f)?;
        write!(
            f,
            "Projected {:.2} pts, score {:+.2}",
            self.projected_points, self.total_score
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
