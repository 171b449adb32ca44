// Lineup solver: assign players to slots maximizing total ranking score.
//
// Greedy fill from the most constrained slot to the least, then a bounded
// local search. Scores are per player, so a move only matters if it changes
// *who* starts. Each move is an exchange chain: a bench player enters a slot,
// every displaced starter shifts into another slot it is eligible for, and
// the chain ends at an empty slot or sends its last starter to the bench.
// When no chain improves the lineup, no other legal lineup fills more slots
// or scores higher.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SolverConfig;
use crate::player::{PlayerId, Position};
use crate::roster::RosterSlot;

/// Gains smaller than this are treated as ties.
const SCORE_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Input and output types
// ---------------------------------------------------------------------------

/// A playable player as the solver sees them.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub player_id: PlayerId,
    pub primary_position: Position,
    pub positions: BTreeSet<Position>,
    /// Objective contribution if started.
    pub score: f64,
    /// Position-relative projection, carried through for the report.
    pub normalized_score: f64,
}

impl Candidate {
    pub fn new(player_id: impl Into<PlayerId>, primary_position: Position, score: f64) -> Self {
        let mut positions = BTreeSet::new();
        positions.insert(primary_position);
        Candidate {
            player_id: player_id.into(),
            primary_position,
            positions,
            score,
            normalized_score: score,
        }
    }

    pub fn with_eligible(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.positions.extend(positions);
        self
    }

    pub fn with_normalized_score(mut self, normalized_score: f64) -> Self {
        self.normalized_score = normalized_score;
        self
    }

    fn fits(&self, slot: &RosterSlot) -> bool {
        slot.accepts_any(&self.positions)
    }

    fn position_in(&self, slot: &RosterSlot) -> Option<Position> {
        if slot.eligible.contains(&self.primary_position) {
            return Some(self.primary_position);
        }
        self.positions.iter().copied().find(|p| slot.eligible.contains(p))
    }
}

/// The player starting in a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub player_id: PlayerId,
    /// The occupant's position that satisfied the slot.
    pub position: Position,
    /// Ranking score the solver maximized.
    pub score: f64,
    pub normalized_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub slot: RosterSlot,
    pub occupant: Option<Occupant>,
}

/// Why a slot was left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnfilledReason {
    /// Nobody on the roster can play this slot.
    NoEligiblePlayers,
    /// Everyone who could play it is on bye, out, or has no projection.
    EligiblePlayersUnavailable { players: Vec<PlayerId> },
    /// Everyone who could play it is already starting elsewhere.
    EligiblePlayersAssigned { players: Vec<PlayerId> },
}

/// Informational: a slot that could not be legally filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfilledSlot {
    pub slot: String,
    pub reason: UnfilledReason,
}

/// Every slot in the caller's order with its occupant, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupAssignment {
    pub slots: Vec<SlotAssignment>,
    pub unfilled: Vec<UnfilledSlot>,
    pub total_score: f64,
    /// Local-improvement passes that applied an exchange.
    pub improvements: usize,
}

impl LineupAssignment {
    pub fn occupant(&self, slot_name: &str) -> Option<&Occupant> {
        self.slots
            .iter()
            .find(|a| a.slot.name == slot_name)
            .and_then(|a| a.occupant.as_ref())
    }

    /// Slot name for `player_id`, if they start.
    pub fn slot_of(&self, player_id: &PlayerId) -> Option<&str> {
        self.slots
            .iter()
            .find(|a| a.occupant.as_ref().is_some_and(|o| &o.player_id == player_id))
            .map(|a| a.slot.name.as_str())
    }

    pub fn starters(&self) -> impl Iterator<Item = &Occupant> {
        self.slots.iter().filter_map(|a| a.occupant.as_ref())
    }

    pub fn filled_count(&self) -> usize {
        self.starters().count()
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LineupSolver {
    max_passes: usize,
}

/// Working state: `assigned[slot]` is an index into the ranked candidates.
#[derive(Debug, Clone, PartialEq)]
struct Working {
    assigned: Vec<Option<usize>>,
}

/// Lexicographic objective: fill as many slots as possible, then maximize
/// total score.
#[derive(Debug, Clone, Copy)]
struct Objective {
    filled: usize,
    score: f64,
}

impl Objective {
    fn improves_on(&self, other: &Objective) -> bool {
        self.filled > other.filled
            || (self.filled == other.filled && self.score > other.score + SCORE_EPSILON)
    }
}

impl LineupSolver {
    pub fn new(config: &SolverConfig) -> Self {
        LineupSolver {
            max_passes: config.max_improvement_passes,
        }
    }

    /// Assign candidates to `slots`.
    ///
    /// Deterministic: candidates are ranked by score descending, ties broken
    /// by the lower player id, and every search step scans slots and
    /// candidates in a fixed order.
    pub fn solve(&self, slots: &[RosterSlot], candidates: &[Candidate]) -> LineupAssignment {
        let mut ranked: Vec<&Candidate> = candidates.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        let mut state = self.greedy(slots, &ranked);
        debug!(
            "greedy fill: {} of {} slots, score {:.2}",
            objective(&state, &ranked).filled,
            slots.len(),
            objective(&state, &ranked).score
        );

        let mut improvements = 0;
        for pass in 0..self.max_passes {
            match best_move(slots, &ranked, &state) {
                Some(next) => {
                    let before = objective(&state, &ranked);
                    let after = objective(&next, &ranked);
                    debug!(
                        "improvement pass {}: filled {} -> {}, score {:.2} -> {:.2}",
                        pass + 1,
                        before.filled,
                        after.filled,
                        before.score,
                        after.score
                    );
                    state = next;
                    improvements += 1;
                }
                None => break,
            }
        }
        if self.max_passes > 0 && improvements == self.max_passes {
            warn!(
                "stopped after {} improvement passes; the lineup may not be optimal",
                improvements
            );
        }

        build_assignment(slots, &ranked, &state, improvements)
    }

    /// Fill slots from fewest eligible positions to most, each with the best
    /// remaining eligible candidate.
    fn greedy(&self, slots: &[RosterSlot], ranked: &[&Candidate]) -> Working {
        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.sort_by_key(|&i| (slots[i].eligible.len(), i));

        let mut state = Working {
            assigned: vec![None; slots.len()],
        };
        for s in order {
            state.assigned[s] = best_bench(&slots[s], ranked, &state);
        }
        state
    }
}

fn is_used(state: &Working, candidate: usize) -> bool {
    state.assigned.iter().any(|a| *a == Some(candidate))
}

/// Best candidate not currently starting who fits `slot`.
fn best_bench(slot: &RosterSlot, ranked: &[&Candidate], state: &Working) -> Option<usize> {
    (0..ranked.len()).find(|&c| !is_used(state, c) && ranked[c].fits(slot))
}

fn objective(state: &Working, ranked: &[&Candidate]) -> Objective {
    let mut filled = 0;
    let mut score = 0.0;
    for c in state.assigned.iter().flatten() {
        filled += 1;
        score += ranked[*c].score;
    }
    Objective { filled, score }
}

/// Slots reachable by an exchange chain started by `entering`, each with the
/// chain of slots leading to it. Breadth-first, so every chain is the
/// shortest one and visits each slot at most once.
fn exchange_chains(
    slots: &[RosterSlot],
    ranked: &[&Candidate],
    state: &Working,
    entering: usize,
) -> Vec<Vec<usize>> {
    let mut parent: Vec<Option<usize>> = vec![None; slots.len()];
    let mut seen = vec![false; slots.len()];
    let mut queue = VecDeque::new();
    for (s, slot) in slots.iter().enumerate() {
        if ranked[entering].fits(slot) {
            seen[s] = true;
            queue.push_back(s);
        }
    }

    let mut reached = Vec::new();
    while let Some(s) = queue.pop_front() {
        reached.push(s);
        // An empty slot ends the chain.
        let Some(occupant) = state.assigned[s] else { continue };
        for (t, slot) in slots.iter().enumerate() {
            if !seen[t] && ranked[occupant].fits(slot) {
                seen[t] = true;
                parent[t] = Some(s);
                queue.push_back(t);
            }
        }
    }

    reached
        .into_iter()
        .map(|end| {
            let mut chain = vec![end];
            let mut at = end;
            while let Some(prev) = parent[at] {
                chain.push(prev);
                at = prev;
            }
            chain.reverse();
            chain
        })
        .collect()
}

/// `entering` takes the first slot of `chain`; each displaced occupant moves
/// one slot along. Whoever held the last slot, if anyone, goes to the bench.
fn apply_chain(state: &Working, entering: usize, chain: &[usize]) -> Working {
    let mut next = state.clone();
    let mut moving = Some(entering);
    for &s in chain {
        let displaced = next.assigned[s];
        next.assigned[s] = moving;
        moving = displaced;
    }
    next
}

/// Every neighbor of `state` reachable by one exchange chain, in a fixed
/// order: bench players by rank, then chains by length.
fn neighbors(slots: &[RosterSlot], ranked: &[&Candidate], state: &Working) -> Vec<Working> {
    let mut out = Vec::new();
    for entering in 0..ranked.len() {
        if is_used(state, entering) {
            continue;
        }
        for chain in exchange_chains(slots, ranked, state, entering) {
            out.push(apply_chain(state, entering, &chain));
        }
    }
    out
}

/// The strictly best improving neighbor; the first one found wins ties.
fn best_move(slots: &[RosterSlot], ranked: &[&Candidate], state: &Working) -> Option<Working> {
    let current = objective(state, ranked);
    let mut best: Option<(Objective, Working)> = None;
    for next in neighbors(slots, ranked, state) {
        let value = objective(&next, ranked);
        if !value.improves_on(&current) {
            continue;
        }
        let better = match &best {
            Some((best_value, _)) => value.improves_on(best_value),
            None => true,
        };
        if better {
            best = Some((value, next));
        }
    }
    best.map(|(_, state)| state)
}

fn build_assignment(
    slots: &[RosterSlot],
    ranked: &[&Candidate],
    state: &Working,
    improvements: usize,
) -> LineupAssignment {
    let mut assigned_slots = Vec::with_capacity(slots.len());
    let mut unfilled = Vec::new();
    let mut total_score = 0.0;

    for (s, slot) in slots.iter().enumerate() {
        let occupant = state.assigned[s].and_then(|c| {
            let cand = ranked[c];
            cand.position_in(slot).map(|position| Occupant {
                player_id: cand.player_id.clone(),
                position,
                score: cand.score,
                normalized_score: cand.normalized_score,
            })
        });
        match &occupant {
            Some(o) => total_score += o.score,
            None => {
                let mut eligible: Vec<PlayerId> = ranked
                    .iter()
                    .filter(|c| c.fits(slot))
                    .map(|c| c.player_id.clone())
                    .collect();
                eligible.sort();
                let reason = if eligible.is_empty() {
                    UnfilledReason::NoEligiblePlayers
                } else {
                    UnfilledReason::EligiblePlayersAssigned { players: eligible }
                };
                unfilled.push(UnfilledSlot {
                    slot: slot.name.clone(),
                    reason,
                });
            }
        }
        assigned_slots.push(SlotAssignment {
            slot: slot.clone(),
            occupant,
        });
    }

    LineupAssignment {
        slots: assigned_slots,
        unfilled,
        total_score,
        improvements,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use Position::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn solver() -> LineupSolver {
        LineupSolver::new(&SolverConfig::default())
    }

    fn flex() -> RosterSlot {
        RosterSlot::new("FLEX", [RunningBack, WideReceiver, TightEnd])
    }

    fn occupant_id<'a>(lineup: &'a LineupAssignment, slot: &str) -> Option<&'a str> {
        lineup.occupant(slot).map(|o| o.player_id.as_str())
    }

    /// Brute force over every legal assignment; only for tiny inputs.
    fn brute_force_best(slots: &[RosterSlot], candidates: &[Candidate]) -> (usize, f64) {
        fn go(
            s: usize,
            slots: &[RosterSlot],
            candidates: &[Candidate],
            used: &mut Vec<bool>,
            filled: usize,
            score: f64,
            best: &mut (usize, f64),
        ) {
            if s == slots.len() {
                if filled > best.0 || (filled == best.0 && score > best.1 + 1e-9) {
                    *best = (filled, score);
                }
                return;
            }
            go(s + 1, slots, candidates, used, filled, score, best);
            for (i, c) in candidates.iter().enumerate() {
                if !used[i] && c.fits(&slots[s]) {
                    used[i] = true;
                    go(s + 1, slots, candidates, used, filled + 1, score + c.score, best);
                    used[i] = false;
                }
            }
        }
        let mut best = (0, 0.0);
        let mut used = vec![false; candidates.len()];
        go(0, slots, candidates, &mut used, 0, 0.0, &mut best);
        best
    }

    fn assert_legal(lineup: &LineupAssignment, candidates: &[Candidate]) {
        let mut seen = BTreeSet::new();
        for a in &lineup.slots {
            if let Some(o) = &a.occupant {
                assert!(seen.insert(o.player_id.clone()), "{} used twice", o.player_id);
                assert!(a.slot.eligible.contains(&o.position));
                let cand = candidates.iter().find(|c| c.player_id == o.player_id).unwrap();
                assert!(cand.positions.contains(&o.position));
            }
        }
    }

    // -- Scenario: greedy FLEX outcome already optimal --

    #[test]
    fn flex_greedy_outcome_is_kept() {
        let slots = vec![
            RosterSlot::new("QB", [Quarterback]),
            RosterSlot::new("RB", [RunningBack]),
            flex(),
        ];
        let candidates = vec![
            Candidate::new("rb_a", RunningBack, 18.0),
            Candidate::new("rb_b", RunningBack, 15.0),
            Candidate::new("wr_a", WideReceiver, 12.0),
        ];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(occupant_id(&lineup, "RB"), Some("rb_a"));
        assert_eq!(occupant_id(&lineup, "FLEX"), Some("rb_b"));
        assert_eq!(occupant_id(&lineup, "QB"), None);
        assert!(approx_eq(lineup.total_score, 33.0));
        assert_eq!(lineup.improvements, 0);
        assert_eq!(
            lineup.unfilled,
            vec![UnfilledSlot {
                slot: "QB".into(),
                reason: UnfilledReason::NoEligiblePlayers,
            }]
        );
        assert_legal(&lineup, &candidates);
    }

    // -- Scenario: multi-position player boxed into the wrong slot --

    #[test]
    fn local_search_relocates_dual_eligible_player() {
        // Greedy takes the RB slot first (ties on width, earlier index) and
        // grabs the hybrid; the WR slot then has nobody.
        let slots = vec![
            RosterSlot::new("RB", [RunningBack]),
            RosterSlot::new("WR", [WideReceiver]),
            RosterSlot::new("W/R", [RunningBack, WideReceiver]),
        ];
        let candidates = vec![
            Candidate::new("hybrid", RunningBack, 20.0).with_eligible([WideReceiver]),
            Candidate::new("rb2", RunningBack, 18.0),
            Candidate::new("rb3", RunningBack, 10.0),
        ];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(lineup.filled_count(), 3);
        assert_eq!(occupant_id(&lineup, "WR"), Some("hybrid"));
        assert!(approx_eq(lineup.total_score, 48.0));
        assert!(lineup.improvements >= 1);
        assert!(lineup.unfilled.is_empty());
        assert_legal(&lineup, &candidates);
    }

    #[test]
    fn occupant_reports_matching_position() {
        let slots = vec![RosterSlot::new("WR", [WideReceiver])];
        let candidates = vec![Candidate::new("hybrid", RunningBack, 20.0).with_eligible([WideReceiver])];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(lineup.occupant("WR").unwrap().position, WideReceiver);
    }

    // -- Unfillable slots --

    #[test]
    fn missing_position_leaves_slot_empty() {
        let slots = vec![
            RosterSlot::new("RB", [RunningBack]),
            RosterSlot::new("TE", [TightEnd]),
        ];
        let candidates = vec![Candidate::new("rb1", RunningBack, 12.0)];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(occupant_id(&lineup, "RB"), Some("rb1"));
        assert!(lineup.occupant("TE").is_none());
        assert_eq!(lineup.unfilled.len(), 1);
        assert_eq!(lineup.unfilled[0].slot, "TE");
        assert_eq!(lineup.unfilled[0].reason, UnfilledReason::NoEligiblePlayers);
    }

    #[test]
    fn eligible_players_already_assigned() {
        let slots = vec![RosterSlot::new("RB", [RunningBack]), flex()];
        let candidates = vec![Candidate::new("rb1", RunningBack, 12.0)];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(
            lineup.unfilled[0].reason,
            UnfilledReason::EligiblePlayersAssigned {
                players: vec!["rb1".into()]
            }
        );
    }

    #[test]
    fn empty_pool_leaves_everything_empty() {
        let slots = vec![RosterSlot::new("QB", [Quarterback]), flex()];
        let lineup = solver().solve(&slots, &[]);
        assert_eq!(lineup.filled_count(), 0);
        assert_eq!(lineup.unfilled.len(), 2);
        assert!(approx_eq(lineup.total_score, 0.0));
    }

    // -- Determinism and tie-breaking --

    #[test]
    fn ties_broken_by_lower_player_id() {
        let slots = vec![RosterSlot::new("WR", [WideReceiver])];
        let candidates = vec![
            Candidate::new("wr_b", WideReceiver, 10.0),
            Candidate::new("wr_a", WideReceiver, 10.0),
        ];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(occupant_id(&lineup, "WR"), Some("wr_a"));
    }

    #[test]
    fn input_order_does_not_matter() {
        let slots = vec![
            RosterSlot::new("RB1", [RunningBack]),
            RosterSlot::new("RB2", [RunningBack]),
            RosterSlot::new("WR", [WideReceiver]),
            flex(),
        ];
        let mut candidates = vec![
            Candidate::new("a", RunningBack, 11.0),
            Candidate::new("b", RunningBack, 11.0),
            Candidate::new("c", WideReceiver, 9.0),
            Candidate::new("d", TightEnd, 9.0),
            Candidate::new("e", RunningBack, 9.0).with_eligible([WideReceiver]),
        ];
        let first = solver().solve(&slots, &candidates);
        candidates.reverse();
        let second = solver().solve(&slots, &candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn negative_scores_still_fill_slots() {
        let slots = vec![RosterSlot::new("K", [Kicker])];
        let candidates = vec![Candidate::new("k1", Kicker, -2.5)];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(occupant_id(&lineup, "K"), Some("k1"));
        assert!(approx_eq(lineup.total_score, -2.5));
    }

    #[test]
    fn single_pass_cap_still_terminates_with_legal_lineup() {
        let solver = LineupSolver::new(&SolverConfig {
            max_improvement_passes: 1,
        });
        let slots = vec![
            RosterSlot::new("RB", [RunningBack]),
            RosterSlot::new("WR", [WideReceiver]),
            RosterSlot::new("W/R", [RunningBack, WideReceiver]),
        ];
        let candidates = vec![
            Candidate::new("hybrid", RunningBack, 20.0).with_eligible([WideReceiver]),
            Candidate::new("rb2", RunningBack, 18.0),
            Candidate::new("rb3", RunningBack, 10.0),
        ];
        let lineup = solver.solve(&slots, &candidates);
        assert!(lineup.improvements <= 1);
        assert_legal(&lineup, &candidates);
    }

    // -- Exchange chains --

    #[test]
    fn bench_player_displaces_weak_starter_through_flex_chain() {
        // Greedy gives W/R the best WR and W/T the worst; the RB on the bench
        // only gets in by pushing wr1 over to W/T.
        let slots = vec![
            RosterSlot::new("W/R", [RunningBack, WideReceiver]),
            RosterSlot::new("W/T", [WideReceiver, TightEnd]),
        ];
        let candidates = vec![
            Candidate::new("wr1", WideReceiver, 20.0),
            Candidate::new("wr2", WideReceiver, 1.0),
            Candidate::new("rb1", RunningBack, 15.0),
        ];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(occupant_id(&lineup, "W/R"), Some("rb1"));
        assert_eq!(occupant_id(&lineup, "W/T"), Some("wr1"));
        assert!(approx_eq(lineup.total_score, 35.0));
        assert_eq!(lineup.improvements, 1);
        assert_legal(&lineup, &candidates);
    }

    #[test]
    fn fillable_slot_is_never_left_empty() {
        // The hybrid is the best TE, so greedy spends it on TE and QB is
        // left with nobody.
        let slots = vec![
            RosterSlot::new("TE", [TightEnd]),
            RosterSlot::new("QB", [Quarterback]),
            RosterSlot::new("OP", [Quarterback, WideReceiver, TightEnd]),
        ];
        let candidates = vec![
            Candidate::new("hybrid", TightEnd, 20.0).with_eligible([Quarterback]),
            Candidate::new("wr1", WideReceiver, 12.0),
            Candidate::new("te1", TightEnd, 5.0),
        ];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(lineup.filled_count(), 3);
        assert!(lineup.unfilled.is_empty());
        assert_eq!(occupant_id(&lineup, "QB"), Some("hybrid"));
        assert_eq!(lineup.occupant("QB").unwrap().position, Quarterback);
        assert!(approx_eq(lineup.total_score, 37.0));
        assert_legal(&lineup, &candidates);
    }

    #[test]
    fn occupant_carries_normalized_score() {
        let slots = vec![RosterSlot::new("RB", [RunningBack])];
        let candidates = vec![Candidate::new("rb1", RunningBack, 6.5).with_normalized_score(4.0)];
        let lineup = solver().solve(&slots, &candidates);
        let occupant = lineup.occupant("RB").unwrap();
        assert!(approx_eq(occupant.score, 6.5));
        assert!(approx_eq(occupant.normalized_score, 4.0));
    }

    // -- Optimality on random pools --

    #[test]
    fn matches_brute_force_on_random_pools() {
        let palette = [
            RosterSlot::new("QB", [Quarterback]),
            RosterSlot::new("RB", [RunningBack]),
            RosterSlot::new("WR", [WideReceiver]),
            RosterSlot::new("TE", [TightEnd]),
            RosterSlot::new("K", [Kicker]),
            RosterSlot::new("W/R", [RunningBack, WideReceiver]),
            RosterSlot::new("W/T", [WideReceiver, TightEnd]),
            flex(),
            RosterSlot::new("OP", [Quarterback, RunningBack, WideReceiver, TightEnd]),
        ];
        let positions = [Quarterback, RunningBack, WideReceiver, TightEnd, Kicker];
        let mut rng = StdRng::seed_from_u64(7);

        for round in 0..1500 {
            let slots: Vec<RosterSlot> = (0..rng.gen_range(1..=5))
                .map(|i| {
                    let base = &palette[rng.gen_range(0..palette.len())];
                    RosterSlot::new(format!("{}{}", base.name, i), base.eligible.iter().copied())
                })
                .collect();
            let pool: Vec<Candidate> = (0..rng.gen_range(0..=6))
                .map(|i| {
                    let primary = positions[rng.gen_range(0..positions.len())];
                    // Integer scores so ties come up often.
                    let score = rng.gen_range(-5..=25) as f64;
                    let candidate = Candidate::new(format!("c{}", i), primary, score);
                    if rng.gen_bool(0.3) {
                        candidate.with_eligible([positions[rng.gen_range(0..positions.len())]])
                    } else {
                        candidate
                    }
                })
                .collect();

            let lineup = solver().solve(&slots, &pool);
            let (best_filled, best_score) = brute_force_best(&slots, &pool);
            assert_legal(&lineup, &pool);
            assert_eq!(lineup.filled_count(), best_filled, "round {}: {:?} {:?}", round, slots, pool);
            assert!(
                approx_eq(lineup.total_score, best_score),
                "round {}: solver {} vs optimum {}",
                round,
                lineup.total_score,
                best_score
            );
        }
    }

    #[test]
    fn raising_a_score_never_lowers_the_total() {
        let slots = vec![RosterSlot::new("RB", [RunningBack]), RosterSlot::new("WR", [WideReceiver]), flex()];
        let base = vec![
            Candidate::new("rb1", RunningBack, 14.0),
            Candidate::new("rb2", RunningBack, 9.0),
            Candidate::new("wr1", WideReceiver, 12.0),
            Candidate::new("te1", TightEnd, 10.0),
        ];
        let before = solver().solve(&slots, &base).total_score;
        for i in 0..base.len() {
            let mut raised = base.clone();
            raised[i].score += 3.0;
            let after = solver().solve(&slots, &raised).total_score;
            assert!(after >= before - 1e-9);
        }
    }

    #[test]
    fn slot_of_finds_starters() {
        let slots = vec![RosterSlot::new("RB", [RunningBack])];
        let candidates = vec![
            Candidate::new("rb1", RunningBack, 14.0),
            Candidate::new("rb2", RunningBack, 9.0),
        ];
        let lineup = solver().solve(&slots, &candidates);
        assert_eq!(lineup.slot_of(&"rb1".into()), Some("RB"));
        assert_eq!(lineup.slot_of(&"rb2".into()), None);
    }
}
