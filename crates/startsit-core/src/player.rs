// Player identity, positions and week-scoped facts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable provider id for a player.
///
/// Ordering is plain lexicographic string ordering. Wherever two players tie
/// on score, the lower id wins.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        PlayerId(s)
    }
}

/// A scoring week of the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Week(pub u16);

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Football positions a player can be rostered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB")]
    RunningBack,
    #[serde(rename = "WR")]
    WideReceiver,
    #[serde(rename = "TE")]
    TightEnd,
    #[serde(rename = "K")]
    Kicker,
    #[serde(rename = "DEF")]
    Defense,
}

/// Every position in display order.
pub const ALL_POSITIONS: &[Position] = &[
    Position::Quarterback,
    Position::RunningBack,
    Position::WideReceiver,
    Position::TightEnd,
    Position::Kicker,
    Position::Defense,
];

impl Position {
    /// Parse a provider position abbreviation.
    ///
    /// Handles the common aliases: "DST" / "D/ST" / "D" -> Defense, "PK" -> Kicker.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" | "PK" => Some(Position::Kicker),
            "DEF" | "DST" | "D/ST" | "D" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Whether a player can play in the target week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Active,
    Bye,
    Out,
}

impl Availability {
    /// Parse a provider status string.
    ///
    /// Designations that still allow the player to suit up (questionable,
    /// doubtful, game-time decision) stay `Active`; only ruled-out statuses
    /// map to `Out`.
    pub fn from_status(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "" | "ACTIVE" | "A" | "Q" | "D" | "GTD" | "QUESTIONABLE" | "DOUBTFUL" | "PROBABLE" => {
                Some(Availability::Active)
            }
            "BYE" => Some(Availability::Bye),
            "OUT" | "O" | "IR" | "PUP" | "SUSP" | "NA" | "INJURED" => Some(Availability::Out),
            _ => None,
        }
    }

    pub fn is_playable(&self) -> bool {
        matches!(self, Availability::Active)
    }
}

// ---------------------------------------------------------------------------
// Raw projections
// ---------------------------------------------------------------------------

/// One projection for one player-week from one named source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProjection {
    pub source: String,
    pub points: f64,
    /// Source-reported low outcome, if the source publishes a distribution.
    #[serde(default)]
    pub floor: Option<f64>,
    /// Source-reported high outcome, if the source publishes a distribution.
    #[serde(default)]
    pub ceiling: Option<f64>,
}

impl SourceProjection {
    pub fn points(source: impl Into<String>, points: f64) -> Self {
        SourceProjection {
            source: source.into(),
            points,
            floor: None,
            ceiling: None,
        }
    }

    pub fn with_band(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor = Some(floor);
        self.ceiling = Some(ceiling);
        self
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A rostered player with everything known about them for the target week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub primary_position: Position,
    /// Always non-empty and always contains `primary_position`.
    pub eligible_positions: BTreeSet<Position>,
    #[serde(default)]
    pub projections: Vec<SourceProjection>,
    /// Actual scores of the last scored weeks, most recent last.
    #[serde(default)]
    pub recent_actuals: Vec<f64>,
    #[serde(default)]
    pub availability: Availability,
}

impl Player {
    /// Build a player eligible only at their primary position.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, primary_position: Position) -> Self {
        let mut eligible_positions = BTreeSet::new();
        eligible_positions.insert(primary_position);
        Player {
            id: id.into(),
            name: name.into(),
            primary_position,
            eligible_positions,
            projections: Vec::new(),
            recent_actuals: Vec::new(),
            availability: Availability::Active,
        }
    }

    /// Add extra eligible positions. The primary position is always kept.
    pub fn with_eligible(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.eligible_positions.extend(positions);
        self
    }

    pub fn with_projection(mut self, projection: SourceProjection) -> Self {
        self.projections.push(projection);
        self
    }

    pub fn with_actuals(mut self, actuals: impl IntoIterator<Item = f64>) -> Self {
        self.recent_actuals = actuals.into_iter().collect();
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Whether the player can be slotted at `pos`.
    pub fn is_eligible(&self, pos: Position) -> bool {
        pos == self.primary_position || self.eligible_positions.contains(&pos)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
