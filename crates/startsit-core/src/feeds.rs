// External feeds: projections, recent actuals and availability.
//
// The engine never fetches anything. Callers hand it a snapshot that answers
// the three feed traits; `FeedSnapshot` is the in-memory implementation,
// loadable from CSV exports.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::player::{Availability, Player, PlayerId, Position, SourceProjection, Week};
use crate::projection::ProjectionRecord;

// ---------------------------------------------------------------------------
// Feed traits
// ---------------------------------------------------------------------------

/// (player, week) -> raw projections from every named source.
pub trait ProjectionFeed {
    fn projections(&self, player_id: &PlayerId, week: Week) -> Vec<SourceProjection>;
}

/// player -> actual scores of scored weeks before `before`, most recent last,
/// at most `limit` of them.
pub trait ActualsFeed {
    fn recent_actuals(&self, player_id: &PlayerId, before: Week, limit: usize) -> Vec<f64>;
}

/// (player, week) -> status, or `None` when the feed has nothing.
pub trait AvailabilityFeed {
    fn availability(&self, player_id: &PlayerId, week: Week) -> Option<Availability>;
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Roster entries
// ---------------------------------------------------------------------------

/// A rostered player's identity, before any week-scoped facts are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub primary_position: Position,
    pub extra_positions: Vec<Position>,
}

impl RosterEntry {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, primary_position: Position) -> Self {
        RosterEntry {
            id: id.into(),
            name: name.into(),
            primary_position,
            extra_positions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// FeedSnapshot
// ---------------------------------------------------------------------------

/// In-memory answers for all three feeds.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    projections: BTreeMap<(PlayerId, Week), Vec<SourceProjection>>,
    actuals: BTreeMap<PlayerId, BTreeMap<Week, f64>>,
    availability: BTreeMap<(PlayerId, Week), Availability>,
}

impl FeedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_projection(&mut self, record: ProjectionRecord) {
        self.projections
            .entry((record.player_id, record.week))
            .or_default()
            .push(record.projection);
    }

    pub fn add_projections(&mut self, records: impl IntoIterator<Item = ProjectionRecord>) {
        for record in records {
            self.add_projection(record);
        }
    }

    /// Record a scored week. A later entry for the same week replaces the
    /// earlier one.
    pub fn add_actual(&mut self, player_id: PlayerId, week: Week, points: f64) {
        self.actuals.entry(player_id).or_default().insert(week, points);
    }

    pub fn set_availability(&mut self, player_id: PlayerId, week: Week, status: Availability) {
        self.availability.insert((player_id, week), status);
    }

    /// Number of (player, week) pairs with at least one projection.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }
}

impl ProjectionFeed for FeedSnapshot {
    fn projections(&self, player_id: &PlayerId, week: Week) -> Vec<SourceProjection> {
        self.projections
            .get(&(player_id.clone(), week))
            .cloned()
            .unwrap_or_default()
    }
}

impl ActualsFeed for FeedSnapshot {
    fn recent_actuals(&self, player_id: &PlayerId, before: Week, limit: usize) -> Vec<f64> {
        let Some(weeks) = self.actuals.get(player_id) else {
            return Vec::new();
        };
        let mut recent: Vec<f64> = weeks
            .range(..before)
            .rev()
            .take(limit)
            .map(|(_, &points)| points)
            .collect();
        recent.reverse();
        recent
    }
}

impl AvailabilityFeed for FeedSnapshot {
    fn availability(&self, player_id: &PlayerId, week: Week) -> Option<Availability> {
        self.availability.get(&(player_id.clone(), week)).copied()
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Join roster entries with the feeds into `Player` records for `week`.
///
/// Actuals are taken strictly before `week`, at most `max_weeks` of them.
/// Players the availability feed says nothing about are treated as active.
pub fn assemble_roster<F>(entries: &[RosterEntry], feed: &F, week: Week, max_weeks: usize) -> Vec<Player>
where
    F: ProjectionFeed + ActualsFeed + AvailabilityFeed,
{
    entries
        .iter()
        .map(|entry| {
            let mut player = Player::new(entry.id.clone(), entry.name.clone(), entry.primary_position)
                .with_eligible(entry.extra_positions.iter().copied())
                .with_actuals(feed.recent_actuals(&entry.id, week, max_weeks))
                .with_availability(feed.availability(&entry.id, week).unwrap_or_default());
            player.projections = feed.projections(&entry.id, week);
            player
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    #[serde(alias = "PlayerId", alias = "id")]
    player_id: String,
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Position", alias = "pos")]
    position: String,
    /// Extra positions, separated by '/', '|' or spaces.
    #[serde(default, alias = "Eligible")]
    eligible: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawActualRow {
    #[serde(alias = "PlayerId", alias = "id")]
    player_id: String,
    #[serde(alias = "Week")]
    week: u16,
    #[serde(alias = "Points", alias = "fpts", alias = "FPTS")]
    points: f64,
}

#[derive(Debug, Deserialize)]
struct RawAvailabilityRow {
    #[serde(alias = "PlayerId", alias = "id")]
    player_id: String,
    #[serde(alias = "Week")]
    week: u16,
    #[serde(alias = "Status")]
    status: String,
}

#[derive(Debug, Deserialize)]
struct RawLineupRow {
    #[serde(alias = "Slot")]
    slot: String,
    #[serde(alias = "PlayerId", alias = "id")]
    player_id: String,
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr)
}

/// Split an eligibility list such as `RB/WR` or `WR|TE`. `D/ST` is a single
/// position even though it contains the separator.
fn parse_positions(raw: &str) -> Option<Vec<Position>> {
    if let Some(pos) = Position::from_str_pos(raw) {
        return Some(vec![pos]);
    }
    raw.to_uppercase()
        .replace("D/ST", "DST")
        .split(['/', '|', ' '])
        .filter(|s| !s.is_empty())
        .map(Position::from_str_pos)
        .collect()
}

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<RosterEntry>, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut entries = Vec::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        match result {
            Ok(raw) => {
                let Some(primary) = Position::from_str_pos(&raw.position) else {
                    warn!(
                        "skipping player '{}': unknown position '{}'",
                        raw.player_id, raw.position
                    );
                    continue;
                };
                let extra = match raw.eligible.as_deref().map(parse_positions) {
                    None => Vec::new(),
                    Some(Some(positions)) => positions,
                    Some(None) => {
                        warn!(
                            "player '{}': ignoring unparseable eligibility '{}'",
                            raw.player_id,
                            raw.eligible.as_deref().unwrap_or_default()
                        );
                        Vec::new()
                    }
                };
                entries.push(RosterEntry {
                    id: PlayerId::new(raw.player_id),
                    name: raw.name,
                    primary_position: primary,
                    extra_positions: extra,
                });
            }
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(entries)
}

fn load_actuals_from_reader<R: Read>(rdr: R, snapshot: &mut FeedSnapshot) -> Result<usize, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut count = 0;
    for result in reader.deserialize::<RawActualRow>() {
        match result {
            Ok(raw) => {
                if !raw.points.is_finite() {
                    warn!("skipping actuals row for '{}': non-finite points", raw.player_id);
                    continue;
                }
                snapshot.add_actual(PlayerId::new(raw.player_id), Week(raw.week), raw.points);
                count += 1;
            }
            Err(e) => {
                warn!("skipping malformed actuals row: {}", e);
            }
        }
    }
    Ok(count)
}

fn load_availability_from_reader<R: Read>(
    rdr: R,
    snapshot: &mut FeedSnapshot,
) -> Result<usize, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut count = 0;
    for result in reader.deserialize::<RawAvailabilityRow>() {
        match result {
            Ok(raw) => {
                let Some(status) = Availability::from_status(&raw.status) else {
                    warn!(
                        "skipping availability row for '{}': unknown status '{}'",
                        raw.player_id, raw.status
                    );
                    continue;
                };
                snapshot.set_availability(PlayerId::new(raw.player_id), Week(raw.week), status);
                count += 1;
            }
            Err(e) => {
                warn!("skipping malformed availability row: {}", e);
            }
        }
    }
    Ok(count)
}

fn load_lineup_from_reader<R: Read>(rdr: R) -> Result<BTreeMap<String, PlayerId>, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut lineup = BTreeMap::new();
    for result in reader.deserialize::<RawLineupRow>() {
        match result {
            Ok(raw) if raw.player_id.is_empty() => continue,
            Ok(raw) => {
                lineup.insert(raw.slot.to_uppercase(), PlayerId::new(raw.player_id));
            }
            Err(e) => {
                warn!("skipping malformed lineup row: {}", e);
            }
        }
    }
    Ok(lineup)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, FeedError> {
    std::fs::File::open(path).map_err(|e| FeedError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> FeedError + '_ {
    move |e| FeedError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load the roster: `player_id, name, position[, eligible]`.
pub fn load_players(path: &Path) -> Result<Vec<RosterEntry>, FeedError> {
    let entries = load_players_from_reader(open(path)?).map_err(csv_error(path))?;
    info!("Loaded {} rostered players from {}", entries.len(), path.display());
    Ok(entries)
}

/// Merge recent actuals (`player_id, week, points`) into `snapshot`.
pub fn load_actuals(path: &Path, snapshot: &mut FeedSnapshot) -> Result<usize, FeedError> {
    let count = load_actuals_from_reader(open(path)?, snapshot).map_err(csv_error(path))?;
    info!("Loaded {} actual scores from {}", count, path.display());
    Ok(count)
}

/// Merge availability (`player_id, week, status`) into `snapshot`.
pub fn load_availability(path: &Path, snapshot: &mut FeedSnapshot) -> Result<usize, FeedError> {
    let count = load_availability_from_reader(open(path)?, snapshot).map_err(csv_error(path))?;
    info!("Loaded {} availability entries from {}", count, path.display());
    Ok(count)
}

/// Load the caller's current lineup (`slot, player_id`). Slot names are
/// upper-cased to match generated slot names.
pub fn load_current_lineup(path: &Path) -> Result<BTreeMap<String, PlayerId>, FeedError> {
    load_lineup_from_reader(open(path)?).map_err(csv_error(path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, week: u16, source: &str, points: f64) -> ProjectionRecord {
        ProjectionRecord {
            player_id: id.into(),
            week: Week(week),
            projection: SourceProjection::points(source, points),
        }
    }

    // -- Players --

    #[test]
    fn players_csv_with_eligibility() {
        let csv_data = "\
player_id,name,position,eligible
p1,Dual Threat,RB,WR
p2,Signal Caller,QB,
p3,Slash,WR,RB/TE";

        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 3);
        assert_eq!(players[0].primary_position, Position::RunningBack);
        assert_eq!(players[0].extra_positions, vec![Position::WideReceiver]);
        assert!(players[1].extra_positions.is_empty());
        assert_eq!(
            players[2].extra_positions,
            vec![Position::RunningBack, Position::TightEnd]
        );
    }

    #[test]
    fn defense_eligibility_with_slash_kept_whole() {
        let csv_data = "\
player_id,name,position,eligible
d1,Return Specialist,WR,D/ST
d2,Utility,RB,wr/d/st";

        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players[0].extra_positions, vec![Position::Defense]);
        assert_eq!(
            players[1].extra_positions,
            vec![Position::WideReceiver, Position::Defense]
        );
    }

    #[test]
    fn players_csv_without_eligible_column() {
        let csv_data = "\
id,Name,pos
d1,Home Defense,DST";

        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].primary_position, Position::Defense);
    }

    #[test]
    fn players_with_unknown_position_skipped() {
        let csv_data = "\
player_id,name,position
p1,Linebacker,LB
p2,Kicker,K";

        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id.as_str(), "p2");
    }

    // -- Actuals --

    #[test]
    fn actuals_before_target_week_most_recent_last() {
        let csv_data = "\
player_id,week,points
p1,1,4.0
p1,3,12.0
p1,2,8.0
p1,4,20.0
p1,5,30.0";

        let mut snapshot = FeedSnapshot::new();
        let count = load_actuals_from_reader(csv_data.as_bytes(), &mut snapshot).unwrap();
        assert_eq!(count, 5);
        assert_eq!(snapshot.recent_actuals(&"p1".into(), Week(5), 3), vec![8.0, 12.0, 20.0]);
        assert_eq!(snapshot.recent_actuals(&"p1".into(), Week(3), 3), vec![4.0, 8.0]);
        assert!(snapshot.recent_actuals(&"p1".into(), Week(1), 3).is_empty());
        assert!(snapshot.recent_actuals(&"nobody".into(), Week(5), 3).is_empty());
    }

    #[test]
    fn malformed_actuals_rows_skipped() {
        let csv_data = "\
player_id,week,points
p1,1,abc
p1,2,6.5";

        let mut snapshot = FeedSnapshot::new();
        let count = load_actuals_from_reader(csv_data.as_bytes(), &mut snapshot).unwrap();
        assert_eq!(count, 1);
        assert_eq!(snapshot.recent_actuals(&"p1".into(), Week(3), 3), vec![6.5]);
    }

    // -- Availability --

    #[test]
    fn availability_statuses_parsed() {
        let csv_data = "\
player_id,week,status
p1,7,BYE
p2,7,O
p3,7,Q
p4,7,maybe";

        let mut snapshot = FeedSnapshot::new();
        let count = load_availability_from_reader(csv_data.as_bytes(), &mut snapshot).unwrap();
        assert_eq!(count, 3);
        assert_eq!(snapshot.availability(&"p1".into(), Week(7)), Some(Availability::Bye));
        assert_eq!(snapshot.availability(&"p2".into(), Week(7)), Some(Availability::Out));
        assert_eq!(snapshot.availability(&"p3".into(), Week(7)), Some(Availability::Active));
        assert_eq!(snapshot.availability(&"p4".into(), Week(7)), None);
        assert_eq!(snapshot.availability(&"p1".into(), Week(8)), None);
    }

    // -- Assembly --

    #[test]
    fn assemble_joins_feeds_for_target_week() {
        let mut snapshot = FeedSnapshot::new();
        snapshot.add_projections([
            record("p1", 7, "alpha", 14.0),
            record("p1", 7, "beta", 16.0),
            record("p1", 8, "alpha", 99.0),
        ]);
        snapshot.add_actual("p1".into(), Week(5), 10.0);
        snapshot.add_actual("p1".into(), Week(6), 18.0);
        snapshot.add_actual("p1".into(), Week(7), 50.0);
        snapshot.set_availability("p2".into(), Week(7), Availability::Bye);

        let mut hybrid = RosterEntry::new("p1", "Hybrid", Position::RunningBack);
        hybrid.extra_positions.push(Position::WideReceiver);
        let entries = vec![hybrid, RosterEntry::new("p2", "Resting", Position::TightEnd)];

        let roster = assemble_roster(&entries, &snapshot, Week(7), 3);
        assert_eq!(roster.len(), 2);

        let p1 = &roster[0];
        assert_eq!(p1.projections.len(), 2);
        assert_eq!(p1.recent_actuals, vec![10.0, 18.0]);
        assert_eq!(p1.availability, Availability::Active);
        assert!(p1.is_eligible(Position::WideReceiver));

        let p2 = &roster[1];
        assert!(p2.projections.is_empty());
        assert_eq!(p2.availability, Availability::Bye);
    }

    #[test]
    fn assemble_respects_actuals_limit() {
        let mut snapshot = FeedSnapshot::new();
        for w in 1..=6 {
            snapshot.add_actual("p1".into(), Week(w), w as f64);
        }
        let entries = vec![RosterEntry::new("p1", "Busy", Position::WideReceiver)];
        let roster = assemble_roster(&entries, &snapshot, Week(7), 3);
        assert_eq!(roster[0].recent_actuals, vec![4.0, 5.0, 6.0]);
    }

    // -- Current lineup --

    #[test]
    fn current_lineup_csv() {
        let csv_data = "\
slot,player_id
qb,p1
FLEX,p7
TE,";

        let lineup = load_lineup_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(lineup.len(), 2);
        assert_eq!(lineup["QB"], PlayerId::from("p1"));
        assert_eq!(lineup["FLEX"], PlayerId::from("p7"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_players(Path::new("/nonexistent/players.csv")).unwrap_err();
        assert!(matches!(err, FeedError::Io { .. }));
    }
}
