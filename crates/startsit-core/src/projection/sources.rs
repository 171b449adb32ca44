// Projection source adapters.
//
// Each upstream schema gets one adapter that turns its rows into
// `ProjectionRecord`s. Nothing past this module knows which provider a number
// came from, only the source id it was registered under.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{EngineConfig, ScoringConfig, SourceConfig, SourceFormat};
use crate::player::{PlayerId, SourceProjection, Week};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One source's projection for one player-week.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRecord {
    pub player_id: PlayerId,
    pub week: Week,
    pub projection: SourceProjection,
}

/// Raw box-score style projection, before league scoring is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatLine {
    pub pass_yds: f64,
    pub pass_td: f64,
    pub pass_int: f64,
    pub rush_yds: f64,
    pub rush_td: f64,
    pub receptions: f64,
    pub rec_yds: f64,
    pub rec_td: f64,
    pub fumbles_lost: f64,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Points schema row. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct RawPointsRow {
    #[serde(alias = "PlayerId", alias = "id")]
    player_id: String,
    #[serde(alias = "Week")]
    week: u16,
    #[serde(alias = "Points", alias = "fpts", alias = "FPTS")]
    points: f64,
    #[serde(default, alias = "Floor", alias = "low")]
    floor: Option<f64>,
    #[serde(default, alias = "Ceiling", alias = "high")]
    ceiling: Option<f64>,
}

/// Stat-line schema row. Missing stat columns read as zero.
#[derive(Debug, Deserialize)]
struct RawStatLineRow {
    #[serde(alias = "PlayerId", alias = "id")]
    player_id: String,
    #[serde(alias = "Week")]
    week: u16,
    #[serde(default)]
    pass_yds: f64,
    #[serde(default)]
    pass_td: f64,
    #[serde(default, alias = "int")]
    pass_int: f64,
    #[serde(default)]
    rush_yds: f64,
    #[serde(default)]
    rush_td: f64,
    #[serde(default, alias = "rec")]
    receptions: f64,
    #[serde(default)]
    rec_yds: f64,
    #[serde(default)]
    rec_td: f64,
    #[serde(default, alias = "fum_lost")]
    fumbles_lost: f64,
}

impl RawStatLineRow {
    fn stat_line(&self) -> StatLine {
        StatLine {
            pass_yds: self.pass_yds,
            pass_td: self.pass_td,
            pass_int: self.pass_int,
            rush_yds: self.rush_yds,
            rush_td: self.rush_td,
            receptions: self.receptions,
            rec_yds: self.rec_yds,
            rec_td: self.rec_td,
            fumbles_lost: self.fumbles_lost,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Fantasy points for a stat line under the league's scoring rules.
///
/// May be negative (turnovers); the normalizer clamps downstream.
pub fn stat_line_points(line: &StatLine, scoring: &ScoringConfig) -> f64 {
    line.pass_yds * scoring.pass_yard
        + line.pass_td * scoring.pass_td
        + line.pass_int * scoring.interception
        + line.rush_yds * scoring.rush_yard
        + line.rush_td * scoring.rush_td
        + line.receptions * scoring.reception_points()
        + line.rec_yds * scoring.rec_yard
        + line.rec_td * scoring.rec_td
        + line.fumbles_lost * scoring.fumble_lost
}

// ---------------------------------------------------------------------------
// Reader-based adapters
// ---------------------------------------------------------------------------

fn load_points_from_reader<R: Read>(
    source_id: &str,
    rdr: R,
) -> Result<Vec<ProjectionRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawPointsRow>() {
        match result {
            Ok(raw) => {
                if !raw.points.is_finite() {
                    warn!(
                        "skipping {} row for '{}': non-finite points",
                        source_id, raw.player_id
                    );
                    continue;
                }
                if raw.player_id.is_empty() {
                    warn!("skipping {} row with empty player id", source_id);
                    continue;
                }
                records.push(ProjectionRecord {
                    player_id: PlayerId::new(raw.player_id),
                    week: Week(raw.week),
                    projection: SourceProjection {
                        source: source_id.to_string(),
                        points: raw.points,
                        floor: raw.floor,
                        ceiling: raw.ceiling,
                    },
                });
            }
            Err(e) => {
                warn!("skipping malformed {} row: {}", source_id, e);
            }
        }
    }
    Ok(records)
}

fn load_stat_lines_from_reader<R: Read>(
    source_id: &str,
    rdr: R,
    scoring: &ScoringConfig,
) -> Result<Vec<ProjectionRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawStatLineRow>() {
        match result {
            Ok(raw) => {
                let points = stat_line_points(&raw.stat_line(), scoring);
                if !points.is_finite() {
                    warn!(
                        "skipping {} row for '{}': non-finite stat value",
                        source_id, raw.player_id
                    );
                    continue;
                }
                if raw.player_id.is_empty() {
                    warn!("skipping {} row with empty player id", source_id);
                    continue;
                }
                records.push(ProjectionRecord {
                    player_id: PlayerId::new(raw.player_id),
                    week: Week(raw.week),
                    projection: SourceProjection::points(source_id, points),
                });
            }
            Err(e) => {
                warn!("skipping malformed {} row: {}", source_id, e);
            }
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load one configured source with the adapter for its format.
pub fn load_source(
    source: &SourceConfig,
    scoring: &ScoringConfig,
) -> Result<Vec<ProjectionRecord>, ProjectionError> {
    let path: &Path = &source.path;
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let records = match source.format {
        SourceFormat::Points => load_points_from_reader(&source.id, file),
        SourceFormat::StatLine => load_stat_lines_from_reader(&source.id, file, scoring),
    }
    .map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    info!("Loaded {} projections from source '{}'", records.len(), source.id);
    Ok(records)
}

/// Load every configured source. At least one source must yield rows.
pub fn load_all_sources(config: &EngineConfig) -> Result<Vec<ProjectionRecord>, ProjectionError> {
    if config.sources.is_empty() {
        return Err(ProjectionError::Validation(
            "no projection sources configured".into(),
        ));
    }
    let mut all = Vec::new();
    for source in &config.sources {
        let records = load_source(source, &config.scoring)?;
        if records.is_empty() {
            warn!("source '{}' produced zero valid rows", source.id);
        }
        all.extend(records);
    }
    if all.is_empty() {
        return Err(ProjectionError::Validation(
            "projection sources produced zero valid rows".into(),
        ));
    }
    Ok(all)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
