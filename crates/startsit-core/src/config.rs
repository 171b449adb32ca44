// Engine configuration loading and validation (engine.toml).

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Every tunable of the engine. All sections default, so an empty file is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub projection: ProjectionConfig,
    pub recency: RecencyConfig,
    pub baseline: BaselineConfig,
    pub strategy: StrategyWeights,
    pub solver: SolverConfig,
    pub scoring: ScoringConfig,
    pub league: LeagueConfig,
    pub sources: Vec<SourceConfig>,
}

// ---------------------------------------------------------------------------
// [projection]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Floor as a fraction of the point estimate when only one source
    /// reports and it publishes no distribution.
    pub floor_factor: f64,
    /// Ceiling as a multiple of the point estimate, same conditions.
    pub ceiling_factor: f64,
    /// Weight per source id in the multi-source average. Sources not listed
    /// weigh 1.0, so the default is a simple mean.
    pub source_weights: HashMap<String, f64>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            floor_factor: 0.85,
            ceiling_factor: 1.25,
            source_weights: HashMap::new(),
        }
    }
}

impl ProjectionConfig {
    pub fn source_weight(&self, source: &str) -> f64 {
        self.source_weights.get(source).copied().unwrap_or(1.0)
    }
}

// ---------------------------------------------------------------------------
// [recency]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecencyConfig {
    /// How many of the most recent scored weeks are considered.
    pub max_weeks: usize,
    /// Weight given to the recent average per available week.
    pub weight_per_week: f64,
    /// Hard cap on the recent-performance weight.
    pub max_recent_weight: f64,
    pub breakout_ratio: f64,
    pub trending_ratio: f64,
    pub declining_ratio: f64,
    /// Volatility band (ceiling - floor) relative to the point estimate
    /// above which a player is flagged high-ceiling.
    pub high_ceiling_band: f64,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        RecencyConfig {
            max_weeks: 3,
            weight_per_week: 0.2,
            max_recent_weight: 0.7,
            breakout_ratio: 1.5,
            trending_ratio: 1.0,
            declining_ratio: 0.7,
            high_ceiling_band: 0.5,
        }
    }
}

impl RecencyConfig {
    /// Blend weight for the recent average given `weeks` scored weeks.
    ///
    /// Non-decreasing in `weeks` and never above `max_recent_weight`.
    pub fn recent_weight(&self, weeks: usize) -> f64 {
        let weeks = weeks.min(self.max_weeks);
        (self.weight_per_week * weeks as f64).min(self.max_recent_weight)
    }
}

// ---------------------------------------------------------------------------
// [baseline]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMethod {
    /// Median adjusted score of the active pool at the position.
    #[default]
    Median,
    /// Score of the best active player who would not start at the position
    /// given the league's dedicated slots for it.
    Replacement,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub method: BaselineMethod,
}

// ---------------------------------------------------------------------------
// [strategy]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    /// Conservative: score = w * floor + (1 - w) * adjusted point.
    pub conservative_floor_weight: f64,
    /// Aggressive: score = (1 - w) * adjusted point + w * ceiling.
    pub aggressive_ceiling_weight: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        StrategyWeights {
            conservative_floor_weight: 0.7,
            aggressive_ceiling_weight: 0.7,
        }
    }
}

// ---------------------------------------------------------------------------
// [solver]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Upper bound on local-improvement passes after the greedy fill.
    pub max_improvement_passes: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_improvement_passes: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// [scoring]
// ---------------------------------------------------------------------------

/// Points-per-reception flavor of the league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringType {
    #[default]
    Standard,
    HalfPpr,
    Ppr,
}

impl ScoringType {
    pub fn points_per_reception(&self) -> f64 {
        match self {
            ScoringType::Standard => 0.0,
            ScoringType::HalfPpr => 0.5,
            ScoringType::Ppr => 1.0,
        }
    }
}

/// League scoring rules used to turn raw stat lines into fantasy points.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    #[serde(rename = "type")]
    pub scoring_type: ScoringType,
    pub pass_yard: f64,
    pub pass_td: f64,
    pub interception: f64,
    pub rush_yard: f64,
    pub rush_td: f64,
    pub rec_yard: f64,
    pub rec_td: f64,
    pub fumble_lost: f64,
    /// Overrides the per-reception value implied by `type` when set.
    pub reception: Option<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            scoring_type: ScoringType::Standard,
            pass_yard: 0.04,
            pass_td: 4.0,
            interception: -2.0,
            rush_yard: 0.1,
            rush_td: 6.0,
            rec_yard: 0.1,
            rec_td: 6.0,
            fumble_lost: -2.0,
            reception: None,
        }
    }
}

impl ScoringConfig {
    pub fn reception_points(&self) -> f64 {
        self.reception
            .unwrap_or_else(|| self.scoring_type.points_per_reception())
    }
}

// ---------------------------------------------------------------------------
// [league]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub name: String,
    /// Roster key -> slot count, e.g. `{ QB = 1, RB = 2, FLEX = 1, BN = 6 }`.
    pub roster: BTreeMap<String, usize>,
    /// Slots with an explicit eligibility list, appended after `roster`.
    pub custom_slots: Vec<CustomSlot>,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        let mut roster = BTreeMap::new();
        roster.insert("QB".into(), 1);
        roster.insert("RB".into(), 2);
        roster.insert("WR".into(), 2);
        roster.insert("TE".into(), 1);
        roster.insert("FLEX".into(), 1);
        roster.insert("K".into(), 1);
        roster.insert("DEF".into(), 1);
        roster.insert("BN".into(), 6);
        roster.insert("IR".into(), 1);
        LeagueConfig {
            name: "Default League".into(),
            roster,
            custom_slots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomSlot {
    pub name: String,
    pub eligible: Vec<String>,
}

// ---------------------------------------------------------------------------
// [[sources]]
// ---------------------------------------------------------------------------

/// Which adapter parses a projection source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// `player_id, week, points[, floor, ceiling]`
    Points,
    /// Per-player stat line scored with `[scoring]`.
    StatLine,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub format: SourceFormat,
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate an engine config file.
///
/// Relative source paths are resolved against the config file's directory.
pub fn load_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let mut config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(dir) = path.parent() {
        for source in &mut config.sources {
            if source.path.is_relative() {
                source.path = dir.join(&source.path);
            }
        }
    }

    validate(&config)?;
    Ok(config)
}

/// Parse config text without touching the filesystem or validating.
pub fn parse_config(text: &str) -> Result<EngineConfig, toml::de::Error> {
    toml::from_str(text)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message,
    }
}

pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    // Projection band
    let proj = &config.projection;
    if !(0.0..=1.0).contains(&proj.floor_factor) {
        return Err(invalid(
            "projection.floor_factor",
            format!("must be between 0.0 and 1.0 inclusive, got {}", proj.floor_factor),
        ));
    }
    if !proj.ceiling_factor.is_finite() || proj.ceiling_factor < 1.0 {
        return Err(invalid(
            "projection.ceiling_factor",
            format!("must be >= 1.0, got {}", proj.ceiling_factor),
        ));
    }
    // BTreeMap iteration keeps the reported field stable when several are bad.
    let weights: BTreeMap<_, _> = proj.source_weights.iter().collect();
    for (source, &weight) in weights {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(invalid(
                &format!("projection.source_weights.{source}"),
                format!("must be > 0, got {weight}"),
            ));
        }
    }

    // Recency blend and flag thresholds
    let rec = &config.recency;
    if rec.max_weeks == 0 {
        return Err(invalid("recency.max_weeks", "must be greater than 0".into()));
    }
    let unit_fields: &[(&str, f64)] = &[
        ("recency.weight_per_week", rec.weight_per_week),
        ("recency.max_recent_weight", rec.max_recent_weight),
        ("strategy.conservative_floor_weight", config.strategy.conservative_floor_weight),
        ("strategy.aggressive_ceiling_weight", config.strategy.aggressive_ceiling_weight),
    ];
    for (name, val) in unit_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(
                name,
                format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            ));
        }
    }
    if rec.max_recent_weight >= 1.0 {
        return Err(invalid(
            "recency.max_recent_weight",
            "must be < 1.0 so the projection is never fully discarded".into(),
        ));
    }
    if !(rec.declining_ratio > 0.0
        && rec.declining_ratio < rec.trending_ratio
        && rec.trending_ratio < rec.breakout_ratio)
    {
        return Err(invalid(
            "recency",
            format!(
                "ratios must satisfy 0 < declining < trending < breakout, got {} / {} / {}",
                rec.declining_ratio, rec.trending_ratio, rec.breakout_ratio
            ),
        ));
    }
    if !rec.high_ceiling_band.is_finite() || rec.high_ceiling_band <= 0.0 {
        return Err(invalid(
            "recency.high_ceiling_band",
            format!("must be > 0, got {}", rec.high_ceiling_band),
        ));
    }

    if config.solver.max_improvement_passes == 0 {
        return Err(invalid(
            "solver.max_improvement_passes",
            "must be greater than 0".into(),
        ));
    }

    if let Some(rec_pts) = config.scoring.reception {
        if !rec_pts.is_finite() || rec_pts < 0.0 {
            return Err(invalid(
                "scoring.reception",
                format!("must be >= 0, got {rec_pts}"),
            ));
        }
    }

    for (i, source) in config.sources.iter().enumerate() {
        if source.id.trim().is_empty() {
            return Err(invalid(&format!("sources[{i}].id"), "must not be empty".into()));
        }
        if config.sources[..i].iter().any(|s| s.id == source.id) {
            return Err(invalid(
                &format!("sources[{i}].id"),
                format!("duplicate source id '{}'", source.id),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
