// startsit entry point.
//
// Startup sequence:
// 1. Parse arguments (unknown strategies are rejected here)
// 2. Initialize tracing (stderr, so stdout carries only the report)
// 3. Load config and build lineup slots from the league roster
// 4. Load projection sources and the actuals/availability/player feeds
// 5. Optimize each requested week on a blocking worker
// 6. Print reports (table or JSON) in week order

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use startsit_core::changes::{lineup_changes, LineupChanges};
use startsit_core::config::{self, EngineConfig};
use startsit_core::feeds::{self, FeedSnapshot, RosterEntry};
use startsit_core::player::{PlayerId, Week};
use startsit_core::projection::sources::load_all_sources;
use startsit_core::roster::{slots_from_league, RosterSlot};
use startsit_core::strategy::Strategy;
use startsit_core::{optimize_lineup, OptimizationReport};

/// startsit - weekly fantasy football lineup optimizer.
#[derive(Parser, Debug)]
#[command(name = "startsit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the engine configuration file
    #[arg(short, long, default_value = "engine.toml")]
    config: PathBuf,

    /// Rostered players CSV (player_id, name, position[, eligible])
    #[arg(long)]
    players: PathBuf,

    /// Recent actual scores CSV (player_id, week, points)
    #[arg(long)]
    actuals: Option<PathBuf>,

    /// Availability CSV (player_id, week, status)
    #[arg(long)]
    availability: Option<PathBuf>,

    /// Target week; repeat to optimize several weeks
    #[arg(short, long = "week", required = true)]
    weeks: Vec<u16>,

    /// Risk posture: conservative, aggressive or balanced
    #[arg(short, long, default_value = "balanced")]
    strategy: Strategy,

    /// Current lineup CSV (slot, player_id) to diff against
    #[arg(long)]
    current: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// One week's result as printed.
#[derive(Serialize)]
struct WeekOutput {
    report: OptimizationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<LineupChanges>,
}

#[derive(Serialize)]
struct JsonOutput {
    generated_at: DateTime<Utc>,
    weeks: Vec<WeekOutput>,
}

/// Shared, read-only inputs for every week's optimization.
struct Inputs {
    config: EngineConfig,
    slots: Vec<RosterSlot>,
    entries: Vec<RosterEntry>,
    snapshot: FeedSnapshot,
    current: Option<BTreeMap<String, PlayerId>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse arguments
    let cli = Cli::parse();

    // 2. Initialize tracing
    init_tracing()?;

    // 3-4. Load everything
    let inputs = Arc::new(load_inputs(&cli)?);

    // 5. One blocking worker per week; results collected in week order
    let mut weeks = cli.weeks.clone();
    weeks.sort_unstable();
    weeks.dedup();

    let mut handles = Vec::with_capacity(weeks.len());
    for week in weeks {
        let inputs = Arc::clone(&inputs);
        let strategy = cli.strategy;
        handles.push(tokio::task::spawn_blocking(move || run_week(&inputs, Week(week), strategy)));
    }

    let mut outputs = Vec::with_capacity(handles.len());
    for handle in handles {
        let output = handle.await.context("optimization worker panicked")??;
        outputs.push(output);
    }

    // 6. Print
    if cli.json {
        let doc = JsonOutput {
            generated_at: Utc::now(),
            weeks: outputs,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).context("failed to serialize report")?
        );
    } else {
        for (i, output) in outputs.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{}", output.report);
            if let Some(changes) = &output.changes {
                println!();
                println!("{}", changes);
            }
        }
    }

    Ok(())
}

fn load_inputs(cli: &Cli) -> anyhow::Result<Inputs> {
    let config = config::load_config_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    info!(
        "Config loaded: league={}, {} sources, baseline={:?}",
        config.league.name,
        config.sources.len(),
        config.baseline.method
    );

    let slots = slots_from_league(&config.league).context("invalid league roster")?;
    info!(
        "Lineup slots: {}",
        slots.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let mut snapshot = FeedSnapshot::new();
    snapshot.add_projections(load_all_sources(&config).context("failed to load projections")?);
    info!("Projections cover {} player-weeks", snapshot.projection_count());

    if let Some(path) = &cli.actuals {
        feeds::load_actuals(path, &mut snapshot).context("failed to load recent actuals")?;
    }
    if let Some(path) = &cli.availability {
        feeds::load_availability(path, &mut snapshot).context("failed to load availability")?;
    }

    let entries = feeds::load_players(&cli.players).context("failed to load players")?;
    anyhow::ensure!(!entries.is_empty(), "no valid players in {}", cli.players.display());

    let current = cli
        .current
        .as_deref()
        .map(feeds::load_current_lineup)
        .transpose()
        .context("failed to load current lineup")?;

    Ok(Inputs {
        config,
        slots,
        entries,
        snapshot,
        current,
    })
}

fn run_week(inputs: &Inputs, week: Week, strategy: Strategy) -> anyhow::Result<WeekOutput> {
    let roster = feeds::assemble_roster(
        &inputs.entries,
        &inputs.snapshot,
        week,
        inputs.config.recency.max_weeks,
    );
    let report = optimize_lineup(&roster, &inputs.slots, strategy, week, &inputs.config)
        .with_context(|| format!("failed to optimize {}", week))?;
    let changes = inputs
        .current
        .as_ref()
        .map(|current| lineup_changes(current, &report));
    Ok(WeekOutput { report, changes })
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("startsit=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
