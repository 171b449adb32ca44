// Library root: re-exports all modules so the CLI and integration tests can
// access the engine's public API.

pub mod availability;
pub mod baseline;
pub mod changes;
pub mod config;
pub mod engine;
pub mod feeds;
pub mod player;
pub mod projection;
pub mod recency;
pub mod roster;
pub mod solver;
pub mod strategy;

pub use engine::{optimize_lineup, optimize_lineup_named, EngineError, OptimizationReport, PlayerReport};
