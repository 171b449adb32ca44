// Projection ingestion: per-source adapters and the canonical normalizer.

pub mod normalize;
pub mod sources;

pub use normalize::{normalize_projection, CanonicalProjection, MissingProjectionError};
pub use sources::{ProjectionError, ProjectionRecord};
