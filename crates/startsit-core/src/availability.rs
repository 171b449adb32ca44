// Bye/availability filter. Runs after recency enhancement and before
// positional baselines are computed.

use tracing::debug;

use crate::player::{Availability, PlayerId};
use crate::projection::CanonicalProjection;
use crate::recency::{AdjustedProjection, BehaviorFlag};

/// Zero out a player who cannot play this week.
///
/// Bye and out players get a zero point/floor/ceiling and the `Unavailable`
/// flag, replacing whatever trend flag the enhancer assigned. Active players
/// pass through untouched.
pub fn apply_availability(
    player_id: &PlayerId,
    status: Availability,
    adjusted: AdjustedProjection,
) -> AdjustedProjection {
    match status {
        Availability::Active => adjusted,
        Availability::Bye | Availability::Out => {
            debug!(
                "player {} is {:?}, overriding {} with UNAVAILABLE",
                player_id, status, adjusted.flag
            );
            AdjustedProjection {
                canonical: CanonicalProjection {
                    sources: adjusted.canonical.sources,
                    ..CanonicalProjection::zero()
                },
                adjusted_point: 0.0,
                flag: BehaviorFlag::Unavailable,
                recent_weight: adjusted.recent_weight,
                recent_average: adjusted.recent_average,
            }
        }
    }
}
