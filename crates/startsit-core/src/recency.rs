// Recency enhancement: blend the canonical projection with recent actual
// scores and classify the player's trend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RecencyConfig;
use crate::projection::CanonicalProjection;

// ---------------------------------------------------------------------------
// Behavioral flag
// ---------------------------------------------------------------------------

/// How a player's recent output compares to their projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorFlag {
    BreakoutCandidate,
    TrendingUp,
    DecliningRole,
    HighCeiling,
    Consistent,
    /// No scored weeks to compare against.
    InsufficientData,
    /// Not playable this week (bye or out). Never produced by the enhancer.
    Unavailable,
}

impl BehaviorFlag {
    pub fn label(&self) -> &'static str {
        match self {
            BehaviorFlag::BreakoutCandidate => "BREAKOUT_CANDIDATE",
            BehaviorFlag::TrendingUp => "TRENDING_UP",
            BehaviorFlag::DecliningRole => "DECLINING_ROLE",
            BehaviorFlag::HighCeiling => "HIGH_CEILING",
            BehaviorFlag::Consistent => "CONSISTENT",
            BehaviorFlag::InsufficientData => "INSUFFICIENT_DATA",
            BehaviorFlag::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for BehaviorFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Adjusted projection
// ---------------------------------------------------------------------------

/// Canonical projection plus the recency-adjusted point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedProjection {
    pub canonical: CanonicalProjection,
    pub adjusted_point: f64,
    pub flag: BehaviorFlag,
    /// Weight given to the recent average in `adjusted_point`.
    pub recent_weight: f64,
    /// Mean of the scored weeks used, if any.
    pub recent_average: Option<f64>,
}

impl AdjustedProjection {
    pub fn floor(&self) -> f64 {
        self.canonical.floor
    }

    pub fn ceiling(&self) -> f64 {
        self.canonical.ceiling
    }

    /// Identity adjustment used when there is nothing to blend in.
    pub fn unadjusted(canonical: CanonicalProjection, flag: BehaviorFlag) -> Self {
        AdjustedProjection {
            canonical,
            adjusted_point: canonical.point,
            flag,
            recent_weight: 0.0,
            recent_average: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Enhancement
// ---------------------------------------------------------------------------

/// Mean of the last `max_weeks` scores. Negative scores count as zero.
fn recent_average(actuals: &[f64], max_weeks: usize) -> Option<(f64, usize)> {
    let usable: Vec<f64> = actuals
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let start = usable.len().saturating_sub(max_weeks);
    let window = &usable[start..];
    if window.is_empty() {
        return None;
    }
    let sum: f64 = window.iter().map(|v| v.max(0.0)).sum();
    Some((sum / window.len() as f64, window.len()))
}

/// Recent average over projection. A zero projection with any recent output
/// counts as the strongest positive signal.
fn performance_ratio(recent: f64, point: f64) -> f64 {
    if point > 0.0 {
        recent / point
    } else if recent > 0.0 {
        f64::INFINITY
    } else {
        1.0
    }
}

fn classify(ratio: f64, canonical: &CanonicalProjection, config: &RecencyConfig) -> BehaviorFlag {
    if ratio > config.breakout_ratio {
        BehaviorFlag::BreakoutCandidate
    } else if ratio > config.trending_ratio {
        BehaviorFlag::TrendingUp
    } else if ratio < config.declining_ratio {
        BehaviorFlag::DecliningRole
    } else if canonical.volatility() > config.high_ceiling_band * canonical.point {
        BehaviorFlag::HighCeiling
    } else {
        BehaviorFlag::Consistent
    }
}

/// Blend `canonical` with the player's recent actual scores (most recent
/// last). Pure: identical inputs give identical output.
pub fn enhance(
    canonical: CanonicalProjection,
    recent_actuals: &[f64],
    config: &RecencyConfig,
) -> AdjustedProjection {
    let Some((average, weeks)) = recent_average(recent_actuals, config.max_weeks) else {
        return AdjustedProjection::unadjusted(canonical, BehaviorFlag::InsufficientData);
    };

    let ratio = performance_ratio(average, canonical.point);
    let flag = classify(ratio, &canonical, config);
    let weight = config.recent_weight(weeks);
    let adjusted_point = (1.0 - weight) * canonical.point + weight * average;

    AdjustedProjection {
        canonical,
        adjusted_point,
        flag,
        recent_weight: weight,
        recent_average: Some(average),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn canonical(point: f64, floor: f64, ceiling: f64) -> CanonicalProjection {
        CanonicalProjection {
            point,
            floor,
            ceiling,
            sources: 1,
        }
    }

    /// Tight band so the high-ceiling rule never fires by accident.
    fn steady(point: f64) -> CanonicalProjection {
        canonical(point, point * 0.9, point * 1.1)
    }

    #[test]
    fn breakout_candidate_scenario() {
        let adj = enhance(steady(10.0), &[16.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::BreakoutCandidate);
        assert_eq!(adj.recent_average, Some(16.0));
    }

    #[test]
    fn trending_up() {
        let adj = enhance(steady(10.0), &[12.0, 11.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::TrendingUp);
    }

    #[test]
    fn declining_role() {
        let adj = enhance(steady(20.0), &[10.0, 12.0, 8.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::DecliningRole);
    }

    #[test]
    fn high_ceiling_when_ratio_is_neutral() {
        // ratio 0.9: not trending, not declining; band 12 > 0.5 * 10
        let adj = enhance(canonical(10.0, 4.0, 16.0), &[9.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::HighCeiling);
    }

    #[test]
    fn consistent_otherwise() {
        let adj = enhance(steady(10.0), &[9.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::Consistent);
    }

    #[test]
    fn exact_projection_is_not_trending() {
        let adj = enhance(steady(10.0), &[10.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::Consistent);
    }

    #[test]
    fn ratio_rules_take_priority_over_high_ceiling() {
        let wide = canonical(10.0, 0.0, 40.0);
        let adj = enhance(wide, &[20.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::BreakoutCandidate);
        let adj = enhance(wide, &[2.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::DecliningRole);
    }

    #[test]
    fn no_actuals_means_no_adjustment() {
        let c = steady(12.0);
        let adj = enhance(c, &[], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::InsufficientData);
        assert!(approx_eq(adj.adjusted_point, 12.0));
        assert!(approx_eq(adj.recent_weight, 0.0));
        assert_eq!(adj.recent_average, None);
        assert_eq!(adj.canonical, c);
    }

    #[test]
    fn zero_projection_with_recent_output_is_breakout() {
        let adj = enhance(canonical(0.0, 0.0, 0.0), &[3.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::BreakoutCandidate);
        assert!(adj.adjusted_point > 0.0);
    }

    #[test]
    fn zero_projection_and_zero_output() {
        let adj = enhance(canonical(0.0, 0.0, 0.0), &[0.0, 0.0], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::Consistent);
        assert!(approx_eq(adj.adjusted_point, 0.0));
    }

    #[test]
    fn blend_uses_configured_weight() {
        let config = RecencyConfig::default();
        // two weeks -> weight 0.4
        let adj = enhance(steady(10.0), &[20.0, 10.0], &config);
        assert!(approx_eq(adj.recent_weight, 0.4));
        assert!(approx_eq(adj.adjusted_point, 0.6 * 10.0 + 0.4 * 15.0));
    }

    #[test]
    fn only_last_max_weeks_are_used() {
        let config = RecencyConfig::default();
        let adj = enhance(steady(10.0), &[100.0, 10.0, 10.0, 10.0], &config);
        assert_eq!(adj.recent_average, Some(10.0));
        assert!(approx_eq(adj.recent_weight, config.recent_weight(3)));
    }

    #[test]
    fn projection_never_fully_discarded() {
        let config = RecencyConfig {
            weight_per_week: 0.5,
            ..RecencyConfig::default()
        };
        let adj = enhance(steady(10.0), &[30.0, 30.0, 30.0], &config);
        assert!(adj.recent_weight <= config.max_recent_weight);
        assert!(adj.adjusted_point < 30.0);
    }

    #[test]
    fn more_weeks_never_lower_the_weight() {
        let config = RecencyConfig::default();
        let mut last = 0.0;
        for n in 1..=5 {
            let actuals = vec![15.0; n];
            let adj = enhance(steady(10.0), &actuals, &config);
            assert!(adj.recent_weight >= last);
            last = adj.recent_weight;
        }
    }

    #[test]
    fn negative_actuals_count_as_zero() {
        let adj = enhance(steady(10.0), &[-4.0, 8.0], &RecencyConfig::default());
        assert_eq!(adj.recent_average, Some(4.0));
    }

    #[test]
    fn non_finite_actuals_ignored() {
        let adj = enhance(steady(10.0), &[f64::NAN], &RecencyConfig::default());
        assert_eq!(adj.flag, BehaviorFlag::InsufficientData);
    }

    #[test]
    fn enhance_is_deterministic() {
        let config = RecencyConfig::default();
        let a = enhance(steady(13.0), &[9.0, 17.5], &config);
        let b = enhance(steady(13.0), &[9.0, 17.5], &config);
        assert_eq!(a, b);
    }

    #[test]
    fn flag_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&BehaviorFlag::BreakoutCandidate).unwrap();
        assert_eq!(json, "\"BREAKOUT_CANDIDATE\"");
        assert_eq!(BehaviorFlag::Unavailable.to_string(), "UNAVAILABLE");
    }
}
