//! Confidence models
//!
//! Three strategies share one calculator:
//! - offset decay, for samples matched to a point from a nearby observation
//! - pairwise gap, for a sample synthesized from a single bracketing pair
//! - batch density, for samples produced by resampling a whole series

use serde::{Deserialize, Serialize};

use crate::config::ConfidenceConfig;

/// Share of batch confidence driven by the ratio of original points
pub const BATCH_DENSITY_WEIGHT: f64 = 0.8;
pub const BATCH_DENSITY_BASE: f64 = 0.2;
pub const BATCH_GAP_DISCOUNT_FLOOR: f64 = 0.3;

/// Inputs selecting and parameterising a confidence model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ConfidenceStrategy {
    Offset {
        interpolated: bool,
        time_offset_hours: f64,
        location_offset_km: f64,
    },
    PairwiseGap {
        gap_km: f64,
    },
    BatchDensity {
        original_ratio: f64,
        max_gap_hours: f64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ConfidenceCalculator {
    config: ConfidenceConfig,
}

impl ConfidenceCalculator {
    #[must_use]
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    /// Confidence in (0, 1] for the chosen strategy
    #[must_use]
    pub fn score(&self, strategy: ConfidenceStrategy) -> f64 {
        match strategy {
            ConfidenceStrategy::Offset {
                interpolated,
                time_offset_hours,
                location_offset_km,
            } => self.offset_decay(interpolated, time_offset_hours, location_offset_km),
            ConfidenceStrategy::PairwiseGap { gap_km } => self.pairwise_gap(gap_km),
            ConfidenceStrategy::BatchDensity {
                original_ratio,
                max_gap_hours,
            } => self.batch_density(original_ratio, max_gap_hours),
        }
    }

    /// 1.0 minus penalties for interpolation, time beyond the grace period and
    /// distance beyond the grace radius; floored.
    #[must_use]
    pub fn offset_decay(
        &self,
        interpolated: bool,
        time_offset_hours: f64,
        location_offset_km: f64,
    ) -> f64 {
        let c = &self.config;
        let mut confidence = 1.0;

        if interpolated {
            confidence -= c.interpolation_penalty;
        }

        let hours_over = (time_offset_hours.abs() - c.time_grace_hours).max(0.0);
        confidence -= (hours_over * c.time_penalty_per_hour).min(c.max_time_penalty);

        let km_over = (location_offset_km.abs() - c.location_grace_km).max(0.0);
        confidence -= (km_over * c.location_penalty_per_km).min(c.max_location_penalty);

        self.bounded(confidence)
    }

    /// Shrinks linearly as the bracketing gap widens
    #[must_use]
    pub fn pairwise_gap(&self, gap_km: f64) -> f64 {
        let c = &self.config;
        self.bounded((1.0 - gap_km.abs() / c.gap_reference_km).max(c.gap_floor))
    }

    /// Density of original points across a resampled series, discounted when
    /// any gap between originals exceeds the threshold
    #[must_use]
    pub fn batch_density(&self, original_ratio: f64, max_gap_hours: f64) -> f64 {
        let c = &self.config;
        let mut confidence =
            original_ratio.clamp(0.0, 1.0) * BATCH_DENSITY_WEIGHT + BATCH_DENSITY_BASE;

        if max_gap_hours > c.batch_gap_threshold_hours {
            let discount = 1.0
                - (max_gap_hours - c.batch_gap_threshold_hours) * c.batch_gap_penalty_per_hour;
            confidence *= discount.max(BATCH_GAP_DISCOUNT_FLOOR);
        }

        self.bounded(confidence)
    }

    /// Confidence of a value derived from two sources: never above the weaker
    /// source minus the interpolation penalty
    #[must_use]
    pub fn derived_from(&self, model_confidence: f64, source_a: f64, source_b: f64) -> f64 {
        let cap = source_a.min(source_b) - self.config.interpolation_penalty;
        self.bounded(model_confidence.min(cap))
    }

    #[must_use]
    pub fn is_low(&self, confidence: f64) -> bool {
        confidence < self.config.low_confidence_threshold
    }

    fn bounded(&self, confidence: f64) -> f64 {
        if confidence.is_nan() {
            return self.config.floor;
        }
        confidence.clamp(self.config.floor, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[rstest]
    #[case(false, 0.0, 0.0, 1.0)]
    #[case(true, 0.0, 0.0, 0.8)]
    #[case(false, 2.0, 10.0, 1.0)]
    #[case(false, 4.0, 0.0, 0.9)]
    #[case(false, 20.0, 0.0, 0.7)]
    #[case(false, 0.0, 30.0, 0.8)]
    #[case(false, 0.0, 500.0, 0.8)]
    #[case(true, 20.0, 500.0, 0.3)]
    fn test_offset_decay(
        #[case] interpolated: bool,
        #[case] hours: f64,
        #[case] km: f64,
        #[case] expected: f64,
    ) {
        let calc = ConfidenceCalculator::default();
        let got = calc.offset_decay(interpolated, hours, km);
        assert!(approx(got, expected), "got {got}, expected {expected}");
    }

    #[test]
    fn test_offset_decay_floor() {
        let mut config = ConfidenceConfig::default();
        config.interpolation_penalty = 0.8;
        let calc = ConfidenceCalculator::new(config);
        assert!(approx(calc.offset_decay(true, 100.0, 1000.0), 0.1));
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(50.0, 0.75)]
    #[case(140.0, 0.3)]
    #[case(300.0, 0.3)]
    fn test_pairwise_gap(#[case] gap_km: f64, #[case] expected: f64) {
        let got = ConfidenceCalculator::default().pairwise_gap(gap_km);
        assert!(approx(got, expected), "got {got}, expected {expected}");
    }

    #[rstest]
    #[case(1.0, 1.0, 1.0)]
    #[case(0.5, 3.0, 0.6)]
    #[case(0.5, 8.0, 0.48)]
    #[case(0.0, 30.0, 0.1)]
    fn test_batch_density(#[case] ratio: f64, #[case] gap_hours: f64, #[case] expected: f64) {
        let got = ConfidenceCalculator::default().batch_density(ratio, gap_hours);
        assert!(approx(got, expected), "got {got}, expected {expected}");
    }

    #[test]
    fn test_derived_confidence_stays_below_sources() {
        let calc = ConfidenceCalculator::default();
        let derived = calc.derived_from(1.0, 1.0, 0.9);
        assert!(approx(derived, 0.7));
        assert!(derived < 0.9);
    }

    #[test]
    fn test_strategy_dispatch() {
        let calc = ConfidenceCalculator::default();
        assert!(approx(
            calc.score(ConfidenceStrategy::PairwiseGap { gap_km: 100.0 }),
            0.5
        ));
        assert!(calc.is_low(0.5));
        assert!(!calc.is_low(0.6));
    }
}
