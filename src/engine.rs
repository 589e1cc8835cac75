//! Route-weather engine facade
//!
//! Wires the components together from one [`RouteWeatherConfig`] and exposes
//! every operation, plus [`RouteWeatherEngine::integrate`] which runs the whole
//! pipeline for a route and its forecast pool.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::Result;
use crate::analysis::{PatternDetector, TravelRiskAssessment, assess_travel_mode_risk};
use crate::config::RouteWeatherConfig;
use crate::interpolation::{
    AnchoredSample, BatchInterpolation, ConfidenceCalculator, Interpolator, resample,
};
use crate::matcher::{WeatherMatch, WeatherMatcher};
use crate::models::{
    Route, RouteTimeline, RouteTimelinePoint, SegmentWeatherAlignment, TravelMode,
    ValidationResult, WeatherForecast, WeatherPatternChange, WeatherSample, Waypoint,
};
use crate::sampling::SamplingPointSelector;
use crate::timeline::TimelineSynchronizer;
use crate::validation;

/// Everything the engine derives for one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteWeatherReport {
    pub sampling_points: Vec<Waypoint>,
    pub timeline: RouteTimeline,
    pub segments: Vec<SegmentWeatherAlignment>,
    pub validation: ValidationResult,
    pub pattern_changes: Vec<WeatherPatternChange>,
    pub risk: TravelRiskAssessment,
    /// Timeline points below the low-confidence threshold
    pub low_confidence_points: usize,
}

#[derive(Debug, Clone)]
pub struct RouteWeatherEngine {
    config: RouteWeatherConfig,
    sampler: SamplingPointSelector,
    matcher: WeatherMatcher,
    interpolator: Interpolator,
    synchronizer: TimelineSynchronizer,
    patterns: PatternDetector,
}

impl Default for RouteWeatherEngine {
    fn default() -> Self {
        Self::new(RouteWeatherConfig::default())
    }
}

impl RouteWeatherEngine {
    #[must_use]
    pub fn new(config: RouteWeatherConfig) -> Self {
        let confidence = ConfidenceCalculator::new(config.confidence.clone());
        let matcher = WeatherMatcher::new(config.matching.clone(), confidence.clone());
        let interpolator = Interpolator::new(confidence);

        Self {
            sampler: SamplingPointSelector::new(config.sampling.clone()),
            synchronizer: TimelineSynchronizer::new(matcher.clone(), interpolator.clone()),
            patterns: PatternDetector::new(config.patterns.clone()),
            matcher,
            interpolator,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouteWeatherConfig {
        &self.config
    }

    #[instrument(skip_all, fields(waypoints = route.waypoints.len(), mode = %route.travel_mode))]
    pub fn select_sampling_points(
        &self,
        route: &Route,
        interval_override_km: Option<f64>,
    ) -> Result<Vec<Waypoint>> {
        self.sampler.select(route, interval_override_km)
    }

    #[instrument(
        skip_all,
        fields(distance_km = waypoint.distance_from_start, candidates = pool.len())
    )]
    pub fn match_weather(
        &self,
        waypoint: &Waypoint,
        target_time: DateTime<Utc>,
        pool: &[WeatherForecast],
    ) -> Result<WeatherMatch> {
        self.matcher.match_weather(waypoint, target_time, pool)
    }

    #[must_use]
    pub fn interpolate_spatial(
        &self,
        a: &AnchoredSample,
        b: &AnchoredSample,
        target: &Waypoint,
    ) -> WeatherSample {
        self.interpolator.interpolate_spatial(a, b, target)
    }

    #[must_use]
    pub fn interpolate_temporal(
        &self,
        a: &WeatherSample,
        b: &WeatherSample,
        target_time: DateTime<Utc>,
    ) -> WeatherSample {
        self.interpolator.interpolate_temporal(a, b, target_time)
    }

    #[instrument(skip_all, fields(waypoints = route.waypoints.len(), forecasts = pool.len()))]
    pub fn build_timeline(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
    ) -> Result<RouteTimeline> {
        self.synchronizer.build_timeline(route, pool, start_time)
    }

    #[instrument(skip_all, fields(forecasts = pool.len(), interval_s = interval.num_seconds()))]
    pub fn build_interval_timeline(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
        interval: Duration,
    ) -> Result<RouteTimeline> {
        self.synchronizer
            .build_interval_timeline(route, pool, start_time, interval)
    }

    #[instrument(skip_all, fields(segments = route.segments.len(), forecasts = pool.len()))]
    pub fn align_segments(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
    ) -> Result<Vec<SegmentWeatherAlignment>> {
        self.synchronizer.align_segments(route, pool, start_time)
    }

    #[instrument(skip_all, fields(waypoints = route.waypoints.len(), forecasts = pool.len()))]
    #[must_use]
    pub fn validate_consistency(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
    ) -> ValidationResult {
        validation::validate_consistency(route, pool, start_time)
    }

    /// Pattern changes scoring at least `sensitivity`, or the configured
    /// threshold when `None`
    #[instrument(skip_all, fields(points = timeline.len()))]
    #[must_use]
    pub fn detect_pattern_changes(
        &self,
        timeline: &[RouteTimelinePoint],
        sensitivity: Option<f64>,
    ) -> Vec<WeatherPatternChange> {
        let threshold = sensitivity.unwrap_or(self.config.patterns.sensitivity_threshold);
        self.patterns.detect(timeline, threshold)
    }

    #[instrument(skip_all, fields(%mode, forecasts = forecasts.len()))]
    #[must_use]
    pub fn assess_travel_mode_risk(
        &self,
        mode: TravelMode,
        forecasts: &[WeatherForecast],
    ) -> TravelRiskAssessment {
        assess_travel_mode_risk(mode, forecasts)
    }

    #[instrument(
        skip_all,
        fields(forecasts = forecasts.len(), interval_s = interval.num_seconds())
    )]
    pub fn resample(
        &self,
        forecasts: &[WeatherForecast],
        interval: Duration,
    ) -> Result<BatchInterpolation> {
        resample(&self.interpolator, forecasts, interval)
    }

    /// Run the full pipeline: sampling, timeline, segment alignment,
    /// validation, pattern changes and travel-mode risk
    #[instrument(
        skip_all,
        fields(
            waypoints = route.waypoints.len(),
            forecasts = pool.len(),
            mode = %route.travel_mode
        )
    )]
    pub fn integrate(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
    ) -> Result<RouteWeatherReport> {
        let sampling_points = self.sampler.select(route, None)?;
        let timeline = self.synchronizer.build_timeline(route, pool, start_time)?;
        let segments = self.synchronizer.align_segments(route, pool, start_time)?;

        let mut validation = validation::validate_consistency(route, pool, start_time);
        let calculator = self.interpolator.confidence();
        let low_confidence_points = timeline
            .iter()
            .filter(|point| calculator.is_low(point.confidence()))
            .count();
        if low_confidence_points > 0 {
            validation.warnings.push(format!(
                "{low_confidence_points} timeline point(s) have confidence below {}",
                calculator.config().low_confidence_threshold
            ));
        }

        let pattern_changes = self
            .patterns
            .detect(&timeline, self.config.patterns.sensitivity_threshold);
        let forecasts: Vec<WeatherForecast> =
            timeline.iter().map(|p| p.forecast().clone()).collect();
        let risk = assess_travel_mode_risk(route.travel_mode, &forecasts);

        info!(
            "Integrated weather for {} waypoints: score {:.2}, {} pattern changes, {} risk",
            timeline.len(),
            validation.data_consistency_score,
            pattern_changes.len(),
            risk.risk_level
        );

        Ok(RouteWeatherReport {
            sampling_points,
            timeline,
            segments,
            validation,
            pattern_changes,
            risk,
            low_confidence_points,
        })
    }
}
