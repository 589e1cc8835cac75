//! Spatial and temporal interpolation of weather forecasts
//!
//! Scalar attributes are blended linearly. Wind direction is blended along the
//! shortest arc so that 350° -> 10° passes through 0°. Categorical attributes
//! (condition, description, icon, precipitation type) are a step function:
//! taken from the first source below progress 0.5 and from the second above.

pub mod batch;
pub mod confidence;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo;
use crate::models::{
    Conditions, NamedLocation, Precipitation, Temperature, WeatherForecast, WeatherSample, Wind,
    Waypoint,
};

pub use batch::{BatchInterpolation, resample};
pub use confidence::{ConfidenceCalculator, ConfidenceStrategy};

/// Spans shorter than this are treated as zero-width brackets
const DEGENERATE_SPAN: f64 = 1e-9;

/// A sample pinned to the route position it was resolved for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredSample {
    pub waypoint: Waypoint,
    pub sample: WeatherSample,
}

/// Position of `target` between `start` and `end`, clamped to [0, 1].
/// Degenerate brackets return the midpoint.
#[must_use]
pub fn progress(target: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span.abs() < DEGENERATE_SPAN || !span.is_finite() {
        return 0.5;
    }
    ((target - start) / span).clamp(0.0, 1.0)
}

#[must_use]
pub fn lerp(a: f64, b: f64, progress: f64) -> f64 {
    a + (b - a) * progress
}

/// Interpolate a compass bearing along the shortest arc, normalised into [0, 360)
#[must_use]
pub fn interpolate_wind_direction(from: f64, to: f64, progress: f64) -> f64 {
    let mut diff = to - from;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    (from + diff * progress).rem_euclid(360.0)
}

/// Circular mean of compass bearings, normalised into [0, 360)
#[must_use]
pub fn mean_direction(directions: &[f64]) -> f64 {
    let (sin_sum, cos_sum) = directions.iter().fold((0.0, 0.0), |(s, c), d| {
        let radians = d.to_radians();
        (s + radians.sin(), c + radians.cos())
    });
    sin_sum.atan2(cos_sum).to_degrees().rem_euclid(360.0)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Blend two forecasts at `progress`, rounding each field to its native precision
#[must_use]
pub fn blend_forecasts(
    a: &WeatherForecast,
    b: &WeatherForecast,
    progress: f64,
    location: NamedLocation,
    timestamp: DateTime<Utc>,
) -> WeatherForecast {
    let whole = |x: f64, y: f64| round_to(lerp(x, y, progress), 0);
    let tenth = |x: f64, y: f64| round_to(lerp(x, y, progress), 1);
    let categorical = if progress < 0.5 { a } else { b };

    let direction = round_to(
        interpolate_wind_direction(a.wind.direction, b.wind.direction, progress),
        0,
    )
    .rem_euclid(360.0);

    WeatherForecast {
        location,
        timestamp,
        temperature: Temperature {
            current: whole(a.temperature.current, b.temperature.current),
            feels_like: whole(a.temperature.feels_like, b.temperature.feels_like),
            min: whole(a.temperature.min, b.temperature.min),
            max: whole(a.temperature.max, b.temperature.max),
        },
        conditions: Conditions {
            main: categorical.conditions.main,
            description: categorical.conditions.description.clone(),
            icon: categorical.conditions.icon.clone(),
        },
        precipitation: Precipitation {
            kind: categorical.precipitation.kind,
            probability: whole(a.precipitation.probability, b.precipitation.probability),
            intensity: tenth(a.precipitation.intensity, b.precipitation.intensity),
        },
        wind: Wind {
            speed: tenth(a.wind.speed, b.wind.speed),
            direction,
        },
        humidity: whole(a.humidity, b.humidity),
        visibility: tenth(a.visibility, b.visibility),
    }
}

fn lerp_timestamp(a: DateTime<Utc>, b: DateTime<Utc>, progress: f64) -> DateTime<Utc> {
    let span_ms = (b - a).num_milliseconds() as f64;
    a + chrono::Duration::milliseconds((span_ms * progress).round() as i64)
}

/// Builds interpolated samples and scores their confidence
#[derive(Debug, Clone, Default)]
pub struct Interpolator {
    confidence: ConfidenceCalculator,
}

impl Interpolator {
    #[must_use]
    pub fn new(confidence: ConfidenceCalculator) -> Self {
        Self { confidence }
    }

    #[must_use]
    pub fn confidence(&self) -> &ConfidenceCalculator {
        &self.confidence
    }

    /// Interpolate between two samples bracketing `target` by route distance.
    ///
    /// Confidence follows the pairwise gap model, capped below both sources.
    #[must_use]
    pub fn interpolate_spatial(
        &self,
        a: &AnchoredSample,
        b: &AnchoredSample,
        target: &Waypoint,
    ) -> WeatherSample {
        let start = a.waypoint.distance_from_start;
        let end = b.waypoint.distance_from_start;
        let p = progress(target.distance_from_start, start, end);

        let fa = &a.sample.forecast;
        let fb = &b.sample.forecast;
        let forecast = blend_forecasts(
            fa,
            fb,
            p,
            NamedLocation::interpolated(target.coordinates),
            lerp_timestamp(fa.timestamp, fb.timestamp, p),
        );

        let gap_confidence = self.confidence.pairwise_gap(end - start);
        let confidence =
            self.confidence
                .derived_from(gap_confidence, a.sample.confidence, b.sample.confidence);

        WeatherSample::interpolated(forecast, confidence, [fa.clone(), fb.clone()])
    }

    /// Interpolate between two samples bracketing `target_time`.
    ///
    /// Confidence decays with the offset to the nearer source instant, capped below both sources.
    #[must_use]
    pub fn interpolate_temporal(
        &self,
        a: &WeatherSample,
        b: &WeatherSample,
        target_time: DateTime<Utc>,
    ) -> WeatherSample {
        let fa = &a.forecast;
        let fb = &b.forecast;
        let p = progress(
            target_time.timestamp_millis() as f64,
            fa.timestamp.timestamp_millis() as f64,
            fb.timestamp.timestamp_millis() as f64,
        );

        let location = if fa.location.coordinates == fb.location.coordinates {
            fa.location.clone()
        } else {
            NamedLocation::interpolated(fa.location.coordinates.lerp(&fb.location.coordinates, p))
        };
        let forecast = blend_forecasts(fa, fb, p, location, target_time);

        let nearest_hours = geo::hours_between(target_time, fa.timestamp)
            .min(geo::hours_between(target_time, fb.timestamp));
        let decay = self.confidence.offset_decay(true, nearest_hours, 0.0);
        let confidence = self.confidence.derived_from(decay, a.confidence, b.confidence);

        WeatherSample::interpolated(forecast, confidence, [fa.clone(), fb.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrecipitationType, WeatherCondition};
    use crate::test_support::{BOSTON, MIDWAY, NYC, forecast_at, waypoint};
    use rstest::rstest;

    fn anchored(
        location: (f64, f64),
        km: f64,
        seconds: f64,
        forecast: WeatherForecast,
    ) -> AnchoredSample {
        AnchoredSample {
            waypoint: waypoint(location, km, seconds),
            sample: WeatherSample::observed(forecast, 1.0),
        }
    }

    #[rstest]
    #[case(350.0, 10.0, 0.5, 0.0)]
    #[case(10.0, 350.0, 0.5, 0.0)]
    #[case(350.0, 10.0, 0.25, 355.0)]
    #[case(90.0, 270.0, 0.5, 180.0)]
    #[case(0.0, 90.0, 1.0, 90.0)]
    #[case(200.0, 100.0, 0.5, 150.0)]
    fn test_wind_direction_shortest_arc(
        #[case] from: f64,
        #[case] to: f64,
        #[case] p: f64,
        #[case] expected: f64,
    ) {
        let got = interpolate_wind_direction(from, to, p);
        assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
        assert!((0.0..360.0).contains(&got));
    }

    #[test]
    fn test_mean_direction_wraps_north() {
        let mean = mean_direction(&[350.0, 10.0]);
        assert!(mean < 1e-6 || mean > 360.0 - 1e-6, "unexpected mean {mean}");
        assert!((mean_direction(&[80.0, 100.0]) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_clamps_and_handles_degenerate_span() {
        assert_eq!(progress(150.0, 0.0, 300.0), 0.5);
        assert_eq!(progress(-10.0, 0.0, 300.0), 0.0);
        assert_eq!(progress(400.0, 0.0, 300.0), 1.0);
        assert_eq!(progress(5.0, 5.0, 5.0), 0.5);
    }

    #[test]
    fn test_spatial_midpoint_nyc_boston() {
        let a = anchored(NYC, 0.0, 0.0, forecast_at(NYC.0, NYC.1, 0, 15.0));
        let b = anchored(BOSTON, 300.0, 10800.0, forecast_at(BOSTON.0, BOSTON.1, 180, 8.0));
        let target = waypoint(MIDWAY, 150.0, 5400.0);

        let sample = Interpolator::default().interpolate_spatial(&a, &b, &target);

        let temp = sample.forecast.temperature.current;
        assert!(temp == 11.0 || temp == 12.0, "unexpected temperature {temp}");
        assert!(sample.interpolated);
        assert!(sample.confidence < 1.0);
        assert!(sample.source_forecasts.is_some());
        assert_eq!(sample.forecast.location.coordinates, target.coordinates);
        assert_eq!(
            sample.forecast.timestamp,
            a.sample.forecast.timestamp + chrono::Duration::minutes(90)
        );
    }

    #[test]
    fn test_interpolated_confidence_below_observed_sources() {
        let a = anchored(NYC, 0.0, 0.0, forecast_at(NYC.0, NYC.1, 0, 15.0));
        let b = anchored(NYC, 5.0, 300.0, forecast_at(NYC.0, NYC.1, 5, 15.0));
        let target = waypoint(NYC, 2.5, 150.0);

        let sample = Interpolator::default().interpolate_spatial(&a, &b, &target);
        assert!(sample.confidence <= 0.8 + 1e-9);
        assert!(sample.confidence < a.sample.confidence);
        assert!(sample.confidence < b.sample.confidence);
    }

    #[test]
    fn test_categorical_fields_step_at_half() {
        let fa = forecast_at(NYC.0, NYC.1, 0, 10.0);
        let mut fb = forecast_at(BOSTON.0, BOSTON.1, 60, 20.0);
        fb.conditions.main = WeatherCondition::Rainy;
        fb.conditions.description = "light rain".to_string();
        fb.precipitation.kind = PrecipitationType::Rain;
        fb.precipitation.probability = 80.0;
        fb.precipitation.intensity = 3.0;
        fb.wind.speed = 20.0;

        let at = |p: f64| {
            blend_forecasts(&fa, &fb, p, fa.location.clone(), fa.timestamp)
        };

        let before = at(0.49);
        assert_eq!(before.conditions.main, WeatherCondition::Sunny);
        assert_eq!(before.precipitation.kind, PrecipitationType::None);

        let after = at(0.5);
        assert_eq!(after.conditions.main, WeatherCondition::Rainy);
        assert_eq!(after.conditions.description, "light rain");
        assert_eq!(after.precipitation.kind, PrecipitationType::Rain);
        assert_eq!(after.precipitation.probability, 40.0);
        assert_eq!(after.precipitation.intensity, 1.5);
        assert_eq!(after.wind.speed, 15.0);
        assert_eq!(after.temperature.current, 15.0);
    }

    #[test]
    fn test_temporal_interpolation() {
        let a = WeatherSample::observed(forecast_at(NYC.0, NYC.1, 0, 10.0), 1.0);
        let mut fb = forecast_at(NYC.0, NYC.1, 240, 20.0);
        fb.wind.direction = 200.0;
        let b = WeatherSample::observed(fb, 1.0);
        let target = a.forecast.timestamp + chrono::Duration::hours(1);

        let sample = Interpolator::default().interpolate_temporal(&a, &b, target);

        assert_eq!(sample.forecast.timestamp, target);
        assert_eq!(sample.forecast.temperature.current, 13.0);
        assert_eq!(sample.forecast.wind.direction, 185.0);
        assert_eq!(sample.forecast.location, a.forecast.location);
        assert!(sample.interpolated);
        assert!((sample.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_same_instant_uses_midpoint() {
        let a = WeatherSample::observed(forecast_at(NYC.0, NYC.1, 0, 10.0), 1.0);
        let b = WeatherSample::observed(forecast_at(BOSTON.0, BOSTON.1, 0, 20.0), 1.0);
        let sample = Interpolator::default().interpolate_temporal(&a, &b, a.forecast.timestamp);
        assert_eq!(sample.forecast.temperature.current, 15.0);
        assert!(sample.forecast.location.name.starts_with("Interpolated"));
    }
}
