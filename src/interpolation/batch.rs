//! Batch resampling of a forecast series onto a fixed time grid

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Interpolator;
use crate::Result;
use crate::error::{ErrorCode, RouteWeatherError};
use crate::geo;
use crate::models::{WeatherForecast, WeatherSample};

/// Upper bound on grid size to keep a bad interval from exhausting memory
pub const MAX_RESAMPLED_POINTS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInterpolation {
    /// Original and synthesized samples, ordered by timestamp
    pub samples: Vec<WeatherSample>,
    pub interpolated_count: usize,
    /// Batch density confidence assigned to every synthesized sample
    pub confidence: f64,
}

/// Resample `forecasts` every `interval` from the earliest to the latest instant.
///
/// Original instants are kept as observed samples; grid instants between them
/// are filled by temporal interpolation. With fewer than two forecasts nothing
/// is interpolated and the originals are returned as-is.
pub fn resample(
    interpolator: &Interpolator,
    forecasts: &[WeatherForecast],
    interval: Duration,
) -> Result<BatchInterpolation> {
    if interval <= Duration::zero() {
        return Err(RouteWeatherError::input(
            ErrorCode::InvalidInterval,
            "resampling interval must be positive",
        ));
    }

    let mut originals: Vec<WeatherForecast> = forecasts.to_vec();
    originals.sort_by_key(|f| f.timestamp);

    if originals.len() < 2 {
        debug!("Skipping batch interpolation: {} forecast(s)", originals.len());
        return Ok(BatchInterpolation {
            samples: originals
                .into_iter()
                .map(|f| WeatherSample::observed(f, 1.0))
                .collect(),
            interpolated_count: 0,
            confidence: 1.0,
        });
    }

    let first = originals[0].timestamp;
    let last = originals[originals.len() - 1].timestamp;
    let grid = grid_instants(first, last, interval)?;

    let mut instants: Vec<DateTime<Utc>> = grid
        .into_iter()
        .chain(originals.iter().map(|f| f.timestamp))
        .collect();
    instants.sort();
    instants.dedup();

    let original_instants = originals
        .iter()
        .map(|f| f.timestamp)
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let original_ratio = original_instants as f64 / instants.len() as f64;
    let max_gap_hours = originals
        .windows(2)
        .map(|pair| geo::hours_between(pair[0].timestamp, pair[1].timestamp))
        .fold(0.0, f64::max);
    let confidence = interpolator
        .confidence()
        .batch_density(original_ratio, max_gap_hours);

    let mut samples = Vec::with_capacity(instants.len());
    let mut interpolated_count = 0;
    for instant in instants {
        if let Some(original) = originals.iter().find(|f| f.timestamp == instant) {
            samples.push(WeatherSample::observed(original.clone(), 1.0));
            continue;
        }

        // Strictly inside (first, last) and not an original instant, so both sides exist
        let after_index = originals.partition_point(|f| f.timestamp < instant);
        let before = WeatherSample::observed(originals[after_index - 1].clone(), 1.0);
        let after = WeatherSample::observed(originals[after_index].clone(), 1.0);

        let mut sample = interpolator.interpolate_temporal(&before, &after, instant);
        sample.confidence = confidence;
        samples.push(sample);
        interpolated_count += 1;
    }

    debug!(
        "Resampled {} forecasts into {} samples ({interpolated_count} interpolated, confidence {confidence:.2})",
        originals.len(),
        samples.len()
    );

    Ok(BatchInterpolation {
        samples,
        interpolated_count,
        confidence,
    })
}

fn grid_instants(
    first: DateTime<Utc>,
    last: DateTime<Utc>,
    interval: Duration,
) -> Result<Vec<DateTime<Utc>>> {
    let span_ms = (last - first).num_milliseconds();
    let step_ms = interval.num_milliseconds().max(1);
    let count = usize::try_from(span_ms / step_ms).unwrap_or(usize::MAX);
    if count >= MAX_RESAMPLED_POINTS {
        return Err(RouteWeatherError::input(
            ErrorCode::InvalidInterval,
            format!(
                "resampling interval too small: would produce more than {MAX_RESAMPLED_POINTS} points"
            ),
        ));
    }

    let mut instants = Vec::with_capacity(count + 1);
    let mut current = first;
    while current <= last {
        instants.push(current);
        match current.checked_add_signed(interval) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(instants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NYC, forecast_at};

    #[test]
    fn test_hourly_resampling_fills_gaps() {
        let forecasts = vec![
            forecast_at(NYC.0, NYC.1, 180, 16.0),
            forecast_at(NYC.0, NYC.1, 0, 10.0),
        ];
        let result = resample(&Interpolator::default(), &forecasts, Duration::hours(1)).unwrap();

        assert_eq!(result.samples.len(), 4);
        assert_eq!(result.interpolated_count, 2);
        let temps: Vec<f64> = result
            .samples
            .iter()
            .map(|s| s.forecast.temperature.current)
            .collect();
        assert_eq!(temps, vec![10.0, 12.0, 14.0, 16.0]);
        assert!(!result.samples[0].interpolated);
        assert!(result.samples[1].interpolated);
        // 2 of 4 points are original, no gap above 6h
        assert!((result.confidence - 0.6).abs() < 1e-9);
        assert!((result.samples[1].confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_off_grid_originals_are_kept() {
        let forecasts = vec![
            forecast_at(NYC.0, NYC.1, 0, 10.0),
            forecast_at(NYC.0, NYC.1, 90, 13.0),
            forecast_at(NYC.0, NYC.1, 120, 14.0),
        ];
        let result = resample(&Interpolator::default(), &forecasts, Duration::hours(1)).unwrap();
        let originals = result.samples.iter().filter(|s| !s.interpolated).count();
        assert_eq!(originals, 3);
        assert_eq!(result.samples.len(), 4);
        assert!(
            result
                .samples
                .windows(2)
                .all(|w| w[0].forecast.timestamp < w[1].forecast.timestamp)
        );
    }

    #[test]
    fn test_long_gap_discounts_confidence() {
        let forecasts = vec![
            forecast_at(NYC.0, NYC.1, 0, 10.0),
            forecast_at(NYC.0, NYC.1, 10 * 60, 20.0),
        ];
        let result = resample(&Interpolator::default(), &forecasts, Duration::hours(1)).unwrap();
        // ratio 2/11, gap 10h -> (0.145 + 0.2) * 0.6
        let expected = (2.0 / 11.0 * 0.8 + 0.2) * 0.6;
        assert!((result.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_single_forecast_skips_interpolation() {
        let forecasts = vec![forecast_at(NYC.0, NYC.1, 0, 10.0)];
        let result = resample(&Interpolator::default(), &forecasts, Duration::hours(1)).unwrap();
        assert_eq!(result.samples.len(), 1);
        assert_eq!(result.interpolated_count, 0);

        let empty = resample(&Interpolator::default(), &[], Duration::hours(1)).unwrap();
        assert!(empty.samples.is_empty());
    }

    #[test]
    fn test_invalid_interval() {
        let forecasts = vec![
            forecast_at(NYC.0, NYC.1, 0, 10.0),
            forecast_at(NYC.0, NYC.1, 60, 10.0),
        ];
        let err = resample(&Interpolator::default(), &forecasts, Duration::zero()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInterval);

        let err = resample(&Interpolator::default(), &forecasts, Duration::milliseconds(1))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInterval);
    }

    #[test]
    fn test_interval_past_the_calendar_keeps_originals() {
        let forecasts = vec![
            forecast_at(NYC.0, NYC.1, 0, 10.0),
            forecast_at(NYC.0, NYC.1, 60, 12.0),
        ];
        let result =
            resample(&Interpolator::default(), &forecasts, Duration::days(36_500_000_000)).unwrap();
        assert_eq!(result.samples.iter().filter(|s| !s.interpolated).count(), 2);
    }
}
