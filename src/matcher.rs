//! Nearest-match scoring of forecasts against a waypoint and arrival time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::config::MatchingConfig;
use crate::error::RouteWeatherError;
use crate::geo;
use crate::interpolation::ConfidenceCalculator;
use crate::models::{WeatherForecast, WeatherSample, Waypoint};

/// Timestamps closer than this count as the same instant
const EXACT_TIME_TOLERANCE_MS: i64 = 1000;

/// Best forecast for a waypoint, with how well it fits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherMatch {
    pub sample: WeatherSample,
    /// Weighted time/location score in [0, 1]
    pub score: f64,
    pub time_offset_hours: f64,
    pub distance_km: f64,
    /// Position of the chosen forecast in the candidate pool
    pub pool_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub score: f64,
    pub time_offset_hours: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WeatherMatcher {
    config: MatchingConfig,
    confidence: ConfidenceCalculator,
}

impl WeatherMatcher {
    #[must_use]
    pub fn new(config: MatchingConfig, confidence: ConfidenceCalculator) -> Self {
        Self { config, confidence }
    }

    #[must_use]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    #[must_use]
    pub fn confidence(&self) -> &ConfidenceCalculator {
        &self.confidence
    }

    /// `w × timeScore + (1 − w) × locationScore`, each falling linearly to zero
    #[must_use]
    pub fn score(
        &self,
        waypoint: &Waypoint,
        target_time: DateTime<Utc>,
        forecast: &WeatherForecast,
    ) -> MatchScore {
        let time_offset_hours = geo::hours_between(target_time, forecast.timestamp);
        let distance_km = geo::distance_km(&waypoint.coordinates, &forecast.location.coordinates);

        let time_score = (1.0 - time_offset_hours / self.config.time_window_hours).max(0.0);
        let location_score = (1.0 - distance_km / self.config.location_radius_km).max(0.0);
        let weight = self.config.time_weight;

        MatchScore {
            score: weight * time_score + (1.0 - weight) * location_score,
            time_offset_hours,
            distance_km,
        }
    }

    /// Select the highest-scoring forecast; ties keep the first encountered.
    ///
    /// Fails with `NO_WEATHER_DATA` when the pool is empty.
    pub fn match_weather(
        &self,
        waypoint: &Waypoint,
        target_time: DateTime<Utc>,
        pool: &[WeatherForecast],
    ) -> Result<WeatherMatch> {
        let mut best: Option<(usize, MatchScore)> = None;
        for (index, forecast) in pool.iter().enumerate() {
            let candidate = self.score(waypoint, target_time, forecast);
            match best {
                Some((_, current)) if candidate.score <= current.score => {}
                _ => best = Some((index, candidate)),
            }
        }

        let Some((pool_index, best)) = best else {
            return Err(RouteWeatherError::no_weather_data(format!(
                "no forecast candidates for waypoint at {:.1} km",
                waypoint.distance_from_start
            )));
        };

        let confidence = self
            .confidence
            .offset_decay(false, best.time_offset_hours, best.distance_km);
        debug!(
            "Matched waypoint at {:.1} km to forecast #{pool_index} (score {:.3}, {:.1} h, {:.1} km)",
            waypoint.distance_from_start, best.score, best.time_offset_hours, best.distance_km
        );

        Ok(WeatherMatch {
            sample: WeatherSample::observed(pool[pool_index].clone(), confidence),
            score: best.score,
            time_offset_hours: best.time_offset_hours,
            distance_km: best.distance_km,
            pool_index,
        })
    }

    /// An original forecast within the exact-match radius at the exact arrival time
    #[must_use]
    pub fn find_exact<'a>(
        &self,
        waypoint: &Waypoint,
        target_time: DateTime<Utc>,
        pool: &'a [WeatherForecast],
    ) -> Option<&'a WeatherForecast> {
        pool.iter().find(|forecast| {
            (forecast.timestamp - target_time).num_milliseconds().abs() < EXACT_TIME_TOLERANCE_MS
                && geo::distance_km(&waypoint.coordinates, &forecast.location.coordinates)
                    <= self.config.exact_match_radius_km
        })
    }
}
