//! Boundary with the external weather client
//!
//! The engine itself never performs I/O. This module defines what it expects
//! from a weather provider and how callers fetch sampling points in bounded
//! batches without letting one failed point sink the whole route.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::FetchConfig;
use crate::error::ErrorCode;
use crate::models::{
    NamedLocation, PrecipitationType, WeatherCondition, WeatherForecast, Waypoint,
};

/// Source of raw forecasts, typically a remote weather API client
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Forecast for a location, at `timestamp` when given, otherwise current conditions
    async fn fetch(
        &self,
        location: &NamedLocation,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<WeatherForecast>;
}

/// One point to fetch weather for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub location: NamedLocation,
    pub timestamp: Option<DateTime<Utc>>,
}

impl FetchRequest {
    /// Request weather at a waypoint for the time the traveller arrives there
    pub fn for_waypoint(waypoint: &Waypoint, start_time: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            location: waypoint_location(waypoint),
            timestamp: Some(waypoint.arrival_time(start_time)?),
        })
    }
}

fn waypoint_location(waypoint: &Waypoint) -> NamedLocation {
    NamedLocation::new(
        format!("Waypoint at {:.1} km", waypoint.distance_from_start),
        waypoint.coordinates,
    )
}

/// A point whose fetch failed upstream; it is simply absent from the pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub request: FetchRequest,
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub forecasts: Vec<WeatherForecast>,
    pub failures: Vec<FetchFailure>,
}

/// Fetches requests concurrently in fixed-size batches with a jittered pause between batches
pub struct BatchFetcher<P> {
    provider: P,
    config: FetchConfig,
}

impl<P: WeatherProvider> BatchFetcher<P> {
    #[must_use]
    pub fn new(provider: P, config: FetchConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch every request; failures are collected, never propagated
    pub async fn fetch_all(&self, requests: &[FetchRequest]) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let batch_size = self.config.batch_size.max(1);

        for (batch_index, batch) in requests.chunks(batch_size).enumerate() {
            if batch_index > 0 {
                self.pause().await;
            }

            let results = futures::future::join_all(
                batch
                    .iter()
                    .map(|request| self.provider.fetch(&request.location, request.timestamp)),
            )
            .await;

            for (request, result) in batch.iter().zip(results) {
                match result {
                    Ok(forecast) => outcome.forecasts.push(forecast),
                    Err(err) => {
                        warn!(
                            "Weather fetch failed for {} ({}): {}",
                            request.location.name,
                            request.location.coordinates.format_coordinates(),
                            err
                        );
                        outcome.failures.push(FetchFailure {
                            request: request.clone(),
                            code: err.code(),
                            message: err.to_string(),
                            retryable: err.is_retryable(),
                        });
                    }
                }
            }
            debug!("Finished fetch batch {} ({} requests)", batch_index + 1, batch.len());
        }

        info!(
            "Fetched {} of {} weather points ({} failed)",
            outcome.forecasts.len(),
            requests.len(),
            outcome.failures.len()
        );
        outcome
    }

    /// Fetch weather for sampling points at their arrival times.
    ///
    /// A waypoint whose arrival time cannot be computed is reported as a
    /// failure without reaching the provider.
    pub async fn fetch_waypoints(
        &self,
        waypoints: &[Waypoint],
        start_time: DateTime<Utc>,
    ) -> FetchOutcome {
        let mut requests = Vec::with_capacity(waypoints.len());
        let mut unschedulable = Vec::new();
        for waypoint in waypoints {
            match FetchRequest::for_waypoint(waypoint, start_time) {
                Ok(request) => requests.push(request),
                Err(err) => unschedulable.push(FetchFailure {
                    request: FetchRequest {
                        location: waypoint_location(waypoint),
                        timestamp: None,
                    },
                    code: err.code(),
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                }),
            }
        }

        let mut outcome = self.fetch_all(&requests).await;
        outcome.failures.extend(unschedulable);
        outcome
    }

    async fn pause(&self) {
        if self.config.inter_batch_delay_ms == 0 {
            return;
        }
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        let delay_ms = (self.config.inter_batch_delay_ms as f64 * jitter) as u64;
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// Maps a provider's numeric condition codes onto engine categories.
///
/// Code tables differ between providers, so each client supplies its own.
pub trait ConditionCodeAdapter: Send + Sync {
    fn condition(&self, code: u16) -> WeatherCondition;

    fn precipitation(&self, code: u16) -> PrecipitationType;

    fn classify(&self, code: u16) -> (WeatherCondition, PrecipitationType) {
        (self.condition(code), self.precipitation(code))
    }
}

/// OpenWeather-style condition groups (2xx thunderstorm .. 8xx clouds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWeatherCodes {
    /// Treat thunderstorms with rain (200-202) as possible hail
    pub assume_hail_in_thunderstorms: bool,
}

impl Default for OpenWeatherCodes {
    fn default() -> Self {
        Self {
            assume_hail_in_thunderstorms: true,
        }
    }
}

impl ConditionCodeAdapter for OpenWeatherCodes {
    fn condition(&self, code: u16) -> WeatherCondition {
        match code {
            200..=299 => WeatherCondition::Stormy,
            300..=399 | 500..=599 => WeatherCondition::Rainy,
            600..=699 => WeatherCondition::Snowy,
            700..=799 => WeatherCondition::Foggy,
            800 => WeatherCondition::Sunny,
            801 | 802 => WeatherCondition::Cloudy,
            803 | 804 => WeatherCondition::Overcast,
            _ => WeatherCondition::Cloudy,
        }
    }

    fn precipitation(&self, code: u16) -> PrecipitationType {
        match code {
            200..=202 if self.assume_hail_in_thunderstorms => PrecipitationType::Hail,
            200..=202 | 230..=232 | 300..=399 | 500..=599 => PrecipitationType::Rain,
            611..=613 => PrecipitationType::Sleet,
            600..=699 => PrecipitationType::Snow,
            _ => PrecipitationType::None,
        }
    }
}
