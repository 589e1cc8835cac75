//! Configuration management for the route-weather engine
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings. Every tunable
//! threshold of the engine is exposed here as a named constant so that
//! tests can target the exact boundaries.

use crate::error::RouteWeatherError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Routes shorter than this use the short sampling interval
pub const SHORT_ROUTE_THRESHOLD_KM: f64 = 100.0;
pub const SHORT_ROUTE_INTERVAL_KM: f64 = 25.0;
pub const LONG_ROUTE_INTERVAL_KM: f64 = 50.0;

/// Time offset at which the matcher's time score reaches zero
pub const MATCH_TIME_WINDOW_HOURS: f64 = 4.0;
/// Distance at which the matcher's location score reaches zero
pub const MATCH_LOCATION_RADIUS_KM: f64 = 50.0;
/// Weight of the time score; the location score gets the remainder
pub const MATCH_TIME_WEIGHT: f64 = 0.7;
/// A forecast this close to a waypoint at its exact arrival time counts as observed
pub const EXACT_MATCH_RADIUS_KM: f64 = 1.0;

pub const INTERPOLATION_PENALTY: f64 = 0.2;
pub const TIME_GRACE_HOURS: f64 = 2.0;
pub const TIME_PENALTY_PER_HOUR: f64 = 0.05;
pub const MAX_TIME_PENALTY: f64 = 0.3;
pub const LOCATION_GRACE_KM: f64 = 10.0;
pub const LOCATION_PENALTY_PER_KM: f64 = 0.01;
pub const MAX_LOCATION_PENALTY: f64 = 0.2;
pub const CONFIDENCE_FLOOR: f64 = 0.1;
/// Bracketing gap at which pairwise gap confidence bottoms out
pub const GAP_REFERENCE_KM: f64 = 200.0;
pub const GAP_CONFIDENCE_FLOOR: f64 = 0.3;
/// Temporal gaps above this discount batch interpolation confidence
pub const BATCH_GAP_THRESHOLD_HOURS: f64 = 6.0;
pub const BATCH_GAP_PENALTY_PER_HOUR: f64 = 0.1;
/// Timeline points below this confidence are reported as low-confidence
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;

pub const TEMPERATURE_CHANGE_MODERATE_C: f64 = 10.0;
pub const TEMPERATURE_CHANGE_MAJOR_C: f64 = 20.0;
/// Pattern changes scoring below this are not reported
pub const DEFAULT_SENSITIVITY_THRESHOLD: f64 = 0.5;

pub const FETCH_BATCH_SIZE: usize = 5;
pub const FETCH_INTER_BATCH_DELAY_MS: u64 = 250;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RouteWeatherConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sampling point selection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    pub short_route_threshold_km: f64,
    pub short_route_interval_km: f64,
    pub long_route_interval_km: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            short_route_threshold_km: SHORT_ROUTE_THRESHOLD_KM,
            short_route_interval_km: SHORT_ROUTE_INTERVAL_KM,
            long_route_interval_km: LONG_ROUTE_INTERVAL_KM,
        }
    }
}

/// Forecast matching settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    pub time_window_hours: f64,
    pub location_radius_km: f64,
    pub time_weight: f64,
    pub exact_match_radius_km: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            time_window_hours: MATCH_TIME_WINDOW_HOURS,
            location_radius_km: MATCH_LOCATION_RADIUS_KM,
            time_weight: MATCH_TIME_WEIGHT,
            exact_match_radius_km: EXACT_MATCH_RADIUS_KM,
        }
    }
}

/// Confidence model settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub interpolation_penalty: f64,
    pub time_grace_hours: f64,
    pub time_penalty_per_hour: f64,
    pub max_time_penalty: f64,
    pub location_grace_km: f64,
    pub location_penalty_per_km: f64,
    pub max_location_penalty: f64,
    pub floor: f64,
    pub gap_reference_km: f64,
    pub gap_floor: f64,
    pub batch_gap_threshold_hours: f64,
    pub batch_gap_penalty_per_hour: f64,
    pub low_confidence_threshold: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            interpolation_penalty: INTERPOLATION_PENALTY,
            time_grace_hours: TIME_GRACE_HOURS,
            time_penalty_per_hour: TIME_PENALTY_PER_HOUR,
            max_time_penalty: MAX_TIME_PENALTY,
            location_grace_km: LOCATION_GRACE_KM,
            location_penalty_per_km: LOCATION_PENALTY_PER_KM,
            max_location_penalty: MAX_LOCATION_PENALTY,
            floor: CONFIDENCE_FLOOR,
            gap_reference_km: GAP_REFERENCE_KM,
            gap_floor: GAP_CONFIDENCE_FLOOR,
            batch_gap_threshold_hours: BATCH_GAP_THRESHOLD_HOURS,
            batch_gap_penalty_per_hour: BATCH_GAP_PENALTY_PER_HOUR,
            low_confidence_threshold: LOW_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Pattern change detection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    pub sensitivity_threshold: f64,
    pub temperature_moderate_c: f64,
    pub temperature_major_c: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            sensitivity_threshold: DEFAULT_SENSITIVITY_THRESHOLD,
            temperature_moderate_c: TEMPERATURE_CHANGE_MODERATE_C,
            temperature_major_c: TEMPERATURE_CHANGE_MAJOR_C,
        }
    }
}

/// Settings for fetching weather at sampling points from an external provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of concurrent requests per batch
    pub batch_size: usize,
    /// Pause between batches in milliseconds
    pub inter_batch_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: FETCH_BATCH_SIZE,
            inter_batch_delay_ms: FETCH_INTER_BATCH_DELAY_MS,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl RouteWeatherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("routecast.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ROUTECAST__MATCHING__TIME_WINDOW_HOURS=6 overrides matching.time_window_hours
        builder = builder.add_source(
            Environment::with_prefix("ROUTECAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: RouteWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("routecast").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        let positive = [
            ("sampling.short_route_interval_km", self.sampling.short_route_interval_km),
            ("sampling.long_route_interval_km", self.sampling.long_route_interval_km),
            ("matching.time_window_hours", self.matching.time_window_hours),
            ("matching.location_radius_km", self.matching.location_radius_km),
            ("confidence.gap_reference_km", self.confidence.gap_reference_km),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RouteWeatherError::config(format!("{name} must be positive")).into());
            }
        }

        if !(0.0..=1.0).contains(&self.matching.time_weight) {
            return Err(
                RouteWeatherError::config("matching.time_weight must be within [0, 1]").into(),
            );
        }

        let unit_interval = [
            ("confidence.floor", self.confidence.floor),
            ("confidence.gap_floor", self.confidence.gap_floor),
            ("confidence.low_confidence_threshold", self.confidence.low_confidence_threshold),
            ("confidence.interpolation_penalty", self.confidence.interpolation_penalty),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(
                    RouteWeatherError::config(format!("{name} must be within [0, 1]")).into(),
                );
            }
        }

        if self.patterns.temperature_major_c < self.patterns.temperature_moderate_c {
            return Err(RouteWeatherError::config(
                "patterns.temperature_major_c cannot be below patterns.temperature_moderate_c",
            )
            .into());
        }

        if self.fetch.batch_size == 0 || self.fetch.batch_size > 50 {
            return Err(
                RouteWeatherError::config("fetch.batch_size must be between 1 and 50").into(),
            );
        }

        if self.fetch.inter_batch_delay_ms > 60_000 {
            return Err(RouteWeatherError::config(
                "fetch.inter_batch_delay_ms cannot exceed 60000 ms",
            )
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RouteWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RouteWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RouteWeatherConfig::default();
        assert_eq!(config.matching.time_window_hours, 4.0);
        assert_eq!(config.matching.location_radius_km, 50.0);
        assert_eq!(config.confidence.low_confidence_threshold, 0.6);
        assert_eq!(config.patterns.temperature_moderate_c, 10.0);
        assert_eq!(config.patterns.temperature_major_c, 20.0);
        assert_eq!(config.fetch.batch_size, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = RouteWeatherConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = RouteWeatherConfig::default();
        config.fetch.batch_size = 0;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("batch_size"));

        let mut config = RouteWeatherConfig::default();
        config.matching.time_weight = 1.5;
        assert!(config.validate().is_err());

        let mut config = RouteWeatherConfig::default();
        config.patterns.temperature_major_c = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file_keeps_unset_defaults() {
        let path = std::env::temp_dir().join(format!("routecast-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[matching]\ntime_window_hours = 6.0\n\n[fetch]\nbatch_size = 3").unwrap();

        let config = RouteWeatherConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.matching.time_window_hours, 6.0);
        assert_eq!(config.matching.location_radius_km, 50.0);
        assert_eq!(config.fetch.batch_size, 3);
        assert_eq!(config.fetch.inter_batch_delay_ms, FETCH_INTER_BATCH_DELAY_MS);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = RouteWeatherConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("routecast"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
