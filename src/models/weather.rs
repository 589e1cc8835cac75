//! Weather forecast model, conditions and samples

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NamedLocation;

/// Dominant weather condition, declared in ascending severity
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Overcast,
    Foggy,
    Rainy,
    Snowy,
    Stormy,
}

impl WeatherCondition {
    /// Position in the severity ordering (SUNNY = 0 .. STORMY = 6)
    #[must_use]
    pub fn severity_rank(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCondition::Sunny => "sunny",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Overcast => "overcast",
            WeatherCondition::Foggy => "foggy",
            WeatherCondition::Rainy => "rainy",
            WeatherCondition::Snowy => "snowy",
            WeatherCondition::Stormy => "stormy",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrecipitationType {
    #[default]
    None,
    Rain,
    Sleet,
    Snow,
    Hail,
}

impl PrecipitationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PrecipitationType::None => "none",
            PrecipitationType::Rain => "rain",
            PrecipitationType::Sleet => "sleet",
            PrecipitationType::Snow => "snow",
            PrecipitationType::Hail => "hail",
        }
    }
}

impl fmt::Display for PrecipitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temperatures in Celsius
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Conditions {
    pub main: WeatherCondition,
    /// Human-readable description of weather conditions
    pub description: String,
    /// Weather condition icon ID from the provider
    pub icon: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Precipitation {
    #[serde(rename = "type")]
    pub kind: PrecipitationType,
    /// Probability in percent (0-100)
    pub probability: f64,
    /// Intensity on a 0-10 scale
    pub intensity: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Wind {
    /// Wind speed in km/h
    pub speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub direction: f64,
}

/// A weather observation or prediction for one location and instant
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherForecast {
    pub location: NamedLocation,
    pub timestamp: DateTime<Utc>,
    pub temperature: Temperature,
    pub conditions: Conditions,
    pub precipitation: Precipitation,
    pub wind: Wind,
    /// Relative humidity in percent (0-100)
    pub humidity: f64,
    /// Visibility in kilometers
    pub visibility: f64,
}

impl WeatherForecast {
    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
        const CARDINALS: [&str; 16] = [
            "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W",
            "WNW", "NW", "NNW",
        ];
        if !degrees.is_finite() {
            return "Unknown";
        }
        let index = ((degrees.rem_euclid(360.0) / 22.5).round() as usize) % CARDINALS.len();
        CARDINALS[index]
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature.current)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!(
            "{:.1} km/h {}",
            self.wind.speed,
            Self::wind_direction_to_cardinal(self.wind.direction)
        )
    }

    #[must_use]
    pub fn has_precipitation(&self) -> bool {
        self.precipitation.kind != PrecipitationType::None
    }
}

/// A forecast together with how much it can be trusted for a given point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSample {
    pub forecast: WeatherForecast,
    /// Trust in this sample, within (0, 1]
    pub confidence: f64,
    /// Synthesized from two bracketing samples rather than observed
    pub interpolated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_forecasts: Option<Box<[WeatherForecast; 2]>>,
}

impl WeatherSample {
    /// A directly observed sample
    #[must_use]
    pub fn observed(forecast: WeatherForecast, confidence: f64) -> Self {
        Self {
            forecast,
            confidence,
            interpolated: false,
            source_forecasts: None,
        }
    }

    /// A sample synthesized from two sources
    #[must_use]
    pub fn interpolated(
        forecast: WeatherForecast,
        confidence: f64,
        sources: [WeatherForecast; 2],
    ) -> Self {
        Self {
            forecast,
            confidence,
            interpolated: true,
            source_forecasts: Some(Box::new(sources)),
        }
    }
}
