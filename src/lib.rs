//! `routecast` - weather along a travel route
//!
//! This library places weather on a route: it picks the waypoints worth
//! querying, matches sparse forecasts to each waypoint at the time the
//! traveller arrives, fills gaps by spatial and temporal interpolation with
//! decaying confidence, audits how well the data covers the route, and flags
//! significant weather transitions and travel-mode risk.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod interpolation;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod provider;
pub mod sampling;
pub mod timeline;
pub mod validation;

#[cfg(test)]
mod test_support;

// Re-export core types for public API
pub use analysis::{PatternDetector, RiskLevel, TravelRiskAssessment};
pub use config::RouteWeatherConfig;
pub use engine::{RouteWeatherEngine, RouteWeatherReport};
pub use error::{ErrorCode, RouteWeatherError};
pub use interpolation::{AnchoredSample, ConfidenceCalculator, ConfidenceStrategy, Interpolator};
pub use matcher::{WeatherMatch, WeatherMatcher};
pub use models::{
    Coordinate, NamedLocation, Route, RouteSegment, RouteTimeline, RouteTimelinePoint, TravelMode,
    ValidationResult, WeatherForecast, WeatherPatternChange, WeatherSample, Waypoint,
};
pub use provider::{BatchFetcher, ConditionCodeAdapter, OpenWeatherCodes, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RouteWeatherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
