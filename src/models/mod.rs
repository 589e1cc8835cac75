//! Data models for the route-weather engine
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and names
//! - Route: Waypoints, segments and travel modes from the route provider
//! - Weather: Forecasts from the weather provider and derived samples
//! - Timeline: Engine results and diagnostics

pub mod location;
pub mod route;
pub mod timeline;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinate, NamedLocation};
pub use route::{Route, RouteSegment, TravelMode, Waypoint, offset_time, seconds_to_duration};
pub use timeline::{
    AlignmentSource, PatternChangeKind, RouteTimeline, RouteTimelinePoint,
    SegmentWeatherAlignment, Severity, ValidationResult, WeatherPatternChange,
};
pub use weather::{
    Conditions, Precipitation, PrecipitationType, Temperature, WeatherCondition,
    WeatherForecast, WeatherSample, Wind,
};
