//! Result types produced by the engine: timeline, alignments, diagnostics

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    NamedLocation, RouteSegment, WeatherCondition, WeatherForecast, WeatherSample, Waypoint,
};

/// Weather resolved for one waypoint at the time the traveller reaches it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteTimelinePoint {
    pub waypoint: Waypoint,
    pub weather: WeatherSample,
    /// No original forecast lies within 1 km of the waypoint at its exact arrival time
    pub is_interpolated: bool,
    /// Absolute arrival time
    pub travel_time: DateTime<Utc>,
    pub segment_index: usize,
    /// Distance from route start in km
    pub distance_from_start: f64,
    /// Travel time from route start in seconds
    pub time_from_start: f64,
}

impl RouteTimelinePoint {
    #[must_use]
    pub fn forecast(&self) -> &WeatherForecast {
        &self.weather.forecast
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.weather.confidence
    }
}

/// Ordered by `time_from_start`; never mutated after construction
pub type RouteTimeline = Vec<RouteTimelinePoint>;

/// Where a segment's representative weather came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentSource {
    /// Averaged over forecasts inside the segment's time window
    Averaged,
    /// No forecast in the window; closest to the window midpoint
    ClosestInTime,
    /// No forecast at all; neutral placeholder
    Default,
}

/// Representative weather for one route segment
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmentWeatherAlignment {
    pub segment_index: usize,
    pub segment: RouteSegment,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub forecasts_in_window: usize,
    pub average_weather: WeatherForecast,
    pub source: AlignmentSource,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
        })
    }
}

/// What kind of transition a pattern change describes
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternChangeKind {
    Condition,
    Temperature,
    Precipitation,
}

/// A classified transition between two consecutive timeline points
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherPatternChange {
    pub kind: PatternChangeKind,
    pub location: NamedLocation,
    pub timestamp: DateTime<Utc>,
    pub from_condition: WeatherCondition,
    pub to_condition: WeatherCondition,
    pub severity: Severity,
    /// Raw severity score the classification was derived from
    pub score: f64,
    pub description: String,
    pub travel_impact: String,
}

/// Route/weather consistency audit
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub missing_data_points: u32,
    /// Within [0, 1]
    pub data_consistency_score: f64,
}
