//! Route geometry as supplied by the external route provider

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinate;
use crate::Result;
use crate::error::{ErrorCode, RouteWeatherError};

/// How the traveller moves along the route
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walking,
    Cycling,
    Driving,
    Flying,
    Sailing,
    Cruise,
}

impl TravelMode {
    pub const ALL: [TravelMode; 6] = [
        TravelMode::Walking,
        TravelMode::Cycling,
        TravelMode::Driving,
        TravelMode::Flying,
        TravelMode::Sailing,
        TravelMode::Cruise,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
            TravelMode::Driving => "driving",
            TravelMode::Flying => "flying",
            TravelMode::Sailing => "sailing",
            TravelMode::Cruise => "cruise",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = RouteWeatherError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TravelMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| {
                RouteWeatherError::config(format!(
                    "unknown travel mode '{s}', expected one of: walking, cycling, driving, flying, sailing, cruise"
                ))
            })
    }
}

/// A point along a route with known distance and time offset from the start
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Waypoint {
    pub coordinates: Coordinate,
    /// Distance from route start in km
    pub distance_from_start: f64,
    /// Estimated travel time from route start in seconds
    pub estimated_time_from_start: f64,
}

impl Waypoint {
    #[must_use]
    pub fn new(
        coordinates: Coordinate,
        distance_from_start: f64,
        estimated_time_from_start: f64,
    ) -> Self {
        Self {
            coordinates,
            distance_from_start,
            estimated_time_from_start,
        }
    }

    /// Absolute arrival time at this waypoint for a given departure
    pub fn arrival_time(&self, start_time: DateTime<Utc>) -> Result<DateTime<Utc>> {
        offset_time(start_time, self.estimated_time_from_start)
    }
}

/// A contiguous leg of the route between two waypoints
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteSegment {
    pub start_point: Waypoint,
    pub end_point: Waypoint,
    /// Segment length in km
    pub distance: f64,
    /// Segment travel time in seconds
    pub duration: f64,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl RouteSegment {
    /// Whether a route distance (km) falls within this segment, bounds inclusive
    #[must_use]
    pub fn contains_distance(&self, distance_km: f64) -> bool {
        distance_km >= self.start_point.distance_from_start
            && distance_km <= self.end_point.distance_from_start
    }

    #[must_use]
    pub fn midpoint(&self) -> Coordinate {
        self.start_point
            .coordinates
            .lerp(&self.end_point.coordinates, 0.5)
    }
}

/// A fully-formed route: ordered waypoints and the segments partitioning it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Route {
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub segments: Vec<RouteSegment>,
    /// Total length in km
    pub total_distance: f64,
    /// Estimated duration in seconds
    pub estimated_duration: f64,
    pub travel_mode: TravelMode,
}

impl Route {
    /// Arrival time at the final waypoint
    pub fn end_time(&self, start_time: DateTime<Utc>) -> Result<DateTime<Utc>> {
        offset_time(start_time, self.estimated_duration)
    }

    /// Index of the segment containing `distance_km`; the last segment when none does
    #[must_use]
    pub fn segment_index_for(&self, distance_km: f64) -> usize {
        self.segments
            .iter()
            .position(|segment| segment.contains_distance(distance_km))
            .unwrap_or_else(|| self.segments.len().saturating_sub(1))
    }

    /// Estimated position at a travel-time offset (seconds), blending between waypoints
    #[must_use]
    pub fn position_at(&self, seconds_from_start: f64) -> Option<Waypoint> {
        let first = self.waypoints.first()?;
        if seconds_from_start <= first.estimated_time_from_start {
            return Some(Waypoint {
                estimated_time_from_start: seconds_from_start.max(0.0),
                ..first.clone()
            });
        }

        for pair in self.waypoints.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if seconds_from_start <= b.estimated_time_from_start {
                let span = b.estimated_time_from_start - a.estimated_time_from_start;
                let progress = if span.abs() < f64::EPSILON {
                    1.0
                } else {
                    (seconds_from_start - a.estimated_time_from_start) / span
                };
                return Some(Waypoint {
                    coordinates: a.coordinates.lerp(&b.coordinates, progress),
                    distance_from_start: a.distance_from_start
                        + (b.distance_from_start - a.distance_from_start) * progress,
                    estimated_time_from_start: seconds_from_start,
                });
            }
        }

        self.waypoints.last().map(|last| Waypoint {
            estimated_time_from_start: seconds_from_start,
            ..last.clone()
        })
    }
}

/// Convert fractional seconds to a chrono duration at millisecond precision,
/// `None` when the value does not fit
#[must_use]
pub fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// The instant `seconds` after `start_time`
pub fn offset_time(start_time: DateTime<Utc>, seconds: f64) -> Result<DateTime<Utc>> {
    seconds_to_duration(seconds)
        .and_then(|offset| start_time.checked_add_signed(offset))
        .ok_or_else(|| {
            RouteWeatherError::input(
                ErrorCode::InvalidTimestamp,
                format!("{seconds} s after {start_time} is outside the supported time range"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{coord, three_point_route};
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn test_segment_index_defaults_to_last() {
        let route = three_point_route(TravelMode::Driving);
        assert_eq!(route.segment_index_for(0.0), 0);
        assert_eq!(route.segment_index_for(200.0), 1);
        assert_eq!(route.segment_index_for(999.0), 1);
    }

    #[test]
    fn test_shared_boundary_belongs_to_first_segment() {
        let route = three_point_route(TravelMode::Driving);
        assert_eq!(route.segment_index_for(150.0), 0);
    }

    #[test]
    fn test_position_at_blends_between_waypoints() {
        let route = three_point_route(TravelMode::Driving);
        let halfway = route.waypoints[1].estimated_time_from_start / 2.0;
        let position = route.position_at(halfway).unwrap();
        assert!((position.distance_from_start - 75.0).abs() < 1e-9);

        let beyond = route.position_at(route.estimated_duration * 2.0).unwrap();
        assert_eq!(beyond.coordinates, route.waypoints[2].coordinates);
    }

    #[test]
    fn test_arrival_time() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let waypoint = Waypoint::new(coord(40.0, -74.0), 10.0, 5400.0);
        assert_eq!(
            waypoint.arrival_time(start).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
        );
    }

    #[rstest]
    #[case::beyond_duration_range(1e17)]
    #[case::beyond_calendar(1e15)]
    #[case::infinite(f64::INFINITY)]
    fn test_unrepresentable_offsets_are_errors(#[case] seconds: f64) {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let waypoint = Waypoint::new(coord(40.0, -74.0), 10.0, seconds);
        let err = waypoint.arrival_time(start).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTimestamp);

        let mut route = three_point_route(TravelMode::Driving);
        route.estimated_duration = seconds;
        assert!(route.end_time(start).is_err());
        assert!(offset_time(start, -seconds).is_err());
    }

    #[test]
    fn test_travel_mode_from_str() {
        assert_eq!("Sailing".parse::<TravelMode>().unwrap(), TravelMode::Sailing);
        assert!("teleport".parse::<TravelMode>().is_err());
    }

    #[test]
    fn test_travel_mode_serde_lowercase() {
        let json = serde_json::to_string(&TravelMode::Cruise).unwrap();
        assert_eq!(json, "\"cruise\"");
        let mode: TravelMode = serde_json::from_str("\"walking\"").unwrap();
        assert_eq!(mode, TravelMode::Walking);
    }
}
