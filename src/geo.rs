//! Geometry utilities: great-circle distance and coverage boxes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Coordinate;

/// Great-circle distance between two coordinates in kilometers
#[must_use]
pub fn distance_km(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        haversine::Location {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        haversine::Units::Kilometers,
    )
}

/// Min/max latitude and longitude covered by a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Box enclosing all points, `None` when there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        points.into_iter().fold(None, |bbox, point| {
            Some(match bbox {
                None => BoundingBox {
                    min_latitude: point.latitude,
                    max_latitude: point.latitude,
                    min_longitude: point.longitude,
                    max_longitude: point.longitude,
                },
                Some(b) => BoundingBox {
                    min_latitude: b.min_latitude.min(point.latitude),
                    max_latitude: b.max_latitude.max(point.latitude),
                    min_longitude: b.min_longitude.min(point.longitude),
                    max_longitude: b.max_longitude.max(point.longitude),
                },
            })
        })
    }

    /// Whether the two boxes share any area (touching edges count)
    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_latitude <= other.max_latitude
            && other.min_latitude <= self.max_latitude
            && self.min_longitude <= other.max_longitude
            && other.min_longitude <= self.max_longitude
    }
}

/// Earliest and latest instant of a set of timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn from_timestamps(timestamps: impl IntoIterator<Item = DateTime<Utc>>) -> Option<Self> {
        timestamps.into_iter().fold(None, |range, ts| {
            Some(match range {
                None => TimeRange { start: ts, end: ts },
                Some(r) => TimeRange {
                    start: r.start.min(ts),
                    end: r.end.max(ts),
                },
            })
        })
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    #[must_use]
    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }
}

/// Absolute gap between two instants in fractional hours
#[must_use]
pub fn hours_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds().abs() as f64 / 3_600_000.0
}
