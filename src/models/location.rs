//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::{ErrorCode, RouteWeatherError};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, within [-90, 90]
    pub latitude: f64,
    /// Longitude in decimal degrees, within [-180, 180]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting out-of-range or non-finite values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(RouteWeatherError::input(
                ErrorCode::InvalidCoordinates,
                format!("coordinate ({latitude}, {longitude}) is out of range"),
            ))
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Linear blend between two coordinates (adequate for short route legs)
    #[must_use]
    pub fn lerp(&self, other: &Coordinate, progress: f64) -> Coordinate {
        Coordinate {
            latitude: self.latitude + (other.latitude - self.latitude) * progress,
            longitude: self.longitude + (other.longitude - self.longitude) * progress,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A named place a forecast refers to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NamedLocation {
    /// Location name (city, region, etc.)
    pub name: String,
    pub coordinates: Coordinate,
}

impl NamedLocation {
    #[must_use]
    pub fn new(name: impl Into<String>, coordinates: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }

    /// Location for a synthesized sample, named after its coordinates
    #[must_use]
    pub fn interpolated(coordinates: Coordinate) -> Self {
        Self {
            name: format!("Interpolated ({})", coordinates.format_coordinates()),
            coordinates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(46.8182, 8.2275).is_ok());
        assert!(Coordinate::new(90.0, -180.0).is_ok());

        let err = Coordinate::new(91.0, 0.0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCoordinates);
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_lerp_midpoint() {
        let a = Coordinate {
            latitude: 40.0,
            longitude: -74.0,
        };
        let b = Coordinate {
            latitude: 42.0,
            longitude: -71.0,
        };
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.latitude, 41.0);
        assert_eq!(mid.longitude, -72.5);
    }

    #[test]
    fn test_interpolated_location_name() {
        let location = NamedLocation::interpolated(Coordinate {
            latitude: 41.5,
            longitude: -72.25,
        });
        assert_eq!(location.name, "Interpolated (41.5000, -72.2500)");
    }
}
