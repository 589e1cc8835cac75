//! Shared fixtures for unit tests

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::{
    Conditions, Coordinate, NamedLocation, Precipitation, PrecipitationType, Route, RouteSegment,
    Temperature, TravelMode, WeatherCondition, WeatherForecast, Wind, Waypoint,
};

pub const NYC: (f64, f64) = (40.7128, -74.0060);
pub const MIDWAY: (f64, f64) = (41.5, -72.7);
pub const BOSTON: (f64, f64) = (42.3601, -71.0589);

pub fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

/// Clear-sky forecast `minutes` after [`start_time`]
pub fn forecast_at(
    latitude: f64,
    longitude: f64,
    minutes: i64,
    temperature: f64,
) -> WeatherForecast {
    WeatherForecast {
        location: NamedLocation::new("Test", coord(latitude, longitude)),
        timestamp: start_time() + Duration::minutes(minutes),
        temperature: Temperature {
            current: temperature,
            feels_like: temperature - 1.0,
            min: temperature - 3.0,
            max: temperature + 3.0,
        },
        conditions: Conditions {
            main: WeatherCondition::Sunny,
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
        },
        precipitation: Precipitation {
            kind: PrecipitationType::None,
            probability: 0.0,
            intensity: 0.0,
        },
        wind: Wind {
            speed: 10.0,
            direction: 180.0,
        },
        humidity: 50.0,
        visibility: 10.0,
    }
}

pub fn waypoint(location: (f64, f64), distance_km: f64, seconds: f64) -> Waypoint {
    Waypoint::new(coord(location.0, location.1), distance_km, seconds)
}

/// NYC -> Boston with waypoints at 0/150/300 km, 100 km/h
pub fn three_point_route(travel_mode: TravelMode) -> Route {
    let waypoints = vec![
        waypoint(NYC, 0.0, 0.0),
        waypoint(MIDWAY, 150.0, 5400.0),
        waypoint(BOSTON, 300.0, 10800.0),
    ];
    let segments = waypoints
        .windows(2)
        .map(|pair| RouteSegment {
            start_point: pair[0].clone(),
            end_point: pair[1].clone(),
            distance: pair[1].distance_from_start - pair[0].distance_from_start,
            duration: pair[1].estimated_time_from_start - pair[0].estimated_time_from_start,
            instructions: None,
        })
        .collect();
    Route {
        waypoints,
        segments,
        total_distance: 300.0,
        estimated_duration: 10800.0,
        travel_mode,
    }
}

/// Straight route with a waypoint every `step_km`, one segment per leg
pub fn linear_route(total_km: f64, step_km: f64, travel_mode: TravelMode) -> Route {
    let speed_km_per_s = 100.0 / 3600.0;
    let mut waypoints = Vec::new();
    let mut distance = 0.0;
    while distance <= total_km + 1e-9 {
        let latitude = 40.0 + distance / 111.0;
        waypoints.push(waypoint((latitude, -74.0), distance, distance / speed_km_per_s));
        distance += step_km;
    }
    let segments = waypoints
        .windows(2)
        .map(|pair| RouteSegment {
            start_point: pair[0].clone(),
            end_point: pair[1].clone(),
            distance: step_km,
            duration: step_km / speed_km_per_s,
            instructions: None,
        })
        .collect();
    Route {
        waypoints,
        segments,
        total_distance: total_km,
        estimated_duration: total_km / speed_km_per_s,
        travel_mode,
    }
}
