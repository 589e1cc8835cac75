//! Input validation and route/weather consistency auditing

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::Result;
use crate::error::{ErrorCode, RouteWeatherError};
use crate::geo::{BoundingBox, TimeRange};
use crate::models::{Route, ValidationResult, WeatherForecast};

pub const EMPTY_ROUTE_PENALTY: f64 = 0.5;
pub const INVALID_DURATION_PENALTY: f64 = 0.3;
pub const EMPTY_WEATHER_PENALTY: f64 = 0.5;
pub const INVALID_COORDINATES_PENALTY: f64 = 0.2;
pub const TIME_BOUNDARY_PENALTY: f64 = 0.1;
pub const MISSING_POINT_PENALTY: f64 = 0.05;
pub const MAX_MISSING_POINTS_PENALTY: f64 = 0.3;
pub const GEOGRAPHIC_MISMATCH_PENALTY: f64 = 0.2;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Reject a route the engine cannot place weather on when departing at `start_time`
pub fn validate_route(route: &Route, start_time: DateTime<Utc>) -> Result<()> {
    if route.waypoints.is_empty() {
        return Err(RouteWeatherError::input(
            ErrorCode::EmptyRoute,
            "route has no waypoints",
        ));
    }

    if !route.estimated_duration.is_finite() || route.estimated_duration <= 0.0 {
        return Err(RouteWeatherError::input(
            ErrorCode::InvalidDuration,
            format!(
                "route duration must be positive, got {} s",
                route.estimated_duration
            ),
        ));
    }

    for (index, waypoint) in route.waypoints.iter().enumerate() {
        if !waypoint.coordinates.is_valid() {
            return Err(RouteWeatherError::input(
                ErrorCode::InvalidCoordinates,
                format!(
                    "waypoint {index} has invalid coordinates ({}, {})",
                    waypoint.coordinates.latitude, waypoint.coordinates.longitude
                ),
            ));
        }
        let offset = waypoint.estimated_time_from_start;
        if !offset.is_finite() || offset < 0.0 {
            return Err(RouteWeatherError::input(
                ErrorCode::InvalidTimestamp,
                format!("waypoint {index} has invalid time offset {offset}"),
            ));
        }
        waypoint.arrival_time(start_time)?;
    }

    if let Some(index) = route
        .segments
        .iter()
        .position(|segment| !segment.duration.is_finite() || segment.duration < 0.0)
    {
        return Err(RouteWeatherError::input(
            ErrorCode::InvalidDuration,
            format!(
                "segment {index} has invalid duration {} s",
                route.segments[index].duration
            ),
        ));
    }

    route.end_time(start_time)?;
    Ok(())
}

/// Reject inputs that cannot produce a timeline: a bad route, an empty
/// forecast pool, or forecasts with out-of-range coordinates
pub fn validate_inputs(
    route: &Route,
    pool: &[WeatherForecast],
    start_time: DateTime<Utc>,
) -> Result<()> {
    validate_route(route, start_time)?;

    if pool.is_empty() {
        return Err(RouteWeatherError::no_weather_data("forecast pool is empty"));
    }

    if let Some(bad) = pool.iter().find(|f| !f.location.coordinates.is_valid()) {
        return Err(RouteWeatherError::input(
            ErrorCode::InvalidCoordinates,
            format!(
                "forecast for '{}' has invalid coordinates ({}, {})",
                bad.location.name,
                bad.location.coordinates.latitude,
                bad.location.coordinates.longitude
            ),
        ));
    }

    Ok(())
}

/// Audit how well the forecast pool covers the route in time and space.
///
/// Never fails: every problem is reported as an error or warning and
/// reflected in the consistency score.
#[must_use]
pub fn validate_consistency(
    route: &Route,
    pool: &[WeatherForecast],
    start_time: DateTime<Utc>,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut score = 1.0;

    if route.waypoints.is_empty() {
        errors.push("Route has no waypoints".to_string());
        score -= EMPTY_ROUTE_PENALTY;
    }

    let route_end = if route.estimated_duration.is_finite() && route.estimated_duration > 0.0 {
        route.end_time(start_time).ok()
    } else {
        None
    };
    if route_end.is_none() {
        errors.push(format!(
            "Route duration must be positive and end within the supported time range (got {} s)",
            route.estimated_duration
        ));
        score -= INVALID_DURATION_PENALTY;
    }

    if pool.is_empty() {
        errors.push("No weather data available for route".to_string());
        score -= EMPTY_WEATHER_PENALTY;
    }

    let invalid_waypoints = route
        .waypoints
        .iter()
        .filter(|w| !w.coordinates.is_valid())
        .count();
    let invalid_forecasts = pool
        .iter()
        .filter(|f| !f.location.coordinates.is_valid())
        .count();
    if invalid_waypoints + invalid_forecasts > 0 {
        errors.push(format!(
            "Invalid coordinates: {invalid_waypoints} waypoint(s), {invalid_forecasts} forecast(s)"
        ));
        score -= INVALID_COORDINATES_PENALTY;
    }

    if let Some(range) = TimeRange::from_timestamps(pool.iter().map(|f| f.timestamp)) {
        if range.start > start_time {
            warnings.push("Weather data starts after route start time".to_string());
            score -= TIME_BOUNDARY_PENALTY;
        }
        if route_end.is_some_and(|end| range.end < end) {
            warnings.push("Weather data ends before route completion".to_string());
            score -= TIME_BOUNDARY_PENALTY;
        }
    }

    let expected_points = expected_hourly_points(route);
    let available = u32::try_from(pool.len()).unwrap_or(u32::MAX);
    let missing_data_points = expected_points.saturating_sub(available);
    if missing_data_points > 0 {
        warnings.push(format!(
            "Missing {missing_data_points} of {expected_points} expected hourly weather data points"
        ));
        let penalty = f64::from(missing_data_points) * MISSING_POINT_PENALTY;
        score -= penalty.min(MAX_MISSING_POINTS_PENALTY);
    }

    let route_box = BoundingBox::from_points(route.waypoints.iter().map(|w| &w.coordinates));
    let weather_box = BoundingBox::from_points(pool.iter().map(|f| &f.location.coordinates));
    if let (Some(route_box), Some(weather_box)) = (route_box, weather_box) {
        if !route_box.intersects(&weather_box) {
            warnings.push(
                "Weather data geographic coverage may not fully align with route".to_string(),
            );
            score -= GEOGRAPHIC_MISMATCH_PENALTY;
        }
    }

    let data_consistency_score = f64::clamp(score, 0.0, 1.0);
    if errors.is_empty() {
        debug!(
            "Consistency check passed with score {data_consistency_score:.2} ({} warnings)",
            warnings.len()
        );
    } else {
        warn!(
            "Consistency check found {} error(s), score {data_consistency_score:.2}",
            errors.len()
        );
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        missing_data_points,
        data_consistency_score,
    }
}

/// Number of whole hours a route spans, as used for expected sample counts
#[must_use]
pub fn expected_hourly_points(route: &Route) -> u32 {
    if !route.estimated_duration.is_finite() || route.estimated_duration <= 0.0 {
        return 0;
    }
    (route.estimated_duration / SECONDS_PER_HOUR).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TravelMode;
    use crate::test_support::{BOSTON, MIDWAY, NYC, forecast_at, start_time, three_point_route};

    fn full_pool() -> Vec<WeatherForecast> {
        vec![
            forecast_at(NYC.0, NYC.1, 0, 15.0),
            forecast_at(MIDWAY.0, MIDWAY.1, 90, 12.0),
            forecast_at(BOSTON.0, BOSTON.1, 180, 8.0),
        ]
    }

    #[test]
    fn test_well_covered_route_is_clean() {
        let route = three_point_route(TravelMode::Driving);
        let result = validate_consistency(&route, &full_pool(), start_time());
        assert!(result.is_valid);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.missing_data_points, 0);
        assert_eq!(result.data_consistency_score, 1.0);
    }

    #[test]
    fn test_late_weather_warns_about_start() {
        let route = three_point_route(TravelMode::Driving);
        let pool: Vec<_> = [0, 90, 180]
            .iter()
            .map(|m| forecast_at(NYC.0, NYC.1, 24 * 60 + m, 10.0))
            .collect();
        let result = validate_consistency(&route, &pool, start_time());
        assert!(result.is_valid);
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.contains("starts after route start time"))
        );
        assert!(result.data_consistency_score < 1.0);
    }

    #[test]
    fn test_early_weather_warns_about_completion() {
        let route = three_point_route(TravelMode::Driving);
        let pool: Vec<_> = [-120, -60, 0]
            .iter()
            .map(|m| forecast_at(NYC.0, NYC.1, *m, 10.0))
            .collect();
        let result = validate_consistency(&route, &pool, start_time());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.contains("ends before route completion"))
        );
        assert!((result.data_consistency_score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_missing_hourly_points() {
        let route = three_point_route(TravelMode::Driving);
        let pool = vec![
            forecast_at(NYC.0, NYC.1, 0, 15.0),
            forecast_at(BOSTON.0, BOSTON.1, 180, 8.0),
        ];
        let result = validate_consistency(&route, &pool, start_time());
        assert_eq!(result.missing_data_points, 1);
        assert!((result.data_consistency_score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_geographic_mismatch() {
        let route = three_point_route(TravelMode::Driving);
        let pool: Vec<_> = [0, 90, 180]
            .iter()
            .map(|m| forecast_at(48.8566, 2.3522, *m, 18.0))
            .collect();
        let result = validate_consistency(&route, &pool, start_time());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.contains("geographic coverage may not fully align"))
        );
        assert!((result.data_consistency_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_never_negative() {
        let mut route = three_point_route(TravelMode::Driving);
        route.waypoints.clear();
        route.estimated_duration = 0.0;
        let result = validate_consistency(&route, &[], start_time());
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
        assert_eq!(result.data_consistency_score, 0.0);
    }

    #[test]
    fn test_invalid_coordinates_are_errors() {
        let route = three_point_route(TravelMode::Driving);
        let mut pool = full_pool();
        pool[1].location.coordinates.latitude = 95.0;
        let result = validate_consistency(&route, &pool, start_time());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Invalid coordinates"));
        assert!((result.data_consistency_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_validate_inputs_codes() {
        let route = three_point_route(TravelMode::Driving);
        assert!(validate_inputs(&route, &full_pool(), start_time()).is_ok());

        let err = validate_inputs(&route, &[], start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoWeatherData);

        let mut empty = route.clone();
        empty.waypoints.clear();
        let err = validate_inputs(&empty, &full_pool(), start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyRoute);
        assert!(
            err.suggestions()
                .iter()
                .any(|s| s.contains("waypoint generation"))
        );

        let mut stalled = route.clone();
        stalled.estimated_duration = -1.0;
        let err = validate_inputs(&stalled, &full_pool(), start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDuration);

        let mut bad_pool = full_pool();
        bad_pool[0].location.coordinates.longitude = 200.0;
        let err = validate_inputs(&route, &bad_pool, start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCoordinates);

        let mut bad_time = route;
        bad_time.waypoints[1].estimated_time_from_start = f64::NAN;
        let err = validate_inputs(&bad_time, &full_pool(), start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTimestamp);
    }

    #[test]
    fn test_offsets_past_the_calendar_are_rejected() {
        let mut far_waypoint = three_point_route(TravelMode::Driving);
        far_waypoint.waypoints[2].estimated_time_from_start = 1e17;
        let err = validate_route(&far_waypoint, start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTimestamp);

        let mut endless = three_point_route(TravelMode::Driving);
        endless.estimated_duration = 1e300;
        let err = validate_route(&endless, start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTimestamp);

        let mut bad_segment = three_point_route(TravelMode::Driving);
        bad_segment.segments[0].duration = f64::NAN;
        let err = validate_route(&bad_segment, start_time()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDuration);
    }

    #[test]
    fn test_unrepresentable_route_end_is_an_error_not_a_panic() {
        let mut route = three_point_route(TravelMode::Driving);
        route.estimated_duration = 1e300;
        let pool = vec![forecast_at(NYC.0, NYC.1, 0, 15.0)];
        let result = validate_consistency(&route, &pool, start_time());

        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("supported time range"))
        );
        assert!(!result.warnings.iter().any(|w| w.contains("ends before")));
        assert!((0.0..=1.0).contains(&result.data_consistency_score));
    }

    #[test]
    fn test_expected_hourly_points_rounds_up() {
        let mut route = three_point_route(TravelMode::Driving);
        assert_eq!(expected_hourly_points(&route), 3);
        route.estimated_duration = 3601.0;
        assert_eq!(expected_hourly_points(&route), 2);
    }
}
