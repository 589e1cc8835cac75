//! Timeline synchronization
//!
//! Resolves weather for every route waypoint at the moment the traveller gets
//! there. Resolution order for one point:
//! 1. an original forecast within the exact-match radius at the arrival instant
//! 2. forecasts at the waypoint itself, bracketed in time (or the best of them)
//! 3. forecasts projected onto the route and bracketed by distance
//! 4. the best match from the whole pool

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::Result;
use crate::error::{ErrorCode, RouteWeatherError};
use crate::geo::{self, TimeRange};
use crate::interpolation::{
    AnchoredSample, Interpolator, batch::MAX_RESAMPLED_POINTS, mean_direction, round_to,
};
use crate::matcher::WeatherMatcher;
use crate::models::{
    AlignmentSource, Conditions, NamedLocation, Precipitation, PrecipitationType, Route,
    RouteSegment, RouteTimeline, RouteTimelinePoint, SegmentWeatherAlignment, Temperature,
    WeatherCondition, WeatherForecast, WeatherSample, Wind, Waypoint, offset_time,
};
use crate::validation::{validate_inputs, validate_route};

/// Placeholder values for a segment with no forecast at all
pub const DEFAULT_TEMPERATURE_C: f64 = 15.0;
pub const DEFAULT_HUMIDITY: f64 = 50.0;
pub const DEFAULT_VISIBILITY_KM: f64 = 10.0;
pub const DEFAULT_DESCRIPTION: &str = "No weather data available";

#[derive(Debug, Clone, Default)]
pub struct TimelineSynchronizer {
    matcher: WeatherMatcher,
    interpolator: Interpolator,
}

/// Forecasts grouped by the route waypoint they lie closest to
struct RouteProjection<'a> {
    pool: &'a [WeatherForecast],
    /// waypoint index -> pool indices, ordered by waypoint (and so by distance)
    anchors: BTreeMap<usize, Vec<usize>>,
}

impl<'a> RouteProjection<'a> {
    fn new(route: &Route, pool: &'a [WeatherForecast], radius_km: f64) -> Self {
        let mut anchors: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (pool_index, forecast) in pool.iter().enumerate() {
            let nearest = route
                .waypoints
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    (i, geo::distance_km(&w.coordinates, &forecast.location.coordinates))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match nearest {
                Some((waypoint_index, km)) if km <= radius_km => {
                    anchors.entry(waypoint_index).or_default().push(pool_index);
                }
                _ => {}
            }
        }
        Self { pool, anchors }
    }

    /// Closest anchors at or below and at or above a route distance
    fn bracket(&self, route: &Route, distance_km: f64) -> (Option<usize>, Option<usize>) {
        let mut below = None;
        let mut above = None;
        for &index in self.anchors.keys() {
            let anchor_distance = route.waypoints[index].distance_from_start;
            if anchor_distance <= distance_km {
                below = Some(index);
            }
            if anchor_distance >= distance_km && above.is_none() {
                above = Some(index);
            }
        }
        (below, above)
    }

    fn forecasts_at(&self, waypoint_index: usize) -> Vec<WeatherForecast> {
        self.anchors
            .get(&waypoint_index)
            .map(|indices| indices.iter().map(|&i| self.pool[i].clone()).collect())
            .unwrap_or_default()
    }
}

impl TimelineSynchronizer {
    #[must_use]
    pub fn new(matcher: WeatherMatcher, interpolator: Interpolator) -> Self {
        Self {
            matcher,
            interpolator,
        }
    }

    /// One timeline point per route waypoint, ordered by time from start
    pub fn build_timeline(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
    ) -> Result<RouteTimeline> {
        validate_inputs(route, pool, start_time)?;
        let projection =
            RouteProjection::new(route, pool, self.matcher.config().location_radius_km);

        let mut timeline = route
            .waypoints
            .iter()
            .map(|waypoint| self.resolve_point(route, &projection, waypoint, start_time))
            .collect::<Result<RouteTimeline>>()?;
        timeline.sort_by(|a, b| a.time_from_start.total_cmp(&b.time_from_start));

        let interpolated = timeline.iter().filter(|p| p.is_interpolated).count();
        info!(
            "Built timeline with {} points ({interpolated} interpolated) from {} forecasts",
            timeline.len(),
            pool.len()
        );
        Ok(timeline)
    }

    /// Timeline at fixed travel-time steps; the route end is always included
    pub fn build_interval_timeline(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
        interval: Duration,
    ) -> Result<RouteTimeline> {
        validate_inputs(route, pool, start_time)?;
        let step_seconds = interval.num_milliseconds() as f64 / 1000.0;
        if step_seconds <= 0.0 {
            return Err(RouteWeatherError::input(
                ErrorCode::InvalidInterval,
                "timeline interval must be positive",
            ));
        }
        if route.estimated_duration / step_seconds >= MAX_RESAMPLED_POINTS as f64 {
            return Err(RouteWeatherError::input(
                ErrorCode::InvalidInterval,
                format!(
                    "timeline interval too small: would produce more than {MAX_RESAMPLED_POINTS} points"
                ),
            ));
        }

        let mut offsets = Vec::new();
        let mut offset = 0.0;
        while offset < route.estimated_duration {
            offsets.push(offset);
            offset += step_seconds;
        }
        offsets.push(route.estimated_duration);

        let projection =
            RouteProjection::new(route, pool, self.matcher.config().location_radius_km);
        let timeline = offsets
            .into_iter()
            .filter_map(|seconds| route.position_at(seconds))
            .map(|waypoint| self.resolve_point(route, &projection, &waypoint, start_time))
            .collect::<Result<RouteTimeline>>()?;

        debug!(
            "Built interval timeline with {} points every {step_seconds} s",
            timeline.len()
        );
        Ok(timeline)
    }

    /// Representative weather for each route segment's travel window.
    ///
    /// Windows are half-open so a forecast on a shared boundary counts for the
    /// later segment only; the last window also takes its end instant.
    /// An empty pool is not an error here: segments get a neutral placeholder.
    pub fn align_segments(
        &self,
        route: &Route,
        pool: &[WeatherForecast],
        start_time: DateTime<Utc>,
    ) -> Result<Vec<SegmentWeatherAlignment>> {
        validate_route(route, start_time)?;

        let mut elapsed = 0.0;
        let mut alignments = Vec::with_capacity(route.segments.len());
        for (segment_index, segment) in route.segments.iter().enumerate() {
            let window_start = offset_time(start_time, elapsed)?;
            elapsed += segment.duration;
            let window = TimeRange {
                start: window_start,
                end: offset_time(start_time, elapsed)?,
            };
            let window_mid = window.midpoint();
            let is_last = segment_index + 1 == route.segments.len();

            let in_window: Vec<&WeatherForecast> = pool
                .iter()
                .filter(|f| window.contains(f.timestamp) && (is_last || f.timestamp < window.end))
                .collect();

            let (average_weather, source) = if !in_window.is_empty() {
                (average_forecast(&in_window, segment, window_mid), AlignmentSource::Averaged)
            } else if let Some(closest) = pool
                .iter()
                .min_by_key(|f| (f.timestamp - window_mid).num_milliseconds().abs())
            {
                (closest.clone(), AlignmentSource::ClosestInTime)
            } else {
                (default_forecast(segment, window_mid), AlignmentSource::Default)
            };

            alignments.push(SegmentWeatherAlignment {
                segment_index,
                segment: segment.clone(),
                start_time: window.start,
                end_time: window.end,
                forecasts_in_window: in_window.len(),
                average_weather,
                source,
            });
        }

        debug!("Aligned weather with {} route segments", alignments.len());
        Ok(alignments)
    }

    fn resolve_point(
        &self,
        route: &Route,
        projection: &RouteProjection<'_>,
        waypoint: &Waypoint,
        start_time: DateTime<Utc>,
    ) -> Result<RouteTimelinePoint> {
        let travel_time = waypoint.arrival_time(start_time)?;
        let (weather, is_interpolated) =
            self.resolve_weather(route, projection, waypoint, travel_time, start_time)?;

        Ok(RouteTimelinePoint {
            waypoint: waypoint.clone(),
            weather,
            is_interpolated,
            travel_time,
            segment_index: route.segment_index_for(waypoint.distance_from_start),
            distance_from_start: waypoint.distance_from_start,
            time_from_start: waypoint.estimated_time_from_start,
        })
    }

    fn resolve_weather(
        &self,
        route: &Route,
        projection: &RouteProjection<'_>,
        waypoint: &Waypoint,
        travel_time: DateTime<Utc>,
        start_time: DateTime<Utc>,
    ) -> Result<(WeatherSample, bool)> {
        let pool = projection.pool;
        if let Some(exact) = self.matcher.find_exact(waypoint, travel_time, pool) {
            return Ok((WeatherSample::observed(exact.clone(), 1.0), false));
        }

        if let Some(sample) = self.resolve_local(waypoint, travel_time, pool)? {
            return Ok((sample, true));
        }

        if let Some(sample) = self.resolve_along_route(route, projection, waypoint, start_time)? {
            return Ok((sample, true));
        }

        let matched = self.matcher.match_weather(waypoint, travel_time, pool)?;
        Ok((matched.sample, true))
    }

    /// Forecasts at the waypoint itself but at other instants
    fn resolve_local(
        &self,
        waypoint: &Waypoint,
        travel_time: DateTime<Utc>,
        pool: &[WeatherForecast],
    ) -> Result<Option<WeatherSample>> {
        let radius = self.matcher.config().exact_match_radius_km;
        let local: Vec<WeatherForecast> = pool
            .iter()
            .filter(|f| geo::distance_km(&waypoint.coordinates, &f.location.coordinates) <= radius)
            .cloned()
            .collect();
        if local.is_empty() {
            return Ok(None);
        }

        let before = local
            .iter()
            .filter(|f| f.timestamp <= travel_time)
            .max_by_key(|f| f.timestamp);
        let after = local
            .iter()
            .filter(|f| f.timestamp >= travel_time)
            .min_by_key(|f| f.timestamp);

        if let (Some(before), Some(after)) = (before, after) {
            if before.timestamp != after.timestamp {
                let observed = |f: &WeatherForecast| {
                    let km = geo::distance_km(&waypoint.coordinates, &f.location.coordinates);
                    let confidence = self.matcher.confidence().offset_decay(false, 0.0, km);
                    WeatherSample::observed(f.clone(), confidence)
                };
                return Ok(Some(self.interpolator.interpolate_temporal(
                    &observed(before),
                    &observed(after),
                    travel_time,
                )));
            }
        }

        let matched = self.matcher.match_weather(waypoint, travel_time, &local)?;
        Ok(Some(matched.sample))
    }

    /// Bracket the waypoint between forecasts anchored at other route positions
    fn resolve_along_route(
        &self,
        route: &Route,
        projection: &RouteProjection<'_>,
        waypoint: &Waypoint,
        start_time: DateTime<Utc>,
    ) -> Result<Option<WeatherSample>> {
        let (Some(below), Some(above)) = projection.bracket(route, waypoint.distance_from_start)
        else {
            return Ok(None);
        };
        if below == above {
            return Ok(None);
        }

        let anchor = |index: usize| -> Result<AnchoredSample> {
            let anchor_waypoint = &route.waypoints[index];
            let matched = self.matcher.match_weather(
                anchor_waypoint,
                anchor_waypoint.arrival_time(start_time)?,
                &projection.forecasts_at(index),
            )?;
            Ok(AnchoredSample {
                waypoint: anchor_waypoint.clone(),
                sample: matched.sample,
            })
        };

        let a = anchor(below)?;
        let b = anchor(above)?;
        Ok(Some(self.interpolator.interpolate_spatial(&a, &b, waypoint)))
    }
}

/// Mean of scalar fields, majority condition, circular mean wind direction
fn average_forecast(
    forecasts: &[&WeatherForecast],
    segment: &RouteSegment,
    timestamp: DateTime<Utc>,
) -> WeatherForecast {
    let midpoint = segment.midpoint();
    let representative = forecasts
        .iter()
        .min_by(|a, b| {
            geo::distance_km(&a.location.coordinates, &midpoint)
                .total_cmp(&geo::distance_km(&b.location.coordinates, &midpoint))
        })
        .map_or_else(|| NamedLocation::new("Unknown", midpoint), |f| f.location.clone());

    let main = majority(forecasts.iter().map(|f| f.conditions.main))
        .unwrap_or(WeatherCondition::Cloudy);
    let (description, icon) = forecasts
        .iter()
        .find(|f| f.conditions.main == main)
        .map(|f| (f.conditions.description.clone(), f.conditions.icon.clone()))
        .unwrap_or_default();
    let precipitation_kind =
        majority(forecasts.iter().map(|f| f.precipitation.kind)).unwrap_or_default();

    let directions: Vec<f64> = forecasts.iter().map(|f| f.wind.direction).collect();

    WeatherForecast {
        location: representative,
        timestamp,
        temperature: Temperature {
            current: round_to(mean_of(forecasts, |f| f.temperature.current), 0),
            feels_like: round_to(mean_of(forecasts, |f| f.temperature.feels_like), 0),
            min: round_to(mean_of(forecasts, |f| f.temperature.min), 0),
            max: round_to(mean_of(forecasts, |f| f.temperature.max), 0),
        },
        conditions: Conditions {
            main,
            description,
            icon,
        },
        precipitation: Precipitation {
            kind: precipitation_kind,
            probability: round_to(mean_of(forecasts, |f| f.precipitation.probability), 0),
            intensity: round_to(mean_of(forecasts, |f| f.precipitation.intensity), 1),
        },
        wind: Wind {
            speed: round_to(mean_of(forecasts, |f| f.wind.speed), 1),
            direction: round_to(mean_direction(&directions), 0).rem_euclid(360.0),
        },
        humidity: round_to(mean_of(forecasts, |f| f.humidity), 0),
        visibility: round_to(mean_of(forecasts, |f| f.visibility), 1),
    }
}

fn mean_of(forecasts: &[&WeatherForecast], field: fn(&WeatherForecast) -> f64) -> f64 {
    forecasts.iter().map(|f| field(f)).sum::<f64>() / forecasts.len() as f64
}

fn default_forecast(segment: &RouteSegment, timestamp: DateTime<Utc>) -> WeatherForecast {
    WeatherForecast {
        location: NamedLocation::new("Unknown", segment.midpoint()),
        timestamp,
        temperature: Temperature {
            current: DEFAULT_TEMPERATURE_C,
            feels_like: DEFAULT_TEMPERATURE_C,
            min: DEFAULT_TEMPERATURE_C,
            max: DEFAULT_TEMPERATURE_C,
        },
        conditions: Conditions {
            main: WeatherCondition::Cloudy,
            description: DEFAULT_DESCRIPTION.to_string(),
            icon: "unknown".to_string(),
        },
        precipitation: Precipitation {
            kind: PrecipitationType::None,
            probability: 0.0,
            intensity: 0.0,
        },
        wind: Wind {
            speed: 0.0,
            direction: 0.0,
        },
        humidity: DEFAULT_HUMIDITY,
        visibility: DEFAULT_VISIBILITY_KM,
    }
}

/// Most frequent value; ties go to the value seen first
fn majority<T: PartialEq + Copy>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}
