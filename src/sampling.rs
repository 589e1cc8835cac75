//! Sampling point selection
//!
//! Chooses which route waypoints need a weather query. The spacing depends on
//! route length and is then clamped by travel mode: slow modes need denser
//! sampling, fast modes cover weather systems quickly and need less.

use tracing::debug;

use crate::Result;
use crate::config::SamplingConfig;
use crate::error::{ErrorCode, RouteWeatherError};
use crate::models::{Route, TravelMode, Waypoint};

pub const WALKING_MAX_INTERVAL_KM: f64 = 10.0;
pub const CYCLING_MAX_INTERVAL_KM: f64 = 20.0;
pub const FLYING_MIN_INTERVAL_KM: f64 = 100.0;
pub const WATER_MIN_INTERVAL_KM: f64 = 75.0;

#[derive(Debug, Clone, Default)]
pub struct SamplingPointSelector {
    config: SamplingConfig,
}

impl SamplingPointSelector {
    #[must_use]
    pub fn new(config: SamplingConfig) -> Self {
        Self { config }
    }

    /// Sampling interval in km for a route, before any caller override
    #[must_use]
    pub fn interval_for(&self, route: &Route) -> f64 {
        let base = if route.total_distance < self.config.short_route_threshold_km {
            self.config.short_route_interval_km
        } else {
            self.config.long_route_interval_km
        };

        match route.travel_mode {
            TravelMode::Walking => base.min(WALKING_MAX_INTERVAL_KM),
            TravelMode::Cycling => base.min(CYCLING_MAX_INTERVAL_KM),
            TravelMode::Driving => base,
            TravelMode::Flying => base.max(FLYING_MIN_INTERVAL_KM),
            TravelMode::Sailing | TravelMode::Cruise => base.max(WATER_MIN_INTERVAL_KM),
        }
    }

    /// Waypoints to query for weather, in distance order.
    ///
    /// The first and last waypoints are always included. An override replaces
    /// the computed interval verbatim and is not clamped by travel mode.
    pub fn select(
        &self,
        route: &Route,
        interval_override_km: Option<f64>,
    ) -> Result<Vec<Waypoint>> {
        let interval = match interval_override_km {
            Some(km) if km.is_finite() && km > 0.0 => km,
            Some(km) => {
                return Err(RouteWeatherError::input(
                    ErrorCode::InvalidInterval,
                    format!("sampling interval must be positive, got {km}"),
                ));
            }
            None => self.interval_for(route),
        };

        let Some(first) = route.waypoints.first() else {
            return Ok(Vec::new());
        };

        let mut selected = vec![first.clone()];
        let mut last_selected = 0;
        let mut next_threshold = first.distance_from_start + interval;

        for (index, waypoint) in route.waypoints.iter().enumerate().skip(1) {
            if waypoint.distance_from_start >= next_threshold {
                selected.push(waypoint.clone());
                last_selected = index;
                while next_threshold <= waypoint.distance_from_start {
                    next_threshold += interval;
                }
            }
        }

        let last_index = route.waypoints.len() - 1;
        if last_selected != last_index {
            selected.push(route.waypoints[last_index].clone());
        }

        debug!(
            "Selected {} of {} waypoints at {interval} km spacing ({})",
            selected.len(),
            route.waypoints.len(),
            route.travel_mode
        );
        Ok(selected)
    }
}
