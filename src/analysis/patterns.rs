//! Weather pattern change detection between consecutive timeline points

use tracing::debug;

use crate::config::PatternConfig;
use crate::models::{
    PatternChangeKind, PrecipitationType, RouteTimelinePoint, Severity, WeatherCondition,
    WeatherForecast, WeatherPatternChange,
};

pub const CONDITION_MAJOR_SCORE: f64 = 3.0;
pub const CONDITION_MODERATE_SCORE: f64 = 1.5;
pub const PRECIPITATION_MAJOR_SCORE: f64 = 2.0;
pub const PRECIPITATION_MODERATE_SCORE: f64 = 1.0;

/// Divisors that put temperature/wind/precipitation deltas on the same scale
/// as one step of condition severity
const CONDITION_RANK_DIVISOR: f64 = 2.0;
const TEMPERATURE_DIVISOR: f64 = 10.0;
const WIND_DIVISOR: f64 = 20.0;
const INTENSITY_DIVISOR: f64 = 5.0;
const PROBABILITY_DIVISOR: f64 = 50.0;

#[derive(Debug, Clone, Default)]
pub struct PatternDetector {
    config: PatternConfig,
}

impl PatternDetector {
    #[must_use]
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Changes between consecutive points in time order.
    ///
    /// `sensitivity` is the minimum score a change needs to be reported.
    #[must_use]
    pub fn detect(
        &self,
        timeline: &[RouteTimelinePoint],
        sensitivity: f64,
    ) -> Vec<WeatherPatternChange> {
        let mut ordered: Vec<&RouteTimelinePoint> = timeline.iter().collect();
        ordered.sort_by(|a, b| a.time_from_start.total_cmp(&b.time_from_start));

        let mut changes = Vec::new();
        for pair in ordered.windows(2) {
            let (from, to) = (pair[0].forecast(), pair[1].forecast());

            if let Some(change) = self.condition_change(from, to) {
                changes.push(change);
            }
            if let Some(change) = self.temperature_change(from, to) {
                changes.push(change);
            }
            if let Some(change) = self.precipitation_change(from, to) {
                changes.push(change);
            }
        }
        changes.retain(|change| change.score >= sensitivity);

        debug!(
            "Detected {} pattern changes across {} timeline points",
            changes.len(),
            timeline.len()
        );
        changes
    }

    fn condition_change(
        &self,
        from: &WeatherForecast,
        to: &WeatherForecast,
    ) -> Option<WeatherPatternChange> {
        let (a, b) = (from.conditions.main, to.conditions.main);
        if a == b {
            return None;
        }

        let rank_delta = f64::from(a.severity_rank().abs_diff(b.severity_rank()));
        let temperature_delta = (to.temperature.current - from.temperature.current).abs();
        let wind_delta = (to.wind.speed - from.wind.speed).abs();
        let precipitation_flag = if from.precipitation.kind == to.precipitation.kind {
            0.0
        } else {
            1.0
        };
        let score = rank_delta / CONDITION_RANK_DIVISOR
            + temperature_delta / TEMPERATURE_DIVISOR
            + wind_delta / WIND_DIVISOR
            + precipitation_flag;

        let severity = if score >= CONDITION_MAJOR_SCORE {
            Severity::Major
        } else if score >= CONDITION_MODERATE_SCORE {
            Severity::Moderate
        } else {
            Severity::Minor
        };

        Some(WeatherPatternChange {
            kind: PatternChangeKind::Condition,
            location: to.location.clone(),
            timestamp: to.timestamp,
            from_condition: a,
            to_condition: b,
            severity,
            score,
            description: format!("Weather changes from {} to {}", a.as_str(), b.as_str()),
            travel_impact: condition_impact(a, b).to_string(),
        })
    }

    fn temperature_change(
        &self,
        from: &WeatherForecast,
        to: &WeatherForecast,
    ) -> Option<WeatherPatternChange> {
        let delta = to.temperature.current - from.temperature.current;
        if delta.abs() < self.config.temperature_moderate_c {
            return None;
        }

        let severity = if delta.abs() >= self.config.temperature_major_c {
            Severity::Major
        } else {
            Severity::Moderate
        };
        let (verb, travel_impact) = if delta < 0.0 {
            ("drops", "Significant cooling ahead; pack warm layers")
        } else {
            ("rises", "Significant warming ahead; carry water and plan shade breaks")
        };

        Some(WeatherPatternChange {
            kind: PatternChangeKind::Temperature,
            location: to.location.clone(),
            timestamp: to.timestamp,
            from_condition: from.conditions.main,
            to_condition: to.conditions.main,
            severity,
            score: delta.abs() / TEMPERATURE_DIVISOR,
            description: format!(
                "Temperature {verb} by {:.0}°C ({} to {})",
                delta.abs(),
                from.format_temperature(),
                to.format_temperature()
            ),
            travel_impact: travel_impact.to_string(),
        })
    }

    fn precipitation_change(
        &self,
        from: &WeatherForecast,
        to: &WeatherForecast,
    ) -> Option<WeatherPatternChange> {
        let (a, b) = (from.precipitation.kind, to.precipitation.kind);
        if a == b {
            return None;
        }

        let intensity_delta = (to.precipitation.intensity - from.precipitation.intensity).abs();
        let probability_delta =
            (to.precipitation.probability - from.precipitation.probability).abs();
        let score =
            1.0 + intensity_delta / INTENSITY_DIVISOR + probability_delta / PROBABILITY_DIVISOR;
        let severity = if score >= PRECIPITATION_MAJOR_SCORE {
            Severity::Major
        } else if score >= PRECIPITATION_MODERATE_SCORE {
            Severity::Moderate
        } else {
            Severity::Minor
        };

        Some(WeatherPatternChange {
            kind: PatternChangeKind::Precipitation,
            location: to.location.clone(),
            timestamp: to.timestamp,
            from_condition: from.conditions.main,
            to_condition: to.conditions.main,
            severity,
            score,
            description: format!("Precipitation changes from {} to {}", a.as_str(), b.as_str()),
            travel_impact: precipitation_impact(a, b),
        })
    }
}

fn condition_impact(from: WeatherCondition, to: WeatherCondition) -> &'static str {
    if to.severity_rank() < from.severity_rank() {
        return "Conditions improving";
    }
    match to {
        WeatherCondition::Stormy => "Severe weather ahead; consider delaying travel",
        WeatherCondition::Snowy => "Snow ahead; check road conditions and equip for winter travel",
        WeatherCondition::Rainy => "Rain ahead; allow extra travel time",
        WeatherCondition::Foggy => "Reduced visibility ahead; travel with caution",
        WeatherCondition::Overcast | WeatherCondition::Cloudy | WeatherCondition::Sunny => {
            "Minor change in cloud cover"
        }
    }
}

fn precipitation_impact(from: PrecipitationType, to: PrecipitationType) -> String {
    match (from, to) {
        (PrecipitationType::None, _) => {
            "Precipitation starting; consider protective gear".to_string()
        }
        (_, PrecipitationType::None) => "Precipitation ending; conditions improving".to_string(),
        (_, to) => format!("Precipitation turning to {}; adjust travel plans", to.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RouteTimelinePoint, WeatherSample};
    use crate::test_support::{NYC, forecast_at, waypoint};

    fn point(minutes: i64, forecast: WeatherForecast) -> RouteTimelinePoint {
        let seconds = (minutes * 60) as f64;
        RouteTimelinePoint {
            waypoint: waypoint(NYC, minutes as f64, seconds),
            travel_time: forecast.timestamp,
            weather: WeatherSample::observed(forecast, 1.0),
            is_interpolated: false,
            segment_index: 0,
            distance_from_start: minutes as f64,
            time_from_start: seconds,
        }
    }

    fn with(temperature: f64, condition: WeatherCondition, minutes: i64) -> WeatherForecast {
        let mut forecast = forecast_at(NYC.0, NYC.1, minutes, temperature);
        forecast.conditions.main = condition;
        forecast
    }

    #[test]
    fn test_sunny_to_stormy_with_cooling_is_major() {
        let timeline = vec![
            point(0, with(30.0, WeatherCondition::Sunny, 0)),
            point(60, with(10.0, WeatherCondition::Stormy, 60)),
        ];
        let changes = PatternDetector::default().detect(&timeline, 0.5);

        let condition = changes
            .iter()
            .find(|c| c.kind == PatternChangeKind::Condition)
            .unwrap();
        assert_eq!(condition.severity, Severity::Major);
        assert!((condition.score - 5.0).abs() < 1e-9);
        assert_eq!(condition.from_condition, WeatherCondition::Sunny);
        assert_eq!(condition.to_condition, WeatherCondition::Stormy);

        let temperature = changes
            .iter()
            .find(|c| c.kind == PatternChangeKind::Temperature)
            .unwrap();
        assert_eq!(temperature.severity, Severity::Major);
        assert!(temperature.description.contains("drops"));
    }

    #[test]
    fn test_condition_severity_thresholds() {
        let detector = PatternDetector::default();
        let sunny = with(15.0, WeatherCondition::Sunny, 0);
        let minor = detector
            .condition_change(&sunny, &with(15.0, WeatherCondition::Cloudy, 60))
            .unwrap();
        assert_eq!(minor.severity, Severity::Minor);

        let moderate = detector
            .condition_change(&sunny, &with(15.0, WeatherCondition::Foggy, 60))
            .unwrap();
        assert_eq!(moderate.severity, Severity::Moderate);
        assert_eq!(moderate.travel_impact, "Reduced visibility ahead; travel with caution");
    }

    #[test]
    fn test_temperature_change_thresholds() {
        let detector = PatternDetector::default();
        let from = with(10.0, WeatherCondition::Sunny, 0);
        assert!(
            detector
                .temperature_change(&from, &with(19.0, WeatherCondition::Sunny, 60))
                .is_none()
        );
        let moderate = detector
            .temperature_change(&from, &with(20.0, WeatherCondition::Sunny, 60))
            .unwrap();
        assert_eq!(moderate.severity, Severity::Moderate);
        let major = detector
            .temperature_change(&from, &with(30.0, WeatherCondition::Sunny, 60))
            .unwrap();
        assert_eq!(major.severity, Severity::Major);
    }

    #[test]
    fn test_precipitation_starting() {
        let from = with(15.0, WeatherCondition::Rainy, 0);
        let mut to = with(15.0, WeatherCondition::Rainy, 60);
        to.precipitation.kind = PrecipitationType::Rain;
        to.precipitation.intensity = 5.0;
        to.precipitation.probability = 50.0;

        let change = PatternDetector::default().precipitation_change(&from, &to).unwrap();
        assert!((change.score - 3.0).abs() < 1e-9);
        assert_eq!(change.severity, Severity::Major);
        assert!(change.travel_impact.contains("protective gear"));
    }

    #[test]
    fn test_sensitivity_filters_minor_changes() {
        let timeline = vec![
            point(0, with(15.0, WeatherCondition::Sunny, 0)),
            point(60, with(15.0, WeatherCondition::Cloudy, 60)),
        ];
        let detector = PatternDetector::default();
        assert_eq!(detector.detect(&timeline, 0.5).len(), 1);
        assert!(detector.detect(&timeline, 1.0).is_empty());
    }

    #[test]
    fn test_stable_weather_has_no_changes() {
        let timeline = vec![
            point(0, with(15.0, WeatherCondition::Sunny, 0)),
            point(60, with(16.0, WeatherCondition::Sunny, 60)),
            point(120, with(14.0, WeatherCondition::Sunny, 120)),
        ];
        assert!(PatternDetector::default().detect(&timeline, 0.0).is_empty());
    }

    #[test]
    fn test_unordered_timeline_is_walked_in_time_order() {
        let timeline = vec![
            point(60, with(10.0, WeatherCondition::Stormy, 60)),
            point(0, with(30.0, WeatherCondition::Sunny, 0)),
        ];
        let changes = PatternDetector::default().detect(&timeline, 0.5);
        assert!(changes.iter().all(|c| c.from_condition == WeatherCondition::Sunny));
    }
}
