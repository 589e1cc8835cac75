//! Travel-mode specific weather risk assessment
//!
//! Each travel mode has a fixed table of bands. A forecast dimension inside the
//! optimal band is low risk, inside the tolerable band moderate, and outside
//! it high.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::PrecipitationType::{self, Hail, None as NoPrecipitation, Rain, Sleet, Snow};
use crate::models::{TravelMode, WeatherForecast};

/// Overall risk, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        })
    }
}

/// Weather limits for one travel mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelModeLimits {
    /// Comfortable temperature range in °C
    pub temperature_optimal: (f64, f64),
    /// Outside this range temperature is dangerous
    pub temperature_tolerable: (f64, f64),
    /// Wind speeds in km/h
    pub wind_warning: f64,
    pub wind_dangerous: f64,
    /// Visibility in km; below these values
    pub visibility_warning: f64,
    pub visibility_dangerous: f64,
    pub precipitation_acceptable: &'static [PrecipitationType],
    pub precipitation_warning: &'static [PrecipitationType],
    pub precipitation_dangerous: &'static [PrecipitationType],
}

impl TravelModeLimits {
    #[must_use]
    pub fn for_mode(mode: TravelMode) -> Self {
        match mode {
            TravelMode::Walking => Self {
                temperature_optimal: (10.0, 25.0),
                temperature_tolerable: (-5.0, 35.0),
                wind_warning: 20.0,
                wind_dangerous: 40.0,
                visibility_warning: 5.0,
                visibility_dangerous: 1.0,
                precipitation_acceptable: &[NoPrecipitation],
                precipitation_warning: &[Rain, Snow],
                precipitation_dangerous: &[Sleet, Hail],
            },
            TravelMode::Cycling => Self {
                temperature_optimal: (10.0, 28.0),
                temperature_tolerable: (0.0, 35.0),
                wind_warning: 15.0,
                wind_dangerous: 30.0,
                visibility_warning: 5.0,
                visibility_dangerous: 2.0,
                precipitation_acceptable: &[NoPrecipitation],
                precipitation_warning: &[Rain],
                precipitation_dangerous: &[Snow, Sleet, Hail],
            },
            TravelMode::Driving => Self {
                temperature_optimal: (-5.0, 35.0),
                temperature_tolerable: (-20.0, 45.0),
                wind_warning: 50.0,
                wind_dangerous: 80.0,
                visibility_warning: 10.0,
                visibility_dangerous: 1.0,
                precipitation_acceptable: &[NoPrecipitation, Rain],
                precipitation_warning: &[Snow, Sleet],
                precipitation_dangerous: &[Hail],
            },
            TravelMode::Flying => Self {
                temperature_optimal: (-20.0, 40.0),
                temperature_tolerable: (-40.0, 50.0),
                wind_warning: 40.0,
                wind_dangerous: 70.0,
                visibility_warning: 8.0,
                visibility_dangerous: 3.0,
                precipitation_acceptable: &[NoPrecipitation, Rain],
                precipitation_warning: &[Snow, Sleet],
                precipitation_dangerous: &[Hail],
            },
            TravelMode::Sailing => Self {
                temperature_optimal: (10.0, 30.0),
                temperature_tolerable: (0.0, 38.0),
                wind_warning: 30.0,
                wind_dangerous: 45.0,
                visibility_warning: 5.0,
                visibility_dangerous: 1.0,
                precipitation_acceptable: &[NoPrecipitation],
                precipitation_warning: &[Rain],
                precipitation_dangerous: &[Snow, Sleet, Hail],
            },
            TravelMode::Cruise => Self {
                temperature_optimal: (5.0, 35.0),
                temperature_tolerable: (-10.0, 40.0),
                wind_warning: 50.0,
                wind_dangerous: 80.0,
                visibility_warning: 5.0,
                visibility_dangerous: 1.0,
                precipitation_acceptable: &[NoPrecipitation, Rain],
                precipitation_warning: &[Snow, Sleet],
                precipitation_dangerous: &[Hail],
            },
        }
    }

    #[must_use]
    pub fn classify_temperature(&self, celsius: f64) -> RiskLevel {
        let (optimal_low, optimal_high) = self.temperature_optimal;
        let (tolerable_low, tolerable_high) = self.temperature_tolerable;
        if celsius < tolerable_low || celsius > tolerable_high {
            RiskLevel::High
        } else if celsius < optimal_low || celsius > optimal_high {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    #[must_use]
    pub fn classify_wind(&self, speed_kmh: f64) -> RiskLevel {
        if speed_kmh > self.wind_dangerous {
            RiskLevel::High
        } else if speed_kmh > self.wind_warning {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    #[must_use]
    pub fn classify_visibility(&self, km: f64) -> RiskLevel {
        if km < self.visibility_dangerous {
            RiskLevel::High
        } else if km < self.visibility_warning {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    /// Types in no set are treated as a warning
    #[must_use]
    pub fn classify_precipitation(&self, kind: PrecipitationType) -> RiskLevel {
        if self.precipitation_dangerous.contains(&kind) {
            RiskLevel::High
        } else if self.precipitation_warning.contains(&kind) {
            RiskLevel::Moderate
        } else if self.precipitation_acceptable.contains(&kind) {
            RiskLevel::Low
        } else {
            RiskLevel::Moderate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRiskAssessment {
    pub mode: TravelMode,
    pub risk_level: RiskLevel,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Aggregates the recommendations are keyed off
struct ForecastStats {
    average_temperature: f64,
    max_wind: f64,
    min_visibility: f64,
    any_precipitation: bool,
}

impl ForecastStats {
    fn from_forecasts(forecasts: &[WeatherForecast]) -> Option<Self> {
        if forecasts.is_empty() {
            return None;
        }
        Some(Self {
            average_temperature: forecasts.iter().map(|f| f.temperature.current).sum::<f64>()
                / forecasts.len() as f64,
            max_wind: forecasts.iter().map(|f| f.wind.speed).fold(0.0, f64::max),
            min_visibility: forecasts
                .iter()
                .map(|f| f.visibility)
                .fold(f64::INFINITY, f64::min),
            any_precipitation: forecasts.iter().any(WeatherForecast::has_precipitation),
        })
    }
}

/// Classify every forecast against the mode's limits and collect warnings
/// plus mode-specific recommendations
#[must_use]
pub fn assess_travel_mode_risk(
    mode: TravelMode,
    forecasts: &[WeatherForecast],
) -> TravelRiskAssessment {
    let limits = TravelModeLimits::for_mode(mode);
    let mut warnings = Vec::new();
    let mut risk_level = RiskLevel::Low;

    for forecast in forecasts {
        let at = format!(
            "at {} ({})",
            forecast.location.name,
            forecast.timestamp.format("%Y-%m-%d %H:%M UTC")
        );

        let temperature = limits.classify_temperature(forecast.temperature.current);
        match temperature {
            RiskLevel::High => warnings.push(format!(
                "Dangerous temperature for {mode}: {} {at}",
                forecast.format_temperature()
            )),
            RiskLevel::Moderate => warnings.push(format!(
                "Uncomfortable temperature for {mode}: {} {at}",
                forecast.format_temperature()
            )),
            RiskLevel::Low => {}
        }

        let wind = limits.classify_wind(forecast.wind.speed);
        match wind {
            RiskLevel::High => warnings.push(format!(
                "Dangerous wind speed for {mode}: {} {at}",
                forecast.format_wind()
            )),
            RiskLevel::Moderate => warnings.push(format!(
                "Strong wind for {mode}: {} {at}",
                forecast.format_wind()
            )),
            RiskLevel::Low => {}
        }

        let visibility = limits.classify_visibility(forecast.visibility);
        match visibility {
            RiskLevel::High => warnings.push(format!(
                "Dangerous visibility for {mode}: {:.1} km {at}",
                forecast.visibility
            )),
            RiskLevel::Moderate => warnings.push(format!(
                "Reduced visibility for {mode}: {:.1} km {at}",
                forecast.visibility
            )),
            RiskLevel::Low => {}
        }

        let precipitation = limits.classify_precipitation(forecast.precipitation.kind);
        match precipitation {
            RiskLevel::High => warnings.push(format!(
                "Dangerous precipitation for {mode}: {} {at}",
                forecast.precipitation.kind
            )),
            RiskLevel::Moderate => warnings.push(format!(
                "Precipitation may affect {mode}: {} {at}",
                forecast.precipitation.kind
            )),
            RiskLevel::Low => {}
        }

        risk_level = risk_level.max(temperature).max(wind).max(visibility).max(precipitation);
    }

    let recommendations = ForecastStats::from_forecasts(forecasts)
        .map(|stats| recommendations_for(mode, &limits, &stats))
        .unwrap_or_default();

    debug!(
        "Assessed {} forecasts for {mode}: {risk_level} risk, {} warnings",
        forecasts.len(),
        warnings.len()
    );

    TravelRiskAssessment {
        mode,
        risk_level,
        warnings,
        recommendations,
    }
}

fn recommendations_for(
    mode: TravelMode,
    limits: &TravelModeLimits,
    stats: &ForecastStats,
) -> Vec<String> {
    let mut recommendations: Vec<&str> = Vec::new();
    let windy = stats.max_wind > limits.wind_warning;
    let hazy = stats.min_visibility < limits.visibility_warning;

    match mode {
        TravelMode::Walking => {
            if stats.average_temperature < 10.0 {
                recommendations.push("Wear layered clothing");
            }
            if stats.average_temperature > 25.0 {
                recommendations.push("Carry extra water and take shade breaks");
            }
            if stats.any_precipitation {
                recommendations.push("Bring waterproof clothing");
            }
            if windy {
                recommendations.push("Prefer sheltered paths away from exposed ridges");
            }
            if hazy {
                recommendations.push("Wear high-visibility clothing");
            }
        }
        TravelMode::Cycling => {
            if stats.average_temperature < 10.0 {
                recommendations.push("Wear thermal cycling gear");
            }
            if stats.any_precipitation {
                recommendations.push("Fit mudguards and allow longer braking distances");
            }
            if windy {
                recommendations.push("Expect strong headwinds; plan extra time");
            }
            if hazy {
                recommendations.push("Use front and rear lights");
            }
        }
        TravelMode::Driving => {
            if stats.average_temperature < 3.0 {
                recommendations.push("Watch for ice on bridges and shaded roads");
            }
            if stats.any_precipitation {
                recommendations.push("Reduce speed and increase following distance");
            }
            if windy {
                recommendations.push("Take care with crosswinds on exposed roads");
            }
            if hazy {
                recommendations.push("Use dipped headlights");
            }
        }
        TravelMode::Flying => {
            if windy {
                recommendations.push("Check with your airline for possible delays");
            }
            if stats.any_precipitation {
                recommendations.push("Allow extra time for ground delays");
            }
            if hazy {
                recommendations.push("Low visibility may delay departure");
            }
        }
        TravelMode::Sailing => {
            if windy {
                recommendations.push("Reef early and check the marine forecast");
            }
            if stats.average_temperature < 10.0 {
                recommendations.push("Wear thermal layers under foul-weather gear");
            }
            if stats.any_precipitation {
                recommendations.push("Wear foul-weather gear");
            }
            if hazy {
                recommendations.push("Use radar and sound signals");
            }
        }
        TravelMode::Cruise => {
            if windy {
                recommendations.push("Expect rough seas; consider seasickness remedies");
            }
            if stats.any_precipitation {
                recommendations.push("Plan indoor activities on board");
            }
            if stats.average_temperature > 30.0 {
                recommendations.push("Use sun protection on deck");
            }
        }
    }

    recommendations.into_iter().map(str::to_string).collect()
}
