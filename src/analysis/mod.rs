//! Diagnostics over a resolved timeline: pattern transitions and travel-mode risk

pub mod patterns;
pub mod risk;

pub use patterns::PatternDetector;
pub use risk::{RiskLevel, TravelModeLimits, TravelRiskAssessment, assess_travel_mode_risk};
