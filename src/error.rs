//! Error types and handling for the route-weather engine

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Machine-readable error codes carried by every [`RouteWeatherError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No forecast candidates were supplied
    NoWeatherData,
    /// The route has no waypoints
    EmptyRoute,
    /// The route duration is zero, negative or not finite
    InvalidDuration,
    /// A latitude/longitude pair is out of range
    InvalidCoordinates,
    /// A timestamp or time offset is not usable
    InvalidTimestamp,
    /// A sampling or resampling interval is not positive
    InvalidInterval,
    /// The weather provider rejected the credentials
    ProviderInvalidKey,
    /// The weather provider is throttling requests
    ProviderRateLimited,
    /// The weather provider could not be reached
    ProviderNetwork,
    /// The weather provider returned no usable data
    ProviderUnavailable,
    /// Configuration failed validation
    ConfigInvalid,
    /// File system access failed
    Io,
    /// JSON input or output could not be processed
    Serialization,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NoWeatherData => "NO_WEATHER_DATA",
            ErrorCode::EmptyRoute => "EMPTY_ROUTE",
            ErrorCode::InvalidDuration => "INVALID_DURATION",
            ErrorCode::InvalidCoordinates => "INVALID_COORDINATES",
            ErrorCode::InvalidTimestamp => "INVALID_TIMESTAMP",
            ErrorCode::InvalidInterval => "INVALID_INTERVAL",
            ErrorCode::ProviderInvalidKey => "PROVIDER_INVALID_KEY",
            ErrorCode::ProviderRateLimited => "PROVIDER_RATE_LIMITED",
            ErrorCode::ProviderNetwork => "PROVIDER_NETWORK",
            ErrorCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::Io => "IO",
            ErrorCode::Serialization => "SERIALIZATION",
        }
    }

    /// Default remediation hints for this code
    #[must_use]
    pub fn default_suggestions(self) -> Vec<String> {
        let hints: &[&str] = match self {
            ErrorCode::NoWeatherData => &[
                "Fetch weather for at least one sampling point before integrating",
                "Check the weather provider logs for failed requests",
            ],
            ErrorCode::EmptyRoute => &[
                "Ensure route calculation includes waypoint generation",
                "Verify the route provider returned a complete geometry",
            ],
            ErrorCode::InvalidDuration => &[
                "Ensure the route has a positive estimated duration",
                "Recalculate the route with a valid travel mode",
            ],
            ErrorCode::InvalidCoordinates => &[
                "Latitude must be within [-90, 90] and longitude within [-180, 180]",
                "Check for swapped latitude/longitude values",
            ],
            ErrorCode::InvalidTimestamp => &[
                "Provide timestamps in RFC 3339 format",
                "Keep route time offsets within a few thousand years of the departure",
            ],
            ErrorCode::InvalidInterval => &["Use a positive, finite interval"],
            ErrorCode::ProviderInvalidKey => &["Check the weather provider API key"],
            ErrorCode::ProviderRateLimited => &[
                "Reduce the fetch batch size",
                "Increase the delay between fetch batches",
            ],
            ErrorCode::ProviderNetwork => &["Check network connectivity and retry later"],
            ErrorCode::ProviderUnavailable => &["Retry later or switch weather provider"],
            ErrorCode::ConfigInvalid => &[
                "Check your config file and ROUTECAST__ environment overrides",
            ],
            ErrorCode::Io => &["Check file paths and permissions"],
            ErrorCode::Serialization => &["Check that the input files contain valid JSON"],
        };
        hints.iter().map(|hint| (*hint).to_string()).collect()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the route-weather engine
#[derive(Error, Debug)]
pub enum RouteWeatherError {
    /// Caller supplied unusable input; never retried
    #[error("Invalid input [{code}]: {message}")]
    Input {
        code: ErrorCode,
        message: String,
        suggestions: Vec<String>,
    },

    /// Failure reported by the external weather provider
    #[error("Weather provider error [{code}]: {message}")]
    Provider { code: ErrorCode, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl RouteWeatherError {
    /// Create an input error carrying the code's default suggestions
    pub fn input<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self::Input {
            code,
            message: message.into(),
            suggestions: code.default_suggestions(),
        }
    }

    /// Create the error raised when a forecast pool is empty
    pub fn no_weather_data<S: Into<String>>(message: S) -> Self {
        Self::input(ErrorCode::NoWeatherData, message)
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self::Provider {
            code,
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            RouteWeatherError::Input { code, .. } | RouteWeatherError::Provider { code, .. } => {
                *code
            }
            RouteWeatherError::Config { .. } => ErrorCode::ConfigInvalid,
            RouteWeatherError::Io { .. } => ErrorCode::Io,
            RouteWeatherError::Serialization { .. } => ErrorCode::Serialization,
        }
    }

    /// Human-actionable hints for resolving this error
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            RouteWeatherError::Input { suggestions, .. } => suggestions.clone(),
            other => other.code().default_suggestions(),
        }
    }

    /// Errors a caller may reasonably retry (provider throttling and network hiccups)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::ProviderRateLimited | ErrorCode::ProviderNetwork
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RouteWeatherError::Input { message, .. } => format!("Invalid input: {message}"),
            RouteWeatherError::Provider { .. } => {
                "Unable to fetch weather data. Please check your provider settings.".to_string()
            }
            RouteWeatherError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            RouteWeatherError::Io { .. } => {
                "File operation failed. Please check file paths and permissions.".to_string()
            }
            RouteWeatherError::Serialization { .. } => {
                "Input data could not be parsed as JSON.".to_string()
            }
        }
    }
}
