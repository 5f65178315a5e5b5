use cafe_core::{AppError, ConfigError, NetworkError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current-weather payload as returned by `/data/2.5/weather`.
///
/// Every field is optional here; required-ness is decided when converting
/// into a [`WeatherSnapshot`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentWeatherResponse {
    pub name: Option<String>,
    pub main: Option<MainReadings>,
    pub weather: Option<Vec<ConditionEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MainReadings {
    pub temp: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionEntry {
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// One fetched weather observation. Replaced on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// City as sent in the `q` parameter
    pub city: String,
    /// City name echoed back by the API, if any
    pub reported_name: Option<String>,
    pub temperature_celsius: f64,
    pub condition_description: String,
    pub condition_icon_code: String,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Build a snapshot from a decoded payload.
    ///
    /// A missing or non-finite `main.temp` is a malformed response; it is
    /// never read as 0°C.
    pub fn from_response(
        city: &str,
        response: CurrentWeatherResponse,
    ) -> Result<Self, WeatherError> {
        let temperature = response
            .main
            .and_then(|m| m.temp)
            .filter(|t| t.is_finite())
            .ok_or_else(|| WeatherError::MalformedResponse("missing main.temp".to_string()))?;

        let condition = response
            .weather
            .and_then(|entries| entries.into_iter().next())
            .unwrap_or_default();

        Ok(Self {
            city: city.to_string(),
            reported_name: response.name.filter(|n| !n.trim().is_empty()),
            temperature_celsius: temperature,
            condition_description: condition.description.unwrap_or_default(),
            condition_icon_code: condition.icon.unwrap_or_default(),
            fetched_at: Utc::now(),
        })
    }

    /// Temperature with one decimal, e.g. "22.5°C".
    pub fn temperature_label(&self) -> String {
        format!("{:.1}°C", self.temperature_celsius)
    }

    /// "22.5°C, clear sky", with `-` standing in for a missing description.
    pub fn summary(&self) -> String {
        let description = if self.condition_description.trim().is_empty() {
            "-"
        } else {
            self.condition_description.as_str()
        };
        format!("{}, {}", self.temperature_label(), description)
    }
}

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Location service errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
}

/// Weather client errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("City name is empty")]
    InvalidCity,
    #[error("Weather service unreachable: {0}")]
    Unreachable(String),
    #[error("Weather request timed out")]
    Timeout,
    #[error("Weather service rejected request: HTTP {status}")]
    RemoteRejected { status: u16, message: String },
    #[error("Malformed weather response: {0}")]
    MalformedResponse(String),
    #[error("Weather client setup failed: {0}")]
    Client(String),
}

impl WeatherError {
    /// True for transport-level failures (no HTTP response at all).
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Unreachable(msg) => NetworkError::Unreachable(msg).into(),
            WeatherError::Timeout => NetworkError::Timeout.into(),
            WeatherError::RemoteRejected { status, message } => {
                NetworkError::RemoteRejected { status, message }.into()
            }
            WeatherError::MalformedResponse(msg) => NetworkError::MalformedResponse(msg).into(),
            WeatherError::InvalidCity => AppError::NoMatch("empty city".to_string()),
            WeatherError::Client(msg) => ConfigError::Invalid(msg).into(),
        }
    }
}

impl From<LocationError> for AppError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::PermissionDenied => AppError::PermissionDenied,
            LocationError::ServiceUnavailable => {
                AppError::NoMatch("location unavailable".to_string())
            }
        }
    }
}
