//! Centralized error types for CafeSmart.
//!
//! Every failure that can reach the dashboard maps to one of these variants,
//! and each variant carries a short status string for display in place of
//! the data it would have populated.

use thiserror::Error;

use crate::preferences::PreferenceError;

/// Top-level application error type.
///
/// Use `user_message()` to get the status string shown to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferenceError),

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("No match: {0}")]
    NoMatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Preferences(_) => "Could not save your settings. Please try again.",
            AppError::PermissionDenied => {
                "Location permission denied. Using the saved city instead."
            }
            AppError::NoMatch(_) => "Could not determine the city from your location.",
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Whether this error came from the network layer.
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network(_))
    }
}

/// Network-related errors (HTTP, connectivity, payload shape).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Remote rejected request: {status} - {message}")]
    RemoteRejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Unreachable(_) | NetworkError::Timeout => {
                "Connection error. Check your internet connection."
            }
            NetworkError::RemoteRejected { status, .. } if *status == 404 => {
                "City not found by the weather service."
            }
            NetworkError::RemoteRejected { status, .. } if *status == 401 => {
                "Weather API key is invalid. Check settings."
            }
            NetworkError::RemoteRejected { .. } => "Error retrieving weather data.",
            NetworkError::MalformedResponse(_) => "Weather data is incomplete. Please try again.",
        }
    }
}

/// Database/storage errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::Unavailable(_) => "Drink list is unavailable. Try restarting the app.",
            DatabaseError::QueryFailed(_) => "Could not load the drink list. Please try again.",
            DatabaseError::Corruption(_) => {
                "Local data may be corrupted. Consider resetting app data."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::DatabaseCorrupt
                    || err.code == rusqlite::ErrorCode::NotADatabase =>
            {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::ReadOnly =>
            {
                DatabaseError::Unavailable(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}
