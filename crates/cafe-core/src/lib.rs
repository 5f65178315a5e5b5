pub mod config;
pub mod error;
pub mod preferences;

pub use config::{
    Config, DefaultsConfig, LocationConfig, StorageConfig, ValidationResult, WeatherConfig,
};
pub use error::{AppError, ConfigError, DatabaseError, NetworkError, RusqliteErrorExt};
pub use preferences::{PreferenceError, PreferenceStore, UserPreferences};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("CafeSmart core initialized");
    Ok(())
}
