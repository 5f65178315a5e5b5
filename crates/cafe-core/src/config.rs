use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Prefix for environment overrides, e.g. `CAFESMART__WEATHER__API_KEY`.
const ENV_PREFIX: &str = "CAFESMART";
const APP_DIR_NAME: &str = "cafesmart";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the config file, preferences and the drinks database
    pub config_dir: PathBuf,

    /// Weather API settings
    pub weather: WeatherConfig,

    /// Device location (stands in for the platform location service)
    pub location: LocationConfig,

    /// Fallbacks and policy thresholds
    pub defaults: DefaultsConfig,

    /// On-disk storage names
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key (`appid` query parameter)
    pub api_key: String,

    /// Base URL of the weather API, without the `/data/2.5/weather` path
    pub base_url: String,

    /// Units passed to the API; the policy expects Celsius
    pub units: String,

    /// Optional language for condition descriptions, e.g. "ru"
    pub lang: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries on transport failures and 5xx; 0 disables retrying
    pub max_retries: u32,

    pub initial_retry_delay_ms: u64,

    pub max_retry_delay_ms: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org".to_string(),
            units: "metric".to_string(),
            lang: None,
            timeout_secs: 10,
            max_retries: 2,
            initial_retry_delay_ms: 200,
            max_retry_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Whether the user allowed location lookups
    pub permission_granted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// City used when neither location nor preferences yield one
    pub city: String,

    /// Below this temperature hot drinks are listed first
    pub cold_threshold_celsius: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            city: "Moscow".to_string(),
            cold_threshold_celsius: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file name inside `config_dir`
    pub database_file: String,

    /// Preference namespace; stored as `<namespace>.json` inside `config_dir`
    pub preferences_namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: "drinks.db".to_string(),
            preferences_namespace: "settings".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            defaults: DefaultsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Default configuration rooted at `dir` instead of the user config directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the user config directory, creating a default
    /// file if it doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_or_create(&Self::config_path()?)
    }

    /// Write a default file at `path` when there is none, then load it with
    /// environment overrides applied.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = match path.parent() {
                Some(parent) => Self::in_dir(parent),
                None => Self::default(),
            };
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
        }

        Self::load_from(path)
    }

    /// Load configuration from `path`, layering `CAFESMART__*` environment
    /// variables on top. A missing file yields defaults plus overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read config file")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Failed to parse config file")?;

        if config.config_dir.as_os_str().is_empty() {
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
        }

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.api_key.trim().is_empty() {
            result.add_warning(
                "weather.api_key",
                "Weather API key not configured - weather will be unavailable",
            );
        }

        if self.weather.units != "metric" {
            result.add_warning(
                "weather.units",
                "Drink recommendations assume Celsius (units = \"metric\")",
            );
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }

        if self.weather.max_retries > 10 {
            result.add_warning("weather.max_retries", "More than 10 retries per refresh");
        }

        if self.weather.initial_retry_delay_ms > self.weather.max_retry_delay_ms {
            result.add_error(
                "weather.initial_retry_delay_ms",
                "Initial retry delay exceeds the maximum delay",
            );
        }

        if self.defaults.city.trim().is_empty() {
            result.add_error("defaults.city", "Default city cannot be empty");
        }

        if !self.defaults.cold_threshold_celsius.is_finite() {
            result.add_error(
                "defaults.cold_threshold_celsius",
                "Threshold must be a finite number",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within -90..90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.longitude", "Longitude must be within -180..180");
                }
            }
            (None, None) => {}
            _ => result.add_warning(
                "location",
                "Only one coordinate configured - location will be ignored",
            ),
        }

        if self.storage.database_file.trim().is_empty() {
            result.add_error("storage.database_file", "Database file name cannot be empty");
        }

        if self.storage.preferences_namespace.trim().is_empty() {
            result.add_error(
                "storage.preferences_namespace",
                "Preference namespace cannot be empty",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Path of the SQLite drinks database
    pub fn database_path(&self) -> PathBuf {
        self.config_dir.join(&self.storage.database_file)
    }

    /// Path of the preference file for the configured namespace
    pub fn preferences_path(&self) -> PathBuf {
        self.config_dir
            .join(format!("{}.json", self.storage.preferences_namespace))
    }

    /// Save configuration to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }
}
