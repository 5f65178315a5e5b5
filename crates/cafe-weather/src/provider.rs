use crate::retry::{with_retry, RetryConfig};
use crate::types::{CurrentWeatherResponse, WeatherError, WeatherSnapshot};
use cafe_core::WeatherConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const CURRENT_WEATHER_PATH: &str = "data/2.5/weather";

/// Client for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    endpoint: Url,
    api_key: String,
    units: String,
    lang: Option<String>,
    retry: RetryConfig,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::Client(e.to_string()))?;

        let endpoint = Self::endpoint_url(&config.base_url)?;

        Ok(Self {
            client: Arc::new(client),
            endpoint,
            api_key: config.api_key.clone(),
            units: config.units.clone(),
            lang: config.lang.clone().filter(|l| !l.trim().is_empty()),
            retry: RetryConfig::from(config),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint_url(base_url: &str) -> Result<Url, WeatherError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| WeatherError::Client(format!("invalid base URL {}: {}", base_url, e)))?;

        // Url::join drops the last segment unless the base ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join(CURRENT_WEATHER_PATH)
            .map_err(|e| WeatherError::Client(e.to_string()))
    }

    /// Request URL for `city`, including the API key.
    pub fn request_url(&self, city: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", city)
                .append_pair("appid", &self.api_key)
                .append_pair("units", &self.units);
            if let Some(lang) = &self.lang {
                query.append_pair("lang", lang);
            }
        }
        url
    }

    /// Fetch current weather for `city`.
    ///
    /// One logical request; transport failures and 5xx are retried according
    /// to the configured [`RetryConfig`].
    pub async fn fetch(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::InvalidCity);
        }

        let url = self.request_url(city);
        tracing::debug!("Fetching weather for {}", city);

        let response = with_retry(&self.retry, || self.client.get(url.clone()).send())
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API returned {} for {}", status, city);
            return Err(WeatherError::RemoteRejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(Self::transport_error)?;
        let payload: CurrentWeatherResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;

        let snapshot = WeatherSnapshot::from_response(city, payload)?;
        tracing::info!(
            "Weather for {}: {} ({})",
            city,
            snapshot.temperature_label(),
            snapshot.condition_description
        );
        Ok(snapshot)
    }

    fn transport_error(err: reqwest::Error) -> WeatherError {
        if err.is_timeout() {
            WeatherError::Timeout
        } else {
            WeatherError::Unreachable(err.to_string())
        }
    }
}
