//! Reverse geocoding: convert coordinates to a locality name.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use crate::types::Location;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "CafeSmart/0.1.0";

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    #[serde(rename = "state_district")]
    state_district: Option<String>,
    county: Option<String>,
}

impl NominatimAddress {
    /// Locality first, then the sub-administrative area.
    fn locality(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Reverse geocoder returning the bare locality name (no state/country).
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    endpoint: String,
    language: Option<String>,
}

impl Geocoder {
    pub fn new(language: Option<&str>) -> Option<Self> {
        Self::with_endpoint(NOMINATIM_URL, language)
    }

    /// Geocoder against a custom endpoint (self-hosted Nominatim, tests).
    pub fn with_endpoint(endpoint: &str, language: Option<&str>) -> Option<Self> {
        let client = match Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to create geocoding client: {}", e);
                return None;
            }
        };

        Some(Self {
            client,
            endpoint: endpoint.to_string(),
            language: language.map(str::to_string),
        })
    }

    /// Reverse geocode coordinates to a locality name.
    /// Returns `None` on failure, timeout, or when the place has no locality.
    pub async fn locality(&self, location: &Location) -> Option<String> {
        let mut request = self.client.get(&self.endpoint).query(&[
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
            ("zoom", "10".to_string()),
        ]);
        if let Some(lang) = &self.language {
            request = request.query(&[("accept-language", lang.as_str())]);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let place = body.address?.locality()?;
        tracing::info!("Reverse geocoded to: {}", place);
        Some(place)
    }
}
