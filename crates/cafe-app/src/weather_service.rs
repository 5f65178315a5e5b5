//! Weather backend: city resolution and fetch run on the tokio runtime,
//! results come back over an mpsc channel tagged with their request id.

use std::sync::Arc;

use cafe_weather::{ResolvedCity, WeatherError, WeatherProvider, WeatherSnapshot};
use tokio::sync::mpsc::UnboundedSender;

use crate::resolver::CityResolver;

/// Messages sent from background fetches back to the dashboard.
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// `city` is `None` when no city could be determined; no request was made.
    FetchDone {
        request_id: u64,
        city: Option<ResolvedCity>,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

impl WeatherServiceMessage {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::FetchDone { request_id, .. } => *request_id,
        }
    }
}

/// Resolve the city and fetch its weather in the background.
/// Sends `FetchDone` on `tx` when complete.
pub fn request_fetch(
    tx: &UnboundedSender<WeatherServiceMessage>,
    request_id: u64,
    resolver: CityResolver,
    provider: Arc<WeatherProvider>,
) {
    let tx = tx.clone();
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(e) => {
            let _ = tx.send(WeatherServiceMessage::FetchDone {
                request_id,
                city: None,
                result: Err(WeatherError::Client(format!("no async runtime: {}", e))),
            });
            return;
        }
    };

    runtime.spawn(async move {
        let city = resolver.resolve().await;

        let result = match &city {
            Some(c) => {
                tracing::info!("Fetching weather for {} (request {})", c.query, request_id);
                provider.fetch(&c.query).await
            }
            None => Err(WeatherError::InvalidCity),
        };

        if tx
            .send(WeatherServiceMessage::FetchDone {
                request_id,
                city,
                result,
            })
            .is_err()
        {
            tracing::debug!("Dashboard gone, dropping weather result {}", request_id);
        }
    });
}
