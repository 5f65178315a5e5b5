//! Integration tests for WeatherProvider and Geocoder using wiremock.

#![allow(clippy::unwrap_used, clippy::panic)]

use cafe_core::WeatherConfig;
use cafe_weather::{Geocoder, Location, RetryConfig, WeatherError, WeatherProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server_uri: &str) -> WeatherProvider {
    let config = WeatherConfig {
        api_key: "test-key".to_string(),
        base_url: server_uri.to_string(),
        ..WeatherConfig::default()
    };
    WeatherProvider::new(&config)
        .unwrap()
        .with_retry_config(RetryConfig::new(2, 1, 5))
}

#[tokio::test]
async fn test_fetch_moscow_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Moscow"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Moscow",
            "main": { "temp": 22.5 },
            "weather": [ { "description": "clear sky", "icon": "01d" } ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = provider_for(&mock_server.uri()).fetch("Moscow").await.unwrap();

    assert_eq!(snapshot.city, "Moscow");
    assert_eq!(snapshot.temperature_celsius, 22.5);
    assert_eq!(snapshot.condition_description, "clear sky");
    assert_eq!(snapshot.condition_icon_code, "01d");
    assert_eq!(snapshot.temperature_label(), "22.5°C");
}

#[tokio::test]
async fn test_fetch_sends_lang_when_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lang", "ru"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": { "temp": 5.0 },
            "weather": [ { "description": "пасмурно", "icon": "04d" } ]
        })))
        .mount(&mock_server)
        .await;

    let config = WeatherConfig {
        api_key: "test-key".to_string(),
        base_url: mock_server.uri(),
        lang: Some("ru".to_string()),
        ..WeatherConfig::default()
    };
    let snapshot = WeatherProvider::new(&config)
        .unwrap()
        .fetch("Krasnoyarsk")
        .await
        .unwrap();

    assert_eq!(snapshot.temperature_celsius, 5.0);
    assert_eq!(snapshot.condition_description, "пасмурно");
}

#[tokio::test]
async fn test_missing_temperature_is_malformed_not_zero() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Moscow",
            "main": {},
            "weather": [ { "description": "clear sky" } ]
        })))
        .mount(&mock_server)
        .await;

    let result = provider_for(&mock_server.uri()).fetch("Moscow").await;
    assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let result = provider_for(&mock_server.uri()).fetch("Moscow").await;
    assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_not_found_is_rejected_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = provider_for(&mock_server.uri()).fetch("Atlantis").await;

    match result {
        Err(WeatherError::RemoteRejected { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("city not found"));
        }
        other => panic!("expected RemoteRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": { "temp": 12.0 },
            "weather": []
        })))
        .mount(&mock_server)
        .await;

    let snapshot = provider_for(&mock_server.uri()).fetch("Kazan").await.unwrap();
    assert_eq!(snapshot.temperature_celsius, 12.0);
    assert_eq!(snapshot.condition_description, "");
}

#[tokio::test]
async fn test_server_error_surfaces_status_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = provider_for(&mock_server.uri()).fetch("Kazan").await;
    assert_eq!(result.unwrap_err().status(), Some(500));
}

#[tokio::test]
async fn test_unreachable_host() {
    // Nothing listens on the discard port
    let provider = provider_for("http://127.0.0.1:9").with_retry_config(RetryConfig::disabled());

    let result = provider.fetch("Moscow").await;
    let err = result.unwrap_err();
    assert!(err.is_unreachable(), "expected unreachable, got {:?}", err);
}

#[tokio::test]
async fn test_geocoder_returns_locality() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("accept-language", "ru"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "display_name": "Казань, Татарстан, Россия",
            "address": { "city": "Казань", "state": "Татарстан", "country": "Россия" }
        })))
        .mount(&mock_server)
        .await;

    let geocoder =
        Geocoder::with_endpoint(&format!("{}/reverse", mock_server.uri()), Some("ru")).unwrap();
    let name = geocoder
        .locality(&Location {
            latitude: 55.79,
            longitude: 49.12,
        })
        .await;

    assert_eq!(name.as_deref(), Some("Казань"));
}

#[tokio::test]
async fn test_geocoder_failure_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let geocoder = Geocoder::with_endpoint(&format!("{}/reverse", mock_server.uri()), None).unwrap();
    let name = geocoder
        .locality(&Location {
            latitude: 0.0,
            longitude: 0.0,
        })
        .await;

    assert_eq!(name, None);
}
