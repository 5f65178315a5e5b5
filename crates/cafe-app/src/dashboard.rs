//! Dashboard state.
//!
//! Everything the main screen shows lives in `DashboardState`. Background
//! work reports back through `DashboardMessage`s passed to `apply`, and
//! `render` turns the state into plain strings. Only completions for the
//! most recently issued request id are applied; older ones are dropped.

use std::fmt;

use cafe_core::AppError;
use cafe_drinks::{Recommendation, SortOrder};
use cafe_weather::{ResolvedCity, WeatherSnapshot};
use serde::Serialize;

use crate::weather_service::WeatherServiceMessage;

/// Shown in place of the weather when no city could be determined.
pub const NO_CITY_STATUS: &str = "City not set. Weather not available.";

/// Weather half of the dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WeatherStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    Loaded(WeatherSnapshot),
    /// No city from location, preference or defaults
    NoCity,
    /// Fetch failed; holds the user-facing message
    Failed(String),
}

/// Drinks half of the dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrinksStatus {
    #[default]
    Idle,
    Loaded(Recommendation),
    Failed(String),
}

/// Completions delivered to the dashboard.
#[derive(Debug)]
pub enum DashboardMessage {
    Weather(WeatherServiceMessage),
    DrinksLoaded {
        request_id: u64,
        result: Result<Recommendation, AppError>,
    },
}

impl DashboardMessage {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Weather(msg) => msg.request_id(),
            Self::DrinksLoaded { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    latest_request: u64,
    loading: bool,
    city: Option<ResolvedCity>,
    weather: WeatherStatus,
    drinks: DrinksStatus,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request id. Anything still in flight becomes stale.
    pub fn begin_request(&mut self) -> u64 {
        self.latest_request += 1;
        self.loading = true;
        self.latest_request
    }

    pub fn latest_request(&self) -> u64 {
        self.latest_request
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn city(&self) -> Option<&ResolvedCity> {
        self.city.as_ref()
    }

    pub fn weather(&self) -> &WeatherStatus {
        &self.weather
    }

    pub fn drinks(&self) -> &DrinksStatus {
        &self.drinks
    }

    /// Apply a completion. Returns false if it was stale and ignored.
    pub fn apply(&mut self, message: DashboardMessage) -> bool {
        let request_id = message.request_id();
        if request_id != self.latest_request {
            tracing::debug!(
                "Discarding stale completion {} (latest {})",
                request_id,
                self.latest_request
            );
            return false;
        }

        match message {
            DashboardMessage::Weather(WeatherServiceMessage::FetchDone { city, result, .. }) => {
                self.weather = match (&city, result) {
                    (None, _) => WeatherStatus::NoCity,
                    (Some(_), Ok(snapshot)) => WeatherStatus::Loaded(snapshot),
                    (Some(c), Err(e)) => {
                        tracing::warn!("Weather for {} failed: {}", c.query, e);
                        WeatherStatus::Failed(AppError::from(e).user_message().to_string())
                    }
                };
                self.city = city;
            }
            DashboardMessage::DrinksLoaded { result, .. } => {
                self.drinks = match result {
                    Ok(recommendation) => DrinksStatus::Loaded(recommendation),
                    Err(e) => {
                        tracing::error!("Drink list failed: {}", e);
                        DrinksStatus::Failed(e.user_message().to_string())
                    }
                };
                self.loading = false;
            }
        }
        true
    }

    pub fn render(&self) -> DashboardView {
        let city = self
            .city
            .as_ref()
            .map(|c| c.display.clone())
            .unwrap_or_else(|| "-".to_string());

        let (weather, mut status) = match &self.weather {
            WeatherStatus::Loaded(snapshot) => (snapshot.summary(), None),
            WeatherStatus::NoCity => ("-".to_string(), Some(NO_CITY_STATUS.to_string())),
            WeatherStatus::Failed(message) => ("-".to_string(), Some(message.clone())),
            WeatherStatus::Idle => ("-".to_string(), None),
        };

        let (order, advice, drinks) = match &self.drinks {
            DrinksStatus::Loaded(rec) => (
                Some(rec.order),
                Some(rec.advice.text.clone()),
                rec.drinks
                    .iter()
                    .map(|d| DrinkRow {
                        name: d.name.clone(),
                        level: d.level.label().to_string(),
                        featured: rec.advice.featured.contains(&d.name),
                    })
                    .collect(),
            ),
            DrinksStatus::Failed(message) => {
                // Weather problems take precedence in the single status line
                status.get_or_insert_with(|| message.clone());
                (None, None, Vec::new())
            }
            DrinksStatus::Idle => (None, None, Vec::new()),
        };

        DashboardView {
            city,
            weather,
            status,
            advice,
            order,
            drinks,
            loading: self.loading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkRow {
    pub name: String,
    pub level: String,
    pub featured: bool,
}

/// Rendered dashboard, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub city: String,
    /// "22.5°C, clear sky" or "-"
    pub weather: String,
    pub status: Option<String>,
    pub advice: Option<String>,
    pub order: Option<SortOrder>,
    pub drinks: Vec<DrinkRow>,
    pub loading: bool,
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "City:    {}", self.city)?;
        writeln!(f, "Weather: {}", self.weather)?;
        if let Some(status) = &self.status {
            writeln!(f, "Status:  {}", status)?;
        }
        if let Some(advice) = &self.advice {
            writeln!(f, "Advice:  {}", advice)?;
        }
        writeln!(f)?;
        for drink in &self.drinks {
            let marker = if drink.featured { "*" } else { " " };
            writeln!(f, " {} {:<28} {}", marker, drink.name, drink.level)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use cafe_core::DatabaseError;
    use cafe_drinks::{Advice, Drink, TemperatureLevel};
    use cafe_weather::{CitySource, WeatherError};
    use chrono::Utc;

    fn moscow() -> ResolvedCity {
        ResolvedCity {
            query: "Moscow".to_string(),
            display: "Москва".to_string(),
            source: CitySource::Saved,
        }
    }

    fn snapshot(temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            city: "Moscow".to_string(),
            reported_name: Some("Moscow".to_string()),
            temperature_celsius: temp,
            condition_description: "clear sky".to_string(),
            condition_icon_code: "01d".to_string(),
            fetched_at: Utc::now(),
        }
    }

    fn weather_done(
        request_id: u64,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> DashboardMessage {
        DashboardMessage::Weather(WeatherServiceMessage::FetchDone {
            request_id,
            city: Some(moscow()),
            result,
        })
    }

    fn recommendation() -> Recommendation {
        Recommendation {
            order: SortOrder::ColdFirst,
            drinks: vec![
                Drink {
                    id: 1,
                    name: "Lemonade".to_string(),
                    level: TemperatureLevel::Cold,
                },
                Drink {
                    id: 2,
                    name: "Latte".to_string(),
                    level: TemperatureLevel::Hot,
                },
            ],
            advice: Advice::fallback(SortOrder::ColdFirst),
        }
    }

    #[test]
    fn test_request_ids_increase() {
        let mut state = DashboardState::new();
        assert_eq!(state.begin_request(), 1);
        assert_eq!(state.begin_request(), 2);
        assert!(state.is_loading());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut state = DashboardState::new();
        let first = state.begin_request();
        let second = state.begin_request();

        assert!(state.apply(weather_done(second, Ok(snapshot(5.0)))));
        assert!(!state.apply(weather_done(first, Ok(snapshot(30.0)))));

        match state.weather() {
            WeatherStatus::Loaded(s) => assert_eq!(s.temperature_celsius, 5.0),
            other => panic!("unexpected weather {:?}", other),
        }
    }

    #[test]
    fn test_late_drinks_from_old_request_are_discarded() {
        let mut state = DashboardState::new();
        let first = state.begin_request();
        state.begin_request();

        let applied = state.apply(DashboardMessage::DrinksLoaded {
            request_id: first,
            result: Ok(recommendation()),
        });
        assert!(!applied);
        assert_eq!(state.drinks(), &DrinksStatus::Idle);
        assert!(state.is_loading());
    }

    #[test]
    fn test_render_loaded() {
        let mut state = DashboardState::new();
        let id = state.begin_request();
        state.apply(weather_done(id, Ok(snapshot(22.5))));
        state.apply(DashboardMessage::DrinksLoaded {
            request_id: id,
            result: Ok(recommendation()),
        });

        let view = state.render();
        assert_eq!(view.city, "Москва");
        assert_eq!(view.weather, "22.5°C, clear sky");
        assert_eq!(view.status, None);
        assert_eq!(view.order, Some(SortOrder::ColdFirst));
        assert_eq!(view.drinks[0].name, "Lemonade");
        assert_eq!(view.drinks[0].level, "cold");
        assert!(view.drinks[0].featured);
        assert!(!view.loading);

        let text = view.to_string();
        assert!(text.contains("22.5°C, clear sky"));
        assert!(text.contains("Latte"));
    }

    #[test]
    fn test_render_connection_error_keeps_drinks() {
        let mut state = DashboardState::new();
        let id = state.begin_request();
        state.apply(weather_done(id, Err(WeatherError::Unreachable("refused".into()))));
        state.apply(DashboardMessage::DrinksLoaded {
            request_id: id,
            result: Ok(recommendation()),
        });

        let view = state.render();
        assert_eq!(view.weather, "-");
        assert_eq!(
            view.status.as_deref(),
            Some("Connection error. Check your internet connection.")
        );
        assert_eq!(view.drinks.len(), 2);
    }

    #[test]
    fn test_render_remote_error_is_data_error() {
        let mut state = DashboardState::new();
        let id = state.begin_request();
        state.apply(weather_done(
            id,
            Err(WeatherError::RemoteRejected {
                status: 500,
                message: "boom".into(),
            }),
        ));

        assert_eq!(
            state.render().status.as_deref(),
            Some("Error retrieving weather data.")
        );
    }

    #[test]
    fn test_render_no_city() {
        let mut state = DashboardState::new();
        let id = state.begin_request();
        state.apply(DashboardMessage::Weather(WeatherServiceMessage::FetchDone {
            request_id: id,
            city: None,
            result: Err(WeatherError::InvalidCity),
        }));

        let view = state.render();
        assert_eq!(view.city, "-");
        assert_eq!(view.status.as_deref(), Some(NO_CITY_STATUS));
    }

    #[test]
    fn test_storage_failure_is_not_an_empty_list() {
        let mut state = DashboardState::new();
        let id = state.begin_request();
        state.apply(weather_done(id, Ok(snapshot(12.0))));
        state.apply(DashboardMessage::DrinksLoaded {
            request_id: id,
            result: Err(DatabaseError::Unavailable("locked".into()).into()),
        });

        assert!(matches!(state.drinks(), DrinksStatus::Failed(_)));
        let view = state.render();
        assert!(view.drinks.is_empty());
        assert_eq!(
            view.status.as_deref(),
            Some("Drink list is unavailable. Try restarting the app.")
        );
    }
}
