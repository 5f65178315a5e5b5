//! CafeSmart application layer: composition root, background weather
//! service, dashboard state and settings.

pub mod app;
pub mod dashboard;
pub mod resolver;
pub mod settings;
pub mod weather_service;

pub use app::CafeApp;
pub use dashboard::{
    DashboardMessage, DashboardState, DashboardView, DrinkRow, DrinksStatus, WeatherStatus,
};
pub use resolver::CityResolver;
pub use settings::Settings;
pub use weather_service::{request_fetch, WeatherServiceMessage};
