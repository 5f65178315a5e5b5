//! Weather service for CafeSmart
//!
//! Current weather from OpenWeatherMap, reverse geocoding, and the city
//! directory used to pick what to ask for.

pub mod city;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod retry;
pub mod types;

pub use city::{CityDirectory, CitySource, ResolvedCity};
pub use geocode::Geocoder;
pub use location::{ConfiguredLocation, LocationProvider};
pub use provider::WeatherProvider;
pub use retry::RetryConfig;
pub use types::*;
