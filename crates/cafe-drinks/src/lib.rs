//! Drink catalogue and recommendation policy for CafeSmart

pub mod client;
pub mod drink;
pub mod policy;
pub mod rules;
pub mod seed;
pub mod store;

pub use client::DrinkClient;
pub use drink::{Drink, NewDrink, TemperatureLevel, UnknownCategory};
pub use policy::{Advice, Recommendation, SortOrder, ThresholdPolicy, DEFAULT_COLD_THRESHOLD};
pub use rules::{NewRule, RecommendationRule};
pub use seed::{default_catalogue, default_rules};
pub use store::{DrinkRepository, DrinkStoreError, DrinkStoreResult, SqliteDrinkStore};
