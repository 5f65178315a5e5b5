use std::sync::Arc;

use cafe_core::{AppError, Config, PreferenceStore};
use cafe_drinks::{DrinkClient, ThresholdPolicy};
use cafe_weather::{CityDirectory, ConfiguredLocation, Geocoder, LocationProvider, WeatherProvider};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::dashboard::{DashboardMessage, DashboardState};
use crate::resolver::CityResolver;
use crate::settings::Settings;
use crate::weather_service::{self, WeatherServiceMessage};

/// Application root: owns every service and the dashboard state.
pub struct CafeApp {
    config: Arc<Config>,
    preferences: Arc<PreferenceStore>,
    provider: Arc<WeatherProvider>,
    drinks: DrinkClient,
    location: Arc<dyn LocationProvider>,
    geocoder: Option<Geocoder>,
    cities: CityDirectory,
    policy: ThresholdPolicy,
    dashboard: DashboardState,
    tx: UnboundedSender<WeatherServiceMessage>,
    rx: UnboundedReceiver<WeatherServiceMessage>,
}

impl CafeApp {
    /// Build the application from `config`, opening the preference file and
    /// drink database under `config.config_dir`.
    pub fn new(config: Config) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.config_dir)?;

        let preferences = Arc::new(PreferenceStore::open(config.preferences_path())?);
        let drinks = DrinkClient::open(config.database_path())?;
        let provider = Arc::new(WeatherProvider::new(&config.weather)?);
        let location: Arc<dyn LocationProvider> =
            Arc::new(ConfiguredLocation::from_config(&config.location));
        let geocoder = Geocoder::new(config.weather.lang.as_deref());
        let policy = ThresholdPolicy::from(&config.defaults);
        let (tx, rx) = mpsc::unbounded_channel();

        tracing::info!("CafeApp created (data in {})", config.config_dir.display());

        Ok(Self {
            config: Arc::new(config),
            preferences,
            provider,
            drinks,
            location,
            geocoder,
            cities: CityDirectory,
            policy,
            dashboard: DashboardState::new(),
            tx,
            rx,
        })
    }

    pub fn with_location_provider(mut self, location: Arc<dyn LocationProvider>) -> Self {
        self.location = location;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Option<Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    /// Seed the catalogue on first run.
    pub async fn start(&self) -> Result<(), AppError> {
        self.drinks.ensure_seeded().await?;
        tracing::info!("Drink catalogue ready");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dashboard(&self) -> &DashboardState {
        &self.dashboard
    }

    pub fn drinks(&self) -> &DrinkClient {
        &self.drinks
    }

    pub fn settings(&self) -> Settings {
        Settings::new(self.preferences.clone(), self.cities)
    }

    fn resolver(&self) -> CityResolver {
        CityResolver::new(
            self.location.clone(),
            self.geocoder.clone(),
            self.cities,
            self.preferences.clone(),
            &self.config.defaults.city,
        )
    }

    /// Start a background refresh and return its request id. Results are
    /// applied by `wait_for`.
    pub fn request_refresh(&mut self) -> u64 {
        let request_id = self.dashboard.begin_request();
        weather_service::request_fetch(
            &self.tx,
            request_id,
            self.resolver(),
            self.provider.clone(),
        );
        request_id
    }

    /// Apply incoming completions until `request_id` has been handled.
    pub async fn wait_for(&mut self, request_id: u64) {
        while let Some(message) = self.rx.recv().await {
            let id = message.request_id();
            self.handle(message).await;
            if id >= request_id {
                break;
            }
        }
    }

    /// Re-read the city, fetch weather and reload drinks.
    pub async fn refresh(&mut self) -> &DashboardState {
        let request_id = self.request_refresh();
        self.wait_for(request_id).await;
        &self.dashboard
    }

    /// Called when the app comes back to the foreground or settings change.
    pub async fn resume(&mut self) -> &DashboardState {
        tracing::debug!("Resumed, refreshing");
        self.refresh().await
    }

    /// Apply one weather completion and, unless it was stale, load drinks in
    /// the order its reading calls for. A failed fetch still loads drinks in
    /// the default order.
    async fn handle(&mut self, message: WeatherServiceMessage) -> bool {
        let request_id = message.request_id();
        let (temperature, condition) = match &message {
            WeatherServiceMessage::FetchDone {
                result: Ok(snapshot),
                ..
            } => (
                Some(snapshot.temperature_celsius),
                Some(snapshot.condition_description.clone()).filter(|c| !c.is_empty()),
            ),
            WeatherServiceMessage::FetchDone { result: Err(_), .. } => (None, None),
        };

        if !self.dashboard.apply(DashboardMessage::Weather(message)) {
            return false;
        }

        let result = self
            .drinks
            .recommend(self.policy, temperature, condition)
            .await
            .map_err(AppError::from);

        self.dashboard
            .apply(DashboardMessage::DrinksLoaded { request_id, result })
    }

    /// Restore the default catalogue.
    pub async fn reseed_catalogue(&self) -> Result<usize, AppError> {
        Ok(self.drinks.reseed().await?)
    }

    pub fn shutdown(&self) {
        tracing::info!("Shutting down CafeSmart");
    }
}
