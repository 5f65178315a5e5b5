//! Settings screen operations.

use std::sync::Arc;

use cafe_core::{AppError, PreferenceStore, UserPreferences};
use cafe_weather::CityDirectory;

#[derive(Clone)]
pub struct Settings {
    preferences: Arc<PreferenceStore>,
    cities: CityDirectory,
}

impl Settings {
    pub fn new(preferences: Arc<PreferenceStore>, cities: CityDirectory) -> Self {
        Self {
            preferences,
            cities,
        }
    }

    pub fn current(&self) -> UserPreferences {
        self.preferences.user_preferences()
    }

    /// Saved city as shown to the user ("Москва" for "Moscow").
    pub fn city_display(&self) -> Option<String> {
        self.preferences
            .city()
            .map(|city| self.cities.display_name(&city))
    }

    /// Save the city in its English form. Names outside the directory are
    /// kept as typed; a blank name clears the preference.
    ///
    /// Returns the stored value.
    pub fn set_city(&self, name: &str) -> Result<Option<String>, AppError> {
        let name = name.trim();
        let stored = self
            .cities
            .canonical(name)
            .map(str::to_string)
            .or_else(|| (!name.is_empty()).then(|| name.to_string()));

        self.preferences.set_city(stored.as_deref().unwrap_or(""))?;
        tracing::info!("City preference set to {:?}", stored);
        Ok(stored)
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), AppError> {
        Ok(self.preferences.set_notifications_enabled(enabled)?)
    }

    pub fn set_dark_theme_enabled(&self, enabled: bool) -> Result<(), AppError> {
        Ok(self.preferences.set_dark_theme_enabled(enabled)?)
    }

    /// Flip the notifications switch, returning the new value.
    pub fn toggle_notifications(&self) -> Result<bool, AppError> {
        let enabled = !self.current().notifications_enabled;
        self.set_notifications_enabled(enabled)?;
        Ok(enabled)
    }

    pub fn toggle_dark_theme(&self) -> Result<bool, AppError> {
        let enabled = !self.current().dark_theme_enabled;
        self.set_dark_theme_enabled(enabled)?;
        Ok(enabled)
    }
}
