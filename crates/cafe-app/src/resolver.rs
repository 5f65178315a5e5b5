//! Picks the city to ask the weather service about.

use std::sync::Arc;

use cafe_core::PreferenceStore;
use cafe_weather::{CityDirectory, CitySource, Geocoder, LocationProvider, ResolvedCity};

/// Saved preference first. Only without one is the device located and
/// geocoded, falling back to the configured default.
///
/// A city found through location is written back to preferences so the
/// next start without location still lands on it.
#[derive(Clone)]
pub struct CityResolver {
    location: Arc<dyn LocationProvider>,
    geocoder: Option<Geocoder>,
    cities: CityDirectory,
    preferences: Arc<PreferenceStore>,
    default_city: String,
}

impl CityResolver {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        geocoder: Option<Geocoder>,
        cities: CityDirectory,
        preferences: Arc<PreferenceStore>,
        default_city: &str,
    ) -> Self {
        Self {
            location,
            geocoder,
            cities,
            preferences,
            default_city: default_city.to_string(),
        }
    }

    /// `None` only when every source is empty.
    pub async fn resolve(&self) -> Option<ResolvedCity> {
        if let Some(saved) = self.preferences.city() {
            let resolved =
                self.cities
                    .resolve(None, Some(saved.as_str()), &self.default_city);
            tracing::debug!("Resolved saved city {:?}", resolved);
            return Some(resolved);
        }

        let geocoded = self.locate().await;
        let resolved = self
            .cities
            .resolve(geocoded.as_deref(), None, &self.default_city);

        if resolved.query.trim().is_empty() {
            tracing::warn!("No city from preferences, location or defaults");
            return None;
        }

        if matches!(resolved.source, CitySource::Mapped | CitySource::Geocoded) {
            match self.preferences.set_city(&resolved.query) {
                Ok(()) => tracing::info!("Saved located city {}", resolved.query),
                Err(e) => tracing::warn!("Failed to save located city: {}", e),
            }
        }

        tracing::debug!("Resolved city {:?}", resolved);
        Some(resolved)
    }

    async fn locate(&self) -> Option<String> {
        match self.location.current_location() {
            Ok(location) => match &self.geocoder {
                Some(geocoder) => geocoder.locality(&location).await,
                None => None,
            },
            Err(e) => {
                tracing::info!("No device location ({}), using default city", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cafe_core::LocationConfig;
    use cafe_weather::{ConfiguredLocation, Location, LocationError};

    /// Grants location and counts how often it is asked.
    #[derive(Default)]
    struct CountingLocation {
        calls: AtomicUsize,
    }

    impl LocationProvider for CountingLocation {
        fn current_location(&self) -> Result<Location, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Location {
                latitude: 56.01,
                longitude: 92.85,
            })
        }
    }

    fn denied() -> Arc<dyn LocationProvider> {
        Arc::new(ConfiguredLocation::from_config(&LocationConfig {
            latitude: Some(56.01),
            longitude: Some(92.85),
            permission_granted: false,
        }))
    }

    #[tokio::test]
    async fn test_permission_denied_uses_preference() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        prefs.set_city("Murmansk").unwrap();

        let resolver = CityResolver::new(denied(), None, CityDirectory, prefs, "Moscow");
        let city = resolver.resolve().await.unwrap();

        assert_eq!(city.query, "Murmansk");
        assert_eq!(city.display, "Мурманск");
        assert_eq!(city.source, CitySource::Saved);
    }

    #[tokio::test]
    async fn test_default_city_when_nothing_saved() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        let resolver = CityResolver::new(denied(), None, CityDirectory, prefs.clone(), "Moscow");

        let city = resolver.resolve().await.unwrap();
        assert_eq!(city.query, "Moscow");
        assert_eq!(city.source, CitySource::Default);
        // Defaults are not written back
        assert_eq!(prefs.city(), None);
    }

    #[tokio::test]
    async fn test_blank_everything_is_none() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        let resolver = CityResolver::new(denied(), None, CityDirectory, prefs, "  ");
        assert!(resolver.resolve().await.is_none());
    }

    #[tokio::test]
    async fn test_saved_city_skips_location() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        prefs.set_city("Kazan").unwrap();
        let location = Arc::new(CountingLocation::default());

        let resolver =
            CityResolver::new(location.clone(), None, CityDirectory, prefs.clone(), "Moscow");
        let city = resolver.resolve().await.unwrap();

        assert_eq!(city.query, "Kazan");
        assert_eq!(city.source, CitySource::Saved);
        assert_eq!(location.calls.load(Ordering::SeqCst), 0);
        assert_eq!(prefs.city().as_deref(), Some("Kazan"));
    }

    #[tokio::test]
    async fn test_location_consulted_without_saved_city() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        let location = Arc::new(CountingLocation::default());

        let resolver = CityResolver::new(location.clone(), None, CityDirectory, prefs, "Moscow");
        let city = resolver.resolve().await.unwrap();

        // No geocoder, so the default wins
        assert_eq!(city.source, CitySource::Default);
        assert_eq!(location.calls.load(Ordering::SeqCst), 1);
    }
}
