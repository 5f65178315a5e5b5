//! Known cities and the fallback chain used to settle on one.
//!
//! Weather requests always use the English name; the Russian name is only
//! for display.

/// (English, Russian) pairs for the cities the settings screen offers.
const KNOWN_CITIES: &[(&str, &str)] = &[
    ("Moscow", "Москва"),
    ("Saint Petersburg", "Санкт-Петербург"),
    ("Novosibirsk", "Новосибирск"),
    ("Yekaterinburg", "Екатеринбург"),
    ("Kazan", "Казань"),
    ("Krasnoyarsk", "Красноярск"),
    ("Irkutsk", "Иркутск"),
    ("Murmansk", "Мурманск"),
];

/// Static bidirectional English/Russian city table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CityDirectory;

impl CityDirectory {
    /// All known cities as (English, Russian).
    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        KNOWN_CITIES
    }

    /// Russian name for an English key.
    pub fn to_local(&self, english: &str) -> Option<&'static str> {
        let english = english.trim();
        KNOWN_CITIES
            .iter()
            .find(|(en, _)| en.eq_ignore_ascii_case(english))
            .map(|(_, ru)| *ru)
    }

    /// English key for a Russian name.
    pub fn to_english(&self, local: &str) -> Option<&'static str> {
        let local = local.trim();
        KNOWN_CITIES
            .iter()
            .find(|(_, ru)| ru.to_lowercase() == local.to_lowercase())
            .map(|(en, _)| *en)
    }

    /// Canonical English key for a name in either language.
    pub fn canonical(&self, name: &str) -> Option<&'static str> {
        let name = name.trim();
        KNOWN_CITIES
            .iter()
            .find(|(en, _)| en.eq_ignore_ascii_case(name))
            .map(|(en, _)| *en)
            .or_else(|| self.to_english(name))
    }

    /// Display name: Russian when known, otherwise the input as given.
    pub fn display_name(&self, city: &str) -> String {
        self.to_local(city)
            .map(str::to_string)
            .unwrap_or_else(|| city.trim().to_string())
    }
}

/// Where a resolved city came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitySource {
    /// Geocoded name found in the directory
    Mapped,
    /// Geocoded name used as-is
    Geocoded,
    /// Saved preference
    Saved,
    /// Configured default
    Default,
}

/// Outcome of city resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCity {
    /// Name sent to the weather API
    pub query: String,
    /// Name shown to the user
    pub display: String,
    pub source: CitySource,
}

impl CityDirectory {
    /// Settle on a city: mapped geocoded name, then raw geocoded name, then
    /// the saved preference, then `default_city`.
    pub fn resolve(
        &self,
        geocoded: Option<&str>,
        saved: Option<&str>,
        default_city: &str,
    ) -> ResolvedCity {
        fn non_blank(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(name) = non_blank(geocoded) {
            if let Some(english) = self.canonical(name) {
                return self.resolved(english, CitySource::Mapped);
            }
            return ResolvedCity {
                query: name.to_string(),
                display: name.to_string(),
                source: CitySource::Geocoded,
            };
        }

        if let Some(name) = non_blank(saved) {
            let query = self.canonical(name).unwrap_or(name);
            return self.resolved(query, CitySource::Saved);
        }

        let query = self.canonical(default_city).unwrap_or(default_city.trim());
        self.resolved(query, CitySource::Default)
    }

    fn resolved(&self, english: &str, source: CitySource) -> ResolvedCity {
        ResolvedCity {
            query: english.to_string(),
            display: self.display_name(english),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_every_known_city() {
        let dir = CityDirectory;
        for (en, _) in dir.entries() {
            let local = dir.to_local(en);
            assert!(local.is_some(), "{} has no local name", en);
            assert_eq!(local.and_then(|ru| dir.to_english(ru)), Some(*en));
        }
    }

    #[test]
    fn test_display_name_unknown_is_raw() {
        let dir = CityDirectory;
        assert_eq!(dir.display_name("Moscow"), "Москва");
        assert_eq!(dir.display_name(" Berlin "), "Berlin");
    }

    #[test]
    fn test_canonical_accepts_both_languages() {
        let dir = CityDirectory;
        assert_eq!(dir.canonical("kazan"), Some("Kazan"));
        assert_eq!(dir.canonical("Казань"), Some("Kazan"));
        assert_eq!(dir.canonical("казань"), Some("Kazan"));
        assert_eq!(dir.canonical("Tver"), None);
    }

    #[test]
    fn test_resolve_mapped_geocoded_name() {
        let resolved = CityDirectory.resolve(Some("Красноярск"), Some("Moscow"), "Moscow");
        assert_eq!(resolved.query, "Krasnoyarsk");
        assert_eq!(resolved.display, "Красноярск");
        assert_eq!(resolved.source, CitySource::Mapped);
    }

    #[test]
    fn test_resolve_unmapped_geocoded_name_is_raw() {
        let resolved = CityDirectory.resolve(Some("Тверь"), Some("Moscow"), "Moscow");
        assert_eq!(resolved.query, "Тверь");
        assert_eq!(resolved.display, "Тверь");
        assert_eq!(resolved.source, CitySource::Geocoded);
    }

    #[test]
    fn test_resolve_empty_geocode_uses_saved() {
        let resolved = CityDirectory.resolve(Some(""), Some("Irkutsk"), "Moscow");
        assert_eq!(resolved.query, "Irkutsk");
        assert_eq!(resolved.display, "Иркутск");
        assert_eq!(resolved.source, CitySource::Saved);
    }

    #[test]
    fn test_resolve_whitespace_sources_fall_to_default() {
        let resolved = CityDirectory.resolve(Some("   "), Some("\t"), " Kazan ");
        assert_eq!(resolved.query, "Kazan");
        assert_eq!(resolved.display, "Казань");
        assert_eq!(resolved.source, CitySource::Default);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let resolved = CityDirectory.resolve(None, None, "Moscow");
        assert_eq!(resolved.query, "Moscow");
        assert_eq!(resolved.display, "Москва");
        assert_eq!(resolved.source, CitySource::Default);
    }
}
