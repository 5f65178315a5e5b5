//! Device location.
//!
//! There is no platform location service on the desktop, so the position
//! comes from the `[location]` config section and the permission flag that
//! goes with it.

use crate::types::{Location, LocationError};
use cafe_core::LocationConfig;

/// Source of the device's current position.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> Result<Location, LocationError>;
}

/// Location taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocation {
    location: Option<Location>,
    permission_granted: bool,
}

impl ConfiguredLocation {
    pub fn from_config(config: &LocationConfig) -> Self {
        let location = match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Self {
            location,
            permission_granted: config.permission_granted,
        }
    }
}

impl LocationProvider for ConfiguredLocation {
    fn current_location(&self) -> Result<Location, LocationError> {
        if !self.permission_granted {
            return Err(LocationError::PermissionDenied);
        }
        self.location
            .clone()
            .ok_or(LocationError::ServiceUnavailable)
    }
}
