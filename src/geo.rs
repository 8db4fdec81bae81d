//! Geographic primitives shared by the alerting configuration and locales.

use serde::{Deserialize, Serialize};

/// Axis-aligned latitude/longitude box.
///
/// A well-formed box has `min < max` on both axes with every coordinate in
/// its legal range. Construction does not enforce this; see
/// [`crate::alerts::validate_bounds`] and [`crate::locale::validate_locale`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn new(min_latitude: f64, max_latitude: f64, min_longitude: f64, max_longitude: f64) -> Self {
        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    /// Check whether a point lies inside the box (edges included).
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&lat)
            && (self.min_longitude..=self.max_longitude).contains(&lng)
    }
}

/// A named location that alert rules can be scoped to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Proximity radius in kilometres
    pub radius_km: f64,
}

impl PointOfInterest {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            radius_km,
        }
    }
}
