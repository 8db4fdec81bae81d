use crate::geo::BoundingBox;
use crate::locale::store::RawRecord;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;

const MAX_SLUG_LEN: usize = 50;
const MAX_NAME_LEN: usize = 100;
const MAX_DISPLAY_NAME_LEN: usize = 200;

static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();

fn default_min_magnitude() -> f64 {
    2.5
}

fn default_true() -> bool {
    true
}

/// Map center point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lng: f64,
}

/// A named, geographically bounded preset shown to end users.
///
/// Timestamps are assigned by the cache/store on write; values supplied by a
/// caller are overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    /// URL-friendly identifier (e.g. "sanramon")
    pub slug: String,
    /// Short name (e.g. "San Ramon")
    pub name: String,
    /// Full display name (e.g. "San Ramon, CA")
    pub display_name: String,
    pub bounds: BoundingBox,
    pub center: Center,
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,
    /// Soft-delete flag
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Shown in the main navigation
    #[serde(default = "default_true")]
    pub is_featured: bool,
    /// Display ordering (lower first, ties broken by name)
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Locale {
    /// Parse a stored document.
    ///
    /// Fails on a missing required field or a field of the wrong type.
    pub fn from_record(record: &RawRecord) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(record.clone()))
    }

    /// Storage form including every field.
    pub fn to_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("slug".into(), json!(self.slug));
        record.insert("name".into(), json!(self.name));
        record.insert("display_name".into(), json!(self.display_name));
        record.insert(
            "bounds".into(),
            json!({
                "min_latitude": self.bounds.min_latitude,
                "max_latitude": self.bounds.max_latitude,
                "min_longitude": self.bounds.min_longitude,
                "max_longitude": self.bounds.max_longitude,
            }),
        );
        record.insert(
            "center".into(),
            json!({"lat": self.center.lat, "lng": self.center.lng}),
        );
        record.insert("min_magnitude".into(), json!(self.min_magnitude));
        record.insert("is_active".into(), json!(self.is_active));
        record.insert("is_featured".into(), json!(self.is_featured));
        record.insert("sort_order".into(), json!(self.sort_order));
        record.insert("created_at".into(), json!(self.created_at));
        record.insert("updated_at".into(), json!(self.updated_at));
        record
    }
}

/// Public API view of a locale (no admin fields).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicLocale {
    pub slug: String,
    pub name: String,
    pub display_name: String,
    pub bounds: BoundingBox,
    pub center: Center,
    pub min_magnitude: f64,
}

impl From<&Locale> for PublicLocale {
    fn from(locale: &Locale) -> Self {
        Self {
            slug: locale.slug.clone(),
            name: locale.name.clone(),
            display_name: locale.display_name.clone(),
            bounds: locale.bounds,
            center: locale.center,
            min_magnitude: locale.min_magnitude,
        }
    }
}

/// Validate a locale, returning every problem found (empty if valid).
pub fn validate_locale(locale: &Locale) -> Vec<String> {
    let mut errors = Vec::new();
    let slug_regex = SLUG_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

    if locale.slug.is_empty() {
        errors.push("Slug is required".to_string());
    } else if !slug_regex.is_match(&locale.slug) {
        errors.push("Slug must be alphanumeric (hyphens and underscores allowed)".to_string());
    } else if locale.slug.chars().count() > MAX_SLUG_LEN {
        errors.push(format!("Slug must be {} characters or less", MAX_SLUG_LEN));
    }

    if locale.name.is_empty() {
        errors.push("Name is required".to_string());
    } else if locale.name.chars().count() > MAX_NAME_LEN {
        errors.push(format!("Name must be {} characters or less", MAX_NAME_LEN));
    }

    if locale.display_name.is_empty() {
        errors.push("Display name is required".to_string());
    } else if locale.display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        errors.push(format!(
            "Display name must be {} characters or less",
            MAX_DISPLAY_NAME_LEN
        ));
    }

    let bounds = &locale.bounds;
    let latitude = -90.0..=90.0;
    let longitude = -180.0..=180.0;

    if !latitude.contains(&bounds.min_latitude) {
        errors.push("min_latitude must be between -90 and 90".to_string());
    }
    if !latitude.contains(&bounds.max_latitude) {
        errors.push("max_latitude must be between -90 and 90".to_string());
    }
    if bounds.min_latitude >= bounds.max_latitude {
        errors.push("min_latitude must be less than max_latitude".to_string());
    }

    if !longitude.contains(&bounds.min_longitude) {
        errors.push("min_longitude must be between -180 and 180".to_string());
    }
    if !longitude.contains(&bounds.max_longitude) {
        errors.push("max_longitude must be between -180 and 180".to_string());
    }
    if bounds.min_longitude >= bounds.max_longitude {
        errors.push("min_longitude must be less than max_longitude".to_string());
    }

    if !bounds.contains(locale.center.lat, locale.center.lng) {
        errors.push("Center point must be within bounds".to_string());
    }

    if !(0.0..=10.0).contains(&locale.min_magnitude) {
        errors.push("min_magnitude must be between 0 and 10".to_string());
    }

    errors
}
