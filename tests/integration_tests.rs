//! Integration tests for quake-alerts
//!
//! These exercise the public library API end to end: loading and validating
//! an alert configuration from disk, and serving locales through the cache
//! over a real SQLite store.

use quake_alerts::alerts::{validate_config, Config, Severity};
use quake_alerts::geo::BoundingBox;
use quake_alerts::locale::{Center, Locale, LocaleCache, LocaleError, SqliteLocaleStore};
use quake_alerts::secrets::SecretResolver;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ==================== Test Helpers ====================

struct MapResolver;

impl SecretResolver for MapResolver {
    fn resolve(&self, value: &str) -> String {
        match value {
            "${secret:slack-ops-webhook}" => "https://hooks.slack.com/services/T000/B000/XXX".to_string(),
            other => other.to_string(),
        }
    }
}

fn write_config(temp_dir: &TempDir, body: serde_json::Value) -> std::path::PathBuf {
    let path = temp_dir.path().join("alerts.json");
    std::fs::write(&path, body.to_string()).expect("Failed to write config");
    path
}

fn bay_area_config(channel_pois: &[&str]) -> serde_json::Value {
    json!({
        "monitoring_regions": [{
            "name": "Bay Area",
            "bounds": {
                "min_latitude": 37.0,
                "max_latitude": 38.5,
                "min_longitude": -123.0,
                "max_longitude": -121.5
            }
        }],
        "points_of_interest": [
            {"name": "San Ramon", "latitude": 37.78, "longitude": -121.98, "radius_km": 25.0}
        ],
        "alert_channels": [{
            "name": "slack-ops",
            "channel_type": "slack",
            "webhook_url": "${secret:slack-ops-webhook}",
            "rules": {"min_magnitude": 3.0, "points_of_interest": channel_pois}
        }]
    })
}

fn locale(slug: &str, name: &str, sort_order: i64) -> Locale {
    Locale {
        slug: slug.to_string(),
        name: name.to_string(),
        display_name: format!("{}, CA", name),
        bounds: BoundingBox::new(37.3, 38.3, -122.5, -121.5),
        center: Center {
            lat: 37.78,
            lng: -121.98,
        },
        min_magnitude: 2.5,
        is_active: true,
        is_featured: true,
        sort_order,
        created_at: None,
        updated_at: None,
    }
}

fn sqlite_cache(temp_dir: &TempDir) -> LocaleCache {
    let db_path = temp_dir.path().join("locales.db");
    let store = SqliteLocaleStore::new(db_path.to_str().unwrap()).expect("Failed to open store");
    LocaleCache::new(Arc::new(store), Duration::from_secs(300))
}

// ==================== Alert Configuration ====================

#[test]
fn test_load_resolve_and_validate_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, bay_area_config(&["San Ramon"]));

    let config = Config::load(&path).unwrap().resolve_secrets(&MapResolver);
    let result = validate_config(&config);

    assert!(result.valid);
    assert!(result.errors.is_empty(), "unexpected findings: {:?}", result.errors);
}

#[test]
fn test_unresolved_placeholder_is_only_a_warning() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, bay_area_config(&["San Ramon"]));

    let result = validate_config(&Config::load(&path).unwrap());

    assert!(result.valid);
    assert_eq!(result.warnings().len(), 1);
    assert!(result.errors[0].message.contains("placeholder"));
}

#[test]
fn test_misspelled_poi_gets_suggestion() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, bay_area_config(&["San Ramone"]));

    let config = Config::load(&path).unwrap().resolve_secrets(&MapResolver);
    let result = validate_config(&config);

    assert!(result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].severity, Severity::Warning);
    assert_eq!(result.errors[0].context, "channel 'slack-ops'");
    assert_eq!(
        result.errors[0].message,
        "Point of interest 'San Ramone' not found. Did you mean 'San Ramon'?"
    );
}

#[test]
fn test_inverted_region_is_invalid() {
    let temp_dir = TempDir::new().unwrap();
    let mut body = bay_area_config(&[]);
    body["monitoring_regions"][0]["bounds"]["min_latitude"] = json!(39.0);
    let path = write_config(&temp_dir, body);

    let result = validate_config(&Config::load(&path).unwrap().resolve_secrets(&MapResolver));

    assert!(!result.valid);
    assert_eq!(result.critical_errors().len(), 1);
    assert_eq!(result.critical_errors()[0].context, "region 'Bay Area'");
}

#[test]
fn test_sample_config_loads() {
    let config = Config::load("config/alerts.json").unwrap();
    let result = validate_config(&config);

    assert!(result.valid);
    assert_eq!(config.alert_channels.len(), 1);
}

// ==================== Locale Cache over SQLite ====================

#[test]
fn test_locale_lifecycle_on_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let cache = sqlite_cache(&temp_dir);

    cache.create_locale(&locale("bayarea", "Bay Area", 2)).unwrap();
    cache.create_locale(&locale("sanramon", "San Ramon", 1)).unwrap();

    let slugs: Vec<String> = cache
        .get_all_locales(true, false)
        .into_iter()
        .map(|l| l.slug)
        .collect();
    assert_eq!(slugs, vec!["sanramon", "bayarea"]);

    cache.delete_locale("sanramon", false).unwrap();
    assert_eq!(cache.get_all_locales(true, false).len(), 1);
    assert_eq!(cache.get_all_locales_admin().len(), 2);

    cache.restore_locale("sanramon").unwrap();
    assert_eq!(cache.get_all_locales(true, false).len(), 2);

    cache.delete_locale("bayarea", true).unwrap();
    assert!(cache.get_locale("bayarea").is_none());
}

#[test]
fn test_locales_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    sqlite_cache(&temp_dir)
        .create_locale(&locale("sanramon", "San Ramon", 1))
        .unwrap();

    let reopened = sqlite_cache(&temp_dir);
    let found = reopened.get_locale("sanramon").unwrap();

    assert_eq!(found.name, "San Ramon");
    assert!(found.created_at.is_some());
}

#[test]
fn test_duplicate_create_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let cache = sqlite_cache(&temp_dir);

    cache.create_locale(&locale("sanramon", "San Ramon", 1)).unwrap();
    let result = cache.create_locale(&locale("sanramon", "San Ramon", 1));

    assert!(matches!(result, Err(LocaleError::AlreadyExists(slug)) if slug == "sanramon"));
}

#[test]
fn test_update_moving_center_outside_bounds_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let cache = sqlite_cache(&temp_dir);
    cache.create_locale(&locale("sanramon", "San Ramon", 1)).unwrap();

    let updates = json!({"center": {"lat": 40.0, "lng": -121.98}});
    let result = cache.update_locale("sanramon", updates.as_object().unwrap().clone());

    match result {
        Err(LocaleError::Invalid(errors)) => {
            assert_eq!(errors, vec!["Center point must be within bounds".to_string()]);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(cache.get_locale("sanramon").unwrap().center.lat, 37.78);
}

#[test]
fn test_update_is_visible_immediately() {
    let temp_dir = TempDir::new().unwrap();
    let cache = sqlite_cache(&temp_dir);
    cache.create_locale(&locale("sanramon", "San Ramon", 1)).unwrap();
    assert_eq!(cache.get_all_locales(true, false).len(), 1);

    let updates = json!({"display_name": "San Ramon Valley"});
    cache
        .update_locale("sanramon", updates.as_object().unwrap().clone())
        .unwrap();

    assert_eq!(
        cache.get_locale("sanramon").unwrap().display_name,
        "San Ramon Valley"
    );
}
