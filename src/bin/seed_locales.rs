use anyhow::{Context, Result};
use quake_alerts::config::Config;
use quake_alerts::geo::BoundingBox;
use quake_alerts::locale::{Center, Locale, LocaleCache, LocaleError, SqliteLocaleStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Starter presets written on first deployment.
fn initial_locales() -> Vec<Locale> {
    vec![
        preset(
            "sanramon",
            "San Ramon",
            "San Ramon, CA",
            BoundingBox::new(37.3, 38.3, -122.5, -121.5),
            Center { lat: 37.78, lng: -121.98 },
            1,
        ),
        preset(
            "bayarea",
            "Bay Area",
            "San Francisco Bay Area",
            BoundingBox::new(37.0, 38.5, -123.0, -121.5),
            Center { lat: 37.77, lng: -122.42 },
            2,
        ),
        preset(
            "la",
            "Los Angeles",
            "Los Angeles, CA",
            BoundingBox::new(33.5, 34.8, -119.0, -117.0),
            Center { lat: 34.05, lng: -118.24 },
            3,
        ),
    ]
}

fn preset(
    slug: &str,
    name: &str,
    display_name: &str,
    bounds: BoundingBox,
    center: Center,
    sort_order: i64,
) -> Locale {
    Locale {
        slug: slug.to_string(),
        name: name.to_string(),
        display_name: display_name.to_string(),
        bounds,
        center,
        min_magnitude: 2.5,
        is_active: true,
        is_featured: true,
        sort_order,
        created_at: None,
        updated_at: None,
    }
}

/// Show this binary's progress and the library's locale writes.
fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("seed_locales=info".parse()?)
        .add_directive("quake_alerts=info".parse()?))
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt().with_env_filter(log_filter()?).init();

    let dry_run = std::env::args().any(|arg| arg == "--dry-run");
    let locales = initial_locales();

    if dry_run {
        info!("Dry run: would seed {} locales", locales.len());
        for locale in &locales {
            info!("  {} ({})", locale.slug, locale.display_name);
        }
        return Ok(());
    }

    let config = Config::from_env()?;
    let store = SqliteLocaleStore::new(&config.database_path)
        .with_context(|| format!("Failed to open locale store at {}", config.database_path))?;
    let cache = LocaleCache::new(Arc::new(store), config.cache_ttl);

    let mut created = 0;
    for locale in &locales {
        match cache.create_locale(locale) {
            Ok(_) => {
                info!("✓ Created {}", locale.slug);
                created += 1;
            }
            Err(LocaleError::AlreadyExists(_)) => {
                warn!("Skipping {}: already exists", locale.slug);
            }
            Err(e) => return Err(e).context(format!("Failed to seed {}", locale.slug)),
        }
    }

    info!("Seeded {} of {} locales into {}", created, locales.len(), config.database_path);
    Ok(())
}
