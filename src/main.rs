use anyhow::{bail, Context, Result};
use quake_alerts::alerts::{self, validate_config};
use quake_alerts::api::{self, AppState};
use quake_alerts::config::Config;
use quake_alerts::locale::{LocaleCache, SqliteLocaleStore};
use quake_alerts::secrets::EnvSecretResolver;
use quake_alerts::webhook::WebhookClient;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quake_alerts=info".parse()?),
        )
        .init();

    info!("Starting quake-alerts service");

    let config = Config::from_env()?;

    // Alert configuration must validate before anything is served
    let alert_config = alerts::Config::load(&config.alert_config_path)?
        .resolve_secrets(&EnvSecretResolver);
    let report = validate_config(&alert_config);
    for finding in report.warnings() {
        warn!("{}: {}", finding.context, finding.message);
    }
    for finding in report.critical_errors() {
        error!("{}: {}", finding.context, finding.message);
    }
    if !report.valid {
        bail!(
            "Alert configuration is invalid ({} errors)",
            report.critical_errors().len()
        );
    }
    info!(
        "Loaded {} regions, {} points of interest, {} channels",
        alert_config.monitoring_regions.len(),
        alert_config.points_of_interest.len(),
        alert_config.alert_channels.len()
    );

    let store = SqliteLocaleStore::new(&config.database_path)
        .with_context(|| format!("Failed to open locale store at {}", config.database_path))?;
    let cache = LocaleCache::new(Arc::new(store), config.cache_ttl);

    if config.admin_api_key.is_none() {
        warn!("ADMIN_API_KEY not set; admin routes are disabled");
    }

    let state = AppState {
        cache: Arc::new(cache),
        alert_config: Arc::new(alert_config),
        webhook: WebhookClient::new(config.webhook_timeout)?,
        admin_api_key: config.admin_api_key.clone(),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, api::router(state)).await?;
    Ok(())
}
