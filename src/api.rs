//! HTTP API over the locale cache and the loaded alert configuration.
//!
//! Routes:
//! - GET    /health
//! - GET    /api/locales?featured_only=: Active locales (public view)
//! - GET    /api/locales/:slug: Single active locale
//! - GET    /api/config/validation: Validation report for the alert config
//! - GET    /api/admin/locales: All locales including inactive
//! - POST   /api/admin/locales: Create a locale
//! - PATCH  /api/admin/locales/:slug: Partial update
//! - DELETE /api/admin/locales/:slug?hard=: Soft (default) or hard delete
//! - POST   /api/admin/locales/:slug/restore: Undo a soft delete
//! - POST   /api/admin/channels/:name/test: Send a test alert
//!
//! Admin routes require the `x-api-key` header.

use crate::alerts::{validate_config, Config as AlertConfig, ValidationResult};
use crate::locale::{Locale, LocaleCache, LocaleError, PublicLocale, RawRecord};
use crate::secrets::is_placeholder;
use crate::webhook::{test_message, WebhookClient, WebhookResponse};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::warn;

const API_KEY_HEADER: &str = "x-api-key";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<LocaleCache>,
    pub alert_config: Arc<AlertConfig>,
    pub webhook: WebhookClient,
    pub admin_api_key: Option<String>,
}

/// Handler error mapped onto a status code and JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("unauthorized")]
    Unauthorized,

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let details = match &self {
            ApiError::Validation(errors) => json!(errors),
            _ => Value::Null,
        };
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
                "details": details,
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<LocaleError> for ApiError {
    fn from(err: LocaleError) -> Self {
        let message = err.to_string();
        match err {
            LocaleError::NotFound(_) => ApiError::NotFound(message),
            LocaleError::AlreadyExists(_) => ApiError::Conflict(message),
            LocaleError::Invalid(errors) => ApiError::Validation(errors),
            LocaleError::Store(_) => ApiError::Internal(message),
        }
    }
}

/// Constant-time string comparison for API keys
fn keys_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.admin_api_key.as_deref() else {
        return Err(ApiError::Unavailable("admin API is disabled".to_string()));
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if keys_match(provided, expected) {
        Ok(())
    } else {
        warn!("Rejected admin request with invalid API key");
        Err(ApiError::Unauthorized)
    }
}

/// Run blocking cache/store work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/locales", get(list_locales))
        .route("/api/locales/:slug", get(get_locale))
        .route("/api/config/validation", get(config_validation))
        .route(
            "/api/admin/locales",
            get(admin_list_locales).post(admin_create_locale),
        )
        .route(
            "/api/admin/locales/:slug",
            patch(admin_update_locale).delete(admin_delete_locale),
        )
        .route("/api/admin/locales/:slug/restore", post(admin_restore_locale))
        .route("/api/admin/channels/:name/test", post(admin_test_channel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==================== Public Handlers ====================

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct LocaleQuery {
    #[serde(default)]
    featured_only: bool,
}

async fn list_locales(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<Vec<PublicLocale>>, ApiError> {
    let cache = Arc::clone(&state.cache);
    let locales = blocking(move || cache.get_all_locales(true, query.featured_only)).await?;
    Ok(Json(locales.iter().map(PublicLocale::from).collect()))
}

async fn get_locale(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicLocale>, ApiError> {
    let cache = Arc::clone(&state.cache);
    let lookup = slug.clone();
    let locale = blocking(move || cache.get_locale(&lookup)).await?;

    match locale {
        Some(locale) if locale.is_active => Ok(Json(PublicLocale::from(&locale))),
        _ => Err(ApiError::NotFound(format!("Locale '{}' not found", slug))),
    }
}

async fn config_validation(State(state): State<AppState>) -> Json<ValidationResult> {
    Json(validate_config(&state.alert_config))
}

// ==================== Admin Handlers ====================

async fn admin_list_locales(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Locale>>, ApiError> {
    require_admin(&state, &headers)?;
    let cache = Arc::clone(&state.cache);
    Ok(Json(blocking(move || cache.get_all_locales_admin()).await?))
}

async fn admin_create_locale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(locale): Json<Locale>,
) -> Result<(StatusCode, Json<Locale>), ApiError> {
    require_admin(&state, &headers)?;
    let cache = Arc::clone(&state.cache);
    let created = blocking(move || cache.create_locale(&locale)).await??;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn admin_update_locale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(updates): Json<RawRecord>,
) -> Result<Json<Locale>, ApiError> {
    require_admin(&state, &headers)?;
    let cache = Arc::clone(&state.cache);
    let updated = blocking(move || cache.update_locale(&slug, updates)).await??;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    hard: bool,
}

async fn admin_delete_locale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&state, &headers)?;
    let cache = Arc::clone(&state.cache);
    let target = slug.clone();
    blocking(move || cache.delete_locale(&target, query.hard)).await??;

    let action = if query.hard {
        "deleted permanently"
    } else {
        "deactivated"
    };
    Ok(Json(json!({"message": format!("Locale '{}' {}", slug, action)})))
}

async fn admin_restore_locale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&state, &headers)?;
    let cache = Arc::clone(&state.cache);
    let target = slug.clone();
    blocking(move || cache.restore_locale(&target)).await??;

    Ok(Json(json!({"message": format!("Locale '{}' restored successfully", slug)})))
}

async fn admin_test_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<WebhookResponse>, ApiError> {
    require_admin(&state, &headers)?;

    let channel = state
        .alert_config
        .find_channel(&name)
        .ok_or_else(|| ApiError::NotFound(format!("Channel '{}' not found", name)))?;

    if is_placeholder(&channel.webhook_url) {
        return Err(ApiError::Validation(vec![format!(
            "Channel '{}' has an unresolved webhook placeholder",
            name
        )]));
    }

    let response = state
        .webhook
        .send_message(&channel.webhook_url, &test_message(&channel.name))
        .await;
    Ok(Json(response))
}
