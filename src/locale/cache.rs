//! Read-through locale cache with bounded staleness.
//!
//! Reads serve an in-memory snapshot and refresh it from the store once it is
//! older than the TTL, empty, or invalidated. A failed refresh keeps the
//! previous snapshot. Writers go through the mutation methods, which
//! invalidate the cache only when the store accepted the change.

use crate::locale::model::{validate_locale, Locale};
use crate::locale::store::{Document, LocaleStore, RawRecord, StoreError};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Default cache TTL (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Failure of a locale mutation, suitable for showing to the caller.
#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("Locale '{0}' already exists")]
    AlreadyExists(String),

    #[error("Locale '{0}' not found")]
    NotFound(String),

    #[error("Invalid locale: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Locale store failure: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for LocaleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(slug) => LocaleError::NotFound(slug),
            StoreError::AlreadyExists(slug) => LocaleError::AlreadyExists(slug),
            other => LocaleError::Store(other),
        }
    }
}

/// Immutable view of the store at one point in time.
struct Snapshot {
    locales: HashMap<String, Locale>,
    refreshed_at: Instant,
    /// Invalidation epoch observed before the fetch started
    epoch: u64,
}

pub struct LocaleCache {
    store: Arc<dyn LocaleStore>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes refreshes; holds the epoch the last attempt started at
    refresh_lock: Mutex<u64>,
    /// Completed refresh attempts, successful or not
    refresh_attempts: AtomicU64,
    epoch: AtomicU64,
}

impl LocaleCache {
    pub fn new(store: Arc<dyn LocaleStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: RwLock::new(None),
            refresh_lock: Mutex::new(0),
            refresh_attempts: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        !snapshot.locales.is_empty()
            && snapshot.epoch == self.epoch.load(Ordering::SeqCst)
            && snapshot.refreshed_at.elapsed() < self.ttl
    }

    /// Current snapshot, refreshing first when stale.
    ///
    /// Readers queued behind a refresh reuse its outcome, even a failed one,
    /// as long as it started after the latest invalidation.
    fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        let attempts_seen = self.refresh_attempts.load(Ordering::SeqCst);
        if let Some(snapshot) = self.current().filter(|s| self.is_fresh(s)) {
            return Some(snapshot);
        }

        let mut last_attempt_epoch = self
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(snapshot) = self.current().filter(|s| self.is_fresh(s)) {
            return Some(snapshot);
        }

        let attempted_while_waiting = self.refresh_attempts.load(Ordering::SeqCst) != attempts_seen;
        if attempted_while_waiting && *last_attempt_epoch == self.epoch.load(Ordering::SeqCst) {
            debug!("Reusing outcome of concurrent locale refresh");
            return self.current();
        }

        *last_attempt_epoch = self.refresh();
        self.refresh_attempts.fetch_add(1, Ordering::SeqCst);
        self.current()
    }

    /// Reload the snapshot; returns the epoch the attempt started at.
    fn refresh(&self) -> u64 {
        info!("Refreshing locale cache from store");
        let epoch = self.epoch.load(Ordering::SeqCst);

        match self.store.list_all() {
            Ok(documents) => {
                let locales: HashMap<String, Locale> = parse_documents(documents)
                    .into_iter()
                    .map(|locale| (locale.slug.clone(), locale))
                    .collect();

                info!("Loaded {} locales into cache", locales.len());

                let snapshot = Arc::new(Snapshot {
                    locales,
                    refreshed_at: Instant::now(),
                    epoch,
                });
                *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
            }
            Err(e) => {
                // Stale data beats no data
                error!("Failed to refresh locale cache: {}", e);
            }
        }

        epoch
    }

    /// Force the next read to refresh.
    ///
    /// Call after create/update/delete/restore.
    pub fn invalidate_cache(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        debug!("Locale cache invalidated");
    }

    /// All locales, filtered, sorted by `(sort_order, name)`.
    pub fn get_all_locales(&self, active_only: bool, featured_only: bool) -> Vec<Locale> {
        let Some(snapshot) = self.fresh_snapshot() else {
            return Vec::new();
        };

        let mut locales: Vec<Locale> = snapshot
            .locales
            .values()
            .filter(|l| !active_only || l.is_active)
            .filter(|l| !featured_only || l.is_featured)
            .cloned()
            .collect();

        sort_locales(&mut locales);
        locales
    }

    /// Single locale by exact slug.
    pub fn get_locale(&self, slug: &str) -> Option<Locale> {
        self.fresh_snapshot()?.locales.get(slug).cloned()
    }

    // ==================== Admin (uncached) ====================

    /// Every locale including inactive ones, read straight from the store.
    ///
    /// A store failure yields an empty list.
    pub fn get_all_locales_admin(&self) -> Vec<Locale> {
        info!("Admin: fetching all locales from store");

        match self.store.list_all() {
            Ok(documents) => {
                let mut locales = parse_documents(documents);
                sort_locales(&mut locales);
                locales
            }
            Err(e) => {
                error!("Failed to fetch locales for admin: {}", e);
                Vec::new()
            }
        }
    }

    // ==================== Mutations ====================

    /// Create a locale; refuses to overwrite an existing slug.
    pub fn create_locale(&self, locale: &Locale) -> Result<Locale, LocaleError> {
        info!("Creating locale: {}", locale.slug);

        let errors = validate_locale(locale);
        if !errors.is_empty() {
            warn!("Rejected invalid locale {}: {:?}", locale.slug, errors);
            return Err(LocaleError::Invalid(errors));
        }

        if self.store.exists(&locale.slug)? {
            error!("Locale {} already exists", locale.slug);
            return Err(LocaleError::AlreadyExists(locale.slug.clone()));
        }

        let now = Utc::now();
        let created = Locale {
            created_at: Some(now),
            updated_at: Some(now),
            ..locale.clone()
        };

        self.store
            .create(&created.slug, created.to_record())
            .map_err(|e| {
                error!("Failed to create locale {}: {}", created.slug, e);
                LocaleError::from(e)
            })?;
        self.invalidate_cache();

        info!("Created locale: {}", created.slug);
        Ok(created)
    }

    /// Merge `updates` into an existing locale.
    ///
    /// `slug` cannot change; `created_at`/`updated_at` are managed here.
    pub fn update_locale(&self, slug: &str, mut updates: RawRecord) -> Result<Locale, LocaleError> {
        info!("Updating locale: {}", slug);

        let Some(mut merged) = self.store.get(slug)? else {
            error!("Locale {} not found", slug);
            return Err(LocaleError::NotFound(slug.to_string()));
        };

        if let Some(new_slug) = updates.remove("slug") {
            if new_slug.as_str() != Some(slug) {
                return Err(LocaleError::Invalid(vec![
                    "Slug cannot be changed".to_string(),
                ]));
            }
        }
        updates.remove("created_at");
        updates.insert("updated_at".into(), json!(Utc::now()));

        merged.extend(updates.clone());
        let locale =
            Locale::from_record(&merged).map_err(|e| LocaleError::Invalid(vec![e.to_string()]))?;

        let errors = validate_locale(&locale);
        if !errors.is_empty() {
            warn!("Rejected invalid update to {}: {:?}", slug, errors);
            return Err(LocaleError::Invalid(errors));
        }

        self.store.update(slug, updates).map_err(|e| {
            error!("Failed to update locale {}: {}", slug, e);
            LocaleError::from(e)
        })?;
        self.invalidate_cache();

        info!("Updated locale: {}", slug);
        Ok(locale)
    }

    /// Soft-delete (`is_active = false`) or, with `hard_delete`, remove.
    pub fn delete_locale(&self, slug: &str, hard_delete: bool) -> Result<(), LocaleError> {
        info!("Deleting locale: {} (hard={})", slug, hard_delete);
        self.ensure_exists(slug)?;

        let result = if hard_delete {
            self.store.delete(slug)
        } else {
            self.store.update(slug, active_flag(false))
        };
        result.map_err(|e| {
            error!("Failed to delete locale {}: {}", slug, e);
            LocaleError::from(e)
        })?;
        self.invalidate_cache();

        info!(
            "Deleted locale: {} ({})",
            slug,
            if hard_delete { "deleted permanently" } else { "deactivated" }
        );
        Ok(())
    }

    /// Reactivate a soft-deleted locale.
    pub fn restore_locale(&self, slug: &str) -> Result<(), LocaleError> {
        info!("Restoring locale: {}", slug);
        self.ensure_exists(slug)?;

        self.store.update(slug, active_flag(true)).map_err(|e| {
            error!("Failed to restore locale {}: {}", slug, e);
            LocaleError::from(e)
        })?;
        self.invalidate_cache();

        info!("Restored locale: {}", slug);
        Ok(())
    }

    fn ensure_exists(&self, slug: &str) -> Result<(), LocaleError> {
        if self.store.exists(slug)? {
            Ok(())
        } else {
            error!("Locale {} not found", slug);
            Err(LocaleError::NotFound(slug.to_string()))
        }
    }
}

fn active_flag(is_active: bool) -> RawRecord {
    let mut fields = RawRecord::new();
    fields.insert("is_active".into(), json!(is_active));
    fields.insert("updated_at".into(), json!(Utc::now()));
    fields
}

/// Parse documents independently; malformed ones are logged and skipped.
fn parse_documents(documents: Vec<Document>) -> Vec<Locale> {
    documents
        .into_iter()
        .filter_map(|doc| match Locale::from_record(&doc.data) {
            Ok(locale) => Some(locale),
            Err(e) => {
                warn!("Skipping invalid locale document {}: {}", doc.id, e);
                None
            }
        })
        .collect()
}

fn sort_locales(locales: &mut [Locale]) {
    locales.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
    });
}
