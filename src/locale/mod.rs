//! Locale presets: model, persistence, and the read-through cache.
//!
//! - `model`: the [`Locale`] value object and its validation
//! - `store`: the [`LocaleStore`] boundary with SQLite and in-memory stores
//! - `cache`: [`LocaleCache`], serving reads with bounded staleness

mod cache;
mod model;
mod store;

pub use cache::{LocaleCache, LocaleError, DEFAULT_CACHE_TTL};
pub use model::{validate_locale, Center, Locale, PublicLocale};
pub use store::{Document, LocaleStore, MemoryLocaleStore, RawRecord, SqliteLocaleStore, StoreError};
