//! Persistence for locale documents.
//!
//! Locales are stored as schemaless JSON documents keyed by slug. The
//! [`LocaleStore`] trait is the boundary the cache talks to; two
//! implementations are provided.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::warn;

/// A raw locale document as persisted.
pub type RawRecord = Map<String, Value>;

/// A stored document together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: RawRecord,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to encode document {slug}: {source}")]
    Encode {
        slug: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document {slug} is unreadable: {reason}")]
    Corrupt { slug: String, reason: String },

    #[error("document {0} not found")]
    NotFound(String),

    #[error("document {0} already exists")]
    AlreadyExists(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Document store holding locale records.
pub trait LocaleStore: Send + Sync {
    fn list_all(&self) -> Result<Vec<Document>, StoreError>;

    fn get(&self, slug: &str) -> Result<Option<RawRecord>, StoreError>;

    fn exists(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.get(slug)?.is_some())
    }

    /// Insert a new document; fails with [`StoreError::AlreadyExists`].
    fn create(&self, slug: &str, record: RawRecord) -> Result<(), StoreError>;

    /// Merge top-level fields into an existing document.
    fn update(&self, slug: &str, fields: RawRecord) -> Result<(), StoreError>;

    /// Permanently remove a document.
    fn delete(&self, slug: &str) -> Result<(), StoreError>;
}

// ==================== SQLite Store ====================

/// Locale store backed by a single SQLite table of JSON documents.
#[derive(Clone)]
pub struct SqliteLocaleStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLocaleStore {
    /// Open (or create) the database and ensure the table exists.
    pub fn new(database_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(database_path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS locales (
                slug TEXT PRIMARY KEY,
                document TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn encode(slug: &str, record: &RawRecord) -> Result<String, StoreError> {
        serde_json::to_string(record).map_err(|source| StoreError::Encode {
            slug: slug.to_string(),
            source,
        })
    }

    fn decode(slug: &str, document: &str) -> Result<RawRecord, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            slug: slug.to_string(),
            reason,
        };

        match serde_json::from_str::<Value>(document) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(corrupt("not a JSON object".to_string())),
            Err(e) => Err(corrupt(e.to_string())),
        }
    }
}

impl LocaleStore for SqliteLocaleStore {
    fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT slug, document FROM locales ORDER BY slug")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, document) = row?;
            match Self::decode(&id, &document) {
                Ok(data) => documents.push(Document { id, data }),
                Err(e) => warn!("Skipping {}", e),
            }
        }

        Ok(documents)
    }

    fn get(&self, slug: &str) -> Result<Option<RawRecord>, StoreError> {
        let conn = self.lock();
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM locales WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )
            .optional()?;

        document.map(|d| Self::decode(slug, &d)).transpose()
    }

    fn exists(&self, slug: &str) -> Result<bool, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM locales WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create(&self, slug: &str, record: RawRecord) -> Result<(), StoreError> {
        let document = Self::encode(slug, &record)?;
        let conn = self.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO locales (slug, document) VALUES (?1, ?2)",
            params![slug, document],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(slug.to_string()));
        }
        Ok(())
    }

    fn update(&self, slug: &str, fields: RawRecord) -> Result<(), StoreError> {
        let conn = self.lock();
        let existing: Option<String> = conn
            .query_row(
                "SELECT document FROM locales WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )
            .optional()?;

        let existing = existing.ok_or_else(|| StoreError::NotFound(slug.to_string()))?;
        let mut merged = Self::decode(slug, &existing)?;
        merged.extend(fields);

        let document = Self::encode(slug, &merged)?;
        conn.execute(
            "UPDATE locales SET document = ?1 WHERE slug = ?2",
            params![document, slug],
        )?;
        Ok(())
    }

    fn delete(&self, slug: &str) -> Result<(), StoreError> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM locales WHERE slug = ?1", params![slug])?;

        if deleted == 0 {
            return Err(StoreError::NotFound(slug.to_string()));
        }
        Ok(())
    }
}

// ==================== In-Memory Store ====================

/// Locale store kept entirely in memory, ordered by slug.
#[derive(Debug, Default)]
pub struct MemoryLocaleStore {
    documents: Mutex<BTreeMap<String, RawRecord>>,
}

impl MemoryLocaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, RawRecord>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocaleStore for MemoryLocaleStore {
    fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    fn get(&self, slug: &str) -> Result<Option<RawRecord>, StoreError> {
        Ok(self.lock().get(slug).cloned())
    }

    fn create(&self, slug: &str, record: RawRecord) -> Result<(), StoreError> {
        let mut documents = self.lock();
        if documents.contains_key(slug) {
            return Err(StoreError::AlreadyExists(slug.to_string()));
        }
        documents.insert(slug.to_string(), record);
        Ok(())
    }

    fn update(&self, slug: &str, fields: RawRecord) -> Result<(), StoreError> {
        let mut documents = self.lock();
        let document = documents
            .get_mut(slug)
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))?;
        document.extend(fields);
        Ok(())
    }

    fn delete(&self, slug: &str) -> Result<(), StoreError> {
        self.lock()
            .remove(slug)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }
}
