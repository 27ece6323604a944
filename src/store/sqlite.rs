//! SQLite-backed store for cached API records.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use futures::stream::{self, BoxStream, StreamExt};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::traits::{LocalStore, QueryKey};

/// Schema for the record cache.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS record_cache (
    query_hash TEXT PRIMARY KEY,
    query_description TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-backed record cache.
///
/// Stores one serialized JSON record per query key. Clones share the same
/// underlying connection.
pub struct SqliteStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
  /// Open or create the cache database at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory cache, used by tests.
  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Arc::new(Mutex::new(conn)),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("shutter").join("cache.db"))
  }

  /// Run database migrations for the cache table.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  /// Typed view of the record slot behind one query key.
  pub fn record_store<T>(&self, key: &dyn QueryKey) -> RecordStore<T> {
    RecordStore {
      conn: Arc::clone(&self.conn),
      hash: key.cache_hash(),
      description: key.description(),
      _marker: PhantomData,
    }
  }
}

impl Clone for SqliteStore {
  fn clone(&self) -> Self {
    Self {
      conn: Arc::clone(&self.conn),
    }
  }
}

/// One cached record slot, typed by its content.
pub struct RecordStore<T> {
  conn: Arc<Mutex<Connection>>,
  hash: String,
  description: String,
  _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordStore<T> {
  fn clone(&self) -> Self {
    Self {
      conn: Arc::clone(&self.conn),
      hash: self.hash.clone(),
      description: self.description.clone(),
      _marker: PhantomData,
    }
  }
}

impl<T> RecordStore<T>
where
  T: Serialize + DeserializeOwned,
{
  fn read(&self) -> Result<Option<T>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data FROM record_cache WHERE query_hash = ?")
      .map_err(|e| eyre!("Failed to prepare record query: {}", e))?;

    let data: Option<Vec<u8>> = stmt.query_row(params![self.hash], |row| row.get(0)).ok();

    match data {
      Some(bytes) => {
        let value = serde_json::from_slice(&bytes)
          .map_err(|e| eyre!("Failed to deserialize cached record: {}", e))?;
        Ok(Some(value))
      }
      None => Ok(None),
    }
  }

  fn write(&self, value: &T) -> Result<()> {
    let data =
      serde_json::to_vec(value).map_err(|e| eyre!("Failed to serialize record: {}", e))?;

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO record_cache (query_hash, query_description, data, cached_at)
         VALUES (?, ?, ?, datetime('now'))",
        params![self.hash, self.description, data],
      )
      .map_err(|e| eyre!("Failed to store record: {}", e))?;

    Ok(())
  }
}

#[async_trait]
impl<T> LocalStore<T> for RecordStore<T>
where
  T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
  fn watch(&self) -> BoxStream<'static, T> {
    let record = self.clone();

    stream::once(async move {
      match record.read() {
        Ok(value) => value,
        Err(err) => {
          warn!(record = %record.description, "local cache read failed: {err:#}");
          None
        }
      }
    })
    .filter_map(|snapshot| async move { snapshot })
    .boxed()
  }

  async fn save(&self, value: &T) -> Result<()> {
    self.write(value)
  }

  fn cached_at(&self) -> Option<DateTime<Utc>> {
    let conn = self.conn.lock().ok()?;

    let mut stmt = conn
      .prepare("SELECT cached_at FROM record_cache WHERE query_hash = ?")
      .ok()?;

    let cached_at: Option<String> = stmt.query_row(params![self.hash], |row| row.get(0)).ok();

    cached_at.and_then(|s| parse_datetime(&s).ok())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use futures::StreamExt;

  use super::*;

  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn cache_hash(&self) -> String {
      self.0.to_string()
    }

    fn description(&self) -> String {
      format!("test record {}", self.0)
    }
  }

  #[tokio::test]
  async fn missing_record_yields_empty_stream() {
    let store = SqliteStore::in_memory().unwrap();
    let record = store.record_store::<Vec<String>>(&TestKey("missing"));

    let values: Vec<Vec<String>> = record.watch().collect().await;
    assert!(values.is_empty());
    assert!(record.cached_at().is_none());
  }

  #[tokio::test]
  async fn saved_record_is_read_back_with_timestamp() {
    let store = SqliteStore::in_memory().unwrap();
    let record = store.record_store::<Vec<String>>(&TestKey("pages"));

    record.save(&vec!["one".to_string()]).await.unwrap();

    let values: Vec<Vec<String>> = record.watch().collect().await;
    assert_eq!(values, vec![vec!["one".to_string()]]);
    assert!(record.cached_at().is_some());
  }

  #[tokio::test]
  async fn saving_again_replaces_the_snapshot() {
    let store = SqliteStore::in_memory().unwrap();
    let record = store.record_store::<Vec<String>>(&TestKey("pages"));

    record.save(&vec!["one".to_string()]).await.unwrap();
    record.save(&vec!["two".to_string()]).await.unwrap();

    let values: Vec<Vec<String>> = record.watch().collect().await;
    assert_eq!(values, vec![vec!["two".to_string()]]);
  }

  #[tokio::test]
  async fn record_slots_are_independent() {
    let store = SqliteStore::in_memory().unwrap();
    let first = store.record_store::<Vec<String>>(&TestKey("first"));
    let second = store.record_store::<Vec<String>>(&TestKey("second"));

    first.save(&vec!["one".to_string()]).await.unwrap();

    let values: Vec<Vec<String>> = second.watch().collect().await;
    assert!(values.is_empty());
  }
}
