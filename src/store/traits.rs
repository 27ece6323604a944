//! Core traits for local store backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use futures::stream::BoxStream;

/// A local source of last-known data for one record slot.
///
/// The fused request path only needs three things from it: read the latest
/// value, observe it as a stream, write one value. Serializing concurrent
/// access is the backend's own responsibility; read and write faults are
/// never classified into network errors.
#[async_trait]
pub trait LocalStore<T: Send + Sync>: Send + Sync {
  /// Cold stream of the current value. Reads at poll time, so a stream
  /// obtained after a write observes it. Empty when nothing is stored.
  fn watch(&self) -> BoxStream<'static, T>;

  /// Store one value, replacing the previous snapshot.
  async fn save(&self, value: &T) -> Result<()>;

  /// When the current snapshot was written, if the backend tracks it.
  fn cached_at(&self) -> Option<DateTime<Utc>> {
    None
  }
}

/// Key identifying one cached record slot.
pub trait QueryKey {
  /// Stable, fixed-length key used for storage lookups.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logs.
  fn description(&self) -> String;
}
