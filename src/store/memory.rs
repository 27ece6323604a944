//! In-memory store backend.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use futures::stream::{self, BoxStream, StreamExt};

use super::traits::LocalStore;

/// Snapshot store held entirely in memory.
///
/// Backs the cache-disabled path (a fresh process starts empty, so every
/// read misses) and scripted store states in tests.
pub struct MemoryStore<T> {
  value: Arc<RwLock<Option<T>>>,
}

impl<T> MemoryStore<T> {
  pub fn new() -> Self {
    Self {
      value: Arc::new(RwLock::new(None)),
    }
  }
}

impl<T> Default for MemoryStore<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for MemoryStore<T> {
  fn clone(&self) -> Self {
    Self {
      value: Arc::clone(&self.value),
    }
  }
}

#[async_trait]
impl<T> LocalStore<T> for MemoryStore<T>
where
  T: Clone + Send + Sync + 'static,
{
  fn watch(&self) -> BoxStream<'static, T> {
    let value = Arc::clone(&self.value);

    stream::once(async move { value.read().ok().and_then(|guard| guard.as_ref().cloned()) })
      .filter_map(|snapshot| async move { snapshot })
      .boxed()
  }

  async fn save(&self, value: &T) -> Result<()> {
    let mut slot = self
      .value
      .write()
      .map_err(|_| eyre!("memory store lock poisoned"))?;
    *slot = Some(value.clone());

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use futures::StreamExt;

  use super::*;

  #[tokio::test]
  async fn empty_store_yields_nothing() {
    let store: MemoryStore<u32> = MemoryStore::new();
    let values: Vec<u32> = store.watch().collect().await;

    assert!(values.is_empty());
  }

  #[tokio::test]
  async fn watch_reads_at_poll_time() {
    let store: MemoryStore<u32> = MemoryStore::new();

    // Obtained before the write, polled after it.
    let stream = store.watch();
    store.save(&5).await.unwrap();

    let values: Vec<u32> = stream.collect().await;
    assert_eq!(values, vec![5]);
  }
}
