//! Photo repository that pairs the request handler with the Unsplash client
//! and the local record cache.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::net::{CachedResult, NetworkResult, RequestHandler};
use crate::store::{LocalStore, MemoryStore, SqliteStore};

use super::cache::PhotoQueryKey;
use super::client::UnsplashClient;
use super::types::{BasicError, Photo};

/// Repository over the Unsplash API with typed results and offline support.
///
/// Owns nothing shared: the handler is stateless, the client and store are
/// lent into each operation. When no SQLite store is configured, a fresh
/// in-memory slot backs each fused read so every run starts cold.
pub struct PhotoRepository {
  handler: RequestHandler,
  client: UnsplashClient,
  store: Option<SqliteStore>,
  stale_after: Duration,
}

impl PhotoRepository {
  pub fn new(
    handler: RequestHandler,
    client: UnsplashClient,
    store: Option<SqliteStore>,
    stale_after: Duration,
  ) -> Self {
    Self {
      handler,
      client,
      store,
      stale_after,
    }
  }

  /// Fetch one random photo.
  pub async fn random_photo(&self) -> NetworkResult<Photo, BasicError> {
    self.handler.handle(|| self.client.random_photo()).await
  }

  /// Fan out `count` independent random-photo calls and join on all of them.
  ///
  /// Results come back in request order; fan-in (collecting successes,
  /// reporting the first observed error) is the caller's concern.
  pub async fn random_photos(&self, count: usize) -> Vec<NetworkResult<Photo, BasicError>> {
    let requests = (0..count).map(|_| self.random_photo());
    future::join_all(requests).await
  }

  /// Cache-fused read of one page of the photo feed.
  ///
  /// Serves the cached page first, refreshes from the remote when the page
  /// is missing, stale, or `refresh` is set, and re-emits the local state
  /// after the call settles.
  pub fn photos(
    &self,
    page: u32,
    per_page: u32,
    refresh: bool,
  ) -> BoxStream<'static, CachedResult<Vec<Photo>, BasicError>> {
    let key = PhotoQueryKey::Page { page, per_page };
    let store = self.store_for::<Vec<Photo>>(&key);
    let client = self.client.clone();

    let fetch_store = Arc::clone(&store);
    let probe_store = Arc::clone(&store);
    let stale_after = self.stale_after;

    self.handler.handle_with_cache(
      move || fetch_store.watch(),
      move |local: Option<&Vec<Photo>>| {
        if refresh || local.is_none() {
          return true;
        }
        match probe_store.cached_at() {
          Some(at) => Utc::now() - at > stale_after,
          None => true,
        }
      },
      move || async move { client.list_photos(page, per_page).await },
      move |photos: Vec<Photo>| async move { store.save(&photos).await },
    )
  }

  /// Cache-fused read of a single photo.
  pub fn photo(
    &self,
    id: &str,
    refresh: bool,
  ) -> BoxStream<'static, CachedResult<Photo, BasicError>> {
    let key = PhotoQueryKey::Photo { id: id.to_string() };
    let store = self.store_for::<Photo>(&key);
    let client = self.client.clone();
    let id = id.to_string();

    let fetch_store = Arc::clone(&store);
    let probe_store = Arc::clone(&store);
    let stale_after = self.stale_after;

    self.handler.handle_with_cache(
      move || fetch_store.watch(),
      move |local: Option<&Photo>| {
        if refresh || local.is_none() {
          return true;
        }
        match probe_store.cached_at() {
          Some(at) => Utc::now() - at > stale_after,
          None => true,
        }
      },
      move || async move { client.get_photo(&id).await },
      move |photo: Photo| async move { store.save(&photo).await },
    )
  }

  /// The store slot backing one query key, or a cold in-memory slot when
  /// caching is disabled.
  fn store_for<T>(&self, key: &PhotoQueryKey) -> Arc<dyn LocalStore<T>>
  where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
  {
    match &self.store {
      Some(db) => Arc::new(db.record_store::<T>(key)),
      None => Arc::new(MemoryStore::new()),
    }
  }
}
