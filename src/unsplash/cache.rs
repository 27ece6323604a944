//! Cache keys for Unsplash queries.

use sha2::{Digest, Sha256};

use crate::store::QueryKey;

/// Query key types for cached Unsplash calls.
#[derive(Clone, Debug)]
pub enum PhotoQueryKey {
  /// One page of the editorial photo feed
  Page { page: u32, per_page: u32 },
  /// A single photo by id
  Photo { id: String },
}

impl QueryKey for PhotoQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Page { page, per_page } => format!("photos:{}:{}", page, per_page),
      Self::Photo { id } => format!("photo:{}", id.trim()),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::Page { page, per_page } => format!("photo feed page {} ({} per page)", page, per_page),
      Self::Photo { id } => format!("photo {}", id),
    }
  }
}
