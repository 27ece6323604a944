//! Unsplash API data model.

use serde::{Deserialize, Serialize};

use crate::net::ErrorMapper;

/// A photo as returned by the photos endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
  pub id: String,
  pub color: String,
  pub created_at: String,
  pub description: Option<String>,
  pub alt_description: Option<String>,
  pub blur_hash: Option<String>,
  pub width: u32,
  pub height: u32,
  #[serde(default)]
  pub views: i64,
  pub urls: PhotoUrls,
  pub links: PhotoLinks,
  pub user: User,
}

impl Photo {
  /// Best available caption: description, alt text, or nothing.
  pub fn caption(&self) -> Option<&str> {
    self
      .description
      .as_deref()
      .or(self.alt_description.as_deref())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrls {
  pub raw: String,
  pub full: String,
  pub regular: String,
  pub small: String,
  pub thumb: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoLinks {
  pub portfolio: Option<String>,
  pub photos: Option<String>,
  pub download: Option<String>,
  pub download_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub username: String,
  pub name: String,
  pub bio: Option<String>,
  pub portfolio_url: Option<String>,
  pub twitter_username: Option<String>,
  pub instagram_username: Option<String>,
  #[serde(default)]
  pub total_photos: i64,
  #[serde(default)]
  pub total_likes: i64,
  #[serde(default)]
  pub total_collections: i64,
  pub profile_image: Option<ProfileImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileImage {
  pub small: String,
  pub medium: String,
  pub large: String,
}

/// Error body shape used by the Unsplash API: a bare list of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicError {
  pub errors: Vec<String>,
}

impl ErrorMapper for BasicError {
  fn map_error(&self) -> Option<String> {
    let joined = self.errors.join(", ");
    if joined.trim().is_empty() {
      None
    } else {
      Some(joined)
    }
  }
}
