//! Unsplash API client wrapper.

use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::net::ApiFault;

use super::types::Photo;

/// Thin remote caller over the Unsplash HTTP API.
///
/// Every operation resolves to the expected value or to an [`ApiFault`] - the
/// three fault shapes classification understands. Responses with a
/// non-success status keep their body bytes so the error shape can be
/// decoded downstream.
#[derive(Clone)]
pub struct UnsplashClient {
  http: reqwest::Client,
  base_url: Url,
  access_key: Option<String>,
}

impl UnsplashClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&normalize_base_url(&config.unsplash.base_url))
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.unsplash.base_url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("shutter/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      access_key: Config::access_key(),
    })
  }

  /// Fetch one random photo.
  pub async fn random_photo(&self) -> Result<Photo, ApiFault> {
    self.get_json("photos/random", &[]).await
  }

  /// Fetch one page of the editorial photo feed.
  pub async fn list_photos(&self, page: u32, per_page: u32) -> Result<Vec<Photo>, ApiFault> {
    self
      .get_json(
        "photos",
        &[("page", page.to_string()), ("per_page", per_page.to_string())],
      )
      .await
  }

  /// Fetch a single photo by id.
  pub async fn get_photo(&self, id: &str) -> Result<Photo, ApiFault> {
    self.get_json(&format!("photos/{}", id), &[]).await
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ApiFault> {
    let url = self.base_url.join(path).map_err(|e| ApiFault::Io {
      detail: format!("invalid request URL: {}", e),
    })?;

    let mut request = self.http.get(url);
    if let Some(key) = &self.access_key {
      request = request.header("Authorization", format!("Client-ID {}", key));
    }
    if !query.is_empty() {
      request = request.query(query);
    }

    let response = request.send().await.map_err(ApiFault::from_transport)?;

    let status = response.status();
    if !status.is_success() {
      let body = response.bytes().await.unwrap_or_default().to_vec();
      return Err(ApiFault::Http {
        status: status.as_u16(),
        body,
      });
    }

    let body = response.bytes().await.map_err(ApiFault::from_transport)?;
    serde_json::from_slice(&body).map_err(ApiFault::from_decode)
  }
}

/// `Url::join` drops the last path segment when the base has no trailing
/// slash, which would silently rewrite `/napi` into `/photos`.
fn normalize_base_url(base: &str) -> String {
  if base.ends_with('/') {
    base.to_string()
  } else {
    format!("{}/", base)
  }
}
