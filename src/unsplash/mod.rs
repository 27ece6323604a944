//! Unsplash API integration: data model, remote caller and repository.

mod cache;
mod client;
mod repository;
mod types;

pub use cache::PhotoQueryKey;
pub use client::UnsplashClient;
pub use repository::PhotoRepository;
pub use types::{BasicError, Photo, PhotoLinks, PhotoUrls, ProfileImage, User};
