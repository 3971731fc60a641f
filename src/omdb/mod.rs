//! OMDb movie database: API types, normalization, and the cached client.

pub mod api_types;
pub mod cache;
pub mod client;
pub mod error;
pub mod types;

pub use cache::CachedPayload;
pub use client::OmdbClient;
pub use error::FetchError;
pub use types::{MovieDetails, MovieIndex, MovieSummary, Rating};
