//! Cache keys and cached payloads for OMDb calls.

use std::sync::Arc;

use super::types::{MovieDetails, MovieSummary};

// ============================================================================
// Query key types
// ============================================================================

/// Query key types for OMDb API calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OmdbQueryKey {
  /// Title search, one page of results
  Search { query: String, page: u32 },
  /// Single movie by IMDb id
  Details { id: String },
}

impl OmdbQueryKey {
  /// Key under which the result is stored in the page cache.
  ///
  /// The query is used verbatim: "Batman" and "batman" are separate entries,
  /// the provider itself being case-insensitive is not assumed.
  pub fn cache_key(&self) -> String {
    match self {
      Self::Search { query, page } => format!("search-{}-{}", query, page),
      Self::Details { id } => format!("details-{}", id),
    }
  }

  /// Human-readable description for logs.
  pub fn description(&self) -> String {
    match self {
      Self::Search { query, page } if *page > 1 => format!("search \"{}\" page {}", query, page),
      Self::Search { query, .. } => format!("search \"{}\"", query),
      Self::Details { id } => format!("details {}", id),
    }
  }
}

// ============================================================================
// Cached payloads
// ============================================================================

/// What the page cache stores: search pages and detail records share one map.
#[derive(Debug, Clone)]
pub enum CachedPayload {
  Search(Vec<Arc<MovieSummary>>),
  Details(Arc<MovieDetails>),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_search_key() {
    let key = OmdbQueryKey::Search {
      query: "batman".to_string(),
      page: 1,
    };
    assert_eq!(key.cache_key(), "search-batman-1");
    assert_eq!(key.description(), "search \"batman\"");
  }

  #[test]
  fn test_details_key() {
    let key = OmdbQueryKey::Details {
      id: "tt0372784".to_string(),
    };
    assert_eq!(key.cache_key(), "details-tt0372784");
  }

  #[test]
  fn test_page_is_part_of_key() {
    let first = OmdbQueryKey::Search {
      query: "batman".to_string(),
      page: 1,
    };
    let second = OmdbQueryKey::Search {
      query: "batman".to_string(),
      page: 2,
    };
    assert_ne!(first.cache_key(), second.cache_key());
    assert_eq!(second.description(), "search \"batman\" page 2");
  }

  #[test]
  fn test_search_and_details_keys_never_collide() {
    let search = OmdbQueryKey::Search {
      query: "details".to_string(),
      page: 1,
    };
    let details = OmdbQueryKey::Details {
      id: "1".to_string(),
    };
    assert_ne!(search.cache_key(), details.cache_key());
  }
}
