use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::cache::TtlCache;
use crate::net::{Request, Transport};

use super::api_types::{is_success, ApiDetailsResponse, ApiMovieSummary, ApiSearchResponse};
use super::cache::{CachedPayload, OmdbQueryKey};
use super::error::FetchError;
use super::types::{MovieDetails, MovieSummary};

const DEFAULT_NOT_FOUND: &str = "Movie not found!";
const DEFAULT_DETAILS_NOT_FOUND: &str = "Details not found!";

/// OMDb API client with a shared page cache.
///
/// Successful responses populate the cache; failures never do, so a failed
/// lookup goes back to the network on the next call.
#[derive(Clone)]
pub struct OmdbClient {
  transport: Arc<dyn Transport>,
  base_url: Url,
  api_key: String,
  cache: Arc<TtlCache<CachedPayload>>,
}

impl OmdbClient {
  pub fn new(
    transport: Arc<dyn Transport>,
    base_url: Url,
    api_key: String,
    cache: Arc<TtlCache<CachedPayload>>,
  ) -> Self {
    Self {
      transport,
      base_url,
      api_key,
      cache,
    }
  }

  /// Search movies by title, one page at a time (pages start at 1).
  pub async fn search_movies(
    &self,
    query: &str,
    page: u32,
  ) -> Result<Vec<Arc<MovieSummary>>, FetchError> {
    let key = OmdbQueryKey::Search {
      query: query.to_string(),
      page,
    };

    if let Some(CachedPayload::Search(movies)) = self.cache.get(&key.cache_key()) {
      debug!("cache hit: {}", key.description());
      return Ok(movies);
    }
    debug!("cache miss: {}", key.description());

    let page = page.to_string();
    let url = self.url(&[("s", query), ("page", page.as_str())]);
    let response: ApiSearchResponse = self.get(url, &key).await?;

    if !is_success(&response.response) {
      let message = response
        .error
        .unwrap_or_else(|| DEFAULT_NOT_FOUND.to_string());
      debug!("{}: {}", key.description(), message);
      return Err(FetchError::NotFound(message));
    }

    let movies: Vec<Arc<MovieSummary>> = response
      .search
      .into_iter()
      .map(ApiMovieSummary::into_summary)
      .collect();

    self
      .cache
      .set(key.cache_key(), CachedPayload::Search(movies.clone()));
    Ok(movies)
  }

  /// Get full details for one movie by IMDb id.
  pub async fn fetch_details(&self, id: &str) -> Result<Arc<MovieDetails>, FetchError> {
    let key = OmdbQueryKey::Details { id: id.to_string() };

    if let Some(CachedPayload::Details(details)) = self.cache.get(&key.cache_key()) {
      debug!("cache hit: {}", key.description());
      return Ok(details);
    }
    debug!("cache miss: {}", key.description());

    let url = self.url(&[("i", id), ("plot", "full")]);
    let response: ApiDetailsResponse = self.get(url, &key).await?;

    if !is_success(&response.response) {
      let message = response
        .error
        .unwrap_or_else(|| DEFAULT_DETAILS_NOT_FOUND.to_string());
      debug!("{}: {}", key.description(), message);
      return Err(FetchError::NotFound(message));
    }

    let details = Arc::new(response.movie.into_details());
    self
      .cache
      .set(key.cache_key(), CachedPayload::Details(Arc::clone(&details)));
    Ok(details)
  }

  fn url(&self, params: &[(&str, &str)]) -> Url {
    let mut url = self.base_url.clone();
    {
      let mut pairs = url.query_pairs_mut();
      pairs.append_pair("apikey", &self.api_key);
      for (name, value) in params {
        pairs.append_pair(name, value);
      }
    }
    url
  }

  async fn get<T: DeserializeOwned>(&self, url: Url, key: &OmdbQueryKey) -> Result<T, FetchError> {
    let response = self.transport.fetch(Request::get(url)).await.map_err(|e| {
      warn!("{} failed: {}", key.description(), e);
      FetchError::from(e)
    })?;

    if !response.is_ok() {
      warn!(
        "{} failed with status {} {}",
        key.description(),
        response.status,
        response.status_text
      );
      return Err(FetchError::Transport(format!(
        "HTTP {}: {}",
        response.status, response.status_text
      )));
    }

    serde_json::from_slice::<T>(&response.body).map_err(|e| {
      warn!("{} returned a malformed body: {}", key.description(), e);
      FetchError::Transport(format!("malformed response: {}", e))
    })
  }
}

impl std::fmt::Debug for OmdbClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OmdbClient")
      .field("base_url", &self.base_url.as_str())
      .field("cache", &self.cache)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::default_ttl;
  use crate::clock::ManualClock;
  use crate::net::testing::FakeTransport;
  use chrono::{Duration, Utc};

  const BATMAN: &str = r#"{"Search":[{"Title":"Batman Begins","Year":"2005","imdbID":"tt0372784","Type":"movie","Poster":"N/A"}],"totalResults":"1","Response":"True"}"#;
  const NOT_FOUND: &str = r#"{"Response":"False","Error":"Movie not found!"}"#;
  const DETAILS: &str = r#"{"Title":"Batman Begins","Year":"2005","Director":"Christopher Nolan","Ratings":[{"Source":"Internet Movie Database","Value":"8.2/10"}],"imdbID":"tt0372784","Type":"movie","Response":"True"}"#;

  fn client(transport: &FakeTransport) -> (OmdbClient, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    let cache = Arc::new(TtlCache::new(default_ttl(), Arc::new(clock.clone())));
    let client = OmdbClient::new(
      Arc::new(transport.clone()),
      Url::parse("https://www.omdbapi.com/").unwrap(),
      "secret".to_string(),
      cache,
    );
    (client, clock)
  }

  #[tokio::test]
  async fn test_search_builds_request() {
    let transport = FakeTransport::new();
    transport.respond_json(200, BATMAN);
    let (client, _) = client(&transport);

    let movies = client.search_movies("the dark knight", 2).await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "Batman Begins");
    assert_eq!(movies[0].poster_url, None);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let pairs: Vec<(String, String)> = requests[0]
      .url
      .query_pairs()
      .map(|(k, v)| (k.into_owned(), v.into_owned()))
      .collect();
    assert_eq!(
      pairs,
      vec![
        ("apikey".to_string(), "secret".to_string()),
        ("s".to_string(), "the dark knight".to_string()),
        ("page".to_string(), "2".to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn test_search_served_from_cache_within_ttl() {
    let transport = FakeTransport::new();
    transport.respond_json(200, BATMAN);
    let (client, clock) = client(&transport);

    client.search_movies("batman", 1).await.unwrap();
    clock.advance(Duration::minutes(4));
    client.search_movies("batman", 1).await.unwrap();
    assert_eq!(transport.request_count(), 1);

    clock.advance(Duration::minutes(2));
    client.search_movies("batman", 1).await.unwrap();
    assert_eq!(transport.request_count(), 2);
  }

  #[tokio::test]
  async fn test_not_found_preserves_message_and_is_not_cached() {
    let transport = FakeTransport::new();
    transport.respond_json(200, NOT_FOUND);
    let (client, _) = client(&transport);

    let err = client.search_movies("zzzz", 1).await.unwrap_err();
    assert_eq!(err, FetchError::NotFound("Movie not found!".to_string()));
    assert!(err.is_not_found());

    // The failed lookup goes back to the network
    let _ = client.search_movies("zzzz", 1).await;
    assert_eq!(transport.request_count(), 2);
  }

  #[tokio::test]
  async fn test_not_found_without_message() {
    let transport = FakeTransport::new();
    transport.respond_json(200, r#"{"Response":"False"}"#);
    let (client, _) = client(&transport);

    let err = client.search_movies("zzzz", 1).await.unwrap_err();
    assert_eq!(err, FetchError::NotFound(DEFAULT_NOT_FOUND.to_string()));
  }

  #[tokio::test]
  async fn test_http_error_is_transport() {
    let transport = FakeTransport::new();
    transport.respond_json(503, "Offline");
    let (client, _) = client(&transport);

    let err = client.search_movies("batman", 1).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(ref m) if m.contains("503")));
  }

  #[tokio::test]
  async fn test_network_failure_is_transport_and_retried() {
    let transport = FakeTransport::new();
    transport.fail();
    transport.respond_json(200, BATMAN);
    let (client, _) = client(&transport);

    let err = client.search_movies("batman", 1).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));

    let movies = client.search_movies("batman", 1).await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(transport.request_count(), 2);
  }

  #[tokio::test]
  async fn test_malformed_body_is_transport() {
    let transport = FakeTransport::new();
    transport.respond_json(200, "{not valid json}");
    let (client, _) = client(&transport);

    let err = client.search_movies("batman", 1).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(ref m) if m.starts_with("malformed")));
  }

  #[tokio::test]
  async fn test_details_cached_separately() {
    let transport = FakeTransport::new();
    transport.respond_json(200, DETAILS);
    let (client, _) = client(&transport);

    let details = client.fetch_details("tt0372784").await.unwrap();
    assert_eq!(details.director.as_deref(), Some("Christopher Nolan"));
    assert_eq!(details.ratings.len(), 1);

    let again = client.fetch_details("tt0372784").await.unwrap();
    assert_eq!(again, details);
    assert_eq!(transport.request_count(), 1);

    let url = &transport.requests()[0].url;
    assert!(url.query_pairs().any(|(k, v)| k == "i" && v == "tt0372784"));
    assert!(url.query_pairs().any(|(k, v)| k == "plot" && v == "full"));
  }

  #[tokio::test]
  async fn test_details_unknown_id() {
    let transport = FakeTransport::new();
    transport.respond_json(200, r#"{"Response":"False","Error":"Incorrect IMDb ID."}"#);
    let (client, _) = client(&transport);

    let err = client.fetch_details("nope").await.unwrap_err();
    assert_eq!(err, FetchError::NotFound("Incorrect IMDb ID.".to_string()));
  }
}
