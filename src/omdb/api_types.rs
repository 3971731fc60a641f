//! Serde-deserializable types matching OMDb API responses.
//!
//! These types are separate from domain types: the provider's `"N/A"` sentinel
//! and its loose field presence are dealt with here, once, so the rest of the
//! app only ever sees `Option`.

use serde::Deserialize;
use std::sync::Arc;

use super::types::{MovieDetails, MovieSummary, Rating};

/// The provider's marker for "no value".
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Envelopes
// ============================================================================

/// Search endpoint response: `{Response, Search?, Error?}`
#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(rename = "Response", default)]
  pub response: String,
  #[serde(rename = "Search", default)]
  pub search: Vec<ApiMovieSummary>,
  #[serde(rename = "Error")]
  pub error: Option<String>,
}

/// Details endpoint response: a flat movie object plus the same discriminator.
#[derive(Debug, Deserialize)]
pub struct ApiDetailsResponse {
  #[serde(rename = "Response", default)]
  pub response: String,
  #[serde(rename = "Error")]
  pub error: Option<String>,
  #[serde(flatten)]
  pub movie: ApiMovieDetails,
}

/// Whether an envelope reports success. Anything but `"False"` counts.
pub fn is_success(response: &str) -> bool {
  !response.eq_ignore_ascii_case("false")
}

// ============================================================================
// Movie records
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiMovieSummary {
  #[serde(rename = "imdbID", default)]
  pub imdb_id: String,
  #[serde(rename = "Title", default)]
  pub title: String,
  #[serde(rename = "Year")]
  pub year: Option<String>,
  #[serde(rename = "Type")]
  pub kind: Option<String>,
  #[serde(rename = "Poster")]
  pub poster: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRating {
  #[serde(rename = "Source", default)]
  pub source: String,
  #[serde(rename = "Value", default)]
  pub value: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiMovieDetails {
  #[serde(rename = "imdbID", default)]
  pub imdb_id: String,
  #[serde(rename = "Title", default)]
  pub title: String,
  #[serde(rename = "Year")]
  pub year: Option<String>,
  #[serde(rename = "Type")]
  pub kind: Option<String>,
  #[serde(rename = "Poster")]
  pub poster: Option<String>,
  #[serde(rename = "Plot")]
  pub plot: Option<String>,
  #[serde(rename = "Ratings", default)]
  pub ratings: Vec<ApiRating>,
  #[serde(rename = "Director")]
  pub director: Option<String>,
  #[serde(rename = "Actors")]
  pub actors: Option<String>,
  #[serde(rename = "Genre")]
  pub genre: Option<String>,
  #[serde(rename = "Runtime")]
  pub runtime: Option<String>,
  #[serde(rename = "Rated")]
  pub rated: Option<String>,
  #[serde(rename = "Released")]
  pub released: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiMovieSummary {
  pub fn into_summary(self) -> Arc<MovieSummary> {
    Arc::new(MovieSummary {
      id: self.imdb_id,
      title: self.title,
      year: present(self.year),
      kind: present(self.kind),
      poster_url: present(self.poster),
    })
  }
}

impl ApiMovieDetails {
  pub fn into_details(self) -> MovieDetails {
    MovieDetails {
      id: self.imdb_id,
      title: self.title,
      year: present(self.year),
      kind: present(self.kind),
      poster_url: present(self.poster),
      plot: present(self.plot),
      ratings: self
        .ratings
        .into_iter()
        .filter(|r| !r.source.is_empty() && present_str(&r.value).is_some())
        .map(|r| Rating {
          source: r.source,
          value: r.value,
        })
        .collect(),
      director: present(self.director),
      actors: present(self.actors),
      genre: present(self.genre),
      runtime: present(self.runtime),
      rated: present(self.rated),
      released: present(self.released),
    }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Treat `"N/A"`, empty and whitespace-only strings as absent.
fn present(value: Option<String>) -> Option<String> {
  value.filter(|v| present_str(v).is_some())
}

fn present_str(value: &str) -> Option<&str> {
  let trimmed = value.trim();
  if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
    None
  } else {
    Some(value)
  }
}
