use std::collections::HashMap;
use std::sync::Arc;

/// Summary of a movie for list views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieSummary {
  pub id: String,
  pub title: String,
  pub year: Option<String>,
  pub kind: Option<String>,
  /// None when the provider has no poster
  pub poster_url: Option<String>,
}

/// Full movie details
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovieDetails {
  pub id: String,
  pub title: String,
  pub year: Option<String>,
  pub kind: Option<String>,
  pub poster_url: Option<String>,
  pub plot: Option<String>,
  pub ratings: Vec<Rating>,
  pub director: Option<String>,
  pub actors: Option<String>,
  pub genre: Option<String>,
  pub runtime: Option<String>,
  pub rated: Option<String>,
  pub released: Option<String>,
}

/// One review score, e.g. "Rotten Tomatoes" / "85%"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
  pub source: String,
  pub value: String,
}

/// Every summary rendered this session, by id.
///
/// Detail requests are resolved through this index. Entries share the `Arc`s
/// the result lists hold; later renders overwrite earlier ones.
#[derive(Debug, Default)]
pub struct MovieIndex {
  movies: HashMap<String, Arc<MovieSummary>>,
}

impl MovieIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_all<'a>(&mut self, movies: impl IntoIterator<Item = &'a Arc<MovieSummary>>) {
    for movie in movies {
      self.movies.insert(movie.id.clone(), Arc::clone(movie));
    }
  }

  pub fn get(&self, id: &str) -> Option<&Arc<MovieSummary>> {
    self.movies.get(id)
  }

  pub fn len(&self) -> usize {
    self.movies.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn summary(id: &str, title: &str) -> Arc<MovieSummary> {
    Arc::new(MovieSummary {
      id: id.to_string(),
      title: title.to_string(),
      year: None,
      kind: None,
      poster_url: None,
    })
  }

  #[test]
  fn test_index_overwrites_by_id() {
    let mut index = MovieIndex::new();
    index.insert_all(&[summary("tt1", "Old"), summary("tt2", "Other")]);
    index.insert_all(&[summary("tt1", "New")]);

    assert_eq!(index.len(), 2);
    assert_eq!(index.get("tt1").map(|m| m.title.as_str()), Some("New"));
    assert!(index.get("tt3").is_none());
  }
}
