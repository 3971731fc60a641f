//! One-shot commands that print rendered markup instead of starting the browser.

use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CategoryConfig;
use crate::modal::LOAD_FAILED_MESSAGE;
use crate::omdb::{FetchError, MovieSummary, OmdbClient};
use crate::render::markup::{
  render_details, render_error, render_grid, render_page, render_status,
};
use crate::search::NO_RESULTS_MESSAGE;

/// Search `query` and write the results as a standalone HTML page.
pub async fn export(
  client: &OmdbClient,
  title: &str,
  query: &str,
  page: u32,
  out: &mut dyn Write,
) -> Result<()> {
  let body = match client.search_movies(query, page.max(1)).await {
    Ok(movies) => {
      info!("exporting {} movies for \"{}\"", movies.len(), query);
      render_grid(&movies)
    }
    Err(FetchError::NotFound(message)) => {
      warn!("no results for \"{}\": {}", query, message);
      render_status(NO_RESULTS_MESSAGE)
    }
    Err(e) => return Err(eyre!("Search for \"{}\" failed: {}", query, e)),
  };

  let sections = [(format!("Results for \"{}\"", query), body)];
  out.write_all(render_page(title, &sections).as_bytes())?;
  Ok(())
}

/// Write the home page: one section per category. A category that fails to
/// load gets an error box instead of failing the export.
pub async fn export_home(
  client: &OmdbClient,
  title: &str,
  categories: &[CategoryConfig],
  out: &mut dyn Write,
) -> Result<()> {
  let mut sections = Vec::with_capacity(categories.len());
  for category in categories {
    let body = match client.search_movies(&category.query, 1).await {
      Ok(movies) => render_grid(&movies),
      Err(FetchError::NotFound(_)) => render_grid::<Arc<MovieSummary>>(&[]),
      Err(e) => {
        warn!("loading {} failed: {}", category.query, e);
        render_error(&format!("Failed to load {}", category.query), false)
      }
    };
    sections.push((category.title.clone(), body));
  }
  out.write_all(render_page(title, &sections).as_bytes())?;
  Ok(())
}

/// Fetch one movie and write its details panel: title line, then description
/// and info markup.
pub async fn details(client: &OmdbClient, id: &str, out: &mut dyn Write) -> Result<()> {
  let movie = match client.fetch_details(id).await {
    Ok(movie) => movie,
    Err(e) => {
      write!(out, "{}", render_error(LOAD_FAILED_MESSAGE, false))?;
      return Err(eyre!("Loading details for {} failed: {}", id, e));
    }
  };
  let markup = render_details(&movie);
  writeln!(out, "{}", markup.title)?;
  writeln!(out)?;
  write!(out, "{}", markup.description)?;
  writeln!(out)?;
  write!(out, "{}", markup.info)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::TtlCache;
  use crate::clock;
  use crate::net::testing::FakeTransport;
  use url::Url;

  fn client(transport: &FakeTransport) -> OmdbClient {
    OmdbClient::new(
      Arc::new(transport.clone()),
      Url::parse("https://www.omdbapi.com/").unwrap(),
      "k".to_string(),
      Arc::new(TtlCache::new(crate::cache::default_ttl(), clock::system())),
    )
  }

  #[tokio::test]
  async fn test_export_escapes_titles() {
    let transport = FakeTransport::new();
    transport.respond_json(
      200,
      r#"{"Search":[{"Title":"<script>alert(1)</script>","Year":"1999","imdbID":"tt1","Type":"movie","Poster":"N/A"}],"Response":"True"}"#,
    );
    let mut out = Vec::new();
    export(&client(&transport), "moviedeck", "script", 1, &mut out)
      .await
      .unwrap();

    let html = String::from_utf8(out).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<script>alert"));
    assert!(html.contains("/api/placeholder/250/350"));
  }

  #[tokio::test]
  async fn test_export_without_matches_renders_status() {
    let transport = FakeTransport::new();
    transport.respond_json(200, r#"{"Response":"False","Error":"Movie not found!"}"#);
    let mut out = Vec::new();
    export(&client(&transport), "moviedeck", "zzzz", 1, &mut out)
      .await
      .unwrap();
    assert!(String::from_utf8(out)
      .unwrap()
      .contains("No movie found. Try another search."));
  }

  #[tokio::test]
  async fn test_export_home_keeps_going_after_a_failed_category() {
    let transport = FakeTransport::new();
    transport
      .fail()
      .respond_json(200, r#"{"Response":"False","Error":"Movie not found!"}"#);
    let categories = vec![
      CategoryConfig {
        title: "Popular".to_string(),
        query: "batman".to_string(),
      },
      CategoryConfig {
        title: "Comedy".to_string(),
        query: "comedy".to_string(),
      },
    ];
    let mut out = Vec::new();
    export_home(&client(&transport), "moviedeck", &categories, &mut out)
      .await
      .unwrap();

    let html = String::from_utf8(out).unwrap();
    assert!(html.contains("<h2>Popular</h2>"));
    assert!(html.contains("Failed to load batman"));
    assert!(html.contains("<h2>Comedy</h2>"));
    assert!(html.contains("No movies found."));
  }

  #[tokio::test]
  async fn test_export_network_failure_is_error() {
    let transport = FakeTransport::new();
    transport.fail();
    let mut out = Vec::new();
    assert!(export(&client(&transport), "moviedeck", "batman", 1, &mut out)
      .await
      .is_err());
    assert!(out.is_empty());
  }

  #[tokio::test]
  async fn test_details_prints_title_and_info() {
    let transport = FakeTransport::new();
    transport.respond_json(
      200,
      r#"{"Title":"Heat","Year":"1995","imdbID":"tt0113277","Poster":"N/A","Plot":"N/A","Director":"Michael Mann","Response":"True"}"#,
    );
    let mut out = Vec::new();
    details(&client(&transport), "tt0113277", &mut out)
      .await
      .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Heat (1995)\n"));
    assert!(text.contains("Plot not available."));
    assert!(text.contains("Michael Mann"));
    assert!(text.contains("/api/placeholder/300/450"));
  }

  #[tokio::test]
  async fn test_details_failure_prints_error_box() {
    let transport = FakeTransport::new();
    transport.fail();
    let mut out = Vec::new();
    assert!(details(&client(&transport), "tt0113277", &mut out)
      .await
      .is_err());
    assert!(String::from_utf8(out)
      .unwrap()
      .contains("Failed to load movie details"));
  }
}
