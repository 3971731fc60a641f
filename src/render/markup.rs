//! HTML fragments for movie records.
//!
//! Every value that came from the provider goes through `escape_html` before
//! it is placed in markup, in text and in attributes alike.

use crate::omdb::{MovieDetails, MovieSummary, Rating};

pub const CARD_PLACEHOLDER: &str = "/api/placeholder/250/350";
pub const DETAILS_PLACEHOLDER: &str = "/api/placeholder/300/450";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_PLOT: &str = "Plot not available.";
pub const NO_RATINGS: &str = "Ratings not available";
pub const NO_MOVIES: &str = "No movies found.";

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(c),
    }
  }
  escaped
}

fn or_na(value: Option<&str>) -> &str {
  value.unwrap_or(NOT_AVAILABLE)
}

/// Card for a result grid. The poster is left for the lazy loader: it only has
/// a `data-src` and starts transparent.
pub fn render_card(movie: &MovieSummary) -> String {
  let poster = movie.poster_url.as_deref().unwrap_or(CARD_PLACEHOLDER);
  let title = escape_html(&movie.title);
  let year = escape_html(or_na(movie.year.as_deref()));
  let kind = escape_html(movie.kind.as_deref().unwrap_or("movie"));

  format!(
    r#"<article class="movie-card" role="listitem">
  <img class="movie-poster" data-src="{poster}" alt="{title} ({year}) - Movie poster" loading="lazy" style="opacity: 0">
  <div class="movie-info">
    <h3 class="movie-title">{title}</h3>
    <div class="movie-meta">
      <span class="movie-year">{year}</span>
      <span class="movie-type">{kind}</span>
    </div>
    <button type="button" class="details-button" data-movie-id="{id}" aria-label="View details for {title}">View Details</button>
  </div>
</article>
"#,
    poster = escape_html(poster),
    title = title,
    year = year,
    kind = kind,
    id = escape_html(&movie.id),
  )
}

/// Cards for every movie, or a "no movies" paragraph for an empty list.
pub fn render_grid<M: AsRef<MovieSummary>>(movies: &[M]) -> String {
  if movies.is_empty() {
    return format!(r#"<p class="no-results">{}</p>"#, NO_MOVIES);
  }
  movies.iter().map(|m| render_card(m.as_ref())).collect()
}

pub fn render_ratings(ratings: &[Rating]) -> String {
  if ratings.is_empty() {
    return format!("<p>{}</p>", NO_RATINGS);
  }
  ratings
    .iter()
    .map(|rating| {
      format!(
        "<div class=\"rating-item\"><strong>{}:</strong> <span>{}</span></div>\n",
        escape_html(&rating.source),
        escape_html(&rating.value)
      )
    })
    .collect()
}

/// The three parts of the details dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsMarkup {
  /// Plain text, set as the dialog heading's text content
  pub title: String,
  /// Poster, plot and ratings
  pub description: String,
  /// Director, cast, genre, runtime, rating and release date
  pub info: String,
}

pub fn details_title(movie: &MovieDetails) -> String {
  format!("{} ({})", movie.title, or_na(movie.year.as_deref()))
}

pub fn render_details(movie: &MovieDetails) -> DetailsMarkup {
  let poster = movie.poster_url.as_deref().unwrap_or(DETAILS_PLACEHOLDER);
  let description = format!(
    r#"<img src="{poster}" alt="{title} - Official poster" class="movie-poster-large" onerror="this.src='{placeholder}'">
<div class="movie-description">
  <p class="movie-plot">{plot}</p>
  <div class="movie-ratings" aria-label="Movie ratings">
{ratings}  </div>
</div>
"#,
    poster = escape_html(poster),
    title = escape_html(&movie.title),
    placeholder = DETAILS_PLACEHOLDER,
    plot = escape_html(movie.plot.as_deref().unwrap_or(NO_PLOT)),
    ratings = render_ratings(&movie.ratings),
  );

  let info = info_rows(movie)
    .iter()
    .map(|(label, value)| {
      format!(
        "<div class=\"info-item\">\n  <div class=\"info-label\">{}</div>\n  <div class=\"info-value\">{}</div>\n</div>\n",
        label,
        escape_html(value)
      )
    })
    .collect();

  DetailsMarkup {
    title: details_title(movie),
    description,
    info,
  }
}

/// Label / value pairs of the info panel, with absent values as "N/A".
pub fn info_rows(movie: &MovieDetails) -> [(&'static str, &str); 6] {
  [
    ("Director", or_na(movie.director.as_deref())),
    ("Cast", or_na(movie.actors.as_deref())),
    ("Genre", or_na(movie.genre.as_deref())),
    ("Runtime", or_na(movie.runtime.as_deref())),
    ("Rated", or_na(movie.rated.as_deref())),
    ("Released", or_na(movie.released.as_deref())),
  ]
}

/// Error box. With `retry` it carries a retry button.
pub fn render_error(message: &str, retry: bool) -> String {
  let button = if retry {
    "  <button type=\"button\" class=\"retry-button\" data-action=\"retry\">Try Again</button>\n"
  } else {
    ""
  };
  format!(
    "<div class=\"error-message\" role=\"alert\">\n  <p>{}</p>\n{}</div>\n",
    escape_html(message),
    button
  )
}

pub fn render_status(message: &str) -> String {
  format!(
    r#"<div class="status-message">{}</div>"#,
    escape_html(message)
  )
}

/// Standalone document with one titled section per grid.
pub fn render_page(title: &str, sections: &[(String, String)]) -> String {
  let body: String = sections
    .iter()
    .map(|(heading, grid)| {
      format!(
        "<section class=\"movie-section\">\n<h2>{}</h2>\n<div class=\"movie-grid\" role=\"list\">\n{}</div>\n</section>\n",
        escape_html(heading),
        grid
      )
    })
    .collect();

  format!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
</head>
<body>
<main>
{body}</main>
<div aria-live="polite" aria-atomic="true" class="sr-only" id="announcements"></div>
</body>
</html>
"#,
    title = escape_html(title),
    body = body
  )
}

/// Page served to document requests when there is neither network nor cache.
pub fn render_offline_page() -> String {
  r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>moviedeck - Offline</title>
</head>
<body>
<div class="offline-container">
  <h1 class="offline-title">You are offline</h1>
  <p class="offline-message">Could not connect to the internet. Check your connection and try again.</p>
  <button class="retry-button" onclick="window.location.reload()">Try Again</button>
</div>
</body>
</html>
"#
  .to_string()
}
