//! Request classification: which caching strategy handles a URL.

use url::{Origin, Url};

const STATIC_EXTENSIONS: &[&str] = &[".html", ".css", ".js", ".woff", ".woff2", ".ttf"];
const STATIC_ORIGINS: &[&str] = &["https://fonts.googleapis.com", "https://fonts.gstatic.com"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];
const IMAGE_HOST: &str = "media-amazon.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  Static,
  Api,
  Image,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  CacheFirst,
  NetworkFirst,
}

impl RequestClass {
  pub fn strategy(self) -> Strategy {
    match self {
      RequestClass::Static | RequestClass::Image => Strategy::CacheFirst,
      RequestClass::Api | RequestClass::Other => Strategy::NetworkFirst,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Classifier {
  api_origin: Origin,
}

impl Classifier {
  /// `api_base` is the movie API's base URL; only its origin matters.
  pub fn new(api_base: &Url) -> Self {
    Self {
      api_origin: api_base.origin(),
    }
  }

  /// Checks run in priority order: static, API, image, everything else.
  pub fn classify(&self, url: &Url) -> RequestClass {
    if is_static(url) {
      RequestClass::Static
    } else if self.is_api(url) {
      RequestClass::Api
    } else if is_image(url) {
      RequestClass::Image
    } else {
      RequestClass::Other
    }
  }

  pub fn is_api(&self, url: &Url) -> bool {
    url.origin() == self.api_origin
  }
}

fn is_static(url: &Url) -> bool {
  let path = url.path();
  STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    || STATIC_ORIGINS
      .iter()
      .any(|origin| url.origin().ascii_serialization() == *origin)
}

fn is_image(url: &Url) -> bool {
  let path = url.path().to_ascii_lowercase();
  let by_extension = path
    .rsplit_once('.')
    .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
    .unwrap_or(false);
  by_extension
    || url
      .host_str()
      .map(|host| host.contains(IMAGE_HOST))
      .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn classify(url: &str) -> RequestClass {
    let classifier = Classifier::new(&Url::parse("https://www.omdbapi.com/").unwrap());
    classifier.classify(&Url::parse(url).unwrap())
  }

  #[test]
  fn test_static_resources() {
    assert_eq!(classify("https://moviedeck.app/styles.css"), RequestClass::Static);
    assert_eq!(classify("https://moviedeck.app/index.html"), RequestClass::Static);
    assert_eq!(classify("https://moviedeck.app/font.woff2"), RequestClass::Static);
    assert_eq!(
      classify("https://fonts.googleapis.com/css2?family=Inter"),
      RequestClass::Static
    );
    assert_eq!(
      classify("https://fonts.gstatic.com/s/inter/v1/x"),
      RequestClass::Static
    );
  }

  #[test]
  fn test_api_origin() {
    assert_eq!(
      classify("https://www.omdbapi.com/?apikey=k&s=batman"),
      RequestClass::Api
    );
    // Different scheme is a different origin
    assert_eq!(classify("http://www.omdbapi.com/?s=x"), RequestClass::Other);
  }

  #[test]
  fn test_static_wins_over_api() {
    assert_eq!(classify("https://www.omdbapi.com/app.js"), RequestClass::Static);
  }

  #[test]
  fn test_images() {
    assert_eq!(classify("https://example.com/poster.JPG"), RequestClass::Image);
    assert_eq!(classify("https://example.com/a/b.webp"), RequestClass::Image);
    assert_eq!(
      classify("https://m.media-amazon.com/images/M/abc@._V1_SX300"),
      RequestClass::Image
    );
  }

  #[test]
  fn test_other() {
    assert_eq!(classify("https://example.com/api/data"), RequestClass::Other);
    assert_eq!(classify("https://example.com/jpg"), RequestClass::Other);
  }

  #[test]
  fn test_strategies() {
    assert_eq!(RequestClass::Static.strategy(), Strategy::CacheFirst);
    assert_eq!(RequestClass::Image.strategy(), Strategy::CacheFirst);
    assert_eq!(RequestClass::Api.strategy(), Strategy::NetworkFirst);
    assert_eq!(RequestClass::Other.strategy(), Strategy::NetworkFirst);
  }
}
