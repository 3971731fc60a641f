//! Deferred poster loading.
//!
//! Images are registered hidden with only a pending source. When an image's
//! bounds intersect the viewport grown by the root margin, its source is
//! handed out for loading and it stops being observed. Once the load finishes
//! it becomes visible.

use std::collections::HashMap;

/// Default distance outside the viewport at which loading starts
pub const DEFAULT_ROOT_MARGIN: i32 = 50;

/// Axis-aligned rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

impl Bounds {
  pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn expand(&self, margin: i32) -> Self {
    Self {
      x: self.x - margin,
      y: self.y - margin,
      width: self.width + 2 * margin,
      height: self.height + 2 * margin,
    }
  }

  pub fn intersects(&self, other: &Bounds) -> bool {
    self.x < other.x + other.width
      && other.x < self.x + self.width
      && self.y < other.y + other.height
      && other.y < self.y + self.height
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
  /// Hidden, waiting to come near the viewport
  Pending,
  /// Source assigned, load in progress
  Loading,
  /// Loaded and shown
  Visible,
}

#[derive(Debug)]
struct LazyImage {
  src: String,
  state: ImageState,
}

/// Lazy image tracker keyed by image id.
#[derive(Debug)]
pub struct LazyImages {
  /// None when intersection observing is unavailable
  root_margin: Option<i32>,
  images: HashMap<String, LazyImage>,
}

impl Default for LazyImages {
  fn default() -> Self {
    Self::new(DEFAULT_ROOT_MARGIN)
  }
}

impl LazyImages {
  pub fn new(root_margin: i32) -> Self {
    Self {
      root_margin: Some(root_margin),
      images: HashMap::new(),
    }
  }

  /// Tracker without intersection observing: every image loads on registration.
  pub fn eager() -> Self {
    Self {
      root_margin: None,
      images: HashMap::new(),
    }
  }

  /// Register an image. Returns the source to load right away in eager mode.
  /// Images already known keep their state.
  pub fn register(&mut self, key: impl Into<String>, src: impl Into<String>) -> Option<String> {
    let key = key.into();
    if self.images.contains_key(&key) {
      return None;
    }

    let src = src.into();
    let state = match self.root_margin {
      Some(_) => ImageState::Pending,
      None => ImageState::Loading,
    };
    let load = (state == ImageState::Loading).then(|| src.clone());
    self.images.insert(key, LazyImage { src, state });
    load
  }

  /// Check observed images against the viewport. Returns `(key, src)` for every
  /// image that starts loading now.
  pub fn observe<'a>(
    &mut self,
    viewport: Bounds,
    positions: impl IntoIterator<Item = (&'a str, Bounds)>,
  ) -> Vec<(String, String)> {
    let Some(margin) = self.root_margin else {
      return Vec::new();
    };
    let root = viewport.expand(margin);

    let mut started = Vec::new();
    for (key, bounds) in positions {
      if let Some(image) = self.images.get_mut(key) {
        if image.state == ImageState::Pending && root.intersects(&bounds) {
          image.state = ImageState::Loading;
          started.push((key.to_string(), image.src.clone()));
        }
      }
    }
    started
  }

  /// The load for `key` finished.
  pub fn loaded(&mut self, key: &str) {
    if let Some(image) = self.images.get_mut(key) {
      if image.state == ImageState::Loading {
        image.state = ImageState::Visible;
      }
    }
  }

  /// The load for `key` failed; observe it again.
  pub fn failed(&mut self, key: &str) {
    if let Some(image) = self.images.get_mut(key) {
      if image.state == ImageState::Loading && self.root_margin.is_some() {
        image.state = ImageState::Pending;
      }
    }
  }

  pub fn state(&self, key: &str) -> Option<ImageState> {
    self.images.get(key).map(|image| image.state)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn viewport() -> Bounds {
    Bounds::new(0, 0, 100, 40)
  }

  #[test]
  fn test_image_outside_margin_stays_pending() {
    let mut images = LazyImages::default();
    assert_eq!(images.register("a", "a.jpg"), None);
    let started = images.observe(viewport(), [("a", Bounds::new(0, 91, 10, 10))]);
    assert!(started.is_empty());
    assert_eq!(images.state("a"), Some(ImageState::Pending));
  }

  #[test]
  fn test_image_within_margin_starts_loading_once() {
    let mut images = LazyImages::default();
    images.register("a", "a.jpg");

    // 40 + 50 = 90, so y 89 is inside the grown viewport
    let below = Bounds::new(0, 89, 10, 10);
    let started = images.observe(viewport(), [("a", below)]);
    assert_eq!(started, vec![("a".to_string(), "a.jpg".to_string())]);
    assert_eq!(images.state("a"), Some(ImageState::Loading));

    assert!(images.observe(viewport(), [("a", below)]).is_empty());

    images.loaded("a");
    assert_eq!(images.state("a"), Some(ImageState::Visible));
  }

  #[test]
  fn test_failed_load_is_observed_again() {
    let mut images = LazyImages::default();
    images.register("a", "a.jpg");
    images.observe(viewport(), [("a", Bounds::new(0, 0, 10, 10))]);
    images.failed("a");
    assert_eq!(images.state("a"), Some(ImageState::Pending));
  }

  #[test]
  fn test_eager_loads_on_register() {
    let mut images = LazyImages::eager();
    assert_eq!(images.register("a", "a.jpg"), Some("a.jpg".to_string()));
    assert_eq!(images.state("a"), Some(ImageState::Loading));
    assert!(images
      .observe(viewport(), [("a", Bounds::new(0, 0, 1, 1))])
      .is_empty());
  }

  #[test]
  fn test_register_twice_keeps_state() {
    let mut images = LazyImages::default();
    images.register("a", "a.jpg");
    images.observe(viewport(), [("a", Bounds::new(0, 0, 10, 10))]);
    images.loaded("a");
    assert_eq!(images.register("a", "a.jpg"), None);
    assert_eq!(images.state("a"), Some(ImageState::Visible));
  }

  #[test]
  fn test_touching_edges_do_not_intersect() {
    let a = Bounds::new(0, 0, 10, 10);
    assert!(!a.intersects(&Bounds::new(10, 0, 5, 5)));
    assert!(a.intersects(&Bounds::new(9, 9, 5, 5)));
  }
}
