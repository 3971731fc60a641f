//! Markup rendering and lazy image loading.

pub mod lazy;
pub mod markup;

pub use lazy::{Bounds, ImageState, LazyImages};
