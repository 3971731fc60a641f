//! Error types for the fetch client.

/// Errors that can occur when fetching from the movie database.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  /// The provider answered but reported no results or an unknown id.
  #[error("{0}")]
  NotFound(String),
  /// Non-2xx status, network failure, or a body that could not be read.
  #[error("transport error: {0}")]
  Transport(String),
}

impl FetchError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, FetchError::NotFound(_))
  }
}

impl From<crate::net::NetError> for FetchError {
  fn from(e: crate::net::NetError) -> Self {
    FetchError::Transport(e.to_string())
  }
}
