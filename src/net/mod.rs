//! Outbound HTTP seam.
//!
//! Everything that talks to the network goes through a `Transport`. The real
//! implementation is `HttpTransport`; the offline worker wraps a transport and
//! is itself one, so it sees every outgoing request.

mod http;
mod types;

pub use http::HttpTransport;
pub use types::{Destination, Headers, Method, Request, Response};

use futures::future::BoxFuture;

/// Failure to obtain any response at all.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
  /// Connection refused, DNS failure, timeout, body read failure.
  #[error("network error: {0}")]
  Network(String),
  /// The request could not be built.
  #[error("invalid request: {0}")]
  InvalidRequest(String),
}

/// Something that turns a request into a response.
///
/// A non-2xx status is still a response; only failing to get one is an error.
pub trait Transport: Send + Sync {
  fn fetch(&self, request: Request) -> BoxFuture<'static, Result<Response, NetError>>;
}
