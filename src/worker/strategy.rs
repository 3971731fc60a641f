//! Cache-first and network-first request handling.
//!
//! Neither strategy fails: when both network and cache come up empty the
//! caller gets a synthetic response instead.

use chrono::{TimeZone, Utc};
use tracing::{debug, warn};

use crate::cache::is_expired;
use crate::net::{Destination, Request, Response};
use crate::render::markup::render_offline_page;

use super::WorkerCore;

/// Header stamped on stored API responses, epoch milliseconds.
pub const CACHED_AT_HEADER: &str = "sw-cached-at";

fn offline() -> Response {
  Response::text(503, "Service Unavailable", "Offline")
}

fn cache_expired() -> Response {
  Response::text(503, "Cache Expired", "Cache expired")
}

/// Serve from any cache; otherwise fetch and keep a 2xx copy in the static cache.
pub(super) async fn cache_first(core: &WorkerCore, request: Request) -> Response {
  if let Some(hit) = core.lookup(&request) {
    debug!("cache-first hit: {}", request.url);
    return hit;
  }

  match core.network.fetch(request.clone()).await {
    Ok(response) => {
      if response.is_ok() {
        core.put(&core.names.static_cache, &request, &response);
      }
      response
    }
    Err(e) => {
      warn!("cache-first fetch of {} failed: {}", request.url, e);
      if request.destination == Destination::Document {
        if let Some(page) = core.offline_document() {
          return page;
        }
      }
      offline()
    }
  }
}

/// Fetch first; fall back to the caches only when the network is unreachable.
pub(super) async fn network_first(core: &WorkerCore, request: Request) -> Response {
  let is_api = core.classifier.is_api(&request.url);

  match core.network.fetch(request.clone()).await {
    Ok(response) => {
      if response.is_ok() {
        if is_api {
          let mut stamped = response.clone();
          stamped.headers.insert(
            CACHED_AT_HEADER.to_string(),
            core.clock.now().timestamp_millis().to_string(),
          );
          core.put(&core.names.api_cache, &request, &stamped);
        } else {
          core.put(&core.names.static_cache, &request, &response);
        }
      }
      response
    }
    Err(e) => {
      warn!("network-first fetch of {} failed, trying cache: {}", request.url, e);

      if let Some(hit) = core.lookup(&request) {
        if is_api && core.is_stale(&hit) {
          debug!("cached API response for {} is past its TTL", request.url);
          return cache_expired();
        }
        return hit;
      }

      if request.destination == Destination::Document {
        return Response::html(200, &render_offline_page());
      }
      offline()
    }
  }
}

impl WorkerCore {
  /// Whether a stored API response carries a timestamp older than the TTL.
  /// Responses without a readable stamp are served as they are.
  pub(super) fn is_stale(&self, response: &Response) -> bool {
    response
      .header(CACHED_AT_HEADER)
      .and_then(|v| v.parse::<i64>().ok())
      .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
      .map(|stored_at| is_expired(stored_at, self.clock.now(), self.api_ttl))
      .unwrap_or(false)
  }
}
