//! Time-bounded caching shared by the fetch client and the offline worker.
//!
//! This module provides:
//! - `TtlCache`, an unbounded key/value store whose entries expire after a fixed TTL
//! - `is_expired`, the single freshness rule both cache tiers agree on

mod ttl;

pub use ttl::TtlCache;

use chrono::{DateTime, Duration, Utc};

/// Default time-to-live for every cached entry, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 5 * 60;

/// Default time-to-live as a chrono duration.
pub fn default_ttl() -> Duration {
  Duration::seconds(DEFAULT_TTL_SECS as i64)
}

/// Check whether something stored at `stored_at` is past its TTL at `now`.
///
/// An entry is valid iff `now - stored_at < ttl`.
pub fn is_expired(stored_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
  now - stored_at >= ttl
}
