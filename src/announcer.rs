//! Polite live region shown in the status line.

use std::time::Duration;
use tokio::time::Instant;

/// How long an announcement stays up
pub const ANNOUNCEMENT_TTL: Duration = Duration::from_secs(3);

/// Holds at most one announcement. A new one replaces the old one and restarts
/// the clear timer; `tick` clears it once the timer runs out.
#[derive(Debug, Default)]
pub struct Announcer {
  current: Option<(String, Instant)>,
}

impl Announcer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn announce(&mut self, message: impl Into<String>) {
    let message = message.into();
    tracing::debug!("announce: {}", message);
    self.current = Some((message, Instant::now()));
  }

  pub fn message(&self) -> Option<&str> {
    self.current.as_ref().map(|(message, _)| message.as_str())
  }

  pub fn tick(&mut self) {
    if let Some((_, at)) = &self.current {
      if at.elapsed() >= ANNOUNCEMENT_TTL {
        self.current = None;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_cleared_after_three_seconds() {
    let mut announcer = Announcer::new();
    announcer.announce("Dialog closed");

    tokio::time::advance(Duration::from_millis(2999)).await;
    announcer.tick();
    assert_eq!(announcer.message(), Some("Dialog closed"));

    tokio::time::advance(Duration::from_millis(1)).await;
    announcer.tick();
    assert_eq!(announcer.message(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_newer_announcement_restarts_timer() {
    let mut announcer = Announcer::new();
    announcer.announce("first");
    tokio::time::advance(Duration::from_secs(2)).await;
    announcer.announce("second");

    tokio::time::advance(Duration::from_secs(2)).await;
    announcer.tick();
    assert_eq!(announcer.message(), Some("second"));

    tokio::time::advance(Duration::from_secs(1)).await;
    announcer.tick();
    assert_eq!(announcer.message(), None);
  }
}
