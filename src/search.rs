//! Debounced live search.
//!
//! Every keystroke supersedes the previous one: it bumps a generation counter,
//! aborts the armed timer and arms a new one. Timer fires and fetch results
//! come back to the event loop as `SearchUpdate`s tagged with the generation
//! they were started for, and anything older than the current generation is
//! dropped on the floor.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::Event;
use crate::omdb::{FetchError, MovieSummary, OmdbClient};

/// Shown when a search fails for any reason.
pub const NO_RESULTS_MESSAGE: &str = "No movie found. Try another search.";

/// The state of the search session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchState {
  /// Nothing to show
  #[default]
  Idle,
  /// Timer armed for `query`
  Pending { query: String },
  /// Fetch in flight for `query`
  Loading { query: String },
  /// Results for `query`
  Results {
    query: String,
    movies: Vec<Arc<MovieSummary>>,
  },
  /// The last search failed
  Error { query: String, message: String },
}

/// Messages posted back to the event loop by debounce timers and fetches.
#[derive(Debug)]
pub enum SearchUpdate {
  /// The quiet period for `generation` elapsed
  Fire { generation: u64, query: String },
  /// The fetch for `generation` settled
  Settled {
    generation: u64,
    query: String,
    result: Result<Vec<Arc<MovieSummary>>, FetchError>,
  },
}

/// What the caller has to react to after a search settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
  Found { query: String, count: usize },
  Failed { query: String, error: FetchError },
}

impl SearchOutcome {
  /// Text for the screen-reader announcement, if any.
  pub fn announcement(&self) -> Option<String> {
    match self {
      SearchOutcome::Found { query, count } => {
        let plural = if *count == 1 { "" } else { "s" };
        Some(format!("{} movie{} found for \"{}\"", count, plural, query))
      }
      SearchOutcome::Failed { .. } => None,
    }
  }
}

/// Search debouncer: turns keystrokes into at most one fetch per quiet period.
pub struct SearchDebouncer {
  client: OmdbClient,
  tx: mpsc::UnboundedSender<Event>,
  delay: Duration,
  min_len: usize,
  generation: u64,
  timer: Option<JoinHandle<()>>,
  state: SearchState,
}

impl SearchDebouncer {
  pub fn new(
    client: OmdbClient,
    tx: mpsc::UnboundedSender<Event>,
    delay: Duration,
    min_len: usize,
  ) -> Self {
    Self {
      client,
      tx,
      delay,
      min_len,
      generation: 0,
      timer: None,
      state: SearchState::Idle,
    }
  }

  pub fn state(&self) -> &SearchState {
    &self.state
  }

  /// The loader is visible from the first qualifying keystroke until the fetch settles.
  pub fn is_loading(&self) -> bool {
    matches!(
      self.state,
      SearchState::Pending { .. } | SearchState::Loading { .. }
    )
  }

  pub fn results(&self) -> Option<&[Arc<MovieSummary>]> {
    match &self.state {
      SearchState::Results { movies, .. } => Some(movies),
      _ => None,
    }
  }

  /// Status line message for a failed search.
  pub fn status_message(&self) -> Option<&str> {
    match &self.state {
      SearchState::Error { .. } => Some(NO_RESULTS_MESSAGE),
      _ => None,
    }
  }

  /// Handle the input's new value after a keystroke.
  pub fn input(&mut self, value: &str) {
    self.supersede();

    let query = value.trim();
    if query.chars().count() < self.min_len {
      self.state = SearchState::Idle;
      return;
    }

    let query = query.to_string();
    let generation = self.generation;
    let delay = self.delay;
    let tx = self.tx.clone();
    let fired = query.clone();
    self.timer = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let _ = tx.send(Event::Search(SearchUpdate::Fire {
        generation,
        query: fired,
      }));
    }));
    self.state = SearchState::Pending { query };
  }

  /// Hide results and forget whatever is pending or in flight.
  pub fn clear(&mut self) {
    self.supersede();
    self.state = SearchState::Idle;
  }

  /// Apply a timer fire or fetch completion. Stale updates are ignored.
  pub fn handle(&mut self, update: SearchUpdate) -> Option<SearchOutcome> {
    match update {
      SearchUpdate::Fire { generation, query } => {
        if generation != self.generation {
          debug!("dropping stale debounce timer for \"{}\"", query);
          return None;
        }
        self.timer = None;
        self.start_fetch(query);
        None
      }
      SearchUpdate::Settled {
        generation,
        query,
        result,
      } => {
        if generation != self.generation {
          debug!("dropping stale results for \"{}\"", query);
          return None;
        }
        match result {
          Ok(movies) => {
            let count = movies.len();
            self.state = SearchState::Results {
              query: query.clone(),
              movies,
            };
            Some(SearchOutcome::Found { query, count })
          }
          Err(error) => {
            self.state = SearchState::Error {
              query: query.clone(),
              message: error.to_string(),
            };
            Some(SearchOutcome::Failed { query, error })
          }
        }
      }
    }
  }

  fn start_fetch(&mut self, query: String) {
    let generation = self.generation;
    let client = self.client.clone();
    let tx = self.tx.clone();
    self.state = SearchState::Loading {
      query: query.clone(),
    };

    tokio::spawn(async move {
      let result = client.search_movies(&query, 1).await;
      // Ignore send errors - the loop may be shutting down
      let _ = tx.send(Event::Search(SearchUpdate::Settled {
        generation,
        query,
        result,
      }));
    });
  }

  /// Invalidate the armed timer and any fetch still in flight.
  fn supersede(&mut self) {
    self.generation += 1;
    if let Some(timer) = self.timer.take() {
      timer.abort();
    }
  }
}

impl Drop for SearchDebouncer {
  fn drop(&mut self) {
    if let Some(timer) = self.timer.take() {
      timer.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{default_ttl, TtlCache};
  use crate::clock;
  use crate::net::testing::{FakeTransport, Reply};
  use crate::net::Response;
  use url::Url;

  const BAT: &str = r#"{"Search":[{"Title":"Bat","Year":"2001","imdbID":"tt1","Type":"movie","Poster":"N/A"},{"Title":"Bat 2","Year":"2003","imdbID":"tt2","Type":"movie","Poster":"N/A"}],"Response":"True"}"#;
  const ONE: &str = r#"{"Search":[{"Title":"Superman","Year":"1978","imdbID":"tt3","Type":"movie","Poster":"N/A"}],"Response":"True"}"#;

  fn debouncer(transport: &FakeTransport) -> (SearchDebouncer, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = OmdbClient::new(
      Arc::new(transport.clone()),
      Url::parse("https://www.omdbapi.com/").unwrap(),
      "key".to_string(),
      Arc::new(TtlCache::new(default_ttl(), clock::system())),
    );
    (
      SearchDebouncer::new(client, tx, Duration::from_millis(300), 2),
      rx,
    )
  }

  async fn next_update(rx: &mut mpsc::UnboundedReceiver<Event>) -> SearchUpdate {
    match rx.recv().await {
      Some(Event::Search(update)) => update,
      other => panic!("expected a search update, got {:?}", other),
    }
  }

  fn searched_for(transport: &FakeTransport) -> Vec<String> {
    transport
      .requests()
      .iter()
      .filter_map(|r| {
        r.url
          .query_pairs()
          .find(|(k, _)| k == "s")
          .map(|(_, v)| v.into_owned())
      })
      .collect()
  }

  #[tokio::test(start_paused = true)]
  async fn test_rapid_keystrokes_fetch_once_for_last_query() {
    let transport = FakeTransport::new();
    transport.respond_json(200, BAT);
    let (mut search, mut rx) = debouncer(&transport);

    search.input("b");
    assert_eq!(search.state(), &SearchState::Idle);
    tokio::time::sleep(Duration::from_millis(100)).await;
    search.input("ba");
    tokio::time::sleep(Duration::from_millis(100)).await;
    search.input("bat");
    assert!(search.is_loading());

    let fire = next_update(&mut rx).await;
    assert!(matches!(fire, SearchUpdate::Fire { ref query, .. } if query == "bat"));
    assert_eq!(search.handle(fire), None);
    assert_eq!(
      search.state(),
      &SearchState::Loading {
        query: "bat".to_string()
      }
    );

    let settled = next_update(&mut rx).await;
    let outcome = search.handle(settled).unwrap();
    assert_eq!(
      outcome,
      SearchOutcome::Found {
        query: "bat".to_string(),
        count: 2
      }
    );
    assert_eq!(
      outcome.announcement().as_deref(),
      Some("2 movies found for \"bat\"")
    );
    assert_eq!(search.results().map(|r| r.len()), Some(2));
    assert!(!search.is_loading());

    assert_eq!(searched_for(&transport), vec!["bat".to_string()]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_timer_waits_for_quiet_period() {
    let transport = FakeTransport::new();
    transport.respond_json(200, BAT);
    let (mut search, _rx) = debouncer(&transport);

    search.input("bat");
    tokio::time::sleep(Duration::from_millis(299)).await;
    assert_eq!(transport.request_count(), 0);
    assert!(matches!(search.state(), SearchState::Pending { .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn test_short_query_cancels_pending_timer() {
    let transport = FakeTransport::new();
    transport.respond_json(200, BAT);
    let (mut search, mut rx) = debouncer(&transport);

    search.input("bat");
    search.input("b");
    assert_eq!(search.state(), &SearchState::Idle);
    assert!(!search.is_loading());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(transport.request_count(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_whitespace_is_trimmed() {
    let transport = FakeTransport::new();
    transport.respond_json(200, BAT);
    let (mut search, _rx) = debouncer(&transport);

    search.input(" a ");
    assert_eq!(search.state(), &SearchState::Idle);

    search.input("  bat  ");
    assert_eq!(
      search.state(),
      &SearchState::Pending {
        query: "bat".to_string()
      }
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_results_do_not_overwrite_newer_query() {
    let transport = FakeTransport::new();
    let mut slow = Response::new(200, BAT.as_bytes().to_vec());
    slow
      .headers
      .insert("content-type".to_string(), "application/json".to_string());
    transport.push(Reply::Delayed(Duration::from_secs(2), slow));
    transport.respond_json(200, ONE);
    let (mut search, mut rx) = debouncer(&transport);

    // First query fires and its fetch hangs for a while
    search.input("bat");
    let fire = next_update(&mut rx).await;
    search.handle(fire);
    assert!(matches!(search.state(), SearchState::Loading { .. }));

    // A newer query supersedes it while it is in flight
    search.input("superman");
    let mut outcomes = Vec::new();
    while outcomes.len() < 2 {
      let update = next_update(&mut rx).await;
      let is_settled = matches!(update, SearchUpdate::Settled { .. });
      let outcome = search.handle(update);
      if is_settled {
        outcomes.push(outcome);
      }
    }

    // Exactly one of the two settlements was applied, and it was superman's
    assert_eq!(outcomes.iter().filter(|o| o.is_some()).count(), 1);
    match search.state() {
      SearchState::Results { query, movies } => {
        assert_eq!(query, "superman");
        assert_eq!(movies[0].title, "Superman");
      }
      other => panic!("unexpected state {:?}", other),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_failure_shows_status_message() {
    let transport = FakeTransport::new();
    transport.respond_json(200, r#"{"Response":"False","Error":"Movie not found!"}"#);
    let (mut search, mut rx) = debouncer(&transport);

    search.input("zzzz");
    let fire = next_update(&mut rx).await;
    search.handle(fire);
    let settled = next_update(&mut rx).await;
    let outcome = search.handle(settled).unwrap();

    assert!(matches!(outcome, SearchOutcome::Failed { ref error, .. } if error.is_not_found()));
    assert_eq!(outcome.announcement(), None);
    assert_eq!(search.status_message(), Some(NO_RESULTS_MESSAGE));
    assert!(search.results().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_discards_in_flight_results() {
    let transport = FakeTransport::new();
    transport.respond_json(200, BAT);
    let (mut search, mut rx) = debouncer(&transport);

    search.input("bat");
    let fire = next_update(&mut rx).await;
    search.handle(fire);
    search.clear();

    let settled = next_update(&mut rx).await;
    assert_eq!(search.handle(settled), None);
    assert_eq!(search.state(), &SearchState::Idle);
  }

  #[test]
  fn test_singular_announcement() {
    let outcome = SearchOutcome::Found {
      query: "superman".to_string(),
      count: 1,
    };
    assert_eq!(
      outcome.announcement().as_deref(),
      Some("1 movie found for \"superman\"")
    );
  }
}
