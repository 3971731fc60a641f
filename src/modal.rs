//! Movie details dialog: open/close lifecycle, focus trap, and result settling.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::announcer::Announcer;
use crate::focus::{self, FocusId, FocusRegistry};
use crate::omdb::{FetchError, MovieDetails};

pub const OPENED_ANNOUNCEMENT: &str = "Movie details dialog opened";
pub const CLOSED_ANNOUNCEMENT: &str = "Dialog closed";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load movie details";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModalState {
  #[default]
  Closed,
  Loading {
    id: String,
  },
  ShowingDetails(Arc<MovieDetails>),
  Error {
    id: String,
    message: String,
  },
}

/// Owns the dialog state. Fetching is the caller's job: `open` and `retry`
/// say which id to load and `settle` applies the result.
#[derive(Debug, Default)]
pub struct ModalController {
  state: ModalState,
  /// Control that had focus before the dialog opened. Only an id, looked up
  /// again on close.
  previous_focus: Option<FocusId>,
  scroll_locked: bool,
}

impl ModalController {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> &ModalState {
    &self.state
  }

  pub fn is_open(&self) -> bool {
    !matches!(self.state, ModalState::Closed)
  }

  pub fn is_scroll_locked(&self) -> bool {
    self.scroll_locked
  }

  /// Id currently being loaded, if any
  pub fn loading_id(&self) -> Option<&str> {
    match &self.state {
      ModalState::Loading { id } => Some(id),
      _ => None,
    }
  }

  /// Open the dialog for `id` in its loading state. The caller starts the fetch.
  pub fn open(&mut self, id: &str, focus: &mut FocusRegistry, announcer: &mut Announcer) {
    let was_open = self.is_open();
    if !was_open {
      self.previous_focus = focus.focused().cloned();
    }

    focus.unregister(&FocusId::ModalRetry);
    focus.register(FocusId::ModalClose);
    focus.focus(&FocusId::ModalClose);
    self.scroll_locked = true;
    self.state = ModalState::Loading { id: id.to_string() };

    if !was_open {
      announcer.announce(OPENED_ANNOUNCEMENT);
    }
  }

  /// Apply a details result. Returns false when it is not for the id being loaded.
  pub fn settle(
    &mut self,
    id: &str,
    result: Result<Arc<MovieDetails>, FetchError>,
    focus: &mut FocusRegistry,
  ) -> bool {
    if self.loading_id() != Some(id) {
      debug!("dropping stale details for {}", id);
      return false;
    }

    match result {
      Ok(details) => {
        self.state = ModalState::ShowingDetails(details);
      }
      Err(e) => {
        warn!("loading details for {} failed: {}", id, e);
        self.state = ModalState::Error {
          id: id.to_string(),
          message: LOAD_FAILED_MESSAGE.to_string(),
        };
        focus.register(FocusId::ModalRetry);
      }
    }
    true
  }

  /// From the error state, go back to loading the same id. Returns the id to fetch.
  pub fn retry(&mut self, focus: &mut FocusRegistry) -> Option<String> {
    let id = match &self.state {
      ModalState::Error { id, .. } => id.clone(),
      _ => return None,
    };
    focus.unregister(&FocusId::ModalRetry);
    focus.focus(&FocusId::ModalClose);
    self.state = ModalState::Loading { id: id.clone() };
    Some(id)
  }

  pub fn close(&mut self, focus: &mut FocusRegistry, announcer: &mut Announcer) {
    if !self.is_open() {
      return;
    }

    focus.unregister(&FocusId::ModalClose);
    focus.unregister(&FocusId::ModalRetry);
    if let Some(previous) = self.previous_focus.take() {
      if !focus.focus(&previous) {
        debug!("previously focused {:?} is gone", previous);
      }
    }

    self.scroll_locked = false;
    self.state = ModalState::Closed;
    announcer.announce(CLOSED_ANNOUNCEMENT);
  }

  /// Controls inside the dialog, in Tab order.
  pub fn focusables(&self) -> Vec<FocusId> {
    match self.state {
      ModalState::Closed => Vec::new(),
      ModalState::Error { .. } => vec![FocusId::ModalClose, FocusId::ModalRetry],
      _ => vec![FocusId::ModalClose],
    }
  }

  /// Tab / Shift-Tab while open. Focus never leaves the dialog.
  pub fn trap_tab(&self, backwards: bool, focus: &mut FocusRegistry) {
    let inside = self.focusables();
    let current = focus.focused().filter(|id| inside.contains(id));
    if let Some(next) = focus::step(&inside, current, backwards) {
      focus.focus(&next);
    }
  }
}
