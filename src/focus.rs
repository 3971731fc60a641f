//! Focus tracking for the terminal page.
//!
//! Ids are registered in Tab order as the page renders. Only registered ids
//! can take focus; anything else is ignored.

/// A focusable control
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FocusId {
  SearchInput,
  /// Details button of a movie card
  Card(String),
  ModalClose,
  ModalRetry,
}

#[derive(Debug, Default)]
pub struct FocusRegistry {
  order: Vec<FocusId>,
  current: Option<FocusId>,
}

impl FocusRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append `id` to the Tab order. Registering twice keeps the first position.
  pub fn register(&mut self, id: FocusId) {
    if !self.order.contains(&id) {
      self.order.push(id);
    }
  }

  /// Remove `id`. If it had focus, nothing has focus afterwards.
  pub fn unregister(&mut self, id: &FocusId) {
    self.order.retain(|registered| registered != id);
    if self.current.as_ref() == Some(id) {
      self.current = None;
    }
  }

  /// Swap in a new set of cards, in page order, between the search input and
  /// the dialog controls. Focus survives if its card is still on the page.
  pub fn replace_cards(&mut self, cards: impl IntoIterator<Item = FocusId>) {
    let (search, rest): (Vec<FocusId>, Vec<FocusId>) = std::mem::take(&mut self.order)
      .into_iter()
      .partition(|id| *id == FocusId::SearchInput);
    self.order = search;
    for id in cards {
      if matches!(id, FocusId::Card(_)) {
        self.register(id);
      }
    }
    for id in rest {
      if !matches!(id, FocusId::Card(_)) {
        self.register(id);
      }
    }
    if let Some(current) = &self.current {
      if !self.order.contains(current) {
        self.current = None;
      }
    }
  }

  pub fn contains(&self, id: &FocusId) -> bool {
    self.order.contains(id)
  }

  /// Move focus to `id`. Returns false, leaving focus alone, when it is not registered.
  pub fn focus(&mut self, id: &FocusId) -> bool {
    if !self.contains(id) {
      return false;
    }
    self.current = Some(id.clone());
    true
  }

  pub fn focused(&self) -> Option<&FocusId> {
    self.current.as_ref()
  }

  pub fn is_focused(&self, id: &FocusId) -> bool {
    self.current.as_ref() == Some(id)
  }

  /// Tab through the whole page, wrapping at both ends.
  pub fn cycle(&mut self, backwards: bool) {
    if let Some(next) = step(&self.order, self.current.as_ref(), backwards) {
      self.current = Some(next);
    }
  }
}

/// The id after (or before) `current` in `ids`, wrapping first and last.
/// With nothing focused, forward lands on the first id and backward on the last.
pub fn step(ids: &[FocusId], current: Option<&FocusId>, backwards: bool) -> Option<FocusId> {
  if ids.is_empty() {
    return None;
  }
  let last = ids.len() - 1;
  let position = current.and_then(|c| ids.iter().position(|id| id == c));
  let index = match (position, backwards) {
    (None, false) => 0,
    (None, true) => last,
    (Some(i), false) if i == last => 0,
    (Some(i), false) => i + 1,
    (Some(0), true) => last,
    (Some(i), true) => i - 1,
  };
  Some(ids[index].clone())
}
