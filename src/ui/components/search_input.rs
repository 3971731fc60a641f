use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub const PLACEHOLDER: &str = "Search for movies...";

/// Events emitted by the search box that the app needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Query text changed
  Changed(String),
  /// Enter pressed
  Submitted,
  /// Escape pressed; the box has been emptied
  Cleared,
}

/// The always-visible search box at the top of the page
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Handle a key while the box has focus
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    match self.input.handle_key(key) {
      InputResult::Edited => KeyResult::Event(SearchEvent::Changed(self.query().to_string())),
      InputResult::Moved => KeyResult::Handled,
      InputResult::Submitted(_) => KeyResult::Event(SearchEvent::Submitted),
      InputResult::Cancelled => {
        self.input.clear();
        KeyResult::Event(SearchEvent::Cleared)
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool, busy: bool) {
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border))
      .title(if busy { " Search (loading) " } else { " Search " });
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
      return;
    }

    let line = if self.input.is_empty() && !focused {
      Line::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
      let (before, after): (String, String) = {
        let cursor = self.input.cursor_position();
        let chars: Vec<char> = self.query().chars().collect();
        (
          chars[..cursor].iter().collect(),
          chars[cursor..].iter().collect(),
        )
      };
      let mut spans = vec![
        Span::styled("/", Style::default().fg(Color::Yellow)),
        Span::raw(before),
      ];
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
      spans.push(Span::raw(after));
      Line::from(spans)
    };
    frame.render_widget(Paragraph::new(line), inner);
  }
}
