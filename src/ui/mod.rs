pub mod components;
pub mod renderfns;
pub mod views;

use crate::app::App;
use crate::focus::FocusId;
use crate::worker::ACTION_OPEN;
use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub use renderfns::contains;
use views::ModalLayout;

/// Screen regions from the last draw, for mouse hit-testing and scrolling
#[derive(Debug, Clone, Default)]
pub struct FrameLayout {
  pub search: Rect,
  pub content: Rect,
  /// Screen row of every visible card
  pub cards: Vec<(u16, FocusId)>,
  pub modal: Option<ModalLayout>,
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) -> FrameLayout {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(3), // Search box
      Constraint::Min(1),    // Page
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let loading = app
    .categories()
    .iter()
    .filter(|row| row.query.is_loading())
    .count();
  let mut cache_status = format!(
    "{} movies │ offline cache {}",
    app.index().len(),
    if app.has_worker() { "on" } else { "off" }
  );
  if loading > 0 {
    cache_status.push_str(&format!(" │ loading {} rows", loading));
  }
  renderfns::draw_header(frame, chunks[0], app.title(), &cache_status);

  app.search_input().render(
    frame,
    chunks[1],
    app.focus().is_focused(&FocusId::SearchInput),
    app.search().is_loading(),
  );

  let lines = views::page_lines(app);
  let cards = views::draw_page(frame, chunks[2], app, &lines, app.scroll());

  draw_status_bar(frame, chunks[3], app);

  let modal = views::draw_modal(
    frame,
    frame.area(),
    app.modal().state(),
    app.focus(),
    app.index(),
  );

  FrameLayout {
    search: chunks[1],
    content: chunks[2],
    cards,
    modal,
  }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let line = if let Some(message) = app.announcer().message() {
    Line::from(Span::styled(
      format!(" {}", message),
      Style::default().fg(Color::Green),
    ))
  } else if let Some(notification) = app.notification() {
    let mut spans = vec![
      Span::styled(
        format!(" {} ", notification.arrived_at.with_timezone(&Local).format("%H:%M")),
        Style::default().fg(Color::DarkGray),
      ),
      Span::styled(
        format!("{} ", notification.title),
        Style::default().fg(Color::Yellow).bold(),
      ),
      Span::raw(notification.body.as_str()),
    ];
    for action in &notification.actions {
      spans.push(Span::styled(
        format!("  <{}>", action_key(action.action)),
        Style::default().fg(Color::Cyan),
      ));
      spans.push(Span::styled(
        format!(" {}", action.title),
        Style::default().fg(Color::DarkGray),
      ));
    }
    Line::from(spans)
  } else if let Some(message) = app.search().status_message() {
    Line::from(Span::styled(
      format!(" {}", message),
      Style::default().fg(Color::Red),
    ))
  } else if app.modal().is_open() {
    Line::from(Span::styled(
      " Tab:next control  Enter:activate  r:retry  Esc:close",
      Style::default().fg(Color::DarkGray),
    ))
  } else {
    Line::from(Span::styled(
      " /search  Tab:focus  j/k:nav  Enter:details  PgUp/PgDn:scroll  F5:clean cache  Ctrl-C:quit",
      Style::default().fg(Color::DarkGray),
    ))
  };

  frame.render_widget(Paragraph::new(line), area);
}

fn action_key(action: &str) -> char {
  if action == ACTION_OPEN {
    'o'
  } else {
    'x'
  }
}
