//! The scrolling page: search results followed by the category rows.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::sync::Arc;

use crate::app::{App, CategoryRow};
use crate::focus::FocusId;
use crate::omdb::MovieSummary;
use crate::render::markup::NO_MOVIES;
use crate::render::ImageState;
use crate::search::{SearchState, NO_RESULTS_MESSAGE};
use crate::ui::renderfns::truncate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
  Loading,
  Empty,
  Error,
}

/// One line of the page
#[derive(Debug, Clone)]
pub enum PageLine {
  Heading(String),
  Card(Arc<MovieSummary>),
  Message(String, MessageKind),
  Blank,
}

impl PageLine {
  pub fn card_id(&self) -> Option<FocusId> {
    match self {
      PageLine::Card(movie) => Some(FocusId::Card(movie.id.clone())),
      _ => None,
    }
  }
}

fn push_movies(lines: &mut Vec<PageLine>, movies: &[Arc<MovieSummary>]) {
  if movies.is_empty() {
    lines.push(PageLine::Message(NO_MOVIES.to_string(), MessageKind::Empty));
  }
  lines.extend(movies.iter().cloned().map(PageLine::Card));
}

fn push_category(lines: &mut Vec<PageLine>, row: &CategoryRow) {
  lines.push(PageLine::Heading(row.title.clone()));
  if let Some(movies) = row.query.data() {
    push_movies(lines, movies);
  } else if row.query.error().is_some() {
    lines.push(PageLine::Message(
      format!("Failed to load {}", row.query_text),
      MessageKind::Error,
    ));
  } else {
    lines.push(PageLine::Message("Loading...".to_string(), MessageKind::Loading));
  }
  lines.push(PageLine::Blank);
}

/// Everything on the page, top to bottom.
pub fn page_lines(app: &App) -> Vec<PageLine> {
  let mut lines = Vec::new();

  match app.search().state() {
    SearchState::Idle => {}
    SearchState::Pending { .. } | SearchState::Loading { .. } => {
      lines.push(PageLine::Heading("Search results".to_string()));
      lines.push(PageLine::Message(
        "Searching...".to_string(),
        MessageKind::Loading,
      ));
      lines.push(PageLine::Blank);
    }
    SearchState::Results { query, movies } => {
      lines.push(PageLine::Heading(format!("Results for \"{}\"", query)));
      push_movies(&mut lines, movies);
      lines.push(PageLine::Blank);
    }
    SearchState::Error { .. } => {
      lines.push(PageLine::Heading("Search results".to_string()));
      lines.push(PageLine::Message(
        NO_RESULTS_MESSAGE.to_string(),
        MessageKind::Empty,
      ));
      lines.push(PageLine::Blank);
    }
  }

  for row in app.categories() {
    push_category(&mut lines, row);
  }
  lines
}

fn poster_marker(app: &App, movie: &MovieSummary) -> Span<'static> {
  let Some(url) = movie.poster_url.as_deref() else {
    return Span::styled("·", Style::default().fg(Color::DarkGray));
  };
  match app.images().state(url) {
    Some(ImageState::Visible) => Span::styled("▣", Style::default().fg(Color::Green)),
    Some(ImageState::Loading) => Span::styled("◌", Style::default().fg(Color::Yellow)),
    _ => Span::styled("□", Style::default().fg(Color::DarkGray)),
  }
}

fn card_line(app: &App, movie: &MovieSummary, focused: bool, width: usize) -> Line<'static> {
  let year = movie.year.as_deref().unwrap_or("N/A");
  let kind = movie.kind.as_deref().unwrap_or("movie");
  let title_style = if focused {
    Style::default().fg(Color::Black).bg(Color::Cyan).bold()
  } else {
    Style::default().fg(Color::White)
  };

  Line::from(vec![
    Span::raw(if focused { " ▸ " } else { "   " }),
    poster_marker(app, movie),
    Span::raw(" "),
    Span::styled(truncate(&movie.title, width.saturating_sub(24)), title_style),
    Span::styled(format!(" ({})", year), Style::default().fg(Color::DarkGray)),
    Span::styled(format!("  {}", kind), Style::default().fg(Color::Blue)),
  ])
}

/// Draw the visible slice of `lines`. Returns the screen row of every visible card.
pub fn draw_page(
  frame: &mut Frame,
  area: Rect,
  app: &App,
  lines: &[PageLine],
  scroll: usize,
) -> Vec<(u16, FocusId)> {
  let mut rows = Vec::new();
  let mut rendered = Vec::with_capacity(area.height as usize);

  for (offset, line) in lines
    .iter()
    .skip(scroll)
    .take(area.height as usize)
    .enumerate()
  {
    let rendered_line = match line {
      PageLine::Heading(text) => Line::from(Span::styled(
        format!(" {}", text),
        Style::default().fg(Color::Yellow).bold(),
      )),
      PageLine::Card(movie) => {
        let id = FocusId::Card(movie.id.clone());
        let focused = app.focus().is_focused(&id);
        rows.push((area.y + offset as u16, id));
        card_line(app, movie, focused, area.width as usize)
      }
      PageLine::Message(text, kind) => {
        let color = match kind {
          MessageKind::Loading => Color::DarkGray,
          MessageKind::Empty => Color::Gray,
          MessageKind::Error => Color::Red,
        };
        Line::from(Span::styled(format!("   {}", text), Style::default().fg(color)))
      }
      PageLine::Blank => Line::raw(""),
    };
    rendered.push(rendered_line);
  }

  frame.render_widget(Paragraph::new(rendered), area);
  rows
}
