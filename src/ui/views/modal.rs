//! Details dialog overlay.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::focus::{FocusId, FocusRegistry};
use crate::modal::ModalState;
use crate::omdb::{MovieDetails, MovieIndex};
use crate::render::markup::{details_title, info_rows, DETAILS_PLACEHOLDER, NO_PLOT, NO_RATINGS};
use crate::ui::renderfns::centered_rect;

const CLOSE_LABEL: &str = "[ x Close ]";
const RETRY_LABEL: &str = "[ Try Again ]";

/// Where the dialog and its controls ended up on screen
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalLayout {
  pub dialog: Rect,
  pub close: Rect,
  pub retry: Option<Rect>,
}

fn button_style(focus: &FocusRegistry, id: &FocusId) -> Style {
  if focus.is_focused(id) {
    Style::default().fg(Color::Black).bg(Color::Cyan).bold()
  } else {
    Style::default().fg(Color::Cyan)
  }
}

fn details_lines(details: &MovieDetails) -> Vec<Line<'_>> {
  let label = Style::default().fg(Color::DarkGray);
  let mut lines = vec![
    Line::from(vec![
      Span::styled("Poster: ", label),
      Span::raw(details.poster_url.as_deref().unwrap_or(DETAILS_PLACEHOLDER)),
    ]),
    Line::raw(""),
    Line::raw(details.plot.as_deref().unwrap_or(NO_PLOT)),
    Line::raw(""),
    Line::from(Span::styled("Ratings", Style::default().fg(Color::Yellow).bold())),
  ];

  if details.ratings.is_empty() {
    lines.push(Line::raw(NO_RATINGS));
  }
  for rating in &details.ratings {
    lines.push(Line::from(vec![
      Span::styled(format!("{}: ", rating.source), Style::default().bold()),
      Span::raw(rating.value.as_str()),
    ]));
  }

  lines.push(Line::raw(""));
  for (name, value) in info_rows(details) {
    lines.push(Line::from(vec![
      Span::styled(format!("{:<10}", name), label),
      Span::raw(value),
    ]));
  }
  lines
}

/// Draw the dialog over `area` if it is open.
pub fn draw_modal(
  frame: &mut Frame,
  area: Rect,
  state: &ModalState,
  focus: &FocusRegistry,
  index: &MovieIndex,
) -> Option<ModalLayout> {
  let title = match state {
    ModalState::Closed => return None,
    ModalState::ShowingDetails(details) => details_title(details),
    ModalState::Loading { id } | ModalState::Error { id, .. } => index
      .get(id)
      .map(|movie| movie.title.clone())
      .unwrap_or_else(|| id.clone()),
  };

  let dialog = centered_rect(70, 80, area);
  frame.render_widget(Clear, dialog);
  let block = Block::default()
    .title(format!(" {} ", title))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));
  let inner = block.inner(dialog);
  frame.render_widget(block, dialog);

  let close_width = CLOSE_LABEL.chars().count() as u16;
  let close = Rect::new(
    inner.x + inner.width.saturating_sub(close_width),
    inner.y,
    close_width.min(inner.width),
    1.min(inner.height),
  );
  frame.render_widget(
    Paragraph::new(CLOSE_LABEL).style(button_style(focus, &FocusId::ModalClose)),
    close,
  );

  let body = Rect::new(
    inner.x,
    inner.y.saturating_add(2),
    inner.width,
    inner.height.saturating_sub(2),
  );

  let mut retry = None;
  match state {
    ModalState::Loading { .. } => {
      frame.render_widget(
        Paragraph::new("Loading movie details...").style(Style::default().fg(Color::DarkGray)),
        body,
      );
    }
    ModalState::ShowingDetails(details) => {
      frame.render_widget(
        Paragraph::new(details_lines(details)).wrap(Wrap { trim: true }),
        body,
      );
    }
    ModalState::Error { message, .. } => {
      frame.render_widget(
        Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
        body,
      );
      if body.height > 2 {
        let retry_area = Rect::new(
          body.x,
          body.y + 2,
          (RETRY_LABEL.chars().count() as u16).min(body.width),
          1,
        );
        frame.render_widget(
          Paragraph::new(RETRY_LABEL).style(button_style(focus, &FocusId::ModalRetry)),
          retry_area,
        );
        retry = Some(retry_area);
      }
    }
    ModalState::Closed => {}
  }

  Some(ModalLayout {
    dialog,
    close,
    retry,
  })
}
