use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, title, cache status, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, cache_status: &str) {
  let header = Line::from(vec![
    Span::styled(" moviedeck ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", cache_status),
      Style::default().fg(Color::Yellow),
    ),
    Span::raw("  "),
    // Shortcuts - keys and brackets highlighted, descriptions dimmed
    Span::styled("</>", Style::default().fg(Color::Cyan)),
    Span::styled(" search", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<tab>", Style::default().fg(Color::Cyan)),
    Span::styled(" focus", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<enter>", Style::default().fg(Color::Cyan)),
    Span::styled(" details", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
