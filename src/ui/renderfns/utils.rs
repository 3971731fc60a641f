use ratatui::prelude::*;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// A rectangle of `percent_x` by `percent_y` of `area`, centered in it
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
  let width = area.width * percent_x / 100;
  let height = area.height * percent_y / 100;
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

/// Whether the cell at (`column`, `row`) falls inside `area`
pub fn contains(area: Rect, column: u16, row: u16) -> bool {
  column >= area.x
    && column < area.x.saturating_add(area.width)
    && row >= area.y
    && row < area.y.saturating_add(area.height)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Amélie Poulain", 6), "Amé...");
  }

  #[test]
  fn test_centered_rect() {
    let area = Rect::new(0, 0, 100, 50);
    assert_eq!(centered_rect(50, 50, area), Rect::new(25, 12, 50, 25));
  }

  #[test]
  fn test_contains() {
    let area = Rect::new(10, 5, 4, 2);
    assert!(contains(area, 10, 5));
    assert!(contains(area, 13, 6));
    assert!(!contains(area, 14, 6));
    assert!(!contains(area, 9, 5));
  }
}
