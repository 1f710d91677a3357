use chrono::{DateTime, Local, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::messages::render::LiveStatus;
use crate::models::Person;

/// Renders a text input field
pub fn render_input<'a>(content: &'a str, title: &'a str, is_focused: bool, is_editing: bool) -> Paragraph<'a> {
    let style = if is_focused && is_editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);

    Paragraph::new(content).block(block)
}

/// Place the terminal cursor inside a bordered input
pub fn set_input_cursor(f: &mut Frame, area: Rect, column: usize) {
    let max_x = area.x + area.width.saturating_sub(2);
    let cursor_x = (area.x + column as u16 + 1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, area.y + 1));
}

/// Renders tabs
pub fn render_tabs<'a>(titles: &[String], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(t.clone())).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
        .divider("|")
}

/// Live feed status color
pub fn live_status_color(status: &LiveStatus) -> Color {
    match status {
        LiveStatus::Connected | LiveStatus::Polling => Color::Green,
        LiveStatus::Connecting => Color::Yellow,
        LiveStatus::Paused | LiveStatus::Idle => Color::DarkGray,
        LiveStatus::Disconnected => Color::Magenta,
        LiveStatus::Error(_) => Color::Red,
    }
}

/// Wall-clock time of a fetch, in the local zone
pub fn format_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Detail lines for one dashboard record
pub fn person_lines(person: &Person) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Cyan);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Name:        ", label),
            Span::styled(person.name.clone(), Style::default().bold()),
        ]),
        Line::from(vec![
            Span::styled("Relation:    ", label),
            Span::raw(person.relation.clone()),
        ]),
        Line::from(vec![
            Span::styled("Description: ", label),
            Span::raw(person.description.clone()),
        ]),
        Line::from(""),
        Line::from(Span::styled(format!("Images ({})", person.images.len()), label)),
    ];

    if person.images.is_empty() {
        lines.push(Line::from(Span::styled(
            "  no images",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for url in &person.images {
        lines.push(Line::from(Span::styled(
            format!("  {}", url),
            Style::default().fg(Color::Green),
        )));
    }

    lines
}

/// Inner rect of a given percentage, centered in `r`
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_lines_list_every_image() {
        let person = Person {
            id: "1".to_string(),
            images: vec!["http://a/1.jpg".to_string(), "http://a/2.jpg".to_string()],
            name: "Ana".to_string(),
            relation: "Sister".to_string(),
            description: "Visits on Sundays".to_string(),
        };
        let lines = person_lines(&person);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[4].to_string(), "Images (2)");
    }

    #[test]
    fn test_centered_rect_fits_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(inner.x, 20);
    }

    #[test]
    fn test_error_status_is_red() {
        assert_eq!(live_status_color(&LiveStatus::Error("x".into())), Color::Red);
        assert_eq!(live_status_color(&LiveStatus::Connected), Color::Green);
    }
}
