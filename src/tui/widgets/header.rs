use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::Config;
use crate::models::SortOrder;
use crate::state::AppState;
use crate::tui::widgets::color::parse_color;

pub fn sort_label(sort_by: Option<SortOrder>) -> &'static str {
    match sort_by {
        None => "default",
        Some(SortOrder::DueDate) => "due date",
        Some(SortOrder::Priority) => "priority",
        Some(SortOrder::CreatedAt) => "newest",
    }
}

/// Page title and loading marker on the left, sort order and user on the right
pub fn render_header(f: &mut Frame, area: Rect, state: &AppState, loading: bool, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let accent = parse_color(&active_theme.accent);

    let mut left = vec![Span::styled(
        state.page_title().to_string(),
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    )];
    if loading {
        left.push(Span::styled("  Loading...", Style::default().fg(fg_color).add_modifier(Modifier::DIM)));
    }

    let mut right = format!("sort: {}", sort_label(state.filter().sort_by));
    if let Some(user) = state.user() {
        right.push_str(&format!("  |  {}", user));
    }

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right.chars().count() as u16 + 1)])
        .split(area);

    f.render_widget(Paragraph::new(Line::from(left)), halves[0]);
    f.render_widget(
        Paragraph::new(right)
            .style(Style::default().fg(fg_color))
            .alignment(ratatui::layout::Alignment::Right),
        halves[1],
    );
}
