use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::input::TextInput;

pub fn render_search_box(f: &mut Frame, area: Rect, input: &TextInput, active: bool, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let accent = parse_color(&active_theme.accent);

    let style = Style::default().fg(fg_color);
    let line = if input.is_empty() && !active {
        Line::from(Span::styled(
            format!("Press {} to search titles and descriptions", config.key_bindings.search),
            style.add_modifier(Modifier::DIM),
        ))
    } else {
        input.to_line(style, active, area.width.saturating_sub(2) as usize)
    };

    let border_style = if active { Style::default().fg(accent) } else { style };
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search")
            .border_style(border_style),
    );
    f.render_widget(paragraph, area);
}
