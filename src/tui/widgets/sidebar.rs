use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget};

use crate::Config;
use crate::state::AppState;
use crate::tui::app::NavEntry;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::truncate;

pub fn render_sidebar(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    list_state: &mut ListState,
    config: &Config,
    focused: bool,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let accent = parse_color(&active_theme.accent);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = parse_color(&active_theme.highlight_fg);

    let max_width = area.width.saturating_sub(4) as usize;
    let entries = NavEntry::entries(state);
    let first_category = entries.iter().position(|e| matches!(e, NavEntry::Category(_)));

    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            // Current view is marked so it stays visible while the cursor moves
            let marker = if entry.is_active(state) { "● " } else { "  " };
            let style = if entry.is_active(state) {
                Style::default().fg(accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(fg_color)
            };
            let line = Line::from(Span::styled(
                truncate(&format!("{}{}", marker, entry.label(state)), max_width),
                style,
            ));
            if Some(index) == first_category {
                ListItem::new(vec![Line::from(Span::styled(
                    "Categories",
                    Style::default().fg(fg_color).add_modifier(Modifier::DIM),
                )), line])
            } else {
                ListItem::new(line)
            }
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(accent)
    } else {
        Style::default().fg(fg_color)
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Views").border_style(border_style))
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, area, f.buffer_mut(), list_state);
}
