use chrono::{DateTime, Utc};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget,
};

use crate::Config;
use crate::models::{Priority, Task};
use crate::state::AppState;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::truncate;
use crate::utils::format_due_date_short;

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

/// One row: completion marker, priority, title, category and due date
pub fn task_line(task: &Task, category: Option<&str>, now: DateTime<Utc>, max_width: usize, fg: Color) -> Line<'static> {
    let marker = if task.is_completed { "✓" } else { "○" };
    let title_style = if task.is_completed {
        Style::default().fg(fg).add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(fg)
    };

    let mut suffix = String::new();
    if let Some(name) = category {
        suffix.push_str(&format!("  [{}]", name));
    }
    let due = task.due_date.map(|due| {
        let overdue = task.is_overdue(now);
        let text = format!("  {}{}", if overdue { "overdue " } else { "due " }, format_due_date_short(due));
        let style = if overdue {
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(fg)
        };
        (text, style)
    });

    // marker + space + 6-wide priority column
    let fixed = 2 + 7;
    let due_len = due.as_ref().map_or(0, |(text, _)| text.chars().count());
    let title_room = max_width.saturating_sub(fixed + suffix.chars().count() + due_len).max(8);

    let mut spans = vec![
        Span::styled(format!("{} ", marker), Style::default().fg(fg)),
        Span::styled(
            format!("{:<7}", task.priority.as_str()),
            Style::default().fg(priority_color(task.priority)),
        ),
        Span::styled(truncate(&task.title, title_room), title_style),
        Span::styled(suffix, Style::default().fg(fg).add_modifier(Modifier::DIM)),
    ];
    if let Some((text, style)) = due {
        spans.push(Span::styled(text, style));
    }
    Line::from(spans)
}

pub fn render_task_list(
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

    let now = Utc::now();
    let tasks = state.visible_tasks(now);
    let border_style = if focused {
        Style::default().fg(accent)
    } else {
        Style::default().fg(fg_color)
    };
    let title = format!("{} ({})", state.page_title(), tasks.len());

    if tasks.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from("No tasks found"),
            Line::from(Span::styled(
                format!("Press {} to create one", config.key_bindings.new_task),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .alignment(Alignment::Center)
        .style(Style::default().fg(fg_color))
        .block(Block::default().borders(Borders::ALL).title(title).border_style(border_style));
        f.render_widget(empty, area);
        return;
    }

    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // Scrollbar
        ])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    // 2 for borders, 2 for the highlight symbol
    let max_width = list_area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| {
            ListItem::new(task_line(task, category_label(task, state), now, max_width, fg_color))
        })
        .collect();
    let total_items = items.len();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title).border_style(border_style))
        .style(Style::default().fg(fg_color))
        .highlight_symbol("> ")
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if total_items > visible_items && list_area.height > 2 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(total_items)
            .viewport_content_length(visible_items)
            .position(list_state.offset());
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

/// The cached category wins so a rename shows up without a reload
fn category_label<'a>(task: &'a Task, state: &'a AppState) -> Option<&'a str> {
    state
        .category_name(task.category)
        .or(task.category_name.as_deref())
}
