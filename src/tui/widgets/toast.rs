use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::controller::NotificationKind;
use crate::tui::app::Toast;
use crate::tui::widgets::truncate;

fn toast_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => Color::Green,
        NotificationKind::Error => Color::Red,
        NotificationKind::Info => Color::Blue,
    }
}

/// Newest toast at the top right, older ones stacked beneath
pub fn render_toasts(f: &mut Frame, area: Rect, toasts: &[Toast]) {
    let width = (area.width / 3).clamp(24, 48).min(area.width);
    let mut y = area.y + 1;

    for toast in toasts.iter().rev() {
        if y + 3 > area.y + area.height {
            break;
        }
        let toast_area = Rect::new(area.x + area.width - width, y, width, 3);
        let color = toast_color(toast.kind);
        let paragraph = Paragraph::new(truncate(&toast.message, width.saturating_sub(2) as usize))
            .style(Style::default().fg(Color::White).bg(color).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::White).bg(color)))
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, toast_area);
        f.render_widget(paragraph, toast_area);
        y += 3;
    }
}
