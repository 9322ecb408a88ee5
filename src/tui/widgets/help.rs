use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(Style::default().fg(fg_color).bg(bg_color)),
        )
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(config: &Config) -> String {
    let keys = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}, ↑ / ↓: Move selection\n", key(&keys.list_up), key(&keys.list_down)));
    text.push_str(&format!("  {}: Switch between views and tasks\n", key(&keys.switch_focus)));
    text.push_str("  Enter: Open view / edit task\n");
    text.push_str(&format!("  {}: Toggle sidebar\n", key(&keys.toggle_sidebar)));
    text.push_str(&format!("  {}: Overdue tasks\n", key(&keys.show_overdue)));
    text.push_str(&format!("  {}: Cycle sort order\n", key(&keys.cycle_sort)));
    text.push_str(&format!("  {}: Search (Esc clears)\n", key(&keys.search)));
    text.push_str(&format!("  {}: Refresh\n", key(&keys.refresh)));
    text.push('\n');

    text.push_str("Tasks and categories:\n");
    text.push_str(&format!("  {}: New task\n", key(&keys.new_task)));
    text.push_str(&format!("  {}: New category\n", key(&keys.new_category)));
    text.push_str(&format!("  {}: Edit task, or rename the selected category\n", key(&keys.edit)));
    text.push_str(&format!("  {}: Delete task or category\n", key(&keys.delete)));
    text.push_str(&format!("  {}: Complete / reopen task\n", key(&keys.toggle_task)));
    text.push('\n');

    text.push_str("Forms:\n");
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  ← / →: Change priority or category\n");
    text.push_str(&format!("  {}: Save\n", key(&keys.save)));
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Show profile\n", key(&keys.profile)));
    text.push_str(&format!("  {}: Log out\n", key(&keys.logout)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&keys.help)));
    text.push_str(&format!("  {}: Quit\n", key(&keys.quit)));

    text
}
