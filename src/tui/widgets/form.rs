use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::models::Category;
use crate::tui::forms::{AuthField, AuthForm, AuthMode, CategoryForm, TaskField, TaskForm};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::input::TextInput;
use crate::tui::widgets::popup_area_fixed_height;

struct FieldStyles {
    active: Style,
    inactive: Style,
    border: Style,
    border_active: Style,
}

impl FieldStyles {
    fn from_config(config: &Config) -> Self {
        let theme = config.get_active_theme();
        let fg = parse_color(&theme.fg);
        let accent = parse_color(&theme.accent);
        Self {
            active: Style::default().fg(fg),
            inactive: Style::default().fg(fg).add_modifier(Modifier::DIM),
            border: Style::default().fg(fg),
            border_active: Style::default().fg(accent),
        }
    }
}

/// A 3-row bordered field holding a text input
fn render_input_field(f: &mut Frame, area: Rect, label: &str, input: &TextInput, active: bool, styles: &FieldStyles) {
    let style = if active { styles.active } else { styles.inactive };
    let line = input.to_line(style, active, area.width.saturating_sub(2) as usize);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(label.to_string())
        .border_style(if active { styles.border_active } else { styles.border });
    f.render_widget(Paragraph::new(line).block(block), area);
}

/// A 3-row bordered field showing a value picked with ←/→
fn render_choice_field(f: &mut Frame, area: Rect, label: &str, value: &str, active: bool, styles: &FieldStyles) {
    let style = if active { styles.active } else { styles.inactive };
    let text = if active { format!("◀ {} ▶", value) } else { value.to_string() };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(label.to_string())
        .border_style(if active { styles.border_active } else { styles.border });
    f.render_widget(Paragraph::new(Span::styled(text, style)).block(block), area);
}

fn field_rows(area: Rect, count: usize) -> Vec<Rect> {
    let mut constraints = vec![Constraint::Length(3); count];
    constraints.push(Constraint::Min(0));
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

fn render_frame(f: &mut Frame, area: Rect, title: &str, hint: &str, config: &Config) -> Rect {
    let theme = config.get_active_theme();
    let style = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .title_alignment(Alignment::Center)
        .title_bottom(Line::from(hint.to_string()).centered())
        .style(style);
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

pub fn render_auth_screen(f: &mut Frame, area: Rect, form: &AuthForm, loading: bool, config: &Config) {
    let styles = FieldStyles::from_config(config);
    let fields = form.fields();
    // Fields, a status row, and the frame
    let height = fields.len() as u16 * 3 + 2 + 2;
    let popup = popup_area_fixed_height(area, 50, height);

    let title = match form.mode {
        AuthMode::Login => "Log in",
        AuthMode::Register => "Create account",
    };
    let inner = render_frame(f, popup, title, "Tab: Next • Enter: Submit • Ctrl+r: Log in/Register • Esc: Quit", config);
    let rows = field_rows(inner, fields.len());

    for (row, field) in fields.iter().enumerate() {
        let (label, input) = match field {
            AuthField::Username => ("Username", &form.username),
            AuthField::Email => ("Email", &form.email),
            AuthField::Password => ("Password", &form.password),
        };
        render_input_field(f, rows[row], label, input, *field == form.current_field, &styles);
    }

    if loading {
        if let Some(status) = rows.last() {
            f.render_widget(
                Paragraph::new("Signing in...")
                    .alignment(Alignment::Center)
                    .style(styles.inactive),
                *status,
            );
        }
    }
}

pub fn render_task_form(f: &mut Frame, area: Rect, form: &TaskForm, categories: &[Category], config: &Config) {
    let styles = FieldStyles::from_config(config);
    let height = TaskField::ALL.len() as u16 * 3 + 2;
    let popup = popup_area_fixed_height(area, 70, height);
    let hint = format!(
        "Tab: Next • ←/→: Choose • {}: Save • Esc: Cancel",
        crate::utils::format_key_binding_for_display(&config.key_bindings.save)
    );
    let inner = render_frame(f, popup, form.heading(), &hint, config);
    let rows = field_rows(inner, TaskField::ALL.len());

    for (row, field) in TaskField::ALL.iter().enumerate() {
        let active = *field == form.current_field;
        match field {
            TaskField::Title => render_input_field(f, rows[row], field.label(), &form.title, active, &styles),
            TaskField::Description => {
                render_input_field(f, rows[row], field.label(), &form.description, active, &styles)
            }
            TaskField::DueDate => render_input_field(f, rows[row], field.label(), &form.due_date, active, &styles),
            TaskField::Priority => {
                render_choice_field(f, rows[row], field.label(), form.priority.label(), active, &styles)
            }
            TaskField::Category => {
                let name = form
                    .category
                    .and_then(|id| categories.iter().find(|c| c.id == id))
                    .map(|c| c.name.as_str())
                    .unwrap_or("None");
                render_choice_field(f, rows[row], field.label(), name, active, &styles)
            }
        }
    }
}

pub fn render_category_form(f: &mut Frame, area: Rect, form: &CategoryForm, config: &Config) {
    let styles = FieldStyles::from_config(config);
    let popup = popup_area_fixed_height(area, 50, 5);
    let inner = render_frame(f, popup, form.heading(), "Enter: Save • Esc: Cancel", config);
    render_input_field(f, inner, "Name", &form.name, true, &styles);
}
