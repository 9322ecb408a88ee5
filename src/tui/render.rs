use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};

use crate::tui::app::{App, Focus, Mode, SidebarState};
use crate::tui::layout::Layout;
use crate::tui::widgets::{
    color::parse_color,
    confirm_delete::render_confirm_delete,
    form::{render_auth_screen, render_category_form, render_task_form},
    header::render_header,
    help::render_help,
    search_box::render_search_box,
    sidebar::render_sidebar,
    status_bar::render_status_bar,
    task_list::render_task_list,
    toast::render_toasts,
};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Tasker")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(parse_color(&active_theme.fg)).bg(parse_color(&active_theme.bg)));
    f.render_widget(outer_block, f.area());

    if app.ui.mode == Mode::Auth {
        render_auth_screen(f, layout.inner_area, &app.forms.auth, app.is_loading(), &app.config);
        render_toasts(f, layout.inner_area, &app.toasts);
        return;
    }

    let state = app.controller.state();
    render_header(f, layout.header_area, state, app.controller.is_loading(), &app.config);

    if app.ui.sidebar_state == SidebarState::Expanded && layout.sidebar_area.width > 0 {
        render_sidebar(
            f,
            layout.sidebar_area,
            state,
            &mut app.ui.sidebar_list,
            &app.config,
            app.ui.focus == Focus::Sidebar,
        );
    }

    render_task_list(
        f,
        layout.main_area,
        state,
        &mut app.ui.task_list,
        &app.config,
        app.ui.focus == Focus::Tasks && app.ui.mode == Mode::Browse,
    );

    render_search_box(f, layout.search_area, &app.search.input, app.ui.mode == Mode::Search, &app.config);
    render_status_bar(f, layout.status_area, &key_hints(app), &app.config);

    // Overlays go on top of the normal screen
    match app.ui.mode {
        Mode::TaskForm => {
            if let Some(form) = &app.forms.task {
                render_task_form(f, layout.inner_area, form, app.controller.state().categories(), &app.config);
            }
        }
        Mode::CategoryForm => {
            if let Some(form) = &app.forms.category {
                render_category_form(f, layout.inner_area, form, &app.config);
            }
        }
        Mode::ConfirmDelete => {
            if let Some(target) = &app.modals.delete_confirmation {
                render_confirm_delete(f, layout.inner_area, target, app.modals.delete_selection, &app.config);
            }
        }
        Mode::Help => render_help(f, layout.inner_area, &app.config),
        Mode::Auth | Mode::Browse | Mode::Search => {}
    }

    render_toasts(f, layout.inner_area, &app.toasts);
}

fn key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    match app.ui.mode {
        Mode::Search => vec!["Enter: Search now".to_string(), "Esc: Clear search".to_string()],
        Mode::Help => vec![format!("Esc or {}: Close help", key(&keys.help))],
        Mode::ConfirmDelete => vec!["↑/↓: Choose".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()],
        Mode::TaskForm | Mode::CategoryForm => vec![
            "Tab: Next field".to_string(),
            format!("{}: Save", key(&keys.save)),
            "Esc: Cancel".to_string(),
        ],
        Mode::Auth | Mode::Browse => {
            let mut hints = vec![format!("{}: Quit", key(&keys.quit)), format!("{}: New", key(&keys.new_task))];
            match app.ui.focus {
                Focus::Tasks => {
                    hints.push(format!("{}: Done", key(&keys.toggle_task)));
                    hints.push(format!("{}: Edit", key(&keys.edit)));
                    hints.push(format!("{}: Delete", key(&keys.delete)));
                }
                Focus::Sidebar => {
                    hints.push("Enter: Open".to_string());
                    hints.push(format!("{}: Rename", key(&keys.edit)));
                    hints.push(format!("{}: Delete category", key(&keys.delete)));
                }
            }
            hints.push(format!("{}: Search", key(&keys.search)));
            hints.push(format!("{}: Sort", key(&keys.cycle_sort)));
            hints.push(format!("{}: Category", key(&keys.new_category)));
            hints.push(format!("{}: Switch pane", key(&keys.switch_focus)));
            hints.push(format!("{}: Help", key(&keys.help)));
            hints
        }
    }
}
