use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::controller::Command;
use crate::tui::app::{App, Focus, Mode, SidebarState};
use crate::tui::error::TuiError;
use crate::tui::forms::TaskField;
use crate::tui::layout::Layout;
use crate::tui::render::render;

/// How long one loop iteration waits for input before polling requests and timers
const INPUT_POLL: Duration = Duration::from_millis(10);
/// Upper bound on idle sleeping, so toasts and the debounce fire on time
const IDLE_TICK: Duration = Duration::from_millis(50);

/// Puts the terminal back into cooked mode on every exit path, panics included
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut guard = Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: false,
        };
        execute!(io::stdout(), EnterAlternateScreen)?;
        guard.alternate_screen_enabled = true;
        Ok(guard)
    }

    /// Normal exit; afterwards drop does nothing
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already unwinding or exiting; nothing useful to do with errors here
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub async fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Checked before the alternate screen so the message lands in the normal terminal
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    info!("starting terminal UI");
    app.submit(Command::Restore);

    loop {
        if app.take_redraw() {
            terminal.draw(|f| {
                let layout = Layout::calculate(
                    f.area(),
                    app.config.sidebar_width_percent,
                    app.ui.sidebar_state == SidebarState::Collapsed,
                );
                render(f, &mut app, &layout);
            })?;
        }

        if event::poll(INPUT_POLL)? {
            match event::read()? {
                // Windows reports releases too
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(&mut app, key);
                    app.request_redraw();
                }
                Event::Resize(_, _) => app.request_redraw(),
                _ => {}
            }
        }

        if app.ui.should_quit {
            break;
        }

        app.tick(Instant::now());

        let has_pending = app.has_pending();
        tokio::select! {
            Some(outcome) = app.pending.next(), if has_pending => app.handle_outcome(outcome),
            _ = tokio::time::sleep(IDLE_TICK) => {}
        }
    }

    info!("leaving terminal UI");
    guard.restore()?;
    Ok(())
}

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.ui.mode {
        Mode::Auth => handle_auth_key(app, key),
        Mode::Browse => handle_browse_key(app, key),
        Mode::Search => handle_search_key(app, key),
        Mode::TaskForm => handle_task_form_key(app, key),
        Mode::CategoryForm => handle_category_form_key(app, key),
        Mode::ConfirmDelete => handle_confirm_delete_key(app, key),
        Mode::Help => {
            if key.code == KeyCode::Esc || app.keymap.help.matches(&key) || app.keymap.quit.matches(&key) {
                app.ui.mode = Mode::Browse;
            }
        }
    }
}

fn handle_auth_key(app: &mut App, key: KeyEvent) {
    let form = &mut app.forms.auth;
    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => form.toggle_mode(),
        KeyCode::Enter => {
            if app.is_loading() {
                debug!("ignoring submit while a sign-in is in flight");
            } else {
                app.submit_auth();
            }
        }
        _ => {
            form.active_input().handle_key(&key);
        }
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    let keys = app.keymap.clone();

    if keys.quit.matches(&key) {
        app.quit();
    } else if keys.help.matches(&key) {
        app.ui.mode = Mode::Help;
    } else if keys.new_task.matches(&key) {
        app.open_new_task_form();
    } else if keys.new_category.matches(&key) {
        app.open_new_category_form();
    } else if keys.edit.matches(&key) {
        app.open_edit_form();
    } else if keys.delete.matches(&key) {
        app.request_delete();
    } else if keys.toggle_task.matches(&key) {
        if app.ui.focus == Focus::Tasks {
            app.toggle_selected_task();
        }
    } else if keys.search.matches(&key) {
        app.start_search();
    } else if keys.refresh.matches(&key) {
        app.submit(Command::Reload);
    } else if keys.cycle_sort.matches(&key) {
        app.cycle_sort();
    } else if keys.show_overdue.matches(&key) {
        app.submit(Command::ShowOverdue);
    } else if keys.profile.matches(&key) {
        app.submit(Command::ShowProfile);
    } else if keys.logout.matches(&key) {
        app.submit(Command::Logout);
    } else if keys.toggle_sidebar.matches(&key) {
        app.toggle_sidebar();
    } else if keys.switch_focus.matches(&key) {
        app.switch_focus();
    } else if keys.list_up.matches(&key) || key.code == KeyCode::Up {
        app.move_selection_up();
    } else if keys.list_down.matches(&key) || key.code == KeyCode::Down {
        app.move_selection_down();
    } else if key.code == KeyCode::Enter {
        match app.ui.focus {
            Focus::Sidebar => app.activate_nav(),
            Focus::Tasks => app.open_edit_form(),
        }
    } else if key.code == KeyCode::Esc {
        app.cancel_search();
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.finish_search(),
        _ => {
            if app.search.input.handle_key(&key) {
                app.search_changed(Instant::now());
            }
        }
    }
}

fn handle_task_form_key(app: &mut App, key: KeyEvent) {
    if app.keymap.save.matches(&key) {
        app.save_task_form();
        return;
    }

    let categories = app.controller.state().categories();
    let Some(form) = app.forms.task.as_mut() else {
        app.ui.mode = Mode::Browse;
        return;
    };

    match key.code {
        KeyCode::Esc => app.close_forms(),
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Enter => {
            // Enter walks the fields and saves from the last one
            if form.current_field == TaskField::DueDate {
                app.save_task_form();
            } else {
                form.next_field();
            }
        }
        KeyCode::Left | KeyCode::Right if !form.current_field.is_text() => {
            form.cycle_choice(categories, key.code == KeyCode::Right);
        }
        _ => {
            if let Some(input) = form.active_input() {
                input.handle_key(&key);
            }
        }
    }
}

fn handle_category_form_key(app: &mut App, key: KeyEvent) {
    if app.keymap.save.matches(&key) || key.code == KeyCode::Enter {
        app.save_category_form();
        return;
    }

    match key.code {
        KeyCode::Esc => app.close_forms(),
        _ => {
            if let Some(form) = app.forms.category.as_mut() {
                form.name.handle_key(&key);
            }
        }
    }
}

fn handle_confirm_delete_key(app: &mut App, key: KeyEvent) {
    let up = key.code == KeyCode::Up || app.keymap.list_up.matches(&key);
    let down = key.code == KeyCode::Down || app.keymap.list_down.matches(&key);

    if up || down {
        // Two options, so either direction wraps to the other one
        app.modals.delete_selection = 1 - app.modals.delete_selection.min(1);
    } else if key.code == KeyCode::Enter {
        app.confirm_delete();
    } else if key.code == KeyCode::Esc {
        app.cancel_delete();
    }
}
