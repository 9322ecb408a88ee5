use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use futures::stream::FuturesUnordered;
use ratatui::widgets::ListState;
use tracing::{debug, info};

use crate::api::TaskService;
use crate::config::{Config, KeyBindings};
use crate::controller::{Command, Controller, Effect, Notification, NotificationKind, Outcome, PendingRequest};
use crate::debounce::Debouncer;
use crate::models::{CategoryId, Priority, SortOrder, Task, TaskFilter};
use crate::state::{AppState, TaskView};
use crate::tui::error::TuiError;
use crate::tui::forms::{AuthForm, CategoryForm, DeleteTarget, TaskForm};
use crate::tui::widgets::input::TextInput;
use crate::utils::{ParsedKeyBinding, parse_key_binding};

/// Toasts beyond this many push out the oldest
const MAX_TOASTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Auth,
    Browse,
    Search,
    TaskForm,
    CategoryForm,
    ConfirmDelete,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarState {
    Expanded,
    Collapsed,
}

/// One row of the sidebar: a fixed view or a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEntry {
    AllTasks,
    Pending,
    Completed,
    Overdue,
    Priority(Priority),
    Category(CategoryId),
}

impl NavEntry {
    const FIXED: [NavEntry; 7] = [
        NavEntry::AllTasks,
        NavEntry::Pending,
        NavEntry::Completed,
        NavEntry::Overdue,
        NavEntry::Priority(Priority::High),
        NavEntry::Priority(Priority::Medium),
        NavEntry::Priority(Priority::Low),
    ];

    /// Fixed views first, then every category in server order
    pub fn entries(state: &AppState) -> Vec<NavEntry> {
        let mut entries = Self::FIXED.to_vec();
        entries.extend(state.categories().iter().map(|c| NavEntry::Category(c.id)));
        entries
    }

    pub fn command(&self) -> Command {
        match self {
            NavEntry::AllTasks => Command::ShowAllTasks,
            NavEntry::Pending => Command::FilterByCompleted(false),
            NavEntry::Completed => Command::FilterByCompleted(true),
            NavEntry::Overdue => Command::ShowOverdue,
            NavEntry::Priority(priority) => Command::FilterByPriority(*priority),
            NavEntry::Category(id) => Command::FilterByCategory(*id),
        }
    }

    pub fn label(&self, state: &AppState) -> String {
        match self {
            NavEntry::AllTasks => "All Tasks".to_string(),
            NavEntry::Pending => "Pending".to_string(),
            NavEntry::Completed => "Completed".to_string(),
            NavEntry::Overdue => "Overdue".to_string(),
            NavEntry::Priority(priority) => format!("{} Priority", priority.label()),
            NavEntry::Category(id) => match state.category(*id) {
                Some(category) => format!("{} ({})", category.name, category.task_count),
                None => format!("#{}", id),
            },
        }
    }

    /// Whether the task list currently shows this entry (sort order ignored)
    pub fn is_active(&self, state: &AppState) -> bool {
        let filter = TaskFilter {
            sort_by: None,
            ..state.filter().clone()
        };
        match self {
            NavEntry::Overdue => state.view() == TaskView::Overdue,
            _ if state.view() == TaskView::Overdue => false,
            NavEntry::AllTasks => filter == TaskFilter::default(),
            NavEntry::Pending => filter == TaskFilter::by_completed(false),
            NavEntry::Completed => filter == TaskFilter::by_completed(true),
            NavEntry::Priority(priority) => filter == TaskFilter::by_priority(*priority),
            NavEntry::Category(id) => filter == TaskFilter::by_category(*id),
        }
    }
}

/// Key bindings from the config, parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
    pub new_task: ParsedKeyBinding,
    pub new_category: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub toggle_task: ParsedKeyBinding,
    pub search: ParsedKeyBinding,
    pub refresh: ParsedKeyBinding,
    pub cycle_sort: ParsedKeyBinding,
    pub show_overdue: ParsedKeyBinding,
    pub profile: ParsedKeyBinding,
    pub logout: ParsedKeyBinding,
    pub toggle_sidebar: ParsedKeyBinding,
    pub switch_focus: ParsedKeyBinding,
    pub list_up: ParsedKeyBinding,
    pub list_down: ParsedKeyBinding,
    pub save: ParsedKeyBinding,
}

impl KeyMap {
    pub fn from_bindings(bindings: &KeyBindings) -> Result<Self, TuiError> {
        let parse = |name: &str, value: &str| {
            parse_key_binding(value).map_err(|e| TuiError::KeyBindingError(format!("{}: {}", name, e)))
        };
        Ok(Self {
            quit: parse("quit", &bindings.quit)?,
            help: parse("help", &bindings.help)?,
            new_task: parse("new_task", &bindings.new_task)?,
            new_category: parse("new_category", &bindings.new_category)?,
            edit: parse("edit", &bindings.edit)?,
            delete: parse("delete", &bindings.delete)?,
            toggle_task: parse("toggle_task", &bindings.toggle_task)?,
            search: parse("search", &bindings.search)?,
            refresh: parse("refresh", &bindings.refresh)?,
            cycle_sort: parse("cycle_sort", &bindings.cycle_sort)?,
            show_overdue: parse("show_overdue", &bindings.show_overdue)?,
            profile: parse("profile", &bindings.profile)?,
            logout: parse("logout", &bindings.logout)?,
            toggle_sidebar: parse("toggle_sidebar", &bindings.toggle_sidebar)?,
            switch_focus: parse("switch_focus", &bindings.switch_focus)?,
            list_up: parse("list_up", &bindings.list_up)?,
            list_down: parse("list_down", &bindings.list_down)?,
            save: parse("save", &bindings.save)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: Instant,
}

pub struct UiState {
    pub mode: Mode,
    pub focus: Focus,
    pub sidebar_state: SidebarState,
    pub sidebar_list: ListState,
    pub task_list: ListState,
    pub should_quit: bool,
    /// Input, toasts or loading changed since the last frame
    pub needs_redraw: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            mode: Mode::Auth,
            focus: Focus::Tasks,
            sidebar_state: SidebarState::Expanded,
            sidebar_list: ListState::default().with_selected(Some(0)),
            task_list: ListState::default(),
            should_quit: false,
            needs_redraw: true,
        }
    }
}

#[derive(Default)]
pub struct FormState {
    pub auth: AuthForm,
    pub task: Option<TaskForm>,
    pub category: Option<CategoryForm>,
}

#[derive(Default)]
pub struct ModalState {
    pub delete_confirmation: Option<DeleteTarget>,
    /// 0 = Delete, 1 = Cancel
    pub delete_selection: usize,
}

pub struct SearchState {
    pub input: TextInput,
    pub debouncer: Debouncer<String>,
}

pub struct App {
    pub config: Config,
    pub keymap: KeyMap,
    pub controller: Controller,
    pub ui: UiState,
    pub forms: FormState,
    pub modals: ModalState,
    pub search: SearchState,
    pub toasts: Vec<Toast>,
    session_expired: Arc<AtomicBool>,
    pub(crate) pending: FuturesUnordered<PendingRequest>,
}

impl App {
    pub fn new(
        config: Config,
        service: Arc<dyn TaskService>,
        session_expired: Arc<AtomicBool>,
    ) -> Result<Self, TuiError> {
        let keymap = KeyMap::from_bindings(&config.key_bindings)?;
        let debouncer = Debouncer::new(config.search_debounce());

        Ok(Self {
            config,
            keymap,
            controller: Controller::new(service),
            ui: UiState::default(),
            forms: FormState::default(),
            modals: ModalState::default(),
            search: SearchState {
                input: TextInput::new(),
                debouncer,
            },
            toasts: Vec::new(),
            session_expired,
            pending: FuturesUnordered::new(),
        })
    }

    pub fn state(&self) -> &AppState {
        self.controller.state()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hand a command to the controller and keep its request polling
    pub fn submit(&mut self, command: Command) {
        if let Some(request) = self.controller.dispatch(command) {
            self.pending.push(request);
        }
        self.collect_notifications(Instant::now());
        self.sync_selection();
        self.request_redraw();
    }

    pub fn handle_outcome(&mut self, outcome: Outcome) {
        if let Some(effect) = self.controller.apply(outcome) {
            self.apply_effect(effect);
        }
        self.collect_notifications(Instant::now());
        self.sync_selection();
        self.request_redraw();
    }

    pub fn request_redraw(&mut self) {
        self.ui.needs_redraw = true;
    }

    /// Whether a frame is due; consumes both the UI flag and the cache's render request
    pub fn take_redraw(&mut self) -> bool {
        let cache_changed = self.controller.state_mut().take_render_request();
        std::mem::replace(&mut self.ui.needs_redraw, false) || cache_changed
    }

    fn apply_effect(&mut self, effect: Effect) {
        debug!(?effect, "applying effect");
        match effect {
            Effect::ShowApp => {
                self.forms.auth = AuthForm::default();
                self.ui.mode = Mode::Browse;
                self.ui.focus = Focus::Tasks;
                self.ui.sidebar_list.select(Some(0));
                self.ui.task_list.select(None);
            }
            Effect::ShowAuth => self.show_auth(),
            Effect::TaskSaved => {
                self.forms.task = None;
                if self.ui.mode == Mode::TaskForm {
                    self.ui.mode = Mode::Browse;
                }
            }
            Effect::CategorySaved => {
                self.forms.category = None;
                if self.ui.mode == Mode::CategoryForm {
                    self.ui.mode = Mode::Browse;
                }
            }
            Effect::TaskDeleted | Effect::CategoryDeleted => {}
        }
    }

    fn show_auth(&mut self) {
        self.ui.mode = Mode::Auth;
        self.forms.auth.clear_password();
        self.forms.task = None;
        self.forms.category = None;
        self.modals = ModalState::default();
        self.search.input.clear();
        self.search.debouncer.cancel();
    }

    /// Timers: session expiry, the search debounce and toast lifetimes
    pub fn tick(&mut self, now: Instant) {
        if self.session_expired.swap(false, Ordering::SeqCst) && self.ui.mode != Mode::Auth {
            info!("session expired, returning to login");
            self.controller.state_mut().clear();
            self.show_auth();
        }

        if let Some(query) = self.search.debouncer.poll_ready(now) {
            self.submit(Command::Search(query));
        }

        let shown = self.toasts.len();
        self.toasts.retain(|toast| toast.expires_at > now);
        if self.toasts.len() != shown {
            self.request_redraw();
        }
    }

    fn collect_notifications(&mut self, now: Instant) {
        let expires_at = now + self.config.toast_duration();
        for Notification { kind, message } in self.controller.drain_notifications() {
            self.toasts.push(Toast {
                kind,
                message,
                expires_at,
            });
        }
        let overflow = self.toasts.len().saturating_sub(MAX_TOASTS);
        self.toasts.drain(..overflow);
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.controller.notify(Notification::error(message));
        self.collect_notifications(Instant::now());
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.controller.state().visible_tasks(Utc::now())
    }

    pub fn nav_entries(&self) -> Vec<NavEntry> {
        NavEntry::entries(self.controller.state())
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let index = self.ui.task_list.selected()?;
        self.visible_tasks().get(index).copied()
    }

    pub fn selected_nav(&self) -> Option<NavEntry> {
        let index = self.ui.sidebar_list.selected()?;
        self.nav_entries().get(index).copied()
    }

    /// Keep both list selections inside their lists after the cache changes
    pub fn sync_selection(&mut self) {
        let task_count = self.visible_tasks().len();
        let selected = match (task_count, self.ui.task_list.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (n, Some(i)) => Some(i.min(n - 1)),
        };
        self.ui.task_list.select(selected);

        let nav_count = self.nav_entries().len();
        let nav_selected = self.ui.sidebar_list.selected().unwrap_or(0).min(nav_count - 1);
        self.ui.sidebar_list.select(Some(nav_selected));
    }

    pub fn move_selection_up(&mut self) {
        let list = match self.ui.focus {
            Focus::Sidebar => &mut self.ui.sidebar_list,
            Focus::Tasks => &mut self.ui.task_list,
        };
        if let Some(index) = list.selected() {
            list.select(Some(index.saturating_sub(1)));
        }
    }

    pub fn move_selection_down(&mut self) {
        let len = match self.ui.focus {
            Focus::Sidebar => self.nav_entries().len(),
            Focus::Tasks => self.visible_tasks().len(),
        };
        let list = match self.ui.focus {
            Focus::Sidebar => &mut self.ui.sidebar_list,
            Focus::Tasks => &mut self.ui.task_list,
        };
        if len == 0 {
            return;
        }
        let next = list.selected().map_or(0, |i| (i + 1).min(len - 1));
        list.select(Some(next));
    }

    pub fn switch_focus(&mut self) {
        self.ui.focus = match (self.ui.focus, self.ui.sidebar_state) {
            (Focus::Tasks, SidebarState::Expanded) => Focus::Sidebar,
            _ => Focus::Tasks,
        };
    }

    pub fn toggle_sidebar(&mut self) {
        self.ui.sidebar_state = match self.ui.sidebar_state {
            SidebarState::Expanded => SidebarState::Collapsed,
            SidebarState::Collapsed => SidebarState::Expanded,
        };
        if self.ui.sidebar_state == SidebarState::Collapsed {
            self.ui.focus = Focus::Tasks;
        }
    }

    /// Enter on a sidebar row
    pub fn activate_nav(&mut self) {
        if let Some(entry) = self.selected_nav() {
            self.search.input.clear();
            self.search.debouncer.cancel();
            self.ui.task_list.select(None);
            self.submit(entry.command());
            self.ui.focus = Focus::Tasks;
        }
    }

    /// Unsorted → due date → priority → newest → unsorted
    pub fn cycle_sort(&mut self) {
        let next = match self.state().filter().sort_by {
            None => Some(SortOrder::DueDate),
            Some(SortOrder::DueDate) => Some(SortOrder::Priority),
            Some(SortOrder::Priority) => Some(SortOrder::CreatedAt),
            Some(SortOrder::CreatedAt) => None,
        };
        self.submit(Command::SetSort(next));
    }

    pub fn toggle_selected_task(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.submit(Command::ToggleTask(id));
        }
    }

    pub fn open_new_task_form(&mut self) {
        // Creating from a category view pre-selects that category
        let category = self.state().filter().category;
        self.forms.task = Some(TaskForm::new(category));
        self.ui.mode = Mode::TaskForm;
    }

    pub fn open_new_category_form(&mut self) {
        self.forms.category = Some(CategoryForm::new());
        self.ui.mode = Mode::CategoryForm;
    }

    /// Edit whatever the focused pane has selected
    pub fn open_edit_form(&mut self) {
        match self.ui.focus {
            Focus::Tasks => {
                if let Some(form) = self.selected_task().map(TaskForm::from_task) {
                    self.forms.task = Some(form);
                    self.ui.mode = Mode::TaskForm;
                }
            }
            Focus::Sidebar => {
                if let Some(NavEntry::Category(id)) = self.selected_nav() {
                    if let Some(form) = self.state().category(id).map(CategoryForm::from_category) {
                        self.forms.category = Some(form);
                        self.ui.mode = Mode::CategoryForm;
                    }
                }
            }
        }
    }

    pub fn request_delete(&mut self) {
        let target = match self.ui.focus {
            Focus::Tasks => self.selected_task().map(|task| DeleteTarget::Task {
                id: task.id,
                title: task.title.clone(),
            }),
            Focus::Sidebar => match self.selected_nav() {
                Some(NavEntry::Category(id)) => self.state().category(id).map(|category| DeleteTarget::Category {
                    id,
                    name: category.name.clone(),
                }),
                _ => None,
            },
        };
        if let Some(target) = target {
            self.modals.delete_confirmation = Some(target);
            self.modals.delete_selection = 0;
            self.ui.mode = Mode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        let target = self.modals.delete_confirmation.take();
        let confirmed = self.modals.delete_selection == 0;
        self.modals.delete_selection = 0;
        self.ui.mode = Mode::Browse;
        if let (Some(target), true) = (target, confirmed) {
            self.submit(target.to_command());
        }
    }

    pub fn cancel_delete(&mut self) {
        self.modals = ModalState::default();
        self.ui.mode = Mode::Browse;
    }

    pub fn save_task_form(&mut self) {
        let Some(form) = self.forms.task.as_ref() else {
            return;
        };
        match form.to_command() {
            Ok(command) => self.submit(command),
            Err(message) => self.notify_error(message),
        }
    }

    pub fn save_category_form(&mut self) {
        if let Some(command) = self.forms.category.as_ref().map(CategoryForm::to_command) {
            self.submit(command);
        }
    }

    pub fn close_forms(&mut self) {
        self.forms.task = None;
        self.forms.category = None;
        self.ui.mode = Mode::Browse;
    }

    pub fn submit_auth(&mut self) {
        let command = self.forms.auth.to_command();
        self.submit(command);
    }

    pub fn start_search(&mut self) {
        self.ui.mode = Mode::Search;
    }

    /// Restart the debounce with the current search text
    pub fn search_changed(&mut self, now: Instant) {
        let query = self.search.input.value().to_string();
        self.search.debouncer.touch(query, now);
    }

    /// Enter: send the search now instead of waiting out the debounce
    pub fn finish_search(&mut self) {
        self.search.debouncer.cancel();
        self.ui.mode = Mode::Browse;
        self.ui.task_list.select(None);
        let query = self.search.input.value().to_string();
        self.submit(Command::Search(query));
    }

    /// Esc: drop the query and return to the unsearched list
    pub fn cancel_search(&mut self) {
        self.search.debouncer.cancel();
        self.search.input.clear();
        self.ui.mode = Mode::Browse;
        if self.state().filter().search.is_some() {
            self.submit(Command::ClearSearch);
        }
    }

    pub fn quit(&mut self) {
        self.ui.should_quit = true;
    }
}
