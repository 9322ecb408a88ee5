//! In-memory mirror of the server's tasks and categories.
//!
//! The server is the only source of truth: every entry here is a copy of a
//! server response. Mutations happen through the reconciliation methods
//! below, each of which recomputes the derived category counts and raises
//! the render request before returning.

use chrono::{DateTime, Utc};

use crate::models::{Category, CategoryId, Priority, Task, TaskFilter, TaskId};

/// Which slice of the cache the task list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskView {
    #[default]
    All,
    /// Open tasks past their due date, computed from the current cache
    Overdue,
}

#[derive(Debug, Clone)]
pub struct AppState {
    user: Option<String>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    filter: TaskFilter,
    view: TaskView,
    page_title: String,
    render_requested: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user: None,
            tasks: Vec::new(),
            categories: Vec::new(),
            filter: TaskFilter::default(),
            view: TaskView::All,
            page_title: ALL_TASKS_TITLE.to_string(),
            render_requested: true,
        }
    }
}

pub const ALL_TASKS_TITLE: &str = "All Tasks";

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn set_user(&mut self, username: Option<String>) {
        self.user = username;
        self.request_render();
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn view(&self) -> TaskView {
        self.view
    }

    pub fn page_title(&self) -> &str {
        &self.page_title
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_name(&self, id: Option<CategoryId>) -> Option<&str> {
        id.and_then(|id| self.category(id)).map(|c| c.name.as_str())
    }

    /// Tasks the list should display for the current view
    pub fn visible_tasks(&self, now: DateTime<Utc>) -> Vec<&Task> {
        match self.view {
            TaskView::All => self.tasks.iter().collect(),
            TaskView::Overdue => self.tasks.iter().filter(|t| t.is_overdue(now)).collect(),
        }
    }

    /// Consume the pending render request, if any
    pub fn take_render_request(&mut self) -> bool {
        std::mem::replace(&mut self.render_requested, false)
    }

    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Login or startup: both caches replaced together
    pub fn load(&mut self, categories: Vec<Category>, tasks: Vec<Task>) {
        self.categories = categories;
        self.tasks = tasks;
        self.filter = TaskFilter::default();
        self.view = TaskView::All;
        self.page_title = ALL_TASKS_TITLE.to_string();
        self.reconcile();
    }

    /// Filter or search result: the previous cache is discarded unconditionally
    pub fn replace_tasks(&mut self, filter: TaskFilter, title: String, tasks: Vec<Task>) {
        self.filter = filter;
        self.page_title = title;
        self.view = TaskView::All;
        self.tasks = tasks;
        self.reconcile();
    }

    pub fn replace_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
        self.reconcile();
    }

    /// Newly created tasks go first
    pub fn prepend_task(&mut self, task: Task) {
        self.tasks.insert(0, task);
        self.reconcile();
    }

    /// Replace the cached task with the same id. A task that is not cached
    /// (filtered out of the current list) is dropped; the next reload
    /// brings it back.
    pub fn replace_task(&mut self, task: Task) -> bool {
        let replaced = match self.tasks.iter().position(|t| t.id == task.id) {
            Some(index) => {
                self.tasks[index] = task;
                true
            }
            None => false,
        };
        self.reconcile();
        replaced
    }

    pub fn remove_task(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        self.reconcile();
        removed
    }

    pub fn push_category(&mut self, category: Category) {
        self.categories.push(category);
        self.reconcile();
    }

    pub fn replace_category(&mut self, category: Category) -> bool {
        let replaced = match self.categories.iter().position(|c| c.id == category.id) {
            Some(index) => {
                self.categories[index] = category;
                true
            }
            None => false,
        };
        self.reconcile();
        replaced
    }

    /// Tasks are only ever replaced by server copies, so the category's
    /// tasks keep their stale id until the next reload
    pub fn remove_category(&mut self, id: CategoryId) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        let removed = self.categories.len() != before;
        self.reconcile();
        removed
    }

    /// Switch to the overdue view without touching the cache
    pub fn show_overdue(&mut self) {
        self.view = TaskView::Overdue;
        self.page_title = "Overdue Tasks".to_string();
        self.request_render();
    }

    /// Logout: drop everything that belonged to the user
    pub fn clear(&mut self) {
        self.user = None;
        self.tasks.clear();
        self.categories.clear();
        self.filter = TaskFilter::default();
        self.view = TaskView::All;
        self.page_title = ALL_TASKS_TITLE.to_string();
        self.reconcile();
    }

    /// Counts reflect only the loaded tasks, not the server totals
    fn recompute_category_counts(&mut self) {
        for category in &mut self.categories {
            category.task_count = self
                .tasks
                .iter()
                .filter(|t| t.category == Some(category.id))
                .count();
        }
    }

    fn reconcile(&mut self) {
        self.recompute_category_counts();
        self.request_render();
    }
}

/// Page title for a server-side filter
pub fn title_for_filter(filter: &TaskFilter, categories: &[Category]) -> String {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        return format!("Search: \"{}\"", search);
    }
    if let Some(id) = filter.category {
        if let Some(category) = categories.iter().find(|c| c.id == id) {
            return format!("{} Tasks", category.name);
        }
    }
    if let Some(priority) = filter.priority {
        return priority_title(priority);
    }
    match filter.completed {
        Some(true) => "Completed Tasks".to_string(),
        Some(false) => "Pending Tasks".to_string(),
        None => ALL_TASKS_TITLE.to_string(),
    }
}

fn priority_title(priority: Priority) -> String {
    format!("{} Priority Tasks", priority.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: TaskId, category: Option<CategoryId>) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: None,
            priority: Priority::Medium,
            category,
            category_name: None,
            due_date: None,
            is_completed: false,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn category(id: CategoryId, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            task_count: 0,
        }
    }

    fn assert_counts_match(state: &AppState) {
        for c in state.categories() {
            let expected = state
                .tasks()
                .iter()
                .filter(|t| t.category == Some(c.id))
                .count();
            assert_eq!(c.task_count, expected, "count for category {}", c.id);
        }
    }

    #[test]
    fn test_load_computes_counts() {
        let mut state = AppState::new();
        state.load(
            vec![category(1, "Work"), category(2, "Home")],
            vec![task(1, Some(1)), task(2, Some(1)), task(3, None)],
        );

        assert_eq!(state.category(1).unwrap().task_count, 2);
        assert_eq!(state.category(2).unwrap().task_count, 0);
        assert!(state.take_render_request());
        assert!(!state.take_render_request());
    }

    #[test]
    fn test_prepend_puts_new_task_first() {
        let mut state = AppState::new();
        state.load(vec![], vec![task(1, None), task(2, None)]);

        state.prepend_task(task(7, None));

        let ids: Vec<_> = state.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![7, 1, 2]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut state = AppState::new();
        state.load(vec![], vec![task(1, None), task(2, None), task(3, None)]);

        let mut updated = task(2, None);
        updated.title = "Renamed".to_string();
        assert!(state.replace_task(updated));

        assert_eq!(state.tasks()[1].title, "Renamed");
        assert_eq!(state.tasks().len(), 3);
    }

    #[test]
    fn test_replace_unknown_task_is_dropped() {
        let mut state = AppState::new();
        state.load(vec![], vec![task(1, None)]);
        state.take_render_request();

        assert!(!state.replace_task(task(99, None)));
        assert_eq!(state.tasks().len(), 1);
        assert!(state.take_render_request());
    }

    #[test]
    fn test_toggle_flips_only_target() {
        let mut state = AppState::new();
        state.load(vec![], vec![task(1, None), task(2, None), task(3, None)]);

        let mut toggled = state.task(2).unwrap().clone();
        toggled.is_completed = !toggled.is_completed;
        state.replace_task(toggled);

        let flags: Vec<_> = state.tasks().iter().map(|t| t.is_completed).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_remove_task() {
        let mut state = AppState::new();
        state.load(vec![category(1, "Work")], vec![task(7, Some(1))]);

        assert!(state.remove_task(7));
        assert!(state.task(7).is_none());
        assert!(state.tasks().is_empty());
        assert_eq!(state.category(1).unwrap().task_count, 0);
    }

    #[test]
    fn test_size_tracks_creates_minus_deletes() {
        let mut state = AppState::new();
        state.load(vec![category(1, "Work")], vec![]);

        let mut creates = 0;
        let mut deletes = 0;
        for id in 1..=6 {
            state.prepend_task(task(id, Some(1)));
            creates += 1;
            if id % 2 == 0 {
                state.push_category(category(100 + id, "Extra"));
            }
        }
        for id in [2, 4] {
            state.remove_task(id);
            deletes += 1;
            state.remove_category(100 + id);
        }
        state.replace_task(task(3, None));

        assert_eq!(state.tasks().len(), creates - deletes);
        assert_counts_match(&state);
    }

    #[test]
    fn test_counts_follow_every_mutation() {
        let mut state = AppState::new();
        state.load(vec![category(1, "Work"), category(2, "Home")], vec![]);

        state.prepend_task(task(1, Some(1)));
        assert_counts_match(&state);
        state.replace_task(task(1, Some(2)));
        assert_counts_match(&state);
        assert_eq!(state.category(2).unwrap().task_count, 1);
        state.replace_tasks(TaskFilter::default(), ALL_TASKS_TITLE.to_string(), vec![task(5, Some(1))]);
        assert_counts_match(&state);
        assert_eq!(state.category(1).unwrap().task_count, 1);
    }

    #[test]
    fn test_removed_category_leaves_cached_tasks_untouched() {
        let mut state = AppState::new();
        state.load(vec![category(1, "Work")], vec![task(1, Some(1)), task(2, None)]);

        assert!(state.remove_category(1));
        assert!(state.categories().is_empty());
        assert_eq!(state.tasks().len(), 2);
        assert_eq!(state.task(1).and_then(|t| t.category), Some(1));
        assert!(!state.remove_category(1));
    }

    #[test]
    fn test_replace_tasks_discards_previous_cache() {
        let mut state = AppState::new();
        state.load(vec![], vec![task(1, None), task(2, None)]);

        let filter = TaskFilter::by_priority(Priority::High);
        state.replace_tasks(filter.clone(), "High Priority Tasks".to_string(), vec![task(9, None)]);

        assert_eq!(state.tasks().len(), 1);
        assert_eq!(state.filter(), &filter);
        assert_eq!(state.page_title(), "High Priority Tasks");
    }

    #[test]
    fn test_overdue_view_leaves_cache_alone() {
        let now = Utc::now();
        let mut late = task(1, None);
        late.due_date = Some(now - chrono::Duration::days(1));
        let mut done = task(2, None);
        done.due_date = Some(now - chrono::Duration::days(1));
        done.is_completed = true;

        let mut state = AppState::new();
        state.load(vec![], vec![late, done, task(3, None)]);
        state.show_overdue();

        let visible: Vec<_> = state.visible_tasks(now).iter().map(|t| t.id).collect();
        assert_eq!(visible, vec![1]);
        assert_eq!(state.tasks().len(), 3);
        assert_eq!(state.page_title(), "Overdue Tasks");
    }

    #[test]
    fn test_clear_forgets_user_data() {
        let mut state = AppState::new();
        state.set_user(Some("alice".to_string()));
        state.load(vec![category(1, "Work")], vec![task(1, Some(1))]);

        state.clear();

        assert!(state.user().is_none());
        assert!(state.tasks().is_empty());
        assert!(state.categories().is_empty());
    }

    #[test]
    fn test_titles() {
        let categories = vec![category(1, "Work")];
        assert_eq!(title_for_filter(&TaskFilter::default(), &categories), "All Tasks");
        assert_eq!(title_for_filter(&TaskFilter::by_category(1), &categories), "Work Tasks");
        assert_eq!(
            title_for_filter(&TaskFilter::by_priority(Priority::High), &categories),
            "High Priority Tasks"
        );
        assert_eq!(title_for_filter(&TaskFilter::by_completed(false), &categories), "Pending Tasks");
        assert_eq!(title_for_filter(&TaskFilter::by_search("milk"), &categories), "Search: \"milk\"");
    }
}
