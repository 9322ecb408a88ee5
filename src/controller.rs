//! Command dispatcher between the presentation layer and the task service.
//!
//! The UI never talks to the service directly. It turns user intent into a
//! [`Command`], hands it to [`Controller::dispatch`] and drives the returned
//! future however suits it (the TUI polls several at once, the CLI and tests
//! just await). The resolved [`Outcome`] goes back through
//! [`Controller::apply`], which is the only place the cached state changes.

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{ApiError, TaskService};
use crate::models::{
    Category, CategoryDraft, CategoryId, Credentials, Priority, Registration, SortOrder, Task,
    TaskDraft, TaskFilter, TaskId, ValidationError,
};
use crate::state::{AppState, title_for_filter};

/// A request in flight; owns everything it needs so it can outlive the borrow
pub type PendingRequest = BoxFuture<'static, Outcome>;

#[derive(Debug, Clone)]
pub enum Command {
    /// Resume a persisted session, or fall back to the auth screen
    Restore,
    Login(Credentials),
    Register(Registration),
    Logout,
    /// Refetch categories and the current task list
    Reload,
    ShowAllTasks,
    FilterByCategory(CategoryId),
    FilterByPriority(Priority),
    FilterByCompleted(bool),
    SetSort(Option<SortOrder>),
    Search(String),
    ClearSearch,
    ShowOverdue,
    ShowProfile,
    CreateTask(TaskDraft),
    UpdateTask { id: TaskId, draft: TaskDraft },
    ToggleTask(TaskId),
    DeleteTask(TaskId),
    CreateCategory(CategoryDraft),
    UpdateCategory { id: CategoryId, draft: CategoryDraft },
    DeleteCategory(CategoryId),
}

type LoadResult = Result<(Vec<Category>, Vec<Task>), ApiError>;

/// Resolved value of a [`PendingRequest`]
#[derive(Debug)]
pub enum Outcome {
    SignedOut,
    AuthFailed(ApiError),
    SignedIn {
        seq: u64,
        username: String,
        returning: bool,
        data: LoadResult,
    },
    Restored {
        seq: u64,
        data: LoadResult,
    },
    Reloaded {
        seq: u64,
        filter: TaskFilter,
        data: LoadResult,
    },
    TasksListed {
        seq: u64,
        filter: TaskFilter,
        result: Result<Vec<Task>, ApiError>,
    },
    TaskCreated(Result<Task, ApiError>),
    TaskUpdated(Result<Task, ApiError>),
    TaskToggled(Result<Task, ApiError>),
    TaskDeleted {
        id: TaskId,
        result: Result<(), ApiError>,
    },
    CategoryCreated(Result<Category, ApiError>),
    CategoryUpdated(Result<Category, ApiError>),
    CategoryDeleted {
        id: CategoryId,
        result: Result<(), ApiError>,
    },
}

impl Outcome {
    /// List and auth requests drive the loading indicator
    fn is_tracked(&self) -> bool {
        matches!(
            self,
            Outcome::AuthFailed(_)
                | Outcome::SignedIn { .. }
                | Outcome::Restored { .. }
                | Outcome::Reloaded { .. }
                | Outcome::TasksListed { .. }
        )
    }
}

/// What the presentation layer should do after an outcome was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ShowApp,
    ShowAuth,
    TaskSaved,
    TaskDeleted,
    CategorySaved,
    CategoryDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

pub struct Controller {
    service: Arc<dyn TaskService>,
    state: AppState,
    /// Last sequence number handed to a list-type request
    list_seq: u64,
    in_flight: usize,
    notifications: VecDeque<Notification>,
}

impl Controller {
    pub fn new(service: Arc<dyn TaskService>) -> Self {
        Self {
            service,
            state: AppState::new(),
            list_seq: 0,
            in_flight: 0,
            notifications: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn service(&self) -> &Arc<dyn TaskService> {
        &self.service
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Dispatch, await and apply in one go
    pub async fn run(&mut self, command: Command) -> Option<Effect> {
        let pending = self.dispatch(command)?;
        let outcome = pending.await;
        self.apply(outcome)
    }

    /// Validate `command` and start its request.
    ///
    /// Returns `None` when nothing was sent: the command was purely local or
    /// failed validation (the error is already queued as a notification).
    pub fn dispatch(&mut self, command: Command) -> Option<PendingRequest> {
        debug!(?command, "dispatching command");

        match command {
            Command::Restore => {
                if !self.service.is_authenticated() {
                    return Some(future::ready(Outcome::SignedOut).boxed());
                }
                self.state.set_user(self.service.current_username());
                let seq = self.begin_list();
                Some(self.request(move |service| async move {
                    let data = fetch_all(service.as_ref(), &TaskFilter::default()).await;
                    Outcome::Restored { seq, data }
                }))
            }
            Command::Login(credentials) => {
                self.validate(credentials.validate())?;
                let seq = self.begin_list();
                Some(self.request(move |service| async move {
                    match service.login(&credentials).await {
                        Ok(response) => {
                            let data = fetch_all(service.as_ref(), &TaskFilter::default()).await;
                            Outcome::SignedIn {
                                seq,
                                username: response.username,
                                returning: true,
                                data,
                            }
                        }
                        Err(e) => Outcome::AuthFailed(e),
                    }
                }))
            }
            Command::Register(registration) => {
                self.validate(registration.validate())?;
                let seq = self.begin_list();
                Some(self.request(move |service| async move {
                    match service.register(&registration).await {
                        Ok(response) => {
                            let data = fetch_all(service.as_ref(), &TaskFilter::default()).await;
                            Outcome::SignedIn {
                                seq,
                                username: response.user.username,
                                returning: false,
                                data,
                            }
                        }
                        Err(e) => Outcome::AuthFailed(e),
                    }
                }))
            }
            Command::Logout => {
                if let Err(e) = self.service.logout() {
                    warn!(error = %e, "logout could not clear the stored session");
                }
                // Outstanding list responses belong to the old user
                self.list_seq += 1;
                Some(future::ready(Outcome::SignedOut).boxed())
            }
            Command::Reload => {
                let filter = self.state.filter().clone();
                let seq = self.begin_list();
                Some(self.request(move |service| async move {
                    let data = fetch_all(service.as_ref(), &filter).await;
                    Outcome::Reloaded { seq, filter, data }
                }))
            }
            Command::ShowAllTasks | Command::ClearSearch => {
                let filter = self.with_current_sort(TaskFilter::default());
                self.list(filter)
            }
            Command::FilterByCategory(id) => {
                let filter = self.with_current_sort(TaskFilter::by_category(id));
                self.list(filter)
            }
            Command::FilterByPriority(priority) => {
                let filter = self.with_current_sort(TaskFilter::by_priority(priority));
                self.list(filter)
            }
            Command::FilterByCompleted(completed) => {
                let filter = self.with_current_sort(TaskFilter::by_completed(completed));
                self.list(filter)
            }
            Command::SetSort(sort_by) => {
                let filter = TaskFilter {
                    sort_by,
                    ..self.state.filter().clone()
                };
                self.list(filter)
            }
            Command::Search(query) => {
                let query = query.trim();
                if query.is_empty() {
                    return self.dispatch(Command::ClearSearch);
                }
                let filter = self.with_current_sort(TaskFilter::by_search(query));
                self.list(filter)
            }
            Command::ShowOverdue => {
                self.state.show_overdue();
                None
            }
            Command::ShowProfile => {
                if let Some(username) = self.state.user().map(str::to_string) {
                    self.notify(Notification::info(format!("Logged in as {}", username)));
                }
                None
            }
            Command::CreateTask(draft) => {
                self.validate(draft.validate())?;
                Some(self.request(move |service| async move {
                    Outcome::TaskCreated(service.create_task(&draft).await)
                }))
            }
            Command::UpdateTask { id, draft } => {
                self.validate(draft.validate())?;
                Some(self.request(move |service| async move {
                    Outcome::TaskUpdated(service.update_task(id, &draft).await)
                }))
            }
            Command::ToggleTask(id) => Some(self.request(move |service| async move {
                Outcome::TaskToggled(service.toggle_task(id).await)
            })),
            Command::DeleteTask(id) => Some(self.request(move |service| async move {
                let result = service.delete_task(id).await;
                Outcome::TaskDeleted { id, result }
            })),
            Command::CreateCategory(draft) => {
                self.validate(draft.validate())?;
                Some(self.request(move |service| async move {
                    Outcome::CategoryCreated(service.create_category(&draft).await)
                }))
            }
            Command::UpdateCategory { id, draft } => {
                self.validate(draft.validate())?;
                Some(self.request(move |service| async move {
                    Outcome::CategoryUpdated(service.update_category(id, &draft).await)
                }))
            }
            Command::DeleteCategory(id) => Some(self.request(move |service| async move {
                let result = service.delete_category(id).await;
                Outcome::CategoryDeleted { id, result }
            })),
        }
    }

    /// Reconcile the cache with a finished request
    pub fn apply(&mut self, outcome: Outcome) -> Option<Effect> {
        if outcome.is_tracked() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }

        match outcome {
            Outcome::SignedOut => {
                self.state.clear();
                Some(Effect::ShowAuth)
            }
            Outcome::AuthFailed(e) => {
                warn!(error = %e, "authentication failed");
                self.notify(Notification::error(e.to_string()));
                None
            }
            Outcome::SignedIn {
                seq,
                username,
                returning,
                data,
            } => {
                info!(%username, "signed in");
                self.state.set_user(Some(username.clone()));
                if self.is_current(seq) {
                    if let Some(effect) = self.apply_load(data) {
                        return Some(effect);
                    }
                }
                let greeting = if returning { "Welcome back" } else { "Welcome" };
                self.notify(Notification::success(format!("{}, {}!", greeting, username)));
                Some(Effect::ShowApp)
            }
            Outcome::Restored { seq, data } => {
                if !self.is_current(seq) {
                    return None;
                }
                match self.apply_load(data) {
                    Some(effect) => Some(effect),
                    None => Some(Effect::ShowApp),
                }
            }
            Outcome::Reloaded { seq, filter, data } => {
                if !self.is_current(seq) {
                    return None;
                }
                match data {
                    Ok((categories, tasks)) => {
                        self.state.replace_categories(categories);
                        let title = title_for_filter(&filter, self.state.categories());
                        self.state.replace_tasks(filter, title, tasks);
                        None
                    }
                    Err(e) => self.fail("Failed to load data: ", e),
                }
            }
            Outcome::TasksListed {
                seq,
                filter,
                result,
            } => {
                if !self.is_current(seq) {
                    debug!(seq, latest = self.list_seq, "discarding stale task list");
                    return None;
                }
                match result {
                    Ok(tasks) => {
                        let title = title_for_filter(&filter, self.state.categories());
                        self.state.replace_tasks(filter, title, tasks);
                        None
                    }
                    Err(e) => self.fail("Failed to load tasks: ", e),
                }
            }
            Outcome::TaskCreated(result) => match result {
                Ok(task) => {
                    self.state.prepend_task(task);
                    self.notify(Notification::success("Task created successfully!"));
                    Some(Effect::TaskSaved)
                }
                Err(e) => self.fail("Failed to save task: ", e),
            },
            Outcome::TaskUpdated(result) => match result {
                Ok(task) => {
                    self.state.replace_task(task);
                    self.notify(Notification::success("Task updated successfully!"));
                    Some(Effect::TaskSaved)
                }
                Err(e) => self.fail("Failed to save task: ", e),
            },
            Outcome::TaskToggled(result) => match result {
                Ok(task) => {
                    let message = if task.is_completed {
                        "Task completed!"
                    } else {
                        "Task reopened!"
                    };
                    self.state.replace_task(task);
                    self.notify(Notification::success(message));
                    None
                }
                Err(e) => self.fail("Failed to update task: ", e),
            },
            Outcome::TaskDeleted { id, result } => match result {
                Ok(()) => {
                    self.state.remove_task(id);
                    self.notify(Notification::success("Task deleted successfully!"));
                    Some(Effect::TaskDeleted)
                }
                Err(e) => self.fail("Failed to delete task: ", e),
            },
            Outcome::CategoryCreated(result) => match result {
                Ok(category) => {
                    self.state.push_category(category);
                    self.notify(Notification::success("Category created successfully!"));
                    Some(Effect::CategorySaved)
                }
                Err(e) => self.fail("Failed to create category: ", e),
            },
            Outcome::CategoryUpdated(result) => match result {
                Ok(category) => {
                    self.state.replace_category(category);
                    self.notify(Notification::success("Category updated successfully!"));
                    Some(Effect::CategorySaved)
                }
                Err(e) => self.fail("Failed to update category: ", e),
            },
            Outcome::CategoryDeleted { id, result } => match result {
                Ok(()) => {
                    // The server nulls the category on its tasks; the next reload picks that up
                    self.state.remove_category(id);
                    self.notify(Notification::success("Category deleted successfully!"));
                    Some(Effect::CategoryDeleted)
                }
                Err(e) => self.fail("Failed to delete category: ", e),
            },
        }
    }

    fn request<F, Fut>(&self, make: F) -> PendingRequest
    where
        F: FnOnce(Arc<dyn TaskService>) -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        make(Arc::clone(&self.service)).boxed()
    }

    fn list(&mut self, filter: TaskFilter) -> Option<PendingRequest> {
        let seq = self.begin_list();
        Some(self.request(move |service| async move {
            let result = service.list_tasks(&filter).await;
            Outcome::TasksListed {
                seq,
                filter,
                result,
            }
        }))
    }

    fn with_current_sort(&self, filter: TaskFilter) -> TaskFilter {
        TaskFilter {
            sort_by: self.state.filter().sort_by,
            ..filter
        }
    }

    fn begin_list(&mut self) -> u64 {
        self.list_seq += 1;
        self.in_flight += 1;
        self.list_seq
    }

    fn is_current(&self, seq: u64) -> bool {
        seq >= self.list_seq
    }

    fn validate(&mut self, result: Result<(), ValidationError>) -> Option<()> {
        match result {
            Ok(()) => Some(()),
            Err(e) => {
                self.notify(Notification::error(e.to_string()));
                None
            }
        }
    }

    fn apply_load(&mut self, data: LoadResult) -> Option<Effect> {
        match data {
            Ok((categories, tasks)) => {
                self.state.load(categories, tasks);
                None
            }
            Err(e) => self.fail("Failed to load data: ", e),
        }
    }

    /// Queue the error; a rejected session sends the user back to the auth screen
    fn fail(&mut self, prefix: &str, error: ApiError) -> Option<Effect> {
        warn!(error = %error, "{}", prefix.trim_end_matches(": "));
        self.notify(Notification::error(format!("{}{}", prefix, error)));

        if error.is_authentication() {
            self.list_seq += 1;
            self.state.clear();
            Some(Effect::ShowAuth)
        } else {
            None
        }
    }
}

async fn fetch_all(service: &dyn TaskService, filter: &TaskFilter) -> LoadResult {
    let (categories, tasks) = future::join(service.list_categories(), service.list_tasks(filter)).await;
    Ok((categories?, tasks?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoginResponse, RegisterResponse, UserInfo};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory double that behaves like a cooperative server
    #[derive(Default)]
    struct FakeService {
        tasks: Mutex<Vec<Task>>,
        categories: Mutex<Vec<Category>>,
        authenticated: AtomicBool,
        reject_session: AtomicBool,
        fail_writes: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeService {
        fn with_tasks(tasks: Vec<Task>, categories: Vec<Category>) -> Arc<Self> {
            Arc::new(Self {
                tasks: Mutex::new(tasks),
                categories: Mutex::new(categories),
                ..Self::default()
            })
        }

        fn check(&self) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_session.load(Ordering::SeqCst) {
                self.authenticated.store(false, Ordering::SeqCst);
                return Err(ApiError::Authentication);
            }
            Ok(())
        }

        fn check_write(&self) -> Result<(), ApiError> {
            self.check()?;
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ApiError::Request {
                    status: 400,
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }

        fn next_task_id(&self) -> TaskId {
            self.tasks.lock().unwrap().iter().map(|t| t.id).max().unwrap_or(0) + 1
        }
    }

    #[async_trait]
    impl TaskService for FakeService {
        async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if credentials.password != "secret" {
                return Err(ApiError::Request {
                    status: 400,
                    message: "Unable to log in with provided credentials.".to_string(),
                });
            }
            self.authenticated.store(true, Ordering::SeqCst);
            Ok(LoginResponse {
                token: "abc".to_string(),
                user_id: Some(1),
                username: credentials.username.clone(),
            })
        }

        async fn register(&self, registration: &Registration) -> Result<RegisterResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.authenticated.store(true, Ordering::SeqCst);
            Ok(RegisterResponse {
                user: UserInfo {
                    id: Some(2),
                    username: registration.username.clone(),
                    email: Some(registration.email.clone()),
                },
                token: "def".to_string(),
            })
        }

        fn logout(&self) -> Result<(), ApiError> {
            self.authenticated.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn current_username(&self) -> Option<String> {
            self.is_authenticated().then(|| "alice".to_string())
        }

        fn is_authenticated(&self) -> bool {
            self.authenticated.load(Ordering::SeqCst)
        }

        async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
            self.check()?;
            let tasks = self.tasks.lock().unwrap();
            Ok(tasks
                .iter()
                .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
                .filter(|t| filter.category.is_none_or(|c| t.category == Some(c)))
                .filter(|t| filter.completed.is_none_or(|c| t.is_completed == c))
                .filter(|t| {
                    filter.search.as_deref().is_none_or(|s| {
                        let s = s.to_lowercase();
                        t.title.to_lowercase().contains(&s)
                            || t.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&s))
                    })
                })
                .cloned()
                .collect())
        }

        async fn get_task(&self, id: TaskId) -> Result<Task, ApiError> {
            self.check()?;
            self.tasks
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or(ApiError::Request {
                    status: 404,
                    message: "Not found.".to_string(),
                })
        }

        async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
            self.check_write()?;
            let task = Task {
                id: self.next_task_id(),
                title: draft.title.clone(),
                description: draft.description.clone(),
                priority: draft.priority,
                category: draft.category,
                category_name: None,
                due_date: draft.due_date,
                is_completed: false,
                completed_at: None,
                created_at: None,
                updated_at: None,
            };
            self.tasks.lock().unwrap().insert(0, task.clone());
            Ok(task)
        }

        async fn update_task(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, ApiError> {
            self.check_write()?;
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.iter_mut().find(|t| t.id == id).ok_or(ApiError::Request {
                status: 404,
                message: "Not found.".to_string(),
            })?;
            task.title = draft.title.clone();
            task.priority = draft.priority;
            task.category = draft.category;
            Ok(task.clone())
        }

        async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
            self.check_write()?;
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }

        async fn toggle_task(&self, id: TaskId) -> Result<Task, ApiError> {
            self.check_write()?;
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.iter_mut().find(|t| t.id == id).ok_or(ApiError::Request {
                status: 404,
                message: "Not found.".to_string(),
            })?;
            task.is_completed = !task.is_completed;
            Ok(task.clone())
        }

        async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
            self.check()?;
            Ok(self.categories.lock().unwrap().clone())
        }

        async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
            self.check_write()?;
            let mut categories = self.categories.lock().unwrap();
            let category = Category {
                id: categories.iter().map(|c| c.id).max().unwrap_or(0) + 1,
                name: draft.name.clone(),
                task_count: 0,
            };
            categories.push(category.clone());
            Ok(category)
        }

        async fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Result<Category, ApiError> {
            self.check_write()?;
            let mut categories = self.categories.lock().unwrap();
            let category = categories.iter_mut().find(|c| c.id == id).ok_or(ApiError::Request {
                status: 404,
                message: "Not found.".to_string(),
            })?;
            category.name = draft.name.clone();
            Ok(category.clone())
        }

        async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
            self.check_write()?;
            self.categories.lock().unwrap().retain(|c| c.id != id);
            for task in self.tasks.lock().unwrap().iter_mut() {
                if task.category == Some(id) {
                    task.category = None;
                }
            }
            Ok(())
        }
    }

    fn task(id: TaskId, priority: Priority, category: Option<CategoryId>) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: None,
            priority,
            category,
            category_name: None,
            due_date: None,
            is_completed: false,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn work() -> Category {
        Category {
            id: 1,
            name: "Work".to_string(),
            task_count: 0,
        }
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: password.to_string(),
        }
    }

    async fn signed_in(service: Arc<FakeService>) -> Controller {
        let mut controller = Controller::new(service);
        controller.run(Command::Login(credentials("secret"))).await;
        controller.drain_notifications();
        controller
    }

    #[tokio::test]
    async fn test_login_loads_everything() {
        let service = FakeService::with_tasks(
            vec![task(1, Priority::High, Some(1)), task(2, Priority::Low, None)],
            vec![work()],
        );
        let mut controller = Controller::new(service);

        let effect = controller.run(Command::Login(credentials("secret"))).await;

        assert_eq!(effect, Some(Effect::ShowApp));
        assert_eq!(controller.state().user(), Some("alice"));
        assert_eq!(controller.state().tasks().len(), 2);
        assert_eq!(controller.state().categories()[0].task_count, 1);
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::success("Welcome back, alice!")]
        );
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_register_greets_new_user() {
        let mut controller = Controller::new(FakeService::with_tasks(vec![], vec![]));
        let registration = Registration {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "pw".to_string(),
        };

        let effect = controller.run(Command::Register(registration)).await;

        assert_eq!(effect, Some(Effect::ShowApp));
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::success("Welcome, bob!")]
        );
    }

    #[tokio::test]
    async fn test_rejected_login_reports_server_message() {
        let mut controller = Controller::new(FakeService::with_tasks(vec![], vec![]));

        let effect = controller.run(Command::Login(credentials("wrong"))).await;

        assert_eq!(effect, None);
        assert!(controller.state().user().is_none());
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::error("Unable to log in with provided credentials.")]
        );
        assert_eq!(controller.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_invalid_login_sends_nothing() {
        let service = FakeService::with_tasks(vec![], vec![]);
        let mut controller = Controller::new(service.clone());

        assert!(controller.dispatch(Command::Login(credentials(""))).is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::error("Password is required")]
        );
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_restore_without_session_shows_auth() {
        let mut controller = Controller::new(FakeService::with_tasks(vec![], vec![]));
        assert_eq!(controller.run(Command::Restore).await, Some(Effect::ShowAuth));
    }

    #[tokio::test]
    async fn test_restore_with_session_loads_data() {
        let service = FakeService::with_tasks(vec![task(1, Priority::Low, None)], vec![]);
        service.authenticated.store(true, Ordering::SeqCst);
        let mut controller = Controller::new(service);

        assert_eq!(controller.run(Command::Restore).await, Some(Effect::ShowApp));
        assert_eq!(controller.state().user(), Some("alice"));
        assert_eq!(controller.state().tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_create_prepends_server_task() {
        let service = FakeService::with_tasks(vec![task(3, Priority::Medium, None)], vec![]);
        let mut controller = signed_in(service).await;

        let draft = TaskDraft {
            title: "Buy milk".to_string(),
            priority: Priority::Low,
            ..TaskDraft::default()
        };
        let effect = controller.run(Command::CreateTask(draft)).await;

        assert_eq!(effect, Some(Effect::TaskSaved));
        let ids: Vec<_> = controller.state().tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3]);
        assert_eq!(controller.state().tasks()[0].title, "Buy milk");
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::success("Task created successfully!")]
        );
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected_locally() {
        let service = FakeService::with_tasks(vec![], vec![]);
        let mut controller = signed_in(service.clone()).await;
        let calls = service.calls.load(Ordering::SeqCst);

        assert!(controller.dispatch(Command::CreateTask(TaskDraft::new(" "))).is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), calls);
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::error("Title is required")]
        );
    }

    #[tokio::test]
    async fn test_failed_update_keeps_cache() {
        let service = FakeService::with_tasks(vec![task(1, Priority::Low, None)], vec![]);
        let mut controller = signed_in(service.clone()).await;
        service.fail_writes.store(true, Ordering::SeqCst);

        let effect = controller
            .run(Command::UpdateTask {
                id: 1,
                draft: TaskDraft::new("Renamed"),
            })
            .await;

        assert_eq!(effect, None);
        assert_eq!(controller.state().tasks()[0].title, "Task 1");
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::error("Failed to save task: boom")]
        );
    }

    #[tokio::test]
    async fn test_toggle_flips_only_target() {
        let service = FakeService::with_tasks(
            vec![
                task(1, Priority::Low, None),
                task(2, Priority::Low, None),
                task(3, Priority::Low, None),
            ],
            vec![],
        );
        let mut controller = signed_in(service).await;

        controller.run(Command::ToggleTask(2)).await;

        let flags: Vec<_> = controller
            .state()
            .tasks()
            .iter()
            .map(|t| t.is_completed)
            .collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::success("Task completed!")]
        );

        controller.run(Command::ToggleTask(2)).await;
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::success("Task reopened!")]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_from_cache() {
        let service = FakeService::with_tasks(vec![task(7, Priority::Low, Some(1))], vec![work()]);
        let mut controller = signed_in(service).await;

        let effect = controller.run(Command::DeleteTask(7)).await;

        assert_eq!(effect, Some(Effect::TaskDeleted));
        assert!(controller.state().task(7).is_none());
        assert_eq!(controller.state().categories()[0].task_count, 0);
    }

    #[tokio::test]
    async fn test_stale_list_response_is_discarded() {
        let service = FakeService::with_tasks(
            vec![task(1, Priority::High, None), task(2, Priority::Low, None)],
            vec![],
        );
        let mut controller = signed_in(service).await;

        let high = controller
            .dispatch(Command::FilterByPriority(Priority::High))
            .unwrap();
        let low = controller
            .dispatch(Command::FilterByPriority(Priority::Low))
            .unwrap();
        assert_eq!(controller.in_flight(), 2);

        let newer = low.await;
        controller.apply(newer);
        let older = high.await;
        controller.apply(older);

        let ids: Vec<_> = controller.state().tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(controller.state().page_title(), "Low Priority Tasks");
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_empty_search_shows_all() {
        let service = FakeService::with_tasks(
            vec![task(1, Priority::High, None), task(2, Priority::Low, None)],
            vec![],
        );
        let mut controller = signed_in(service).await;

        controller.run(Command::Search("Task 1".to_string())).await;
        assert_eq!(controller.state().tasks().len(), 1);
        assert_eq!(controller.state().page_title(), "Search: \"Task 1\"");

        controller.run(Command::Search("   ".to_string())).await;
        assert_eq!(controller.state().tasks().len(), 2);
        assert!(controller.state().filter().search.is_none());
        assert_eq!(controller.state().page_title(), "All Tasks");
    }

    #[tokio::test]
    async fn test_sort_survives_filter_change() {
        let service = FakeService::with_tasks(vec![task(1, Priority::High, None)], vec![]);
        let mut controller = signed_in(service).await;

        controller.run(Command::SetSort(Some(SortOrder::DueDate))).await;
        controller.run(Command::FilterByCompleted(false)).await;

        assert_eq!(controller.state().filter().sort_by, Some(SortOrder::DueDate));
        assert_eq!(controller.state().filter().completed, Some(false));
        assert_eq!(controller.state().page_title(), "Pending Tasks");
    }

    #[tokio::test]
    async fn test_category_delete_leaves_tasks() {
        let service = FakeService::with_tasks(vec![task(1, Priority::Low, Some(1))], vec![work()]);
        let mut controller = signed_in(service).await;

        let effect = controller.run(Command::DeleteCategory(1)).await;

        assert_eq!(effect, Some(Effect::CategoryDeleted));
        assert!(controller.state().categories().is_empty());
        assert_eq!(controller.state().tasks()[0].category, Some(1));

        controller.run(Command::Reload).await;
        assert_eq!(controller.state().tasks()[0].category, None);
    }

    #[tokio::test]
    async fn test_category_create_appends() {
        let service = FakeService::with_tasks(vec![], vec![work()]);
        let mut controller = signed_in(service).await;

        let effect = controller
            .run(Command::CreateCategory(CategoryDraft::new("Home")))
            .await;

        assert_eq!(effect, Some(Effect::CategorySaved));
        let names: Vec<_> = controller
            .state()
            .categories()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Work", "Home"]);
    }

    #[tokio::test]
    async fn test_expired_session_returns_to_auth() {
        let service = FakeService::with_tasks(vec![task(1, Priority::Low, None)], vec![]);
        let mut controller = signed_in(service.clone()).await;
        service.reject_session.store(true, Ordering::SeqCst);

        let effect = controller.run(Command::ShowAllTasks).await;

        assert_eq!(effect, Some(Effect::ShowAuth));
        assert!(controller.state().user().is_none());
        assert!(controller.state().tasks().is_empty());
        assert_eq!(
            controller.drain_notifications(),
            vec![Notification::error("Failed to load tasks: Authentication failed")]
        );
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_logout_clears_state() {
        let service = FakeService::with_tasks(vec![task(1, Priority::Low, None)], vec![work()]);
        let mut controller = signed_in(service.clone()).await;

        assert_eq!(controller.run(Command::Logout).await, Some(Effect::ShowAuth));
        assert!(!service.is_authenticated());
        assert!(controller.state().tasks().is_empty());
        assert!(controller.state().categories().is_empty());
    }

    #[tokio::test]
    async fn test_overdue_is_local() {
        let service = FakeService::with_tasks(vec![task(1, Priority::Low, None)], vec![]);
        let mut controller = signed_in(service.clone()).await;
        let calls = service.calls.load(Ordering::SeqCst);

        assert!(controller.dispatch(Command::ShowOverdue).is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), calls);
        assert_eq!(controller.state().page_title(), "Overdue Tasks");
        assert_eq!(controller.state().tasks().len(), 1);
    }
}
