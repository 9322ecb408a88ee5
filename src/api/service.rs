use async_trait::async_trait;

use crate::api::{ApiError, AuthClient, CategoriesClient, HttpClient, TasksClient};
use crate::models::{
    Category, CategoryDraft, CategoryId, Credentials, LoginResponse, RegisterResponse,
    Registration, Task, TaskDraft, TaskFilter, TaskId,
};
use crate::session;

/// Everything the controller needs from the remote service.
///
/// Object safe so the controller can hold an `Arc<dyn TaskService>` and tests
/// can substitute an in-memory double.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
    async fn register(&self, registration: &Registration) -> Result<RegisterResponse, ApiError>;
    fn logout(&self) -> Result<(), ApiError>;
    fn current_username(&self) -> Option<String>;
    fn is_authenticated(&self) -> bool;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError>;
    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError>;
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError>;
    async fn update_task(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, ApiError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError>;
    async fn toggle_task(&self, id: TaskId) -> Result<Task, ApiError>;

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
    async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ApiError>;
    async fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Result<Category, ApiError>;
    async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError>;
}

/// The REST implementation of [`TaskService`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    auth: AuthClient,
    tasks: TasksClient,
    categories: CategoriesClient,
}

impl ApiClient {
    pub fn new(http: HttpClient) -> Self {
        Self {
            auth: AuthClient::new(http.clone()),
            tasks: TasksClient::new(http.clone()),
            categories: CategoriesClient::new(http.clone()),
            http,
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[async_trait]
impl TaskService for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.auth.login(credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<RegisterResponse, ApiError> {
        self.auth.register(registration).await
    }

    fn logout(&self) -> Result<(), ApiError> {
        self.auth.logout()
    }

    fn current_username(&self) -> Option<String> {
        session::lock(self.http.session())
            .current_username()
            .map(str::to_string)
    }

    fn is_authenticated(&self) -> bool {
        session::lock(self.http.session()).is_authenticated()
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        self.tasks.list(filter).await
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError> {
        self.tasks.get(id).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.tasks.create(draft).await
    }

    async fn update_task(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.tasks.update(id, draft).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        self.tasks.delete(id).await
    }

    async fn toggle_task(&self, id: TaskId) -> Result<Task, ApiError> {
        self.tasks.toggle(id).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.categories.list().await
    }

    async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
        self.categories.create(draft).await
    }

    async fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Result<Category, ApiError> {
        self.categories.update(id, draft).await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.categories.delete(id).await
    }
}
