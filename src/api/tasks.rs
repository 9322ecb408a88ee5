use reqwest::Method;

use crate::api::{ApiError, HttpClient, RequestOptions};
use crate::models::{Task, TaskDraft, TaskFilter, TaskId};

#[derive(Debug, Clone)]
pub struct TasksClient {
    http: HttpClient,
}

impl TasksClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// `/tasks/` with only the filter's present fields as query parameters
    pub fn list_endpoint(filter: &TaskFilter) -> String {
        let query = filter.to_query_string();
        if query.is_empty() {
            "/tasks/".to_string()
        } else {
            format!("/tasks/?{}", query)
        }
    }

    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        self.http
            .request_json(&Self::list_endpoint(filter), RequestOptions::get())
            .await
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, ApiError> {
        self.http
            .request_json(&format!("/tasks/{}/", id), RequestOptions::get())
            .await
    }

    pub async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        let options = RequestOptions::json(Method::POST, draft)?;
        self.http.request_json("/tasks/", options).await
    }

    pub async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, ApiError> {
        let options = RequestOptions::json(Method::PUT, draft)?;
        self.http
            .request_json(&format!("/tasks/{}/", id), options)
            .await
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        self.http
            .request(&format!("/tasks/{}/", id), RequestOptions::delete())
            .await?;
        Ok(())
    }

    /// Flip completion server-side; returns the full updated task
    pub async fn toggle(&self, id: TaskId) -> Result<Task, ApiError> {
        self.http
            .request_json(&format!("/tasks/{}/toggle/", id), RequestOptions::patch())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    #[test]
    fn test_list_endpoint_without_filter() {
        assert_eq!(TasksClient::list_endpoint(&TaskFilter::default()), "/tasks/");
    }

    #[test]
    fn test_list_endpoint_with_filter() {
        let filter = TaskFilter {
            priority: Some(Priority::High),
            search: Some(String::new()),
            ..TaskFilter::default()
        };
        assert_eq!(TasksClient::list_endpoint(&filter), "/tasks/?priority=high");
    }
}
