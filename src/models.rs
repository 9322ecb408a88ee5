use chrono::{DateTime, Utc};
use clap::ValueEnum;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type TaskId = i64;
pub type CategoryId = i64;

/// Characters left unescaped in query values (same set as URLSearchParams, minus `+` for spaces)
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Capitalized label used in page titles ("High Priority Tasks")
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Priority::Low => Priority::High,
            Priority::Medium => Priority::Low,
            Priority::High => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side ordering understood by the task list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    DueDate,
    Priority,
    CreatedAt,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DueDate => "due_date",
            SortOrder::Priority => "priority",
            SortOrder::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A task is overdue when it has a due date in the past and is still open
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Option<CategoryId>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check(&[("title", &self.title)])
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            category: task.category,
            due_date: task.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Derived locally from the cached tasks, never trusted from the server
    #[serde(default, skip_serializing)]
    pub task_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check(&[("name", &self.name)])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check(&[("username", &self.username), ("password", &self.password)])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check(&[
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisterResponse {
    pub user: UserInfo,
    pub token: String,
}

/// Sparse query for the task list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub category: Option<CategoryId>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<SortOrder>,
}

impl TaskFilter {
    pub fn by_category(category: CategoryId) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn by_priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn by_completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn by_search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Present fields only; empty strings are treated as absent
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if let Some(completed) = self.completed {
            pairs.push(("completed", completed.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(sort_by) = self.sort_by {
            pairs.push(("sort_by", sort_by.as_str().to_string()));
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, QUERY_ENCODE_SET)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Client-side required-field failures, reported before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join(", "))]
pub struct ValidationError(pub Vec<String>);

impl ValidationError {
    /// Every blank field yields "<Field> is required"
    pub fn check(fields: &[(&str, &str)]) -> Result<(), ValidationError> {
        let errors: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| format!("{} is required", capitalize(name)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(errors))
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_omits_empty_search() {
        let filter = TaskFilter {
            priority: Some(Priority::High),
            search: Some(String::new()),
            ..TaskFilter::default()
        };
        assert_eq!(filter.to_query_string(), "priority=high");
    }

    #[test]
    fn test_empty_filter_has_no_query() {
        assert!(TaskFilter::default().is_empty());
        assert_eq!(TaskFilter::default().to_query_string(), "");
    }

    #[test]
    fn test_filter_encodes_search_terms() {
        let filter = TaskFilter {
            category: Some(3),
            completed: Some(false),
            search: Some("buy milk & eggs".to_string()),
            ..TaskFilter::default()
        };
        assert_eq!(
            filter.to_query_string(),
            "category=3&completed=false&search=buy%20milk%20%26%20eggs"
        );
    }

    #[test]
    fn test_filter_includes_sort_order() {
        let filter = TaskFilter {
            sort_by: Some(SortOrder::DueDate),
            ..TaskFilter::default()
        };
        assert_eq!(filter.to_query_string(), "sort_by=due_date");
    }

    #[test]
    fn test_task_deserializes_server_payload() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "title": "Buy milk",
            "description": null,
            "is_completed": false,
            "priority": "low",
            "category": 2,
            "due_date": "2024-05-01T09:30:00Z",
            "created_at": "2024-04-01T08:00:00Z",
            "updated_at": "2024-04-01T08:00:00Z",
            "user": "alice"
        }))
        .unwrap();

        assert_eq!(task.id, 7);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.category, Some(2));
        assert!(task.due_date.is_some());
        assert!(task.category_name.is_none());
    }

    #[test]
    fn test_task_defaults_missing_fields() {
        let task: Task = serde_json::from_value(json!({"id": 1, "title": "Minimal"})).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.is_completed);
        assert!(task.category.is_none());
    }

    #[test]
    fn test_draft_serializes_null_category() {
        let draft = TaskDraft {
            title: "Buy milk".to_string(),
            priority: Priority::Low,
            ..TaskDraft::default()
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["priority"], "low");
        assert!(value["category"].is_null());
        assert!(value["due_date"].is_null());
    }

    #[test]
    fn test_validation_messages() {
        let draft = TaskDraft::new("   ");
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let registration = Registration::default();
        let err = registration.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Username is required, Email is required, Password is required"
        );
    }

    #[test]
    fn test_category_count_not_sent() {
        let category = Category {
            id: 1,
            name: "Work".to_string(),
            task_count: 4,
        };
        let value = serde_json::to_value(&category).unwrap();
        assert!(value.get("task_count").is_none());
    }

    #[test]
    fn test_overdue_excludes_completed() {
        let now = Utc::now();
        let mut task: Task =
            serde_json::from_value(json!({"id": 1, "title": "Late"})).unwrap();
        task.due_date = Some(now - chrono::Duration::hours(1));
        assert!(task.is_overdue(now));

        task.is_completed = true;
        assert!(!task.is_overdue(now));
    }
}
