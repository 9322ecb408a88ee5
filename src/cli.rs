use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::api::{ApiClient, ApiError, TaskService};
use crate::models::{
    Category, CategoryDraft, CategoryId, Credentials, Priority, Registration, SortOrder, Task,
    TaskDraft, TaskFilter, TaskId, ValidationError,
};
use crate::session::SessionError;
use crate::utils::{format_due_date_short, parse_due_date};

#[derive(Parser)]
#[command(name = "tasker")]
#[command(about = "Terminal client for a personal task service")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (separate config, session and logs)
    #[arg(long)]
    pub dev: bool,

    /// Override the API base URL from the config file
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Log filter directive, e.g. "debug" or "tasker=trace"
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List tasks
    List(ListArgs),
    /// Show one task in full
    Show { id: TaskId },
    /// Add a new task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Category id
        #[arg(short, long)]
        category: Option<CategoryId>,
        /// Due date (YYYY-MM-DD or "YYYY-MM-DD HH:MM", local time)
        #[arg(long)]
        due: Option<String>,
    },
    /// Change fields of an existing task
    Edit(EditArgs),
    /// Flip a task between done and open
    Toggle { id: TaskId },
    /// Delete a task
    Delete { id: TaskId },
    /// List categories with their task counts
    Categories,
    /// Add a category
    AddCategory { name: String },
    /// Rename a category
    RenameCategory { id: CategoryId, name: String },
    /// Delete a category; its tasks become uncategorized
    DeleteCategory { id: CategoryId },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only tasks in this category id
    #[arg(long)]
    pub category: Option<CategoryId>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    /// Only completed tasks
    #[arg(long, conflicts_with = "pending")]
    pub completed: bool,
    /// Only open tasks
    #[arg(long)]
    pub pending: bool,
    /// Match title or description
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,
    /// Only open tasks past their due date
    #[arg(long)]
    pub overdue: bool,
}

impl ListArgs {
    pub fn to_filter(&self) -> TaskFilter {
        let completed = match (self.completed, self.pending) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        TaskFilter {
            category: self.category,
            priority: self.priority,
            completed,
            search: self.search.clone(),
            sort_by: self.sort,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    pub id: TaskId,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long, value_enum)]
    pub priority: Option<Priority>,
    #[arg(short, long, conflicts_with = "no_category")]
    pub category: Option<CategoryId>,
    /// Remove the task from its category
    #[arg(long)]
    pub no_category: bool,
    #[arg(long, conflicts_with = "no_due")]
    pub due: Option<String>,
    /// Clear the due date
    #[arg(long)]
    pub no_due: bool,
}

impl EditArgs {
    /// Overlay the given flags on the task's current values
    pub fn apply_to(&self, task: &Task) -> Result<TaskDraft, CliError> {
        let mut draft = TaskDraft::from(task);
        if let Some(ref title) = self.title {
            draft.title = title.clone();
        }
        if let Some(ref description) = self.description {
            draft.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if self.no_category {
            draft.category = None;
        } else if self.category.is_some() {
            draft.category = self.category;
        }
        if self.no_due {
            draft.due_date = None;
        } else if let Some(ref due) = self.due {
            draft.due_date = parse_due(due)?;
        }
        Ok(draft)
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Not logged in. Run `tasker login` first.")]
    NotAuthenticated,
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn parse_due(input: &str) -> Result<Option<DateTime<Utc>>, CliError> {
    parse_due_date(input).map_err(CliError::DateParseError)
}

fn require_login(client: &ApiClient) -> Result<(), CliError> {
    if client.is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotAuthenticated)
    }
}

fn read_password(given: Option<String>) -> Result<String, CliError> {
    if let Some(password) = given {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn handle_login(
    client: &ApiClient,
    username: String,
    password: Option<String>,
) -> Result<(), CliError> {
    let credentials = Credentials {
        username,
        password: read_password(password)?,
    };
    credentials.validate()?;
    let response = client.login(&credentials).await?;
    println!("Welcome back, {}!", response.username);
    Ok(())
}

pub async fn handle_register(
    client: &ApiClient,
    username: String,
    email: String,
    password: Option<String>,
) -> Result<(), CliError> {
    let registration = Registration {
        username,
        email,
        password: read_password(password)?,
    };
    registration.validate()?;
    let response = client.register(&registration).await?;
    println!("Welcome, {}!", response.user.username);
    Ok(())
}

pub fn handle_logout(client: &ApiClient) -> Result<(), CliError> {
    client.logout()?;
    println!("Logged out");
    Ok(())
}

pub fn handle_whoami(client: &ApiClient) -> Result<(), CliError> {
    require_login(client)?;
    match client.current_username() {
        Some(username) => println!("Logged in as {}", username),
        None => println!("Logged in"),
    }
    Ok(())
}

pub async fn handle_list(client: &ApiClient, args: ListArgs) -> Result<(), CliError> {
    require_login(client)?;
    let filter = args.to_filter();
    let (categories, tasks) =
        futures::future::try_join(client.list_categories(), client.list_tasks(&filter)).await?;

    let now = Utc::now();
    let tasks: Vec<&Task> = tasks
        .iter()
        .filter(|t| !args.overdue || t.is_overdue(now))
        .collect();

    if tasks.is_empty() {
        println!("No tasks found");
        return Ok(());
    }
    for task in tasks {
        println!("{}", format_task_line(task, &categories));
    }
    Ok(())
}

pub async fn handle_show(client: &ApiClient, id: TaskId) -> Result<(), CliError> {
    require_login(client)?;
    let (categories, task) =
        futures::future::try_join(client.list_categories(), client.get_task(id)).await?;
    print!("{}", format_task_detail(&task, &categories));
    Ok(())
}

pub async fn handle_add(
    client: &ApiClient,
    title: String,
    description: Option<String>,
    priority: Priority,
    category: Option<CategoryId>,
    due: Option<String>,
) -> Result<(), CliError> {
    require_login(client)?;
    let draft = TaskDraft {
        title,
        description: description.filter(|d| !d.is_empty()),
        priority,
        category,
        due_date: match due {
            Some(ref due) => parse_due(due)?,
            None => None,
        },
    };
    draft.validate()?;

    let task = client.create_task(&draft).await?;
    println!("Task created successfully (ID: {})", task.id);
    Ok(())
}

pub async fn handle_edit(client: &ApiClient, args: EditArgs) -> Result<(), CliError> {
    require_login(client)?;
    let current = client.get_task(args.id).await?;
    let draft = args.apply_to(&current)?;
    draft.validate()?;

    let task = client.update_task(args.id, &draft).await?;
    println!("Task updated successfully (ID: {})", task.id);
    Ok(())
}

pub async fn handle_toggle(client: &ApiClient, id: TaskId) -> Result<(), CliError> {
    require_login(client)?;
    let task = client.toggle_task(id).await?;
    if task.is_completed {
        println!("Task completed!");
    } else {
        println!("Task reopened!");
    }
    Ok(())
}

pub async fn handle_delete(client: &ApiClient, id: TaskId) -> Result<(), CliError> {
    require_login(client)?;
    client.delete_task(id).await?;
    println!("Task deleted successfully!");
    Ok(())
}

pub async fn handle_categories(client: &ApiClient) -> Result<(), CliError> {
    require_login(client)?;
    let (mut categories, tasks) = futures::future::try_join(
        client.list_categories(),
        client.list_tasks(&TaskFilter::default()),
    )
    .await?;

    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    for category in &mut categories {
        category.task_count = tasks.iter().filter(|t| t.category == Some(category.id)).count();
        println!("#{:<4} {} ({})", category.id, category.name, category.task_count);
    }
    Ok(())
}

pub async fn handle_add_category(client: &ApiClient, name: String) -> Result<(), CliError> {
    require_login(client)?;
    let draft = CategoryDraft::new(name);
    draft.validate()?;
    let category = client.create_category(&draft).await?;
    println!("Category created successfully (ID: {})", category.id);
    Ok(())
}

pub async fn handle_rename_category(
    client: &ApiClient,
    id: CategoryId,
    name: String,
) -> Result<(), CliError> {
    require_login(client)?;
    let draft = CategoryDraft::new(name);
    draft.validate()?;
    client.update_category(id, &draft).await?;
    println!("Category updated successfully!");
    Ok(())
}

pub async fn handle_delete_category(client: &ApiClient, id: CategoryId) -> Result<(), CliError> {
    require_login(client)?;
    client.delete_category(id).await?;
    println!("Category deleted successfully!");
    Ok(())
}

fn category_label<'a>(task: &'a Task, categories: &'a [Category]) -> Option<&'a str> {
    task.category_name.as_deref().or_else(|| {
        task.category
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .map(|c| c.name.as_str())
    })
}

/// One line per task: `[x] #7    high    Buy milk (Work) due Mar 04 17:30`
pub fn format_task_line(task: &Task, categories: &[Category]) -> String {
    let mut line = format!(
        "[{}] #{:<4} {:<6}  {}",
        if task.is_completed { "x" } else { " " },
        task.id,
        task.priority.as_str(),
        task.title
    );
    if let Some(name) = category_label(task, categories) {
        line.push_str(&format!(" ({})", name));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", format_due_date_short(due)));
    }
    line
}

pub fn format_task_detail(task: &Task, categories: &[Category]) -> String {
    let mut out = format!("#{} {}\n", task.id, task.title);
    out.push_str(&format!(
        "Status:   {}\n",
        if task.is_completed { "completed" } else { "open" }
    ));
    out.push_str(&format!("Priority: {}\n", task.priority));
    if let Some(name) = category_label(task, categories) {
        out.push_str(&format!("Category: {}\n", name));
    }
    if let Some(due) = task.due_date {
        out.push_str(&format!("Due:      {}\n", format_due_date_short(due)));
    }
    if let Some(ref description) = task.description {
        if !description.is_empty() {
            out.push_str(&format!("\n{}\n", description));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn task() -> Task {
        Task {
            id: 7,
            title: "Buy milk".to_string(),
            description: Some("two litres".to_string()),
            priority: Priority::Low,
            category: Some(1),
            category_name: None,
            due_date: None,
            is_completed: true,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn categories() -> Vec<Category> {
        vec![Category {
            id: 1,
            name: "Home".to_string(),
            task_count: 0,
        }]
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_flags_build_filter() {
        let cli = Cli::parse_from([
            "tasker", "list", "--priority", "high", "--pending", "--sort", "due-date",
        ]);
        let Some(Commands::List(args)) = cli.command else {
            panic!("expected list");
        };
        let filter = args.to_filter();
        assert_eq!(filter.priority, Some(Priority::High));
        assert_eq!(filter.completed, Some(false));
        assert_eq!(filter.sort_by, Some(SortOrder::DueDate));
        assert_eq!(filter.to_query_string(), "priority=high&completed=false&sort_by=due_date");
    }

    #[test]
    fn test_completed_conflicts_with_pending() {
        assert!(Cli::try_parse_from(["tasker", "list", "--completed", "--pending"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["tasker", "--dev", "--api-url", "http://localhost:9000/api"]);
        assert!(cli.dev);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/api"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_edit_overlays_only_given_fields() {
        let args = EditArgs {
            id: 7,
            title: Some("Buy oat milk".to_string()),
            no_category: true,
            ..EditArgs::default()
        };

        let draft = args.apply_to(&task()).unwrap();

        assert_eq!(draft.title, "Buy oat milk");
        assert_eq!(draft.priority, Priority::Low);
        assert_eq!(draft.category, None);
        assert_eq!(draft.description.as_deref(), Some("two litres"));
    }

    #[test]
    fn test_edit_rejects_bad_due_date() {
        let args = EditArgs {
            id: 7,
            due: Some("tomorrow".to_string()),
            ..EditArgs::default()
        };
        assert!(matches!(
            args.apply_to(&task()),
            Err(CliError::DateParseError(_))
        ));
    }

    #[test]
    fn test_task_line_uses_category_name() {
        let line = format_task_line(&task(), &categories());
        assert_eq!(line, "[x] #7    low     Buy milk (Home)");
    }

    #[test]
    fn test_task_detail() {
        let detail = format_task_detail(&task(), &categories());
        assert!(detail.starts_with("#7 Buy milk\n"));
        assert!(detail.contains("Status:   completed"));
        assert!(detail.contains("Category: Home"));
        assert!(detail.ends_with("two litres\n"));
    }
}
