use crate::controller::Command;
use crate::models::{
    Category, CategoryDraft, CategoryId, Credentials, Priority, Registration, Task, TaskDraft, TaskId,
};
use crate::tui::widgets::input::TextInput;
use crate::utils::{format_due_date_for_input, parse_due_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub current_field: AuthField,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            username: TextInput::new(),
            email: TextInput::new(),
            password: TextInput::masked(),
            current_field: AuthField::Username,
        }
    }
}

impl AuthForm {
    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => &[AuthField::Username, AuthField::Password],
            AuthMode::Register => &[AuthField::Username, AuthField::Email, AuthField::Password],
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = step(self.fields(), self.current_field, true);
    }

    pub fn previous_field(&mut self) {
        self.current_field = step(self.fields(), self.current_field, false);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        if !self.fields().contains(&self.current_field) {
            self.current_field = AuthField::Username;
        }
    }

    pub fn active_input(&mut self) -> &mut TextInput {
        match self.current_field {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    /// Called whenever the auth screen comes back
    pub fn clear_password(&mut self) {
        self.password.clear();
    }

    pub fn to_command(&self) -> Command {
        let username = self.username.value().trim().to_string();
        let password = self.password.value().to_string();
        match self.mode {
            AuthMode::Login => Command::Login(Credentials { username, password }),
            AuthMode::Register => Command::Register(Registration {
                username,
                email: self.email.value().trim().to_string(),
                password,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Priority,
    Category,
    DueDate,
}

impl TaskField {
    pub const ALL: [TaskField; 5] = [
        TaskField::Title,
        TaskField::Description,
        TaskField::Priority,
        TaskField::Category,
        TaskField::DueDate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskField::Title => "Title",
            TaskField::Description => "Description",
            TaskField::Priority => "Priority",
            TaskField::Category => "Category",
            TaskField::DueDate => "Due (YYYY-MM-DD [HH:MM])",
        }
    }

    /// Priority and category are picked with Left/Right instead of typed
    pub fn is_text(&self) -> bool {
        matches!(self, TaskField::Title | TaskField::Description | TaskField::DueDate)
    }
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    /// `None` while creating
    pub editing: Option<TaskId>,
    pub title: TextInput,
    pub description: TextInput,
    pub priority: Priority,
    pub category: Option<CategoryId>,
    pub due_date: TextInput,
    pub current_field: TaskField,
}

impl TaskForm {
    /// A blank form, pre-selecting the category currently being browsed
    pub fn new(category: Option<CategoryId>) -> Self {
        Self {
            editing: None,
            title: TextInput::new(),
            description: TextInput::new(),
            priority: Priority::default(),
            category,
            due_date: TextInput::new(),
            current_field: TaskField::Title,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            editing: Some(task.id),
            title: TextInput::with_value(task.title.clone()),
            description: TextInput::with_value(task.description.clone().unwrap_or_default()),
            priority: task.priority,
            category: task.category,
            due_date: TextInput::with_value(
                task.due_date.map(format_due_date_for_input).unwrap_or_default(),
            ),
            current_field: TaskField::Title,
        }
    }

    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() { "Edit Task" } else { "New Task" }
    }

    pub fn next_field(&mut self) {
        self.current_field = step(&TaskField::ALL, self.current_field, true);
    }

    pub fn previous_field(&mut self) {
        self.current_field = step(&TaskField::ALL, self.current_field, false);
    }

    pub fn active_input(&mut self) -> Option<&mut TextInput> {
        match self.current_field {
            TaskField::Title => Some(&mut self.title),
            TaskField::Description => Some(&mut self.description),
            TaskField::DueDate => Some(&mut self.due_date),
            TaskField::Priority | TaskField::Category => None,
        }
    }

    /// Left/Right on a choice field
    pub fn cycle_choice(&mut self, categories: &[Category], forward: bool) {
        match self.current_field {
            TaskField::Priority => {
                self.priority = if forward { self.priority.next() } else { self.priority.previous() };
            }
            TaskField::Category => {
                self.category = cycle_category(categories, self.category, forward);
            }
            _ => {}
        }
    }

    /// Build the create or update command; the due date is the only field checked here
    pub fn to_command(&self) -> Result<Command, String> {
        let description = self.description.value().trim();
        let draft = TaskDraft {
            title: self.title.value().trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            priority: self.priority,
            category: self.category,
            due_date: parse_due_date(self.due_date.value())?,
        };
        Ok(match self.editing {
            Some(id) => Command::UpdateTask { id, draft },
            None => Command::CreateTask(draft),
        })
    }
}

/// `None` (uncategorized) sits before the first category in the cycle
fn cycle_category(
    categories: &[Category],
    current: Option<CategoryId>,
    forward: bool,
) -> Option<CategoryId> {
    let mut choices: Vec<Option<CategoryId>> = vec![None];
    choices.extend(categories.iter().map(|c| Some(c.id)));

    let position = choices.iter().position(|c| *c == current).unwrap_or(0);
    let next = if forward {
        (position + 1) % choices.len()
    } else {
        (position + choices.len() - 1) % choices.len()
    };
    choices[next]
}

#[derive(Debug, Clone)]
pub struct CategoryForm {
    pub editing: Option<CategoryId>,
    pub name: TextInput,
}

impl CategoryForm {
    pub fn new() -> Self {
        Self {
            editing: None,
            name: TextInput::new(),
        }
    }

    pub fn from_category(category: &Category) -> Self {
        Self {
            editing: Some(category.id),
            name: TextInput::with_value(category.name.clone()),
        }
    }

    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() { "Rename Category" } else { "New Category" }
    }

    pub fn to_command(&self) -> Command {
        let draft = CategoryDraft::new(self.name.value().trim());
        match self.editing {
            Some(id) => Command::UpdateCategory { id, draft },
            None => Command::CreateCategory(draft),
        }
    }
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self::new()
    }
}

/// What the delete confirmation modal is asking about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Task { id: TaskId, title: String },
    Category { id: CategoryId, name: String },
}

impl DeleteTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            DeleteTarget::Task { .. } => "task",
            DeleteTarget::Category { .. } => "category",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DeleteTarget::Task { title, .. } => title,
            DeleteTarget::Category { name, .. } => name,
        }
    }

    pub fn to_command(&self) -> Command {
        match self {
            DeleteTarget::Task { id, .. } => Command::DeleteTask(*id),
            DeleteTarget::Category { id, .. } => Command::DeleteCategory(*id),
        }
    }
}

fn step<T: Copy + PartialEq>(items: &[T], current: T, forward: bool) -> T {
    let len = items.len();
    let position = items.iter().position(|item| *item == current).unwrap_or(0);
    let next = if forward { (position + 1) % len } else { (position + len - 1) % len };
    items[next]
}
