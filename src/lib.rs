pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod logging;
pub mod models;
pub mod session;
pub mod state;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use controller::{Command, Controller, Effect, Notification, NotificationKind, Outcome};
pub use models::{Category, Priority, Task, TaskDraft, TaskFilter};
pub use utils::Profile;
