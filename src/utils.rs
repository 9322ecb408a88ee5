use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Dev keeps its config, session and logs apart from the everyday install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    pub fn from_dev_flag(dev: bool) -> Self {
        if dev { Profile::Dev } else { Profile::Prod }
    }

    pub fn app_name(&self) -> &'static str {
        match self {
            Profile::Dev => "tasker-dev",
            Profile::Prod => "tasker",
        }
    }
}

fn project_dirs(profile: Profile) -> Option<ProjectDirs> {
    // "com" qualifier keeps macOS paths under ~/Library/Application Support/<app>
    ProjectDirs::from("com", "tasker", profile.app_name())
}

pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Where the login token and username survive restarts
pub fn get_session_path(profile: Profile) -> Option<PathBuf> {
    get_data_dir(profile).map(|dir| dir.join(crate::session::SESSION_FILE_NAME))
}

pub fn get_log_dir(profile: Profile) -> Option<PathBuf> {
    get_data_dir(profile).map(|dir| dir.join("logs"))
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), BaseDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}

/// Parse a due date typed by the user, in local time.
///
/// Accepts `YYYY-MM-DD` (end of that day) or `YYYY-MM-DD HH:MM`. An empty
/// string means "no due date".
pub fn parse_due_date(input: &str) -> Result<Option<DateTime<Utc>>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let naive = if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        dt
    } else if let Some(dt) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 0))
    {
        dt
    } else {
        return Err(format!(
            "Invalid due date '{}': use YYYY-MM-DD or YYYY-MM-DD HH:MM",
            input
        ));
    };

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .ok_or_else(|| format!("Due date '{}' does not exist in the local time zone", input))
}

/// Inverse of [`parse_due_date`], for pre-filling the edit form
pub fn format_due_date_for_input(due: DateTime<Utc>) -> String {
    due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Short local rendering for lists ("Mar 04 17:30")
pub fn format_due_date_short(due: DateTime<Utc>) -> String {
    due.with_timezone(&Local).format("%b %d %H:%M").to_string()
}

/// A key binding from the config file, e.g. `"n"`, `"Space"`, `"Ctrl+r"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeyBinding {
    pub key_code: KeyCode,
    pub requires_ctrl: bool,
}

impl ParsedKeyBinding {
    /// Shift is ignored so that `"L"` matches a shifted `l`
    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.code == self.key_code && has_primary_modifier(key.modifiers) == self.requires_ctrl
    }
}

/// Ctrl everywhere, and Option/Alt as well on macOS where terminals often eat Ctrl combos
pub fn has_primary_modifier(modifiers: KeyModifiers) -> bool {
    #[cfg(target_os = "macos")]
    {
        modifiers.contains(KeyModifiers::CONTROL) || modifiers.contains(KeyModifiers::ALT)
    }

    #[cfg(not(target_os = "macos"))]
    {
        modifiers.contains(KeyModifiers::CONTROL)
    }
}

pub fn format_key_binding_for_display(binding: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        binding.replace("Ctrl+", "Opt+")
    }

    #[cfg(not(target_os = "macos"))]
    {
        binding.to_string()
    }
}

pub fn parse_key_binding(binding: &str) -> Result<ParsedKeyBinding, String> {
    let binding = binding.trim();

    match binding.strip_prefix("Ctrl+") {
        Some(rest) => Ok(ParsedKeyBinding {
            key_code: parse_key_code(rest)?,
            requires_ctrl: true,
        }),
        None => Ok(ParsedKeyBinding {
            key_code: parse_key_code(binding)?,
            requires_ctrl: false,
        }),
    }
}

fn parse_key_code(name: &str) -> Result<KeyCode, String> {
    let code = match name {
        "Enter" => KeyCode::Enter,
        "Esc" | "Escape" => KeyCode::Esc,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Space" | " " => KeyCode::Char(' '),
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Delete" => KeyCode::Delete,
        _ => {
            if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                if (1..=12).contains(&n) {
                    return Ok(KeyCode::F(n));
                }
            }
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return Err(format!("Unknown key binding: {}", name)),
            }
        }
    };
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_plain_and_ctrl_bindings() {
        assert_eq!(
            parse_key_binding("n").unwrap(),
            ParsedKeyBinding {
                key_code: KeyCode::Char('n'),
                requires_ctrl: false
            }
        );
        assert_eq!(
            parse_key_binding("Ctrl+r").unwrap(),
            ParsedKeyBinding {
                key_code: KeyCode::Char('r'),
                requires_ctrl: true
            }
        );
        assert_eq!(parse_key_binding("F1").unwrap().key_code, KeyCode::F(1));
        assert_eq!(parse_key_binding("Space").unwrap().key_code, KeyCode::Char(' '));
        assert!(parse_key_binding("Hyper+x").is_err());
        assert!(parse_key_binding("F13").is_err());
    }

    #[test]
    fn test_binding_matches_shifted_letter() {
        let binding = parse_key_binding("L").unwrap();
        let key = KeyEvent::new(KeyCode::Char('L'), KeyModifiers::SHIFT);
        assert!(binding.matches(&key));

        let ctrl = KeyEvent::new(KeyCode::Char('L'), KeyModifiers::CONTROL);
        assert!(!binding.matches(&ctrl));
    }

    #[test]
    fn test_due_date_formats() {
        assert_eq!(parse_due_date("  ").unwrap(), None);

        let due = parse_due_date("2030-06-15 09:30").unwrap().unwrap();
        let local = due.with_timezone(&Local);
        assert_eq!((local.hour(), local.minute()), (9, 30));
        assert_eq!(format_due_date_for_input(due), "2030-06-15 09:30");

        let end_of_day = parse_due_date("2030-06-15").unwrap().unwrap();
        assert_eq!(end_of_day.with_timezone(&Local).hour(), 23);

        assert!(parse_due_date("15/06/2030").is_err());
    }

    #[test]
    fn test_expand_path_leaves_absolute_paths() {
        assert_eq!(expand_path("/tmp/config.toml"), PathBuf::from("/tmp/config.toml"));
        assert!(!expand_path("~/config.toml").starts_with("~"));
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(Profile::from_dev_flag(true).app_name(), "tasker-dev");
        assert_eq!(Profile::from_dev_flag(false).app_name(), "tasker");
    }
}
