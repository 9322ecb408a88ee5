use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;
use crate::utils;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Quiet period after the last keystroke before a search is sent
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_toast_duration_secs")]
    pub toast_duration_secs: u64,
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width_percent: u16,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_new_task")]
    pub new_task: String,
    #[serde(default = "default_new_category")]
    pub new_category: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_toggle_task")]
    pub toggle_task: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_cycle_sort")]
    pub cycle_sort: String,
    #[serde(default = "default_show_overdue")]
    pub show_overdue: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_logout")]
    pub logout: String,
    #[serde(default = "default_toggle_sidebar")]
    pub toggle_sidebar: String,
    #[serde(default = "default_switch_focus")]
    pub switch_focus: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_save")]
    pub save: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    /// Left empty to derive a readable color from `highlight_bg`
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_accent")]
    pub accent: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut themes = HashMap::new();

        // Sample user theme so the config file shows how to define one
        themes.insert(
            "ocean".to_string(),
            Theme {
                fg: "lightcyan".to_string(),
                bg: "black".to_string(),
                highlight_bg: "#1e3a5f".to_string(),
                highlight_fg: String::new(),
                accent: "cyan".to_string(),
            },
        );

        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            search_debounce_ms: default_search_debounce_ms(),
            toast_duration_secs: default_toast_duration_secs(),
            sidebar_width_percent: default_sidebar_width(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            help: default_help(),
            new_task: default_new_task(),
            new_category: default_new_category(),
            edit: default_edit(),
            delete: default_delete(),
            toggle_task: default_toggle_task(),
            search: default_search(),
            refresh: default_refresh(),
            cycle_sort: default_cycle_sort(),
            show_overdue: default_show_overdue(),
            profile: default_profile(),
            logout: default_logout(),
            toggle_sidebar: default_toggle_sidebar(),
            switch_focus: default_switch_focus(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            save: default_save(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            accent: default_accent(),
        }
    }
}

impl Theme {
    fn preset(fg: &str, bg: &str, highlight_bg: &str, highlight_fg: &str, accent: &str) -> Self {
        Self {
            fg: fg.to_string(),
            bg: bg.to_string(),
            highlight_bg: highlight_bg.to_string(),
            highlight_fg: highlight_fg.to_string(),
            accent: accent.to_string(),
        }
    }

    /// Themes that exist regardless of the config file
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        HashMap::from([
            ("default".to_string(), Theme::default()),
            (
                "dark".to_string(),
                Theme::preset("white", "black", "cyan", "black", "lightcyan"),
            ),
            (
                "light".to_string(),
                Theme::preset("black", "white", "blue", "white", "blue"),
            ),
            (
                "green".to_string(),
                Theme::preset("green", "black", "yellow", "black", "lightgreen"),
            ),
            (
                "monochrome".to_string(),
                Theme::preset("white", "black", "white", "black", "gray"),
            ),
        ])
    }
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_toast_duration_secs() -> u64 {
    5
}

fn default_sidebar_width() -> u16 {
    28
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_new_task() -> String {
    "n".to_string()
}

fn default_new_category() -> String {
    "c".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_toggle_task() -> String {
    "Space".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_refresh() -> String {
    "r".to_string()
}

fn default_cycle_sort() -> String {
    "s".to_string()
}

fn default_show_overdue() -> String {
    "o".to_string()
}

fn default_profile() -> String {
    "u".to_string()
}

fn default_logout() -> String {
    "L".to_string()
}

fn default_toggle_sidebar() -> String {
    "b".to_string()
}

fn default_switch_focus() -> String {
    "Tab".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_accent() -> String {
    "yellow".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load the profile's config file, writing the defaults on first run
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path(profile)?)
    }

    /// Load `path`, or create it with the defaults when it does not exist yet
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents =
                fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
            Ok(toml::from_str(&contents)?)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "wrote default config");
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_duration_secs)
    }

    /// Resolve the current theme: user themes shadow presets, unknown names fall back to default.
    /// An empty `highlight_fg` is replaced by a color that contrasts with `highlight_bg`.
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color_from_str};

        let mut theme = self
            .themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().remove(&self.current_theme))
            .unwrap_or_default();

        if theme.highlight_fg.trim().is_empty() {
            let fg = get_contrast_text_color_from_str(&theme.highlight_bg);
            theme.highlight_fg = format_color_for_display(&fg);
        }

        theme
    }
}
