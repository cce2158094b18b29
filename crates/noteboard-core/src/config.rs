//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/noteboard/config.toml)
//! 3. Environment variables (NOTEBOARD_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::User;

/// Environment variable prefix
const ENV_PREFIX: &str = "NOTEBOARD";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the board document
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory user id of the local user
    #[serde(default)]
    pub user_id: Option<String>,

    /// Display name of the local user
    #[serde(default)]
    pub display_name: Option<String>,

    /// Link to the session, used in chat invitations
    #[serde(default)]
    pub session_url: Option<String>,

    /// Log level for the core and CLI crates
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user_id: None,
            display_name: None,
            session_url: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Some(val) = env_optional("USER_ID") {
            self.user_id = val;
        }

        if let Some(val) = env_optional("DISPLAY_NAME") {
            self.display_name = val;
        }

        if let Some(val) = env_optional("SESSION_URL") {
            self.session_url = val;
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.log_level = val;
            }
        }
    }

    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with NOTEBOARD_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("noteboard")
            .join("config.toml")
    }

    /// Get the path to the board document file
    pub fn board_path(&self) -> PathBuf {
        self.data_dir.join("board.automerge")
    }

    /// Get the path to the board ID file
    pub fn board_id_path(&self) -> PathBuf {
        self.data_dir.join("board_id")
    }

    /// The local user, if a user id is configured
    pub fn user(&self) -> Option<User> {
        let user = User::new(self.user_id.clone()?);
        Some(match self.display_name {
            Some(ref name) => user.with_display_name(name.clone()),
            None => user,
        })
    }
}

/// Read an optional string override; an empty value clears the setting
fn env_optional(name: &str) -> Option<Option<String>> {
    std::env::var(format!("{}_{}", ENV_PREFIX, name))
        .ok()
        .map(|val| if val.is_empty() { None } else { Some(val) })
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("noteboard")
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "NOTEBOARD_DATA_DIR",
        "NOTEBOARD_USER_ID",
        "NOTEBOARD_DISPLAY_NAME",
        "NOTEBOARD_SESSION_URL",
        "NOTEBOARD_LOG_LEVEL",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.user_id.is_none());
        assert!(config.session_url.is_none());
        assert_eq!(config.log_level, "warn");
        assert!(config.data_dir.ends_with("noteboard"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.board_path().ends_with("board.automerge"));
        assert!(config.board_id_path().ends_with("board_id"));
    }

    #[test]
    fn test_user() {
        let mut config = Config::default();
        assert!(config.user().is_none());

        config.user_id = Some("u1".to_string());
        assert_eq!(config.user(), Some(User::new("u1")));

        config.display_name = Some("Ada".to_string());
        assert_eq!(config.user().unwrap().display_name(), Some("Ada"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("NOTEBOARD_DATA_DIR", "/tmp/noteboard-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/noteboard-test"));
    }

    #[test]
    fn test_env_override_user() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("NOTEBOARD_USER_ID", "u7");
        env::set_var("NOTEBOARD_DISPLAY_NAME", "Grace");
        config.apply_env_overrides();
        assert_eq!(config.user_id.as_deref(), Some("u7"));
        assert_eq!(config.display_name.as_deref(), Some("Grace"));

        // Empty string clears it
        env::set_var("NOTEBOARD_USER_ID", "");
        config.apply_env_overrides();
        assert!(config.user_id.is_none());
    }

    #[test]
    fn test_env_override_log_level() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("NOTEBOARD_LOG_LEVEL", "debug");
        config.apply_env_overrides();
        assert_eq!(config.log_level, "debug");

        env::set_var("NOTEBOARD_LOG_LEVEL", "");
        config.apply_env_overrides();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/noteboard"),
            user_id: Some("u1".to_string()),
            display_name: None,
            session_url: Some("https://board.example/1".to_string()),
            log_level: "info".to_string(),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("session_url"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.user_id, config.user_id);
        assert_eq!(parsed.session_url, config.session_url);
        assert_eq!(parsed.log_level, config.log_level);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            user_id = "u1"
            display_name = "Ada"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.user_id.as_deref(), Some("u1"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("NOTEBOARD_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.user_id.is_none());
        assert!(config.data_dir.exists());
    }
}
