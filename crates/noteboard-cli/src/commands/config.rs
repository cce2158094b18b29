//! Config command handlers

use anyhow::{bail, Context, Result};

use noteboard_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "user_id": config.user_id,
                    "display_name": config.display_name,
                    "session_url": config.session_url,
                    "log_level": config.log_level
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:     {}", config.data_dir.display());
            println!("  user_id:      {}", or_unset(&config.user_id));
            println!("  display_name: {}", or_unset(&config.display_name));
            println!("  session_url:  {}", or_unset(&config.session_url));
            println!("  log_level:    {}", config.log_level);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    apply(&mut config, &key, &value)?;
    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let optional = |value: &str| {
        if value.is_empty() || value == "none" {
            None
        } else {
            Some(value.to_string())
        }
    };

    match key {
        "data_dir" => config.data_dir = value.into(),
        "user_id" => config.user_id = optional(value),
        "display_name" => config.display_name = optional(value),
        "session_url" => config.session_url = optional(value),
        "log_level" => {
            if !["error", "warn", "info", "debug", "trace"].contains(&value) {
                bail!(
                    "Invalid log level: '{}'. Use error, warn, info, debug or trace.",
                    value
                );
            }
            config.log_level = value.to_string();
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, user_id, display_name, session_url, log_level",
                key
            );
        }
    }
    Ok(())
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not set)")
}
