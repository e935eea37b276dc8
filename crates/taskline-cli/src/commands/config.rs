use std::path::Path;

use taskline_core::config::{default_config_path, SyncSettings, REMOTE_URL_ENV};

use crate::cli::ConfigCommands;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    let path = default_config_path().ok_or_else(|| {
        taskline_core::Error::InvalidInput("could not determine a config directory".to_string())
    })?;

    match command {
        ConfigCommands::Show => {
            for line in render_config(&path, std::env::var(REMOTE_URL_ENV).ok())? {
                println!("{line}");
            }
            Ok(())
        }
        ConfigCommands::SetRemote { url } => {
            let saved = set_remote(&path, &url)?;
            println!("Remote set to {saved} ({})", path.display());
            Ok(())
        }
        ConfigCommands::ClearRemote => {
            clear_remote(&path)?;
            println!("Remote cleared ({})", path.display());
            Ok(())
        }
    }
}

/// Lines describing the file settings and any environment override.
pub fn render_config(path: &Path, env_remote: Option<String>) -> Result<Vec<String>, CliError> {
    let file_settings = SyncSettings::load_from_path(path)?;
    let mut effective = file_settings.clone();
    effective.apply_remote_override(env_remote);

    let mut lines = vec![
        format!("Config file:     {}", path.display()),
        format!(
            "Remote URL:      {}",
            effective.remote_url().unwrap_or("(not configured)")
        ),
        format!("Request timeout: {}ms", effective.request_timeout().as_millis()),
        format!("Probe interval:  {}s", effective.probe_interval().as_secs()),
    ];
    if effective.remote_url != file_settings.remote_url {
        lines.push(format!("(remote URL overridden by {REMOTE_URL_ENV})"));
    }
    Ok(lines)
}

pub fn set_remote(path: &Path, url: &str) -> Result<String, CliError> {
    let mut settings = SyncSettings::load_from_path(path)?;
    settings.set_remote_url(url)?;
    settings.save_to_path(path)?;
    Ok(settings.remote_url.unwrap_or_default())
}

pub fn clear_remote(path: &Path) -> Result<(), CliError> {
    let mut settings = SyncSettings::load_from_path(path)?;
    settings.remote_url = None;
    settings.save_to_path(path)?;
    Ok(())
}
