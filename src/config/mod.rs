pub mod settings;

pub use settings::{BitbucketConfig, GitConfig, InferenceSettings, Settings, CONFIG_KEYS};

use crate::errors::{Result, StackError};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".git-stack";
const CONFIG_FILE_NAME: &str = "config.json";

/// Configuration directory for a specific repository
pub fn get_repo_config_dir(repo_path: &Path) -> PathBuf {
    repo_path.join(CONFIG_DIR_NAME)
}

pub fn get_repo_config_path(repo_path: &Path) -> PathBuf {
    get_repo_config_dir(repo_path).join(CONFIG_FILE_NAME)
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        fs::create_dir_all(config_dir).map_err(|e| {
            StackError::config(format!("Failed to create config directory: {e}"))
        })?;
    }
    Ok(())
}

/// Load the repository's settings, or defaults when none were saved
pub fn load_repo_settings(repo_path: &Path) -> Result<Settings> {
    let settings = Settings::load_from_file(&get_repo_config_path(repo_path))?;
    settings.validate()?;
    Ok(settings)
}

pub fn save_repo_settings(repo_path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;
    ensure_config_dir(&get_repo_config_dir(repo_path))?;
    settings.save_to_file(&get_repo_config_path(repo_path))?;
    tracing::info!("Saved settings for {}", repo_path.display());
    Ok(())
}
