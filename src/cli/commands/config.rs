use crate::cli::output::Output;
use crate::cli::ConfigAction;
use crate::config::{load_repo_settings, save_repo_settings, CONFIG_KEYS};
use crate::errors::{Result, StackError};
use crate::git::find_repository_root;
use std::env;
use std::path::Path;

/// Handle configuration commands
pub async fn run(action: ConfigAction) -> Result<()> {
    let current_dir = env::current_dir()
        .map_err(|e| StackError::config(format!("Could not get current directory: {e}")))?;
    let repo_root = find_repository_root(&current_dir)?;

    match action {
        ConfigAction::Set { key, value } => set_config_value(&repo_root, &key, &value),
        ConfigAction::Get { key } => get_config_value(&repo_root, &key),
        ConfigAction::List => list_config_values(&repo_root),
    }
}

fn set_config_value(repo_root: &Path, key: &str, value: &str) -> Result<()> {
    let mut settings = load_repo_settings(repo_root)?;
    settings.set_value(key, value)?;
    save_repo_settings(repo_root, &settings)?;

    Output::success(format!("Configuration updated: {key} = {}", display_value(key, value)));

    if key == "bitbucket.url" {
        Output::tip("Set your project and repository next:");
        Output::sub_item("git-stack config set bitbucket.project YOUR_PROJECT_KEY");
        Output::sub_item("git-stack config set bitbucket.repo your-repo-name");
    }
    Ok(())
}

fn get_config_value(repo_root: &Path, key: &str) -> Result<()> {
    let settings = load_repo_settings(repo_root)?;
    let value = settings.get_value(key)?;
    println!("{key} = {}", display_value(key, &value));
    Ok(())
}

fn list_config_values(repo_root: &Path) -> Result<()> {
    let settings = load_repo_settings(repo_root)?;

    Output::section("git-stack configuration");
    for key in CONFIG_KEYS {
        let value = settings.get_value(key)?;
        println!("  {key} = {}", display_value(key, &value));
    }
    Ok(())
}

/// Mask secrets and mark unset values
pub fn display_value(key: &str, value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else if key.contains("token") {
        let visible: String = value.chars().take(4).collect();
        format!("{visible}***")
    } else {
        value.to_string()
    }
}
