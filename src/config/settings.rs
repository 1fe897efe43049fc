use crate::errors::{Result, StackError};
use crate::stack::{InferenceOptions, InferenceStrategy, DEFAULT_MAX_DEPTH};
use crate::utils::atomic_file;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every key understood by [`Settings::get_value`] and [`Settings::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "git.default_branch",
    "git.remote",
    "inference.strategy",
    "inference.max_depth",
    "bitbucket.url",
    "bitbucket.project",
    "bitbucket.repo",
    "bitbucket.username",
    "bitbucket.token",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<BitbucketConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub default_branch: String,
    pub remote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub strategy: InferenceStrategy,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitbucketConfig {
    pub url: String,
    pub project: String,
    pub repo: String,
    pub username: Option<String>,
    pub token: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
            remote: "origin".to_string(),
        }
    }
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            strategy: InferenceStrategy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it is absent
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StackError::config(format!("Failed to read config file: {e}")))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| StackError::config(format!("Failed to parse config file: {e}")))?;

        Ok(settings)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        atomic_file::write_json(path, self)
    }

    pub fn inference_options(&self) -> InferenceOptions {
        InferenceOptions {
            strategy: self.inference.strategy,
            max_depth: self.inference.max_depth,
        }
    }

    /// Update a configuration value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match (section, field) {
            ("git", "default_branch") => self.git.default_branch = value.to_string(),
            ("git", "remote") => self.git.remote = value.to_string(),
            ("inference", "strategy") => self.inference.strategy = value.parse()?,
            ("inference", "max_depth") => {
                self.inference.max_depth = value
                    .parse()
                    .map_err(|_| StackError::config(format!("Invalid number: {value}")))?;
            }
            ("bitbucket", field) => {
                let bitbucket = self.bitbucket.get_or_insert_with(BitbucketConfig::default);
                match field {
                    "url" => bitbucket.url = value.to_string(),
                    "project" => bitbucket.project = value.to_string(),
                    "repo" => bitbucket.repo = value.to_string(),
                    "username" => bitbucket.username = Some(value.to_string()),
                    "token" => bitbucket.token = Some(value.to_string()),
                    _ => return Err(StackError::config(format!("Unknown config key: {key}"))),
                }
            }
            _ => return Err(StackError::config(format!("Unknown config key: {key}"))),
        }

        Ok(())
    }

    /// Get a configuration value by dotted key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let (section, field) = split_key(key)?;

        let value = match (section, field) {
            ("git", "default_branch") => self.git.default_branch.clone(),
            ("git", "remote") => self.git.remote.clone(),
            ("inference", "strategy") => self.inference.strategy.to_string(),
            ("inference", "max_depth") => self.inference.max_depth.to_string(),
            ("bitbucket", field) => {
                let bitbucket = self.bitbucket.as_ref();
                match field {
                    "url" => bitbucket.map(|b| b.url.clone()).unwrap_or_default(),
                    "project" => bitbucket.map(|b| b.project.clone()).unwrap_or_default(),
                    "repo" => bitbucket.map(|b| b.repo.clone()).unwrap_or_default(),
                    "username" => bitbucket.and_then(|b| b.username.clone()).unwrap_or_default(),
                    "token" => bitbucket.and_then(|b| b.token.clone()).unwrap_or_default(),
                    _ => return Err(StackError::config(format!("Unknown config key: {key}"))),
                }
            }
            _ => return Err(StackError::config(format!("Unknown config key: {key}"))),
        };

        Ok(value)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.git.default_branch.trim().is_empty() {
            return Err(StackError::config("git.default_branch must not be empty"));
        }
        if self.git.remote.trim().is_empty() {
            return Err(StackError::config("git.remote must not be empty"));
        }
        if self.inference.max_depth == 0 {
            return Err(StackError::config("inference.max_depth must be at least 1"));
        }

        if let Some(bitbucket) = &self.bitbucket {
            if !bitbucket.url.is_empty() {
                let url = url::Url::parse(&bitbucket.url)?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(StackError::config(
                        "Bitbucket URL must start with http:// or https://",
                    ));
                }
            }
        }

        Ok(())
    }
}

impl BitbucketConfig {
    /// Whether enough is set to talk to the server
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.project.is_empty() && !self.repo.is_empty() && self.token.is_some()
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    key.split_once('.')
        .filter(|(section, field)| !section.is_empty() && !field.is_empty() && !field.contains('.'))
        .ok_or_else(|| StackError::config(format!("Invalid config key format: {key}")))
}
