use crate::errors::{Result, StackError};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Fan-out over independent async calls
pub mod concurrent;
pub mod spinner;

/// Atomic file writes so an interrupted save never leaves a half-written config
pub mod atomic_file {
    use super::*;

    /// Write JSON data to a file via a temporary file and rename
    pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| StackError::config(format!("Failed to serialize data: {e}")))?;

        write_string(path, &content)
    }

    pub fn write_string(path: &Path, content: &str) -> Result<()> {
        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, content)
            .map_err(|e| StackError::config(format!("Failed to write temporary file: {e}")))?;

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StackError::config(format!("Failed to finalize file write: {e}"))
        })
    }
}
