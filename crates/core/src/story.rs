//! User story capture and request validation
//!
//! Pure functions for turning whatever the user handed us (typed text or the
//! contents of an uploaded file) into a validated [`GenerationRequest`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filename used when the caller leaves it blank.
pub const DEFAULT_FILENAME: &str = "test_cases";

/// Message shown when the user story is empty.
pub const EMPTY_STORY_MESSAGE: &str = "Please provide a user story.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoryError {
    #[error("{}", EMPTY_STORY_MESSAGE)]
    Empty,

    #[error("Failed to read file '{path}': {reason}")]
    Unreadable { path: String, reason: String },
}

/// Where the user story comes from.
///
/// Switching the active source only changes what gets read; nothing is
/// validated until [`GenerationRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Text typed directly by the user.
    Text(String),
    /// A text file to be uploaded.
    File(PathBuf),
}

impl InputSource {
    /// Returns the trimmed user story for this source.
    ///
    /// `read` performs the actual file read so callers decide how I/O happens.
    pub fn user_story<F>(&self, read: F) -> Result<String, StoryError>
    where
        F: FnOnce(&std::path::Path) -> std::io::Result<String>,
    {
        match self {
            InputSource::Text(text) => Ok(text.trim().to_string()),
            InputSource::File(path) => read(path)
                .map(|content| content.trim().to_string())
                .map_err(|e| StoryError::Unreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }),
        }
    }
}

/// A single generation request as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_story: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub filename: String,
}

/// Missing and `null` fields both read as an empty string, so they reach
/// validation instead of failing to decode.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl GenerationRequest {
    /// Builds a validated request.
    ///
    /// The story is trimmed and must not be empty. A blank filename becomes
    /// [`DEFAULT_FILENAME`].
    pub fn new(user_story: &str, filename: &str) -> Result<Self, StoryError> {
        let user_story = user_story.trim();
        if user_story.is_empty() {
            return Err(StoryError::Empty);
        }

        Ok(Self {
            user_story: user_story.to_string(),
            filename: normalize_filename(filename),
        })
    }

    /// Re-validates a request received from the network.
    pub fn validated(self) -> Result<Self, StoryError> {
        Self::new(&self.user_story, &self.filename)
    }
}

/// Trims the requested filename and falls back to the default when blank.
pub fn normalize_filename(filename: &str) -> String {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}
