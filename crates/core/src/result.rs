//! The outcome of one generation attempt

use serde::{Deserialize, Serialize};

use crate::storage::SavedFile;

/// Outcome of a generation attempt, as returned by `POST /generate`.
///
/// Build it with [`GenerationResult::success`] or
/// [`GenerationResult::failure`]: a success always carries a filename, a count
/// and a filepath, a failure carries only its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
}

impl GenerationResult {
    pub fn success(saved: &SavedFile) -> Self {
        Self {
            success: true,
            message: format!("Successfully generated {} test cases", saved.count),
            count: Some(saved.count),
            filename: Some(saved.filename.clone()),
            filepath: Some(saved.filepath.display().to_string()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            count: None,
            filename: None,
            filepath: None,
        }
    }

    /// Whether the success/failure shape holds. Results decoded from the
    /// network are checked with this before being presented.
    pub fn is_well_formed(&self) -> bool {
        if self.success {
            self.filename.is_some() && self.count.is_some() && self.filepath.is_some()
        } else {
            self.filename.is_none() && self.count.is_none() && self.filepath.is_none()
        }
    }
}

/// URL path under which a stored file can be downloaded.
pub fn download_path(filename: &str) -> String {
    format!("/download/{filename}")
}
