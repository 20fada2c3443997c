//! Turning a [`GenerationResult`] into what the user sees

use serde::Serialize;

use crate::result::{download_path, GenerationResult};

/// What to render for a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Presentation {
    Success {
        message: String,
        count: usize,
        filename: String,
        filepath: String,
        download_url: String,
    },
    Failure {
        message: String,
    },
}

/// Build the presentation for a result.
///
/// `base_url` prefixes the download link; pass an empty string for a
/// server-relative link. A result claiming success without its file details is
/// shown as a failure and never gets a download link.
pub fn present(result: &GenerationResult, base_url: &str) -> Presentation {
    match result {
        GenerationResult {
            success: true,
            message,
            count: Some(count),
            filename: Some(filename),
            filepath: Some(filepath),
        } => Presentation::Success {
            message: message.clone(),
            count: *count,
            filename: filename.clone(),
            filepath: filepath.clone(),
            download_url: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                download_path(filename)
            ),
        },
        GenerationResult { success: true, .. } => Presentation::Failure {
            message: "Server reported success without file details".to_string(),
        },
        GenerationResult { message, .. } => Presentation::Failure {
            message: message.clone(),
        },
    }
}

impl Presentation {
    pub fn download_url(&self) -> Option<&str> {
        match self {
            Presentation::Success { download_url, .. } => Some(download_url),
            Presentation::Failure { .. } => None,
        }
    }

    /// Plain-text lines for terminal output.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Presentation::Success {
                message,
                count,
                filename,
                filepath,
                download_url,
            } => vec![
                message.clone(),
                format!("Test cases: {count}"),
                format!("File: {filename}"),
                format!("Saved to: {filepath}"),
                format!("Download: {download_url}"),
            ],
            Presentation::Failure { message } => vec![format!("Error: {message}")],
        }
    }
}
