use casegen_core::story::{InputSource, DEFAULT_FILENAME};
use std::path::PathBuf;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

/// Where the user story comes from. Exactly one of `--text` and `--file`.
#[derive(Debug, Clone, clap::Args)]
#[group(required = true, multiple = false)]
pub struct InputOptions {
    /// User story text
    #[arg(long)]
    pub text: Option<String>,

    /// Text file containing the user story
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl InputOptions {
    pub fn source(&self) -> InputSource {
        match (&self.file, &self.text) {
            (Some(path), _) => InputSource::File(path.clone()),
            (None, text) => InputSource::Text(text.clone().unwrap_or_default()),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct SubmitOptions {
    #[clap(flatten)]
    pub input: InputOptions,

    /// Base name of the generated CSV file
    #[arg(long, default_value = DEFAULT_FILENAME)]
    pub filename: String,

    /// Server base URL
    #[arg(long, env = "CASEGEN_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Download the generated CSV into this directory
    #[arg(long)]
    pub download: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct FilesOptions {
    /// Server base URL
    #[arg(long, env = "CASEGEN_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}
