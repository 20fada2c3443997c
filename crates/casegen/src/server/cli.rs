use std::path::PathBuf;

use casegen_core::storage::DEFAULT_OUTPUT_DIR;

#[derive(Debug, Clone, clap::Args)]
pub struct StorageOptions {
    /// Directory where generated CSV files are stored
    #[arg(long, env = "CASEGEN_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

#[derive(Debug, clap::Parser)]
#[command(name = "serve")]
#[command(about = "Run the test case generator web server")]
pub struct App {
    /// Port to listen on
    #[arg(short, long, env = "CASEGEN_PORT", default_value = "8000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "CASEGEN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[clap(flatten)]
    pub storage: StorageOptions,

    #[clap(flatten)]
    pub ai: crate::ai::AiOptions,
}
