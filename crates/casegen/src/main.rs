use crate::prelude::*;
use clap::Parser;
use std::process::ExitCode;

mod ai;
mod client;
mod error;
mod generate;
mod prelude;
mod server;
mod service;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Turn user stories into CSV test cases with an LLM"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "CASEGEN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the web server (form, /generate, /download)
    Serve(crate::server::App),

    /// Generate test cases in-process, without a server
    Generate(crate::generate::App),

    /// Submit a user story to a running server
    Submit(crate::client::SubmitOptions),

    /// List the CSV files stored on a running server
    Files(crate::client::FilesOptions),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(sub_app) => {
            crate::server::run(sub_app, app.global).await?;
            Ok(ExitCode::SUCCESS)
        }
        SubCommands::Generate(sub_app) => crate::generate::run(sub_app, app.global).await,
        SubCommands::Submit(options) => crate::client::run_submit(options, app.global).await,
        SubCommands::Files(options) => {
            crate::client::run_files(options, app.global).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
