use crate::prelude::{println, *};
use crate::service::GenerationService;
use casegen_core::result::GenerationResult;
use casegen_core::storage::CsvStore;
use casegen_core::story::{GenerationRequest, DEFAULT_FILENAME};
use std::process::ExitCode;

#[derive(Debug, clap::Parser)]
#[command(name = "generate")]
#[command(about = "Generate test cases in-process, without a server")]
pub struct App {
    #[clap(flatten)]
    pub input: crate::client::InputOptions,

    /// Base name of the generated CSV file
    #[arg(long, default_value = DEFAULT_FILENAME)]
    pub filename: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub storage: crate::server::StorageOptions,

    #[clap(flatten)]
    pub ai: crate::ai::AiOptions,
}

pub async fn run(app: App, global: crate::Global) -> Result<ExitCode> {
    let story = app
        .input
        .source()
        .user_story(|path| std::fs::read_to_string(path));

    let result = match story.and_then(|story| GenerationRequest::new(&story, &app.filename)) {
        Ok(request) => {
            let store = CsvStore::new(&app.storage.output_dir)
                .map_err(|e| eyre!("{}: {}", app.storage.output_dir.display(), e))?;
            let service = GenerationService::new(app.ai.build_client()?, store);

            if global.verbose {
                anstream::eprintln!("Model: {}", service.model_info().model);
                anstream::eprintln!("Output directory: {}", app.storage.output_dir.display());
            }

            service.generate(&request).await
        }
        Err(e) => GenerationResult::failure(e.to_string()),
    };

    if app.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        crate::client::present::render(&result, "");
    }

    Ok(crate::client::exit_code(&result))
}
