mod cli;
mod routes;

pub use cli::{App, StorageOptions};
pub use routes::router;

use crate::prelude::{eprintln, *};
use crate::service::GenerationService;
use casegen_core::storage::CsvStore;
use colored::Colorize;
use std::sync::Arc;

/// Shared state for request handlers. Requests share nothing mutable.
pub struct AppState {
    pub service: GenerationService,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let store = CsvStore::new(&app.storage.output_dir)
        .map_err(|e| eyre!("{}: {}", app.storage.output_dir.display(), e))?;
    let client = app.ai.build_client()?;
    let service = GenerationService::new(client, store);

    let addr = format!("{}:{}", app.host, app.port);

    if global.verbose {
        eprintln!("{}", "=".repeat(70).bright_cyan());
        eprintln!("{}", "TEST CASE GENERATOR".bright_cyan().bold());
        eprintln!("{}", "=".repeat(70).bright_cyan());
        eprintln!("{}: http://{}", "URL".green(), addr.cyan().underline());
        eprintln!(
            "{}: {}",
            "Output Directory".green(),
            service.store().output_dir().display()
        );
        eprintln!("{}: {}", "AI Model".green(), service.model_info().model);
    }

    log::info!(
        "Serving on http://{addr} (output directory: {})",
        service.store().output_dir().display()
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    axum::serve(listener, router(Arc::new(AppState { service })))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
