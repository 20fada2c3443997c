//! Generation Service: story in, stored CSV out.

use crate::ai::{generate_test_cases, ModelClient, ModelInfo};
use casegen_core::result::GenerationResult;
use casegen_core::storage::CsvStore;
use casegen_core::story::GenerationRequest;
use std::sync::Arc;

#[derive(Clone)]
pub struct GenerationService {
    client: Arc<dyn ModelClient>,
    store: CsvStore,
}

impl GenerationService {
    pub fn new(client: Arc<dyn ModelClient>, store: CsvStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    pub fn model_info(&self) -> ModelInfo {
        self.client.info()
    }

    /// Run one generation. Never fails: collaborator errors become a
    /// `success: false` result carrying their message.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        log::info!("Filename requested: {}", request.filename);
        log::info!(
            "User story length: {} characters",
            request.user_story.chars().count()
        );

        log::info!("Step 1: Generating test cases with {}...", self.client.info().model);
        let test_cases = match generate_test_cases(self.client.as_ref(), &request.user_story).await
        {
            Ok(test_cases) => test_cases,
            Err(e) => {
                log::error!("Test case generation failed: {e}");
                return GenerationResult::failure(format!("Failed to generate test cases: {e}"));
            }
        };
        log::info!("Step 1 complete: generated {} test cases", test_cases.len());

        log::info!("Step 2: Saving test cases to CSV...");
        let saved = tokio::task::spawn_blocking({
            let store = self.store.clone();
            let filename = request.filename.clone();
            move || store.save(&test_cases, &filename)
        })
        .await;

        match saved {
            Ok(Ok(saved)) => {
                log::info!(
                    "Step 2 complete: saved {} rows to {}",
                    saved.count,
                    saved.filepath.display()
                );
                GenerationResult::success(&saved)
            }
            Ok(Err(e)) => {
                log::error!("CSV save failed: {e}");
                GenerationResult::failure(format!("Failed to save CSV: {e}"))
            }
            Err(e) => {
                log::error!("CSV save task failed: {e}");
                GenerationResult::failure(format!("Failed to save CSV: {e}"))
            }
        }
    }
}
