use super::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use casegen_core::result::GenerationResult;
use casegen_core::storage::StorageError;
use casegen_core::story::GenerationRequest;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .route("/download/{filename}", get(download))
        .route("/files", get(list_files))
        .route("/files/{filename}", delete(delete_file))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> (StatusCode, Json<GenerationResult>) {
    log::info!("New generation request received");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            log::warn!("Rejected request body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(GenerationResult::failure(format!(
                    "Invalid request: {}",
                    rejection.body_text()
                ))),
            );
        }
    };

    let request = match request.validated() {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Empty user story provided");
            return (
                StatusCode::BAD_REQUEST,
                Json(GenerationResult::failure(e.to_string())),
            );
        }
    };

    let result = state.service.generate(&request).await;
    if result.success {
        log::info!("Request completed successfully");
    } else {
        log::warn!("Request failed: {}", result.message);
    }

    (StatusCode::OK, Json(result))
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "File not found" })),
    )
        .into_response()
}

async fn download(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Response {
    let path = match state.service.store().resolve(&filename) {
        Ok(path) => path,
        Err(_) => return not_found(),
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": format!("Error downloading file: {e}"),
                })),
            )
                .into_response()
        }
    }
}

async fn list_files(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let files = state.service.store().list();
    Json(json!({
        "success": true,
        "count": files.len(),
        "files": files,
    }))
}

async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    match state.service.store().delete(&filename) {
        Ok(()) => {
            log::info!("Deleted {filename}");
            Json(json!({
                "success": true,
                "message": format!("File {filename} deleted successfully"),
            }))
            .into_response()
        }
        Err(StorageError::NotFound) => not_found(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let store = state.service.store();
    Json(json!({
        "status": "healthy",
        "generator": state.service.model_info(),
        "storage": {
            "output_directory": store.output_dir().display().to_string(),
            "files_count": store.list().len(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use crate::ai::testing::StubClient;
    use crate::server::testing::spawn;
    use casegen_core::result::GenerationResult;
    use std::sync::Arc;

    const STORY: &str = "As a user, I want to log in with email and password";

    async fn post_generate(
        base_url: &str,
        body: serde_json::Value,
    ) -> (reqwest::StatusCode, GenerationResult) {
        let response = reqwest::Client::new()
            .post(format!("{base_url}/generate"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_generate_then_download() {
        let server = spawn(Arc::new(StubClient::with_cases(5))).await;

        let (status, result) = post_generate(
            &server.base_url,
            serde_json::json!({ "user_story": STORY, "filename": "test_cases" }),
        )
        .await;

        assert_eq!(status, reqwest::StatusCode::OK);
        assert!(result.success);
        assert_eq!(result.count, Some(5));
        let filename = result.filename.unwrap();

        let response = reqwest::get(format!("{}/download/{filename}", server.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()["content-disposition"],
            format!("attachment; filename=\"{filename}\"").as_str()
        );
        let body = response.text().await.unwrap();
        let mut reader = csv::Reader::from_reader(body.as_bytes());
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["ID", "Title", "Steps", "Expected Results", "Acceptance Criteria"]
        );
        assert_eq!(reader.records().count(), 5);
    }

    #[tokio::test]
    async fn test_blank_filename_uses_default() {
        let server = spawn(Arc::new(StubClient::with_cases(1))).await;

        let (_, result) = post_generate(
            &server.base_url,
            serde_json::json!({ "user_story": STORY, "filename": "  " }),
        )
        .await;

        assert!(result.filename.unwrap().starts_with("test_cases_"));
    }

    #[tokio::test]
    async fn test_empty_story_is_rejected_without_model_call() {
        let client = Arc::new(StubClient::with_cases(5));
        let server = spawn(client.clone()).await;

        let (status, result) = post_generate(
            &server.base_url,
            serde_json::json!({ "user_story": "   ", "filename": "x" }),
        )
        .await;

        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(result, GenerationResult::failure("Please provide a user story."));
        assert_eq!(client.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(server.store.list().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_null_fields_reach_validation() {
        let client = Arc::new(StubClient::with_cases(1));
        let server = spawn(client.clone()).await;

        for body in [
            serde_json::json!({ "filename": "x" }),
            serde_json::json!({ "user_story": null }),
        ] {
            let (status, result) = post_generate(&server.base_url, body).await;
            assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
            assert_eq!(result, GenerationResult::failure("Please provide a user story."));
        }
        assert_eq!(client.calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        let (status, result) = post_generate(
            &server.base_url,
            serde_json::json!({ "user_story": STORY, "filename": null }),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert!(result.filename.unwrap().starts_with("test_cases_"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let server = spawn(Arc::new(StubClient::with_cases(1))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/generate", server.base_url))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let result: GenerationResult = response.json().await.unwrap();
        assert!(!result.success);
        assert!(result.message.starts_with("Invalid request:"));
    }

    #[tokio::test]
    async fn test_quota_error_is_a_business_failure() {
        let server = spawn(Arc::new(StubClient::failing("429 quota exceeded"))).await;

        let (status, result) = post_generate(
            &server.base_url,
            serde_json::json!({ "user_story": STORY, "filename": "test_cases" }),
        )
        .await;

        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(
            result,
            GenerationResult::failure("Failed to generate test cases: 429 quota exceeded")
        );
        assert!(server.store.list().is_empty());
    }

    #[tokio::test]
    async fn test_download_unknown_and_traversal_are_not_found() {
        let server = spawn(Arc::new(StubClient::with_cases(1))).await;

        for name in ["missing.csv", "..%2Fsecret.csv", "..%5Csecret.csv"] {
            let response = reqwest::get(format!("{}/download/{name}", server.base_url))
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND, "{name}");
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["message"], "File not found");
        }
    }

    #[tokio::test]
    async fn test_list_and_delete_files() {
        let server = spawn(Arc::new(StubClient::with_cases(1))).await;
        let body = serde_json::json!({ "user_story": STORY, "filename": "cases" });
        post_generate(&server.base_url, body.clone()).await;
        post_generate(&server.base_url, body).await;

        let listing: serde_json::Value = reqwest::get(format!("{}/files", server.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listing["count"], 2);
        let first = listing["files"][0].as_str().unwrap().to_string();

        let client = reqwest::Client::new();
        let url = format!("{}/files/{first}", server.base_url);
        let deleted = client.delete(&url).send().await.unwrap();
        assert_eq!(deleted.status(), reqwest::StatusCode::OK);
        let again = client.delete(&url).send().await.unwrap();
        assert_eq!(again.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(server.store.list().len(), 1);
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let server = spawn(Arc::new(StubClient::with_cases(1))).await;

        let health: serde_json::Value = reqwest::get(format!("{}/health", server.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["generator"]["model"], "stub");
        assert_eq!(health["storage"]["files_count"], 0);

        let index = reqwest::get(&server.base_url).await.unwrap().text().await.unwrap();
        assert!(index.contains("/generate"));
    }
}
