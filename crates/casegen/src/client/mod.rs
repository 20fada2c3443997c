//! Request Submitter: the HTTP client side of a generation round trip.

mod cli;
pub mod present;

pub use cli::{FilesOptions, InputOptions, SubmitOptions};

use crate::prelude::{println, *};
use casegen_core::result::{download_path, GenerationResult};
use casegen_core::story::{normalize_filename, GenerationRequest, InputSource};
use casegen_core::timeline::{AttemptState, GenerationEvent};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Thin client for the casegen HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, serde::Deserialize)]
struct FileListing {
    #[serde(default)]
    files: Vec<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST the request and decode the result, whatever the HTTP status.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<(u16, GenerationResult), Error> {
        let response = self
            .http
            .post(self.url("/generate"))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let result: GenerationResult = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(format!("HTTP {status}: {e}")))?;

        if !result.is_well_formed() {
            return Err(Error::MalformedResponse(format!(
                "HTTP {status}: inconsistent result fields"
            )));
        }

        Ok((status, result))
    }

    /// Fetch a stored CSV and write it into `dir`.
    pub async fn download(&self, filename: &str, dir: &Path) -> Result<PathBuf> {
        let response = self
            .http
            .get(self.url(&download_path(filename)))
            .send()
            .await
            .map_err(|e| eyre!("Failed to download {}: {}", filename, e))?;

        if !response.status().is_success() {
            return Err(eyre!(
                "Failed to download {}: HTTP {}",
                filename,
                response.status()
            ));
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| f!("Failed to read {filename}"))?;

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| f!("Failed to create {}", dir.display()))?;
        let path = dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| f!("Failed to write {}", path.display()))?;

        Ok(path)
    }

    pub async fn list_files(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.url("/files"))
            .send()
            .await
            .map_err(|e| eyre!("Failed to list files: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Failed to list files: HTTP {}", response.status()));
        }

        let listing: FileListing = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse file listing: {}", e))?;

        Ok(listing.files)
    }
}

/// Submits generation requests, one at a time, and reports progress as
/// [`GenerationEvent`]s.
pub struct Submitter {
    api: ApiClient,
    events: UnboundedSender<GenerationEvent>,
    state: Mutex<AttemptState>,
}

/// Holds the submitter out of `Idle` for one attempt. Dropping it returns the
/// submitter to `Idle` on every exit path.
struct Attempt<'a> {
    state: &'a Mutex<AttemptState>,
}

impl Attempt<'_> {
    fn advance(&self, next: AttemptState) {
        let mut state = lock(self.state);
        match state.advance(next) {
            Ok(next) => *state = next,
            Err(e) => log::warn!("{e}"),
        }
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        *lock(self.state) = AttemptState::Idle;
    }
}

fn lock(state: &Mutex<AttemptState>) -> std::sync::MutexGuard<'_, AttemptState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Submitter {
    pub fn new(api: ApiClient, events: UnboundedSender<GenerationEvent>) -> Self {
        Self {
            api,
            events,
            state: Mutex::new(AttemptState::Idle),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[cfg(test)]
    pub fn state(&self) -> AttemptState {
        *lock(&self.state)
    }

    fn emit(&self, event: GenerationEvent) {
        // A closed channel only means nobody is watching the timeline.
        let _ = self.events.send(event);
    }

    fn begin(&self) -> Option<Attempt<'_>> {
        let mut state = lock(&self.state);
        if !state.accepts_submission() {
            return None;
        }
        *state = AttemptState::Validating;
        Some(Attempt { state: &self.state })
    }

    /// Read the story from `source`, then [`Submitter::submit`] it.
    ///
    /// An unreadable file becomes a failed result; no request is sent.
    pub async fn submit_source(&self, source: &InputSource, filename: &str) -> GenerationResult {
        let story = match source {
            InputSource::Text(_) => source.user_story(|_| Ok(String::new())),
            InputSource::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(content) => source.user_story(|_| Ok(content)),
                Err(e) => source.user_story(|_| Err(e)),
            },
        };

        match story {
            Ok(story) => self.submit(&story, filename).await,
            Err(e) => {
                let message = e.to_string();
                self.emit(GenerationEvent::Started {
                    story_len: 0,
                    filename: normalize_filename(filename),
                });
                self.emit(GenerationEvent::Failed {
                    message: message.clone(),
                });
                GenerationResult::failure(message)
            }
        }
    }

    /// Validate and send one generation request.
    ///
    /// An empty story fails immediately without touching the network. Network
    /// and decoding failures come back as `success: false` results; nothing is
    /// retried.
    pub async fn submit(&self, story: &str, filename: &str) -> GenerationResult {
        // A refused call must not write into the running attempt's timeline.
        let Some(attempt) = self.begin() else {
            return GenerationResult::failure(Error::Busy.to_string());
        };

        self.emit(GenerationEvent::Started {
            story_len: story.trim().chars().count(),
            filename: normalize_filename(filename),
        });

        let request = match GenerationRequest::new(story, filename) {
            Ok(request) => request,
            Err(e) => {
                attempt.advance(AttemptState::Failed);
                self.emit(GenerationEvent::Rejected {
                    reason: e.to_string(),
                });
                return GenerationResult::failure(e.to_string());
            }
        };

        attempt.advance(AttemptState::Submitting);
        self.emit(GenerationEvent::Sent {
            endpoint: self.api.url("/generate"),
        });

        let result = match self.api.generate(&request).await {
            Ok((status, result)) => {
                self.emit(GenerationEvent::Received { status });
                result
            }
            Err(e) => GenerationResult::failure(e.to_string()),
        };

        attempt.advance(if result.success {
            AttemptState::Succeeded
        } else {
            AttemptState::Failed
        });
        self.emit(GenerationEvent::from_result(&result));

        result
    }
}

/// Exit status for a finished generation.
///
/// A failed result has already been shown by the presenter, so it maps to a
/// plain failure code instead of an error report.
pub fn exit_code(result: &GenerationResult) -> ExitCode {
    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

pub async fn run_submit(options: SubmitOptions, global: crate::Global) -> Result<ExitCode> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let timeline = tokio::spawn(present::follow(rx, global.verbose));

    let submitter = Submitter::new(ApiClient::new(&options.server)?, tx);
    let result = submitter
        .submit_source(&options.input.source(), &options.filename)
        .await;

    let downloaded = match (&options.download, &result.filename) {
        (Some(dir), Some(filename)) if result.success => {
            Some(submitter.api().download(filename, dir).await)
        }
        _ => None,
    };
    let base_url = submitter.api().base_url().to_string();
    drop(submitter);

    let timeline = timeline
        .await
        .map_err(|e| eyre!("Timeline task failed: {e}"))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        present::render(&result, &base_url);
        if global.verbose {
            present::render_timeline(&timeline);
        }
    }

    if let Some(downloaded) = downloaded {
        let path = downloaded?;
        present::render_download(&path);
    }

    Ok(exit_code(&result))
}

pub async fn run_files(options: FilesOptions, _global: crate::Global) -> Result<()> {
    let api = ApiClient::new(&options.server)?;
    let files = api.list_files().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    let mut table = new_table();
    table.set_titles(prettytable::row!["FILE", "DOWNLOAD"]);
    for file in &files {
        table.add_row(prettytable::row![file, api.url(&download_path(file))]);
    }
    table.printstd();

    Ok(())
}
