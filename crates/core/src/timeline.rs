//! Attempt state machine and the client-side event timeline
//!
//! The network layer emits [`GenerationEvent`]s; whoever presents results owns
//! a [`Timeline`] and appends one [`LogEntry`] per event. Nothing here is ever
//! persisted.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::result::GenerationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
}

/// Something that happened during one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Started { story_len: usize, filename: String },
    Rejected { reason: String },
    Sent { endpoint: String },
    Received { status: u16 },
    Succeeded { count: usize, filename: String },
    Failed { message: String },
}

impl GenerationEvent {
    /// Events after which the attempt is over.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationEvent::Rejected { .. }
                | GenerationEvent::Succeeded { .. }
                | GenerationEvent::Failed { .. }
        )
    }

    /// The terminal event matching a result.
    pub fn from_result(result: &GenerationResult) -> Self {
        match (result.success, &result.filename) {
            (true, Some(filename)) => GenerationEvent::Succeeded {
                count: result.count.unwrap_or_default(),
                filename: filename.clone(),
            },
            _ => GenerationEvent::Failed {
                message: result.message.clone(),
            },
        }
    }

    /// Only transport and server failures are errors. Rejected input is
    /// ordinary feedback.
    pub fn kind(&self) -> LogKind {
        match self {
            GenerationEvent::Succeeded { .. } => LogKind::Success,
            GenerationEvent::Failed { .. } => LogKind::Error,
            _ => LogKind::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            GenerationEvent::Started {
                story_len,
                filename,
            } => format!("Starting generation for '{filename}' ({story_len} characters)"),
            GenerationEvent::Rejected { reason } => format!("Not submitted: {reason}"),
            GenerationEvent::Sent { endpoint } => format!("Request sent to {endpoint}"),
            GenerationEvent::Received { status } => format!("Response received (HTTP {status})"),
            GenerationEvent::Succeeded { count, filename } => {
                format!("Generated {count} test cases into {filename}")
            }
            GenerationEvent::Failed { message } => format!("Generation failed: {message}"),
        }
    }
}

/// Append-only list of log entries with non-decreasing timestamps.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<LogEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &GenerationEvent) -> &LogEntry {
        self.push_at(event.message(), event.kind(), Local::now())
    }

    /// Append an entry. A clock reading older than the last entry is clamped
    /// to it, so timestamps never go backwards.
    pub fn push_at(
        &mut self,
        message: impl Into<String>,
        kind: LogKind,
        at: DateTime<Local>,
    ) -> &LogEntry {
        let timestamp = match self.entries.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };

        self.entries.push(LogEntry {
            timestamp,
            message: message.into(),
            kind,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

/// Where a single generation attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttemptState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid attempt transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: AttemptState,
    pub to: AttemptState,
}

impl AttemptState {
    /// Move to `next`, refusing transitions the attempt lifecycle doesn't allow.
    ///
    /// `Idle → Validating → Submitting → (Succeeded | Failed) → Idle`, with
    /// `Validating → Failed` for rejected input.
    pub fn advance(self, next: AttemptState) -> Result<AttemptState, TransitionError> {
        use AttemptState::*;

        match (self, next) {
            (Idle, Validating)
            | (Validating, Submitting)
            | (Validating, Failed)
            | (Submitting, Succeeded)
            | (Submitting, Failed)
            | (Succeeded, Idle)
            | (Failed, Idle) => Ok(next),
            (from, to) => Err(TransitionError { from, to }),
        }
    }

    /// Whether a new submission may start.
    pub fn accepts_submission(self) -> bool {
        self == AttemptState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_timeline_appends_in_order() {
        let mut timeline = Timeline::new();
        timeline.record(&GenerationEvent::Started {
            story_len: 10,
            filename: "cases".to_string(),
        });
        timeline.record(&GenerationEvent::Failed {
            message: "boom".to_string(),
        });

        let entries = timeline.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, LogKind::Info);
        assert_eq!(entries[1].kind, LogKind::Error);
        assert_eq!(entries[1].message, "Generation failed: boom");
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_timeline_clamps_backwards_clock() {
        let mut timeline = Timeline::new();
        let now = Local::now();
        timeline.push_at("first", LogKind::Info, now);
        let entry = timeline.push_at("second", LogKind::Info, now - Duration::seconds(5));
        assert_eq!(entry.timestamp, now);
    }

    #[test]
    fn test_log_entry_serializes_type() {
        let mut timeline = Timeline::new();
        timeline.push_at("done", LogKind::Success, Local::now());
        let value = serde_json::to_value(&timeline.entries()[0]).unwrap();
        assert_eq!(value["type"], "success");
        assert_eq!(value["message"], "done");
    }

    #[test]
    fn test_rejected_input_is_not_an_error() {
        let rejected = GenerationEvent::Rejected {
            reason: "Please provide a user story.".to_string(),
        };
        assert_eq!(rejected.kind(), LogKind::Info);
        assert_eq!(rejected.message(), "Not submitted: Please provide a user story.");
    }

    #[test]
    fn test_terminal_events() {
        assert!(!GenerationEvent::Sent {
            endpoint: "x".to_string()
        }
        .is_terminal());
        assert!(GenerationEvent::Rejected {
            reason: "empty".to_string()
        }
        .is_terminal());
    }

    #[test]
    fn test_event_from_result() {
        let failed = GenerationResult::failure("quota exceeded");
        assert_eq!(
            GenerationEvent::from_result(&failed),
            GenerationEvent::Failed {
                message: "quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn test_attempt_happy_path_returns_to_idle() {
        let state = AttemptState::Idle
            .advance(AttemptState::Validating)
            .and_then(|s| s.advance(AttemptState::Submitting))
            .and_then(|s| s.advance(AttemptState::Succeeded))
            .and_then(|s| s.advance(AttemptState::Idle))
            .unwrap();
        assert!(state.accepts_submission());
    }

    #[test]
    fn test_attempt_rejected_input_skips_submitting() {
        let state = AttemptState::Validating
            .advance(AttemptState::Failed)
            .unwrap();
        assert_eq!(state.advance(AttemptState::Idle), Ok(AttemptState::Idle));
    }

    #[test]
    fn test_attempt_invalid_transitions() {
        assert_eq!(
            AttemptState::Idle.advance(AttemptState::Submitting),
            Err(TransitionError {
                from: AttemptState::Idle,
                to: AttemptState::Submitting,
            })
        );
        assert!(AttemptState::Submitting.advance(AttemptState::Idle).is_err());
        assert!(!AttemptState::Submitting.accepts_submission());
    }
}
