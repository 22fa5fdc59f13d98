//! Error types for the translation pipeline

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use super::orchestrator::TranslatedFile;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("generation request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("response rejected: {0}")]
    Validation(String),

    #[error("{unit} failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        unit: String,
        attempts: u32,
        last_error: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TranslateError {
    /// Transport, timeout and validation failures are worth re-issuing.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub filename: String,
    pub original_path: String,
    pub error: String,
}

/// A batch in which at least one document could not be translated.
///
/// `succeeded` is empty when the batch ran under the parallel fan-out policy,
/// since any failure there fails the whole batch.
#[derive(Error, Debug)]
#[error("{} document(s) failed: {}", .failed.len(), describe_failures(.failed))]
pub struct BatchFailure {
    pub succeeded: Vec<TranslatedFile>,
    pub failed: Vec<DocumentFailure>,
}

fn describe_failures(failed: &[DocumentFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("{} ({})", f.filename, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(TranslateError::Transport("503".into()).is_retryable());
        assert!(TranslateError::Timeout(Duration::from_secs(90)).is_retryable());
        assert!(TranslateError::Validation("short".into()).is_retryable());
        assert!(!TranslateError::Configuration("no key".into()).is_retryable());
        assert!(
            !TranslateError::Exhausted {
                unit: "chunk 1/1".into(),
                attempts: 3,
                last_error: "x".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_batch_failure_lists_filenames() {
        let failure = BatchFailure {
            succeeded: vec![],
            failed: vec![
                DocumentFailure {
                    filename: "a.html".into(),
                    original_path: "docs/a.html".into(),
                    error: "timed out".into(),
                },
                DocumentFailure {
                    filename: "b.html".into(),
                    original_path: "docs/b.html".into(),
                    error: "missing </html>".into(),
                },
            ],
        };
        let msg = failure.to_string();
        assert!(msg.starts_with("2 document(s) failed"));
        assert!(msg.contains("a.html (timed out)"));
        assert!(msg.contains("b.html (missing </html>)"));
    }
}
