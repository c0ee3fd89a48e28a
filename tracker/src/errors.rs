use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}")]
    Status {
        status: u16,
        errors: Vec<String>,
        raw: String,
    },

    #[error("remote rejected the operation: {}", errors.join("; "))]
    Application {
        status: u16,
        errors: Vec<String>,
        raw: String,
    },

    #[error("invalid response: {message}")]
    InvalidResponse {
        status: u16,
        message: String,
        raw: String,
    },

    #[error("No item id returned")]
    MissingRecordId { status: u16, raw: String },

    #[error("board not found: {0}")]
    BoardNotFound(String),

    #[error("could not encode request: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything the caller needs to debug a failed remote operation without retrying it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl TrackerError {
    /// Flattens the error into a [`Diagnostic`].
    ///
    /// `errors` is never empty: when the service returned no error messages the raw body,
    /// or failing that the error text itself, stands in.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            TrackerError::Status { status, errors, raw } => Diagnostic {
                status: Some(*status),
                errors: messages_or(errors, raw, self),
                raw: Some(raw.clone()),
            },
            TrackerError::Application { status, errors, raw } => Diagnostic {
                status: Some(*status),
                errors: messages_or(errors, raw, self),
                raw: Some(raw.clone()),
            },
            TrackerError::InvalidResponse {
                status,
                message,
                raw,
            } => Diagnostic {
                status: Some(*status),
                errors: vec![message.clone()],
                raw: Some(raw.clone()),
            },
            TrackerError::MissingRecordId { status, raw } => Diagnostic {
                status: Some(*status),
                errors: vec![self.to_string()],
                raw: Some(raw.clone()),
            },
            TrackerError::Timeout(_)
            | TrackerError::Transport(_)
            | TrackerError::BoardNotFound(_)
            | TrackerError::Serialization(_) => Diagnostic {
                status: None,
                errors: vec![self.to_string()],
                raw: None,
            },
        }
    }
}

fn messages_or(errors: &[String], raw: &str, err: &TrackerError) -> Vec<String> {
    if !errors.is_empty() {
        errors.to_vec()
    } else if !raw.is_empty() {
        vec![raw.to_string()]
    } else {
        vec![err.to_string()]
    }
}
