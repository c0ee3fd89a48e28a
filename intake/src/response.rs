use crate::sync::{FieldFailure, SyncResult};
use serde::Serialize;
use tracker::{Board, Diagnostic, TrackerError};

pub const STEP_CREATE: &str = "create_item";
pub const STEP_UPDATE: &str = "change_multiple_column_values";
pub const STEP_COLUMNS: &str = "columns";

/// A plain failure, `{success: false, error, message?}`.
#[derive(Debug, Serialize)]
pub struct ErrorReply<'a> {
    pub success: bool,
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<'a> ErrorReply<'a> {
    pub fn new(error: &'a str) -> Self {
        ErrorReply {
            success: false,
            error,
            message: None,
        }
    }

    pub fn unhandled(message: impl Into<String>) -> Self {
        ErrorReply {
            success: false,
            error: "Unhandled exception",
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PingReply<'a> {
    pub success: bool,
    pub message: &'a str,
    pub method: &'a str,
    pub now: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigDetails {
    pub has_api_key: bool,
    pub has_board_id: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfigErrorReply {
    pub success: bool,
    pub error: &'static str,
    pub details: ConfigDetails,
}

impl ConfigErrorReply {
    pub fn new(has_api_key: bool, has_board_id: bool) -> Self {
        ConfigErrorReply {
            success: false,
            error: "Server config error: missing tracker settings",
            details: ConfigDetails {
                has_api_key,
                has_board_id,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ColumnsReply {
    pub success: bool,
    pub step: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

impl From<Result<Board, TrackerError>> for ColumnsReply {
    fn from(result: Result<Board, TrackerError>) -> Self {
        match result {
            Ok(board) => ColumnsReply {
                success: true,
                step: STEP_COLUMNS,
                board: Some(board),
                diagnostic: Diagnostic::default(),
            },
            Err(e) => ColumnsReply {
                success: false,
                step: STEP_COLUMNS,
                board: None,
                diagnostic: e.diagnostic(),
            },
        }
    }
}

/// Wire shape of a [`SyncResult`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SyncReply<'a> {
    Applied {
        success: bool,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        partial: bool,
        item_id: &'a str,
        item_name: &'a str,
        applied_columns: &'a [String],
        #[serde(skip_serializing_if = "Option::is_none")]
        failed_columns: Option<&'a [FieldFailure]>,
    },
    Failed {
        success: bool,
        step: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<&'a str>,
        #[serde(flatten)]
        diagnostic: &'a Diagnostic,
        #[serde(skip_serializing_if = "Option::is_none")]
        sent_columns: Option<&'a [String]>,
    },
}

impl<'a> From<&'a SyncResult> for SyncReply<'a> {
    fn from(result: &'a SyncResult) -> Self {
        match result {
            SyncResult::Success {
                record_id,
                record_name,
                applied_fields,
            } => SyncReply::Applied {
                success: true,
                partial: false,
                item_id: record_id,
                item_name: record_name,
                applied_columns: applied_fields,
                failed_columns: None,
            },
            SyncResult::PartialSuccess {
                record_id,
                record_name,
                applied_fields,
                failed_fields,
            } => SyncReply::Applied {
                success: true,
                partial: true,
                item_id: record_id,
                item_name: record_name,
                applied_columns: applied_fields,
                failed_columns: Some(failed_fields.as_slice()),
            },
            SyncResult::CreateFailed { diagnostic } => SyncReply::Failed {
                success: false,
                step: STEP_CREATE,
                error: diagnostic.errors.first().map(String::as_str),
                item_id: None,
                diagnostic,
                sent_columns: None,
            },
            SyncResult::UpdateFailed {
                record_id,
                diagnostic,
                attempted_fields,
            } => SyncReply::Failed {
                success: false,
                step: STEP_UPDATE,
                error: None,
                item_id: Some(record_id.as_str()),
                diagnostic,
                sent_columns: Some(attempted_fields.as_slice()),
            },
        }
    }
}
