//! Creates one record per call and writes its columns, degrading to per-column writes.
//!
//! The lifecycle is an explicit state machine:
//!
//! ```text
//! Start -> Created -> (batch write) -> Done(Success)
//!                                   -> Degraded -> Degraded -> ... -> Done(PartialSuccess | UpdateFailed)
//! Start -> Done(CreateFailed)
//! ```
//!
//! A failed create is terminal. A failed batch write is replayed one column at a time,
//! strictly in sequence, and the outcome of each column is collected. The transitions are
//! plain functions of the previous state and the remote call's result, so aggregation can
//! be tested without a transport.

use crate::columns::ColumnIds;
use crate::extract::CallEvent;
use crate::metrics_defs::{FIELD_DEGRADED, SYNC_OUTCOME};
use crate::params::truncate;
use crate::payload::build_payload;
use crate::routing::DepartmentRouter;
use chrono::Utc;
use serde::Serialize;
use shared::counter;
use std::collections::VecDeque;
use tracker::{ColumnValue, ColumnValues, Diagnostic, Record, TrackerClient, TrackerError};

/// Longest record name the tracking service accepts.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldFailure {
    #[serde(rename = "colId")]
    pub column_id: String,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SyncResult {
    Success {
        record_id: String,
        record_name: String,
        applied_fields: Vec<String>,
    },
    PartialSuccess {
        record_id: String,
        record_name: String,
        applied_fields: Vec<String>,
        failed_fields: Vec<FieldFailure>,
    },
    CreateFailed {
        diagnostic: Diagnostic,
    },
    UpdateFailed {
        record_id: String,
        diagnostic: Diagnostic,
        attempted_fields: Vec<String>,
    },
}

impl SyncResult {
    pub fn outcome(&self) -> &'static str {
        match self {
            SyncResult::Success { .. } => "success",
            SyncResult::PartialSuccess { .. } => "partial_success",
            SyncResult::CreateFailed { .. } => "create_failed",
            SyncResult::UpdateFailed { .. } => "update_failed",
        }
    }
}

/// Progress of the per-column replay after a failed batch write.
#[derive(Debug)]
pub struct Degraded {
    record: Record,
    batch: Diagnostic,
    attempted: Vec<String>,
    pending: VecDeque<(String, ColumnValue)>,
    applied: Vec<String>,
    failed: Vec<FieldFailure>,
}

impl Degraded {
    /// The next column to write on its own, if any remain.
    pub fn next_field(&mut self) -> Option<(String, ColumnValue)> {
        self.pending.pop_front()
    }

    pub fn record_field(&mut self, column_id: String, result: Result<(), TrackerError>) {
        match result {
            Ok(()) => {
                counter!(FIELD_DEGRADED, "result" => "applied").increment(1);
                self.applied.push(column_id);
            }
            Err(e) => {
                counter!(FIELD_DEGRADED, "result" => "failed").increment(1);
                let diagnostic = e.diagnostic();
                tracing::error!(
                    column_id = %column_id,
                    errors = ?diagnostic.errors,
                    "Single column update failed"
                );
                self.failed.push(FieldFailure {
                    column_id,
                    diagnostic,
                });
            }
        }
    }

    /// Partial success if any column applied, otherwise the batch failure stands.
    pub fn finish(self) -> SyncResult {
        if self.applied.is_empty() {
            return SyncResult::UpdateFailed {
                record_id: self.record.id,
                diagnostic: self.batch,
                attempted_fields: self.attempted,
            };
        }

        tracing::info!(
            applied = ?self.applied,
            failed = ?self.failed.iter().map(|f| &f.column_id).collect::<Vec<_>>(),
            "Columns partially applied"
        );
        SyncResult::PartialSuccess {
            record_id: self.record.id,
            record_name: self.record.name,
            applied_fields: self.applied,
            failed_fields: self.failed,
        }
    }
}

#[derive(Debug)]
pub enum SyncState {
    Start,
    Created(Record),
    Degraded(Degraded),
    Done(SyncResult),
}

impl SyncState {
    /// Start -> Created, or Done when the record could not be created.
    pub fn after_create(result: Result<Record, TrackerError>) -> SyncState {
        match result {
            Ok(record) => SyncState::Created(record),
            Err(e) => {
                tracing::error!(error = %e, "Record creation failed");
                SyncState::Done(SyncResult::CreateFailed {
                    diagnostic: e.diagnostic(),
                })
            }
        }
    }

    /// Created -> Done when the batch write applied, Degraded otherwise.
    pub fn after_batch(
        record: Record,
        payload: ColumnValues,
        result: Result<(), TrackerError>,
    ) -> SyncState {
        let attempted: Vec<String> = payload.keys().cloned().collect();
        match result {
            Ok(()) => SyncState::Done(SyncResult::Success {
                record_id: record.id,
                record_name: record.name,
                applied_fields: attempted,
            }),
            Err(e) => {
                let batch = e.diagnostic();
                tracing::warn!(errors = ?batch.errors, "Batch column update failed, degrading");
                SyncState::Degraded(Degraded {
                    record,
                    batch,
                    attempted,
                    pending: payload.into_iter().collect(),
                    applied: Vec::new(),
                    failed: Vec::new(),
                })
            }
        }
    }
}

/// Drives one call event through the record lifecycle against a tracker.
pub struct SyncOrchestrator<'a> {
    client: &'a dyn TrackerClient,
    board_id: &'a str,
    columns: &'a ColumnIds,
    router: &'a DepartmentRouter,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        client: &'a dyn TrackerClient,
        board_id: &'a str,
        columns: &'a ColumnIds,
        router: &'a DepartmentRouter,
    ) -> Self {
        Self {
            client,
            board_id,
            columns,
            router,
        }
    }

    pub async fn run(&self, event: &CallEvent) -> SyncResult {
        let mut state = SyncState::Start;

        let result = loop {
            state = match state {
                SyncState::Start => {
                    let name = truncate(&event.name, MAX_NAME_LEN);
                    tracing::info!(board_id = %self.board_id, "Creating record");
                    SyncState::after_create(self.client.create_record(self.board_id, &name).await)
                }
                SyncState::Created(record) => {
                    let payload = build_payload(event, self.columns, self.router, Utc::now());
                    tracing::info!(
                        record_id = %record.id,
                        column_ids = ?payload.keys().collect::<Vec<_>>(),
                        "Updating columns"
                    );
                    let result = self
                        .client
                        .update_fields(self.board_id, &record.id, &payload)
                        .await;
                    SyncState::after_batch(record, payload, result)
                }
                SyncState::Degraded(mut degraded) => match degraded.next_field() {
                    Some((column_id, value)) => {
                        let single = ColumnValues::from([(column_id.clone(), value)]);
                        let result = self
                            .client
                            .update_fields(self.board_id, &degraded.record.id, &single)
                            .await;
                        degraded.record_field(column_id, result);
                        SyncState::Degraded(degraded)
                    }
                    None => SyncState::Done(degraded.finish()),
                },
                SyncState::Done(result) => break result,
            };
        };

        counter!(SYNC_OUTCOME, "outcome" => result.outcome()).increment(1);
        result
    }
}
