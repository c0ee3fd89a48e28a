use crate::errors::TrackerError;
use crate::types::{Board, ColumnValues, Record};
use async_trait::async_trait;

/// Operations the intake pipeline invokes on the tracking service.
///
/// Every call is bounded by the implementation's timeout; a timeout surfaces as
/// [`TrackerError::Timeout`] and is otherwise handled like any transport failure.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Creates a new record named `name` on the board.
    async fn create_record(&self, board_id: &str, name: &str) -> Result<Record, TrackerError>;

    /// Writes `values` to the columns of an existing record.
    ///
    /// Used both for the full batch and for the single-column writes of the degrade pass.
    async fn update_fields(
        &self,
        board_id: &str,
        record_id: &str,
        values: &ColumnValues,
    ) -> Result<(), TrackerError>;

    /// Lists the columns configured on the board.
    async fn list_columns(&self, board_id: &str) -> Result<Board, TrackerError>;
}
