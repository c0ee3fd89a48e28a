//! Client for the remote work-item tracking service.
//!
//! The intake pipeline only needs three operations from the service: create a record,
//! write a set of column values to it, and list the columns of a board. They are
//! expressed by the [`TrackerClient`] trait so the pipeline can be exercised without a
//! network; [`GraphqlClient`] is the production implementation.

pub mod client;
pub mod errors;
pub mod graphql;
pub mod metrics_defs;
pub mod types;

pub use client::TrackerClient;
pub use errors::{Diagnostic, TrackerError};
pub use graphql::GraphqlClient;
pub use types::{Board, Column, ColumnValue, ColumnValues, Record};
