//! Call-event intake.
//!
//! Turns the query parameters of a call-platform webhook into a record on a work-item
//! tracking board. Inputs are normalized leniently (anything that cannot be normalized
//! confidently is left out), then the record is created and its columns written in one
//! batch, falling back to one write per column when the batch is rejected.

pub mod columns;
pub mod config;
pub mod email;
pub mod errors;
pub mod extract;
pub mod metrics_defs;
pub mod normalized;
pub mod params;
pub mod payload;
pub mod phone;
pub mod response;
pub mod routing;
pub mod service;
pub mod sync;

#[cfg(test)]
mod testutils;

use crate::errors::Result;
use crate::service::{Intake, IntakeService};
use shared::http::run_http_service;
use std::sync::Arc;

pub async fn run(config: config::Config) -> Result<()> {
    config.validate()?;

    let intake = Arc::new(Intake::new(&config)?);
    tracing::info!(
        board_id = config.tracker.board_id().unwrap_or("<unset>"),
        has_api_key = config.tracker.api_key().is_some(),
        "Starting intake service"
    );

    let service = IntakeService::new(intake);
    run_http_service(&config.listener.host, config.listener.port, service).await
}
