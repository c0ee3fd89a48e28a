use thiserror::Error;

/// Result type alias for intake operations
pub type Result<T, E = IntakeError> = std::result::Result<T, E>;

/// Errors that escape the request pipeline.
///
/// Expected failures (bad input, remote rejections) are reported in the response body
/// instead; these are the faults the service cannot account for.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tracker client error: {0}")]
    Tracker(#[from] tracker::TrackerError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ValidationError),

    #[error("Request pipeline failed: {0}")]
    Pipeline(String),
}
