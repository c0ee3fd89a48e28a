use crate::columns::ColumnIds;
use crate::routing::DepartmentRouter;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracker::{GraphqlClient, TrackerError};
use url::Url;

const DEFAULT_API_URL: &str = "https://api.monday.com/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 8;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Tracker timeout cannot be 0")]
    InvalidTimeout,

    #[error("Empty column id for field {0}")]
    EmptyColumnId(String),
}

/// Intake service configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for inbound call events
    #[serde(default)]
    pub listener: Listener,
    /// Secret every request must present. Without one, every request is rejected.
    #[serde(default)]
    pub shared_secret: Option<String>,
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Overrides for individual column ids of the target board
    #[serde(default)]
    pub columns: ColumnIds,
    /// Replaces the built-in `division|department` to mailbox table
    #[serde(default)]
    pub mailboxes: Option<HashMap<String, String>>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if self.tracker.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        for (field, id) in self.columns.iter() {
            if id.trim().is_empty() {
                return Err(ValidationError::EmptyColumnId(format!("{field:?}")));
            }
        }

        Ok(())
    }

    pub fn router(&self) -> DepartmentRouter {
        match &self.mailboxes {
            Some(entries) => DepartmentRouter::new(entries.clone()),
            None => DepartmentRouter::default(),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Connection settings for the tracking service.
///
/// The API key and board id may be left out of the file and supplied through the
/// environment; requests are answered with a configuration error while either is missing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TrackerConfig {
    #[serde(default = "default_api_url")]
    pub api_url: Url,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub board_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            api_url: default_api_url(),
            api_key: None,
            board_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TrackerConfig {
    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }

    pub fn board_id(&self) -> Option<&str> {
        non_empty(&self.board_id)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds a client, or `None` when no API key is configured.
    pub fn client(&self) -> Option<Result<GraphqlClient, TrackerError>> {
        self.api_key().map(|api_key| {
            GraphqlClient::new(self.api_url.clone(), api_key.to_string(), self.timeout())
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("valid default api url")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
