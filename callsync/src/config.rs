use intake::config::Config as IntakeConfig;
use serde::Deserialize;
use std::fs::File;

pub const ENV_API_KEY: &str = "TRACKER_API_KEY";
pub const ENV_BOARD_ID: &str = "TRACKER_BOARD_ID";
pub const ENV_SHARED_SECRET: &str = "INTAKE_SHARED_SECRET";

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub intake: IntakeConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Credentials kept out of the config file take precedence over it.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let tracker = &mut self.intake.tracker;
        if let Some(api_key) = lookup(ENV_API_KEY) {
            tracker.api_key = Some(api_key);
        }
        if let Some(board_id) = lookup(ENV_BOARD_ID) {
            tracker.board_id = Some(board_id);
        }
        if let Some(secret) = lookup(ENV_SHARED_SECRET) {
            self.intake.shared_secret = Some(secret);
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            logging:
                sentry_dsn: "https://key@sentry.example.com/1"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            intake:
                listener:
                    host: 0.0.0.0
                    port: 8080
                shared_secret: s3cret
                tracker:
                    api_key: key
                    board_id: "123"
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_host, "127.0.0.1");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(
            config.logging.expect("logging config").sentry_dsn,
            "https://key@sentry.example.com/1"
        );
        assert_eq!(config.intake.listener.port, 8080);
        assert_eq!(config.intake.tracker.board_id(), Some("123"));
        assert!(config.intake.validate().is_ok());
    }

    #[test]
    fn minimal_config() {
        let tmp = write_tmp_file("intake: {}\n");
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.metrics.is_none());
        assert!(config.logging.is_none());
        assert_eq!(config.intake.listener.port, 3000);
        assert_eq!(config.intake.tracker.api_key(), None);
    }

    #[test]
    fn env_overrides_file() {
        let tmp = write_tmp_file(
            r#"
            intake:
                tracker:
                    api_key: from-file
                    board_id: "1"
            "#,
        );
        let mut config = Config::from_file(tmp.path()).expect("load config");
        let env = HashMap::from([
            (ENV_API_KEY, "from-env"),
            (ENV_SHARED_SECRET, "env-secret"),
        ]);

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.intake.tracker.api_key(), Some("from-env"));
        assert_eq!(config.intake.tracker.board_id(), Some("1"));
        assert_eq!(config.intake.shared_secret.as_deref(), Some("env-secret"));
    }

    #[test]
    fn load_errors() {
        let missing = Config::from_file(std::path::Path::new("/nonexistent/callsync.yaml"));
        assert!(matches!(missing, Err(ConfigError::LoadError(_))));

        let tmp = write_tmp_file("intake: {listener: {port: not-a-port}}\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
