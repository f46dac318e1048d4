use serde::Deserialize;
use std::fs::File;
use tenant_api::config::{Config as ApiConfig, ValidationError};

fn default_prefix() -> String {
    "controller".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(flatten)]
    pub api: ApiConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data: Config = serde_yaml::from_reader(file)?;
        data.api.validate()?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            listener:
                host: 0.0.0.0
                port: 6379
            admin_listener:
                host: 127.0.0.1
                port: 6380
            identity_header: x-auth-tenant
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://key@sentry.example.com/1
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.api.listener.port, 6379);
        assert_eq!(config.api.identity_header, "x-auth-tenant");
        assert_eq!(config.api.request_id_header, "x-request-id");
        assert_eq!(
            config.metrics,
            Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 8125,
                prefix: "controller".into(),
            })
        );
        let logging = config.logging.expect("logging config");
        assert_eq!(logging.level, "info");
        assert_eq!(
            logging.sentry_dsn.as_deref(),
            Some("https://key@sentry.example.com/1")
        );
    }

    #[test]
    fn minimal_config() {
        let yaml = r#"
            listener: {host: 0.0.0.0, port: 6379}
            admin_listener: {host: 0.0.0.0, port: 6380}
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(config.metrics.is_none());
        assert!(config.logging.is_none());
    }

    #[test]
    fn invalid_config() {
        let tmp = write_tmp_file("listener: {host: 0.0.0.0, port: 6379}\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));

        let tmp = write_tmp_file(
            "listener: {host: 0.0.0.0, port: 0}\nadmin_listener: {host: 0.0.0.0, port: 6380}\n",
        );
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::Invalid(ValidationError::InvalidPort))
        ));

        assert!(matches!(
            Config::from_file(std::path::Path::new("/nonexistent/controller.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
