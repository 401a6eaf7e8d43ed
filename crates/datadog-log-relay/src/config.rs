// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;

use crate::error::RelayError;

const DEFAULT_LOG_FILE_STEM: &str = "container";
const DEFAULT_COLLECTOR_URL: &str = "http://128.9.0.1:8080/log";
const URL_ARG_TOKEN: &str = "url";

/// How a captured line is rendered into the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `YYYY-MM-DD HH:MM:SS [STDOUT|STDERR] <content>`, one record per line.
    Timestamped,
    /// The raw line content, for consumers that stamp records downstream.
    Plain,
}

impl RecordFormat {
    fn from_env_value(value: &str) -> Option<RecordFormat> {
        match value.to_lowercase().as_str() {
            "timestamped" => Some(RecordFormat::Timestamped),
            "plain" => Some(RecordFormat::Plain),
            _ => None,
        }
    }
}

/// Configuration for one capture run, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Append-only file the captured lines are persisted to.
    pub log_path: PathBuf,
    pub record_format: RecordFormat,
    /// Whether each captured line is also forwarded to the remote collector.
    pub forward_logs: bool,
    pub collector_url: String,
    /// Diagnostic verbosity (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: env::temp_dir().join(format!("{DEFAULT_LOG_FILE_STEM}.log")),
            record_format: RecordFormat::Timestamped,
            forward_logs: false,
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Resolve the configuration from the invocation arguments (everything
    /// after the binary name) and the environment.
    ///
    /// The first positional argument that is not a recognized token names the
    /// log file, placed as `<name>.log` in the OS temp directory. A `url`
    /// token followed by a value overrides the collector endpoint.
    /// Unrecognized arguments are ignored.
    pub fn from_invocation(args: &[String]) -> Result<Config, RelayError> {
        let file_stem = args
            .first()
            .map(String::as_str)
            .filter(|arg| *arg != URL_ARG_TOKEN)
            .unwrap_or(DEFAULT_LOG_FILE_STEM);
        if file_stem.is_empty() || file_stem.contains(['/', '\\']) {
            return Err(RelayError::InvalidConfig(format!(
                "log file name {file_stem:?} must be a bare file stem"
            )));
        }

        let mut collector_url = DEFAULT_COLLECTOR_URL.to_string();
        for i in 0..args.len() {
            if args[i] == URL_ARG_TOKEN {
                if let Some(value) = args.get(i + 1) {
                    collector_url = value.clone();
                }
            }
        }

        let record_format = match env::var("DD_CONTAINER_LOG_FORMAT") {
            Ok(value) => RecordFormat::from_env_value(&value).ok_or_else(|| {
                RelayError::InvalidConfig(format!(
                    "Invalid record format '{value}'. Must be one of: timestamped, plain"
                ))
            })?,
            Err(_) => RecordFormat::Timestamped,
        };

        let forward_logs = env::var("DD_FORWARD_LOGS")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(false);

        let log_level = env::var("DD_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Config {
            log_path: env::temp_dir().join(format!("{file_stem}.log")),
            record_format,
            forward_logs,
            collector_url,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.collector_url.trim().is_empty() {
            return Err(RelayError::InvalidConfig(
                "collector URL cannot be empty".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(RelayError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}
