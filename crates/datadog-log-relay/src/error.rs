// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors that can occur while capturing container log streams.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Unable to open log file {}: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write log record: {0}")]
    RecordWrite(#[source] std::io::Error),

    #[error("Failed to read log stream: {0}")]
    StreamRead(#[source] std::io::Error),
}

impl RelayError {
    /// True for errors that abort startup before any stream is drained.
    ///
    /// Everything else is reported and survived: a lost record or a dead
    /// stream still leaves the sibling stream capturing.
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self,
            RelayError::SinkOpen { .. } | RelayError::InvalidConfig(_)
        )
    }
}
