// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::RecordFormat;
use crate::error::RelayError;
use crate::forwarder::RemoteForwarder;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stream a captured line originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginTag {
    Stdout,
    Stderr,
}

impl OriginTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginTag::Stdout => "STDOUT",
            OriginTag::Stderr => "STDERR",
        }
    }
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for captured log lines.
///
/// Implementations must make each record atomic: two concurrent `write`
/// calls never interleave their bytes in the underlying target, and a
/// successful return means the record reached stable storage.
#[async_trait]
pub trait LineSink {
    /// Durably record one line. `content` excludes the line terminator.
    async fn write(&self, tag: OriginTag, content: &str) -> Result<(), RelayError>;
}

/// Append-only file sink shared by both stream drainers.
///
/// A single mutex serializes the format+append+fsync critical section, so
/// records from the two streams interleave only at line granularity and the
/// timestamp order in the file matches the append order.
pub struct FileSink {
    file: Mutex<File>,
    format: RecordFormat,
}

impl FileSink {
    /// Open (or create) the append-only log file. The file is never
    /// truncated: repeated runs against the same path accumulate records.
    pub async fn create(path: &Path, format: RecordFormat) -> Result<Self, RelayError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| RelayError::SinkOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(FileSink {
            file: Mutex::new(file),
            format,
        })
    }

    fn format_record(&self, tag: OriginTag, content: &str) -> String {
        match self.format {
            RecordFormat::Timestamped => format!(
                "{} [{}] {}\n",
                Local::now().format(TIMESTAMP_FORMAT),
                tag,
                content
            ),
            RecordFormat::Plain => format!("{content}\n"),
        }
    }
}

#[async_trait]
impl LineSink for FileSink {
    async fn write(&self, tag: OriginTag, content: &str) -> Result<(), RelayError> {
        let mut file = self.file.lock().await;
        // Timestamp captured inside the critical section, at write time.
        let record = self.format_record(tag, content);
        file.write_all(record.as_bytes())
            .await
            .map_err(RelayError::RecordWrite)?;
        file.flush().await.map_err(RelayError::RecordWrite)?;
        // Durability barrier: the record is on stable storage before the
        // drainer is allowed to read the next line.
        file.sync_all().await.map_err(RelayError::RecordWrite)?;
        Ok(())
    }
}

/// Fan-out sink composing the durable file sink with the remote forwarder.
///
/// The durable write happens first and its result is what the drainer sees;
/// the forward runs after, outside the file's critical section, and its
/// outcome is discarded. The drainer stays ignorant of how many sinks exist.
pub struct FanoutSink {
    primary: Arc<dyn LineSink + Send + Sync>,
    forwarder: RemoteForwarder,
}

impl FanoutSink {
    pub fn new(primary: Arc<dyn LineSink + Send + Sync>, forwarder: RemoteForwarder) -> Self {
        FanoutSink { primary, forwarder }
    }
}

#[async_trait]
impl LineSink for FanoutSink {
    async fn write(&self, tag: OriginTag, content: &str) -> Result<(), RelayError> {
        let result = self.primary.write(tag, content).await;
        self.forwarder.forward(content).await;
        result
    }
}
