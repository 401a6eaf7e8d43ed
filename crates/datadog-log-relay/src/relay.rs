// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, error};

use crate::config::Config;
use crate::drainer::{self, DrainSummary};
use crate::error::RelayError;
use crate::forwarder::RemoteForwarder;
use crate::handshake::ReadySignal;
use crate::sink::{FanoutSink, FileSink, LineSink, OriginTag};

/// Lifecycle phase of a capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    /// Descriptors and configuration are being acquired.
    Init,
    /// The append-only sink file is being opened.
    SinkOpening,
    /// The shim has been unblocked; container writes may begin.
    HandshakeSignaled,
    /// Both stream drainers are running.
    Draining,
    /// Both sources reached end-of-stream and the sink was released.
    Drained,
    /// Unrecoverable setup error; no drainer ever ran.
    InitFailed,
}

/// Drives one capture run: open the sink, signal readiness, drain both
/// streams to end-of-stream, release the sink.
pub struct LogRelay {
    config: Arc<Config>,
}

impl LogRelay {
    pub fn new(config: Arc<Config>) -> Self {
        LogRelay { config }
    }

    /// Run the relay to completion.
    ///
    /// Returns an error only for startup failures, before readiness is
    /// signaled. A drainer that dies later on a read or write error is
    /// logged, and the run still completes once the sibling stream reaches
    /// end-of-stream: partial capture is preferred over total failure.
    pub async fn run<O, E>(
        &self,
        stdout_source: O,
        stderr_source: E,
        ready: ReadySignal,
    ) -> Result<(), RelayError>
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        debug!("Relay status: {:?}", RelayStatus::SinkOpening);
        let file_sink = match FileSink::create(&self.config.log_path, self.config.record_format)
            .await
        {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                debug!("Relay status: {:?}", RelayStatus::InitFailed);
                return Err(e);
            }
        };
        let sink: Arc<dyn LineSink + Send + Sync> = if self.config.forward_logs {
            Arc::new(FanoutSink::new(
                file_sink,
                RemoteForwarder::new(self.config.collector_url.clone()),
            ))
        } else {
            file_sink
        };

        // The sink can persist data now; unblock the shim. Nothing may be
        // read from either source before this point.
        ready.signal();
        debug!("Relay status: {:?}", RelayStatus::HandshakeSignaled);

        debug!(
            "Relay status: {:?} (sink: {})",
            RelayStatus::Draining,
            self.config.log_path.display()
        );
        let stdout_drainer = tokio::spawn(drainer::drain(
            stdout_source,
            OriginTag::Stdout,
            Arc::clone(&sink),
        ));
        let stderr_drainer = tokio::spawn(drainer::drain(stderr_source, OriginTag::Stderr, sink));

        // Sole join point: the run ends when both sources hit end-of-stream
        // (or died on their own errors), never earlier.
        let (stdout_result, stderr_result) = tokio::join!(stdout_drainer, stderr_drainer);
        report_drain_result(OriginTag::Stdout, stdout_result);
        report_drain_result(OriginTag::Stderr, stderr_result);

        // Dropping the last sink reference closes the file; every admitted
        // record was already synced by the write path.
        debug!("Relay status: {:?}", RelayStatus::Drained);
        Ok(())
    }
}

fn report_drain_result(
    tag: OriginTag,
    result: Result<Result<DrainSummary, RelayError>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(summary)) => debug!(
            "{tag} drainer finished: {} lines captured, {} dropped",
            summary.lines, summary.dropped
        ),
        Ok(Err(e)) => error!("{tag} drainer terminated early: {e}"),
        Err(e) => error!("{tag} drainer task failed: {e}"),
    }
}
