// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, error};

use crate::error::RelayError;
use crate::sink::{LineSink, OriginTag};

/// Consecutive sink-write failures after which the sink handle is considered
/// unusable and the drainer abandons its stream.
pub const MAX_CONSECUTIVE_WRITE_ERRORS: u32 = 10;

/// Outcome of draining one stream to end-of-stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    /// Lines admitted to the sink.
    pub lines: u64,
    /// Lines lost to transient sink-write failures.
    pub dropped: u64,
}

/// Drain one stream until end-of-stream, pushing every line into the sink.
///
/// Each completed line is written before the next read from the same source,
/// so a slow sink stalls only its own stream. Line terminators (`\n`, and a
/// preceding `\r` if present) are stripped. At end-of-stream a non-empty
/// unterminated tail is emitted as a final line; an empty tail is discarded.
///
/// A sink-write failure drops that line and continues; a run of
/// [`MAX_CONSECUTIVE_WRITE_ERRORS`] failures, or a read error other than
/// end-of-stream, abandons this stream only. The sibling drainer is
/// unaffected either way.
pub async fn drain<R>(
    source: R,
    tag: OriginTag,
    sink: Arc<dyn LineSink + Send + Sync>,
) -> Result<DrainSummary, RelayError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    let mut summary = DrainSummary::default();
    let mut consecutive_write_errors = 0u32;

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).await.map_err(|e| {
            error!(
                "{tag} stream read failed after {} lines: {e}",
                summary.lines
            );
            RelayError::StreamRead(e)
        })?;
        if read == 0 {
            // End-of-stream: the container exited and the pipe closed.
            break;
        }

        let terminated = buf.last() == Some(&b'\n');
        let line = trim_line_terminator(&buf);
        if !terminated && line.is_empty() {
            break;
        }

        let content = String::from_utf8_lossy(line);
        match sink.write(tag, &content).await {
            Ok(()) => {
                consecutive_write_errors = 0;
                summary.lines += 1;
            }
            Err(e) => {
                consecutive_write_errors += 1;
                summary.dropped += 1;
                if consecutive_write_errors >= MAX_CONSECUTIVE_WRITE_ERRORS {
                    error!(
                        "{tag} sink unusable after {consecutive_write_errors} consecutive write \
                         failures, abandoning stream"
                    );
                    return Err(e);
                }
                error!("Dropped one {tag} line: {e}");
            }
        }

        if !terminated {
            // The tail line carried no terminator, so the source is done.
            break;
        }
    }

    debug!(
        "{tag} stream drained: {} lines captured, {} dropped",
        summary.lines, summary.dropped
    );
    Ok(summary)
}

fn trim_line_terminator(buf: &[u8]) -> &[u8] {
    let mut line = buf;
    if let Some(stripped) = line.strip_suffix(b"\n") {
        line = stripped;
    }
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Sink recording every admitted line, with optional injected failures.
    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<(OriginTag, String)>>,
        fail_on: Option<String>,
        always_fail: bool,
    }

    impl RecordingSink {
        fn lines(&self) -> Vec<(OriginTag, String)> {
            self.lines.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LineSink for RecordingSink {
        async fn write(&self, tag: OriginTag, content: &str) -> Result<(), RelayError> {
            if self.always_fail || self.fail_on.as_deref() == Some(content) {
                return Err(RelayError::RecordWrite(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected",
                )));
            }
            self.lines.lock().unwrap().push((tag, content.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lines_drained_in_order() {
        let sink = Arc::new(RecordingSink::default());
        let summary = drain(&b"one\ntwo\nthree\n"[..], OriginTag::Stdout, sink.clone())
            .await
            .unwrap();

        assert_eq!(summary, DrainSummary { lines: 3, dropped: 0 });
        assert_eq!(
            sink.lines(),
            vec![
                (OriginTag::Stdout, "one".to_string()),
                (OriginTag::Stdout, "two".to_string()),
                (OriginTag::Stdout, "three".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unterminated_tail_emitted() {
        let sink = Arc::new(RecordingSink::default());
        let summary = drain(&b"one\ntail"[..], OriginTag::Stderr, sink.clone())
            .await
            .unwrap();

        assert_eq!(summary.lines, 2);
        assert_eq!(sink.lines()[1], (OriginTag::Stderr, "tail".to_string()));
    }

    #[tokio::test]
    async fn test_empty_tail_discarded() {
        let sink = Arc::new(RecordingSink::default());
        let summary = drain(&b"one\n"[..], OriginTag::Stdout, sink.clone())
            .await
            .unwrap();

        assert_eq!(summary.lines, 1);
        assert_eq!(sink.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_crlf_terminator_stripped() {
        let sink = Arc::new(RecordingSink::default());
        drain(&b"windows line\r\n"[..], OriginTag::Stdout, sink.clone())
            .await
            .unwrap();

        assert_eq!(
            sink.lines(),
            vec![(OriginTag::Stdout, "windows line".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_terminated_line_recorded() {
        let sink = Arc::new(RecordingSink::default());
        let summary = drain(&b"\n"[..], OriginTag::Stdout, sink.clone())
            .await
            .unwrap();

        assert_eq!(summary.lines, 1);
        assert_eq!(sink.lines(), vec![(OriginTag::Stdout, String::new())]);
    }

    #[tokio::test]
    async fn test_write_failure_drops_line_and_continues() {
        let sink = Arc::new(RecordingSink {
            fail_on: Some("two".to_string()),
            ..Default::default()
        });
        let summary = drain(&b"one\ntwo\nthree\n"[..], OriginTag::Stdout, sink.clone())
            .await
            .unwrap();

        assert_eq!(summary, DrainSummary { lines: 2, dropped: 1 });
        assert_eq!(
            sink.lines(),
            vec![
                (OriginTag::Stdout, "one".to_string()),
                (OriginTag::Stdout, "three".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unusable_sink_terminates_drainer() {
        let sink = Arc::new(RecordingSink {
            always_fail: true,
            ..Default::default()
        });
        let source: Vec<u8> = b"line\n".repeat(20);
        let result = drain(&source[..], OriginTag::Stderr, sink).await;

        assert!(matches!(result, Err(RelayError::RecordWrite(_))));
    }

    #[tokio::test]
    async fn test_read_error_terminates_after_captured_lines() {
        let source = tokio_test::io::Builder::new()
            .read(b"before\n")
            .read_error(std::io::Error::new(std::io::ErrorKind::Other, "torn pipe"))
            .build();

        let sink = Arc::new(RecordingSink::default());
        let result = drain(source, OriginTag::Stdout, sink.clone()).await;

        assert!(matches!(result, Err(RelayError::StreamRead(_))));
        assert_eq!(sink.lines(), vec![(OriginTag::Stdout, "before".to_string())]);
    }
}
