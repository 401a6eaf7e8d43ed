// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error};

const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort forwarder posting each captured line to the remote collector.
///
/// One `POST` per line, fire-and-forget: a transport failure or non-success
/// status is diagnostic-logged and the line is abandoned. No retries, no
/// queueing, no backoff. The request timeout bounds how long a hung
/// collector can stall the owning drainer; the durable file write has
/// already completed by the time a forward starts.
///
/// The underlying client is safe to share across both drainers; each request
/// is independent.
#[derive(Clone)]
pub struct RemoteForwarder {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteForwarder {
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("Unable to build forwarding client: {e}, using default client");
                reqwest::Client::new()
            });
        RemoteForwarder { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one line to the collector. Never surfaces an error to the caller.
    pub async fn forward(&self, content: &str) {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain")
            .body(format!("{content}\n"))
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => {
                debug!("Forwarded line to {}", self.endpoint);
            }
            Ok(r) => {
                error!(
                    "Collector at {} rejected line with status {}",
                    self.endpoint,
                    r.status()
                );
            }
            Err(e) => {
                error!("Unable to forward line to {}: {e}", self.endpoint);
            }
        }
    }
}
