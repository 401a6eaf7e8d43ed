// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process, sync::Arc};

use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use datadog_log_relay::{
    config::Config,
    descriptors::ShimDescriptors,
    relay::{LogRelay, RelayStatus},
};

#[tokio::main]
pub async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match Config::from_invocation(&args) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            // The subscriber needs the configured level, so this one error
            // goes to stderr by hand.
            eprintln!("Error resolving container logger configuration: {e}");
            process::exit(1);
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        // Diagnostics go to stderr; stdout stays silent so the relay's own
        // output never mixes with what it captures.
        .with_writer(std::io::stderr)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Relay status: {:?}", RelayStatus::Init);

    // The shim mapped the container's stdout/stderr pipes and the sync pipe
    // to descriptors 3, 4 and 5 before exec; nothing else in this process
    // touches them.
    let descriptors = unsafe { ShimDescriptors::from_shim_convention() };
    let stdout_source = tokio::fs::File::from_std(std::fs::File::from(descriptors.stdout_source));
    let stderr_source = tokio::fs::File::from_std(std::fs::File::from(descriptors.stderr_source));

    let relay = LogRelay::new(Arc::clone(&config));
    if let Err(e) = relay
        .run(stdout_source, stderr_source, descriptors.ready_signal)
        .await
    {
        error!("Container log relay failed to start: {e}");
        process::exit(1);
    }
}
