// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::os::fd::{FromRawFd, OwnedFd, RawFd};

use crate::handshake::ReadySignal;

/// Descriptor number the shim maps the container's stdout pipe to.
pub const STDOUT_SOURCE_FD: RawFd = 3;
/// Descriptor number the shim maps the container's stderr pipe to.
pub const STDERR_SOURCE_FD: RawFd = 4;
/// Descriptor number of the readiness sync pipe.
pub const READY_SIGNAL_FD: RawFd = 5;

/// The three pre-opened descriptors handed over by the container runtime.
///
/// The numeric convention is an implicit contract with the launching shim;
/// holding the descriptors in an explicit struct keeps the rest of the relay
/// independent of it, so tests can substitute in-memory pipes.
#[derive(Debug)]
pub struct ShimDescriptors {
    /// Read side of the container's stdout stream. Owned exclusively by its
    /// drainer for the process lifetime.
    pub stdout_source: OwnedFd,
    /// Read side of the container's stderr stream.
    pub stderr_source: OwnedFd,
    /// The one-shot readiness signal.
    pub ready_signal: ReadySignal,
}

impl ShimDescriptors {
    /// Take ownership of the conventional descriptors 3, 4 and 5.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that the three descriptors are open, were
    /// handed over by the launching runtime, and are owned nowhere else in
    /// the process. Calling this more than once per process would double-own
    /// the descriptors and must not happen.
    pub unsafe fn from_shim_convention() -> Self {
        ShimDescriptors {
            stdout_source: OwnedFd::from_raw_fd(STDOUT_SOURCE_FD),
            stderr_source: OwnedFd::from_raw_fd(STDERR_SOURCE_FD),
            ready_signal: ReadySignal::new(OwnedFd::from_raw_fd(READY_SIGNAL_FD)),
        }
    }
}
