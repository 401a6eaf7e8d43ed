// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Container stdout/stderr capture for shim-launched log relays.
//!
//! The container runtime spawns the relay binary with three pre-opened
//! descriptors: the read side of the container's stdout pipe, the read side
//! of its stderr pipe, and a sync descriptor the shim blocks on until the
//! relay is ready. This crate provides the pieces the binary wires together:
//!
//! - [`config`]: startup-resolved configuration (log file name, record
//!   format, collector endpoint).
//! - [`descriptors`]: the explicit descriptor-handover contract with the
//!   shim.
//! - [`handshake`]: the one-shot readiness signal.
//! - [`sink`]: the durable line sink (timestamped or plain file records,
//!   optional fan-out to a remote forwarder).
//! - [`forwarder`]: best-effort HTTP forwarding of captured lines.
//! - [`drainer`]: the per-stream drain loop.
//! - [`relay`]: the process lifecycle tying it all together.

pub mod config;
pub mod descriptors;
pub mod drainer;
pub mod error;
pub mod forwarder;
pub mod handshake;
pub mod relay;
pub mod sink;
