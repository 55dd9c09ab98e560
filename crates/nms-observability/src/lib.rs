// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nms-observability
//!
//! Logging setup shared by every NMS binary, with per-crate debug flags
//! (`--debug-nms-proxy`, `--debug-all`, `NMS_DEBUG=...`).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known NMS crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "nms",
    "nms-config",
    "nms-proxy",
    "nms-thrift",
    "nms-transports",
];
