// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output only; `RUST_LOG`, when set, replaces the computed filter.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

/// Build the filter from `RUST_LOG`, or from the configured level plus debug flags
pub fn build_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(directives) = std::env::var(EnvFilter::DEFAULT_ENV) {
        return EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid RUST_LOG directives: {directives}"));
    }
    let directives = debug_flags.to_filter_string(&config.level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {directives}"))
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails on an invalid filter or when a global subscriber is already set.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(debug_flags, config)?;

    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false)
            .boxed(),
    };

    Registry::default()
        .with(console_layer.with_filter(filter))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        "[OBSERVABILITY] Logging initialised (level={}, format={:?}, debug crates={:?})",
        config.level,
        config.format,
        debug_flags.enabled_crates
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        let config = LoggingConfig::new("nms_proxy=notalevel", LogFormat::Text);
        assert!(build_filter(&CrateDebugFlags::default(), &config).is_err());
    }

    #[test]
    fn test_debug_flags_in_filter() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        let flags = CrateDebugFlags::from_args(vec!["--debug-nms-proxy".to_string()]);
        let filter = build_filter(&flags, &LoggingConfig::default()).unwrap();
        assert!(filter.to_string().contains("nms_proxy=debug"));
    }
}
