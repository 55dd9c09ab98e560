// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! NMS fleet poller
//!
//! Loads the NMS configuration, refreshes topology and status from every
//! controller and aggregator on a fixed interval, and logs fleet liveness.
//!
//! Usage:
//!   nms-poller --config nms_configuration.toml
//!   nms-poller --once > snapshot.json
//!   nms-poller --debug nms-proxy,nms-transports

use anyhow::{Context, Result};
use clap::Parser;
use nms::config::{load_config, validate_config, NmsConfig};
use nms::observability::{init_logging, parse_debug_flags, LogFormat, LoggingConfig};
use nms::proxy::{NmsProxy, OperationKind, Poller, ServiceKind};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "nms-poller")]
#[command(about = "Refresh controller and aggregator state across the NMS fleet", long_about = None)]
#[command(version, author)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller RPC port
    #[arg(long)]
    controller_port: Option<u16>,

    /// Aggregator RPC port
    #[arg(long)]
    aggregator_port: Option<u16>,

    /// Poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,

    /// Run a single cycle, wait for every reply or deadline, print the results as JSON
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Seconds between liveness summaries
    #[arg(long, default_value_t = 30)]
    summary_interval: u64,

    /// Enable debug logging for a crate (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    debug: Vec<String>,

    /// Enable debug logging for all crates
    #[arg(long, default_value_t = false)]
    debug_all: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(port) = self.controller_port {
            overrides.insert("controller_port".to_string(), port.to_string());
        }
        if let Some(port) = self.aggregator_port {
            overrides.insert("aggregator_port".to_string(), port.to_string());
        }
        if let Some(interval) = self.poll_interval_ms {
            overrides.insert("poll_interval_ms".to_string(), interval.to_string());
        }
        if let Some(level) = &self.log_level {
            overrides.insert("log_level".to_string(), level.clone());
        }
        if let Some(format) = &self.log_format {
            overrides.insert("log_format".to_string(), format.clone());
        }
        overrides
    }

    /// Debug selections in `--debug-<crate>` form
    fn debug_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .debug
            .iter()
            .map(|name| format!("--debug-{}", name.trim()))
            .collect();
        if self.debug_all {
            args.push("--debug-all".to_string());
        }
        args
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    let format: LogFormat = config
        .system
        .log_format
        .parse()
        .map_err(anyhow::Error::msg)?;
    let logging = LoggingConfig::new(config.system.log_level.clone(), format);
    init_logging(&parse_debug_flags(args.debug_args()), &logging)?;

    info!(
        "NMS poller v{} managing {} topolog{}",
        env!("CARGO_PKG_VERSION"),
        config.topologies.len(),
        if config.topologies.len() == 1 { "y" } else { "ies" }
    );

    let proxy = Arc::new(NmsProxy::connect_zmq(&config).context("Failed to create transport")?);

    if args.once {
        let snapshot = run_once(&proxy).await;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    run_forever(proxy, &config, Duration::from_secs(args.summary_interval.max(1))).await
}

async fn run_once(proxy: &NmsProxy) -> Value {
    for dispatch in proxy.poll_once() {
        dispatch.collect().await;
    }

    let mut results = Map::new();
    for kind in OperationKind::POLLED {
        results.insert(kind.as_str().to_string(), json!(proxy.results(kind)));
    }
    let mut liveness = Map::new();
    for kind in ServiceKind::ALL {
        liveness.insert(kind.as_str().to_string(), json!(proxy.liveness(kind)));
    }
    json!({ "results": results, "liveness": liveness })
}

async fn run_forever(proxy: Arc<NmsProxy>, config: &NmsConfig, summary_every: Duration) -> Result<()> {
    let mut poller = Poller::new(Arc::clone(&proxy), config.proxy.poll_interval());
    poller.start()?;

    let mut summary = tokio::time::interval(summary_every);
    // the first tick completes immediately, before any reply could arrive
    summary.tick().await;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutdown requested");
                break;
            }
            _ = summary.tick() => {
                for kind in ServiceKind::ALL {
                    let counts = proxy.liveness(kind);
                    info!("{} online: {}/{}", kind, counts.live, counts.total);
                }
            }
        }
    }

    let cycles = poller.stop().await;
    info!("Ran {} poll cycle(s)", cycles);
    Ok(())
}
