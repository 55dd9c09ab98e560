// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Every struct maps to a section of `nms_configuration.toml`. All sections
//! are optional; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONTROLLER_PORT: u16 = 17077;
pub const DEFAULT_AGGREGATOR_PORT: u16 = 18100;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NmsConfig {
    pub system: SystemConfig,
    pub proxy: ProxyConfig,
    pub timeouts: TimeoutsConfig,
    pub topologies: Vec<TopologyConfig>,
}

impl NmsConfig {
    pub fn topology(&self, name: &str) -> Option<&TopologyConfig> {
        self.topologies.iter().find(|topology| topology.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub log_level: String,
    /// `text` or `json`
    pub log_format: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub controller_port: u16,
    pub aggregator_port: u16,
    /// Period of the background refresh
    pub poll_interval_ms: u64,
    /// Largest message accepted from a remote, in bytes (0 = unlimited)
    pub max_message_size: usize,
    pub linger_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            controller_port: DEFAULT_CONTROLLER_PORT,
            aggregator_port: DEFAULT_AGGREGATOR_PORT,
            poll_interval_ms: 5000,
            max_message_size: 16 * 1024 * 1024,
            linger_ms: 0,
        }
    }
}

impl ProxyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Per-operation reply deadlines
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub topology_ms: u64,
    pub controller_status_ms: u64,
    pub aggregator_status_ms: u64,
    pub alerts_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            topology_ms: 1000,
            controller_status_ms: 2000,
            aggregator_status_ms: 2000,
            alerts_ms: 2000,
        }
    }
}

impl TimeoutsConfig {
    pub fn all(&self) -> [(&'static str, u64); 4] {
        [
            ("topology_ms", self.topology_ms),
            ("controller_status_ms", self.controller_status_ms),
            ("aggregator_status_ms", self.aggregator_status_ms),
            ("alerts_ms", self.alerts_ms),
        ]
    }
}

/// One managed network: its controller and its aggregator
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub name: String,
    /// IPv6 or IPv4 host of the controller; empty when not deployed
    pub controller_ip: String,
    /// Host of the aggregator; empty when not deployed
    pub aggregator_ip: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NmsConfig::default();
        assert_eq!(config.proxy.controller_port, 17077);
        assert_eq!(config.proxy.aggregator_port, 18100);
        assert_eq!(config.proxy.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.timeouts.topology_ms, 1000);
        assert_eq!(config.timeouts.controller_status_ms, 2000);
        assert!(config.topologies.is_empty());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: NmsConfig = toml::from_str(
            r#"
            [timeouts]
            topology_ms = 1500

            [[topologies]]
            name = "lab"
            controller_ip = "2001:db8::10"
            "#,
        )
        .unwrap();
        assert_eq!(config.timeouts.topology_ms, 1500);
        assert_eq!(config.timeouts.alerts_ms, 2000);
        let lab = config.topology("lab").unwrap();
        assert_eq!(lab.controller_ip, "2001:db8::10");
        assert!(lab.aggregator_ip.is_empty());
    }
}
