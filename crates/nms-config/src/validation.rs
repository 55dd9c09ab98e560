// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every problem is collected before failing, so one run reports the whole
//! list.

use crate::{ConfigError, ConfigResult, NmsConfig};
use std::collections::HashSet;
use std::fmt;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidPort { port_name: String, port: u16 },
    PortConflict { port1: String, port2: String, port: u16 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { port_name, port } => {
                write!(f, "Port {} = {} is not a usable port", port_name, port)
            }
            Self::PortConflict { port1, port2, port } => {
                write!(f, "Port conflict: {} and {} both use port {}", port1, port2, port)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks ports, timeouts, poll interval, log settings and the topology list.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &NmsConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// All problems found in `config`, empty when valid
pub fn collect_errors(config: &NmsConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_ports(config, &mut errors);
    validate_durations(config, &mut errors);
    validate_logging(config, &mut errors);
    validate_topologies(config, &mut errors);
    errors
}

fn validate_ports(config: &NmsConfig, errors: &mut Vec<ConfigValidationError>) {
    let ports = [
        ("proxy.controller_port", config.proxy.controller_port),
        ("proxy.aggregator_port", config.proxy.aggregator_port),
    ];
    for (port_name, port) in ports {
        if port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                port_name: port_name.to_string(),
                port,
            });
        }
    }
    if config.proxy.controller_port == config.proxy.aggregator_port {
        errors.push(ConfigValidationError::PortConflict {
            port1: ports[0].0.to_string(),
            port2: ports[1].0.to_string(),
            port: config.proxy.controller_port,
        });
    }
}

fn validate_durations(config: &NmsConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.proxy.poll_interval_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "proxy.poll_interval_ms".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    for (name, value) in config.timeouts.all() {
        if value == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("timeouts.{name}"),
                reason: "must be greater than 0".to_string(),
            });
        }
    }
}

fn validate_logging(config: &NmsConfig, errors: &mut Vec<ConfigValidationError>) {
    if !matches!(config.system.log_format.as_str(), "text" | "json") {
        errors.push(ConfigValidationError::InvalidValue {
            field: "system.log_format".to_string(),
            reason: format!("expected \"text\" or \"json\", got {:?}", config.system.log_format),
        });
    }
    if config.system.log_level.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "system.log_level".to_string(),
        });
    }
}

fn validate_topologies(config: &NmsConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut seen = HashSet::new();
    for (index, topology) in config.topologies.iter().enumerate() {
        if topology.name.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: format!("topologies[{index}].name"),
            });
        } else if !seen.insert(topology.name.as_str()) {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("topologies[{index}].name"),
                reason: format!("duplicate topology name {:?}", topology.name),
            });
        }
        if topology.controller_ip.trim().is_empty() && topology.aggregator_ip.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: format!("topologies[{index}].controller_ip or aggregator_ip"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TopologyConfig;

    fn topology(name: &str, controller_ip: &str) -> TopologyConfig {
        TopologyConfig {
            name: name.to_string(),
            controller_ip: controller_ip.to_string(),
            aggregator_ip: String::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&NmsConfig::default()).is_ok());
    }

    #[test]
    fn test_all_problems_reported_together() {
        let mut config = NmsConfig::default();
        config.proxy.aggregator_port = config.proxy.controller_port;
        config.timeouts.topology_ms = 0;
        config.system.log_format = "yaml".to_string();
        config.topologies = vec![topology("a", "::1"), topology("a", "::2"), topology("", "")];

        let errors = collect_errors(&config);
        assert!(errors.contains(&ConfigValidationError::PortConflict {
            port1: "proxy.controller_port".to_string(),
            port2: "proxy.aggregator_port".to_string(),
            port: 17077,
        }));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::InvalidValue { field, .. } if field == "timeouts.topology_ms"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::InvalidValue { field, .. } if field == "topologies[1].name"
        )));
        assert!(errors.contains(&ConfigValidationError::MissingRequired {
            field: "topologies[2].name".to_string()
        }));
        assert_eq!(errors.len(), 6);

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("Port conflict"));
    }
}
