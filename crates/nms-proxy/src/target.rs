// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fleet targets and where to reach them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which broker of a managed network a target is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Controller,
    Aggregator,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 2] = [ServiceKind::Controller, ServiceKind::Aggregator];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Controller => "controller",
            ServiceKind::Aggregator => "aggregator",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and host of a target as listed by the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    pub address: String,
}

impl TargetSpec {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// `tcp://[host]:port`; IPv4 and host names are left unbracketed
pub fn endpoint_for(address: &str, port: u16) -> String {
    if address.contains(':') {
        format!("tcp://[{address}]:{port}")
    } else {
        format!("tcp://{address}:{port}")
    }
}

/// One remote broker
///
/// The liveness flag is only written by the correlator; everything else is
/// fixed for the target's lifetime.
#[derive(Debug)]
pub struct Target {
    name: String,
    address: String,
    kind: ServiceKind,
    endpoint: String,
    live: AtomicBool,
}

impl Target {
    pub fn new(kind: ServiceKind, spec: TargetSpec, port: u16) -> Self {
        let endpoint = endpoint_for(&spec.address, port);
        Self {
            name: spec.name,
            address: spec.address,
            kind,
            endpoint,
            live: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Returns the previous value
    pub(crate) fn set_live(&self, live: bool) -> bool {
        self.live.swap(live, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_formatting() {
        assert_eq!(endpoint_for("2001:db8::10", 17077), "tcp://[2001:db8::10]:17077");
        assert_eq!(endpoint_for("10.0.0.1", 18100), "tcp://10.0.0.1:18100");
    }

    #[test]
    fn test_target_starts_offline() {
        let target = Target::new(
            ServiceKind::Aggregator,
            TargetSpec::new("lab", "::1"),
            18100,
        );
        assert!(!target.is_live());
        assert_eq!(target.endpoint(), "tcp://[::1]:18100");
        assert!(!target.set_live(true));
        assert!(target.is_live());
    }
}
