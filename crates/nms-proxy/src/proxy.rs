// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The proxy facade used by the web layer
//!
//! Owns the target list, one results collection per operation and the
//! multiplexer. Readers (`get_result`, `is_live`) never wait on the network.

use crate::alerts::{alert_list_from_rows, AlertRow};
use crate::error::{ProxyError, Result};
use crate::multiplexer::{Dispatch, FleetMultiplexer};
use crate::payload::Payload;
use crate::registry::{OperationKind, OperationRegistry};
use crate::results::{ResultsCollection, SlotEntry};
use crate::target::{ServiceKind, Target, TargetSpec};
use nms_config::{NmsConfig, ProxyConfig};
use nms_thrift::schema::aggregator::{AggrAlertConfList, AggrSetAlertsConfigResp};
use nms_thrift::Envelope;
use nms_transports::{SessionConfig, SessionConnector};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Source of the targets to manage
pub trait ConfigProvider: Send + Sync {
    fn list_targets(&self, kind: ServiceKind) -> Vec<TargetSpec>;
}

impl ConfigProvider for NmsConfig {
    /// One controller and one aggregator per configured topology, skipping empty addresses
    fn list_targets(&self, kind: ServiceKind) -> Vec<TargetSpec> {
        self.topologies
            .iter()
            .filter_map(|topology| {
                let address = match kind {
                    ServiceKind::Controller => &topology.controller_ip,
                    ServiceKind::Aggregator => &topology.aggregator_ip,
                };
                (!address.trim().is_empty())
                    .then(|| TargetSpec::new(topology.name.clone(), address.trim()))
            })
            .collect()
    }
}

/// Transport settings derived from the `[proxy]` section
pub fn session_config(proxy: &ProxyConfig) -> SessionConfig {
    let config = SessionConfig::default().with_linger(Duration::from_millis(proxy.linger_ms));
    if proxy.max_message_size == 0 {
        config.with_unlimited_message_size()
    } else {
        config.with_max_message_size(proxy.max_message_size)
    }
}

/// Targets and their result slots; replaced as a whole on reconfiguration
#[derive(Debug)]
struct Fleet {
    controllers: Vec<Arc<Target>>,
    aggregators: Vec<Arc<Target>>,
    /// Indexed by operation kind
    results: Vec<Arc<ResultsCollection>>,
}

impl Fleet {
    fn build(
        provider: &dyn ConfigProvider,
        registry: &OperationRegistry,
        controller_port: u16,
        aggregator_port: u16,
    ) -> Self {
        let targets = |kind: ServiceKind, port: u16| -> Vec<Arc<Target>> {
            provider
                .list_targets(kind)
                .into_iter()
                .map(|spec| Arc::new(Target::new(kind, spec, port)))
                .collect()
        };
        let controllers = targets(ServiceKind::Controller, controller_port);
        let aggregators = targets(ServiceKind::Aggregator, aggregator_port);

        let results = OperationKind::ALL
            .iter()
            .map(|kind| {
                let service_targets = match registry.get(*kind).service {
                    ServiceKind::Controller => &controllers,
                    ServiceKind::Aggregator => &aggregators,
                };
                Arc::new(ResultsCollection::new(
                    service_targets.iter().map(|target| target.name().to_string()),
                ))
            })
            .collect();

        Self {
            controllers,
            aggregators,
            results,
        }
    }

    fn targets(&self, kind: ServiceKind) -> &[Arc<Target>] {
        match kind {
            ServiceKind::Controller => &self.controllers,
            ServiceKind::Aggregator => &self.aggregators,
        }
    }

    fn target(&self, kind: ServiceKind, name: &str) -> Option<&Arc<Target>> {
        self.targets(kind).iter().find(|target| target.name() == name)
    }

    fn results(&self, kind: OperationKind) -> &Arc<ResultsCollection> {
        &self.results[kind.index()]
    }
}

/// Live/total counts for one service kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LivenessSummary {
    pub total: usize,
    pub live: usize,
}

pub struct NmsProxy {
    registry: OperationRegistry,
    multiplexer: FleetMultiplexer,
    controller_port: u16,
    aggregator_port: u16,
    fleet: RwLock<Arc<Fleet>>,
}

impl NmsProxy {
    pub fn new(
        config: &NmsConfig,
        connector: Arc<dyn SessionConnector>,
        provider: &dyn ConfigProvider,
    ) -> Self {
        let registry = OperationRegistry::new(&config.timeouts);
        let fleet = Fleet::build(
            provider,
            &registry,
            config.proxy.controller_port,
            config.proxy.aggregator_port,
        );
        info!(
            "[PROXY] {} controller(s), {} aggregator(s) over {}",
            fleet.controllers.len(),
            fleet.aggregators.len(),
            connector.transport_type()
        );
        Self {
            registry,
            multiplexer: FleetMultiplexer::new(connector),
            controller_port: config.proxy.controller_port,
            aggregator_port: config.proxy.aggregator_port,
            fleet: RwLock::new(Arc::new(fleet)),
        }
    }

    /// Proxy over `connector` managing the topologies listed in `config`
    pub fn from_config(config: &NmsConfig, connector: Arc<dyn SessionConnector>) -> Self {
        Self::new(config, connector, config)
    }

    /// Proxy talking ZMQ DEALER to the topologies listed in `config`
    #[cfg(feature = "zmq-client")]
    pub fn connect_zmq(config: &NmsConfig) -> Result<Self> {
        let connector = nms_transports::zmq::ZmqDealerConnector::new(session_config(&config.proxy))?;
        Ok(Self::from_config(config, Arc::new(connector)))
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    fn fleet(&self) -> Arc<Fleet> {
        self.fleet.read().clone()
    }

    pub fn targets(&self, kind: ServiceKind) -> Vec<Arc<Target>> {
        self.fleet().targets(kind).to_vec()
    }

    /// Send an argument-less operation to every target of its service
    pub fn dispatch(&self, kind: OperationKind) -> Dispatch {
        let operation = self.registry.get(kind);
        let fleet = self.fleet();
        self.multiplexer.dispatch(
            operation,
            operation.empty_request(),
            fleet.targets(operation.service),
            fleet.results(kind),
        )
    }

    /// One refresh cycle: topology, controller status and aggregator status
    pub fn poll_once(&self) -> Vec<Dispatch> {
        OperationKind::POLLED
            .iter()
            .map(|kind| self.dispatch(*kind))
            .collect()
    }

    /// Last completed result, or the empty placeholder
    pub fn get_result(&self, kind: OperationKind, target: &str) -> SlotEntry {
        self.fleet()
            .results(kind)
            .get(target)
            .unwrap_or_default()
    }

    /// Every slot of one operation, keyed by target name
    pub fn results(&self, kind: OperationKind) -> BTreeMap<String, SlotEntry> {
        self.fleet().results(kind).snapshot()
    }

    /// Unknown targets are reported offline
    pub fn is_live(&self, kind: ServiceKind, target: &str) -> bool {
        self.fleet()
            .target(kind, target)
            .is_some_and(|target| target.is_live())
    }

    pub fn liveness(&self, kind: ServiceKind) -> LivenessSummary {
        let fleet = self.fleet();
        let targets = fleet.targets(kind);
        LivenessSummary {
            total: targets.len(),
            live: targets.iter().filter(|target| target.is_live()).count(),
        }
    }

    async fn call(&self, kind: OperationKind, name: &str, request: Envelope) -> Result<Payload> {
        let operation = self.registry.get(kind);
        let fleet = self.fleet();
        let target = fleet
            .target(operation.service, name)
            .ok_or_else(|| ProxyError::UnknownTarget {
                kind: operation.service,
                name: name.to_string(),
            })?;
        let results = fleet.results(kind);
        let slot = results.slot(name).ok_or_else(|| ProxyError::UnknownTarget {
            kind: operation.service,
            name: name.to_string(),
        })?;
        self.multiplexer
            .call(operation, &request, target, slot)
            .await
            .result
    }

    /// Read the alert rules of one aggregator
    pub async fn fetch_alerts_config(&self, name: &str) -> Result<AggrAlertConfList> {
        let request = self.registry.get(OperationKind::GetAlertsConfig).empty_request();
        let payload = self.call(OperationKind::GetAlertsConfig, name, request).await?;
        Ok(payload.into_alerts_config().unwrap_or_default())
    }

    /// Replace the alert rules of one aggregator with the UI rows
    ///
    /// The alert list is serialized on its own and carried as the value of
    /// the outer envelope.
    pub async fn set_alerts_config(
        &self,
        name: &str,
        rows: &[AlertRow],
    ) -> Result<AggrSetAlertsConfigResp> {
        let alerts = alert_list_from_rows(rows)?;
        let operation = self.registry.get(OperationKind::SetAlertsConfig);
        let request = Envelope::wrap(operation.request_type, &alerts);
        debug!(
            "[PROXY] Setting {} alert(s) on aggregator {}",
            alerts.alerts.len(),
            name
        );

        let resp = self
            .call(OperationKind::SetAlertsConfig, name, request)
            .await?
            .into_set_alerts_resp()
            .unwrap_or_default();
        if !resp.success {
            return Err(ProxyError::Rejected {
                target: name.to_string(),
                message: "alert configuration not applied".to_string(),
            });
        }
        Ok(resp)
    }

    /// Replace every target and drop all previous results
    ///
    /// Requests already in flight finish against the old targets and their
    /// outcomes are discarded.
    pub fn reconfigure(&self, provider: &dyn ConfigProvider) {
        let fleet = Fleet::build(
            provider,
            &self.registry,
            self.controller_port,
            self.aggregator_port,
        );
        info!(
            "[PROXY] Reconfigured: {} controller(s), {} aggregator(s)",
            fleet.controllers.len(),
            fleet.aggregators.len()
        );
        *self.fleet.write() = Arc::new(fleet);
    }
}

impl std::fmt::Debug for NmsProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NmsProxy")
            .field("multiplexer", &self.multiplexer)
            .field("controllers", &self.liveness(ServiceKind::Controller))
            .field("aggregators", &self.liveness(ServiceKind::Aggregator))
            .finish()
    }
}
