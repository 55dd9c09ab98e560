// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fleet multiplexer
//!
//! Sends one operation to every target at once. Each target gets its own
//! task, session and deadline; a slow or dead target never delays the
//! others. Outcomes are written to the target's slot as each request
//! finishes and are also handed back in completion order.

use crate::correlator::{Outcome, PendingRequest};
use crate::registry::Operation;
use crate::results::{ResultSlot, ResultsCollection};
use crate::target::Target;
use nms_thrift::Envelope;
use nms_transports::SessionConnector;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct FleetMultiplexer {
    connector: Arc<dyn SessionConnector>,
}

impl FleetMultiplexer {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self { connector }
    }

    pub fn transport_type(&self) -> &str {
        self.connector.transport_type()
    }

    /// Start `operation` against every target in `targets`
    ///
    /// Must be called inside a tokio runtime. Targets without a slot in
    /// `results` are skipped.
    pub fn dispatch(
        &self,
        operation: &Operation,
        request: Envelope,
        targets: &[Arc<Target>],
        results: &Arc<ResultsCollection>,
    ) -> Dispatch {
        let request = Arc::new(request);
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().enumerate() {
            let Some(slot) = results.slot(target.name()) else {
                warn!(
                    "[FLEET] No {} slot for {} {}, skipping",
                    operation.kind,
                    target.kind(),
                    target.name()
                );
                continue;
            };
            let connector = Arc::clone(&self.connector);
            let target = Arc::clone(target);
            let slot = Arc::clone(slot);
            let operation = operation.clone();
            let request = Arc::clone(&request);

            tasks.spawn(async move {
                PendingRequest::new(&target, &operation)
                    .run(connector.as_ref(), &request, &slot, index)
                    .await
            });
        }

        debug!(
            "[FLEET] Dispatched {} to {} target(s)",
            operation.kind,
            tasks.len()
        );
        Dispatch { tasks }
    }

    /// Run `operation` against a single target and wait for its outcome
    pub async fn call(
        &self,
        operation: &Operation,
        request: &Envelope,
        target: &Target,
        slot: &ResultSlot,
    ) -> Outcome {
        PendingRequest::new(target, operation)
            .run(self.connector.as_ref(), request, slot, 0)
            .await
    }
}

impl std::fmt::Debug for FleetMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetMultiplexer")
            .field("transport", &self.connector.transport_type())
            .finish()
    }
}

/// Requests of one dispatch still in flight
///
/// Dropping a `Dispatch` does not cancel anything: every request still runs
/// to its own reply or deadline and writes its slot.
pub struct Dispatch {
    tasks: JoinSet<Outcome>,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("in_flight", &self.tasks.len())
            .finish()
    }
}

impl Dispatch {
    /// Next finished request, `None` once all have finished
    pub async fn next(&mut self) -> Option<Outcome> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => return Some(outcome),
                Err(error) => warn!("[FLEET] Request task failed: {}", error),
            }
        }
        None
    }

    /// Wait for every request, in completion order
    pub async fn collect(mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        while let Some(outcome) = self.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        self.tasks.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{OperationKind, OperationRegistry};
    use crate::results::RequestState;
    use crate::target::{ServiceKind, TargetSpec};
    use nms_thrift::schema::controller::StatusDump;
    use nms_transports::memory::{MemoryConnector, Responder};
    use std::time::Duration;

    fn controllers(names: &[&str]) -> Vec<Arc<Target>> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Arc::new(Target::new(
                    ServiceKind::Controller,
                    TargetSpec::new(*name, format!("fd00::{}", i + 1)),
                    17077,
                ))
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_in_completion_order() {
        let connector = MemoryConnector::new();
        let targets = controllers(&["slow", "fast"]);
        let body = Envelope::wrap(121, &StatusDump::default()).encode();
        connector.set_responder(
            targets[0].endpoint(),
            Responder::reply(Duration::from_millis(300), body.clone()),
        );
        connector.set_responder(targets[1].endpoint(), Responder::reply(Duration::from_millis(10), body));

        let registry = OperationRegistry::default();
        let operation = registry.get(OperationKind::ControllerStatus);
        let results = Arc::new(ResultsCollection::new(["slow", "fast"]));
        let mut dispatch = FleetMultiplexer::new(Arc::new(connector.clone())).dispatch(
            operation,
            operation.empty_request(),
            &targets,
            &results,
        );

        let first = dispatch.next().await.unwrap();
        assert_eq!((first.index, first.target.as_str()), (1, "fast"));
        // the fast slot is readable while the slow request is still running
        assert_eq!(results.get("fast").unwrap().state, RequestState::Replied);
        assert_eq!(results.get("slow").unwrap().state, RequestState::Pending);

        let second = dispatch.next().await.unwrap();
        assert_eq!(second.target, "slow");
        assert!(dispatch.next().await.is_none());
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_dispatch_still_completes() {
        let connector = MemoryConnector::new();
        let targets = controllers(&["a"]);
        connector.set_responder(
            targets[0].endpoint(),
            Responder::reply(Duration::from_millis(50), Envelope::wrap(121, &StatusDump::default()).encode()),
        );

        let registry = OperationRegistry::default();
        let operation = registry.get(OperationKind::ControllerStatus);
        let results = Arc::new(ResultsCollection::new(["a"]));
        drop(FleetMultiplexer::new(Arc::new(connector.clone())).dispatch(
            operation,
            operation.empty_request(),
            &targets,
            &results,
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(results.slot("a").unwrap().writes(), 1);
        assert!(targets[0].is_live());
        assert_eq!(connector.closed_sessions(), 1);
    }
}
