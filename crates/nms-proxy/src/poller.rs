// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Periodic fleet refresh
//!
//! Every tick dispatches topology, controller status and aggregator status
//! to the whole fleet. A tick never waits for the previous cycle; requests
//! of overlapping cycles each keep their own deadline.

use crate::error::{ProxyError, Result};
use crate::proxy::NmsProxy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub struct Poller {
    proxy: Arc<NmsProxy>,
    interval: Duration,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<u64>>,
}

impl Poller {
    pub fn new(proxy: Arc<NmsProxy>, interval: Duration) -> Self {
        Self {
            proxy,
            interval,
            shutdown: Arc::new(Notify::new()),
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start polling; the first cycle runs immediately
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(ProxyError::AlreadyRunning);
        }

        let proxy = Arc::clone(&self.proxy);
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        self.task = Some(tokio::spawn(async move {
            info!("[POLLER] Started, refreshing every {:?}", interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut cycles = 0u64;

            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = ticker.tick() => {
                        let dispatched: usize = proxy
                            .poll_once()
                            .iter()
                            .map(|dispatch| dispatch.in_flight())
                            .sum();
                        cycles += 1;
                        debug!("[POLLER] Cycle {} sent {} request(s)", cycles, dispatched);
                    }
                }
            }

            info!("[POLLER] Stopped after {} cycle(s)", cycles);
            cycles
        }));
        Ok(())
    }

    /// Stop ticking and wait for the loop to exit
    ///
    /// Requests already sent still run to their deadline. Returns the number
    /// of cycles run.
    pub async fn stop(&mut self) -> u64 {
        let Some(task) = self.task.take() else {
            debug!("[POLLER] Already stopped");
            return 0;
        };
        self.shutdown.notify_one();
        match task.await {
            Ok(cycles) => cycles,
            Err(e) => {
                warn!("[POLLER] Poll loop ended abnormally: {}", e);
                0
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nms_config::{NmsConfig, TopologyConfig};
    use nms_transports::memory::MemoryConnector;

    fn proxy(connector: &MemoryConnector) -> Arc<NmsProxy> {
        let config = NmsConfig {
            topologies: vec![TopologyConfig {
                name: "lab".to_string(),
                controller_ip: "fd00::1".to_string(),
                aggregator_ip: "fd00::2".to_string(),
            }],
            ..NmsConfig::default()
        };
        Arc::new(NmsProxy::from_config(&config, Arc::new(connector.clone())))
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_do_not_wait_for_replies() {
        // every remote is silent, so each request runs to its full deadline
        let connector = MemoryConnector::new();
        let mut poller = Poller::new(proxy(&connector), Duration::from_millis(500));
        poller.start().unwrap();
        assert!(matches!(poller.start(), Err(ProxyError::AlreadyRunning)));

        tokio::time::sleep(Duration::from_millis(1250)).await;
        let cycles = poller.stop().await;
        assert_eq!(cycles, 3);
        // three operations per cycle: topology, controller status, aggregator status
        assert_eq!(connector.opened_sessions(), 9);
        assert!(!poller.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let connector = MemoryConnector::new();
        let mut poller = Poller::new(proxy(&connector), Duration::from_secs(5));
        assert_eq!(poller.stop().await, 0);
    }
}
