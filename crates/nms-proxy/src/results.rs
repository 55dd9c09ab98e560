// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-target result slots
//!
//! A [`ResultsCollection`] holds one [`ResultSlot`] per target name for one
//! operation. The set of slots is fixed when the collection is built; each
//! slot has its own lock, so writers for different targets never contend.

use crate::payload::Payload;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// How the most recent request for a slot ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Nothing has completed yet
    Pending,
    Replied,
    TimedOut,
    TransportError,
    ProtocolError,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

/// Last completed result for one target
///
/// `payload` is `None` (the empty placeholder) unless the last request was
/// answered with a decodable reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotEntry {
    pub payload: Option<Payload>,
    pub state: RequestState,
    #[serde(with = "duration_ms")]
    pub response_time: Option<Duration>,
    pub error: Option<String>,
    pub completed_at: Option<SystemTime>,
}

impl SlotEntry {
    /// Placeholder shown for targets with no usable result
    pub fn empty() -> Self {
        Self {
            payload: None,
            state: RequestState::Pending,
            response_time: None,
            error: None,
            completed_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

impl Default for SlotEntry {
    fn default() -> Self {
        Self::empty()
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Default)]
struct SlotState {
    entry: SlotEntry,
    writes: u64,
}

/// Latest outcome for one target; the entry and its write count change together
#[derive(Debug, Default)]
pub struct ResultSlot {
    state: RwLock<SlotState>,
}

impl ResultSlot {
    pub fn read(&self) -> SlotEntry {
        self.state.read().entry.clone()
    }

    /// Number of completed requests written to this slot
    pub fn writes(&self) -> u64 {
        self.state.read().writes
    }

    /// Entry together with the write count that produced it
    pub fn snapshot(&self) -> (SlotEntry, u64) {
        let state = self.state.read();
        (state.entry.clone(), state.writes)
    }

    pub(crate) fn write(&self, entry: SlotEntry) {
        let mut state = self.state.write();
        state.entry = entry;
        state.writes += 1;
    }
}

/// Slots of one operation, keyed by target name
#[derive(Debug, Default)]
pub struct ResultsCollection {
    slots: BTreeMap<String, Arc<ResultSlot>>,
}

impl ResultsCollection {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: names
                .into_iter()
                .map(|name| (name.into(), Arc::new(ResultSlot::default())))
                .collect(),
        }
    }

    pub fn slot(&self, name: &str) -> Option<&Arc<ResultSlot>> {
        self.slots.get(name)
    }

    /// Snapshot of one slot, `None` for unknown names
    pub fn get(&self, name: &str) -> Option<SlotEntry> {
        self.slots.get(name).map(|slot| slot.read())
    }

    /// Snapshot of every slot
    pub fn snapshot(&self) -> BTreeMap<String, SlotEntry> {
        self.slots
            .iter()
            .map(|(name, slot)| (name.clone(), slot.read()))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nms_thrift::schema::aggregator::AggrSetAlertsConfigResp;

    #[test]
    fn test_slots_start_empty() {
        let results = ResultsCollection::new(["a", "b"]);
        assert_eq!(results.len(), 2);
        let entry = results.get("a").unwrap();
        assert!(entry.is_empty());
        assert_eq!(entry.state, RequestState::Pending);
        assert!(results.get("c").is_none());
    }

    #[test]
    fn test_write_is_per_slot() {
        let results = ResultsCollection::new(["a", "b"]);
        results.slot("a").unwrap().write(SlotEntry {
            payload: Some(Payload::SetAlertsConfigResp(AggrSetAlertsConfigResp {
                success: true,
            })),
            state: RequestState::Replied,
            response_time: Some(Duration::from_millis(12)),
            error: None,
            completed_at: Some(SystemTime::now()),
        });

        assert_eq!(results.slot("a").unwrap().writes(), 1);
        assert_eq!(results.slot("b").unwrap().writes(), 0);
        assert!(!results.get("a").unwrap().is_empty());
        assert!(results.get("b").unwrap().is_empty());

        let json = serde_json::to_value(results.get("a").unwrap()).unwrap();
        assert_eq!(json["state"], "replied");
        assert_eq!(json["response_time"], 12);
        assert_eq!(json["payload"]["kind"], "set_alerts_config_resp");
    }

    #[test]
    fn test_snapshot_count_matches_entry() {
        let slot = Arc::new(ResultSlot::default());
        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for n in 1..=2_000u64 {
                    slot.write(SlotEntry {
                        state: RequestState::TimedOut,
                        response_time: Some(Duration::from_millis(n)),
                        ..SlotEntry::empty()
                    });
                }
            })
        };

        for _ in 0..2_000 {
            let (entry, writes) = slot.snapshot();
            let written = entry.response_time.map_or(0, |t| t.as_millis() as u64);
            assert_eq!(written, writes);
        }
        writer.join().unwrap();
        assert_eq!(slot.writes(), 2_000);
    }
}
