// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event model, pulled by the Event Pump and surfaced via `pollEvents`.
//!
//! Events are tagged records with no cross-event references: once
//! appended to a session's Event Buffer, each one stands alone.

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// A single buffered event, pulled via `pollEvents`. Serializes as
/// `{ sessionId, type, data }` — `type`/`data` come from the flattened,
/// adjacently-tagged [`EventData`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub data: EventData,
}

impl Event {
    pub fn new(session_id: SessionId, data: EventData) -> Self {
        Self { session_id, data }
    }
}

/// Per-type event payloads. `#[serde(tag = "type")]` gives each variant a
/// `type` field on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum EventData {
    ProcessStateChanged { state: i32 },

    BreakpointHit {
        breakpoint_id: i32,
        thread_id: u64,
        function: String,
        file: Option<String>,
        line: Option<u32>,
    },

    WatchpointHit {
        watchpoint_id: i32,
        thread_id: u64,
        function: String,
        file: Option<String>,
        line: Option<u32>,
    },

    Stdout { text: String },

    Stderr { text: String },

    Transcript { text: String },

    TargetCreated { file: String },

    ProcessLaunched { pid: u32, state: i32 },

    ProcessAttached { pid: u32, state: i32 },

    BreakpointSet { breakpoint_id: i32 },

    BreakpointUpdated {
        breakpoint_id: i32,
        enabled: bool,
        ignore_count: u32,
        condition: Option<String>,
    },

    WatchpointSet { watchpoint_id: i32, read: bool, write: bool, size: u32 },

    WatchpointDeleted { watchpoint_id: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_the_spec_type_tag() {
        let ev = Event::new(SessionId::new(), EventData::Stdout { text: "hi".into() });
        let json = serde_json::to_value(&ev).expect("serialize");
        assert_eq!(json["type"], "stdout");
        assert_eq!(json["data"]["text"], "hi");
    }

    #[test]
    fn round_trips_through_json() {
        let ev = Event::new(
            SessionId::new(),
            EventData::BreakpointHit {
                breakpoint_id: 1,
                thread_id: 42,
                function: "main".into(),
                file: Some("main.c".into()),
                line: Some(10),
            },
        );
        let json = serde_json::to_string(&ev).expect("serialize");
        let back: Event = serde_json::from_str(&json).expect("deserialize");
        match back.data {
            EventData::BreakpointHit { breakpoint_id, thread_id, .. } => {
                assert_eq!(breakpoint_id, 1);
                assert_eq!(thread_id, 42);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
