// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded per-session FIFO backing `pollEvents`, default capacity 1024,
//! dropping the oldest event on overflow.

use std::collections::VecDeque;

use dbg_core::Event;
use tokio::sync::Mutex;

pub struct EventBuffer {
    capacity: usize,
    queue: Mutex<VecDeque<Event>>,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))) }
    }

    /// Drops the oldest entry on overflow rather than rejecting the new
    /// one — a slow poller should see "something is missing", not stall
    /// event production.
    pub async fn push(&self, event: Event) {
        let mut queue = self.queue.lock().await;
        if queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(event);
    }

    /// Drains up to `limit` events, oldest first.
    pub async fn drain(&self, limit: usize) -> Vec<Event> {
        let mut queue = self.queue.lock().await;
        let n = limit.min(queue.len());
        queue.drain(..n).collect()
    }
}
