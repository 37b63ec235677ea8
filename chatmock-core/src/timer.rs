// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cancellable deadline queue.
//!
//! A single-threaded stand-in for browser timers: tasks are keyed by their
//! deadline and an insertion id, so tasks due at the same instant fire in
//! scheduling order.

use std::collections::{BTreeMap, HashMap};

/// Handle to a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deadline-ordered queue of pending tasks.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    entries: BTreeMap<(u64, TimerId), T>,
    deadlines: HashMap<TimerId, u64>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Schedules `task` to become due at `deadline_ms`.
    pub fn schedule(&mut self, deadline_ms: u64, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert((deadline_ms, id), task);
        self.deadlines.insert(id, deadline_ms);
        id
    }

    /// Cancels a pending task. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.entries.remove(&(deadline, id))
    }

    /// Earliest deadline in the queue.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns the earliest task due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, T)> {
        let (&(deadline, id), _) = self.entries.first_key_value()?;
        if deadline > now_ms {
            return None;
        }
        self.deadlines.remove(&id);
        self.entries.remove(&(deadline, id)).map(|task| (id, task))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
