// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Toast notification queue.

use std::collections::VecDeque;

use serde::Serialize;

use crate::timer::TimerId;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: u64,
    expiry: Option<TimerId>,
}

/// Result of a dismissal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dismissal {
    pub notification: Notification,
    /// Pending expiry timer to cancel.
    pub expiry: Option<TimerId>,
    /// The queue became empty and the container went away.
    pub container_closed: bool,
}

/// Ordered, capped queue of visible toasts.
#[derive(Debug)]
pub struct NotificationCenter {
    queue: VecDeque<Notification>,
    capacity: usize,
    next_id: u64,
    container_open: bool,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
            next_id: 1,
            container_open: false,
        }
    }

    /// Appends a toast and returns its id.
    pub fn push(&mut self, message: impl Into<String>, kind: NotificationKind, now_ms: u64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.container_open = true;
        self.queue.push_back(Notification {
            id,
            message: message.into(),
            kind,
            created_at: now_ms,
            expiry: None,
        });
        id
    }

    pub fn set_expiry(&mut self, id: u64, timer: TimerId) {
        if let Some(n) = self.queue.iter_mut().find(|n| n.id == id) {
            n.expiry = Some(timer);
        }
    }

    /// Ids of the oldest toasts that exceed the capacity.
    pub fn overflow(&self) -> Vec<u64> {
        let excess = self.queue.len().saturating_sub(self.capacity);
        self.queue.iter().take(excess).map(|n| n.id).collect()
    }

    /// Removes a toast. `None` if it is already gone.
    pub fn dismiss(&mut self, id: u64) -> Option<Dismissal> {
        let index = self.queue.iter().position(|n| n.id == id)?;
        let notification = self.queue.remove(index)?;
        let container_closed = self.queue.is_empty() && self.container_open;
        if container_closed {
            self.container_open = false;
        }
        Some(Dismissal {
            expiry: notification.expiry,
            notification,
            container_closed,
        })
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn container_open(&self) -> bool {
        self.container_open
    }
}
