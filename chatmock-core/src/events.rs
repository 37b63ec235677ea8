// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! UI-facing effects of the cache, delivered to the host page.

use std::rc::Rc;

use crate::model::Domain;
use crate::recovery::RecoverySource;
use crate::report::NotificationKind;

/// Events emitted by the cache service.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// The status line text changed.
    StatusChanged {
        /// The new status text.
        text: String,
    },

    /// A toast was appended to the notification queue.
    NotificationShown {
        id: u64,
        message: String,
        kind: NotificationKind,
    },

    /// A toast left the queue (expired, dismissed or evicted).
    NotificationDismissed { id: u64 },

    /// The last toast left and the container should be torn down.
    NotificationContainerRemoved,

    /// The page should reload to re-initialize from storage.
    ReloadRequested,

    /// Persisted data was applied to the live application.
    RecoveryApplied {
        source: RecoverySource,
        /// Domains that were actually written.
        domains: Vec<Domain>,
    },

    /// A value was written to the store.
    Saved { key: String },

    /// A write failed.
    SaveFailed {
        key: String,
        /// Error description.
        error: String,
    },
}

/// Event handler trait.
///
/// Implement this trait to receive cache events.
pub trait EventHandler {
    /// Called when an event occurs.
    fn on_event(&self, event: CacheEvent);
}

/// Simple callback-based event handler.
pub struct CallbackHandler<F>
where
    F: Fn(CacheEvent),
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(CacheEvent),
{
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(CacheEvent),
{
    fn on_event(&self, event: CacheEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Rc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Rc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Removes all handlers.
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: CacheEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
