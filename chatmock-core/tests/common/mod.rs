// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared harness and fixtures for the service-level tests. Each test file
//! uses a different subset.

#![allow(dead_code)]

pub mod strategies;

use std::cell::RefCell;
use std::rc::Rc;

use chatmock_core::*;

/// Fixed start time: 2025-01-15T08:00:00Z.
pub const T0: u64 = 1_736_928_000_000;

/// A service over shared store and clock handles, with every event recorded.
pub struct Harness {
    pub store: Rc<MemoryStore>,
    pub clock: Rc<ManualClock>,
    pub service: CacheService,
    pub events: Rc<RefCell<Vec<CacheEvent>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }

    /// Builds the service over `store`, which may already hold data.
    pub fn with_store(store: MemoryStore, config: CacheConfig) -> Self {
        let store = Rc::new(store);
        let clock = Rc::new(ManualClock::new(T0));
        let shared_clock: Rc<dyn Clock> = clock.clone();
        let mut service = CacheService::new(Rc::clone(&store), shared_clock, config);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        service.add_event_handler(Rc::new(CallbackHandler::new(move |event| {
            sink.borrow_mut().push(event)
        })));

        Self {
            store,
            clock,
            service,
            events,
        }
    }

    /// Moves the clock forward and runs whatever became due.
    pub fn advance(&mut self, ms: u64) -> usize {
        self.clock.advance_ms(ms);
        self.service.tick()
    }

    /// Registers `app` with the service and returns the typed handle.
    pub fn register(&mut self, app: MemoryApp) -> Rc<RefCell<MemoryApp>> {
        let app = Rc::new(RefCell::new(app));
        let handle: AppHandle = app.clone();
        self.service.register_app(handle);
        app
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap()
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn count_events(&self, matches: impl Fn(&CacheEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| matches(e)).count()
    }

    /// Messages of every toast shown so far, oldest first.
    pub fn toasts(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                CacheEvent::NotificationShown { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                CacheEvent::StatusChanged { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

/// A locator that hands out a fixed application once it is "mounted".
pub struct SlotLocator {
    pub slot: Rc<RefCell<Option<AppHandle>>>,
}

impl AppLocator for SlotLocator {
    fn name(&self) -> &str {
        "slot"
    }

    fn locate(&self) -> Option<AppHandle> {
        self.slot.borrow().clone()
    }
}

// ============================================================
// Fixtures
// ============================================================

pub fn sample_settings() -> Settings {
    let mut settings = Settings::new();
    settings.insert("title", "群聊");
    settings.insert("battery", 80);
    settings
}

pub fn sample_users() -> Vec<User> {
    vec![User::new(1, "我", true), User::new(2, "小明", false)]
}

pub fn sample_dialogs() -> Vec<Dialog> {
    vec![
        Dialog::text("dialog-1", true, "你好").with_user(1),
        Dialog::text("dialog-2", false, "在吗").with_user(2),
    ]
}

pub fn sample_app() -> MemoryApp {
    MemoryApp::new()
        .with_users(sample_users())
        .with_dialogs(sample_dialogs())
}

/// Writes the three domains and a metadata record straight into `store`.
pub fn seed_store(store: &MemoryStore, normal_exit: bool) {
    let keys = StorageKeys::default();
    store
        .set(&keys.setting, &serde_json::to_string(&sample_settings()).unwrap())
        .unwrap();
    store
        .set(&keys.users, &serde_json::to_string(&sample_users()).unwrap())
        .unwrap();
    store
        .set(&keys.dialogs, &serde_json::to_string(&sample_dialogs()).unwrap())
        .unwrap();
    let meta = serde_json::json!({ "normalExit": normal_exit, "version": SCHEMA_VERSION });
    store.set(&keys.meta, &meta.to_string()).unwrap();
}

pub fn seeded_store(normal_exit: bool) -> MemoryStore {
    let store = MemoryStore::new();
    seed_store(&store, normal_exit);
    store
}
