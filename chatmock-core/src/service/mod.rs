// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cache Service
//!
//! The persistence layer as one explicitly constructed service. It owns the
//! store, the recovery coordinator, the status line and the toast queue,
//! and every deferred effect as a task in a [`TimerQueue`]. The host pumps
//! the queue with [`CacheService::tick`] and forwards page lifecycle events.
//!
//! Faults never escape the public operations: they become a `false` or
//! `None` result, a log line and, where the user should know, a toast.

mod app_ops;
mod persistence;
mod restore;
mod transfer;

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::bridge::{AppBridge, AppLocator, ReadySignal};
use crate::clock::{millis, Clock};
use crate::config::CacheConfig;
use crate::events::{CacheEvent, EventDispatcher, EventHandler};
use crate::migration::{all_migrations, MigrationRunner};
use crate::model::Domain;
use crate::recovery::{RecoveryCoordinator, RecoverySource};
use crate::report::{NotificationCenter, NotificationKind, Status, StatusLine};
use crate::store::KvStore;
use crate::timer::{TimerId, TimerQueue};

pub use transfer::{CacheStats, ImportReport};

/// Deferred work.
#[derive(Debug)]
enum Task {
    /// Watcher debounce elapsed for a domain.
    WatchFlush(Domain),
    /// Save debounce elapsed for a domain.
    DeferredSave(Domain),
    /// Write after a wrapped application operation.
    BridgeSave(Domain),
    RecoveryCooldown { generation: u64 },
    StatusRevert { text: String },
    NotificationExpire(u64),
    Reload,
    AutoSave,
    /// Session-restored notice after an abnormal exit.
    CrashNotice,
    FallbackRecovery,
    FinalFallbackRecovery,
    AppWaitTimeout,
}

/// Work waiting for the application to register.
enum ReadyAction {
    Recover {
        source: RecoverySource,
        force: bool,
    },
    /// The abnormal-exit notice, deferred until the application exists.
    CrashNotice,
    Callback(Box<dyn FnOnce(&mut CacheService)>),
}

/// Client-side persistence and crash recovery for the chat application.
pub struct CacheService {
    store: Box<dyn KvStore>,
    clock: Rc<dyn Clock>,
    config: CacheConfig,
    timers: TimerQueue<Task>,
    events: EventDispatcher,
    recovery: RecoveryCoordinator,
    status: StatusLine,
    notifications: NotificationCenter,
    bridge: AppBridge,
    ready: ReadySignal<ReadyAction>,
    pending_saves: HashMap<Domain, TimerId>,
    pending_watch: HashMap<Domain, TimerId>,
    pending_bridge: HashMap<Domain, TimerId>,
    auto_save: Option<TimerId>,
    auto_save_interval: Option<Duration>,
    app_wait: Option<TimerId>,
    page_hidden: bool,
    /// Set once everything was cleared; saves stay off until the reload.
    cleared: bool,
}

impl CacheService {
    /// Creates the service, migrates persisted data and arms the startup
    /// recovery.
    pub fn new<S>(store: S, clock: Rc<dyn Clock>, config: CacheConfig) -> Self
    where
        S: KvStore + 'static,
    {
        match MigrationRunner::run(&store, &config.keys, &all_migrations()) {
            Ok(version) => info!(version, "cache schema ready"),
            Err(e) => error!(error = %e, "cache migration failed, continuing with stored data"),
        }

        let mut service = Self {
            store: Box::new(store),
            clock,
            recovery: RecoveryCoordinator::new(
                config.max_recovery_attempts,
                config.recovery_rate_limit,
            ),
            status: StatusLine::new(config.status_min_interval),
            notifications: NotificationCenter::new(config.max_notifications),
            config,
            timers: TimerQueue::new(),
            events: EventDispatcher::new(),
            bridge: AppBridge::new(),
            ready: ReadySignal::new(),
            pending_saves: HashMap::new(),
            pending_watch: HashMap::new(),
            pending_bridge: HashMap::new(),
            auto_save: None,
            auto_save_interval: None,
            app_wait: None,
            page_hidden: false,
            cleared: false,
        };
        service.check_for_recovery();
        service
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn KvStore {
        &*self.store
    }

    pub fn recovery(&self) -> &RecoveryCoordinator {
        &self.recovery
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Text currently shown on the status line.
    pub fn status_text(&self) -> &str {
        self.status.current()
    }

    pub fn add_event_handler(&mut self, handler: Rc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Adds a lookup strategy for hosts whose application cannot register.
    pub fn add_locator(&mut self, locator: Box<dyn AppLocator>) {
        self.bridge.add_locator(locator);
    }

    /// Runs every task that is due. Returns how many ran.
    pub fn tick(&mut self) -> usize {
        let mut ran = 0;
        while let Some((_, task)) = self.timers.pop_due(self.clock.now_ms()) {
            self.run_task(task);
            ran += 1;
        }
        ran
    }

    /// When the next task becomes due, in epoch milliseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_tasks(&self) -> usize {
        self.timers.len()
    }

    fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
        let deadline = self.clock.now_ms().saturating_add(millis(delay));
        self.timers.schedule(deadline, task)
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::WatchFlush(domain) => {
                self.pending_watch.remove(&domain);
                self.deferred_save(domain);
            }
            Task::DeferredSave(domain) => {
                self.pending_saves.remove(&domain);
                self.save_domain(domain);
            }
            Task::BridgeSave(domain) => {
                self.pending_bridge.remove(&domain);
                self.save_domain(domain);
            }
            Task::RecoveryCooldown { generation } => {
                self.recovery.finish_cooldown(generation);
            }
            Task::StatusRevert { text } => self.revert_status(&text),
            Task::NotificationExpire(id) => {
                self.dismiss_notification(id);
            }
            Task::Reload => {
                info!("requesting page reload");
                self.events.dispatch(CacheEvent::ReloadRequested);
            }
            Task::AutoSave => self.run_auto_save(),
            Task::CrashNotice => self.surface_crash_recovery(),
            Task::FallbackRecovery => self.run_fallback(),
            Task::FinalFallbackRecovery => self.run_final_fallback(),
            Task::AppWaitTimeout => self.give_up_waiting(),
        }
    }

    /// Shows `text` on the status line. Returns whether it was accepted.
    pub fn update_cache_status(&mut self, text: &str) -> bool {
        let now = self.clock.now_ms();
        let Some(revert_after) = self.status.update(text, now) else {
            return false;
        };
        if let Some(previous) = self.status.take_revert_timer() {
            self.timers.cancel(previous);
        }
        let timer = self.schedule(
            revert_after,
            Task::StatusRevert {
                text: text.to_string(),
            },
        );
        self.status.set_revert_timer(timer);
        self.events.dispatch(CacheEvent::StatusChanged {
            text: text.to_string(),
        });
        true
    }

    fn set_status(&mut self, status: Status) -> bool {
        self.update_cache_status(status.text())
    }

    fn revert_status(&mut self, text: &str) {
        self.status.take_revert_timer();
        if self.status.revert(text) {
            self.events.dispatch(CacheEvent::StatusChanged {
                text: self.status.current().to_string(),
            });
        }
    }

    /// Queues a toast that expires on its own. Returns its id.
    pub fn show_notification(&mut self, message: &str, kind: NotificationKind) -> u64 {
        match kind {
            NotificationKind::Error => warn!(text = message, "notification"),
            _ => info!(text = message, kind = kind.as_str(), "notification"),
        }
        let now = self.clock.now_ms();
        let id = self.notifications.push(message, kind, now);
        let lifetime = self.config.notification_lifetime;
        let timer = self.schedule(lifetime, Task::NotificationExpire(id));
        self.notifications.set_expiry(id, timer);
        self.events.dispatch(CacheEvent::NotificationShown {
            id,
            message: message.to_string(),
            kind,
        });

        for evicted in self.notifications.overflow() {
            self.dismiss_notification(evicted);
        }
        id
    }

    /// Removes a toast early. Returns `false` if it was already gone.
    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        let Some(dismissal) = self.notifications.dismiss(id) else {
            return false;
        };
        if let Some(timer) = dismissal.expiry {
            self.timers.cancel(timer);
        }
        self.events
            .dispatch(CacheEvent::NotificationDismissed { id });
        if dismissal.container_closed {
            self.events
                .dispatch(CacheEvent::NotificationContainerRemoved);
        }
        true
    }
}
