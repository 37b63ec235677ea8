// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Writes, reads, debouncing and page lifecycle hooks.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::{CacheService, Task};
use crate::bridge::{AppHandle, ChatApp};
use crate::codec;
use crate::config::StorageKeys;
use crate::error::{CacheError, CacheResult};
use crate::events::CacheEvent;
use crate::meta::{CacheMeta, MetaTracker};
use crate::model::{Domain, PersistedState};
use crate::report::{NotificationKind, Status};
use crate::store::KvStore;

const SAVE_FAILED: &str = "保存失败：存储空间不足";

/// Reads and decodes `key`. Store faults and corrupt data read as absent.
pub(super) fn read<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(raw)) => codec::decode(key, &raw),
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "cache read failed");
            None
        }
    }
}

/// Reads a stored list, keeping the elements that decode.
pub(super) fn read_list<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<Vec<T>> {
    match store.get(key) {
        Ok(Some(raw)) => codec::decode_list(key, &raw),
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "cache read failed");
            None
        }
    }
}

/// The three domains as currently persisted.
pub(super) fn read_state(store: &dyn KvStore, keys: &StorageKeys) -> PersistedState {
    PersistedState {
        setting: read(store, &keys.setting),
        users: read_list(store, &keys.users),
        dialogs: read_list(store, &keys.dialogs),
    }
}

fn encode_live(app: &dyn ChatApp, domain: Domain) -> Option<CacheResult<String>> {
    match domain {
        Domain::Setting => app.settings().map(|v| codec::encode(&v)),
        Domain::Users => app.users().map(|v| codec::encode(&v)),
        Domain::Dialogs => app.dialogs().map(|v| codec::encode(&v)),
    }
}

fn live_dialog_count(app: &AppHandle) -> Option<usize> {
    let guard = app.try_borrow().ok()?;
    guard.dialogs().map(|d| d.len())
}

impl CacheService {
    /// Encodes and stores `value` under `key`.
    ///
    /// On success the status line shows the save and the metadata records
    /// it. On failure the user gets an error toast.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        match codec::encode(value) {
            Ok(raw) => self.set_raw(key, &raw),
            Err(e) => {
                self.report_save_failure(key, &e);
                false
            }
        }
    }

    fn set_raw(&mut self, key: &str, raw: &str) -> bool {
        if let Err(e) = self.store.set(key, raw) {
            self.report_save_failure(key, &CacheError::from(e));
            return false;
        }
        debug!(key, bytes = raw.len(), "saved");
        self.set_status(Status::Saved);

        let now = self.clock.now_ms();
        if let Err(e) = MetaTracker::new(&*self.store, &self.config.keys.meta).record_save(now) {
            warn!(error = %e, "failed to update cache metadata");
        }
        self.events.dispatch(CacheEvent::Saved {
            key: key.to_string(),
        });
        true
    }

    fn report_save_failure(&mut self, key: &str, err: &CacheError) {
        error!(key, error = %err, "save failed");
        self.show_notification(SAVE_FAILED, NotificationKind::Error);
        self.events.dispatch(CacheEvent::SaveFailed {
            key: key.to_string(),
            error: err.to_string(),
        });
    }

    /// Reads and decodes `key`. `None` when absent or undecodable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        read(&*self.store, key)
    }

    /// The three domains as currently persisted.
    pub fn persisted_state(&self) -> PersistedState {
        read_state(&*self.store, &self.config.keys)
    }

    /// Whether the store holds anything worth restoring.
    pub fn has_valid_cache_data(&self) -> bool {
        self.persisted_state().has_valid_data()
    }

    /// Writes one domain from the live application.
    pub fn save_domain(&mut self, domain: Domain) -> bool {
        match self.bridge.locate() {
            Some(app) => self.save_from(&app, domain),
            None => {
                warn!(%domain, "no application instance to save from");
                false
            }
        }
    }

    fn save_from(&mut self, app: &AppHandle, domain: Domain) -> bool {
        if self.cleared {
            debug!(%domain, "cache cleared, save skipped");
            return false;
        }
        let encoded = {
            let Ok(guard) = app.try_borrow() else {
                warn!(%domain, "application busy, save skipped");
                return false;
            };
            encode_live(&*guard, domain)
        };

        let key = self.config.keys.domain(domain).to_string();
        match encoded {
            Some(Ok(raw)) => self.set_raw(&key, &raw),
            Some(Err(e)) => {
                self.report_save_failure(&key, &e);
                false
            }
            None => {
                warn!(%domain, "application field unreadable, save skipped");
                false
            }
        }
    }

    /// Writes all three domains from the live application.
    pub fn save_all(&mut self) -> bool {
        let Some(app) = self.bridge.locate() else {
            warn!("no application instance to save from");
            return false;
        };
        let mut all = true;
        for domain in Domain::ALL {
            all &= self.save_from(&app, domain);
        }
        if all {
            self.set_status(Status::AllSaved);
        }
        all
    }

    /// Writes `domain` once no further request arrived for the save
    /// debounce period. Each domain debounces on its own.
    pub fn deferred_save(&mut self, domain: Domain) {
        if let Some(pending) = self.pending_saves.remove(&domain) {
            self.timers.cancel(pending);
        }
        self.set_status(Status::Saving);
        let debounce = self.config.save_debounce;
        let timer = self.schedule(debounce, Task::DeferredSave(domain));
        self.pending_saves.insert(domain, timer);
    }

    /// Entry point for the host's change watchers. Bursts of changes are
    /// coalesced before they reach [`deferred_save`](Self::deferred_save).
    pub fn notify_changed(&mut self, domain: Domain) {
        if let Some(pending) = self.pending_watch.remove(&domain) {
            self.timers.cancel(pending);
        }
        let debounce = self.config.watch_debounce;
        let timer = self.schedule(debounce, Task::WatchFlush(domain));
        self.pending_watch.insert(domain, timer);
    }

    pub(super) fn cancel_pending_saves(&mut self) {
        let pending: Vec<_> = self
            .pending_saves
            .drain()
            .chain(self.pending_watch.drain())
            .chain(self.pending_bridge.drain())
            .map(|(_, timer)| timer)
            .collect();
        for timer in pending {
            self.timers.cancel(timer);
        }
    }

    /// Saves everything periodically while the page is visible and the
    /// conversation is not empty.
    pub fn start_auto_save(&mut self, interval: Duration) {
        self.stop_auto_save();
        let interval = interval.max(Duration::from_millis(1));
        self.auto_save_interval = Some(interval);
        self.auto_save = Some(self.schedule(interval, Task::AutoSave));
    }

    pub fn stop_auto_save(&mut self) {
        if let Some(timer) = self.auto_save.take() {
            self.timers.cancel(timer);
        }
    }

    pub(super) fn run_auto_save(&mut self) {
        self.auto_save = None;
        let Some(interval) = self.auto_save_interval else {
            return;
        };
        self.auto_save = Some(self.schedule(interval, Task::AutoSave));
        if self.page_hidden {
            return;
        }

        let has_dialogs = self
            .bridge
            .locate()
            .and_then(|app| live_dialog_count(&app))
            .is_some_and(|count| count > 0);
        if has_dialogs {
            self.save_all();
            self.set_status(Status::AutoSaved);
        }
    }

    /// Page visibility changed. Hiding saves everything and pauses
    /// auto-save; showing resumes it.
    pub fn on_visibility_change(&mut self, hidden: bool) {
        self.page_hidden = hidden;
        if hidden {
            self.stop_auto_save();
            self.save_all();
            self.set_status(Status::PageSwitchSaved);
        } else if let Some(interval) = self.auto_save_interval {
            self.start_auto_save(interval);
        }
    }

    /// The page is about to unload.
    pub fn on_before_unload(&mut self) {
        self.save_all();
        self.set_normal_exit(false);
    }

    /// The page finished loading. Arms the fallback recoveries.
    pub fn on_load(&mut self) {
        self.set_normal_exit(true);
        let delay = self.config.fallback_recovery_delay;
        self.schedule(delay, Task::FallbackRecovery);
    }

    pub fn get_meta(&self) -> Option<CacheMeta> {
        MetaTracker::new(&*self.store, &self.config.keys.meta).get()
    }

    pub fn set_normal_exit(&mut self, normal: bool) -> bool {
        let now = self.clock.now_ms();
        match MetaTracker::new(&*self.store, &self.config.keys.meta).set_normal_exit(normal, now) {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, normal, "failed to set exit flag");
                false
            }
        }
    }
}
