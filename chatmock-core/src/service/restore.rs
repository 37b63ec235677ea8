// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recovery entry points: startup check, application registration, the
//! guarded recovery, the immediate restore and the fallback timers.

use tracing::{debug, info, warn};

use super::persistence::read_state;
use super::{CacheService, ReadyAction, Task};
use crate::bridge::AppHandle;
use crate::error::{CacheError, CacheResult};
use crate::events::CacheEvent;
use crate::meta::MetaTracker;
use crate::model::{Domain, PersistedState};
use crate::recovery::RecoverySource;
use crate::report::{NotificationKind, Status};

const CRASH_RESTORED: &str = "检测到异常退出，已自动恢复您的聊天记录！";

/// Applies persisted domains onto the live application.
///
/// Settings are merged field by field; users and dialogs replace the live
/// lists when the persisted list is non-empty. Returns the domains written.
fn apply_state(app: &AppHandle, state: PersistedState) -> CacheResult<Vec<Domain>> {
    let mut guard = app.try_borrow_mut().map_err(|_| CacheError::AppBusy)?;
    let app = &mut *guard;
    let mut applied = Vec::new();

    if let Some(setting) = state.setting.filter(|s| !s.is_empty()) {
        match app.settings() {
            Some(mut live) => {
                live.merge(&setting);
                app.set_settings(live);
                applied.push(Domain::Setting);
            }
            None => warn!("live settings unreadable, not merged"),
        }
    }
    if let Some(users) = state.users.filter(|u| !u.is_empty()) {
        app.set_users(users);
        applied.push(Domain::Users);
    }
    if let Some(dialogs) = state.dialogs.filter(|d| !d.is_empty()) {
        app.set_dialogs(dialogs);
        applied.push(Domain::Dialogs);
    }

    if !applied.is_empty() {
        app.request_render();
    }
    Ok(applied)
}

impl CacheService {
    /// Applies persisted data to the live application if the recovery
    /// guards allow it. `force` bypasses every guard.
    pub fn perform_recovery(&mut self, source: RecoverySource, force: bool) -> bool {
        let now = self.clock.now_ms();
        let store = &*self.store;
        let keys = &self.config.keys;
        let attempt = match self.recovery.begin(source, force, now, || {
            read_state(store, keys).has_valid_data()
        }) {
            Ok(attempt) => attempt,
            Err(rejection) => {
                debug!(source = source.as_str(), %rejection, "recovery skipped");
                return false;
            }
        };
        info!(
            source = source.as_str(),
            attempt = attempt.attempt,
            forced = attempt.forced,
            "recovery started"
        );

        let outcome = match self.bridge.locate() {
            Some(app) => apply_state(&app, self.persisted_state()),
            None => Err(CacheError::AppUnavailable),
        };
        let applied = matches!(&outcome, Ok(domains) if !domains.is_empty());
        let generation = self.recovery.complete(applied);
        let cooldown = self.config.recovery_cooldown;
        self.schedule(cooldown, Task::RecoveryCooldown { generation });

        match outcome {
            Ok(domains) if !domains.is_empty() => {
                self.announce_recovery(source, domains);
                true
            }
            Ok(_) => {
                debug!(source = source.as_str(), "nothing to recover");
                false
            }
            Err(e) => {
                warn!(source = source.as_str(), error = %e, "recovery failed");
                false
            }
        }
    }

    fn announce_recovery(&mut self, source: RecoverySource, domains: Vec<Domain>) {
        info!(source = source.as_str(), ?domains, "recovery applied");
        if source == RecoverySource::ImportRecovery {
            self.clear_import_flag();
        }
        self.set_status(Status::Restored);
        if let Some(message) = source.notification() {
            self.show_notification(message, NotificationKind::Success);
        }
        self.events
            .dispatch(CacheEvent::RecoveryApplied { source, domains });
    }

    fn clear_import_flag(&mut self) {
        let tracker = MetaTracker::new(&*self.store, &self.config.keys.meta);
        if tracker.get().is_some_and(|m| m.needs_import_recovery()) {
            if let Err(e) = tracker.set_import_pending(false) {
                warn!(error = %e, "failed to clear import flag");
            }
        }
    }

    /// Applies persisted data right away, bypassing the recovery guards and
    /// the cached application lookup. Lookup is retried a few times with a
    /// short pause in between.
    pub fn restore_immediately(&mut self, source: RecoverySource) -> bool {
        let attempts = self.config.probe_attempts.max(1);
        let mut found = None;
        for attempt in 1..=attempts {
            found = self.bridge.locate_fresh();
            if found.is_some() {
                break;
            }
            debug!(attempt, "application not found, probing again");
            if attempt < attempts {
                self.clock.pause(self.config.probe_interval);
            }
        }
        let Some(app) = found else {
            warn!(source = source.as_str(), "immediate restore found no application");
            return false;
        };

        match apply_state(&app, self.persisted_state()) {
            Ok(domains) if !domains.is_empty() => {
                self.recovery.mark_recovered();
                self.announce_recovery(source, domains);
                true
            }
            Ok(_) => {
                debug!("immediate restore had nothing to apply");
                false
            }
            Err(e) => {
                warn!(error = %e, "immediate restore failed");
                false
            }
        }
    }

    /// Decides the startup recovery strategy and arms it until the
    /// application registers.
    pub fn check_for_recovery(&mut self) {
        let meta = self.get_meta();
        if !self.has_valid_cache_data() {
            debug!("no cached data, nothing to recover");
            return;
        }

        let (source, force) = match &meta {
            Some(m) if m.needs_import_recovery() => (RecoverySource::ImportRecovery, true),
            Some(m) if m.ended_abnormally() => (RecoverySource::CrashRecovery, false),
            _ => (RecoverySource::AutoRestore, false),
        };
        info!(source = source.as_str(), "startup recovery armed");

        if source == RecoverySource::CrashRecovery {
            let delay = self.config.abnormal_exit_notice_delay;
            self.schedule(delay, Task::CrashNotice);
        }
        self.when_ready(ReadyAction::Recover { source, force });
        if !self.ready.is_resolved() && self.app_wait.is_none() {
            let timeout = self.config.app_wait_timeout;
            self.app_wait = Some(self.schedule(timeout, Task::AppWaitTimeout));
        }
    }

    /// Registers the live application and runs everything that was waiting
    /// for it.
    pub fn register_app(&mut self, app: AppHandle) {
        info!("application registered");
        self.bridge.register(app);
        if let Some(timer) = self.app_wait.take() {
            self.timers.cancel(timer);
        }
        for action in self.ready.resolve() {
            self.run_ready_action(action);
        }
        self.set_status(Status::Enhanced);
        let interval = self.config.auto_save_interval;
        self.start_auto_save(interval);
    }

    /// Runs `callback` once the application has registered, or right away
    /// if it already has.
    pub fn on_app_ready(&mut self, callback: impl FnOnce(&mut CacheService) + 'static) {
        self.when_ready(ReadyAction::Callback(Box::new(callback)));
    }

    fn when_ready(&mut self, action: ReadyAction) {
        if let Some(action) = self.ready.wait(action) {
            self.run_ready_action(action);
        }
    }

    fn run_ready_action(&mut self, action: ReadyAction) {
        match action {
            ReadyAction::Recover { source, force } => {
                self.perform_recovery(source, force);
            }
            ReadyAction::CrashNotice => self.surface_crash_recovery(),
            ReadyAction::Callback(callback) => callback(self),
        }
    }

    /// Surfaces the abnormal-exit notice. Without an application the notice
    /// waits for registration and leaves the recovery counters untouched.
    pub(super) fn surface_crash_recovery(&mut self) {
        if !self.recovery.has_recovered() {
            if self.bridge.locate().is_none() {
                if !self.ready.is_resolved() {
                    debug!("application not ready, crash notice deferred");
                    self.when_ready(ReadyAction::CrashNotice);
                }
                return;
            }
            if !self.perform_recovery(RecoverySource::CrashRecovery, true) {
                return;
            }
        }
        self.set_status(Status::SessionRestored);
        self.show_notification(CRASH_RESTORED, NotificationKind::Success);
    }

    pub(super) fn run_fallback(&mut self) {
        if self.recovery.has_recovered() {
            debug!("data already recovered, fallback not needed");
            return;
        }
        if self.bridge.locate().is_none() {
            debug!("application still missing, arming final fallback");
            let delay = self.config.final_fallback_delay;
            self.schedule(delay, Task::FinalFallbackRecovery);
            return;
        }
        if self.has_valid_cache_data() {
            self.perform_recovery(RecoverySource::FallbackRecovery, true);
        }
    }

    pub(super) fn run_final_fallback(&mut self) {
        if self.recovery.has_recovered() || self.bridge.locate().is_none() {
            return;
        }
        if self.has_valid_cache_data() {
            self.perform_recovery(RecoverySource::FinalFallbackRecovery, true);
        }
    }

    pub(super) fn give_up_waiting(&mut self) {
        self.app_wait = None;
        if self.bridge.locate().is_some() {
            for action in self.ready.resolve() {
                self.run_ready_action(action);
            }
            return;
        }
        let dropped = self
            .ready
            .retain(|action| matches!(action, ReadyAction::Callback(_)));
        warn!(dropped, "application did not appear in time, startup recovery abandoned");
    }
}
