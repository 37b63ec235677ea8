// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Application operations whose effects are persisted.
//!
//! Each wrapped operation runs on the live application and then schedules
//! a short-delay save of the domains it touched. Repeated operations within
//! the delay share one save per domain.

use tracing::{debug, warn};

use super::{CacheService, Task};
use crate::bridge::{editing, ChatApp, ConfirmPrompt};
use crate::emoji;
use crate::error::{CacheError, CacheResult};
use crate::model::{Dialog, Domain};
use crate::recovery::RecoverySource;
use crate::report::{NotificationKind, Status};

const CLEAN_CONFIRM: &str = "您确认要清空对话内容？";

impl CacheService {
    fn with_app<R>(&mut self, f: impl FnOnce(&mut dyn ChatApp) -> R) -> CacheResult<R> {
        let app = self.bridge.locate().ok_or(CacheError::AppUnavailable)?;
        let mut guard = app.try_borrow_mut().map_err(|_| CacheError::AppBusy)?;
        let result = f(&mut *guard);
        Ok(result)
    }

    fn wrapped(&mut self, domains: &[Domain], op: impl FnOnce(&mut dyn ChatApp)) -> bool {
        match self.with_app(op) {
            Ok(()) => {
                for &domain in domains {
                    self.schedule_bridge_save(domain);
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "application operation failed");
                false
            }
        }
    }

    fn schedule_bridge_save(&mut self, domain: Domain) {
        if self.pending_bridge.contains_key(&domain) {
            return;
        }
        let delay = self.config.bridge_save_delay;
        let timer = self.schedule(delay, Task::BridgeSave(domain));
        self.pending_bridge.insert(domain, timer);
    }

    pub fn add_dialog(&mut self, dialog: Dialog) -> bool {
        self.wrapped(&[Domain::Dialogs], |app| app.add_dialog(dialog))
    }

    pub fn delete_dialog(&mut self, index: usize) -> bool {
        self.wrapped(&[Domain::Dialogs], |app| app.delete_dialog(index))
    }

    pub fn add_user(&mut self) -> bool {
        self.wrapped(&[Domain::Users], |app| app.add_user())
    }

    /// Removes a user. Their dialogs go with them, so both domains are saved.
    pub fn delete_user(&mut self, index: usize) -> bool {
        self.wrapped(&[Domain::Users, Domain::Dialogs], |app| {
            app.delete_user(index)
        })
    }

    pub fn claim_red_packet(&mut self, index: usize) -> bool {
        self.wrapped(&[Domain::Dialogs], |app| app.claim_red_packet(index))
    }

    pub fn claim_transfer(&mut self, index: usize) -> bool {
        self.wrapped(&[Domain::Dialogs], |app| app.claim_transfer(index))
    }

    /// Empties the conversation after confirmation and saves right away.
    pub fn clean_dialogs(&mut self, prompt: &dyn ConfirmPrompt) -> bool {
        if !prompt.confirm(CLEAN_CONFIRM) {
            return false;
        }
        if let Err(e) = self.with_app(|app| app.clean_dialogs()) {
            warn!(error = %e, "cleaning dialogs failed");
            return false;
        }
        if let Some(timer) = self.pending_bridge.remove(&Domain::Dialogs) {
            self.timers.cancel(timer);
        }
        let saved = self.save_domain(Domain::Dialogs);
        self.set_status(Status::DialogsCleared);
        saved
    }

    /// Saves every domain now.
    pub fn manual_save(&mut self) -> bool {
        let saved = self.save_all();
        if saved {
            self.set_status(Status::ManualSaved);
        }
        saved
    }

    /// Pushes persisted data into the application now.
    pub fn manual_load(&mut self) -> bool {
        self.restore_immediately(RecoverySource::AutoRestore)
    }

    pub fn begin_edit(&mut self, index: usize) -> bool {
        match self.with_app(|app| editing::begin_edit(app, index)) {
            Ok(Ok(())) => true,
            Ok(Err(e)) | Err(e) => {
                debug!(index, error = %e, "cannot edit dialog");
                false
            }
        }
    }

    /// Commits an inline edit and persists the dialog list immediately.
    pub fn save_edit(&mut self, index: usize) -> bool {
        let outcome = self
            .with_app(|app| editing::save_edit(app, index))
            .and_then(|r| r);
        self.persist_dialogs(outcome)
    }

    pub fn cancel_edit(&mut self, index: usize) -> bool {
        match self.with_app(|app| editing::cancel_edit(app, index)) {
            Ok(Ok(())) => true,
            Ok(Err(e)) | Err(e) => {
                debug!(index, error = %e, "cannot cancel edit");
                false
            }
        }
    }

    /// Marks a message as refused and persists the dialog list immediately.
    pub fn block_dialog(&mut self, index: usize) -> bool {
        let now = self.clock.now_ms();
        let outcome = self
            .with_app(|app| editing::block_dialog(app, index, now))
            .and_then(|r| r);
        self.persist_dialogs(outcome)
    }

    fn persist_dialogs(&mut self, outcome: CacheResult<Vec<Dialog>>) -> bool {
        match outcome {
            Ok(dialogs) => {
                let key = self.config.keys.dialogs.clone();
                self.set(&key, &dialogs)
            }
            Err(e) => {
                warn!(error = %e, "dialog update failed");
                false
            }
        }
    }

    /// Appends an image message from the selected user.
    pub fn add_image_dialog(&mut self, image_data: &str) -> bool {
        let now = self.clock.now_ms();
        let outcome = self
            .with_app(|app| editing::add_image_dialog(app, image_data, now))
            .and_then(|r| r);
        match outcome {
            Ok(dialog) => {
                debug!(id = %dialog.id, "image dialog added");
                self.schedule_bridge_save(Domain::Dialogs);
                true
            }
            Err(CacheError::NoSelectedUser) => {
                self.show_notification("请先选择用户", NotificationKind::Error);
                false
            }
            Err(e) => {
                warn!(error = %e, "adding image failed");
                false
            }
        }
    }

    /// Message text as HTML with emoji markers rendered.
    pub fn render_content(&self, text: &str) -> String {
        emoji::render_content(text, &self.config.emoji_base_path)
    }
}
