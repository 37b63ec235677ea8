// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Export, import, clearing and backups.

use serde::Serialize;
use tracing::{info, warn};

use super::{CacheService, Task};
use crate::backup::{BackupEntry, BackupManager, RestoreReport};
use crate::bridge::ConfirmPrompt;
use crate::clock::{calendar_date, iso8601};
use crate::codec;
use crate::error::{CacheError, CacheResult};
use crate::meta::MetaTracker;
use crate::migration::SCHEMA_VERSION;
use crate::model::{Dialog, Domain, ExportFile, Settings, User};
use crate::recovery::RecoverySource;
use crate::report::{NotificationKind, Status};

const CLEAR_CONFIRM: &str = "确定要清空所有缓存数据吗？此操作不可恢复！";

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Domains written to the store.
    pub domains: RestoreReport,
    /// Whether the imported data reached the live application.
    pub applied: bool,
}

/// Summary of what the store currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub setting: bool,
    pub users: usize,
    pub dialogs: usize,
    pub last_save: Option<String>,
    pub backup_count: usize,
}

impl CacheService {
    /// Serializes the persisted domains into an export document.
    pub fn export_data(&mut self) -> CacheResult<String> {
        let state = self.persisted_state();
        let file = ExportFile {
            setting: state.setting,
            users: state.users,
            dialogs: state.dialogs,
            export_time: Some(iso8601(self.clock.now_ms())),
            version: Some(SCHEMA_VERSION.to_string()),
        };
        match codec::encode_pretty(&file) {
            Ok(text) => {
                info!(bytes = text.len(), "data exported");
                self.set_status(Status::Exported);
                self.show_notification("数据导出成功", NotificationKind::Success);
                Ok(text)
            }
            Err(e) => {
                self.show_notification(&format!("数据导出失败：{e}"), NotificationKind::Error);
                Err(e)
            }
        }
    }

    /// Suggested download name for an export made now.
    pub fn export_file_name(&self) -> String {
        format!("微信对话生成器_{}.json", calendar_date(self.clock.now_ms()))
    }

    /// Writes every domain present in an export document, then pushes the
    /// data straight into the application.
    pub fn import_data(&mut self, text: &str) -> CacheResult<ImportReport> {
        let file = match serde_json::from_str::<ExportFile>(text) {
            Ok(file) if !file.is_empty() => file,
            Ok(_) => return Err(self.reject_import("no domains in file")),
            Err(e) => return Err(self.reject_import(&e.to_string())),
        };

        let domains = self.write_domains(file.setting, file.users, file.dialogs);
        if !domains.is_complete() {
            self.show_notification("数据导入失败：存储错误", NotificationKind::Error);
        }
        let mut report = ImportReport {
            domains,
            applied: false,
        };
        if report.domains.written.is_empty() {
            return Ok(report);
        }

        info!(written = ?report.domains.written, "data imported");
        if let Err(e) = MetaTracker::new(&*self.store, &self.config.keys.meta).set_import_pending(true)
        {
            warn!(error = %e, "failed to flag import for recovery");
        }
        self.set_status(Status::Imported);
        self.show_notification("数据导入成功！", NotificationKind::Success);
        report.applied = self.restore_immediately(RecoverySource::ImportRecovery);
        Ok(report)
    }

    fn reject_import(&mut self, reason: &str) -> CacheError {
        warn!(reason, "import rejected");
        self.show_notification("数据导入失败：文件格式错误", NotificationKind::Error);
        CacheError::InvalidImport(reason.to_string())
    }

    fn write_domains(
        &mut self,
        setting: Option<Settings>,
        users: Option<Vec<User>>,
        dialogs: Option<Vec<Dialog>>,
    ) -> RestoreReport {
        let mut report = RestoreReport::default();
        if let Some(setting) = setting {
            let key = self.config.keys.setting.clone();
            report.record(Domain::Setting, self.set(&key, &setting));
        }
        if let Some(users) = users {
            let key = self.config.keys.users.clone();
            report.record(Domain::Users, self.set(&key, &users));
        }
        if let Some(dialogs) = dialogs {
            let key = self.config.keys.dialogs.clone();
            report.record(Domain::Dialogs, self.set(&key, &dialogs));
        }
        report
    }

    /// Removes every cache key after confirmation and schedules a reload.
    /// Saves stay off from here until the page reloads.
    pub fn clear_all(&mut self, prompt: &dyn ConfirmPrompt) -> bool {
        if !prompt.confirm(CLEAR_CONFIRM) {
            return false;
        }
        self.cancel_pending_saves();
        self.stop_auto_save();
        self.auto_save_interval = None;
        self.cleared = true;

        match self.remove_everything() {
            Ok(backups) => {
                info!(backups, "cache cleared");
                self.set_status(Status::Cleared);
                self.show_notification("所有缓存数据已清空", NotificationKind::Success);
                let delay = self.config.reload_delay;
                self.schedule(delay, Task::Reload);
                true
            }
            Err(e) => {
                warn!(error = %e, "clearing cache failed");
                self.show_notification(&format!("清空缓存失败：{e}"), NotificationKind::Error);
                false
            }
        }
    }

    fn remove_everything(&self) -> CacheResult<usize> {
        for key in self.config.keys.primary() {
            self.store.remove(key)?;
        }
        self.backups().remove_all()
    }

    fn backups(&self) -> BackupManager<'_> {
        BackupManager::new(&*self.store, &self.config.keys, self.config.backup_retention)
    }

    pub fn cache_stats(&self) -> CacheStats {
        let state = self.persisted_state();
        CacheStats {
            setting: state.setting.is_some(),
            users: state.users.map_or(0, |u| u.len()),
            dialogs: state.dialogs.map_or(0, |d| d.len()),
            last_save: self.get_meta().and_then(|m| m.last_save).map(iso8601),
            backup_count: self.list_backups().len(),
        }
    }

    /// Snapshots the persisted domains. Returns the new backup key.
    pub fn create_backup(&mut self) -> Option<String> {
        let now = self.clock.now_ms();
        let created = self.backups().create(self.persisted_state(), now);
        match created {
            Ok(key) => {
                self.set_status(Status::BackupCreated);
                self.show_notification("备份创建成功", NotificationKind::Success);
                Some(key)
            }
            Err(e) => {
                warn!(error = %e, "backup failed");
                self.show_notification(&format!("备份创建失败：{e}"), NotificationKind::Error);
                None
            }
        }
    }

    /// Writes a backup back to the primary keys and schedules a reload.
    /// Succeeds only when every domain in the backup was written.
    pub fn restore_backup(&mut self, key: &str) -> bool {
        let loaded = self.backups().load(key);
        let snapshot = match loaded {
            Ok(snapshot) => snapshot,
            Err(CacheError::BackupNotFound(_)) => {
                self.show_notification("备份文件不存在", NotificationKind::Error);
                return false;
            }
            Err(e) => {
                warn!(key, error = %e, "backup unreadable");
                self.show_notification(&format!("数据恢复失败：{e}"), NotificationKind::Error);
                return false;
            }
        };

        let report = self.write_domains(snapshot.setting, snapshot.users, snapshot.dialogs);
        if !report.is_complete() {
            warn!(key, failed = ?report.failed, "backup partially restored");
            self.show_notification("数据恢复部分失败", NotificationKind::Error);
            return false;
        }
        info!(key, "backup restored");
        self.set_status(Status::Restored);
        self.show_notification(
            "备份恢复成功！页面将在2秒后自动刷新。",
            NotificationKind::Success,
        );
        let delay = self.config.reload_delay;
        self.schedule(delay, Task::Reload);
        true
    }

    /// Backups, newest first. Empty when the store cannot be listed.
    pub fn list_backups(&self) -> Vec<BackupEntry> {
        self.backups().list().unwrap_or_else(|e| {
            warn!(error = %e, "listing backups failed");
            Vec::new()
        })
    }
}
