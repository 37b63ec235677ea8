// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cache configuration.
//!
//! Every timing and capacity constant of the persistence layer lives here,
//! together with the persisted key layout.

use std::time::Duration;

use crate::model::Domain;

/// Persisted key layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub setting: String,
    pub users: String,
    pub dialogs: String,
    pub meta: String,
    pub backup_prefix: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("wechat_")
    }
}

impl StorageKeys {
    /// Builds the layout with every key under `prefix`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            setting: format!("{prefix}setting"),
            users: format!("{prefix}users"),
            dialogs: format!("{prefix}dialogs"),
            meta: format!("{prefix}cache_meta"),
            backup_prefix: format!("{prefix}backup_"),
        }
    }

    /// Primary key of a data domain.
    pub fn domain(&self, domain: Domain) -> &str {
        match domain {
            Domain::Setting => &self.setting,
            Domain::Users => &self.users,
            Domain::Dialogs => &self.dialogs,
        }
    }

    /// The three primary keys plus metadata.
    pub fn primary(&self) -> [&str; 4] {
        [&self.setting, &self.users, &self.dialogs, &self.meta]
    }

    pub fn backup_key(&self, timestamp_ms: u64) -> String {
        format!("{}{}", self.backup_prefix, timestamp_ms)
    }

    /// Parses the timestamp out of a backup key. `None` for foreign keys.
    pub fn backup_timestamp(&self, key: &str) -> Option<u64> {
        key.strip_prefix(&self.backup_prefix)?.parse().ok()
    }
}

/// Timing and capacity settings for [`CacheService`](crate::CacheService).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub keys: StorageKeys,
    /// Quiet period before a deferred domain write.
    pub save_debounce: Duration,
    /// Quiet period applied to change notifications from the host watcher.
    pub watch_debounce: Duration,
    /// Delay between a wrapped application operation and its write.
    pub bridge_save_delay: Duration,
    /// Delay before a requested page reload.
    pub reload_delay: Duration,
    /// How long a recovery stays "in flight" after it ran.
    pub recovery_cooldown: Duration,
    /// Minimum spacing between two non-forced recovery attempts.
    pub recovery_rate_limit: Duration,
    pub max_recovery_attempts: u32,
    /// Delay before the session-restored notice after an abnormal exit.
    pub abnormal_exit_notice_delay: Duration,
    pub fallback_recovery_delay: Duration,
    pub final_fallback_delay: Duration,
    /// How long a startup recovery waits for the application to register.
    pub app_wait_timeout: Duration,
    pub probe_attempts: u32,
    pub probe_interval: Duration,
    pub backup_retention: usize,
    /// Minimum age of a nominal status before another one may replace it.
    pub status_min_interval: Duration,
    pub notification_lifetime: Duration,
    pub max_notifications: usize,
    pub auto_save_interval: Duration,
    /// Directory holding the emoji images.
    pub emoji_base_path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            save_debounce: Duration::from_millis(2000),
            watch_debounce: Duration::from_millis(1000),
            bridge_save_delay: Duration::from_millis(100),
            reload_delay: Duration::from_millis(2000),
            recovery_cooldown: Duration::from_millis(1000),
            recovery_rate_limit: Duration::from_millis(5000),
            max_recovery_attempts: 3,
            abnormal_exit_notice_delay: Duration::from_millis(2000),
            fallback_recovery_delay: Duration::from_millis(5000),
            final_fallback_delay: Duration::from_millis(3000),
            app_wait_timeout: Duration::from_secs(10),
            probe_attempts: 5,
            probe_interval: Duration::from_millis(100),
            backup_retention: 5,
            status_min_interval: Duration::from_millis(1000),
            notification_lifetime: Duration::from_millis(4500),
            max_notifications: 5,
            auto_save_interval: Duration::from_secs(30),
            emoji_base_path: "./static/app/emoji/".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the persisted key layout.
    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_save_debounce(mut self, debounce: Duration) -> Self {
        self.save_debounce = debounce;
        self
    }

    pub fn with_watch_debounce(mut self, debounce: Duration) -> Self {
        self.watch_debounce = debounce;
        self
    }

    pub fn with_recovery_limits(mut self, rate_limit: Duration, max_attempts: u32) -> Self {
        self.recovery_rate_limit = rate_limit;
        self.max_recovery_attempts = max_attempts;
        self
    }

    pub fn with_backup_retention(mut self, retention: usize) -> Self {
        self.backup_retention = retention;
        self
    }

    pub fn with_max_notifications(mut self, max: usize) -> Self {
        self.max_notifications = max;
        self
    }

    pub fn with_auto_save_interval(mut self, interval: Duration) -> Self {
        self.auto_save_interval = interval;
        self
    }

    pub fn with_app_wait_timeout(mut self, timeout: Duration) -> Self {
        self.app_wait_timeout = timeout;
        self
    }

    pub fn with_emoji_base_path(mut self, path: impl Into<String>) -> Self {
        self.emoji_base_path = path.into();
        self
    }
}
