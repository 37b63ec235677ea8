// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cache status line.
//!
//! A single line of text that falls back to the nominal status after a
//! category-dependent delay. Repeats and bursts of nominal updates are
//! swallowed to avoid flicker.

use std::fmt;
use std::time::Duration;

use tracing::trace;

use crate::clock::millis;
use crate::timer::TimerId;

/// Known status texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Initializing,
    Nominal,
    Saving,
    Saved,
    AllSaved,
    AutoSaved,
    ManualSaved,
    PageSwitchSaved,
    Restored,
    SessionRestored,
    Imported,
    Exported,
    BackupCreated,
    Cleared,
    DialogsCleared,
    Enhanced,
}

impl Status {
    pub fn text(&self) -> &str {
        match self {
            Status::Initializing => "初始化中...",
            Status::Nominal => "缓存正常",
            Status::Saving => "保存中...",
            Status::Saved => "已保存",
            Status::AllSaved => "全部保存完成",
            Status::AutoSaved => "自动保存完成",
            Status::ManualSaved => "手动保存完成",
            Status::PageSwitchSaved => "页面切换保存",
            Status::Restored => "数据已恢复",
            Status::SessionRestored => "已恢复上次会话",
            Status::Imported => "数据已导入",
            Status::Exported => "数据已导出",
            Status::BackupCreated => "备份已创建",
            Status::Cleared => "缓存已清空",
            Status::DialogsCleared => "对话已清空",
            Status::Enhanced => "缓存增强已启用",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// How long `text` stays before reverting to the nominal status.
///
/// Outcomes (done, success, failure, error) stay 5 s. Nominal and
/// in-progress texts stay 2 s. Everything else stays 3 s.
pub fn revert_delay(text: &str) -> Duration {
    let mut delay = 3000;
    if ["完成", "成功", "失败", "错误"]
        .iter()
        .any(|marker| text.contains(marker))
    {
        delay = 5000;
    }
    if text.contains("正常") || text.contains("中...") {
        delay = 2000;
    }
    Duration::from_millis(delay)
}

/// The visible status line and its single pending revert timer.
#[derive(Debug)]
pub struct StatusLine {
    current: String,
    last_change_ms: Option<u64>,
    min_interval_ms: u64,
    revert_timer: Option<TimerId>,
}

impl StatusLine {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            current: Status::Initializing.text().to_string(),
            last_change_ms: None,
            min_interval_ms: millis(min_interval),
            revert_timer: None,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Applies `text`. Returns the revert delay when the update is accepted.
    ///
    /// Rejected when `text` is already shown, or when it is the nominal
    /// status and the last change happened less than the minimum interval
    /// ago. The caller cancels the previous revert timer on acceptance.
    pub fn update(&mut self, text: &str, now_ms: u64) -> Option<Duration> {
        if self.current == text {
            trace!(status = text, "status unchanged, ignored");
            return None;
        }
        let nominal = Status::Nominal.text();
        if text == nominal {
            if let Some(last) = self.last_change_ms {
                if now_ms.saturating_sub(last) < self.min_interval_ms {
                    trace!(status = text, "nominal status too soon, ignored");
                    return None;
                }
            }
        }
        self.current = text.to_string();
        self.last_change_ms = Some(now_ms);
        Some(revert_delay(text))
    }

    /// Falls back to the nominal status if `text` is still shown.
    pub fn revert(&mut self, text: &str) -> bool {
        if self.current != text {
            return false;
        }
        self.current = Status::Nominal.text().to_string();
        true
    }

    pub fn take_revert_timer(&mut self) -> Option<TimerId> {
        self.revert_timer.take()
    }

    pub fn set_revert_timer(&mut self, id: TimerId) {
        self.revert_timer = Some(id);
    }
}
