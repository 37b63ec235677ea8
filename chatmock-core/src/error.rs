// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cache error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised inside the persistence layer.
///
/// Public operations convert these into boolean results, a log line and
/// where appropriate a toast, so they never reach the host page.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Application instance not available")]
    AppUnavailable,

    #[error("Application is busy")]
    AppBusy,

    #[error("Invalid import file: {0}")]
    InvalidImport(String),

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Dialog index out of range: {0}")]
    IndexOutOfRange(usize),

    #[error("No user selected")]
    NoSelectedUser,
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
