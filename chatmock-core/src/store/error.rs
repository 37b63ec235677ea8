// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Store error types.

use thiserror::Error;

/// Key/value store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Quota exceeded while writing {key} ({needed} bytes)")]
    QuotaExceeded { key: String, needed: usize },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}
