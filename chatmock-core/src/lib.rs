// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chatmock Core Library
//!
//! Local persistence and crash recovery for the chat mockup editor.
//! Conversation state (settings, users, dialogs) is mirrored into a
//! string key/value store, backed up on demand, exported and imported as
//! JSON, and pushed back into the live editor after reloads and crashes.

pub mod backup;
pub mod bridge;
pub mod clock;
pub mod codec;
pub mod config;
pub mod emoji;
pub mod error;
pub mod events;
pub mod meta;
pub mod migration;
pub mod model;
pub mod recovery;
pub mod report;
pub mod service;
pub mod store;

// Internal scheduling primitive, exposed for integration tests only
#[cfg(feature = "testing")]
pub mod timer;
#[cfg(not(feature = "testing"))]
mod timer;

pub use backup::{BackupEntry, BackupSnapshot, RestoreReport};
pub use bridge::{AppHandle, AppLocator, ChatApp, ConfirmPrompt, MemoryApp};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, StorageKeys};
pub use error::{CacheError, CacheResult};
pub use events::{CacheEvent, CallbackHandler, EventDispatcher, EventHandler};
pub use meta::CacheMeta;
pub use migration::SCHEMA_VERSION;
pub use model::{
    Dialog, DialogKind, Domain, EntityId, ExportFile, PersistedState, Settings, User,
    BLOCKED_NOTICE,
};
pub use recovery::{RecoveryPhase, RecoveryRejection, RecoverySource};
pub use report::{NotificationKind, Status};
pub use service::{CacheService, CacheStats, ImportReport};
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use store::{KvStore, MemoryStore, StoreError};
