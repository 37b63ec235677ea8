// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Notification/Status Reporter
//!
//! User-visible feedback: a self-reverting status line and a capped queue of
//! auto-expiring toasts. Timers live in the service; these types only hold
//! the state and the rules.

mod status;
mod toast;

pub use status::{revert_delay, Status, StatusLine};
pub use toast::{Dismissal, Notification, NotificationCenter, NotificationKind};
