// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Time source abstraction.
//!
//! All deferred work in the cache is expressed in epoch milliseconds taken
//! from a [`Clock`], so hosts can plug in the browser clock and tests can
//! drive time by hand.

use std::cell::Cell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Blocks the calling context for a short, bounded duration.
    ///
    /// Only used by the immediate-restore path between lookup probes.
    fn pause(&self, duration: Duration);
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Hand-driven clock for tests and simulations.
///
/// `pause` advances the clock instead of sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Creates a clock starting at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        self.advance_ms(millis(duration));
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    /// Jumps to an absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn pause(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Converts a duration to whole milliseconds.
pub fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Formats epoch milliseconds as an RFC 3339 / ISO-8601 UTC stamp.
pub fn iso8601(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats epoch milliseconds as a `YYYY-MM-DD` calendar date (UTC).
pub fn calendar_date(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}
