// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use chatmock_core::clock::millis;
use chatmock_core::Clock;

/// Wall clock backed by `Date.now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    /// Spins until `duration` has passed. The page cannot sleep, so keep
    /// this to the short probe intervals it is used for.
    fn pause(&self, duration: Duration) {
        let until = self.now_ms().saturating_add(millis(duration));
        while self.now_ms() < until {
            std::hint::spin_loop();
        }
    }
}
