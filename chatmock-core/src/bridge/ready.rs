// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

/// One-shot readiness signal.
///
/// Waiters queue up until the signal resolves; afterwards a new waiter is
/// handed straight back to run immediately.
#[derive(Debug)]
pub struct ReadySignal<W> {
    resolved: bool,
    waiters: Vec<W>,
}

impl<W> Default for ReadySignal<W> {
    fn default() -> Self {
        Self {
            resolved: false,
            waiters: Vec::new(),
        }
    }
}

impl<W> ReadySignal<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `waiter`, or returns it when the signal already resolved.
    pub fn wait(&mut self, waiter: W) -> Option<W> {
        if self.resolved {
            return Some(waiter);
        }
        self.waiters.push(waiter);
        None
    }

    /// Resolves the signal and hands out every queued waiter in order.
    pub fn resolve(&mut self) -> Vec<W> {
        self.resolved = true;
        std::mem::take(&mut self.waiters)
    }

    /// Keeps only the queued waiters matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&W) -> bool) -> usize {
        let before = self.waiters.len();
        self.waiters.retain(keep);
        before - self.waiters.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}
