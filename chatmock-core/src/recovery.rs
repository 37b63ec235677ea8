// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recovery Coordinator
//!
//! Recovery is requested from several uncoordinated places (startup check,
//! application registration, import, two fallback timers). The coordinator
//! is the single choke point deciding whether a request may apply persisted
//! data to the live application.
//!
//! Phases: `Idle -> Checking -> Recovering -> (Recovered | Failed)`, then
//! back to `Idle` once the cooldown elapses. Everything outside `Idle`
//! counts as "in flight".

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::millis;

/// Where a recovery request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoverySource {
    /// Startup after the previous session ended abnormally.
    CrashRecovery,
    /// Startup after a normal exit.
    AutoRestore,
    /// Startup with an import that was never applied.
    ImportRecovery,
    /// First safety net after page load.
    FallbackRecovery,
    /// Last safety net when the application was still missing.
    FinalFallbackRecovery,
}

impl RecoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoverySource::CrashRecovery => "crash-recovery",
            RecoverySource::AutoRestore => "auto-restore",
            RecoverySource::ImportRecovery => "import-recovery",
            RecoverySource::FallbackRecovery => "fallback-recovery",
            RecoverySource::FinalFallbackRecovery => "final-fallback-recovery",
        }
    }

    /// Toast shown after a successful recovery from this source.
    ///
    /// Crash recovery is silent here; the session-restored notice is raised
    /// separately by the caller.
    pub fn notification(&self) -> Option<&'static str> {
        match self {
            RecoverySource::CrashRecovery => None,
            RecoverySource::AutoRestore => Some("缓存数据已恢复到应用！"),
            RecoverySource::ImportRecovery => Some("导入的数据已恢复到应用！"),
            RecoverySource::FallbackRecovery => Some("已通过保险机制恢复缓存数据"),
            RecoverySource::FinalFallbackRecovery => Some("已通过最终保险机制恢复缓存数据"),
        }
    }
}

impl fmt::Display for RecoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovery lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    Idle,
    Checking,
    Recovering,
    Recovered,
    Failed,
}

/// Inputs that move the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTransition {
    Check,
    /// Forced check, allowed while a previous attempt is cooling down.
    ForceCheck,
    Reject,
    Apply,
    Succeed,
    Fail,
    CooldownElapsed,
}

impl RecoveryPhase {
    /// Transition table. `None` for transitions that are not allowed.
    pub fn next(self, transition: RecoveryTransition) -> Option<RecoveryPhase> {
        use RecoveryPhase::*;
        use RecoveryTransition::*;
        match (self, transition) {
            (Idle, Check) => Some(Checking),
            (Idle | Recovered | Failed, ForceCheck) => Some(Checking),
            (Checking, Reject) => Some(Idle),
            (Checking, Apply) => Some(Recovering),
            (Recovering, Succeed) => Some(Recovered),
            (Recovering, Fail) => Some(Failed),
            (Recovered | Failed, CooldownElapsed) => Some(Idle),
            _ => None,
        }
    }

    pub fn in_flight(self) -> bool {
        self != RecoveryPhase::Idle
    }
}

/// Why a recovery request was turned down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryRejection {
    #[error("a recovery is already in flight")]
    InFlight,

    #[error("data was already recovered during this page lifetime")]
    AlreadyRecovered,

    #[error("rate limited, {remaining_ms} ms remaining")]
    RateLimited { remaining_ms: u64 },

    #[error("attempt limit of {0} reached")]
    AttemptsExhausted(u32),

    #[error("no valid persisted data")]
    NoData,
}

/// Ticket for an attempt that passed the guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryAttempt {
    pub source: RecoverySource,
    pub forced: bool,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Identifies the cooldown belonging to this attempt.
    pub generation: u64,
}

/// In-memory recovery state for one page lifetime.
#[derive(Debug)]
pub struct RecoveryCoordinator {
    phase: RecoveryPhase,
    has_recovered: bool,
    attempts: u32,
    max_attempts: u32,
    last_attempt_ms: Option<u64>,
    rate_limit_ms: u64,
    generation: u64,
}

impl RecoveryCoordinator {
    pub fn new(max_attempts: u32, rate_limit: Duration) -> Self {
        Self {
            phase: RecoveryPhase::Idle,
            has_recovered: false,
            attempts: 0,
            max_attempts,
            last_attempt_ms: None,
            rate_limit_ms: millis(rate_limit),
            generation: 0,
        }
    }

    pub fn phase(&self) -> RecoveryPhase {
        self.phase
    }

    pub fn is_recovering(&self) -> bool {
        self.phase.in_flight()
    }

    pub fn has_recovered(&self) -> bool {
        self.has_recovered
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn last_attempt_ms(&self) -> Option<u64> {
        self.last_attempt_ms
    }

    fn transition(&mut self, transition: RecoveryTransition) -> bool {
        match self.phase.next(transition) {
            Some(next) => {
                debug!(from = ?self.phase, to = ?next, "recovery phase");
                self.phase = next;
                true
            }
            None => {
                warn!(phase = ?self.phase, ?transition, "invalid recovery transition");
                false
            }
        }
    }

    /// Runs the guard sequence. On success the attempt is counted and the
    /// coordinator is left in `Recovering` until [`complete`](Self::complete).
    ///
    /// `has_data` is only evaluated when every cheaper guard passed. `force`
    /// bypasses all guards.
    pub fn begin(
        &mut self,
        source: RecoverySource,
        force: bool,
        now_ms: u64,
        has_data: impl FnOnce() -> bool,
    ) -> Result<RecoveryAttempt, RecoveryRejection> {
        if !force && self.phase.in_flight() {
            return Err(RecoveryRejection::InFlight);
        }
        let entry = if force {
            RecoveryTransition::ForceCheck
        } else {
            RecoveryTransition::Check
        };
        if !self.transition(entry) {
            return Err(RecoveryRejection::InFlight);
        }

        if !force {
            if let Err(rejection) = self.check_guards(now_ms, has_data) {
                self.transition(RecoveryTransition::Reject);
                debug!(source = source.as_str(), %rejection, "recovery rejected");
                return Err(rejection);
            }
        }

        self.transition(RecoveryTransition::Apply);
        self.attempts += 1;
        self.last_attempt_ms = Some(now_ms);
        self.generation += 1;
        Ok(RecoveryAttempt {
            source,
            forced: force,
            attempt: self.attempts,
            generation: self.generation,
        })
    }

    fn check_guards(
        &self,
        now_ms: u64,
        has_data: impl FnOnce() -> bool,
    ) -> Result<(), RecoveryRejection> {
        if self.has_recovered {
            return Err(RecoveryRejection::AlreadyRecovered);
        }
        if let Some(last) = self.last_attempt_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < self.rate_limit_ms {
                return Err(RecoveryRejection::RateLimited {
                    remaining_ms: self.rate_limit_ms - elapsed,
                });
            }
        }
        if self.attempts >= self.max_attempts {
            return Err(RecoveryRejection::AttemptsExhausted(self.max_attempts));
        }
        if !has_data() {
            return Err(RecoveryRejection::NoData);
        }
        Ok(())
    }

    /// Records the outcome of the running attempt and returns the
    /// generation its cooldown must carry.
    pub fn complete(&mut self, applied: bool) -> u64 {
        if applied {
            self.has_recovered = true;
            self.transition(RecoveryTransition::Succeed);
        } else {
            self.transition(RecoveryTransition::Fail);
        }
        self.generation
    }

    /// Ends the cooldown of `generation`. Stale generations are ignored so a
    /// forced attempt during a cooldown keeps its own full cooldown.
    pub fn finish_cooldown(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.transition(RecoveryTransition::CooldownElapsed)
    }

    /// Marks data as recovered by a path that bypasses the guards.
    pub fn mark_recovered(&mut self) {
        self.has_recovered = true;
    }
}
