/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wakee-relationship tracking and wide-wake classification.
//!
//! [`WakeeTracker`] is the bundled implementation of
//! [`WakeWideClassifier`](crate::selector::WakeWideClassifier).  It keeps
//! one flip counter per task: every time a waker switches to a *different*
//! wakee partner the waker's counter bumps, and the counters decay by
//! halving once per elapsed decay window.  A wakeup is classified "wide"
//! when both sides of the relationship have churned through enough
//! distinct partners — the waker flipping often (a master fanning out to
//! many wakees) *and* the wakee itself flipping proportionally more — in
//! which case pulling the wakee next to the waker would just drag it
//! around the machine and the affine shortcut is disqualified.
//!
//! A large enough wake group is wide on its own: when the caller's
//! sibling-count hint reaches the fan-out factor the wakeup is classified
//! wide immediately, before any per-task history accumulates.
//!
//! This state is process-wide and mutable in the source system; here it
//! is an explicit collaborator with an internal mutex, injected into the
//! selector, so it can be unit-tested in isolation from placement.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::selector::WakeWideClassifier;
use crate::task::{Task, TaskId};

/// Default fan-out factor: how many distinct partners a relationship must
/// churn through per decay window before it counts as wide.  Roughly the
/// size of one cache domain.
pub const DEFAULT_FANOUT_FACTOR: u32 = 4;

/// Default flip-counter decay window.
pub const DEFAULT_DECAY_WINDOW: Duration = Duration::from_secs(1);

// ── Per-task history ──────────────────────────────────────────────────────────

#[derive(Debug)]
struct WakeeHistory {
    /// The partner recorded by the most recent wakeup.
    last_wakee: TaskId,
    /// Distinct-partner switches since tracking began, decayed over time.
    flips: u32,
    /// When `flips` was last decayed.
    decayed_at: Instant,
}

impl WakeeHistory {
    fn new(wakee: TaskId, now: Instant) -> Self {
        WakeeHistory {
            last_wakee: wakee,
            flips: 0,
            decayed_at: now,
        }
    }

    /// Halve `flips` once per decay window elapsed since the last decay.
    fn decay(&mut self, now: Instant, window: Duration) {
        let elapsed = now.duration_since(self.decayed_at);
        if elapsed < window {
            return;
        }
        let halvings = (elapsed.as_nanos() / window.as_nanos().max(1)).min(31) as u32;
        self.flips >>= halvings;
        self.decayed_at = now;
    }
}

// ── WakeeTracker ──────────────────────────────────────────────────────────────

/// Stateful wide-wake classifier keyed by task id.
///
/// Thread safety: all state sits behind one internal [`Mutex`], so the
/// tracker is `Send + Sync` and can be shared by selectors running on
/// many CPUs.  The critical sections are two map lookups and a handful of
/// integer operations.
pub struct WakeeTracker {
    histories: Mutex<HashMap<TaskId, WakeeHistory>>,
    fanout_factor: u32,
    decay_window: Duration,
}

impl WakeeTracker {
    /// Tracker with the default fan-out factor and decay window.
    pub fn new() -> Self {
        Self::with_factor(DEFAULT_FANOUT_FACTOR)
    }

    /// Tracker with a custom fan-out factor (e.g. matching the machine's
    /// cache-domain size).
    pub fn with_factor(fanout_factor: u32) -> Self {
        WakeeTracker {
            histories: Mutex::new(HashMap::new()),
            fanout_factor: fanout_factor.max(1),
            decay_window: DEFAULT_DECAY_WINDOW,
        }
    }

    /// Override the decay window.  Mainly for tests, which cannot wait a
    /// full second for a halving.
    pub fn with_decay_window(mut self, window: Duration) -> Self {
        self.decay_window = window;
        self
    }

    /// Drop a task's history (task exit).  Absent entries are fine — a
    /// task that never woke anyone has nothing to forget.
    pub fn forget(&self, task_id: TaskId) {
        self.histories.lock().unwrap().remove(&task_id);
    }

    /// Current flip count for a task, zero if untracked.
    fn flips(&self, map: &HashMap<TaskId, WakeeHistory>, task_id: TaskId) -> u32 {
        map.get(&task_id).map(|h| h.flips).unwrap_or(0)
    }
}

impl Default for WakeeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WakeWideClassifier for WakeeTracker {
    /// Record that `task.waker` woke `task`.  Bumps the waker's flip
    /// counter when the partner changed since the waker's last wakeup.
    /// Wakes with no distinct waker (forks, re-evaluations) record
    /// nothing.
    fn record_wakee(&self, task: &Task) {
        let Some(waker) = task.waker else {
            return;
        };

        let now = Instant::now();
        let mut map = self.histories.lock().unwrap();
        let history = map
            .entry(waker)
            .or_insert_with(|| WakeeHistory::new(task.id, now));

        history.decay(now, self.decay_window);

        if history.last_wakee != task.id {
            history.last_wakee = task.id;
            history.flips = history.flips.saturating_add(1);
        }
    }

    /// Master/slave fan-out comparison between the waker's and the
    /// wakee's flip counters.
    ///
    /// A wake group of `fanout_factor` or more siblings is wide outright,
    /// with no history required.  Below that, the relationship is wide
    /// when the smaller counter has reached the factor and the larger one
    /// has outgrown it by another factor.  Either side may be the
    /// "master" — the comparison is symmetric in that the larger counter
    /// is always measured against the smaller.
    fn is_wide(&self, task: &Task, sibling_count_hint: u32) -> bool {
        let factor = self.fanout_factor;

        if sibling_count_hint >= factor {
            trace!(task = task.id, sibling_count_hint, factor, "wide wake group");
            return true;
        }

        let map = self.histories.lock().unwrap();

        let mut master = task.waker.map(|w| self.flips(&map, w)).unwrap_or(0);
        let mut slave = self.flips(&map, task.id);
        if master < slave {
            std::mem::swap(&mut master, &mut slave);
        }

        let wide = slave >= factor && master >= slave.saturating_mul(factor);
        if wide {
            trace!(task = task.id, master, slave, factor, "wide wakeup");
        }
        wide
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
