/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core data types for wake-time CPU placement.
//!
//! A [`Task`] is the descriptor handed to
//! [`CpuSelector::select_run_queue`](crate::selector::CpuSelector::select_run_queue)
//! once per wakeup/placement event, together with a [`WakeFlags`] value
//! describing the kind of wake.  Both are plain read-only inputs: the
//! selector reads them at call entry and forgets them at return.
//!
//! Load values deliberately do **not** live on `Task`.  They are owned and
//! decayed by the external load tracker and read through the
//! [`LoadTracker`](crate::selector::LoadTracker) collaborator, so a `Task`
//! here is only identity plus placement-relevant classification.

/// CPU identifier.  Valid range is 0–63 (see [`CpuSet`](crate::cpuset::CpuSet)).
pub type CpuId = u32;

/// Task identifier, unique within the tracked workload.
pub type TaskId = u64;

/// Decayed, non-negative scalar utilisation estimate for a task or CPU.
///
/// All projection arithmetic on `Load` is saturating — a projected load
/// can never underflow below zero.
pub type Load = u64;

// ── Task ──────────────────────────────────────────────────────────────────────

/// Descriptor for one schedulable unit of work awaiting placement.
#[derive(Debug, Clone, Default)]
pub struct Task {
    /// Unique task id.  Keys the wakee tracker and the load tracker.
    pub id: TaskId,

    /// Normalised importance value on a fixed scale; lower means more
    /// foreground/interactive.  Which band of this scale selects the
    /// performance cluster is policy, configured via
    /// [`ForegroundBand`](crate::selector::ForegroundBand).
    pub priority_adjustment: i32,

    /// Whether the task is currently enqueued on a runqueue, or is the
    /// CPU's currently-running task.  Affects how its own load is
    /// projected (an enqueued task's previous CPU already accounts for it).
    pub queued: bool,

    /// Id of the task performing this wakeup, when known.  Feeds the
    /// wakee-relationship bookkeeping in
    /// [`WakeeTracker`](crate::wakee::WakeeTracker); `None` for forks and
    /// re-evaluations where there is no distinct waker.
    pub waker: Option<TaskId>,
}

// ── Wake context ──────────────────────────────────────────────────────────────

/// Flags describing the context of one wake/placement event.
///
/// A placement decision is requested in three situations — a true wakeup,
/// a fork of a new task, and a re-evaluation of an already-running task —
/// and the flags distinguish them:
///
/// | Event | `wakeup` | `fork` |
/// |---|---|---|
/// | true wakeup | `true` | `false` |
/// | new task (fork) | `false` | `true` |
/// | re-evaluation | `false` | `false` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeFlags {
    /// This is a true wakeup (balance-on-wake), as opposed to a fork or a
    /// re-evaluation.  Gates the fast idle path.
    pub wakeup: bool,

    /// The task is brand new — it has no load history yet, so its load
    /// contribution to projection is zero.
    pub fork: bool,

    /// The waker expects to block immediately after this wakeup, making
    /// it attractive to place the wakee on the waking CPU.
    pub sync: bool,

    /// The waker is exiting.  An exiting waker will not block-and-yield,
    /// so it cancels the `sync` hint.
    pub waker_exiting: bool,
}

impl WakeFlags {
    /// Flags for a true wakeup.
    pub fn wakeup() -> Self {
        WakeFlags {
            wakeup: true,
            ..Default::default()
        }
    }

    /// Flags for a new-task (fork) placement.
    pub fn fork() -> Self {
        WakeFlags {
            fork: true,
            ..Default::default()
        }
    }

    /// Flags for a synchronous wakeup.
    pub fn sync_wakeup() -> Self {
        WakeFlags {
            wakeup: true,
            sync: true,
            ..Default::default()
        }
    }

    /// The effective synchronous-wake hint: `sync` holds only while the
    /// waker is not exiting.
    pub fn effective_sync(self) -> bool {
        self.sync && !self.waker_exiting
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_task_is_unqueued_with_no_waker() {
        let task = Task::default();
        assert!(!task.queued);
        assert_eq!(task.waker, None);
        assert_eq!(task.priority_adjustment, 0);
    }

    #[test]
    fn wakeup_constructor_sets_only_wakeup() {
        let flags = WakeFlags::wakeup();
        assert!(flags.wakeup);
        assert!(!flags.fork);
        assert!(!flags.sync);
        assert!(!flags.waker_exiting);
    }

    #[test]
    fn fork_constructor_sets_only_fork() {
        let flags = WakeFlags::fork();
        assert!(flags.fork);
        assert!(!flags.wakeup);
    }

    #[test]
    fn effective_sync_requires_live_waker() {
        let mut flags = WakeFlags::sync_wakeup();
        assert!(flags.effective_sync());

        flags.waker_exiting = true;
        assert!(!flags.effective_sync(), "exiting waker cancels sync");
    }

    #[test]
    fn effective_sync_is_false_without_sync_hint() {
        assert!(!WakeFlags::wakeup().effective_sync());
    }
}
