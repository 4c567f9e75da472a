/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Static load snapshots and wake traces.
//!
//! [`LoadSnapshot`] is a frozen picture of the machine — per-CPU loads,
//! per-task load estimates, and each CPU's currently-running task load —
//! that implements the selector's collaborator traits.  The live system
//! feeds the selector from a decaying load tracker; the replay binary and
//! the test-suite feed it from one of these snapshots instead, so a
//! placement decision can be reproduced exactly from a YAML file.
//!
//! [`WakeTrace`] is the YAML form: a snapshot plus a list of task
//! descriptors and wake events to replay through
//! [`CpuSelector`](crate::selector::CpuSelector).
//!
//! ```yaml
//! cpu_loads: { 0: 100, 1: 90, 2: 90 }
//! running_loads: { 0: 60 }
//! tasks:
//!   - id: 7
//!     load: 10
//!     priority_adjustment: 0
//!     queued: true
//!     prev_cpu: 1
//! events:
//!   - task: 7
//!     this_cpu: 0
//!     kind: wakeup
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::selector::{IdleAffineSearch, IdleSiblingSelector, LoadTracker};
use crate::task::{CpuId, Load, Task, TaskId, WakeFlags};

// ── LoadSnapshot ──────────────────────────────────────────────────────────────

/// A static view of per-CPU and per-task loads.
///
/// Missing entries read as zero, matching an idle CPU / an untracked
/// task.  `BTreeMap` keeps debug output and iteration deterministic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadSnapshot {
    /// Aggregate load per CPU.
    #[serde(default)]
    pub cpu_loads: BTreeMap<CpuId, Load>,

    /// Decayed load estimate per task.
    #[serde(default)]
    pub task_loads: BTreeMap<TaskId, Load>,

    /// Load of the task currently running on each CPU.
    #[serde(default)]
    pub running_loads: BTreeMap<CpuId, Load>,
}

impl LoadSnapshot {
    /// A CPU is idle when its aggregate load reads zero.
    pub fn is_idle(&self, cpu: CpuId) -> bool {
        self.cpu_loads.get(&cpu).copied().unwrap_or(0) == 0
    }
}

impl LoadTracker for LoadSnapshot {
    /// Snapshots are already as fresh as they will ever be.
    fn sync_task(&self, _task: &Task) {}

    fn estimated_load(&self, task: &Task) -> Load {
        self.task_loads.get(&task.id).copied().unwrap_or(0)
    }

    fn current_load(&self, cpu: CpuId) -> Load {
        self.cpu_loads.get(&cpu).copied().unwrap_or(0)
    }

    fn current_running_task_load(&self, cpu: CpuId) -> Load {
        self.running_loads.get(&cpu).copied().unwrap_or(0)
    }
}

impl IdleAffineSearch for LoadSnapshot {
    /// Prefer the waking CPU on a synchronous wake (the waker is about to
    /// leave it), otherwise the task's previous CPU, when idle.
    fn find_idle(&self, from_cpu: CpuId, prev_cpu: CpuId, sync: bool) -> Option<CpuId> {
        if sync && self.is_idle(from_cpu) {
            return Some(from_cpu);
        }
        if self.is_idle(prev_cpu) {
            return Some(prev_cpu);
        }
        None
    }
}

impl IdleSiblingSelector for LoadSnapshot {
    /// A snapshot has no sibling topology; the seed stands.
    fn select(&self, _task: &Task, _prev_cpu: CpuId, seed_cpu: CpuId) -> CpuId {
        seed_cpu
    }
}

// ── Wake traces ───────────────────────────────────────────────────────────────

/// Task descriptor as it appears in a trace file.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceTask {
    pub id: TaskId,
    /// Decayed load estimate; merged into the snapshot's `task_loads`.
    #[serde(default)]
    pub load: Load,
    #[serde(default)]
    pub priority_adjustment: i32,
    #[serde(default)]
    pub queued: bool,
    #[serde(default)]
    pub prev_cpu: CpuId,
    #[serde(default)]
    pub waker: Option<TaskId>,
}

impl TraceTask {
    /// Build the selector-facing [`Task`] descriptor.
    pub fn to_task(&self) -> Task {
        Task {
            id: self.id,
            priority_adjustment: self.priority_adjustment,
            queued: self.queued,
            waker: self.waker,
        }
    }
}

/// The kind of wake event being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventKind {
    /// True wakeup.
    Wakeup,
    /// True wakeup with the synchronous hint set.
    SyncWakeup,
    /// New-task placement.
    Fork,
    /// Re-evaluation of an already-running task.
    Requeue,
}

impl TraceEventKind {
    /// The wake-context flags this event kind stands for.
    pub fn flags(self) -> WakeFlags {
        match self {
            TraceEventKind::Wakeup => WakeFlags::wakeup(),
            TraceEventKind::SyncWakeup => WakeFlags::sync_wakeup(),
            TraceEventKind::Fork => WakeFlags::fork(),
            TraceEventKind::Requeue => WakeFlags::default(),
        }
    }
}

/// One placement decision to replay.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceEvent {
    /// Id of the task being placed; must match a [`TraceTask`].
    pub task: TaskId,
    /// The CPU making the decision (the waker's CPU).
    pub this_cpu: CpuId,
    pub kind: TraceEventKind,
    #[serde(default = "default_sibling_count_hint")]
    pub sibling_count_hint: u32,
}

fn default_sibling_count_hint() -> u32 {
    1
}

/// A full replayable trace: snapshot + tasks + events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WakeTrace {
    #[serde(flatten)]
    pub snapshot: LoadSnapshot,
    #[serde(default)]
    pub tasks: Vec<TraceTask>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

impl WakeTrace {
    /// Parse a wake trace from YAML.
    ///
    /// Per-task `load` values are folded into the snapshot's `task_loads`
    /// so the snapshot alone answers every load query during replay.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is
    /// structurally invalid, or an event references an undeclared task.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading wake trace from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open trace file: {}", path.display()))?;

        let mut trace: WakeTrace = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        for task in &trace.tasks {
            trace.snapshot.task_loads.insert(task.id, task.load);
        }

        for event in &trace.events {
            if trace.find_task(event.task).is_none() {
                anyhow::bail!(
                    "trace event references undeclared task {} in {}",
                    event.task,
                    path.display()
                );
            }
        }

        Ok(trace)
    }

    /// Look up the declared task for an event.
    pub fn find_task(&self, id: TaskId) -> Option<&TraceTask> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn snapshot(loads: &[(CpuId, Load)]) -> LoadSnapshot {
        LoadSnapshot {
            cpu_loads: loads.iter().copied().collect(),
            ..Default::default()
        }
    }

    // ── LoadSnapshot as a collaborator ────────────────────────────────────────

    #[test]
    fn missing_entries_read_as_zero() {
        let snap = LoadSnapshot::default();
        let task = Task {
            id: 1,
            ..Default::default()
        };
        assert_eq!(snap.current_load(9), 0);
        assert_eq!(snap.estimated_load(&task), 0);
        assert_eq!(snap.current_running_task_load(9), 0);
        assert!(snap.is_idle(9));
    }

    #[test]
    fn find_idle_prefers_waking_cpu_on_sync() {
        let snap = snapshot(&[(0, 0), (1, 0), (2, 50)]);
        assert_eq!(snap.find_idle(0, 1, true), Some(0));
        assert_eq!(snap.find_idle(0, 1, false), Some(1), "prev wins without sync");
    }

    #[test]
    fn find_idle_reports_none_when_everything_is_busy() {
        let snap = snapshot(&[(0, 10), (1, 20)]);
        assert_eq!(snap.find_idle(0, 1, true), None);
    }

    #[test]
    fn sibling_selection_returns_the_seed() {
        let snap = snapshot(&[(0, 0)]);
        let task = Task::default();
        assert_eq!(snap.select(&task, 1, 0), 0);
    }

    // ── WakeTrace parsing ─────────────────────────────────────────────────────

    #[test]
    fn load_full_trace() {
        let yaml = r#"
cpu_loads: { 0: 100, 1: 90, 2: 90 }
running_loads: { 0: 60 }
tasks:
  - id: 7
    load: 10
    priority_adjustment: 0
    queued: true
    prev_cpu: 1
events:
  - task: 7
    this_cpu: 0
    kind: wakeup
  - task: 7
    this_cpu: 0
    kind: sync_wakeup
    sibling_count_hint: 2
"#;
        let f = yaml_tempfile(yaml);
        let trace = WakeTrace::load_from_file(f.path()).unwrap();

        assert_eq!(trace.snapshot.cpu_loads[&0], 100);
        assert_eq!(trace.snapshot.running_loads[&0], 60);
        // Task load folded into the snapshot.
        assert_eq!(trace.snapshot.task_loads[&7], 10);

        assert_eq!(trace.events.len(), 2);
        assert_eq!(trace.events[0].kind, TraceEventKind::Wakeup);
        assert_eq!(trace.events[0].sibling_count_hint, 1);
        assert_eq!(trace.events[1].kind, TraceEventKind::SyncWakeup);
        assert_eq!(trace.events[1].sibling_count_hint, 2);
    }

    #[test]
    fn event_for_undeclared_task_is_rejected() {
        let yaml = r#"
tasks:
  - id: 1
events:
  - task: 2
    this_cpu: 0
    kind: wakeup
"#;
        let f = yaml_tempfile(yaml);
        assert!(WakeTrace::load_from_file(f.path()).is_err());
    }

    #[test]
    fn event_kinds_map_to_wake_flags() {
        assert_eq!(TraceEventKind::Wakeup.flags(), WakeFlags::wakeup());
        assert_eq!(TraceEventKind::SyncWakeup.flags(), WakeFlags::sync_wakeup());
        assert_eq!(TraceEventKind::Fork.flags(), WakeFlags::fork());
        assert_eq!(TraceEventKind::Requeue.flags(), WakeFlags::default());
    }

    #[test]
    fn trace_task_converts_to_selector_task() {
        let tt = TraceTask {
            id: 5,
            load: 42,
            priority_adjustment: 300,
            queued: true,
            prev_cpu: 2,
            waker: Some(9),
        };
        let task = tt.to_task();
        assert_eq!(task.id, 5);
        assert_eq!(task.priority_adjustment, 300);
        assert!(task.queued);
        assert_eq!(task.waker, Some(9));
    }

    #[test]
    fn missing_file_returns_error() {
        assert!(WakeTrace::load_from_file(Path::new("/nonexistent/trace.yaml")).is_err());
    }
}
