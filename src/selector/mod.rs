/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wake-time runqueue selection.
//!
//! [`CpuSelector`] implements the placement policy: given a task about to
//! run or be woken, pick the CPU that minimises relative load, after a
//! fast idle-CPU shortcut and a priority-driven cluster partition.  One
//! call per wakeup/placement event, on a hot path: the whole decision is
//! a single linear scan with two stack-local candidate slots — no
//! allocation, no blocking, no recursion.
//!
//! The selector owns nothing but the policy.  Load tracking, idle-CPU
//! search, wide-wake classification, and cluster/topology bookkeeping are
//! injected collaborators (see the traits below), which is what makes the
//! decision function testable in isolation.
//!
//! # Decision pipeline
//! ```text
//! select_run_queue(task, prev_cpu, this_cpu, wake, hint)
//!   ├─ eligible_cpus()        – performance or efficiency cluster ∩ online
//!   ├─ fast idle path         – wakeups only: affine idle search, early return
//!   ├─ task-load sync         – fork ⇒ 0, else tracker's decayed estimate
//!   └─ candidate scan         – min projected load, later CPU wins ties
//! ```
//!
//! # Concurrency
//! `select_run_queue` may run on many CPUs at once with no lock held
//! here.  Loads are read unsynchronised and may be stale or mutually
//! inconsistent across the CPUs examined within one call; the policy
//! tolerates that.  Collaborators own whatever synchronisation their own
//! state needs.

pub mod partition;

pub use partition::{eligible_cpus, BandError, ForegroundBand};

use tracing::{debug, trace};

use crate::cpuset::CpuSet;
use crate::task::{CpuId, Load, Task, WakeFlags};

// ── Collaborator interfaces ───────────────────────────────────────────────────

/// Cluster membership and online-CPU bookkeeping, maintained externally.
///
/// The two cluster sets may overlap and their union need not equal the
/// online set; the partition logic copes with both.
pub trait ClusterClassifier {
    /// CPUs classified as the performance cluster.
    fn performance_set(&self) -> CpuSet;
    /// CPUs classified as the efficiency (low-power) cluster.
    fn efficiency_set(&self) -> CpuSet;
    /// Currently online CPUs.  Callers guarantee this is non-empty.
    fn online(&self) -> CpuSet;
}

/// Per-task and per-CPU load estimation, owned by an external tracker.
///
/// The selector only ever reads; the one mutating call ([`sync_task`])
/// asks the tracker to bring the task's decayed estimate up to date and
/// is synchronised by the tracker itself.
///
/// [`sync_task`]: LoadTracker::sync_task
pub trait LoadTracker {
    /// Bring `task`'s load estimate up to date relative to its previous
    /// CPU's clock before [`estimated_load`](Self::estimated_load) is read.
    fn sync_task(&self, task: &Task);
    /// The task's decayed utilisation estimate.
    fn estimated_load(&self, task: &Task) -> Load;
    /// The CPU's current aggregate load.
    fn current_load(&self, cpu: CpuId) -> Load;
    /// Load of the task currently running on `cpu`.  Used to model the
    /// displacement of a synchronous waker.
    fn current_running_task_load(&self, cpu: CpuId) -> Load;
}

/// Classification of a task's wakeup fan-out, with the bookkeeping it
/// depends on.  See [`WakeeTracker`](crate::wakee::WakeeTracker) for the
/// bundled implementation.
pub trait WakeWideClassifier {
    /// Record the wakeup relationship for this event.  Called once per
    /// true wakeup, before [`is_wide`](Self::is_wide).
    fn record_wakee(&self, task: &Task);
    /// Whether this task's wakeups fan out across many CPUs, which
    /// disqualifies the affine fast path.
    fn is_wide(&self, task: &Task, sibling_count_hint: u32) -> bool;
}

/// External search for an idle CPU near the task's previous location.
pub trait IdleAffineSearch {
    /// Look for an idle CPU starting from the waking CPU and the task's
    /// previous CPU, optionally biased by the synchronous-wake hint.
    fn find_idle(&self, from_cpu: CpuId, prev_cpu: CpuId, sync: bool) -> Option<CpuId>;
}

/// External idle-sibling selection, seeded with the affine search's hit.
pub trait IdleSiblingSelector {
    /// Final selection among the seed CPU's idle siblings.
    fn select(&self, task: &Task, prev_cpu: CpuId, seed_cpu: CpuId) -> CpuId;
}

// ── Candidate ─────────────────────────────────────────────────────────────────

/// Scan-local candidate: a CPU and what its load would become if the task
/// ran there.  Exactly two live at once (current best, current probe).
#[derive(Debug, Clone, Copy, Default)]
struct Candidate {
    cpu: CpuId,
    load: Load,
}

// ── CpuSelector ───────────────────────────────────────────────────────────────

/// The wake-time placement policy.
///
/// Stateless apart from the configured [`ForegroundBand`]; all per-call
/// state lives on the stack of [`select_run_queue`](Self::select_run_queue).
pub struct CpuSelector<'a> {
    clusters: &'a dyn ClusterClassifier,
    loads: &'a dyn LoadTracker,
    wake_wide: &'a dyn WakeWideClassifier,
    idle_affine: &'a dyn IdleAffineSearch,
    idle_sibling: &'a dyn IdleSiblingSelector,
    band: ForegroundBand,
}

impl<'a> CpuSelector<'a> {
    /// Wire up a selector with its collaborators and the default
    /// foreground band.
    pub fn new(
        clusters: &'a dyn ClusterClassifier,
        loads: &'a dyn LoadTracker,
        wake_wide: &'a dyn WakeWideClassifier,
        idle_affine: &'a dyn IdleAffineSearch,
        idle_sibling: &'a dyn IdleSiblingSelector,
    ) -> Self {
        Self {
            clusters,
            loads,
            wake_wide,
            idle_affine,
            idle_sibling,
            band: ForegroundBand::default(),
        }
    }

    /// Replace the foreground band (policy thresholds are deployment
    /// convention, not owned here).
    pub fn with_band(mut self, band: ForegroundBand) -> Self {
        self.band = band;
        self
    }

    /// Select the runqueue (CPU) for one placement event.
    ///
    /// * `prev_cpu` — the CPU the task last ran on.
    /// * `this_cpu` — the CPU executing this decision (the waker's CPU).
    /// * `sibling_count_hint` — how many tasks are being woken together.
    ///
    /// Total over any non-empty online set: every input combination
    /// yields a valid member of the scanned eligible set.  On exact
    /// projected-load ties the later-enumerated (higher-id) CPU wins;
    /// callers relying on determinism must account for enumeration order
    /// deciding ties.
    pub fn select_run_queue(
        &self,
        task: &Task,
        prev_cpu: CpuId,
        this_cpu: CpuId,
        wake: WakeFlags,
        sibling_count_hint: u32,
    ) -> CpuId {
        let mut sync = wake.effective_sync();
        let mut want_affine = false;

        // Narrow the scan to the cluster matching the task's priority
        // classification, falling back to the full online set if the
        // cluster is entirely offline.
        let cpus = eligible_cpus(self.clusters, self.band, task.priority_adjustment);

        // Affine idle fast path, wakeups only.
        if wake.wakeup {
            self.wake_wide.record_wakee(task);

            want_affine =
                !self.wake_wide.is_wide(task, sibling_count_hint) && cpus.contains(this_cpu);

            if want_affine {
                if let Some(seed) = self.idle_affine.find_idle(this_cpu, prev_cpu, sync) {
                    let cpu = self.idle_sibling.select(task, prev_cpu, seed);
                    debug!(task = task.id, cpu, seed, "affine idle fast path");
                    return cpu;
                }
            }
        }

        // The scan needs the task's load; sync it up to prev_cpu's last
        // update first.  A forked task has no load history to sync.
        let task_load = if wake.fork {
            0
        } else {
            self.loads.sync_task(task);
            self.loads.estimated_load(task)
        };

        // Invalidate sync wake if the affine path was never considered.
        sync &= want_affine;

        // Find the best CPU to wake the task on.
        //
        // Note: the first iteration must commit to the best slot before
        // the loop can end.  This is what guarantees the returned CPU is
        // valid even when only one CPU is eligible; the
        // `best_idx == curr_idx` short-circuit below does exactly that.
        let mut cands = [Candidate::default(); 2];
        let mut best_idx = 0usize;
        let mut cidx = 0usize;

        for cpu in cpus.iter() {
            // Use the free candidate slot for the probe.
            let curr_idx = cidx;
            let mut load = self.loads.current_load(cpu);

            // Add the task's load to this CPU unless it is the task's own
            // CPU, to see what the CPU's relative load would look like
            // with the task on it.
            if sync {
                if cpu != prev_cpu {
                    load = load.saturating_add(task_load);
                }
                if cpu == this_cpu {
                    // The synchronous waker is about to stop running.
                    load = load.saturating_sub(self.loads.current_running_task_load(this_cpu));
                }
            } else {
                if task.queued && cpu != prev_cpu {
                    load = load.saturating_add(task_load);
                }
                if !task.queued {
                    load = load.saturating_add(task_load);
                }
            }

            cands[curr_idx] = Candidate { cpu, load };

            // Commit the probe whenever it beats or ties the best so far.
            // When both indices name the same slot there is nothing to
            // compare yet, but cidx still has to move to the other slot.
            if best_idx == curr_idx || cands[curr_idx].load <= cands[best_idx].load {
                best_idx = curr_idx;
                cidx ^= 1;
            }
        }

        trace!(
            task = task.id,
            cpu = cands[best_idx].cpu,
            projected = cands[best_idx].load,
            "scan selected CPU"
        );

        cands[best_idx].cpu
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
