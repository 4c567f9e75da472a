/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! wakeplace – wake-time CPU placement for capacity-asymmetric machines
//!
//! The crate answers one question, once per task wakeup: *which CPU
//! should this task run on?*  The answer balances relative load across
//! CPUs of different capacities, takes a fast exit onto an idle CPU when
//! the wakeup pattern allows it, and steers tasks to the performance or
//! efficiency cluster based on their priority classification.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── cpuset/    – allocation-free CPU id sets (u64 bitmask)
//! ├── task/      – Task descriptor and wake-context flags
//! ├── selector/  – CpuSelector: partition, fast idle path, candidate scan
//! ├── wakee/     – WakeeTracker: wide-wake classification state
//! ├── config/    – YAML cluster/band configuration
//! └── snapshot/  – static load snapshots and replayable wake traces
//! ```

pub mod config;
pub mod cpuset;
pub mod selector;
pub mod snapshot;
pub mod task;
pub mod wakee;

pub use cpuset::CpuSet;
pub use selector::{CpuSelector, ForegroundBand};
pub use task::{CpuId, Load, Task, TaskId, WakeFlags};
pub use wakee::WakeeTracker;
