/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cluster partitioning: which CPUs are eligible for a task.
//!
//! A capacity-asymmetric machine exposes two CPU clusters — performance
//! and efficiency — and a task's priority adjustment decides which one it
//! should be scanned against.  The [`ForegroundBand`] holds the policy
//! thresholds; [`eligible_cpus`] applies them and guarantees the result is
//! never empty (given a non-empty online set), so the candidate scan
//! downstream is total.
//!
//! The default band is `[0, 225)`: adjustments of 0 up to (excluding) 225
//! count as foreground and route to the performance cluster; everything
//! else — deeply backgrounded tasks *and* the extreme negative "system"
//! values — routes to the efficiency cluster.  The boundaries depend on an
//! external priority convention this crate does not own, so they are
//! configurable rather than baked in.

use thiserror::Error;

use super::ClusterClassifier;
use crate::cpuset::CpuSet;

/// Default lower bound (inclusive) of the foreground band.
pub const DEFAULT_BAND_LOWER: i32 = 0;

/// Default upper bound (exclusive) of the foreground band.
pub const DEFAULT_BAND_UPPER: i32 = 225;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Validation failure for a [`ForegroundBand`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BandError {
    /// The band would be empty: no adjustment value could ever classify
    /// as foreground.
    #[error("empty foreground band: lower {lower} must be strictly below upper {upper}")]
    EmptyBand { lower: i32, upper: i32 },
}

// ── ForegroundBand ────────────────────────────────────────────────────────────

/// The inclusive-exclusive priority-adjustment range that classifies a
/// task as foreground (performance-cluster eligible).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForegroundBand {
    lower: i32,
    upper: i32,
}

impl ForegroundBand {
    /// Build a band covering `[lower, upper)`.
    ///
    /// # Errors
    /// [`BandError::EmptyBand`] when `lower >= upper`.
    pub fn new(lower: i32, upper: i32) -> Result<Self, BandError> {
        if lower >= upper {
            return Err(BandError::EmptyBand { lower, upper });
        }
        Ok(ForegroundBand { lower, upper })
    }

    /// Lower bound (inclusive).
    pub fn lower(self) -> i32 {
        self.lower
    }

    /// Upper bound (exclusive).
    pub fn upper(self) -> i32 {
        self.upper
    }

    /// Whether `adjustment` classifies as foreground.
    pub fn contains(self, adjustment: i32) -> bool {
        adjustment >= self.lower && adjustment < self.upper
    }
}

impl Default for ForegroundBand {
    fn default() -> Self {
        ForegroundBand {
            lower: DEFAULT_BAND_LOWER,
            upper: DEFAULT_BAND_UPPER,
        }
    }
}

// ── Eligible-set derivation ───────────────────────────────────────────────────

/// Derive the eligible CPU set for a task with the given priority
/// adjustment.
///
/// Foreground adjustments select the performance cluster, everything else
/// the efficiency cluster; the selection is intersected with the online
/// set.  If that intersection is empty (a cluster can be fully offline,
/// and the cluster sets' union need not equal the online set) the full
/// online set is used instead, so the result is non-empty whenever the
/// online set is — a precondition owned by the caller.
pub fn eligible_cpus(
    clusters: &dyn ClusterClassifier,
    band: ForegroundBand,
    adjustment: i32,
) -> CpuSet {
    let cluster = if band.contains(adjustment) {
        clusters.performance_set()
    } else {
        clusters.efficiency_set()
    };

    let online = clusters.online();
    let eligible = cluster.and(online);
    if eligible.is_empty() {
        online
    } else {
        eligible
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed cluster layout for partition tests.
    struct Clusters {
        perf: CpuSet,
        eff: CpuSet,
        online: CpuSet,
    }

    impl ClusterClassifier for Clusters {
        fn performance_set(&self) -> CpuSet {
            self.perf
        }
        fn efficiency_set(&self) -> CpuSet {
            self.eff
        }
        fn online(&self) -> CpuSet {
            self.online
        }
    }

    fn big_little() -> Clusters {
        Clusters {
            perf: CpuSet::from_mask(0b1111_0000),   // CPUs 4–7
            eff: CpuSet::from_mask(0b0000_1111),    // CPUs 0–3
            online: CpuSet::from_mask(0b1111_1111), // all online
        }
    }

    // ── ForegroundBand ────────────────────────────────────────────────────────

    #[test]
    fn default_band_matches_policy_constants() {
        let band = ForegroundBand::default();
        assert_eq!(band.lower(), 0);
        assert_eq!(band.upper(), 225);
    }

    #[test]
    fn band_is_inclusive_exclusive() {
        let band = ForegroundBand::default();
        assert!(band.contains(0), "lower bound is inclusive");
        assert!(band.contains(224));
        assert!(!band.contains(225), "upper bound is exclusive");
        assert!(!band.contains(-1));
    }

    #[test]
    fn system_tasks_at_extreme_negative_are_not_foreground() {
        let band = ForegroundBand::default();
        assert!(!band.contains(-1000));
    }

    #[test]
    fn empty_band_is_rejected() {
        assert_eq!(
            ForegroundBand::new(100, 100),
            Err(BandError::EmptyBand {
                lower: 100,
                upper: 100
            })
        );
        assert!(ForegroundBand::new(200, 100).is_err());
    }

    #[test]
    fn custom_band_shifts_the_boundary() {
        let band = ForegroundBand::new(-50, 50).unwrap();
        assert!(band.contains(-50));
        assert!(band.contains(0));
        assert!(!band.contains(50));
    }

    // ── eligible_cpus ─────────────────────────────────────────────────────────

    #[test]
    fn foreground_task_gets_performance_cluster() {
        let clusters = big_little();
        let set = eligible_cpus(&clusters, ForegroundBand::default(), 0);
        assert_eq!(set, clusters.perf);
    }

    #[test]
    fn background_task_gets_efficiency_cluster() {
        let clusters = big_little();
        let set = eligible_cpus(&clusters, ForegroundBand::default(), 900);
        assert_eq!(set, clusters.eff);
    }

    #[test]
    fn negative_system_adjustment_gets_efficiency_cluster() {
        let clusters = big_little();
        let set = eligible_cpus(&clusters, ForegroundBand::default(), -17);
        assert_eq!(set, clusters.eff);
    }

    #[test]
    fn offline_cpus_are_filtered_out() {
        let mut clusters = big_little();
        clusters.online = CpuSet::from_mask(0b0011_0011); // CPUs 0,1,4,5
        let set = eligible_cpus(&clusters, ForegroundBand::default(), 0);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn fully_offline_cluster_falls_back_to_online_set() {
        let mut clusters = big_little();
        clusters.online = CpuSet::from_mask(0b0000_1111); // perf cluster offline
        let set = eligible_cpus(&clusters, ForegroundBand::default(), 0);
        assert_eq!(set, clusters.online);
        assert!(!set.is_empty());
    }

    #[test]
    fn disjoint_cluster_sets_fall_back_to_online_set() {
        // Union of clusters need not equal the online set; here the
        // efficiency cluster is empty altogether.
        let clusters = Clusters {
            perf: CpuSet::from_mask(0b1111_0000),
            eff: CpuSet::EMPTY,
            online: CpuSet::from_mask(0b1111_1111),
        };
        let set = eligible_cpus(&clusters, ForegroundBand::default(), 500);
        assert_eq!(set, clusters.online);
    }
}
