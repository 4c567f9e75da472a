/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-width CPU id sets.
//!
//! [`CpuSet`] is a `u64` bitmask — bit N set means CPU N is a member.  The
//! selection hot path iterates, intersects, and tests membership on these
//! sets without ever allocating, which is what keeps
//! [`select_run_queue`](crate::selector::CpuSelector::select_run_queue)
//! constant-time and heap-free.
//!
//! Iteration order is ascending CPU id.  This is load-bearing: the
//! candidate scan's tie-break ("last write wins on ≤") is defined in terms
//! of enumeration order, so the order must be fixed and documented.
//!
//! CPU ids 0–63 are supported.  Inserting a larger id is a no-op; systems
//! with more than 64 CPUs are out of scope for this policy.

use crate::task::CpuId;

/// A set of CPU ids backed by a single `u64` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSet(u64);

impl CpuSet {
    /// The empty set.
    pub const EMPTY: CpuSet = CpuSet(0);

    /// Build a set directly from a bitmask (bit N = CPU N).
    pub const fn from_mask(mask: u64) -> Self {
        CpuSet(mask)
    }

    /// The raw bitmask.
    pub const fn mask(self) -> u64 {
        self.0
    }

    /// Insert a CPU id.  Ids ≥ 64 are ignored.
    pub fn insert(&mut self, cpu: CpuId) {
        if cpu < 64 {
            self.0 |= 1u64 << cpu;
        }
    }

    /// Membership test.
    pub fn contains(self, cpu: CpuId) -> bool {
        cpu < 64 && (self.0 >> cpu) & 1 == 1
    }

    /// Set intersection.
    pub fn and(self, other: CpuSet) -> CpuSet {
        CpuSet(self.0 & other.0)
    }

    /// Set union.
    pub fn or(self, other: CpuSet) -> CpuSet {
        CpuSet(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of member CPUs.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate member CPU ids in ascending order.
    pub fn iter(self) -> CpuIter {
        CpuIter(self.0)
    }
}

impl FromIterator<CpuId> for CpuSet {
    fn from_iter<T: IntoIterator<Item = CpuId>>(iter: T) -> Self {
        let mut set = CpuSet::EMPTY;
        for cpu in iter {
            set.insert(cpu);
        }
        set
    }
}

impl IntoIterator for CpuSet {
    type Item = CpuId;
    type IntoIter = CpuIter;

    fn into_iter(self) -> CpuIter {
        self.iter()
    }
}

/// Ascending-id iterator over a [`CpuSet`].
///
/// Peels the lowest set bit off a copy of the mask on each step, so the
/// iterator is a single `u64` — no allocation, O(members) total work.
#[derive(Debug, Clone)]
pub struct CpuIter(u64);

impl Iterator for CpuIter {
    type Item = CpuId;

    fn next(&mut self) -> Option<CpuId> {
        if self.0 == 0 {
            return None;
        }
        let cpu = self.0.trailing_zeros();
        self.0 &= self.0 - 1; // clear lowest set bit
        Some(cpu)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_no_members() {
        let set = CpuSet::EMPTY;
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.iter().count(), 0);
        assert!(!set.contains(0));
    }

    #[test]
    fn insert_and_contains() {
        let mut set = CpuSet::EMPTY;
        set.insert(0);
        set.insert(5);
        set.insert(63);
        assert!(set.contains(0));
        assert!(set.contains(5));
        assert!(set.contains(63));
        assert!(!set.contains(1));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn insert_out_of_range_is_ignored() {
        let mut set = CpuSet::EMPTY;
        set.insert(64);
        set.insert(1000);
        assert!(set.is_empty());
        assert!(!set.contains(64));
    }

    #[test]
    fn iteration_is_ascending() {
        let set: CpuSet = [7, 2, 5, 0].into_iter().collect();
        let order: Vec<CpuId> = set.iter().collect();
        assert_eq!(order, vec![0, 2, 5, 7]);
    }

    #[test]
    fn intersection_matches_bitwise_and() {
        let a: CpuSet = [0, 1, 2, 3].into_iter().collect();
        let b: CpuSet = [2, 3, 4, 5].into_iter().collect();
        let both = a.and(b);
        assert_eq!(both.iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn union_combines_members() {
        let a: CpuSet = [0, 1].into_iter().collect();
        let b: CpuSet = [4].into_iter().collect();
        assert_eq!(a.or(b).iter().collect::<Vec<_>>(), vec![0, 1, 4]);
    }

    #[test]
    fn from_mask_round_trips() {
        let set = CpuSet::from_mask(0b1100);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(set.mask(), 0b1100);
    }

    #[test]
    fn singleton_set_yields_exactly_one_cpu() {
        let set = CpuSet::from_mask(1 << 5);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![5]);
    }
}
