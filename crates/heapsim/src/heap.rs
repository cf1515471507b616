//! Region grid
//!
//! The heap is a fixed-length sequence of [`Region`] records. The helpers in
//! this module are pure: they return new regions or index lists and leave the
//! decision to commit a change to the collector that asked for it.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::ops::{Index, IndexMut};

/// Role of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionKind {
    /// Unallocated
    Free,
    /// Newly allocated young region
    Eden,
    /// Young region that survived at least one collection
    Survivor,
    /// Long-lived region
    Old,
    /// One oversized allocation occupying a whole region
    Humongous,
    /// Page holding data in the concurrent collector
    ActivePage,
    /// Page selected for concurrent relocation
    RelocatingPage,
}

impl RegionKind {
    /// Young generation kinds (Eden + Survivor)
    pub const YOUNG: [RegionKind; 2] = [RegionKind::Eden, RegionKind::Survivor];

    /// Check if this kind belongs to the young generation
    pub fn is_young(self) -> bool {
        matches!(self, RegionKind::Eden | RegionKind::Survivor)
    }
}

/// One slot of the simulated heap
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Stable identity, equal to the grid index
    pub id: usize,
    /// Current role
    #[serde(rename = "type")]
    pub kind: RegionKind,
    /// Occupied fraction of the region's capacity (0-100)
    pub used_percentage: f64,
    /// Fraction of the occupied data still reachable (0-100)
    pub liveness_percentage: f64,
    /// Collections survived
    pub age: u32,
    /// Part of the working set of the step in progress
    pub is_targeted: bool,
}

impl Region {
    /// Create a free region
    pub fn free(id: usize) -> Self {
        Self {
            id,
            kind: RegionKind::Free,
            used_percentage: 0.0,
            liveness_percentage: 0.0,
            age: 0,
            is_targeted: false,
        }
    }

    /// Check if the region is unallocated
    pub fn is_free(&self) -> bool {
        self.kind == RegionKind::Free
    }

    /// Free-state equivalent of this region, preserving its id
    pub fn reset(&self) -> Self {
        Self::free(self.id)
    }

    /// Occupied-state equivalent of this region
    ///
    /// Percentages are clamped to 0..=100 and the targeted flag is cleared.
    pub fn stamp(&self, kind: RegionKind, used: f64, liveness: f64, age: u32) -> Self {
        if kind == RegionKind::Free {
            return self.reset();
        }
        Self {
            id: self.id,
            kind,
            used_percentage: clamp_percentage(used),
            liveness_percentage: clamp_percentage(liveness),
            age,
            is_targeted: false,
        }
    }

    /// Simulated amount of live data held by this region
    pub fn surviving_amount(&self) -> f64 {
        self.used_percentage * (self.liveness_percentage / 100.0)
    }

    /// Copy of this region with liveness reduced by `amount`, floored at `floor`
    pub fn decayed(&self, amount: f64, floor: f64) -> Self {
        Self {
            liveness_percentage: clamp_percentage((self.liveness_percentage - amount).max(floor)),
            ..self.clone()
        }
    }
}

fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Indices of free regions, in grid order
pub fn free_indices(regions: &[Region]) -> Vec<usize> {
    indices_by_kinds(regions, &[RegionKind::Free])
}

/// Indices of regions whose kind is in `kinds`, in grid order
pub fn indices_by_kinds(regions: &[Region], kinds: &[RegionKind]) -> Vec<usize> {
    regions
        .iter()
        .enumerate()
        .filter(|(_, r)| kinds.contains(&r.kind))
        .map(|(i, _)| i)
        .collect()
}

/// Percentage of regions that are not free
pub fn heap_usage(regions: &[Region]) -> f64 {
    if regions.is_empty() {
        return 0.0;
    }
    let used = regions.iter().filter(|r| !r.is_free()).count();
    (used as f64 / regions.len() as f64) * 100.0
}

/// Destination regions needed to hold `amount` of data at `target_fill_rate`
pub fn regions_needed(amount: f64, target_fill_rate: f64) -> usize {
    if amount <= 0.0 || target_fill_rate <= 0.0 {
        return 0;
    }
    (amount / target_fill_rate).ceil() as usize
}

/// The simulated heap: a fixed-size grid of regions
#[derive(Debug, Clone, PartialEq)]
pub struct Heap {
    regions: Vec<Region>,
}

impl Heap {
    /// Create a heap of `total` free regions
    pub fn new(total: usize) -> Self {
        Self {
            regions: (0..total).map(Region::free).collect(),
        }
    }

    /// Number of regions (constant for the heap's lifetime)
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if the heap has no regions
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All regions in grid order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Iterate regions in grid order
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Number of regions of the given kind
    pub fn count(&self, kind: RegionKind) -> usize {
        self.regions.iter().filter(|r| r.kind == kind).count()
    }

    /// Number of targeted regions
    pub fn targeted_count(&self) -> usize {
        self.regions.iter().filter(|r| r.is_targeted).count()
    }

    /// Indices of free regions
    pub fn free_indices(&self) -> Vec<usize> {
        free_indices(&self.regions)
    }

    /// Indices of regions whose kind is in `kinds`
    pub fn indices_by_kinds(&self, kinds: &[RegionKind]) -> Vec<usize> {
        indices_by_kinds(&self.regions, kinds)
    }

    /// Current heap usage percentage
    pub fn usage(&self) -> f64 {
        heap_usage(&self.regions)
    }

    /// Set the targeted flag on the given indices
    pub fn set_targeted(&mut self, indices: &[usize], targeted: bool) {
        let selected: FxHashSet<usize> = indices.iter().copied().collect();
        for (i, region) in self.regions.iter_mut().enumerate() {
            if selected.contains(&i) {
                region.is_targeted = targeted;
            }
        }
    }

    /// Set the targeted flag on every region of `kind`
    pub fn target_kind(&mut self, kind: RegionKind) {
        for region in self.regions.iter_mut().filter(|r| r.kind == kind) {
            region.is_targeted = true;
        }
    }

    /// Reset every region to free
    pub fn clear(&mut self) {
        for region in &mut self.regions {
            *region = region.reset();
        }
    }

    /// Reset every region to free except the first `keep` old regions
    ///
    /// Kept regions lose their targeted flag. Returns how many were kept.
    pub fn clear_retaining_old(&mut self, keep: usize) -> usize {
        let mut kept = 0;
        for region in &mut self.regions {
            if region.kind == RegionKind::Old && kept < keep {
                region.is_targeted = false;
                kept += 1;
            } else {
                *region = region.reset();
            }
        }
        kept
    }
}

impl Index<usize> for Heap {
    type Output = Region;

    fn index(&self, index: usize) -> &Region {
        &self.regions[index]
    }
}

impl IndexMut<usize> for Heap {
    fn index_mut(&mut self, index: usize) -> &mut Region {
        &mut self.regions[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied(id: usize, kind: RegionKind) -> Region {
        Region::free(id).stamp(kind, 80.0, 50.0, 1)
    }

    #[test]
    fn test_heap_creation() {
        let heap = Heap::new(100);
        assert_eq!(heap.len(), 100);
        assert_eq!(heap.usage(), 0.0);
        assert!(heap.iter().enumerate().all(|(i, r)| r.id == i && r.is_free()));
    }

    #[test]
    fn test_reset_preserves_id() {
        let region = occupied(7, RegionKind::Old);
        let freed = region.reset();
        assert_eq!(freed, Region::free(7));
    }

    #[test]
    fn test_stamp_clamps_and_clears_target() {
        let mut region = Region::free(3);
        region.is_targeted = true;
        let stamped = region.stamp(RegionKind::Eden, 120.0, -5.0, 0);
        assert_eq!(stamped.used_percentage, 100.0);
        assert_eq!(stamped.liveness_percentage, 0.0);
        assert!(!stamped.is_targeted);
        assert_eq!(stamped.id, 3);
    }

    #[test]
    fn test_stamp_free_is_reset() {
        let stamped = Region::free(1).stamp(RegionKind::Free, 50.0, 50.0, 2);
        assert_eq!(stamped, Region::free(1));
    }

    #[test]
    fn test_surviving_amount() {
        let region = occupied(0, RegionKind::Eden);
        assert_eq!(region.surviving_amount(), 40.0);
    }

    #[test]
    fn test_regions_needed() {
        assert_eq!(regions_needed(0.0, 85.0), 0);
        assert_eq!(regions_needed(85.0, 85.0), 1);
        assert_eq!(regions_needed(85.5, 85.0), 2);
        assert_eq!(regions_needed(10.0, 85.0), 1);
    }

    #[test]
    fn test_index_queries() {
        let mut heap = Heap::new(6);
        heap[1] = occupied(1, RegionKind::Eden);
        heap[3] = occupied(3, RegionKind::Survivor);
        heap[4] = occupied(4, RegionKind::Old);

        assert_eq!(heap.free_indices(), vec![0, 2, 5]);
        assert_eq!(heap.indices_by_kinds(&RegionKind::YOUNG), vec![1, 3]);
        assert_eq!(heap.usage(), 50.0);
        assert_eq!(heap.count(RegionKind::Old), 1);
    }

    #[test]
    fn test_set_targeted() {
        let mut heap = Heap::new(4);
        heap.set_targeted(&[0, 2], true);
        assert_eq!(heap.targeted_count(), 2);
        assert!(heap[2].is_targeted);
        heap.set_targeted(&[2], false);
        assert_eq!(heap.targeted_count(), 1);
    }

    #[test]
    fn test_clear_retaining_old() {
        let mut heap = Heap::new(8);
        for i in [1, 2, 5, 6] {
            heap[i] = occupied(i, RegionKind::Old);
            heap[i].is_targeted = true;
        }
        heap[3] = occupied(3, RegionKind::Eden);

        let kept = heap.clear_retaining_old(2);
        assert_eq!(kept, 2);
        assert_eq!(heap.indices_by_kinds(&[RegionKind::Old]), vec![1, 2]);
        assert_eq!(heap.free_indices().len(), 6);
        assert_eq!(heap.targeted_count(), 0);
    }

    #[test]
    fn test_decay_respects_floor() {
        let region = occupied(0, RegionKind::Old);
        assert_eq!(region.decayed(45.0, 10.0).liveness_percentage, 10.0);
        assert_eq!(region.decayed(20.0, 10.0).liveness_percentage, 30.0);
    }
}
