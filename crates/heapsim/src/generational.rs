//! Region-based generational collector
//!
//! Phase cycle: `Idle -> MinorGc -> [ConcurrentMark -> MajorGc] -> Idle`.
//!
//! ## Design
//!
//! - **Allocation**: every idle tick claims 1-2 Eden regions (rarely one
//!   humongous region) until the Eden count reaches the young trigger
//! - **Young GC**: stop-the-world evacuation of Eden + Survivor into fresh
//!   Survivor regions, promoting data that reaches the tenuring age
//! - **Concurrent marking**: started when occupancy after a young GC exceeds
//!   the initiating threshold; lowers old-region liveness
//! - **Mixed GC**: young regions plus the most garbage-rich old regions

use crate::allocator::{Flavor, allocate_or_clear};
use crate::collector::{Collector, StepContext};
use crate::config::GenerationalConfig;
use crate::error::CollectError;
use crate::heap::{Heap, RegionKind, regions_needed};
use crate::log::LogLevel;
use crate::phase::{GcMode, Phase};

/// Generational collector strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationalCollector;

impl Collector for GenerationalCollector {
    fn mode(&self) -> GcMode {
        GcMode::Generational
    }

    fn step(&self, phase: Phase, cx: &mut StepContext<'_>) -> Phase {
        match phase {
            Phase::Idle => self.idle(cx),
            Phase::MinorGc => self.young_collection(cx),
            Phase::ConcurrentMark => self.concurrent_mark(cx),
            Phase::MajorGc => self.mixed_collection(cx),
            other => {
                tracing::warn!(target: "heapsim::gc", phase = ?other, "Phase not handled by generational collector");
                Phase::Idle
            }
        }
    }

    fn allocate(&self, phase: Phase, cx: &mut StepContext<'_>) -> Phase {
        if phase.is_stop_the_world() {
            tracing::debug!(target: "heapsim::gc", ?phase, "Allocation refused during pause");
            return phase;
        }
        if allocate_or_clear(cx, Flavor::Generational) {
            phase
        } else {
            Phase::Idle
        }
    }
}

impl GenerationalCollector {
    /// Allocate, or start a young collection once Eden is full
    fn idle(&self, cx: &mut StepContext<'_>) -> Phase {
        if cx.heap.count(RegionKind::Eden) >= cx.config.generational.max_eden_regions {
            cx.log(LogLevel::Warn, "Young GC started: stop-the-world evacuation");
            return Phase::MinorGc;
        }

        allocate_or_clear(cx, Flavor::Generational);
        Phase::Idle
    }

    /// Stop-the-world evacuation of the young generation
    fn young_collection(&self, cx: &mut StepContext<'_>) -> Phase {
        let sim = cx.config;
        let (config, pacing) = (&sim.generational, &sim.pacing);
        cx.stall(pacing.young_gc_start);

        // Collection set: all Eden + all Survivor
        let cset = cx.heap.indices_by_kinds(&RegionKind::YOUNG);
        if cset.is_empty() {
            return Phase::Idle;
        }

        cx.heap.set_targeted(&cset, true);
        cx.stall(pacing.young_gc_highlight);

        match evacuate(&mut cx.heap, &cset, config) {
            Ok(evacuated) => {
                cx.stats_mut().minor_collections += 1;
                cx.log(
                    LogLevel::Success,
                    format!(
                        "Young GC done. Evacuated: {} Survivor, {} Old regions.",
                        evacuated.survivor_regions, evacuated.old_regions
                    ),
                );

                // Initiating heap occupancy check
                if cx.heap.usage() > config.ihop_threshold {
                    cx.hold(pacing.ihop_follow_up);
                    Phase::ConcurrentMark
                } else {
                    Phase::Idle
                }
            }
            Err(err) => {
                recover_failed_evacuation(
                    cx,
                    err,
                    "Evacuation failure! To-space exhausted. Full GC triggered.",
                    config.young_failure_retained_old,
                );
                Phase::Idle
            }
        }
    }

    /// Mark old regions and discover new garbage
    fn concurrent_mark(&self, cx: &mut StepContext<'_>) -> Phase {
        cx.log(
            LogLevel::Info,
            "Concurrent marking started (snapshot-at-the-beginning)",
        );
        cx.heap.target_kind(RegionKind::Old);
        cx.hold(cx.config.pacing.concurrent_mark);

        let floor = cx.config.generational.mark_decay_floor;
        for idx in cx.heap.indices_by_kinds(&[RegionKind::Old]) {
            let decay = cx.policy.old_mark_decay();
            let mut region = cx.heap[idx].decayed(decay, floor);
            region.is_targeted = false;
            cx.heap[idx] = region;
        }

        cx.log(LogLevel::Info, "Marking finished. Candidate regions identified.");
        Phase::MajorGc
    }

    /// Evacuate the young generation plus garbage-rich old regions
    fn mixed_collection(&self, cx: &mut StepContext<'_>) -> Phase {
        let sim = cx.config;
        let (config, pacing) = (&sim.generational, &sim.pacing);
        cx.log(LogLevel::Warn, "Mixed GC started (young + candidate old)");
        cx.stall(pacing.mixed_gc_start);

        let candidates = mixed_candidates(&cx.heap, config);
        if candidates.is_empty() {
            cx.log(
                LogLevel::Info,
                "No viable mixed GC candidates. Skipping to young.",
            );
            return Phase::Idle;
        }

        cx.log(
            LogLevel::Info,
            format!("Collecting {} old regions + young gen", candidates.len()),
        );

        let mut cset = cx.heap.indices_by_kinds(&RegionKind::YOUNG);
        cset.extend_from_slice(&candidates);
        cx.heap.set_targeted(&cset, true);
        cx.stall(pacing.mixed_gc_highlight);

        match evacuate(&mut cx.heap, &cset, config) {
            Ok(_) => {
                cx.stats_mut().major_collections += 1;
                cx.log(LogLevel::Success, "Mixed GC done. Compacted heap.");
            }
            Err(err) => {
                recover_failed_evacuation(
                    cx,
                    err,
                    "Mixed GC evacuation failure! Full GC triggered.",
                    config.mixed_failure_retained_old,
                );
            }
        }
        Phase::Idle
    }
}

/// Log an evacuation failure and clear the grid, keeping up to `retain` old regions
fn recover_failed_evacuation(
    cx: &mut StepContext<'_>,
    err: CollectError,
    message: &str,
    retain: usize,
) {
    tracing::debug!(target: "heapsim::gc", error = %err, retain, "Evacuation failed");
    cx.log(LogLevel::Error, message);
    cx.heap.clear_retaining_old(retain);
}

/// Old regions eligible for a mixed collection, most garbage first
pub fn mixed_candidates(heap: &Heap, config: &GenerationalConfig) -> Vec<usize> {
    let mut candidates: Vec<usize> = heap
        .indices_by_kinds(&[RegionKind::Old])
        .into_iter()
        .filter(|&i| heap[i].liveness_percentage < config.mixed_liveness_threshold)
        .collect();
    candidates.sort_by(|&a, &b| {
        heap[a]
            .liveness_percentage
            .total_cmp(&heap[b].liveness_percentage)
    });
    candidates.truncate(config.mixed_max_cset_size);
    candidates
}

/// Surviving data of a collection set, split by destination
#[derive(Debug, Clone, PartialEq)]
pub struct EvacuationPlan {
    /// Data staying in the young generation
    pub to_survivor: f64,
    /// Amount-weighted age of the survivor data
    pub survivor_age: u32,
    /// Data promoted (or kept) in the old generation
    pub to_old: f64,
    /// Survivor regions needed
    pub survivor_regions: usize,
    /// Old regions needed
    pub old_regions: usize,
}

impl EvacuationPlan {
    /// Destination regions needed in total
    pub fn regions_needed(&self) -> usize {
        self.survivor_regions + self.old_regions
    }
}

/// Outcome of a successful evacuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evacuated {
    /// Survivor regions stamped
    pub survivor_regions: usize,
    /// Old regions stamped
    pub old_regions: usize,
    /// Collection-set regions freed
    pub freed: usize,
}

/// Size the destinations for evacuating `cset`
pub fn plan_evacuation(heap: &Heap, cset: &[usize], config: &GenerationalConfig) -> EvacuationPlan {
    let mut to_old = 0.0;
    let mut to_survivor = 0.0;
    let mut weighted_age = 0.0;

    for &i in cset {
        let region = &heap[i];
        let amount = region.surviving_amount();
        if amount <= 0.0 {
            continue;
        }

        if !region.kind.is_young() {
            to_old += amount;
            continue;
        }

        let age = region.age + 1;
        if age >= config.max_age {
            to_old += amount;
        } else {
            to_survivor += amount;
            weighted_age += age as f64 * amount;
        }
    }

    let survivor_age = if to_survivor > 0.0 {
        (weighted_age / to_survivor).round() as u32
    } else {
        1
    };

    EvacuationPlan {
        to_survivor,
        survivor_age,
        to_old,
        survivor_regions: regions_needed(to_survivor, config.target_fill_rate),
        old_regions: regions_needed(to_old, config.target_fill_rate),
    }
}

/// Copy the live data of `cset` into fresh Survivor and Old regions
///
/// Destinations are taken from regions that were free before the collection
/// set is cleared. On failure the heap is left untouched.
pub fn evacuate(
    heap: &mut Heap,
    cset: &[usize],
    config: &GenerationalConfig,
) -> Result<Evacuated, CollectError> {
    let plan = plan_evacuation(heap, cset, config);
    let free = heap.free_indices();
    if free.len() < plan.regions_needed() {
        return Err(CollectError::EvacuationFailure {
            needed: plan.regions_needed(),
            available: free.len(),
        });
    }

    for &i in cset {
        heap[i] = heap[i].reset();
    }

    let mut destinations = free.into_iter();
    let survivors = destinations.by_ref().take(plan.survivor_regions);
    stamp_destinations(
        heap,
        survivors,
        plan.survivor_regions,
        plan.to_survivor,
        RegionKind::Survivor,
        plan.survivor_age,
        config,
    );
    let olds = destinations.take(plan.old_regions);
    stamp_destinations(
        heap,
        olds,
        plan.old_regions,
        plan.to_old,
        RegionKind::Old,
        config.max_age + 1,
        config,
    );

    Ok(Evacuated {
        survivor_regions: plan.survivor_regions,
        old_regions: plan.old_regions,
        freed: cset.len(),
    })
}

/// Fill destinations at the target rate; the last one takes the remainder
fn stamp_destinations(
    heap: &mut Heap,
    indices: impl Iterator<Item = usize>,
    count: usize,
    total: f64,
    kind: RegionKind,
    age: u32,
    config: &GenerationalConfig,
) {
    let rate = config.target_fill_rate;
    let remainder = total % rate;
    for (k, idx) in indices.enumerate() {
        let fill = if k + 1 == count && remainder > 0.0 {
            remainder
        } else {
            rate
        };
        heap[idx] = heap[idx].stamp(kind, fill, config.evacuated_liveness, age);
    }
}
