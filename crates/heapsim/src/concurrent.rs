//! Page-based concurrent collector
//!
//! Cycle: `Idle -> MarkStart -> ConcurrentMark -> MarkEnd -> ConcurrentRelocate -> Idle`.
//!
//! Marking and relocation are spread across many ticks while the application
//! keeps allocating. Only `MarkStart` and `MarkEnd` stop the world, and both
//! pauses stay well below the base tick.

use crate::allocator::{Flavor, allocate_or_clear};
use crate::collector::{Collector, StepContext};
use crate::config::ConcurrentConfig;
use crate::heap::{Heap, RegionKind};
use crate::log::LogLevel;
use crate::phase::{GcMode, Phase};

/// Concurrent collector strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentCollector;

impl Collector for ConcurrentCollector {
    fn mode(&self) -> GcMode {
        GcMode::Concurrent
    }

    fn step(&self, phase: Phase, cx: &mut StepContext<'_>) -> Phase {
        match phase {
            Phase::Idle => self.idle(cx),
            Phase::MarkStart => self.mark_start(cx),
            Phase::ConcurrentMark => self.concurrent_mark(cx),
            Phase::MarkEnd => self.mark_end(cx),
            Phase::ConcurrentRelocate => self.relocate(cx),
            other => {
                tracing::warn!(target: "heapsim::gc", phase = ?other, "Phase not handled by concurrent collector");
                Phase::Idle
            }
        }
    }

    fn allocate(&self, phase: Phase, cx: &mut StepContext<'_>) -> Phase {
        if phase.is_stop_the_world() {
            tracing::debug!(target: "heapsim::gc", ?phase, "Allocation refused during pause");
            return phase;
        }
        if allocate_or_clear(cx, Flavor::Paged) {
            phase
        } else {
            Phase::Idle
        }
    }
}

impl ConcurrentCollector {
    fn idle(&self, cx: &mut StepContext<'_>) -> Phase {
        if cx.heap.usage() > cx.config.concurrent.heap_trigger_threshold {
            return Phase::MarkStart;
        }

        allocate_or_clear(cx, Flavor::Paged);
        Phase::Idle
    }

    /// Snapshot the live pages
    fn mark_start(&self, cx: &mut StepContext<'_>) -> Phase {
        cx.log(LogLevel::Warn, "Pause Mark Start (STW)");
        cx.heap.target_kind(RegionKind::ActivePage);
        cx.stall(cx.config.pacing.page_stw_pause);
        Phase::ConcurrentMark
    }

    /// Mark a random share of the snapshot while the application runs
    fn concurrent_mark(&self, cx: &mut StepContext<'_>) -> Phase {
        let sim = cx.config;
        let config = &sim.concurrent;
        let targeted: Vec<usize> = cx
            .heap
            .iter()
            .filter(|r| r.is_targeted)
            .map(|r| r.id)
            .collect();
        if targeted.is_empty() {
            return Phase::MarkEnd;
        }

        for idx in targeted {
            if !cx.policy.page_mark_progress(config.mark_progress_chance) {
                continue;
            }
            let decay = cx.policy.page_mark_decay();
            let mut region = cx.heap[idx].decayed(decay, 0.0);
            region.is_targeted = false;
            cx.heap[idx] = region;
        }

        if cx.policy.concurrent_allocation(config.concurrent_alloc_chance)
            && !allocate_or_clear(cx, Flavor::Paged)
        {
            return Phase::Idle;
        }
        Phase::ConcurrentMark
    }

    fn mark_end(&self, cx: &mut StepContext<'_>) -> Phase {
        cx.log(LogLevel::Warn, "Pause Mark End (STW)");
        cx.stall(cx.config.pacing.page_stw_pause);
        Phase::ConcurrentRelocate
    }

    /// Select a relocation set, or free part of the current one
    fn relocate(&self, cx: &mut StepContext<'_>) -> Phase {
        let sim = cx.config;
        let config = &sim.concurrent;
        let relocating = cx.heap.indices_by_kinds(&[RegionKind::RelocatingPage]);

        if relocating.is_empty() {
            let candidates = relocation_candidates(&cx.heap, config);
            if candidates.is_empty() {
                cx.stats_mut().major_collections += 1;
                cx.log(LogLevel::Success, "Cycle complete");
                return Phase::Idle;
            }

            for &idx in &candidates {
                cx.heap[idx].kind = RegionKind::RelocatingPage;
            }
            cx.log(
                LogLevel::Info,
                format!("Relocating {} pages...", candidates.len()),
            );
            return Phase::ConcurrentRelocate;
        }

        let batch = config.pages_to_free_per_tick.min(relocating.len());
        let mut moved = 0.0;
        for &idx in &relocating[..batch] {
            moved += cx.heap[idx].surviving_amount();
            cx.heap[idx] = cx.heap[idx].reset();
        }

        if moved > config.min_live_data_for_page {
            if let Some(&idx) = cx.heap.free_indices().first() {
                cx.heap[idx] = cx.heap[idx].stamp(
                    RegionKind::ActivePage,
                    config.compacted_fill,
                    config.compacted_liveness,
                    0,
                );
            }
        }

        if cx.policy.concurrent_allocation(config.relocation_alloc_chance)
            && !allocate_or_clear(cx, Flavor::Paged)
        {
            return Phase::Idle;
        }
        Phase::ConcurrentRelocate
    }
}

/// Active pages below the liveness threshold, in grid order, capped
pub fn relocation_candidates(heap: &Heap, config: &ConcurrentConfig) -> Vec<usize> {
    heap.iter()
        .filter(|r| {
            r.kind == RegionKind::ActivePage && r.liveness_percentage < config.liveness_threshold
        })
        .map(|r| r.id)
        .take(config.max_relocation_pages)
        .collect()
}
