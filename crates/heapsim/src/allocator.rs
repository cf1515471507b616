//! Application allocation into free regions

use crate::collector::StepContext;
use crate::error::CollectError;
use crate::heap::RegionKind;
use crate::log::LogLevel;

/// Which region kinds an allocation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Eden, or occasionally a single humongous region
    Generational,
    /// Active pages
    Paged,
}

/// Claim 1-2 random free regions
///
/// Returns the number of regions allocated, or [`CollectError::HeapExhausted`]
/// when no region is free. The caller decides how to recover.
pub fn allocate(cx: &mut StepContext<'_>, flavor: Flavor) -> Result<usize, CollectError> {
    let mut pool = cx.heap.free_indices();
    if pool.is_empty() {
        return Err(CollectError::HeapExhausted);
    }

    let humongous = flavor == Flavor::Generational
        && cx.policy.humongous(cx.config.generational.humongous_chance);
    let count = if humongous {
        1
    } else {
        cx.policy.allocation_batch().min(pool.len())
    };

    for _ in 0..count {
        let idx = pool.remove(cx.policy.pick_index(pool.len()));
        let (kind, fill, live) = match (flavor, humongous) {
            (_, true) => (RegionKind::Humongous, 100.0, 100.0),
            (Flavor::Generational, false) => (
                RegionKind::Eden,
                cx.policy.eden_fill(),
                cx.policy.eden_liveness(),
            ),
            (Flavor::Paged, false) => (
                RegionKind::ActivePage,
                cx.policy.eden_fill(),
                cx.policy.eden_liveness(),
            ),
        };
        cx.heap[idx] = cx.heap[idx].stamp(kind, fill, live, 0);
    }

    cx.stats_mut().allocations += count as u64;
    Ok(count)
}

/// Heap-full recovery: log and clear the whole grid
pub fn emergency_clear(cx: &mut StepContext<'_>) {
    cx.log(LogLevel::Error, "Heap full! Emergency clear...");
    cx.heap.clear();
}

/// Allocate, clearing the grid on exhaustion; returns false when it had to clear
pub fn allocate_or_clear(cx: &mut StepContext<'_>, flavor: Flavor) -> bool {
    match allocate(cx, flavor) {
        Ok(_) => true,
        Err(_) => {
            emergency_clear(cx);
            false
        }
    }
}
