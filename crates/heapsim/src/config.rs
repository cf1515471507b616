//! Simulation configuration
//!
//! Every threshold the collectors consult lives here. The defaults are tuned
//! for visual pacing on a 10x10 grid, not for matching real collector
//! statistics.

use crate::error::ConfigError;
use std::time::Duration;

/// Grid rows in the default heap
pub const GRID_ROWS: usize = 10;
/// Grid columns in the default heap
pub const GRID_COLS: usize = 10;
/// Number of regions in the default heap
pub const TOTAL_REGIONS: usize = GRID_ROWS * GRID_COLS;
/// Base tick interval at 1x speed
pub const TICK_RATE: Duration = Duration::from_millis(600);

/// Top-level simulation configuration
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Heap grid shape
    pub grid: GridConfig,
    /// Generational (region-based) collector tunables
    pub generational: GenerationalConfig,
    /// Concurrent (page-based) collector tunables
    pub concurrent: ConcurrentConfig,
    /// Simulated pause and hold durations
    pub pacing: PacingConfig,
}

impl SimConfig {
    /// Check that the configuration describes a runnable simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.total_regions() == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if self.grid.tick.is_zero() {
            return Err(ConfigError::ZeroTick);
        }

        let g = &self.generational;
        if g.target_fill_rate <= 0.0 || g.target_fill_rate > 100.0 {
            return Err(ConfigError::Percentage {
                name: "target_fill_rate",
                value: g.target_fill_rate,
            });
        }
        check_percentage("ihop_threshold", g.ihop_threshold)?;
        check_percentage("mixed_liveness_threshold", g.mixed_liveness_threshold)?;
        check_percentage("evacuated_liveness", g.evacuated_liveness)?;
        check_percentage("mark_decay_floor", g.mark_decay_floor)?;
        check_probability("humongous_chance", g.humongous_chance)?;
        if g.max_eden_regions == 0 {
            return Err(ConfigError::Zero("max_eden_regions"));
        }

        let c = &self.concurrent;
        check_percentage("heap_trigger_threshold", c.heap_trigger_threshold)?;
        check_percentage("liveness_threshold", c.liveness_threshold)?;
        check_percentage("compacted_fill", c.compacted_fill)?;
        check_percentage("compacted_liveness", c.compacted_liveness)?;
        check_probability("concurrent_alloc_chance", c.concurrent_alloc_chance)?;
        check_probability("relocation_alloc_chance", c.relocation_alloc_chance)?;
        check_probability("mark_progress_chance", c.mark_progress_chance)?;
        if c.pages_to_free_per_tick == 0 {
            return Err(ConfigError::Zero("pages_to_free_per_tick"));
        }
        if c.max_relocation_pages == 0 {
            return Err(ConfigError::Zero("max_relocation_pages"));
        }

        Ok(())
    }
}

fn check_percentage(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Percentage { name, value })
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { name, value })
    }
}

/// Heap grid shape and base tick
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Number of rows (default: 10)
    pub rows: usize,
    /// Number of columns (default: 10)
    pub cols: usize,
    /// Base tick interval at 1x speed (default: 600ms)
    pub tick: Duration,
}

impl GridConfig {
    /// Number of regions in the heap
    pub fn total_regions(&self) -> usize {
        self.rows * self.cols
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: GRID_ROWS,
            cols: GRID_COLS,
            tick: TICK_RATE,
        }
    }
}

/// Generational collector configuration
#[derive(Debug, Clone)]
pub struct GenerationalConfig {
    /// Eden region count that triggers a young collection (default: 25)
    pub max_eden_regions: usize,
    /// Initiating heap occupancy percentage for concurrent marking (default: 45)
    pub ihop_threshold: f64,
    /// Age at which survivors are promoted to old (default: 3)
    pub max_age: u32,
    /// Chance that an allocation is humongous (default: 0.05)
    pub humongous_chance: f64,
    /// Fill percentage of evacuation destination regions (default: 85)
    pub target_fill_rate: f64,
    /// Liveness of freshly evacuated regions (default: 90)
    pub evacuated_liveness: f64,
    /// Old regions below this liveness are mixed collection candidates (default: 65)
    pub mixed_liveness_threshold: f64,
    /// Maximum old regions in a mixed collection set (default: 8)
    pub mixed_max_cset_size: usize,
    /// Lower bound for old liveness after concurrent marking (default: 10)
    pub mark_decay_floor: f64,
    /// Old regions kept when a young evacuation fails (default: 5)
    pub young_failure_retained_old: usize,
    /// Old regions kept when a mixed evacuation fails (default: 0)
    pub mixed_failure_retained_old: usize,
}

impl Default for GenerationalConfig {
    fn default() -> Self {
        Self {
            max_eden_regions: 25,
            ihop_threshold: 45.0,
            max_age: 3,
            humongous_chance: 0.05,
            target_fill_rate: 85.0,
            evacuated_liveness: 90.0,
            mixed_liveness_threshold: 65.0,
            mixed_max_cset_size: 8,
            mark_decay_floor: 10.0,
            young_failure_retained_old: 5,
            mixed_failure_retained_old: 0,
        }
    }
}

/// Concurrent (page-based) collector configuration
#[derive(Debug, Clone)]
pub struct ConcurrentConfig {
    /// Heap usage percentage that starts a cycle (default: 50)
    pub heap_trigger_threshold: f64,
    /// Pages below this liveness are relocation candidates (default: 70)
    pub liveness_threshold: f64,
    /// Maximum pages selected for one relocation batch (default: 8)
    pub max_relocation_pages: usize,
    /// Relocating pages freed per tick (default: 3)
    pub pages_to_free_per_tick: usize,
    /// Live data that must be moved before a compacted page is created (default: 30)
    pub min_live_data_for_page: f64,
    /// Allocation chance per concurrent mark tick (default: 0.2)
    pub concurrent_alloc_chance: f64,
    /// Allocation chance per relocation tick (default: 0.1)
    pub relocation_alloc_chance: f64,
    /// Chance that a targeted page finishes marking on a given tick (default: 0.6)
    pub mark_progress_chance: f64,
    /// Fill of a compacted page (default: 90)
    pub compacted_fill: f64,
    /// Liveness of a compacted page (default: 100)
    pub compacted_liveness: f64,
}

impl Default for ConcurrentConfig {
    fn default() -> Self {
        Self {
            heap_trigger_threshold: 50.0,
            liveness_threshold: 70.0,
            max_relocation_pages: 8,
            pages_to_free_per_tick: 3,
            min_live_data_for_page: 30.0,
            concurrent_alloc_chance: 0.2,
            relocation_alloc_chance: 0.1,
            mark_progress_chance: 0.6,
            compacted_fill: 90.0,
            compacted_liveness: 100.0,
        }
    }
}

/// Simulated pause and hold durations
///
/// These never block the engine. They are summed into the step report and
/// the driver turns them into real delays.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Young collection start pause (default: 600ms)
    pub young_gc_start: Duration,
    /// Young collection set highlight (default: 600ms)
    pub young_gc_highlight: Duration,
    /// Generational concurrent mark hold (default: 1000ms)
    pub concurrent_mark: Duration,
    /// Mixed collection start pause (default: 800ms)
    pub mixed_gc_start: Duration,
    /// Mixed collection set highlight (default: 800ms)
    pub mixed_gc_highlight: Duration,
    /// Delay between a young collection and the marking it initiates (default: 500ms)
    pub ihop_follow_up: Duration,
    /// Page collector stop-the-world pause (default: 200ms)
    pub page_stw_pause: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            young_gc_start: Duration::from_millis(600),
            young_gc_highlight: Duration::from_millis(600),
            concurrent_mark: Duration::from_millis(1000),
            mixed_gc_start: Duration::from_millis(800),
            mixed_gc_highlight: Duration::from_millis(800),
            ihop_follow_up: Duration::from_millis(500),
            page_stw_pause: Duration::from_millis(200),
        }
    }
}
