//! Chroma-key matte pipeline
//!
//! Turns a flat-green-backdrop raster into an alpha matte in five passes
//! that always run in this order over one owned buffer:
//!
//! 1. **Tight match** - clear pixels close to the exact key color
//! 2. **Loose match** - clear clearly green pixels the tight radius missed
//! 3. **Flood fill** - clear background reachable from the image border
//! 4. **Despill** - pull green tint out of matte edges, drop heavily spilled ones
//! 5. **Isolated cleanup** - drop green specks stranded in cleared areas
//!
//! Each pass reads what the previous one left behind. No pass ever raises
//! alpha, so the transparent set only grows from one pass to the next.
//!
//! ```rust
//! use pixelforge_matte::{extract_matte, MatteConfig, RasterBuffer};
//!
//! let mut buffer = RasterBuffer::filled(8, 8, [0, 255, 0, 255]);
//! let stats = extract_matte(&mut buffer, &MatteConfig::default());
//! assert_eq!(stats.transparent_pixels, 64);
//! ```

pub mod buffer;
pub mod color;
pub mod flood_fill;
pub mod stages;

use crate::{config::MatteConfig, types::MatteStatistics};
use buffer::RasterBuffer;
use tracing::{debug, span, Level};

/// One pass of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    TightMatch,
    LooseMatch,
    FloodFill,
    Despill,
    IsolatedCleanup,
}

impl Stage {
    /// Execution order
    pub const ORDERED: [Stage; 5] = [
        Stage::TightMatch,
        Stage::LooseMatch,
        Stage::FloodFill,
        Stage::Despill,
        Stage::IsolatedCleanup,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Stage::TightMatch => "tight_match",
            Stage::LooseMatch => "loose_match",
            Stage::FloodFill => "flood_fill",
            Stage::Despill => "despill",
            Stage::IsolatedCleanup => "isolated_cleanup",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a single stage did to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    /// Pixels that went from visible to transparent
    pub cleared: usize,
    /// Pixels whose green channel was reduced (despill only)
    pub desaturated: usize,
}

/// Run a single stage against the buffer.
///
/// Calling stages out of [`Stage::ORDERED`] order is allowed but produces a
/// different matte than [`extract_matte`].
pub fn apply_stage(buffer: &mut RasterBuffer, stage: Stage, config: &MatteConfig) -> StageOutcome {
    let _span = span!(Level::DEBUG, "matte_stage", stage = %stage).entered();

    let (cleared, desaturated) = match stage {
        Stage::TightMatch => (
            stages::remove_key_color(buffer, config.key_color, config.tight_tolerance),
            0,
        ),
        Stage::LooseMatch => (stages::remove_green_dominant(buffer), 0),
        Stage::FloodFill => (
            flood_fill::flood_fill_background(
                buffer,
                config.key_color,
                config.flood_tolerance,
                config.seed_stride,
            ),
            0,
        ),
        Stage::Despill => {
            let outcome = stages::despill_edges(buffer);
            (outcome.removed, outcome.desaturated)
        },
        Stage::IsolatedCleanup => (stages::remove_isolated_pixels(buffer), 0),
    };

    if config.debug {
        debug!(cleared, desaturated, "Stage complete");
    }

    StageOutcome {
        stage,
        cleared,
        desaturated,
    }
}

/// Run the full pipeline in place and report what each stage removed.
pub fn extract_matte(buffer: &mut RasterBuffer, config: &MatteConfig) -> MatteStatistics {
    let (width, height) = buffer.dimensions();
    let _span = span!(Level::DEBUG, "extract_matte", width, height, key = %config.key_color)
        .entered();

    let mut statistics = MatteStatistics::new(buffer.pixel_count());
    for stage in Stage::ORDERED {
        statistics.record(apply_stage(buffer, stage, config));
    }
    statistics.transparent_pixels = buffer.transparent_count();

    debug!(
        removed = statistics.removed_total(),
        transparent = statistics.transparent_pixels,
        total = statistics.total_pixels,
        "Matte extracted"
    );

    statistics
}
