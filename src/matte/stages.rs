//! Per-pixel scan stages of the matte pipeline

use super::buffer::RasterBuffer;
use super::color::{
    color_distance, despilled_green, has_green_spill, is_severe_spill, is_strongly_green, KeyColor,
};

/// Transparent 8-neighbors needed before a green pixel counts as stray noise
pub const ISOLATION_THRESHOLD: usize = 6;

/// Outcome of the despill stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DespillOutcome {
    /// Edge pixels whose green channel was pulled down
    pub desaturated: usize,
    /// Edge pixels dropped as backdrop
    pub removed: usize,
}

/// Clear every pixel within `tolerance` of the key color.
///
/// Returns the number of pixels that went from visible to transparent.
pub fn remove_key_color(buffer: &mut RasterBuffer, key: KeyColor, tolerance: f32) -> usize {
    let key = key.to_array();
    let mut cleared = 0;

    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            let p = buffer.pixel(x, y);
            if color_distance([p[0], p[1], p[2]], key) < tolerance && buffer.clear(x, y) {
                cleared += 1;
            }
        }
    }

    cleared
}

/// Clear visible pixels that are clearly green regardless of the exact key.
pub fn remove_green_dominant(buffer: &mut RasterBuffer) -> usize {
    let mut cleared = 0;

    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            let p = buffer.pixel(x, y);
            if p[3] == 0 {
                continue;
            }
            if is_strongly_green(p[0], p[1], p[2]) && buffer.clear(x, y) {
                cleared += 1;
            }
        }
    }

    cleared
}

/// Correct green spill on pixels touching the matte.
///
/// The scan runs in place in row-major order, so a pixel dropped here makes
/// its right and lower neighbors edge pixels for the rest of the scan.
pub fn despill_edges(buffer: &mut RasterBuffer) -> DespillOutcome {
    let mut outcome = DespillOutcome::default();

    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            let p = buffer.pixel(x, y);
            if p[3] == 0 {
                continue;
            }

            let is_edge = buffer
                .neighbors4(x, y)
                .any(|(nx, ny)| buffer.is_transparent(nx, ny));
            if !is_edge {
                continue;
            }

            let (r, g, b) = (p[0], p[1], p[2]);
            if has_green_spill(r, g, b) {
                let green = despilled_green(r, g, b);
                if green != g {
                    buffer.set_green(x, y, green);
                    outcome.desaturated += 1;
                }
            }
            // judged on the color before the clamp above
            if is_severe_spill(r, g, b) && buffer.clear(x, y) {
                outcome.removed += 1;
            }
        }
    }

    outcome
}

/// Drop green-tinted interior pixels stranded among transparent ones.
pub fn remove_isolated_pixels(buffer: &mut RasterBuffer) -> usize {
    let (width, height) = buffer.dimensions();
    if width < 3 || height < 3 {
        return 0;
    }

    let mut cleared = 0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let p = buffer.pixel(x, y);
            if p[3] == 0 {
                continue;
            }

            let transparent_neighbors = buffer
                .neighbors8(x, y)
                .filter(|&(nx, ny)| buffer.is_transparent(nx, ny))
                .count();

            if transparent_neighbors >= ISOLATION_THRESHOLD
                && p[1] > p[0].max(p[2])
                && buffer.clear(x, y)
            {
                cleared += 1;
            }
        }
    }

    cleared
}
