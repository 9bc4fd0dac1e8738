//! Border-seeded flood fill that clears background connected to the image edge
//!
//! Regions are only cleared when they can be reached from a border seed
//! through background pixels. A green or near-white pocket fully enclosed by
//! the subject (an eye, a highlight) is never reached and keeps its alpha.

use std::collections::VecDeque;

use super::buffer::RasterBuffer;
use super::color::{color_distance, is_greenish, is_near_white, is_strongly_green, KeyColor};

/// Default spacing between seeds sampled along each border edge
pub const DEFAULT_SEED_STRIDE: u32 = 10;

/// Visited bitmap sized to the image
struct VisitedSet {
    bits: Vec<bool>,
    width: usize,
}

impl VisitedSet {
    fn new(width: u32, height: u32) -> Self {
        Self {
            bits: vec![false; width as usize * height as usize],
            width: width as usize,
        }
    }

    /// Marks `(x, y)` and returns whether it was unvisited
    fn insert(&mut self, x: u32, y: u32) -> bool {
        let index = y as usize * self.width + x as usize;
        match self.bits.get_mut(index) {
            Some(bit) if !*bit => {
                *bit = true;
                true
            },
            _ => false,
        }
    }
}

/// Border coordinates to try as seeds: the four corners, then every
/// `stride`-th pixel along the top/bottom and left/right edges.
///
/// Duplicates are harmless since the fill skips visited coordinates.
#[must_use]
pub fn border_seeds(width: u32, height: u32, stride: u32) -> Vec<(u32, u32)> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let (last_x, last_y) = (width - 1, height - 1);
    let stride = stride.max(1) as usize;

    let mut seeds = vec![(0, 0), (last_x, 0), (0, last_y), (last_x, last_y)];
    for x in (0..width).step_by(stride) {
        seeds.push((x, 0));
        seeds.push((x, last_y));
    }
    for y in (0..height).step_by(stride) {
        seeds.push((0, y));
        seeds.push((last_x, y));
    }
    seeds
}

fn is_eligible_seed(buffer: &RasterBuffer, x: u32, y: u32) -> bool {
    let p = buffer.pixel(x, y);
    p[3] == 0 || is_strongly_green(p[0], p[1], p[2]) || is_near_white(p[0], p[1], p[2])
}

/// Flood the background inward from the border.
///
/// Transparent pixels are walked through untouched. A visible pixel is
/// cleared and expanded when it lies within `tolerance` of the key or is
/// greenish; anything else is subject and stops the fill. Every coordinate
/// is visited at most once.
///
/// Returns the number of pixels cleared.
pub fn flood_fill_background(
    buffer: &mut RasterBuffer,
    key: KeyColor,
    tolerance: f32,
    seed_stride: u32,
) -> usize {
    let (width, height) = buffer.dimensions();
    if buffer.is_empty() {
        return 0;
    }

    let key = key.to_array();
    let mut visited = VisitedSet::new(width, height);
    let view: &RasterBuffer = buffer;
    let mut queue: VecDeque<(u32, u32)> = border_seeds(width, height, seed_stride)
        .into_iter()
        .filter(|&(x, y)| is_eligible_seed(view, x, y))
        .collect();

    tracing::trace!(seeds = queue.len(), "Flood fill seeded");

    let mut cleared = 0;
    while let Some((x, y)) = queue.pop_front() {
        if !visited.insert(x, y) {
            continue;
        }

        let p = buffer.pixel(x, y);
        if p[3] != 0 {
            let is_background =
                color_distance([p[0], p[1], p[2]], key) < tolerance || is_greenish(p[0], p[1], p[2]);
            if !is_background {
                continue;
            }
            buffer.clear(x, y);
            cleared += 1;
        }

        queue.extend(buffer.neighbors4(x, y));
    }

    cleared
}
