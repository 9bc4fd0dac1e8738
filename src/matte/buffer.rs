//! Owned RGBA raster that every stage mutates in place

use image::{DynamicImage, Rgba, RgbaImage};

/// Offsets of the 4-connected neighborhood
pub(crate) const NEIGHBORS_4: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Offsets of the 8-connected neighborhood
pub(crate) const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Decoded image being matted.
///
/// Alpha can only be driven to zero through [`RasterBuffer::clear`], and the
/// only color write is [`RasterBuffer::set_green`], so a transparent pixel
/// never becomes visible again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    image: RgbaImage,
}

impl RasterBuffer {
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Convert any decoded image to RGBA8
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::new(image.to_rgba8())
    }

    /// Build a buffer filled with a single color
    #[must_use]
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Pixel at `(x, y)`; callers stay inside the image bounds
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Pixel at signed coordinates, `None` outside the image
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> Option<Rgba<u8>> {
        let (x, y) = self.checked_coords(x, y)?;
        Some(self.pixel(x, y))
    }

    #[must_use]
    pub fn is_transparent(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y)[3] == 0
    }

    /// Zero the alpha of `(x, y)` leaving RGB alone. Returns whether the
    /// pixel was visible before.
    pub fn clear(&mut self, x: u32, y: u32) -> bool {
        let pixel = self.image.get_pixel_mut(x, y);
        let was_visible = pixel[3] != 0;
        pixel[3] = 0;
        was_visible
    }

    /// Overwrite the green channel of `(x, y)`
    pub fn set_green(&mut self, x: u32, y: u32, green: u8) {
        self.image.get_pixel_mut(x, y)[1] = green;
    }

    /// In-bounds 4-neighbors of `(x, y)`
    pub fn neighbors4(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.neighbors(x, y, &NEIGHBORS_4)
    }

    /// In-bounds 8-neighbors of `(x, y)`
    pub fn neighbors8(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.neighbors(x, y, &NEIGHBORS_8)
    }

    fn neighbors<'a>(
        &'a self,
        x: u32,
        y: u32,
        offsets: &'a [(i64, i64)],
    ) -> impl Iterator<Item = (u32, u32)> + 'a {
        offsets
            .iter()
            .filter_map(move |&(dx, dy)| self.checked_coords(i64::from(x) + dx, i64::from(y) + dy))
    }

    fn checked_coords(&self, x: i64, y: i64) -> Option<(u32, u32)> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        (x < self.width() && y < self.height()).then_some((x, y))
    }

    /// Number of fully transparent pixels
    #[must_use]
    pub fn transparent_count(&self) -> usize {
        self.image.pixels().filter(|p| p[3] == 0).count()
    }

    /// Coordinates of every fully transparent pixel, row-major
    #[must_use]
    pub fn transparent_coords(&self) -> Vec<(u32, u32)> {
        self.image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] == 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
