//! Binary coverage masks used by the outline and shadow passes.

use image::{Rgba, RgbaImage};

use crate::raster::TRANSPARENT;

/// Pixels with alpha strictly above this count as covered.
pub const ALPHA_THRESHOLD: u8 = 127;

/// Row-major bitmap of covered pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Covers every pixel of `img` whose alpha exceeds [`ALPHA_THRESHOLD`].
    pub fn from_alpha(img: &RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            bits: img.pixels().map(|p| p.0[3] > ALPHA_THRESHOLD).collect(),
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.bits[i] = on;
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Top-left `width × height` window of this mask.
    pub fn cropped(&self, width: u32, height: u32) -> Mask {
        let width = width.min(self.width);
        let height = height.min(self.height);
        let mut out = Mask::new(width, height);
        for y in 0..height {
            for x in 0..width {
                out.set(x, y, self.get(x, y));
            }
        }
        out
    }

    /// ORs `other` into `self` with its origin moved to `(dx, dy)`; bits
    /// landing outside are dropped.
    pub fn draw(&mut self, other: &Mask, dx: i64, dy: i64) {
        for y in 0..other.height {
            for x in 0..other.width {
                if !other.get(x, y) {
                    continue;
                }
                let (tx, ty) = (x as i64 + dx, y as i64 + dy);
                if tx >= 0 && ty >= 0 && tx < self.width as i64 && ty < self.height as i64 {
                    self.set(tx as u32, ty as u32, true);
                }
            }
        }
    }

    /// One-pixel cardinal dilation.
    ///
    /// The shifted copies come from the mask cropped by one column and one
    /// row, so coverage in the last column or row does not spread.
    pub fn dilated(&self) -> Mask {
        let cropped = self.cropped(self.width.saturating_sub(1), self.height.saturating_sub(1));
        let mut out = self.clone();
        for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
            out.draw(&cropped, dx, dy);
        }
        out
    }

    /// Integer mean of covered coordinates, `(0, 0)` for an empty mask.
    pub fn centroid(&self) -> (u32, u32) {
        let n = self.count() as u64;
        if n == 0 {
            return (0, 0);
        }
        let (mut sx, mut sy) = (0u64, 0u64);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    sx += x as u64;
                    sy += y as u64;
                }
            }
        }
        ((sx / n) as u32, (sy / n) as u32)
    }

    /// Paints covered pixels in `color`, the rest transparent.
    pub fn to_image(&self, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) { color } else { TRANSPARENT }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_alpha_uses_strict_threshold() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 127]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
        img.put_pixel(2, 0, Rgba([9, 9, 9, 255]));
        let mask = Mask::from_alpha(&img);
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(mask.get(2, 0));
    }

    #[test]
    fn dilated_single_pixel_becomes_plus_shape() {
        let mut mask = Mask::new(5, 5);
        mask.set(2, 2, true);
        let d = mask.dilated();
        assert_eq!(d.count(), 5);
        for (x, y) in [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            assert!(d.get(x, y), "({x}, {y}) should be covered");
        }
        assert!(!d.get(1, 1));
    }

    #[test]
    fn dilated_ignores_last_row_and_column() {
        let mut mask = Mask::new(4, 4);
        mask.set(3, 1, true);
        mask.set(1, 3, true);
        let d = mask.dilated();
        assert_eq!(d, mask);
    }

    #[test]
    fn centroid_is_floored_mean() {
        let mut mask = Mask::new(10, 10);
        mask.set(1, 1, true);
        mask.set(4, 2, true);
        // x: (1 + 4) / 2 = 2, y: (1 + 2) / 2 = 1
        assert_eq!(mask.centroid(), (2, 1));
        assert_eq!(Mask::new(4, 4).centroid(), (0, 0));
    }

    #[test]
    fn to_image_round_trips_coverage() {
        let mut mask = Mask::new(3, 3);
        mask.set(0, 2, true);
        let img = mask.to_image(Rgba([1, 2, 3, 200]));
        assert_eq!(*img.get_pixel(0, 2), Rgba([1, 2, 3, 200]));
        assert_eq!(*img.get_pixel(1, 1), TRANSPARENT);
        assert_eq!(Mask::from_alpha(&img), mask);
    }
}
