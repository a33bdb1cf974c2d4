//! Pixel-exact drawing primitives on top of [`image::RgbaImage`].
//!
//! All primitives *overwrite* covered pixels with the given color (no
//! blending); layering with alpha happens only when whole buffers are
//! composited with [`image::imageops::overlay`]. Coverage is decided by
//! pixel centers, so results are reproducible bit for bit.

use glam::Vec2;
use image::{Rgba, RgbaImage};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Resets every pixel to fully transparent.
pub fn clear(img: &mut RgbaImage) {
    for p in img.pixels_mut() {
        *p = TRANSPARENT;
    }
}

#[inline]
fn put(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64 {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Inclusive pixel range whose centers may fall inside `[lo, hi]`, clipped
/// to `0..len`.
fn pixel_span(lo: f32, hi: f32, len: u32) -> std::ops::Range<i64> {
    let start = (lo - 0.5).floor().max(0.0) as i64;
    let end = ((hi - 0.5).ceil() as i64 + 1).min(len as i64);
    start..end.max(start)
}

/// Fills the axis-aligned `w × h` rectangle with its top-left corner at
/// `(x, y)`, clipped to the image.
pub fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    for py in y..y + h as i64 {
        for px in x..x + w as i64 {
            put(img, px, py, color);
        }
    }
}

/// Fills every pixel whose center lies within `radius` of `center`.
pub fn fill_circle(img: &mut RgbaImage, center: Vec2, radius: f32, color: Rgba<u8>) {
    if radius <= 0.0 {
        return;
    }
    let r2 = radius * radius;
    for py in pixel_span(center.y - radius, center.y + radius, img.height()) {
        for px in pixel_span(center.x - radius, center.x + radius, img.width()) {
            let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - center;
            if d.length_squared() <= r2 {
                put(img, px, py, color);
            }
        }
    }
}

/// Draws a segment `width` pixels wide: every pixel whose center is within
/// `width / 2` of the segment `a..b` is filled (round caps).
pub fn draw_thick_line(img: &mut RgbaImage, a: Vec2, b: Vec2, width: f32, color: Rgba<u8>) {
    let half = width * 0.5;
    if half <= 0.0 {
        return;
    }
    let lo = a.min(b) - Vec2::splat(half);
    let hi = a.max(b) + Vec2::splat(half);
    let d = b - a;
    let len2 = d.length_squared();
    let h2 = half * half;

    for py in pixel_span(lo.y, hi.y, img.height()) {
        for px in pixel_span(lo.x, hi.x, img.width()) {
            let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
            let t = if len2 > 0.0 {
                ((p - a).dot(d) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            if (p - (a + d * t)).length_squared() <= h2 {
                put(img, px, py, color);
            }
        }
    }
}

/// Nearest-neighbor resize: destination pixel `(x, y)` takes source pixel
/// `(x * src_w / w, y * src_h / h)`.
pub fn scale_nearest(src: &RgbaImage, w: u32, h: u32) -> RgbaImage {
    let mut out = RgbaImage::new(w, h);
    if src.width() == 0 || src.height() == 0 {
        return out;
    }
    let (sw, sh) = (src.width() as u64, src.height() as u64);
    for (x, y, p) in out.enumerate_pixels_mut() {
        let sx = (x as u64 * sw / w as u64) as u32;
        let sy = (y as u64 * sh / h as u64) as u32;
        *p = *src.get_pixel(sx, sy);
    }
    out
}

/// Number of pixels with non-zero alpha.
pub fn covered_pixels(img: &RgbaImage) -> usize {
    img.pixels().filter(|p| p.0[3] > 0).count()
}
