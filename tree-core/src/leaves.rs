//! Foliage sprites drawn at branch tips.
//!
//! A [`LeafCluster`] is a small square RGBA image made of leaf glyphs (two
//! overlapping 12×12 squares each) in three color tiers. Older clusters get
//! more glyphs; later glyphs of a tier are pulled further in from the edges.
//!
//! Glyph placement is a pure function of a per-node layout seed and the
//! node's age, so recoloring or re-rendering a cluster never moves a leaf.

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PaletteError;
use crate::palette::{LEAF_TIERS, Palette, leaves_key};
use crate::raster::fill_rect;

/// Side of one glyph square, in pixels.
pub const GLYPH_SIZE: u32 = 12;
/// Offset of a glyph's second square from its first.
pub const GLYPH_OFFSET: i64 = 4;

/// Age per extra glyph, per tier (tier 0 drawn first).
const AGE_PER_GLYPH: [i32; LEAF_TIERS] = [600, 400, 200];
/// Margin growth per glyph index, per tier.
const MARGIN_STEP: [i64; LEAF_TIERS] = [30, 15, 10];

/// Palette slot for a drawing tier. Tier 0 is the darkest and goes under
/// the others, so it uses the last `leavesN` slot.
pub fn tier_key(tier: usize) -> String {
    leaves_key(LEAF_TIERS - 1 - tier)
}

/// One leaf glyph position (top-left of its first square).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub tier: usize,
    pub x: i64,
    pub y: i64,
}

/// Glyph positions for a cluster, in drawing order.
///
/// Tier `t` holds `1 + age / AGE_PER_GLYPH[t]` glyphs; glyph `i` of that
/// tier is drawn uniformly from `[i * m, size - i * m]` on both axes, where
/// `m` is the tier's margin step. When the bounds cross they are swapped.
pub fn layout(seed: u64, age: i32, size: u32) -> Vec<Glyph> {
    let mut rng = StdRng::seed_from_u64(seed);
    let age = age.max(0);
    let size = size as i64;
    let mut glyphs = Vec::new();

    for tier in 0..LEAF_TIERS {
        let n = 1 + age / AGE_PER_GLYPH[tier];
        for i in 0..n as i64 {
            let j = i * MARGIN_STEP[tier];
            let (lo, hi) = (j.min(size - j), j.max(size - j));
            let x = rng.random_range(lo..=hi);
            let y = rng.random_range(lo..=hi);
            glyphs.push(Glyph { tier, x, y });
        }
    }
    glyphs
}

/// A rendered foliage sprite plus the age it was rendered for.
#[derive(Clone, Debug)]
pub struct LeafCluster {
    age: i32,
    image: RgbaImage,
}

impl LeafCluster {
    /// Builds the sprite for `age` with colors from `palette`.
    ///
    /// ### Errors
    /// [`PaletteError::MissingKey`] if a `leaves{N}` slot is absent.
    pub fn generate(seed: u64, age: i32, palette: &Palette, size: u32) -> Result<Self, PaletteError> {
        let mut colors = Vec::with_capacity(LEAF_TIERS);
        for tier in 0..LEAF_TIERS {
            colors.push(palette.get(&tier_key(tier))?);
        }

        let mut image = RgbaImage::new(size, size);
        for g in layout(seed, age, size) {
            let c = colors[g.tier];
            fill_rect(&mut image, g.x, g.y, GLYPH_SIZE, GLYPH_SIZE, c);
            fill_rect(
                &mut image,
                g.x + GLYPH_OFFSET,
                g.y + GLYPH_OFFSET,
                GLYPH_SIZE,
                GLYPH_SIZE,
                c,
            );
        }

        Ok(Self { age, image })
    }

    /// Age the sprite was generated for.
    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}
