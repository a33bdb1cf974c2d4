//! Tree → stylized raster.
//!
//! The pipeline draws branches and leaves into two separate full-size
//! buffers by walking the tree from the base, then flattens them:
//!
//! 1. leaves: downscale → 1px outline → upscale ([`pixelate_and_outline`])
//! 2. shadow: coverage of the outlined leaves, filled with the shadow color,
//!    squashed vertically and pixelated ([`shadow`], [`pixelate`])
//! 3. branches: downscale → outline → upscale
//! 4. composite, bottom to top: shadow, branches, leaves
//!
//! Every pass is integer nearest-neighbor and mask arithmetic, so a given
//! tree always renders to the same pixels.

use glam::Vec2;
use image::{Rgba, RgbaImage, imageops};

use crate::config::RenderConfig;
use crate::error::PaletteError;
use crate::mask::Mask;
use crate::palette::{LEAVES_OUTLINE, SHADOW_COLOR, TRUNK_OUTLINE, TRUNK0, TRUNK1};
use crate::raster::{clear, draw_thick_line, fill_circle, scale_nearest};
use crate::tree::{ROOT, Tree};

/// Stroke width of each line in a branch ribbon.
const RIBBON_LINE_WIDTH: f32 = 3.0;
/// Radius of the joint disc at a branch tip, relative to branch width.
const JOINT_RADIUS: f32 = 0.6;

/// Where a segment of `length` pixels at `angle_deg` ends when it starts at
/// `anchor`. Screen y grows downward, so positive angles go up.
pub fn tip_position(anchor: Vec2, length: f32, angle_deg: f32) -> Vec2 {
    let a = angle_deg.to_radians();
    anchor + Vec2::new(length * a.cos(), -length * a.sin())
}

/// Visual width of a branch carrying `subtree_size` segments.
pub fn branch_width(subtree_size: u32, power: f32) -> f32 {
    (subtree_size as f32).powf(power)
}

/// Parallel strokes from `start` to `stop`, offset along the branch normal.
///
/// Offsets run over `round(-width/2) ..= round(width/2)`; each end is pushed
/// out by `|i|^(2/3)` so the ribbon flares at the joints. Strokes left of
/// offset -1 use the darker trunk color.
fn draw_ribbon(
    img: &mut RgbaImage,
    start: Vec2,
    stop: Vec2,
    angle_deg: f32,
    width: f32,
    colors: [Rgba<u8>; 2],
) {
    let perp = (angle_deg + 90.0).to_radians();
    let normal = Vec2::new(perp.cos(), -perp.sin());
    let from = (-width / 2.0).round_ties_even() as i32;
    let to = (width / 2.0).round_ties_even() as i32;

    for i in from..=to {
        let offset = normal * i as f32;
        let flare = Vec2::new(0.0, (i.abs() as f32).powf(2.0 / 3.0));
        let color = if i < -1 { colors[1] } else { colors[0] };
        draw_thick_line(
            img,
            start + offset - flare,
            stop + offset + flare,
            RIBBON_LINE_WIDTH,
            color,
        );
    }
}

/// Draws every branch segment, pre-order from `cfg.base_pos`.
pub fn draw_branches(
    tree: &Tree,
    cfg: &RenderConfig,
    target: &mut RgbaImage,
) -> Result<(), PaletteError> {
    let palette = tree.palette();
    let colors = [palette.get(TRUNK0)?, palette.get(TRUNK1)?];

    let mut stack = vec![(ROOT, cfg.base_pos)];
    while let Some((id, anchor)) = stack.pop() {
        let node = tree.node(id);
        let tip = tip_position(anchor, node.length as f32, node.angle);
        let width = branch_width(tree.count(Some(id)), cfg.trunk_width_power);

        fill_circle(target, tip, width * JOINT_RADIUS, colors[0]);
        draw_ribbon(target, anchor, tip, node.angle, width, colors);

        stack.extend(node.right().map(|r| (r, tip)));
        stack.extend(node.left().map(|l| (l, tip)));
    }
    Ok(())
}

/// Composites the leaf cluster of every segment near a tip, centered on
/// the segment's end.
///
/// Clusters are taken as built by [`Tree::refresh_leaves`]; a node without
/// one is skipped.
pub fn draw_leaves(tree: &Tree, cfg: &RenderConfig, target: &mut RgbaImage) {
    let half = cfg.leaf_size as f32 / 2.0;
    let mut stack = vec![(ROOT, cfg.base_pos)];
    while let Some((id, anchor)) = stack.pop() {
        let node = tree.node(id);
        let tip = tip_position(anchor, node.length as f32, node.angle);

        if tree.count(Some(id)) < cfg.children_for_leaves {
            match node.leaves() {
                Some(cluster) => imageops::overlay(
                    target,
                    cluster.image(),
                    (tip.x - half) as i64,
                    (tip.y - half) as i64,
                ),
                None => log::warn!("node {id} has no leaf cluster; skipping"),
            }
        }

        stack.extend(node.right().map(|r| (r, tip)));
        stack.extend(node.left().map(|l| (l, tip)));
    }
}

/// Downscales by `scale` (nearest) and back, giving `scale`-sized blocks.
pub fn pixelate(img: &RgbaImage, scale: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let small = scale_nearest(img, w / scale, h / scale);
    scale_nearest(&small, w, h)
}

/// Adds a one-pixel cardinal outline in `color` around everything with
/// alpha above the coverage threshold, with the original art on top.
pub fn outline(img: &RgbaImage, color: Rgba<u8>) -> RgbaImage {
    let mut out = Mask::from_alpha(img).dilated().to_image(color);
    imageops::overlay(&mut out, img, 0, 0);
    out
}

/// [`pixelate`] with the outline applied at low resolution, so the outline
/// is one block thick.
pub fn pixelate_and_outline(img: &RgbaImage, scale: u32, color: Rgba<u8>) -> RgbaImage {
    let (w, h) = img.dimensions();
    let small = scale_nearest(img, w / scale, h / scale);
    scale_nearest(&outline(&small, color), w, h)
}

/// Flat shadow of `img`'s coverage, squashed to `height / ratio` rows.
///
/// Also returns the centroid of the unsquashed coverage.
pub fn shadow(img: &RgbaImage, color: Rgba<u8>, ratio: f32) -> ((u32, u32), RgbaImage) {
    let mask = Mask::from_alpha(img);
    let flat = mask.to_image(color);
    let squashed_h = (img.height() as f32 / ratio).floor() as u32;
    (mask.centroid(), scale_nearest(&flat, img.width(), squashed_h))
}

/// Row at which the squashed shadow image is overlaid, so that the leaf
/// centroid at `centroid_y` lands on `cfg.shadow_base`.
pub fn shadow_offset(cfg: &RenderConfig, centroid_y: u32) -> i64 {
    (cfg.shadow_base - (centroid_y as f32 / cfg.shadow_ratio).floor()) as i64
}

/// Owns the intermediate buffers and the latest finished composite.
#[derive(Debug)]
pub struct RenderPipeline {
    cfg: RenderConfig,
    branches: RgbaImage,
    leaves: RgbaImage,
    scratch: RgbaImage,
    composite: RgbaImage,
}

impl RenderPipeline {
    pub fn new(cfg: RenderConfig) -> Self {
        let blank = || RgbaImage::new(cfg.surface_width, cfg.surface_height);
        Self {
            cfg,
            branches: blank(),
            leaves: blank(),
            scratch: blank(),
            composite: blank(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    /// The last successfully rendered image.
    pub fn composite(&self) -> &RgbaImage {
        &self.composite
    }

    /// Re-renders `tree` into a fresh composite.
    ///
    /// Leaf clusters must be current (see [`Tree::refresh_leaves`]). On
    /// error the previous composite is kept.
    pub fn render(&mut self, tree: &Tree) -> Result<(), PaletteError> {
        let palette = tree.palette();
        let trunk_outline = palette.get(TRUNK_OUTLINE)?;
        let leaves_outline = palette.get(LEAVES_OUTLINE)?;
        let shadow_color = palette.get(SHADOW_COLOR)?;
        let scale = self.cfg.pixel_scale;

        clear(&mut self.branches);
        clear(&mut self.leaves);
        draw_branches(tree, &self.cfg, &mut self.branches)?;
        draw_leaves(tree, &self.cfg, &mut self.leaves);

        let leaves = pixelate_and_outline(&self.leaves, scale, leaves_outline);
        let ((_, cy), shadow_img) = shadow(&leaves, shadow_color, self.cfg.shadow_ratio);
        let shadow_y = shadow_offset(&self.cfg, cy);
        let branches = pixelate_and_outline(&self.branches, scale, trunk_outline);

        clear(&mut self.scratch);
        imageops::overlay(&mut self.scratch, &pixelate(&shadow_img, scale), 0, shadow_y);
        imageops::overlay(&mut self.scratch, &branches, 0, 0);
        imageops::overlay(&mut self.scratch, &leaves, 0, 0);

        std::mem::swap(&mut self.scratch, &mut self.composite);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrowthConfig;
    use crate::palette::Palette;
    use crate::raster::{TRANSPARENT, covered_pixels, fill_rect};
    use crate::types::Side;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn sapling(palette: Palette) -> Tree {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tree = Tree::new(Arc::new(palette), GrowthConfig::default(), 64, &mut rng);
        tree.refresh_leaves().unwrap();
        tree
    }

    fn noise_image(w: u32, h: u32, seed: u64) -> RgbaImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbaImage::from_fn(w, h, |_, _| Rgba(rng.random()))
    }

    #[test]
    fn straight_up_branch_tip() {
        let tip = tip_position(Vec2::new(200.0, 500.0), 30.0, 90.0);
        assert!((tip.x - 200.0).abs() < 1e-4);
        assert!((tip.y - 470.0).abs() < 1e-4);

        let right = tip_position(Vec2::ZERO, 10.0, 0.0);
        assert!((right - Vec2::new(10.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn width_grows_sublinearly() {
        assert_eq!(branch_width(1, 0.75), 1.0);
        assert!((branch_width(16, 0.75) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn pixelate_is_idempotent() {
        let img = noise_image(40, 24, 1);
        let once = pixelate(&img, 4);
        assert_eq!(pixelate(&once, 4), once);
        assert_ne!(once, img);
    }

    #[test]
    fn pixelate_produces_uniform_blocks() {
        let img = noise_image(16, 16, 2);
        let out = pixelate(&img, 4);
        for by in 0..4 {
            for bx in 0..4 {
                let corner = *img.get_pixel(bx * 4, by * 4);
                for y in 0..4 {
                    for x in 0..4 {
                        assert_eq!(*out.get_pixel(bx * 4 + x, by * 4 + y), corner);
                    }
                }
            }
        }
    }

    #[test]
    fn outline_rings_a_single_pixel() {
        let mut img = RgbaImage::new(5, 5);
        img.put_pixel(2, 2, RED);
        let out = outline(&img, BLACK);
        assert_eq!(*out.get_pixel(2, 2), RED);
        for (x, y) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(*out.get_pixel(x, y), BLACK);
        }
        assert_eq!(*out.get_pixel(1, 1), TRANSPARENT);
        assert_eq!(covered_pixels(&out), 5);
    }

    #[test]
    fn faint_pixels_get_no_outline() {
        let mut img = RgbaImage::new(5, 5);
        img.put_pixel(2, 2, Rgba([255, 0, 0, 100]));
        let out = outline(&img, BLACK);
        assert_eq!(*out.get_pixel(1, 2), TRANSPARENT);
    }

    #[test]
    fn shadow_squashes_and_reports_centroid() {
        let mut img = RgbaImage::new(12, 12);
        fill_rect(&mut img, 2, 6, 4, 6, RED);
        let shade = Rgba([0, 0, 0, 90]);
        let ((cx, cy), out) = shadow(&img, shade, 1.5);
        assert_eq!((cx, cy), (3, 8));
        assert_eq!(out.dimensions(), (12, 8));
        assert!(out.pixels().all(|p| *p == shade || *p == TRANSPARENT));
        // Rows 6..12 of the source land on rows 4..8 after squashing.
        assert_eq!(*out.get_pixel(3, 3), TRANSPARENT);
        assert_eq!(*out.get_pixel(3, 4), shade);
    }

    #[test]
    fn shadow_offset_anchors_centroid_to_base() {
        let cfg = RenderConfig::default();
        assert_eq!(shadow_offset(&cfg, 470), 470 - 313);
        assert_eq!(shadow_offset(&cfg, 0), 470);
    }

    #[test]
    fn single_branch_uses_trunk_colors_above_base() {
        let tree = sapling(Palette::green());
        let cfg = RenderConfig::default();
        let mut img = RgbaImage::new(cfg.surface_width, cfg.surface_height);
        draw_branches(&tree, &cfg, &mut img).unwrap();

        let palette = Palette::green();
        let trunk = [palette.get(TRUNK0).unwrap(), palette.get(TRUNK1).unwrap()];
        assert!(covered_pixels(&img) > 0);
        for (x, y, p) in img.enumerate_pixels() {
            if p.0[3] > 0 {
                assert!(trunk.contains(p));
                assert!((195..=205).contains(&x), "x = {x}");
                assert!((465..=505).contains(&y), "y = {y}");
            }
        }
    }

    #[test]
    fn branches_follow_children() {
        let mut tree = sapling(Palette::green());
        let left = tree.add_child(ROOT, Side::Left, 2, 40, 180.0, 0);
        tree.add_child(left, Side::Left, 4, 40, 180.0, 0);
        let cfg = RenderConfig::default();
        let mut img = RgbaImage::new(cfg.surface_width, cfg.surface_height);
        draw_branches(&tree, &cfg, &mut img).unwrap();
        // Two horizontal segments to the left of the trunk tip at (200, 470).
        assert!(img.get_pixel(150, 470).0[3] > 0);
        assert!(img.get_pixel(130, 470).0[3] > 0);
        assert_eq!(img.get_pixel(250, 470).0[3], 0);
    }

    #[test]
    fn leaves_only_near_tips() {
        let mut tree = sapling(Palette::green());
        let cfg = RenderConfig::default();
        let mut parent = ROOT;
        // A straight chain of 7 segments: only the top 5 carry leaves.
        for _ in 0..6 {
            parent = tree.add_child(parent, Side::Left, 0, 30, 90.0, 0);
        }
        tree.refresh_leaves().unwrap();
        let mut img = RgbaImage::new(cfg.surface_width, cfg.surface_height);
        draw_leaves(&tree, &cfg, &mut img);

        // Tips of the root and the first child sit at y = 470 and 440; the
        // clusters drawn there would reach below y = 440 + 32.
        let lowest = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] > 0)
            .map(|(_, y, _)| y)
            .max()
            .unwrap();
        assert!(lowest < 410 + 32, "lowest leaf pixel at {lowest}");
    }

    #[test]
    fn pipeline_renders_a_sapling() {
        let tree = sapling(Palette::green());
        let mut pipeline = RenderPipeline::new(RenderConfig::default());
        pipeline.render(&tree).unwrap();

        let img = pipeline.composite();
        assert_eq!(img.dimensions(), (400, 600));
        let palette = Palette::green();
        let has = |key| img.pixels().any(|p| *p == palette.get(key).unwrap());
        assert!(has(TRUNK_OUTLINE));
        assert!(has(LEAVES_OUTLINE));
        assert!(img.pixels().all(|p| p.0[3] == 0 || p.0[3] >= 100));
    }

    #[test]
    fn composite_places_blocky_shadow_below_leaves() {
        // Anchored low enough that nothing else overlaps the shadow.
        let cfg = RenderConfig {
            shadow_base: 560.0,
            ..RenderConfig::default()
        };
        let palette = Palette::green();
        let tree = sapling(palette.clone());
        let mut pipeline = RenderPipeline::new(cfg);
        pipeline.render(&tree).unwrap();
        let img = pipeline.composite();

        let mut leaves = RgbaImage::new(cfg.surface_width, cfg.surface_height);
        draw_leaves(&tree, &cfg, &mut leaves);
        let leaves = pixelate_and_outline(&leaves, cfg.pixel_scale, palette.get(LEAVES_OUTLINE).unwrap());
        let ((_, cy), squashed) = shadow(&leaves, palette.get(SHADOW_COLOR).unwrap(), cfg.shadow_ratio);
        let shade = pixelate(&squashed, cfg.pixel_scale);
        assert_eq!(pixelate(&shade, cfg.pixel_scale), shade);

        let shadow_y = shadow_offset(&cfg, cy);
        let mut expected: Vec<(u32, u32)> = shade
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] > 0)
            .map(|(x, y, _)| (x, (y as i64 + shadow_y) as u32))
            .collect();
        let mut translucent: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] > 0 && p.0[3] < 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        expected.sort_unstable();
        translucent.sort_unstable();
        assert!(!translucent.is_empty());
        assert_eq!(translucent, expected);

        let top = translucent.iter().map(|&(_, y)| y).min().unwrap();
        let first_row = shade
            .enumerate_pixels()
            .find(|(_, _, p)| p.0[3] > 0)
            .map(|(_, y, _)| y)
            .unwrap();
        assert_eq!(top as i64, shadow_y + first_row as i64);
        assert_eq!((top as i64 - shadow_y) % cfg.pixel_scale as i64, 0);
        let lowest_leaf = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] == 255)
            .map(|(_, y, _)| y)
            .max()
            .unwrap();
        assert!(lowest_leaf < top, "shadow at {top} overlaps art ending at {lowest_leaf}");
    }

    #[test]
    fn failed_render_keeps_previous_composite() {
        let mut tree = sapling(Palette::green());
        let mut pipeline = RenderPipeline::new(RenderConfig::default());
        pipeline.render(&tree).unwrap();
        let before = pipeline.composite().clone();

        let mut partial = Palette::new();
        for (key, rgba) in Palette::green().iter() {
            if key != TRUNK_OUTLINE {
                partial.insert(key, rgba);
            }
        }
        tree.change_color(Arc::new(partial)).unwrap();
        let err = pipeline.render(&tree).unwrap_err();
        assert_eq!(err, PaletteError::MissingKey(TRUNK_OUTLINE.to_owned()));
        assert_eq!(*pipeline.composite(), before);
    }
}
