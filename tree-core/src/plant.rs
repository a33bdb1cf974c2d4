//! The growing plant as seen from outside: one tree, one random source and
//! the latest rendered frame.
//!
//! A driver calls [`Plant::grow`] once per tick and blits
//! [`Plant::composite`] (or uses [`Plant::draw`]) afterwards.

use std::sync::Arc;

use image::{RgbaImage, imageops};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::error::{PaletteError, PlantError};
use crate::growth::{self, StepReport};
use crate::palette::Palette;
use crate::render::RenderPipeline;
use crate::tree::{ROOT, Tree};

/// A tree that grows by one step per tick until it has `max_nodes`
/// segments, together with its cached composite.
#[derive(Debug)]
pub struct Plant<R: Rng = StdRng> {
    tree: Tree,
    age: i32,
    max_nodes: usize,
    config: Config,
    pipeline: RenderPipeline,
    rng: R,
    last_step: Option<StepReport>,
}

impl Plant<StdRng> {
    /// Shorthand for [`Plant::new`] with a seeded [`StdRng`].
    pub fn from_seed(palette: Palette, max_nodes: usize, seed: u64) -> Result<Self, PlantError> {
        Self::new(palette, max_nodes, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Plant<R> {
    /// A single-segment plant with default tuning, already rendered once.
    ///
    /// ### Errors
    /// [`PlantError::Palette`] if `palette` lacks a required slot.
    pub fn new(palette: Palette, max_nodes: usize, rng: R) -> Result<Self, PlantError> {
        Self::with_config(palette, max_nodes, Config::default(), rng)
    }

    /// Like [`Plant::new`] with explicit tuning.
    ///
    /// ### Errors
    /// [`PlantError::Config`] if `config` fails [`Config::validate`],
    /// [`PlantError::Palette`] if `palette` lacks a required slot.
    pub fn with_config(
        palette: Palette,
        max_nodes: usize,
        config: Config,
        mut rng: R,
    ) -> Result<Self, PlantError> {
        config.validate()?;
        palette.validate()?;
        let tree = Tree::new(
            Arc::new(palette),
            config.growth,
            config.render.leaf_size,
            &mut rng,
        );
        let mut plant = Self {
            tree,
            age: 0,
            max_nodes,
            config,
            pipeline: RenderPipeline::new(config.render),
            rng,
            last_step: None,
        };
        plant.render()?;
        log::debug!(
            "new plant: max_nodes = {}, root length = {}",
            max_nodes,
            plant.tree.node(ROOT).length
        );
        Ok(plant)
    }

    /// Advances one tick if the plant is below its node cap, then re-renders.
    ///
    /// Returns whether the tree grew. The frame is rendered either way; if
    /// that fails the previous composite is kept and the error returned.
    /// A growth step taken before the failure is not rolled back: [`age`]
    /// and [`last_step`] already reflect it.
    ///
    /// [`age`]: Plant::age
    /// [`last_step`]: Plant::last_step
    pub fn grow(&mut self) -> Result<bool, PaletteError> {
        let grew = self.node_count() < self.max_nodes;
        if grew {
            self.age += 1;
            let report = growth::step(&mut self.tree, self.age, &mut self.rng);
            log::trace!("tick {}: {:?}", self.age, report);
            self.last_step = Some(report);

            if self.node_count() >= self.max_nodes {
                log::debug!(
                    "plant reached {} nodes at tick {}",
                    self.node_count(),
                    self.age
                );
            }
        }
        if let Err(e) = self.render() {
            log::error!("render failed at tick {}: {}", self.age, e);
            return Err(e);
        }
        Ok(grew)
    }

    fn render(&mut self) -> Result<(), PaletteError> {
        self.tree.refresh_leaves()?;
        self.pipeline.render(&self.tree)
    }

    /// Composites the latest frame onto `target` with its top-left corner at
    /// `(x, y)`.
    pub fn draw(&self, target: &mut RgbaImage, x: i64, y: i64) {
        imageops::overlay(target, self.pipeline.composite(), x, y);
    }

    /// Recolors the plant in place. Geometry and leaf layout are untouched.
    ///
    /// ### Errors
    /// [`PaletteError::MissingKey`] if `palette` is incomplete; the plant
    /// then keeps its old palette and frame.
    pub fn change_color(&mut self, palette: Palette) -> Result<(), PaletteError> {
        palette.validate()?;
        self.tree.change_color(Arc::new(palette))?;
        log::debug!("palette changed at tick {}", self.age);
        self.pipeline.render(&self.tree)
    }

    /// The latest successfully rendered frame.
    pub fn composite(&self) -> &RgbaImage {
        self.pipeline.composite()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Number of ticks that produced growth.
    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Changes the node cap. Lowering it below the current count stops
    /// growth; nothing is removed.
    pub fn set_max_nodes(&mut self, max_nodes: usize) {
        self.max_nodes = max_nodes;
    }

    pub fn node_count(&self) -> usize {
        self.tree.count(Some(ROOT)) as usize
    }

    pub fn is_done(&self) -> bool {
        self.node_count() >= self.max_nodes
    }

    pub fn palette(&self) -> &Palette {
        self.tree.palette()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn last_step(&self) -> Option<&StepReport> {
        self.last_step.as_ref()
    }
}
