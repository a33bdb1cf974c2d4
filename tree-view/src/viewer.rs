//! Interactive pixel tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the growing [`Plant`], the
//! palette book and the recorded frames, and implements [`eframe::App`]
//! to display the plant's composite and control growth through an egui UI.

use std::path::PathBuf;

use eframe::App;
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tree_core::config::Config;
use tree_core::{Palette, PaletteBook, Plant, PlantError};

use crate::export;

/// Color behind the tree, on screen and in exports.
pub const BACKGROUND: Rgba<u8> = Rgba([130, 170, 70, 255]);

/// Start-up settings, filled from the command line.
#[derive(Clone, Debug)]
pub struct ViewerOptions {
    pub config: Config,
    pub seed: Option<u64>,
    pub max_nodes: usize,
    pub palettes: PaletteBook,
    pub palette: String,
    pub out_dir: PathBuf,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            config: Config::default(),
            seed: None,
            max_nodes: 50,
            palettes: PaletteBook::builtin(),
            palette: "green".to_owned(),
            out_dir: PathBuf::from("out"),
        }
    }
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Upload the composite to the GPU if it changed and draw it centered
///    over [`BACKGROUND`].
///
/// ### Fields
/// - `plant` - The tree being grown and its latest composite.
/// - `palettes` / `palette_name` - Available palettes and the active one.
/// - `seeds` - Source of per-tree seeds, so "New tree" is reproducible from `--seed`.
/// - `seed` - Seed of the current tree (shown in the status bar).
///
/// - `recording` - Whether each growing tick is appended to `frames`.
/// - `frames` - Flattened frames recorded so far.
///
/// - `texture` - GPU copy of the composite; `dirty` marks it stale.
/// - `status` - Last error or export message, shown in the status bar.
pub struct Viewer {
    plant: Plant,
    palettes: PaletteBook,
    palette_name: String,
    seeds: StdRng,
    seed: u64,
    out_dir: PathBuf,

    running: bool,
    recording: bool,
    frames: Vec<RgbaImage>,

    texture: Option<egui::TextureHandle>,
    dirty: bool,
    status: Option<String>,

    step_interval: f64,
    last_step_time: f64,
}

impl Viewer {
    /// Creates a viewer with a fresh single-segment tree.
    ///
    /// ### Errors
    /// [`PlantError::Palette`] if `opts.palette` is not in the book or is
    /// incomplete, [`PlantError::Config`] if `opts.config` is out of range.
    pub fn new(opts: ViewerOptions) -> Result<Self, PlantError> {
        let mut seeds = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let seed = seeds.random();
        let palette = opts.palettes.get(&opts.palette)?.clone();
        let plant = Self::plant(palette, opts.max_nodes, opts.config, seed)?;
        log::info!("palette '{}', seed {}", opts.palette, seed);

        Ok(Self {
            plant,
            palettes: opts.palettes,
            palette_name: opts.palette,
            seeds,
            seed,
            out_dir: opts.out_dir,
            running: false,
            recording: false,
            frames: Vec::new(),
            texture: None,
            dirty: true,
            status: None,
            step_interval: 1.0 / 60.0,
            last_step_time: 0.0,
        })
    }

    fn plant(
        palette: Palette,
        max_nodes: usize,
        config: Config,
        seed: u64,
    ) -> Result<Plant, PlantError> {
        Plant::with_config(palette, max_nodes, config, StdRng::seed_from_u64(seed))
    }

    /// Replaces the tree with a new single segment, keeping palette, node
    /// cap and configuration. Recorded frames are dropped.
    fn reset(&mut self) {
        let seed = self.seeds.random();
        let palette = self.plant.palette().clone();
        match Self::plant(palette, self.plant.max_nodes(), *self.plant.config(), seed) {
            Ok(plant) => {
                self.plant = plant;
                self.seed = seed;
                self.frames.clear();
                self.status = None;
                self.dirty = true;
                log::info!("new tree, seed {}", seed);
            }
            Err(e) => self.report(format!("Cannot create tree: {e}")),
        }
        self.running = false;
    }

    /// Advances the plant by one tick and records the frame if it grew.
    ///
    /// A render error stops auto-running; the last good frame stays on
    /// screen.
    fn step_once(&mut self) {
        match self.plant.grow() {
            Ok(grew) => {
                if grew && self.recording {
                    self.frames
                        .push(export::flatten(self.plant.composite(), BACKGROUND));
                }
                self.dirty = true;
            }
            Err(e) => {
                self.running = false;
                self.report(format!("Render failed: {e}"));
            }
        }
    }

    /// Recolors the current tree with the palette called `name`.
    fn select_palette(&mut self, name: &str) {
        let result = self
            .palettes
            .get(name)
            .cloned()
            .and_then(|palette| self.plant.change_color(palette));
        match result {
            Ok(()) => {
                self.palette_name = name.to_owned();
                self.dirty = true;
                log::info!("palette '{}'", name);
            }
            Err(e) => self.report(format!("Palette '{name}': {e}")),
        }
    }

    fn save_screenshot(&mut self) {
        let path = self
            .out_dir
            .join(format!("tree_{}_{}.png", self.seed, self.plant.age()));
        match export::save_png(&path, self.plant.composite(), BACKGROUND) {
            Ok(()) => self.status = Some(format!("Saved {}", path.display())),
            Err(e) => self.report(format!("Save failed: {e}")),
        }
    }

    fn save_recording(&mut self) {
        let dir = self.out_dir.join(format!("frames_{}", self.seed));
        match export::save_frames(&dir, &self.frames) {
            Ok(n) => self.status = Some(format!("Saved {} frames to {}", n, dir.display())),
            Err(e) => self.report(format!("Save failed: {e}")),
        }
    }

    fn report(&mut self, msg: String) {
        log::error!("{}", msg);
        self.status = Some(msg);
    }

    /// Builds the top panel UI (run controls, stepping, palettes, export).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("New tree").clicked() {
                    self.reset();
                }

                ui.separator();
                let names: Vec<String> = self.palettes.names().map(str::to_owned).collect();
                for name in names {
                    if ui
                        .selectable_label(self.palette_name == name, name.as_str())
                        .clicked()
                    {
                        self.select_palette(&name);
                    }
                }

                ui.separator();
                if ui.button("Save PNG").clicked() {
                    self.save_screenshot();
                }
                ui.checkbox(&mut self.recording, "Record");
                if ui
                    .add_enabled(!self.frames.is_empty(), egui::Button::new("Save frames"))
                    .clicked()
                {
                    self.save_recording();
                }
            });
        });
    }

    /// Builds the bottom status bar (tick, node count, growth state).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status.as_str());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(if self.plant.is_done() { "done" } else { "growing" });
                    ui.separator();
                    ui.label(format!("frames = {}", self.frames.len()));
                    ui.label(format!(
                        "nodes = {} / {}",
                        self.plant.node_count(),
                        self.plant.max_nodes()
                    ));
                    ui.label(format!("tick = {}", self.plant.age()));
                    ui.label(format!("seed = {}", self.seed));
                });
            });
        });
    }

    /// Builds the right-hand panel for growth limits and timing.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(180.0)
            .show(ctx, |ui| {
                ui.heading("Growth");

                let mut max_nodes = self.plant.max_nodes();
                ui.horizontal(|ui| {
                    ui.label("max_nodes:");
                    ui.add(egui::DragValue::new(&mut max_nodes).range(1..=500).speed(1.0));
                });
                if max_nodes != self.plant.max_nodes() {
                    self.plant.set_max_nodes(max_nodes);
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );
            });
    }

    /// Builds the central panel showing the composite over the background.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        let [r, g, b, _] = BACKGROUND.0;
        let frame = egui::Frame::new().fill(egui::Color32::from_rgb(r, g, b));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            let img = self.plant.composite();
            let size = [img.width() as usize, img.height() as usize];

            if self.dirty || self.texture.is_none() {
                let pixels = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
                match &mut self.texture {
                    Some(texture) => texture.set(pixels, egui::TextureOptions::NEAREST),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("plant", pixels, egui::TextureOptions::NEAREST));
                    }
                }
                self.dirty = false;
            }

            if let Some(texture) = &self.texture {
                let rect = egui::Rect::from_center_size(
                    ui.max_rect().center(),
                    egui::vec2(size[0] as f32, size[1] as f32),
                );
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                ui.painter()
                    .image(texture.id(), rect, uv, egui::Color32::WHITE);
            }

            // Auto-run growth if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                if now - self.last_step_time >= self.step_interval {
                    self.step_once();
                    self.last_step_time = now;
                }
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
