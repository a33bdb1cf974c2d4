//! Procedural pixel-art tree library.
//!
//! Main components:
//! - [`tree`]: branch segment arena with cached subtree sizes.
//! - [`growth`]: per-tick growth and bend phases.
//! - [`leaves`]: seeded foliage sprites.
//! - [`palette`]: named color tables and palette files.
//! - [`raster`] / [`mask`]: pixel primitives and coverage masks.
//! - [`render`]: pixelate, outline, shadow and composite passes.
//! - [`plant`]: the growing plant a driver ticks and draws.
//! - [`config`]: tuning constants for growth and rendering.
//! - [`error`]: palette, config and plant construction errors.
//! - [`types`]: shared ids and small enums.

pub mod config;
pub mod error;
pub mod growth;
pub mod leaves;
pub mod mask;
pub mod palette;
pub mod plant;
pub mod raster;
pub mod render;
pub mod tree;
pub mod types;

pub use error::{ConfigError, PaletteError, PlantError};
pub use palette::{Palette, PaletteBook};
pub use plant::Plant;
