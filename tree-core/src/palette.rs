//! Named color tables for the tree renderer.
//!
//! A [`Palette`] maps color-slot names (`"trunk0"`, `"leaves_outline"`, ...)
//! to RGBA colors. Lookups never fall back to a default: a missing slot is a
//! [`PaletteError::MissingKey`], so a bad palette fails loudly instead of
//! silently drawing in the wrong color.
//!
//! A [`PaletteBook`] is a collection of palettes keyed by name, as stored in
//! a palette JSON file. Colors are serialized as `[r, g, b, a]` arrays; on
//! input `[r, g, b]` is also accepted and treated as opaque.

use std::collections::BTreeMap;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::PaletteError;

pub const TRUNK0: &str = "trunk0";
pub const TRUNK1: &str = "trunk1";
pub const TRUNK_OUTLINE: &str = "trunk_outline";
pub const LEAVES_OUTLINE: &str = "leaves_outline";
pub const SHADOW_COLOR: &str = "shadow_color";

/// Number of leaf color tiers; slots are `leaves0` .. `leaves{N-1}`.
pub const LEAF_TIERS: usize = 3;

/// Every slot the renderer and the leaf generator look up.
pub const REQUIRED_KEYS: [&str; 8] = [
    TRUNK0,
    TRUNK1,
    TRUNK_OUTLINE,
    "leaves0",
    "leaves1",
    "leaves2",
    LEAVES_OUTLINE,
    SHADOW_COLOR,
];

/// Slot name for a leaf color tier (`0` is the lightest).
pub fn leaves_key(tier: usize) -> String {
    format!("leaves{}", tier)
}

/// A color as written in a palette file: three or four channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Rgba([u8; 4]),
    Rgb([u8; 3]),
}

impl From<ColorValue> for [u8; 4] {
    fn from(value: ColorValue) -> Self {
        match value {
            ColorValue::Rgba(c) => c,
            ColorValue::Rgb([r, g, b]) => [r, g, b, 255],
        }
    }
}

/// Color-slot name → RGBA color.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ColorValue>",
    into = "BTreeMap<String, [u8; 4]>"
)]
pub struct Palette {
    colors: BTreeMap<String, [u8; 4]>,
}

impl From<BTreeMap<String, ColorValue>> for Palette {
    fn from(map: BTreeMap<String, ColorValue>) -> Self {
        Self {
            colors: map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

impl From<Palette> for BTreeMap<String, [u8; 4]> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for literal palettes.
    pub fn with(mut self, key: &str, rgba: [u8; 4]) -> Self {
        self.insert(key, rgba);
        self
    }

    pub fn insert(&mut self, key: &str, rgba: [u8; 4]) {
        self.colors.insert(key.to_owned(), rgba);
    }

    /// Looks up a slot.
    ///
    /// ### Errors
    /// [`PaletteError::MissingKey`] if the slot is not defined.
    pub fn get(&self, key: &str) -> Result<Rgba<u8>, PaletteError> {
        self.colors
            .get(key)
            .map(|&c| Rgba(c))
            .ok_or_else(|| PaletteError::MissingKey(key.to_owned()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.colors.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, [u8; 4])> {
        self.colors.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Checks that every slot in [`REQUIRED_KEYS`] is present, reporting the
    /// first one that is not.
    pub fn validate(&self) -> Result<(), PaletteError> {
        match REQUIRED_KEYS.iter().find(|k| !self.contains(k)) {
            Some(missing) => Err(PaletteError::MissingKey((*missing).to_owned())),
            None => Ok(()),
        }
    }

    pub fn green() -> Self {
        Self::new()
            .with(TRUNK0, [110, 80, 50, 255])
            .with(TRUNK1, [90, 62, 40, 255])
            .with(TRUNK_OUTLINE, [52, 36, 28, 255])
            .with("leaves0", [100, 140, 50, 255])
            .with("leaves1", [90, 130, 40, 255])
            .with("leaves2", [80, 120, 30, 255])
            .with(LEAVES_OUTLINE, [42, 70, 26, 255])
            .with(SHADOW_COLOR, [60, 90, 40, 120])
    }

    pub fn autumn() -> Self {
        Self::new()
            .with(TRUNK0, [105, 72, 48, 255])
            .with(TRUNK1, [84, 56, 38, 255])
            .with(TRUNK_OUTLINE, [48, 32, 26, 255])
            .with("leaves0", [232, 152, 52, 255])
            .with("leaves1", [212, 112, 40, 255])
            .with("leaves2", [182, 72, 32, 255])
            .with(LEAVES_OUTLINE, [110, 40, 22, 255])
            .with(SHADOW_COLOR, [90, 100, 40, 120])
    }

    pub fn cherry() -> Self {
        Self::new()
            .with(TRUNK0, [92, 62, 56, 255])
            .with(TRUNK1, [72, 46, 44, 255])
            .with(TRUNK_OUTLINE, [40, 26, 30, 255])
            .with("leaves0", [250, 202, 216, 255])
            .with("leaves1", [240, 172, 196, 255])
            .with("leaves2", [222, 140, 170, 255])
            .with(LEAVES_OUTLINE, [150, 80, 110, 255])
            .with(SHADOW_COLOR, [80, 100, 50, 120])
    }
}

/// A named collection of palettes, the on-disk palette file format.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteBook {
    palettes: BTreeMap<String, Palette>,
}

impl PaletteBook {
    /// The presets shipped with the viewer: `green`, `autumn` and `cherry`.
    pub fn builtin() -> Self {
        let mut book = Self::default();
        book.palettes.insert("green".to_owned(), Palette::green());
        book.palettes.insert("autumn".to_owned(), Palette::autumn());
        book.palettes.insert("cherry".to_owned(), Palette::cherry());
        book
    }

    pub fn from_json(src: &str) -> Result<Self, PaletteError> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, PaletteError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, name: &str) -> Result<&Palette, PaletteError> {
        self.palettes
            .get(name)
            .ok_or_else(|| PaletteError::UnknownPalette(name.to_owned()))
    }

    /// Adds or replaces a palette. Incomplete palettes are rejected so a
    /// book never hands out something the renderer cannot draw with.
    pub fn insert(&mut self, name: &str, palette: Palette) -> Result<(), PaletteError> {
        palette.validate()?;
        self.palettes.insert(name.to_owned(), palette);
        Ok(())
    }

    /// Copies every palette of `other` into `self`, overwriting same names.
    pub fn merge(&mut self, other: PaletteBook) {
        self.palettes.extend(other.palettes);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}
