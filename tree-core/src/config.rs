//! Tuning constants for growth and rendering.
//!
//! Everything here has a sensible [`Default`]; the viewer can override any
//! subset of fields from a JSON file thanks to `#[serde(default)]`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of the stochastic growth process.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub start_branch_len: i32,
    /// Degrees from horizontal; 90 points straight up.
    pub start_branch_angle: f32,
    pub min_length: i32,
    pub max_length: i32,
    pub min_angle_left: i32,
    pub max_angle_left: i32,
    pub min_angle_right: i32,
    pub max_angle_right: i32,
    /// Applied to a bent node and its direct children. Negative, so bending
    /// makes a branch eligible for growth sooner.
    pub bend_age_change: i32,
    pub grow_age_change: i32,
    pub grow_length_change: i32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            start_branch_len: 30,
            start_branch_angle: 90.0,
            min_length: 12,
            max_length: 40,
            min_angle_left: 100,
            max_angle_left: 145,
            min_angle_right: 35,
            max_angle_right: 80,
            bend_age_change: -3,
            grow_age_change: 12,
            grow_length_change: 2,
        }
    }
}

/// Parameters of the render pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub surface_width: u32,
    pub surface_height: u32,
    /// Where the root branch starts, in surface pixels.
    pub base_pos: Vec2,
    /// Row the squashed shadow is anchored to.
    pub shadow_base: f32,
    /// Vertical squash factor applied to the leaf shadow.
    pub shadow_ratio: f32,
    pub trunk_width_power: f32,
    /// Nodes whose subtree is smaller than this carry a leaf cluster.
    pub children_for_leaves: u32,
    /// Linear downscale factor used by the pixelate passes.
    pub pixel_scale: u32,
    pub leaf_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let surface_width = 400;
        let surface_height = 600;
        let base_pos = Vec2::new(surface_width as f32 / 2.0, surface_height as f32 - 100.0);
        Self {
            surface_width,
            surface_height,
            base_pos,
            shadow_base: base_pos.y - 30.0,
            shadow_ratio: 1.5,
            trunk_width_power: 0.75,
            children_for_leaves: 6,
            pixel_scale: 4,
            leaf_size: 64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub growth: GrowthConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Parses a (possibly partial) JSON override on top of the defaults
    /// and checks the result with [`Config::validate`].
    pub fn from_json(src: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values that would make growth or rendering panic.
    ///
    /// Length and angle ranges must not be inverted, `pixel_scale` must be
    /// at least 1 and `shadow_ratio` must be a positive finite number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.growth;
        let r = &self.render;
        let checks = [
            (g.min_length > g.max_length, "min_length", "exceeds max_length"),
            (
                g.min_angle_left > g.max_angle_left,
                "min_angle_left",
                "exceeds max_angle_left",
            ),
            (
                g.min_angle_right > g.max_angle_right,
                "min_angle_right",
                "exceeds max_angle_right",
            ),
            (r.pixel_scale == 0, "pixel_scale", "must be at least 1"),
            (
                !(r.shadow_ratio > 0.0 && r.shadow_ratio.is_finite()),
                "shadow_ratio",
                "must be positive and finite",
            ),
        ];
        match checks.into_iter().find(|(bad, _, _)| *bad) {
            Some((_, field, reason)) => Err(ConfigError::Invalid { field, reason }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_layout() {
        let cfg = Config::default();
        assert_eq!(cfg.render.base_pos, Vec2::new(200.0, 500.0));
        assert_eq!(cfg.render.shadow_base, 470.0);
        assert_eq!(cfg.growth.start_branch_angle, 90.0);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg = Config::from_json(r#"{ "growth": { "max_length": 55 } }"#).unwrap();
        assert_eq!(cfg.growth.max_length, 55);
        assert_eq!(cfg.growth.min_length, 12);
        assert_eq!(cfg.render, RenderConfig::default());
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    fn rejected_field(json: &str) -> &'static str {
        match Config::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected a rejection for {json}, got {other:?}"),
        }
    }

    #[test]
    fn zero_pixel_scale_is_rejected() {
        assert_eq!(rejected_field(r#"{ "render": { "pixel_scale": 0 } }"#), "pixel_scale");
    }

    #[test]
    fn inverted_length_range_is_rejected() {
        assert_eq!(
            rejected_field(r#"{ "growth": { "min_length": 50, "max_length": 10 } }"#),
            "min_length"
        );
    }

    #[test]
    fn inverted_angle_ranges_are_rejected() {
        assert_eq!(
            rejected_field(r#"{ "growth": { "min_angle_left": 150, "max_angle_left": 100 } }"#),
            "min_angle_left"
        );
        assert_eq!(
            rejected_field(r#"{ "growth": { "min_angle_right": 90, "max_angle_right": 30 } }"#),
            "min_angle_right"
        );
    }

    #[test]
    fn non_positive_shadow_ratio_is_rejected() {
        assert_eq!(rejected_field(r#"{ "render": { "shadow_ratio": 0.0 } }"#), "shadow_ratio");
        assert_eq!(rejected_field(r#"{ "render": { "shadow_ratio": -1.5 } }"#), "shadow_ratio");
    }

    #[test]
    fn equal_range_bounds_are_fine() {
        let cfg = Config::from_json(r#"{ "growth": { "min_length": 20, "max_length": 20 } }"#);
        assert_eq!(cfg.map(|c| c.growth.max_length), Ok(20));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            Config::from_json(r#"{ "render": { "pixel_scale": "big" } }"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
