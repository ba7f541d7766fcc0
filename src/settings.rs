//! Level settings
//!
//! Everything a level needs is static for its lifetime and loaded from JSON.
//! Unset fields fall back to the defaults in `consts`.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ChainError;
use crate::sim::SplinePath;

/// Spline control points and bake resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Catmull-Rom control points (at least 4)
    pub control_points: Vec<Vec2>,
    /// Samples per span
    pub segments: u32,
}

impl Default for PathSettings {
    fn default() -> Self {
        // Gentle S-curve across a 40x20 playfield
        Self {
            control_points: vec![
                Vec2::new(-22.0, 8.0),
                Vec2::new(-20.0, 8.0),
                Vec2::new(-8.0, 9.0),
                Vec2::new(0.0, 2.0),
                Vec2::new(8.0, -5.0),
                Vec2::new(18.0, -2.0),
                Vec2::new(12.0, 4.0),
                Vec2::new(2.0, -1.0),
                Vec2::new(0.0, -6.0),
            ],
            segments: PATH_SEGMENTS,
        }
    }
}

impl PathSettings {
    pub fn bake(&self) -> Result<SplinePath, ChainError> {
        SplinePath::bake(&self.control_points, self.segments)
    }
}

/// Per-level tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub path: PathSettings,

    // === Chain ===
    /// Number of distinct ball colors
    pub palette_size: usize,
    /// Initial chain population
    pub ball_count: usize,
    /// Explicit center-to-center spacing; derived from `ball_diameter` when unset
    pub spacing: Option<f32>,
    /// Visual diameter of a ball, used to derive spacing
    pub ball_diameter: f32,
    /// Arc-length position of the head at spawn (usually <= 0 so the chain rolls in)
    pub start_head_distance: f32,

    // === Motion ===
    pub normal_speed: f32,
    /// Speed while the tail has not yet emerged onto the path
    pub spawn_boost_speed: f32,
    pub speed_blend_rate: f32,

    // === Matching ===
    pub match_threshold: usize,
    /// Gaps at or below this are treated as closed
    pub gap_epsilon: f32,

    // === Scoring ===
    pub points_per_ball: u64,
    pub combo_step: u64,
    /// Scores needed for one, two and three stars
    pub star_thresholds: [u64; 3],

    // === Level end ===
    pub end_padding: f32,
    /// Wrap the chain back to the start instead of losing (testing only)
    pub loop_for_testing: bool,

    // === Shooter / RNG ===
    pub hit_radius: f32,
    pub seed: u64,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            path: PathSettings::default(),

            palette_size: PALETTE_SIZE,
            ball_count: BALL_COUNT,
            spacing: None,
            ball_diameter: BALL_DIAMETER,
            start_head_distance: 0.0,

            normal_speed: NORMAL_SPEED,
            spawn_boost_speed: SPAWN_BOOST_SPEED,
            speed_blend_rate: SPEED_BLEND_RATE,

            match_threshold: MATCH_THRESHOLD,
            gap_epsilon: GAP_EPSILON,

            points_per_ball: POINTS_PER_BALL,
            combo_step: COMBO_STEP,
            star_thresholds: STAR_THRESHOLDS,

            end_padding: END_PADDING,
            loop_for_testing: false,

            hit_radius: HIT_RADIUS,
            seed: 0,
        }
    }
}

impl LevelSettings {
    /// Parse and validate settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ChainError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded level settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Center-to-center spacing, configured or derived from the ball diameter
    pub fn effective_spacing(&self) -> f32 {
        self.spacing.unwrap_or(self.ball_diameter * SPACING_PACKING_FACTOR)
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.path.control_points.len() < 4 {
            return Err(ChainError::TooFewControlPoints {
                found: self.path.control_points.len(),
            });
        }
        if self.palette_size == 0 {
            return Err(ChainError::EmptyPalette);
        }
        let spacing = self.effective_spacing();
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ChainError::InvalidSpacing(spacing));
        }
        if self.ball_count == 0 {
            return Err(ChainError::setting("ball_count", "must be at least 1"));
        }
        if self.match_threshold < 2 {
            return Err(ChainError::setting(
                "match_threshold",
                format!("must be at least 2, got {}", self.match_threshold),
            ));
        }
        if self.gap_epsilon < 0.0 {
            return Err(ChainError::setting("gap_epsilon", "must not be negative"));
        }
        for (field, value) in [
            ("normal_speed", self.normal_speed),
            ("spawn_boost_speed", self.spawn_boost_speed),
            ("speed_blend_rate", self.speed_blend_rate),
            ("end_padding", self.end_padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChainError::setting(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        if self.star_thresholds.windows(2).any(|w| w[0] > w[1]) {
            return Err(ChainError::setting("star_thresholds", "must be non-decreasing"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = LevelSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.path.bake().is_ok());
    }

    #[test]
    fn test_spacing_auto_derivation() {
        let mut settings = LevelSettings {
            ball_diameter: 2.0,
            ..Default::default()
        };
        assert!((settings.effective_spacing() - 1.96).abs() < 1e-6);

        settings.spacing = Some(1.5);
        assert_eq!(settings.effective_spacing(), 1.5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = LevelSettings::from_json_str(
            r#"{ "ball_count": 12, "spacing": 0.5, "star_thresholds": [10, 20, 30] }"#,
        )
        .unwrap();
        assert_eq!(settings.ball_count, 12);
        assert_eq!(settings.spacing, Some(0.5));
        assert_eq!(settings.match_threshold, MATCH_THRESHOLD);
        assert_eq!(settings.star_thresholds, [10, 20, 30]);
    }

    #[test]
    fn test_control_points_parse_as_arrays() {
        let settings = LevelSettings::from_json_str(
            r#"{ "path": { "control_points": [[0,0],[1,0],[2,0],[3,0]], "segments": 8 } }"#,
        )
        .unwrap();
        assert_eq!(settings.path.control_points[2], Vec2::new(2.0, 0.0));
        assert_eq!(settings.path.segments, 8);
    }

    #[test]
    fn test_empty_palette_rejected() {
        let err = LevelSettings::from_json_str(r#"{ "palette_size": 0 }"#).unwrap_err();
        assert!(matches!(err, ChainError::EmptyPalette));
    }

    #[test]
    fn test_missing_path_rejected() {
        let err =
            LevelSettings::from_json_str(r#"{ "path": { "control_points": [] } }"#).unwrap_err();
        assert!(matches!(err, ChainError::TooFewControlPoints { found: 0 }));
    }

    #[test]
    fn test_bad_spacing_rejected() {
        let settings = LevelSettings {
            spacing: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ChainError::InvalidSpacing(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = LevelSettings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ChainError::Json(_)));
    }

    #[test]
    fn test_bundled_level_loads() {
        let settings =
            LevelSettings::from_json_str(include_str!("../levels/level1.json")).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.ball_count, 50);
        assert!(settings.path.bake().unwrap().total_length() > 50.0 * 0.98);
    }

    #[test]
    fn test_json_round_trip_keeps_tuning() {
        let settings = LevelSettings {
            combo_step: 2,
            loop_for_testing: true,
            ..Default::default()
        };
        let json = settings.to_json_string().unwrap();
        let back = LevelSettings::from_json_str(&json).unwrap();
        assert_eq!(back.combo_step, 2);
        assert!(back.loop_for_testing);
    }
}
