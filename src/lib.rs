//! Zuma Chain - a marble-chain puzzle simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spline path, ball chain, shooter)
//! - `settings`: Data-driven level configuration
//! - `error`: Configuration error taxonomy

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ChainError;
pub use settings::{LevelSettings, PathSettings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Samples per Catmull-Rom span when baking a path
    pub const PATH_SEGMENTS: u32 = 50;
    /// Fewest samples per span the baker accepts
    pub const MIN_PATH_SEGMENTS: u32 = 2;

    /// Spacing derived from a ball's diameter is shrunk by this factor
    /// so neighbours touch without a visible seam
    pub const SPACING_PACKING_FACTOR: f32 = 0.98;

    /// Ball defaults
    pub const BALL_DIAMETER: f32 = 1.0;
    pub const BALL_COUNT: usize = 40;
    pub const PALETTE_SIZE: usize = 4;

    /// Chain motion (world units / second)
    pub const NORMAL_SPEED: f32 = 1.2;
    pub const SPAWN_BOOST_SPEED: f32 = 6.0;
    /// Exponential blend rate toward the target speed (1/s)
    pub const SPEED_BLEND_RATE: f32 = 4.0;

    /// Matching and reactions
    pub const MATCH_THRESHOLD: usize = 3;
    pub const GAP_EPSILON: f32 = 0.01;

    /// Scoring
    pub const POINTS_PER_BALL: u64 = 10;
    pub const COMBO_STEP: u64 = 1;
    pub const STAR_THRESHOLDS: [u64; 3] = [300, 600, 900];

    /// Distance before the path end at which the chain has "arrived"
    pub const END_PADDING: f32 = 0.5;

    /// Shooter hit radius, roughly a ball diameter * 0.8
    pub const HIT_RADIUS: f32 = 0.8;
}

/// Clamp a float into `[lo, hi]`, tolerating an inverted range by returning `lo`
#[inline]
pub fn clamp_distance(d: f32, lo: f32, hi: f32) -> f32 {
    if hi < lo { lo } else { d.clamp(lo, hi) }
}
