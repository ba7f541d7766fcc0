//! Chain state and core simulation types

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Current phase of the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Chain is rolling
    Playing,
    /// Every ball was cleared
    Won,
    /// The head reached the end of the path
    Lost,
}

/// A ball on the chain
///
/// Balls have no identity beyond their index, which shifts on every
/// insertion or removal. Re-query by index each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Signed arc-length position (negative = still staged before the path start)
    pub distance: f32,
    /// Palette index
    pub color_id: u32,
    /// `distance >= 0`, refreshed with `pos`
    pub visible: bool,
    /// World position, refreshed at the end of every mutation
    pub pos: Vec2,
}

impl Ball {
    pub fn new(distance: f32, color_id: u32) -> Self {
        Self {
            distance,
            color_id,
            visible: distance >= 0.0,
            pos: Vec2::ZERO,
        }
    }
}

/// Inclusive run of same-colored balls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
    pub color_id: u32,
}

impl MatchRange {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Where a shot at a given ball would land
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertSlot {
    /// Sequence index the new ball takes
    pub index: usize,
    /// Arc-length distance of the new ball before overlap resolution
    pub distance: f32,
    /// World position of that distance
    pub pos: Vec2,
    /// True when the slot is on the head side of the hit ball
    pub head_ward: bool,
}

/// Result of a successful insertion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertOutcome {
    pub slot: InsertSlot,
    pub color_id: u32,
    /// Range that was matched and removed, in pre-removal indices
    pub matched: Option<MatchRange>,
}

/// Something that happened during a mutation, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BallInserted {
        index: usize,
        color_id: u32,
    },
    BallsRemoved {
        count: usize,
        color_id: u32,
        points: u64,
        combo: u32,
        /// World position of the middle removed ball (score popup anchor)
        at: Vec2,
    },
    ScoreChanged {
        score: u64,
    },
    LevelWon,
    LevelLost,
}
