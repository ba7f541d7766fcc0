//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Single writer: `tick`, insertion and removal never overlap
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod chain;
pub mod path;
pub mod shooter;
pub mod signals;
pub mod state;
pub mod tick;

pub use chain::Chain;
pub use path::{SplinePath, catmull_rom};
pub use shooter::Shooter;
pub use signals::Signals;
pub use state::{Ball, GameEvent, GamePhase, InsertOutcome, InsertSlot, MatchRange};
pub use tick::tick;
