//! Observer lists for level-flow and score signals
//!
//! Handlers run synchronously at the point of the state change that
//! triggered them, in registration order.

use std::fmt;

type Handler = Box<dyn FnMut()>;
type ScoreHandler = Box<dyn FnMut(u64)>;

#[derive(Default)]
pub struct Signals {
    level_won: Vec<Handler>,
    level_lost: Vec<Handler>,
    score_changed: Vec<ScoreHandler>,
}

impl Signals {
    pub fn on_level_won(&mut self, f: impl FnMut() + 'static) {
        self.level_won.push(Box::new(f));
    }

    pub fn on_level_lost(&mut self, f: impl FnMut() + 'static) {
        self.level_lost.push(Box::new(f));
    }

    pub fn on_score_changed(&mut self, f: impl FnMut(u64) + 'static) {
        self.score_changed.push(Box::new(f));
    }

    pub(crate) fn emit_level_won(&mut self) {
        for handler in &mut self.level_won {
            handler();
        }
    }

    pub(crate) fn emit_level_lost(&mut self) {
        for handler in &mut self.level_lost {
            handler();
        }
    }

    pub(crate) fn emit_score_changed(&mut self, score: u64) {
        for handler in &mut self.score_changed {
            handler(score);
        }
    }
}

impl fmt::Debug for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signals")
            .field("level_won", &self.level_won.len())
            .field("level_lost", &self.level_lost.len())
            .field("score_changed", &self.score_changed.len())
            .finish()
    }
}
