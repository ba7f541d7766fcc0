//! Demo aiming for the headless runner
//!
//! Extends the longest visible run of the loaded color; with nothing to
//! match it dumps the shot behind the last visible ball.

use glam::Vec2;

use super::chain::Chain;
use super::state::MatchRange;

/// Longest run of `color` made only of visible balls
pub fn best_run(chain: &Chain, color: u32) -> Option<MatchRange> {
    let balls = chain.balls();
    let mut best: Option<MatchRange> = None;
    let mut i = 0;

    while i < balls.len() {
        if balls[i].color_id != color || !balls[i].visible {
            i += 1;
            continue;
        }
        let run = chain.run_at(i)?;
        let visible_end = (run.start..=run.end)
            .take_while(|&k| balls[k].visible)
            .last()
            .unwrap_or(run.start);
        let run = MatchRange {
            end: visible_end,
            ..run
        };
        if best.is_none_or(|b| run.len() > b.len()) {
            best = Some(run);
        }
        i = run.end + 1;
    }
    best
}

/// Aim point for a shot of `color`, or `None` when no ball is visible
///
/// The point sits just behind the chosen ball, so the hit test picks that
/// ball and the insertion goes tail-ward next to it.
pub fn pick_shot(chain: &Chain, color: u32) -> Option<Vec2> {
    let target = match best_run(chain, color) {
        Some(run) => run.end,
        None => chain.balls().iter().rposition(|b| b.visible)?,
    };
    let distance = chain.balls()[target].distance - chain.spacing() * 0.4;
    Some(chain.path().position_at(distance))
}
