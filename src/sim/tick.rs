//! Fixed timestep simulation tick
//!
//! Advances the chain one frame. The tail is the only driven ball; every
//! other ball is pushed along by the spacing constraint, so gaps left by a
//! match stay open until the balls behind roll up and close them.

use super::chain::Chain;
use super::state::GamePhase;

/// Advance the chain by one fixed timestep
pub fn tick(chain: &mut Chain, dt: f32) {
    if chain.phase != GamePhase::Playing || chain.balls.is_empty() {
        return;
    }
    chain.time_ticks += 1;

    drive_tail(chain, dt);
    propagate_spacing(chain);

    if reached_end(chain) {
        chain.refresh_visuals();
        return;
    }

    if chain.reaction_armed {
        let handled = chain.try_reaction();
        if !handled && !chain.has_gap() {
            log::debug!("Chain settled, combo {} ends", chain.combo_level);
            chain.reaction_armed = false;
            chain.combo_level = 0;
        }
    }

    chain.refresh_visuals();
}

/// Blend speed toward its target and move the tail
fn drive_tail(chain: &mut Chain, dt: f32) {
    let Some(tail) = chain.balls.last() else {
        return;
    };
    // Boost until the whole chain has rolled onto the path
    let target = if tail.distance < 0.0 {
        chain.settings.spawn_boost_speed
    } else {
        chain.settings.normal_speed
    };
    let blend = 1.0 - (-chain.settings.speed_blend_rate * dt).exp();
    chain.speed += (target - chain.speed) * blend;

    let step = chain.speed * dt;
    if let Some(tail) = chain.balls.last_mut() {
        tail.distance += step;
    }
}

/// Raise each ball to at least one spacing ahead of the ball behind it
///
/// Only ever pushes balls apart, so open gaps persist.
fn propagate_spacing(chain: &mut Chain) {
    let spacing = chain.spacing;
    for i in (0..chain.balls.len().saturating_sub(1)).rev() {
        let min = chain.balls[i + 1].distance + spacing;
        if chain.balls[i].distance < min {
            chain.balls[i].distance = min;
        }
    }
}

/// Handle the head reaching the end of the path; true when the level was lost
fn reached_end(chain: &mut Chain) -> bool {
    let limit = chain.path.total_length() - chain.settings.end_padding;
    if chain.balls[0].distance < limit {
        return false;
    }

    if chain.settings.loop_for_testing && limit > 0.0 {
        for ball in &mut chain.balls {
            ball.distance -= limit;
        }
        log::debug!("Head reached the end, looping chain back by {:.2}", limit);
        return false;
    }

    chain.conclude(GamePhase::Lost);
    true
}
