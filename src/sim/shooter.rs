//! Shooter collaborator
//!
//! Picks the ball under the aim point, previews where the shot would land,
//! and rolls the color of the next shot. Projectile flight is not simulated:
//! a shot lands the moment it is fired.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::chain::Chain;
use super::state::{InsertOutcome, InsertSlot};

#[derive(Debug, Clone)]
pub struct Shooter {
    rng: Pcg32,
    hit_radius: f32,
    current_color: u32,
}

impl Shooter {
    /// Create a shooter for `chain` and roll its first color
    pub fn new(chain: &Chain, seed: u64) -> Self {
        let mut shooter = Self {
            rng: Pcg32::seed_from_u64(seed),
            hit_radius: chain.settings().hit_radius,
            current_color: 0,
        };
        shooter.roll_next_color(chain);
        shooter
    }

    pub fn current_color(&self) -> u32 {
        self.current_color
    }

    /// Nearest visible ball strictly within `radius` of `point`
    pub fn find_hit_ball(chain: &Chain, point: Vec2, radius: f32) -> Option<usize> {
        let mut best = None;
        let mut best_sqr = radius * radius;

        for (i, ball) in chain.balls().iter().enumerate() {
            if !ball.visible {
                continue;
            }
            let sqr = point.distance_squared(ball.pos);
            if sqr < best_sqr {
                best_sqr = sqr;
                best = Some(i);
            }
        }
        best
    }

    /// Arc-length projection of the aim point onto the path
    pub fn aim_projection(chain: &Chain, aim: Vec2) -> (f32, Vec2) {
        chain.path().closest_distance(aim)
    }

    /// Ball that would be hit and where the new ball would go
    pub fn preview(&self, chain: &Chain, aim: Vec2) -> Option<(usize, InsertSlot)> {
        let hit = Self::find_hit_ball(chain, aim, self.hit_radius)?;
        chain.plan_insert(hit, aim).map(|slot| (hit, slot))
    }

    /// Pick the next shot color
    ///
    /// When every visible ball shares a color, that color is forced so the
    /// player can always finish the level.
    pub fn roll_next_color(&mut self, chain: &Chain) -> u32 {
        self.current_color = match chain.try_get_only_color() {
            Some(only) => only,
            None => {
                let palette = chain.settings().palette_size.max(1) as u32;
                self.rng.random_range(0..palette)
            }
        };
        self.current_color
    }

    /// Shoot the current color at `aim`
    ///
    /// A miss leaves the current color loaded. A hit inserts the ball and
    /// rolls the next color.
    pub fn fire(&mut self, chain: &mut Chain, aim: Vec2) -> Option<InsertOutcome> {
        let Some(hit) = Self::find_hit_ball(chain, aim, self.hit_radius) else {
            log::debug!("No hit at ({:.2}, {:.2})", aim.x, aim.y);
            return None;
        };

        let outcome = chain.insert_at_hit(hit, aim, self.current_color)?;
        self.roll_next_color(chain);
        Some(outcome)
    }
}
