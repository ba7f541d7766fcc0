//! The ball chain
//!
//! An ordered sequence of balls on a baked path, head (index 0, nearest the
//! path end) to tail. The per-frame motion lives in `tick`; this module owns
//! the discrete mutations: insertion, matching, removal and chain reactions.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::path::SplinePath;
use super::signals::Signals;
use super::state::{Ball, GameEvent, GamePhase, InsertOutcome, InsertSlot, MatchRange};
use crate::error::ChainError;
use crate::settings::LevelSettings;

#[derive(Debug)]
pub struct Chain {
    pub(crate) path: SplinePath,
    pub(crate) settings: LevelSettings,
    pub(crate) balls: Vec<Ball>,
    /// Minimum center-to-center arc length, fixed at construction
    pub(crate) spacing: f32,
    /// Current drive speed of the tail
    pub(crate) speed: f32,
    pub(crate) score: u64,
    pub(crate) combo_level: u32,
    pub(crate) phase: GamePhase,
    /// Chain reactions are evaluated each tick while armed
    pub(crate) reaction_armed: bool,
    /// Per adjacent pair: was it gapped when last recorded
    pub(crate) gap_state: Vec<bool>,
    pub(crate) time_ticks: u64,
    events: Vec<GameEvent>,
    signals: Signals,
}

impl Chain {
    /// Bake the level path and spawn `ball_count` randomly colored balls
    pub fn new(settings: &LevelSettings) -> Result<Self, ChainError> {
        settings.validate()?;
        let path = settings.path.bake()?;

        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let palette = settings.palette_size as u32;
        let colors: Vec<u32> = (0..settings.ball_count)
            .map(|_| rng.random_range(0..palette))
            .collect();

        Self::from_parts(path, settings, &colors)
    }

    /// Bake the level path and spawn a fixed color sequence, head first
    pub fn with_colors(settings: &LevelSettings, colors: &[u32]) -> Result<Self, ChainError> {
        settings.validate()?;
        let path = settings.path.bake()?;
        Self::from_parts(path, settings, colors)
    }

    /// Spawn `colors` on an already baked path
    ///
    /// Balls are staged at `start_head_distance - i * spacing`. Colors outside
    /// the palette are clamped to its last entry. `ball_count` is ignored in
    /// favour of `colors.len()`.
    pub fn from_parts(
        path: SplinePath,
        settings: &LevelSettings,
        colors: &[u32],
    ) -> Result<Self, ChainError> {
        if settings.palette_size == 0 {
            return Err(ChainError::EmptyPalette);
        }
        if colors.is_empty() {
            return Err(ChainError::setting("ball_count", "chain needs at least one ball"));
        }
        let spacing = settings.effective_spacing();
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ChainError::InvalidSpacing(spacing));
        }

        let max_color = settings.palette_size as u32 - 1;
        let balls = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Ball::new(
                    settings.start_head_distance - i as f32 * spacing,
                    c.min(max_color),
                )
            })
            .collect();

        let mut chain = Self {
            path,
            settings: settings.clone(),
            balls,
            spacing,
            speed: 0.0,
            score: 0,
            combo_level: 0,
            phase: GamePhase::Playing,
            reaction_armed: false,
            gap_state: Vec::new(),
            time_ticks: 0,
            events: Vec::new(),
            signals: Signals::default(),
        };
        chain.snapshot_gaps();
        chain.refresh_visuals();

        log::info!(
            "Chain ready: {} balls, {} colors, spacing {:.3}, path length {:.2}",
            chain.balls.len(),
            settings.palette_size,
            spacing,
            chain.path.total_length()
        );
        Ok(chain)
    }

    // === Read access ===

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn path(&self) -> &SplinePath {
        &self.path
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo_level(&self) -> u32 {
        self.combo_level
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_reaction_armed(&self) -> bool {
        self.reaction_armed
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Stars earned so far: how many score thresholds have been reached
    pub fn stars(&self) -> u8 {
        self.settings
            .star_thresholds
            .iter()
            .filter(|&&t| self.score >= t)
            .count() as u8
    }

    // === Signals ===

    pub fn on_level_won(&mut self, f: impl FnMut() + 'static) {
        self.signals.on_level_won(f);
    }

    pub fn on_level_lost(&mut self, f: impl FnMut() + 'static) {
        self.signals.on_level_lost(f);
    }

    pub fn on_score_changed(&mut self, f: impl FnMut(u64) + 'static) {
        self.signals.on_score_changed(f);
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Matching ===

    /// Maximal run of the color at `index`, whatever its length
    pub fn run_at(&self, index: usize) -> Option<MatchRange> {
        let color_id = self.balls.get(index)?.color_id;

        let mut start = index;
        while start > 0 && self.balls[start - 1].color_id == color_id {
            start -= 1;
        }
        let mut end = index;
        while end + 1 < self.balls.len() && self.balls[end + 1].color_id == color_id {
            end += 1;
        }

        Some(MatchRange {
            start,
            end,
            color_id,
        })
    }

    /// Run at `index` if it is long enough to clear
    pub fn match_at(&self, index: usize) -> Option<MatchRange> {
        self.run_at(index)
            .filter(|run| run.len() >= self.settings.match_threshold)
    }

    /// The color every visible ball shares, if there is exactly one
    pub fn try_get_only_color(&self) -> Option<u32> {
        let mut visible = self.balls.iter().filter(|b| b.distance >= 0.0);
        let first = visible.next()?.color_id;
        visible.all(|b| b.color_id == first).then_some(first)
    }

    // === Insertion ===

    /// Where a ball shot at `hit_index` from `aim` would land
    ///
    /// The two candidates sit one spacing ahead of and behind the hit ball;
    /// the one nearer the aim point wins, ties going head-ward.
    pub fn plan_insert(&self, hit_index: usize, aim: Vec2) -> Option<InsertSlot> {
        let Some(hit) = self.balls.get(hit_index) else {
            log::warn!(
                "Insert at {} ignored: chain has {} balls",
                hit_index,
                self.balls.len()
            );
            return None;
        };

        let total = self.path.total_length();
        let ahead = crate::clamp_distance(hit.distance + self.spacing, 0.0, total);
        let behind = crate::clamp_distance(hit.distance - self.spacing, 0.0, total);
        let pos_ahead = self.path.position_at(ahead);
        let pos_behind = self.path.position_at(behind);

        let head_ward = aim.distance_squared(pos_ahead) <= aim.distance_squared(pos_behind);
        Some(if head_ward {
            InsertSlot {
                index: hit_index,
                distance: ahead,
                pos: pos_ahead,
                head_ward,
            }
        } else {
            InsertSlot {
                index: hit_index + 1,
                distance: behind,
                pos: pos_behind,
                head_ward,
            }
        })
    }

    /// Insert a shot ball next to `hit_index` and clear any match it makes
    ///
    /// A fresh shot always starts a new combo. A match arms chain-reaction
    /// tracking so the gap it leaves can trigger follow-up clears.
    pub fn insert_at_hit(
        &mut self,
        hit_index: usize,
        aim: Vec2,
        color_id: u32,
    ) -> Option<InsertOutcome> {
        if self.phase != GamePhase::Playing {
            log::debug!("Insert ignored: level already ended ({:?})", self.phase);
            return None;
        }
        let slot = self.plan_insert(hit_index, aim)?;
        let color_id = color_id.min(self.max_color());

        let mut ball = Ball::new(slot.distance, color_id);
        ball.pos = slot.pos;
        self.balls.insert(slot.index, ball);
        self.resolve_overlap(slot.index);
        self.combo_level = 0;

        log::debug!(
            "Inserted color {} at index {} (d={:.3}, {})",
            color_id,
            slot.index,
            slot.distance,
            if slot.head_ward { "head-ward" } else { "tail-ward" }
        );
        self.events.push(GameEvent::BallInserted {
            index: slot.index,
            color_id,
        });

        let matched = self.match_at(slot.index);
        if let Some(range) = matched {
            self.remove_range(range.start, range.end);
            self.reaction_armed = self.phase == GamePhase::Playing;
        }
        self.snapshot_gaps();
        self.refresh_visuals();

        Some(InsertOutcome {
            slot,
            color_id,
            matched,
        })
    }

    /// Push neighbours of `pivot` apart until spacing holds on both sides
    fn resolve_overlap(&mut self, pivot: usize) {
        let spacing = self.spacing;

        for i in (0..pivot).rev() {
            let min = self.balls[i + 1].distance + spacing;
            if self.balls[i].distance >= min {
                break;
            }
            self.balls[i].distance = min;
        }

        for i in pivot + 1..self.balls.len() {
            let max = self.balls[i - 1].distance - spacing;
            if self.balls[i].distance <= max {
                break;
            }
            self.balls[i].distance = max;
        }
    }

    // === Removal ===

    /// Remove balls `start..=end`, score them at the current combo level
    ///
    /// `end` is clamped to the chain; an empty or inverted range is a no-op.
    /// Returns how many balls were removed.
    pub fn remove_range(&mut self, start: usize, end: usize) -> usize {
        if self.phase != GamePhase::Playing || self.balls.is_empty() {
            return 0;
        }
        let end = end.min(self.balls.len() - 1);
        if start > end {
            log::warn!("Remove {}..={} ignored: out of range", start, end);
            return 0;
        }

        let anchor = self.balls[(start + end) / 2].distance;
        let at = self.path.position_at(anchor);
        let color_id = self.balls[start].color_id;
        let count = end - start + 1;
        self.balls.drain(start..=end);

        let multiplier = 1 + self.combo_level as u64 * self.settings.combo_step;
        let points = count as u64 * self.settings.points_per_ball * multiplier;
        self.score = self.score.saturating_add(points);

        log::debug!(
            "Removed {} x color {} at combo {} for {} points (score {})",
            count,
            color_id,
            self.combo_level,
            points,
            self.score
        );
        self.events.push(GameEvent::BallsRemoved {
            count,
            color_id,
            points,
            combo: self.combo_level,
            at,
        });
        self.events.push(GameEvent::ScoreChanged { score: self.score });
        self.signals.emit_score_changed(self.score);

        self.snapshot_gaps();
        if self.balls.is_empty() {
            self.conclude(GamePhase::Won);
        }
        count
    }

    // === Chain reactions ===

    /// Clear at most one run whose gap closed since the last record
    ///
    /// Scans head to tail for a pair that was gapped and now touches with a
    /// shared color. Returns true when a run was removed.
    pub fn try_reaction(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        let current: Vec<bool> = (0..self.pair_count()).map(|i| self.is_gapped(i)).collect();
        if self.gap_state.len() != current.len() {
            self.gap_state = current;
            return false;
        }

        let closed_run = (0..current.len()).find_map(|i| {
            let just_closed = self.gap_state[i] && !current[i];
            if just_closed && self.balls[i].color_id == self.balls[i + 1].color_id {
                self.match_at(i).map(|range| (i, range))
            } else {
                None
            }
        });

        if let Some((pair, range)) = closed_run {
            self.combo_level += 1;
            log::debug!("Chain reaction at pair {} (combo {})", pair, self.combo_level);
            self.remove_range(range.start, range.end);
            return true;
        }

        self.gap_state = current;
        false
    }

    /// Open gap between ball `i` and the ball behind it, if both exist
    pub fn gap_after(&self, i: usize) -> Option<f32> {
        let ahead = self.balls.get(i)?;
        let behind = self.balls.get(i + 1)?;
        Some(ahead.distance - (behind.distance + self.spacing))
    }

    #[inline]
    fn is_gapped(&self, i: usize) -> bool {
        self.gap_after(i).is_some_and(|gap| gap > self.settings.gap_epsilon)
    }

    pub fn has_gap(&self) -> bool {
        (0..self.pair_count()).any(|i| self.is_gapped(i))
    }

    #[inline]
    fn pair_count(&self) -> usize {
        self.balls.len().saturating_sub(1)
    }

    pub(crate) fn snapshot_gaps(&mut self) {
        self.gap_state = (0..self.pair_count()).map(|i| self.is_gapped(i)).collect();
    }

    // === Bookkeeping ===

    pub(crate) fn refresh_visuals(&mut self) {
        for ball in &mut self.balls {
            ball.pos = self.path.position_at(ball.distance);
            ball.visible = ball.distance >= 0.0;
        }
    }

    /// End the level; only the first call has any effect
    pub(crate) fn conclude(&mut self, outcome: GamePhase) {
        if self.phase != GamePhase::Playing || outcome == GamePhase::Playing {
            return;
        }
        self.phase = outcome;
        self.reaction_armed = false;

        match outcome {
            GamePhase::Won => {
                log::info!("Level complete! Score: {} Stars: {}", self.score, self.stars());
                self.events.push(GameEvent::LevelWon);
                self.signals.emit_level_won();
            }
            GamePhase::Lost => {
                log::info!("Level failed. Score: {}", self.score);
                self.events.push(GameEvent::LevelLost);
                self.signals.emit_level_lost();
            }
            GamePhase::Playing => {}
        }
    }

    #[inline]
    fn max_color(&self) -> u32 {
        (self.settings.palette_size as u32).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PathSettings;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Straight path along +x from 0 to 300, one unit of distance per unit of x
    fn straight_settings() -> LevelSettings {
        LevelSettings {
            path: PathSettings {
                control_points: (-1..=4)
                    .map(|i| Vec2::new(i as f32 * 100.0, 0.0))
                    .collect(),
                segments: 50,
            },
            palette_size: 8,
            spacing: Some(10.0),
            start_head_distance: 200.0,
            points_per_ball: 10,
            combo_step: 1,
            ..Default::default()
        }
    }

    fn chain_of(colors: &[u32]) -> Chain {
        Chain::with_colors(&straight_settings(), colors).unwrap()
    }

    fn colors(chain: &Chain) -> Vec<u32> {
        chain.balls().iter().map(|b| b.color_id).collect()
    }

    #[test]
    fn test_initial_layout_is_spaced_from_head() {
        let chain = chain_of(&[0, 1, 2, 3]);
        let d: Vec<f32> = chain.balls().iter().map(|b| b.distance).collect();
        assert_eq!(d, vec![200.0, 190.0, 180.0, 170.0]);
        assert!(chain.balls().iter().all(|b| b.visible));
        assert!((chain.balls()[1].pos - Vec2::new(190.0, 0.0)).length() < 1e-2);
    }

    #[test]
    fn test_random_colors_are_seeded() {
        let settings = LevelSettings {
            seed: 7,
            ..Default::default()
        };
        let a = Chain::new(&settings).unwrap();
        let b = Chain::new(&settings).unwrap();
        assert_eq!(colors(&a), colors(&b));
        assert_eq!(a.len(), settings.ball_count);
        assert!(colors(&a).iter().all(|&c| (c as usize) < settings.palette_size));
    }

    #[test]
    fn test_out_of_palette_colors_clamped() {
        let settings = LevelSettings {
            palette_size: 3,
            ..straight_settings()
        };
        let chain = Chain::with_colors(&settings, &[0, 9]).unwrap();
        assert_eq!(colors(&chain), vec![0, 2]);
    }

    #[test]
    fn test_empty_palette_refuses_to_start() {
        let settings = LevelSettings {
            palette_size: 0,
            ..straight_settings()
        };
        assert!(matches!(
            Chain::with_colors(&settings, &[0]),
            Err(ChainError::EmptyPalette)
        ));
    }

    #[test]
    fn test_match_at_returns_maximal_run() {
        let chain = chain_of(&[0, 0, 0, 1]);
        let run = chain.match_at(1).unwrap();
        assert_eq!((run.start, run.end, run.len()), (0, 2, 3));

        let single = chain.run_at(3).unwrap();
        assert_eq!((single.start, single.end, single.len()), (3, 3, 1));
        assert!(chain.match_at(3).is_none());
        assert!(chain.run_at(4).is_none());
    }

    #[test]
    fn test_insert_side_follows_aim() {
        let chain = chain_of(&[0, 1, 2]);
        // Hit ball 1 sits at 190; head-ward slot is 200, tail-ward 180
        let ahead = chain.plan_insert(1, Vec2::new(198.0, 1.0)).unwrap();
        assert!(ahead.head_ward);
        assert_eq!(ahead.index, 1);

        let behind = chain.plan_insert(1, Vec2::new(181.0, -1.0)).unwrap();
        assert!(!behind.head_ward);
        assert_eq!(behind.index, 2);
    }

    #[test]
    fn test_equidistant_slots_resolve_head_ward() {
        let mut chain = chain_of(&[0, 1, 2]);
        // Past the path end both candidates clamp to the same point
        chain.balls[1].distance = 400.0;
        let tie = chain.plan_insert(1, Vec2::new(150.0, 20.0)).unwrap();
        assert!(tie.head_ward);
        assert_eq!(tie.index, 1);
        assert_eq!(tie.distance, chain.path().total_length());
    }

    #[test]
    fn test_insert_pushes_neighbours_apart() {
        let mut chain = chain_of(&[0, 1, 2, 3]);
        let out = chain.insert_at_hit(1, Vec2::new(200.0, 0.0), 5).unwrap();
        assert_eq!(out.slot.index, 1);
        assert!(out.matched.is_none());
        assert_eq!(colors(&chain), vec![0, 5, 1, 2, 3]);

        let d: Vec<f32> = chain.balls().iter().map(|b| b.distance).collect();
        assert_eq!(d, vec![210.0, 200.0, 190.0, 180.0, 170.0]);
    }

    #[test]
    fn test_insert_tail_ward_pushes_tail_back() {
        let mut chain = chain_of(&[0, 1, 2, 3]);
        chain.insert_at_hit(1, Vec2::new(180.0, 0.0), 5).unwrap();
        assert_eq!(colors(&chain), vec![0, 1, 5, 2, 3]);
        let d: Vec<f32> = chain.balls().iter().map(|b| b.distance).collect();
        assert_eq!(d, vec![200.0, 190.0, 180.0, 170.0, 160.0]);
    }

    #[test]
    fn test_insert_out_of_range_is_noop() {
        let mut chain = chain_of(&[0, 1]);
        assert!(chain.insert_at_hit(2, Vec2::ZERO, 0).is_none());
        assert_eq!(chain.len(), 2);
        assert!(chain.drain_events().is_empty());
    }

    #[test]
    fn test_insert_clamps_color() {
        let mut chain = chain_of(&[0, 1]);
        let out = chain.insert_at_hit(0, Vec2::new(210.0, 0.0), 99).unwrap();
        assert_eq!(out.color_id, 7);
        assert_eq!(chain.balls()[0].color_id, 7);
    }

    #[test]
    fn test_insert_match_end_to_end() {
        let mut chain = chain_of(&[0, 0, 1, 2, 2]);
        // Aim at the slot behind ball 1 (distance 180)
        let out = chain.insert_at_hit(1, Vec2::new(180.0, 0.0), 0).unwrap();

        assert_eq!(out.slot.index, 2);
        let range = out.matched.unwrap();
        assert_eq!((range.start, range.end), (0, 2));
        assert_eq!(colors(&chain), vec![1, 2, 2]);
        assert_eq!(chain.score(), 3 * 10);
        assert!(chain.is_reaction_armed());
        assert_eq!(chain.phase(), GamePhase::Playing);

        let events = chain.drain_events();
        assert_eq!(
            events[0],
            GameEvent::BallInserted {
                index: 2,
                color_id: 0
            }
        );
        assert!(matches!(
            events[1],
            GameEvent::BallsRemoved {
                count: 3,
                points: 30,
                combo: 0,
                ..
            }
        ));
        assert_eq!(events[2], GameEvent::ScoreChanged { score: 30 });
    }

    #[test]
    fn test_insert_resets_combo() {
        let mut chain = chain_of(&[0, 1, 2]);
        chain.combo_level = 4;
        chain.insert_at_hit(0, Vec2::new(210.0, 0.0), 3).unwrap();
        assert_eq!(chain.combo_level(), 0);
    }

    #[test]
    fn test_remove_range_scores_with_combo() {
        let mut chain = chain_of(&[0, 1, 2, 3, 4]);
        chain.combo_level = 2;
        assert_eq!(chain.remove_range(1, 2), 2);
        // 2 balls * 10 points * (1 + 2 * 1)
        assert_eq!(chain.score(), 60);
        assert_eq!(colors(&chain), vec![0, 3, 4]);
    }

    #[test]
    fn test_remove_range_clamps_and_ignores_inverted() {
        let mut chain = chain_of(&[0, 1, 2]);
        assert_eq!(chain.remove_range(2, 1), 0);
        assert_eq!(chain.remove_range(5, 9), 0);
        assert_eq!(chain.remove_range(1, 99), 2);
        assert_eq!(colors(&chain), vec![0]);
    }

    #[test]
    fn test_level_won_fires_once() {
        let won = Rc::new(RefCell::new(0));
        let mut chain = chain_of(&[0, 1]);
        let w = won.clone();
        chain.on_level_won(move || *w.borrow_mut() += 1);

        assert_eq!(chain.remove_range(0, 1), 2);
        assert_eq!(chain.phase(), GamePhase::Won);
        assert_eq!(chain.remove_range(0, 0), 0);
        assert_eq!(chain.remove_range(0, 5), 0);
        assert_eq!(*won.borrow(), 1);

        let won_events = chain
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::LevelWon)
            .count();
        assert_eq!(won_events, 1);
    }

    #[test]
    fn test_score_signal_reports_new_total() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut chain = chain_of(&[0, 1, 2, 3]);
        let s = seen.clone();
        chain.on_score_changed(move |score| s.borrow_mut().push(score));

        chain.remove_range(0, 0);
        chain.remove_range(0, 1);
        assert_eq!(*seen.borrow(), vec![10, 30]);
    }

    #[test]
    fn test_only_color_ignores_hidden_balls() {
        let mut chain = chain_of(&[2, 2, 1]);
        assert_eq!(chain.try_get_only_color(), None);

        chain.balls[2].distance = -5.0;
        assert_eq!(chain.try_get_only_color(), Some(2));

        for ball in &mut chain.balls {
            ball.distance = -1.0;
        }
        assert_eq!(chain.try_get_only_color(), None);
    }

    #[test]
    fn test_stars_count_reached_thresholds() {
        let mut chain = chain_of(&[0, 1, 2, 3, 4, 5, 6]);
        chain.settings.star_thresholds = [20, 40, 60];
        assert_eq!(chain.stars(), 0);
        chain.remove_range(0, 1);
        assert_eq!(chain.stars(), 1);
        chain.remove_range(0, 2);
        assert_eq!(chain.stars(), 2);
        chain.remove_range(0, 1);
        assert_eq!(chain.stars(), 3);
    }

    #[test]
    fn test_reaction_only_on_closing_edge() {
        let mut chain = chain_of(&[3, 1, 1, 1, 4]);
        // Open a gap between balls 1 and 2, then record it
        chain.balls[0].distance = 230.0;
        chain.balls[1].distance = 220.0;
        chain.snapshot_gaps();
        assert_eq!(chain.gap_state, vec![false, true, false, false]);

        // Still open: nothing fires
        assert!(!chain.try_reaction());

        // Close it: fires once
        chain.balls[0].distance = 200.0;
        chain.balls[1].distance = 190.0;
        assert!(chain.try_reaction());
        assert_eq!(chain.combo_level(), 1);
        assert_eq!(colors(&chain), vec![3, 4]);
    }

    #[test]
    fn test_reaction_ignored_after_level_ends() {
        let mut chain = chain_of(&[1, 1, 1]);
        chain.conclude(GamePhase::Lost);
        chain.gap_state = vec![true, false];

        assert!(!chain.try_reaction());
        assert_eq!(chain.combo_level(), 0);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.score(), 0);
    }

    #[test]
    fn test_clearing_insert_leaves_reactions_disarmed() {
        let mut chain = chain_of(&[2, 2]);
        let out = chain.insert_at_hit(1, Vec2::new(180.0, 0.0), 2).unwrap();
        assert!(out.matched.is_some());
        assert_eq!(chain.phase(), GamePhase::Won);
        assert!(!chain.is_reaction_armed());
    }

    #[test]
    fn test_gap_after_out_of_range_is_none() {
        let chain = chain_of(&[0]);
        assert_eq!(chain.gap_after(0), None);
        assert_eq!(chain.gap_after(5), None);

        let chain = chain_of(&[0, 1]);
        assert_eq!(chain.gap_after(0), Some(0.0));
    }

    #[test]
    fn test_closed_pair_without_edge_does_not_fire() {
        let mut chain = chain_of(&[3, 1, 1, 1, 4]);
        chain.snapshot_gaps();
        assert!(!chain.try_reaction());
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.combo_level(), 0);
    }

    #[test]
    fn test_closing_short_run_is_skipped() {
        let mut chain = chain_of(&[3, 1, 1, 4]);
        chain.balls[0].distance = 230.0;
        chain.balls[1].distance = 220.0;
        chain.snapshot_gaps();
        chain.balls[0].distance = 200.0;
        chain.balls[1].distance = 190.0;
        assert!(!chain.try_reaction());
        assert_eq!(chain.len(), 4);
        // Closure is now recorded, so it cannot fire later
        assert_eq!(chain.gap_state, vec![false, false, false]);
    }

    proptest! {
        #[test]
        fn prop_run_at_is_maximal(
            colors in prop::collection::vec(0u32..3, 1..24),
            pick in any::<prop::sample::Index>(),
        ) {
            let chain = chain_of(&colors);
            let index = pick.index(colors.len());
            let run = chain.run_at(index).unwrap();

            prop_assert!(run.contains(index));
            prop_assert!(colors[run.start..=run.end].iter().all(|&c| c == colors[index]));
            if run.start > 0 {
                prop_assert_ne!(colors[run.start - 1], colors[index]);
            }
            if run.end + 1 < colors.len() {
                prop_assert_ne!(colors[run.end + 1], colors[index]);
            }
            prop_assert_eq!(chain.match_at(index).is_some(), run.len() >= 3);
        }
    }
}
