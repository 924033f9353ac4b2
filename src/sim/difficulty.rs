//! Difficulty progression
//!
//! Level derives from distance travelled, milestones from elapsed play time.
//! Both only ever increase, and every multiplier derived from them is clamped.

use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub level: u32,
    pub time_milestones: u32,
    pub distance_traveled: f64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            level: 1,
            time_milestones: 0,
            distance_traveled: 0.0,
        }
    }
}

/// Level reached after travelling `distance` world units
pub fn level_for_distance(distance: f64) -> u32 {
    if distance <= 0.0 || !distance.is_finite() {
        return 1;
    }
    let level = 1 + (distance / DISTANCE_PER_LEVEL).floor() as u32;
    level.min(MAX_LEVEL)
}

/// Completed milestones after `elapsed` seconds of play
pub fn milestones_for_time(elapsed: f64) -> u32 {
    if elapsed <= 0.0 || !elapsed.is_finite() {
        return 0;
    }
    ((elapsed / MILESTONE_SECS).floor() as u32).min(MAX_MILESTONES)
}

/// `base + per_level * (level - 1) + per_milestone * milestones`, clamped.
///
/// Each term is bounded by the level/milestone caps before summing.
fn multiplier(level: u32, milestones: u32, per_level: f64, per_milestone: f64, max: f64) -> f64 {
    let level_steps = level.clamp(1, MAX_LEVEL) - 1;
    let milestone_steps = milestones.min(MAX_MILESTONES);
    let value = 1.0 + per_level * level_steps as f64 + per_milestone * milestone_steps as f64;
    value.min(max)
}

impl Difficulty {
    /// Fold in new progress; returns true if level or milestones advanced.
    ///
    /// A smaller distance than already recorded (the camera moving back down)
    /// is ignored.
    pub fn update(&mut self, distance: f64, elapsed: f64) -> bool {
        if distance > self.distance_traveled {
            self.distance_traveled = distance;
        }
        let level = level_for_distance(self.distance_traveled).max(self.level);
        let milestones = milestones_for_time(elapsed).max(self.time_milestones);

        let changed = level != self.level || milestones != self.time_milestones;
        self.level = level;
        self.time_milestones = milestones;
        changed
    }

    /// Lane speed multiplier in `[1, SPEED_MULTIPLIER_MAX]`
    pub fn speed_multiplier(&self) -> f64 {
        multiplier(
            self.level,
            self.time_milestones,
            SPEED_PER_LEVEL,
            SPEED_PER_MILESTONE,
            SPEED_MULTIPLIER_MAX,
        )
    }

    /// Spawn-rate multiplier in `[1, SPAWN_MULTIPLIER_MAX]`
    pub fn spawn_multiplier(&self) -> f64 {
        multiplier(
            self.level,
            self.time_milestones,
            SPAWN_PER_LEVEL,
            SPAWN_PER_MILESTONE,
            SPAWN_MULTIPLIER_MAX,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_from_distance() {
        assert_eq!(level_for_distance(-5.0), 1);
        assert_eq!(level_for_distance(0.0), 1);
        assert_eq!(level_for_distance(799.0), 1);
        assert_eq!(level_for_distance(800.0), 2);
        assert_eq!(level_for_distance(1_000_000.0), MAX_LEVEL);
    }

    #[test]
    fn test_milestones_from_time() {
        assert_eq!(milestones_for_time(44.9), 0);
        assert_eq!(milestones_for_time(45.0), 1);
        assert_eq!(milestones_for_time(10_000.0), MAX_MILESTONES);
    }

    #[test]
    fn test_multipliers_start_at_one() {
        let d = Difficulty::default();
        assert_eq!(d.speed_multiplier(), 1.0);
        assert_eq!(d.spawn_multiplier(), 1.0);
    }

    #[test]
    fn test_multipliers_at_caps() {
        let mut d = Difficulty::default();
        d.update(1e9, 1e9);
        assert_eq!(d.level, MAX_LEVEL);
        assert_eq!(d.time_milestones, MAX_MILESTONES);
        // 1 + 0.08 * 19 + 0.05 * 10 = 3.02, capped
        assert_eq!(d.speed_multiplier(), SPEED_MULTIPLIER_MAX);
        // 1 + 0.06 * 19 + 0.05 * 10 = 2.64, under its cap
        assert!((d.spawn_multiplier() - 2.64).abs() < 1e-9);
    }

    #[test]
    fn test_update_reports_changes() {
        let mut d = Difficulty::default();
        assert!(!d.update(100.0, 1.0));
        assert!(d.update(900.0, 1.0));
        assert_eq!(d.level, 2);
        assert!(!d.update(500.0, 2.0));
        assert_eq!(d.level, 2);
        assert_eq!(d.distance_traveled, 900.0);
        assert!(d.update(900.0, 46.0));
        assert_eq!(d.time_milestones, 1);
    }

    proptest! {
        #[test]
        fn prop_difficulty_monotonic_and_bounded(
            steps in prop::collection::vec((0.0f64..2_000.0, 0.0f64..120.0), 1..50)
        ) {
            let mut d = Difficulty::default();
            let mut distance = 0.0;
            let mut elapsed = 0.0;
            let mut last_speed = d.speed_multiplier();
            let mut last_spawn = d.spawn_multiplier();

            for (dd, dt) in steps {
                distance += dd;
                elapsed += dt;
                d.update(distance, elapsed);

                let speed = d.speed_multiplier();
                let spawn = d.spawn_multiplier();
                prop_assert!(speed >= last_speed);
                prop_assert!(spawn >= last_spawn);
                prop_assert!(speed <= SPEED_MULTIPLIER_MAX);
                prop_assert!(spawn <= SPAWN_MULTIPLIER_MAX);
                last_speed = speed;
                last_spawn = spawn;
            }
        }
    }
}
