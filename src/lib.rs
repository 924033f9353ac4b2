//! Endless Crossing - an infinite-scrolling road and river crossing game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world generation, camera, physics, game state)
//! - `settings`: Runtime configuration loaded from JSON and the environment
//! - `highscores`: Best-score leaderboard

pub mod highscores;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const PHYSICS_HZ: u32 = 60;
    pub const SIM_DT: f64 = 1.0 / PHYSICS_HZ as f64;
    /// Longest frame the clock will account for (prevents spiral of death)
    pub const MAX_FRAME_TIME: f64 = 0.25;

    /// Viewport dimensions (world units = pixels)
    pub const SCREEN_WIDTH: f64 = 1280.0;
    pub const SCREEN_HEIGHT: f64 = 720.0;

    /// Grid cell size; every world dimension is a multiple of this
    pub const CELL_SIZE: f64 = 32.0;
    pub const GRID_WIDTH: u32 = (SCREEN_WIDTH / CELL_SIZE) as u32; // 40 columns

    /// Entity sizes
    pub const PLAYER_SIZE: f64 = 32.0;
    pub const CAR_WIDTH: f64 = 64.0;
    pub const CAR_HEIGHT: f64 = 32.0;
    pub const LOG_HEIGHT: f64 = 32.0;

    /// One hop per movement intent
    pub const PLAYER_STEP: f64 = CELL_SIZE;
    /// Ticks a hop lasts; further intents are ignored meanwhile
    pub const HOP_TICKS: u32 = 4;
    /// Peak visual lift of a hop
    pub const HOP_HEIGHT: f64 = 4.0;

    /// Spawn point (before grid snapping)
    pub const SPAWN_X: f64 = SCREEN_WIDTH / 2.0;
    pub const SPAWN_Y: f64 = SCREEN_HEIGHT - 80.0;

    /// Lives
    pub const STARTING_LIVES: u32 = 3;
    pub const MAX_LIVES: u32 = 5;
    pub const INVULNERABILITY_SECS: f64 = 2.0;
    /// Continuous safe-zone dwell needed to restore one life
    pub const SAFE_ZONE_REGEN_SECS: f64 = 5.0;
    /// Points per grid row of camera progress
    pub const POINTS_PER_ROW: u64 = 10;

    /// Chunk geometry
    pub const LANE_HEIGHT: f64 = 32.0;
    pub const SAFE_ZONE_HEIGHT: f64 = 96.0;
    pub const INITIAL_SAFE_ZONE_HEIGHT: f64 = 6.0 * CELL_SIZE;
    /// Bottom edge of the starting zone, floored to the grid so lane rows
    /// coincide with the rows the player stands on (704)
    pub const START_ZONE_BOTTOM: f64 = ((SCREEN_HEIGHT as u32 / CELL_SIZE as u32) * CELL_SIZE as u32) as f64;
    pub const MIN_LANES_PER_CHUNK: u32 = 2;
    pub const MAX_LANES_PER_CHUNK: u32 = 3;

    /// World streaming margins
    pub const GENERATION_LEAD: f64 = 400.0;
    pub const EVICTION_MARGIN: f64 = 400.0;
    pub const VISIBILITY_MARGIN: f64 = 100.0;
    pub const MAX_CHUNKS_PER_TICK: usize = 50;
    pub const CHUNK_POOL_SIZE: usize = 50;

    /// Rest-zone cadence: every 5 or 6 challenge chunks
    pub const REST_CADENCE_BASE: u32 = 5;
    pub const REST_CADENCE_VARIATION: u32 = 1;

    /// Road lanes
    pub const ROAD_SPEED_MIN: f64 = 120.0;
    pub const ROAD_SPEED_MAX: f64 = 270.0;
    pub const ROAD_SPAWN_RATE: f64 = 2.5;
    pub const ROAD_MIN_GAP: f64 = CAR_WIDTH * 2.0;
    pub const CARS_PER_LANE_INITIAL: u32 = 2;
    pub const CARS_PER_LANE_MAX: u32 = 5;

    /// River lanes
    pub const RIVER_SPEED_MIN: f64 = 90.0;
    pub const RIVER_SPEED_MAX: f64 = 210.0;
    pub const RIVER_SPAWN_RATE: f64 = 3.0;
    pub const RIVER_MIN_GAP: f64 = 6.0 * CELL_SIZE;
    pub const LOGS_PER_LANE_MAX: u32 = 8;
    /// Log widths in cells (duplicates weight the draw)
    pub const LOG_WIDTH_CELLS: [u32; 5] = [3, 4, 4, 6, 6];
    pub const GUARANTEED_LOG_CELLS: u32 = 6;
    /// Free space kept between neighbouring logs at generation time
    pub const LOG_GAP: f64 = CELL_SIZE;

    /// Spawner limits
    pub const SPAWN_INTERVAL_MIN: f64 = 0.6;
    pub const SPAWN_INTERVAL_MAX: f64 = 3.0;
    /// Entities beyond this horizontal margin are despawned
    pub const DESPAWN_MARGIN: f64 = 200.0;

    /// Difficulty
    pub const DISTANCE_PER_LEVEL: f64 = 800.0;
    pub const MAX_LEVEL: u32 = 20;
    pub const MILESTONE_SECS: f64 = 45.0;
    pub const MAX_MILESTONES: u32 = 10;
    pub const SPEED_PER_LEVEL: f64 = 0.08;
    pub const SPEED_PER_MILESTONE: f64 = 0.05;
    pub const SPEED_MULTIPLIER_MAX: f64 = 2.5;
    pub const SPAWN_PER_LEVEL: f64 = 0.06;
    pub const SPAWN_PER_MILESTONE: f64 = 0.05;
    pub const SPAWN_MULTIPLIER_MAX: f64 = 2.75;

    /// River grace period after losing platform contact
    pub const COYOTE_SECS: f64 = 0.1;
    /// Vehicle hitboxes are shrunk to this ratio of the sprite
    pub const COLLISION_RATIO: f64 = 0.8;

    /// Default seed for reproducible sessions
    pub const DEFAULT_SEED: u64 = 20240125;
}

/// Snap a coordinate to the center of the grid cell containing it
#[inline]
pub fn snap_to_cell(v: f64) -> f64 {
    use consts::CELL_SIZE;
    (v / CELL_SIZE).floor() * CELL_SIZE + CELL_SIZE / 2.0
}

/// Center x of a grid column
#[inline]
pub fn column_center(column: u32) -> f64 {
    column as f64 * consts::CELL_SIZE + consts::CELL_SIZE / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_cell() {
        assert_eq!(snap_to_cell(640.0), 656.0);
        assert_eq!(snap_to_cell(655.9), 656.0);
        assert_eq!(snap_to_cell(0.0), 16.0);
        assert_eq!(snap_to_cell(-1.0), -16.0);
    }

    #[test]
    fn test_spawn_column_is_screen_center() {
        assert_eq!(column_center(consts::GRID_WIDTH / 2), 656.0);
        assert_eq!(snap_to_cell(consts::SPAWN_X), 656.0);
    }
}
