//! Game state and core simulation types
//!
//! Everything the tick touches lives here: the player, camera, generator,
//! live entities and the run's score/lives bookkeeping.

use std::collections::BTreeMap;

use glam::DVec2;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::{Camera, WorldBounds};
use super::chunk::LaneId;
use super::entity::{LaneSpawner, Platform, Vehicle};
use super::generator::Generator;
use super::lane_config::LaneConfig;
use super::rect::Rect;
use super::river::RiverPhysics;
use crate::consts::*;
use crate::snap_to_cell;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen; the world is built but frozen
    Menu,
    /// Active gameplay
    Playing,
    /// Out of lives; waiting for restart or back-to-menu
    GameOver,
}

/// How a restart picks its seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedMode {
    /// Every run replays the configured seed
    Fixed,
    /// Each run draws a new seed from a stream derived from the first one
    Varying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Drowned,
    HitByVehicle,
}

/// Notable things that happened during a tick, for audio/UI to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted { seed: u64 },
    LifeLost { cause: DeathCause, lives: u32 },
    LifeRestored { lives: u32 },
    LevelUp { level: u32 },
    GameOver { score: u64 },
    NewBest { score: u64 },
}

/// The frog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Center in world space; always on a row center vertically
    pub position: DVec2,
    /// Ticks left in the current hop animation
    pub hop_ticks: u32,
}

impl Player {
    pub fn new(position: DVec2) -> Self {
        Self {
            position,
            hop_ticks: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, PLAYER_SIZE, PLAYER_SIZE)
    }

    pub fn is_hopping(&self) -> bool {
        self.hop_ticks > 0
    }

    /// Take one grid step in `direction` and start the hop animation.
    ///
    /// Ignored while a hop is still playing. Horizontal moves are clamped
    /// to the screen; a downward move that would cross `floor_y` is refused.
    pub fn hop(&mut self, direction: DVec2, floor_y: f64) -> bool {
        if self.is_hopping() {
            return false;
        }
        let half = PLAYER_SIZE / 2.0;
        let mut target = self.position + direction * PLAYER_STEP;
        target.x = target.x.clamp(half, SCREEN_WIDTH - half);
        if target.y + half > floor_y {
            target.y = self.position.y;
        }
        if target == self.position {
            return false;
        }
        self.position = target;
        self.hop_ticks = HOP_TICKS;
        true
    }

    /// Advance the hop animation by one tick
    pub fn animate(&mut self) {
        self.hop_ticks = self.hop_ticks.saturating_sub(1);
    }

    /// Rectangle to draw: the hitbox lifted by the hop arc
    pub fn draw_rect(&self) -> Rect {
        let progress = 1.0 - self.hop_ticks as f64 / HOP_TICKS as f64;
        let lift = if self.is_hopping() {
            HOP_HEIGHT * (progress * std::f64::consts::PI).sin()
        } else {
            0.0
        };
        self.rect().translated(DVec2::new(0.0, -lift))
    }
}

/// Read-only status for the HUD, taken once per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub phase: GamePhase,
    pub score: u64,
    pub best_score: u64,
    pub level: u32,
    pub lives: u32,
    pub elapsed: f64,
    pub speed_multiplier: f64,
    pub invulnerable: bool,
    pub in_safe_zone: bool,
    /// Progress toward the next restored life, 0..1
    pub safe_zone_progress: f64,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed of the current run
    pub seed: u64,
    pub seed_mode: SeedMode,
    /// Source of seeds for later runs
    seed_rng: Pcg32,
    /// Runs started so far
    pub runs: u32,
    pub phase: GamePhase,
    pub player: Player,
    pub camera: Camera,
    pub generator: Generator,
    pub river: RiverPhysics,
    /// Live vehicles (sorted by id for determinism)
    pub vehicles: Vec<Vehicle>,
    /// Live logs (sorted by id for determinism)
    pub platforms: Vec<Platform>,
    /// One spawner per lane that has come into view
    pub spawners: BTreeMap<LaneId, LaneSpawner>,
    /// Entity placement randomness, separate from world generation
    pub spawn_rng: Pcg32,
    pub lives: u32,
    pub score: u64,
    pub best_score: u64,
    /// Seconds of play in this run
    pub elapsed: f64,
    /// Seconds of invulnerability left
    pub invulnerable_timer: f64,
    /// Continuous time spent in a safe zone
    pub safe_zone_dwell: f64,
    pub in_safe_zone: bool,
    /// Row the player respawns on
    pub checkpoint_y: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    next_id: u32,
}

/// Salt separating the spawn stream from the world stream of the same seed
const SPAWN_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

impl GameState {
    /// Create a game in the menu with a fixed seed and randomized lanes
    pub fn new(seed: u64) -> Self {
        Self::with_options(seed, SeedMode::Fixed, None)
    }

    pub fn with_options(seed: u64, seed_mode: SeedMode, lane_config: Option<LaneConfig>) -> Self {
        let mut state = Self {
            seed,
            seed_mode,
            seed_rng: Pcg32::seed_from_u64(seed),
            runs: 0,
            phase: GamePhase::Menu,
            player: Player::new(Self::spawn_point()),
            camera: Self::make_camera(),
            generator: Generator::new(seed, 0.0, lane_config),
            river: RiverPhysics::new(),
            vehicles: Vec::new(),
            platforms: Vec::new(),
            spawners: BTreeMap::new(),
            spawn_rng: Pcg32::seed_from_u64(seed ^ SPAWN_STREAM_SALT),
            lives: STARTING_LIVES,
            score: 0,
            best_score: 0,
            elapsed: 0.0,
            invulnerable_timer: 0.0,
            safe_zone_dwell: 0.0,
            in_safe_zone: false,
            checkpoint_y: Self::spawn_point().y,
            time_ticks: 0,
            events: Vec::new(),
            next_id: 1,
        };
        state.reset_world(seed);
        state
    }

    /// Spawn point snapped to the grid
    pub fn spawn_point() -> DVec2 {
        DVec2::new(snap_to_cell(SPAWN_X), snap_to_cell(SPAWN_Y))
    }

    /// Camera that scrolls only vertically, following the player upward
    /// once they pass 40% of the screen height.
    fn make_camera() -> Camera {
        let viewport = DVec2::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        let bounds = WorldBounds {
            min: DVec2::new(0.0, f64::NEG_INFINITY),
            max: DVec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
        };
        let deadzone = Rect::new(0.0, SCREEN_HEIGHT * 0.4, SCREEN_WIDTH, SCREEN_HEIGHT * 0.4);
        Camera::new(viewport, bounds, Some(deadzone))
    }

    /// Rebuild generator, camera, entities and player for a new run
    pub fn reset_world(&mut self, seed: u64) {
        self.seed = seed;
        self.generator.reset(seed, 0.0);
        self.spawn_rng = Pcg32::seed_from_u64(seed ^ SPAWN_STREAM_SALT);
        self.camera = Self::make_camera();
        self.player = Player::new(Self::spawn_point());
        self.camera.follow(&self.player.rect());
        self.camera.move_to(self.camera.position());
        self.river.reset();
        self.vehicles.clear();
        self.platforms.clear();
        self.spawners.clear();
        self.lives = STARTING_LIVES;
        self.score = 0;
        self.elapsed = 0.0;
        self.invulnerable_timer = 0.0;
        self.safe_zone_dwell = 0.0;
        self.in_safe_zone = false;
        self.checkpoint_y = self.player.position.y;
        self.next_id = 1;

        // Build the first screen so the menu has something to show
        let view = self.view();
        self.generator.update(&view, 0.0);
    }

    /// Start a run from the menu or after game over.
    ///
    /// The first run uses the construction seed; later runs follow the seed mode.
    pub fn begin_run(&mut self) {
        if self.runs > 0 {
            let seed = match self.seed_mode {
                SeedMode::Fixed => self.seed,
                SeedMode::Varying => self.seed_rng.next_u64(),
            };
            self.reset_world(seed);
        }
        self.runs += 1;
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::RunStarted { seed: self.seed });
        log::info!("Run {} started (seed {})", self.runs, self.seed);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current (non-interpolated) camera view
    pub fn view(&self) -> Rect {
        self.camera.view_rect(1.0)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    pub fn hud(&self) -> Hud {
        Hud {
            phase: self.phase,
            score: self.score,
            best_score: self.best_score.max(self.score),
            level: self.generator.difficulty().level,
            lives: self.lives,
            elapsed: self.elapsed,
            speed_multiplier: self.generator.difficulty().speed_multiplier(),
            invulnerable: self.is_invulnerable(),
            in_safe_zone: self.in_safe_zone,
            safe_zone_progress: (self.safe_zone_dwell / SAFE_ZONE_REGEN_SECS).clamp(0.0, 1.0),
        }
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.vehicles.sort_by_key(|v| v.id);
        self.platforms.sort_by_key(|p| p.id);
    }
}
