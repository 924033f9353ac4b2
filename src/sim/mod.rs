//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID, lane ID, generation order)
//! - No rendering or platform dependencies

pub mod camera;
pub mod chunk;
pub mod clock;
pub mod collision;
pub mod difficulty;
pub mod entity;
pub mod generator;
pub mod lane_config;
pub mod rect;
pub mod river;
pub mod state;
pub mod tick;

pub use camera::{Camera, WorldBounds};
pub use chunk::{Chunk, ChunkKind, ChunkPayload, Direction, Lane, LaneId, LaneKind, LogSpec, SafeZone};
pub use clock::{ClockError, FixedStepClock, FrameStep};
pub use collision::vehicle_hits;
pub use difficulty::Difficulty;
pub use entity::{LaneEntity, Platform, Vehicle};
pub use generator::{Generator, GeneratorUpdate};
pub use lane_config::{LaneConfig, LaneConfigError};
pub use rect::Rect;
pub use river::{RiverPhysics, RiverReport};
pub use state::{DeathCause, GameEvent, GamePhase, GameState, Hud, Player, SeedMode};
pub use tick::{TickInput, tick};
