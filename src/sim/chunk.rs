//! Chunk model: the unit of generated world content
//!
//! A chunk covers the half-open vertical interval `[y_start, y_start + height)`
//! and carries a payload specific to its kind.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Stable lane identifier, unique for the lifetime of a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LaneId(pub u32);

/// Horizontal travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    /// Map a signed integer (as found in lane config files); zero is rejected
    pub fn from_sign(sign: i32) -> Option<Self> {
        match sign.signum() {
            1 => Some(Direction::Right),
            -1 => Some(Direction::Left),
            _ => None,
        }
    }
}

/// Vehicle paint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const CAR_COLORS: [Rgb; 5] = [
    Rgb(237, 28, 36),  // red
    Rgb(0, 162, 232),  // blue
    Rgb(255, 127, 39), // orange
    Rgb(163, 73, 164), // purple
    Rgb(255, 242, 0),  // yellow
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneKind {
    Road,
    River,
}

/// One horizontal strip of moving entities.
///
/// `base_speed` and `spawn_rate` are fixed at creation; `speed`,
/// `spawn_interval`, `min_gap` and `spawn_jitter` are recomputed whenever the
/// difficulty multipliers change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneId,
    pub kind: LaneKind,
    /// Top edge of the strip
    pub y: f64,
    /// Speed at difficulty 1.0, world units per second
    pub base_speed: f64,
    pub direction: Direction,
    /// Spawn interval at difficulty 1.0, seconds
    pub spawn_rate: f64,
    /// Minimum spacing at difficulty 1.0
    pub base_min_gap: f64,
    pub entity_width: f64,
    pub max_entities: u32,
    pub color: Option<Rgb>,
    /// Configured jitter; `None` derives it from the interval
    pub base_spawn_jitter: Option<f64>,

    /// Current speed after difficulty scaling
    pub speed: f64,
    pub spawn_interval: f64,
    pub min_gap: f64,
    pub spawn_jitter: f64,
}

impl Lane {
    /// Create a lane at difficulty 1.0.
    ///
    /// Non-finite or non-positive speeds, rates and widths are replaced by
    /// the defaults for the lane kind.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LaneId,
        kind: LaneKind,
        y: f64,
        base_speed: f64,
        direction: Direction,
        spawn_rate: f64,
        min_gap: f64,
        entity_width: f64,
        color: Option<Rgb>,
        spawn_jitter: Option<f64>,
    ) -> Self {
        let (default_speed, default_rate, default_gap, default_width, max_entities) = match kind {
            LaneKind::Road => (
                (ROAD_SPEED_MIN + ROAD_SPEED_MAX) / 2.0,
                ROAD_SPAWN_RATE,
                ROAD_MIN_GAP,
                CAR_WIDTH,
                CARS_PER_LANE_MAX,
            ),
            LaneKind::River => (
                (RIVER_SPEED_MIN + RIVER_SPEED_MAX) / 2.0,
                RIVER_SPAWN_RATE,
                RIVER_MIN_GAP,
                4.0 * CELL_SIZE,
                LOGS_PER_LANE_MAX,
            ),
        };
        let positive_or = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };

        let mut lane = Self {
            id,
            kind,
            y,
            base_speed: positive_or(base_speed, default_speed),
            direction,
            spawn_rate: positive_or(spawn_rate, default_rate),
            base_min_gap: positive_or(min_gap, default_gap),
            entity_width: positive_or(entity_width, default_width),
            max_entities,
            color,
            base_spawn_jitter: spawn_jitter.filter(|j| j.is_finite() && *j >= 0.0),
            speed: 0.0,
            spawn_interval: 0.0,
            min_gap: 0.0,
            spawn_jitter: 0.0,
        };
        lane.apply_difficulty(1.0, 1.0);
        lane
    }

    /// Recompute the scaled parameters for the given multipliers
    pub fn apply_difficulty(&mut self, speed_multiplier: f64, spawn_multiplier: f64) {
        let speed_multiplier = speed_multiplier.max(1.0);
        let spawn_multiplier = spawn_multiplier.max(1.0);

        self.speed = self.base_speed * speed_multiplier;
        self.spawn_interval =
            (self.spawn_rate / spawn_multiplier).clamp(SPAWN_INTERVAL_MIN, SPAWN_INTERVAL_MAX);
        self.min_gap = (self.base_min_gap / (speed_multiplier * 0.9).max(1.0)).max(CELL_SIZE);
        self.spawn_jitter = self
            .base_spawn_jitter
            .unwrap_or_else(|| (self.spawn_interval * 0.25).max(0.1));
    }

    /// Vertical center of the strip
    #[inline]
    pub fn center_y(&self) -> f64 {
        self.y + LANE_HEIGHT / 2.0
    }

    /// Signed horizontal velocity
    #[inline]
    pub fn velocity(&self) -> f64 {
        self.speed * self.direction.sign()
    }
}

/// Initial placement of one floating log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogSpec {
    pub lane_id: LaneId,
    pub center_x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadPayload {
    pub lanes: Vec<Lane>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverPayload {
    pub lanes: Vec<Lane>,
    /// Logs present when the lane first comes into view
    pub logs: Vec<LogSpec>,
}

/// Rest zone geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    pub y_pos: f64,
    pub height: f64,
}

impl SafeZone {
    /// Half-open like the owning chunk, so a row belongs to exactly one chunk
    pub fn contains(&self, y: f64) -> bool {
        y >= self.y_pos && y < self.y_pos + self.height
    }

    /// Center of the zone's middle grid row
    pub fn center_row(&self) -> f64 {
        crate::snap_to_cell(self.y_pos + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
    RoadLanes,
    River,
    SafeZone,
}

impl ChunkKind {
    pub fn is_challenge(self) -> bool {
        !matches!(self, ChunkKind::SafeZone)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChunkPayload {
    Road(RoadPayload),
    River(RiverPayload),
    SafeZone(SafeZone),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: u32,
    pub y_start: f64,
    pub height: f64,
    pub payload: ChunkPayload,
}

impl Chunk {
    pub fn kind(&self) -> ChunkKind {
        match self.payload {
            ChunkPayload::Road(_) => ChunkKind::RoadLanes,
            ChunkPayload::River(_) => ChunkKind::River,
            ChunkPayload::SafeZone(_) => ChunkKind::SafeZone,
        }
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn y_end(&self) -> f64 {
        self.y_start + self.height
    }

    /// Half-open containment test for a world y coordinate
    #[inline]
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.y_start && y < self.y_end()
    }

    /// Overlap test against an arbitrary vertical span
    #[inline]
    pub fn overlaps_span(&self, top: f64, bottom: f64) -> bool {
        self.y_start < bottom && top < self.y_end()
    }

    pub fn lanes(&self) -> &[Lane] {
        match &self.payload {
            ChunkPayload::Road(road) => &road.lanes,
            ChunkPayload::River(river) => &river.lanes,
            ChunkPayload::SafeZone(_) => &[],
        }
    }

    pub fn lanes_mut(&mut self) -> &mut [Lane] {
        match &mut self.payload {
            ChunkPayload::Road(road) => &mut road.lanes,
            ChunkPayload::River(river) => &mut river.lanes,
            ChunkPayload::SafeZone(_) => &mut [],
        }
    }

    pub fn logs(&self) -> &[LogSpec] {
        match &self.payload {
            ChunkPayload::River(river) => &river.logs,
            _ => &[],
        }
    }

    pub fn safe_zone(&self) -> Option<&SafeZone> {
        match &self.payload {
            ChunkPayload::SafeZone(zone) => Some(zone),
            _ => None,
        }
    }
}
