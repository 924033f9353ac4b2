//! Moving lane entities: vehicles on roads, floating logs on rivers
//!
//! Entities are owned by the game state, not by their lane. Each one keeps
//! the `lane_id` it was spawned for so speed changes and chunk eviction can
//! be applied to it.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chunk::{CAR_COLORS, Direction, Lane, LaneId, LogSpec, Rgb};
use super::rect::Rect;
use crate::consts::*;

/// Shared motion behaviour of everything that drives along a lane
pub trait LaneEntity {
    fn id(&self) -> u32;
    fn lane_id(&self) -> LaneId;
    fn rect(&self) -> &Rect;
    fn rect_mut(&mut self) -> &mut Rect;
    fn speed(&self) -> f64;
    fn set_speed(&mut self, speed: f64);
    fn direction(&self) -> Direction;

    /// Horizontal displacement over `dt` seconds
    #[inline]
    fn displacement(&self, dt: f64) -> f64 {
        self.speed() * self.direction().sign() * dt
    }

    fn advance(&mut self, dt: f64) {
        let dx = self.displacement(dt);
        self.rect_mut().x += dx;
    }

    /// Fully outside the screen plus the despawn margin
    fn is_gone(&self) -> bool {
        let rect = self.rect();
        rect.right() < -DESPAWN_MARGIN || rect.left() > SCREEN_WIDTH + DESPAWN_MARGIN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    pub lane_id: LaneId,
    pub rect: Rect,
    pub speed: f64,
    pub direction: Direction,
    pub color: Rgb,
}

impl Vehicle {
    pub fn new(id: u32, lane: &Lane, center_x: f64) -> Self {
        let mut rect = Rect::new(0.0, lane.y, lane.entity_width, CAR_HEIGHT);
        rect.set_center_x(center_x);
        Self {
            id,
            lane_id: lane.id,
            rect,
            speed: lane.speed,
            direction: lane.direction,
            color: lane.color.unwrap_or(CAR_COLORS[0]),
        }
    }
}

impl LaneEntity for Vehicle {
    fn id(&self) -> u32 {
        self.id
    }
    fn lane_id(&self) -> LaneId {
        self.lane_id
    }
    fn rect(&self) -> &Rect {
        &self.rect
    }
    fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }
    fn speed(&self) -> f64 {
        self.speed
    }
    fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }
    fn direction(&self) -> Direction {
        self.direction
    }
}

/// A floating log the player can ride
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub lane_id: LaneId,
    pub rect: Rect,
    pub speed: f64,
    pub direction: Direction,
}

impl Platform {
    pub fn new(id: u32, lane: &Lane, center_x: f64, width: f64) -> Self {
        let mut rect = Rect::new(0.0, lane.y, width, LOG_HEIGHT);
        rect.set_center_x(center_x);
        Self {
            id,
            lane_id: lane.id,
            rect,
            speed: lane.speed,
            direction: lane.direction,
        }
    }

    /// Materialize a generated log placement
    pub fn from_spec(id: u32, lane: &Lane, spec: &LogSpec) -> Self {
        Self::new(id, lane, spec.center_x, spec.width)
    }
}

impl LaneEntity for Platform {
    fn id(&self) -> u32 {
        self.id
    }
    fn lane_id(&self) -> LaneId {
        self.lane_id
    }
    fn rect(&self) -> &Rect {
        &self.rect
    }
    fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }
    fn speed(&self) -> f64 {
        self.speed
    }
    fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }
    fn direction(&self) -> Direction {
        self.direction
    }
}

/// Center x for a new entity entering at the lane's leading edge (just offscreen)
pub fn entry_center_x(lane: &Lane, width: f64) -> f64 {
    match lane.direction {
        Direction::Right => -width / 2.0,
        Direction::Left => SCREEN_WIDTH + width / 2.0,
    }
}

/// True if an entity of `width` entering at the leading edge keeps at least
/// `lane.min_gap` to every entity already in the lane.
pub fn entry_is_clear<'a, E, I>(lane: &Lane, width: f64, lane_entities: I) -> bool
where
    E: LaneEntity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut entry = Rect::new(0.0, lane.y, width, LOG_HEIGHT);
    entry.set_center_x(entry_center_x(lane, width));
    lane_entities.into_iter().all(|entity| {
        let other = entity.rect();
        let gap = match lane.direction {
            Direction::Right => other.left() - entry.right(),
            Direction::Left => entry.left() - other.right(),
        };
        gap >= lane.min_gap
    })
}

/// Per-lane spawn timer.
///
/// Counts down to the next spawn attempt. A blocked attempt (lane full or
/// leading edge not clear) is retried every tick until it succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneSpawner {
    pub lane_id: LaneId,
    /// Seconds until the next attempt
    pub timer: f64,
}

impl LaneSpawner {
    /// First attempt lands somewhere inside the lane's first interval
    pub fn new(lane: &Lane, rng: &mut Pcg32) -> Self {
        let timer = rng.random_range(0.0..=lane.spawn_interval);
        Self {
            lane_id: lane.id,
            timer,
        }
    }

    /// Advance by `dt`; true when an attempt is due
    pub fn tick(&mut self, dt: f64) -> bool {
        self.timer -= dt;
        self.timer <= 0.0
    }

    /// Schedule the next attempt one jittered interval from now
    pub fn rearm(&mut self, lane: &Lane, rng: &mut Pcg32) {
        let jitter = if lane.spawn_jitter > 0.0 {
            rng.random_range(-lane.spawn_jitter..=lane.spawn_jitter)
        } else {
            0.0
        };
        self.timer = (lane.spawn_interval + jitter).max(SPAWN_INTERVAL_MIN);
    }
}

/// Center x positions of a road lane's starting traffic, evenly spread over
/// the screen with a random phase.
pub fn initial_traffic(lane: &Lane, rng: &mut Pcg32) -> Vec<f64> {
    let count = CARS_PER_LANE_INITIAL.min(lane.max_entities).max(1);
    let spacing = SCREEN_WIDTH / count as f64;
    let phase = rng.random_range(0.0..spacing);
    (0..count)
        .map(|k| crate::snap_to_cell(phase + k as f64 * spacing))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::chunk::LaneKind;
    use rand::SeedableRng;

    fn lane(direction: Direction) -> Lane {
        Lane::new(
            LaneId(3),
            LaneKind::Road,
            96.0,
            200.0,
            direction,
            ROAD_SPAWN_RATE,
            ROAD_MIN_GAP,
            CAR_WIDTH,
            Some(CAR_COLORS[2]),
            None,
        )
    }

    #[test]
    fn test_vehicle_advances_by_velocity() {
        let lane = lane(Direction::Left);
        let mut car = Vehicle::new(1, &lane, 640.0);
        assert_eq!(car.rect.center_y(), lane.center_y());
        assert_eq!(car.color, CAR_COLORS[2]);

        car.advance(0.5);
        assert_eq!(car.rect.center_x(), 540.0);
        assert!((car.displacement(1.0 / 60.0) + 200.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_despawn_margin() {
        let lane = lane(Direction::Right);
        let mut car = Vehicle::new(1, &lane, SCREEN_WIDTH + DESPAWN_MARGIN);
        assert!(!car.is_gone());
        car.advance(1.0);
        assert!(car.is_gone());

        let left = Platform::new(2, &lane, -DESPAWN_MARGIN - 200.0, 96.0);
        assert!(left.is_gone());
    }

    #[test]
    fn test_entry_edge_depends_on_direction() {
        assert_eq!(entry_center_x(&lane(Direction::Right), 64.0), -32.0);
        assert_eq!(entry_center_x(&lane(Direction::Left), 64.0), SCREEN_WIDTH + 32.0);
    }

    #[test]
    fn test_entry_blocked_by_nearby_vehicle() {
        let lane = lane(Direction::Right);
        let near = Vehicle::new(1, &lane, 64.0);
        assert!(!entry_is_clear(&lane, CAR_WIDTH, [&near]));

        let far = Vehicle::new(2, &lane, 400.0);
        assert!(entry_is_clear(&lane, CAR_WIDTH, [&far]));
        assert!(entry_is_clear::<Vehicle, _>(&lane, CAR_WIDTH, []));
    }

    #[test]
    fn test_spawner_rearms_inside_jitter() {
        let lane = lane(Direction::Left);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut spawner = LaneSpawner::new(&lane, &mut rng);
        assert!(spawner.timer >= 0.0 && spawner.timer <= lane.spawn_interval);

        let mut fired = false;
        for _ in 0..(lane.spawn_interval * 60.0) as usize + 2 {
            fired |= spawner.tick(1.0 / 60.0);
        }
        assert!(fired);

        for _ in 0..50 {
            spawner.rearm(&lane, &mut rng);
            assert!(spawner.timer >= lane.spawn_interval - lane.spawn_jitter - 1e-9);
            assert!(spawner.timer <= lane.spawn_interval + lane.spawn_jitter + 1e-9);
        }
    }

    #[test]
    fn test_initial_traffic_is_spread() {
        let lane = lane(Direction::Right);
        let mut rng = Pcg32::seed_from_u64(1);
        let xs = initial_traffic(&lane, &mut rng);
        assert_eq!(xs.len(), CARS_PER_LANE_INITIAL as usize);
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= lane.min_gap);
        }
        assert!(xs.iter().all(|x| (0.0..SCREEN_WIDTH).contains(x)));
    }
}
