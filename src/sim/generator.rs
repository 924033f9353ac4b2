//! Procedural world generator
//!
//! Maintains the ordered set of live chunks. Each update evicts chunks that
//! fell behind the camera, then extends the frontier (`next_y`) upward until
//! enough world exists ahead of the view. The world grows toward decreasing Y.
//!
//! Sequencing rules:
//! - a road chunk never touches a river chunk; a safe zone is interposed
//!   whenever the challenge category changes
//! - after every 5-6 challenge chunks a rest zone replaces the next challenge
//! - two safe zones are never generated back to back

use std::collections::VecDeque;

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::chunk::{
    CAR_COLORS, Chunk, ChunkKind, ChunkPayload, Direction, Lane, LaneId, LaneKind, LogSpec,
    RiverPayload, RoadPayload, SafeZone,
};
use super::difficulty::Difficulty;
use super::lane_config::{LaneConfig, LaneType};
use super::rect::Rect;
use crate::column_center;
use crate::consts::*;

/// What an update changed, for the orchestrator to reconcile against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorUpdate {
    pub generated: usize,
    /// Lanes whose chunk was evicted this update
    pub evicted_lanes: Vec<LaneId>,
    /// Difficulty advanced; lane speeds and spawn intervals were rescaled
    pub difficulty_changed: bool,
    pub level_changed: bool,
}

#[derive(Debug, Clone)]
pub struct Generator {
    rng: Pcg32,
    chunks: Vec<Chunk>,
    /// Top edge of the highest generated chunk; new chunks end here
    next_y: f64,
    /// Camera top when the world was created; distance is measured from it
    origin_y: f64,
    challenge_count: u32,
    challenges_since_rest: u32,
    rest_interval: u32,
    /// Category of the last challenge chunk; safe zones leave it untouched
    last_category: Option<LaneKind>,
    last_was_rest: bool,
    /// Category chosen before an interposed safe zone was emitted
    pending_category: Option<LaneKind>,
    /// The next challenge chunk follows an entry zone
    entry_zone_pending: bool,
    difficulty: Difficulty,
    lane_config: Option<LaneConfig>,
    /// Recycled lane buffers from evicted chunks
    lane_pool: VecDeque<Vec<Lane>>,
    next_lane_id: u32,
    next_chunk_id: u32,
}

impl Generator {
    /// Create a generator whose starting screen has its top edge at `origin_y`.
    ///
    /// The starting safe zone (holding the spawn point) is placed at the bottom
    /// of that screen; everything else is generated by `update`.
    pub fn new(seed: u64, origin_y: f64, lane_config: Option<LaneConfig>) -> Self {
        let mut generator = Self {
            rng: Pcg32::seed_from_u64(seed),
            chunks: Vec::new(),
            next_y: 0.0,
            origin_y,
            challenge_count: 0,
            challenges_since_rest: 0,
            rest_interval: REST_CADENCE_BASE,
            last_category: None,
            last_was_rest: false,
            pending_category: None,
            entry_zone_pending: false,
            difficulty: Difficulty::default(),
            lane_config,
            lane_pool: VecDeque::new(),
            next_lane_id: 1,
            next_chunk_id: 1,
        };
        generator.place_starting_zone();
        generator
    }

    /// Rebuild the world from scratch with a new random stream
    pub fn reset(&mut self, seed: u64, origin_y: f64) {
        self.rng = Pcg32::seed_from_u64(seed);
        for chunk in self.chunks.drain(..) {
            recycle(&mut self.lane_pool, chunk);
        }
        self.origin_y = origin_y;
        self.challenge_count = 0;
        self.challenges_since_rest = 0;
        self.rest_interval = REST_CADENCE_BASE;
        self.last_category = None;
        self.last_was_rest = false;
        self.pending_category = None;
        self.entry_zone_pending = false;
        self.difficulty = Difficulty::default();
        if let Some(config) = self.lane_config.as_mut() {
            config.rewind();
        }
        self.next_lane_id = 1;
        self.next_chunk_id = 1;
        self.place_starting_zone();
    }

    fn place_starting_zone(&mut self) {
        // Chunk edges sit on cell edges, so every lane is exactly one player row
        let bottom = (self.origin_y / CELL_SIZE).floor() * CELL_SIZE + START_ZONE_BOTTOM;
        let chunk = self.safe_zone_chunk(bottom, INITIAL_SAFE_ZONE_HEIGHT);
        self.next_y = chunk.y_start;
        self.chunks.push(chunk);
        self.entry_zone_pending = true;
    }

    /// Evict, extend and rescale for the given camera view.
    ///
    /// `elapsed` is total play time in seconds and drives the time milestones.
    pub fn update(&mut self, view: &Rect, elapsed: f64) -> GeneratorUpdate {
        let mut result = GeneratorUpdate::default();

        // Eviction: chunks entirely below the trailing margin
        let evict_below = view.bottom() + EVICTION_MARGIN;
        let mut kept = Vec::with_capacity(self.chunks.len());
        for chunk in self.chunks.drain(..) {
            if chunk.y_start > evict_below {
                result.evicted_lanes.extend(chunk.lanes().iter().map(|lane| lane.id));
                recycle(&mut self.lane_pool, chunk);
            } else {
                kept.push(chunk);
            }
        }
        self.chunks = kept;

        // Frontier extension
        let limit = view.top() - GENERATION_LEAD;
        while self.next_y > limit && result.generated < MAX_CHUNKS_PER_TICK {
            let Some(chunk) = self.next_chunk() else {
                break;
            };
            debug_assert!(chunk.height > 0.0, "chunk {} has no height", chunk.id);
            debug_assert!(
                chunk.y_end() <= self.next_y,
                "chunk {} overlaps the frontier",
                chunk.id
            );
            self.next_y = chunk.y_start;
            self.chunks.push(chunk);
            result.generated += 1;
        }

        // Difficulty from camera displacement and play time
        let old_level = self.difficulty.level;
        let distance = (self.origin_y - view.top()).max(0.0);
        if self.difficulty.update(distance, elapsed) {
            let speed = self.difficulty.speed_multiplier();
            let spawn = self.difficulty.spawn_multiplier();
            for chunk in &mut self.chunks {
                for lane in chunk.lanes_mut() {
                    lane.apply_difficulty(speed, spawn);
                }
            }
            result.difficulty_changed = true;
            result.level_changed = self.difficulty.level != old_level;
        }

        if result.generated > 0 || !result.evicted_lanes.is_empty() {
            log::debug!(
                "generator: +{} chunks, -{} lanes, {} live, frontier {:.0}",
                result.generated,
                result.evicted_lanes.len(),
                self.chunks.len(),
                self.next_y
            );
        }

        result
    }

    /// Synthesize the chunk that sits directly above the frontier
    fn next_chunk(&mut self) -> Option<Chunk> {
        let bottom = self.next_y;

        if !self.last_was_rest && self.challenges_since_rest >= self.rest_interval {
            self.entry_zone_pending = true;
            return Some(self.safe_zone_chunk(bottom, SAFE_ZONE_HEIGHT));
        }

        let category = match self.pending_category.take() {
            Some(category) => category,
            None if self.rng.random_bool(0.5) => LaneKind::Road,
            None => LaneKind::River,
        };

        if let Some(last) = self.last_category {
            if last != category && !self.last_was_rest {
                self.pending_category = Some(category);
                return Some(self.safe_zone_chunk(bottom, SAFE_ZONE_HEIGHT));
            }
        }

        let guarantee_log = std::mem::take(&mut self.entry_zone_pending);
        let chunk = match category {
            LaneKind::Road => self.road_chunk(bottom),
            LaneKind::River => self.river_chunk(bottom, guarantee_log),
        };
        if chunk.height <= 0.0 {
            return None;
        }

        self.challenge_count += 1;
        self.challenges_since_rest += 1;
        self.last_category = Some(category);
        self.last_was_rest = false;
        Some(chunk)
    }

    fn safe_zone_chunk(&mut self, bottom: f64, height: f64) -> Chunk {
        let y_start = bottom - height;
        self.challenges_since_rest = 0;
        self.rest_interval = REST_CADENCE_BASE + self.rng.random_range(0..=REST_CADENCE_VARIATION);
        self.last_was_rest = true;
        Chunk {
            id: self.alloc_chunk_id(),
            y_start,
            height,
            payload: ChunkPayload::SafeZone(SafeZone { y_pos: y_start, height }),
        }
    }

    fn road_chunk(&mut self, bottom: f64) -> Chunk {
        let lane_count = self.rng.random_range(MIN_LANES_PER_CHUNK..=MAX_LANES_PER_CHUNK);
        let height = lane_count as f64 * LANE_HEIGHT;
        let y_start = bottom - height;

        let mut lanes = self.lane_pool.pop_front().unwrap_or_default();
        for i in 0..lane_count {
            let y = y_start + i as f64 * LANE_HEIGHT;
            let (lane, _) = self.make_lane(LaneKind::Road, y);
            lanes.push(lane);
        }

        Chunk {
            id: self.alloc_chunk_id(),
            y_start,
            height,
            payload: ChunkPayload::Road(RoadPayload { lanes }),
        }
    }

    fn river_chunk(&mut self, bottom: f64, guarantee_log: bool) -> Chunk {
        let lane_count = self.rng.random_range(MIN_LANES_PER_CHUNK..=MAX_LANES_PER_CHUNK);
        let height = lane_count as f64 * LANE_HEIGHT;
        let y_start = bottom - height;

        let mut lanes = self.lane_pool.pop_front().unwrap_or_default();
        let mut logs = Vec::new();
        for i in 0..lane_count {
            let y = y_start + i as f64 * LANE_HEIGHT;
            let (lane, configured_width) = self.make_lane(LaneKind::River, y);
            // The bottom lane is the first one crossed coming from the entry zone
            let guaranteed = guarantee_log && i == lane_count - 1;
            logs.extend(self.layout_logs(&lane, configured_width, guaranteed));
            lanes.push(lane);
        }

        Chunk {
            id: self.alloc_chunk_id(),
            y_start,
            height,
            payload: ChunkPayload::River(RiverPayload { lanes, logs }),
        }
    }

    /// Build one lane, preferring the external config when present.
    ///
    /// Also returns the configured entity width, if the config fixed one.
    fn make_lane(&mut self, kind: LaneKind, y: f64) -> (Lane, Option<f64>) {
        let id = LaneId(self.next_lane_id);
        self.next_lane_id += 1;

        let lane_type = match kind {
            LaneKind::Road => LaneType::Road,
            LaneKind::River => LaneType::River,
        };
        let def = self
            .lane_config
            .as_mut()
            .and_then(|config| config.next(lane_type).cloned());

        let (speed_range, spawn_rate, min_gap) = match kind {
            LaneKind::Road => (ROAD_SPEED_MIN..ROAD_SPEED_MAX, ROAD_SPAWN_RATE, ROAD_MIN_GAP),
            LaneKind::River => (RIVER_SPEED_MIN..RIVER_SPEED_MAX, RIVER_SPAWN_RATE, RIVER_MIN_GAP),
        };

        let base_speed = match def.as_ref().and_then(|d| d.speed) {
            Some(speed) => speed,
            None => self.rng.random_range(speed_range),
        };
        let direction = match def.as_ref().and_then(|d| d.dir).and_then(Direction::from_sign) {
            Some(direction) => direction,
            None => self.random_direction(),
        };
        let configured_width = def
            .as_ref()
            .and_then(|d| d.width)
            .filter(|w| w.is_finite() && *w > 0.0);
        let entity_width = match (kind, configured_width) {
            (_, Some(width)) => width,
            (LaneKind::Road, None) => CAR_WIDTH,
            (LaneKind::River, None) => self.random_log_width(),
        };
        let color = match kind {
            LaneKind::Road => CAR_COLORS.choose(&mut self.rng).copied(),
            LaneKind::River => None,
        };

        let mut lane = Lane::new(
            id,
            kind,
            y,
            base_speed,
            direction,
            def.as_ref().and_then(|d| d.spawn_rate).unwrap_or(spawn_rate),
            def.as_ref().and_then(|d| d.min_gap).unwrap_or(min_gap),
            entity_width,
            color,
            def.as_ref().and_then(|d| d.spawn_jitter),
        );
        lane.apply_difficulty(
            self.difficulty.speed_multiplier(),
            self.difficulty.spawn_multiplier(),
        );
        (lane, configured_width)
    }

    /// Initial log layout for a river lane: near-uniform spacing with one
    /// cell of jitter, packed so logs neither overlap nor leave the screen.
    fn layout_logs(
        &mut self,
        lane: &Lane,
        configured_width: Option<f64>,
        guaranteed: bool,
    ) -> Vec<LogSpec> {
        let count: u32 = if guaranteed {
            self.rng.random_range(6..=8)
        } else {
            self.rng.random_range(5..=7)
        };
        let spacing = GRID_WIDTH / (count + 1);
        let others = if guaranteed { count - 1 } else { count };

        let mut candidates = Vec::with_capacity(others as usize);
        for j in 0..others {
            let jitter = self.rng.random_range(-1i32..=1);
            let cell = ((j + 1) * spacing) as i32 + jitter;
            let cell = cell.clamp(0, GRID_WIDTH as i32 - 1) as u32;
            let width = match configured_width {
                Some(width) => width,
                None => self.random_log_width(),
            };
            candidates.push((column_center(cell), width));
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut placed = Vec::with_capacity(count as usize);
        if guaranteed {
            let center = column_center(GRID_WIDTH / 2);
            let width = GUARANTEED_LOG_CELLS as f64 * CELL_SIZE;
            let (left, right): (Vec<_>, Vec<_>) =
                candidates.into_iter().partition(|(x, _)| *x < center);
            placed.extend(pack_logs(&left, 0.0, center - width / 2.0 - LOG_GAP));
            placed.push((center, width));
            placed.extend(pack_logs(&right, center + width / 2.0 + LOG_GAP, SCREEN_WIDTH));
        } else {
            placed.extend(pack_logs(&candidates, 0.0, SCREEN_WIDTH));
        }

        placed
            .into_iter()
            .map(|(center_x, width)| LogSpec {
                lane_id: lane.id,
                center_x,
                width,
            })
            .collect()
    }

    fn random_log_width(&mut self) -> f64 {
        let cells = LOG_WIDTH_CELLS.choose(&mut self.rng).copied().unwrap_or(4);
        cells as f64 * CELL_SIZE
    }

    fn random_direction(&mut self) -> Direction {
        if self.rng.random_bool(0.5) {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    fn alloc_chunk_id(&mut self) -> u32 {
        let id = self.next_chunk_id;
        self.next_chunk_id += 1;
        id
    }

    // --- queries ---

    /// All live chunks in generation order (bottom to top)
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Mutable access for scripted scenarios and tooling
    pub fn chunks_mut(&mut self) -> &mut Vec<Chunk> {
        &mut self.chunks
    }

    /// Bottom edge of the lowest live chunk; nothing exists below it
    pub fn covered_bottom(&self) -> f64 {
        self.chunks
            .iter()
            .map(Chunk::y_end)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn next_y(&self) -> f64 {
        self.next_y
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn challenge_count(&self) -> u32 {
        self.challenge_count
    }

    pub fn pool_len(&self) -> usize {
        self.lane_pool.len()
    }

    /// Chunks overlapping the view expanded by the visibility margin
    pub fn visible_chunks<'a>(&'a self, view: &Rect) -> impl Iterator<Item = &'a Chunk> + 'a {
        let top = view.top() - VISIBILITY_MARGIN;
        let bottom = view.bottom() + VISIBILITY_MARGIN;
        self.chunks
            .iter()
            .filter(move |chunk| chunk.overlaps_span(top, bottom))
    }

    /// Road and river lanes of visible chunks
    pub fn visible_lanes<'a>(&'a self, view: &Rect) -> impl Iterator<Item = &'a Lane> + 'a {
        self.visible_chunks(view).flat_map(|chunk| chunk.lanes().iter())
    }

    /// Initial log placements of visible river chunks
    pub fn visible_platforms<'a>(&'a self, view: &Rect) -> impl Iterator<Item = &'a LogSpec> + 'a {
        self.visible_chunks(view).flat_map(|chunk| chunk.logs().iter())
    }

    pub fn visible_safezones<'a>(&'a self, view: &Rect) -> impl Iterator<Item = &'a SafeZone> + 'a {
        self.visible_chunks(view).filter_map(|chunk| chunk.safe_zone())
    }

    /// Every live river chunk, visible or not
    pub fn river_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks
            .iter()
            .filter(|chunk| chunk.kind() == ChunkKind::River)
    }

    /// Every lane of every live chunk
    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.chunks.iter().flat_map(|chunk| chunk.lanes().iter())
    }
}

/// Return an evicted chunk's lane buffer to the bounded FIFO pool
fn recycle(pool: &mut VecDeque<Vec<Lane>>, chunk: Chunk) {
    let mut lanes = match chunk.payload {
        ChunkPayload::Road(road) => road.lanes,
        ChunkPayload::River(river) => river.lanes,
        ChunkPayload::SafeZone(_) => return,
    };
    lanes.clear();
    if pool.len() >= CHUNK_POOL_SIZE {
        pool.pop_front();
    }
    pool.push_back(lanes);
}

/// Smallest cell-centered coordinate `>= v`
fn cell_center_at_or_above(v: f64) -> f64 {
    ((v - CELL_SIZE / 2.0) / CELL_SIZE).ceil() * CELL_SIZE + CELL_SIZE / 2.0
}

/// Largest cell-centered coordinate `<= v`
fn cell_center_at_or_below(v: f64) -> f64 {
    ((v - CELL_SIZE / 2.0) / CELL_SIZE).floor() * CELL_SIZE + CELL_SIZE / 2.0
}

/// Place `(center, width)` candidates left to right inside `[lo, hi]`.
///
/// Each log is pushed right (in whole cells) past its predecessor plus
/// `LOG_GAP` and clamped inside the segment; logs that no longer fit are
/// dropped.
fn pack_logs(candidates: &[(f64, f64)], lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let mut placed = Vec::with_capacity(candidates.len());
    let mut cursor = lo;
    for &(center, width) in candidates {
        let half = width / 2.0;
        let min_center = cell_center_at_or_above(cursor + half);
        let max_center = cell_center_at_or_below(hi - half);
        if max_center < min_center {
            continue;
        }
        let center = center.clamp(min_center, max_center);
        placed.push((center, width));
        cursor = center + half + LOG_GAP;
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn screen_at(top: f64) -> Rect {
        Rect::new(0.0, top, SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    fn assert_no_overlap(chunks: &[Chunk]) {
        let mut sorted: Vec<_> = chunks.iter().collect();
        sorted.sort_by(|a, b| a.y_start.total_cmp(&b.y_start));
        for pair in sorted.windows(2) {
            assert!(
                pair[0].y_end() <= pair[1].y_start,
                "{:?} overlaps {:?}",
                (pair[0].y_start, pair[0].y_end()),
                (pair[1].y_start, pair[1].y_end())
            );
        }
    }

    fn assert_road_never_touches_river(chunks: &[Chunk]) {
        let mut sorted: Vec<_> = chunks.iter().collect();
        sorted.sort_by(|a, b| a.y_start.total_cmp(&b.y_start));
        for pair in sorted.windows(2) {
            let kinds = (pair[0].kind(), pair[1].kind());
            assert!(
                !matches!(
                    kinds,
                    (ChunkKind::RoadLanes, ChunkKind::River) | (ChunkKind::River, ChunkKind::RoadLanes)
                ),
                "road and river adjacent at y={}",
                pair[1].y_start
            );
            assert!(
                !(kinds.0 == ChunkKind::SafeZone && kinds.1 == ChunkKind::SafeZone),
                "consecutive safe zones at y={}",
                pair[1].y_start
            );
        }
    }

    #[test]
    fn test_starting_zone_holds_spawn() {
        let generator = Generator::new(DEFAULT_SEED, 0.0, None);
        let first = &generator.chunks()[0];
        assert_eq!(first.kind(), ChunkKind::SafeZone);
        assert_eq!(first.y_end(), START_ZONE_BOTTOM);
        assert_eq!(first.height, INITIAL_SAFE_ZONE_HEIGHT);
        assert!(first.contains_y(crate::snap_to_cell(SPAWN_Y)));
        assert_eq!(generator.next_y(), first.y_start);
    }

    #[test]
    fn test_fills_lead_margin() {
        let mut generator = Generator::new(DEFAULT_SEED, 0.0, None);
        let view = screen_at(0.0);
        let update = generator.update(&view, 0.0);
        assert!(update.generated > 0);
        assert!(generator.next_y() <= view.top() - GENERATION_LEAD);
        assert_no_overlap(generator.chunks());
    }

    #[test]
    fn test_stationary_camera_stabilizes() {
        let mut generator = Generator::new(DEFAULT_SEED, 0.0, None);
        let view = screen_at(0.0);
        generator.update(&view, 0.0);
        let settled = generator.chunks().len();
        for _ in 0..10 {
            let update = generator.update(&view, 0.0);
            assert_eq!(update.generated, 0);
            assert!(update.evicted_lanes.is_empty());
            assert_eq!(generator.chunks().len(), settled);
        }
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = Generator::new(42, 0.0, None);
        let mut b = Generator::new(42, 0.0, None);
        for step in 0..200 {
            let view = screen_at(-(step as f64) * 16.0);
            a.update(&view, step as f64 * 0.5);
            b.update(&view, step as f64 * 0.5);
        }
        assert_eq!(a.chunks(), b.chunks());
        assert_eq!(a.next_y(), b.next_y());
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = Generator::new(1, 0.0, None);
        let mut b = Generator::new(2, 0.0, None);
        a.update(&screen_at(0.0), 0.0);
        b.update(&screen_at(0.0), 0.0);
        assert_ne!(a.chunks(), b.chunks());
    }

    #[test]
    fn test_eviction_recycles_lanes() {
        let mut generator = Generator::new(7, 0.0, None);
        generator.update(&screen_at(0.0), 0.0);
        let view = screen_at(-2_000.0);
        let update = generator.update(&view, 0.0);
        assert!(!update.evicted_lanes.is_empty());
        assert!(generator.pool_len() > 0);
        assert!(generator.pool_len() <= CHUNK_POOL_SIZE);

        // Chunks generated below the trailing margin this tick go on the next
        generator.update(&view, 0.0);
        let evict_below = view.bottom() + EVICTION_MARGIN;
        assert!(generator.chunks().iter().all(|c| c.y_start <= evict_below));
    }

    #[test]
    fn test_generation_per_tick_is_capped() {
        let mut generator = Generator::new(7, 0.0, None);
        let update = generator.update(&screen_at(-1_000_000.0), 0.0);
        assert_eq!(update.generated, MAX_CHUNKS_PER_TICK);
        assert!(generator.next_y() > -1_000_000.0 - GENERATION_LEAD);
    }

    #[test]
    fn test_rest_cadence_appears() {
        // Pin every draw to roads so the only rest zones are cadence ones
        let mut generator = Generator::new(99, 0.0, None);
        let mut kinds = Vec::new();
        for _ in 0..60 {
            generator.pending_category = Some(LaneKind::Road);
            let chunk = generator.next_chunk().unwrap();
            generator.next_y = chunk.y_start;
            kinds.push(chunk.kind());
        }

        let rests = kinds.iter().filter(|kind| **kind == ChunkKind::SafeZone).count();
        assert!(rests >= 8, "only {} rest zones in {:?}", rests, kinds);
        assert_eq!(generator.challenge_count() as usize, kinds.len() - rests);

        // Every run closed by a rest zone is 5 or 6 challenges long
        let runs: Vec<usize> = kinds
            .split(|kind| *kind == ChunkKind::SafeZone)
            .map(<[ChunkKind]>::len)
            .collect();
        let cadence = REST_CADENCE_BASE as usize..=(REST_CADENCE_BASE + REST_CADENCE_VARIATION) as usize;
        for run in &runs[..runs.len() - 1] {
            assert!(cadence.contains(run), "run of {} in {:?}", run, kinds);
        }
    }

    #[test]
    fn test_category_changes_only_across_safe_zones() {
        let mut generator = Generator::new(3, 0.0, None);
        let mut seen: BTreeMap<u32, Chunk> = BTreeMap::new();
        for step in 0..300 {
            generator.update(&screen_at(-(step as f64) * CELL_SIZE), 0.0);
            for chunk in generator.chunks() {
                seen.entry(chunk.id).or_insert_with(|| chunk.clone());
            }
        }

        // Bottom first, i.e. generation order
        let mut sorted: Vec<&Chunk> = seen.values().collect();
        sorted.sort_by(|a, b| b.y_start.total_cmp(&a.y_start));
        let mut same_category_neighbours = 0;
        for pair in sorted.windows(2) {
            assert_eq!(pair[0].y_start, pair[1].y_end());
            let (below, above) = (pair[0].kind(), pair[1].kind());
            if below.is_challenge() && above.is_challenge() {
                assert_eq!(below, above, "categories touch at y={}", pair[0].y_start);
                same_category_neighbours += 1;
            }
        }
        // Same-category challenges may touch; both categories show up
        assert!(same_category_neighbours > 0);
        assert!(sorted.iter().any(|c| c.kind() == ChunkKind::RoadLanes));
        assert!(sorted.iter().any(|c| c.kind() == ChunkKind::River));
    }

    #[test]
    fn test_lane_rows_align_with_player_rows() {
        let spawn_row = crate::snap_to_cell(SPAWN_Y);
        for seed in 0..8 {
            let mut generator = Generator::new(seed, 0.0, None);
            generator.update(&screen_at(0.0), 0.0);
            generator.update(&screen_at(-1_500.0), 0.0);
            for chunk in generator.chunks() {
                assert_eq!(chunk.y_start.rem_euclid(CELL_SIZE), 0.0, "chunk at {}", chunk.y_start);
                assert_eq!(chunk.height.rem_euclid(CELL_SIZE), 0.0);
                for lane in chunk.lanes() {
                    assert_eq!(
                        (lane.center_y() - spawn_row).rem_euclid(CELL_SIZE),
                        0.0,
                        "lane y={} spawn row={}",
                        lane.y,
                        spawn_row
                    );
                }
            }
        }
    }

    #[test]
    fn test_lane_layout_geometry() {
        let mut generator = Generator::new(5, 0.0, None);
        generator.update(&screen_at(-3_000.0), 0.0);
        for chunk in generator.chunks() {
            let lanes = chunk.lanes();
            match chunk.kind() {
                ChunkKind::SafeZone => assert!(lanes.is_empty()),
                _ => {
                    assert!((2..=3).contains(&lanes.len()));
                    assert_eq!(chunk.height, lanes.len() as f64 * LANE_HEIGHT);
                    for (i, lane) in lanes.iter().enumerate() {
                        assert_eq!(lane.y, chunk.y_start + i as f64 * LANE_HEIGHT);
                    }
                }
            }
        }
    }

    #[test]
    fn test_logs_stay_on_screen_without_overlap() {
        let mut generator = Generator::new(11, 0.0, None);
        generator.update(&screen_at(-4_000.0), 0.0);
        let mut rivers = 0;
        for chunk in generator.river_chunks() {
            rivers += 1;
            for lane in chunk.lanes() {
                let mut logs: Vec<_> = chunk.logs().iter().filter(|l| l.lane_id == lane.id).collect();
                assert!(!logs.is_empty());
                logs.sort_by(|a, b| a.center_x.total_cmp(&b.center_x));
                for log in &logs {
                    assert!(log.center_x - log.width / 2.0 >= 0.0);
                    assert!(log.center_x + log.width / 2.0 <= SCREEN_WIDTH);
                    assert_eq!(log.width % CELL_SIZE, 0.0);
                }
                for pair in logs.windows(2) {
                    let gap = (pair[1].center_x - pair[1].width / 2.0)
                        - (pair[0].center_x + pair[0].width / 2.0);
                    assert!(gap >= LOG_GAP);
                }
            }
        }
        assert!(rivers > 0);
    }

    #[test]
    fn test_first_river_after_entry_has_center_log() {
        for seed in 0..20 {
            let mut generator = Generator::new(seed, 0.0, None);
            generator.update(&screen_at(0.0), 0.0);
            // Second chunk is the first challenge above the starting zone
            let first_challenge = &generator.chunks()[1];
            if first_challenge.kind() != ChunkKind::River {
                continue;
            }
            let bottom_lane = first_challenge.lanes().last().unwrap();
            let spawn_column = column_center(GRID_WIDTH / 2);
            assert!(first_challenge.logs().iter().any(|log| {
                log.lane_id == bottom_lane.id
                    && log.center_x == spawn_column
                    && log.width == GUARANTEED_LOG_CELLS as f64 * CELL_SIZE
            }));
            return;
        }
        panic!("no seed produced a river right after the starting zone");
    }

    #[test]
    fn test_visibility_uses_margin() {
        let mut generator = Generator::new(3, 0.0, None);
        let view = screen_at(0.0);
        generator.update(&view, 0.0);
        let visible: Vec<_> = generator.visible_chunks(&view).collect();
        assert!(visible.len() < generator.chunks().len());
        for chunk in &visible {
            assert!(chunk.overlaps_span(view.top() - VISIBILITY_MARGIN, view.bottom() + VISIBILITY_MARGIN));
        }
        // Chunks just above the screen (within the margin) are included
        assert!(visible.iter().any(|c| c.y_start < view.top()));
        assert!(generator.visible_safezones(&view).count() >= 1);
        let lanes = generator.visible_lanes(&view).count();
        let expected: usize = visible.iter().map(|c| c.lanes().len()).sum();
        assert_eq!(lanes, expected);
    }

    #[test]
    fn test_difficulty_rescales_lanes() {
        let mut generator = Generator::new(8, 0.0, None);
        generator.update(&screen_at(0.0), 0.0);
        // Topmost lane survives the scroll below
        let lane = generator
            .chunks()
            .iter()
            .rev()
            .find_map(|c| c.lanes().first())
            .cloned()
            .unwrap();
        assert_eq!(lane.speed, lane.base_speed);

        // Move one level's worth up without generating past the old chunks
        let view = screen_at(-DISTANCE_PER_LEVEL);
        let update = generator.update(&view, 0.0);
        assert!(update.level_changed);
        assert_eq!(generator.difficulty().level, 2);
        let rescaled = generator.lanes().find(|l| l.id == lane.id).unwrap();
        assert!((rescaled.speed - lane.base_speed * (1.0 + SPEED_PER_LEVEL)).abs() < 1e-9);
    }

    #[test]
    fn test_lane_config_overrides_randomized_values() {
        let config = LaneConfig::from_json(
            r#"{ "lanes": [
                { "type": "road", "speed": 333.0, "dir": -1 },
                { "type": "river", "speed": 111.0, "dir": 1, "width": 160.0 }
            ] }"#,
        )
        .unwrap();
        let mut generator = Generator::new(4, 0.0, Some(config));
        generator.update(&screen_at(-2_000.0), 0.0);
        let mut saw_road = false;
        let mut saw_river = false;
        for lane in generator.lanes() {
            match lane.kind {
                LaneKind::Road => {
                    saw_road = true;
                    assert_eq!(lane.base_speed, 333.0);
                    assert_eq!(lane.direction, Direction::Left);
                }
                LaneKind::River => {
                    saw_river = true;
                    assert_eq!(lane.base_speed, 111.0);
                    assert_eq!(lane.direction, Direction::Right);
                    assert_eq!(lane.entity_width, 160.0);
                }
            }
        }
        assert!(saw_road && saw_river);
    }

    #[test]
    fn test_reset_replays_seed() {
        let mut generator = Generator::new(21, 0.0, None);
        generator.update(&screen_at(0.0), 0.0);
        let first: Vec<_> = generator.chunks().to_vec();
        generator.update(&screen_at(-2_000.0), 100.0);
        generator.reset(21, 0.0);
        generator.update(&screen_at(0.0), 0.0);
        // Ids restart too, so the worlds are identical
        assert_eq!(generator.chunks(), &first[..]);
    }

    #[test]
    fn test_pack_logs_drops_what_cannot_fit() {
        let candidates = [(48.0, 96.0), (80.0, 192.0), (112.0, 192.0)];
        let placed = pack_logs(&candidates, 0.0, 400.0);
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0], (48.0, 96.0));
        // pushed right past the first log plus one cell of gap
        assert_eq!(placed[1], (240.0, 192.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_world_invariants_hold_while_scrolling(
            seed in any::<u64>(),
            moves in prop::collection::vec(0.0f64..96.0, 1..120)
        ) {
            let mut generator = Generator::new(seed, 0.0, None);
            let mut top = 0.0;
            for dy in moves {
                top -= dy;
                let view = screen_at(top);
                generator.update(&view, 0.0);

                assert_no_overlap(generator.chunks());
                assert_road_never_touches_river(generator.chunks());

                // Live chunks tile the span from the frontier down to the view bottom
                let mut sorted: Vec<_> = generator.chunks().iter().collect();
                sorted.sort_by(|a, b| a.y_start.total_cmp(&b.y_start));
                prop_assert!(sorted[0].y_start <= view.top() - GENERATION_LEAD);
                for pair in sorted.windows(2) {
                    prop_assert_eq!(pair[0].y_end(), pair[1].y_start);
                }
                // Chunk edges stay on the player's grid
                prop_assert!(sorted.iter().all(|c| c.y_start.rem_euclid(CELL_SIZE) == 0.0));
                let covered_bottom = sorted.last().unwrap().y_end();
                prop_assert!(covered_bottom >= view.bottom().min(START_ZONE_BOTTOM));
            }
        }
    }
}
