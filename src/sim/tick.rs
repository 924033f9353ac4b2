//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec2;

use super::chunk::{Lane, LaneId, LaneKind, LogSpec};
use super::collision::vehicle_hits;
use super::entity::{
    LaneEntity, LaneSpawner, Platform, Vehicle, entry_center_x, entry_is_clear, initial_traffic,
};
use super::generator::GeneratorUpdate;
use super::rect::Rect;
use super::state::{DeathCause, GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::snap_to_cell;

/// Input commands for a single tick (deterministic).
///
/// Movement flags are edges: a held key must only be reported on the tick
/// it went down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Start a run from the menu, or play again after game over
    pub start: bool,
    /// Leave the current run for the menu
    pub back: bool,
}

impl TickInput {
    /// Grid direction of the requested hop; up wins over down, left over right
    fn hop_direction(&self) -> Option<DVec2> {
        if self.up {
            Some(DVec2::NEG_Y)
        } else if self.down {
            Some(DVec2::Y)
        } else if self.left {
            Some(DVec2::NEG_X)
        } else if self.right {
            Some(DVec2::X)
        } else {
            None
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f64) {
    state.time_ticks += 1;

    match state.phase {
        GamePhase::Menu => {
            if input.start {
                state.begin_run();
            }
            return;
        }
        GamePhase::GameOver => {
            if input.start {
                state.begin_run();
            } else if input.back {
                state.phase = GamePhase::Menu;
                log::info!("Back to menu");
            }
            return;
        }
        GamePhase::Playing => {
            if input.back {
                state.phase = GamePhase::Menu;
                log::info!("Run abandoned at score {}", state.score);
                return;
            }
        }
    }

    // Play time drives the difficulty milestones
    state.elapsed += dt;

    // Player: discrete hop, then the (visual) hop animation
    if let Some(direction) = input.hop_direction() {
        let floor = state.generator.covered_bottom().min(SCREEN_HEIGHT);
        state.player.hop(direction, floor);
    }
    state.player.animate();

    // Camera, then the world around it
    state.camera.follow(&state.player.rect());
    let view = state.view();
    let update = state.generator.update(&view, state.elapsed);
    if update.level_changed {
        let level = state.generator.difficulty().level;
        state.events.push(GameEvent::LevelUp { level });
        log::info!("Level {} reached", level);
    }
    let rows = (state.generator.difficulty().distance_traveled / CELL_SIZE).floor() as u64;
    state.score = rows * POINTS_PER_ROW;

    reconcile_entities(state, &view, &update);
    run_spawners(state, dt);

    // Entity motion
    for vehicle in &mut state.vehicles {
        vehicle.advance(dt);
    }
    for platform in &mut state.platforms {
        platform.advance(dt);
    }
    state.vehicles.retain(|v| !v.is_gone());
    state.platforms.retain(|p| !p.is_gone());

    // River
    let mut player_rect = state.player.rect();
    let report = state.river.step(
        &mut player_rect,
        &state.platforms,
        state.generator.river_chunks(),
        dt,
    );
    state.player.position = player_rect.center();
    if report.drowning && !state.is_invulnerable() {
        lose_life(state, DeathCause::Drowned);
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    // Invulnerability window
    if state.invulnerable_timer > 0.0 {
        state.invulnerable_timer = (state.invulnerable_timer - dt).max(0.0);
    }

    // Safe zones: dwell to regain lives, and remember the row for respawns
    let player_y = state.player.position.y;
    state.in_safe_zone = state
        .generator
        .visible_safezones(&view)
        .any(|zone| zone.contains(player_y));
    if state.in_safe_zone {
        state.checkpoint_y = player_y;
        state.safe_zone_dwell += dt;
        // Tolerate accumulated rounding in the dwell sum
        if state.safe_zone_dwell + 1e-9 >= SAFE_ZONE_REGEN_SECS {
            state.safe_zone_dwell = 0.0;
            if state.lives < MAX_LIVES {
                state.lives += 1;
                state.events.push(GameEvent::LifeRestored { lives: state.lives });
                log::info!("Life restored ({} lives)", state.lives);
            }
        }
    } else {
        state.safe_zone_dwell = 0.0;
    }

    // Traffic
    if !state.is_invulnerable() && !vehicle_hits(&state.player.rect(), &state.vehicles).is_empty() {
        lose_life(state, DeathCause::HitByVehicle);
    }

    state.normalize_order();
}

/// Drop entities of evicted lanes, propagate difficulty and populate lanes
/// that just came into view.
fn reconcile_entities(state: &mut GameState, view: &Rect, update: &GeneratorUpdate) {
    if !update.evicted_lanes.is_empty() {
        let evicted: BTreeSet<LaneId> = update.evicted_lanes.iter().copied().collect();
        state.vehicles.retain(|v| !evicted.contains(&v.lane_id));
        state.platforms.retain(|p| !evicted.contains(&p.lane_id));
        state.spawners.retain(|id, _| !evicted.contains(id));
    }

    if update.difficulty_changed {
        let speeds: BTreeMap<LaneId, f64> = state
            .generator
            .lanes()
            .map(|lane| (lane.id, lane.speed))
            .collect();
        for vehicle in &mut state.vehicles {
            if let Some(&speed) = speeds.get(&vehicle.lane_id) {
                vehicle.set_speed(speed);
            }
        }
        for platform in &mut state.platforms {
            if let Some(&speed) = speeds.get(&platform.lane_id) {
                platform.set_speed(speed);
            }
        }
    }

    let mut fresh: Vec<(Lane, Vec<LogSpec>)> = Vec::new();
    for chunk in state.generator.visible_chunks(view) {
        for lane in chunk.lanes() {
            if state.spawners.contains_key(&lane.id) {
                continue;
            }
            let logs = chunk
                .logs()
                .iter()
                .filter(|log| log.lane_id == lane.id)
                .copied()
                .collect();
            fresh.push((lane.clone(), logs));
        }
    }

    for (lane, logs) in fresh {
        match lane.kind {
            LaneKind::Road => {
                for x in initial_traffic(&lane, &mut state.spawn_rng) {
                    let id = state.next_entity_id();
                    state.vehicles.push(Vehicle::new(id, &lane, x));
                }
            }
            LaneKind::River => {
                for spec in &logs {
                    let id = state.next_entity_id();
                    state.platforms.push(Platform::from_spec(id, &lane, spec));
                }
            }
        }
        let spawner = LaneSpawner::new(&lane, &mut state.spawn_rng);
        state.spawners.insert(lane.id, spawner);
    }
}

/// Tick every lane spawner and spawn at the leading edge where due
fn run_spawners(state: &mut GameState, dt: f64) {
    let mut due = Vec::new();
    for lane in state.generator.lanes() {
        if let Some(spawner) = state.spawners.get_mut(&lane.id) {
            if spawner.tick(dt) {
                due.push(lane.clone());
            }
        }
    }

    for lane in due {
        let spawned = match lane.kind {
            LaneKind::Road => try_spawn_vehicle(state, &lane),
            LaneKind::River => try_spawn_platform(state, &lane),
        };
        if spawned {
            if let Some(spawner) = state.spawners.get_mut(&lane.id) {
                spawner.rearm(&lane, &mut state.spawn_rng);
            }
        }
    }
}

fn try_spawn_vehicle(state: &mut GameState, lane: &Lane) -> bool {
    let in_lane = || state.vehicles.iter().filter(move |v| v.lane_id == lane.id);
    if in_lane().count() >= lane.max_entities as usize
        || !entry_is_clear(lane, lane.entity_width, in_lane())
    {
        return false;
    }
    let id = state.next_entity_id();
    let x = entry_center_x(lane, lane.entity_width);
    state.vehicles.push(Vehicle::new(id, lane, x));
    true
}

fn try_spawn_platform(state: &mut GameState, lane: &Lane) -> bool {
    let in_lane = || state.platforms.iter().filter(move |p| p.lane_id == lane.id);
    if in_lane().count() >= lane.max_entities as usize
        || !entry_is_clear(lane, lane.entity_width, in_lane())
    {
        return false;
    }
    let id = state.next_entity_id();
    let x = entry_center_x(lane, lane.entity_width);
    state
        .platforms
        .push(Platform::new(id, lane, x, lane.entity_width));
    true
}

/// Take a life; respawn on the checkpoint row or end the run
fn lose_life(state: &mut GameState, cause: DeathCause) {
    state.lives = state.lives.saturating_sub(1);
    state.events.push(GameEvent::LifeLost {
        cause,
        lives: state.lives,
    });
    log::info!("Life lost ({:?}), {} left", cause, state.lives);

    if state.lives == 0 {
        game_over(state);
        return;
    }

    respawn(state);
    state.invulnerable_timer = INVULNERABILITY_SECS;
}

/// Put the player back on the spawn column.
///
/// The row is the last safe zone stood in, if its chunk is still live;
/// otherwise the nearest live safe zone below the player.
fn respawn(state: &mut GameState) {
    let checkpoint = state.checkpoint_y;
    let player_y = state.player.position.y;
    let zones: Vec<_> = state
        .generator
        .chunks()
        .iter()
        .filter_map(|chunk| chunk.safe_zone())
        .copied()
        .collect();

    let row = if zones.iter().any(|zone| zone.contains(checkpoint)) {
        checkpoint
    } else {
        zones
            .iter()
            .filter(|zone| zone.y_pos + zone.height >= player_y)
            .min_by(|a, b| a.y_pos.total_cmp(&b.y_pos))
            .map(|zone| zone.center_row())
            .unwrap_or(player_y)
    };

    state.player.position = DVec2::new(snap_to_cell(SPAWN_X), snap_to_cell(row));
    state.player.hop_ticks = 0;
    state.checkpoint_y = state.player.position.y;
    state.river.reset();
    state.safe_zone_dwell = 0.0;
}

fn game_over(state: &mut GameState) {
    state.phase = GamePhase::GameOver;
    state.events.push(GameEvent::GameOver { score: state.score });
    log::info!(
        "Game over: score {}, level {}, {:.1}s",
        state.score,
        state.generator.difficulty().level,
        state.elapsed
    );
    if state.score > state.best_score {
        state.best_score = state.score;
        state.events.push(GameEvent::NewBest { score: state.score });
        log::info!("New best score: {}", state.score);
    }
}
