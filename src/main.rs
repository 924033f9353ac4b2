//! Endless Crossing entry point
//!
//! Headless native runner: loads settings, then plays an autopilot session
//! through the fixed-step clock and records finished runs on the leaderboard.
//! Set `RUST_LOG=info` (or `debug` for generator traffic) to watch it play.

use std::path::PathBuf;

use endless_crossing::consts::*;
use endless_crossing::highscores::format_elapsed;
use endless_crossing::sim::collision::hitbox;
use endless_crossing::sim::{
    ClockError, FixedStepClock, GameEvent, GamePhase, GameState, LaneConfig, LaneEntity, Rect,
    TickInput, tick,
};
use endless_crossing::{HighScores, Settings};

/// Simulated display refresh; deliberately not a multiple of the physics rate
const FRAME_TIME: f64 = 1.0 / 45.0;

/// Ticks of vehicle motion the autopilot looks ahead
const LOOKAHEAD_TICKS: f64 = 12.0;

/// Game session holding all state
struct Session {
    state: GameState,
    clock: FixedStepClock,
    highscores: HighScores,
    highscores_path: Option<PathBuf>,
    input: TickInput,
    last_phase: GamePhase,
}

impl Session {
    /// Run simulation ticks for one frame of wall time
    fn frame(&mut self, frame_time: f64) {
        self.input = autopilot(&self.state);
        let state = &mut self.state;
        let input = &mut self.input;
        self.clock.advance(frame_time, |dt| {
            tick(state, input, dt);
            // One-shot inputs apply to the first step of the frame only
            *input = TickInput::default();
        });

        for event in self.state.drain_events() {
            match event {
                GameEvent::LifeLost { cause, lives } => {
                    log::debug!("{:?}, {} lives left", cause, lives)
                }
                GameEvent::NewBest { score } => log::info!("New personal best: {}", score),
                _ => {}
            }
        }

        if self.state.phase == GamePhase::GameOver && self.last_phase != GamePhase::GameOver {
            self.record_run();
        }
        self.last_phase = self.state.phase;
    }

    fn record_run(&mut self) {
        let level = self.state.generator.difficulty().level;
        let rank = self.highscores.add_score(
            self.state.score,
            level,
            self.state.elapsed,
            self.state.seed,
        );
        if let Some(rank) = rank {
            log::info!(
                "Run scored {} (level {}, {}) - rank #{}",
                self.state.score,
                level,
                format_elapsed(self.state.elapsed),
                rank
            );
            self.highscores.save(self.highscores_path.as_deref());
        }
    }
}

/// Pick this frame's input: start runs, and hop forward when the way is clear
fn autopilot(state: &GameState) -> TickInput {
    match state.phase {
        GamePhase::Menu | GamePhase::GameOver => {
            return TickInput {
                start: true,
                ..Default::default()
            };
        }
        GamePhase::Playing => {}
    }
    if state.player.is_hopping() {
        return TickInput::default();
    }

    let here = state.player.rect();
    let ahead = here.translated(glam::DVec2::new(0.0, -PLAYER_STEP));
    if is_safe(state, &ahead) {
        return TickInput {
            up: true,
            ..Default::default()
        };
    }
    if !is_safe(state, &here) {
        // Sidestep toward the screen center
        let toward_center = if here.center_x() < SCREEN_WIDTH / 2.0 {
            TickInput {
                right: true,
                ..Default::default()
            }
        } else {
            TickInput {
                left: true,
                ..Default::default()
            }
        };
        return toward_center;
    }
    TickInput::default()
}

/// No vehicle will cross `spot` soon, and water there has a log under its center
fn is_safe(state: &GameState, spot: &Rect) -> bool {
    let target = hitbox(spot);
    let traffic = state.vehicles.iter().any(|vehicle| {
        let now = hitbox(vehicle.rect());
        let later = now.translated(glam::DVec2::new(vehicle.displacement(SIM_DT * LOOKAHEAD_TICKS), 0.0));
        let swept = Rect::new(
            now.left().min(later.left()),
            now.top(),
            now.w + (later.left() - now.left()).abs(),
            now.h,
        );
        swept.overlaps(&target)
    });
    if traffic {
        return false;
    }

    let center = spot.center();
    let in_water = state
        .generator
        .river_chunks()
        .any(|chunk| chunk.contains_y(center.y));
    !in_water
        || state.platforms.iter().any(|platform| {
            let rect = platform.rect();
            rect.overlaps(spot) && rect.left() + 8.0 <= center.x && center.x <= rect.right() - 8.0
        })
}

fn main() -> Result<(), ClockError> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Endless Crossing (headless) starting...");

    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref());
    let lane_config = LaneConfig::load_or_warn(settings.lane_config_path.as_deref());
    let highscores = HighScores::load(settings.highscores_path.as_deref());

    let clock = FixedStepClock::new(settings.physics_hz).or_else(|err| {
        log::warn!("{}; using {} Hz", err, PHYSICS_HZ);
        FixedStepClock::new(PHYSICS_HZ)
    })?;

    let seed = settings.initial_seed();
    let mut state = GameState::with_options(seed, settings.seed_mode(), lane_config);
    state.best_score = highscores.top_score().unwrap_or(0);
    log::info!(
        "Seed {} ({:?}), {} Hz, autopilot for {:.0}s",
        seed,
        settings.seed_mode(),
        clock.hz(),
        settings.autopilot_seconds
    );

    let mut session = Session {
        state,
        clock,
        highscores,
        highscores_path: settings.highscores_path.clone(),
        input: TickInput::default(),
        last_phase: GamePhase::Menu,
    };

    let frames = (settings.autopilot_seconds / FRAME_TIME).ceil() as u64;
    for _ in 0..frames {
        session.frame(FRAME_TIME);
    }

    let hud = session.state.hud();
    log::info!(
        "Session over: phase {:?}, score {}, best {}, level {}, lives {}, {} runs",
        hud.phase,
        hud.score,
        hud.best_score,
        hud.level,
        hud.lives,
        session.state.runs
    );
    if hud.phase == GamePhase::Playing && session.highscores.qualifies(hud.score) {
        session.record_run();
    }
    for (i, entry) in session.highscores.entries.iter().enumerate() {
        println!(
            "{:>2}. {:>6}  level {:>2}  {:>6}  seed {}",
            i + 1,
            entry.score,
            entry.level,
            format_elapsed(entry.elapsed),
            entry.seed
        );
    }
    Ok(())
}
