//! River physics: riding logs, coyote time and drowning
//!
//! The player is safe in a river only while attached to a platform. Contact
//! requires both a rectangle overlap and the player's center lying within the
//! platform's horizontal span, so grazing a log's edge does not count.
//! Losing contact starts a short grace timer before the attachment is dropped.

use serde::{Deserialize, Serialize};

use super::chunk::Chunk;
use super::entity::{LaneEntity, Platform};
use super::rect::Rect;
use crate::consts::*;

/// Per-tick outcome
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverReport {
    pub drowning: bool,
    /// Player center lies inside some river chunk
    pub in_river: bool,
    pub attached_platform: Option<u32>,
    /// Grace time left before an unsupported attachment is dropped
    pub coyote_remaining: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiverPhysics {
    attached: Option<u32>,
    /// Time since the attached platform was last touched
    coyote_timer: f64,
}

impl RiverPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> Option<u32> {
        self.attached
    }

    /// Drop any attachment (respawn, restart)
    pub fn reset(&mut self) {
        self.attached = None;
        self.coyote_timer = 0.0;
    }

    /// Platform under the player this tick, if any.
    ///
    /// The current attachment wins ties so the player does not hop between
    /// two logs that both touch it.
    fn contact<'a>(&self, player: &Rect, platforms: &'a [Platform]) -> Option<&'a Platform> {
        let touching = |p: &&Platform| {
            player.overlaps(p.rect()) && p.rect().contains_x(player.center_x())
        };
        self.attached
            .and_then(|id| platforms.iter().filter(touching).find(|p| p.id == id))
            .or_else(|| platforms.iter().find(touching))
    }

    /// Advance one tick.
    ///
    /// Carries `player` with the platform it stands on (clamped to the
    /// screen), updates the attachment and reports whether it is drowning.
    pub fn step<'a, I>(&mut self, player: &mut Rect, platforms: &[Platform], rivers: I, dt: f64) -> RiverReport
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        match self.contact(player, platforms) {
            Some(platform) => {
                self.attached = Some(platform.id);
                self.coyote_timer = 0.0;

                let half = player.w / 2.0;
                let x = player.center_x() + platform.displacement(dt);
                player.set_center_x(x.clamp(half, SCREEN_WIDTH - half));
            }
            None => {
                if self.attached.is_some() {
                    self.coyote_timer += dt;
                    if self.coyote_timer > COYOTE_SECS {
                        self.attached = None;
                        self.coyote_timer = 0.0;
                    }
                }
            }
        }

        let center_y = player.center_y();
        let in_river = rivers.into_iter().any(|chunk| chunk.contains_y(center_y));
        let coyote_remaining = match self.attached {
            Some(_) => (COYOTE_SECS - self.coyote_timer).max(0.0),
            None => 0.0,
        };

        RiverReport {
            drowning: in_river && self.attached.is_none(),
            in_river,
            attached_platform: self.attached,
            coyote_remaining,
        }
    }
}
