//! Player vs vehicle collision
//!
//! Both rectangles are shrunk about their centers before the overlap test,
//! so a car brushing past the frog's corner is forgiven.

use super::entity::Vehicle;
use super::rect::Rect;
use crate::consts::COLLISION_RATIO;

/// The forgiving hitbox used for vehicle hits
#[inline]
pub fn hitbox(rect: &Rect) -> Rect {
    rect.scaled(COLLISION_RATIO)
}

/// True if the shrunken rectangles overlap
pub fn rects_collide(a: &Rect, b: &Rect) -> bool {
    hitbox(a).overlaps(&hitbox(b))
}

/// Ids of every vehicle hitting the player, in vehicle order
pub fn vehicle_hits(player: &Rect, vehicles: &[Vehicle]) -> Vec<u32> {
    let player_box = hitbox(player);
    vehicles
        .iter()
        .filter(|vehicle| player_box.overlaps(&hitbox(&vehicle.rect)))
        .map(|vehicle| vehicle.id)
        .collect()
}
