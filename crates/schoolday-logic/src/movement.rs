//! Per-tick stepping toward a target, facing, and wall-sliding player steps.
//!
//! Algorithm for the player: "split axis then slide"
//! 1. If the target is within one step, snap onto it (unless the snapped
//!    point is inside a wall, in which case the step is abandoned)
//! 2. Otherwise compute the X and Y displacement along the unit vector
//! 3. Apply X alone if the resulting position is clear
//! 4. Apply Y alone (from the possibly-updated X) if clear
//!
//! A blocked axis simply does not advance, which produces smooth sliding
//! along walls instead of rejecting the whole move. NPCs use
//! [`step_toward`] without collision.

use serde::{Deserialize, Serialize};

use crate::geometry::{overlaps, Point, Wall};

/// Cardinal facing of a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Dominant axis of a displacement; ties break toward vertical.
    /// Returns `None` for a zero displacement.
    pub fn from_delta(dx: f32, dy: f32) -> Option<Self> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        if dx.abs() > dy.abs() {
            Some(if dx > 0.0 { Facing::Right } else { Facing::Left })
        } else {
            Some(if dy > 0.0 { Facing::Down } else { Facing::Up })
        }
    }

    /// Facing from `from` toward `to`, or `fallback` if they coincide.
    pub fn toward(from: Point, to: Point, fallback: Facing) -> Self {
        Self::from_delta(to.x - from.x, to.y - from.y).unwrap_or(fallback)
    }
}

/// Result of advancing a mover by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Resolved position after the tick.
    pub pos: Point,
    /// Facing along the dominant axis of the attempted motion.
    pub facing: Option<Facing>,
    /// Target reached (or abandoned); the caller should clear it.
    pub arrived: bool,
}

/// Advance `pos` toward `target` by at most `speed` units, without collision.
///
/// If the remaining distance is ≤ `speed` the mover snaps exactly onto the
/// target and `arrived` is set.
pub fn step_toward(pos: Point, target: Point, speed: f32) -> Step {
    let dx = target.x - pos.x;
    let dy = target.y - pos.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let facing = Facing::from_delta(dx, dy);

    if dist <= speed {
        return Step {
            pos: target,
            facing,
            arrived: true,
        };
    }

    Step {
        pos: Point::new(pos.x + speed * dx / dist, pos.y + speed * dy / dist),
        facing,
        arrived: false,
    }
}

/// Advance the player toward `target`, resolving X and Y independently
/// against `walls` so that a blocked axis slides instead of stopping.
///
/// `arrived` is also set when neither axis can advance, so the caller stops
/// pushing into a corner forever.
pub fn resolve_player_step(pos: Point, target: Point, speed: f32, walls: &[Wall]) -> Step {
    let dx = target.x - pos.x;
    let dy = target.y - pos.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let facing = Facing::from_delta(dx, dy);

    if dist <= speed {
        let pos = if overlaps(target, walls) { pos } else { target };
        return Step {
            pos,
            facing,
            arrived: true,
        };
    }

    let next_x = pos.x + speed * dx / dist;
    let next_y = pos.y + speed * dy / dist;

    let mut resolved = pos;
    if !overlaps(Point::new(next_x, resolved.y), walls) {
        resolved.x = next_x;
    }
    if !overlaps(Point::new(resolved.x, next_y), walls) {
        resolved.y = next_y;
    }

    Step {
        pos: resolved,
        facing,
        arrived: resolved == pos,
    }
}
