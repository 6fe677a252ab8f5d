//! Camera offset and screen → world translation.
//!
//! The camera centres on the player and clamps to the map edges. A map
//! narrower (or shorter) than the viewport is centred instead, which yields
//! a negative offset on that axis.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Size of the render surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

fn axis_offset(player: f32, map_len: f32, view_len: f32) -> f32 {
    if map_len < view_len {
        -(view_len - map_len) / 2.0
    } else {
        (player - view_len / 2.0).min(map_len - view_len).max(0.0)
    }
}

/// World coordinate of the viewport's top-left corner.
pub fn camera_offset(player: Point, map_width: f32, map_height: f32, view: Viewport) -> Point {
    Point::new(
        axis_offset(player.x, map_width, view.width),
        axis_offset(player.y, map_height, view.height),
    )
}

/// Translate a click on the render surface into world coordinates.
pub fn screen_to_world(screen: Point, camera: Point) -> Point {
    Point::new(screen.x + camera.x, screen.y + camera.y)
}
