//! Points, wall rectangles, and the player-box collision test.
//!
//! Walls are axis-aligned rectangles in map-local coordinates given by their
//! top-left corner and size. The player is modelled as a box of half-width
//! [`PLAYER_HALF_WIDTH`] and half-height [`PLAYER_HALF_HEIGHT`] centred on its
//! position; overlap is strict, so touching edges do not collide.

use serde::{Deserialize, Serialize};

/// Half-width of the player's collision box.
pub const PLAYER_HALF_WIDTH: f32 = 15.0;

/// Half-height of the player's collision box.
pub const PLAYER_HALF_HEIGHT: f32 = 10.0;

/// A real-valued 2D coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns a copy shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Axis-aligned rectangle `{x, y, w, h}` (top-left corner + size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Walls are plain rectangles; the alias keeps call sites readable.
pub type Wall = Rect;

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.max_x() && p.y >= self.y && p.y <= self.max_y()
    }

    /// Linear interpolation inside the rectangle; `u`, `v` in `[0, 1]`.
    pub fn lerp(&self, u: f32, v: f32) -> Point {
        Point::new(self.x + self.w * u, self.y + self.h * v)
    }
}

/// Whether the player box centred at `p` strictly overlaps `wall`.
pub fn player_box_hits(p: Point, wall: &Wall) -> bool {
    p.x + PLAYER_HALF_WIDTH > wall.x
        && p.x - PLAYER_HALF_WIDTH < wall.max_x()
        && p.y + PLAYER_HALF_HEIGHT > wall.y
        && p.y - PLAYER_HALF_HEIGHT < wall.max_y()
}

/// Whether the player box centred at `p` overlaps any wall in `walls`.
pub fn overlaps(p: Point, walls: &[Wall]) -> bool {
    walls.iter().any(|w| player_box_hits(p, w))
}
