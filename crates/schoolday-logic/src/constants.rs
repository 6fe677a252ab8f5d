//! Game constants: speeds, radii, timings, and fixed anchor points.
//!
//! Speeds are in world units per tick, durations in milliseconds. The
//! tunable ones are mirrored as defaults in the engine's `SimConfig`.

pub mod speeds {
    pub const PLAYER: f32 = 3.5;
    pub const NPC: f32 = 1.5;
    pub const ANIMAL: f32 = 2.0;
    /// Teachers walking between the door and the podium.
    pub const TEACHER: f32 = 2.5;
    /// Students filing into the line-up columns.
    pub const LINE_UP: f32 = 2.0;
}

pub mod timing {
    /// Time after PE dismissal before the player must be back in the dorm.
    pub const CURFEW_TIMEOUT_MS: u64 = 20_000;
    pub const CURFEW_CHECK_INTERVAL_MS: u64 = 1_000;
    pub const HOMEWORK_MS: u64 = 3_000;
    pub const SLEEP_MS: u64 = 3_000;
    /// Pause between a complete line-up and arriving on the playground.
    pub const FORMATION_TRANSFER_MS: u64 = 2_000;
    pub const MORNING_QUEUE_INTERVAL_MS: u64 = 1_500;
}

pub mod radii {
    /// Added to a portal's size for the proximity trigger.
    pub const PLAYER: f32 = 15.0;
    pub const BED_HIT: f32 = 60.0;
    pub const DEFAULT_HIT: f32 = 40.0;
    /// Tolerance on each axis for the player to count as standing in the gap.
    pub const LINE_UP_GAP: f32 = 20.0;
    /// Walk target offset below a clicked entity (except desks and chairs).
    pub const APPROACH_OFFSET_Y: f32 = 35.0;
    /// Seated position offset below a desk or chair.
    pub const SEAT_OFFSET_Y: f32 = 20.0;
}

pub mod anchors {
    use crate::geometry::Point;

    pub const PODIUM: Point = Point::new(500.0, 100.0);
    pub const CLASSROOM_DOOR: Point = Point::new(50.0, 300.0);
    pub const SCHOOL_GATE: Point = Point::new(700.0, 1250.0);
    /// Where the RA sends a student caught out after curfew.
    pub const FRONT_DESK: Point = Point::new(300.0, 320.0);
    /// Player's spot on the first morning of a new day.
    pub const WAKE_UP: Point = Point::new(730.0, 200.0);

    // Classroom line-up
    pub const LINE_UP_LEFT_X: f32 = 460.0;
    pub const LINE_UP_RIGHT_X: f32 = 540.0;
    pub const LINE_UP_TOP_Y: f32 = 200.0;
    pub const LINE_UP_ROW_SPACING: f32 = 40.0;
    /// Row left empty in the left column for the player.
    pub const LINE_UP_GAP_ROW: usize = 2;

    // Playground formation
    pub const PE_TEACHER: Point = Point::new(700.0, 450.0);
    pub const FORMATION_PLAYER: Point = Point::new(700.0, 900.0);
    pub const FORMATION_LEADER_ORIGIN: Point = Point::new(550.0, 520.0);
    pub const FORMATION_LEADER_SPACING: f32 = 100.0;
    pub const FORMATION_GRID_ORIGIN: Point = Point::new(450.0, 600.0);
    pub const FORMATION_GRID_SPACING: f32 = 80.0;
    pub const FORMATION_GRID_COLUMNS: usize = 6;

    /// The player's gap in the line-up.
    pub fn line_up_gap() -> Point {
        line_up_slot_point(LINE_UP_LEFT_X, LINE_UP_GAP_ROW)
    }

    pub fn line_up_slot_point(column_x: f32, row: usize) -> Point {
        Point::new(column_x, LINE_UP_TOP_Y + LINE_UP_ROW_SPACING * row as f32)
    }
}
