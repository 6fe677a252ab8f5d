//! Pure simulation logic for the school-day game.
//!
//! This crate contains the game logic that is independent of the entity
//! store, the dialogue collaborator, or any renderer. Functions take plain
//! data and return results, making them unit-testable and reusable by the
//! engine crate and the headless harness alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`camera`] | Viewport offset and screen → world translation |
//! | [`constants`] | Speeds, radii, timings, fixed anchor points |
//! | [`geometry`] | Points, wall rectangles, player-box collision |
//! | [`movement`] | Per-tick stepping, facing, wall-sliding player steps |
//! | [`schedule`] | Lesson order, teacher roster, homework status |
//! | [`timer`] | Clock abstraction, single-shot deadlines, interval timers |

pub mod camera;
pub mod constants;
pub mod geometry;
pub mod movement;
pub mod schedule;
pub mod timer;
