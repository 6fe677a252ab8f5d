//! Schoolday Core - School Day Simulation Engine
//!
//! A 2D top-down simulation of one student's school day: morning at the
//! school gate, four lessons with teachers walking in and out, a PE line-up
//! that ends on the playground, curfew back at the dorm, homework, sleep,
//! and a crowded dorm room the next morning.
//!
//! # Architecture
//!
//! Every map owns its own `hecs::World`; only the active map is simulated.
//! - **Components**: Pure data attached to entities (Position, Kind, Role, etc.)
//! - **Systems**: Player stepping, NPC behavior, the day schedule, interactions
//! - **Engine**: Day state, timers, the dialogue broker, and the event queue
//!
//! Rendering, input, and audio playback live outside this crate. A host
//! feeds pointer clicks and a clock, then draws from [`SimulationEngine::snapshot`].
//!
//! # Example
//!
//! ```rust,no_run
//! use schoolday_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default()).unwrap();
//!
//! // A click on the render surface, in screen coordinates
//! engine.pointer_click(Point::new(700.0, 380.0));
//!
//! let mut now = 0;
//! loop {
//!     now += 16; // ~60 FPS
//!     engine.tick(now);
//!     for event in engine.drain_events() {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generation;
pub mod maps;
pub mod snapshot;
pub mod state;
pub mod systems;

pub use engine::SimulationEngine;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::engine::SimulationEngine;
    pub use crate::events::{SimEvent, Transition};
    pub use crate::maps::MapId;
    pub use crate::snapshot::WorldSnapshot;
    pub use schoolday_logic::geometry::Point;
    pub use schoolday_logic::movement::Facing;
    pub use schoolday_logic::schedule::Lesson;
}
