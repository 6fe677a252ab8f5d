//! Systems - logic that runs over the maps and the engine state

mod behavior;
mod dialogue;
mod interaction;
mod movement;
mod schedule;

pub use behavior::*;
pub use dialogue::*;
pub use interaction::*;
pub use movement::*;
pub use schedule::*;
