//! Randomized population of the interchangeable NPC slots.

mod names;
mod roster;

pub use names::*;
pub use roster::*;
