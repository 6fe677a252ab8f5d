//! Component definitions for the per-map entity stores.
//!
//! Components are pure data attached to entities. Behavior lives in systems,
//! which dispatch on capability components (`Movable`, `Interactable`,
//! `Social`, `FormationMember`) rather than switching on [`Kind`].

mod common;
mod roles;

pub use common::*;
pub use roles::*;
