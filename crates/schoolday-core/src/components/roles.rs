//! Roles, behavior tags, and capability components.

use serde::{Deserialize, Serialize};

use schoolday_logic::geometry::Point;
use schoolday_logic::schedule::Lesson;

use crate::maps::MapId;

/// Semantic role of a character, resolved once when the entity is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum Role {
    /// Runs the given lesson. At most one per classroom.
    Teacher { lesson: Lesson },
    /// Classmate seated at `desk` in the classroom.
    Student { desk: usize },
    /// Dorm roommate in bed/chair slot `slot`.
    Roommate { slot: usize },
    /// Guard, RA, cashier.
    Staff,
    Generic,
}

impl Role {
    pub fn is_teacher(&self) -> bool {
        matches!(self, Role::Teacher { .. })
    }

    pub fn is_student(&self) -> bool {
        matches!(self, Role::Student { .. })
    }

    pub fn is_roommate(&self) -> bool {
        matches!(self, Role::Roommate { .. })
    }

    pub fn lesson(&self) -> Option<Lesson> {
        match self {
            Role::Teacher { lesson } => Some(*lesson),
            _ => None,
        }
    }
}

/// Behavior tag. `Sleep` and `Study` live on the entity and suppress both
/// movement and conversation; `Exit` and `Stay` are dismissal choices held
/// in the NPC AI side-table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Sleep,
    Study,
    Exit,
    Stay,
}

impl Behavior {
    /// Whether the character is busy and answers with a fixed line.
    pub fn is_busy(self) -> bool {
        matches!(self, Behavior::Sleep | Behavior::Study)
    }
}

/// Opaque metadata handed to the dialogue collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Personality description, e.g. "吃货，最喜欢零食".
    pub traits: Option<String>,
    /// Speech voice id.
    pub voice: Option<String>,
}

/// Where a portal leads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalLink {
    pub target_map: MapId,
    pub target_pos: Point,
}

/// Desk or chair state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub occupied: bool,
}

/// Clickable building facade that forwards to a door portal.
///
/// The hit box is centred `offset_y` below the anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facade {
    pub door: String,
    pub half_width: f32,
    pub half_height: f32,
    pub offset_y: f32,
}

// --- Capabilities ---

/// Moves autonomously at `speed` units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Movable {
    pub speed: f32,
}

/// Responds to pointer clicks within `hit_radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interactable {
    pub hit_radius: f32,
}

/// Can be talked to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social;

/// Takes a slot in the line-up and the playground formation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationMember;
