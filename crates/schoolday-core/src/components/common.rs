//! Identity, placement and appearance components shared by every entity.

use serde::{Deserialize, Serialize};

use schoolday_logic::geometry::Point;

/// Stable string id, unique within a map. Survives moves between maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an entity is, for rendering and for the collaborator.
///
/// Systems should prefer capability components over matching on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    Npc,
    Dog,
    Cat,
    Bird,
    Portal,
    // Furniture
    Desk,
    Chair,
    Bed,
    Table,
    Backpack,
    Shelf,
    Fridge,
    Window,
    Blackboard,
    Poster,
    Plant,
    // Structures
    Building,
    Dormitory,
    Store,
    SwimmingPool,
    Hoop,
}

impl Kind {
    pub fn is_animal(self) -> bool {
        matches!(self, Kind::Dog | Kind::Cat | Kind::Bird)
    }

    /// NPCs and animals.
    pub fn is_social(self) -> bool {
        self == Kind::Npc || self.is_animal()
    }

    pub fn is_seat(self) -> bool {
        matches!(self, Kind::Desk | Kind::Chair)
    }

    pub fn is_structure(self) -> bool {
        matches!(
            self,
            Kind::Building | Kind::Dormitory | Kind::Store | Kind::SwimmingPool | Kind::Hoop
        )
    }

    /// Wire name, as the collaborator expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Npc => "NPC",
            Kind::Dog => "DOG",
            Kind::Cat => "CAT",
            Kind::Bird => "BIRD",
            Kind::Portal => "PORTAL",
            Kind::Desk => "DESK",
            Kind::Chair => "CHAIR",
            Kind::Bed => "BED",
            Kind::Table => "TABLE",
            Kind::Backpack => "BACKPACK",
            Kind::Shelf => "SHELF",
            Kind::Fridge => "FRIDGE",
            Kind::Window => "WINDOW",
            Kind::Blackboard => "BLACKBOARD",
            Kind::Poster => "POSTER",
            Kind::Plant => "PLANT",
            Kind::Building => "BUILDING",
            Kind::Dormitory => "DORMITORY",
            Kind::Store => "STORE",
            Kind::SwimmingPool => "SWIMMING_POOL",
            Kind::Hoop => "HOOP",
        }
    }
}

/// Map-local position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Point);

/// Collision / interaction radius. Portals trigger within `size + 15`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size(pub f32);

/// Display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

/// Base color as a CSS hex string, passed through to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tint(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Adult,
    Child,
}
