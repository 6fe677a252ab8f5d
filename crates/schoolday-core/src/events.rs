//! Events emitted by the engine for the render/audio boundary.
//!
//! The engine pushes events while it mutates state; the host drains them
//! once per frame with [`crate::SimulationEngine::drain_events`].

use serde::{Deserialize, Serialize};

use schoolday_logic::schedule::Lesson;

use crate::maps::MapId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    MapChanged { from: MapId, to: MapId },
    ClassStarted { lesson: Lesson },
    LineUpStarted,
    /// The class moved to the playground for PE.
    FormationReady,
    LessonAdvanced { lesson: Lesson },
    SchoolDismissed,
    CurfewEscort,
    HomeworkDone,
    NightFell,
    NewDay { day: u32 },
    RoommateLeft { id: String },
    MorningQueueCleared,
    NpcDespawned { map: MapId, id: String },
    ItemGranted { item: String },
    FriendAdded { name: String },
    /// A collaborator request went out for this dialogue sequence.
    DialogueRequested { seq: u64, npc_id: String },
    /// Speech audio for the line currently on screen.
    PlayAudio {
        npc_id: String,
        #[serde(skip)]
        bytes: Vec<u8>,
    },
}

/// Whether a schedule or interaction command changed anything.
///
/// Invalid or repeated commands are not errors; they come back as
/// [`Transition::Ignored`] and leave the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    pub fn applied(self) -> bool {
        self == Transition::Applied
    }
}
