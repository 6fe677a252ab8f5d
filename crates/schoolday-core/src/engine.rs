//! Simulation engine - main entry point for running the school day

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use schoolday_logic::camera::camera_offset;
use schoolday_logic::geometry::Point;
use schoolday_logic::timer::{Clock, Deadline, IntervalTimer};

use crate::config::SimConfig;
use crate::error::{ConfigError, WorldError};
use crate::events::SimEvent;
use crate::generation::{generate_class_roster, StudentProfile};
use crate::maps::templates::build_registry;
use crate::maps::{GameMap, MapId, MapRegistry};
use crate::state::{DayState, DialogueBox, DialogueLog, Friends, Inventory, PlayerState};
use crate::systems::{behavior_system, BehaviorOutcome, DialogueBroker, NpcAiTable, UnavailableCollaborator};

/// Speaker name for scripted narration.
pub const NARRATOR: &str = "旁白";

/// Deadlines and periodic checks owned by the engine. The curfew deadline
/// itself lives on [`DayState`].
#[derive(Debug, Clone)]
pub(crate) struct Timers {
    pub homework: Deadline,
    pub sleep: Deadline,
    pub formation: Deadline,
    pub curfew_check: IntervalTimer,
    pub morning_queue: IntervalTimer,
}

impl Timers {
    fn new(now: u64, config: &SimConfig) -> Self {
        Self {
            homework: Deadline::idle(),
            sleep: Deadline::idle(),
            formation: Deadline::idle(),
            curfew_check: IntervalTimer::new(now, config.curfew_check_interval_ms),
            morning_queue: IntervalTimer::new(now, config.morning_queue_interval_ms),
        }
    }
}

/// Main simulation engine.
///
/// Owns every map, the player, the schedule, and the transient NPC AI
/// table. All mutation happens on the caller's thread inside [`tick`] or
/// one of the command methods; dialogue replies are queued by the
/// [`DialogueBroker`] and applied at the start of the next tick.
///
/// [`tick`]: SimulationEngine::tick
pub struct SimulationEngine {
    pub(crate) config: SimConfig,
    pub(crate) registry: MapRegistry,
    /// Classmates, rolled once per run and re-seated every morning.
    pub(crate) roster: Vec<StudentProfile>,
    pub(crate) player: PlayerState,
    pub(crate) ai: NpcAiTable,
    pub(crate) day: DayState,
    pub(crate) friends: Friends,
    pub(crate) inventory: Inventory,
    pub(crate) dialogue: Option<DialogueBox>,
    /// Bumped on every dialogue change; tags collaborator requests.
    pub(crate) dialogue_seq: u64,
    pub(crate) log: DialogueLog,
    pub(crate) broker: DialogueBroker,
    pub(crate) timers: Timers,
    pub(crate) rng: StdRng,
    pub(crate) events: Vec<SimEvent>,
    pub(crate) now_ms: u64,
    pub(crate) ticks: u64,
}

impl SimulationEngine {
    /// Create a simulation that answers every conversation from local
    /// fallback lines.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let seed = config.seed.map(|s| s.wrapping_add(1)).unwrap_or_else(|| rand::thread_rng().gen());
        Self::with_broker(config, DialogueBroker::inline(UnavailableCollaborator, seed))
    }

    /// Create a simulation that routes conversations through `broker`.
    pub fn with_broker(config: SimConfig, broker: DialogueBroker) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let roster = generate_class_roster(&mut rng);
        let registry = build_registry(&config, &roster, &mut rng);
        let start = registry
            .get(MapId::Playground)
            .map(|m| m.spawn_point)
            .unwrap_or_default();

        log::info!(
            "Simulation ready: {} maps, {} classmates",
            registry.len(),
            roster.len()
        );

        Ok(Self {
            timers: Timers::new(0, &config),
            log: DialogueLog::with_capacity(config.dialogue_log_capacity),
            config,
            registry,
            roster,
            player: PlayerState::new(MapId::Playground, start),
            ai: NpcAiTable::new(),
            day: DayState::new(),
            friends: Friends::default(),
            inventory: Inventory::default(),
            dialogue: None,
            dialogue_seq: 0,
            broker,
            rng,
            events: Vec::new(),
            now_ms: 0,
            ticks: 0,
        })
    }

    /// Advance the simulation by one frame at wall-clock time `now_ms`.
    ///
    /// Order within a tick is fixed: dialogue replies, then the player,
    /// then NPCs on the active map, then deadlines and periodic checks.
    /// A map switch during the player step skips the NPC update.
    pub fn tick(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        self.ticks += 1;

        // Replies that arrived since the last frame
        for reply in self.broker.drain() {
            self.apply_reply(reply);
        }

        // T0: Player movement, portals, line-up gap
        let switched = self.update_player();

        // T0: NPCs on the map the player is still on
        if !switched {
            self.update_npcs();
        }

        // T1: Deadlines and interval checks
        self.run_timers();
    }

    /// Tick using `clock` for the current time.
    pub fn tick_with(&mut self, clock: &impl Clock) {
        self.tick(clock.now_ms());
    }

    fn update_npcs(&mut self) {
        let map_id = self.player.map;
        let outcomes = match self.registry.get_mut(map_id) {
            Ok(map) => behavior_system(map, &mut self.ai, &self.config, &mut self.rng),
            Err(err) => {
                log::warn!("Skipping NPC update: {err}");
                return;
            }
        };

        for outcome in outcomes {
            match outcome {
                BehaviorOutcome::Despawned(id) => {
                    self.events.push(SimEvent::NpcDespawned { map: map_id, id });
                }
                BehaviorOutcome::TeacherAtDoor(id) => self.teacher_at_door(&id),
                BehaviorOutcome::TeacherAtPodium(id) => self.teacher_at_podium(&id),
            }
        }
    }

    // --- Dialogue box ---

    /// Show a line and record it in the log. Returns its sequence number.
    pub(crate) fn say(&mut self, speaker: &str, text: &str) -> u64 {
        self.dialogue_seq += 1;
        self.dialogue = Some(DialogueBox {
            speaker: speaker.to_owned(),
            text: text.to_owned(),
            seq: self.dialogue_seq,
        });
        self.log.push(speaker, text, self.now_ms);
        self.dialogue_seq
    }

    pub(crate) fn narrate(&mut self, text: &str) {
        self.say(NARRATOR, text);
    }

    /// Show a placeholder while a collaborator reply is outstanding.
    pub(crate) fn show_placeholder(&mut self, speaker: &str, text: &str) -> u64 {
        self.dialogue_seq += 1;
        self.dialogue = Some(DialogueBox {
            speaker: speaker.to_owned(),
            text: text.to_owned(),
            seq: self.dialogue_seq,
        });
        self.dialogue_seq
    }

    /// Close the dialogue box. Any reply still in flight becomes stale.
    pub(crate) fn clear_dialogue(&mut self) {
        self.dialogue_seq += 1;
        self.dialogue = None;
    }

    // --- Accessors ---

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn day(&self) -> &DayState {
        &self.day
    }

    pub fn friends(&self) -> &Friends {
        &self.friends
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn dialogue(&self) -> Option<&DialogueBox> {
        self.dialogue.as_ref()
    }

    pub fn dialogue_log(&self) -> &DialogueLog {
        &self.log
    }

    pub fn roster(&self) -> &[StudentProfile] {
        &self.roster
    }

    pub fn ai(&self) -> &NpcAiTable {
        &self.ai
    }

    pub fn map(&self, id: MapId) -> Result<&GameMap, WorldError> {
        self.registry.get(id)
    }

    pub fn active_map(&self) -> Result<&GameMap, WorldError> {
        self.registry.get(self.player.map)
    }

    /// Host-side access to the broker, e.g. to pull detached requests.
    pub fn broker_mut(&mut self) -> &mut DialogueBroker {
        &mut self.broker
    }

    /// Time of the most recent tick, milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// World coordinate of the viewport's top-left corner.
    pub fn camera(&self) -> Point {
        match self.active_map() {
            Ok(map) => camera_offset(self.player.pos, map.width, map.height, self.config.viewport),
            Err(_) => Point::ORIGIN,
        }
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
