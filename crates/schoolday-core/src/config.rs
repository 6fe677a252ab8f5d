//! Engine configuration.
//!
//! Every tunable has a default matching the shipped game, so an empty JSON
//! object (or no config at all) gives the standard day. Overrides are
//! partial: unspecified fields keep their defaults.

use serde::{Deserialize, Serialize};

use schoolday_logic::camera::Viewport;
use schoolday_logic::constants::{speeds, timing};

use crate::error::ConfigError;

/// Tunables for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // Speeds, units per tick
    pub player_speed: f32,
    pub npc_speed: f32,
    pub animal_speed: f32,
    pub teacher_speed: f32,
    pub line_up_speed: f32,

    // Timings, milliseconds
    pub curfew_timeout_ms: u64,
    pub curfew_check_interval_ms: u64,
    pub homework_ms: u64,
    pub sleep_ms: u64,
    pub formation_transfer_ms: u64,
    pub morning_queue_interval_ms: u64,

    /// Per-tick chance a bird picks a new wander target.
    pub bird_wander_chance: f64,
    /// Per-tick chance any other free-roaming NPC picks a wander target.
    pub wander_chance: f64,
    /// Idle ticks after arriving before the next wander roll, `[min, max]`.
    pub wander_cooldown_ticks: [u32; 2],

    /// Oldest entries are dropped past this many lines.
    pub dialogue_log_capacity: usize,

    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,

    pub viewport: Viewport,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            player_speed: speeds::PLAYER,
            npc_speed: speeds::NPC,
            animal_speed: speeds::ANIMAL,
            teacher_speed: speeds::TEACHER,
            line_up_speed: speeds::LINE_UP,
            curfew_timeout_ms: timing::CURFEW_TIMEOUT_MS,
            curfew_check_interval_ms: timing::CURFEW_CHECK_INTERVAL_MS,
            homework_ms: timing::HOMEWORK_MS,
            sleep_ms: timing::SLEEP_MS,
            formation_transfer_ms: timing::FORMATION_TRANSFER_MS,
            morning_queue_interval_ms: timing::MORNING_QUEUE_INTERVAL_MS,
            bird_wander_chance: 0.05,
            wander_chance: 0.01,
            wander_cooldown_ticks: [30, 120],
            dialogue_log_capacity: 50,
            seed: None,
            viewport: Viewport::default(),
        }
    }
}

impl SimConfig {
    /// Parse a (partial) JSON override and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Deterministic config for tests and headless runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let speeds = [
            ("player_speed", self.player_speed),
            ("npc_speed", self.npc_speed),
            ("animal_speed", self.animal_speed),
            ("teacher_speed", self.teacher_speed),
            ("line_up_speed", self.line_up_speed),
        ];
        for (field, value) in speeds {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }
        if self.player_speed <= self.npc_speed {
            return Err(invalid(
                "player_speed",
                format!(
                    "must exceed npc_speed ({} <= {})",
                    self.player_speed, self.npc_speed
                ),
            ));
        }

        let durations = [
            ("curfew_timeout_ms", self.curfew_timeout_ms),
            ("curfew_check_interval_ms", self.curfew_check_interval_ms),
            ("homework_ms", self.homework_ms),
            ("sleep_ms", self.sleep_ms),
            ("formation_transfer_ms", self.formation_transfer_ms),
            ("morning_queue_interval_ms", self.morning_queue_interval_ms),
        ];
        for (field, value) in durations {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero".to_owned()));
            }
        }

        for (field, p) in [
            ("bird_wander_chance", self.bird_wander_chance),
            ("wander_chance", self.wander_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(field, format!("must be within [0, 1], got {p}")));
            }
        }

        let [lo, hi] = self.wander_cooldown_ticks;
        if lo > hi {
            return Err(invalid(
                "wander_cooldown_ticks",
                format!("min {lo} exceeds max {hi}"),
            ));
        }

        if self.dialogue_log_capacity == 0 {
            return Err(invalid(
                "dialogue_log_capacity",
                "must hold at least one line".to_owned(),
            ));
        }

        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(invalid("viewport", "width and height must be positive".to_owned()));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
