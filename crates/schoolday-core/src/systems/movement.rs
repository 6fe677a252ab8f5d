//! Player movement - per-tick stepping with wall sliding, portal proximity,
//! and atomic map switches.

use schoolday_logic::constants::{anchors, radii};
use schoolday_logic::geometry::Point;
use schoolday_logic::movement::{resolve_player_step, Facing};

use crate::engine::SimulationEngine;
use crate::events::{SimEvent, Transition};
use crate::maps::{MapId, PortalInfo};

const CROWDED_HALLWAY: &str = "走廊里太挤了，等室友们先出去吧。";

/// Whether a step from `before` to `after` enters `portal`.
///
/// The player must end inside the trigger radius *and* have moved closer,
/// so arriving on a map next to its return portal does not bounce the
/// player straight back.
pub fn enters_portal(before: Point, after: Point, portal: &PortalInfo) -> bool {
    let reach = portal.size + radii::PLAYER;
    let dist = after.distance(&portal.pos);
    dist < reach && dist < before.distance(&portal.pos)
}

impl SimulationEngine {
    /// Set a bare movement target in world coordinates, as a click on
    /// empty floor does.
    pub fn walk_to(&mut self, world: Point) -> Transition {
        if self.player.is_seated() || self.input_locked() {
            return Transition::Ignored;
        }
        self.player.target = Some(world);
        self.clear_dialogue();
        Transition::Applied
    }

    /// Move the player one step toward their target. Returns `true` if the
    /// step carried the player through a portal.
    pub(crate) fn update_player(&mut self) -> bool {
        if self.player.is_seated() || self.day.is_night || self.day.is_wake_up_prompt {
            return false;
        }
        let Some(target) = self.player.target else {
            return false;
        };

        let (step, portals) = match self.registry.get(self.player.map) {
            Ok(map) => (
                resolve_player_step(self.player.pos, target, self.config.player_speed, &map.walls),
                map.portals(),
            ),
            Err(err) => {
                log::warn!("Player on a missing map: {err}");
                return false;
            }
        };

        let before = self.player.pos;
        self.player.pos = step.pos;
        if let Some(facing) = step.facing {
            self.player.facing = facing;
        }
        if step.arrived {
            self.player.target = None;
        }

        if let Some(portal) = portals.iter().find(|p| enters_portal(before, step.pos, p)) {
            return match self.enter_portal(portal) {
                Transition::Applied => true,
                Transition::Ignored => {
                    self.player.pos = before;
                    false
                }
            };
        }

        self.check_line_up_gap();
        false
    }

    /// Use a portal, unless the morning queue is still blocking the dorm
    /// room door.
    pub(crate) fn enter_portal(&mut self, portal: &PortalInfo) -> Transition {
        let leaving_room =
            self.player.map == MapId::DormRoom && portal.link.target_map == MapId::DormHallway;
        if leaving_room && self.day.is_morning_queue {
            self.player.target = None;
            self.narrate(CROWDED_HALLWAY);
            return Transition::Ignored;
        }
        self.travel(portal.link.target_map, portal.link.target_pos)
    }

    /// Atomic map switch: relocate the player and drop everything tied to
    /// the map being left.
    pub(crate) fn travel(&mut self, to: MapId, pos: Point) -> Transition {
        if let Err(err) = self.registry.get(to) {
            log::warn!("Cannot travel: {err}");
            return Transition::Ignored;
        }
        let from = self.player.map;

        // The classroom is not animated while the player is away
        if from == MapId::Classroom && to != MapId::Classroom && self.day.is_teacher_transitioning() {
            self.finish_teacher_transition();
        }

        self.player.map = to;
        self.player.pos = pos;
        self.player.target = None;
        self.player.seated = None;
        self.player.backpack_open = false;
        self.day.clear_lesson_flags();
        self.timers.formation.cancel();
        self.clear_dialogue();

        if to == MapId::Classroom && !self.day.is_teacher_transitioning() && !self.day.is_school_over {
            self.ensure_teacher();
        }

        log::info!("Player moved {from} -> {to}");
        self.events.push(SimEvent::MapChanged { from, to });
        Transition::Applied
    }

    /// Join the line-up once the player reaches the gap in the left column.
    fn check_line_up_gap(&mut self) {
        if self.player.map != MapId::Classroom || !self.day.is_lining_up {
            return;
        }
        let gap = anchors::line_up_gap();
        let pos = self.player.pos;
        if (pos.x - gap.x).abs() >= radii::LINE_UP_GAP || (pos.y - gap.y).abs() >= radii::LINE_UP_GAP {
            return;
        }

        self.day.is_lining_up = false;
        self.player.target = None;
        self.player.facing = Facing::Down;
        let teacher = self.day.current_lesson.teacher().name;
        self.say(teacher, "好，大家排得很好！我们现在去操场。");
        self.timers.formation.arm(self.now_ms, self.config.formation_transfer_ms);
        log::debug!("Player joined the line-up");
    }
}
