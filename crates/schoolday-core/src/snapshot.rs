//! Read-only view of the simulation for the render boundary.
//!
//! Drawables are sorted by `y` with the player composited in, which is the
//! order a top-down renderer paints them.

use serde::Serialize;

use schoolday_logic::geometry::Point;
use schoolday_logic::movement::Facing;
use schoolday_logic::schedule::{HomeworkStatus, Lesson};

use crate::components::*;
use crate::engine::SimulationEngine;
use crate::maps::MapId;
use crate::state::{DialogueBox, Friend, SeatedAt, TeacherPhase};

pub const PLAYER_ID: &str = "player";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawable {
    pub id: String,
    pub kind: String,
    pub pos: Point,
    pub size: f32,
    pub facing: Facing,
    pub name: Option<String>,
    pub color: Option<String>,
    pub behavior: Option<Behavior>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub id: MapId,
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub background: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub pos: Point,
    pub facing: Facing,
    pub target: Option<Point>,
    pub seated: Option<SeatedAt>,
    pub backpack_open: bool,
    pub selected_book: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub day: u32,
    pub current_lesson: Lesson,
    pub is_class_started: bool,
    pub teacher_transition: Option<TeacherPhase>,
    pub is_lining_up: bool,
    pub is_in_formation: bool,
    pub is_school_over: bool,
    pub curfew_due_at: Option<u64>,
    pub homework: HomeworkStatus,
    pub is_night: bool,
    pub is_morning_queue: bool,
    pub is_wake_up_prompt: bool,
}

/// Everything a frame needs to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub now_ms: u64,
    pub map: MapView,
    pub camera: Point,
    pub player: PlayerView,
    pub drawables: Vec<Drawable>,
    pub day: DayView,
    pub dialogue: Option<DialogueBox>,
    pub friends: Vec<Friend>,
    pub inventory: Vec<String>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl SimulationEngine {
    /// Capture the active map and all state flags.
    pub fn snapshot(&self) -> WorldSnapshot {
        let player = &self.player;
        let (map, mut drawables) = match self.active_map() {
            Ok(map) => {
                let drawables: Vec<Drawable> = map
                    .entities
                    .query::<(&EntityId, &Kind, &Position, &Size, &Facing, Option<&Name>, Option<&Tint>, Option<&Behavior>)>()
                    .iter()
                    .map(|(_, (id, kind, pos, size, facing, name, tint, behavior))| Drawable {
                        id: id.0.clone(),
                        kind: kind.as_str().to_owned(),
                        pos: pos.0,
                        size: size.0,
                        facing: *facing,
                        name: name.map(|n| n.0.clone()),
                        color: tint.map(|t| t.0.clone()),
                        behavior: behavior.copied(),
                    })
                    .collect();
                let view = MapView {
                    id: map.id,
                    name: map.name.clone(),
                    width: map.width,
                    height: map.height,
                    background: map.background.clone(),
                };
                (view, drawables)
            }
            Err(_) => (
                MapView {
                    id: player.map,
                    name: String::new(),
                    width: 0.0,
                    height: 0.0,
                    background: String::new(),
                },
                Vec::new(),
            ),
        };

        drawables.push(Drawable {
            id: PLAYER_ID.to_owned(),
            kind: "PLAYER".to_owned(),
            pos: player.pos,
            size: schoolday_logic::constants::radii::PLAYER,
            facing: player.facing,
            name: None,
            color: None,
            behavior: None,
        });
        drawables.sort_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

        let day = &self.day;
        WorldSnapshot {
            tick: self.ticks,
            now_ms: self.now_ms,
            map,
            camera: self.camera(),
            player: PlayerView {
                pos: player.pos,
                facing: player.facing,
                target: player.target,
                seated: player.seated.clone(),
                backpack_open: player.backpack_open,
                selected_book: player.selected_book.map(Lesson::book_name),
            },
            drawables,
            day: DayView {
                day: day.day,
                current_lesson: day.current_lesson,
                is_class_started: day.is_class_started,
                teacher_transition: day.teacher_transition,
                is_lining_up: day.is_lining_up,
                is_in_formation: day.is_in_formation,
                is_school_over: day.is_school_over,
                curfew_due_at: day.curfew.due_at(),
                homework: day.homework,
                is_night: day.is_night,
                is_morning_queue: day.is_morning_queue,
                is_wake_up_prompt: day.is_wake_up_prompt,
            },
            dialogue: self.dialogue.clone(),
            friends: self.friends.iter().cloned().collect(),
            inventory: self.inventory.items().to_vec(),
        }
    }
}
