//! Classroom roster and dorm roommates.
//!
//! The class roster is rolled once per run and kept by the engine, so the
//! same classmates (names, personas, voices) are re-seated every morning.
//! Roommates are re-rolled every new day.

use rand::Rng;

use schoolday_logic::constants::radii;
use schoolday_logic::geometry::Point;
use schoolday_logic::movement::Facing;
use schoolday_logic::schedule::TeacherProfile;

use super::names::{color_for, random_persona, CLASS_NAMES, DORM_NAMES};
use crate::components::{Behavior, Kind, Persona, Role};
use crate::maps::Prefab;

pub const DESK_COUNT: usize = 20;
pub const DESKS_PER_ROW: usize = 4;

/// Front row, inner left: the only free desk.
pub const PLAYER_DESK: usize = 1;

/// Desk centre. Two columns either side of a centre aisle.
pub fn desk_position(desk: usize) -> Point {
    let row = (desk / DESKS_PER_ROW) as f32;
    let col = desk % DESKS_PER_ROW;
    let x = if col < 2 {
        250.0 + col as f32 * 130.0
    } else {
        600.0 + (col - 2) as f32 * 130.0
    };
    Point::new(x, 220.0 + row * 110.0)
}

pub fn desk_id(desk: usize) -> String {
    format!("desk_{desk}")
}

/// A classmate's fixed identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub desk: usize,
    pub id: String,
    pub name: String,
    pub color: String,
    pub persona: Persona,
}

impl StudentProfile {
    pub fn prefab_at(&self, pos: Point, facing: Facing) -> Prefab {
        Prefab::new(self.id.clone(), Kind::Npc, pos.x, pos.y, 18.0)
            .named(self.name.clone())
            .color(self.color.clone())
            .child()
            .facing(facing)
            .role(Role::Student { desk: self.desk })
            .persona(self.persona.clone())
    }

    /// Seated behind the desk, facing the blackboard.
    pub fn seated_prefab(&self) -> Prefab {
        let pos = desk_position(self.desk).offset(0.0, radii::SEAT_OFFSET_Y);
        self.prefab_at(pos, Facing::Up)
    }
}

/// One classmate for every desk except the player's, in desk order.
pub fn generate_class_roster(rng: &mut impl Rng) -> Vec<StudentProfile> {
    (0..DESK_COUNT)
        .filter(|&desk| desk != PLAYER_DESK)
        .map(|desk| StudentProfile {
            desk,
            id: format!("student_{desk}"),
            name: CLASS_NAMES[desk % CLASS_NAMES.len()].to_owned(),
            color: color_for(desk).to_owned(),
            persona: random_persona(rng),
        })
        .collect()
}

/// The subject teacher for `profile`, standing at `pos`.
pub fn teacher_prefab(profile: &TeacherProfile, pos: Point, facing: Facing) -> Prefab {
    Prefab::new(profile.id, Kind::Npc, pos.x, pos.y, 25.0)
        .named(profile.name)
        .color(profile.color)
        .adult()
        .facing(facing)
        .role(Role::Teacher {
            lesson: profile.lesson,
        })
        .persona(Persona {
            traits: None,
            voice: Some(profile.voice.to_owned()),
        })
}

/// Bed and chair spots for roommates, by slot.
pub const ROOMMATE_SPOTS: [Point; 5] = [
    Point::new(100.0, 150.0), // bed_1
    Point::new(100.0, 350.0), // bed_2
    Point::new(700.0, 350.0), // bed_4
    Point::new(300.0, 300.0), // chair_2
    Point::new(500.0, 300.0), // chair_3
];

/// Fresh roommates, each either asleep or doing homework.
pub fn generate_roommates(rng: &mut impl Rng) -> Vec<Prefab> {
    DORM_NAMES
        .iter()
        .zip(ROOMMATE_SPOTS)
        .enumerate()
        .map(|(slot, (name, spot))| {
            let sleeping = rng.gen_bool(0.5);
            let (behavior, facing) = if sleeping {
                (Behavior::Sleep, Facing::Down)
            } else {
                (Behavior::Study, Facing::Up)
            };
            Prefab::new(format!("roommate_{slot}"), Kind::Npc, spot.x, spot.y, 18.0)
                .named(*name)
                .color(color_for(slot))
                .child()
                .facing(facing)
                .role(Role::Roommate { slot })
                .behavior(behavior)
                .persona(random_persona(rng))
        })
        .collect()
}
