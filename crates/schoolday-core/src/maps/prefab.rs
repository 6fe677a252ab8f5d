//! Plain-data entity descriptions turned into component bundles.
//!
//! Capabilities are derived from the kind and role here, once, so systems
//! never need to re-derive them from string ids.

use hecs::EntityBuilder;

use schoolday_logic::constants::radii;
use schoolday_logic::geometry::Point;
use schoolday_logic::movement::Facing;

use crate::components::*;
use crate::config::SimConfig;
use crate::maps::MapId;

/// Template for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    pub id: String,
    pub kind: Kind,
    pub pos: Point,
    pub size: f32,
    pub facing: Facing,
    pub color: String,
    pub name: Option<String>,
    pub age: Option<AgeGroup>,
    pub role: Option<Role>,
    pub behavior: Option<Behavior>,
    pub persona: Option<Persona>,
    pub portal: Option<PortalLink>,
    pub seat: Option<Seat>,
    pub facade: Option<Facade>,
    /// Overrides the per-kind default speed.
    pub speed: Option<f32>,
}

impl Prefab {
    pub fn new(id: impl Into<String>, kind: Kind, x: f32, y: f32, size: f32) -> Self {
        Self {
            id: id.into(),
            kind,
            pos: Point::new(x, y),
            size,
            facing: Facing::Down,
            color: String::from("transparent"),
            name: None,
            age: None,
            role: None,
            behavior: None,
            persona: None,
            portal: None,
            seat: None,
            facade: None,
            speed: None,
        }
    }

    pub fn at(mut self, pos: Point) -> Self {
        self.pos = pos;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn adult(mut self) -> Self {
        self.age = Some(AgeGroup::Adult);
        self
    }

    pub fn child(mut self) -> Self {
        self.age = Some(AgeGroup::Child);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    pub fn portal(mut self, target_map: MapId, x: f32, y: f32) -> Self {
        self.portal = Some(PortalLink {
            target_map,
            target_pos: Point::new(x, y),
        });
        self
    }

    pub fn seat(mut self, occupied: bool) -> Self {
        self.seat = Some(Seat { occupied });
        self
    }

    pub fn facade(mut self, door: &str, half_width: f32, half_height: f32, offset_y: f32) -> Self {
        self.facade = Some(Facade {
            door: door.to_owned(),
            half_width,
            half_height,
            offset_y,
        });
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    fn is_clickable(&self) -> bool {
        self.kind.is_social()
            || matches!(
                self.kind,
                Kind::Portal
                    | Kind::Desk
                    | Kind::Chair
                    | Kind::Bed
                    | Kind::Table
                    | Kind::Backpack
                    | Kind::Shelf
                    | Kind::Fridge
            )
    }

    /// Assemble the component bundle.
    pub fn into_builder(self, config: &SimConfig) -> EntityBuilder {
        let mut builder = EntityBuilder::new();

        let hit_radius = if self.kind == Kind::Bed {
            radii::BED_HIT
        } else {
            radii::DEFAULT_HIT
        };
        let clickable = self.is_clickable();

        builder
            .add(EntityId(self.id))
            .add(self.kind)
            .add(Position(self.pos))
            .add(Size(self.size))
            .add(self.facing)
            .add(Tint(self.color));

        if let Some(name) = self.name {
            builder.add(Name(name));
        }
        if let Some(age) = self.age {
            builder.add(age);
        }
        if let Some(behavior) = self.behavior {
            builder.add(behavior);
        }
        if let Some(persona) = self.persona {
            builder.add(persona);
        }
        if let Some(link) = self.portal {
            builder.add(link);
        }
        if let Some(seat) = self.seat {
            builder.add(seat);
        }
        if let Some(facade) = self.facade {
            builder.add(facade);
        }

        // Every character carries a role so systems can query on it
        if self.kind.is_social() {
            let role = self.role.unwrap_or(Role::Generic);
            if role.is_student() {
                builder.add(FormationMember);
            }
            let speed = self.speed.unwrap_or(match self.kind {
                Kind::Dog | Kind::Cat => config.animal_speed,
                _ if role.is_teacher() => config.teacher_speed,
                _ => config.npc_speed,
            });
            builder.add(role).add(Social).add(Movable { speed });
        } else if let Some(role) = self.role {
            builder.add(role);
        }

        if clickable {
            builder.add(Interactable { hit_radius });
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn npc_gets_social_capabilities() {
        let config = SimConfig::default();
        let mut world = World::new();
        let e = world.spawn(
            Prefab::new("c1", Kind::Npc, 0.0, 0.0, 18.0)
                .named("同学")
                .child()
                .into_builder(&config)
                .build(),
        );
        assert!(world.get::<&Social>(e).is_ok());
        assert_eq!(world.get::<&Role>(e).map(|r| *r).ok(), Some(Role::Generic));
        assert_eq!(world.get::<&Movable>(e).unwrap().speed, config.npc_speed);
        assert_eq!(world.get::<&Interactable>(e).unwrap().hit_radius, 40.0);
        assert!(world.get::<&FormationMember>(e).is_err());
    }

    #[test]
    fn student_is_formation_member() {
        let config = SimConfig::default();
        let mut world = World::new();
        let e = world.spawn(
            Prefab::new("student_0", Kind::Npc, 0.0, 0.0, 18.0)
                .role(Role::Student { desk: 0 })
                .into_builder(&config)
                .build(),
        );
        assert!(world.get::<&FormationMember>(e).is_ok());
    }

    #[test]
    fn animals_and_teachers_use_their_speed() {
        let config = SimConfig::default();
        let mut world = World::new();
        let dog = world.spawn(
            Prefab::new("dog_1", Kind::Dog, 0.0, 0.0, 20.0)
                .into_builder(&config)
                .build(),
        );
        let teacher = world.spawn(
            Prefab::new("teacher_math", Kind::Npc, 0.0, 0.0, 25.0)
                .role(Role::Teacher {
                    lesson: schoolday_logic::schedule::Lesson::Math,
                })
                .into_builder(&config)
                .build(),
        );
        assert_eq!(world.get::<&Movable>(dog).unwrap().speed, config.animal_speed);
        assert_eq!(world.get::<&Movable>(teacher).unwrap().speed, config.teacher_speed);
    }

    #[test]
    fn beds_have_wider_hit_radius_and_walls_are_inert() {
        let config = SimConfig::default();
        let mut world = World::new();
        let bed = world.spawn(
            Prefab::new("bed_my", Kind::Bed, 0.0, 0.0, 80.0)
                .into_builder(&config)
                .build(),
        );
        let window = world.spawn(
            Prefab::new("win1", Kind::Window, 0.0, 0.0, 60.0)
                .into_builder(&config)
                .build(),
        );
        assert_eq!(world.get::<&Interactable>(bed).unwrap().hit_radius, 60.0);
        assert!(world.get::<&Interactable>(window).is_err());
        assert!(world.get::<&Movable>(window).is_err());
    }
}
