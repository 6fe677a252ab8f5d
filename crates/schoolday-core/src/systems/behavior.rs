//! NPC behavior - per-tick plan execution for every mover on the active map.
//!
//! Transient AI state lives in a side-table keyed by (map, entity id), kept
//! apart from the entity store. Entries are created lazily the first time an
//! NPC is evaluated and dropped whenever the schedule rebuilds a map.

use std::collections::HashMap;

use hecs::Entity;
use rand::Rng;

use schoolday_logic::constants::anchors;
use schoolday_logic::geometry::{overlaps, Point};
use schoolday_logic::movement::{step_toward, Facing};

use crate::components::{Behavior, EntityId, Kind, Movable, Position, Role};
use crate::config::SimConfig;
use crate::maps::{GameMap, MapId};

/// What an NPC is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Free roam inside the map's wander area.
    Wander,
    /// Stand still.
    Hold,
    /// Walk to a line-up slot, then face the front.
    LineUp,
    /// Walk to the school gate and leave for the day.
    Exit,
    /// Outgoing teacher heading for the classroom door.
    TeacherLeaving,
    /// Incoming teacher heading for the podium.
    TeacherArriving,
}

/// Per-NPC transient AI state.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcAiState {
    pub plan: Plan,
    pub target: Option<Point>,
    /// Idle ticks left before the next wander roll.
    pub cooldown: u32,
}

impl NpcAiState {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            target: None,
            cooldown: 0,
        }
    }
}

/// Side-table of [`NpcAiState`], keyed by map and entity id.
#[derive(Debug, Default)]
pub struct NpcAiTable {
    states: HashMap<(MapId, String), NpcAiState>,
}

impl NpcAiTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, map: MapId, id: &str) -> Option<&NpcAiState> {
        self.states.get(&(map, id.to_owned()))
    }

    /// Give an NPC a new plan and movement target.
    pub fn assign(&mut self, map: MapId, id: &str, plan: Plan, target: Option<Point>) {
        self.states.insert(
            (map, id.to_owned()),
            NpcAiState {
                plan,
                target,
                cooldown: 0,
            },
        );
    }

    pub fn remove(&mut self, map: MapId, id: &str) {
        self.states.remove(&(map, id.to_owned()));
    }

    /// Forget every entry for one map.
    pub fn clear_map(&mut self, map: MapId) {
        self.states.retain(|(m, _), _| *m != map);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Something the schedule machine has to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorOutcome {
    /// An exiting NPC reached the gate and was removed.
    Despawned(String),
    TeacherAtDoor(String),
    TeacherAtPodium(String),
}

/// Plan an NPC starts with when it has no entry yet.
fn default_plan(map: &GameMap, kind: Kind, role: Role, behavior: Option<Behavior>) -> Plan {
    match behavior {
        Some(Behavior::Exit) => return Plan::Exit,
        Some(Behavior::Stay) if map.wander_area.is_some() => return Plan::Wander,
        _ => {}
    }
    if map.wander_area.is_some() && (kind.is_animal() || role == Role::Generic) {
        Plan::Wander
    } else {
        Plan::Hold
    }
}

/// Pick a wander target inside the map's area that is clear of walls.
fn sample_wander_target(map: &GameMap, rng: &mut impl Rng) -> Option<Point> {
    const ATTEMPTS: usize = 8;
    let area = map.wander_area?;
    (0..ATTEMPTS)
        .map(|_| area.lerp(rng.gen::<f32>(), rng.gen::<f32>()))
        .find(|p| !overlaps(*p, &map.walls))
}

struct Mover {
    entity: Entity,
    id: String,
    kind: Kind,
    role: Role,
    behavior: Option<Behavior>,
    pos: Point,
    speed: f32,
}

/// Advance every NPC on `map` by one tick.
pub fn behavior_system(
    map: &mut GameMap,
    ai: &mut NpcAiTable,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Vec<BehaviorOutcome> {
    let movers: Vec<Mover> = map
        .entities
        .query::<(&EntityId, &Kind, &Role, &Position, &Movable, Option<&Behavior>)>()
        .iter()
        .map(|(entity, (id, kind, role, pos, movable, behavior))| Mover {
            entity,
            id: id.0.clone(),
            kind: *kind,
            role: *role,
            behavior: behavior.copied(),
            pos: pos.0,
            speed: movable.speed,
        })
        .collect();

    let mut outcomes = Vec::new();
    let mut despawn = Vec::new();

    for mover in movers {
        // Sleeping and studying roommates stay put
        if mover.behavior.is_some_and(Behavior::is_busy) {
            continue;
        }

        let state = ai
            .states
            .entry((map.id, mover.id.clone()))
            .or_insert_with(|| NpcAiState::new(default_plan(map, mover.kind, mover.role, mover.behavior)));

        if state.plan == Plan::Exit && state.target.is_none() {
            state.target = Some(anchors::SCHOOL_GATE);
        }

        let Some(target) = state.target else {
            if state.plan == Plan::Wander {
                if state.cooldown > 0 {
                    state.cooldown -= 1;
                } else {
                    let chance = if mover.kind == Kind::Bird {
                        config.bird_wander_chance
                    } else {
                        config.wander_chance
                    };
                    if rng.gen_bool(chance) {
                        state.target = sample_wander_target(map, rng);
                    }
                }
            }
            continue;
        };

        let speed = match state.plan {
            Plan::LineUp => config.line_up_speed,
            Plan::TeacherLeaving | Plan::TeacherArriving => config.teacher_speed,
            _ => mover.speed,
        };
        let step = step_toward(mover.pos, target, speed);
        let mut facing = step.facing;

        if step.arrived {
            state.target = None;
            match state.plan {
                Plan::Wander => {
                    let [min, max] = config.wander_cooldown_ticks;
                    state.cooldown = rng.gen_range(min..=max);
                }
                Plan::LineUp => {
                    facing = Some(Facing::Down);
                    state.plan = Plan::Hold;
                }
                Plan::Exit => {
                    despawn.push((mover.entity, mover.id.clone()));
                    continue;
                }
                Plan::TeacherLeaving => {
                    state.plan = Plan::Hold;
                    outcomes.push(BehaviorOutcome::TeacherAtDoor(mover.id.clone()));
                }
                Plan::TeacherArriving => {
                    facing = Some(Facing::Down);
                    state.plan = Plan::Hold;
                    outcomes.push(BehaviorOutcome::TeacherAtPodium(mover.id.clone()));
                }
                Plan::Hold => {}
            }
        }

        if let Ok(mut pos) = map.entities.get::<&mut Position>(mover.entity) {
            pos.0 = step.pos;
        }
        if let Some(facing) = facing {
            if let Ok(mut f) = map.entities.get::<&mut Facing>(mover.entity) {
                *f = facing;
            }
        }
    }

    for (entity, id) in despawn {
        if map.entities.despawn(entity).is_ok() {
            log::debug!("{id} left {} through the gate", map.id);
            ai.remove(map.id, &id);
            outcomes.push(BehaviorOutcome::Despawned(id));
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::Prefab;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use schoolday_logic::geometry::Rect;
    use schoolday_logic::schedule::Lesson;

    fn yard(config: &SimConfig) -> GameMap {
        let mut map = GameMap::new(MapId::Playground, "yard", 1400.0, 1200.0, Point::new(700.0, 1100.0));
        map.walls = vec![Rect::new(0.0, 0.0, 1400.0, 50.0)];
        map.wander_area = Some(Rect::new(200.0, 600.0, 1000.0, 400.0));
        map.spawn(Prefab::new("kid", Kind::Npc, 500.0, 700.0, 18.0).child(), config);
        map.spawn(
            Prefab::new("guard", Kind::Npc, 650.0, 1120.0, 25.0).role(Role::Staff),
            config,
        );
        map
    }

    fn always_wander() -> SimConfig {
        SimConfig {
            wander_chance: 1.0,
            bird_wander_chance: 1.0,
            wander_cooldown_ticks: [5, 5],
            ..SimConfig::seeded(1)
        }
    }

    #[test]
    fn generic_npcs_wander_inside_the_area() {
        let config = always_wander();
        let mut map = yard(&config);
        let mut ai = NpcAiTable::new();
        let mut rng = StdRng::seed_from_u64(4);

        behavior_system(&mut map, &mut ai, &config, &mut rng);
        let kid = ai.get(MapId::Playground, "kid").unwrap();
        assert_eq!(kid.plan, Plan::Wander);
        let target = kid.target.expect("picked a target");
        assert!(map.wander_area.unwrap().contains(target));

        // Staff never wander
        let guard = ai.get(MapId::Playground, "guard").unwrap();
        assert_eq!(guard.plan, Plan::Hold);
        assert!(guard.target.is_none());
    }

    #[test]
    fn arrival_starts_a_cooldown() {
        let config = always_wander();
        let mut map = yard(&config);
        let mut ai = NpcAiTable::new();
        let mut rng = StdRng::seed_from_u64(4);
        ai.assign(MapId::Playground, "kid", Plan::Wander, Some(Point::new(501.0, 700.0)));

        behavior_system(&mut map, &mut ai, &config, &mut rng);
        assert_eq!(map.position_of("kid"), Some(Point::new(501.0, 700.0)));
        let kid = ai.get(MapId::Playground, "kid").unwrap();
        assert!(kid.target.is_none());
        assert_eq!(kid.cooldown, 5);

        // Cooldown ticks down before any new roll
        behavior_system(&mut map, &mut ai, &config, &mut rng);
        assert_eq!(ai.get(MapId::Playground, "kid").unwrap().cooldown, 4);
    }

    #[test]
    fn exiting_npcs_despawn_at_the_gate() {
        let config = SimConfig::seeded(1);
        let mut map = yard(&config);
        let mut ai = NpcAiTable::new();
        let mut rng = StdRng::seed_from_u64(4);
        map.place("kid", anchors::SCHOOL_GATE.offset(0.0, -1.0), Facing::Down);
        ai.assign(MapId::Playground, "kid", Plan::Exit, None);

        let outcomes = behavior_system(&mut map, &mut ai, &config, &mut rng);
        assert_eq!(outcomes, vec![BehaviorOutcome::Despawned("kid".into())]);
        assert!(!map.contains_id("kid"));
        assert!(ai.get(MapId::Playground, "kid").is_none());
    }

    #[test]
    fn busy_roommates_do_not_move() {
        let config = always_wander();
        let mut map = yard(&config);
        map.spawn(
            Prefab::new("roommate_0", Kind::Npc, 500.0, 800.0, 18.0)
                .role(Role::Roommate { slot: 0 })
                .behavior(Behavior::Sleep),
            &config,
        );
        let mut ai = NpcAiTable::new();
        let mut rng = StdRng::seed_from_u64(4);
        behavior_system(&mut map, &mut ai, &config, &mut rng);
        assert!(ai.get(MapId::Playground, "roommate_0").is_none());
        assert_eq!(map.position_of("roommate_0"), Some(Point::new(500.0, 800.0)));
    }

    #[test]
    fn line_up_ends_facing_front() {
        let config = SimConfig::seeded(1);
        let mut map = GameMap::new(MapId::Classroom, "room", 1000.0, 800.0, Point::new(80.0, 300.0));
        map.spawn(
            Prefab::new("student_0", Kind::Npc, 460.0, 205.0, 18.0).role(Role::Student { desk: 0 }),
            &config,
        );
        let mut ai = NpcAiTable::new();
        let mut rng = StdRng::seed_from_u64(4);
        ai.assign(MapId::Classroom, "student_0", Plan::LineUp, Some(Point::new(460.0, 200.0)));

        behavior_system(&mut map, &mut ai, &config, &mut rng);
        behavior_system(&mut map, &mut ai, &config, &mut rng);
        behavior_system(&mut map, &mut ai, &config, &mut rng);
        let e = map.find("student_0").unwrap();
        assert_eq!(*map.entities.get::<&Facing>(e).unwrap(), Facing::Down);
        assert_eq!(map.position_of("student_0"), Some(Point::new(460.0, 200.0)));
        assert_eq!(ai.get(MapId::Classroom, "student_0").unwrap().plan, Plan::Hold);
    }

    #[test]
    fn teacher_reports_reaching_the_door() {
        let config = SimConfig::seeded(1);
        let mut map = GameMap::new(MapId::Classroom, "room", 1000.0, 800.0, Point::new(80.0, 300.0));
        map.spawn(
            Prefab::new("teacher_math", Kind::Npc, 52.0, 300.0, 25.0).role(Role::Teacher { lesson: Lesson::Math }),
            &config,
        );
        let mut ai = NpcAiTable::new();
        let mut rng = StdRng::seed_from_u64(4);
        ai.assign(MapId::Classroom, "teacher_math", Plan::TeacherLeaving, Some(anchors::CLASSROOM_DOOR));

        let outcomes = behavior_system(&mut map, &mut ai, &config, &mut rng);
        assert_eq!(outcomes, vec![BehaviorOutcome::TeacherAtDoor("teacher_math".into())]);
    }

    #[test]
    fn clear_map_only_touches_that_map() {
        let mut ai = NpcAiTable::new();
        ai.assign(MapId::Classroom, "student_0", Plan::Hold, None);
        ai.assign(MapId::Playground, "student_0", Plan::Hold, None);
        ai.clear_map(MapId::Classroom);
        assert_eq!(ai.len(), 1);
        assert!(ai.get(MapId::Playground, "student_0").is_some());
    }
}
