//! Map registry: static location data plus one entity store per map.
//!
//! Each [`GameMap`] owns a `hecs::World` holding every non-player entity on
//! that map. Entities are mutated in place across ticks; the player is a
//! singleton owned by the engine and never stored here.

mod prefab;
pub mod templates;

pub use prefab::Prefab;

use std::collections::HashMap;

use hecs::World;
use serde::{Deserialize, Serialize};

use schoolday_logic::geometry::{Point, Rect, Wall};

use crate::components::*;
use crate::config::SimConfig;
use crate::error::WorldError;

/// Identifier of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapId {
    Playground,
    Classroom,
    DormHallway,
    DormRoom,
    Store,
}

impl MapId {
    pub const ALL: [MapId; 5] = [
        MapId::Playground,
        MapId::Classroom,
        MapId::DormHallway,
        MapId::DormRoom,
        MapId::Store,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MapId::Playground => "playground",
            MapId::Classroom => "classroom",
            MapId::DormHallway => "dorm_hallway",
            MapId::DormRoom => "dorm_room",
            MapId::Store => "store",
        }
    }

    /// Dorm maps, where the curfew watchdog leaves the player alone.
    pub fn is_curfew_safe(self) -> bool {
        matches!(self, MapId::DormRoom | MapId::DormHallway)
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A portal as seen by the player-step proximity check.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalInfo {
    pub id: String,
    pub pos: Point,
    pub size: f32,
    pub link: PortalLink,
}

/// One location and its entity store.
pub struct GameMap {
    pub id: MapId,
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub spawn_point: Point,
    pub walls: Vec<Wall>,
    /// Where free-roaming NPCs may pick wander targets. `None` disables
    /// wandering on this map.
    pub wander_area: Option<Rect>,
    pub entities: World,
}

impl GameMap {
    pub fn new(id: MapId, name: &str, width: f32, height: f32, spawn_point: Point) -> Self {
        Self {
            id,
            name: name.to_owned(),
            width,
            height,
            background: String::new(),
            spawn_point,
            walls: Vec::new(),
            wander_area: None,
            entities: World::new(),
        }
    }

    pub fn spawn(&mut self, prefab: Prefab, config: &SimConfig) -> hecs::Entity {
        let mut builder = prefab.into_builder(config);
        self.entities.spawn(builder.build())
    }

    /// Look up an entity handle by its stable id.
    pub fn find(&self, id: &str) -> Option<hecs::Entity> {
        self.entities
            .query::<&EntityId>()
            .iter()
            .find(|(_, eid)| eid.as_str() == id)
            .map(|(entity, _)| entity)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn position_of(&self, id: &str) -> Option<Point> {
        let entity = self.find(id)?;
        self.entities.get::<&Position>(entity).ok().map(|p| p.0)
    }

    /// Remove an entity by id.
    pub fn despawn_id(&mut self, id: &str) -> Result<(), WorldError> {
        let entity = self.find(id).ok_or_else(|| WorldError::UnknownEntity {
            map: self.id,
            id: id.to_owned(),
        })?;
        self.entities
            .despawn(entity)
            .map_err(|_| WorldError::UnknownEntity {
                map: self.id,
                id: id.to_owned(),
            })
    }

    /// Remove every entity whose role matches; returns the removed ids.
    pub fn despawn_where(&mut self, pred: impl Fn(&Role, &EntityId) -> bool) -> Vec<String> {
        let doomed: Vec<(hecs::Entity, String)> = self
            .entities
            .query::<(&EntityId, &Role)>()
            .iter()
            .filter(|(_, (eid, role))| pred(role, eid))
            .map(|(entity, (eid, _))| (entity, eid.0.clone()))
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for (entity, id) in doomed {
            if self.entities.despawn(entity).is_ok() {
                removed.push(id);
            }
        }
        removed
    }

    /// Number of entities with a matching role.
    pub fn count_role(&self, pred: impl Fn(&Role) -> bool) -> usize {
        self.entities
            .query::<&Role>()
            .iter()
            .filter(|(_, role)| pred(role))
            .count()
    }

    /// Ids of teacher entities on this map.
    pub fn teacher_ids(&self) -> Vec<String> {
        self.entities
            .query::<(&EntityId, &Role)>()
            .iter()
            .filter(|(_, (_, role))| role.is_teacher())
            .map(|(_, (eid, _))| eid.0.clone())
            .collect()
    }

    pub fn portals(&self) -> Vec<PortalInfo> {
        self.entities
            .query::<(&EntityId, &Position, &Size, &PortalLink)>()
            .iter()
            .map(|(_, (eid, pos, size, link))| PortalInfo {
                id: eid.0.clone(),
                pos: pos.0,
                size: size.0,
                link: *link,
            })
            .collect()
    }

    pub fn portal(&self, id: &str) -> Option<PortalInfo> {
        self.portals().into_iter().find(|p| p.id == id)
    }

    /// Set position and facing of an entity, if present.
    pub fn place(&mut self, id: &str, pos: Point, facing: schoolday_logic::movement::Facing) {
        let Some(entity) = self.find(id) else {
            return;
        };
        if let Ok(mut p) = self.entities.get::<&mut Position>(entity) {
            p.0 = pos;
        }
        if let Ok(mut f) = self.entities.get::<&mut schoolday_logic::movement::Facing>(entity) {
            *f = facing;
        }
    }
}

/// Owns every map, keyed by id.
pub struct MapRegistry {
    maps: HashMap<MapId, GameMap>,
}

impl MapRegistry {
    pub fn from_maps(maps: impl IntoIterator<Item = GameMap>) -> Self {
        Self {
            maps: maps.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn get(&self, id: MapId) -> Result<&GameMap, WorldError> {
        self.maps.get(&id).ok_or(WorldError::UnknownMap(id))
    }

    pub fn get_mut(&mut self, id: MapId) -> Result<&mut GameMap, WorldError> {
        self.maps.get_mut(&id).ok_or(WorldError::UnknownMap(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = MapId> + '_ {
        self.maps.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolday_logic::movement::Facing;

    fn tiny_map() -> GameMap {
        let config = SimConfig::default();
        let mut map = GameMap::new(MapId::Store, "test", 200.0, 200.0, Point::new(100.0, 100.0));
        map.spawn(
            Prefab::new("npc_a", Kind::Npc, 50.0, 50.0, 18.0).role(Role::Generic),
            &config,
        );
        map.spawn(
            Prefab::new("teacher_math", Kind::Npc, 60.0, 60.0, 25.0).role(Role::Teacher {
                lesson: schoolday_logic::schedule::Lesson::Math,
            }),
            &config,
        );
        map.spawn(
            Prefab::new("door", Kind::Portal, 10.0, 100.0, 40.0).portal(MapId::Playground, 5.0, 5.0),
            &config,
        );
        map
    }

    #[test]
    fn find_and_position() {
        let map = tiny_map();
        assert!(map.contains_id("npc_a"));
        assert_eq!(map.position_of("npc_a"), Some(Point::new(50.0, 50.0)));
        assert!(map.find("ghost").is_none());
    }

    #[test]
    fn despawn_unknown_is_an_error() {
        let mut map = tiny_map();
        let err = map.despawn_id("ghost").unwrap_err();
        assert_eq!(
            err,
            WorldError::UnknownEntity {
                map: MapId::Store,
                id: "ghost".into()
            }
        );
        map.despawn_id("npc_a").expect("present");
        assert!(!map.contains_id("npc_a"));
    }

    #[test]
    fn despawn_where_filters_by_role() {
        let mut map = tiny_map();
        let removed = map.despawn_where(|role, _| role.is_teacher());
        assert_eq!(removed, vec!["teacher_math".to_owned()]);
        assert!(map.teacher_ids().is_empty());
        assert_eq!(map.count_role(|_| true), 1);
    }

    #[test]
    fn portals_are_listed() {
        let map = tiny_map();
        let portals = map.portals();
        assert_eq!(portals.len(), 1);
        assert_eq!(portals[0].link.target_map, MapId::Playground);
    }

    #[test]
    fn place_moves_and_turns() {
        let mut map = tiny_map();
        map.place("npc_a", Point::new(1.0, 2.0), Facing::Left);
        let e = map.find("npc_a").unwrap();
        assert_eq!(map.entities.get::<&Position>(e).unwrap().0, Point::new(1.0, 2.0));
        assert_eq!(*map.entities.get::<&Facing>(e).unwrap(), Facing::Left);
    }

    #[test]
    fn registry_reports_unknown_map() {
        let registry = MapRegistry::from_maps([tiny_map()]);
        assert!(registry.get(MapId::Store).is_ok());
        assert_eq!(
            registry.get(MapId::Classroom).err(),
            Some(WorldError::UnknownMap(MapId::Classroom))
        );
    }
}
