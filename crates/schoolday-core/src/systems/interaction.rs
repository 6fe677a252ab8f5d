//! Interaction dispatcher - pointer clicks, hit testing, and what happens
//! when the player uses an entity.
//!
//! Dispatch is by capability and kind: portals travel, social entities
//! talk (through the dialogue broker), seats seat, beds sleep, store
//! fixtures grant items. Blocked actions answer with a scripted line and
//! come back as [`Transition::Ignored`].

use std::cmp::Ordering;

use hecs::{Entity, World};
use rand::Rng;

use schoolday_logic::camera::screen_to_world;
use schoolday_logic::constants::radii;
use schoolday_logic::geometry::Point;
use schoolday_logic::movement::Facing;
use schoolday_logic::schedule::{HomeworkStatus, Lesson};

use crate::components::*;
use crate::engine::SimulationEngine;
use crate::events::{SimEvent, Transition};
use crate::maps::templates::STORE_COUNTER;
use crate::maps::{GameMap, MapId, PortalInfo};
use crate::state::{Friend, SeatedAt};
use crate::systems::{DialogueReply, DialogueRequest, DEFAULT_VOICE, PLACEHOLDER};

static SNACKS: &[&str] = &["薯片", "辣条", "棒棒糖"];
static DRINKS: &[&str] = &["可乐", "酸奶", "橙汁"];
const WATER: &str = "矿泉水";

/// What the backpack offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookChoice {
    /// The book (or jump rope) for a lesson.
    Book(Lesson),
    Homework,
}

/// Result of a pointer hit test.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    /// Where the player walks to.
    pub approach: Point,
}

/// Find what a click at `world` lands on.
///
/// The nearest interactable within its hit radius wins, with characters
/// preferred on a tie. Otherwise a click on a building facade resolves to
/// that building's door.
pub fn hit_test(map: &GameMap, world: Point) -> Option<Hit> {
    let nearest = map
        .entities
        .query::<(&EntityId, &Kind, &Position, &Interactable, Option<&Social>)>()
        .iter()
        .filter_map(|(_, (id, kind, pos, hit, social))| {
            let dist = world.distance(&pos.0);
            (dist < hit.hit_radius).then(|| (dist, social.is_some(), id.0.clone(), *kind, pos.0))
        })
        .min_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.1.cmp(&a.1))
        });

    if let Some((_, _, id, kind, pos)) = nearest {
        let offset = if kind.is_seat() { 0.0 } else { radii::APPROACH_OFFSET_Y };
        return Some(Hit {
            id,
            approach: pos.offset(0.0, offset),
        });
    }

    let door = map
        .entities
        .query::<(&Position, &Facade)>()
        .iter()
        .find(|(_, (pos, facade))| {
            (world.x - pos.0.x).abs() < facade.half_width
                && (world.y - (pos.0.y + facade.offset_y)).abs() < facade.half_height
        })
        .map(|(_, (_, facade))| facade.door.clone())?;

    let pos = map.position_of(&door)?;
    Some(Hit {
        id: door,
        approach: pos.offset(0.0, radii::APPROACH_OFFSET_Y),
    })
}

/// Components the dispatcher needs, copied out of the store.
struct Target {
    id: String,
    kind: Kind,
    pos: Point,
    name: Option<String>,
    color: String,
    age: Option<AgeGroup>,
    role: Option<Role>,
    behavior: Option<Behavior>,
    persona: Persona,
    portal: Option<PortalLink>,
    seat: Option<Seat>,
    size: f32,
    door: Option<String>,
}

impl Target {
    fn read(world: &World, entity: Entity) -> Option<Self> {
        let id = world.get::<&EntityId>(entity).ok()?.0.clone();
        let kind = *world.get::<&Kind>(entity).ok()?;
        let pos = world.get::<&Position>(entity).ok()?.0;
        Some(Self {
            id,
            kind,
            pos,
            name: world.get::<&Name>(entity).ok().map(|n| n.0.clone()),
            color: world.get::<&Tint>(entity).map(|t| t.0.clone()).unwrap_or_default(),
            age: world.get::<&AgeGroup>(entity).ok().map(|a| *a),
            role: world.get::<&Role>(entity).ok().map(|r| *r),
            behavior: world.get::<&Behavior>(entity).ok().map(|b| *b),
            persona: world.get::<&Persona>(entity).map(|p| (*p).clone()).unwrap_or_default(),
            portal: world.get::<&PortalLink>(entity).ok().map(|l| *l),
            seat: world.get::<&Seat>(entity).ok().map(|s| *s),
            size: world.get::<&Size>(entity).map(|s| s.0).unwrap_or_default(),
            door: world.get::<&Facade>(entity).ok().map(|f| f.door.clone()),
        })
    }
}

impl SimulationEngine {
    /// Handle a click on the render surface.
    pub fn pointer_click(&mut self, screen: Point) -> Transition {
        if self.input_locked() {
            return Transition::Ignored;
        }

        // A click while seated only ever stands the player up
        if self.player.is_seated() {
            return self.stand_up();
        }

        let world = screen_to_world(screen, self.camera());
        let hit = match self.active_map() {
            Ok(map) => hit_test(map, world),
            Err(_) => return Transition::Ignored,
        };

        match hit {
            Some(hit) => {
                self.player.target = Some(hit.approach);
                self.interact_with(&hit.id);
            }
            None => return self.walk_to(world),
        }
        Transition::Applied
    }

    /// Use the entity `id` on the active map. Ignored while asleep,
    /// behind the wake-up prompt, or with the backpack open.
    pub fn interact_with(&mut self, id: &str) -> Transition {
        if self.input_locked() {
            return Transition::Ignored;
        }
        let target = match self.active_map() {
            Ok(map) => map.find(id).and_then(|e| Target::read(&map.entities, e)),
            Err(_) => None,
        };
        let Some(target) = target else {
            return Transition::Ignored;
        };

        match target.kind {
            Kind::Portal => match target.portal {
                Some(link) => self.enter_portal(&PortalInfo {
                    id: target.id,
                    pos: target.pos,
                    size: target.size,
                    link,
                }),
                None => Transition::Ignored,
            },
            kind if kind.is_social() => self.talk_to(target),
            Kind::Desk | Kind::Chair => self.sit_at(target),
            Kind::Backpack => {
                self.player.target = None;
                self.toggle_backpack()
            }
            Kind::Bed => self.sit_on_bed(&target.id),
            Kind::Shelf => self.grant_item("你从货架上拿了一包", SNACKS),
            Kind::Fridge => self.grant_item("你从冰柜里拿了一瓶", DRINKS),
            Kind::Table if target.id == STORE_COUNTER => self.buy_water(),
            _ => match target.door {
                Some(door) => self.interact_with(&door),
                None => Transition::Ignored,
            },
        }
    }

    fn talk_to(&mut self, target: Target) -> Transition {
        match target.behavior {
            Some(Behavior::Sleep) => {
                self.narrate("她正在睡觉，不要打扰她。");
                return Transition::Applied;
            }
            Some(Behavior::Study) => {
                let name = target.name.as_deref().unwrap_or("室友");
                self.say(name, "我在写作业呢，今天的作业好难啊。");
                return Transition::Applied;
            }
            _ => {}
        }

        self.player.facing = Facing::toward(self.player.pos, target.pos, self.player.facing);
        let speaker = target.name.clone().unwrap_or_else(|| "Unknown".to_owned());
        let seq = self.show_placeholder(&speaker, PLACEHOLDER);

        if let (Some(AgeGroup::Child), Some(name)) = (target.age, &target.name) {
            let added = self.friends.add(Friend {
                id: target.id.clone(),
                name: name.clone(),
                color: target.color.clone(),
            });
            if added {
                log::info!("New friend: {name}");
                self.events.push(SimEvent::FriendAdded { name: name.clone() });
            }
        }

        let lecture = match target.role {
            Some(Role::Teacher { lesson })
                if lesson == self.day.current_lesson && self.day.is_class_started =>
            {
                Some(lesson)
            }
            _ => None,
        };
        let location = self
            .active_map()
            .map(|m| m.name.clone())
            .unwrap_or_default();

        let request = DialogueRequest {
            seq,
            npc_id: target.id.clone(),
            npc_name: speaker,
            location,
            kind: target.kind,
            persona: target.persona.traits,
            voice: target.persona.voice.unwrap_or_else(|| DEFAULT_VOICE.to_owned()),
            lecture,
        };
        self.broker.submit(request);
        self.events.push(SimEvent::DialogueRequested {
            seq,
            npc_id: target.id,
        });
        Transition::Applied
    }

    /// Apply a collaborator reply if it still belongs to the open dialogue.
    pub(crate) fn apply_reply(&mut self, reply: DialogueReply) {
        let current = self.dialogue.as_ref().map(|d| d.seq);
        if current != Some(reply.seq) {
            log::debug!(
                "Dropping stale reply from {} (seq {}, current {:?})",
                reply.npc_id,
                reply.seq,
                current
            );
            return;
        }

        if let Some(dialogue) = self.dialogue.as_mut() {
            dialogue.speaker = reply.speaker.clone();
            dialogue.text = reply.text.clone();
        }
        self.log.push(&reply.speaker, &reply.text, self.now_ms);
        self.player.target = None;
        if let Some(bytes) = reply.audio {
            self.events.push(SimEvent::PlayAudio {
                npc_id: reply.npc_id,
                bytes,
            });
        }
    }

    fn sit_at(&mut self, target: Target) -> Transition {
        self.player.target = None;
        if target.seat.is_some_and(|s| s.occupied) {
            self.narrate("这个座位已经有同学坐了。");
            return Transition::Ignored;
        }
        self.player.pos = target.pos.offset(0.0, radii::SEAT_OFFSET_Y);
        self.player.facing = Facing::Up;
        self.player.seated = Some(match target.kind {
            Kind::Desk => SeatedAt::Desk(target.id),
            _ => SeatedAt::Chair(target.id),
        });
        self.clear_dialogue();
        Transition::Applied
    }

    /// Stand up from a seat. Not allowed during a lesson or homework.
    pub fn stand_up(&mut self) -> Transition {
        if !self.player.is_seated()
            || self.day.is_class_started
            || self.day.homework == HomeworkStatus::Doing
            || self.day.is_night
        {
            return Transition::Ignored;
        }
        self.player.seated = None;
        self.clear_dialogue();
        Transition::Applied
    }

    pub fn toggle_backpack(&mut self) -> Transition {
        self.player.backpack_open = !self.player.backpack_open;
        Transition::Applied
    }

    /// Take something out of the backpack.
    ///
    /// Picking a book only records the choice; it never changes the
    /// current lesson.
    pub fn select_book(&mut self, choice: BookChoice) -> Transition {
        match choice {
            BookChoice::Homework => self.start_homework(),
            BookChoice::Book(lesson) => {
                self.player.selected_book = Some(lesson);
                self.player.backpack_open = false;
                self.clear_dialogue();
                Transition::Applied
            }
        }
    }

    fn grant_item(&mut self, prefix: &str, pool: &[&str]) -> Transition {
        self.player.target = None;
        let item = pool[self.rng.gen_range(0..pool.len())];
        self.inventory.add(item);
        self.narrate(&format!("{prefix}{item}。"));
        self.events.push(SimEvent::ItemGranted { item: item.to_owned() });
        Transition::Applied
    }

    fn buy_water(&mut self) -> Transition {
        self.player.target = None;
        self.inventory.add(WATER);
        self.say("收银员", "你好，买瓶水吗？一共三元。 (你支付了三元现金)");
        self.events.push(SimEvent::ItemGranted { item: WATER.to_owned() });
        Transition::Applied
    }

    /// Whether `id` is the player's desk or chair right now.
    pub fn is_seated_at(&self, id: &str) -> bool {
        matches!(&self.player.seated, Some(SeatedAt::Desk(s) | SeatedAt::Chair(s)) if s == id)
    }

    /// Map the player is on.
    pub fn current_map(&self) -> MapId {
        self.player.map
    }

    /// Player commands are refused at night, behind the wake-up prompt,
    /// and while the backpack overlay is open.
    pub fn input_locked(&self) -> bool {
        self.day.is_night || self.day.is_wake_up_prompt || self.player.backpack_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::maps::Prefab;

    fn room() -> GameMap {
        let config = SimConfig::default();
        let mut map = GameMap::new(MapId::DormHallway, "hall", 600.0, 400.0, Point::new(50.0, 150.0));
        map.spawn(Prefab::new("ra_chair", Kind::Chair, 300.0, 200.0, 25.0).seat(true), &config);
        map.spawn(
            Prefab::new("ra_npc", Kind::Npc, 300.0, 200.0, 25.0).role(Role::Staff),
            &config,
        );
        map.spawn(Prefab::new("my_bed", Kind::Bed, 500.0, 300.0, 80.0), &config);
        map.spawn(
            Prefab::new("store_bldg", Kind::Store, 100.0, 300.0, 0.0).facade("door", 70.0, 60.0, 40.0),
            &config,
        );
        map.spawn(
            Prefab::new("door", Kind::Portal, 100.0, 320.0, 30.0).portal(MapId::Store, 300.0, 300.0),
            &config,
        );
        map
    }

    #[test]
    fn characters_win_ties_with_furniture() {
        let hit = hit_test(&room(), Point::new(300.0, 205.0)).unwrap();
        assert_eq!(hit.id, "ra_npc");
        assert_eq!(hit.approach, Point::new(300.0, 235.0));
    }

    #[test]
    fn beds_have_a_wider_hit_radius() {
        let hit = hit_test(&room(), Point::new(550.0, 300.0)).unwrap();
        assert_eq!(hit.id, "my_bed");
    }

    #[test]
    fn facades_resolve_to_their_door() {
        // Far from the door itself but on the building front
        let hit = hit_test(&room(), Point::new(150.0, 380.0)).unwrap();
        assert_eq!(hit.id, "door");
        assert_eq!(hit.approach, Point::new(100.0, 355.0));
    }

    #[test]
    fn empty_floor_is_a_miss() {
        assert!(hit_test(&room(), Point::new(450.0, 60.0)).is_none());
    }
}
