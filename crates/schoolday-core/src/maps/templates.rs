//! Static map templates.
//!
//! Coordinates are map-local. Building facades on the playground forward
//! clicks to their door portals; the store interior is reached through
//! `portal_store` below the store's awning.

use rand::Rng;

use schoolday_logic::geometry::{Point, Rect};
use schoolday_logic::movement::Facing;

use super::{GameMap, MapId, MapRegistry, Prefab};
use crate::components::{Kind, Persona, Role};
use crate::config::SimConfig;
use crate::generation::{desk_id, desk_position, generate_roommates, StudentProfile, DESK_COUNT, PLAYER_DESK};

/// Build every map, seating `roster` in the classroom and rolling roommates.
pub fn build_registry(
    config: &SimConfig,
    roster: &[StudentProfile],
    rng: &mut impl Rng,
) -> MapRegistry {
    MapRegistry::from_maps([
        playground(config),
        classroom(config, roster),
        dorm_hallway(config),
        dorm_room(config, rng),
        store(config),
    ])
}

fn staff_voice(voice: &str) -> Persona {
    Persona {
        traits: None,
        voice: Some(voice.to_owned()),
    }
}

pub fn playground(config: &SimConfig) -> GameMap {
    let mut map = GameMap::new(MapId::Playground, "校门口", 1400.0, 1200.0, Point::new(700.0, 1100.0));
    map.background = "#65A30D".into();
    map.walls = vec![
        Rect::new(0.0, 0.0, 1400.0, 50.0),     // top fence
        Rect::new(0.0, 0.0, 50.0, 1200.0),     // left fence
        Rect::new(1350.0, 0.0, 50.0, 1200.0),  // right fence
        Rect::new(0.0, 1150.0, 600.0, 50.0),   // bottom fence, left of gate
        Rect::new(800.0, 1150.0, 600.0, 50.0), // bottom fence, right of gate
        Rect::new(400.0, 200.0, 600.0, 100.0), // school building
        Rect::new(100.0, 400.0, 200.0, 100.0), // dormitory
        Rect::new(1100.0, 200.0, 150.0, 80.0), // store
    ];
    map.wander_area = Some(Rect::new(200.0, 600.0, 1000.0, 400.0));

    let prefabs = [
        Prefab::new("school_bldg", Kind::Building, 700.0, 300.0, 0.0).facade("portal_class", 100.0, 100.0, 100.0),
        Prefab::new("portal_class", Kind::Portal, 700.0, 320.0, 60.0).portal(MapId::Classroom, 100.0, 300.0),
        Prefab::new("dorm_bldg", Kind::Dormitory, 200.0, 450.0, 0.0).facade("portal_dorm_hall", 80.0, 80.0, 100.0),
        Prefab::new("portal_dorm_hall", Kind::Portal, 200.0, 450.0, 60.0).portal(MapId::DormHallway, 50.0, 150.0),
        Prefab::new("store_bldg", Kind::Store, 1175.0, 280.0, 0.0).facade("portal_store", 70.0, 60.0, 40.0),
        Prefab::new("portal_store", Kind::Portal, 1175.0, 300.0, 30.0).portal(MapId::Store, 300.0, 300.0),
        Prefab::new("guard", Kind::Npc, 650.0, 1120.0, 25.0)
            .named("保安叔叔")
            .color("#1F2937")
            .adult()
            .facing(Facing::Right)
            .role(Role::Staff)
            .persona(staff_voice("Charon")),
        Prefab::new("hoop_1", Kind::Hoop, 200.0, 600.0, 40.0).color("#eee"),
        Prefab::new("hoop_2", Kind::Hoop, 1200.0, 600.0, 40.0).color("#eee"),
        Prefab::new("dog_1", Kind::Dog, 300.0, 1000.0, 20.0).named("大黄").color("#92400E"),
        Prefab::new("cat_1", Kind::Cat, 1100.0, 900.0, 15.0).named("小白").color("#E5E7EB"),
        Prefab::new("bird_1", Kind::Bird, 400.0, 400.0, 10.0).named("小鸟").color("#60A5FA"),
        Prefab::new("bird_2", Kind::Bird, 450.0, 420.0, 10.0).named("小鸟").color("#60A5FA"),
        Prefab::new("c1", Kind::Npc, 300.0, 800.0, 18.0).named("跑步的男生").color("#F59E0B").child().facing(Facing::Left),
        Prefab::new("c2", Kind::Npc, 900.0, 700.0, 18.0).named("聊天的女生").color("#EC4899").child().facing(Facing::Left),
        Prefab::new("c3", Kind::Npc, 500.0, 900.0, 18.0).named("同学").color("#3B82F6").child().facing(Facing::Right),
        Prefab::new("c4", Kind::Npc, 1000.0, 850.0, 18.0).named("同学").color("#10B981").child().facing(Facing::Left),
    ];
    for prefab in prefabs {
        map.spawn(prefab, config);
    }
    map
}

pub fn classroom(config: &SimConfig, roster: &[StudentProfile]) -> GameMap {
    let mut map = GameMap::new(MapId::Classroom, "一年级(2)班", 1000.0, 800.0, Point::new(80.0, 300.0));
    map.background = "#FEF3C7".into();
    map.walls = vec![
        Rect::new(0.0, 0.0, 1000.0, 50.0),
        Rect::new(0.0, 750.0, 1000.0, 50.0),
        Rect::new(0.0, 0.0, 50.0, 800.0),
        Rect::new(950.0, 0.0, 50.0, 800.0),
        Rect::new(350.0, 50.0, 300.0, 60.0), // podium
    ];

    map.spawn(
        Prefab::new("portal_out", Kind::Portal, 50.0, 300.0, 40.0)
            .color("#E5E7EB")
            .portal(MapId::Playground, 700.0, 380.0),
        config,
    );

    for desk in 0..DESK_COUNT {
        let free = desk == PLAYER_DESK;
        let pos = desk_position(desk);
        map.spawn(
            Prefab::new(desk_id(desk), Kind::Desk, pos.x, pos.y, 30.0)
                .named(if free { "空座位" } else { "座位" })
                .color("#92400E")
                .seat(!free),
            config,
        );
    }

    map.spawn(
        Prefab::new("my_backpack", Kind::Backpack, 430.0, 230.0, 15.0)
            .named("我的书包")
            .color("#DB2777"),
        config,
    );

    for student in roster {
        map.spawn(student.seated_prefab(), config);
    }
    map
}

pub fn dorm_hallway(config: &SimConfig) -> GameMap {
    let mut map = GameMap::new(MapId::DormHallway, "宿舍走廊", 600.0, 400.0, Point::new(50.0, 150.0));
    map.background = "#F3F4F6".into();
    map.walls = vec![
        Rect::new(0.0, 0.0, 600.0, 50.0),
        Rect::new(0.0, 350.0, 600.0, 50.0),
    ];

    let prefabs = [
        Prefab::new("portal_playground", Kind::Portal, 30.0, 200.0, 40.0)
            .color("#9CA3AF")
            .portal(MapId::Playground, 200.0, 550.0),
        Prefab::new("door_my_dorm", Kind::Portal, 500.0, 50.0, 50.0)
            .color("#4B2A10")
            .portal(MapId::DormRoom, 400.0, 500.0),
        Prefab::new("ra_desk", Kind::Table, 300.0, 250.0, 100.0).named("值班前台").color("#D97706"),
        Prefab::new("ra_chair", Kind::Chair, 300.0, 200.0, 25.0)
            .named("椅子")
            .color("#1F2937")
            .seat(true),
        Prefab::new("ra_npc", Kind::Npc, 300.0, 200.0, 25.0)
            .named("宿管老师")
            .color("#BE123C")
            .adult()
            .role(Role::Staff)
            .persona(staff_voice("Kore")),
    ];
    for prefab in prefabs {
        map.spawn(prefab, config);
    }
    map
}

pub fn dorm_room(config: &SimConfig, rng: &mut impl Rng) -> GameMap {
    let mut map = GameMap::new(MapId::DormRoom, "我的宿舍", 800.0, 600.0, Point::new(400.0, 500.0));
    map.background = "#FEF3C7".into();
    map.walls = vec![
        Rect::new(0.0, 0.0, 800.0, 50.0),
        Rect::new(0.0, 550.0, 800.0, 50.0),
        Rect::new(0.0, 0.0, 50.0, 600.0),
        Rect::new(750.0, 0.0, 50.0, 600.0),
    ];

    let prefabs = [
        Prefab::new("portal_hallway", Kind::Portal, 400.0, 550.0, 50.0)
            .color("#E5E7EB")
            .portal(MapId::DormHallway, 300.0, 100.0),
        Prefab::new("win1", Kind::Window, 150.0, 10.0, 60.0).color("#fff"),
        Prefab::new("win2", Kind::Window, 650.0, 10.0, 60.0).color("#fff"),
        Prefab::new("bed_1", Kind::Bed, 100.0, 150.0, 80.0).named("室友的床").color("#60A5FA"),
        Prefab::new("bed_2", Kind::Bed, 100.0, 350.0, 80.0).named("室友的床").color("#F472B6"),
        Prefab::new(MY_BED, Kind::Bed, 700.0, 150.0, 80.0).named("我的床").color("#DB2777"),
        Prefab::new("bed_4", Kind::Bed, 700.0, 350.0, 80.0).named("室友的床").color("#34D399"),
        Prefab::new("table", Kind::Table, 400.0, 300.0, 120.0).named("写字桌").color("#78350F"),
        Prefab::new(MY_CHAIR, Kind::Chair, 400.0, 380.0, 25.0)
            .named("我的椅子")
            .color("#92400E")
            .facing(Facing::Up)
            .seat(false),
        Prefab::new("chair_2", Kind::Chair, 300.0, 300.0, 25.0)
            .named("椅子")
            .color("#92400E")
            .facing(Facing::Right)
            .seat(false),
        Prefab::new("chair_3", Kind::Chair, 500.0, 300.0, 25.0)
            .named("椅子")
            .color("#92400E")
            .facing(Facing::Left)
            .seat(false),
        Prefab::new("chair_4", Kind::Chair, 400.0, 220.0, 25.0)
            .named("椅子")
            .color("#92400E")
            .seat(false),
        Prefab::new("dorm_backpack", Kind::Backpack, 430.0, 380.0, 15.0)
            .named("我的书包")
            .color("#DB2777"),
    ];
    for prefab in prefabs {
        map.spawn(prefab, config);
    }
    for roommate in generate_roommates(rng) {
        map.spawn(roommate, config);
    }
    map
}

pub fn store(config: &SimConfig) -> GameMap {
    let mut map = GameMap::new(MapId::Store, "小卖部", 600.0, 400.0, Point::new(300.0, 300.0));
    map.background = "#FEF2F2".into();
    map.walls = vec![
        Rect::new(0.0, 0.0, 600.0, 60.0),     // back wall
        Rect::new(0.0, 0.0, 20.0, 400.0),
        Rect::new(580.0, 0.0, 20.0, 400.0),
        Rect::new(0.0, 370.0, 260.0, 30.0),   // front wall, left of door
        Rect::new(340.0, 370.0, 260.0, 30.0), // front wall, right of door
        Rect::new(240.0, 140.0, 120.0, 40.0), // counter
    ];

    let prefabs = [
        Prefab::new("portal_store_exit", Kind::Portal, 300.0, 370.0, 30.0)
            .color("#E5E7EB")
            .portal(MapId::Playground, 1175.0, 360.0),
        Prefab::new(STORE_COUNTER, Kind::Table, 300.0, 160.0, 60.0).named("收银台").color("#9CA3AF"),
        Prefab::new("cashier", Kind::Npc, 300.0, 110.0, 25.0)
            .named("收银员")
            .color("#EF4444")
            .adult()
            .role(Role::Staff)
            .persona(staff_voice("Aoede")),
        Prefab::new("shelf_snacks", Kind::Shelf, 100.0, 150.0, 40.0).named("零食货架").color("#B45309"),
        Prefab::new("fridge_drinks", Kind::Fridge, 500.0, 150.0, 40.0).named("冰柜").color("#BFDBFE"),
        Prefab::new("plant_1", Kind::Plant, 560.0, 340.0, 15.0).color("#15803D"),
    ];
    for prefab in prefabs {
        map.spawn(prefab, config);
    }
    map
}

/// The player's own bed in the dorm room.
pub const MY_BED: &str = "bed_my";
/// The player's homework chair in the dorm room.
pub const MY_CHAIR: &str = "chair_my";
pub const STORE_COUNTER: &str = "store_counter";
