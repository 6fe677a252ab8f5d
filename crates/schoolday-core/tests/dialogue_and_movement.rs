//! Collaborator round trips through a detached broker, and player movement
//! against map walls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use schoolday_core::config::SimConfig;
use schoolday_core::events::SimEvent;
use schoolday_core::maps::MapId;
use schoolday_core::systems::{DialogueBroker, DialogueReply, PLACEHOLDER};
use schoolday_core::SimulationEngine;
use schoolday_logic::geometry::{overlaps, Point};

fn detached_engine(seed: u64) -> SimulationEngine {
    SimulationEngine::with_broker(SimConfig::seeded(seed), DialogueBroker::detached()).unwrap()
}

fn reply_to(seq: u64, npc_id: &str, speaker: &str, text: &str) -> DialogueReply {
    DialogueReply {
        seq,
        npc_id: npc_id.to_owned(),
        speaker: speaker.to_owned(),
        text: text.to_owned(),
        audio: None,
    }
}

#[test]
fn stale_replies_are_dropped() {
    let mut engine = detached_engine(1);

    assert!(engine.interact_with("c1").applied());
    let first = engine.broker_mut().take_outgoing().pop().unwrap();
    assert_eq!(first.npc_name, "跑步的男生");
    assert_eq!(first.location, "校门口");

    // Talking to someone else supersedes the first conversation
    assert!(engine.interact_with("guard").applied());
    let second = engine.broker_mut().take_outgoing().pop().unwrap();
    assert!(second.seq > first.seq);
    assert_eq!(second.voice, "Charon");

    engine
        .broker_mut()
        .post_reply(reply_to(first.seq, &first.npc_id, &first.npc_name, "我在跑步！"));
    engine.tick(16);
    let dialogue = engine.dialogue().unwrap();
    assert_eq!(dialogue.speaker, "保安叔叔");
    assert_eq!(dialogue.text, PLACEHOLDER);

    engine
        .broker_mut()
        .post_reply(reply_to(second.seq, &second.npc_id, &second.npc_name, "同学你好。"));
    engine.tick(32);
    assert_eq!(engine.dialogue().unwrap().text, "同学你好。");
    assert_eq!(engine.dialogue_log().last().unwrap().speaker, "保安叔叔");
}

#[test]
fn leaving_the_map_invalidates_the_reply() {
    let mut engine = detached_engine(2);
    assert!(engine.interact_with("c2").applied());
    let request = engine.broker_mut().take_outgoing().pop().unwrap();

    assert!(engine.interact_with("portal_class").applied());
    engine
        .broker_mut()
        .post_reply(reply_to(request.seq, &request.npc_id, &request.npc_name, "再见"));
    engine.tick(16);
    assert!(engine.dialogue().is_none());
    assert!(engine.dialogue_log().iter().all(|e| e.text != "再见"));
}

#[test]
fn speech_audio_is_forwarded_as_an_event() {
    let mut engine = detached_engine(3);
    assert!(engine.interact_with("c3").applied());
    let request = engine.broker_mut().take_outgoing().pop().unwrap();

    let mut reply = reply_to(request.seq, &request.npc_id, &request.npc_name, "一起玩吧！");
    reply.audio = Some(vec![0x52, 0x49, 0x46, 0x46]);
    engine.broker_mut().post_reply(reply);
    engine.tick(16);

    let audio = engine.drain_events().into_iter().find_map(|e| match e {
        SimEvent::PlayAudio { npc_id, bytes } => Some((npc_id, bytes)),
        _ => None,
    });
    assert_eq!(audio, Some(("c3".to_owned(), vec![0x52, 0x49, 0x46, 0x46])));
}

#[test]
fn talking_to_the_teacher_mid_lesson_asks_for_a_lecture() {
    let mut engine = detached_engine(4);
    assert!(engine.interact_with("portal_class").applied());
    assert!(engine.interact_with("desk_1").applied());
    assert!(engine.start_class().applied());

    assert!(engine.interact_with("teacher_chinese").applied());
    let request = engine.broker_mut().take_outgoing().pop().unwrap();
    assert!(request.is_lecture());
    assert_eq!(request.npc_name, "王老师");
}

#[test]
fn player_never_ends_a_step_inside_a_wall() {
    let mut engine = SimulationEngine::new(SimConfig::seeded(5)).unwrap();
    let mut rng = StdRng::seed_from_u64(99);
    let mut now = 0;

    for _ in 0..60 {
        let (width, height) = {
            let map = engine.active_map().unwrap();
            (map.width, map.height)
        };
        let target = Point::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height));
        engine.walk_to(target);

        for _ in 0..300 {
            now += 16;
            engine.tick(now);
            let map = engine.active_map().unwrap();
            let pos = engine.player().pos;
            assert!(!overlaps(pos, &map.walls), "player inside a wall at {pos:?} on {}", map.id);
            if engine.player().target.is_none() {
                break;
            }
        }
    }
}

#[test]
fn the_morning_queue_only_blocks_the_dorm_door() {
    let mut engine = SimulationEngine::new(SimConfig::seeded(6)).unwrap();
    assert_eq!(engine.current_map(), MapId::Playground);
    // Day one starts on the playground with no queue
    assert!(!engine.day().is_morning_queue);
    assert!(engine.interact_with("portal_dorm_hall").applied());
    assert!(engine.interact_with("door_my_dorm").applied());
    assert!(engine.interact_with("portal_hallway").applied());
    assert_eq!(engine.current_map(), MapId::DormHallway);
}
