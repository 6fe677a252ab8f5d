//! Scenario tests that drive a whole school day through the public engine API.

use schoolday_core::components::Role;
use schoolday_core::config::SimConfig;
use schoolday_core::events::SimEvent;
use schoolday_core::maps::MapId;
use schoolday_core::systems::{BookChoice, Plan};
use schoolday_core::SimulationEngine;
use schoolday_logic::constants::anchors;
use schoolday_logic::geometry::Point;
use schoolday_logic::schedule::{HomeworkStatus, Lesson};

const FRAME_MS: u64 = 16;

struct Harness {
    engine: SimulationEngine,
    now: u64,
    events: Vec<SimEvent>,
}

impl Harness {
    fn new(seed: u64) -> Self {
        Self {
            engine: SimulationEngine::new(SimConfig::seeded(seed)).unwrap(),
            now: 0,
            events: Vec::new(),
        }
    }

    fn tick(&mut self, step_ms: u64) {
        self.now += step_ms;
        self.engine.tick(self.now);
        self.events.extend(self.engine.drain_events());
    }

    /// Tick until `done` holds, failing the test after `max_ticks`.
    fn run_until(&mut self, max_ticks: usize, step_ms: u64, mut done: impl FnMut(&SimulationEngine) -> bool) {
        for _ in 0..max_ticks {
            if done(&self.engine) {
                return;
            }
            self.tick(step_ms);
        }
        assert!(done(&self.engine), "condition not reached after {max_ticks} ticks");
    }

    fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

fn classroom_teachers(engine: &SimulationEngine) -> Vec<String> {
    engine.map(MapId::Classroom).unwrap().teacher_ids()
}

fn sit_at_my_desk(h: &mut Harness) {
    assert!(h.engine.interact_with("portal_class").applied());
    assert_eq!(h.engine.current_map(), MapId::Classroom);
    assert!(h.engine.interact_with("desk_1").applied());
    assert!(h.engine.is_seated_at("desk_1"));
}

/// Sit through Chinese, Math and English. Returns the lessons seen.
fn attend_morning_lessons(h: &mut Harness) -> Vec<Lesson> {
    let mut seen = vec![h.engine.day().current_lesson];
    for _ in 0..3 {
        assert!(h.engine.start_class().applied());
        assert!(h.engine.end_class().applied());
        h.run_until(2_000, FRAME_MS, |e| {
            assert!(classroom_teachers(e).len() <= 1, "two teachers in the classroom");
            !e.day().is_teacher_transitioning()
        });
        seen.push(h.engine.day().current_lesson);
    }
    seen
}

/// Line up for PE and wait for the class to reach the playground.
fn line_up_for_pe(h: &mut Harness) {
    assert!(h.engine.start_class().applied());
    assert!(h.engine.day().is_lining_up);
    assert!(h.engine.walk_to(anchors::line_up_gap()).applied());
    h.run_until(1_000, FRAME_MS, |e| e.current_map() == MapId::Playground);
}

fn play_until_dismissal(h: &mut Harness) {
    sit_at_my_desk(h);
    attend_morning_lessons(h);
    line_up_for_pe(h);
    assert!(h.engine.end_class().applied());
}

#[test]
fn lessons_run_in_order_with_one_teacher() {
    let mut h = Harness::new(1);
    sit_at_my_desk(&mut h);
    assert_eq!(classroom_teachers(&h.engine), vec!["teacher_chinese".to_owned()]);

    let seen = attend_morning_lessons(&mut h);
    assert_eq!(seen, Lesson::ORDER.to_vec());
    assert_eq!(classroom_teachers(&h.engine), vec!["teacher_pe".to_owned()]);
    assert!(!h.engine.day().is_school_over);
    assert_eq!(h.count(|e| matches!(e, SimEvent::LessonAdvanced { .. })), 3);
}

#[test]
fn start_class_needs_a_desk() {
    let mut h = Harness::new(2);
    assert!(!h.engine.start_class().applied());

    assert!(h.engine.interact_with("portal_class").applied());
    assert!(!h.engine.start_class().applied());
    assert!(!h.engine.day().is_class_started);

    // Someone else's desk
    assert!(!h.engine.interact_with("desk_0").applied());
    assert!(!h.engine.start_class().applied());
}

#[test]
fn pe_line_up_ends_in_playground_formation() {
    let mut h = Harness::new(3);
    sit_at_my_desk(&mut h);
    attend_morning_lessons(&mut h);
    assert_eq!(h.engine.day().current_lesson, Lesson::Pe);

    assert!(h.engine.start_class().applied());
    assert!(h.engine.day().is_class_started);
    assert!(h.engine.player().seated.is_none());
    for student in h.engine.roster() {
        let plan = h.engine.ai().get(MapId::Classroom, &student.id).map(|s| s.plan);
        assert_eq!(plan, Some(Plan::LineUp), "{} not lining up", student.id);
    }

    assert!(h.engine.walk_to(anchors::line_up_gap()).applied());
    h.run_until(1_000, FRAME_MS, |e| e.current_map() == MapId::Playground);

    let day = h.engine.day();
    assert!(day.is_in_formation);
    assert!(day.is_class_started);
    assert_eq!(h.engine.player().pos, anchors::FORMATION_PLAYER);
    assert_eq!(h.count(|e| *e == SimEvent::FormationReady), 1);

    let playground = h.engine.map(MapId::Playground).unwrap();
    assert_eq!(playground.count_role(Role::is_student), h.engine.roster().len());
    assert_eq!(playground.teacher_ids(), vec!["teacher_pe".to_owned()]);
    let classroom = h.engine.map(MapId::Classroom).unwrap();
    assert_eq!(classroom.count_role(Role::is_student), 0);
}

#[test]
fn pe_cannot_end_before_the_formation() {
    let mut h = Harness::new(4);
    sit_at_my_desk(&mut h);
    attend_morning_lessons(&mut h);
    assert!(h.engine.start_class().applied());
    assert!(!h.engine.end_class().applied());
    assert!(!h.engine.day().is_school_over);
}

#[test]
fn dismissal_is_saturating() {
    let mut h = Harness::new(5);
    play_until_dismissal(&mut h);

    let day = h.engine.day().clone();
    assert!(day.is_school_over);
    assert_eq!(day.current_lesson, Lesson::Pe);
    assert!(day.curfew.is_armed());
    for student in h.engine.roster() {
        let plan = h.engine.ai().get(MapId::Playground, &student.id).map(|s| s.plan);
        assert!(matches!(plan, Some(Plan::Exit | Plan::Wander)), "{} got {plan:?}", student.id);
    }
    assert_eq!(
        h.engine.ai().get(MapId::Playground, "teacher_pe").map(|s| s.plan),
        Some(Plan::Hold)
    );

    assert!(!h.engine.end_class().applied());
    assert!(!h.engine.start_class().applied());
    assert_eq!(h.engine.day(), &day);
    assert_eq!(h.count(|e| *e == SimEvent::SchoolDismissed), 1);
}

#[test]
fn dismissal_cancels_a_walk_in_progress() {
    let mut h = Harness::new(12);
    sit_at_my_desk(&mut h);
    attend_morning_lessons(&mut h);
    line_up_for_pe(&mut h);

    assert!(h.engine.walk_to(Point::new(300.0, 700.0)).applied());
    h.tick(FRAME_MS);
    assert!(h.engine.end_class().applied());
    assert!(h.engine.player().target.is_none());

    let parked = h.engine.player().pos;
    for _ in 0..10 {
        h.tick(FRAME_MS);
    }
    assert_eq!(h.engine.player().pos, parked);
}

#[test]
fn curfew_escorts_the_player_once() {
    let mut h = Harness::new(6);
    play_until_dismissal(&mut h);
    assert_eq!(h.engine.current_map(), MapId::Playground);

    // Well past the deadline
    for _ in 0..400 {
        h.tick(100);
    }
    assert_eq!(h.count(|e| *e == SimEvent::CurfewEscort), 1);
    assert_eq!(h.engine.current_map(), MapId::DormHallway);
    assert_eq!(h.engine.player().pos, anchors::FRONT_DESK);
    assert_eq!(h.engine.dialogue().unwrap().speaker, "宿管老师");

    // Walking back out does not trigger a second escort
    assert!(h.engine.interact_with("portal_playground").applied());
    for _ in 0..100 {
        h.tick(100);
    }
    assert_eq!(h.count(|e| *e == SimEvent::CurfewEscort), 1);
    assert_eq!(h.engine.current_map(), MapId::Playground);
}

#[test]
fn curfew_spares_a_player_already_home() {
    let mut h = Harness::new(7);
    play_until_dismissal(&mut h);
    assert!(h.engine.interact_with("portal_dorm_hall").applied());
    for _ in 0..300 {
        h.tick(100);
    }
    assert_eq!(h.count(|e| *e == SimEvent::CurfewEscort), 0);
}

#[test]
fn bed_needs_homework_then_starts_a_new_day() {
    let mut h = Harness::new(8);
    assert!(h.engine.interact_with("c1").applied());
    assert!(h.engine.interact_with("portal_dorm_hall").applied());
    assert!(h.engine.interact_with("door_my_dorm").applied());
    assert_eq!(h.engine.current_map(), MapId::DormRoom);

    assert!(!h.engine.interact_with("bed_my").applied());
    assert!(!h.engine.day().is_night);
    assert_eq!(h.engine.dialogue().unwrap().text, "还没写完作业呢，先去写作业吧。");

    // Roommate beds are never available
    assert!(!h.engine.interact_with("bed_1").applied());

    assert!(h.engine.select_book(BookChoice::Homework).applied());
    assert_eq!(h.engine.day().homework, HomeworkStatus::Doing);
    assert!(!h.engine.stand_up().applied());
    h.run_until(100, 100, |e| e.day().homework == HomeworkStatus::Done);

    assert!(h.engine.interact_with("bed_my").applied());
    assert!(h.engine.day().is_night);
    assert!(!h.engine.walk_to(Point::new(400.0, 400.0)).applied());

    h.run_until(100, 100, |e| e.day().day == 2);
    let day = h.engine.day();
    assert_eq!(day.current_lesson, Lesson::Chinese);
    assert!(!day.is_school_over);
    assert!(!day.is_night);
    assert!(day.is_wake_up_prompt);
    assert!(day.is_morning_queue);
    assert_eq!(day.homework, HomeworkStatus::None);
    assert_eq!(h.engine.player().pos, anchors::WAKE_UP);
    assert!(h.events.contains(&SimEvent::NewDay { day: 2 }));

    // Friends carry over
    assert_eq!(h.engine.friends().len(), 1);
}

#[test]
fn a_sleeping_player_ignores_every_command() {
    let mut h = Harness::new(13);
    assert!(h.engine.interact_with("portal_dorm_hall").applied());
    assert!(h.engine.interact_with("door_my_dorm").applied());
    assert!(h.engine.select_book(BookChoice::Homework).applied());
    h.run_until(100, 100, |e| e.day().homework == HomeworkStatus::Done);
    assert!(h.engine.interact_with("bed_my").applied());
    assert!(h.engine.input_locked());

    assert!(!h.engine.interact_with("portal_hallway").applied());
    assert!(!h.engine.interact_with("bed_my").applied());
    assert!(!h.engine.pointer_click(Point::new(300.0, 300.0)).applied());
    assert_eq!(h.engine.current_map(), MapId::DormRoom);
    assert!(h.engine.day().is_night);

    // Still locked behind the wake-up prompt on the next morning
    h.run_until(100, 100, |e| e.day().day == 2);
    assert!(!h.engine.interact_with("portal_hallway").applied());
    assert!(h.engine.dismiss_wake_up().applied());
    assert!(!h.engine.input_locked());
}

#[test]
fn homework_outside_the_dorm_is_refused() {
    let mut h = Harness::new(9);
    assert!(!h.engine.select_book(BookChoice::Homework).applied());
    assert_eq!(h.engine.day().homework, HomeworkStatus::None);
    assert_eq!(h.engine.dialogue().unwrap().text, "回宿舍再写作业吧。");
}

#[test]
fn morning_queue_blocks_the_door_until_the_room_empties() {
    let mut h = Harness::new(10);
    assert!(h.engine.interact_with("portal_dorm_hall").applied());
    assert!(h.engine.interact_with("door_my_dorm").applied());
    assert!(h.engine.select_book(BookChoice::Homework).applied());
    h.run_until(100, 100, |e| e.day().homework == HomeworkStatus::Done);
    assert!(h.engine.interact_with("bed_my").applied());
    h.run_until(100, 100, |e| e.day().day == 2);
    assert!(h.engine.dismiss_wake_up().applied());

    let roommates = |e: &SimulationEngine| e.map(MapId::DormRoom).unwrap().count_role(Role::is_roommate);
    let mut remaining = roommates(&h.engine);
    assert_eq!(remaining, 5);

    while remaining > 0 {
        assert!(!h.engine.interact_with("portal_hallway").applied());
        assert_eq!(h.engine.current_map(), MapId::DormRoom);
        assert!(h.engine.day().is_morning_queue);

        h.run_until(100, 100, |e| roommates(e) < remaining);
        let now = roommates(&h.engine);
        assert_eq!(now, remaining - 1, "roommates leave one at a time");
        remaining = now;
    }

    assert!(!h.engine.day().is_morning_queue);
    assert!(h.engine.interact_with("portal_hallway").applied());
    assert_eq!(h.engine.current_map(), MapId::DormHallway);
    assert_eq!(h.count(|e| matches!(e, SimEvent::RoommateLeft { .. })), 5);
}

#[test]
fn talking_to_the_same_child_twice_makes_one_friend() {
    let mut h = Harness::new(11);
    assert!(h.engine.interact_with("c3").applied());
    assert!(h.engine.interact_with("c3").applied());
    // Same display name, different child
    assert!(h.engine.interact_with("c4").applied());
    assert_eq!(h.engine.friends().len(), 1);

    assert!(h.engine.interact_with("c1").applied());
    // Adults are not friends
    assert!(h.engine.interact_with("guard").applied());
    assert_eq!(h.engine.friends().len(), 2);

    h.tick(FRAME_MS);
    assert_eq!(h.count(|e| matches!(e, SimEvent::FriendAdded { .. })), 2);
}

#[test]
fn animals_answer_without_a_collaborator() {
    let mut h = Harness::new(12);
    assert!(h.engine.interact_with("dog_1").applied());
    assert_eq!(h.engine.dialogue().unwrap().text, "...");
    h.tick(FRAME_MS);
    let dialogue = h.engine.dialogue().unwrap();
    assert_eq!(dialogue.speaker, "大黄");
    assert_eq!(dialogue.text, "汪汪！");
    assert_eq!(h.engine.dialogue_log().last().unwrap().text, "汪汪！");
}

#[test]
fn store_fixtures_fill_the_inventory() {
    let mut h = Harness::new(13);
    assert!(h.engine.interact_with("portal_store").applied());
    assert_eq!(h.engine.current_map(), MapId::Store);

    assert!(h.engine.interact_with("shelf_snacks").applied());
    assert!(h.engine.interact_with("fridge_drinks").applied());
    assert!(h.engine.interact_with("store_counter").applied());

    let inventory = h.engine.inventory();
    assert_eq!(inventory.len(), 3);
    assert_eq!(inventory.count("矿泉水"), 1);
    assert_eq!(h.engine.dialogue().unwrap().speaker, "收银员");
}

#[test]
fn leaving_mid_swap_finishes_the_swap() {
    let mut h = Harness::new(14);
    sit_at_my_desk(&mut h);
    assert!(h.engine.start_class().applied());
    assert!(h.engine.end_class().applied());
    assert!(h.engine.day().is_teacher_transitioning());

    assert!(h.engine.stand_up().applied());
    assert!(h.engine.interact_with("portal_out").applied());
    assert!(!h.engine.day().is_teacher_transitioning());
    assert_eq!(h.engine.day().current_lesson, Lesson::Math);
    assert_eq!(classroom_teachers(&h.engine), vec!["teacher_math".to_owned()]);
}
