//! Day/schedule machine - lessons, teacher swaps, PE line-up and formation,
//! dismissal, curfew, homework, sleep, and the new-day reset.
//!
//! State transitions are driven both by player commands (`start_class`,
//! `end_class`, homework, sleep) and by the engine's deadlines, which are
//! polled once per tick from [`SimulationEngine::run_timers`].

use rand::Rng;

use schoolday_logic::constants::{anchors, radii};
use schoolday_logic::geometry::Point;
use schoolday_logic::movement::Facing;
use schoolday_logic::schedule::{HomeworkStatus, Lesson};

use crate::components::{Behavior, EntityId, FormationMember, Role};
use crate::engine::SimulationEngine;
use crate::events::{SimEvent, Transition};
use crate::generation::{generate_roommates, teacher_prefab, StudentProfile, LEADER_NAMES};
use crate::maps::templates::{MY_BED, MY_CHAIR};
use crate::maps::MapId;
use crate::state::{SeatedAt, TeacherPhase};
use crate::systems::Plan;

const RA_NAME: &str = "宿管老师";

/// Line-up slots for `count` students, in desk order.
///
/// Students alternate between the left and right aisle columns. The left
/// column skips the gap row, which is where the player joins.
pub fn line_up_slots(count: usize) -> Vec<Point> {
    let (mut left, mut right) = (0, 0);
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                if left == anchors::LINE_UP_GAP_ROW {
                    left += 1;
                }
                let slot = anchors::line_up_slot_point(anchors::LINE_UP_LEFT_X, left);
                left += 1;
                slot
            } else {
                let slot = anchors::line_up_slot_point(anchors::LINE_UP_RIGHT_X, right);
                right += 1;
                slot
            }
        })
        .collect()
}

/// Playground spots for the class during PE, indexed like `roster`.
///
/// The first classmate bearing each leader name stands in the front row
/// facing the class; everyone else fills a grid facing the leaders.
pub fn formation_slots(roster: &[StudentProfile]) -> Vec<(Point, Facing)> {
    let mut slots = vec![None; roster.len()];
    for (i, leader) in LEADER_NAMES.iter().enumerate() {
        if let Some(idx) = roster.iter().position(|s| s.name == *leader) {
            if slots[idx].is_none() {
                let origin = anchors::FORMATION_LEADER_ORIGIN;
                let pos = origin.offset(anchors::FORMATION_LEADER_SPACING * i as f32, 0.0);
                slots[idx] = Some((pos, Facing::Down));
            }
        }
    }

    let mut grid = 0;
    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                let col = (grid % anchors::FORMATION_GRID_COLUMNS) as f32;
                let row = (grid / anchors::FORMATION_GRID_COLUMNS) as f32;
                grid += 1;
                let origin = anchors::FORMATION_GRID_ORIGIN;
                let spacing = anchors::FORMATION_GRID_SPACING;
                (origin.offset(spacing * col, spacing * row), Facing::Up)
            })
        })
        .collect()
}

impl SimulationEngine {
    // --- Lessons ---

    /// Start the current lesson. The player must be seated at a desk in
    /// the classroom; for PE this starts the line-up instead of a lecture.
    pub fn start_class(&mut self) -> Transition {
        let day = &self.day;
        if self.player.map != MapId::Classroom
            || !self.player.seated_at_desk()
            || day.is_class_started
            || day.is_school_over
            || day.is_teacher_transitioning()
        {
            return Transition::Ignored;
        }

        let lesson = self.day.current_lesson;
        self.day.is_class_started = true;
        self.ensure_teacher();

        if lesson == Lesson::Pe {
            self.start_line_up();
        } else {
            self.say(lesson.teacher().name, &lesson.opening_line());
        }

        log::info!("Class started: {lesson:?}");
        self.events.push(SimEvent::ClassStarted { lesson });
        Transition::Applied
    }

    fn start_line_up(&mut self) {
        self.day.is_lining_up = true;
        self.player.seated = None;

        let mut students: Vec<(usize, String)> = match self.registry.get(MapId::Classroom) {
            Ok(classroom) => classroom
                .entities
                .query::<(&EntityId, &Role, &FormationMember)>()
                .iter()
                .filter_map(|(_, (id, role, _))| match role {
                    Role::Student { desk } => Some((*desk, id.0.clone())),
                    _ => None,
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        students.sort();

        for ((_, id), slot) in students.iter().zip(line_up_slots(students.len())) {
            self.ai.assign(MapId::Classroom, id, Plan::LineUp, Some(slot));
        }

        let teacher = Lesson::Pe.teacher().name;
        self.say(teacher, "现在全班在走道排成两队！找到空位站好，我们去操场。");
        self.events.push(SimEvent::LineUpStarted);
    }

    /// End the running lesson.
    ///
    /// For Chinese, Math and English the teacher walks out and the next
    /// one walks in. Ending PE dismisses the school and arms the curfew.
    /// Once school is over this is a no-op.
    pub fn end_class(&mut self) -> Transition {
        let day = &self.day;
        if day.is_school_over || day.is_teacher_transitioning() || !day.is_class_started {
            return Transition::Ignored;
        }

        let lesson = day.current_lesson;
        if lesson == Lesson::Pe {
            if !day.is_in_formation {
                return Transition::Ignored;
            }
            self.dismiss_school();
            return Transition::Applied;
        }
        if self.player.map != MapId::Classroom {
            return Transition::Ignored;
        }

        self.day.is_class_started = false;
        self.day.teacher_transition = Some(TeacherPhase::Leaving { lesson });

        let teacher_id = lesson.teacher().id;
        let present = self
            .registry
            .get(MapId::Classroom)
            .is_ok_and(|m| m.contains_id(teacher_id));
        if present {
            self.ai.assign(
                MapId::Classroom,
                teacher_id,
                Plan::TeacherLeaving,
                Some(anchors::CLASSROOM_DOOR),
            );
        } else {
            self.finish_teacher_transition();
        }
        log::info!("Class ended: {lesson:?}");
        Transition::Applied
    }

    /// Make the current lesson's teacher the only teacher in the
    /// classroom, standing at the podium.
    pub(crate) fn ensure_teacher(&mut self) {
        let profile = self.day.current_lesson.teacher();
        let Ok(classroom) = self.registry.get_mut(MapId::Classroom) else {
            return;
        };

        for id in classroom.despawn_where(|role, id| role.is_teacher() && id.as_str() != profile.id) {
            self.ai.remove(MapId::Classroom, &id);
        }
        if classroom.contains_id(profile.id) {
            classroom.place(profile.id, anchors::PODIUM, Facing::Down);
        } else {
            classroom.spawn(teacher_prefab(profile, anchors::PODIUM, Facing::Down), &self.config);
        }
        self.ai.assign(MapId::Classroom, profile.id, Plan::Hold, None);
    }

    /// Outgoing teacher reached the door: swap in the next one.
    pub(crate) fn teacher_at_door(&mut self, id: &str) {
        let Some(TeacherPhase::Leaving { lesson }) = self.day.teacher_transition else {
            return;
        };
        if id != lesson.teacher().id {
            return;
        }
        let Some(next) = lesson.next() else {
            self.day.teacher_transition = None;
            return;
        };

        self.day.current_lesson = next;
        self.day.teacher_transition = Some(TeacherPhase::Arriving { lesson: next });

        let profile = next.teacher();
        if let Ok(classroom) = self.registry.get_mut(MapId::Classroom) {
            for gone in classroom.despawn_where(|role, _| role.is_teacher()) {
                self.ai.remove(MapId::Classroom, &gone);
            }
            classroom.spawn(
                teacher_prefab(profile, anchors::CLASSROOM_DOOR, Facing::Right),
                &self.config,
            );
        }
        self.ai.assign(
            MapId::Classroom,
            profile.id,
            Plan::TeacherArriving,
            Some(anchors::PODIUM),
        );

        if next == Lesson::Pe {
            self.narrate("李老师拿着跳绳走进来了。");
        } else {
            self.narrate("下课休息一会，下一节课马上开始...");
        }
        log::info!("Lesson advanced to {next:?}");
        self.events.push(SimEvent::LessonAdvanced { lesson: next });
    }

    /// Incoming teacher reached the podium: the swap is over.
    pub(crate) fn teacher_at_podium(&mut self, id: &str) {
        if let Some(TeacherPhase::Arriving { lesson }) = self.day.teacher_transition {
            if id == lesson.teacher().id {
                self.day.teacher_transition = None;
            }
        }
    }

    /// Complete a pending teacher swap instantly.
    pub(crate) fn finish_teacher_transition(&mut self) {
        let Some(phase) = self.day.teacher_transition.take() else {
            return;
        };
        if let TeacherPhase::Leaving { lesson } = phase {
            if let Some(next) = lesson.next() {
                self.day.current_lesson = next;
                log::info!("Lesson advanced to {next:?}");
                self.events.push(SimEvent::LessonAdvanced { lesson: next });
            }
        }
        self.ensure_teacher();
    }

    // --- PE ---

    /// Move the lined-up class to the playground formation.
    fn transfer_to_formation(&mut self) {
        if self.player.map != MapId::Classroom {
            return;
        }
        let is_pe_crowd = |role: &Role, _: &EntityId| role.is_student() || *role == Role::Teacher { lesson: Lesson::Pe };

        if let Ok(classroom) = self.registry.get_mut(MapId::Classroom) {
            classroom.despawn_where(is_pe_crowd);
        }
        self.ai.clear_map(MapId::Classroom);

        let slots = formation_slots(&self.roster);
        if let Ok(playground) = self.registry.get_mut(MapId::Playground) {
            for id in playground.despawn_where(is_pe_crowd) {
                self.ai.remove(MapId::Playground, &id);
            }
            for (student, (pos, facing)) in self.roster.iter().zip(&slots) {
                playground.spawn(student.prefab_at(*pos, *facing), &self.config);
                self.ai.assign(MapId::Playground, &student.id, Plan::Hold, None);
            }
            let pe = Lesson::Pe.teacher();
            playground.spawn(teacher_prefab(pe, anchors::PE_TEACHER, Facing::Down), &self.config);
            self.ai.assign(MapId::Playground, pe.id, Plan::Hold, None);
        }

        // Not a portal trip: class flags survive
        self.player.map = MapId::Playground;
        self.player.pos = anchors::FORMATION_PLAYER;
        self.player.facing = Facing::Up;
        self.player.target = None;
        self.player.seated = None;
        self.day.is_in_formation = true;
        self.say(Lesson::Pe.teacher().name, "大家拿好跳绳，准备开始运动！");

        log::info!("Class moved to the playground for PE");
        self.events.push(SimEvent::MapChanged {
            from: MapId::Classroom,
            to: MapId::Playground,
        });
        self.events.push(SimEvent::FormationReady);
    }

    /// End of PE: school is over, the curfew starts ticking, and each
    /// classmate either heads home or hangs around.
    fn dismiss_school(&mut self) {
        self.day.is_class_started = false;
        self.day.is_in_formation = false;
        self.day.is_school_over = true;
        self.player.target = None;
        self.day.curfew.arm(self.now_ms, self.config.curfew_timeout_ms);
        self.timers.curfew_check.reset(self.now_ms);

        self.narrate("体育课结束了，放学啦！大家可以去小卖部买点东西，然后回宿舍。");

        if let Ok(playground) = self.registry.get_mut(MapId::Playground) {
            let students: Vec<(hecs::Entity, String)> = playground
                .entities
                .query::<(&EntityId, &FormationMember)>()
                .iter()
                .map(|(entity, (id, _))| (entity, id.0.clone()))
                .collect();
            for (entity, id) in students {
                let (behavior, plan, goal) = if self.rng.gen_bool(0.5) {
                    (Behavior::Exit, Plan::Exit, Some(anchors::SCHOOL_GATE))
                } else {
                    (Behavior::Stay, Plan::Wander, None)
                };
                if let Err(e) = playground.entities.insert_one(entity, behavior) {
                    log::warn!("Could not set behavior for {id}: {e}");
                    continue;
                }
                self.ai.assign(MapId::Playground, &id, plan, goal);
            }
        }

        log::info!(
            "School dismissed, curfew at {:?} ms",
            self.day.curfew.due_at()
        );
        self.events.push(SimEvent::SchoolDismissed);
    }

    /// Escort the player back to the dorm once the curfew has passed.
    /// Fires at most once per dismissal.
    fn check_curfew(&mut self) {
        let now = self.now_ms;
        if !self.day.is_school_over
            || self.player.map.is_curfew_safe()
            || !self.day.curfew.is_expired(now)
            || !self.day.curfew.poll(now)
        {
            return;
        }

        self.travel(MapId::DormHallway, anchors::FRONT_DESK);
        self.player.facing = Facing::Up;
        self.say(RA_NAME, "同学，这么晚了还在外面很不安全！快回宿舍登记休息。");
        log::info!("Curfew: player escorted to the dorm");
        self.events.push(SimEvent::CurfewEscort);
    }

    // --- Evening ---

    /// Sit down at the dorm desk and do homework.
    pub fn start_homework(&mut self) -> Transition {
        if self.day.homework != HomeworkStatus::None || self.day.is_night {
            return Transition::Ignored;
        }
        if self.player.map != MapId::DormRoom {
            self.player.backpack_open = false;
            self.narrate("回宿舍再写作业吧。");
            return Transition::Ignored;
        }
        let Some(chair) = self
            .registry
            .get(MapId::DormRoom)
            .ok()
            .and_then(|room| room.position_of(MY_CHAIR))
        else {
            return Transition::Ignored;
        };

        self.player.pos = chair.offset(0.0, radii::SEAT_OFFSET_Y);
        self.player.facing = Facing::Up;
        self.player.target = None;
        self.player.seated = Some(SeatedAt::Chair(MY_CHAIR.to_owned()));
        self.player.backpack_open = false;
        self.day.homework = HomeworkStatus::Doing;
        self.timers.homework.arm(self.now_ms, self.config.homework_ms);
        self.narrate("正在认真写作业...");
        Transition::Applied
    }

    fn finish_homework(&mut self) {
        if self.day.homework != HomeworkStatus::Doing {
            return;
        }
        self.day.homework = HomeworkStatus::Done;
        self.narrate("呼，终于写完了！现在可以去睡觉了。");
        self.events.push(SimEvent::HomeworkDone);
    }

    /// Lie down on a bed. Only the player's own bed works, and only with
    /// the homework done.
    pub(crate) fn sit_on_bed(&mut self, bed_id: &str) -> Transition {
        self.player.target = None;
        if bed_id != MY_BED {
            self.narrate("这是室友的床。");
            return Transition::Ignored;
        }
        if self.day.homework != HomeworkStatus::Done {
            self.narrate("还没写完作业呢，先去写作业吧。");
            return Transition::Ignored;
        }
        if self.day.is_night {
            return Transition::Ignored;
        }
        let Some(bed) = self
            .registry
            .get(MapId::DormRoom)
            .ok()
            .and_then(|room| room.position_of(MY_BED))
        else {
            return Transition::Ignored;
        };

        self.player.pos = bed.offset(30.0, 40.0);
        self.player.facing = Facing::Left;
        self.player.seated = Some(SeatedAt::Bed);
        self.clear_dialogue();
        self.day.is_night = true;
        self.timers.sleep.arm(self.now_ms, self.config.sleep_ms);
        log::info!("Lights out");
        self.events.push(SimEvent::NightFell);
        Transition::Applied
    }

    /// Reset the schedule for the next morning. Friends and inventory are
    /// kept; roommates are rolled again.
    pub(crate) fn start_new_day(&mut self) {
        let now = self.now_ms;
        self.day.start_next_day();
        self.timers.homework.cancel();
        self.timers.sleep.cancel();
        self.timers.formation.cancel();
        self.timers.morning_queue.reset(now);

        let from = self.player.map;
        self.player.map = MapId::DormRoom;
        self.player.pos = anchors::WAKE_UP;
        self.player.facing = Facing::Down;
        self.player.target = None;
        self.player.seated = None;
        self.player.backpack_open = false;
        self.player.selected_book = None;
        self.clear_dialogue();

        if let Ok(playground) = self.registry.get_mut(MapId::Playground) {
            playground.despawn_where(|role, _| role.is_student() || *role == Role::Teacher { lesson: Lesson::Pe });
        }
        if let Ok(classroom) = self.registry.get_mut(MapId::Classroom) {
            classroom.despawn_where(|role, _| role.is_student() || role.is_teacher());
            for student in &self.roster {
                classroom.spawn(student.seated_prefab(), &self.config);
            }
        }
        let roommates = generate_roommates(&mut self.rng);
        if let Ok(room) = self.registry.get_mut(MapId::DormRoom) {
            room.despawn_where(|role, _| role.is_roommate());
            for roommate in roommates {
                room.spawn(roommate, &self.config);
            }
        }
        for map in [MapId::Playground, MapId::Classroom, MapId::DormRoom] {
            self.ai.clear_map(map);
        }

        log::info!("Day {} begins", self.day.day);
        if from != MapId::DormRoom {
            self.events.push(SimEvent::MapChanged {
                from,
                to: MapId::DormRoom,
            });
        }
        self.events.push(SimEvent::NewDay { day: self.day.day });
    }

    /// Close the wake-up prompt.
    pub fn dismiss_wake_up(&mut self) -> Transition {
        if !self.day.is_wake_up_prompt {
            return Transition::Ignored;
        }
        self.day.is_wake_up_prompt = false;
        self.narrate("新的一天开始了，去教室上课吧！");
        Transition::Applied
    }

    /// One roommate leaves the dorm room. The hallway door opens once the
    /// room is empty.
    fn advance_morning_queue(&mut self) {
        let Ok(room) = self.registry.get_mut(MapId::DormRoom) else {
            self.day.is_morning_queue = false;
            return;
        };

        let next = room
            .entities
            .query::<(&EntityId, &Role)>()
            .iter()
            .filter_map(|(_, (id, role))| match role {
                Role::Roommate { slot } => Some((*slot, id.0.clone())),
                _ => None,
            })
            .min();

        if let Some((_, id)) = next {
            if room.despawn_id(&id).is_ok() {
                self.ai.remove(MapId::DormRoom, &id);
                log::debug!("{id} left for class");
                self.events.push(SimEvent::RoommateLeft { id });
            }
        }

        if room.count_role(Role::is_roommate) == 0 {
            self.day.is_morning_queue = false;
            log::debug!("Morning queue cleared");
            self.events.push(SimEvent::MorningQueueCleared);
        }
    }

    /// Poll every deadline and periodic check.
    pub(crate) fn run_timers(&mut self) {
        let now = self.now_ms;
        if self.timers.formation.poll(now) {
            self.transfer_to_formation();
        }
        if self.timers.homework.poll(now) {
            self.finish_homework();
        }
        if self.timers.sleep.poll(now) {
            self.start_new_day();
        }
        if self.timers.curfew_check.ready(now) {
            self.check_curfew();
        }
        if self.day.is_morning_queue && self.timers.morning_queue.ready(now) {
            self.advance_morning_queue();
        }
    }
}
