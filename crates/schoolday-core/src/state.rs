//! Top-level game state: the day schedule, the player singleton, and the
//! player's long-term progress (friends, inventory, dialogue history).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use schoolday_logic::geometry::Point;
use schoolday_logic::movement::Facing;
use schoolday_logic::schedule::{HomeworkStatus, Lesson};
use schoolday_logic::timer::Deadline;

use crate::maps::MapId;

/// Phase of the between-lessons teacher swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum TeacherPhase {
    /// Outgoing teacher walking to the door.
    Leaving { lesson: Lesson },
    /// Incoming teacher walking to the podium.
    Arriving { lesson: Lesson },
}

/// Day/schedule flags.
///
/// Invariants: `is_school_over` and `is_class_started` are never both true;
/// `current_lesson` only advances within a day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    /// 1-based day counter.
    pub day: u32,
    pub current_lesson: Lesson,
    pub is_class_started: bool,
    pub teacher_transition: Option<TeacherPhase>,
    pub is_lining_up: bool,
    /// PE is running on the playground.
    pub is_in_formation: bool,
    pub is_school_over: bool,
    /// Armed once per PE dismissal.
    pub curfew: Deadline,
    pub homework: HomeworkStatus,
    pub is_night: bool,
    pub is_morning_queue: bool,
    /// Blocks pointer input until dismissed.
    pub is_wake_up_prompt: bool,
}

impl DayState {
    pub fn new() -> Self {
        Self {
            day: 1,
            current_lesson: Lesson::FIRST,
            is_class_started: false,
            teacher_transition: None,
            is_lining_up: false,
            is_in_formation: false,
            is_school_over: false,
            curfew: Deadline::idle(),
            homework: HomeworkStatus::None,
            is_night: false,
            is_morning_queue: false,
            is_wake_up_prompt: false,
        }
    }

    pub fn is_teacher_transitioning(&self) -> bool {
        self.teacher_transition.is_some()
    }

    /// Reset to the morning of the next day.
    pub fn start_next_day(&mut self) {
        let day = self.day + 1;
        *self = Self::new();
        self.day = day;
        self.is_morning_queue = true;
        self.is_wake_up_prompt = true;
    }

    /// Drop the lesson-start flags; used when the player leaves a map.
    pub fn clear_lesson_flags(&mut self) {
        self.is_class_started = false;
        self.is_lining_up = false;
        self.is_in_formation = false;
    }
}

impl Default for DayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the player is sitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "at", content = "id")]
pub enum SeatedAt {
    Desk(String),
    Chair(String),
    Bed,
}

/// The player singleton. Never stored in a map's entity list.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub map: MapId,
    pub pos: Point,
    pub facing: Facing,
    pub target: Option<Point>,
    pub seated: Option<SeatedAt>,
    pub backpack_open: bool,
    /// Book (or jump rope) taken out of the backpack.
    pub selected_book: Option<Lesson>,
}

impl PlayerState {
    pub fn new(map: MapId, pos: Point) -> Self {
        Self {
            map,
            pos,
            facing: Facing::Right,
            target: None,
            seated: None,
            backpack_open: false,
            selected_book: None,
        }
    }

    pub fn is_seated(&self) -> bool {
        self.seated.is_some()
    }

    pub fn seated_at_desk(&self) -> bool {
        matches!(self.seated, Some(SeatedAt::Desk(_)))
    }
}

/// Someone the player has talked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Append-only friend list, deduplicated by name. Survives new days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friends {
    list: Vec<Friend>,
}

impl Friends {
    /// Returns `true` if this is a new friend.
    pub fn add(&mut self, friend: Friend) -> bool {
        if self.list.iter().any(|f| f.name == friend.name) {
            return false;
        }
        self.list.push(friend);
        true
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.list.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Friend> {
        self.list.iter()
    }
}

/// Items bought or picked up. Survives new days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<String>,
}

impl Inventory {
    pub fn add(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    pub fn count(&self, item: &str) -> usize {
        self.items.iter().filter(|i| *i == item).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

/// The line currently on screen. `seq` ties it to the interaction that
/// produced it, so late collaborator replies can be recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueBox {
    pub speaker: String,
    pub text: String,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub speaker: String,
    pub text: String,
    pub at_ms: u64,
}

/// Bounded history of every line shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl DialogueLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, speaker: &str, text: &str, at_ms: u64) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            speaker: speaker.to_owned(),
            text: text.to_owned(),
            at_ms,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friends_dedup_by_name() {
        let mut friends = Friends::default();
        let fang = |id: &str| Friend {
            id: id.into(),
            name: "芳芳".into(),
            color: "#F87171".into(),
        };
        assert!(friends.add(fang("student_5")));
        // Same name on another map (or a roommate) is the same friend
        assert!(!friends.add(fang("roommate_0")));
        assert_eq!(friends.len(), 1);
        assert!(friends.contains_name("芳芳"));
    }

    #[test]
    fn next_day_keeps_counter_and_raises_queue() {
        let mut day = DayState::new();
        day.current_lesson = Lesson::Pe;
        day.is_school_over = true;
        day.homework = HomeworkStatus::Done;
        day.curfew.arm(0, 100);
        day.start_next_day();
        assert_eq!(day.day, 2);
        assert_eq!(day.current_lesson, Lesson::Chinese);
        assert!(!day.is_school_over);
        assert!(!day.curfew.is_armed());
        assert_eq!(day.homework, HomeworkStatus::None);
        assert!(day.is_morning_queue);
        assert!(day.is_wake_up_prompt);
    }

    #[test]
    fn log_is_bounded() {
        let mut log = DialogueLog::with_capacity(2);
        log.push("a", "1", 0);
        log.push("b", "2", 1);
        log.push("c", "3", 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.iter().next().unwrap().speaker, "b");
        assert_eq!(log.last().unwrap().text, "3");
    }

    #[test]
    fn inventory_counts() {
        let mut inv = Inventory::default();
        inv.add("矿泉水");
        inv.add("矿泉水");
        inv.add("薯片");
        assert_eq!(inv.count("矿泉水"), 2);
        assert_eq!(inv.len(), 3);
    }
}
