//! Lesson order, teacher roster, and homework status.
//!
//! A school day runs the lessons in the fixed order
//! Chinese → Math → English → PE. After PE the school is dismissed; there is
//! no wrap-around within a day. A new day resets to [`Lesson::FIRST`].

use serde::{Deserialize, Serialize};

/// One lesson slot of the school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lesson {
    Chinese,
    Math,
    English,
    #[serde(rename = "PE")]
    Pe,
}

impl Lesson {
    /// The full day, in order.
    pub const ORDER: [Lesson; 4] = [Lesson::Chinese, Lesson::Math, Lesson::English, Lesson::Pe];

    /// First lesson of every day.
    pub const FIRST: Lesson = Lesson::Chinese;

    /// The following lesson, or `None` after PE (dismissal).
    pub fn next(self) -> Option<Lesson> {
        match self {
            Lesson::Chinese => Some(Lesson::Math),
            Lesson::Math => Some(Lesson::English),
            Lesson::English => Some(Lesson::Pe),
            Lesson::Pe => None,
        }
    }

    /// Position in [`Lesson::ORDER`].
    pub fn index(self) -> usize {
        match self {
            Lesson::Chinese => 0,
            Lesson::Math => 1,
            Lesson::English => 2,
            Lesson::Pe => 3,
        }
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    /// Subject name as the teacher says it.
    pub fn subject_name(self) -> &'static str {
        match self {
            Lesson::Chinese => "语文",
            Lesson::Math => "数学",
            Lesson::English => "英语",
            Lesson::Pe => "体育",
        }
    }

    /// Book the player takes out of the backpack for this lesson.
    pub fn book_name(self) -> &'static str {
        match self {
            Lesson::Chinese => "语文书",
            Lesson::Math => "数学书",
            Lesson::English => "英语书",
            Lesson::Pe => "跳绳",
        }
    }

    /// The teacher who runs this lesson.
    pub fn teacher(self) -> &'static TeacherProfile {
        &TEACHERS[self.index()]
    }

    /// Opening line the teacher says when the class starts.
    pub fn opening_line(self) -> String {
        match self {
            Lesson::Pe => "大家跟着我一起做运动！一二三四，二二三四...".to_owned(),
            other => format!(
                "同学们好，现在开始上{}课。请认真听讲。",
                other.subject_name()
            ),
        }
    }
}

/// Static description of a subject teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeacherProfile {
    pub lesson: Lesson,
    /// Stable entity id; exactly one per lesson.
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub voice: &'static str,
}

pub const TEACHERS: [TeacherProfile; 4] = [
    TeacherProfile {
        lesson: Lesson::Chinese,
        id: "teacher_chinese",
        name: "王老师",
        color: "#FFFFFF",
        voice: "Kore",
    },
    TeacherProfile {
        lesson: Lesson::Math,
        id: "teacher_math",
        name: "李老师",
        color: "#2563EB",
        voice: "Aoede",
    },
    TeacherProfile {
        lesson: Lesson::English,
        id: "teacher_english",
        name: "张老师",
        color: "#000000",
        voice: "Leda",
    },
    TeacherProfile {
        lesson: Lesson::Pe,
        id: "teacher_pe",
        name: "李老师",
        color: "#16A34A",
        voice: "Fenrir",
    },
];

/// Look up the lesson a teacher id belongs to.
pub fn lesson_for_teacher_id(id: &str) -> Option<Lesson> {
    TEACHERS.iter().find(|t| t.id == id).map(|t| t.lesson)
}

/// Progress of the evening homework side path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkStatus {
    #[default]
    None,
    Doing,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_walks_the_whole_day() {
        let mut seen = vec![Lesson::FIRST];
        let mut cur = Lesson::FIRST;
        while let Some(n) = cur.next() {
            seen.push(n);
            cur = n;
        }
        assert_eq!(seen, Lesson::ORDER.to_vec());
        assert!(Lesson::Pe.is_last());
    }

    #[test]
    fn index_matches_order() {
        for (i, l) in Lesson::ORDER.iter().enumerate() {
            assert_eq!(l.index(), i);
            assert_eq!(l.teacher().lesson, *l);
        }
    }

    #[test]
    fn teacher_ids_are_unique_and_reversible() {
        for t in &TEACHERS {
            assert!(t.id.starts_with("teacher_"));
            assert_eq!(lesson_for_teacher_id(t.id), Some(t.lesson));
        }
        assert_eq!(lesson_for_teacher_id("student_3"), None);
    }

    #[test]
    fn opening_lines_name_the_subject() {
        assert!(Lesson::Math.opening_line().contains("数学"));
        assert!(Lesson::Pe.opening_line().contains("运动"));
    }
}
