//! Name, color, persona and voice pools for interchangeable NPC slots.

use rand::Rng;

use crate::components::Persona;

/// Classmates, assigned round-robin by desk index.
pub static CLASS_NAMES: &[&str] = &[
    "小明", "小红", "刚子", "丽丽", "强子", "芳芳", "小军", "娜娜", "涛涛", "静静",
];

/// Roommates, one per bed/chair slot.
pub static DORM_NAMES: &[&str] = &["芳芳", "娜娜", "静静", "小兰", "小美"];

/// Front row of the playground formation, facing the class.
pub static LEADER_NAMES: &[&str] = &["芳芳", "丽丽", "娜娜", "静静"];

pub static COLORS: &[&str] = &[
    "#F87171", "#60A5FA", "#34D399", "#A78BFA", "#FBBF24", "#F472B6",
];

// Each contains a keyword the offline fallback recognises
static PERSONAS: &[&str] = &[
    "吃货，书包里总是装满零食",
    "学霸，下课也在看书",
    "运动健将，最爱打球",
    "总是犯困，上课想睡觉",
    "喜欢画画，本子上全是涂鸦",
    "话痨，知道很多秘密",
    "很害羞，说话声音小",
    "追星族，会唱所有流行歌",
    "科技迷，想发明机器人",
];

static CHILD_VOICES: &[&str] = &["Puck", "Zephyr", "Kore", "Leda", "Aoede", "Charon"];

pub fn color_for(index: usize) -> &'static str {
    COLORS[index % COLORS.len()]
}

/// Random personality and voice for a child NPC.
pub fn random_persona(rng: &mut impl Rng) -> Persona {
    Persona {
        traits: Some(PERSONAS[rng.gen_range(0..PERSONAS.len())].to_owned()),
        voice: Some(CHILD_VOICES[rng.gen_range(0..CHILD_VOICES.len())].to_owned()),
    }
}
