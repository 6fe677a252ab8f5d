//! Dialogue boundary - requests to the external text/speech collaborator,
//! local fallback lines, and the broker that carries replies back into the
//! tick loop.
//!
//! Every request carries the sequence number of the dialogue box it was
//! issued for. The engine applies a reply only while that sequence is still
//! current, so a late answer after the player walked away is dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use schoolday_logic::schedule::Lesson;

use crate::components::Kind;
use crate::error::CollaboratorError;

/// Voice used when an entity declares none.
pub const DEFAULT_VOICE: &str = "Kore";

/// Placeholder shown while a reply is outstanding.
pub const PLACEHOLDER: &str = "...";

/// Everything the collaborator gets to know about a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub seq: u64,
    pub npc_id: String,
    pub npc_name: String,
    /// Display name of the map the conversation happens on.
    pub location: String,
    pub kind: Kind,
    pub persona: Option<String>,
    pub voice: String,
    /// Set when talking to the current teacher during their lesson.
    pub lecture: Option<Lesson>,
}

impl DialogueRequest {
    pub fn is_lecture(&self) -> bool {
        self.lecture.is_some()
    }
}

/// A fulfilled request, ready to be applied by the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueReply {
    pub seq: u64,
    pub npc_id: String,
    pub speaker: String,
    pub text: String,
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

/// External generator of dialogue text and speech audio.
///
/// Implementations may block; the broker keeps them off the tick loop.
pub trait DialogueCollaborator: Send {
    fn request_dialogue(&mut self, request: &DialogueRequest) -> Result<String, CollaboratorError>;

    /// `Ok(None)` means "no audio for this line".
    fn request_speech(&mut self, text: &str, voice: &str) -> Result<Option<Vec<u8>>, CollaboratorError>;
}

/// Collaborator used when no generator is configured. Every request fails
/// with [`CollaboratorError::Unavailable`], so replies come from fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCollaborator;

impl DialogueCollaborator for UnavailableCollaborator {
    fn request_dialogue(&mut self, _request: &DialogueRequest) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable)
    }

    fn request_speech(&mut self, _text: &str, _voice: &str) -> Result<Option<Vec<u8>>, CollaboratorError> {
        Err(CollaboratorError::Unavailable)
    }
}

type DialogueKey = (String, bool, Option<Lesson>);

/// Memoising wrapper around another collaborator.
///
/// Dialogue is cached per (npc, lecture, subject); a cached line is reused
/// 70% of the time so conversations do not repeat forever. Speech is cached
/// per (voice, text). Failures are never cached.
pub struct CachedCollaborator<C> {
    inner: C,
    rng: StdRng,
    regenerate_chance: f64,
    dialogue: HashMap<DialogueKey, String>,
    speech: HashMap<(String, String), Vec<u8>>,
}

impl<C: DialogueCollaborator> CachedCollaborator<C> {
    pub fn new(inner: C, seed: u64) -> Self {
        Self {
            inner,
            rng: StdRng::seed_from_u64(seed),
            regenerate_chance: 0.3,
            dialogue: HashMap::new(),
            speech: HashMap::new(),
        }
    }

    pub fn cached_lines(&self) -> usize {
        self.dialogue.len()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: DialogueCollaborator> DialogueCollaborator for CachedCollaborator<C> {
    fn request_dialogue(&mut self, request: &DialogueRequest) -> Result<String, CollaboratorError> {
        let key = (request.npc_id.clone(), request.is_lecture(), request.lecture);
        if let Some(line) = self.dialogue.get(&key) {
            if !self.rng.gen_bool(self.regenerate_chance) {
                return Ok(line.clone());
            }
        }
        let line = self.inner.request_dialogue(request)?;
        self.dialogue.insert(key, line.clone());
        Ok(line)
    }

    fn request_speech(&mut self, text: &str, voice: &str) -> Result<Option<Vec<u8>>, CollaboratorError> {
        let key = (voice.to_owned(), text.to_owned());
        if let Some(audio) = self.speech.get(&key) {
            return Ok(Some(audio.clone()));
        }
        let audio = self.inner.request_speech(text, voice)?;
        if let Some(bytes) = &audio {
            self.speech.insert(key, bytes.clone());
        }
        Ok(audio)
    }
}

/// Run one request against `collaborator`, substituting local lines for
/// any failure. Never fails.
pub fn fulfill_request(
    collaborator: &mut dyn DialogueCollaborator,
    request: &DialogueRequest,
    rng: &mut impl Rng,
) -> DialogueReply {
    let text = match animal_sound(request.kind) {
        Some(sound) => sound.to_owned(),
        None => match collaborator.request_dialogue(request) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                log::warn!("Empty dialogue for {}, using fallback", request.npc_id);
                fallback_line(request, rng)
            }
            Err(err) => {
                log::warn!("Dialogue for {} failed ({err}), using fallback", request.npc_id);
                fallback_line(request, rng)
            }
        },
    };

    let spoken = clean_speech_text(&text);
    let audio = if spoken.is_empty() {
        None
    } else {
        match collaborator.request_speech(&spoken, &request.voice) {
            Ok(audio) => audio,
            Err(err) => {
                log::debug!("Speech for {} unavailable: {err}", request.npc_id);
                None
            }
        }
    };

    DialogueReply {
        seq: request.seq,
        npc_id: request.npc_id.clone(),
        speaker: request.npc_name.clone(),
        text,
        audio,
    }
}

fn animal_sound(kind: Kind) -> Option<&'static str> {
    match kind {
        Kind::Dog => Some("汪汪！"),
        Kind::Cat => Some("喵~"),
        Kind::Bird => Some("叽叽喳喳"),
        _ => None,
    }
}

/// Local line for a request: lecture topic, then the speaker's own table,
/// then persona keywords, then a generic greeting.
pub fn fallback_line(request: &DialogueRequest, rng: &mut impl Rng) -> String {
    if let Some(lesson) = request.lecture {
        return lecture_line(lesson).to_owned();
    }
    if let Some(lines) = lines_for(&request.npc_id) {
        return lines[rng.gen_range(0..lines.len())].to_owned();
    }
    persona_line(request.persona.as_deref()).to_owned()
}

fn lecture_line(lesson: Lesson) -> &'static str {
    match lesson {
        Lesson::Chinese => "同学们，谁能背诵《静夜思》？",
        Lesson::Math => "大家算一算，5加7等于多少？",
        Lesson::English => "Class, what is your name?",
        Lesson::Pe => "伸展运动，开始！一二三四！",
    }
}

fn lines_for(npc_id: &str) -> Option<&'static [&'static str]> {
    let lines: &'static [&'static str] = match npc_id {
        "teacher_chinese" => &[
            "（温柔）同学们，‘读书破万卷，下笔如有神’，今天要多读几页书哦。",
            "（提问）大家知道‘春眠不觉晓’描写的是哪个季节吗？",
            "（讲解）写字的时候要心静，横平竖直，字如其人。",
            "（鼓励）这篇作文写得真生动，继续加油！",
        ],
        "teacher_math" => &[
            "（推眼镜）数学是思维的体操，大家做题要细心。",
            "（提问）谁能告诉我，三角形的内角和是多少度？",
            "（讲解）计算的时候小数点要对齐，不可以马虎。",
            "（严谨）逻辑要清晰，一步一步推导才能得出正确答案。",
        ],
        "teacher_english" => &[
            "（活泼）Good morning class! How are you today?",
            "（提问）Can you tell me what color this is? Yes, it's red!",
            "（鼓励）Don't be shy! Speak out loud! 大声读出来！",
            "（唱歌）Let's sing the ABC song together! A B C D...",
        ],
        "teacher_pe" => &[
            "（大声）集合！向右看齐！精神饱满一点！",
            "（口令）一二一，一二一！脚步跟上节奏！",
            "（强调）身体是革命的本钱，多运动才能不生病！",
            "（示范）看我看我，深蹲要做到位，背挺直！",
        ],
        "ra_npc" => &[
            "（关心）天冷了，记得多穿件衣服，别着凉了。",
            "（检查）宿舍卫生要注意，被子要叠成豆腐块哦。",
            "（温和）晚上早点休息，明天上课才有精神。",
            "（叮嘱）离开宿舍记得关好门窗，注意安全呀。",
        ],
        "guard" => &[
            "（警惕）注意安全，不要跟陌生人走。",
            "（和蔼）放学早点回家，别贪玩。",
            "（敬礼）早上好！",
        ],
        "cashier" => &[
            "（热情）小朋友，想买点什么？",
            "（算账）一共两块钱，拿好。",
            "（推荐）这个棒棒糖很甜哦。",
        ],
        _ => return None,
    };
    Some(lines)
}

static PERSONA_LINES: &[(&[&str], &str)] = &[
    (&["吃货", "零食"], "（嚼嚼）今天的午饭吃什么呢..."),
    (&["看书", "学霸"], "嘘，我在看书呢，别打扰我。"),
    (&["运动", "打球"], "好想去操场跑步啊！"),
    (&["睡觉"], "（揉眼睛）好困啊...再睡五分钟..."),
    (&["画画"], "你看我画的这只小猫像吗？"),
    (&["秘密", "说话"], "我告诉你一个秘密，你别告诉别人哦..."),
    (&["害羞"], "（脸红）那个...你好..."),
    (&["追星"], "你听过那个新的组合唱歌吗？太好听了！"),
    (&["科技"], "我在研究怎么把橡皮变成机器人！"),
];

fn persona_line(persona: Option<&str>) -> &'static str {
    let Some(persona) = persona else {
        return "你好呀！";
    };
    PERSONA_LINES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| persona.contains(k)))
        .map(|(_, line)| *line)
        .unwrap_or("今天天气真不错！")
}

/// Strip parenthesised stage directions (full-width or ASCII) before
/// synthesis. An unmatched opening bracket is kept as text.
pub fn clean_speech_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let close = match c {
            '（' => Some('）'),
            '(' => Some(')'),
            _ => None,
        };
        if let Some(close) = close {
            if let Some(end) = rest[c.len_utf8()..].find(close) {
                rest = &rest[c.len_utf8() + end + close.len_utf8()..];
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out.trim().to_owned()
}

enum Backend {
    /// The host pulls requests and posts replies itself.
    Detached { outbox: Vec<DialogueRequest> },
    /// Fulfilled on the tick thread at the next drain.
    Inline {
        collaborator: Box<dyn DialogueCollaborator>,
        rng: StdRng,
        pending: Vec<DialogueRequest>,
    },
    /// Fulfilled on a background thread.
    Worker {
        tx: Option<Sender<DialogueRequest>>,
        rx: Receiver<DialogueReply>,
        handle: Option<JoinHandle<()>>,
    },
}

/// Carries dialogue requests out of the tick loop and replies back in.
///
/// Submitting never blocks. Replies are collected with [`DialogueBroker::drain`]
/// once per tick and applied by the engine.
pub struct DialogueBroker {
    backend: Backend,
    posted: VecDeque<DialogueReply>,
}

impl DialogueBroker {
    pub fn detached() -> Self {
        Self {
            backend: Backend::Detached { outbox: Vec::new() },
            posted: VecDeque::new(),
        }
    }

    pub fn inline(collaborator: impl DialogueCollaborator + 'static, seed: u64) -> Self {
        Self {
            backend: Backend::Inline {
                collaborator: Box::new(collaborator),
                rng: StdRng::seed_from_u64(seed),
                pending: Vec::new(),
            },
            posted: VecDeque::new(),
        }
    }

    /// Run `collaborator` on its own thread.
    pub fn spawn_worker(collaborator: impl DialogueCollaborator + 'static, seed: u64) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<DialogueRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<DialogueReply>();
        let handle = std::thread::spawn(move || {
            let mut collaborator = collaborator;
            let mut rng = StdRng::seed_from_u64(seed);
            while let Ok(request) = req_rx.recv() {
                let reply = fulfill_request(&mut collaborator, &request, &mut rng);
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
        });
        Self {
            backend: Backend::Worker {
                tx: Some(req_tx),
                rx: reply_rx,
                handle: Some(handle),
            },
            posted: VecDeque::new(),
        }
    }

    pub fn submit(&mut self, request: DialogueRequest) {
        match &mut self.backend {
            Backend::Detached { outbox } => outbox.push(request),
            Backend::Inline { pending, .. } => pending.push(request),
            Backend::Worker { tx, .. } => {
                let sent = tx.as_ref().is_some_and(|tx| tx.send(request.clone()).is_ok());
                if !sent {
                    log::warn!("Dialogue worker gone, answering {} locally", request.npc_id);
                    let mut rng = StdRng::seed_from_u64(request.seq);
                    let reply = fulfill_request(&mut UnavailableCollaborator, &request, &mut rng);
                    self.posted.push_back(reply);
                }
            }
        }
    }

    /// Requests waiting for a detached host. Empty for other modes.
    pub fn take_outgoing(&mut self) -> Vec<DialogueRequest> {
        match &mut self.backend {
            Backend::Detached { outbox } => std::mem::take(outbox),
            _ => Vec::new(),
        }
    }

    /// Hand a reply back from outside. Applied at the next drain.
    pub fn post_reply(&mut self, reply: DialogueReply) {
        self.posted.push_back(reply);
    }

    /// Collect every reply available right now, without waiting.
    pub fn drain(&mut self) -> Vec<DialogueReply> {
        let mut out: Vec<DialogueReply> = self.posted.drain(..).collect();
        match &mut self.backend {
            Backend::Detached { .. } => {}
            Backend::Inline {
                collaborator,
                rng,
                pending,
            } => {
                for request in pending.drain(..) {
                    out.push(fulfill_request(collaborator.as_mut(), &request, rng));
                }
            }
            Backend::Worker { rx, .. } => {
                while let Ok(reply) = rx.try_recv() {
                    out.push(reply);
                }
            }
        }
        out
    }
}

impl Default for DialogueBroker {
    fn default() -> Self {
        Self::detached()
    }
}

impl Drop for DialogueBroker {
    fn drop(&mut self) {
        if let Backend::Worker { tx, handle, .. } = &mut self.backend {
            // Closing the request channel ends the worker loop
            tx.take();
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn request(npc_id: &str, kind: Kind) -> DialogueRequest {
        DialogueRequest {
            seq: 7,
            npc_id: npc_id.into(),
            npc_name: "名字".into(),
            location: "校门口".into(),
            kind,
            persona: None,
            voice: DEFAULT_VOICE.into(),
            lecture: None,
        }
    }

    /// Scripted collaborator that counts calls.
    #[derive(Default)]
    struct Echo {
        dialogue_calls: usize,
        speech_calls: usize,
    }

    impl DialogueCollaborator for Echo {
        fn request_dialogue(&mut self, request: &DialogueRequest) -> Result<String, CollaboratorError> {
            self.dialogue_calls += 1;
            Ok(format!("（笑）我是{}", request.npc_name))
        }

        fn request_speech(&mut self, text: &str, _voice: &str) -> Result<Option<Vec<u8>>, CollaboratorError> {
            self.speech_calls += 1;
            Ok(Some(text.as_bytes().to_vec()))
        }
    }

    #[test]
    fn animals_answer_locally() {
        let mut echo = Echo::default();
        let mut rng = StdRng::seed_from_u64(1);
        let reply = fulfill_request(&mut echo, &request("dog_1", Kind::Dog), &mut rng);
        assert_eq!(reply.text, "汪汪！");
        assert_eq!(echo.dialogue_calls, 0);
        assert_eq!(reply.seq, 7);
    }

    #[test]
    fn unavailable_collaborator_falls_back_by_id() {
        let mut rng = StdRng::seed_from_u64(1);
        let reply = fulfill_request(&mut UnavailableCollaborator, &request("guard", Kind::Npc), &mut rng);
        assert!(lines_for("guard").unwrap().contains(&reply.text.as_str()));
        assert!(reply.audio.is_none());
    }

    #[test]
    fn lecture_wins_over_id_table() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut req = request("teacher_math", Kind::Npc);
        req.lecture = Some(Lesson::Math);
        assert_eq!(fallback_line(&req, &mut rng), "大家算一算，5加7等于多少？");
    }

    #[test]
    fn persona_keywords_pick_a_line() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut req = request("student_4", Kind::Npc);
        assert_eq!(fallback_line(&req, &mut rng), "你好呀！");
        req.persona = Some("运动健将，最爱打球".into());
        assert_eq!(fallback_line(&req, &mut rng), "好想去操场跑步啊！");
        req.persona = Some("安静的普通人".into());
        assert_eq!(fallback_line(&req, &mut rng), "今天天气真不错！");
    }

    #[test]
    fn stage_directions_are_not_spoken() {
        assert_eq!(clean_speech_text("（推眼镜）数学是思维的体操"), "数学是思维的体操");
        assert_eq!(clean_speech_text("Hi (waves) there"), "Hi  there");
        assert_eq!(clean_speech_text("（嚼嚼）"), "");
        assert_eq!(clean_speech_text("半个（括号"), "半个（括号");
    }

    #[test]
    fn speech_uses_cleaned_text() {
        let mut echo = Echo::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut req = request("student_2", Kind::Npc);
        req.npc_name = "小红".into();
        let reply = fulfill_request(&mut echo, &req, &mut rng);
        assert_eq!(reply.text, "（笑）我是小红");
        assert_eq!(reply.audio.as_deref(), Some("我是小红".as_bytes()));
    }

    #[test]
    fn cache_reuses_lines_and_speech() {
        let mut cached = CachedCollaborator::new(Echo::default(), 5);
        let req = request("student_2", Kind::Npc);
        for _ in 0..20 {
            cached.request_dialogue(&req).unwrap();
            cached.request_speech("你好", "Kore").unwrap();
        }
        assert_eq!(cached.cached_lines(), 1);
        // Roughly 30% regenerate; far fewer than 20 calls either way
        assert!(cached.inner().dialogue_calls < 20);
        assert_eq!(cached.inner().speech_calls, 1);
    }

    #[test]
    fn inline_broker_answers_on_drain() {
        let mut broker = DialogueBroker::inline(UnavailableCollaborator, 3);
        broker.submit(request("cat_1", Kind::Cat));
        let replies = broker.drain();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "喵~");
        assert!(broker.drain().is_empty());
    }

    #[test]
    fn detached_broker_round_trips_through_host() {
        let mut broker = DialogueBroker::detached();
        broker.submit(request("guard", Kind::Npc));
        let outgoing = broker.take_outgoing();
        assert_eq!(outgoing.len(), 1);
        assert!(broker.drain().is_empty());

        broker.post_reply(DialogueReply {
            seq: outgoing[0].seq,
            npc_id: outgoing[0].npc_id.clone(),
            speaker: "保安叔叔".into(),
            text: "早上好！".into(),
            audio: None,
        });
        assert_eq!(broker.drain().len(), 1);
    }

    #[test]
    fn worker_broker_replies_without_blocking_submit() {
        let mut broker = DialogueBroker::spawn_worker(Echo::default(), 3);
        broker.submit(request("student_3", Kind::Npc));

        let start = Instant::now();
        let mut replies = Vec::new();
        while replies.is_empty() && start.elapsed() < Duration::from_secs(5) {
            replies = broker.drain();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "（笑）我是名字");
    }
}
