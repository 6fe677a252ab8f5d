//! Schoolday Headless Simulation Harness
//!
//! Plays a scripted school day against the engine with a manual clock and
//! the offline dialogue collaborator, and checks the day's invariants.
//! Runs entirely in-process: no rendering, no audio, no network.
//!
//! Usage:
//!   cargo run -p schoolday-simtest
//!   cargo run -p schoolday-simtest -- --verbose
//!   cargo run -p schoolday-simtest -- --config overrides.json --dump snapshot.json

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use schoolday_core::components::Role;
use schoolday_core::config::SimConfig;
use schoolday_core::events::SimEvent;
use schoolday_core::maps::MapId;
use schoolday_core::systems::{BookChoice, DialogueBroker, UnavailableCollaborator, PLACEHOLDER};
use schoolday_core::SimulationEngine;
use schoolday_logic::constants::anchors;
use schoolday_logic::geometry::{overlaps, Point};
use schoolday_logic::schedule::{HomeworkStatus, Lesson};
use schoolday_logic::timer::ManualClock;

const FRAME_MS: u64 = 16;
const DEFAULT_SEED: u64 = 42;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

struct Args {
    verbose: bool,
    config: Option<PathBuf>,
    dump: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        verbose: false,
        config: None,
        dump: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" => args.verbose = true,
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--dump" => args.dump = Some(iter.next().context("--dump needs a path")?.into()),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SimConfig::from_json_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    config.seed.get_or_insert(DEFAULT_SEED);
    Ok(config)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = parse_args()?;
    let config = load_config(args.config.as_ref())?;
    let verbose = args.verbose;
    println!("=== Schoolday Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Config validation
    results.extend(validate_config(verbose));

    // 2. Map templates
    results.extend(validate_maps(&config, verbose));

    // 3. Lesson sequence and teacher swaps
    results.extend(validate_lessons(&config, verbose));

    // 4. PE line-up, formation, dismissal
    results.extend(validate_pe(&config, verbose));

    // 5. Curfew watchdog
    results.extend(validate_curfew(&config, verbose));

    // 6. Homework, sleep, new day
    results.extend(validate_evening(&config, verbose));

    // 7. Morning queue
    results.extend(validate_morning_queue(&config, verbose));

    // 8. Pointer input and movement
    results.extend(validate_movement(&config, verbose));

    // 9. Dialogue broker
    results.extend(validate_dialogue(&config, verbose));

    if let Some(path) = &args.dump {
        dump_snapshot(&config, path)?;
        println!("\nSnapshot written to {}", path.display());
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── Driver ──────────────────────────────────────────────────────────────

/// Engine plus a hand-driven clock and the events seen so far.
struct Driver {
    engine: SimulationEngine,
    clock: ManualClock,
    events: Vec<SimEvent>,
}

impl Driver {
    fn new(config: &SimConfig) -> anyhow::Result<Self> {
        Ok(Self::with_engine(SimulationEngine::new(config.clone())?))
    }

    fn with_engine(engine: SimulationEngine) -> Self {
        Self {
            engine,
            clock: ManualClock::new(0),
            events: Vec::new(),
        }
    }

    fn step(&mut self, ms: u64) {
        self.clock.advance(ms);
        self.engine.tick_with(&self.clock);
        self.events.extend(self.engine.drain_events());
    }

    /// Tick until `done` holds. Returns whether it did within `max_ticks`.
    fn run_until(&mut self, max_ticks: usize, ms: u64, mut done: impl FnMut(&SimulationEngine) -> bool) -> bool {
        for _ in 0..max_ticks {
            if done(&self.engine) {
                return true;
            }
            self.step(ms);
        }
        done(&self.engine)
    }

    fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

fn classroom_teachers(engine: &SimulationEngine) -> usize {
    engine
        .map(MapId::Classroom)
        .map(|m| m.teacher_ids().len())
        .unwrap_or(0)
}

fn sit_at_my_desk(d: &mut Driver) -> bool {
    d.engine.interact_with("portal_class").applied() && d.engine.interact_with("desk_1").applied()
}

/// Chinese, Math, English. Returns the lessons seen and the most teachers
/// ever present at once.
fn attend_morning_lessons(d: &mut Driver) -> (Vec<Lesson>, usize) {
    let mut seen = vec![d.engine.day().current_lesson];
    let mut max_teachers = classroom_teachers(&d.engine);
    for _ in 0..3 {
        d.engine.start_class();
        d.engine.end_class();
        d.run_until(2_000, FRAME_MS, |e| {
            max_teachers = max_teachers.max(classroom_teachers(e));
            !e.day().is_teacher_transitioning()
        });
        seen.push(d.engine.day().current_lesson);
    }
    (seen, max_teachers)
}

fn line_up_for_pe(d: &mut Driver) -> bool {
    d.engine.start_class();
    d.engine.walk_to(anchors::line_up_gap());
    d.run_until(1_000, FRAME_MS, |e| e.current_map() == MapId::Playground)
}

fn play_until_dismissal(d: &mut Driver) -> bool {
    sit_at_my_desk(d);
    attend_morning_lessons(d);
    line_up_for_pe(d) && d.engine.end_class().applied()
}

fn go_to_bed(d: &mut Driver) -> bool {
    d.engine.select_book(BookChoice::Homework);
    d.run_until(200, 100, |e| e.day().homework == HomeworkStatus::Done);
    d.engine.interact_with("bed_my").applied() && d.run_until(200, 100, |e| e.day().day == 2)
}

fn walk_to_dorm_room(d: &mut Driver) -> bool {
    d.engine.interact_with("portal_dorm_hall").applied() && d.engine.interact_with("door_my_dorm").applied()
}

fn driver_or_fail(config: &SimConfig, results: &mut Vec<TestResult>, section: &str) -> Option<Driver> {
    match Driver::new(config) {
        Ok(d) => Some(d),
        Err(e) => {
            results.push(check(&format!("{section}_engine"), false, format!("engine failed to start: {e}")));
            None
        }
    }
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config(_verbose: bool) -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();

    results.push(match SimConfig::default().validate() {
        Ok(()) => check("config_defaults_valid", true, "default config validates"),
        Err(e) => check("config_defaults_valid", false, e.to_string()),
    });

    results.push(match SimConfig::from_json_str(r#"{"curfew_timeout_ms": 5000}"#) {
        Ok(c) => check(
            "config_partial_override",
            c.curfew_timeout_ms == 5_000 && c.homework_ms == SimConfig::default().homework_ms,
            format!("curfew {} ms, homework {} ms", c.curfew_timeout_ms, c.homework_ms),
        ),
        Err(e) => check("config_partial_override", false, e.to_string()),
    });

    let rejected = SimConfig::from_json_str(r#"{"player_speed": 1.0}"#);
    results.push(check(
        "config_rejects_slow_player",
        rejected.is_err(),
        match rejected {
            Err(e) => e.to_string(),
            Ok(_) => "slower player accepted".into(),
        },
    ));

    results.push(check(
        "config_rejects_bad_json",
        SimConfig::from_json_str("{").is_err(),
        "malformed JSON is a parse error",
    ));

    results
}

// ── 2. Maps ─────────────────────────────────────────────────────────────

fn validate_maps(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Maps ---");
    let mut results = Vec::new();
    let Some(d) = driver_or_fail(config, &mut results, "maps") else {
        return results;
    };

    let missing: Vec<MapId> = MapId::ALL
        .into_iter()
        .filter(|id| d.engine.map(*id).is_err())
        .collect();
    results.push(check(
        "maps_all_registered",
        missing.is_empty(),
        format!("{} maps, missing {:?}", MapId::ALL.len() - missing.len(), missing),
    ));

    let mut bad_spawns = Vec::new();
    let mut bad_portals = Vec::new();
    for id in MapId::ALL {
        let Ok(map) = d.engine.map(id) else { continue };
        if overlaps(map.spawn_point, &map.walls) {
            bad_spawns.push(id);
        }
        for portal in map.portals() {
            let clear = d
                .engine
                .map(portal.link.target_map)
                .is_ok_and(|t| !overlaps(portal.link.target_pos, &t.walls));
            if !clear {
                bad_portals.push(portal.id.clone());
            }
            if verbose {
                println!("    {id}: {} -> {}", portal.id, portal.link.target_map);
            }
        }
    }
    results.push(check(
        "maps_spawns_clear",
        bad_spawns.is_empty(),
        format!("spawns inside walls: {bad_spawns:?}"),
    ));
    results.push(check(
        "maps_portal_landings_clear",
        bad_portals.is_empty(),
        format!("bad landings: {bad_portals:?}"),
    ));

    let students = d
        .engine
        .map(MapId::Classroom)
        .map(|m| m.count_role(Role::is_student))
        .unwrap_or(0);
    results.push(check(
        "maps_classroom_full",
        students == d.engine.roster().len() && students > 0,
        format!("{students} classmates seated"),
    ));

    let roommates = d
        .engine
        .map(MapId::DormRoom)
        .map(|m| m.count_role(Role::is_roommate))
        .unwrap_or(0);
    results.push(check("maps_roommates", roommates == 5, format!("{roommates} roommates")));

    results
}

// ── 3. Lessons ──────────────────────────────────────────────────────────

fn validate_lessons(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Lessons ---");
    let mut results = Vec::new();
    let Some(mut d) = driver_or_fail(config, &mut results, "lessons") else {
        return results;
    };

    results.push(check(
        "lessons_need_a_desk",
        !d.engine.start_class().applied(),
        "start_class refused away from the classroom",
    ));

    results.push(check("lessons_seated", sit_at_my_desk(&mut d), "sat at desk_1"));

    let (seen, max_teachers) = attend_morning_lessons(&mut d);
    results.push(check(
        "lessons_in_order",
        seen == Lesson::ORDER.to_vec(),
        format!("{seen:?}"),
    ));
    results.push(check(
        "lessons_one_teacher",
        max_teachers <= 1,
        format!("at most {max_teachers} teacher(s) in the classroom"),
    ));
    results.push(check(
        "lessons_not_over_before_pe",
        !d.engine.day().is_school_over,
        "school still in session before PE",
    ));

    results
}

// ── 4. PE ───────────────────────────────────────────────────────────────

fn validate_pe(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- PE ---");
    let mut results = Vec::new();
    let Some(mut d) = driver_or_fail(config, &mut results, "pe") else {
        return results;
    };

    sit_at_my_desk(&mut d);
    attend_morning_lessons(&mut d);
    let arrived = line_up_for_pe(&mut d);

    results.push(check(
        "pe_formation_reached",
        arrived && d.engine.day().is_in_formation,
        format!("player on {} at {:?}", d.engine.current_map(), d.engine.player().pos),
    ));
    results.push(check(
        "pe_player_at_join_point",
        d.engine.player().pos == anchors::FORMATION_PLAYER,
        format!("{:?}", d.engine.player().pos),
    ));

    let on_court = d
        .engine
        .map(MapId::Playground)
        .map(|m| m.count_role(Role::is_student))
        .unwrap_or(0);
    results.push(check(
        "pe_class_on_playground",
        on_court == d.engine.roster().len(),
        format!("{on_court} classmates in formation"),
    ));

    let dismissed = d.engine.end_class().applied();
    results.push(check(
        "pe_dismissal",
        dismissed && d.engine.day().is_school_over,
        "school over after PE",
    ));

    let before = d.engine.day().clone();
    let again = d.engine.end_class();
    results.push(check(
        "pe_dismissal_saturates",
        !again.applied() && d.engine.day() == &before,
        format!("second end_class: {again:?}"),
    ));

    results
}

// ── 5. Curfew ───────────────────────────────────────────────────────────

fn validate_curfew(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Curfew ---");
    let mut results = Vec::new();
    let Some(mut d) = driver_or_fail(config, &mut results, "curfew") else {
        return results;
    };

    if !play_until_dismissal(&mut d) {
        results.push(check("curfew_setup", false, "could not reach dismissal"));
        return results;
    }

    let timeout_ticks = (config.curfew_timeout_ms / 100) as usize * 3;
    for _ in 0..timeout_ticks {
        d.step(100);
    }
    let escorts = d.count(|e| *e == SimEvent::CurfewEscort);
    results.push(check(
        "curfew_fires_once",
        escorts == 1,
        format!("{escorts} escort(s)"),
    ));
    results.push(check(
        "curfew_lands_at_front_desk",
        d.engine.current_map() == MapId::DormHallway && d.engine.player().pos == anchors::FRONT_DESK,
        format!("player on {} at {:?}", d.engine.current_map(), d.engine.player().pos),
    ));

    results
}

// ── 6. Evening ──────────────────────────────────────────────────────────

fn validate_evening(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Evening ---");
    let mut results = Vec::new();
    let Some(mut d) = driver_or_fail(config, &mut results, "evening") else {
        return results;
    };

    if !walk_to_dorm_room(&mut d) {
        results.push(check("evening_setup", false, "could not reach the dorm room"));
        return results;
    }

    let refused = !d.engine.interact_with("bed_my").applied();
    results.push(check(
        "evening_bed_needs_homework",
        refused && !d.engine.day().is_night,
        d.engine.dialogue().map(|b| b.text.clone()).unwrap_or_default(),
    ));

    let slept = go_to_bed(&mut d);
    let day = d.engine.day();
    results.push(check(
        "evening_new_day",
        slept && day.current_lesson == Lesson::FIRST && !day.is_school_over,
        format!("day {} starts with {:?}", day.day, day.current_lesson),
    ));
    results.push(check(
        "evening_wake_up_blocks_input",
        !d.engine.walk_to(Point::new(400.0, 400.0)).applied(),
        "pointer input ignored behind the wake-up prompt",
    ));

    results
}

// ── 7. Morning queue ────────────────────────────────────────────────────

fn validate_morning_queue(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Morning Queue ---");
    let mut results = Vec::new();
    let Some(mut d) = driver_or_fail(config, &mut results, "queue") else {
        return results;
    };

    if !(walk_to_dorm_room(&mut d) && go_to_bed(&mut d)) {
        results.push(check("queue_setup", false, "could not reach the second morning"));
        return results;
    }
    d.engine.dismiss_wake_up();

    let roommates = |e: &SimulationEngine| {
        e.map(MapId::DormRoom)
            .map(|m| m.count_role(Role::is_roommate))
            .unwrap_or(0)
    };
    let start = roommates(&d.engine);
    let mut remaining = start;
    let mut strictly_decreasing = true;
    let mut refused_while_queued = true;

    while remaining > 0 {
        if d.engine.interact_with("portal_hallway").applied() {
            refused_while_queued = false;
            break;
        }
        if !d.run_until(100, 100, |e| roommates(e) != remaining) {
            strictly_decreasing = false;
            break;
        }
        let now = roommates(&d.engine);
        strictly_decreasing &= now < remaining;
        remaining = now;
    }

    results.push(check(
        "queue_refuses_exit",
        refused_while_queued,
        format!("door refused while {start} roommates queued"),
    ));
    results.push(check(
        "queue_drains",
        strictly_decreasing && remaining == 0,
        format!("{remaining} roommates left"),
    ));
    results.push(check(
        "queue_then_exit",
        d.engine.interact_with("portal_hallway").applied(),
        "door opens once the room is empty",
    ));

    results
}

// ── 8. Movement ─────────────────────────────────────────────────────────

fn validate_movement(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Movement ---");
    let mut results = Vec::new();
    let Some(mut d) = driver_or_fail(config, &mut results, "movement") else {
        return results;
    };

    // Walk into the fences and slide along them, clear of the door portals
    let mut tunnelled = 0;
    for target in [
        Point::new(1390.0, 1190.0),
        Point::new(10.0, 700.0),
        Point::new(700.0, 700.0),
    ] {
        d.engine.walk_to(target);
        for _ in 0..800 {
            d.step(FRAME_MS);
            if let Ok(map) = d.engine.active_map() {
                if overlaps(d.engine.player().pos, &map.walls) {
                    tunnelled += 1;
                }
            }
            if d.engine.player().target.is_none() {
                break;
            }
        }
    }
    results.push(check(
        "movement_no_tunnelling",
        tunnelled == 0,
        format!("{tunnelled} step(s) inside a wall"),
    ));

    // A click on the school facade walks into the classroom
    let camera = d.engine.camera();
    let facade = Point::new(700.0, 400.0);
    d.engine.pointer_click(Point::new(facade.x - camera.x, facade.y - camera.y));
    results.push(check(
        "movement_facade_click",
        d.engine.current_map() == MapId::Classroom,
        format!("player on {}", d.engine.current_map()),
    ));

    results
}

// ── 9. Dialogue ─────────────────────────────────────────────────────────

fn validate_dialogue(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Dialogue ---");
    let mut results = Vec::new();

    let seed = config.seed.unwrap_or(DEFAULT_SEED);
    let broker = DialogueBroker::spawn_worker(UnavailableCollaborator, seed);
    let engine = match SimulationEngine::with_broker(config.clone(), broker) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(check("dialogue_engine", false, e.to_string()));
            return results;
        }
    };
    let mut d = Driver::with_engine(engine);

    d.engine.interact_with("guard");
    let deadline = Instant::now() + Duration::from_secs(2);
    while d.engine.dialogue().is_some_and(|b| b.text == PLACEHOLDER) && Instant::now() < deadline {
        d.step(FRAME_MS);
        std::thread::sleep(Duration::from_millis(5));
    }
    let line = d.engine.dialogue().map(|b| b.text.clone()).unwrap_or_default();
    results.push(check(
        "dialogue_fallback_line",
        !line.is_empty() && line != PLACEHOLDER,
        format!("保安叔叔: {line}"),
    ));

    d.engine.interact_with("c3");
    d.engine.interact_with("c3");
    d.engine.interact_with("c4");
    results.push(check(
        "dialogue_friends_dedup",
        d.engine.friends().len() == 1,
        format!("{} friend(s)", d.engine.friends().len()),
    ));

    results
}

// ── Snapshot dump ───────────────────────────────────────────────────────

fn dump_snapshot(config: &SimConfig, path: &PathBuf) -> anyhow::Result<()> {
    let mut d = Driver::new(config)?;
    play_until_dismissal(&mut d);
    let json = d.engine.snapshot().to_json().context("serializing snapshot")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Dumped day {} at tick {}", d.engine.day().day, d.engine.tick_count());
    Ok(())
}
