//! Botfield Headless Mission Harness
//!
//! Drives the runtime through scripted scenarios without a renderer and
//! checks the properties the game relies on.
//! Runs entirely in-process - levels come from memory, saves go to a
//! temporary directory.
//!
//! Usage:
//!   cargo run -p botfield-simtest
//!   cargo run -p botfield-simtest -- --verbose

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use botfield_core::clock::{Clock, ManualTimeSource};
use botfield_core::components::Brain;
use botfield_core::event::{keys, Event, EventType, InputSlot, MouseButton};
use botfield_core::graphics::{run_render_loop, HeadlessDevice};
use botfield_core::level::MemoryLevelProvider;
use botfield_core::math::{Point, Vec3};
use botfield_core::persistence;
use botfield_core::prelude::{Application, MissionOrchestrator, RuntimeConfig};
use botfield_core::script::BasicScriptHost;
use botfield_logic::end_mission::MissionResult;
use botfield_logic::mission::{LevelCategory, LevelId};
use botfield_logic::object_type::ObjectType;
use botfield_logic::phase::Phase;

// ── Levels ──────────────────────────────────────────────────────────────

const FIELD: &str = "\
Title text=\"Harness field\"
Instructions name=\"field.txt\"
TerrainGenerate
TerrainCreate
BeginObject
CreateObject type=Me pos=0;0
CreateObject type=WheeledGrabber pos=10;10 select=1
CreateObject type=TrackedGrabber pos=-10;10
CreateObject type=TitaniumOre pos=4;4
CreateObject type=AlienAnt pos=-60;-60
EndMissionTake pos=0;0 dist=1000 type=Me lost=0
EndMissionTake pos=0;0 dist=1000 type=AlienAnt min=0 max=0
EndMissionDelay win=0.5 lost=0.5
";

const ARENA: &str = "\
Title text=\"Harness arena\"
TerrainGenerate
TerrainCreate
TeamName team=1 name=\"Blue\"
TeamName team=2 name=\"Red\"
BeginObject
CreateObject type=WheeledGrabber pos=-40;0 team=1 select=1
CreateObject type=WheeledGrabber pos=40;0 team=2
EndMissionTake pos=0;0 dist=1000 type=WheeledGrabber team=1 winTeam=1 lost=0
EndMissionTake pos=0;0 dist=1000 type=WheeledGrabber team=2 winTeam=2 lost=0
";

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
    println!("=== Botfield Mission Harness ===\n");

    let save_root = std::env::temp_dir().join(format!("botfield-simtest-{}", std::process::id()));
    let mut results = Vec::new();

    // 1. Clock timelines
    results.extend(validate_clock(verbose));

    // 2. Level loading and selection
    results.extend(validate_loading(&save_root, verbose));

    // 3. Phase machine
    results.extend(validate_phases(&save_root, verbose));

    // 4. Console and interaction modes
    results.extend(validate_console(&save_root, verbose));

    // 5. End of mission
    results.extend(validate_end_mission(&save_root, verbose));

    // 6. Save and restore
    results.extend(validate_save_restore(&save_root, verbose));

    // 7. Autosave rotation
    results.extend(validate_autosave(&save_root, verbose));

    // 8. Random input stress through the main loop
    results.extend(validate_stress(&save_root, verbose));

    // 9. Render handshake
    results.extend(validate_render_gate(verbose));

    let _ = std::fs::remove_dir_all(&save_root);

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

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);
    log::info!("Harness finished: {} of {} scenarios passed", passed, total);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn mission() -> LevelId {
    LevelId::new(LevelCategory::Missions, 1, 1)
}

fn orchestrator(save_root: &PathBuf, tag: &str, level: &str, scripts: BasicScriptHost) -> MissionOrchestrator {
    let provider = MemoryLevelProvider::new().with_level(&mission(), level);
    let config = RuntimeConfig {
        save_dir: save_root.join(tag),
        ..Default::default()
    };
    let mut orch = MissionOrchestrator::new(config, Box::new(provider), Box::new(scripts)).with_seed(3);
    orch.select_level(mission());
    orch
}

fn in_simul(save_root: &PathBuf, tag: &str, level: &str) -> MissionOrchestrator {
    let mut orch = orchestrator(save_root, tag, level, BasicScriptHost::new());
    orch.change_phase(Phase::Simul);
    orch
}

fn kill_first(orch: &mut MissionOrchestrator, ty: ObjectType) -> bool {
    match orch.world.registry.first_of_type(ty) {
        Some(e) => {
            orch.world.registry.destroy(e);
            orch.world.registry.sweep();
            true
        }
        None => false,
    }
}

// ── 1. Clock ────────────────────────────────────────────────────────────

fn validate_clock(verbose: bool) -> Vec<TestResult> {
    println!("--- Clock ---");
    let mut results = Vec::new();

    let source = ManualTimeSource::new();
    let mut clock = Clock::new(Box::new(source.clone()));
    let mut rng = StdRng::seed_from_u64(1);
    let (mut last_real, mut last_exact) = (0, 0);
    let mut monotonic = true;
    for _ in 0..5_000 {
        match rng.gen_range(0..12) {
            0 => clock.set_speed(rng.gen_range(0.0..6.0)),
            1 => clock.suspend(),
            2 => clock.resume(),
            3 => clock.reset_time_after_loading(),
            _ => {}
        }
        source.advance_ns(rng.gen_range(0..40_000_000));
        let t = clock.tick();
        monotonic &= t.real_abs_ns >= last_real && t.exact_abs_ns >= last_exact;
        last_real = t.real_abs_ns;
        last_exact = t.exact_abs_ns;
    }
    results.push(TestResult::new(
        "clock_monotonic",
        monotonic,
        format!("5000 random ticks, real {} ms", last_real / 1_000_000),
    ));

    let before = clock.times();
    clock.suspend();
    clock.resume();
    results.push(TestResult::new(
        "clock_suspend_resume_noop",
        clock.times() == before,
        "suspend + resume without tick keeps both timelines",
    ));

    let source = ManualTimeSource::new();
    let mut clock = Clock::new(Box::new(source.clone()));
    clock.set_speed(3.0);
    source.advance_ms(100);
    clock.tick();
    clock.set_speed(1.0);
    source.advance_ms(100);
    clock.tick();
    let exact_ms = clock.exact_abs_ns() / 1_000_000;
    if verbose {
        println!("  scaled time after 3x then 1x: {} ms", exact_ms);
    }
    results.push(TestResult::new(
        "clock_speed_not_retroactive",
        exact_ms == 400,
        format!("{} ms scaled for 200 ms real", exact_ms),
    ));

    results
}

// ── 2. Loading ──────────────────────────────────────────────────────────

fn validate_loading(save_root: &PathBuf, verbose: bool) -> Vec<TestResult> {
    println!("--- Loading ---");
    let mut results = Vec::new();

    let level = "TerrainGenerate\nTerrainCreate\nBeginObject\n\
                 CreateObject type=TitaniumOre pos=1;0;1\n\
                 CreateObject type=Me pos=1;0;1 select=1\n";
    let orch = in_simul(save_root, "load-select", level);
    let registry = &orch.world.registry;
    let ore = registry.first_of_type(ObjectType::Stone);
    let human = registry.first_of_type(ObjectType::Human);
    results.push(TestResult::new(
        "load_two_objects_select_second",
        registry.len() == 2
            && orch.selected().is_some()
            && orch.selected() == human
            && ore.map_or(false, |e| !registry.flags(e).selected),
        format!("{} objects, selected {:?}", registry.len(), orch.selected()),
    ));

    let orch = in_simul(save_root, "load-field", FIELD);
    let cells = orch
        .world
        .registry
        .all()
        .into_iter()
        .filter(|e| orch.world.registry.object_type(*e) == Some(ObjectType::Power))
        .count();
    if verbose {
        println!("  field: {} objects, {} power cells", orch.world.registry.len(), cells);
    }
    results.push(TestResult::new(
        "load_vehicles_get_power_cells",
        cells == 2,
        format!("{} power cells for 2 vehicles", cells),
    ));

    let mut orch = orchestrator(save_root, "load-missing", FIELD, BasicScriptHost::new());
    orch.select_level(LevelId::new(LevelCategory::Missions, 4, 4));
    orch.change_phase(Phase::Simul);
    results.push(TestResult::new(
        "load_missing_level_safe_phase",
        orch.phase() == Phase::LevelList && !orch.world_exists(),
        format!("ended in {:?}", orch.phase()),
    ));

    results
}

// ── 3. Phases ───────────────────────────────────────────────────────────

fn validate_phases(save_root: &PathBuf, _verbose: bool) -> Vec<TestResult> {
    println!("--- Phase machine ---");
    let mut orch = orchestrator(save_root, "phases", FIELD, BasicScriptHost::new());
    let mut transitions = 0;
    let mut broken = Vec::new();
    for from in Phase::all() {
        for to in Phase::all() {
            if to.is_simulation_config() && !from.is_simulation_config() && from != Phase::Simul {
                continue;
            }
            if from.is_simulation_config() {
                orch.change_phase(Phase::Simul);
            }
            orch.change_phase(from);
            orch.change_phase(to);
            transitions += 1;
            if orch.world_exists() != orch.phase().has_world() {
                broken.push(format!("{:?}->{:?}", from, to));
            }
        }
    }
    vec![TestResult::new(
        "phase_world_invariant",
        broken.is_empty(),
        if broken.is_empty() {
            format!("{} transitions checked", transitions)
        } else {
            format!("broken after {}", broken.join(", "))
        },
    )]
}

// ── 4. Console ──────────────────────────────────────────────────────────

fn validate_console(save_root: &PathBuf, _verbose: bool) -> Vec<TestResult> {
    println!("--- Console and modes ---");
    let mut results = Vec::new();
    let mut orch = in_simul(save_root, "console", FIELD);

    orch.take_events();
    orch.execute_cmd("winmission");
    let wins = orch
        .take_events()
        .iter()
        .filter(|e| e.event_type == EventType::Win)
        .count();
    results.push(TestResult::new(
        "console_winmission_posts_win",
        wins == 1,
        format!("{} win events posted", wins),
    ));

    orch.execute_cmd("no-such-verb");
    results.push(TestResult::new(
        "console_unknown_verb_notice",
        orch.world.display.contains("Unknown command"),
        "unknown verb shows an error notice",
    ));

    orch.execute_cmd("photo1");
    let in_photo = orch.is_simulation_paused();
    orch.execute_cmd("photo1");
    results.push(TestResult::new(
        "console_photo_round_trip",
        in_photo && !orch.is_simulation_paused(),
        "photo mode pauses and resumes",
    ));

    let first = orch.selected();
    let moved = orch.select_next();
    let second = orch.selected();
    orch.deselect_object();
    results.push(TestResult::new(
        "selection_history_returns",
        moved && second != first && orch.selected() == first,
        format!("{:?} -> {:?} -> {:?}", first, second, orch.selected()),
    ));

    results
}

// ── 5. End of mission ───────────────────────────────────────────────────

fn validate_end_mission(save_root: &PathBuf, verbose: bool) -> Vec<TestResult> {
    println!("--- End of mission ---");
    let mut results = Vec::new();

    let mut orch = in_simul(save_root, "end-global", FIELD);
    let running = orch.check_end_mission(true);
    kill_first(&mut orch, ObjectType::Ant);
    let won = orch.check_end_mission(false);
    let messages = orch.world.display.messages().count();
    let again = orch.check_end_mission(false);
    results.push(TestResult::new(
        "end_global_win_idempotent",
        running == MissionResult::NotTerminated
            && won == MissionResult::Won
            && again == won
            && orch.world.display.messages().count() == messages,
        format!("{:?} then {:?}/{:?}", running, won, again),
    ));

    let mut orch = in_simul(save_root, "end-teams", ARENA);
    let red = orch
        .world
        .registry
        .all()
        .into_iter()
        .find(|e| orch.world.registry.team(*e) == 2);
    if let Some(red) = red {
        orch.world.registry.destroy(red);
        orch.world.registry.sweep();
    }
    orch.check_end_mission(true);
    orch.check_end_mission(true);
    let broadcasts = orch
        .world
        .display
        .messages()
        .filter(|m| m.text.contains("Red lost!"))
        .count();
    if verbose {
        for m in orch.world.display.messages() {
            println!("  display: {}", m.text);
        }
    }
    results.push(TestResult::new(
        "end_team_defeat_broadcast_once",
        broadcasts == 1 && orch.world.registry.team_exists(1),
        format!("{} broadcasts", broadcasts),
    ));

    results
}

// ── 6. Save / restore ───────────────────────────────────────────────────

fn start_program(orch: &mut MissionOrchestrator) -> bool {
    let Some(bot) = orch.world.registry.first_of_type(ObjectType::MobileWa) else {
        return false;
    };
    let Some(mut brain) = orch.world.registry.get_mut::<Brain>(bot) else {
        return false;
    };
    let program = botfield_core::components::Program {
        source: "extern void object::Patrol() { while (true) { move(5); turn(90); } }".to_string(),
        filename: "patrol.txt".to_string(),
        compiled: true,
        runnable: true,
        ..Default::default()
    };
    let slot = brain.add_program(program);
    brain.run_program(slot);
    for _ in 0..3 {
        brain.step();
    }
    true
}

fn stack_instruction(orch: &MissionOrchestrator) -> Option<u64> {
    let bot = orch.world.registry.first_of_type(ObjectType::MobileWa)?;
    let brain = orch.world.registry.get::<Brain>(bot)?;
    brain.stack.as_ref().map(|s| s.instruction)
}

fn validate_save_restore(save_root: &PathBuf, verbose: bool) -> Vec<TestResult> {
    println!("--- Save / restore ---");
    let mut results = Vec::new();

    let mut orch = in_simul(save_root, "save", FIELD);
    let moved_to = Vec3::new(21.0, 0.0, -7.0);
    if let Some(bot) = orch.world.registry.first_of_type(ObjectType::MobileWa) {
        orch.world.registry.set_position(bot, moved_to);
    }
    let program_started = start_program(&mut orch);
    let dir = orch.config.player_dir().join("harness");
    let saved = orch.save_scene(&dir, "harness save");
    if let Err(e) = &saved {
        results.push(TestResult::new("save_write", false, e.to_string()));
        return results;
    }
    let before = orch.world.registry.len();

    orch.change_phase(Phase::LevelList);
    let loaded = orch.load_scene(&dir);
    let position = orch
        .world
        .registry
        .first_of_type(ObjectType::MobileWa)
        .and_then(|e| orch.world.registry.position(e));
    if verbose {
        println!("  restored {} of {} objects", orch.world.registry.len(), before);
    }
    results.push(TestResult::new(
        "save_round_trip_objects",
        loaded.is_ok()
            && orch.phase() == Phase::Simul
            && orch.world.registry.len() == before
            && position.map_or(false, |p| p.approx_eq(&moved_to, 1e-3)),
        format!("{} objects, grabber at {:?}", orch.world.registry.len(), position),
    ));
    results.push(TestResult::new(
        "save_round_trip_stack",
        program_started && stack_instruction(&orch) == Some(3),
        format!("stack instruction {:?}", stack_instruction(&orch)),
    ));

    let mut newer = orchestrator(save_root, "save", FIELD, BasicScriptHost::with_version(99));
    let loaded = newer.load_scene(&dir);
    results.push(TestResult::new(
        "save_stack_version_mismatch",
        loaded.is_ok() && stack_instruction(&newer).map_or(true, |i| i == 0),
        format!("stack instruction {:?} under another interpreter", stack_instruction(&newer)),
    ));

    results
}

// ── 7. Autosave ─────────────────────────────────────────────────────────

fn validate_autosave(save_root: &PathBuf, _verbose: bool) -> Vec<TestResult> {
    println!("--- Autosave ---");
    let mut results = Vec::new();
    let mut orch = in_simul(save_root, "autosave", FIELD);
    let player_dir = orch.config.player_dir();

    let mut dense = true;
    for slots in [3, 2, 4, 1] {
        orch.set_autosave_slots(slots);
        for _ in 0..4 {
            if orch.autosave().is_err() {
                dense = false;
            }
            let existing = persistence::autosave_slots(&player_dir);
            let expected: Vec<i32> = (1..=existing.len() as i32).collect();
            dense &= existing == expected && existing.len() as i32 <= slots;
        }
    }
    results.push(TestResult::new(
        "autosave_dense_and_bounded",
        dense,
        "slots stay 1..=n with n <= cap",
    ));

    orch.set_autosave(false);
    results.push(TestResult::new(
        "autosave_disable_clears",
        persistence::autosave_slots(&player_dir).is_empty(),
        "disabling removes every autosave",
    ));

    results
}

// ── 8. Stress ───────────────────────────────────────────────────────────

fn validate_stress(save_root: &PathBuf, verbose: bool) -> Vec<TestResult> {
    println!("--- Stress ---");
    let orch = in_simul(save_root, "stress", FIELD);
    let source = ManualTimeSource::new();
    let mut app = Application::new(Clock::new(Box::new(source.clone())), orch);
    let mut rng = StdRng::seed_from_u64(99);
    let slots = [
        InputSlot::Camera,
        InputSlot::Desel,
        InputSlot::Next,
        InputSlot::Human,
        InputSlot::Pause,
        InputSlot::Speed20,
        InputSlot::Speed10,
        InputSlot::Visit,
    ];

    let mut invariant = true;
    let mut frames = 0;
    for _ in 0..3_000 {
        match rng.gen_range(0..6) {
            0 => app.push_event(Event::slot(slots[rng.gen_range(0..slots.len())])),
            1 => {
                let pos = Point::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
                app.push_event(Event::mouse_down(MouseButton::Left, pos));
                app.push_event(Event::mouse_up(MouseButton::Left, pos));
            }
            2 => app.push_event(Event::mouse_move(Point::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))),
            3 if rng.gen_bool(0.05) => app.push_event(Event::key_down(keys::ESCAPE, None)),
            _ => {}
        }
        source.advance_ms(rng.gen_range(5..40));
        app.run_frame();
        frames += 1;
        let orch = &app.orchestrator;
        invariant &= orch.world_exists() == orch.phase().has_world();
        if orch.phase() != Phase::Simul {
            app.orchestrator.change_phase(Phase::Simul);
        }
    }
    if verbose {
        println!(
            "  {} frames, game time {:.1} s, phase {:?}",
            frames,
            app.orchestrator.game_time(),
            app.orchestrator.phase()
        );
    }
    vec![TestResult::new(
        "stress_random_input",
        invariant && app.frame_count() == frames,
        format!("{} frames without breaking the phase/world invariant", frames),
    )]
}

// ── 9. Render gate ──────────────────────────────────────────────────────

fn validate_render_gate(_verbose: bool) -> Vec<TestResult> {
    println!("--- Render gate ---");
    let save_root = std::env::temp_dir().join(format!("botfield-simtest-render-{}", std::process::id()));
    let orch = in_simul(&save_root, "render", FIELD);
    let source = ManualTimeSource::new();
    let mut app = Application::new(Clock::new(Box::new(source.clone())), orch);

    let gate = app.frame_gate();
    let render_gate = Arc::clone(&gate);
    let renderer = std::thread::spawn(move || {
        let mut device = HeadlessDevice::new();
        let frames = run_render_loop(&render_gate, &mut device);
        (frames, device.primitives)
    });

    let mut in_time = true;
    for _ in 0..30 {
        source.advance_ms(16);
        app.run_frame();
        in_time &= gate.wait_finished_timeout(gate.last_requested(), Duration::from_secs(5));
    }
    gate.close();
    let outcome = renderer.join();
    let _ = std::fs::remove_dir_all(&save_root);

    match outcome {
        Ok((frames, primitives)) => vec![TestResult::new(
            "render_gate_serves_every_frame",
            in_time && frames == 30,
            format!("{} frames, {} primitives drawn", frames, primitives),
        )],
        Err(_) => vec![TestResult::new("render_gate_serves_every_frame", false, "render thread panicked")],
    }
}
