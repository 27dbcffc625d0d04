//! Integration tests for the mission orchestrator.
//!
//! Exercises: level text → scene loader → SIMUL → per-frame driver →
//! end-of-mission evaluation → phase transitions → save/restore.
//!
//! Everything runs headless against an in-memory level provider.

use std::path::PathBuf;

use botfield_core::components::Brain;
use botfield_core::prelude::*;
use botfield_core::script::BasicScriptHost;

// ── Helpers ────────────────────────────────────────────────────────────

const FIELD: &str = "\
Title text=\"Proving ground\"
Instructions name=\"ground.txt\"
TerrainGenerate
TerrainCreate
BeginObject
CreateObject type=Me pos=0;0
CreateObject type=WheeledGrabber pos=10;10 select=1
CreateObject type=TitaniumOre pos=4;4
CreateObject type=AlienAnt pos=-20;-20
EndMissionTake pos=0;0 dist=1000 type=Me lost=0
EndMissionTake pos=0;0 dist=1000 type=AlienAnt min=0 max=0
EndMissionDelay win=0.5 lost=0.5
";

const TEAMS: &str = "\
Title text=\"Arena\"
TerrainGenerate
TerrainCreate
TeamName team=1 name=\"Blue\"
TeamName team=2 name=\"Red\"
BeginObject
CreateObject type=Me pos=0;0
CreateObject type=WheeledGrabber pos=-40;0 team=1
CreateObject type=TrackedGrabber pos=40;0 team=2
EndMissionTake pos=0;0 dist=1000 type=WheeledGrabber team=1 winTeam=1 lost=0
EndMissionTake pos=0;0 dist=1000 type=TrackedGrabber team=2 winTeam=2 lost=0
";

fn mission() -> LevelId {
    LevelId::new(LevelCategory::Missions, 1, 1)
}

fn temp_config(tag: &str) -> RuntimeConfig {
    let save_dir = std::env::temp_dir().join(format!("botfield-it-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&save_dir);
    RuntimeConfig {
        save_dir,
        ..Default::default()
    }
}

fn orchestrator(tag: &str, level: &str, scripts: BasicScriptHost) -> MissionOrchestrator {
    let provider = MemoryLevelProvider::new().with_level(&mission(), level);
    let mut orch = MissionOrchestrator::new(temp_config(tag), Box::new(provider), Box::new(scripts)).with_seed(11);
    orch.select_level(mission());
    orch
}

fn in_simul(tag: &str, level: &str) -> MissionOrchestrator {
    let mut orch = orchestrator(tag, level, BasicScriptHost::new());
    orch.change_phase(Phase::Simul);
    assert_eq!(orch.phase(), Phase::Simul);
    orch
}

fn count_messages(orch: &MissionOrchestrator, text: &str) -> usize {
    orch.world.display.messages().filter(|m| m.text.contains(text)).count()
}

fn cleanup(orch: &MissionOrchestrator) {
    let _ = std::fs::remove_dir_all(&orch.config.save_dir);
}

// ── Loading ────────────────────────────────────────────────────────────

#[test]
fn second_create_with_select_is_the_selection() {
    let level = "\
TerrainGenerate
TerrainCreate
BeginObject
CreateObject type=TitaniumOre pos=1;0;1
CreateObject type=Me pos=1;0;1 select=1
";
    let orch = in_simul("select-second", level);
    let registry = &orch.world.registry;
    assert_eq!(registry.len(), 2);
    let first = registry.first_of_type(ObjectType::Stone).unwrap();
    let second = registry.first_of_type(ObjectType::Human).unwrap();
    assert_eq!(orch.selected(), Some(second));
    assert!(registry.flags(second).selected);
    assert!(!registry.flags(first).selected);
    cleanup(&orch);
}

#[test]
fn missing_level_falls_back_without_world() {
    let mut orch = orchestrator("missing", FIELD, BasicScriptHost::new());
    orch.select_level(LevelId::new(LevelCategory::Missions, 9, 9));
    orch.change_phase(Phase::Simul);
    assert_eq!(orch.phase(), Phase::LevelList);
    assert!(!orch.world_exists());
    cleanup(&orch);
}

// ── Phase machine ──────────────────────────────────────────────────────

#[test]
fn world_exists_matches_phase_after_every_transition() {
    let mut orch = orchestrator("phases", FIELD, BasicScriptHost::new());
    for from in Phase::all() {
        for to in Phase::all() {
            // In-mission setup screens are only reachable from a mission
            if to.is_simulation_config() && !from.is_simulation_config() && from != Phase::Simul {
                continue;
            }
            if from.is_simulation_config() {
                orch.change_phase(Phase::Simul);
            }
            orch.change_phase(from);
            orch.change_phase(to);
            assert_eq!(
                orch.world_exists(),
                orch.phase().has_world(),
                "{:?} -> {:?} ended in {:?}",
                from,
                to,
                orch.phase()
            );
        }
    }
    cleanup(&orch);
}

#[test]
fn setup_screens_keep_the_mission() {
    let mut orch = in_simul("setup", FIELD);
    let bot = orch.selected();
    orch.change_phase(Phase::SetupGameSimul);
    assert!(orch.world_exists());
    orch.change_phase(Phase::Simul);
    assert_eq!(orch.selected(), bot);
    cleanup(&orch);
}

// ── End of mission ─────────────────────────────────────────────────────

#[test]
fn team_defeat_is_broadcast_once() {
    let mut orch = in_simul("team-defeat", TEAMS);
    let red = orch.world.registry.first_of_type(ObjectType::MobileTa).unwrap();
    orch.world.registry.destroy(red);
    orch.world.registry.sweep();

    assert_eq!(orch.check_end_mission(true), MissionResult::NotTerminated);
    assert_eq!(orch.check_end_mission(true), MissionResult::NotTerminated);
    orch.frame_update(0.1, 0.1);

    assert_eq!(count_messages(&orch, "Red lost!"), 1);
    assert_eq!(count_messages(&orch, "Blue"), 0);
    assert!(orch.world.registry.team_exists(1));
    assert!(!orch.world.registry.team_exists(2));
    cleanup(&orch);
}

#[test]
fn end_mission_is_idempotent() {
    let mut orch = in_simul("idempotent", FIELD);
    let ant = orch.world.registry.first_of_type(ObjectType::Ant).unwrap();
    orch.world.registry.destroy(ant);
    orch.world.registry.sweep();

    let first = orch.check_end_mission(false);
    let messages = orch.world.display.messages().count();
    let win_delay = orch.win_delay();
    let second = orch.check_end_mission(false);

    assert_eq!(first, MissionResult::Won);
    assert_eq!(second, first);
    assert_eq!(orch.world.display.messages().count(), messages);
    assert_eq!(orch.win_delay(), win_delay);
    cleanup(&orch);
}

#[test]
fn losing_the_pilot_ends_in_lost_phase() {
    let mut orch = in_simul("pilot", FIELD);
    let human = orch.world.registry.first_of_type(ObjectType::Human).unwrap();
    orch.world.registry.destroy(human);
    let mut queue = EventQueue::new();
    for _ in 0..5 {
        orch.process_event(&Event::frame(0.1, 0.1), &mut queue);
        while let Some(event) = queue.get_event() {
            let mut follow_up = EventQueue::new();
            orch.process_event(&event, &mut follow_up);
            queue.extend(std::iter::from_fn(|| follow_up.get_event()));
        }
    }
    assert_eq!(orch.phase(), Phase::Lost);
    cleanup(&orch);
}

// ── Save / restore ─────────────────────────────────────────────────────

fn run_program(orch: &mut MissionOrchestrator) {
    let bot = orch.world.registry.first_of_type(ObjectType::MobileWa).unwrap();
    let mut brain = orch.world.registry.get_mut::<Brain>(bot).unwrap();
    let mut program = botfield_core::components::Program {
        source: "extern void object::Go() { move(10); }".to_string(),
        filename: "go.txt".to_string(),
        ..Default::default()
    };
    program.compiled = true;
    let slot = brain.add_program(program);
    brain.run_program(slot);
    brain.step();
    brain.step();
}

fn save_dir(orch: &MissionOrchestrator) -> PathBuf {
    orch.config.player_dir().join("slot1")
}

#[test]
fn save_and_load_round_trip() {
    let mut orch = in_simul("round-trip", FIELD);
    let bot = orch.world.registry.first_of_type(ObjectType::MobileWa).unwrap();
    orch.world.registry.set_position(bot, Vec3::new(33.0, 0.0, -12.0));
    run_program(&mut orch);
    let dir = save_dir(&orch);
    orch.save_scene(&dir, "round trip").unwrap();

    orch.change_phase(Phase::LevelList);
    orch.load_scene(&dir).unwrap();
    assert_eq!(orch.phase(), Phase::Simul);

    let registry = &orch.world.registry;
    let bot = registry.first_of_type(ObjectType::MobileWa).unwrap();
    let pos = registry.position(bot).unwrap();
    assert!(pos.approx_eq(&Vec3::new(33.0, 0.0, -12.0), 1e-3));
    assert!(registry.first_of_type(ObjectType::Stone).is_some());
    assert!(registry.power_of(bot).is_some());
    let brain = registry.get::<Brain>(bot).unwrap();
    assert_eq!(brain.programs[0].filename, "go.txt");
    assert_eq!(brain.stack.as_ref().map(|s| s.instruction), Some(2));
    cleanup(&orch);
}

#[test]
fn stack_from_another_interpreter_is_dropped() {
    let mut orch = in_simul("version", FIELD);
    run_program(&mut orch);
    let dir = save_dir(&orch);
    orch.save_scene(&dir, "old interpreter").unwrap();
    let config = orch.config.clone();

    let provider = MemoryLevelProvider::new().with_level(&mission(), FIELD);
    let mut newer = MissionOrchestrator::new(config, Box::new(provider), Box::new(BasicScriptHost::with_version(7)));
    newer.load_scene(&dir).unwrap();
    assert_eq!(newer.phase(), Phase::Simul);

    let bot = newer.world.registry.first_of_type(ObjectType::MobileWa).unwrap();
    let brain = newer.world.registry.get::<Brain>(bot).unwrap();
    assert!(brain.stack.as_ref().map_or(true, |s| s.instruction == 0));
    assert_eq!(brain.programs.len(), 1);
    cleanup(&orch);
}

// ── Autosave ───────────────────────────────────────────────────────────

#[test]
fn autosave_slots_stay_dense_and_bounded() {
    let mut orch = in_simul("autosave", FIELD);
    orch.set_autosave_slots(2);
    for _ in 0..5 {
        orch.autosave().unwrap();
    }
    let player_dir = orch.config.player_dir();
    assert_eq!(botfield_core::persistence::autosave_slots(&player_dir), vec![1, 2]);

    orch.set_autosave_slots(1);
    assert_eq!(botfield_core::persistence::autosave_slots(&player_dir), vec![1]);

    orch.set_autosave(false);
    assert!(botfield_core::persistence::autosave_slots(&player_dir).is_empty());
    assert_eq!(orch.autosave().unwrap(), None);
    cleanup(&orch);
}
