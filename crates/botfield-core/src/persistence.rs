//! Save/restore of a running mission.
//!
//! A save directory holds two files:
//!
//! - `data.sav`: a level description listing the mission identity, a few
//!   global values and one creation command per live object. Carried cargo
//!   and power cells come right before their carrier as `CreateFret` and
//!   `CreatePower` lines.
//! - `cbot.run`: `[i32 format version][i32 interpreter version]` followed by
//!   the bincode-encoded execution stacks and the interpreter static state.
//!   Stacks are restored only when both versions match; otherwise the file
//!   is ignored and objects start their programs fresh.
//!
//! Program sources of saved objects are written next to the scene as
//! `prog<objRank><slot>.txt`.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use hecs::Entity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use botfield_logic::autosave::{parse_slot_name, plan_rotation, slot_name};
use botfield_logic::mission::{LevelCategory, LevelId};
use botfield_logic::object_type::{Capability, ObjectType};

use crate::components::{Automat, Brain, ExecutionStack, Program, Transform};
use crate::config::AutosaveConfig;
use crate::level::{LevelError, LevelLine, LevelParam, LevelParser};
use crate::math::Vec3;
use crate::registry::{CreateParams, ObjectRegistry};
use crate::scene::environment::LightningStatus;
use crate::scene::SceneDescriptor;
use crate::script::ScriptHost;
use crate::world::GameWorld;

pub const SCENE_FILE: &str = "data.sav";
pub const STACK_FILE: &str = "cbot.run";
/// Outer version of the stack file
pub const STACK_FORMAT_VERSION: i32 = 1;

const SCENE_VERSION_MAJOR: i32 = 0;
const SCENE_VERSION_MINOR: i32 = 1;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("save {0} does not name a mission")]
    MissingMission(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SaveError + '_ {
    move |source| SaveError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Execution state of one object in the stack file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ObjectStack {
    id: i32,
    running: Option<usize>,
    stack: Option<ExecutionStack>,
}

/// Header of a save directory, read without restoring it
#[derive(Debug, Clone, PartialEq)]
pub struct SaveInfo {
    pub title: String,
    pub level: LevelId,
    /// Seconds since the Unix epoch
    pub created: i64,
}

pub fn program_file_name(obj_rank: i32, slot: usize) -> String {
    format!("prog{:03}{:03}.txt", obj_rank, slot)
}

// ============================================================================
// WRITE
// ============================================================================

/// Objects that go into a save, in registry order
fn saved_objects(registry: &ObjectRegistry) -> Vec<Entity> {
    registry
        .all()
        .into_iter()
        .filter(|e| {
            let flags = registry.flags(*e);
            let ty = registry.object_type(*e).unwrap_or(ObjectType::Null);
            !flags.dead && !matches!(ty, ObjectType::Toto | ObjectType::Fix | ObjectType::Null)
        })
        .collect()
}

fn object_line(command: &str, registry: &ObjectRegistry, entity: Entity, unit: f32) -> LevelLine {
    let ty = registry.object_type(entity).unwrap_or(ObjectType::Null);
    let transform = registry.transform(entity).unwrap_or_default();
    let flags = registry.flags(entity);
    let attrs = registry.attributes(entity);

    let mut line = LevelLine::new(command)
        .with(LevelParam::new("type", ty.name()))
        .with(LevelParam::int("id", registry.id(entity).unwrap_or(0)))
        .with(LevelParam::point("pos", transform.position / unit))
        .with(LevelParam::float("angle", transform.rotation.y.to_degrees()));
    if transform.scale != Vec3::ONE {
        line.add_param(LevelParam::point("zoom", transform.scale));
    }
    if flags.trainer {
        line.add_param(LevelParam::bool("trainer", true));
    }
    if flags.toy {
        line.add_param(LevelParam::bool("toy", true));
    }
    if attrs.option != 0 {
        line.add_param(LevelParam::int("option", attrs.option));
    }
    if registry.team(entity) != 0 {
        line.add_param(LevelParam::int("team", registry.team(entity)));
    }
    if !flags.selectable {
        line.add_param(LevelParam::bool("selectable", false));
    }
    if ty.is_power_cell() {
        line.add_param(LevelParam::float("energy", attrs.energy));
    }
    if let Some(automat) = registry.get::<Automat>(entity) {
        if let Some(auto_type) = automat.auto_type {
            line.add_param(LevelParam::new("autoType", auto_type.name()));
        }
        for (n, value) in automat.values.iter().enumerate() {
            if *value != 0.0 {
                line.add_param(LevelParam::float(&format!("autoValue{}", n + 1), *value));
            }
        }
        if !automat.string.is_empty() {
            line.add_param(LevelParam::string("autoString", &automat.string));
        }
        if automat.run != -1 {
            line.add_param(LevelParam::int("run", automat.run));
        }
    }
    line
}

/// Adds the program parameters of `entity` to `line` and writes the program
/// sources into `dir`
fn write_programs(
    dir: &Path,
    registry: &ObjectRegistry,
    entity: Entity,
    obj_rank: i32,
    line: &mut LevelLine,
) -> Result<(), SaveError> {
    let Some(brain) = registry.get::<Brain>(entity) else {
        return Ok(());
    };
    line.add_param(LevelParam::int("programs", brain.programs.len() as i32));
    for (slot, program) in brain.programs.iter().enumerate() {
        let n = slot + 1;
        if !program.filename.is_empty() {
            line.add_param(LevelParam::string(&format!("script{}", n), &program.filename));
        }
        line.add_param(LevelParam::bool(&format!("scriptReadOnly{}", n), program.read_only));
        line.add_param(LevelParam::bool(&format!("scriptRunnable{}", n), program.runnable));
        if !program.source.is_empty() {
            let path = dir.join(program_file_name(obj_rank, slot));
            fs::write(&path, &program.source).map_err(io_error(&path))?;
        }
    }
    if let Some(running) = brain.running {
        line.add_param(LevelParam::int("run", running as i32 + 1));
    }
    Ok(())
}

/// Writes the current mission into `dir`
pub fn write_scene(
    dir: &Path,
    info: &str,
    level: &LevelId,
    world: &GameWorld,
    scene: &SceneDescriptor,
    scripts: &dyn ScriptHost,
) -> Result<(), SaveError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let registry = &world.registry;
    let unit = scene.unit_scale;
    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let scene_path = dir.join(SCENE_FILE);
    let mut parser = LevelParser::new(&scene_path.display().to_string());
    parser.add_line(LevelLine::new("Title").with(LevelParam::string("text", info)));
    parser.add_line(
        LevelLine::new("Version")
            .with(LevelParam::int("maj", SCENE_VERSION_MAJOR))
            .with(LevelParam::int("min", SCENE_VERSION_MINOR)),
    );
    parser.add_line(LevelLine::new("Created").with(LevelParam::new("date", created.to_string())));
    parser.add_line(
        LevelLine::new("Mission")
            .with(LevelParam::new("base", level.category.dir_name()))
            .with(LevelParam::int("chap", level.chap))
            .with(LevelParam::int("rank", level.rank)),
    );
    parser.add_line(LevelLine::new("Map").with(LevelParam::float("zoom", world.map.zoom())));
    parser.add_line(LevelLine::new("DoneResearch").with(LevelParam::int("bits", scene.research_done(0) as i32)));
    if let Some(status) = world.environment.lightning.get_status() {
        parser.add_line(
            LevelLine::new("BlitzMode")
                .with(LevelParam::float("sleep", status.sleep))
                .with(LevelParam::float("delay", status.delay))
                .with(LevelParam::float("magnetic", status.magnetic / unit))
                .with(LevelParam::float("progress", status.progress)),
        );
    }

    let mut stacks = Vec::new();
    let mut obj_rank = 0;
    for entity in saved_objects(registry) {
        if registry.is_transported(entity) {
            continue;
        }
        if let Some(brain) = registry.get::<Brain>(entity) {
            stacks.push(ObjectStack {
                id: registry.id(entity).unwrap_or(0),
                running: brain.running,
                stack: brain.stack.clone(),
            });
        }
        if registry.flags(entity).exploding {
            continue;
        }
        if let Some(cargo) = registry.cargo_of(entity) {
            parser.add_line(object_line("CreateFret", registry, cargo, unit));
        }
        if let Some(cell) = registry.power_of(entity) {
            parser.add_line(object_line("CreatePower", registry, cell, unit));
        }
        let mut line = object_line("CreateObject", registry, entity, unit);
        if registry.flags(entity).selected {
            line.add_param(LevelParam::bool("select", true));
        }
        write_programs(dir, registry, entity, obj_rank, &mut line)?;
        parser.add_line(line);
        obj_rank += 1;
    }
    parser.save(&scene_path)?;

    let stack_path = dir.join(STACK_FILE);
    let mut file = fs::File::create(&stack_path).map_err(io_error(&stack_path))?;
    file.write_all(&STACK_FORMAT_VERSION.to_le_bytes())
        .and_then(|_| file.write_all(&scripts.version().to_le_bytes()))
        .map_err(io_error(&stack_path))?;
    bincode::serialize_into(&mut file, &stacks)?;
    bincode::serialize_into(&mut file, &scripts.save_static_state())?;

    log::info!("Saved {} objects to {}", obj_rank, dir.display());
    Ok(())
}

// ============================================================================
// READ
// ============================================================================

/// Reads the title and mission identity of a save
pub fn read_save_info(dir: &Path) -> Result<SaveInfo, SaveError> {
    let path = dir.join(SCENE_FILE);
    let text = fs::read_to_string(&path).map_err(io_error(&path))?;
    let parser = LevelParser::parse_str(&path.display().to_string(), &text)?;
    let missing = || SaveError::MissingMission(dir.display().to_string());

    let mission = parser.find("Mission").ok_or_else(missing)?;
    let category = LevelCategory::from_dir_name(&mission.string_or("base", "")).ok_or_else(missing)?;
    let level = LevelId::new(category, mission.int_or("chap", 0)?, mission.int_or("rank", 0)?);
    let title = parser.find("Title").map(|l| l.string_or("text", "")).unwrap_or_default();
    let created = match parser.find("Created").and_then(|l| l.get("date")) {
        Some(p) => p.unquoted().parse().unwrap_or(0),
        None => 0,
    };
    Ok(SaveInfo { title, level, created })
}

fn create_saved_object(line: &LevelLine, registry: &mut ObjectRegistry, unit: f32) -> Result<Entity, LevelError> {
    let params = CreateParams {
        angle: line.float_or("angle", 0.0)?.to_radians(),
        trainer: line.bool_or("trainer", false)?,
        toy: line.bool_or("toy", false)?,
        option: line.int_or("option", 0)?,
        team: line.int_or("team", 0)?,
        id: Some(line.int("id")?),
        ..CreateParams::new(line.object_type("type")?, line.point("pos")? * unit)
    };
    let entity = registry.create(params).map_err(|source| LevelError::Create {
        file: line.file.clone(),
        line: line.line_number,
        source,
    })?;

    let zoom = line.point_or("zoom", Vec3::ONE)?;
    if let Some(mut transform) = registry.get_mut::<Transform>(entity) {
        transform.scale = zoom;
    }
    let selectable = line.bool_or("selectable", true)?;
    if let Some(mut flags) = registry.flags_mut(entity) {
        flags.selectable = selectable;
    }
    let energy = line.float_or("energy", 0.0)?;
    if let Some(mut attrs) = registry.attributes_mut(entity) {
        attrs.energy = energy;
    }
    if let Some(mut automat) = registry.get_mut::<Automat>(entity) {
        automat.auto_type = line.get("autoType").and_then(|p| ObjectType::from_name(p.unquoted()));
        for (n, value) in automat.values.iter_mut().enumerate() {
            *value = line.float_or(&format!("autoValue{}", n + 1), 0.0)?;
        }
        automat.string = line.string_or("autoString", "");
        automat.run = line.int_or("run", -1)?;
    }
    Ok(entity)
}

fn read_programs(
    dir: &Path,
    line: &LevelLine,
    registry: &mut ObjectRegistry,
    entity: Entity,
    obj_rank: i32,
    scripts: &mut dyn ScriptHost,
) -> Result<(), LevelError> {
    let count = line.int_or("programs", 0)?.max(0) as usize;
    let run = line.int_or("run", 0)?;
    let mut programs = Vec::with_capacity(count);
    for slot in 0..count {
        let n = slot + 1;
        let mut program = Program {
            read_only: line.bool_or(&format!("scriptReadOnly{}", n), false)?,
            runnable: line.bool_or(&format!("scriptRunnable{}", n), true)?,
            ..Program::from_file(&line.string_or(&format!("script{}", n), ""))
        };
        let path = dir.join(program_file_name(obj_rank, slot));
        if let Ok(source) = fs::read_to_string(&path) {
            program.source = source;
            scripts.compile(&mut program);
        }
        programs.push(program);
    }
    if let Some(mut brain) = registry.get_mut::<Brain>(entity) {
        brain.programs = programs;
        brain.script_run = if run > 0 { Some(run as usize - 1) } else { None };
    }
    Ok(())
}

/// Rebuilds the saved objects of `dir` into `world`.
/// Returns the object that was selected when the game was saved.
pub fn read_scene(
    dir: &Path,
    level: &LevelId,
    world: &mut GameWorld,
    scene: &mut SceneDescriptor,
    scripts: &mut dyn ScriptHost,
) -> Result<Option<Entity>, SaveError> {
    let path = dir.join(SCENE_FILE);
    let text = fs::read_to_string(&path).map_err(io_error(&path))?;
    let parser = LevelParser::parse_str(&path.display().to_string(), &text)?;
    let unit = scene.unit_scale;
    log::info!("Restoring {:?} from {}", level, dir.display());

    let mut pending_cargo = None;
    let mut pending_power = None;
    let mut selected = None;
    let mut restored = Vec::new();
    let mut obj_rank = 0;

    for line in parser.lines() {
        match line.command.as_str() {
            "Map" => {
                let zoom = line.float_or("zoom", scene.map.zoom)?;
                scene.map.zoom = zoom;
                world.map.set_zoom(zoom);
            }
            "DoneResearch" => *scene.research_done_mut(0) = line.int_or("bits", 0)? as u32,
            "BlitzMode" => world.environment.lightning.set_status(LightningStatus {
                sleep: line.float_or("sleep", 0.0)?,
                delay: line.float_or("delay", 3.0)?,
                magnetic: line.float_or("magnetic", 50.0)? * unit,
                progress: line.float_or("progress", 0.0)?,
            }),
            "CreateFret" => pending_cargo = Some(create_saved_object(line, &mut world.registry, unit)?),
            "CreatePower" => pending_power = Some(create_saved_object(line, &mut world.registry, unit)?),
            "CreateObject" => {
                let registry = &mut world.registry;
                let entity = create_saved_object(line, registry, unit)?;
                if let Some(cargo) = pending_cargo.take() {
                    registry.attach_cargo(entity, cargo);
                }
                if let Some(cell) = pending_power.take() {
                    registry.attach_power(entity, cell);
                }
                if registry.implements(entity, Capability::Programmable) {
                    read_programs(dir, line, registry, entity, obj_rank, scripts)?;
                }
                if line.bool_or("select", false)? {
                    selected = Some(entity);
                }
                restored.push(entity);
                obj_rank += 1;
            }
            _ => {}
        }
    }

    for &entity in &restored {
        if let Some(mut brain) = world.registry.get_mut::<Brain>(entity) {
            if let Some(slot) = brain.script_run {
                brain.run_program(slot);
            }
        }
    }
    restore_stacks(&dir.join(STACK_FILE), &mut world.registry, scripts);

    log::info!("Restored {} objects", restored.len());
    Ok(selected)
}

/// Applies the stack file. Any problem with it is logged and leaves the
/// objects with freshly started programs.
fn restore_stacks(path: &Path, registry: &mut ObjectRegistry, scripts: &mut dyn ScriptHost) {
    let mut file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("No program stacks restored from {}: {}", path.display(), e);
            return;
        }
    };
    let mut header = [0u8; 8];
    if let Err(e) = file.read_exact(&mut header) {
        log::warn!("Truncated stack file {}: {}", path.display(), e);
        return;
    }
    let outer = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let inner = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if outer != STACK_FORMAT_VERSION || inner != scripts.version() {
        log::warn!(
            "Ignoring stack file {}: version {}/{} does not match {}/{}",
            path.display(),
            outer,
            inner,
            STACK_FORMAT_VERSION,
            scripts.version()
        );
        return;
    }

    let decoded: Result<(Vec<ObjectStack>, Vec<u8>), Box<bincode::ErrorKind>> =
        bincode::deserialize_from(&mut file).and_then(|stacks| Ok((stacks, bincode::deserialize_from(&mut file)?)));
    let (stacks, static_state) = match decoded {
        Ok(d) => d,
        Err(e) => {
            log::warn!("Corrupt stack file {}: {}", path.display(), e);
            return;
        }
    };

    for saved in stacks {
        let Some(entity) = registry.find_by_id(saved.id) else {
            continue;
        };
        let Some(mut brain) = registry.get_mut::<Brain>(entity) else {
            continue;
        };
        match saved.stack {
            Some(stack) => {
                if !brain.restore_stack(stack) {
                    log::warn!("Stack of object {} refers to a missing program", saved.id);
                }
            }
            None if saved.running.is_none() => brain.stop_program(),
            None => {}
        }
    }
    if !scripts.restore_static_state(&static_state) {
        log::warn!("Interpreter static state not restored");
    }
}

// ============================================================================
// PER-OBJECT PROGRAMS
// ============================================================================

/// File holding program `slot` of the object ranked `obj_rank` in `level`
pub fn object_program_name(level: &LevelId, obj_rank: i32, slot: usize) -> String {
    format!(
        "{}{:03}{:03}{:03}{:03}.txt",
        level.category.file_char(),
        level.chap,
        level.rank,
        obj_rank,
        slot
    )
}

/// Whether the programs of `entity` are kept in the player directory
fn keeps_programs(registry: &ObjectRegistry, entity: Entity) -> bool {
    registry.flags(entity).selectable
        && registry.object_type(entity) != Some(ObjectType::Human)
        && registry.attributes(entity).def_rank >= 0
        && registry.implements(entity, Capability::Programmable)
}

/// Saves the programs typed by the player, one file per program slot.
/// Returns the number of files written.
pub fn save_object_programs(dir: &Path, level: &LevelId, registry: &ObjectRegistry) -> Result<usize, SaveError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let mut written = 0;
    for entity in registry.all() {
        if !keeps_programs(registry, entity) {
            continue;
        }
        let rank = registry.attributes(entity).def_rank;
        let Some(brain) = registry.get::<Brain>(entity) else {
            continue;
        };
        for (slot, program) in brain.programs.iter().enumerate() {
            let path = dir.join(object_program_name(level, rank, slot));
            if program.source.is_empty() {
                if path.exists() {
                    fs::remove_file(&path).map_err(io_error(&path))?;
                }
                continue;
            }
            fs::write(&path, &program.source).map_err(io_error(&path))?;
            written += 1;
        }
    }
    log::debug!("Saved {} programs to {}", written, dir.display());
    Ok(written)
}

/// Loads the saved programs of one object and compiles them. Read-only
/// programs keep the level's version.
pub fn load_object_programs(
    dir: &Path,
    level: &LevelId,
    registry: &mut ObjectRegistry,
    entity: Entity,
    scripts: &mut dyn ScriptHost,
) {
    if !keeps_programs(registry, entity) {
        return;
    }
    let rank = registry.attributes(entity).def_rank;
    let prefix = format!("{}{:03}{:03}{:03}", level.category.file_char(), level.chap, level.rank, rank);
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut files: Vec<(usize, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let slot = name.strip_prefix(&prefix)?.strip_suffix(".txt")?;
            (slot.len() == 3).then_some(())?;
            Some((slot.parse().ok()?, entry.path()))
        })
        .collect();
    files.sort();

    let Some(mut brain) = registry.get_mut::<Brain>(entity) else {
        return;
    };
    for (slot, path) in files {
        let Some(program) = brain.program_mut(slot) else {
            continue;
        };
        if program.read_only {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(source) => {
                program.source = source;
                scripts.compile(program);
            }
            Err(e) => log::error!("Unable to read program {}: {}", path.display(), e),
        }
    }
}

// ============================================================================
// AUTOSAVE
// ============================================================================

/// Directory of autosave slot `slot` under the player directory
pub fn autosave_dir(player_dir: &Path, slot: i32) -> PathBuf {
    player_dir.join(slot_name(slot))
}

/// Existing autosave slots under `player_dir`
pub fn autosave_slots(player_dir: &Path) -> Vec<i32> {
    let Ok(entries) = fs::read_dir(player_dir) else {
        return Vec::new();
    };
    let mut slots: Vec<i32> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| parse_slot_name(&entry.file_name().to_string_lossy()))
        .collect();
    slots.sort_unstable();
    slots
}

/// Brings the autosave directories back to a dense `1..=n` set. With
/// `free_one`, slot 1 is left free for the save about to be written and
/// returned.
pub fn autosave_rotate(player_dir: &Path, config: &AutosaveConfig, free_one: bool) -> Result<Option<i32>, SaveError> {
    let existing = autosave_slots(player_dir);
    let plan = plan_rotation(&existing, config.slots, free_one, config.enabled);

    for slot in &plan.remove {
        let dir = autosave_dir(player_dir, *slot);
        fs::remove_dir_all(&dir).map_err(io_error(&dir))?;
    }
    // Targets may be sources of other renames
    let staged: Vec<(PathBuf, i32)> = plan
        .rename
        .iter()
        .map(|(from, to)| {
            let tmp = player_dir.join(format!("{}.tmp", slot_name(*from)));
            let src = autosave_dir(player_dir, *from);
            fs::rename(&src, &tmp).map_err(io_error(&src))?;
            Ok((tmp, *to))
        })
        .collect::<Result<_, SaveError>>()?;
    for (tmp, to) in staged {
        let dst = autosave_dir(player_dir, to);
        fs::rename(&tmp, &dst).map_err(io_error(&dst))?;
    }

    log::debug!(
        "Autosave rotation: removed {:?}, renamed {:?}, {} kept",
        plan.remove,
        plan.rename,
        plan.kept
    );
    Ok(plan.next_slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::BasicScriptHost;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("botfield-persist-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn level() -> LevelId {
        LevelId::new(LevelCategory::Missions, 2, 5)
    }

    #[test]
    fn test_object_program_name() {
        assert_eq!(object_program_name(&level(), 3, 0), "m002005003000.txt");
        assert_eq!(program_file_name(12, 4), "prog012004.txt");
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = temp_dir("round-trip");
        let mut scripts = BasicScriptHost::new();
        let mut world = GameWorld::new();
        let scene = SceneDescriptor::default();
        let bot = world
            .registry
            .create(CreateParams::new(ObjectType::MobileWa, Vec3::new(8.0, 0.0, -4.0)).with_power(0.5).with_angle(1.0))
            .unwrap();
        let stone = world.registry.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        world.registry.attach_cargo(bot, stone);
        {
            let mut brain = world.registry.get_mut::<Brain>(bot).unwrap();
            let mut program = Program {
                source: "{ move(1); }".to_string(),
                ..Program::from_file("go.txt")
            };
            scripts.compile(&mut program);
            let slot = brain.add_program(program);
            brain.run_program(slot);
            brain.step();
        }
        world.registry.flags_mut(bot).unwrap().selected = true;

        write_scene(&dir, "My save", &level(), &world, &scene, &scripts).unwrap();
        let info = read_save_info(&dir).unwrap();
        assert_eq!(info.title, "My save");
        assert_eq!(info.level, level());

        let mut restored = GameWorld::new();
        let mut restored_scene = SceneDescriptor::default();
        let selected = read_scene(&dir, &level(), &mut restored, &mut restored_scene, &mut scripts).unwrap();

        let reg = &restored.registry;
        let bot2 = reg.first_of_type(ObjectType::MobileWa).unwrap();
        assert_eq!(selected, Some(bot2));
        let t = reg.transform(bot2).unwrap();
        assert!(t.position.approx_eq(&Vec3::new(8.0, 0.0, -4.0), 1e-4));
        assert!((t.rotation.y - 1.0).abs() < 1e-4);
        assert_eq!(reg.object_type(reg.cargo_of(bot2).unwrap()), Some(ObjectType::Stone));
        let cell = reg.power_of(bot2).unwrap();
        assert!((reg.attributes(cell).energy - 0.5).abs() < 1e-4);

        let brain = reg.get::<Brain>(bot2).unwrap();
        assert_eq!(brain.programs[0].filename, "go.txt");
        assert!(brain.programs[0].compiled);
        assert_eq!(brain.stack.as_ref().map(|s| s.instruction), Some(1));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stack_version_mismatch_starts_fresh() {
        let dir = temp_dir("version");
        let mut scripts = BasicScriptHost::new();
        let mut world = GameWorld::new();
        let bot = world.registry.create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO)).unwrap();
        {
            let mut brain = world.registry.get_mut::<Brain>(bot).unwrap();
            let mut program = Program {
                source: "{}".to_string(),
                ..Program::default()
            };
            scripts.compile(&mut program);
            let slot = brain.add_program(program);
            brain.run_program(slot);
            brain.step();
            brain.step();
        }
        write_scene(&dir, "v", &level(), &world, &SceneDescriptor::default(), &scripts).unwrap();

        let mut newer = BasicScriptHost::with_version(2);
        let mut restored = GameWorld::new();
        read_scene(&dir, &level(), &mut restored, &mut SceneDescriptor::default(), &mut newer).unwrap();
        let bot2 = restored.registry.first_of_type(ObjectType::MobileWa).unwrap();
        let brain = restored.registry.get::<Brain>(bot2).unwrap();
        assert!(brain.stack.as_ref().map_or(true, |s| s.instruction == 0));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_object_programs_saved_and_loaded() {
        let dir = temp_dir("programs");
        let mut scripts = BasicScriptHost::new();
        let mut registry = ObjectRegistry::new();
        let bot = registry.create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO)).unwrap();
        registry.attributes_mut(bot).unwrap().def_rank = 0;
        registry.get_mut::<Brain>(bot).unwrap().add_program(Program {
            source: "{ turn(90); }".to_string(),
            ..Program::default()
        });
        assert_eq!(save_object_programs(&dir, &level(), &registry).unwrap(), 1);

        registry.get_mut::<Brain>(bot).unwrap().programs.clear();
        load_object_programs(&dir, &level(), &mut registry, bot, &mut scripts);
        let brain = registry.get::<Brain>(bot).unwrap();
        assert_eq!(brain.programs[0].source, "{ turn(90); }");
        assert!(brain.programs[0].compiled);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_autosave_rotate_keeps_dense_slots() {
        let dir = temp_dir("autosave");
        for slot in [1, 2, 4, 7] {
            fs::create_dir_all(autosave_dir(&dir, slot)).unwrap();
            fs::write(autosave_dir(&dir, slot).join("mark"), slot.to_string()).unwrap();
        }
        let config = AutosaveConfig {
            enabled: true,
            interval: 5,
            slots: 3,
        };
        assert_eq!(autosave_rotate(&dir, &config, true).unwrap(), Some(1));
        assert_eq!(autosave_slots(&dir), vec![2, 3]);
        assert_eq!(fs::read_to_string(autosave_dir(&dir, 3).join("mark")).unwrap(), "2");

        let disabled = AutosaveConfig {
            enabled: false,
            ..config
        };
        autosave_rotate(&dir, &disabled, false).unwrap();
        assert!(autosave_slots(&dir).is_empty());
        let _ = fs::remove_dir_all(&dir);
    }
}
