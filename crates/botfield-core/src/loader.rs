//! Scene loader - interprets a level file into world and mission state.
//!
//! One pass over the level's commands, in file order. A reset-only replay
//! re-runs object placement and the camera and skips every one-time setup
//! command. When restoring a saved game the level file is still read for
//! terrain and mission settings, but objects come from the save directory
//! as soon as `BeginObject` is reached.
//!
//! Programs are compiled only after the whole pass so that a program may
//! refer to objects created further down the file.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use hecs::Entity;

use botfield_logic::camera::CameraType;
use botfield_logic::constants::{build, research, MAX_NEW_SCRIPT_NAMES, MAX_TERRAIN_LEVEL_IDS, MAX_TERRAIN_TEXTURE_CELLS, MAX_TOKENS};
use botfield_logic::gadget::keep_gadget;
use botfield_logic::mission::{LevelCategory, LevelId, MissionType};
use botfield_logic::object_type::{Capability, ObjectType};

use crate::components::{Automat, Brain, CameraPrefs, Program, Transform};
use crate::config::RuntimeConfig;
use crate::level::{level_path, program_path, LevelError, LevelLine, LevelParser, LevelProvider};
use crate::math::{Color, Point, Vec3};
use crate::persistence;
use crate::profile::PlayerProfile;
use crate::registry::CreateParams;
use crate::scene::environment::{
    light_mask, Background, Cloud, FlyingLimit, GroundSpot, LightKind, Planet, SceneLight, TerrainLevelRule,
    TerrainMaterial, TerrainParams, TerrainRelief, TextureGrid, Water,
};
use crate::scene::{music_track_file, AudioChange, EndCondition, InfoSlot, SceneDescriptor};
use crate::script::ScriptHost;
use crate::services::{ParticleKind, PyroType};
use crate::world::GameWorld;

/// How a scene is being built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMode {
    /// Normal level start
    Interactive,
    /// Decorative scene (win/lost endings, appearance screen)
    Fixed,
    /// Put objects back in their initial state, keep everything else
    ResetObjects,
    /// Resume a saved game from a save directory
    Restore(PathBuf),
}

impl LoadMode {
    pub fn is_reset(&self) -> bool {
        matches!(self, LoadMode::ResetObjects)
    }

    pub fn restore_dir(&self) -> Option<&Path> {
        match self {
            LoadMode::Restore(dir) => Some(dir),
            _ => None,
        }
    }
}

/// Loader options taken from the runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSettings {
    pub gadget_quantity: f32,
    pub show_soluce: bool,
    pub movies: bool,
    pub custom_dir: String,
    /// Player save directory holding per-object program files
    pub script_dir: Option<PathBuf>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            gadget_quantity: 1.0,
            show_soluce: false,
            movies: true,
            custom_dir: String::new(),
            script_dir: None,
        }
    }
}

impl From<&RuntimeConfig> for LoaderSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            gadget_quantity: config.gadget_quantity,
            show_soluce: config.show_soluce,
            movies: config.movies,
            custom_dir: config.custom_dir.clone(),
            script_dir: Some(config.player_dir()),
        }
    }
}

/// What the orchestrator needs to finish the scene setup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    /// Object marked `select=1` (or selected in the save)
    pub selected: Option<Entity>,
    /// Player's spaceship, if the level has one
    pub base: Option<Entity>,
    /// Objects that play the reset flash after a reset replay
    pub reset_objects: Vec<Entity>,
    pub restored: bool,
}

/// Counters carried across the commands of one pass
struct Pass {
    unit: f32,
    /// Rank among all created objects, names per-object program files
    rank_obj: i32,
    rank_gadget: usize,
    background: Option<Background>,
    outcome: LoadOutcome,
}

pub struct SceneLoader<'a> {
    provider: &'a dyn LevelProvider,
    scripts: &'a mut dyn ScriptHost,
    profile: &'a mut PlayerProfile,
    settings: &'a LoaderSettings,
}

impl<'a> SceneLoader<'a> {
    pub fn new(
        provider: &'a dyn LevelProvider,
        scripts: &'a mut dyn ScriptHost,
        profile: &'a mut PlayerProfile,
        settings: &'a LoaderSettings,
    ) -> Self {
        Self {
            provider,
            scripts,
            profile,
            settings,
        }
    }

    /// Builds the scene of `level` into `world` and `scene`
    pub fn create_scene(
        &mut self,
        level: &LevelId,
        mode: &LoadMode,
        world: &mut GameWorld,
        scene: &mut SceneDescriptor,
    ) -> Result<LoadOutcome, LevelError> {
        let path = level_path(level, &self.settings.custom_dir);
        let parser = LevelParser::load(self.provider, &path)?;
        self.create_scene_from(&parser, level, mode, world, scene)
    }

    /// Same as [`create_scene`](Self::create_scene) with an already parsed
    /// level file
    pub fn create_scene_from(
        &mut self,
        parser: &LevelParser,
        level: &LevelId,
        mode: &LoadMode,
        world: &mut GameWorld,
        scene: &mut SceneDescriptor,
    ) -> Result<LoadOutcome, LevelError> {
        let reset = mode.is_reset();
        if !reset {
            scene.reset_for_load();
            world.sound.clear_cache();
            scene.fixed_scene = *mode == LoadMode::Fixed;
        }

        let mut pass = Pass {
            unit: scene.unit_scale,
            rank_obj: 0,
            rank_gadget: 0,
            background: None,
            outcome: LoadOutcome::default(),
        };

        log::info!("Loading scene {} ({:?})", parser.filename, mode);
        for line in parser.lines() {
            self.command(line, level, mode, &mut pass, world, scene)?;
        }

        if mode.restore_dir().is_none() {
            self.compile_scripts(level, world);
        }
        if !reset {
            if let Some(background) = pass.background.take() {
                world.environment.background = background;
            }
            world.map.apply(&scene.map);
            self.apply_unlocks(level, scene);
        }
        if reset {
            pass.outcome.reset_objects = world
                .registry
                .all()
                .into_iter()
                .filter(|e| world.registry.flags(*e).animate_on_reset)
                .collect();
        }
        log::debug!(
            "Scene built: {} objects, {} end conditions",
            world.registry.len(),
            scene.end_take.len()
        );
        Ok(pass.outcome)
    }

    fn apply_unlocks(&mut self, level: &LevelId, scene: &mut SceneDescriptor) {
        match level.category {
            LevelCategory::Missions => {
                self.profile.merge_unlocks(scene.research_done(0), scene.build);
            }
            LevelCategory::FreeGame => {
                *scene.research_done_mut(0) = self.profile.free_game_research;
                scene.build = self.profile.free_game_build;
                scene.build &= !(build::RESEARCH | build::LABO);
                scene.build |= build::FACTORY | build::GFLAT | build::FLAG;
            }
            _ => {}
        }
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    fn command(
        &mut self,
        line: &LevelLine,
        level: &LevelId,
        mode: &LoadMode,
        pass: &mut Pass,
        world: &mut GameWorld,
        scene: &mut SceneDescriptor,
    ) -> Result<(), LevelError> {
        let reset = mode.is_reset();
        let restoring = mode.restore_dir().is_some();
        let unit = pass.unit;

        // Commands replayed by a reset
        match line.command.as_str() {
            "CreateObject" if !restoring => return self.create_object(line, pass, mode, world, scene),
            "Camera" => {
                let eye = line.point_or("eye", Vec3::ZERO)? * unit;
                let look_at = line.point_or("lookat", Vec3::ZERO)? * unit;
                let delay = if reset { 0.0 } else { line.float_or("delay", 0.0)? };
                world.camera.init(eye, look_at, delay);
                world.camera.fix_direction = line.float_or("fixDirection", 0.25)? * PI;
                return Ok(());
            }
            "BeginObject" => {
                if let Some(dir) = mode.restore_dir() {
                    let selected = persistence::read_scene(dir, level, world, scene, &mut *self.scripts)
                        .map_err(|e| line.invalid(format!("cannot restore saved scene: {}", e)))?;
                    pass.outcome.selected = selected;
                    pass.outcome.restored = true;
                }
                return Ok(());
            }
            _ => {}
        }
        if reset {
            return Ok(());
        }

        match line.command.as_str() {
            "Title" => scene.title = line.string_or("text", ""),
            "Resume" => scene.resume = line.string_or("text", ""),
            "ScriptName" => scene.script_name = line.string_or("text", ""),
            "ScriptFile" => scene.script_file = line.string_or("name", ""),
            "Instructions" => {
                scene.set_info_file(InfoSlot::Huston, &line.string_or("name", ""));
                scene.immediat_satcom = line.bool_or("immediat", false)?;
            }
            "Satellite" => scene.set_info_file(InfoSlot::Satellite, &line.string_or("name", "")),
            "Loading" => scene.set_info_file(InfoSlot::Loading, &line.string_or("name", "")),
            "HelpFile" => scene.set_info_file(InfoSlot::Program, &line.string_or("name", "")),
            "SoluceFile" => scene.set_info_file(InfoSlot::Soluce, &line.string_or("name", "")),
            "EndingFile" => {
                scene.ending_win = line.int_or("win", 0)?;
                scene.ending_lost = line.int_or("lost", 0)?;
            }
            "MessageDelay" => scene.message_delay = line.float_or("factor", 1.0)?,
            "MissionTimer" => scene.mission_timer_enabled = line.bool_or("enabled", false)?,
            "TeamName" => scene.team_names.set(line.int("team")?, &line.string("name")?),
            "CacheAudio" => {
                let file = audio_file(line)?;
                world.sound.cache_music(&file);
                scene.cached_audio.push(file);
            }
            "AudioChange" => {
                let change = AudioChange::read(line, unit)?;
                world.sound.cache_music(&change.music);
                scene.audio_changes.push(change);
            }
            "Audio" => {
                if line.is_defined("track") && line.is_defined("filename") {
                    return Err(line.invalid("You can't use track and filename at the same time"));
                }
                scene.audio_track = audio_file(line)?;
                scene.audio_repeat = line.bool_or("repeat", true)?;
                scene.satcom_track = line.string_or("satcom", "");
                scene.satcom_repeat = line.bool_or("satcomRepeat", true)?;
                scene.editor_track = line.string_or("editor", "");
                scene.editor_repeat = line.bool_or("editorRepeat", true)?;
                for file in [&scene.audio_track, &scene.satcom_track, &scene.editor_track] {
                    world.sound.cache_music(file);
                }
            }
            "AmbientColor" => {
                scene.colors.ambient[0] = line.color_or("air", Color::gray(0.2))?;
                scene.colors.ambient[1] = line.color_or("water", Color::gray(0.2))?;
            }
            "FogColor" => {
                scene.colors.fog[0] = line.color_or("air", Color::gray(0.5))?;
                scene.colors.fog[1] = line.color_or("water", Color::gray(0.5))?;
            }
            "VehicleColor" => scene.colors.vehicle = line.color_or("color", Color::gray(0.3))?,
            "InsectColor" => scene.colors.insect = line.color_or("color", Color::BLACK)?,
            "GreeneryColor" => scene.colors.greenery = line.color_or("color", Color::gray(0.533))?,
            "DeepView" => {
                world.environment.deep_view = [
                    line.float_or("air", 500.0)? * unit,
                    line.float_or("water", 100.0)? * unit,
                ];
            }
            "FogStart" => {
                world.environment.fog_start = [line.float_or("air", 0.5)?, line.float_or("water", 0.5)?];
            }
            "SecondTexture" => {
                world.environment.second_texture = match line.get("rank") {
                    Some(_) => format!("dirty{:02}.png", line.int("rank")?),
                    None => line.string_or("texture", ""),
                };
            }
            "Background" => {
                pass.background = Some(Background {
                    image: line.string_or("image", ""),
                    up: line.color_or("up", Color::BLACK)?,
                    down: line.color_or("down", Color::BLACK)?,
                    cloud_up: line.color_or("cloudUp", Color::BLACK)?,
                    cloud_down: line.color_or("cloudDown", Color::BLACK)?,
                    full: line.bool_or("full", false)?,
                });
            }
            "Planet" => {
                let pos = line.point_or("pos", Vec3::ZERO)?;
                let uv1 = line.point_or("uv1", Vec3::ZERO)?;
                let uv2 = line.point_or("uv2", Vec3::ZERO)?;
                world.environment.planets.push(Planet {
                    mode: line.int_or("mode", 0)?,
                    pos: Point::new(pos.x, pos.z),
                    dim: line.float_or("dim", 0.2)?,
                    speed: line.float_or("speed", 0.0)?,
                    dir: line.float_or("dir", 0.0)?,
                    image: line.string_or("image", ""),
                    uv1: Point::new(uv1.x, uv1.z),
                    uv2: Point::new(uv2.x, uv2.z),
                });
            }
            "ForegroundName" => world.environment.foreground = line.string_or("image", ""),
            "Level" => {
                let unit_scale = line.float_or("unitScale", 4.0)?;
                scene.unit_scale = unit_scale;
                pass.unit = unit_scale;
                scene.trace_quality = line.float_or("traceQuality", 1.0)?;
                scene.shortcut = line.bool_or("shortcut", true)?;
                if let Some(param) = line.get("type") {
                    scene.mission_type = MissionType::from_name(param.unquoted())
                        .ok_or_else(|| line.invalid(format!("unknown mission type '{}'", param.unquoted())))?;
                }
                scene.magnify_damage = line.float_or("magnifyDamage", 1.0)?;
            }
            "TerrainGenerate" => {
                world.environment.terrain.params = Some(TerrainParams {
                    mosaic: line.int_or("mosaic", 20)?,
                    brick: line.int_or("brick", 3)?,
                    size: line.float_or("size", 20.0)?,
                    vision: line.float_or("vision", 500.0)? * unit,
                    depth: line.int_or("depth", 2)?,
                    hard: line.float_or("hard", 0.5)?,
                });
            }
            "TerrainWind" => world.environment.terrain.wind = line.point_or("speed", Vec3::ZERO)?,
            "TerrainRelief" => {
                world.environment.terrain.relief = Some(TerrainRelief {
                    image: line.string("image")?,
                    factor: line.float_or("factor", 1.0)?,
                    border: line.bool_or("border", true)?,
                });
            }
            "TerrainRandomRelief" => world.environment.terrain.random_relief = true,
            "TerrainResource" => world.environment.terrain.resource = Some(line.string("image")?),
            "TerrainWater" => {
                let moxe = Point::new(line.float_or("moxeX", 1.5)?, line.float_or("moxeY", 1.5)?);
                world.environment.water = Some(Water {
                    air_type: line.string_or("air", ""),
                    water_type: line.string_or("water", ""),
                    image: line.string_or("image", ""),
                    diffuse: line.color_or("diffuse", Color::WHITE)?,
                    ambient: line.color_or("ambient", Color::WHITE)?,
                    level: line.float_or("level", 100.0)? * unit,
                    glint: line.float_or("glint", 1.0)?,
                    moxe,
                    color: line.color_or("color", scene.colors.water)?,
                    brightness: line.float_or("brightness", 0.0)?,
                    lava: false,
                    time: 0.0,
                });
            }
            "TerrainLava" => {
                if let Some(water) = world.environment.water.as_mut() {
                    water.lava = line.bool_or("mode", false)?;
                }
            }
            "TerrainCloud" => {
                world.environment.cloud = Some(Cloud {
                    image: line.string_or("image", ""),
                    diffuse: line.color_or("diffuse", Color::WHITE)?,
                    ambient: line.color_or("ambient", Color::WHITE)?,
                    level: line.float_or("level", 500.0)? * unit,
                });
            }
            "TerrainBlitz" => {
                let sleep = line.float_or("sleep", 0.0)?;
                let delay = line.float_or("delay", 3.0)?;
                let magnetic = line.float_or("magnetic", 50.0)? * unit;
                world.environment.lightning.create(sleep, delay, magnetic);
            }
            "TerrainInitTextures" => world.environment.terrain.textures = Some(texture_grid(line)?),
            "TerrainInit" => world.environment.terrain.init_id = Some(line.int_or("id", 1)?),
            "TerrainMaterial" => {
                world.environment.terrain.materials.push(TerrainMaterial {
                    id: line.int_or("id", 0)?,
                    image: with_png(&line.string_or("image", "")),
                    uv: Point::new(line.float_or("u", 0.0)?, line.float_or("v", 0.0)?),
                    neighbours: [
                        line.int_or("up", 1)?,
                        line.int_or("right", 1)?,
                        line.int_or("down", 1)?,
                        line.int_or("left", 1)?,
                    ],
                    hard: line.float_or("hard", 0.5)?,
                });
            }
            "TerrainLevel" => {
                let ids: Vec<i32> = line
                    .list("id")
                    .iter()
                    .map(|s| s.parse::<i32>().map_err(|_| line.invalid(format!("bad material id '{}'", s))))
                    .collect::<Result<_, _>>()?;
                if ids.len() > MAX_TERRAIN_LEVEL_IDS {
                    return Err(line.invalid(format!("Too many arguments, max {}", MAX_TERRAIN_LEVEL_IDS)));
                }
                world.environment.terrain.levels.push(TerrainLevelRule {
                    ids,
                    min: line.float_or("min", 0.0)? * unit,
                    max: line.float_or("max", 100.0)? * unit,
                    slope: line.float_or("slope", 5.0)?,
                    freq: line.float_or("freq", 100.0)?,
                    center: line.point_or("center", Vec3::ZERO)? * unit,
                    radius: line.float_or("radius", 0.0)? * unit,
                });
            }
            "TerrainCreate" => world.environment.terrain.created = true,
            "LevelController" if !restoring => self.create_controller(line, world, scene)?,
            "CreateFog" => {
                let variant = line.int_or("type", 1)?.clamp(0, u8::MAX as i32) as u8;
                let pos = line.point_or("pos", Vec3::ZERO)? * unit;
                let height = line.float_or("height", 1.0)? * unit;
                let dim = line.float_or("dim", 50.0)? * unit;
                let pos = world.environment.terrain.adjust_to_floor(pos, height);
                world.particles.create(ParticleKind::Fog(variant), pos, dim, 0.0);
            }
            "CreateLight" => {
                let mut direction = line.point_or("dir", Vec3::ZERO)?;
                if direction == Vec3::ZERO {
                    direction = Vec3::new(0.0, -1.0, 0.0);
                }
                let color = line.color_or("color", Color::gray(0.5))?;
                let (include, exclude) = light_masks(line)?;
                world.environment.lights.push(SceneLight {
                    kind: LightKind::Directional { direction },
                    color,
                    ambient: scaled_color(color, 0.1),
                    include,
                    exclude,
                });
            }
            "CreateSpot" => {
                let mut position = line.point_or("pos", Vec3::ZERO)? * unit;
                position.y += world.environment.terrain.floor_level(position);
                let color = line.color_or("color", Color::gray(0.5))?;
                let (include, exclude) = light_masks(line)?;
                world.environment.lights.push(SceneLight {
                    kind: LightKind::Spot { position },
                    color,
                    ambient: scaled_color(color, 0.1),
                    include,
                    exclude,
                });
            }
            "GroundSpot" => {
                world.environment.ground_spots.push(GroundSpot {
                    pos: line.point_or("pos", Vec3::ZERO)? * unit,
                    radius: line.float_or("radius", 10.0)? * unit,
                    color: line.color_or("color", Color::gray(0.533))?,
                    smooth: line.float_or("smooth", 1.0)?,
                    min: line.float_or("min", 0.0)? * unit,
                    max: line.float_or("max", 0.0)? * unit,
                });
            }
            "WaterColor" => scene.colors.water = line.color_or("color", scene.colors.water)?,
            "MapColor" => {
                scene.map.floor = line.color_or("floor", scene.map.floor)?;
                scene.map.water = line.color_or("water", scene.map.water)?;
                scene.map.show = line.bool_or("show", true)?;
                scene.map.toy_icon = line.bool_or("toyIcon", false)?;
                scene.map.image = line.string_or("image", "");
            }
            "MapZoom" => {
                scene.map.zoom = line.float_or("factor", 2.0)?;
                scene.map.enabled = line.bool_or("enable", true)?;
            }
            "MaxFlyingHeight" => world.environment.terrain.max_flying_height = line.float_or("max", 280.0)? * unit,
            "AddFlyingHeight" => {
                world.environment.terrain.add_flying_limit(FlyingLimit {
                    center: line.point_or("center", Vec3::ZERO)? * unit,
                    ext_radius: line.float_or("extRadius", 20.0)? * unit,
                    int_radius: line.float_or("intRadius", 10.0)? * unit,
                    max_height: line.float_or("maxHeight", 200.0)?,
                });
            }
            "EndMissionTake" if !scene.has_controller => scene.end_take.push(EndCondition::read(line, unit)?),
            "EndMissionDelay" if !scene.has_controller => {
                scene.end_take_win_delay = line.float_or("win", 2.0)?;
                scene.end_take_lost_delay = line.float_or("lost", 2.0)?;
            }
            "EndMissionResearch" if !scene.has_controller => scene.end_take_research |= research_flag(line, "type")?,
            "EndMissionTake" | "EndMissionDelay" | "EndMissionResearch" => {
                log::debug!("{}: ignored, the mission controller decides the ending", line.command);
            }
            "ObligatoryToken" => push_token(&mut scene.obligatory_tokens, line),
            "ProhibitedToken" => push_token(&mut scene.prohibited_tokens, line),
            "EnableBuild" => scene.build |= build_flag(line)?,
            "EnableResearch" => scene.research_enable |= research_flag(line, "type")?,
            "DoneResearch" if !restoring => *scene.research_done_mut(0) |= research_flag(line, "type")?,
            "DoneResearch" => {}
            "NewScript" => {
                if scene.new_script_names.len() < MAX_NEW_SCRIPT_NAMES {
                    let kind = line.object_type_or("type", ObjectType::Null)?;
                    scene.new_script_names.push((kind.name(), line.string_or("name", "")));
                }
            }
            "CreateObject" | "LevelController" => {}
            _ if restoring => {}
            _ => {
                return Err(LevelError::UnknownCommand {
                    file: line.file.clone(),
                    line: line.line_number,
                    command: line.command.clone(),
                });
            }
        }
        Ok(())
    }

    fn create_controller(
        &mut self,
        line: &LevelLine,
        world: &mut GameWorld,
        scene: &mut SceneDescriptor,
    ) -> Result<(), LevelError> {
        let registry = &mut world.registry;
        let entity = registry
            .create(CreateParams::new(ObjectType::Controller, Vec3::ZERO).with_power(100.0))
            .map_err(|source| LevelError::Create {
                file: line.file.clone(),
                line: line.line_number,
                source,
            })?;
        if let Some(mut attrs) = registry.attributes_mut(entity) {
            attrs.magnify_damage = 100.0;
        }
        if let Some(mut flags) = registry.flags_mut(entity) {
            flags.selectable = false;
        }
        scene.has_controller = true;

        let script = line.string_or("script", "");
        if !script.is_empty() {
            if let Some(mut brain) = registry.get_mut::<Brain>(entity) {
                let slot = brain.add_program(Program {
                    read_only: true,
                    ..Program::from_file(&script)
                });
                brain.script_run = Some(slot);
            }
        }
        Ok(())
    }

    // ========================================================================
    // CreateObject
    // ========================================================================

    fn create_object(
        &mut self,
        line: &LevelLine,
        pass: &mut Pass,
        mode: &LoadMode,
        world: &mut GameWorld,
        scene: &SceneDescriptor,
    ) -> Result<(), LevelError> {
        let unit = pass.unit;
        let object_type = line.object_type("type")?;

        let gadget = match line.int_or("gadget", -1)? {
            -1 => object_type.is_default_gadget(),
            g => g != 0,
        };
        if gadget {
            let rank = pass.rank_gadget;
            pass.rank_gadget += 1;
            if !keep_gadget(self.settings.gadget_quantity, rank) {
                return Ok(());
            }
        }

        let params = CreateParams {
            object_type,
            position: line.point("pos")? * unit,
            angle: line.float_or("dir", 0.0)? * PI,
            power: line.float_or("power", 1.0)?,
            zoom: line.float_or("z", 1.0)?,
            height: line.float_or("h", 0.0)?,
            trainer: line.bool_or("trainer", false)?,
            toy: line.bool_or("toy", false)?,
            option: line.int_or("option", 0)?,
            team: line.int_or("team", 0)?,
            id: None,
        };

        let registry = &mut world.registry;
        let entity = match registry.create(params) {
            Ok(e) => e,
            Err(e) if gadget => {
                log::warn!("{}:{}: skipping gadget {}: {}", line.file, line.line_number, object_type.name(), e);
                return Ok(());
            }
            Err(source) => {
                return Err(LevelError::Create {
                    file: line.file.clone(),
                    line: line.line_number,
                    source,
                })
            }
        };

        if object_type == ObjectType::Base {
            pass.outcome.base = Some(entity);
        }
        if line.bool_or("select", false)? {
            pass.outcome.selected = Some(entity);
        }

        let camera_type = line.camera_type_or("camera", CameraType::Null)?;
        let camera_distance = line.float_or("cameraDist", 50.0)?;
        if let Some(mut prefs) = registry.get_mut::<CameraPrefs>(entity) {
            if camera_type != CameraType::Null {
                prefs.camera_type = camera_type;
            }
            prefs.distance = camera_distance;
        }

        let trainer = line.bool_or("trainer", false)?;
        let selectable = line.bool_or("selectable", true)?;
        let check_token = match line.get("checkToken") {
            Some(_) => line.bool("checkToken")?,
            None => trainer || !selectable,
        };
        let camera_lock = line.bool_or("cameraLock", false)?;
        let proxy_activate = line.bool_or("proxyActivate", false)?;
        let active = line.bool_or("enable", true)?;
        let reset = line.bool_or("reset", false)?;
        if let Some(mut flags) = registry.flags_mut(entity) {
            flags.selectable = selectable;
            flags.check_token = check_token;
            flags.camera_lock = camera_lock;
            flags.proxy_activate = proxy_activate;
            flags.active = active;
            flags.animate_on_reset = reset;
        }

        let proxy_distance = line.float_or("proxyDistance", 15.0)? * unit;
        let range = line.float_or("range", 30.0)?;
        let shield = line.float_or("shield", 1.0)?;
        let magnify_damage = line.float_or("magnifyDamage", 1.0)?;
        let rank = pass.rank_obj;
        if let Some(mut attrs) = registry.attributes_mut(entity) {
            attrs.proxy_distance = proxy_distance;
            attrs.range = range;
            attrs.shield = shield;
            attrs.magnify_damage = magnify_damage * scene.magnify_damage;
            attrs.def_rank = rank;
        }

        let zoom = line.point_or("zoom", Vec3::ZERO)?;
        if zoom != Vec3::ZERO {
            if let Some(mut transform) = registry.get_mut::<Transform>(entity) {
                transform.scale = zoom;
            }
        }

        let run = line.int_or("run", -1)?;
        if registry.implements(entity, Capability::Programmable) {
            let mut programs = Vec::new();
            let mut i = 1;
            loop {
                let name = format!("script{}", i);
                match line.get(&name) {
                    Some(p) => programs.push((
                        i - 1,
                        Program {
                            read_only: line.bool_or(&format!("scriptReadOnly{}", i), true)?,
                            runnable: line.bool_or(&format!("scriptRunnable{}", i), true)?,
                            ..Program::from_file(p.unquoted())
                        },
                    )),
                    None if i >= 10 => break,
                    None => {}
                }
                i += 1;
            }
            let soluce = line.string_or("soluce", "");
            if let Some(mut brain) = registry.get_mut::<Brain>(entity) {
                for (slot, program) in programs {
                    if let Some(target) = brain.program_mut(slot) {
                        *target = program;
                    }
                }
                if run > 0 {
                    brain.script_run = Some((run - 1) as usize);
                }
                if self.settings.show_soluce {
                    brain.soluce_name = soluce;
                }
            }
        }

        if let Some(mut automat) = registry.get_mut::<Automat>(entity) {
            automat.auto_type = match line.object_type_or("autoType", ObjectType::Null)? {
                ObjectType::Null => None,
                t => Some(t),
            };
            for (n, value) in automat.values.iter_mut().enumerate() {
                *value = line.float_or(&format!("autoValue{}", n + 1), 0.0)?;
            }
            automat.string = line.string_or("autoString", "");
            // Run state 3 is the opening cut-scene
            let run = if run == 3 && *mode != LoadMode::Fixed && !self.settings.movies {
                0
            } else {
                run
            };
            automat.run = run;
            if run != -1 {
                automat.start();
            }
        }

        if let Some(param) = line.get("pyro") {
            let kind = PyroType::from_name(param.unquoted())
                .ok_or_else(|| line.invalid(format!("unknown pyro type '{}'", param.unquoted())))?;
            world.pyro.create(kind, Some(entity), &mut world.registry);
        }

        pass.rank_obj += 1;
        Ok(())
    }

    // ========================================================================
    // PROGRAMS
    // ========================================================================

    /// Reads and compiles every program attached to a programmable object,
    /// then starts the auto-run programs
    fn compile_scripts(&mut self, level: &LevelId, world: &mut GameWorld) {
        let programmable: Vec<Entity> = world
            .registry
            .all()
            .into_iter()
            .filter(|e| world.registry.implements(*e, Capability::Programmable))
            .collect();

        for &entity in &programmable {
            if let Some(mut brain) = world.registry.get_mut::<Brain>(entity) {
                for program in brain.programs.iter_mut() {
                    if program.filename.is_empty() || !program.source.is_empty() {
                        continue;
                    }
                    match self.provider.read(&program_path(&program.filename)) {
                        Ok(source) => program.source = source,
                        Err(e) => log::error!("Unable to read script from file {}: {}", program.filename, e),
                    }
                }
                if self.settings.show_soluce && !brain.soluce_name.is_empty() {
                    let name = brain.soluce_name.clone();
                    match self.provider.read(&program_path(&name)) {
                        Ok(source) => {
                            brain.add_program(Program {
                                source,
                                read_only: true,
                                runnable: false,
                                ..Program::from_file(&name)
                            });
                        }
                        Err(e) => log::warn!("Unable to read solution {}: {}", name, e),
                    }
                }
                for program in brain.programs.iter_mut() {
                    if !program.source.is_empty() && !program.compiled {
                        self.scripts.compile(program);
                    }
                }
            }
            if let Some(dir) = self.settings.script_dir.as_deref() {
                persistence::load_object_programs(dir, level, &mut world.registry, entity, &mut *self.scripts);
            }
        }

        for entity in programmable {
            if let Some(mut brain) = world.registry.get_mut::<Brain>(entity) {
                if let Some(slot) = brain.script_run {
                    if !brain.run_program(slot) {
                        log::warn!("Auto-run program {} did not compile", slot + 1);
                    }
                }
            }
        }
    }
}

// ============================================================================
// PARAMETER HELPERS
// ============================================================================

fn audio_file(line: &LevelLine) -> Result<String, LevelError> {
    match line.get("track") {
        Some(_) => Ok(music_track_file(line.int("track")?)),
        None => Ok(line.string_or("filename", "")),
    }
}

fn with_png(name: &str) -> String {
    if name.is_empty() || Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{}.png", name)
    }
}

fn texture_grid(line: &LevelLine) -> Result<TextureGrid, LevelError> {
    let dx = line.int_or("dx", 1)?;
    let dy = line.int_or("dy", 1)?;
    if dx < 0 || dy < 0 {
        return Err(line.invalid("In TerrainInitTextures: dx and dy must not be negative"));
    }
    let cells = match dx.checked_mul(dy) {
        Some(cells) if cells <= MAX_TERRAIN_TEXTURE_CELLS => cells as usize,
        _ => {
            return Err(line.invalid(format!("In TerrainInitTextures: dx*dy must be <{}", MAX_TERRAIN_TEXTURE_CELLS)));
        }
    };
    let values = line.list("table");
    if values.len() > cells {
        return Err(line.invalid("In TerrainInitTextures: table size must be dx*dy"));
    }
    let mut table = vec![0; cells];
    for (slot, value) in table.iter_mut().zip(&values) {
        *slot = value
            .parse()
            .map_err(|_| line.invalid(format!("bad texture index '{}'", value)))?;
    }
    Ok(TextureGrid {
        name: with_png(&line.string_or("image", "")),
        dx,
        dy,
        table,
    })
}

fn light_masks(line: &LevelLine) -> Result<(u32, u32), LevelError> {
    let mut include = 0;
    let mut exclude = 0;
    for name in line.list("type") {
        let (target, bare) = match name.strip_prefix('!') {
            Some(bare) => (&mut exclude, bare),
            None => (&mut include, name.as_str()),
        };
        *target |= light_mask::from_name(bare).ok_or_else(|| line.invalid(format!("unknown light type '{}'", bare)))?;
    }
    Ok((include, exclude))
}

fn scaled_color(color: Color, factor: f32) -> Color {
    Color::new(color.r * factor, color.g * factor, color.b * factor, color.a)
}

fn push_token(list: &mut Vec<String>, line: &LevelLine) {
    if list.len() < MAX_TOKENS {
        list.push(line.string_or("text", ""));
    }
}

fn research_flag(line: &LevelLine, name: &str) -> Result<u32, LevelError> {
    let text = line.string(name)?;
    research::from_name(&text).ok_or_else(|| line.invalid(format!("unknown research '{}'", text)))
}

fn build_flag(line: &LevelLine) -> Result<u32, LevelError> {
    let text = line.string("type")?;
    build::from_name(&text).ok_or_else(|| line.invalid(format!("unknown building '{}'", text)))
}
