//! Mission orchestrator - the phase machine and everything that runs while
//! a mission is on screen.
//!
//! The orchestrator owns the world, the scene descriptor and the interface
//! layer. It reacts to events handed down by the application (input, frame
//! ticks, interface buttons) and pushes follow-up events (Win, Lost, Quit,
//! UpdateInterface) back into the application queue.
//!
//! Work is split by concern:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `phase` | Phase transitions, scene construction, endings, save/restore |
//! | `frame` | Ordered per-frame driver |
//! | `input` | Event dispatch per phase and interaction mode |
//! | `end_mission` | End-of-mission evaluation and countdowns |
//! | `selection` | Selection, highlight, tooltips, camera cycling |
//! | `console` | Command console verbs |
//! | `show_limit` | Boundary rings around objects |
//! | `visit` | Guided camera visit of a message location |
//! | `research` | Build and factory gating |

mod console;
mod end_mission;
mod frame;
mod input;
mod phase;
mod research;
mod selection;
mod show_limit;
mod visit;

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;

use hecs::Entity;
use rand::rngs::StdRng;
use rand::SeedableRng;

use botfield_logic::console::RenderToggle;
use botfield_logic::constants::{MAX_SHOW_LIMIT, SELECTION_HISTORY_LEN, TOOLTIP_DELAY};
use botfield_logic::end_mission::MissionResult;
use botfield_logic::mission::{format_mission_time, LevelCategory, LevelId};
use botfield_logic::phase::Phase;
use botfield_logic::selection_history::SelectionHistory;

use crate::config::RuntimeConfig;
use crate::event::{Event, EventHandler, EventQueue, EventType};
use crate::frame_gate::{ObjectPose, RenderSnapshot};
use crate::level::LevelProvider;
use crate::math::Point;
use crate::profile::PlayerProfile;
use crate::scene::SceneDescriptor;
use crate::script::ScriptHost;
use crate::services::{DialogKind, Interface};
use crate::world::GameWorld;

pub use research::BuildRefusal;
pub use show_limit::ShowLimitSlot;
pub use visit::VisitState;

// ============================================================================
// MODES
// ============================================================================

/// Who may drive the simulation right now. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Normal,
    /// A cut-scene owns the camera; input only aborts it
    CutsceneLocked,
    /// A script editor is open; `full` hides the 3D view
    EditLocked { full: bool },
    /// Free camera with the simulation frozen
    PhotoMode,
    /// Camera flies around a message location
    VisitMode,
}

impl InteractionMode {
    pub fn is_edit_locked(&self) -> bool {
        matches!(self, InteractionMode::EditLocked { .. })
    }

    pub fn is_edit_full(&self) -> bool {
        matches!(self, InteractionMode::EditLocked { full: true })
    }
}

/// Why game time is frozen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseType {
    #[default]
    None,
    User,
    /// Command console open
    Cheat,
    Photo,
    /// Code battle waiting for the player to start it
    CodeBattleLock,
    Editor,
    Dialog,
}

/// Mission stopwatch shown when the level asks for it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MissionTimer {
    pub enabled: bool,
    pub started: bool,
    pub elapsed: f32,
}

impl MissionTimer {
    pub fn stop(&mut self) {
        self.enabled = false;
        self.started = false;
    }

    /// `m:ss.cc` while the timer runs
    pub fn text(&self) -> Option<String> {
        (self.enabled && self.started).then(|| format_mission_time(self.elapsed))
    }
}

/// Tooltip under the mouse, shown after a short hover
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub pos: Point,
    pub text: String,
    pub timer: f32,
}

impl Tooltip {
    pub fn is_visible(&self) -> bool {
        self.timer >= TOOLTIP_DELAY
    }
}

/// Pulsing status icons, `None` when hidden
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Indicators {
    pub movie: Option<f32>,
    pub edit: Option<f32>,
    pub saving: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct CodeBattle {
    init: bool,
    started: bool,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct MissionOrchestrator {
    /// Objects and the per-level services
    pub world: GameWorld,
    /// Everything the level file declared
    pub scene: SceneDescriptor,
    /// Controls, console and dialogs
    pub interface: Interface,
    pub config: RuntimeConfig,
    pub profile: PlayerProfile,
    provider: Box<dyn LevelProvider>,
    scripts: Box<dyn ScriptHost>,

    phase: Phase,
    world_exists: bool,
    /// Mission chosen in the level list
    mission_level: LevelId,
    /// Scene currently built (the mission or one of its endings)
    level: LevelId,
    pending_restore: Option<PathBuf>,

    mode: InteractionMode,
    pause: PauseType,
    speed: f32,
    shortcuts: bool,
    select_insect: bool,
    show_soluce: bool,
    show_all: bool,
    cheat_radar: bool,
    trainer_pilot: bool,
    debug_mode: bool,
    show_stats: bool,
    inverted_render: HashSet<RenderToggle>,

    history: SelectionHistory<Entity>,
    base: Option<Entity>,
    highlighted: Option<Entity>,
    tooltip: Option<Tooltip>,
    mouse_pos: Point,
    /// Held camera buttons, -1..1
    camera_pan: f32,
    camera_zoom: f32,

    time: f32,
    game_time: f32,
    game_time_absolute: f32,
    mission_timer: MissionTimer,
    autosave_last: f32,
    saves_in_flight: u32,

    mission_result: MissionResult,
    win_delay: f32,
    lost_delay: f32,
    win_terminate: bool,
    defeated_teams: BTreeSet<i32>,
    winner_announced: bool,
    quit_posted: bool,
    begin_satcom: bool,
    reset_pending: bool,

    show_limits: [Option<ShowLimitSlot>; MAX_SHOW_LIMIT],
    visit: Option<VisitState>,
    indicators: Indicators,
    code_battle: CodeBattle,

    rng: StdRng,
    outbox: VecDeque<Event>,
    time_reset_requested: bool,
}

impl MissionOrchestrator {
    pub fn new(config: RuntimeConfig, provider: Box<dyn LevelProvider>, scripts: Box<dyn ScriptHost>) -> Self {
        let profile = PlayerProfile::new(&config.player_name);
        let select_insect = config.select_insect;
        let show_soluce = config.show_soluce;
        Self {
            world: GameWorld::new(),
            scene: SceneDescriptor::default(),
            interface: Interface::new(),
            config,
            profile,
            provider,
            scripts,
            phase: Phase::Welcome1,
            world_exists: false,
            mission_level: LevelId::new(LevelCategory::Missions, 1, 1),
            level: LevelId::new(LevelCategory::Missions, 1, 1),
            pending_restore: None,
            mode: InteractionMode::Normal,
            pause: PauseType::None,
            speed: 1.0,
            shortcuts: true,
            select_insect,
            show_soluce,
            show_all: false,
            cheat_radar: false,
            trainer_pilot: false,
            debug_mode: false,
            show_stats: false,
            inverted_render: HashSet::new(),
            history: SelectionHistory::with_capacity(SELECTION_HISTORY_LEN),
            base: None,
            highlighted: None,
            tooltip: None,
            mouse_pos: Point::default(),
            camera_pan: 0.0,
            camera_zoom: 0.0,
            time: 0.0,
            game_time: 0.0,
            game_time_absolute: 0.0,
            mission_timer: MissionTimer::default(),
            autosave_last: 0.0,
            saves_in_flight: 0,
            mission_result: MissionResult::NotTerminated,
            win_delay: 0.0,
            lost_delay: 0.0,
            win_terminate: false,
            defeated_teams: BTreeSet::new(),
            winner_announced: false,
            quit_posted: false,
            begin_satcom: false,
            reset_pending: false,
            show_limits: Default::default(),
            visit: None,
            indicators: Indicators::default(),
            code_battle: CodeBattle::default(),
            rng: StdRng::from_entropy(),
            outbox: VecDeque::new(),
            time_reset_requested: false,
        }
    }

    pub fn with_profile(mut self, profile: PlayerProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Deterministic visual jitter, for tests and replays
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether terrain and objects currently exist
    pub fn world_exists(&self) -> bool {
        self.world_exists
    }

    pub fn mission_level(&self) -> LevelId {
        self.mission_level
    }

    /// Picks the mission the next Simul phase loads
    pub fn select_level(&mut self, level: LevelId) {
        self.mission_level = level;
    }

    /// Scene currently built
    pub fn level(&self) -> LevelId {
        self.level
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn pause(&self) -> PauseType {
        self.pause
    }

    /// Whether scaled time should stop advancing
    pub fn is_simulation_paused(&self) -> bool {
        self.pause != PauseType::None || self.mode == InteractionMode::VisitMode
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        self.interface.set_speed_button(speed);
    }

    pub fn selected(&self) -> Option<Entity> {
        self.world.registry.selected()
    }

    pub fn highlighted(&self) -> Option<Entity> {
        self.highlighted
    }

    /// Tooltip text once the hover delay has elapsed
    pub fn visible_tooltip(&self) -> Option<&str> {
        self.tooltip.as_ref().filter(|t| t.is_visible()).map(|t| t.text.as_str())
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn base(&self) -> Option<Entity> {
        self.base
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    pub fn game_time_absolute(&self) -> f32 {
        self.game_time_absolute
    }

    pub fn mission_timer(&self) -> MissionTimer {
        self.mission_timer
    }

    pub fn mission_result(&self) -> MissionResult {
        self.mission_result
    }

    pub fn win_delay(&self) -> f32 {
        self.win_delay
    }

    pub fn lost_delay(&self) -> f32 {
        self.lost_delay
    }

    /// Whether the current win ends the campaign
    pub fn is_final_win(&self) -> bool {
        self.win_terminate
    }

    pub fn indicators(&self) -> Indicators {
        self.indicators
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn is_showing_stats(&self) -> bool {
        self.show_stats
    }

    pub fn is_render_inverted(&self, toggle: RenderToggle) -> bool {
        self.inverted_render.contains(&toggle)
    }

    pub fn is_select_insect(&self) -> bool {
        self.select_insect
    }

    pub fn is_show_soluce(&self) -> bool {
        self.show_soluce
    }

    pub fn is_show_all(&self) -> bool {
        self.show_all
    }

    pub fn is_cheat_radar(&self) -> bool {
        self.cheat_radar
    }

    /// Whether trainer vehicles may be driven by hand
    pub fn is_trainer_pilot(&self) -> bool {
        self.trainer_pilot
    }

    /// Whether the player may still act (code battles lock out the player
    /// once started)
    pub fn can_player_interact(&self) -> bool {
        !(self.code_battle.started && self.scene.mission_type == botfield_logic::mission::MissionType::CodeBattle)
    }

    /// Events produced outside event dispatch (direct method calls)
    pub fn take_events(&mut self) -> Vec<Event> {
        self.outbox.drain(..).collect()
    }

    /// Whether a scene was built since the last call; the caller should
    /// drop the time spent loading
    pub fn take_time_reset(&mut self) -> bool {
        std::mem::take(&mut self.time_reset_requested)
    }

    /// Scripts interpreter in use
    pub fn scripts(&self) -> &dyn ScriptHost {
        self.scripts.as_ref()
    }

    /// Consistent copy of what the renderer needs
    pub fn render_snapshot(&self, frame: u64) -> RenderSnapshot {
        let registry = &self.world.registry;
        let objects = registry
            .all()
            .into_iter()
            .filter_map(|e| {
                let transform = registry.transform(e)?;
                Some(ObjectPose {
                    id: registry.id(e)?,
                    position: transform.position,
                    rotation: transform.rotation,
                    scale: transform.scale,
                    highlighted: registry.flags(e).highlighted,
                })
            })
            .collect();
        RenderSnapshot {
            frame,
            camera_eye: self.world.camera.eye,
            camera_target: self.world.camera.look_at,
            objects,
        }
    }

    // ========================================================================
    // MODE AND PAUSE
    // ========================================================================

    fn post(&mut self, event_type: EventType) {
        self.outbox.push_back(Event::new(event_type));
    }

    fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
        self.interface.console_enabled = matches!(
            mode,
            InteractionMode::Normal | InteractionMode::PhotoMode | InteractionMode::VisitMode
        );
    }

    /// Cut-scene lock, taken and released by automata and scripts
    pub fn set_movie_lock(&mut self, lock: bool) {
        if lock {
            self.set_mode(InteractionMode::CutsceneLocked);
            self.interface.add_control(
                EventType::ObjectMovieLock,
                crate::services::Rect::new(0.0, 0.0, 1.0, 1.0),
                None,
            );
            self.hilite_clear();
        } else if self.mode == InteractionMode::CutsceneLocked {
            self.set_mode(InteractionMode::Normal);
            self.interface.remove_control(EventType::ObjectMovieLock);
        }
    }

    /// Program editor lock; a full lock hides the 3D view
    pub fn set_edit_lock(&mut self, lock: bool, full: bool) {
        if lock {
            self.set_mode(InteractionMode::EditLocked { full });
            self.hilite_clear();
        } else if self.mode.is_edit_locked() {
            self.set_mode(InteractionMode::Normal);
        }
    }

    pub fn change_pause(&mut self, pause: PauseType) {
        self.pause = pause;
        self.world.sound.mute_all(pause != PauseType::None);
        self.hilite_clear();
    }

    fn show_dialog(&mut self, dialog: DialogKind) {
        self.interface.show_dialog(dialog);
        if self.pause == PauseType::None {
            self.change_pause(PauseType::Dialog);
        }
    }

    fn close_dialog(&mut self) -> Option<DialogKind> {
        let dialog = self.interface.close_dialog();
        if self.pause == PauseType::Dialog {
            self.change_pause(PauseType::None);
        }
        dialog
    }
}

impl EventHandler for MissionOrchestrator {
    fn process_event(&mut self, event: &Event, queue: &mut EventQueue) -> bool {
        let pass = self.handle_event(event);
        queue.extend(self.outbox.drain(..));
        pass
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::level::MemoryLevelProvider;
    use crate::script::BasicScriptHost;

    pub const BASIC_LEVEL: &str = "\
Title text=\"Test field\"
Instructions name=\"field.txt\"
TerrainGenerate
TerrainCreate
BeginObject
CreateObject type=Me pos=0;0
CreateObject type=WheeledGrabber pos=10;10 select=1
CreateObject type=PowerCell pos=20;20
CreateObject type=AlienAnt pos=-20;-20
EndMissionTake pos=0;0 dist=1000 type=Me lost=0
EndMissionTake pos=0;0 dist=1000 type=AlienAnt min=0 max=0
EndMissionDelay win=0.5 lost=0.5
";

    pub fn temp_config(tag: &str) -> RuntimeConfig {
        let dir = std::env::temp_dir().join(format!("botfield-orch-{}-{}", tag, std::process::id()));
        RuntimeConfig {
            save_dir: dir,
            ..Default::default()
        }
    }

    pub fn orchestrator_with(tag: &str, level: &str) -> MissionOrchestrator {
        let mission = LevelId::new(LevelCategory::Missions, 1, 1);
        let provider = MemoryLevelProvider::new().with_level(&mission, level);
        let mut orch =
            MissionOrchestrator::new(temp_config(tag), Box::new(provider), Box::new(BasicScriptHost::new())).with_seed(7);
        orch.select_level(mission);
        orch
    }

    /// Orchestrator already in Simul with [`BASIC_LEVEL`] loaded
    pub fn simul(tag: &str) -> MissionOrchestrator {
        let mut orch = orchestrator_with(tag, BASIC_LEVEL);
        orch.change_phase(Phase::Simul);
        assert_eq!(orch.phase(), Phase::Simul);
        orch
    }

    pub fn cleanup(orch: &MissionOrchestrator) {
        let _ = std::fs::remove_dir_all(&orch.config.save_dir);
    }

    #[test]
    fn test_new_orchestrator_starts_without_world() {
        let orch = orchestrator_with("new", BASIC_LEVEL);
        assert_eq!(orch.phase(), Phase::Welcome1);
        assert!(!orch.world_exists());
        assert_eq!(orch.mode(), InteractionMode::Normal);
        assert_eq!(orch.pause(), PauseType::None);
        assert_eq!(orch.speed(), 1.0);
    }

    #[test]
    fn test_movie_lock_disables_console() {
        let mut orch = simul("movie-lock");
        orch.set_movie_lock(true);
        assert_eq!(orch.mode(), InteractionMode::CutsceneLocked);
        assert!(!orch.interface.console_enabled);
        assert!(orch.interface.control(EventType::ObjectMovieLock).is_some());
        orch.set_movie_lock(false);
        assert_eq!(orch.mode(), InteractionMode::Normal);
        assert!(orch.interface.console_enabled);
        cleanup(&orch);
    }

    #[test]
    fn test_pause_mutes_sound() {
        let mut orch = simul("pause");
        orch.change_pause(PauseType::User);
        assert!(orch.world.sound.is_muted());
        assert!(orch.is_simulation_paused());
        orch.change_pause(PauseType::None);
        assert!(!orch.world.sound.is_muted());
        cleanup(&orch);
    }

    #[test]
    fn test_render_snapshot_lists_objects() {
        let orch = simul("snapshot");
        let snapshot = orch.render_snapshot(3);
        assert_eq!(snapshot.frame, 3);
        assert_eq!(snapshot.objects.len(), orch.world.registry.len());
        cleanup(&orch);
    }

    #[test]
    fn test_mission_timer_text() {
        let mut timer = MissionTimer {
            enabled: true,
            started: true,
            elapsed: 65.5,
        };
        assert_eq!(timer.text().as_deref(), Some("1:05.50"));
        timer.stop();
        assert_eq!(timer.text(), None);
    }
}
