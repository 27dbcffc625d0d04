//! Phase transitions, scene construction, endings and save/restore.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use botfield_logic::camera::CameraType;
use botfield_logic::constants::{FINAL_ENDING_RANK, TRY_COUNT_MIN_TIME};
use botfield_logic::end_mission::MissionResult;
use botfield_logic::mission::{LevelCategory, LevelId};
use botfield_logic::object_type::ObjectType;
use botfield_logic::phase::{needs_world_reset, Phase};

use crate::event::EventType;
use crate::level::{level_path, LevelError};
use crate::loader::{LoadMode, LoadOutcome, LoaderSettings, SceneLoader};
use crate::persistence::{self, SaveError};
use crate::scene::InfoSlot;
use crate::services::{DialogKind, Notice, PyroType, Rect};

use super::{CodeBattle, Indicators, InteractionMode, MissionOrchestrator, MissionTimer, PauseType};

/// Object command buttons shown along the bottom edge during a mission
const OBJECT_BUTTONS: &[(EventType, &str)] = &[
    (EventType::ObjectDeselect, "Previous selection"),
    (EventType::ObjectCamera, "Camera"),
    (EventType::ObjectCameraLeft, "Camera to left"),
    (EventType::ObjectCameraRight, "Camera to right"),
    (EventType::ObjectCameraNear, "Zoom camera in"),
    (EventType::ObjectCameraAway, "Zoom camera out"),
    (EventType::ObjectHelp, "Help about selected object"),
    (EventType::ObjectLimit, "Show the range"),
    (EventType::ObjectDelete, "Destroy the building"),
    (EventType::ObjectBigHelp, "Instructions for the mission"),
    (EventType::ObjectSoluce, "Solution"),
];

const BUTTON_SIZE: f32 = 0.05;

impl MissionOrchestrator {
    // ========================================================================
    // PHASE MACHINE
    // ========================================================================

    /// Switches to `phase`. The world is torn down and rebuilt whenever the
    /// transition crosses the boundary between world and menu phases.
    /// In-mission setup screens are refused while no mission is loaded.
    pub fn change_phase(&mut self, phase: Phase) {
        if phase.is_simulation_config() && !self.world_exists {
            log::warn!("Refusing {:?} without a loaded mission", phase);
            return;
        }
        let reset_world = needs_world_reset(self.phase, phase);
        self.switch_phase(phase, reset_world);
    }

    fn switch_phase(&mut self, phase: Phase, reset_world: bool) {
        let old = self.phase;
        log::info!("Phase {:?} -> {:?}", old, phase);

        if reset_world {
            self.mission_timer = MissionTimer::default();
            if old == Phase::Simul || old.is_simulation_config() {
                self.leave_simulation();
            }
            if phase == Phase::Win {
                self.profile.set_level_passed(&self.mission_level, true);
                self.next_mission();
            }
            self.teardown_world();
        }

        self.phase = phase;

        if reset_world {
            self.reset_transient_state();
        }
        self.rebuild_interface();

        if reset_world {
            match phase {
                Phase::Simul => self.enter_simulation(),
                Phase::Win => self.enter_ending(true),
                Phase::Lost => self.enter_ending(false),
                _ => {}
            }
            // A failed load has already moved on to another phase
            if self.phase == phase {
                self.world_exists = phase.has_world();
            }
        }
    }

    fn leave_simulation(&mut self) {
        let player_dir = self.config.player_dir();
        if let Err(e) = persistence::save_object_programs(&player_dir, &self.level, &self.world.registry) {
            log::error!("Unable to save programs to {}: {}", player_dir.display(), e);
        }
        self.world.sound.stop_music();
        self.world.camera.set_controlling(None);
        if self.game_time > TRY_COUNT_MIN_TIME {
            self.profile.increment_try_count(&self.mission_level);
        }
    }

    /// Moves the mission choice to the following level when it exists
    fn next_mission(&mut self) {
        let next = LevelId::new(self.mission_level.category, self.mission_level.chap, self.mission_level.rank + 1);
        if self.provider.exists(&level_path(&next, &self.config.custom_dir)) {
            self.mission_level = next;
        }
    }

    fn teardown_world(&mut self) {
        self.visit = None;
        self.show_limits = Default::default();
        self.world.teardown();
        self.history.clear();
        self.base = None;
        self.highlighted = None;
        self.tooltip = None;
        self.world_exists = false;
    }

    fn reset_transient_state(&mut self) {
        self.win_delay = 0.0;
        self.lost_delay = 0.0;
        self.mission_result = MissionResult::NotTerminated;
        self.win_terminate = false;
        self.defeated_teams.clear();
        self.winner_announced = false;
        self.quit_posted = false;
        self.begin_satcom = false;
        self.reset_pending = false;
        self.set_mode(InteractionMode::Normal);
        self.change_pause(PauseType::None);
        self.world.display.flush();
        self.set_speed(1.0);
        self.world.camera.reset();
        self.shortcuts = true;
        self.code_battle = CodeBattle::default();
        self.indicators = Indicators::default();
    }

    fn rebuild_interface(&mut self) {
        self.interface.clear();
        self.interface.set_speed_button(self.speed);
        match self.phase {
            Phase::Simul => {
                for (i, (event_type, tooltip)) in OBJECT_BUTTONS.iter().enumerate() {
                    let rect = Rect::new(i as f32 * BUTTON_SIZE, 0.0, BUTTON_SIZE, BUTTON_SIZE);
                    self.interface.add_control(*event_type, rect, Some(tooltip));
                }
                if self.mode == InteractionMode::CutsceneLocked {
                    self.interface.add_control(EventType::ObjectMovieLock, Rect::new(0.0, 0.0, 1.0, 1.0), None);
                }
                if self.mode == InteractionMode::VisitMode {
                    self.add_visit_end_button();
                }
            }
            Phase::Win | Phase::Lost => {
                self.interface
                    .add_control(EventType::ButtonOk, Rect::new(0.4, 0.05, 0.2, 0.08), Some("OK"));
            }
            _ => {}
        }
        self.set_mode(self.mode);
    }

    // ========================================================================
    // SCENE CONSTRUCTION
    // ========================================================================

    fn build_scene(&mut self, mode: &LoadMode) -> Result<LoadOutcome, LevelError> {
        let mut settings = LoaderSettings::from(&self.config);
        settings.show_soluce = self.show_soluce;
        let level = self.level;
        let mut loader = SceneLoader::new(self.provider.as_ref(), self.scripts.as_mut(), &mut self.profile, &settings);
        loader.create_scene(&level, mode, &mut self.world, &mut self.scene)
    }

    fn enter_simulation(&mut self) {
        let mode = match self.pending_restore.take() {
            Some(dir) => LoadMode::Restore(dir),
            None => LoadMode::Interactive,
        };
        self.level = self.mission_level;
        let outcome = match self.build_scene(&mode) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.level_loading_error(&e);
                return;
            }
        };
        self.finish_scene(&outcome, false);
        self.time_reset_requested = true;

        if self.scene.immediat_satcom && !self.scene.info_file(InfoSlot::Huston).is_empty() {
            self.start_display_info(InfoSlot::Huston);
        }
        self.world.sound.stop_music();
        if self.base.is_none() || outcome.restored {
            self.start_music();
        }
        log::info!(
            "Mission {:?} {}.{} started: {} objects",
            self.level.category,
            self.level.chap,
            self.level.rank,
            self.world.registry.len()
        );
    }

    /// Selection, base and clocks once a scene has been built
    fn finish_scene(&mut self, outcome: &LoadOutcome, reset: bool) {
        self.base = outcome.base;
        if !reset {
            self.mission_timer.enabled = self.scene.mission_timer_enabled;
            self.time = 0.0;
            self.game_time = 0.0;
            self.game_time_absolute = 0.0;
            self.autosave_last = 0.0;
        }
        let selected = outcome.selected.or_else(|| {
            if self.base.is_none() && !self.scene.fixed_scene {
                self.world.registry.find_nearest(None, ObjectType::Human)
            } else {
                None
            }
        });
        if let Some(entity) = selected {
            self.select_one_object(entity);
        }
    }

    fn enter_ending(&mut self, win: bool) {
        self.world.sound.stop_all();
        let rank = if win { self.scene.ending_win } else { self.scene.ending_lost };
        if rank == -1 {
            self.change_phase(Phase::LevelList);
            return;
        }
        self.win_terminate = win && rank == FINAL_ENDING_RANK;
        if rank > 0 {
            let category = if win { LevelCategory::Win } else { LevelCategory::Lost };
            self.level = LevelId::ending(category, rank);
            match self.build_scene(&LoadMode::Fixed) {
                Ok(_) => self.time_reset_requested = true,
                Err(e) => log::warn!("Ending scene {} unavailable, showing text only: {}", rank, e),
            }
        }
        self.world.display.display_notice(if win { Notice::Win } else { Notice::Lost });
    }

    fn level_loading_error(&mut self, error: &LevelError) {
        log::error!("Unable to load level: {}", error);
        self.change_phase(Phase::LevelList);
        self.interface.show_dialog(DialogKind::Information {
            title: "Loading error".to_string(),
            text: error.to_string(),
        });
    }

    pub(super) fn start_music(&mut self) {
        if !self.scene.audio_track.is_empty() {
            self.world.sound.play_music(&self.scene.audio_track, self.scene.audio_repeat);
        }
    }

    /// Opens the info window on one of the level's documents
    pub(super) fn start_display_info(&mut self, slot: InfoSlot) {
        let file = self.scene.info_file(slot).to_string();
        if file.is_empty() {
            return;
        }
        self.hilite_clear();
        self.world.display.start_display_info(&file);
        if slot == InfoSlot::Huston {
            self.begin_satcom = true;
        }
    }

    // ========================================================================
    // RESET REPLAY
    // ========================================================================

    /// Puts every object back where the level placed it, on the next frame
    pub fn reset_object(&mut self) {
        self.reset_pending = true;
    }

    pub(super) fn reset_create(&mut self) {
        self.reset_pending = false;
        let player_dir = self.config.player_dir();
        if let Err(e) = persistence::save_object_programs(&player_dir, &self.level, &self.world.registry) {
            log::error!("Unable to save programs to {}: {}", player_dir.display(), e);
        }
        self.deselect_all();
        self.visit = None;
        self.show_limits = Default::default();
        self.history.clear();
        self.highlighted = None;
        self.world.registry.clear();
        self.world.pyro.delete_all();
        self.world.particles.flush();
        self.world.camera.set_type(CameraType::Dialog);

        match self.build_scene(&LoadMode::ResetObjects) {
            Ok(outcome) => {
                for entity in &outcome.reset_objects {
                    self.world.pyro.create(PyroType::Reset, Some(*entity), &mut self.world.registry);
                }
                self.finish_scene(&outcome, true);
                log::info!("Objects reset, {} flashing", outcome.reset_objects.len());
            }
            Err(e) => self.level_loading_error(&e),
        }
    }

    // ========================================================================
    // SAVE / RESTORE
    // ========================================================================

    /// Saves the running mission into `dir`
    pub fn save_scene(&mut self, dir: &Path, info: &str) -> Result<(), SaveError> {
        self.write_save(dir, info)?;
        self.world.display.display_notice(Notice::WriteOk);
        Ok(())
    }

    fn write_save(&mut self, dir: &Path, info: &str) -> Result<(), SaveError> {
        persistence::write_scene(dir, info, &self.level, &self.world, &self.scene, self.scripts.as_ref())?;
        self.saves_in_flight += 1;
        self.post(EventType::WriteSceneFinished);
        log::info!("Saved '{}' to {}", info, dir.display());
        Ok(())
    }

    pub(super) fn save_finished(&mut self) {
        self.saves_in_flight = self.saves_in_flight.saturating_sub(1);
    }

    /// Resumes the game saved in `dir`
    pub fn load_scene(&mut self, dir: &Path) -> Result<(), SaveError> {
        let info = persistence::read_save_info(dir)?;
        log::info!("Loading '{}' from {}", info.title, dir.display());
        self.mission_level = info.level;
        self.pending_restore = Some(dir.to_path_buf());
        // Loading from an in-mission menu still rebuilds the world
        self.switch_phase(Phase::Simul, true);
        Ok(())
    }

    // ========================================================================
    // AUTOSAVE
    // ========================================================================

    /// Writes an autosave into a freshly rotated slot. Returns its directory,
    /// or `None` when autosave is disabled.
    pub fn autosave(&mut self) -> Result<Option<PathBuf>, SaveError> {
        let player_dir = self.config.player_dir();
        let Some(slot) = persistence::autosave_rotate(&player_dir, &self.config.autosave, true)? else {
            return Ok(None);
        };
        let dir = persistence::autosave_dir(&player_dir, slot);
        let info = format!("[AUTOSAVE] {}", timestamp());
        self.write_save(&dir, &info)?;
        Ok(Some(dir))
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        if self.config.autosave.enabled == enabled {
            return;
        }
        self.config.autosave.enabled = enabled;
        self.autosave_last = self.game_time_absolute;
        self.rotate_autosaves();
    }

    /// Interval in minutes of absolute game time
    pub fn set_autosave_interval(&mut self, interval: i32) {
        if self.config.autosave.interval == interval {
            return;
        }
        self.config.autosave.interval = interval;
        self.autosave_last = self.game_time_absolute;
    }

    pub fn set_autosave_slots(&mut self, slots: i32) {
        if self.config.autosave.slots == slots {
            return;
        }
        self.config.autosave.slots = slots;
        self.rotate_autosaves();
    }

    fn rotate_autosaves(&mut self) {
        let player_dir = self.config.player_dir();
        if let Err(e) = persistence::autosave_rotate(&player_dir, &self.config.autosave, false) {
            log::error!("Autosave rotation failed in {}: {}", player_dir.display(), e);
        }
    }
}

fn timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}
