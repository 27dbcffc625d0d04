//! The per-frame driver. Steps run in a fixed order; later steps read what
//! earlier ones produced during the same frame.

use botfield_logic::camera::CameraType;
use botfield_logic::constants::SATCOM_WELCOME_DELAY;
use botfield_logic::mission::MissionType;
use botfield_logic::object_type::{Capability, ObjectType};
use botfield_logic::phase::Phase;

use crate::event::EventType;
use crate::services::Notice;

use super::{InteractionMode, MissionOrchestrator, PauseType};

/// Camera pan speed while a pan button is held, per second
const PAN_SPEED: f32 = 1.5;
/// Camera zoom speed while a zoom button is held, per second
const ZOOM_SPEED: f32 = 0.3;

impl MissionOrchestrator {
    /// Advances the mission by one frame of `rel_time` scaled seconds and
    /// `real_rel_time` wall-clock seconds
    pub fn frame_update(&mut self, rel_time: f32, real_rel_time: f32) {
        if self.reset_pending {
            self.reset_create();
        }
        self.world.display.frame(rel_time);
        if !self.world_exists {
            self.hilite_frame(rel_time);
            return;
        }
        self.remote_camera(rel_time);
        self.sync_console_pause();

        // Welcome hint
        if !self.scene.immediat_satcom
            && !self.begin_satcom
            && self.mode != InteractionMode::CutsceneLocked
            && self.game_time > SATCOM_WELCOME_DELAY
            && self.phase == Phase::Simul
        {
            self.world.display.display_notice(Notice::BeginSatCom);
            self.begin_satcom = true;
        }

        // Clocks
        self.time += rel_time;
        let running = self.mode != InteractionMode::CutsceneLocked && !self.is_simulation_paused();
        if running {
            self.game_time += rel_time;
            self.game_time_absolute += real_rel_time;
        }
        if running && self.mission_timer.started {
            self.mission_timer.elapsed += rel_time;
        }

        // Autosave
        if running
            && self.config.autosave.enabled
            && self.phase == Phase::Simul
            && self.level.category.allows_autosave()
            && self.game_time_absolute >= self.autosave_last + self.config.autosave.interval as f32 * 60.0
        {
            self.autosave_last = self.game_time_absolute;
            if let Err(e) = self.autosave() {
                log::error!("Autosave failed: {}", e);
            }
        }

        self.world.environment.advance(rel_time);

        let frozen = self.mode == InteractionMode::PhotoMode;
        if !frozen {
            self.update_objects(rel_time);
            self.world.pyro.frame(&mut self.world.registry, rel_time);
            self.world.particles.frame(rel_time);
        }

        let camera_runs = match self.phase {
            Phase::Simul => !self.mode.is_edit_full(),
            Phase::Appearance | Phase::Win | Phase::Lost => true,
            _ => false,
        };
        if camera_runs {
            self.world.camera.frame(&self.world.registry, rel_time);
        }

        if !frozen {
            self.update_toto(rel_time);
        }
        self.hilite_frame(rel_time);
        self.update_indicators();

        if self.world.camera.camera_type() == CameraType::Visit {
            self.frame_visit(rel_time);
        }
        if !self.is_simulation_paused() {
            self.frame_show_limit(rel_time);
        }

        if self.phase == Phase::Simul && !self.mode.is_edit_locked() {
            self.check_end_mission(true);
            self.update_audio();
            self.count_down_end_delays(rel_time);
        }

        if self.scene.mission_type == MissionType::CodeBattle {
            self.code_battle_frame();
        }

        self.world.registry.sweep();
    }

    /// Carriers first, then what they carry, so cargo follows its carrier
    /// within the same frame
    fn update_objects(&mut self, rel_time: f32) {
        let registry = &self.world.registry;
        let (carried, free): (Vec<_>, Vec<_>) = registry
            .all()
            .into_iter()
            .filter(|e| registry.object_type(*e) != Some(ObjectType::Toto))
            .filter(|e| registry.implements(*e, Capability::Interactive))
            .partition(|e| registry.is_transported(*e));
        for entity in free.into_iter().chain(carried) {
            self.world.registry.update_object(entity, rel_time);
        }
    }

    fn update_toto(&mut self, rel_time: f32) {
        if let Some(toto) = self.world.registry.first_of_type(ObjectType::Toto) {
            self.world.registry.update_object(toto, rel_time);
        }
    }

    fn remote_camera(&mut self, rel_time: f32) {
        if self.camera_pan != 0.0 {
            self.world.camera.add_pan(self.camera_pan * rel_time * PAN_SPEED);
        }
        if self.camera_zoom != 0.0 {
            self.world.camera.add_zoom(self.camera_zoom * rel_time * ZOOM_SPEED);
        }
    }

    /// The command console freezes the mission while it is open
    fn sync_console_pause(&mut self) {
        if self.phase != Phase::Simul {
            return;
        }
        let open = self.interface.console.is_visible();
        if open && self.pause == PauseType::None {
            self.change_pause(PauseType::Cheat);
        } else if !open && self.pause == PauseType::Cheat {
            self.change_pause(PauseType::None);
        }
    }

    fn update_indicators(&mut self) {
        let pulse = 1.0 + (self.time * 6.0).sin() * 0.1;
        let edit = self.mode.is_edit_locked();
        self.indicators.movie = (self.mode == InteractionMode::CutsceneLocked && !edit).then_some(pulse);
        self.indicators.edit = (edit || self.pause != PauseType::None).then_some(pulse);
        self.indicators.saving = (self.saves_in_flight > 0).then_some(pulse);
    }

    /// Switches music once for each audio change whose condition is met
    fn update_audio(&mut self) {
        let registry = &self.world.registry;
        for change in self.scene.audio_changes.iter_mut().filter(|c| !c.changed) {
            if change.check(registry) {
                log::info!("Changing music to {}", change.music);
                self.world.sound.play_music(&change.music, change.repeat);
                change.changed = true;
            }
        }
    }

    fn code_battle_frame(&mut self) {
        if !self.code_battle.init {
            self.change_pause(PauseType::CodeBattleLock);
            self.world.sound.mute_all(false);
            self.code_battle.init = true;
            return;
        }
        if !self.code_battle.started && self.pause == PauseType::None {
            self.code_battle.started = true;
            log::info!("Code battle started");
            self.post(EventType::UpdateInterface);
        }
    }

    pub(super) fn hilite_frame(&mut self, rel_time: f32) {
        if self.scene.fixed_scene && self.phase != Phase::Appearance {
            return;
        }
        if self.mode == InteractionMode::CutsceneLocked {
            return;
        }
        if let Some(tooltip) = self.tooltip.as_mut() {
            tooltip.timer += rel_time;
        }
    }
}
