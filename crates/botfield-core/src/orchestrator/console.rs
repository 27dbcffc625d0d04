//! Command console verbs.

use botfield_logic::camera::CameraType;
use botfield_logic::console::ConsoleCommand;
use botfield_logic::constants::research;
use botfield_logic::object_type::ObjectType;
use botfield_logic::phase::Phase;

use crate::event::EventType;
use crate::services::Notice;

use super::{InteractionMode, MissionOrchestrator, PauseType};

/// Flying ceiling restored by `nolimit`
const UNLIMITED_FLYING_HEIGHT: f32 = 280.0;

impl MissionOrchestrator {
    /// Runs one console line. Unknown commands during a mission show an
    /// error notice; nothing here fails.
    pub fn execute_cmd(&mut self, line: &str) {
        let Some(command) = ConsoleCommand::parse(line.trim()) else {
            return;
        };
        log::info!("Console command: {}", line.trim());

        let in_simulation = self.phase == Phase::Simul;
        if command.requires_simulation() && !in_simulation {
            log::debug!("Ignoring {:?} outside a mission", command);
            return;
        }

        match command {
            ConsoleCommand::WinMission => self.post(EventType::Win),
            ConsoleCommand::LostMission => self.post(EventType::Lost),
            ConsoleCommand::TrainerPilot => self.trainer_pilot = !self.trainer_pilot,
            ConsoleCommand::Fly => {
                *self.scene.research_done_mut(0) |= research::FLY;
                self.post(EventType::UpdateInterface);
            }
            ConsoleCommand::AllResearch => {
                *self.scene.research_done_mut(0) = u32::MAX;
                self.post(EventType::UpdateInterface);
            }
            ConsoleCommand::AllBuildings => {
                self.scene.build = u32::MAX;
                self.post(EventType::UpdateInterface);
            }
            ConsoleCommand::All => {
                *self.scene.research_done_mut(0) = u32::MAX;
                self.scene.build = u32::MAX;
                self.post(EventType::UpdateInterface);
            }
            ConsoleCommand::NoLimit => {
                self.world.environment.terrain.max_flying_height = UNLIMITED_FLYING_HEIGHT;
            }
            ConsoleCommand::Controller => self.select_controller(),
            ConsoleCommand::Photo { hide_ui } => self.toggle_photo(hide_ui),
            ConsoleCommand::NoClip => self.set_clip(false),
            ConsoleCommand::Clip => self.set_clip(true),
            ConsoleCommand::FullPower => {
                self.fill_energy();
                self.fill_attributes(true, true);
            }
            ConsoleCommand::FullEnergy => self.fill_energy(),
            ConsoleCommand::FullShield => self.fill_attributes(true, false),
            ConsoleCommand::FullRange => self.fill_attributes(false, true),
            ConsoleCommand::DebugMode => self.debug_mode = !self.debug_mode,
            ConsoleCommand::ShowStat => self.show_stats = !self.show_stats,
            ConsoleCommand::Toggle(toggle) => {
                if !self.inverted_render.remove(&toggle) {
                    self.inverted_render.insert(toggle);
                }
            }
            ConsoleCommand::SelectInsect => self.select_insect = !self.select_insect,
            ConsoleCommand::ShowSoluce => self.show_soluce = !self.show_soluce,
            ConsoleCommand::AllMission => self.show_all = !self.show_all,
            ConsoleCommand::InvRadar => self.cheat_radar = !self.cheat_radar,
            ConsoleCommand::Speed(speed) => self.set_speed(speed.max(0.0)),
            ConsoleCommand::Unknown(text) => {
                log::warn!("Unknown console command: {}", text);
                if in_simulation {
                    self.world.display.display_notice(Notice::ErrCmd);
                }
            }
        }
    }

    /// The mission controller is not selectable by the usual rules
    fn select_controller(&mut self) {
        let Some(controller) = self.world.registry.first_of_type(ObjectType::Controller) else {
            return;
        };
        if self.world.camera.camera_type() == CameraType::Visit {
            self.stop_display_visit();
        }
        if let Some(previous) = self.deselect_all() {
            if previous != controller {
                self.history.push(previous);
            }
        }
        self.select_one_object(controller);
    }

    fn toggle_photo(&mut self, hide_ui: bool) {
        if self.mode == InteractionMode::PhotoMode {
            self.set_mode(InteractionMode::Normal);
            self.change_pause(PauseType::None);
            self.world.camera.set_type(CameraType::Back);
            self.world.display.set_hide(false);
            self.world.map.show(self.scene.map.show);
        } else {
            self.set_mode(InteractionMode::PhotoMode);
            self.change_pause(PauseType::Photo);
            self.world.camera.set_type(CameraType::Free);
            if hide_ui {
                self.world.display.set_hide(true);
                self.world.map.show(false);
            }
        }
    }

    fn set_clip(&mut self, clip: bool) {
        if let Some(selected) = self.selected() {
            if let Some(mut flags) = self.world.registry.flags_mut(selected) {
                flags.clip = clip;
            }
        }
    }

    fn fill_energy(&mut self) {
        let Some(selected) = self.selected() else {
            return;
        };
        let registry = &mut self.world.registry;
        let cell = match registry.object_type(selected) {
            Some(ty) if ty.is_power_cell() => Some(selected),
            _ => registry.power_of(selected),
        };
        let Some(cell) = cell else {
            return;
        };
        if let Some(mut attrs) = registry.attributes_mut(cell) {
            attrs.energy = 1.0;
        }
    }

    fn fill_attributes(&mut self, shield: bool, range: bool) {
        let Some(selected) = self.selected() else {
            return;
        };
        if let Some(mut attrs) = self.world.registry.attributes_mut(selected) {
            if shield {
                attrs.shield = 1.0;
            }
            if range {
                attrs.range = 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cleanup, orchestrator_with, simul, BASIC_LEVEL};
    use super::*;
    use botfield_logic::console::RenderToggle;

    #[test]
    fn test_unknown_command_shows_error_in_mission() {
        let mut orch = simul("cmd-unknown");
        orch.execute_cmd("makemeacoffee");
        assert!(orch.world.display.contains(Notice::ErrCmd.text()));
        cleanup(&orch);
    }

    #[test]
    fn test_unknown_command_silent_in_menus() {
        let mut orch = orchestrator_with("cmd-menu", BASIC_LEVEL);
        orch.execute_cmd("makemeacoffee");
        assert!(!orch.world.display.contains(Notice::ErrCmd.text()));
        orch.execute_cmd("winmission");
        assert!(orch.take_events().is_empty());
    }

    #[test]
    fn test_winmission_posts_win() {
        let mut orch = simul("cmd-win");
        orch.execute_cmd("winmission");
        let events = orch.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Win);
        assert!(!orch.world.display.contains(Notice::ErrCmd.text()));
        cleanup(&orch);
    }

    #[test]
    fn test_research_cheats() {
        let mut orch = simul("cmd-research");
        orch.execute_cmd("fly");
        assert!(orch.scene.is_research_done(0, research::FLY));
        assert!(!orch.scene.is_research_done(0, research::TANK));
        orch.execute_cmd("all");
        assert!(orch.scene.is_research_done(0, research::TANK));
        assert_eq!(orch.scene.build, u32::MAX);
        cleanup(&orch);
    }

    #[test]
    fn test_photo_mode_toggle() {
        let mut orch = simul("cmd-photo");
        orch.execute_cmd("photo2");
        assert_eq!(orch.mode(), InteractionMode::PhotoMode);
        assert_eq!(orch.pause(), PauseType::Photo);
        assert!(orch.world.display.is_hidden());
        assert_eq!(orch.world.camera.camera_type(), CameraType::Free);

        orch.execute_cmd("photo2");
        assert_eq!(orch.mode(), InteractionMode::Normal);
        assert_eq!(orch.pause(), PauseType::None);
        assert!(!orch.world.display.is_hidden());
        cleanup(&orch);
    }

    #[test]
    fn test_noclip_and_fullshield_on_selection() {
        let mut orch = simul("cmd-object");
        let bot = orch.selected().unwrap();
        orch.execute_cmd("noclip");
        assert!(!orch.world.registry.flags(bot).clip);
        orch.execute_cmd("clip");
        assert!(orch.world.registry.flags(bot).clip);
        orch.execute_cmd("fullshield");
        assert_eq!(orch.world.registry.attributes(bot).shield, 1.0);
        cleanup(&orch);
    }

    #[test]
    fn test_fullenergy_fills_the_vehicle_cell() {
        let mut orch = simul("cmd-energy");
        let bot = orch.world.registry.first_of_type(ObjectType::MobileWa).unwrap();
        let cell = orch.world.registry.power_of(bot).unwrap();
        if let Some(mut attrs) = orch.world.registry.attributes_mut(cell) {
            attrs.energy = 0.2;
        }
        orch.select_human();
        orch.execute_cmd("fullenergy");
        assert_eq!(orch.world.registry.attributes(cell).energy, 0.2);

        orch.select_object(bot);
        orch.execute_cmd("fullenergy");
        assert_eq!(orch.world.registry.attributes(cell).energy, 1.0);
        cleanup(&orch);
    }

    #[test]
    fn test_toggles_and_speed() {
        let mut orch = simul("cmd-toggles");
        orch.execute_cmd("invfog");
        assert!(orch.is_render_inverted(RenderToggle::Fog));
        orch.execute_cmd("invfog");
        assert!(!orch.is_render_inverted(RenderToggle::Fog));
        orch.execute_cmd("debugmode");
        assert!(orch.is_debug_mode());
        orch.execute_cmd("speed 4");
        assert_eq!(orch.speed(), 4.0);
        assert_eq!(orch.interface.speed_button(), Some(4.0));
        orch.execute_cmd("nolimit");
        assert_eq!(orch.world.environment.terrain.max_flying_height, 280.0);
        cleanup(&orch);
    }
}
