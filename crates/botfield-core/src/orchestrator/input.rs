//! Event dispatch per phase and interaction mode.

use botfield_logic::camera::CameraType;
use botfield_logic::object_type::ObjectType;
use botfield_logic::phase::Phase;

use crate::event::{keys, Event, EventData, EventType, InputSlot, MouseButton};
use crate::scene::InfoSlot;
use crate::services::DialogKind;

use super::{InteractionMode, MissionOrchestrator, PauseType};

impl MissionOrchestrator {
    /// Handles one event. Returns `false` when the event was consumed.
    pub(super) fn handle_event(&mut self, event: &Event) -> bool {
        match event.event_type {
            EventType::Frame => {
                self.frame_update(event.rel_time, event.real_rel_time);
                return true;
            }
            EventType::Cmd => {
                if self.pause == PauseType::Cheat {
                    self.change_pause(PauseType::None);
                }
                if let EventData::Text(line) = &event.data {
                    self.execute_cmd(line);
                }
                return false;
            }
            EventType::Speed => {
                self.set_speed(1.0);
                return false;
            }
            EventType::WriteSceneFinished => {
                self.save_finished();
                return false;
            }
            EventType::MouseMove => {
                self.mouse_pos = event.mouse_pos;
                self.hilite_object(event.mouse_pos);
                return true;
            }
            EventType::DialogOk => {
                match self.close_dialog() {
                    Some(DialogKind::DeleteObject(entity)) => self.delete_object(entity),
                    Some(DialogKind::PauseMenu) => self.change_phase(Phase::LevelList),
                    _ => {}
                }
                return false;
            }
            EventType::DialogCancel => {
                self.close_dialog();
                return false;
            }
            _ => {}
        }

        if self.world.display.info_file().is_some() && self.info_event(event) {
            return false;
        }

        match self.phase {
            Phase::Simul => self.simul_event(event),
            Phase::Win | Phase::Lost => self.ending_event(event),
            _ => true,
        }
    }

    /// Keys that close the info window. Returns `true` when consumed.
    fn info_event(&mut self, event: &Event) -> bool {
        let closes = match event.event_type {
            EventType::InfoOk => true,
            EventType::KeyDown => {
                event.key_code() == Some(keys::ESCAPE)
                    || matches!(event.input_slot(), Some(InputSlot::Help) | Some(InputSlot::Prog))
            }
            _ => false,
        };
        if closes {
            self.world.display.stop_display_info();
        }
        closes
    }

    fn simul_event(&mut self, event: &Event) -> bool {
        match event.event_type {
            EventType::KeyDown => self.simul_key_down(event),
            EventType::KeyUp => {
                self.camera_pan = 0.0;
                self.camera_zoom = 0.0;
                true
            }
            EventType::MouseButtonDown if event.mouse_button() == Some(MouseButton::Left) => {
                if self.mode != InteractionMode::Normal || !self.can_player_interact() {
                    return true;
                }
                self.click_object(event);
                false
            }
            EventType::MouseButtonUp if event.mouse_button() == Some(MouseButton::Left) => {
                self.camera_pan = 0.0;
                self.camera_zoom = 0.0;
                true
            }
            EventType::ObjectMovieLock => {
                self.abort_movie();
                false
            }
            EventType::VisitEnd => {
                self.stop_display_visit();
                false
            }
            EventType::Win => {
                self.mission_timer.stop();
                self.change_phase(Phase::Win);
                false
            }
            EventType::Lost => {
                self.mission_timer.stop();
                self.change_phase(Phase::Lost);
                false
            }
            _ if self.mode == InteractionMode::CutsceneLocked => true,
            EventType::ObjectLimit => {
                self.start_show_limit();
                false
            }
            EventType::ObjectDeselect => {
                if self.shortcuts {
                    self.deselect_object();
                }
                false
            }
            EventType::ObjectHelp => {
                self.help_object();
                false
            }
            EventType::ObjectCamera => {
                self.change_camera();
                false
            }
            EventType::ObjectCameraLeft => {
                self.camera_pan = -1.0;
                false
            }
            EventType::ObjectCameraRight => {
                self.camera_pan = 1.0;
                false
            }
            EventType::ObjectCameraNear => {
                self.camera_zoom = -1.0;
                false
            }
            EventType::ObjectCameraAway => {
                self.camera_zoom = 1.0;
                false
            }
            EventType::ObjectDelete => {
                if let Some(selected) = self.selected() {
                    self.show_dialog(DialogKind::DeleteObject(selected));
                }
                false
            }
            EventType::ObjectBigHelp => {
                self.start_display_info(InfoSlot::Huston);
                false
            }
            EventType::ObjectSoluce => {
                self.start_display_info(InfoSlot::Soluce);
                false
            }
            _ => true,
        }
    }

    fn simul_key_down(&mut self, event: &Event) -> bool {
        self.hilite_clear();
        let slot = event.input_slot();
        let escape = event.key_code() == Some(keys::ESCAPE);

        if self.mode.is_edit_locked() {
            match slot {
                Some(InputSlot::Help) => self.start_display_info(InfoSlot::Huston),
                Some(InputSlot::Prog) => self.start_display_info(InfoSlot::Program),
                _ => return true,
            }
            return false;
        }

        if self.mode == InteractionMode::CutsceneLocked {
            if escape || slot == Some(InputSlot::Quit) {
                self.abort_movie();
            }
            return false;
        }

        if self.world.camera.camera_type() == CameraType::Visit {
            if slot == Some(InputSlot::Visit) {
                self.start_display_visit();
            }
            if escape || slot == Some(InputSlot::Quit) {
                self.stop_display_visit();
            }
            return false;
        }

        if escape || slot == Some(InputSlot::Quit) {
            if self.win_delay > 0.0 {
                self.change_phase(Phase::Win);
            } else if self.lost_delay > 0.0 {
                self.change_phase(Phase::Lost);
            } else if self.interface.dialog().is_none() {
                self.show_dialog(DialogKind::PauseMenu);
            }
            return false;
        }

        let Some(slot) = slot else {
            return true;
        };
        if let Some(speed) = slot.speed() {
            self.set_speed(speed);
            return false;
        }
        match slot {
            InputSlot::Pause => {
                let next = match self.pause {
                    PauseType::None => PauseType::User,
                    PauseType::User | PauseType::CodeBattleLock => PauseType::None,
                    other => other,
                };
                self.change_pause(next);
            }
            InputSlot::Camera => self.change_camera(),
            InputSlot::Desel => {
                if self.shortcuts {
                    self.deselect_object();
                }
            }
            InputSlot::Human => {
                self.select_human();
            }
            InputSlot::Next => {
                if self.shortcuts {
                    self.select_next();
                }
            }
            InputSlot::Help => self.start_display_info(InfoSlot::Huston),
            InputSlot::Prog => self.start_display_info(InfoSlot::Program),
            InputSlot::Visit => {
                self.start_display_visit();
            }
            _ => return true,
        }
        false
    }

    /// Left click in the 3D view: the companion toggles the info window,
    /// anything else is selected
    fn click_object(&mut self, event: &Event) {
        let Some(target) = self.detect_object(event.mouse_pos) else {
            return;
        };
        if self.world.registry.object_type(target) == Some(ObjectType::Toto) {
            if self.world.display.info_file().is_some() {
                self.world.display.stop_display_info();
            } else {
                self.start_display_info(InfoSlot::Huston);
            }
            return;
        }
        self.select_object(target);
    }

    fn ending_event(&mut self, event: &Event) -> bool {
        let confirm = match event.event_type {
            EventType::ButtonOk => true,
            EventType::KeyDown => matches!(event.key_code(), Some(keys::ESCAPE) | Some(keys::RETURN)),
            _ => false,
        };
        if !confirm {
            return true;
        }
        if self.win_terminate {
            self.change_phase(Phase::MainMenu);
        } else {
            self.change_phase(Phase::LevelList);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cleanup, simul};
    use super::*;
    use crate::event::{EventHandler, EventQueue};

    fn send(orch: &mut MissionOrchestrator, event: Event) -> EventQueue {
        let mut queue = EventQueue::new();
        orch.process_event(&event, &mut queue);
        queue
    }

    #[test]
    fn test_pause_slot_toggles() {
        let mut orch = simul("input-pause");
        send(&mut orch, Event::slot(InputSlot::Pause));
        assert_eq!(orch.pause(), PauseType::User);
        send(&mut orch, Event::slot(InputSlot::Pause));
        assert_eq!(orch.pause(), PauseType::None);
        cleanup(&orch);
    }

    #[test]
    fn test_speed_slots_and_reset() {
        let mut orch = simul("input-speed");
        send(&mut orch, Event::slot(InputSlot::Speed30));
        assert_eq!(orch.speed(), 3.0);
        send(&mut orch, Event::new(EventType::Speed));
        assert_eq!(orch.speed(), 1.0);
        cleanup(&orch);
    }

    #[test]
    fn test_quit_opens_pause_menu_then_level_list() {
        let mut orch = simul("input-quit");
        send(&mut orch, Event::key_down(keys::ESCAPE, None));
        assert_eq!(orch.interface.dialog(), Some(&DialogKind::PauseMenu));
        assert_eq!(orch.pause(), PauseType::Dialog);
        send(&mut orch, Event::new(EventType::DialogOk));
        assert_eq!(orch.phase(), Phase::LevelList);
        assert!(!orch.world_exists());
        cleanup(&orch);
    }

    #[test]
    fn test_dialog_cancel_resumes() {
        let mut orch = simul("input-cancel");
        send(&mut orch, Event::slot(InputSlot::Quit));
        send(&mut orch, Event::new(EventType::DialogCancel));
        assert_eq!(orch.interface.dialog(), None);
        assert_eq!(orch.pause(), PauseType::None);
        assert_eq!(orch.phase(), Phase::Simul);
        cleanup(&orch);
    }

    #[test]
    fn test_quit_during_win_delay_ends_now() {
        let mut orch = simul("input-quit-win");
        let ant = orch.world.registry.first_of_type(ObjectType::Ant).unwrap();
        orch.world.registry.destroy(ant);
        orch.world.registry.sweep();
        orch.check_end_mission(true);
        send(&mut orch, Event::slot(InputSlot::Quit));
        assert_eq!(orch.phase(), Phase::Win);
        cleanup(&orch);
    }

    #[test]
    fn test_cutscene_swallows_keys_and_escape_aborts() {
        let mut orch = simul("input-cutscene");
        orch.set_movie_lock(true);
        let mut queue = EventQueue::new();
        assert!(!orch.process_event(&Event::slot(InputSlot::Human), &mut queue));
        assert_eq!(orch.mode(), InteractionMode::CutsceneLocked);
        orch.process_event(&Event::key_down(keys::ESCAPE, None), &mut queue);
        assert_eq!(orch.mode(), InteractionMode::Normal);
        cleanup(&orch);
    }

    #[test]
    fn test_human_slot_selects_pilot() {
        let mut orch = simul("input-human");
        send(&mut orch, Event::slot(InputSlot::Human));
        let human = orch.world.registry.first_of_type(ObjectType::Human);
        assert_eq!(orch.selected(), human);
        cleanup(&orch);
    }

    #[test]
    fn test_camera_buttons_hold_until_release() {
        let mut orch = simul("input-camera");
        send(&mut orch, Event::new(EventType::ObjectCameraRight));
        let before = orch.world.camera.pan;
        orch.frame_update(0.5, 0.5);
        assert!(orch.world.camera.pan > before);
        send(&mut orch, Event::mouse_up(MouseButton::Left, Default::default()));
        let held = orch.world.camera.pan;
        orch.frame_update(0.5, 0.5);
        assert_eq!(orch.world.camera.pan, held);
        cleanup(&orch);
    }

    #[test]
    fn test_win_event_changes_phase() {
        let mut orch = simul("input-win");
        send(&mut orch, Event::new(EventType::Win));
        assert_eq!(orch.phase(), Phase::Win);
        send(&mut orch, Event::new(EventType::ButtonOk));
        assert_eq!(orch.phase(), Phase::LevelList);
        cleanup(&orch);
    }

    #[test]
    fn test_help_slot_opens_instructions_and_escape_closes() {
        let mut orch = simul("input-help");
        send(&mut orch, Event::slot(InputSlot::Help));
        assert_eq!(orch.world.display.info_file(), Some("field.txt"));
        send(&mut orch, Event::key_down(keys::ESCAPE, None));
        assert_eq!(orch.world.display.info_file(), None);
        assert_eq!(orch.interface.dialog(), None);
        cleanup(&orch);
    }

    #[test]
    fn test_delete_dialog_confirms_destruction() {
        let mut orch = simul("input-delete");
        let bot = orch.selected().unwrap();
        send(&mut orch, Event::new(EventType::ObjectDelete));
        assert_eq!(orch.interface.dialog(), Some(&DialogKind::DeleteObject(bot)));
        send(&mut orch, Event::new(EventType::DialogOk));
        assert!(orch.world.pyro.is_active(bot));
        cleanup(&orch);
    }
}
