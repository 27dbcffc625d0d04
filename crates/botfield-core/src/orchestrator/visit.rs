//! Guided camera visit of the location named by the last message.

use hecs::Entity;
use rand::Rng;

use botfield_logic::camera::CameraType;

use crate::event::EventType;
use crate::math::Vec3;
use crate::services::{ParticleHandle, ParticleKind, Rect};

use super::{InteractionMode, MissionOrchestrator};

/// Camera distance from the visited point
const VISIT_DISTANCE: f32 = 60.0;
/// Arrow height above the visited point
const ARROW_HEIGHT: f32 = 15.0;
const ARROW_SIZE: f32 = 4.0;
/// Seconds between two glints around the visited point
const GLINT_PERIOD: f32 = 1.5;
const GLINT_SPREAD: f32 = 5.0;
const GLINT_LIFE: f32 = 1.0;

/// Running visit
#[derive(Debug, Clone, PartialEq)]
pub struct VisitState {
    pub goal: Vec3,
    pub arrow: ParticleHandle,
    pub time: f32,
    pub glint_timer: f32,
    /// Selection restored when the visit ends
    pub previous: Option<Entity>,
}

impl MissionOrchestrator {
    pub fn visit(&self) -> Option<&VisitState> {
        self.visit.as_ref()
    }

    /// Flies the camera to the goal of the last message. Restarts the
    /// visit when one is already running.
    pub fn start_display_visit(&mut self) -> bool {
        if self.mode.is_edit_locked() || self.mode == InteractionMode::CutsceneLocked {
            return false;
        }
        let Some(goal) = self.world.display.last_goal() else {
            return false;
        };

        let previous = match self.visit.take() {
            Some(running) => {
                self.world.particles.delete(running.arrow);
                running.previous
            }
            None => self.deselect_all(),
        };
        self.world.particles.delete_kind(ParticleKind::VisitGlint);
        self.hilite_clear();

        let arrow = self.world.particles.create(
            ParticleKind::VisitArrow,
            goal + Vec3::new(0.0, ARROW_HEIGHT, 0.0),
            ARROW_SIZE,
            0.0,
        );
        self.world.camera.start_visit(goal, VISIT_DISTANCE);
        self.visit = Some(VisitState {
            goal,
            arrow,
            time: 0.0,
            glint_timer: 0.0,
            previous,
        });
        self.set_mode(InteractionMode::VisitMode);
        self.add_visit_end_button();
        log::debug!("Visit started at {:?}", goal);
        true
    }

    /// Ends the visit and gives the camera back to the previous selection
    pub fn stop_display_visit(&mut self) {
        let Some(visit) = self.visit.take() else {
            return;
        };
        self.world.particles.delete(visit.arrow);
        self.world.particles.delete_kind(ParticleKind::VisitGlint);
        self.interface.remove_control(EventType::VisitEnd);
        self.world.camera.stop_visit();
        if self.mode == InteractionMode::VisitMode {
            self.set_mode(InteractionMode::Normal);
        }
        if let Some(previous) = visit.previous.filter(|e| self.world.registry.is_alive(*e)) {
            self.select_one_object(previous);
        }
    }

    pub(super) fn add_visit_end_button(&mut self) {
        self.interface
            .add_control(EventType::VisitEnd, Rect::new(0.95, 0.9, 0.05, 0.05), Some("Stop the visit"));
    }

    /// Bobs the arrow and drops a glint now and then
    pub(super) fn frame_visit(&mut self, rel_time: f32) {
        let Some(visit) = self.visit.as_mut() else {
            return;
        };
        visit.time += rel_time;
        let bob = (visit.time * 6.0).sin() * 2.0;
        let arrow_pos = visit.goal + Vec3::new(0.0, ARROW_HEIGHT + bob, 0.0);
        self.world.particles.set_position(visit.arrow, arrow_pos);

        visit.glint_timer += rel_time;
        if visit.glint_timer >= GLINT_PERIOD {
            visit.glint_timer -= GLINT_PERIOD;
            let jitter = Vec3::new(
                self.rng.gen_range(-GLINT_SPREAD..GLINT_SPREAD),
                self.rng.gen_range(0.0..GLINT_SPREAD),
                self.rng.gen_range(-GLINT_SPREAD..GLINT_SPREAD),
            );
            self.world
                .particles
                .create(ParticleKind::VisitGlint, visit.goal + jitter, 1.0, GLINT_LIFE);
        }
    }

    /// Whether the camera is currently flying a visit
    pub fn is_visiting(&self) -> bool {
        self.world.camera.camera_type() == CameraType::Visit && self.visit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cleanup, simul};
    use super::*;
    use crate::services::TextKind;

    fn post_goal(orch: &mut MissionOrchestrator) -> Vec3 {
        let goal = Vec3::new(30.0, 0.0, -10.0);
        orch.world.display.display_goal("Look here", TextKind::Info, goal);
        goal
    }

    #[test]
    fn test_visit_needs_a_goal() {
        let mut orch = simul("visit-none");
        assert!(!orch.start_display_visit());
        assert_eq!(orch.mode(), InteractionMode::Normal);
        cleanup(&orch);
    }

    #[test]
    fn test_visit_round_trip_restores_selection() {
        let mut orch = simul("visit-trip");
        let bot = orch.selected().unwrap();
        let goal = post_goal(&mut orch);

        assert!(orch.start_display_visit());
        assert!(orch.is_visiting());
        assert_eq!(orch.mode(), InteractionMode::VisitMode);
        assert!(orch.is_simulation_paused());
        assert_eq!(orch.selected(), None);
        assert_eq!(orch.visit().unwrap().goal, goal);
        assert!(orch.interface.control(EventType::VisitEnd).is_some());

        orch.stop_display_visit();
        assert_eq!(orch.mode(), InteractionMode::Normal);
        assert_eq!(orch.selected(), Some(bot));
        assert!(orch.interface.control(EventType::VisitEnd).is_none());
        assert_eq!(orch.world.particles.count_kind(ParticleKind::VisitArrow), 0);
        cleanup(&orch);
    }

    #[test]
    fn test_visit_drops_glints() {
        let mut orch = simul("visit-glint");
        post_goal(&mut orch);
        orch.start_display_visit();
        orch.frame_visit(1.0);
        assert_eq!(orch.world.particles.count_kind(ParticleKind::VisitGlint), 0);
        orch.frame_visit(1.0);
        assert_eq!(orch.world.particles.count_kind(ParticleKind::VisitGlint), 1);
        cleanup(&orch);
    }

    #[test]
    fn test_restart_keeps_first_previous_selection() {
        let mut orch = simul("visit-restart");
        let bot = orch.selected().unwrap();
        post_goal(&mut orch);
        orch.start_display_visit();
        orch.start_display_visit();
        assert_eq!(orch.world.particles.count_kind(ParticleKind::VisitArrow), 1);
        orch.stop_display_visit();
        assert_eq!(orch.selected(), Some(bot));
        cleanup(&orch);
    }

    #[test]
    fn test_visit_refused_while_editing() {
        let mut orch = simul("visit-edit");
        post_goal(&mut orch);
        orch.set_edit_lock(true, false);
        assert!(!orch.start_display_visit());
        cleanup(&orch);
    }
}
