//! Selection, highlight and tooltips, plus the camera actions that follow
//! the selected object.

use hecs::Entity;

use botfield_logic::camera::{next_camera, CameraCycle, CameraType};
use botfield_logic::object_type::{Capability, ObjectType};
use botfield_logic::phase::Phase;

use crate::components::{Automat, CameraPrefs};
use crate::math::Point;
use crate::services::PyroType;

use super::{InteractionMode, MissionOrchestrator, Tooltip};

/// Pick radius around a projected object centre, in interface units
const PICK_RADIUS: f32 = 0.04;

impl MissionOrchestrator {
    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Whether the player may select `entity` right now
    pub fn is_selectable(&self, entity: Entity) -> bool {
        let registry = &self.world.registry;
        if !registry.is_alive(entity) {
            return false;
        }
        let Some(ty) = registry.object_type(entity) else {
            return false;
        };
        let flags = registry.flags(entity);
        if !flags.selectable || flags.dead {
            return false;
        }
        ty.is_selectable_kind() || (self.select_insect && ty.is_insect())
    }

    /// Clears the selection mark; returns what was selected
    pub(super) fn deselect_all(&mut self) -> Option<Entity> {
        let previous = self.world.registry.selected()?;
        if let Some(mut flags) = self.world.registry.flags_mut(previous) {
            flags.selected = false;
        }
        Some(previous)
    }

    /// Marks `entity` selected and binds the camera to it
    pub(super) fn select_one_object(&mut self, entity: Entity) {
        let Some(ty) = self.world.registry.object_type(entity) else {
            return;
        };
        if let Some(mut flags) = self.world.registry.flags_mut(entity) {
            flags.selected = true;
        }
        let prefs = if ty.uses_own_camera() {
            self.world.registry.camera_prefs(entity)
        } else {
            CameraPrefs::default()
        };
        let camera = &mut self.world.camera;
        camera.stop_visit();
        camera.set_type(prefs.camera_type);
        camera.set_distance(prefs.distance);
        camera.set_controlling(Some(entity));
        camera.fixed = false;
        log::debug!("Selected {} ({:?})", ty.name(), entity);
    }

    /// Selects `entity`, remembering the previous selection. Refused during
    /// cut-scenes, full-screen editing and for unselectable objects.
    pub fn select_object(&mut self, entity: Entity) -> bool {
        if self.mode == InteractionMode::CutsceneLocked || self.mode.is_edit_full() {
            return false;
        }
        if !self.is_selectable(entity) {
            return false;
        }
        if let Some(previous) = self.deselect_all() {
            if previous != entity {
                self.history.push(previous);
            }
        }
        self.select_one_object(entity);
        self.hilite_clear();
        true
    }

    /// Drops the selection and goes back to the previous one, the pilot, or
    /// a free camera, in that order
    pub fn deselect_object(&mut self) {
        let current = self.deselect_all();
        while let Some(previous) = self.history.pop() {
            if Some(previous) != current && self.is_selectable(previous) {
                self.select_one_object(previous);
                return;
            }
        }
        match self.world.registry.first_of_type(ObjectType::Human) {
            Some(human) if self.is_selectable(human) => self.select_one_object(human),
            _ => {
                self.world.camera.set_type(CameraType::Free);
                self.world.camera.set_controlling(None);
            }
        }
    }

    pub fn select_human(&mut self) -> bool {
        match self.world.registry.first_of_type(ObjectType::Human) {
            Some(human) => self.select_object(human),
            None => false,
        }
    }

    /// Selects the next selectable object in creation order, wrapping around
    pub fn select_next(&mut self) -> bool {
        let candidates: Vec<Entity> = self
            .world
            .registry
            .all()
            .into_iter()
            .filter(|e| self.is_selectable(*e))
            .collect();
        if candidates.is_empty() {
            return false;
        }
        let next = match self.selected().and_then(|s| candidates.iter().position(|e| *e == s)) {
            Some(i) => candidates[(i + 1) % candidates.len()],
            None => candidates[0],
        };
        self.select_object(next)
    }

    // ========================================================================
    // PICKING AND HIGHLIGHT
    // ========================================================================

    /// Object under the interface point `pos`. A carried power cell resolves
    /// to its carrier.
    pub fn detect_object(&self, pos: Point) -> Option<Entity> {
        let registry = &self.world.registry;
        let hit = registry
            .all()
            .into_iter()
            .filter(|e| {
                let flags = registry.flags(*e);
                flags.active && !flags.proxy_activate && !flags.dead
            })
            .filter(|e| !registry.object_type(*e).is_some_and(|t| t.is_default_gadget()))
            .filter_map(|e| {
                let p = self.world.camera.project(registry.position(e)?)?;
                let d = p.distance(&pos);
                (d <= PICK_RADIUS).then_some((e, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| e)?;

        if registry.object_type(hit).is_some_and(|t| t.is_power_cell()) {
            return Some(registry.transporter_of(hit).unwrap_or(hit));
        }
        Some(hit)
    }

    /// Hover update for the mouse at `pos`: highlights a selectable object
    /// and arms its tooltip
    pub(super) fn hilite_object(&mut self, pos: Point) {
        if self.mode == InteractionMode::CutsceneLocked || self.mode.is_edit_locked() {
            return;
        }
        if self.scene.fixed_scene && self.phase != Phase::Appearance {
            return;
        }

        if let Some(text) = self.interface.tooltip_at(pos).map(str::to_string) {
            self.clear_highlight_flag();
            self.arm_tooltip(pos, text);
            return;
        }

        let target = if self.phase == Phase::Simul {
            self.detect_object(pos).filter(|e| self.is_selectable(*e))
        } else {
            None
        };
        let Some(target) = target else {
            self.hilite_clear();
            return;
        };

        if self.highlighted != Some(target) {
            self.clear_highlight_flag();
            if let Some(mut flags) = self.world.registry.flags_mut(target) {
                flags.highlighted = true;
            }
            self.highlighted = Some(target);
            self.world.map.set_highlight(Some(target));
        }
        let text = self
            .world
            .registry
            .attributes(target)
            .tooltip
            .or_else(|| self.world.registry.object_type(target).map(|t| t.name()));
        match text {
            Some(text) => self.arm_tooltip(pos, text),
            None => self.tooltip = None,
        }
    }

    /// Any movement before the hover delay restarts it
    fn arm_tooltip(&mut self, pos: Point, text: String) {
        match self.tooltip.as_mut() {
            Some(t) if t.text == text && t.pos == pos => {}
            _ => {
                self.tooltip = Some(Tooltip { pos, text, timer: 0.0 });
            }
        }
    }

    fn clear_highlight_flag(&mut self) {
        if let Some(entity) = self.highlighted.take() {
            if let Some(mut flags) = self.world.registry.flags_mut(entity) {
                flags.highlighted = false;
            }
        }
        self.world.map.set_highlight(None);
    }

    /// Removes the highlight and the tooltip
    pub(super) fn hilite_clear(&mut self) {
        self.clear_highlight_flag();
        self.tooltip = None;
    }

    // ========================================================================
    // CAMERA AND OBJECT ACTIONS
    // ========================================================================

    /// Cycles the camera of the selected object
    pub fn change_camera(&mut self) {
        let Some(entity) = self.selected() else {
            return;
        };
        let Some(ty) = self.world.registry.object_type(entity) else {
            return;
        };
        if !self.world.registry.implements(entity, Capability::Controllable)
            || self.world.registry.flags(entity).camera_lock
        {
            return;
        }
        let cycle = if ty == ObjectType::MobileDr {
            CameraCycle::Drawing
        } else if ty.is_trainer_mobile() {
            CameraCycle::Trainer
        } else {
            CameraCycle::Standard
        };
        let camera_type = next_camera(cycle, self.world.camera.camera_type());
        self.world.camera.set_type(camera_type);
        let prefs = CameraPrefs {
            camera_type,
            distance: self.world.camera.distance,
        };
        self.world.registry.insert(entity, prefs);
    }

    /// Stops the running cut-scene and every automaton action
    pub fn abort_movie(&mut self) {
        let registry = &mut self.world.registry;
        for entity in registry.all() {
            if let Some(mut automat) = registry.get_mut::<Automat>(entity) {
                automat.abort();
            }
        }
        self.set_movie_lock(false);
        log::info!("Movie aborted");
    }

    /// Blows up `entity` after the player confirmed it
    pub fn delete_object(&mut self, entity: Entity) {
        if !self.world.registry.is_alive(entity) {
            return;
        }
        self.history.remove(entity);
        if self.selected() == Some(entity) {
            self.deselect_all();
        }
        self.hilite_clear();
        self.world.pyro.create(PyroType::FragT, Some(entity), &mut self.world.registry);
        self.world.camera.set_type(CameraType::Explo);
    }

    /// Opens the help page of the selected object type
    pub fn help_object(&mut self) {
        let Some(ty) = self.selected().and_then(|e| self.world.registry.object_type(e)) else {
            return;
        };
        self.hilite_clear();
        self.world
            .display
            .start_display_info(&format!("help/object/{}.txt", ty.name()));
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cleanup, orchestrator_with, simul};
    use super::*;
    use crate::math::Vec3;

    fn of_type(orch: &MissionOrchestrator, ty: ObjectType) -> Entity {
        orch.world.registry.first_of_type(ty).unwrap()
    }

    fn aim_camera_at(orch: &mut MissionOrchestrator, target: Vec3) -> Point {
        orch.world
            .camera
            .init(target + Vec3::new(0.0, 40.0, -60.0), target, 0.0);
        orch.world.camera.project(target).unwrap()
    }

    #[test]
    fn test_select_pushes_history() {
        let mut orch = simul("sel-history");
        let bot = of_type(&orch, ObjectType::MobileWa);
        let human = of_type(&orch, ObjectType::Human);
        assert_eq!(orch.selected(), Some(bot));

        assert!(orch.select_object(human));
        assert_eq!(orch.selected(), Some(human));
        assert_eq!(orch.history_len(), 1);
        assert!(!orch.world.registry.flags(bot).selected);

        // Reselecting the same object adds nothing
        assert!(orch.select_object(human));
        assert_eq!(orch.history_len(), 1);
        cleanup(&orch);
    }

    #[test]
    fn test_deselect_returns_to_previous() {
        let mut orch = simul("sel-previous");
        let bot = of_type(&orch, ObjectType::MobileWa);
        let human = of_type(&orch, ObjectType::Human);
        orch.select_object(human);
        orch.deselect_object();
        assert_eq!(orch.selected(), Some(bot));
        assert_eq!(orch.world.camera.controlling(), Some(bot));
        cleanup(&orch);
    }

    #[test]
    fn test_deselect_falls_back_to_pilot_then_free_camera() {
        let mut orch = simul("sel-fallback");
        orch.deselect_object();
        assert_eq!(orch.selected(), Some(of_type(&orch, ObjectType::Human)));

        let human = of_type(&orch, ObjectType::Human);
        orch.world.registry.destroy(human);
        orch.world.registry.sweep();
        orch.deselect_object();
        assert_eq!(orch.selected(), None);
        assert_eq!(orch.world.camera.camera_type(), CameraType::Free);
        assert_eq!(orch.world.camera.controlling(), None);
        cleanup(&orch);
    }

    #[test]
    fn test_selection_refused_during_cutscene() {
        let mut orch = simul("sel-cutscene");
        let human = of_type(&orch, ObjectType::Human);
        orch.set_movie_lock(true);
        assert!(!orch.select_object(human));
        cleanup(&orch);
    }

    #[test]
    fn test_insects_need_the_cheat() {
        let mut orch = simul("sel-insect");
        let ant = of_type(&orch, ObjectType::Ant);
        assert!(!orch.is_selectable(ant));
        orch.execute_cmd("selectinsect");
        assert!(orch.is_selectable(ant));
        cleanup(&orch);
    }

    #[test]
    fn test_select_next_cycles() {
        let mut orch = simul("sel-next");
        let bot = of_type(&orch, ObjectType::MobileWa);
        let human = of_type(&orch, ObjectType::Human);
        assert!(orch.select_next());
        assert_eq!(orch.selected(), Some(human));
        assert!(orch.select_next());
        assert_eq!(orch.selected(), Some(bot));
        cleanup(&orch);
    }

    #[test]
    fn test_carried_cell_resolves_to_carrier() {
        let mut orch = simul("sel-cell");
        let bot = of_type(&orch, ObjectType::MobileWa);
        let cell = orch.world.registry.power_of(bot).unwrap();
        let at = orch.world.registry.position(bot).unwrap();
        orch.world.registry.set_position(cell, at);
        let point = aim_camera_at(&mut orch, at);
        assert_eq!(orch.detect_object(point), Some(bot));
        cleanup(&orch);
    }

    #[test]
    fn test_hover_highlights_and_tooltip_waits() {
        let mut orch = simul("sel-hover");
        let human = of_type(&orch, ObjectType::Human);
        let at = orch.world.registry.position(human).unwrap();
        let point = aim_camera_at(&mut orch, at);

        orch.hilite_object(point);
        assert_eq!(orch.highlighted(), Some(human));
        assert!(orch.world.registry.flags(human).highlighted);
        assert_eq!(orch.world.map.highlight(), Some(human));
        assert_eq!(orch.visible_tooltip(), None);

        orch.hilite_frame(0.25);
        assert_eq!(orch.visible_tooltip(), Some("Me"));

        orch.hilite_clear();
        assert_eq!(orch.highlighted(), None);
        assert!(!orch.world.registry.flags(human).highlighted);
        assert_eq!(orch.visible_tooltip(), None);
        cleanup(&orch);
    }

    #[test]
    fn test_change_camera_toggles_onboard() {
        let mut orch = simul("sel-camera");
        let bot = of_type(&orch, ObjectType::MobileWa);
        assert_eq!(orch.world.camera.camera_type(), CameraType::Back);
        orch.change_camera();
        assert_eq!(orch.world.camera.camera_type(), CameraType::Onboard);
        assert_eq!(orch.world.registry.camera_prefs(bot).camera_type, CameraType::Onboard);
        orch.change_camera();
        assert_eq!(orch.world.camera.camera_type(), CameraType::Back);
        cleanup(&orch);
    }

    #[test]
    fn test_abort_movie_releases_lock() {
        let mut orch = simul("sel-abort");
        orch.set_movie_lock(true);
        orch.abort_movie();
        assert_eq!(orch.mode(), InteractionMode::Normal);
        cleanup(&orch);
    }

    #[test]
    fn test_delete_object_removes_from_history() {
        let level = "\
BeginObject
CreateObject type=Me pos=0;0
CreateObject type=WheeledGrabber pos=10;10 select=1
";
        let mut orch = orchestrator_with("sel-delete", level);
        orch.change_phase(Phase::Simul);
        let bot = of_type(&orch, ObjectType::MobileWa);
        let human = of_type(&orch, ObjectType::Human);
        orch.select_object(human);
        orch.delete_object(bot);
        assert_eq!(orch.history_len(), 0);
        assert_eq!(orch.world.camera.camera_type(), CameraType::Explo);
        assert!(orch.world.pyro.is_active(bot));
        cleanup(&orch);
    }

    #[test]
    fn test_help_object_opens_type_page() {
        let mut orch = simul("sel-help");
        orch.help_object();
        assert_eq!(orch.world.display.info_file(), Some("help/object/WheeledGrabber.txt"));
        cleanup(&orch);
    }
}
