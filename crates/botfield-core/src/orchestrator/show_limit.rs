//! Boundary rings around objects ("show limit").

use hecs::Entity;

use botfield_logic::constants::{MAX_SHOW_LIMIT, SHOW_LIMIT_TIME};
use botfield_logic::show_limit::{ring_layout, ring_points, RingLayout};

use crate::math::Vec3;
use crate::services::{ParticleHandle, ParticleKind};

use super::MissionOrchestrator;

/// One ring, optionally following an object
#[derive(Debug, Clone, PartialEq)]
pub struct ShowLimitSlot {
    pub link: Option<Entity>,
    pub pos: Vec3,
    pub radius: f32,
    pub duration: f32,
    pub time: f32,
    layout: RingLayout,
    particles: Vec<ParticleHandle>,
}

impl ShowLimitSlot {
    pub fn particles(&self) -> &[ParticleHandle] {
        &self.particles
    }
}

impl MissionOrchestrator {
    /// Ring in slot `index`, if one is shown
    pub fn show_limit(&self, index: usize) -> Option<&ShowLimitSlot> {
        self.show_limits.get(index).and_then(Option::as_ref)
    }

    /// Shows a ring of `radius` around `pos` (or around `link` while it
    /// lives) for `duration` seconds in slot `index`
    pub fn set_show_limit(&mut self, index: usize, link: Option<Entity>, pos: Vec3, radius: f32, duration: f32) {
        if index >= MAX_SHOW_LIMIT {
            log::warn!("Show limit slot {} out of range", index);
            return;
        }
        self.flush_show_limit(index);
        let Some(layout) = ring_layout(radius) else {
            return;
        };
        let particles = (0..layout.total)
            .map(|_| {
                self.world
                    .particles
                    .create(ParticleKind::ShowLimit, pos, layout.particle_size, 0.0)
            })
            .collect();
        self.show_limits[index] = Some(ShowLimitSlot {
            link,
            pos,
            radius,
            duration,
            time: 0.0,
            layout,
            particles,
        });
    }

    /// Removes the ring in slot `index` and its particles
    pub fn flush_show_limit(&mut self, index: usize) {
        let Some(slot) = self.show_limits.get_mut(index).and_then(Option::take) else {
            return;
        };
        for handle in slot.particles {
            self.world.particles.delete(handle);
        }
    }

    /// Shows the working radius of the selected object
    pub fn start_show_limit(&mut self) {
        let Some(selected) = self.selected() else {
            return;
        };
        let radius = self.world.registry.attributes(selected).show_limit_radius;
        if radius == 0.0 {
            return;
        }
        let Some(pos) = self.world.registry.position(selected) else {
            return;
        };
        self.set_show_limit(0, Some(selected), pos, radius, SHOW_LIMIT_TIME);
    }

    pub(super) fn frame_show_limit(&mut self, rel_time: f32) {
        for index in 0..MAX_SHOW_LIMIT {
            let Some(slot) = self.show_limits[index].as_mut() else {
                continue;
            };
            if let Some(link) = slot.link {
                match self.world.registry.position(link) {
                    Some(pos) if self.world.registry.is_alive(link) => slot.pos = pos,
                    _ => {
                        self.flush_show_limit(index);
                        continue;
                    }
                }
            }
            slot.time += rel_time;
            if slot.time >= slot.duration {
                self.flush_show_limit(index);
                continue;
            }

            let points = ring_points((slot.pos.x, slot.pos.z), slot.radius, slot.time, slot.duration, slot.layout.total);
            let terrain = &self.world.environment.terrain;
            for (handle, (x, z)) in slot.particles.iter().zip(points) {
                let p = Vec3::new(x, 0.0, z);
                let p = Vec3::new(x, terrain.floor_level(p) + slot.layout.lift, z);
                self.world.particles.set_position(*handle, p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cleanup, simul};
    use super::*;
    use botfield_logic::object_type::ObjectType;

    #[test]
    fn test_ring_created_and_expires() {
        let mut orch = simul("limit-expire");
        orch.set_show_limit(2, None, Vec3::new(5.0, 0.0, 5.0), 10.0, 3.0);
        let count = orch.show_limit(2).unwrap().particles().len();
        assert_eq!(count, 25);
        assert_eq!(orch.world.particles.count_kind(ParticleKind::ShowLimit), 25);

        orch.frame_show_limit(1.5);
        assert!(orch.show_limit(2).is_some());
        orch.frame_show_limit(2.0);
        assert!(orch.show_limit(2).is_none());
        assert_eq!(orch.world.particles.count_kind(ParticleKind::ShowLimit), 0);
        cleanup(&orch);
    }

    #[test]
    fn test_ring_follows_linked_object() {
        let mut orch = simul("limit-follow");
        let bot = orch.selected().unwrap();
        orch.set_show_limit(0, Some(bot), Vec3::ZERO, 20.0, 10.0);
        orch.world.registry.set_position(bot, Vec3::new(100.0, 0.0, 100.0));
        orch.frame_show_limit(2.0);
        let slot = orch.show_limit(0).unwrap();
        assert_eq!(slot.pos, Vec3::new(100.0, 0.0, 100.0));
        let first = orch.world.particles.get(slot.particles()[0]).unwrap();
        let d = ((first.position.x - 100.0).powi(2) + (first.position.z - 100.0).powi(2)).sqrt();
        assert!((d - 20.0).abs() < 1e-3);
        assert!((first.position.y - 0.5).abs() < 1e-6);
        cleanup(&orch);
    }

    #[test]
    fn test_ring_dropped_with_its_object() {
        let mut orch = simul("limit-dead");
        let ant = orch.world.registry.first_of_type(ObjectType::Ant).unwrap();
        orch.set_show_limit(1, Some(ant), Vec3::ZERO, 10.0, 10.0);
        orch.world.registry.destroy(ant);
        orch.frame_show_limit(0.1);
        assert!(orch.show_limit(1).is_none());
        cleanup(&orch);
    }

    #[test]
    fn test_start_needs_a_radius() {
        let mut orch = simul("limit-start");
        let bot = orch.selected().unwrap();
        orch.start_show_limit();
        assert!(orch.show_limit(0).is_none());
        if let Some(mut attrs) = orch.world.registry.attributes_mut(bot) {
            attrs.show_limit_radius = 40.0;
        }
        orch.start_show_limit();
        let slot = orch.show_limit(0).unwrap();
        assert_eq!(slot.link, Some(bot));
        assert_eq!(slot.duration, SHOW_LIMIT_TIME);
        cleanup(&orch);
    }

    #[test]
    fn test_out_of_range_slot_ignored() {
        let mut orch = simul("limit-range");
        orch.set_show_limit(MAX_SHOW_LIMIT, None, Vec3::ZERO, 10.0, 10.0);
        assert_eq!(orch.world.particles.count_kind(ParticleKind::ShowLimit), 0);
        cleanup(&orch);
    }
}
