//! Pyrotechnic effects - explosions, burns and the reset flash.
//!
//! Destructive effects flag their target while they run and destroy it
//! through the registry when they finish.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::registry::ObjectRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PyroType {
    /// Fragmentation of a technical object
    FragT,
    /// Fragmentation of an organic object
    FragO,
    FragW,
    ExploT,
    ExploO,
    ExploW,
    BurnT,
    BurnO,
    Shield,
    /// Flash played on objects put back by a reset
    Reset,
    Win,
    Lost,
    DeadG,
    DeadW,
    FlCreate,
    FlDelete,
    Squash,
}

impl PyroType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "FRAGT" => Self::FragT,
            "FRAGO" => Self::FragO,
            "FRAGW" => Self::FragW,
            "EXPLOT" => Self::ExploT,
            "EXPLOO" => Self::ExploO,
            "EXPLOW" => Self::ExploW,
            "BURNT" => Self::BurnT,
            "BURNO" => Self::BurnO,
            "SHIELD" => Self::Shield,
            "RESET" => Self::Reset,
            "WIN" => Self::Win,
            "LOST" => Self::Lost,
            "DEADG" => Self::DeadG,
            "DEADW" => Self::DeadW,
            "FLCREATE" => Self::FlCreate,
            "FLDELETE" => Self::FlDelete,
            "SQUASH" => Self::Squash,
            _ => return None,
        })
    }

    /// Whether the target is destroyed when the effect ends
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::FragT
                | Self::FragO
                | Self::FragW
                | Self::ExploT
                | Self::ExploO
                | Self::ExploW
                | Self::BurnT
                | Self::BurnO
                | Self::FlDelete
                | Self::Squash
        )
    }

    pub fn duration(&self) -> f32 {
        match self {
            Self::FragT | Self::FragO | Self::FragW => 2.0,
            Self::ExploT | Self::ExploO | Self::ExploW => 3.0,
            Self::BurnT | Self::BurnO => 12.0,
            Self::DeadG | Self::DeadW => 4.0,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pyro {
    pub kind: PyroType,
    pub target: Option<Entity>,
    pub progress: f32,
}

#[derive(Debug, Default)]
pub struct PyroManager {
    pyros: Vec<Pyro>,
}

impl PyroManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, kind: PyroType, target: Option<Entity>, registry: &mut ObjectRegistry) {
        if let Some(entity) = target {
            if let Some(mut flags) = registry.flags_mut(entity) {
                match kind {
                    PyroType::BurnT | PyroType::BurnO => flags.burning = true,
                    k if k.is_destructive() => flags.exploding = true,
                    _ => {}
                }
            }
        }
        self.pyros.push(Pyro {
            kind,
            target,
            progress: 0.0,
        });
    }

    /// Advances every effect; finished destructive effects destroy their
    /// target
    pub fn frame(&mut self, registry: &mut ObjectRegistry, rel_time: f32) {
        for pyro in &mut self.pyros {
            pyro.progress += rel_time / pyro.kind.duration();
        }
        let (done, running): (Vec<Pyro>, Vec<Pyro>) = self.pyros.drain(..).partition(|p| p.progress >= 1.0);
        self.pyros = running;
        for pyro in done.into_iter().filter(|p| p.kind.is_destructive()) {
            if let Some(target) = pyro.target {
                registry.destroy(target);
            }
        }
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.pyros.iter().any(|p| p.target == Some(entity))
    }

    pub fn len(&self) -> usize {
        self.pyros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pyros.is_empty()
    }

    pub fn delete_all(&mut self) {
        self.pyros.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::registry::CreateParams;
    use botfield_logic::object_type::ObjectType;

    #[test]
    fn test_fragmentation_destroys_target() {
        let mut reg = ObjectRegistry::new();
        let stone = reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        let mut pyro = PyroManager::new();
        pyro.create(PyroType::FragT, Some(stone), &mut reg);
        assert!(reg.flags(stone).exploding);
        pyro.frame(&mut reg, 1.0);
        assert!(reg.is_alive(stone));
        pyro.frame(&mut reg, 1.5);
        assert!(!reg.is_alive(stone));
        assert!(pyro.is_empty());
    }

    #[test]
    fn test_reset_flash_keeps_target() {
        let mut reg = ObjectRegistry::new();
        let bot = reg.create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO)).unwrap();
        let mut pyro = PyroManager::new();
        pyro.create(PyroType::Reset, Some(bot), &mut reg);
        pyro.frame(&mut reg, 2.0);
        assert!(reg.is_alive(bot));
        assert_eq!(PyroType::from_name("RESET"), Some(PyroType::Reset));
    }
}
