//! Application phases and the predicates that decide when a world exists.

use serde::{Deserialize, Serialize};

/// Top-level application mode. Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    Welcome1 = 0,
    Welcome2 = 1,
    Welcome3 = 2,
    PlayerSelect = 3,
    Appearance = 4,
    MainMenu = 5,
    LevelList = 6,
    Simul = 7,
    SetupDisplay = 8,
    SetupGraphics = 9,
    SetupGame = 10,
    SetupControls = 11,
    SetupSound = 12,
    SetupDisplaySimul = 13,
    SetupGraphicsSimul = 14,
    SetupGameSimul = 15,
    SetupControlsSimul = 16,
    SetupSoundSimul = 17,
    WriteSimul = 18,
    Read = 19,
    ReadSimul = 20,
    Win = 21,
    Lost = 22,
    QuitScreen = 23,
}

impl Phase {
    pub fn from_u8(val: u8) -> Option<Self> {
        Some(match val {
            0 => Self::Welcome1,
            1 => Self::Welcome2,
            2 => Self::Welcome3,
            3 => Self::PlayerSelect,
            4 => Self::Appearance,
            5 => Self::MainMenu,
            6 => Self::LevelList,
            7 => Self::Simul,
            8 => Self::SetupDisplay,
            9 => Self::SetupGraphics,
            10 => Self::SetupGame,
            11 => Self::SetupControls,
            12 => Self::SetupSound,
            13 => Self::SetupDisplaySimul,
            14 => Self::SetupGraphicsSimul,
            15 => Self::SetupGameSimul,
            16 => Self::SetupControlsSimul,
            17 => Self::SetupSoundSimul,
            18 => Self::WriteSimul,
            19 => Self::Read,
            20 => Self::ReadSimul,
            21 => Self::Win,
            22 => Self::Lost,
            23 => Self::QuitScreen,
            _ => return None,
        })
    }

    /// All phases, in declaration order.
    pub fn all() -> impl Iterator<Item = Phase> {
        (0u8..=23).filter_map(Self::from_u8)
    }

    /// Setup screens opened from inside a running simulation. The world is
    /// kept alive underneath them.
    pub fn is_simulation_config(&self) -> bool {
        let v = *self as u8;
        (v >= Self::SetupDisplaySimul as u8 && v <= Self::SetupSoundSimul as u8)
            || *self == Self::ReadSimul
            || *self == Self::WriteSimul
    }

    /// Phases in which terrain and objects exist.
    pub fn has_world(&self) -> bool {
        matches!(self, Self::Simul | Self::Win | Self::Lost | Self::Appearance)
            || self.is_simulation_config()
    }

    pub fn is_main_menu(&self) -> bool {
        !self.has_world()
    }
}

/// Whether switching from `old` to `new` tears down and rebuilds the world.
/// In-mission setup screens keep the world unless they exit to a menu.
pub fn needs_world_reset(old: Phase, new: Phase) -> bool {
    if old.is_simulation_config() {
        return !new.has_world();
    }
    (old.has_world() || new.has_world()) && !new.is_simulation_config()
}
