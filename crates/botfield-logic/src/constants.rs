//! Runtime constants - research and build bitmasks, timings, pool sizes.
//!
//! Bitmasks are plain `u32` values so they can be stored in level files and
//! save files as integers.

pub mod research {
    pub const TANK: u32 = 1 << 0;
    pub const FLY: u32 = 1 << 1;
    pub const THUMP: u32 = 1 << 2;
    pub const CANON: u32 = 1 << 3;
    pub const TOWER: u32 = 1 << 4;
    pub const PHAZER: u32 = 1 << 5;
    pub const SHIELD: u32 = 1 << 6;
    pub const ATOMIC: u32 = 1 << 7;
    pub const IPAW: u32 = 1 << 8;
    pub const IGUN: u32 = 1 << 9;
    pub const RECYCLER: u32 = 1 << 10;
    pub const SUBM: u32 = 1 << 11;
    pub const SNIFFER: u32 = 1 << 12;

    /// Level-file names for research bits.
    pub const NAMES: &[(&str, u32)] = &[
        ("TRACKER", TANK),
        ("WINGER", FLY),
        ("THUMPER", THUMP),
        ("SHOOTER", CANON),
        ("TOWER", TOWER),
        ("PHAZER", PHAZER),
        ("SHIELD", SHIELD),
        ("ATOMIC", ATOMIC),
        ("iPAW", IPAW),
        ("iGUN", IGUN),
        ("RECYCLER", RECYCLER),
        ("SUBBER", SUBM),
        ("SNIFFER", SNIFFER),
    ];

    pub fn from_name(name: &str) -> Option<u32> {
        NAMES.iter().find(|(n, _)| *n == name).map(|(_, bit)| *bit)
    }
}

pub mod build {
    pub const FACTORY: u32 = 1 << 0;
    pub const DERRICK: u32 = 1 << 1;
    pub const CONVERT: u32 = 1 << 2;
    pub const RADAR: u32 = 1 << 3;
    pub const ENERGY: u32 = 1 << 4;
    pub const NUCLEAR: u32 = 1 << 5;
    pub const STATION: u32 = 1 << 6;
    pub const REPAIR: u32 = 1 << 7;
    pub const TOWER: u32 = 1 << 8;
    pub const RESEARCH: u32 = 1 << 9;
    pub const LABO: u32 = 1 << 10;
    pub const PARA: u32 = 1 << 11;
    pub const INFO: u32 = 1 << 12;
    pub const DESTROYER: u32 = 1 << 13;
    /// Terraforming (flatten ground)
    pub const GFLAT: u32 = 1 << 16;
    /// Flag placement
    pub const FLAG: u32 = 1 << 17;

    pub const NAMES: &[(&str, u32)] = &[
        ("BotFactory", FACTORY),
        ("Derrick", DERRICK),
        ("Converter", CONVERT),
        ("RadarStation", RADAR),
        ("PowerPlant", ENERGY),
        ("NuclearPlant", NUCLEAR),
        ("PowerStation", STATION),
        ("RepairCenter", REPAIR),
        ("DefenseTower", TOWER),
        ("ResearchCenter", RESEARCH),
        ("AutoLab", LABO),
        ("PowerCaptor", PARA),
        ("ExchangePost", INFO),
        ("Destroyer", DESTROYER),
        ("FlatGround", GFLAT),
        ("Flag", FLAG),
    ];

    pub fn from_name(name: &str) -> Option<u32> {
        NAMES.iter().find(|(n, _)| *n == name).map(|(_, bit)| *bit)
    }
}

/// Gameplay seconds before the welcome SatCom message may open.
pub const SATCOM_WELCOME_DELAY: f32 = 0.1;
/// Hover time before a tooltip is shown (seconds).
pub const TOOLTIP_DELAY: f32 = 0.2;
/// Maximum number of entries in the selection history.
pub const SELECTION_HISTORY_LEN: usize = 50;
/// Number of show-limit slots.
pub const MAX_SHOW_LIMIT: usize = 5;
/// Maximum particles per show-limit ring.
pub const MAX_SHOW_PARTICLES: usize = 200;
/// Default show-limit duration (seconds).
pub const SHOW_LIMIT_TIME: f32 = 20.0;
/// Maximum number of NewScript names.
pub const MAX_NEW_SCRIPT_NAMES: usize = 20;
/// Maximum obligatory / prohibited token entries each.
pub const MAX_TOKENS: usize = 100;
/// Maximum building level ids per TerrainLevel command.
pub const MAX_TERRAIN_LEVEL_IDS: usize = 50;
/// Maximum cells in a TerrainInitTextures mosaic.
pub const MAX_TERRAIN_TEXTURE_CELLS: i32 = 100;
/// Highest program slot index scanned when loading or saving scripts.
pub const MAX_PROGRAM_SLOTS: usize = 1000;
/// Gameplay seconds after which leaving a mission counts as a try.
pub const TRY_COUNT_MIN_TIME: f32 = 10.0;
/// Default win/lost delay after an end condition resolves (seconds).
pub const DEFAULT_END_DELAY: f32 = 2.0;
/// Maximum length of a console command.
pub const CONSOLE_MAX_CHARS: usize = 100;
/// Ending rank that terminates the game instead of returning to the level list.
pub const FINAL_ENDING_RANK: i32 = 904;
