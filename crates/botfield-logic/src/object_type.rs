//! Object type catalogue - level-file names, categories and capability tags.
//!
//! Every game object carries exactly one [`ObjectType`]. What the runtime may
//! do with an object (run programs on it, let it carry cargo, update it each
//! frame, ...) is decided once at creation from [`ObjectType::capabilities`]
//! instead of being discovered through a class hierarchy.

use serde::{Deserialize, Serialize};

// ============================================================================
// CAPABILITIES
// ============================================================================

/// A single capability an object may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Capability {
    /// Owns a brain with programs and an execution stack.
    Programmable = 1 << 0,
    /// Can hold one cargo object.
    Carrier = 1 << 1,
    /// Has a power cell slot.
    Powered = 1 << 2,
    /// Can be carried by a carrier or sit in a power slot.
    Transportable = 1 << 3,
    /// Receives the per-frame update.
    Interactive = 1 << 4,
    /// Has an automaton (building animation, production cycle).
    Automated = 1 << 5,
    /// Player-drivable with its own camera preferences.
    Controllable = 1 << 6,
    /// Damageable, can be destroyed by a pyro effect.
    Damageable = 1 << 7,
}

/// Set of capabilities resolved at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const EMPTY: Self = Self(0);

    pub fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap as u16)
    }

    pub fn without(self, cap: Capability) -> Self {
        Self(self.0 & !(cap as u16))
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.0 & cap as u16 != 0
    }

    pub fn bits(&self) -> u16 {
        self.0
    }
}

// ============================================================================
// OBJECT TYPES
// ============================================================================

/// Kind of a game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Null,
    // Buildings
    Portico,
    Base,
    Derrick,
    Factory,
    Station,
    Convert,
    Repair,
    Tower,
    News,
    Labo,
    Energy,
    Research,
    Radar,
    Info,
    Nuclear,
    Para,
    Safe,
    Huston,
    Destroyer,
    // Areas and markers
    Start,
    End,
    Target1,
    Target2,
    MarkPower,
    MarkStone,
    MarkUranium,
    Flag,
    // Transportable items
    Stone,
    Uranium,
    Metal,
    Power,
    Atomic,
    Bullet,
    BBox,
    Tnt,
    Bomb,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    Egg,
    // Decoration
    Plant(u8),
    Tree(u8),
    Quartz(u8),
    Root(u8),
    Mushroom(u8),
    Scrap(u8),
    Ruin(u8),
    // Insects
    Mother,
    Ant,
    Spider,
    Bee,
    Worm,
    // Characters
    Human,
    Tech,
    Toto,
    /// Invisible fixed helper object, never saved.
    Fix,
    /// Invisible mission controller running the level script.
    Controller,
    Apollo2,
    // Vehicles: winged / tracked / wheeled / legged
    MobileFa,
    MobileTa,
    MobileWa,
    MobileIa,
    MobileFc,
    MobileTc,
    MobileWc,
    MobileIc,
    MobileFi,
    MobileTi,
    MobileWi,
    MobileIi,
    MobileFs,
    MobileTs,
    MobileWs,
    MobileIs,
    MobileRt,
    MobileRc,
    MobileRr,
    MobileRs,
    MobileSa,
    MobileTg,
    MobileFt,
    MobileTt,
    MobileWt,
    MobileIt,
    MobileDr,
}

/// Fixed names for the non-indexed types.
const NAMES: &[(ObjectType, &str)] = &[
    (ObjectType::Null, "NULL"),
    (ObjectType::Portico, "Portico"),
    (ObjectType::Base, "SpaceShip"),
    (ObjectType::Derrick, "Derrick"),
    (ObjectType::Factory, "BotFactory"),
    (ObjectType::Station, "PowerStation"),
    (ObjectType::Convert, "Converter"),
    (ObjectType::Repair, "RepairCenter"),
    (ObjectType::Tower, "DefenseTower"),
    (ObjectType::News, "Host"),
    (ObjectType::Labo, "AutoLab"),
    (ObjectType::Energy, "PowerPlant"),
    (ObjectType::Research, "ResearchCenter"),
    (ObjectType::Radar, "RadarStation"),
    (ObjectType::Info, "ExchangePost"),
    (ObjectType::Nuclear, "NuclearPlant"),
    (ObjectType::Para, "PowerCaptor"),
    (ObjectType::Safe, "Vault"),
    (ObjectType::Huston, "Houston"),
    (ObjectType::Destroyer, "Destroyer"),
    (ObjectType::Start, "StartArea"),
    (ObjectType::End, "GoalArea"),
    (ObjectType::Target1, "Target1"),
    (ObjectType::Target2, "Target2"),
    (ObjectType::MarkPower, "PowerSpot"),
    (ObjectType::MarkStone, "TitaniumSpot"),
    (ObjectType::MarkUranium, "UraniumSpot"),
    (ObjectType::Flag, "BlueFlag"),
    (ObjectType::Stone, "TitaniumOre"),
    (ObjectType::Uranium, "UraniumOre"),
    (ObjectType::Metal, "Titanium"),
    (ObjectType::Power, "PowerCell"),
    (ObjectType::Atomic, "NuclearCell"),
    (ObjectType::Bullet, "OrgaMatter"),
    (ObjectType::BBox, "BlackBox"),
    (ObjectType::Tnt, "TNT"),
    (ObjectType::Bomb, "Mine"),
    (ObjectType::KeyA, "KeyA"),
    (ObjectType::KeyB, "KeyB"),
    (ObjectType::KeyC, "KeyC"),
    (ObjectType::KeyD, "KeyD"),
    (ObjectType::Egg, "Egg"),
    (ObjectType::Mother, "AlienQueen"),
    (ObjectType::Ant, "AlienAnt"),
    (ObjectType::Spider, "AlienSpider"),
    (ObjectType::Bee, "AlienWasp"),
    (ObjectType::Worm, "AlienWorm"),
    (ObjectType::Human, "Me"),
    (ObjectType::Tech, "Tech"),
    (ObjectType::Toto, "Robby"),
    (ObjectType::Fix, "Fix"),
    (ObjectType::Controller, "Controller"),
    (ObjectType::Apollo2, "ApolloJeep"),
    (ObjectType::MobileFa, "WingedGrabber"),
    (ObjectType::MobileTa, "TrackedGrabber"),
    (ObjectType::MobileWa, "WheeledGrabber"),
    (ObjectType::MobileIa, "LeggedGrabber"),
    (ObjectType::MobileFc, "WingedShooter"),
    (ObjectType::MobileTc, "TrackedShooter"),
    (ObjectType::MobileWc, "WheeledShooter"),
    (ObjectType::MobileIc, "LeggedShooter"),
    (ObjectType::MobileFi, "WingedOrgaShooter"),
    (ObjectType::MobileTi, "TrackedOrgaShooter"),
    (ObjectType::MobileWi, "WheeledOrgaShooter"),
    (ObjectType::MobileIi, "LeggedOrgaShooter"),
    (ObjectType::MobileFs, "WingedSniffer"),
    (ObjectType::MobileTs, "TrackedSniffer"),
    (ObjectType::MobileWs, "WheeledSniffer"),
    (ObjectType::MobileIs, "LeggedSniffer"),
    (ObjectType::MobileRt, "Thumper"),
    (ObjectType::MobileRc, "PhazerShooter"),
    (ObjectType::MobileRr, "Recycler"),
    (ObjectType::MobileRs, "Shielder"),
    (ObjectType::MobileSa, "Subber"),
    (ObjectType::MobileTg, "TargetBot"),
    (ObjectType::MobileFt, "WingedTrainer"),
    (ObjectType::MobileTt, "TrackedTrainer"),
    (ObjectType::MobileWt, "WheeledTrainer"),
    (ObjectType::MobileIt, "LeggedTrainer"),
    (ObjectType::MobileDr, "Scribbler"),
];

/// Name prefixes for the indexed decoration types, with their index bound.
const INDEXED: &[(&str, u8)] = &[
    ("Greenery", 20),
    ("Tree", 6),
    ("Quartz", 4),
    ("Root", 6),
    ("Mushroom", 3),
    ("Scrap", 6),
    ("Ruin", 10),
];

impl ObjectType {
    /// Parse a level-file type name.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some((ty, _)) = NAMES.iter().find(|(_, n)| *n == name) {
            return Some(*ty);
        }
        for (prefix, bound) in INDEXED {
            if let Some(rest) = name.strip_prefix(prefix) {
                let index: u8 = rest.parse().ok()?;
                if index >= *bound {
                    return None;
                }
                return Some(match *prefix {
                    "Greenery" => Self::Plant(index),
                    "Tree" => Self::Tree(index),
                    "Quartz" => Self::Quartz(index),
                    "Root" => Self::Root(index),
                    "Mushroom" => Self::Mushroom(index),
                    "Scrap" => Self::Scrap(index),
                    _ => Self::Ruin(index),
                });
            }
        }
        None
    }

    /// Level-file name of this type.
    pub fn name(&self) -> String {
        match self {
            Self::Plant(i) => format!("Greenery{}", i),
            Self::Tree(i) => format!("Tree{}", i),
            Self::Quartz(i) => format!("Quartz{}", i),
            Self::Root(i) => format!("Root{}", i),
            Self::Mushroom(i) => format!("Mushroom{}", i),
            Self::Scrap(i) => format!("Scrap{}", i),
            Self::Ruin(i) => format!("Ruin{}", i),
            other => NAMES
                .iter()
                .find(|(ty, _)| ty == other)
                .map(|(_, n)| n.to_string())
                .unwrap_or_else(|| "NULL".to_string()),
        }
    }

    /// Whether a CreateObject line without an explicit `gadget` flag counts
    /// as decoration. `Root5` is deliberately not a gadget.
    pub fn is_default_gadget(&self) -> bool {
        match self {
            Self::Tech => true,
            Self::Plant(i) => *i <= 19,
            Self::Tree(i) => *i <= 5,
            Self::Quartz(i) => *i <= 3,
            Self::Root(i) => *i <= 4,
            _ => false,
        }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(
            self,
            Self::MobileFa
                | Self::MobileTa
                | Self::MobileWa
                | Self::MobileIa
                | Self::MobileFc
                | Self::MobileTc
                | Self::MobileWc
                | Self::MobileIc
                | Self::MobileFi
                | Self::MobileTi
                | Self::MobileWi
                | Self::MobileIi
                | Self::MobileFs
                | Self::MobileTs
                | Self::MobileWs
                | Self::MobileIs
                | Self::MobileRt
                | Self::MobileRc
                | Self::MobileRr
                | Self::MobileRs
                | Self::MobileSa
                | Self::MobileTg
                | Self::MobileFt
                | Self::MobileTt
                | Self::MobileWt
                | Self::MobileIt
                | Self::MobileDr
        )
    }

    pub fn is_trainer_mobile(&self) -> bool {
        matches!(
            self,
            Self::MobileFt | Self::MobileTt | Self::MobileWt | Self::MobileIt
        )
    }

    pub fn is_building(&self) -> bool {
        matches!(
            self,
            Self::Portico
                | Self::Base
                | Self::Derrick
                | Self::Factory
                | Self::Station
                | Self::Convert
                | Self::Repair
                | Self::Tower
                | Self::News
                | Self::Labo
                | Self::Energy
                | Self::Research
                | Self::Radar
                | Self::Info
                | Self::Nuclear
                | Self::Para
                | Self::Safe
                | Self::Huston
                | Self::Destroyer
        )
    }

    pub fn is_insect(&self) -> bool {
        matches!(
            self,
            Self::Mother | Self::Ant | Self::Spider | Self::Bee | Self::Worm | Self::MobileTg
        )
    }

    /// Types the player may select under normal rules.
    pub fn is_selectable_kind(&self) -> bool {
        if self.is_mobile() && *self != Self::MobileTg {
            return true;
        }
        matches!(
            self,
            Self::Human
                | Self::Toto
                | Self::Apollo2
                | Self::Base
                | Self::Derrick
                | Self::Factory
                | Self::Repair
                | Self::Destroyer
                | Self::Station
                | Self::Convert
                | Self::Tower
                | Self::Research
                | Self::Radar
                | Self::Info
                | Self::Energy
                | Self::Labo
                | Self::Nuclear
                | Self::Para
                | Self::Safe
                | Self::Huston
        )
    }

    /// Power cells resolve to their transporter when picked.
    pub fn is_power_cell(&self) -> bool {
        matches!(self, Self::Power | Self::Atomic)
    }

    /// Building flag required to construct this type, if any.
    pub fn build_flag(&self) -> Option<u32> {
        use crate::constants::build;
        match self {
            Self::Derrick => Some(build::DERRICK),
            Self::Factory => Some(build::FACTORY),
            Self::Station => Some(build::STATION),
            Self::Convert => Some(build::CONVERT),
            Self::Repair => Some(build::REPAIR),
            Self::Tower => Some(build::TOWER),
            Self::Research => Some(build::RESEARCH),
            Self::Radar => Some(build::RADAR),
            Self::Energy => Some(build::ENERGY),
            Self::Labo => Some(build::LABO),
            Self::Nuclear => Some(build::NUCLEAR),
            Self::Info => Some(build::INFO),
            Self::Para => Some(build::PARA),
            Self::Destroyer => Some(build::DESTROYER),
            _ => None,
        }
    }

    /// Research bits that must all be done before this type can be built
    /// or produced by a factory.
    pub fn required_research(&self) -> u32 {
        use crate::constants::research;
        use ObjectType::*;
        let tool = match self {
            MobileFs | MobileTs | MobileWs | MobileIs => research::SNIFFER,
            MobileFc | MobileTc | MobileWc | MobileIc => research::CANON,
            MobileFi | MobileTi | MobileWi | MobileIi => research::IGUN,
            _ => 0,
        };
        let drive = match self {
            MobileTa | MobileTc | MobileTi | MobileTs => research::TANK,
            MobileFa | MobileFc | MobileFi | MobileFs => research::FLY,
            MobileIa | MobileIc | MobileIi | MobileIs => research::IPAW,
            MobileRt | MobileRc | MobileRr | MobileRs => research::TANK,
            _ => 0,
        };
        let special = match self {
            MobileRt => research::THUMP,
            MobileRc => research::PHAZER,
            MobileRr => research::RECYCLER,
            MobileRs => research::SHIELD,
            MobileSa => research::SUBM,
            Tower => research::TOWER,
            Atomic => research::ATOMIC,
            _ => 0,
        };
        tool | drive | special
    }

    /// Capabilities resolved once when an object of this type is created.
    pub fn capabilities(&self) -> CapabilitySet {
        if *self == Self::Fix || *self == Self::Null {
            return CapabilitySet::EMPTY;
        }
        let mut caps = CapabilitySet::EMPTY.with(Capability::Interactive);

        if self.is_mobile() {
            caps = caps
                .with(Capability::Controllable)
                .with(Capability::Powered)
                .with(Capability::Damageable);
            if *self != Self::MobileTg {
                caps = caps.with(Capability::Programmable);
            }
            if matches!(
                self,
                Self::MobileFa | Self::MobileTa | Self::MobileWa | Self::MobileIa
            ) {
                caps = caps.with(Capability::Carrier);
            }
        }

        match self {
            Self::Human => {
                caps = caps
                    .with(Capability::Controllable)
                    .with(Capability::Carrier)
                    .with(Capability::Damageable);
            }
            Self::Controller => {
                caps = caps.with(Capability::Programmable);
            }
            Self::Tech | Self::Apollo2 => {
                caps = caps.with(Capability::Controllable);
            }
            Self::Stone
            | Self::Uranium
            | Self::Metal
            | Self::Power
            | Self::Atomic
            | Self::Bullet
            | Self::BBox
            | Self::Tnt
            | Self::KeyA
            | Self::KeyB
            | Self::KeyC
            | Self::KeyD => {
                caps = caps.with(Capability::Transportable);
            }
            Self::Egg | Self::Portico => {
                caps = caps.with(Capability::Automated);
            }
            Self::Mother | Self::Ant | Self::Spider | Self::Bee | Self::Worm => {
                caps = caps.with(Capability::Damageable);
            }
            _ => {}
        }

        if self.is_building() && *self != Self::Portico {
            caps = caps
                .with(Capability::Automated)
                .with(Capability::Damageable);
            if matches!(
                self,
                Self::Tower | Self::Research | Self::Energy | Self::Labo | Self::Nuclear
            ) {
                caps = caps.with(Capability::Powered);
            }
        }

        caps
    }

    /// Whether the object follows its own preferred camera when selected.
    pub fn uses_own_camera(&self) -> bool {
        self.capabilities().has(Capability::Controllable)
    }
}

impl Default for ObjectType {
    fn default() -> Self {
        Self::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_parsing() {
        assert_eq!(ObjectType::from_name("Me"), Some(ObjectType::Human));
        assert_eq!(ObjectType::from_name("Greenery7"), Some(ObjectType::Plant(7)));
        assert_eq!(ObjectType::from_name("Greenery20"), None);
        assert_eq!(ObjectType::from_name("Bogus"), None);
        assert_eq!(ObjectType::Tree(3).name(), "Tree3");
        assert_eq!(ObjectType::MobileWa.name(), "WheeledGrabber");
    }

    #[test]
    fn test_default_gadgets() {
        assert!(ObjectType::Tech.is_default_gadget());
        assert!(ObjectType::Root(4).is_default_gadget());
        assert!(!ObjectType::Root(5).is_default_gadget());
        assert!(!ObjectType::Mushroom(1).is_default_gadget());
        assert!(!ObjectType::Human.is_default_gadget());
    }

    #[test]
    fn test_selectable_kinds() {
        assert!(ObjectType::Human.is_selectable_kind());
        assert!(ObjectType::Factory.is_selectable_kind());
        assert!(!ObjectType::Stone.is_selectable_kind());
        assert!(!ObjectType::Ant.is_selectable_kind());
        assert!(ObjectType::Ant.is_insect());
    }

    #[test]
    fn test_required_research() {
        use crate::constants::research;
        assert_eq!(ObjectType::MobileWa.required_research(), 0);
        assert_eq!(ObjectType::MobileFc.required_research(), research::FLY | research::CANON);
        assert_eq!(ObjectType::MobileRc.required_research(), research::TANK | research::PHAZER);
        assert_eq!(ObjectType::MobileIs.required_research(), research::IPAW | research::SNIFFER);
        assert_eq!(ObjectType::Tower.required_research(), research::TOWER);
        assert_eq!(ObjectType::Factory.required_research(), 0);
    }

    #[test]
    fn test_capabilities() {
        let grabber = ObjectType::MobileWa.capabilities();
        assert!(grabber.has(Capability::Programmable));
        assert!(grabber.has(Capability::Carrier));
        assert!(grabber.has(Capability::Powered));

        let cell = ObjectType::Power.capabilities();
        assert!(cell.has(Capability::Transportable));
        assert!(!cell.has(Capability::Programmable));

        assert_eq!(ObjectType::Fix.capabilities(), CapabilitySet::EMPTY);
        assert!(!ObjectType::MobileTg.capabilities().has(Capability::Programmable));
    }
}
