//! Command console mini-language.
//!
//! Console lines are matched exactly against a fixed verb list, except for
//! `speed <factor>` which extracts a float. Parsing never fails: anything
//! unrecognised becomes [`ConsoleCommand::Unknown`] and the caller decides
//! how to report it.

use serde::{Deserialize, Serialize};

/// Render toggles reachable from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderToggle {
    Shadow,
    Dirty,
    Fog,
    Lens,
    Water,
    Sky,
    Planet,
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsoleCommand {
    // Simulation-only
    WinMission,
    LostMission,
    TrainerPilot,
    Fly,
    AllResearch,
    AllBuildings,
    All,
    NoLimit,
    Controller,
    /// Free photo camera; `hide_ui` also hides map and texts.
    Photo { hide_ui: bool },
    NoClip,
    Clip,
    FullPower,
    FullEnergy,
    FullShield,
    FullRange,
    // Always available
    DebugMode,
    ShowStat,
    Toggle(RenderToggle),
    SelectInsect,
    ShowSoluce,
    AllMission,
    InvRadar,
    Speed(f32),
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one console line. Returns `None` for an empty line.
    pub fn parse(line: &str) -> Option<Self> {
        if line.is_empty() {
            return None;
        }
        let cmd = match line {
            "winmission" => Self::WinMission,
            "lostmission" => Self::LostMission,
            "trainerpilot" => Self::TrainerPilot,
            "fly" => Self::Fly,
            "allresearch" => Self::AllResearch,
            "allbuildings" => Self::AllBuildings,
            "all" => Self::All,
            "nolimit" => Self::NoLimit,
            "controller" => Self::Controller,
            "photo1" => Self::Photo { hide_ui: false },
            "photo2" => Self::Photo { hide_ui: true },
            "noclip" => Self::NoClip,
            "clip" => Self::Clip,
            "fullpower" => Self::FullPower,
            "fullenergy" => Self::FullEnergy,
            "fullshield" => Self::FullShield,
            "fullrange" => Self::FullRange,
            "debugmode" => Self::DebugMode,
            "showstat" => Self::ShowStat,
            "invshadow" => Self::Toggle(RenderToggle::Shadow),
            "invdirty" => Self::Toggle(RenderToggle::Dirty),
            "invfog" => Self::Toggle(RenderToggle::Fog),
            "invlens" => Self::Toggle(RenderToggle::Lens),
            "invwater" => Self::Toggle(RenderToggle::Water),
            "invsky" => Self::Toggle(RenderToggle::Sky),
            "invplanet" => Self::Toggle(RenderToggle::Planet),
            "selectinsect" => Self::SelectInsect,
            "showsoluce" => Self::ShowSoluce,
            "allmission" => Self::AllMission,
            "invradar" => Self::InvRadar,
            other => match parse_speed(other) {
                Some(speed) => Self::Speed(speed),
                None => Self::Unknown(other.to_string()),
            },
        };
        Some(cmd)
    }

    /// Whether the command only has an effect during a simulation.
    pub fn requires_simulation(&self) -> bool {
        matches!(
            self,
            Self::WinMission
                | Self::LostMission
                | Self::TrainerPilot
                | Self::Fly
                | Self::AllResearch
                | Self::AllBuildings
                | Self::All
                | Self::NoLimit
                | Self::Controller
                | Self::Photo { .. }
                | Self::NoClip
                | Self::Clip
                | Self::FullPower
                | Self::FullEnergy
                | Self::FullShield
                | Self::FullRange
        )
    }
}

/// `speed %f`: the leading float after the verb, trailing text ignored.
fn parse_speed(line: &str) -> Option<f32> {
    let rest = line.strip_prefix("speed")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let end = rest
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || ((*c == '-' || *c == '+') && *i == 0)))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_verbs() {
        assert_eq!(ConsoleCommand::parse("allresearch"), Some(ConsoleCommand::AllResearch));
        assert_eq!(
            ConsoleCommand::parse("photo2"),
            Some(ConsoleCommand::Photo { hide_ui: true })
        );
        assert_eq!(
            ConsoleCommand::parse("invfog"),
            Some(ConsoleCommand::Toggle(RenderToggle::Fog))
        );
        assert_eq!(ConsoleCommand::parse(""), None);
    }

    #[test]
    fn test_speed_extraction() {
        assert_eq!(ConsoleCommand::parse("speed 2.5"), Some(ConsoleCommand::Speed(2.5)));
        assert_eq!(ConsoleCommand::parse("speed 4x"), Some(ConsoleCommand::Speed(4.0)));
        assert_eq!(
            ConsoleCommand::parse("speed fast"),
            Some(ConsoleCommand::Unknown("speed fast".into()))
        );
        assert_eq!(
            ConsoleCommand::parse("speedy 2"),
            Some(ConsoleCommand::Unknown("speedy 2".into()))
        );
    }

    #[test]
    fn test_simulation_only_flags() {
        assert!(ConsoleCommand::WinMission.requires_simulation());
        assert!(!ConsoleCommand::ShowStat.requires_simulation());
        assert!(!ConsoleCommand::Speed(1.0).requires_simulation());
    }
}
