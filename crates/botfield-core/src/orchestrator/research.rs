//! Build and factory gating by unlocked buildings and finished research.

use thiserror::Error;

use botfield_logic::constants::research;
use botfield_logic::object_type::ObjectType;

use super::MissionOrchestrator;

/// Why an object cannot be built or produced
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRefusal {
    #[error("building not enabled in this mission")]
    Disabled,
    #[error("research not done yet")]
    Research,
}

impl MissionOrchestrator {
    /// Whether `team` finished research `flag`. A team seen for the first
    /// time starts from the player's research.
    pub fn is_research_done(&mut self, flag: u32, team: i32) -> bool {
        *self.scene.research_done_mut(team) & flag != 0
    }

    /// Marks research `flag` done for `team`. The player's research is
    /// remembered for free games.
    pub fn mark_research_done(&mut self, flag: u32, team: i32) {
        *self.scene.research_done_mut(team) |= flag;
        if team == 0 {
            let done = self.scene.research_done(0);
            self.profile.merge_unlocks(done, 0);
        }
    }

    pub fn can_build_error(&mut self, ty: ObjectType, team: i32) -> Result<(), BuildRefusal> {
        match ty.build_flag() {
            Some(flag) if self.scene.build & flag != 0 => {}
            _ => return Err(BuildRefusal::Disabled),
        }
        self.research_gate(ty.required_research(), team)
    }

    pub fn can_build(&mut self, ty: ObjectType, team: i32) -> bool {
        self.can_build_error(ty, team).is_ok()
    }

    pub fn can_factory_error(&mut self, ty: ObjectType, team: i32) -> Result<(), BuildRefusal> {
        // Subbers are only unlocked by the level itself
        if ty == ObjectType::MobileSa && !self.is_research_done(research::SUBM, team) {
            return Err(BuildRefusal::Disabled);
        }
        self.research_gate(ty.required_research(), team)
    }

    pub fn can_factory(&mut self, ty: ObjectType, team: i32) -> bool {
        self.can_factory_error(ty, team).is_ok()
    }

    fn research_gate(&mut self, required: u32, team: i32) -> Result<(), BuildRefusal> {
        if required == 0 {
            return Ok(());
        }
        let done = *self.scene.research_done_mut(team);
        if done & required == required {
            Ok(())
        } else {
            Err(BuildRefusal::Research)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cleanup, orchestrator_with, simul, BASIC_LEVEL};
    use super::*;
    use botfield_logic::phase::Phase;

    #[test]
    fn test_new_team_copies_player_research() {
        let mut orch = simul("research-copy");
        orch.mark_research_done(research::TANK, 0);
        assert!(orch.is_research_done(research::TANK, 3));

        // Later player research no longer leaks into the copied team
        orch.mark_research_done(research::FLY, 0);
        assert!(!orch.is_research_done(research::FLY, 3));
        orch.mark_research_done(research::FLY, 3);
        assert!(orch.is_research_done(research::FLY, 3));
        cleanup(&orch);
    }

    #[test]
    fn test_player_research_reaches_profile() {
        let mut orch = simul("research-profile");
        orch.mark_research_done(research::SHIELD, 0);
        assert_ne!(orch.profile.free_game_research & research::SHIELD, 0);
        orch.mark_research_done(research::PHAZER, 2);
        assert_eq!(orch.profile.free_game_research & research::PHAZER, 0);
        cleanup(&orch);
    }

    #[test]
    fn test_can_build_needs_flag_and_research() {
        let level = format!("{}EnableBuild type=DefenseTower\nEnableBuild type=BotFactory\n", BASIC_LEVEL);
        let mut orch = orchestrator_with("research-build", &level);
        orch.change_phase(Phase::Simul);

        assert!(orch.can_build(ObjectType::Factory, 0));
        assert_eq!(orch.can_build_error(ObjectType::Derrick, 0), Err(BuildRefusal::Disabled));
        assert_eq!(orch.can_build_error(ObjectType::Tower, 0), Err(BuildRefusal::Research));
        orch.mark_research_done(research::TOWER, 0);
        assert!(orch.can_build(ObjectType::Tower, 0));
        cleanup(&orch);
    }

    #[test]
    fn test_can_factory_by_drive_and_tool() {
        let mut orch = simul("research-factory");
        assert!(orch.can_factory(ObjectType::MobileWa, 0));
        assert!(!orch.can_factory(ObjectType::MobileTa, 0));
        assert!(!orch.can_factory(ObjectType::MobileFc, 0));

        orch.mark_research_done(research::FLY, 0);
        assert_eq!(orch.can_factory_error(ObjectType::MobileFc, 0), Err(BuildRefusal::Research));
        orch.mark_research_done(research::CANON, 0);
        assert!(orch.can_factory(ObjectType::MobileFc, 0));

        assert_eq!(orch.can_factory_error(ObjectType::MobileSa, 0), Err(BuildRefusal::Disabled));
        cleanup(&orch);
    }
}
