//! End-of-mission evaluation, the win/lost countdowns and the mission timer.

use std::collections::BTreeMap;

use botfield_logic::end_mission::{apply_research_gate, evaluate_group, ConditionOutcome, MissionResult};

use crate::event::EventType;
use crate::services::{Notice, TextKind};

use super::{InteractionMode, MissionOrchestrator};

/// Countdown used when the win/lost delay expires during a cut-scene
const CUTSCENE_RETRY_DELAY: f32 = 1.0;
/// Delay before the Lost phase when the pilot dies
const IMMEDIATE_LOST_DELAY: f32 = 0.1;

impl MissionOrchestrator {
    /// Evaluates the end conditions of the level. With `frame` set, a won
    /// mission waits until the player leaves in the spaceship.
    ///
    /// Calling it again with an unchanged world returns the same result
    /// without repeating announcements.
    pub fn check_end_mission(&mut self, frame: bool) -> MissionResult {
        let mut immediate = false;

        if !self.scene.has_controller {
            let mut groups: BTreeMap<i32, Vec<ConditionOutcome>> = BTreeMap::new();
            for condition in &self.scene.end_take {
                immediate |= condition.immediate;
                groups
                    .entry(condition.win_team)
                    .or_default()
                    .push(condition.outcome(&self.world.registry));
            }

            let teams: Vec<i32> = groups.keys().copied().filter(|t| *t != 0).collect();
            if teams.is_empty() {
                let global = groups.get(&0).map(Vec::as_slice).unwrap_or(&[]);
                self.mission_result = evaluate_group(global);
            } else {
                self.mission_result = MissionResult::NotTerminated;
                if !teams.iter().any(|t| self.world.registry.team_exists(*t)) {
                    log::info!("All teams died");
                    self.mission_result = MissionResult::Lost;
                }
                for team in teams {
                    if !self.world.registry.team_exists(team) {
                        self.team_defeated(team);
                        continue;
                    }
                    let result = evaluate_group(&groups[&team]);
                    if result.is_lost() {
                        self.team_defeated(team);
                    } else if result == MissionResult::Won {
                        self.team_won(team);
                        self.mission_result = MissionResult::Won;
                        return MissionResult::Won;
                    }
                }
            }

            let done = self.scene.research_done(0);
            self.mission_result = apply_research_gate(self.mission_result, self.scene.end_take_research, done);
        }

        match self.mission_result {
            MissionResult::LostImmediate => {
                if self.lost_delay == 0.0 {
                    self.lost_delay = IMMEDIATE_LOST_DELAY;
                    self.win_delay = 0.0;
                }
                self.mission_over();
                MissionResult::LostImmediate
            }
            MissionResult::Lost => {
                if self.lost_delay == 0.0 {
                    self.world.display.display_notice(Notice::Lost);
                    self.lost_delay = self.scene.end_take_lost_delay;
                    self.win_delay = 0.0;
                }
                self.mission_over();
                MissionResult::Lost
            }
            MissionResult::Won => {
                if self.scene.end_take_win_delay == -1.0 {
                    if self.win_delay == 0.0 {
                        self.win_delay = 1.0;
                        self.lost_delay = 0.0;
                    }
                    self.mission_over();
                    return MissionResult::Won;
                }
                // The player still has to take off
                if frame && self.base.is_some_and(|b| self.is_selectable(b)) && !immediate {
                    return MissionResult::NotTerminated;
                }
                if self.win_delay == 0.0 && !self.winner_announced {
                    self.winner_announced = true;
                    self.world.display.display_notice(Notice::Win);
                    self.announce_time();
                    self.win_delay = self.scene.end_take_win_delay;
                    self.lost_delay = 0.0;
                }
                self.mission_over();
                MissionResult::Won
            }
            MissionResult::NotTerminated => {
                self.world.display.set_enable(true);
                MissionResult::NotTerminated
            }
        }
    }

    /// Ends a controller-driven mission with `result` after `delay` seconds
    pub fn set_end_mission(&mut self, result: MissionResult, delay: f32) {
        if !self.scene.has_controller {
            log::warn!("Mission end requested without a mission controller");
            return;
        }
        self.scene.end_take_win_delay = delay;
        self.scene.end_take_lost_delay = delay;
        self.mission_result = result;
    }

    /// Starts the mission stopwatch if the level uses one
    pub fn start_mission_timer(&mut self) {
        if self.mission_timer.enabled && !self.mission_timer.started {
            log::info!("Starting mission timer");
            self.mission_timer.started = true;
        }
    }

    fn team_defeated(&mut self, team: i32) {
        if self.defeated_teams.insert(team) {
            let name = self.scene.team_names.get(team);
            log::info!("{} lost", name);
            self.world
                .display
                .display_text(&format!("<<< {} lost! >>>", name), TextKind::Error);
        }
        self.world.display.set_enable(false);
        self.world.registry.destroy_team(team);
        self.world.display.set_enable(true);
    }

    fn team_won(&mut self, team: i32) {
        if self.win_delay == 0.0 && !self.winner_announced {
            self.winner_announced = true;
            let name = self.scene.team_names.get(team);
            log::info!("{} won", name);
            self.world
                .display
                .display_text(&format!("<<< {} won the game >>>", name), TextKind::Warning);
            self.announce_time();
            self.win_delay = self.scene.end_take_win_delay;
            self.lost_delay = 0.0;
        }
        self.mission_over();
    }

    fn announce_time(&mut self) {
        if let Some(text) = self.mission_timer.text() {
            self.world.display.display_text(&format!("Time: {}", text), TextKind::Warning);
        }
    }

    /// Common tail of every decided result
    fn mission_over(&mut self) {
        self.mission_timer.stop();
        if self.config.exit_after_mission && !self.quit_posted {
            self.quit_posted = true;
            self.post(EventType::Quit);
        }
        self.world.display.set_enable(false);
    }

    /// Runs the win/lost countdowns; the phase changes once one expires
    /// outside a cut-scene
    pub(super) fn count_down_end_delays(&mut self, rel_time: f32) {
        if self.win_delay > 0.0 {
            self.win_delay -= rel_time;
            if self.win_delay <= 0.0 {
                if self.mode == InteractionMode::CutsceneLocked {
                    self.win_delay = CUTSCENE_RETRY_DELAY;
                } else {
                    self.post(EventType::Win);
                }
            }
        }
        if self.lost_delay > 0.0 {
            self.lost_delay -= rel_time;
            if self.lost_delay <= 0.0 {
                if self.mode == InteractionMode::CutsceneLocked {
                    self.lost_delay = CUTSCENE_RETRY_DELAY;
                } else {
                    self.post(EventType::Lost);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cleanup, orchestrator_with, simul};
    use super::*;
    use botfield_logic::constants::research;
    use botfield_logic::object_type::ObjectType;
    use botfield_logic::phase::Phase;

    const TEAM_LEVEL: &str = "\
TeamName team=1 name=\"Blue\"
TeamName team=2 name=\"Red\"
BeginObject
CreateObject type=WheeledGrabber pos=0;0 team=1 select=1
CreateObject type=WheeledGrabber pos=5;5 team=2
EndMissionTake pos=0;0 dist=1000 type=WheeledGrabber team=1 winTeam=1 lost=0
EndMissionTake pos=0;0 dist=1000 type=WheeledGrabber team=2 winTeam=2 lost=0
";

    fn kill(orch: &mut crate::orchestrator::MissionOrchestrator, ty: ObjectType) {
        let e = orch.world.registry.first_of_type(ty).unwrap();
        orch.world.registry.destroy(e);
        orch.world.registry.sweep();
    }

    #[test]
    fn test_mission_continues_while_alien_lives() {
        let mut orch = simul("end-running");
        assert_eq!(orch.check_end_mission(true), MissionResult::NotTerminated);
        assert!(orch.world.display.is_enabled());
        cleanup(&orch);
    }

    #[test]
    fn test_win_is_announced_once() {
        let mut orch = simul("end-win");
        kill(&mut orch, ObjectType::Ant);
        assert_eq!(orch.check_end_mission(true), MissionResult::Won);
        assert!((orch.win_delay() - 0.5).abs() < 1e-6);
        let notices = orch.world.display.messages().count();
        assert_eq!(orch.check_end_mission(true), MissionResult::Won);
        assert_eq!(orch.world.display.messages().count(), notices);
        cleanup(&orch);
    }

    #[test]
    fn test_win_countdown_posts_win() {
        let mut orch = simul("end-countdown");
        kill(&mut orch, ObjectType::Ant);
        orch.frame_update(0.1, 0.1);
        assert!(orch.take_events().is_empty());
        for _ in 0..5 {
            orch.frame_update(0.1, 0.1);
        }
        let events = orch.take_events();
        assert_eq!(events.iter().filter(|e| e.event_type == EventType::Win).count(), 1);
        cleanup(&orch);
    }

    #[test]
    fn test_pilot_death_is_immediate() {
        let mut orch = simul("end-pilot");
        kill(&mut orch, ObjectType::Human);
        assert_eq!(orch.check_end_mission(true), MissionResult::LostImmediate);
        assert!((orch.lost_delay() - 0.1).abs() < 1e-6);
        assert_eq!(orch.win_delay(), 0.0);
        cleanup(&orch);
    }

    #[test]
    fn test_countdown_waits_for_cutscene() {
        let mut orch = simul("end-cutscene");
        kill(&mut orch, ObjectType::Human);
        orch.check_end_mission(true);
        orch.set_movie_lock(true);
        orch.count_down_end_delays(0.2);
        assert!((orch.lost_delay() - 1.0).abs() < 1e-6);
        assert!(orch.take_events().is_empty());
        cleanup(&orch);
    }

    #[test]
    fn test_defeated_team_broadcast_once() {
        let mut orch = orchestrator_with("end-teams", TEAM_LEVEL);
        orch.change_phase(Phase::Simul);
        let red = orch
            .world
            .registry
            .all()
            .into_iter()
            .find(|e| orch.world.registry.team(*e) == 2)
            .unwrap();
        orch.world.registry.destroy(red);
        orch.world.registry.sweep();

        orch.check_end_mission(true);
        orch.check_end_mission(true);
        let lost = orch
            .world
            .display
            .messages()
            .filter(|m| m.text == "<<< Red lost! >>>")
            .count();
        assert_eq!(lost, 1);
        cleanup(&orch);
    }

    #[test]
    fn test_all_teams_dead_is_lost() {
        let mut orch = orchestrator_with("end-all-dead", TEAM_LEVEL);
        orch.change_phase(Phase::Simul);
        orch.world.registry.destroy_team(1);
        orch.world.registry.destroy_team(2);
        orch.world.registry.sweep();
        assert_eq!(orch.check_end_mission(true), MissionResult::Lost);
        cleanup(&orch);
    }

    #[test]
    fn test_research_gate_holds_win() {
        let level = "\
BeginObject
CreateObject type=Me pos=0;0
EndMissionTake pos=0;0 dist=1000 type=Me min=1
EndMissionResearch type=WINGER
";
        let mut orch = orchestrator_with("end-research", level);
        orch.change_phase(Phase::Simul);
        assert_eq!(orch.check_end_mission(false), MissionResult::NotTerminated);
        orch.mark_research_done(research::FLY, 0);
        assert_eq!(orch.check_end_mission(false), MissionResult::Won);
        cleanup(&orch);
    }

    #[test]
    fn test_mission_timer_stops_on_win() {
        let level = "\
MissionTimer enabled=1
BeginObject
CreateObject type=Me pos=0;0
EndMissionTake pos=0;0 dist=1000 type=Me min=1
";
        let mut orch = orchestrator_with("end-timer", level);
        orch.change_phase(Phase::Simul);
        orch.start_mission_timer();
        assert!(orch.mission_timer().started);
        orch.check_end_mission(false);
        assert!(!orch.mission_timer().started);
        assert!(orch.world.display.messages().any(|m| m.text.starts_with("Time: ")));
        cleanup(&orch);
    }
}
