//! Mission result values and end-condition group evaluation.
//!
//! The orchestrator counts objects for each end condition; this module turns
//! those per-condition results into one result for a group (a team, or the
//! global team 0) and applies the research gate.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating end conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionResult {
    /// All conditions satisfied; mission won.
    Won,
    /// Not resolved yet. This is a normal state, not an error.
    NotTerminated,
    /// Mission lost, shown with the usual delay.
    Lost,
    /// Mission lost immediately (the pilot died).
    LostImmediate,
}

impl MissionResult {
    pub fn is_lost(&self) -> bool {
        matches!(self, Self::Lost | Self::LostImmediate)
    }
}

/// One evaluated end condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionOutcome {
    pub result: MissionResult,
    /// The condition has no loss threshold (`lost < 0`), so it is a winning
    /// condition.
    pub is_winning: bool,
    pub immediate: bool,
}

/// Combine the outcomes of one group in declaration order.
///
/// The first non-`Won` result decides, and an immediate win short-circuits.
/// A group without any winning condition never ends by itself.
pub fn evaluate_group(outcomes: &[ConditionOutcome]) -> MissionResult {
    let mut result = MissionResult::Won;
    let mut has_winning = false;

    for outcome in outcomes {
        if outcome.is_winning {
            has_winning = true;
        }
        if outcome.result == MissionResult::Won && outcome.immediate {
            has_winning = true;
            result = MissionResult::Won;
            break;
        }
        if outcome.result != MissionResult::Won {
            result = outcome.result;
            break;
        }
    }

    if result == MissionResult::Won && !has_winning {
        return MissionResult::NotTerminated;
    }
    result
}

/// Apply the research requirement of a mission to a resolved result.
///
/// Only a non-lost result can be held back; a lost result passes through
/// even when the research is incomplete.
pub fn apply_research_gate(result: MissionResult, required: u32, done: u32) -> MissionResult {
    if result.is_lost() || required == 0 {
        return result;
    }
    if required != (required & done) {
        return MissionResult::NotTerminated;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(result: MissionResult, is_winning: bool, immediate: bool) -> ConditionOutcome {
        ConditionOutcome {
            result,
            is_winning,
            immediate,
        }
    }

    #[test]
    fn test_empty_group_is_pending() {
        assert_eq!(evaluate_group(&[]), MissionResult::NotTerminated);
    }

    #[test]
    fn test_all_satisfied_wins() {
        let group = [
            outcome(MissionResult::Won, true, false),
            outcome(MissionResult::Won, true, false),
        ];
        assert_eq!(evaluate_group(&group), MissionResult::Won);
    }

    #[test]
    fn test_only_loss_conditions_never_win() {
        let group = [outcome(MissionResult::Won, false, false)];
        assert_eq!(evaluate_group(&group), MissionResult::NotTerminated);
    }

    #[test]
    fn test_first_unresolved_decides() {
        let group = [
            outcome(MissionResult::NotTerminated, true, false),
            outcome(MissionResult::Lost, false, false),
        ];
        assert_eq!(evaluate_group(&group), MissionResult::NotTerminated);

        let group = [
            outcome(MissionResult::Lost, false, false),
            outcome(MissionResult::NotTerminated, true, false),
        ];
        assert_eq!(evaluate_group(&group), MissionResult::Lost);
    }

    #[test]
    fn test_immediate_win_short_circuits() {
        let group = [
            outcome(MissionResult::Won, false, true),
            outcome(MissionResult::NotTerminated, true, false),
        ];
        assert_eq!(evaluate_group(&group), MissionResult::Won);
    }

    #[test]
    fn test_research_gate_skips_losses() {
        assert_eq!(
            apply_research_gate(MissionResult::Won, 0b11, 0b01),
            MissionResult::NotTerminated
        );
        assert_eq!(
            apply_research_gate(MissionResult::Won, 0b11, 0b111),
            MissionResult::Won
        );
        assert_eq!(
            apply_research_gate(MissionResult::Lost, 0b11, 0),
            MissionResult::Lost
        );
    }
}
