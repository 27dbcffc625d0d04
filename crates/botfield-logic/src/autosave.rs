//! Autosave slot rotation planning.
//!
//! Autosaves live in directories named `autosave<N>`. Slot 1 is always the
//! most recent save and numbers stay contiguous. Rotation keeps the newest
//! slots, deletes the rest and renumbers the survivors; this module only
//! plans the rotation, the caller applies it to the file system.

use std::collections::BTreeSet;

pub const AUTOSAVE_PREFIX: &str = "autosave";

/// Parse `autosave<N>` into `N`. Anything else, including `N <= 0`, is not
/// an autosave slot.
pub fn parse_slot_name(name: &str) -> Option<i32> {
    let rest = name.strip_prefix(AUTOSAVE_PREFIX)?;
    let id: i32 = rest.parse().ok()?;
    if id > 0 {
        Some(id)
    } else {
        None
    }
}

pub fn slot_name(id: i32) -> String {
    format!("{}{}", AUTOSAVE_PREFIX, id)
}

/// Actions that bring the slot set back to the invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationPlan {
    /// Existing slot ids to delete.
    pub remove: Vec<i32>,
    /// `(from, to)` renames. Targets may collide with sources, so they must
    /// be applied through temporary names.
    pub rename: Vec<(i32, i32)>,
    /// Slot the imminent save should use, when one was reserved.
    pub next_slot: Option<i32>,
    /// Number of slots left after the plan is applied.
    pub kept: usize,
}

/// Plan a rotation of the existing slots.
///
/// With autosave disabled every slot is removed and no slot is reserved.
/// Otherwise the `slots`
/// newest are kept, or `slots - 1` when `free_one` reserves slot 1 for the
/// save about to be written.
pub fn plan_rotation(existing: &[i32], slots: i32, free_one: bool, enabled: bool) -> RotationPlan {
    let ids: BTreeSet<i32> = existing.iter().copied().filter(|id| *id > 0).collect();
    let to_keep = (slots - if free_one { 1 } else { 0 }).max(0);

    let mut remove = Vec::new();
    let mut keep = Vec::new();
    // Lowest number is the most recent save.
    for (count, id) in ids.iter().enumerate() {
        if count as i32 >= to_keep || !enabled {
            remove.push(*id);
        } else {
            keep.push(*id);
        }
    }

    let first = if free_one { 2 } else { 1 };
    let rename = keep
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, first + index as i32))
        .filter(|(from, to)| from != to)
        .collect();

    RotationPlan {
        remove,
        rename,
        next_slot: if free_one && enabled { Some(1) } else { None },
        kept: keep.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(existing: &[i32], plan: &RotationPlan) -> Vec<i32> {
        let mut slots: Vec<i32> = existing
            .iter()
            .copied()
            .filter(|id| !plan.remove.contains(id))
            .collect();
        for s in slots.iter_mut() {
            if let Some((_, to)) = plan.rename.iter().find(|(from, _)| *from == *s) {
                *s = *to;
            }
        }
        slots.sort();
        slots
    }

    #[test]
    fn test_parse_slot_names() {
        assert_eq!(parse_slot_name("autosave3"), Some(3));
        assert_eq!(parse_slot_name("autosave0"), None);
        assert_eq!(parse_slot_name("autosaveX"), None);
        assert_eq!(parse_slot_name("save1"), None);
        assert_eq!(slot_name(12), "autosave12");
    }

    #[test]
    fn test_empty_uses_slot_one() {
        let plan = plan_rotation(&[], 3, true, true);
        assert_eq!(plan.next_slot, Some(1));
        assert!(plan.remove.is_empty());
        assert!(plan.rename.is_empty());
    }

    #[test]
    fn test_rotation_keeps_newest_and_shifts() {
        let existing = [1, 2, 3, 5];
        let plan = plan_rotation(&existing, 3, true, true);
        assert_eq!(plan.remove, vec![3, 5]);
        assert_eq!(plan.rename, vec![(1, 2), (2, 3)]);
        assert_eq!(apply(&existing, &plan), vec![2, 3]);
        assert_eq!(plan.next_slot, Some(1));
    }

    #[test]
    fn test_compaction_without_reservation() {
        let existing = [2, 5, 9];
        let plan = plan_rotation(&existing, 2, false, true);
        assert_eq!(plan.remove, vec![9]);
        assert_eq!(apply(&existing, &plan), vec![1, 2]);
        assert_eq!(plan.next_slot, None);
    }

    #[test]
    fn test_disabled_removes_everything() {
        let plan = plan_rotation(&[1, 2], 3, false, false);
        assert_eq!(plan.remove.len(), 2);
        assert_eq!(plan.kept, 0);
    }

    #[test]
    fn test_disabled_reserves_no_slot() {
        let plan = plan_rotation(&[1, 2, 3], 3, true, false);
        assert_eq!(plan.remove, vec![1, 2, 3]);
        assert!(plan.rename.is_empty());
        assert_eq!(plan.next_slot, None);
    }

    #[test]
    fn test_rotation_bound_holds() {
        for slots in 1..6 {
            let mut existing: Vec<i32> = Vec::new();
            for _ in 0..10 {
                let plan = plan_rotation(&existing, slots, true, true);
                existing = apply(&existing, &plan);
                existing.push(plan.next_slot.unwrap_or(1));
                existing.sort();
                assert!(existing.len() as i32 <= slots);
                let expected: Vec<i32> = (1..=existing.len() as i32).collect();
                assert_eq!(existing, expected);
            }
        }
    }
}
