//! Pure mission rules for Botfield.
//!
//! This crate holds every rule of the mission runtime that can be expressed
//! without a world, an engine or a file system. Functions take plain data and
//! return plain results, so the orchestrator in `botfield-core`, the headless
//! harness and the unit tests all share one definition of the rules.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`autosave`] | Autosave slot rotation planning (keep, delete, renumber) |
//! | [`camera`] | Camera types and the per-object camera toggle cycle |
//! | [`console`] | Command console mini-language parser |
//! | [`constants`] | Research/build bitmasks and runtime timing constants |
//! | [`end_mission`] | Mission result values and end-condition group evaluation |
//! | [`gadget`] | Decorative object density throttle |
//! | [`mission`] | Level categories, mission types, timer formatting |
//! | [`object_type`] | Object type catalogue, names and capability tags |
//! | [`phase`] | Application phases and world/config predicates |
//! | [`selection_history`] | Bounded LIFO of previously selected objects |
//! | [`show_limit`] | Boundary-ring geometry for show-limit effects |

pub mod autosave;
pub mod camera;
pub mod console;
pub mod constants;
pub mod end_mission;
pub mod gadget;
pub mod mission;
pub mod object_type;
pub mod phase;
pub mod selection_history;
pub mod show_limit;
