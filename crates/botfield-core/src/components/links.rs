//! Carry relationships between objects and the deferred-removal marker.

use hecs::Entity;

/// Carrier -> carried cargo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cargo(pub Entity);

/// Powered object -> its power cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSlot(pub Entity);

/// Carried object -> the object carrying it. While present the object is
/// excluded from independent simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transporter(pub Entity);

/// Destroyed but not yet swept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tombstone;
