//! Shared primitive types used across the whole crate.

/// A stable, unique identifier for any entity (client, strategy, report…).
pub type EntityId = String;
