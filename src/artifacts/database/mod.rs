//! Database entry types
//!
//! Entries represent references to objects with their mode, as read back
//! from tree objects.

pub mod database_entry;
