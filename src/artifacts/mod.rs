//! Data structures and algorithms
//!
//! - `blame`: first-parent line attribution
//! - `branch`: revision expressions
//! - `classify`: text/binary classification
//! - `database`: tree entry types
//! - `diff`: Myers diff, hunks, deltas and the commit diff cache
//! - `index`: on-disk index entry layout
//! - `objects`: blobs, trees and commits
//! - `patch`: hunk staging decisions
//! - `status`: per-file status inspection

pub mod blame;
pub mod branch;
pub mod classify;
pub mod database;
pub mod diff;
pub mod index;
pub mod objects;
pub mod patch;
pub mod status;
