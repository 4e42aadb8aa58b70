//! Diffing: from trees down to hunks
//!
//! - `myers`: Myers' shortest edit script over lines
//! - `hunk`: unified diff hunks, their rendering, parsing and application
//! - `tree_diff`: recursive tree comparison down to changed blobs
//! - `diff_target`: one side of a file comparison (tree, index or workspace)
//! - `delta_builder`: file status, binary detection and hunks for a pair of targets
//! - `delta`: the immutable results handed to callers
//! - `cache`: memoized commit diffs

pub mod cache;
pub mod delta;
pub mod delta_builder;
pub mod diff_target;
pub mod hunk;
pub mod myers;
pub mod tree_diff;
