//! Diff and hunk staging over git repositories
//!
//! A [`Repository`](areas::repository::Repository) session reads loose objects,
//! the DIRC index and the workspace, and answers diff, status and blame
//! queries. Hunks can be staged or unstaged one at a time; commit diffs are
//! memoized for the lifetime of the session.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
