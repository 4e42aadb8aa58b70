//! User-facing operations
//!
//! - `init`: create the repository skeleton
//! - `add`: stage whole files
//! - `commit`: record the index on top of HEAD
//! - `status`: per-file index and workspace status
//! - `diff`: commit, staged and unstaged diffs, and the patch printer
//! - `show`: revision resolution and commit patches
//! - `stage`: hunk-level staging and unstaging
//! - `blame`: line attribution

pub mod add;
pub mod blame;
pub mod commit;
pub mod diff;
pub mod init;
pub mod show;
pub mod stage;
pub mod status;
