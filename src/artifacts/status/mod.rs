//! Per-path status
//!
//! - `file_status`: the (index, workspace) pair reported for a path
//! - `inspector`: the two comparisons, HEAD against index and index against workspace

pub mod file_status;
pub mod inspector;
