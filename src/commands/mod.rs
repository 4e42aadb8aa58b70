//! Repository operations
//!
//! Every command is an inherent method on
//! [`Repository`](crate::areas::repository::Repository), split into one file
//! per command. Printing variants write to the session's writer.

pub mod porcelain;
