//! Core repository components
//!
//! - `database`: loose object store for blobs, trees and commits
//! - `index`: the staging area file
//! - `refs`: HEAD and branch references
//! - `repository`: the session tying the areas together
//! - `workspace`: working directory access

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
