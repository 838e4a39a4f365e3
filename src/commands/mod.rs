//! Subcommand entry points.

pub mod list;
pub mod run;
