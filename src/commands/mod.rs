//! CLI commands

pub mod install;
pub mod list;
pub mod utils;
pub mod verify;
