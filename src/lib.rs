//! wda-install library
//!
//! Unpacks the bundled WebDriverAgent archive over the package root and
//! marks its module generation script as executable.

pub mod config;
pub mod error;
pub mod installer;

pub use config::InstallLayout;
pub use error::{InstallError, Result};
