//! Shared types and configuration for the Stagehand installer.

pub mod config;
pub mod license;
pub mod model;
pub mod util;

pub use config::*;
pub use license::*;
pub use model::*;
pub use util::program_in_path;
