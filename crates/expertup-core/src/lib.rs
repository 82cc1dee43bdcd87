//! # expertup-core
//!
//! Core library for expertup providing:
//! - Runtime configuration types (network, GitHub source, update channel)
//! - Hierarchical configuration loading (embedded defaults, user file, environment)
//! - Shared error type

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::{Channel, RuntimeConfig};
pub use utils::get_home_dir;
