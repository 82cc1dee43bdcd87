//! Type definitions for expertup configuration

mod runtime_config;

pub use runtime_config::*;
