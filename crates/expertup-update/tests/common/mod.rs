//! Common test infrastructure for expertup-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Asset names, tags, API paths, binary contents
//! - `builders`: Fluent builders for Release and ReleaseAsset
//! - `mock_server`: Wiremock setup helpers for the GitHub API
//! - `harness`: Recording notifier and installer wiring

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod harness;
pub mod mock_server;

pub use builders::*;
pub use constants::*;
pub use harness::*;
pub use mock_server::*;
