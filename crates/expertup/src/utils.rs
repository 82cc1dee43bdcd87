//! Paths shared across CLI commands

use anyhow::Result;
use camino::Utf8PathBuf;
use expertup_core::get_home_dir;
use std::path::PathBuf;

/// Get the expertup directory (~/.expertup)
pub fn get_expertup_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".expertup"))
}

/// Directory holding the server binary, defaulting to ~/.expertup/server
pub fn install_dir(explicit: Option<Utf8PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.into_std_path_buf()),
        None => Ok(get_expertup_dir()?.join("server")),
    }
}

/// State file holding the install manifest (~/.expertup/state.json)
pub fn state_path() -> Result<PathBuf> {
    Ok(get_expertup_dir()?.join("state.json"))
}
