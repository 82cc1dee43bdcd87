//! SHA-256 checksum index and local file digests
//!
//! Nightly builds are republished under the same tag, so the companion
//! `expert_checksums.txt` asset is the only way to tell whether the installed
//! binary is still current.

use crate::error::{Result, UpdateError};
use crate::releases::{Release, ReleaseAsset};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read buffer for hashing (1MB)
const DIGEST_CHUNK_SIZE: usize = 1024 * 1024;

/// Suffix identifying the checksums asset of a release
pub const CHECKSUMS_SUFFIX: &str = "checksums.txt";

/// Asset name to hex digest, parsed from `sha256sum` style output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumIndex {
    entries: HashMap<String, String>,
}

impl ChecksumIndex {
    /// Parse `<hex-digest> <filename>` lines
    ///
    /// Malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let digest = parts.next()?;
                let name = parts.next()?;
                let name = name.strip_prefix("./").unwrap_or(name);
                Some((name.to_string(), digest.to_string()))
            })
            .collect();

        Self { entries }
    }

    /// Digest recorded for an asset
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Whether `digest` equals the recorded entry for `name`
    pub fn matches(&self, name: &str, digest: &str) -> bool {
        self.get(name)
            .is_some_and(|expected| expected.eq_ignore_ascii_case(digest))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Calculate the SHA-256 digest of a file as lowercase hex
pub fn digest_of(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| UpdateError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; DIGEST_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| UpdateError::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Calculate the SHA-256 digest of in-memory content as lowercase hex
pub fn digest_bytes(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// The checksums asset of a release, if it has one
pub fn find_checksums_asset(release: &Release) -> Option<&ReleaseAsset> {
    release
        .assets
        .iter()
        .find(|a| a.name.ends_with(CHECKSUMS_SUFFIX))
}
