//! Release version parsing and ordering
//!
//! Tags are parsed with `semver` grammar but ordered by the release channel's
//! own precedence rules, including the 0.1.0 release-candidate graduation window.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// One dot-separated component of a prerelease
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u64),
    Alpha(String),
}

impl Identifier {
    fn from_part(part: &str) -> Self {
        if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = part.parse() {
                return Identifier::Numeric(n);
            }
        }
        Identifier::Alpha(part.to_string())
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Alpha(a), Identifier::Alpha(b)) => a.cmp(b),
            (Identifier::Numeric(_), Identifier::Alpha(_)) => Ordering::Less,
            (Identifier::Alpha(_), Identifier::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::Alpha(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Identifier {
    fn from(n: u64) -> Self {
        Identifier::Numeric(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Alpha(s.to_string())
    }
}

/// Parsed release tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<Identifier>,
}

impl ReleaseVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: Vec::new(),
        }
    }

    /// Parse a tag such as `v0.2.3` or `0.1.0-rc.1`
    ///
    /// Returns `None` for anything that is not `MAJOR.MINOR.PATCH[-prerelease]`,
    /// including moving tags like `nightly` and tags with build metadata.
    pub fn parse(tag: &str) -> Option<Self> {
        let raw = tag.trim();
        let raw = raw.strip_prefix('v').unwrap_or(raw);

        let parsed = Version::parse(raw).ok()?;
        if !parsed.build.is_empty() {
            return None;
        }

        let prerelease = if parsed.pre.is_empty() {
            Vec::new()
        } else {
            parsed
                .pre
                .as_str()
                .split('.')
                .map(Identifier::from_part)
                .collect()
        };

        Some(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    fn is_graduation_rc(&self) -> bool {
        (self.major, self.minor, self.patch) == (0, 1, 0)
            && matches!(self.prerelease.first(), Some(Identifier::Alpha(id)) if id == "rc")
    }

    /// Stable releases, plus release candidates of exactly 0.1.0
    pub fn is_stable_or_eligible_rc(&self) -> bool {
        !self.is_prerelease() || self.is_graduation_rc()
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| {
                match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    // Lexicographic over identifiers; a strict prefix sorts first
                    (false, false) => self.prerelease.cmp(&other.prerelease),
                }
            })
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.is_prerelease() {
            let parts: Vec<String> = self.prerelease.iter().map(|p| p.to_string()).collect();
            write!(f, "-{}", parts.join("."))?;
        }
        Ok(())
    }
}

/// Order versions greatest first
///
/// `Ordering::Less` means `a` is the greater version and sorts ahead of `b`.
pub fn compare_descending(a: &ReleaseVersion, b: &ReleaseVersion) -> Ordering {
    b.cmp(a)
}

/// Whether an installed 0.1.0 release candidate must be replaced by `new_tag`
///
/// Tag equality alone never flags this upgrade, so the graduation to the first
/// stable release is forced here. Unparseable tags never force an upgrade.
pub fn should_force_upgrade(current_tag: &str, new_tag: &str) -> bool {
    let (Some(current), Some(new)) = (
        ReleaseVersion::parse(current_tag),
        ReleaseVersion::parse(new_tag),
    ) else {
        return false;
    };

    current.is_graduation_rc() && !new.is_prerelease() && new >= ReleaseVersion::new(0, 1, 0)
}
