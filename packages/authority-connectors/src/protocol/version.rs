//! Protocol version negotiation.
//!
//! Services advertise versions in inconsistent formats (`"0.2"`,
//! `"0.2-alpha"`, `"v0.1.0"`). Each one is normalized to a three-component
//! semantic version and the newest one below the client ceiling wins.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{ConnectorError, Result};

/// Version assumed when the manifest advertises none.
pub const DEFAULT_VERSION: &str = "0.1.0";

/// Newest protocol revision this client speaks (JSON query bodies).
pub const NEWEST_VERSION: &str = "0.3.0";

/// Exclusive upper bound on negotiated versions. Pre-releases of it still qualify.
pub const VERSION_CEILING: ProtocolVersion = ProtocolVersion {
    major: 0,
    minor: 3,
    patch: 1,
    pre: Vec::new(),
};

/// A parsed `major.minor.patch[-pre]` version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Vec<String>,
}

impl ProtocolVersion {
    /// Loose parse: accepts a leading `v`/`=`, one or two component cores
    /// (zero-padded), and ignores build metadata.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim().trim_start_matches(['v', '=']);
        let without_build = trimmed.split('+').next().unwrap_or_default();

        let (core, pre) = match without_build.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (without_build, None),
        };

        let mut parts = Vec::with_capacity(3);
        for part in core.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parts.push(part.parse::<u64>().ok()?);
        }
        if parts.len() > 3 {
            return None;
        }
        parts.resize(3, 0);

        let pre = match pre {
            Some(pre) => {
                let identifiers: Vec<String> = pre.split('.').map(str::to_string).collect();
                let valid = identifiers.iter().all(|id| {
                    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
                });
                if !valid {
                    return None;
                }
                identifiers
            }
            None => Vec::new(),
        };

        Some(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            pre,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.is_prerelease() {
            write!(f, "-{}", self.pre.join("."))?;
        }
        Ok(())
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_prerelease(&self.pre, &other.pre),
            })
    }
}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_prerelease(a: &[String], b: &[String]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.len().cmp(&b.len())
}

/// Normalize a version string to strict `major.minor.patch[-pre]` form.
pub fn normalize_version(input: &str) -> Option<String> {
    ProtocolVersion::parse(input).map(|v| v.to_string())
}

/// Pick the newest advertised version below [`VERSION_CEILING`].
///
/// No advertised versions means the service predates version negotiation
/// and speaks [`DEFAULT_VERSION`]. Unparseable entries are skipped.
pub fn negotiate(advertised: &[String]) -> Result<String> {
    if advertised.is_empty() {
        return Ok(DEFAULT_VERSION.to_string());
    }

    advertised
        .iter()
        .filter_map(|v| ProtocolVersion::parse(v))
        .filter(|v| *v < VERSION_CEILING)
        .max()
        .map(|v| v.to_string())
        .ok_or_else(|| ConnectorError::NoCompatibleVersion {
            advertised: advertised.to_vec(),
        })
}
