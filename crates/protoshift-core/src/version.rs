//! Protocol versions.
//!
//! A protocol version is a plain `major.minor.patch` triple. Ordering is
//! lexicographic over the triple, which is exactly semver precedence once
//! pre-release and build metadata are ruled out at parse time.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An immutable `major.minor.patch` protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProtocolVersion(semver::Version);

impl ProtocolVersion {
    /// Version assumed for connectors that do not advertise one.
    pub const DEFAULT: ProtocolVersion = ProtocolVersion::new(0, 2, 0);

    /// Creates a version from its three components.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parses the canonical `major.minor.patch` form.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidVersion` for anything that is not a
    /// plain triple, including pre-release (`1.0.0-rc.1`) and build
    /// metadata (`1.0.0+abc`) suffixes.
    pub fn parse(input: &str) -> Result<Self> {
        let version = semver::Version::parse(input.trim())
            .map_err(|e| ProtocolError::invalid_version(input, e.to_string()))?;

        if !version.pre.is_empty() {
            return Err(ProtocolError::invalid_version(
                input,
                "pre-release versions are not protocol versions",
            ));
        }
        if !version.build.is_empty() {
            return Err(ProtocolError::invalid_version(
                input,
                "build metadata is not allowed in protocol versions",
            ));
        }

        Ok(Self(version))
    }

    /// Parses `input` when present, falling back to [`ProtocolVersion::DEFAULT`].
    pub fn with_default(input: Option<&str>) -> Result<Self> {
        match input {
            Some(raw) => Self::parse(raw),
            None => Ok(Self::DEFAULT),
        }
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Returns the canonical string form (same as `to_string()`).
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0.major, self.0.minor, self.0.patch)
    }
}

impl FromStr for ProtocolVersion {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProtocolVersion {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ProtocolVersion> for String {
    fn from(version: ProtocolVersion) -> Self {
        version.to_string()
    }
}

/// An inclusive range of protocol versions a platform component accepts.
///
/// Support is decided on major versions only: a platform that accepts
/// `[0.0.0, 1.0.0]` accepts every `0.x.y` and `1.x.y` connector, since minor
/// and patch releases are bridged by the migration registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersionRange {
    pub min: ProtocolVersion,
    pub max: ProtocolVersion,
}

impl ProtocolVersionRange {
    pub fn new(min: ProtocolVersion, max: ProtocolVersion) -> Self {
        Self { min, max }
    }

    /// Returns true when `version`'s major falls within the range's majors.
    pub fn is_supported(&self, version: &ProtocolVersion) -> bool {
        self.min.major() <= version.major() && version.major() <= self.max.major()
    }
}

impl fmt::Display for ProtocolVersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
