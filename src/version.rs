//! QTI schema versions and profiles
//!
//! A [`SchemaVersion`] gates which class names exist, which attributes are
//! written or read, and which content models apply. Versions form a total
//! order over (major, minor, patch); a two-component string such as `"2.2"`
//! is read as `2.2.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::namespaces;

/// A QTI 2.x schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    major: u8,
    minor: u8,
    patch: u8,
}

impl SchemaVersion {
    /// QTI 2.0
    pub const V2_0_0: SchemaVersion = SchemaVersion::new_unchecked(2, 0, 0);
    /// QTI 2.1
    pub const V2_1_0: SchemaVersion = SchemaVersion::new_unchecked(2, 1, 0);
    /// QTI 2.1.1
    pub const V2_1_1: SchemaVersion = SchemaVersion::new_unchecked(2, 1, 1);
    /// QTI 2.2
    pub const V2_2_0: SchemaVersion = SchemaVersion::new_unchecked(2, 2, 0);
    /// QTI 2.2.1
    pub const V2_2_1: SchemaVersion = SchemaVersion::new_unchecked(2, 2, 1);
    /// QTI 2.2.2
    pub const V2_2_2: SchemaVersion = SchemaVersion::new_unchecked(2, 2, 2);

    /// All versions this crate can bind to, oldest first
    pub const KNOWN: [SchemaVersion; 6] = [
        Self::V2_0_0,
        Self::V2_1_0,
        Self::V2_1_1,
        Self::V2_2_0,
        Self::V2_2_1,
        Self::V2_2_2,
    ];

    /// The most recent supported version
    pub const LATEST: SchemaVersion = Self::V2_2_2;

    const fn new_unchecked(major: u8, minor: u8, patch: u8) -> Self {
        Self { major, minor, patch }
    }

    /// Create a version, rejecting versions this crate does not know
    pub fn new(major: u8, minor: u8, patch: u8) -> Result<Self> {
        let version = Self::new_unchecked(major, minor, patch);
        if Self::KNOWN.contains(&version) {
            Ok(version)
        } else {
            Err(Error::Version(format!(
                "QTI version '{}' is not supported.",
                version
            )))
        }
    }

    /// Parse `"major.minor"` or `"major.minor.patch"`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::Version(format!("'{}' is not a valid QTI version string.", s));

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }

        let mut numbers = [0u8; 3];
        for (i, part) in parts.iter().enumerate() {
            numbers[i] = part.parse().map_err(|_| invalid())?;
        }

        Self::new(numbers[0], numbers[1], numbers[2])
    }

    /// Major component
    pub fn major(&self) -> u8 {
        self.major
    }

    /// Minor component
    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// Patch component
    pub fn patch(&self) -> u8 {
        self.patch
    }

    /// Whether this version is `other` or later
    pub fn is_at_least(&self, other: SchemaVersion) -> bool {
        *self >= other
    }

    /// QTI namespace URI for this version
    pub fn namespace(&self) -> &'static str {
        match (self.major, self.minor) {
            (2, 0) => namespaces::QTI_V2P0_NAMESPACE,
            (2, 1) => namespaces::QTI_V2P1_NAMESPACE,
            _ => namespaces::QTI_V2P2_NAMESPACE,
        }
    }

    /// XSD location for this version, used in `xsi:schemaLocation`
    pub fn schema_location(&self) -> &'static str {
        match (self.major, self.minor, self.patch) {
            (2, 0, _) => "http://www.imsglobal.org/xsd/imsqti_v2p0.xsd",
            (2, 1, 0) => "http://www.imsglobal.org/xsd/qti/qtiv2p1/imsqti_v2p1.xsd",
            (2, 1, _) => "http://www.imsglobal.org/xsd/qti/qtiv2p1/imsqti_v2p1p1.xsd",
            (2, 2, 0) => "http://www.imsglobal.org/xsd/qti/qtiv2p2/imsqti_v2p2.xsd",
            (2, 2, 1) => "http://www.imsglobal.org/xsd/qti/qtiv2p2/imsqti_v2p2p1.xsd",
            _ => "http://www.imsglobal.org/xsd/qti/qtiv2p2/imsqti_v2p2p2.xsd",
        }
    }

    /// Infer a version from a root namespace and optional schema location
    ///
    /// The namespace decides the minor version; the schema location, when
    /// present, refines the patch level.
    pub fn infer(namespace: &str, schema_location: Option<&str>) -> Result<Self> {
        let candidates: Vec<SchemaVersion> = Self::KNOWN
            .iter()
            .copied()
            .filter(|v| v.namespace() == namespace)
            .collect();

        let first = candidates.first().copied().ok_or_else(|| {
            Error::Version(format!(
                "Cannot infer a QTI version from namespace '{}'.",
                namespace
            ))
        })?;

        if let Some(location) = schema_location {
            if let Some(v) = candidates
                .iter()
                .rev()
                .find(|v| location.contains(v.schema_location()))
            {
                return Ok(*v);
            }
        }

        Ok(first)
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::V2_1_0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.to_string()
    }
}

/// Named variant of the schema binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Plain QTI
    #[default]
    Standard,
    /// Compact profile: item and rubric block references carry inlined content
    Compact,
}

impl Profile {
    /// Parse from string value
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(Profile::Standard),
            "compact" => Ok(Profile::Compact),
            _ => Err(Error::Config(format!(
                "Invalid profile: '{}'. Must be 'standard' or 'compact'",
                s
            ))),
        }
    }

    /// Get the profile as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Standard => "standard",
            Profile::Compact => "compact",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form_equals_patch_zero() {
        assert_eq!(SchemaVersion::parse("2.2").unwrap(), SchemaVersion::V2_2_0);
        assert_eq!(SchemaVersion::parse("2.2.0").unwrap(), SchemaVersion::V2_2_0);
        assert_eq!(SchemaVersion::parse("2.1").unwrap(), SchemaVersion::parse("2.1.0").unwrap());
    }

    #[test]
    fn test_ordering() {
        assert!(SchemaVersion::V2_0_0 < SchemaVersion::V2_1_0);
        assert!(SchemaVersion::V2_1_1 < SchemaVersion::V2_2_0);
        assert!(SchemaVersion::V2_2_2.is_at_least(SchemaVersion::V2_2_0));
        assert!(!SchemaVersion::V2_1_1.is_at_least(SchemaVersion::V2_2_0));
    }

    #[test]
    fn test_unknown_versions_rejected() {
        assert!(SchemaVersion::parse("3.0.0").is_err());
        assert!(SchemaVersion::parse("2.3").is_err());
        assert!(SchemaVersion::parse("2").is_err());
        assert!(SchemaVersion::parse("two.one").is_err());
        assert!(SchemaVersion::parse("2.1.0.0").is_err());
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(
            SchemaVersion::V2_1_1.namespace(),
            "http://www.imsglobal.org/xsd/imsqti_v2p1"
        );
        assert_eq!(
            SchemaVersion::V2_2_2.namespace(),
            "http://www.imsglobal.org/xsd/imsqti_v2p2"
        );
    }

    #[test]
    fn test_infer() {
        let ns = "http://www.imsglobal.org/xsd/imsqti_v2p1";
        assert_eq!(SchemaVersion::infer(ns, None).unwrap(), SchemaVersion::V2_1_0);

        let location = format!("{} {}", ns, SchemaVersion::V2_1_1.schema_location());
        assert_eq!(
            SchemaVersion::infer(ns, Some(&location)).unwrap(),
            SchemaVersion::V2_1_1
        );

        assert!(SchemaVersion::infer("urn:other", None).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&SchemaVersion::V2_2_1).unwrap();
        assert_eq!(json, "\"2.2.1\"");
        let back: SchemaVersion = serde_json::from_str("\"2.1\"").unwrap();
        assert_eq!(back, SchemaVersion::V2_1_0);
        assert!(serde_json::from_str::<SchemaVersion>("\"9.9\"").is_err());
    }

    #[test]
    fn test_profile() {
        assert_eq!(Profile::from_str("compact").unwrap(), Profile::Compact);
        assert!(Profile::from_str("other").is_err());
        assert_eq!(Profile::default(), Profile::Standard);
    }
}
