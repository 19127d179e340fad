//! Limits and constraints for QTI document processing
//!
//! These limits bound the resources a single document load may consume and
//! protect against oversized or pathologically nested input.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_xml_depth: usize,

    /// Maximum XML document size in bytes
    pub max_xml_size: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            max_xml_size: 100 * 1024 * 1024, // 100 MB
            max_attributes: 1000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 100,
            max_xml_size: 10 * 1024 * 1024, // 10 MB
            max_attributes: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_xml_depth: 10000,
            max_xml_size: 1024 * 1024 * 1024, // 1 GB
            max_attributes: 10000,
        }
    }

    /// Check an element nesting depth
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        within("Element depth", depth, self.max_xml_depth, "")
    }

    /// Check a document size in bytes
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        within("Document size", size, self.max_xml_size, " bytes")
    }

    /// Check the attribute count of one element
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        within("Attribute count", count, self.max_attributes, "")
    }
}

fn within(what: &str, value: usize, max: usize, unit: &str) -> Result<()> {
    if value > max {
        return Err(Error::LimitExceeded(format!(
            "{} {}{} exceeds the maximum of {}{}",
            what, value, unit, max, unit
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_xml_depth, 1000);
        assert!(limits.check_xml_depth(500).is_ok());
        assert!(limits.check_xml_depth(1500).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_xml_depth < Limits::default().max_xml_depth);
        assert!(limits.check_xml_depth(150).is_err());
        assert!(limits.check_attributes(101).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.max_xml_depth > Limits::default().max_xml_depth);
        assert!(limits.check_xml_depth(5000).is_ok());
    }

    #[test]
    fn test_check_xml_size() {
        let limits = Limits::default();
        assert!(limits.check_xml_size(1024).is_ok());
        assert!(limits.check_xml_size(200 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let limits: Limits = serde_json::from_str(r#"{"max_xml_depth": 12}"#).unwrap();
        assert_eq!(limits.max_xml_depth, 12);
        assert_eq!(limits.max_attributes, Limits::default().max_attributes);
    }
}
