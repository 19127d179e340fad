//! Factory and loading configuration
//!
//! A [`FactoryConfig`] names the QTI version, the profile and the resource
//! limits a document is processed with. It is usually built in code, but
//! can also be read from a JSON file:
//!
//! ```json
//! { "version": "2.2", "profile": "compact", "limits": { "max_xml_depth": 200 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::version::{Profile, SchemaVersion};

/// Version, profile and limits of a factory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    /// QTI version
    pub version: SchemaVersion,
    /// Profile
    pub profile: Profile,
    /// Limits applied when loading documents
    pub limits: Limits,
}

impl FactoryConfig {
    /// Standard profile configuration for a version
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Set the profile
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Check the limits are usable
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_xml_depth == 0 || self.limits.max_xml_size == 0 {
            return Err(Error::Config(
                "max_xml_depth and max_xml_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FactoryConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read configuration '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
