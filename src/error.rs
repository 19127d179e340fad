//! Error types for qtibind
//!
//! This module defines all error types used throughout the library.
//! Marshalling and unmarshalling failures carry user-facing messages that
//! name the offending element and attribute, so they can be surfaced to
//! content authors as-is.

use std::fmt;
use thiserror::Error;

use crate::version::{Profile, SchemaVersion};

/// Result type alias using qtibind Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qtibind operations
#[derive(Error, Debug)]
pub enum Error {
    /// No marshaller is registered for a QTI class name in the bound version/profile
    #[error("{0}")]
    MarshallerNotFound(#[from] MarshallerNotFoundError),

    /// Component to XML conversion failed
    #[error("marshalling error: {0}")]
    Marshalling(#[from] MarshallingError),

    /// XML to component conversion failed
    #[error("unmarshalling error: {0}")]
    Unmarshalling(#[from] UnmarshallingError),

    /// A marshaller was requested for something that is neither an element,
    /// a text node nor a component
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown or unsupported QTI version
    #[error("version error: {0}")]
    Version(String),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an unmarshalling error with a message
    pub fn unmarshalling(message: impl Into<String>) -> Self {
        Error::Unmarshalling(UnmarshallingError::new(message))
    }

    /// Shorthand for a marshalling error with a message
    pub fn marshalling(message: impl Into<String>) -> Self {
        Error::Marshalling(MarshallingError::new(message))
    }

    /// Returns the user-facing message of a marshalling or unmarshalling error
    pub fn message(&self) -> String {
        match self {
            Error::Marshalling(e) => e.message.clone(),
            Error::Unmarshalling(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

/// Lookup failure: no marshaller for a QTI class name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshallerNotFoundError {
    /// The QTI class name that was looked up
    pub qti_class_name: String,
    /// Version the factory is bound to
    pub version: SchemaVersion,
    /// Profile the factory is bound to
    pub profile: Profile,
}

impl MarshallerNotFoundError {
    /// Create a new lookup error
    pub fn new(qti_class_name: impl Into<String>, version: SchemaVersion, profile: Profile) -> Self {
        Self {
            qti_class_name: qti_class_name.into(),
            version,
            profile,
        }
    }
}

impl fmt::Display for MarshallerNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No marshaller implementation found for QTI class name '{}' in QTI {}",
            self.qti_class_name, self.version
        )?;
        if self.profile != Profile::Standard {
            write!(f, " ({} profile)", self.profile)?;
        }
        write!(f, ".")
    }
}

impl std::error::Error for MarshallerNotFoundError {}

/// Component to XML failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshallingError {
    /// Error message
    pub message: String,
    /// QTI class name of the component being marshalled
    pub component: Option<String>,
}

impl MarshallingError {
    /// Create a new marshalling error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            component: None,
        }
    }

    /// Set the component class name
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for MarshallingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MarshallingError {}

/// XML to component failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmarshallingError {
    /// Error message
    pub message: String,
    /// Local name of the element being unmarshalled
    pub element: Option<String>,
}

impl UnmarshallingError {
    /// Create a new unmarshalling error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            element: None,
        }
    }

    /// Set the element name
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

impl fmt::Display for UnmarshallingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UnmarshallingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = MarshallerNotFoundError::new("figure", SchemaVersion::V2_1_0, Profile::Standard);
        assert_eq!(
            err.to_string(),
            "No marshaller implementation found for QTI class name 'figure' in QTI 2.1.0."
        );

        let err = MarshallerNotFoundError::new("rubricBlockRef", SchemaVersion::V2_2_0, Profile::Compact);
        assert!(err.to_string().ends_with("(compact profile)."));
    }

    #[test]
    fn test_unmarshalling_error_keeps_message() {
        let err = UnmarshallingError::new("The mandatory 'identifier' attribute is missing from the 'weight' element.")
            .with_element("weight");
        assert_eq!(err.element.as_deref(), Some("weight"));

        let err: Error = err.into();
        assert!(matches!(err, Error::Unmarshalling(_)));
        assert_eq!(
            err.message(),
            "The mandatory 'identifier' attribute is missing from the 'weight' element."
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = MarshallingError::new("test").with_component("anyN").into();
        assert!(matches!(err, Error::Marshalling(_)));
        assert_eq!(err.to_string(), "marshalling error: test");
    }
}
