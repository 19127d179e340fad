//! # qtibind
//!
//! Versioned XML data binding for IMS QTI 2.x assessment content.
//!
//! A [`MarshallerFactory`] bound to a QTI version and profile resolves one
//! marshaller per QTI class. Each marshaller converts between an XML element
//! and a typed [`Component`], applying the attribute and content rules of
//! the bound version.
//!
//! ## Features
//!
//! - QTI 2.0, 2.1, 2.1.1, 2.2, 2.2.1 and 2.2.2
//! - Version-gated attributes and elements (HTML5 media and figures from 2.2)
//! - Compact profile with inlined item data and rubric block references
//! - MathML and XInclude passthrough
//! - Resource limits on document loading
//!
//! ## Example
//!
//! ```rust,ignore
//! use qtibind::{MarshallerFactory, MarshallingContext, SchemaVersion};
//! use qtibind::documents::Element;
//!
//! let factory = MarshallerFactory::new(SchemaVersion::V2_1_0);
//! let element = Element::parse(r#"<weight identifier="W1" value="2.5"/>"#)?;
//! let weight = factory
//!     .create_marshaller(&element, MarshallingContext::default())?
//!     .unmarshall_element(&element)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod version;

// Names and namespaces
pub mod namespaces;
pub mod names;

// Resource loading and the document tree
pub mod loaders;
pub mod documents;

// Data model
pub mod datatypes;
pub mod classes;
pub mod model;

// Binding
pub mod marshallers;
pub mod factory;
pub mod config;
pub mod storage;

// Re-exports for convenience
pub use classes::QtiClass;
pub use config::FactoryConfig;
pub use error::{Error, Result};
pub use factory::{MarshallerFactory, MarshallerSource};
pub use marshallers::{ElementMarshaller, Marshaller, MarshallingContext};
pub use model::{Component, QtiComponent};
pub use storage::XmlDocument;
pub use version::{Profile, SchemaVersion};

/// Version of the qtibind library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reexports() {
        let factory = MarshallerFactory::new(SchemaVersion::default());
        assert_eq!(factory.profile(), Profile::Standard);
        assert!(factory.has_mapping_entry(QtiClass::AssessmentItem.as_str()));
    }
}
