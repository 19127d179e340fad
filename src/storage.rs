//! QTI document storage
//!
//! [`XmlDocument`] ties a factory configuration to a root component and
//! moves it in and out of XML text or files.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::FactoryConfig;
use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::factory::MarshallerFactory;
use crate::limits::Limits;
use crate::loaders::{Loader, Location};
use crate::marshallers::MarshallingContext;
use crate::model::{Component, QtiComponent};
use crate::namespaces::XSI_NAMESPACE;
use crate::version::{Profile, SchemaVersion};

/// A QTI document bound to a version and profile
#[derive(Debug, Clone)]
pub struct XmlDocument {
    factory: MarshallerFactory,
    limits: Limits,
    /// The unmarshalled root component, if any
    pub root: Option<Component>,
}

impl XmlDocument {
    /// Empty standard profile document
    pub fn new(version: SchemaVersion) -> Self {
        Self::with_profile(version, Profile::Standard)
    }

    /// Empty document for a version and profile
    pub fn with_profile(version: SchemaVersion, profile: Profile) -> Self {
        Self {
            factory: MarshallerFactory::with_profile(version, profile),
            limits: Limits::default(),
            root: None,
        }
    }

    /// Empty document described by a configuration
    pub fn from_config(config: &FactoryConfig) -> Result<Self> {
        Ok(Self {
            factory: MarshallerFactory::from_config(config)?,
            limits: config.limits.clone(),
            root: None,
        })
    }

    /// Document holding a root component
    pub fn with_root(mut self, root: impl Into<Component>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the limits used when loading
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Bound version
    pub fn version(&self) -> SchemaVersion {
        self.factory.version()
    }

    /// Bound profile
    pub fn profile(&self) -> Profile {
        self.factory.profile()
    }

    /// The factory documents are converted with
    pub fn factory(&self) -> &MarshallerFactory {
        &self.factory
    }

    /// Load a document, inferring its version from the root element
    ///
    /// The root namespace selects the minor version and
    /// `xsi:schemaLocation`, when present, the patch level.
    pub fn infer_from_string(xml: &str, profile: Profile) -> Result<Self> {
        let document = Document::parse(xml)?;
        let version = infer_version(&document.root)?;
        debug!(version = %version, "Inferred QTI version");
        let mut loaded = Self::with_profile(version, profile);
        loaded.root = Some(loaded.unmarshall_root(&document.root)?);
        Ok(loaded)
    }

    /// Load a document from a string with the bound version
    pub fn load_from_string(&mut self, xml: &str) -> Result<()> {
        self.load(&Location::String(xml.to_string()))
    }

    /// Load a document from a location with the bound version
    pub fn load(&mut self, location: &Location) -> Result<()> {
        let text = Loader::new()
            .with_limits(self.limits.clone())
            .load(location)?;
        let document = Document::parse_with_limits(&text, &self.limits)?;

        if let Some(ns) = document.root.namespace() {
            if ns != self.version().namespace() {
                debug!(
                    namespace = ns,
                    version = %self.version(),
                    "Root namespace does not match the bound version"
                );
            }
        }

        let root = self.unmarshall_root(&document.root)?;
        info!(
            location = %location.as_str(),
            root = root.qti_class_name(),
            "Loaded QTI document"
        );
        self.root = Some(root);
        Ok(())
    }

    fn unmarshall_root(&self, root: &Element) -> Result<Component> {
        self.factory
            .create_marshaller(root, MarshallingContext::default())?
            .unmarshall_element(root)
    }

    /// Marshall the root component into a document element
    ///
    /// The root carries the QTI namespace of the bound version and its
    /// `xsi:schemaLocation`.
    pub fn to_element(&self) -> Result<Element> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| Error::marshalling("The document has no root component to save."))?;

        let mut element = self
            .factory
            .create_marshaller(root, MarshallingContext::default())?
            .marshall_element(root)?;

        let version = self.version();
        element.declare_namespace(None, version.namespace());
        element.declare_namespace(Some("xsi"), XSI_NAMESPACE);
        element.set_attribute(
            "xsi:schemaLocation",
            format!("{} {}", version.namespace(), version.schema_location()),
        );
        Ok(element)
    }

    /// Serialize the root component
    pub fn save_to_string(&self) -> Result<String> {
        Document::new(self.to_element()?).to_xml_string()
    }

    /// Serialize the root component to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let xml = self.save_to_string()?;
        fs::write(path, xml).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write file '{}': {}", path.display(), e),
            ))
        })?;
        info!(path = %path.display(), version = %self.version(), "Saved QTI document");
        Ok(())
    }
}

/// Version of a parsed document, from its root element
pub fn infer_version(root: &Element) -> Result<SchemaVersion> {
    let namespace = root.namespace().ok_or_else(|| {
        Error::Version(format!(
            "The '{}' root element has no namespace, the QTI version cannot be inferred.",
            root.local_name()
        ))
    })?;
    SchemaVersion::infer(namespace, root.attribute("xsi:schemaLocation"))
}
