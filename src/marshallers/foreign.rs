//! MathML and XInclude passthrough
//!
//! The foreign sub-tree is copied as is in both directions. The wrappers
//! check their root on construction, so a wrong root surfaces here as an
//! unmarshalling error.

use crate::classes::QtiClass;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::{Component, Include, Math};

use super::helpers::unexpected_component;
use super::{ElementMarshaller, Marshaller};

fn into_unmarshalling(error: Error) -> Error {
    match error {
        Error::InvalidArgument(message) => Error::unmarshalling(message),
        other => other,
    }
}

/// MathML `math`
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMarshaller;

impl ElementMarshaller for MathMarshaller {
    fn name(&self) -> &'static str {
        "MathMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Math
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Math(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(c.xml().clone())
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Math::new(element.clone())
            .map(Component::from)
            .map_err(into_unmarshalling)
    }
}

/// XInclude `include`
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeMarshaller;

impl ElementMarshaller for IncludeMarshaller {
    fn name(&self) -> &'static str {
        "IncludeMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Include
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Include(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(c.xml().clone())
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Include::new(element.clone())
            .map(Component::from)
            .map_err(into_unmarshalling)
    }
}
