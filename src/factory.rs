//! Marshaller factory
//!
//! A [`MarshallerFactory`] is an immutable lookup table from QTI class to
//! [`ElementMarshaller`], bound to one [`SchemaVersion`] and one [`Profile`].
//! Profiles are expressed by composition: an override table is consulted
//! before the base table of the version, and the first match wins.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::classes::QtiClass;
use crate::config::FactoryConfig;
use crate::documents::{Element, Node};
use crate::error::{Error, MarshallerNotFoundError, Result};
use crate::marshallers::{
    compact_overrides, standard_marshaller, ElementMarshaller, Marshaller, MarshallingContext,
};
use crate::model::{Component, QtiComponent};
use crate::namespaces::{MATHML_NAMESPACE, XINCLUDE_NAMESPACE};
use crate::version::{Profile, SchemaVersion};

/// What a marshaller can be requested for
#[derive(Debug, Clone, Copy)]
pub enum MarshallerSource<'s> {
    /// A DOM node (element or text)
    Node(&'s Node),
    /// A DOM element
    Element(&'s Element),
    /// A typed component
    Component(&'s Component),
}

impl<'s> From<&'s Node> for MarshallerSource<'s> {
    fn from(node: &'s Node) -> Self {
        MarshallerSource::Node(node)
    }
}

impl<'s> From<&'s Element> for MarshallerSource<'s> {
    fn from(element: &'s Element) -> Self {
        MarshallerSource::Element(element)
    }
}

impl<'s> From<&'s Component> for MarshallerSource<'s> {
    fn from(component: &'s Component) -> Self {
        MarshallerSource::Component(component)
    }
}

/// Class name an element resolves to
///
/// MathML and XInclude elements are recognized by namespace, everything
/// else by local name.
fn element_class_name(element: &Element) -> &str {
    match element.namespace() {
        Some(MATHML_NAMESPACE) => QtiClass::Math.as_str(),
        Some(XINCLUDE_NAMESPACE) => QtiClass::Include.as_str(),
        _ => element.local_name(),
    }
}

/// Versioned registry of marshallers
#[derive(Debug, Clone)]
pub struct MarshallerFactory {
    version: SchemaVersion,
    profile: Profile,
    base: IndexMap<QtiClass, Arc<dyn ElementMarshaller>>,
    overrides: IndexMap<QtiClass, Arc<dyn ElementMarshaller>>,
}

impl MarshallerFactory {
    /// Standard factory for a version
    pub fn new(version: SchemaVersion) -> Self {
        Self::with_profile(version, Profile::Standard)
    }

    /// Compact profile factory for a version
    pub fn compact(version: SchemaVersion) -> Self {
        Self::with_profile(version, Profile::Compact)
    }

    /// Factory for a version and profile
    pub fn with_profile(version: SchemaVersion, profile: Profile) -> Self {
        let base: IndexMap<_, _> = QtiClass::ALL
            .iter()
            .copied()
            .filter(|class| class.is_available_in(version))
            .filter_map(|class| standard_marshaller(class).map(|m| (class, m)))
            .collect();

        let overrides: IndexMap<_, _> = match profile {
            Profile::Standard => IndexMap::new(),
            Profile::Compact => compact_overrides()
                .into_iter()
                .filter(|m| m.qti_class().is_available_in(version))
                .map(|m| (m.qti_class(), m))
                .collect(),
        };

        debug!(
            version = %version,
            profile = %profile,
            base = base.len(),
            overrides = overrides.len(),
            "Built marshaller factory"
        );

        Self {
            version,
            profile,
            base,
            overrides,
        }
    }

    /// Factory described by a configuration
    pub fn from_config(config: &FactoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_profile(config.version, config.profile))
    }

    /// Add an override entry for the class the marshaller handles
    ///
    /// Replaces a previous override for the same class.
    pub fn with_override(mut self, marshaller: Arc<dyn ElementMarshaller>) -> Self {
        debug!(
            class = marshaller.qti_class().as_str(),
            marshaller = marshaller.name(),
            "Registering marshaller override"
        );
        self.overrides.insert(marshaller.qti_class(), marshaller);
        self
    }

    /// Bound version
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Bound profile
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Whether a marshaller is registered for a class name
    pub fn has_mapping_entry(&self, qti_class_name: &str) -> bool {
        self.get_mapping_entry(qti_class_name).is_some()
    }

    /// The marshaller registered for a class name, overrides first
    pub fn get_mapping_entry(&self, qti_class_name: &str) -> Option<&Arc<dyn ElementMarshaller>> {
        let class = QtiClass::from_name(qti_class_name)?;
        self.overrides.get(&class).or_else(|| self.base.get(&class))
    }

    /// All effective entries in catalog order
    pub fn mapping_entries(&self) -> impl Iterator<Item = (QtiClass, &Arc<dyn ElementMarshaller>)> + '_ {
        let mut classes: Vec<QtiClass> = self.base.keys().copied().collect();
        classes.extend(
            self.overrides
                .keys()
                .copied()
                .filter(|class| !self.base.contains_key(class)),
        );
        classes.into_iter().filter_map(move |class| {
            self.overrides
                .get(&class)
                .or_else(|| self.base.get(&class))
                .map(|m| (class, m))
        })
    }

    /// Resolve the marshaller for an element, a text node or a component
    pub fn create_marshaller<'s>(
        &self,
        source: impl Into<MarshallerSource<'s>>,
        context: MarshallingContext,
    ) -> Result<Marshaller<'_>> {
        let name = match source.into() {
            MarshallerSource::Element(element) => element_class_name(element),
            MarshallerSource::Node(Node::Element(element)) => element_class_name(element),
            MarshallerSource::Node(Node::Text(_)) => QtiClass::TextRun.as_str(),
            MarshallerSource::Node(other) => {
                return Err(Error::InvalidArgument(format!(
                    "No marshaller can be created for a {} node; an element, a text node or a component is expected.",
                    other.kind()
                )))
            }
            MarshallerSource::Component(component) => component.qti_class_name(),
        };

        match self.get_mapping_entry(name) {
            Some(inner) => {
                trace!(class = name, marshaller = inner.name(), "Resolved marshaller");
                Ok(Marshaller::new(self, Arc::clone(inner), context))
            }
            None => {
                debug!(
                    class = name,
                    version = %self.version,
                    profile = %self.profile,
                    "No marshaller found"
                );
                Err(MarshallerNotFoundError::new(name, self.version, self.profile).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::QtiValue;
    use crate::documents::Element;
    use crate::model::*;

    #[test]
    fn test_version_gating_of_html5_classes() {
        let old = MarshallerFactory::new(SchemaVersion::V2_1_0);
        let new = MarshallerFactory::new(SchemaVersion::V2_2_2);
        for name in ["figure", "figcaption", "audio", "video", "source", "track"] {
            assert!(!old.has_mapping_entry(name), "{}", name);
            assert!(new.has_mapping_entry(name), "{}", name);
        }
    }

    #[test]
    fn test_figure_not_found_in_2_1() {
        let element = Element::parse("<figure><img src=\"a.png\" alt=\"A\"/></figure>").unwrap();
        let err = MarshallerFactory::new(SchemaVersion::V2_1_0)
            .create_marshaller(&element, MarshallingContext::default())
            .unwrap_err();
        let Error::MarshallerNotFound(inner) = err else {
            panic!("unexpected error")
        };
        assert_eq!(inner.qti_class_name, "figure");
        assert_eq!(inner.version, SchemaVersion::V2_1_0);
    }

    #[test]
    fn test_compact_override_precedence() {
        let standard = MarshallerFactory::new(SchemaVersion::V2_1_0);
        let compact = MarshallerFactory::compact(SchemaVersion::V2_1_0);

        assert_eq!(
            standard.get_mapping_entry("assessmentItemRef").unwrap().name(),
            "AssessmentItemRefMarshaller"
        );
        assert_eq!(
            compact.get_mapping_entry("assessmentItemRef").unwrap().name(),
            "ExtendedAssessmentItemRefMarshaller"
        );
        assert!(!standard.has_mapping_entry("rubricBlockRef"));
        assert!(compact.has_mapping_entry("rubricBlockRef"));
        assert_eq!(
            compact.get_mapping_entry("anyN").unwrap().name(),
            standard.get_mapping_entry("anyN").unwrap().name()
        );
    }

    #[test]
    fn test_resolution_by_namespace_and_node_kind() {
        let factory = MarshallerFactory::new(SchemaVersion::V2_1_0);
        let cx = MarshallingContext::default();

        let math = Element::namespaced(MATHML_NAMESPACE, "mi");
        assert_eq!(factory.create_marshaller(&math, cx).unwrap().name(), "MathMarshaller");

        let include = Element::namespaced(XINCLUDE_NAMESPACE, "include");
        assert_eq!(
            factory.create_marshaller(&include, cx).unwrap().name(),
            "IncludeMarshaller"
        );

        let text = Node::text("Hello");
        assert_eq!(
            factory.create_marshaller(&text, cx).unwrap().expected_qti_class_name(),
            "textRun"
        );

        let comment = Node::Comment("note".to_string());
        assert!(matches!(
            factory.create_marshaller(&comment, cx),
            Err(Error::InvalidArgument(_))
        ));

        let unknown = Element::parse("<notAQtiElement/>").unwrap();
        assert!(matches!(
            factory.create_marshaller(&unknown, cx),
            Err(Error::MarshallerNotFound(_))
        ));
    }

    #[test]
    fn test_component_resolution() {
        let factory = MarshallerFactory::new(SchemaVersion::V2_2_0);
        let component: Component = BaseValue::new(QtiValue::Boolean(true)).into();
        let marshaller = factory
            .create_marshaller(&component, MarshallingContext::default())
            .unwrap();
        assert_eq!(marshaller.name(), "BaseValueMarshaller");
        assert_eq!(marshaller.version(), SchemaVersion::V2_2_0);
    }

    #[test]
    fn test_with_override() {
        #[derive(Debug)]
        struct Custom;

        impl ElementMarshaller for Custom {
            fn name(&self) -> &'static str {
                "CustomWeightMarshaller"
            }
            fn qti_class(&self) -> QtiClass {
                QtiClass::Weight
            }
            fn marshall_element(&self, m: &Marshaller<'_>, _c: &Component) -> Result<Element> {
                Ok(m.new_element())
            }
            fn unmarshall_element(&self, _m: &Marshaller<'_>, _e: &Element) -> Result<Component> {
                Err(Error::unmarshalling("custom"))
            }
        }

        let factory = MarshallerFactory::new(SchemaVersion::V2_1_0).with_override(Arc::new(Custom));
        assert_eq!(
            factory.get_mapping_entry("weight").unwrap().name(),
            "CustomWeightMarshaller"
        );
        let weight = factory
            .mapping_entries()
            .find(|(class, _)| *class == QtiClass::Weight)
            .unwrap();
        assert_eq!(weight.1.name(), "CustomWeightMarshaller");
    }

    #[test]
    fn test_mapping_entries_cover_compact_only_classes() {
        let compact = MarshallerFactory::compact(SchemaVersion::V2_2_0);
        let names: Vec<&str> = compact.mapping_entries().map(|(c, _)| c.as_str()).collect();
        assert!(names.contains(&"rubricBlockRef"));
        assert!(names.contains(&"figure"));
        assert_eq!(
            names.iter().filter(|n| **n == "assessmentItemRef").count(),
            1
        );
    }

    #[test]
    fn test_factory_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MarshallerFactory>();
    }
}
