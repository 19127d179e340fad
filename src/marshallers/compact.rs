//! Compact profile marshallers
//!
//! The compact profile inlines the declarations and response processing of
//! referenced items into their references, and lets sections point at
//! shared rubric block documents.

use crate::classes::QtiClass;
use crate::documents::Element;
use crate::error::Result;
use crate::model::{
    Component, ExtendedAssessmentItemRef, ExtendedAssessmentSection, RubricBlockRef,
};

use super::assessment::{read_item_ref, read_section, write_item_ref, write_section, InlinedItemData};
use super::helpers::*;
use super::{ElementMarshaller, Marshaller};

/// `assessmentItemRef` with inlined item data
///
/// A reference without inlined data or flags reads back as a plain
/// `AssessmentItemRef`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedAssessmentItemRefMarshaller;

impl ElementMarshaller for ExtendedAssessmentItemRefMarshaller {
    fn name(&self) -> &'static str {
        "ExtendedAssessmentItemRefMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentItemRef
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let c = match component {
            Component::ExtendedAssessmentItemRef(c) => c.clone(),
            Component::AssessmentItemRef(c) => ExtendedAssessmentItemRef::new(c.clone()),
            other => return Err(unexpected_component(m, other)),
        };

        let mut element = write_item_ref(m, &c.item_ref)?;
        set_boolean_unless(&mut element, "adaptive", c.adaptive, false);
        set_boolean_unless(&mut element, "timeDependent", c.time_dependent, false);
        for declaration in &c.response_declarations {
            append_typed(m, &mut element, declaration)?;
        }
        for declaration in &c.outcome_declarations {
            append_typed(m, &mut element, declaration)?;
        }
        for declaration in &c.template_declarations {
            append_typed(m, &mut element, declaration)?;
        }
        if let Some(processing) = &c.response_processing {
            append_typed(m, &mut element, processing)?;
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (item_ref, rest) = read_item_ref(m, element)?;
        let data = InlinedItemData::collect(rest)?;

        let mut extended = ExtendedAssessmentItemRef::new(item_ref);
        extended.adaptive = boolean_or(element, "adaptive", false)?;
        extended.time_dependent = boolean_or(element, "timeDependent", false)?;
        extended.response_declarations = data.response_declarations;
        extended.outcome_declarations = data.outcome_declarations;
        extended.template_declarations = data.template_declarations;
        extended.response_processing = data.response_processing;
        if extended.has_extended_content() {
            Ok(extended.into())
        } else {
            Ok(extended.item_ref.into())
        }
    }
}

/// `assessmentSection` accepting `rubricBlockRef` children
///
/// Reads back as a plain `AssessmentSection` when no rubric block is referenced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedAssessmentSectionMarshaller;

impl ElementMarshaller for ExtendedAssessmentSectionMarshaller {
    fn name(&self) -> &'static str {
        "ExtendedAssessmentSectionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentSection
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        match component {
            Component::ExtendedAssessmentSection(c) => {
                write_section(m, &c.section, &c.rubric_block_refs)
            }
            Component::AssessmentSection(c) => write_section(m, c, &[]),
            other => Err(unexpected_component(m, other)),
        }
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (section, rubric_block_refs) = read_section(m, element)?;
        if rubric_block_refs.is_empty() {
            return Ok(section.into());
        }
        Ok(ExtendedAssessmentSection {
            section,
            rubric_block_refs,
        }
        .into())
    }
}

/// `rubricBlockRef`
#[derive(Debug, Clone, Copy, Default)]
pub struct RubricBlockRefMarshaller;

impl ElementMarshaller for RubricBlockRefMarshaller {
    fn name(&self) -> &'static str {
        "RubricBlockRefMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::RubricBlockRef
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::RubricBlockRef(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(m.new_element()
            .with_attribute("identifier", c.identifier.as_str())
            .with_attribute("href", c.href.as_str()))
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(RubricBlockRef {
            identifier: required_identifier(element, "identifier")?,
            href: required_attribute(element, "href")?.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use crate::datatypes::BaseType;
    use crate::documents::Element;
    use crate::factory::MarshallerFactory;
    use crate::marshallers::MarshallingContext;
    use crate::model::*;
    use crate::version::SchemaVersion;
    use crate::Error;

    fn compact() -> MarshallerFactory {
        MarshallerFactory::compact(SchemaVersion::V2_1_0)
    }

    const EXTENDED_REF: &str = r#"<assessmentItemRef identifier="Q01" href="./Q01.xml" adaptive="true">
        <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
            <correctResponse><value>ChoiceA</value></correctResponse>
        </responseDeclaration>
        <outcomeDeclaration identifier="SCORE" cardinality="single" baseType="float"/>
        <responseProcessing template="match_correct"/>
    </assessmentItemRef>"#;

    #[test]
    fn test_compact_item_ref_round_trip() {
        let factory = compact();
        let element = Element::parse(EXTENDED_REF).unwrap();
        let marshaller = factory
            .create_marshaller(&element, MarshallingContext::default())
            .unwrap();
        assert_eq!(marshaller.name(), "ExtendedAssessmentItemRefMarshaller");

        let component = marshaller.unmarshall_element(&element).unwrap();
        let extended = ExtendedAssessmentItemRef::try_from(component.clone()).unwrap();
        assert!(extended.adaptive);
        assert_eq!(extended.response_declarations.len(), 1);
        assert_eq!(extended.outcome_declarations[0].base_type, Some(BaseType::Float));
        assert!(extended.response_processing.is_some());

        let written = factory
            .create_marshaller(&component, MarshallingContext::default())
            .unwrap()
            .marshall_element(&component)
            .unwrap();
        assert_eq!(written.attribute("adaptive"), Some("true"));
        let names: Vec<_> = written.child_elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["responseDeclaration", "outcomeDeclaration", "responseProcessing"]);
    }

    #[test]
    fn test_standard_rejects_inlined_data() {
        let factory = MarshallerFactory::new(SchemaVersion::V2_1_0);
        let element = Element::parse(EXTENDED_REF).unwrap();
        let err = factory
            .create_marshaller(&element, MarshallingContext::default())
            .unwrap()
            .unmarshall_element(&element)
            .unwrap_err();
        assert!(matches!(err, Error::Unmarshalling(_)));
    }

    #[test]
    fn test_rubric_block_refs() {
        let xml = r#"<assessmentSection identifier="S01" title="Section" visible="true">
            <rubricBlockRef identifier="R01" href="./R01.xml"/>
            <assessmentItemRef identifier="Q01" href="./Q01.xml"/>
        </assessmentSection>"#;
        let element = Element::parse(xml).unwrap();

        let factory = compact();
        let component = factory
            .create_marshaller(&element, MarshallingContext::default())
            .unwrap()
            .unmarshall_element(&element)
            .unwrap();
        let section = ExtendedAssessmentSection::try_from(component).unwrap();
        assert_eq!(section.rubric_block_refs, vec![RubricBlockRef::new("R01", "./R01.xml")]);
        assert_eq!(section.section.section_parts.len(), 1);

        let standard = MarshallerFactory::new(SchemaVersion::V2_1_0);
        let err = standard
            .create_marshaller(&element, MarshallingContext::default())
            .unwrap()
            .unmarshall_element(&element)
            .unwrap_err();
        assert!(matches!(err, Error::MarshallerNotFound(_)));
    }

    #[test]
    fn test_plain_ref_through_compact_marshaller() {
        let mut item_ref = AssessmentItemRef::new("Q01", "./Q01.xml");
        item_ref.required = true;
        let component: Component = item_ref.into();
        let factory = compact();
        let element = factory
            .create_marshaller(&component, MarshallingContext::default())
            .unwrap()
            .marshall_element(&component)
            .unwrap();
        assert_eq!(element.attribute("required"), Some("true"));
        assert!(!element.has_attribute("adaptive"));
    }

    fn round_trip(factory: &MarshallerFactory, component: &Component) -> Component {
        let element = factory
            .create_marshaller(component, MarshallingContext::default())
            .unwrap()
            .marshall_element(component)
            .unwrap();
        factory
            .create_marshaller(&element, MarshallingContext::default())
            .unwrap()
            .unmarshall_element(&element)
            .unwrap()
    }

    #[test]
    fn test_plain_ref_reads_back_plain() {
        let component: Component = AssessmentItemRef::new("Q01", "./Q01.xml").into();
        assert_eq!(round_trip(&compact(), &component), component);

        let empty: Component =
            ExtendedAssessmentItemRef::new(AssessmentItemRef::new("Q02", "./Q02.xml")).into();
        let read = round_trip(&compact(), &empty);
        assert!(matches!(read, Component::AssessmentItemRef(ref r) if r.identifier == "Q02"));
    }

    #[test]
    fn test_time_dependent_flag_keeps_extended_ref() {
        let mut extended = ExtendedAssessmentItemRef::new(AssessmentItemRef::new("Q01", "./Q01.xml"));
        extended.time_dependent = true;
        let component: Component = extended.into();
        assert_eq!(round_trip(&compact(), &component), component);
    }

    #[test]
    fn test_section_with_plain_refs_round_trip() {
        let mut section = AssessmentSection::new("S01", "Section", true);
        section.section_parts.push(AssessmentItemRef::new("Q01", "./Q01.xml").into());
        section.section_parts.push(AssessmentItemRef::new("Q02", "./Q02.xml").into());
        let component: Component = section.into();

        let read = round_trip(&compact(), &component);
        assert_eq!(read, component);
        let section = AssessmentSection::try_from(read).unwrap();
        assert!(section
            .section_parts
            .iter()
            .all(|p| matches!(p, Component::AssessmentItemRef(_))));
    }

    #[test]
    fn test_mixed_section_parts_keep_their_variants() {
        let mut extended = ExtendedAssessmentItemRef::new(AssessmentItemRef::new("Q02", "./Q02.xml"));
        extended.adaptive = true;
        let mut section = AssessmentSection::new("S01", "Section", true);
        section.section_parts.push(AssessmentItemRef::new("Q01", "./Q01.xml").into());
        section.section_parts.push(extended.into());
        let mut with_refs = ExtendedAssessmentSection::new(section);
        with_refs.rubric_block_refs.push(RubricBlockRef::new("R01", "./R01.xml"));
        let component: Component = with_refs.into();

        assert_eq!(round_trip(&compact(), &component), component);
    }
}
