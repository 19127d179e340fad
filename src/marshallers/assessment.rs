//! Item, reference and section marshallers
//!
//! The reading and writing of item references and sections is shared with
//! the compact profile, which extends both with extra children.

use tracing::warn;

use crate::classes::QtiClass;
use crate::datatypes::format_float;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::{
    AssessmentItem, AssessmentItemRef, AssessmentSection, AssessmentSectionRef, Component,
    OutcomeDeclaration, QtiComponent, ResponseDeclaration, ResponseProcessing, RubricBlockRef,
    TemplateDeclaration, Weight,
};
use crate::version::SchemaVersion;

use super::helpers::*;
use super::{ElementMarshaller, Marshaller};

/// Classes a section may contain after its rubric blocks
const SECTION_PARTS: &[QtiClass] = &[
    QtiClass::AssessmentItemRef,
    QtiClass::AssessmentSection,
    QtiClass::AssessmentSectionRef,
    QtiClass::Include,
];

/// `assessmentItem`
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentItemMarshaller;

impl ElementMarshaller for AssessmentItemMarshaller {
    fn name(&self) -> &'static str {
        "AssessmentItemMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentItem
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::AssessmentItem(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m
            .new_element()
            .with_attribute("identifier", c.identifier.as_str())
            .with_attribute("title", c.title.as_str());
        set_optional(&mut element, "label", c.label.as_ref());
        set_optional(&mut element, "xml:lang", c.lang.as_ref());
        element.set_attribute("adaptive", c.adaptive.to_string());
        element.set_attribute("timeDependent", c.time_dependent.to_string());
        set_optional(&mut element, "toolName", c.tool_name.as_ref());
        set_optional(&mut element, "toolVersion", c.tool_version.as_ref());

        for declaration in &c.response_declarations {
            append_typed(m, &mut element, declaration)?;
        }
        for declaration in &c.outcome_declarations {
            append_typed(m, &mut element, declaration)?;
        }
        for declaration in &c.template_declarations {
            append_typed(m, &mut element, declaration)?;
        }
        if let Some(body) = &c.item_body {
            append_typed(m, &mut element, body)?;
        }
        if let Some(processing) = &c.response_processing {
            append_typed(m, &mut element, processing)?;
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let mut item = AssessmentItem::new(
            required_identifier(element, "identifier")?,
            required_attribute(element, "title")?,
        );
        item.label = optional_string(element, "label");
        item.lang = optional_string(element, "xml:lang");
        item.adaptive = required_boolean(element, "adaptive")?;
        item.time_dependent = required_boolean(element, "timeDependent")?;
        item.tool_name = optional_string(element, "toolName");
        item.tool_version = optional_string(element, "toolVersion");

        for child in unmarshall_child_elements(m, element)? {
            match child {
                Component::ResponseDeclaration(d) => item.response_declarations.push(d),
                Component::OutcomeDeclaration(d) => item.outcome_declarations.push(d),
                Component::TemplateDeclaration(d) => item.template_declarations.push(d),
                Component::ItemBody(b) if item.item_body.is_none() => item.item_body = Some(b),
                Component::ResponseProcessing(p) if item.response_processing.is_none() => {
                    item.response_processing = Some(p)
                }
                other => {
                    return Err(Error::unmarshalling(format!(
                        "The 'assessmentItem' element cannot contain '{}' elements at this position.",
                        other.qti_class_name()
                    )))
                }
            }
        }
        Ok(item.into())
    }
}

// =============================================================================
// Item references
// =============================================================================

/// Write the attributes and weights of an item reference
pub(super) fn write_item_ref(m: &Marshaller<'_>, item_ref: &AssessmentItemRef) -> Result<Element> {
    let mut element = m
        .new_element()
        .with_attribute("identifier", item_ref.identifier.as_str())
        .with_attribute("href", item_ref.href.as_str());
    set_boolean_unless(&mut element, "required", item_ref.required, false);
    set_boolean_unless(&mut element, "fixed", item_ref.fixed, false);
    set_list(&mut element, "category", &item_ref.categories);
    for weight in &item_ref.weights {
        append_typed(m, &mut element, weight)?;
    }
    Ok(element)
}

/// Read an item reference, returning the children that are not weights
pub(super) fn read_item_ref(
    m: &Marshaller<'_>,
    element: &Element,
) -> Result<(AssessmentItemRef, Vec<Component>)> {
    let mut item_ref = AssessmentItemRef::new(
        required_identifier(element, "identifier")?,
        required_attribute(element, "href")?,
    );
    item_ref.required = boolean_or(element, "required", false)?;
    item_ref.fixed = boolean_or(element, "fixed", false)?;
    item_ref.categories = identifier_list(element, "category")?;

    let mut rest = Vec::new();
    for child in unmarshall_child_elements(m, element)? {
        match child {
            Component::Weight(w) => item_ref.weights.push(w),
            other => rest.push(other),
        }
    }
    Ok((item_ref, rest))
}

/// `assessmentItemRef`
///
/// Extended references are written without their inlined item data.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentItemRefMarshaller;

impl ElementMarshaller for AssessmentItemRefMarshaller {
    fn name(&self) -> &'static str {
        "AssessmentItemRefMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentItemRef
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        match component {
            Component::AssessmentItemRef(c) => write_item_ref(m, c),
            Component::ExtendedAssessmentItemRef(c) => {
                if c.has_extended_content() {
                    warn!(
                        identifier = %c.item_ref.identifier,
                        profile = %m.profile(),
                        "inlined item data is only written by the compact profile, dropped"
                    );
                }
                write_item_ref(m, &c.item_ref)
            }
            other => Err(unexpected_component(m, other)),
        }
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (item_ref, rest) = read_item_ref(m, element)?;
        if let Some(other) = rest.first() {
            return Err(Error::unmarshalling(format!(
                "The 'assessmentItemRef' element cannot contain '{}' elements.",
                other.qti_class_name()
            )));
        }
        Ok(item_ref.into())
    }
}

/// `weight`
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightMarshaller;

impl ElementMarshaller for WeightMarshaller {
    fn name(&self) -> &'static str {
        "WeightMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Weight
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Weight(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(m.new_element()
            .with_attribute("identifier", c.identifier.as_str())
            .with_attribute("value", format_float(c.value)))
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Weight {
            identifier: required_identifier(element, "identifier")?,
            value: required_float(element, "value")?,
        }
        .into())
    }
}

/// `assessmentSectionRef`
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentSectionRefMarshaller;

impl ElementMarshaller for AssessmentSectionRefMarshaller {
    fn name(&self) -> &'static str {
        "AssessmentSectionRefMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentSectionRef
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::AssessmentSectionRef(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m
            .new_element()
            .with_attribute("identifier", c.identifier.as_str())
            .with_attribute("href", c.href.as_str());
        set_boolean_unless(&mut element, "required", c.required, false);
        set_boolean_unless(&mut element, "fixed", c.fixed, false);
        Ok(element)
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(AssessmentSectionRef {
            identifier: required_identifier(element, "identifier")?,
            href: required_attribute(element, "href")?.to_string(),
            required: boolean_or(element, "required", false)?,
            fixed: boolean_or(element, "fixed", false)?,
        }
        .into())
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Write a section, with rubric block references after its rubric blocks
pub(super) fn write_section(
    m: &Marshaller<'_>,
    section: &AssessmentSection,
    rubric_block_refs: &[RubricBlockRef],
) -> Result<Element> {
    check_child_classes(Phase::Marshall, QtiClass::AssessmentSection, SECTION_PARTS, &section.section_parts)?;

    let mut element = m
        .new_element()
        .with_attribute("identifier", section.identifier.as_str())
        .with_attribute("title", section.title.as_str())
        .with_attribute("visible", section.visible.to_string());
    set_boolean_unless(&mut element, "required", section.required, false);
    set_boolean_unless(&mut element, "fixed", section.fixed, false);
    if writable_since(m, SchemaVersion::V2_1_0, "keepTogether", !section.keep_together) {
        set_boolean_unless(&mut element, "keepTogether", section.keep_together, true);
    }

    for rubric_block in &section.rubric_blocks {
        append_typed(m, &mut element, rubric_block)?;
    }
    for rubric_block_ref in rubric_block_refs {
        append_typed(m, &mut element, rubric_block_ref)?;
    }
    append_children(m, &mut element, &section.section_parts)?;
    Ok(element)
}

/// Read a section, returning the rubric block references it holds
pub(super) fn read_section(
    m: &Marshaller<'_>,
    element: &Element,
) -> Result<(AssessmentSection, Vec<RubricBlockRef>)> {
    let mut section = AssessmentSection::new(
        required_identifier(element, "identifier")?,
        required_attribute(element, "title")?,
        required_boolean(element, "visible")?,
    );
    section.required = boolean_or(element, "required", false)?;
    section.fixed = boolean_or(element, "fixed", false)?;
    if readable_since(m, SchemaVersion::V2_1_0) {
        section.keep_together = boolean_or(element, "keepTogether", true)?;
    }

    let mut rubric_block_refs = Vec::new();
    for child in unmarshall_child_elements(m, element)? {
        match child {
            Component::RubricBlock(r) => section.rubric_blocks.push(r),
            Component::RubricBlockRef(r) => rubric_block_refs.push(r),
            part if SECTION_PARTS.contains(&part.qti_class()) => section.section_parts.push(part),
            other => {
                return Err(Error::unmarshalling(format!(
                    "The 'assessmentSection' element cannot contain '{}' elements.",
                    other.qti_class_name()
                )))
            }
        }
    }
    Ok((section, rubric_block_refs))
}

/// `assessmentSection`
///
/// Extended sections are written without their rubric block references.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentSectionMarshaller;

impl ElementMarshaller for AssessmentSectionMarshaller {
    fn name(&self) -> &'static str {
        "AssessmentSectionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentSection
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        match component {
            Component::AssessmentSection(c) => write_section(m, c, &[]),
            Component::ExtendedAssessmentSection(c) => {
                if !c.rubric_block_refs.is_empty() {
                    warn!(
                        identifier = %c.section.identifier,
                        profile = %m.profile(),
                        count = c.rubric_block_refs.len(),
                        "rubric block references are only written by the compact profile, dropped"
                    );
                }
                write_section(m, &c.section, &[])
            }
            other => Err(unexpected_component(m, other)),
        }
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (section, rubric_block_refs) = read_section(m, element)?;
        if !rubric_block_refs.is_empty() {
            return Err(Error::unmarshalling(
                "The 'assessmentSection' element cannot contain 'rubricBlockRef' elements.",
            ));
        }
        Ok(section.into())
    }
}

/// Item data carried by an extended reference
#[derive(Debug, Default)]
pub(super) struct InlinedItemData {
    pub(super) response_declarations: Vec<ResponseDeclaration>,
    pub(super) outcome_declarations: Vec<OutcomeDeclaration>,
    pub(super) template_declarations: Vec<TemplateDeclaration>,
    pub(super) response_processing: Option<ResponseProcessing>,
}

impl InlinedItemData {
    /// Sort unmarshalled children into their lists
    pub(super) fn collect(children: Vec<Component>) -> Result<Self> {
        let mut data = Self::default();
        for child in children {
            match child {
                Component::ResponseDeclaration(d) => data.response_declarations.push(d),
                Component::OutcomeDeclaration(d) => data.outcome_declarations.push(d),
                Component::TemplateDeclaration(d) => data.template_declarations.push(d),
                Component::ResponseProcessing(p) if data.response_processing.is_none() => {
                    data.response_processing = Some(p)
                }
                other => {
                    return Err(Error::unmarshalling(format!(
                        "The 'assessmentItemRef' element cannot contain '{}' elements.",
                        other.qti_class_name()
                    )))
                }
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use crate::documents::Element;
    use crate::factory::MarshallerFactory;
    use crate::marshallers::MarshallingContext;
    use crate::model::*;
    use crate::version::SchemaVersion;

    fn factory() -> MarshallerFactory {
        MarshallerFactory::new(SchemaVersion::V2_1_0)
    }

    fn unmarshall(xml: &str) -> crate::Result<Component> {
        let factory = factory();
        let element = Element::parse(xml)?;
        factory
            .create_marshaller(&element, MarshallingContext::default())?
            .unmarshall_element(&element)
    }

    fn marshall(component: &Component) -> crate::Result<Element> {
        let factory = factory();
        factory
            .create_marshaller(component, MarshallingContext::default())?
            .marshall_element(component)
    }

    #[test]
    fn test_weight_identifier_checked_on_read_only() {
        let weight: Component = Weight::new("999", 3.45).into();
        let element = marshall(&weight).unwrap();
        assert_eq!(element.attribute("identifier"), Some("999"));
        assert_eq!(element.attribute("value"), Some("3.45"));

        let err = marshall(&weight)
            .and_then(|e| {
                factory()
                    .create_marshaller(&e, MarshallingContext::default())?
                    .unmarshall_element(&e)
            })
            .unwrap_err();
        assert_eq!(
            err.message(),
            "The value '999' of the 'identifier' attribute of the 'weight' element is not a valid QTI Identifier."
        );
    }

    #[test]
    fn test_item_ref_with_weights() {
        let component = unmarshall(
            r#"<assessmentItemRef identifier="Q01" href="./Q01.xml" category="math easy" fixed="true">
                <weight identifier="W01" value="2"/>
            </assessmentItemRef>"#,
        )
        .unwrap();
        let item_ref = AssessmentItemRef::try_from(component).unwrap();
        assert_eq!(item_ref.categories, vec!["math", "easy"]);
        assert!(item_ref.fixed && !item_ref.required);
        assert_eq!(item_ref.weights, vec![Weight::new("W01", 2.0)]);
    }

    #[test]
    fn test_extended_item_ref_dropped_by_standard_profile() {
        let mut extended = ExtendedAssessmentItemRef::new(AssessmentItemRef::new("Q01", "./Q01.xml"));
        extended.adaptive = true;
        extended.outcome_declarations.push(OutcomeDeclaration::new(
            "SCORE",
            crate::datatypes::Cardinality::Single,
            Some(crate::datatypes::BaseType::Float),
        ));
        let element = marshall(&extended.into()).unwrap();
        assert!(!element.has_attribute("adaptive"));
        assert_eq!(element.child_elements().count(), 0);
    }

    #[test]
    fn test_section_parts() {
        let component = unmarshall(
            r#"<assessmentSection identifier="S01" title="Section 1" visible="true" keepTogether="false">
                <rubricBlock view="candidate"><p>Read carefully.</p></rubricBlock>
                <assessmentItemRef identifier="Q01" href="./Q01.xml"/>
                <assessmentSection identifier="S02" title="Nested" visible="false"/>
                <assessmentSectionRef identifier="S03" href="./S03.xml"/>
            </assessmentSection>"#,
        )
        .unwrap();
        let section = AssessmentSection::try_from(component).unwrap();
        assert!(!section.keep_together);
        assert_eq!(section.rubric_blocks.len(), 1);
        let names: Vec<_> = section.section_parts.iter().map(|p| p.qti_class_name()).collect();
        assert_eq!(names, vec!["assessmentItemRef", "assessmentSection", "assessmentSectionRef"]);
    }

    #[test]
    fn test_keep_together_gated() {
        let mut section = AssessmentSection::new("S01", "Section 1", false);
        section.keep_together = false;
        let component: Component = section.into();
        let factory = MarshallerFactory::new(SchemaVersion::V2_0_0);
        let element = factory
            .create_marshaller(&component, MarshallingContext::default())
            .unwrap()
            .marshall_element(&component)
            .unwrap();
        assert!(!element.has_attribute("keepTogether"));
        assert_eq!(element.attribute("visible"), Some("false"));
    }

    #[test]
    fn test_item_requires_adaptive() {
        let err = unmarshall(r#"<assessmentItem identifier="ITEM" title="Item" timeDependent="false"/>"#).unwrap_err();
        assert_eq!(
            err.message(),
            "The mandatory 'adaptive' attribute is missing from the 'assessmentItem' element."
        );
    }
}
