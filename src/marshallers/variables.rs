//! Variable declaration marshallers
//!
//! Declarations hand their base type and cardinality down to `value`,
//! `mapping` and `mapEntry` children through the [`MarshallingContext`].

use tracing::debug;

use crate::classes::QtiClass;
use crate::datatypes::{format_float, BaseType, Cardinality, ExternalScored, QtiEnum, QtiValue, View};
use crate::documents::{Element, Node};
use crate::error::{Error, Result};
use crate::model::{
    Component, CorrectResponse, DefaultValue, MapEntry, Mapping, OutcomeDeclaration, QtiComponent,
    ResponseDeclaration, TemplateDeclaration, Value,
};
use crate::version::SchemaVersion;

use super::helpers::*;
use super::{ElementMarshaller, Marshaller, MarshallingContext};

/// `value`
///
/// The base type comes from the element's own `baseType` attribute (record
/// fields), then from the context, and falls back to string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueMarshaller;

impl ElementMarshaller for ValueMarshaller {
    fn name(&self) -> &'static str {
        "ValueMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Value
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Value(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        set_optional(&mut element, "fieldIdentifier", c.field_identifier.as_ref());
        if m.context().base_type != Some(c.base_type()) {
            element.set_attribute("baseType", c.base_type().as_str());
        }
        element.append_child(Node::text(c.value.to_string()));
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let base_type = match optional_enum::<BaseType>(element, "baseType")? {
            Some(base_type) => base_type,
            None => m.context().base_type.unwrap_or_else(|| {
                debug!("no base type for value, reading it as a string");
                BaseType::String
            }),
        };

        let text = element.text();
        let value = QtiValue::parse(base_type, &text).ok_or_else(|| {
            Error::unmarshalling(format!(
                "The value '{}' of the 'value' element is not a valid {} value.",
                text, base_type
            ))
        })?;

        Ok(Value {
            value,
            field_identifier: optional_identifier(element, "fieldIdentifier")?,
        }
        .into())
    }
}

fn unmarshall_values(m: &Marshaller<'_>, element: &Element) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    for node in &element.children {
        if let Node::Element(_) = node {
            let child = m.unmarshall_child_with(node, *m.context())?;
            values.push(expect_typed::<Value>(element, child)?);
        }
    }
    if values.is_empty() {
        return Err(Error::unmarshalling(format!(
            "A '{}' element must contain at least one 'value' element, none given.",
            element.local_name()
        )));
    }
    Ok(values)
}

fn append_values(m: &Marshaller<'_>, element: &mut Element, values: &[Value]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::marshalling(format!(
            "A '{}' element must contain at least one 'value' element, none given.",
            element.local_name()
        )));
    }
    for value in values {
        let component = Component::Value(value.clone());
        element.append_child(m.marshall_child_with(&component, *m.context())?);
    }
    Ok(())
}

/// `defaultValue`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueMarshaller;

impl ElementMarshaller for DefaultValueMarshaller {
    fn name(&self) -> &'static str {
        "DefaultValueMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::DefaultValue
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::DefaultValue(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        set_optional(&mut element, "interpretation", c.interpretation.as_ref());
        append_values(m, &mut element, &c.values)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(DefaultValue {
            interpretation: optional_string(element, "interpretation"),
            values: unmarshall_values(m, element)?,
        }
        .into())
    }
}

/// `correctResponse`
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrectResponseMarshaller;

impl ElementMarshaller for CorrectResponseMarshaller {
    fn name(&self) -> &'static str {
        "CorrectResponseMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::CorrectResponse
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::CorrectResponse(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        set_optional(&mut element, "interpretation", c.interpretation.as_ref());
        append_values(m, &mut element, &c.values)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(CorrectResponse {
            interpretation: optional_string(element, "interpretation"),
            values: unmarshall_values(m, element)?,
        }
        .into())
    }
}

/// `mapping`
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingMarshaller;

impl ElementMarshaller for MappingMarshaller {
    fn name(&self) -> &'static str {
        "MappingMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Mapping
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Mapping(c) = component else {
            return Err(unexpected_component(m, component));
        };
        if c.map_entries.is_empty() {
            return Err(Error::marshalling(
                "A 'mapping' element must contain at least one 'mapEntry' element, none given.",
            ));
        }

        let mut element = m.new_element();
        set_optional(&mut element, "lowerBound", c.lower_bound.as_ref());
        set_optional(&mut element, "upperBound", c.upper_bound.as_ref());
        if c.default_value != 0.0 {
            element.set_attribute("defaultValue", format_float(c.default_value));
        }
        for entry in &c.map_entries {
            let component = Component::MapEntry(entry.clone());
            element.append_child(m.marshall_child_with(&component, *m.context())?);
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let mut map_entries = Vec::new();
        for node in &element.children {
            if let Node::Element(_) = node {
                let child = m.unmarshall_child_with(node, *m.context())?;
                map_entries.push(expect_typed::<MapEntry>(element, child)?);
            }
        }
        if map_entries.is_empty() {
            return Err(Error::unmarshalling(
                "A 'mapping' element must contain at least one 'mapEntry' element, none given.",
            ));
        }

        Ok(Mapping {
            lower_bound: optional_float(element, "lowerBound")?,
            upper_bound: optional_float(element, "upperBound")?,
            default_value: optional_float(element, "defaultValue")?.unwrap_or(0.0),
            map_entries,
        }
        .into())
    }
}

/// `mapEntry`
///
/// The key is typed by the enclosing declaration, so unmarshalling needs a
/// base type in the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapEntryMarshaller;

impl ElementMarshaller for MapEntryMarshaller {
    fn name(&self) -> &'static str {
        "MapEntryMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::MapEntry
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::MapEntry(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m
            .new_element()
            .with_attribute("mapKey", c.map_key.to_string())
            .with_attribute("mappedValue", format_float(c.mapped_value));
        if writable_since(m, SchemaVersion::V2_1_0, "caseSensitive", !c.case_sensitive) {
            element.set_attribute("caseSensitive", c.case_sensitive.to_string());
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let base_type = m.context().base_type.ok_or_else(|| {
            Error::unmarshalling(
                "The 'mapEntry' element cannot be unmarshalled without the base type of the enclosing declaration.",
            )
        })?;

        let key = required_attribute(element, "mapKey")?;
        let map_key = QtiValue::parse(base_type, key).ok_or_else(|| {
            Error::unmarshalling(format!(
                "The value '{}' of the 'mapKey' attribute of the 'mapEntry' element is not a valid {} value.",
                key, base_type
            ))
        })?;

        let case_sensitive = if readable_since(m, SchemaVersion::V2_1_0) {
            boolean_or(element, "caseSensitive", true)?
        } else {
            true
        };

        Ok(MapEntry {
            map_key,
            mapped_value: required_float(element, "mappedValue")?,
            case_sensitive,
        }
        .into())
    }
}

/// Identifier, cardinality and base type shared by declarations
fn read_declaration_header(element: &Element) -> Result<(String, Cardinality, Option<BaseType>)> {
    let identifier = required_identifier(element, "identifier")?;
    let cardinality: Cardinality = required_enum(element, "cardinality")?;
    let base_type = optional_enum::<BaseType>(element, "baseType")?;
    if base_type.is_none() && cardinality != Cardinality::Record {
        return Err(Error::unmarshalling(format!(
            "The mandatory 'baseType' attribute is missing from the '{}' element.",
            element.local_name()
        )));
    }
    Ok((identifier, cardinality, base_type))
}

fn write_declaration_header(
    element: &mut Element,
    identifier: &str,
    cardinality: Cardinality,
    base_type: Option<BaseType>,
) {
    element.set_attribute("identifier", identifier);
    element.set_attribute("cardinality", cardinality.as_str());
    if let Some(bt) = base_type {
        element.set_attribute("baseType", bt.as_str());
    }
}

fn declaration_context(cardinality: Cardinality, base_type: Option<BaseType>) -> MarshallingContext {
    MarshallingContext {
        base_type,
        cardinality: Some(cardinality),
    }
}

/// Children of a declaration, typed by its header
#[derive(Default)]
struct DeclarationChildren {
    default_value: Option<DefaultValue>,
    correct_response: Option<CorrectResponse>,
    mapping: Option<Mapping>,
}

fn read_declaration_children(
    m: &Marshaller<'_>,
    element: &Element,
    context: MarshallingContext,
    allowed: &[QtiClass],
) -> Result<DeclarationChildren> {
    let mut children = DeclarationChildren::default();
    for node in &element.children {
        let Node::Element(child) = node else { continue };
        let class = QtiClass::from_name(child.local_name());
        if !class.map_or(false, |c| allowed.contains(&c)) {
            return Err(Error::unmarshalling(format!(
                "The '{}' element cannot contain '{}' elements.",
                element.local_name(),
                child.local_name()
            )));
        }

        match m.unmarshall_child_with(node, context)? {
            Component::DefaultValue(v) => children.default_value = Some(v),
            Component::CorrectResponse(v) => children.correct_response = Some(v),
            Component::Mapping(v) => children.mapping = Some(v),
            other => {
                return Err(Error::unmarshalling(format!(
                    "The '{}' element cannot contain '{}' elements.",
                    element.local_name(),
                    other.qti_class_name()
                )))
            }
        }
    }
    Ok(children)
}

fn append_with_context<T>(
    m: &Marshaller<'_>,
    element: &mut Element,
    child: Option<&T>,
    context: MarshallingContext,
) -> Result<()>
where
    T: Clone + Into<Component>,
{
    if let Some(c) = child {
        let component: Component = c.clone().into();
        element.append_child(m.marshall_child_with(&component, context)?);
    }
    Ok(())
}

/// `responseDeclaration`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDeclarationMarshaller;

impl ElementMarshaller for ResponseDeclarationMarshaller {
    fn name(&self) -> &'static str {
        "ResponseDeclarationMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ResponseDeclaration
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ResponseDeclaration(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_declaration_header(&mut element, &c.identifier, c.cardinality, c.base_type);
        let context = declaration_context(c.cardinality, c.base_type);
        append_with_context(m, &mut element, c.default_value.as_ref(), context)?;
        append_with_context(m, &mut element, c.correct_response.as_ref(), context)?;
        append_with_context(m, &mut element, c.mapping.as_ref(), context)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (identifier, cardinality, base_type) = read_declaration_header(element)?;
        let children = read_declaration_children(
            m,
            element,
            declaration_context(cardinality, base_type),
            &[QtiClass::DefaultValue, QtiClass::CorrectResponse, QtiClass::Mapping],
        )?;

        Ok(ResponseDeclaration {
            identifier,
            cardinality,
            base_type,
            default_value: children.default_value,
            correct_response: children.correct_response,
            mapping: children.mapping,
        }
        .into())
    }
}

/// `outcomeDeclaration`
#[derive(Debug, Clone, Copy, Default)]
pub struct OutcomeDeclarationMarshaller;

impl ElementMarshaller for OutcomeDeclarationMarshaller {
    fn name(&self) -> &'static str {
        "OutcomeDeclarationMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::OutcomeDeclaration
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::OutcomeDeclaration(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_declaration_header(&mut element, &c.identifier, c.cardinality, c.base_type);
        set_list(&mut element, "view", &c.views);
        set_optional(&mut element, "interpretation", c.interpretation.as_ref());
        set_optional(&mut element, "longInterpretation", c.long_interpretation.as_ref());
        set_optional(&mut element, "normalMaximum", c.normal_maximum.as_ref());
        if writable_since(m, SchemaVersion::V2_1_0, "normalMinimum", c.normal_minimum.is_some()) {
            set_optional(&mut element, "normalMinimum", c.normal_minimum.as_ref());
        }
        if writable_since(m, SchemaVersion::V2_1_0, "masteryValue", c.mastery_value.is_some()) {
            set_optional(&mut element, "masteryValue", c.mastery_value.as_ref());
        }
        if writable_since(m, SchemaVersion::V2_2_0, "externalScored", c.external_scored.is_some()) {
            set_optional(&mut element, "externalScored", c.external_scored.as_ref());
        }
        let context = declaration_context(c.cardinality, c.base_type);
        append_with_context(m, &mut element, c.default_value.as_ref(), context)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (identifier, cardinality, base_type) = read_declaration_header(element)?;
        let mut declaration = OutcomeDeclaration::new(identifier, cardinality, base_type);
        declaration.views = enum_list::<View>(element, "view")?;
        declaration.interpretation = optional_string(element, "interpretation");
        declaration.long_interpretation = optional_string(element, "longInterpretation");
        declaration.normal_maximum = optional_float(element, "normalMaximum")?;
        if readable_since(m, SchemaVersion::V2_1_0) {
            declaration.normal_minimum = optional_float(element, "normalMinimum")?;
            declaration.mastery_value = optional_float(element, "masteryValue")?;
        }
        if readable_since(m, SchemaVersion::V2_2_0) {
            declaration.external_scored = optional_enum::<ExternalScored>(element, "externalScored")?;
        }

        let children = read_declaration_children(
            m,
            element,
            declaration_context(cardinality, base_type),
            &[QtiClass::DefaultValue],
        )?;
        declaration.default_value = children.default_value;
        Ok(declaration.into())
    }
}

/// `templateDeclaration`
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDeclarationMarshaller;

impl ElementMarshaller for TemplateDeclarationMarshaller {
    fn name(&self) -> &'static str {
        "TemplateDeclarationMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::TemplateDeclaration
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::TemplateDeclaration(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_declaration_header(&mut element, &c.identifier, c.cardinality, c.base_type);
        set_boolean_unless(&mut element, "paramVariable", c.param_variable, false);
        set_boolean_unless(&mut element, "mathVariable", c.math_variable, false);
        let context = declaration_context(c.cardinality, c.base_type);
        append_with_context(m, &mut element, c.default_value.as_ref(), context)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (identifier, cardinality, base_type) = read_declaration_header(element)?;
        let mut declaration = TemplateDeclaration::new(identifier, cardinality, base_type);
        declaration.param_variable = boolean_or(element, "paramVariable", false)?;
        declaration.math_variable = boolean_or(element, "mathVariable", false)?;

        let children = read_declaration_children(
            m,
            element,
            declaration_context(cardinality, base_type),
            &[QtiClass::DefaultValue],
        )?;
        declaration.default_value = children.default_value;
        Ok(declaration.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::datatypes::{BaseType, Cardinality, QtiValue};
    use crate::documents::Element;
    use crate::factory::MarshallerFactory;
    use crate::marshallers::MarshallingContext;
    use crate::model::*;
    use crate::version::SchemaVersion;

    fn unmarshall_with(version: SchemaVersion, xml: &str, context: MarshallingContext) -> crate::Result<Component> {
        let factory = MarshallerFactory::new(version);
        let element = Element::parse(xml)?;
        factory.create_marshaller(&element, context)?.unmarshall_element(&element)
    }

    #[test]
    fn test_correct_response_with_context() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<correctResponse interpretation="My Interpretation"><value>25</value></correctResponse>"#,
            MarshallingContext::new().with_base_type(BaseType::Integer),
        )
        .unwrap();

        let response = CorrectResponse::try_from(component).unwrap();
        assert_eq!(response.interpretation.as_deref(), Some("My Interpretation"));
        assert_eq!(response.values.len(), 1);
        assert_eq!(response.values[0].base_type(), BaseType::Integer);
        assert_eq!(response.values[0].value, QtiValue::Integer(25));
        assert!(!response.values[0].is_part_of_record());
    }

    #[test]
    fn test_value_without_context_is_string() {
        let component =
            unmarshall_with(SchemaVersion::V2_1_0, "<value>25</value>", MarshallingContext::default()).unwrap();
        let value = Value::try_from(component).unwrap();
        assert_eq!(value.value, QtiValue::String("25".to_string()));
    }

    #[test]
    fn test_map_entry_requires_context() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<mapEntry mapKey="A" mappedValue="1"/>"#,
            MarshallingContext::default(),
        )
        .unwrap_err();
        assert!(err.message().contains("without the base type"));
    }

    #[test]
    fn test_declaration_types_its_values() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
                <correctResponse><value>ChoiceA</value></correctResponse>
                <mapping defaultValue="-1"><mapEntry mapKey="ChoiceA" mappedValue="1" caseSensitive="false"/></mapping>
            </responseDeclaration>"#,
            MarshallingContext::default(),
        )
        .unwrap();

        let declaration = ResponseDeclaration::try_from(component).unwrap();
        assert_eq!(declaration.cardinality, Cardinality::Single);
        let correct = declaration.correct_response.unwrap();
        assert_eq!(correct.values[0].value, QtiValue::Identifier("ChoiceA".to_string()));
        let mapping = declaration.mapping.unwrap();
        assert_eq!(mapping.default_value, -1.0);
        assert!(!mapping.map_entries[0].case_sensitive);
    }

    #[test]
    fn test_case_sensitive_ignored_before_2_1() {
        let component = unmarshall_with(
            SchemaVersion::V2_0_0,
            r#"<mapEntry mapKey="A" mappedValue="1" caseSensitive="false"/>"#,
            MarshallingContext::new().with_base_type(BaseType::Identifier),
        )
        .unwrap();
        assert!(MapEntry::try_from(component).unwrap().case_sensitive);
    }

    #[test]
    fn test_outcome_gated_attributes() {
        let xml = r#"<outcomeDeclaration identifier="SCORE" cardinality="single" baseType="float" normalMinimum="0" externalScored="human"/>"#;

        let declaration =
            OutcomeDeclaration::try_from(unmarshall_with(SchemaVersion::V2_1_0, xml, MarshallingContext::default()).unwrap())
                .unwrap();
        assert_eq!(declaration.normal_minimum, Some(0.0));
        assert_eq!(declaration.external_scored, None);

        let declaration =
            OutcomeDeclaration::try_from(unmarshall_with(SchemaVersion::V2_2_0, xml, MarshallingContext::default()).unwrap())
                .unwrap();
        assert!(declaration.external_scored.is_some());

        let mut declaration = OutcomeDeclaration::new("SCORE", Cardinality::Single, Some(BaseType::Float));
        declaration.normal_minimum = Some(0.0);
        let component: Component = declaration.into();
        let factory = MarshallerFactory::new(SchemaVersion::V2_0_0);
        let element = factory
            .create_marshaller(&component, MarshallingContext::default())
            .unwrap()
            .marshall_element(&component)
            .unwrap();
        assert!(!element.has_attribute("normalMinimum"));
    }

    #[test]
    fn test_missing_base_type() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<outcomeDeclaration identifier="SCORE" cardinality="single"/>"#,
            MarshallingContext::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "The mandatory 'baseType' attribute is missing from the 'outcomeDeclaration' element."
        );
    }

    #[test]
    fn test_mapping_read_defaults() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<mapping><mapEntry mapKey="ChoiceA" mappedValue="2"/></mapping>"#,
            MarshallingContext::new().with_base_type(BaseType::Identifier),
        )
        .unwrap();
        let mapping = Mapping::try_from(component).unwrap();
        assert_eq!(mapping.default_value, 0.0);
        assert_eq!(mapping.lower_bound, None);
        assert_eq!(mapping.upper_bound, None);
        assert!(mapping.map_entries[0].case_sensitive);
        assert_eq!(mapping.map_entries[0].map_key, QtiValue::Identifier("ChoiceA".to_string()));
    }
}
