//! Marshaller helper functions
//!
//! Attribute coercion, content-model checks and child list handling shared
//! by all marshallers. Every error message names the element and the
//! attribute or child involved.

use std::fmt::Display;

use tracing::warn;

use crate::classes::QtiClass;
use crate::datatypes::{
    parse_boolean, parse_float, Direction, FloatOrVariableRef, IntegerOrVariableRef, QtiEnum,
    StringOrVariableRef,
};
use crate::documents::{Element, Node};
use crate::error::{Error, Result};
use crate::model::{expression_arity, BodyAttributes, Component, QtiComponent, TextRun};
use crate::names::is_valid_identifier;
use crate::version::SchemaVersion;

use super::Marshaller;

/// Direction of the conversion an error is reported for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Component to element
    Marshall,
    /// Element to component
    Unmarshall,
}

impl Phase {
    pub(crate) fn error(self, message: String) -> Error {
        match self {
            Phase::Marshall => Error::marshalling(message),
            Phase::Unmarshall => Error::unmarshalling(message),
        }
    }
}

// =============================================================================
// Attribute reading
// =============================================================================

/// A mandatory attribute
pub(crate) fn required_attribute<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element.attribute(name).ok_or_else(|| {
        Error::unmarshalling(format!(
            "The mandatory '{}' attribute is missing from the '{}' element.",
            name,
            element.local_name()
        ))
    })
}

/// An optional attribute, copied
pub(crate) fn optional_string(element: &Element, name: &str) -> Option<String> {
    element.attribute(name).map(str::to_string)
}

fn invalid_value(element: &Element, name: &str, value: &str, what: &str) -> Error {
    Error::unmarshalling(format!(
        "The value '{}' of the '{}' attribute of the '{}' element is not a valid {}.",
        value,
        name,
        element.local_name(),
        what
    ))
}

fn check_identifier(element: &Element, name: &str, value: &str) -> Result<String> {
    if is_valid_identifier(value) {
        Ok(value.to_string())
    } else {
        Err(invalid_value(element, name, value, "QTI Identifier"))
    }
}

/// A mandatory QTI identifier
pub(crate) fn required_identifier(element: &Element, name: &str) -> Result<String> {
    let value = required_attribute(element, name)?;
    check_identifier(element, name, value)
}

/// An optional QTI identifier
pub(crate) fn optional_identifier(element: &Element, name: &str) -> Result<Option<String>> {
    element
        .attribute(name)
        .map(|value| check_identifier(element, name, value))
        .transpose()
}

fn to_integer(element: &Element, name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_value(element, name, value, "integer"))
}

/// A mandatory integer
pub(crate) fn required_integer(element: &Element, name: &str) -> Result<i64> {
    let value = required_attribute(element, name)?;
    to_integer(element, name, value)
}

/// An optional integer
pub(crate) fn optional_integer(element: &Element, name: &str) -> Result<Option<i64>> {
    element
        .attribute(name)
        .map(|value| to_integer(element, name, value))
        .transpose()
}

fn to_float(element: &Element, name: &str, value: &str) -> Result<f64> {
    parse_float(value.trim()).ok_or_else(|| invalid_value(element, name, value, "float"))
}

/// A mandatory float
pub(crate) fn required_float(element: &Element, name: &str) -> Result<f64> {
    let value = required_attribute(element, name)?;
    to_float(element, name, value)
}

/// An optional float
pub(crate) fn optional_float(element: &Element, name: &str) -> Result<Option<f64>> {
    element
        .attribute(name)
        .map(|value| to_float(element, name, value))
        .transpose()
}

fn to_boolean(element: &Element, name: &str, value: &str) -> Result<bool> {
    parse_boolean(value.trim()).ok_or_else(|| invalid_value(element, name, value, "boolean"))
}

/// A mandatory boolean
pub(crate) fn required_boolean(element: &Element, name: &str) -> Result<bool> {
    let value = required_attribute(element, name)?;
    to_boolean(element, name, value)
}

/// An optional boolean with its default
pub(crate) fn boolean_or(element: &Element, name: &str, default: bool) -> Result<bool> {
    match element.attribute(name) {
        Some(value) => to_boolean(element, name, value),
        None => Ok(default),
    }
}

fn to_enum<T: QtiEnum>(element: &Element, name: &str, value: &str) -> Result<T> {
    T::from_qti_str(value.trim()).ok_or_else(|| {
        Error::unmarshalling(format!(
            "The value '{}' of the '{}' attribute of the '{}' element is not a valid value. Expected one of: {}.",
            value,
            name,
            element.local_name(),
            T::expected()
        ))
    })
}

/// A mandatory enumerated attribute
pub(crate) fn required_enum<T: QtiEnum>(element: &Element, name: &str) -> Result<T> {
    let value = required_attribute(element, name)?;
    to_enum(element, name, value)
}

/// An optional enumerated attribute
pub(crate) fn optional_enum<T: QtiEnum>(element: &Element, name: &str) -> Result<Option<T>> {
    element
        .attribute(name)
        .map(|value| to_enum(element, name, value))
        .transpose()
}

/// A space separated list of enumerated values
pub(crate) fn enum_list<T: QtiEnum>(element: &Element, name: &str) -> Result<Vec<T>> {
    match element.attribute(name) {
        Some(value) => value
            .split_whitespace()
            .map(|v| to_enum(element, name, v))
            .collect(),
        None => Ok(Vec::new()),
    }
}

/// A space separated list of identifiers
pub(crate) fn identifier_list(element: &Element, name: &str) -> Result<Vec<String>> {
    match element.attribute(name) {
        Some(value) => value
            .split_whitespace()
            .map(|v| check_identifier(element, name, v))
            .collect(),
        None => Ok(Vec::new()),
    }
}

/// An optional integer or variable reference
pub(crate) fn optional_integer_or_ref(
    element: &Element,
    name: &str,
) -> Result<Option<IntegerOrVariableRef>> {
    element
        .attribute(name)
        .map(|value| {
            IntegerOrVariableRef::parse(value)
                .ok_or_else(|| invalid_value(element, name, value, "integer or variable reference"))
        })
        .transpose()
}

/// A mandatory integer or variable reference
pub(crate) fn required_integer_or_ref(element: &Element, name: &str) -> Result<IntegerOrVariableRef> {
    let value = required_attribute(element, name)?;
    IntegerOrVariableRef::parse(value)
        .ok_or_else(|| invalid_value(element, name, value, "integer or variable reference"))
}

/// A space separated list of floats or variable references
pub(crate) fn float_or_ref_list(element: &Element, name: &str) -> Result<Vec<FloatOrVariableRef>> {
    match element.attribute(name) {
        Some(value) => value
            .split_whitespace()
            .map(|v| {
                FloatOrVariableRef::parse(v)
                    .ok_or_else(|| invalid_value(element, name, value, "float or variable reference"))
            })
            .collect(),
        None => Ok(Vec::new()),
    }
}

/// A mandatory string or variable reference
pub(crate) fn required_string_or_ref(element: &Element, name: &str) -> Result<StringOrVariableRef> {
    required_attribute(element, name).map(StringOrVariableRef::parse)
}

// =============================================================================
// Attribute writing
// =============================================================================

/// Write an attribute when a value is present
pub(crate) fn set_optional<T: Display>(element: &mut Element, name: &str, value: Option<&T>) {
    if let Some(v) = value {
        element.set_attribute(name, v.to_string());
    }
}

/// Write a boolean attribute unless it holds its default
pub(crate) fn set_boolean_unless(element: &mut Element, name: &str, value: bool, default: bool) {
    if value != default {
        element.set_attribute(name, value.to_string());
    }
}

/// Write a space separated list unless it is empty
pub(crate) fn set_list<T: Display>(element: &mut Element, name: &str, values: &[T]) {
    if !values.is_empty() {
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        element.set_attribute(name, joined);
    }
}

/// Whether an attribute introduced in `since` may be written
///
/// Logs a warning when a value is set but the bound version predates the
/// attribute; the value is then not written.
pub(crate) fn writable_since(
    m: &Marshaller<'_>,
    since: SchemaVersion,
    attribute: &str,
    is_set: bool,
) -> bool {
    if m.version() >= since {
        return true;
    }
    if is_set {
        warn!(
            element = m.expected_qti_class_name(),
            attribute,
            version = %m.version(),
            "attribute not supported before QTI {}, value dropped",
            since
        );
    }
    false
}

/// Whether an attribute introduced in `since` is read in the bound version
pub(crate) fn readable_since(m: &Marshaller<'_>, since: SchemaVersion) -> bool {
    m.version() >= since
}

// =============================================================================
// Body element attributes
// =============================================================================

/// Read `id`, `class`, `xml:lang`, `label` and (2.2) `dir`
pub(crate) fn read_body_attributes(m: &Marshaller<'_>, element: &Element) -> Result<BodyAttributes> {
    let dir = if readable_since(m, SchemaVersion::V2_2_0) {
        optional_enum::<Direction>(element, "dir")?
    } else {
        None
    };

    Ok(BodyAttributes {
        id: optional_string(element, "id"),
        classes: element
            .attribute("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        lang: optional_string(element, "xml:lang"),
        label: optional_string(element, "label"),
        dir,
    })
}

/// Write the common body attributes
pub(crate) fn write_body_attributes(m: &Marshaller<'_>, element: &mut Element, attributes: &BodyAttributes) {
    set_optional(element, "id", attributes.id.as_ref());
    set_list(element, "class", &attributes.classes);
    set_optional(element, "xml:lang", attributes.lang.as_ref());
    set_optional(element, "label", attributes.label.as_ref());
    if writable_since(m, SchemaVersion::V2_2_0, "dir", attributes.dir.is_some()) {
        set_optional(element, "dir", attributes.dir.as_ref());
    }
}

// =============================================================================
// Children
// =============================================================================

/// Allowed content of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentModel {
    /// Inline elements and text
    Inline,
    /// Block elements
    Block,
    /// Inline and block content
    Flow,
}

impl ContentModel {
    pub(crate) fn accepts(self, class: QtiClass) -> bool {
        match self {
            ContentModel::Inline => class.is_inline(),
            ContentModel::Block => class.is_block(),
            ContentModel::Flow => class.is_inline() || class.is_block(),
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ContentModel::Inline => "inline",
            ContentModel::Block => "block",
            ContentModel::Flow => "flow",
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Unmarshall the child nodes of a body element
///
/// Comments are skipped. Blank text is skipped in block containers, where
/// it is only indentation.
pub(crate) fn unmarshall_content(
    m: &Marshaller<'_>,
    element: &Element,
    model: ContentModel,
) -> Result<Vec<Component>> {
    let mut content = Vec::new();
    for node in &element.children {
        match node {
            Node::Element(_) => content.push(m.unmarshall_child(node)?),
            Node::Text(t) if model == ContentModel::Block && is_blank(t) => {}
            Node::Text(t) => content.push(Component::TextRun(TextRun::new(t.clone()))),
            Node::Comment(_) => {}
        }
    }
    Ok(content)
}

/// Unmarshall child elements only, ignoring text and comments
pub(crate) fn unmarshall_child_elements(m: &Marshaller<'_>, element: &Element) -> Result<Vec<Component>> {
    element
        .children
        .iter()
        .filter(|n| matches!(n, Node::Element(_)))
        .map(|n| m.unmarshall_child(n))
        .collect()
}

/// Reject children outside a content model
pub(crate) fn check_content(
    phase: Phase,
    parent: QtiClass,
    model: ContentModel,
    content: &[Component],
) -> Result<()> {
    for child in content {
        let class = child.qti_class();
        if !model.accepts(class) {
            return Err(phase.error(format!(
                "The '{}' element cannot contain '{}' elements: only {} content is allowed.",
                parent,
                class,
                model.as_str()
            )));
        }
    }
    Ok(())
}

/// Reject a child class outside a fixed set
pub(crate) fn check_child_classes(
    phase: Phase,
    parent: QtiClass,
    allowed: &[QtiClass],
    content: &[Component],
) -> Result<()> {
    for child in content {
        let class = child.qti_class();
        if !allowed.contains(&class) {
            let names = allowed
                .iter()
                .map(|c| format!("'{}'", c))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(phase.error(format!(
                "The '{}' element cannot contain '{}' elements: only {} elements are allowed.",
                parent, class, names
            )));
        }
    }
    Ok(())
}

/// Marshall children and append them in order
pub(crate) fn append_children(m: &Marshaller<'_>, element: &mut Element, content: &[Component]) -> Result<()> {
    for child in content {
        element.append_child(m.marshall_child(child)?);
    }
    Ok(())
}

/// Marshall a typed child and append it
pub(crate) fn append_typed<T>(m: &Marshaller<'_>, element: &mut Element, child: &T) -> Result<()>
where
    T: Clone + Into<Component>,
{
    let component: Component = child.clone().into();
    element.append_child(m.marshall_child(&component)?);
    Ok(())
}

/// Narrow an unmarshalled child to its payload type
pub(crate) fn expect_typed<T>(parent: &Element, child: Component) -> Result<T>
where
    T: TryFrom<Component, Error = Component>,
{
    T::try_from(child).map_err(|other| misplaced_child(parent, &other))
}

/// Error for a child element that is allowed in `parent` but not where it appears
pub(crate) fn misplaced_child(parent: &Element, child: &Component) -> Error {
    Error::unmarshalling(format!(
        "The '{}' element cannot contain '{}' elements at this position.",
        parent.local_name(),
        child.qti_class_name()
    ))
}

/// Error for a component whose payload this marshaller does not handle
pub(crate) fn unexpected_component(m: &Marshaller<'_>, component: &Component) -> Error {
    Error::marshalling(format!(
        "The '{}' marshaller cannot marshall '{}' components.",
        m.name(),
        component.qti_class_name()
    ))
}

/// Count message fragment, "none" for zero
pub(crate) fn count_given(count: usize) -> String {
    if count == 0 {
        "none".to_string()
    } else {
        count.to_string()
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// Check the number of sub-expressions of an operator
pub(crate) fn check_arity(phase: Phase, class: QtiClass, count: usize) -> Result<()> {
    match expression_arity(class) {
        Some(arity) if !arity.accepts(count) => Err(phase.error(format!(
            "The '{}' element must contain {}, {} given.",
            class,
            arity.describe(),
            count_given(count)
        ))),
        _ => Ok(()),
    }
}

/// Unmarshall the sub-expressions of an operator, checking kind and arity
pub(crate) fn unmarshall_expressions(m: &Marshaller<'_>, element: &Element) -> Result<Vec<Component>> {
    let expressions = unmarshall_child_elements(m, element)?;
    for e in &expressions {
        if !e.qti_class().is_expression() {
            return Err(Error::unmarshalling(format!(
                "The '{}' element cannot contain '{}' elements: only expressions are allowed.",
                element.local_name(),
                e.qti_class_name()
            )));
        }
    }
    check_arity(Phase::Unmarshall, m.qti_class(), expressions.len())?;
    Ok(expressions)
}

/// Check and append the sub-expressions of an operator
pub(crate) fn append_expressions(
    m: &Marshaller<'_>,
    element: &mut Element,
    expressions: &[Component],
) -> Result<()> {
    check_arity(Phase::Marshall, m.qti_class(), expressions.len())?;
    append_children(m, element, expressions)
}

/// Unmarshall the single expression an element wraps
pub(crate) fn unmarshall_single_expression(m: &Marshaller<'_>, element: &Element) -> Result<Component> {
    let mut expressions = unmarshall_child_elements(m, element)?;
    if expressions.len() != 1 {
        return Err(Error::unmarshalling(format!(
            "A '{}' element must contain exactly one expression, {} given.",
            element.local_name(),
            count_given(expressions.len())
        )));
    }
    let expression = expressions.remove(0);
    if !expression.qti_class().is_expression() {
        return Err(Error::unmarshalling(format!(
            "The '{}' element cannot contain '{}' elements: only expressions are allowed.",
            element.local_name(),
            expression.qti_class_name()
        )));
    }
    Ok(expression)
}

/// Reject children that are not response rules
pub(crate) fn check_response_rules(phase: Phase, parent: QtiClass, rules: &[Component]) -> Result<()> {
    for rule in rules {
        if !rule.qti_class().is_response_rule() {
            return Err(phase.error(format!(
                "The '{}' element cannot contain '{}' elements: only response rules are allowed.",
                parent,
                rule.qti_class_name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{QtiValue, ShowHide};
    use crate::model::BaseValue;

    #[test]
    fn test_missing_attribute_message() {
        let e = Element::parse(r#"<drawingInteraction id="d"/>"#).unwrap();
        let err = required_attribute(&e, "responseIdentifier").unwrap_err();
        assert_eq!(
            err.message(),
            "The mandatory 'responseIdentifier' attribute is missing from the 'drawingInteraction' element."
        );
    }

    #[test]
    fn test_identifier_validation_message() {
        let e = Element::parse(r#"<weight identifier="999" value="3.45"/>"#).unwrap();
        let err = required_identifier(&e, "identifier").unwrap_err();
        assert_eq!(
            err.message(),
            "The value '999' of the 'identifier' attribute of the 'weight' element is not a valid QTI Identifier."
        );
        assert_eq!(required_float(&e, "value").unwrap(), 3.45);
    }

    #[test]
    fn test_coercion_failures() {
        let e = Element::parse(r#"<x n="abc" b="yes" s="maybe"/>"#).unwrap();
        assert!(required_integer(&e, "n").unwrap_err().message().contains("not a valid integer"));
        assert!(boolean_or(&e, "b", false).is_err());
        let err = optional_enum::<ShowHide>(&e, "s").unwrap_err();
        assert!(err.message().contains("Expected one of: show, hide"));
        assert_eq!(boolean_or(&e, "missing", true).unwrap(), true);
        assert_eq!(optional_integer(&e, "missing").unwrap(), None);
    }

    #[test]
    fn test_arity_messages() {
        let err = check_arity(Phase::Unmarshall, QtiClass::Subtract, 3).unwrap_err();
        assert_eq!(err.message(), "The 'subtract' element must contain exactly 2 sub-expressions, 3 given.");
        assert!(matches!(err, Error::Unmarshalling(_)));

        let err = check_arity(Phase::Marshall, QtiClass::Sum, 0).unwrap_err();
        assert_eq!(err.message(), "The 'sum' element must contain at least 1 sub-expression, none given.");
        assert!(matches!(err, Error::Marshalling(_)));
    }

    #[test]
    fn test_content_model_message() {
        let content = vec![Component::text("a"), BaseValue::new(QtiValue::Integer(1)).into()];
        let err = check_content(Phase::Unmarshall, QtiClass::TemplateInline, ContentModel::Inline, &content)
            .unwrap_err();
        assert_eq!(
            err.message(),
            "The 'templateInline' element cannot contain 'baseValue' elements: only inline content is allowed."
        );
    }

    #[test]
    fn test_lists() {
        let mut e = Element::parse("<x/>").unwrap();
        set_list(&mut e, "category", &["a", "b"]);
        assert_eq!(e.attribute("category"), Some("a b"));
        assert_eq!(identifier_list(&e, "category").unwrap(), vec!["a", "b"]);
        set_list::<String>(&mut e, "empty", &[]);
        assert!(!e.has_attribute("empty"));
    }
}
