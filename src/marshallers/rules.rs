//! Response processing marshallers

use crate::classes::QtiClass;
use crate::documents::{Element, Node};
use crate::error::{Error, Result};
use crate::model::{
    Component, ExitResponse, LookupOutcomeValue, QtiComponent, ResponseCondition, ResponseElse,
    ResponseElseIf, ResponseIf, ResponseProcessing, SetOutcomeValue,
};

use super::helpers::*;
use super::{ElementMarshaller, Marshaller};

/// `responseProcessing`
///
/// Either references a template or carries its own rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseProcessingMarshaller;

impl ElementMarshaller for ResponseProcessingMarshaller {
    fn name(&self) -> &'static str {
        "ResponseProcessingMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ResponseProcessing
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ResponseProcessing(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_response_rules(Phase::Marshall, QtiClass::ResponseProcessing, &c.response_rules)?;
        let mut element = m.new_element();
        set_optional(&mut element, "template", c.template.as_ref());
        set_optional(&mut element, "templateLocation", c.template_location.as_ref());
        append_children(m, &mut element, &c.response_rules)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let response_rules = unmarshall_child_elements(m, element)?;
        check_response_rules(Phase::Unmarshall, QtiClass::ResponseProcessing, &response_rules)?;
        Ok(ResponseProcessing {
            template: optional_string(element, "template"),
            template_location: optional_string(element, "templateLocation"),
            response_rules,
        }
        .into())
    }
}

/// Split a branch element into its condition and its rules
fn unmarshall_branch(m: &Marshaller<'_>, element: &Element) -> Result<(Component, Vec<Component>)> {
    let mut children = unmarshall_child_elements(m, element)?;
    if children.is_empty() || !children[0].qti_class().is_expression() {
        return Err(Error::unmarshalling(format!(
            "A '{}' element must contain an expression as its first child.",
            element.local_name()
        )));
    }
    let expression = children.remove(0);
    check_response_rules(Phase::Unmarshall, m.qti_class(), &children)?;
    Ok((expression, children))
}

fn marshall_branch(
    m: &Marshaller<'_>,
    expression: &Component,
    rules: &[Component],
) -> Result<Element> {
    if !expression.qti_class().is_expression() {
        return Err(Error::marshalling(format!(
            "The condition of a '{}' element must be an expression, '{}' given.",
            m.expected_qti_class_name(),
            expression.qti_class_name()
        )));
    }
    check_response_rules(Phase::Marshall, m.qti_class(), rules)?;
    let mut element = m.new_element();
    element.append_child(m.marshall_child(expression)?);
    append_children(m, &mut element, rules)?;
    Ok(element)
}

/// `responseCondition`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseConditionMarshaller;

impl ElementMarshaller for ResponseConditionMarshaller {
    fn name(&self) -> &'static str {
        "ResponseConditionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ResponseCondition
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ResponseCondition(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        append_typed(m, &mut element, &c.response_if)?;
        for else_if in &c.response_else_ifs {
            append_typed(m, &mut element, else_if)?;
        }
        if let Some(response_else) = &c.response_else {
            append_typed(m, &mut element, response_else)?;
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let mut children = unmarshall_child_elements(m, element)?.into_iter();

        let response_if = match children.next() {
            Some(Component::ResponseIf(c)) => c,
            _ => {
                return Err(Error::unmarshalling(
                    "A 'responseCondition' element must contain a 'responseIf' element as its first child.",
                ))
            }
        };

        let mut condition = ResponseCondition::new(response_if);
        for child in children {
            if condition.response_else.is_some() {
                return Err(Error::unmarshalling(
                    "The 'responseElse' element must be the last child of a 'responseCondition' element.",
                ));
            }
            match child {
                Component::ResponseElseIf(c) => condition.response_else_ifs.push(c),
                Component::ResponseElse(c) => condition.response_else = Some(c),
                other => {
                    return Err(Error::unmarshalling(format!(
                        "The 'responseCondition' element cannot contain '{}' elements at this position.",
                        other.qti_class_name()
                    )))
                }
            }
        }
        Ok(condition.into())
    }
}

/// `responseIf`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseIfMarshaller;

impl ElementMarshaller for ResponseIfMarshaller {
    fn name(&self) -> &'static str {
        "ResponseIfMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ResponseIf
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ResponseIf(c) = component else {
            return Err(unexpected_component(m, component));
        };
        marshall_branch(m, &c.expression, &c.response_rules)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (expression, response_rules) = unmarshall_branch(m, element)?;
        Ok(ResponseIf::new(expression, response_rules).into())
    }
}

/// `responseElseIf`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseElseIfMarshaller;

impl ElementMarshaller for ResponseElseIfMarshaller {
    fn name(&self) -> &'static str {
        "ResponseElseIfMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ResponseElseIf
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ResponseElseIf(c) = component else {
            return Err(unexpected_component(m, component));
        };
        marshall_branch(m, &c.expression, &c.response_rules)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (expression, response_rules) = unmarshall_branch(m, element)?;
        Ok(ResponseElseIf::new(expression, response_rules).into())
    }
}

/// `responseElse`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseElseMarshaller;

impl ElementMarshaller for ResponseElseMarshaller {
    fn name(&self) -> &'static str {
        "ResponseElseMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ResponseElse
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ResponseElse(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_response_rules(Phase::Marshall, QtiClass::ResponseElse, &c.response_rules)?;
        let mut element = m.new_element();
        append_children(m, &mut element, &c.response_rules)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let response_rules = unmarshall_child_elements(m, element)?;
        check_response_rules(Phase::Unmarshall, QtiClass::ResponseElse, &response_rules)?;
        Ok(ResponseElse { response_rules }.into())
    }
}

fn marshall_outcome_rule(m: &Marshaller<'_>, identifier: &str, expression: &Component) -> Result<Element> {
    if !expression.qti_class().is_expression() {
        return Err(Error::marshalling(format!(
            "A '{}' element must contain exactly one expression, '{}' given.",
            m.expected_qti_class_name(),
            expression.qti_class_name()
        )));
    }
    let mut element = m.new_element().with_attribute("identifier", identifier);
    element.append_child(m.marshall_child(expression)?);
    Ok(element)
}

/// `setOutcomeValue`
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOutcomeValueMarshaller;

impl ElementMarshaller for SetOutcomeValueMarshaller {
    fn name(&self) -> &'static str {
        "SetOutcomeValueMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::SetOutcomeValue
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::SetOutcomeValue(c) = component else {
            return Err(unexpected_component(m, component));
        };
        marshall_outcome_rule(m, &c.identifier, &c.expression)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let identifier = required_identifier(element, "identifier")?;
        Ok(SetOutcomeValue::new(identifier, unmarshall_single_expression(m, element)?).into())
    }
}

/// `lookupOutcomeValue`
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupOutcomeValueMarshaller;

impl ElementMarshaller for LookupOutcomeValueMarshaller {
    fn name(&self) -> &'static str {
        "LookupOutcomeValueMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::LookupOutcomeValue
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::LookupOutcomeValue(c) = component else {
            return Err(unexpected_component(m, component));
        };
        marshall_outcome_rule(m, &c.identifier, &c.expression)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let identifier = required_identifier(element, "identifier")?;
        Ok(LookupOutcomeValue::new(identifier, unmarshall_single_expression(m, element)?).into())
    }
}

/// `exitResponse`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitResponseMarshaller;

impl ElementMarshaller for ExitResponseMarshaller {
    fn name(&self) -> &'static str {
        "ExitResponseMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ExitResponse
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ExitResponse(_) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(m.new_element())
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        if element.children.iter().any(|n| matches!(n, Node::Element(_))) {
            return Err(Error::unmarshalling("The 'exitResponse' element must be empty."));
        }
        Ok(ExitResponse.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::datatypes::QtiValue;
    use crate::documents::Element;
    use crate::factory::MarshallerFactory;
    use crate::marshallers::MarshallingContext;
    use crate::model::*;
    use crate::version::SchemaVersion;

    fn unmarshall(xml: &str) -> crate::Result<Component> {
        let factory = MarshallerFactory::new(SchemaVersion::V2_1_0);
        let element = Element::parse(xml)?;
        factory
            .create_marshaller(&element, MarshallingContext::default())?
            .unmarshall_element(&element)
    }

    #[test]
    fn test_response_condition() {
        let component = unmarshall(
            r#"<responseCondition>
                <responseIf>
                    <match><variable identifier="RESPONSE"/><correct identifier="RESPONSE"/></match>
                    <setOutcomeValue identifier="SCORE"><baseValue baseType="float">1</baseValue></setOutcomeValue>
                </responseIf>
                <responseElseIf>
                    <isNull><variable identifier="RESPONSE"/></isNull>
                    <exitResponse/>
                </responseElseIf>
                <responseElse>
                    <setOutcomeValue identifier="SCORE"><baseValue baseType="float">0</baseValue></setOutcomeValue>
                </responseElse>
            </responseCondition>"#,
        )
        .unwrap();

        let condition = ResponseCondition::try_from(component).unwrap();
        assert_eq!(condition.response_if.expression.qti_class_name(), "match");
        assert_eq!(condition.response_if.response_rules.len(), 1);
        assert_eq!(condition.response_else_ifs.len(), 1);
        assert_eq!(
            condition.response_else_ifs[0].response_rules,
            vec![Component::ExitResponse(ExitResponse)]
        );
        let response_else = condition.response_else.unwrap();
        assert_eq!(
            response_else.response_rules,
            vec![SetOutcomeValue::new("SCORE", BaseValue::new(QtiValue::Float(0.0))).into()]
        );
    }

    #[test]
    fn test_condition_requires_response_if() {
        let err = unmarshall(r#"<responseCondition><responseElse/></responseCondition>"#).unwrap_err();
        assert!(err.message().contains("'responseIf' element as its first child"));
    }

    #[test]
    fn test_else_must_be_last() {
        let err = unmarshall(
            r#"<responseCondition>
                <responseIf><null/></responseIf>
                <responseElse/>
                <responseElseIf><null/></responseElseIf>
            </responseCondition>"#,
        )
        .unwrap_err();
        assert!(err.message().contains("must be the last child"));
    }

    #[test]
    fn test_set_outcome_value_single_expression() {
        let err = unmarshall(r#"<setOutcomeValue identifier="SCORE"/>"#).unwrap_err();
        assert_eq!(
            err.message(),
            "A 'setOutcomeValue' element must contain exactly one expression, none given."
        );
    }

    #[test]
    fn test_template_processing() {
        let component = unmarshall(
            r#"<responseProcessing template="http://www.imsglobal.org/question/qti_v2p1/rptemplates/match_correct"/>"#,
        )
        .unwrap();
        let processing = ResponseProcessing::try_from(component).unwrap();
        assert!(processing.template.unwrap().ends_with("match_correct"));
        assert!(processing.response_rules.is_empty());
    }

    #[test]
    fn test_marshall_rejects_non_rule() {
        let processing: Component = ResponseProcessing::new(vec![Null.into()]).into();
        let factory = MarshallerFactory::new(SchemaVersion::V2_1_0);
        let err = factory
            .create_marshaller(&processing, MarshallingContext::default())
            .unwrap()
            .marshall(&processing)
            .unwrap_err();
        assert!(err.message().contains("only response rules are allowed"));
    }
}
