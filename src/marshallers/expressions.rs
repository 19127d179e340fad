//! Expression marshallers

use crate::classes::QtiClass;
use crate::datatypes::{
    BaseType, IntegerOrVariableRef, MathConstantName, QtiEnum, QtiValue, RoundingMode,
    ToleranceMode,
};
use crate::documents::{Element, Node};
use crate::error::{Error, Result};
use crate::model::{
    AnyN, BaseValue, Component, Correct, DefaultExpression, Equal, EqualRounded, Index,
    MathConstant, Null, Operator, OperatorKind, PatternMatch, RandomInteger, Repeat, RoundTo,
    StringMatch, Variable,
};

use super::helpers::*;
use super::{ElementMarshaller, Marshaller};

/// `baseValue`
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseValueMarshaller;

impl ElementMarshaller for BaseValueMarshaller {
    fn name(&self) -> &'static str {
        "BaseValueMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::BaseValue
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::BaseValue(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(m.new_element()
            .with_attribute("baseType", c.base_type().as_str())
            .with_child(Node::text(c.value.to_string())))
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let base_type: BaseType = required_enum(element, "baseType")?;
        let text = element.text();
        let value = QtiValue::parse(base_type, &text).ok_or_else(|| {
            Error::unmarshalling(format!(
                "The value '{}' of the 'baseValue' element is not a valid {} value.",
                text, base_type
            ))
        })?;
        Ok(BaseValue::new(value).into())
    }
}

/// `variable`
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableMarshaller;

impl ElementMarshaller for VariableMarshaller {
    fn name(&self) -> &'static str {
        "VariableMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Variable
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Variable(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element().with_attribute("identifier", c.identifier.as_str());
        set_optional(&mut element, "weightIdentifier", c.weight_identifier.as_ref());
        Ok(element)
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Variable {
            identifier: required_identifier(element, "identifier")?,
            weight_identifier: optional_identifier(element, "weightIdentifier")?,
        }
        .into())
    }
}

/// `correct`
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrectMarshaller;

impl ElementMarshaller for CorrectMarshaller {
    fn name(&self) -> &'static str {
        "CorrectMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Correct
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Correct(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(m.new_element().with_attribute("identifier", c.identifier.as_str()))
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Correct {
            identifier: required_identifier(element, "identifier")?,
        }
        .into())
    }
}

/// `default`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMarshaller;

impl ElementMarshaller for DefaultMarshaller {
    fn name(&self) -> &'static str {
        "DefaultMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Default
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Default(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(m.new_element().with_attribute("identifier", c.identifier.as_str()))
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(DefaultExpression {
            identifier: required_identifier(element, "identifier")?,
        }
        .into())
    }
}

/// `null`
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMarshaller;

impl ElementMarshaller for NullMarshaller {
    fn name(&self) -> &'static str {
        "NullMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Null
    }

    fn marshall_element(&self, m: &Marshaller<'_>, _component: &Component) -> Result<Element> {
        Ok(m.new_element())
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, _element: &Element) -> Result<Component> {
        Ok(Null.into())
    }
}

/// `randomInteger`
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIntegerMarshaller;

impl ElementMarshaller for RandomIntegerMarshaller {
    fn name(&self) -> &'static str {
        "RandomIntegerMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::RandomInteger
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::RandomInteger(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        if c.min != IntegerOrVariableRef::Integer(0) {
            element.set_attribute("min", c.min.to_string());
        }
        element.set_attribute("max", c.max.to_string());
        if c.step != IntegerOrVariableRef::Integer(1) {
            element.set_attribute("step", c.step.to_string());
        }
        Ok(element)
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(RandomInteger {
            min: optional_integer_or_ref(element, "min")?.unwrap_or(IntegerOrVariableRef::Integer(0)),
            max: required_integer_or_ref(element, "max")?,
            step: optional_integer_or_ref(element, "step")?.unwrap_or(IntegerOrVariableRef::Integer(1)),
        }
        .into())
    }
}

/// `mathConstant`
#[derive(Debug, Clone, Copy, Default)]
pub struct MathConstantMarshaller;

impl ElementMarshaller for MathConstantMarshaller {
    fn name(&self) -> &'static str {
        "MathConstantMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::MathConstant
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::MathConstant(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(m.new_element().with_attribute("name", c.name.as_str()))
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let name: MathConstantName = required_enum(element, "name")?;
        Ok(MathConstant { name }.into())
    }
}

/// `anyN`
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyNMarshaller;

impl ElementMarshaller for AnyNMarshaller {
    fn name(&self) -> &'static str {
        "AnyNMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::AnyN
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::AnyN(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m
            .new_element()
            .with_attribute("min", c.min.to_string())
            .with_attribute("max", c.max.to_string());
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let min = required_integer_or_ref(element, "min")?;
        let max = required_integer_or_ref(element, "max")?;
        let expressions = unmarshall_expressions(m, element)?;
        Ok(AnyN { min, max, expressions }.into())
    }
}

/// `equal`
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualMarshaller;

impl EqualMarshaller {
    fn missing_tolerance(mode: ToleranceMode) -> String {
        format!(
            "The 'tolerance' attribute must be set when the 'toleranceMode' attribute of the 'equal' element is '{}'.",
            mode
        )
    }
}

impl ElementMarshaller for EqualMarshaller {
    fn name(&self) -> &'static str {
        "EqualMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Equal
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Equal(c) = component else {
            return Err(unexpected_component(m, component));
        };
        if c.tolerance_mode != ToleranceMode::Exact && c.tolerance.is_empty() {
            return Err(Error::marshalling(Self::missing_tolerance(c.tolerance_mode)));
        }

        let mut element = m.new_element();
        if c.tolerance_mode != ToleranceMode::Exact {
            element.set_attribute("toleranceMode", c.tolerance_mode.as_str());
        }
        set_list(&mut element, "tolerance", &c.tolerance);
        set_boolean_unless(&mut element, "includeLowerBound", c.include_lower_bound, true);
        set_boolean_unless(&mut element, "includeUpperBound", c.include_upper_bound, true);
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let tolerance_mode = optional_enum(element, "toleranceMode")?.unwrap_or_default();
        let tolerance = float_or_ref_list(element, "tolerance")?;
        if tolerance_mode != ToleranceMode::Exact && tolerance.is_empty() {
            return Err(Error::unmarshalling(Self::missing_tolerance(tolerance_mode)));
        }
        if tolerance.len() > 2 {
            return Err(Error::unmarshalling(format!(
                "The 'tolerance' attribute of the 'equal' element must contain 1 or 2 values, {} given.",
                tolerance.len()
            )));
        }

        Ok(Equal {
            tolerance_mode,
            tolerance,
            include_lower_bound: boolean_or(element, "includeLowerBound", true)?,
            include_upper_bound: boolean_or(element, "includeUpperBound", true)?,
            expressions: unmarshall_expressions(m, element)?,
        }
        .into())
    }
}

fn write_rounding(element: &mut Element, mode: RoundingMode, figures: &IntegerOrVariableRef) {
    if mode != RoundingMode::SignificantFigures {
        element.set_attribute("roundingMode", mode.as_str());
    }
    element.set_attribute("figures", figures.to_string());
}

fn read_rounding(element: &Element) -> Result<(RoundingMode, IntegerOrVariableRef)> {
    let mode = optional_enum(element, "roundingMode")?.unwrap_or_default();
    let figures = required_integer_or_ref(element, "figures")?;
    Ok((mode, figures))
}

/// `equalRounded`
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualRoundedMarshaller;

impl ElementMarshaller for EqualRoundedMarshaller {
    fn name(&self) -> &'static str {
        "EqualRoundedMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::EqualRounded
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::EqualRounded(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_rounding(&mut element, c.rounding_mode, &c.figures);
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (rounding_mode, figures) = read_rounding(element)?;
        Ok(EqualRounded {
            rounding_mode,
            figures,
            expressions: unmarshall_expressions(m, element)?,
        }
        .into())
    }
}

/// `roundTo`
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundToMarshaller;

impl ElementMarshaller for RoundToMarshaller {
    fn name(&self) -> &'static str {
        "RoundToMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::RoundTo
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::RoundTo(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_rounding(&mut element, c.rounding_mode, &c.figures);
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let (rounding_mode, figures) = read_rounding(element)?;
        Ok(RoundTo {
            rounding_mode,
            figures,
            expressions: unmarshall_expressions(m, element)?,
        }
        .into())
    }
}

/// `patternMatch`
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternMatchMarshaller;

impl ElementMarshaller for PatternMatchMarshaller {
    fn name(&self) -> &'static str {
        "PatternMatchMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::PatternMatch
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::PatternMatch(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element().with_attribute("pattern", c.pattern.to_string());
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(PatternMatch {
            pattern: required_string_or_ref(element, "pattern")?,
            expressions: unmarshall_expressions(m, element)?,
        }
        .into())
    }
}

/// `stringMatch`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMatchMarshaller;

impl ElementMarshaller for StringMatchMarshaller {
    fn name(&self) -> &'static str {
        "StringMatchMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::StringMatch
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::StringMatch(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m
            .new_element()
            .with_attribute("caseSensitive", c.case_sensitive.to_string());
        set_boolean_unless(&mut element, "substring", c.substring, false);
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(StringMatch {
            case_sensitive: required_boolean(element, "caseSensitive")?,
            substring: boolean_or(element, "substring", false)?,
            expressions: unmarshall_expressions(m, element)?,
        }
        .into())
    }
}

/// `index`
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexMarshaller;

impl ElementMarshaller for IndexMarshaller {
    fn name(&self) -> &'static str {
        "IndexMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Index
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Index(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element().with_attribute("n", c.n.to_string());
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Index {
            n: required_integer_or_ref(element, "n")?,
            expressions: unmarshall_expressions(m, element)?,
        }
        .into())
    }
}

/// `repeat`
#[derive(Debug, Clone, Copy, Default)]
pub struct RepeatMarshaller;

impl ElementMarshaller for RepeatMarshaller {
    fn name(&self) -> &'static str {
        "RepeatMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Repeat
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Repeat(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m
            .new_element()
            .with_attribute("numberRepeats", c.number_repeats.to_string());
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Repeat {
            number_repeats: required_integer_or_ref(element, "numberRepeats")?,
            expressions: unmarshall_expressions(m, element)?,
        }
        .into())
    }
}

/// Operators without attributes, one instance per operator class
#[derive(Debug, Clone, Copy)]
pub struct OperatorMarshaller {
    kind: OperatorKind,
}

impl OperatorMarshaller {
    /// Marshaller for one operator
    pub fn new(kind: OperatorKind) -> Self {
        Self { kind }
    }
}

impl ElementMarshaller for OperatorMarshaller {
    fn name(&self) -> &'static str {
        "OperatorMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        self.kind.qti_class()
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Operator(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        append_expressions(m, &mut element, &c.expressions)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Operator::new(self.kind, unmarshall_expressions(m, element)?).into())
    }
}

#[cfg(test)]
mod tests {
    use crate::datatypes::QtiValue;
    use crate::factory::MarshallerFactory;
    use crate::marshallers::MarshallingContext;
    use crate::model::*;
    use crate::version::SchemaVersion;
    use crate::Error;

    fn factory() -> MarshallerFactory {
        MarshallerFactory::new(SchemaVersion::V2_1_0)
    }

    fn unmarshall(xml: &str) -> crate::Result<Component> {
        let factory = factory();
        let element = crate::documents::Element::parse(xml)?;
        factory
            .create_marshaller(&element, MarshallingContext::default())?
            .unmarshall_element(&element)
    }

    #[test]
    fn test_any_n_marshall() {
        let any_n = AnyN::new(
            vec![
                BaseValue::new(QtiValue::Boolean(true)).into(),
                BaseValue::new(QtiValue::Boolean(true)).into(),
                BaseValue::new(QtiValue::Boolean(false)).into(),
            ],
            1i64,
            2i64,
        );
        let component: Component = any_n.into();
        let factory = factory();
        let element = factory
            .create_marshaller(&component, MarshallingContext::default())
            .unwrap()
            .marshall_element(&component)
            .unwrap();

        assert_eq!(element.local_name(), "anyN");
        assert_eq!(element.attribute("min"), Some("1"));
        assert_eq!(element.attribute("max"), Some("2"));
        let children: Vec<_> = element.child_elements().collect();
        assert_eq!(children.len(), 3);
        assert!(children.iter().all(|c| c.local_name() == "baseValue"));
    }

    #[test]
    fn test_equal_defaults() {
        let component = unmarshall(
            r#"<equal xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1"><baseValue baseType="float">1.0</baseValue><baseValue baseType="float">1.0</baseValue></equal>"#,
        )
        .unwrap();
        let Component::Equal(equal) = component else { panic!("not an equal") };
        assert_eq!(equal.tolerance_mode, crate::datatypes::ToleranceMode::Exact);
        assert!(equal.include_lower_bound && equal.include_upper_bound);
    }

    #[test]
    fn test_equal_requires_tolerance() {
        let err = unmarshall(
            r#"<equal toleranceMode="absolute"><null/><null/></equal>"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Unmarshalling(_)));
        assert!(err.message().contains("'tolerance' attribute must be set"));

        let mut equal = Equal::new(vec![Null.into(), Null.into()]);
        equal.tolerance_mode = crate::datatypes::ToleranceMode::Relative;
        let component: Component = equal.into();
        let factory = factory();
        let err = factory
            .create_marshaller(&component, MarshallingContext::default())
            .unwrap()
            .marshall(&component)
            .unwrap_err();
        assert!(matches!(err, Error::Marshalling(_)));
    }

    #[test]
    fn test_rounding_mode_default() {
        let component = unmarshall(r#"<roundTo figures="3"><null/></roundTo>"#).unwrap();
        let Component::RoundTo(round_to) = component else { panic!("not a roundTo") };
        assert_eq!(round_to.rounding_mode, crate::datatypes::RoundingMode::SignificantFigures);
    }

    #[test]
    fn test_operator_arity() {
        let err = unmarshall(r#"<subtract><null/><null/><null/></subtract>"#).unwrap_err();
        assert_eq!(err.message(), "The 'subtract' element must contain exactly 2 sub-expressions, 3 given.");

        let err = unmarshall(r#"<sum/>"#).unwrap_err();
        assert_eq!(err.message(), "The 'sum' element must contain at least 1 sub-expression, none given.");

        let component = unmarshall(r#"<multiple/>"#).unwrap();
        assert_eq!(component, Operator::new(OperatorKind::Multiple, vec![]).into());
    }

    #[test]
    fn test_invalid_base_value() {
        let err = unmarshall(r#"<baseValue baseType="integer">abc</baseValue>"#).unwrap_err();
        assert_eq!(err.message(), "The value 'abc' of the 'baseValue' element is not a valid integer value.");
    }

    #[test]
    fn test_non_expression_child() {
        let err = unmarshall(r#"<not><value>1</value></not>"#).unwrap_err();
        assert!(err.message().contains("only expressions are allowed"));
    }
}
