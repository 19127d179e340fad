//! Interaction marshallers

use crate::classes::QtiClass;
use crate::datatypes::{Orientation, ShowHide};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::{
    ChoiceInteraction, Component, DrawingInteraction, Object, Prompt, SelectPointInteraction,
    SimpleChoice, TextEntryInteraction,
};
use crate::version::SchemaVersion;

use super::helpers::*;
use super::{ElementMarshaller, Marshaller};

/// Child elements of an interaction, with the optional leading prompt split off
///
/// A prompt anywhere but first is rejected.
fn split_prompt(m: &Marshaller<'_>, element: &Element) -> Result<(Option<Prompt>, Vec<Component>)> {
    let mut children = unmarshall_child_elements(m, element)?;
    let prompt = if matches!(children.first(), Some(Component::Prompt(_))) {
        Some(expect_typed::<Prompt>(element, children.remove(0))?)
    } else {
        None
    };
    if let Some(late) = children.iter().find(|c| matches!(c, Component::Prompt(_))) {
        return Err(misplaced_child(element, late));
    }
    Ok((prompt, children))
}

/// The single `object` of a graphic interaction
fn single_object(element: &Element, children: Vec<Component>) -> Result<Object> {
    let count = children.len();
    let mut objects = children.into_iter();
    match (objects.next(), count) {
        (Some(child), 1) => expect_typed::<Object>(element, child),
        _ => Err(Error::unmarshalling(format!(
            "A '{}' element must contain exactly one 'object' element, {} given.",
            element.local_name(),
            count_given(count)
        ))),
    }
}

/// `choiceInteraction`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceInteractionMarshaller;

impl ElementMarshaller for ChoiceInteractionMarshaller {
    fn name(&self) -> &'static str {
        "ChoiceInteractionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ChoiceInteraction
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ChoiceInteraction(c) = component else {
            return Err(unexpected_component(m, component));
        };
        if c.simple_choices.is_empty() {
            return Err(Error::marshalling(
                "A 'choiceInteraction' element must contain at least one 'simpleChoice' element, none given.",
            ));
        }

        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("responseIdentifier", c.response_identifier.as_str());
        element.set_attribute("shuffle", c.shuffle.to_string());
        element.set_attribute("maxChoices", c.max_choices.to_string());
        if writable_since(m, SchemaVersion::V2_1_0, "minChoices", c.min_choices != 0) && c.min_choices != 0 {
            element.set_attribute("minChoices", c.min_choices.to_string());
        }
        if writable_since(m, SchemaVersion::V2_1_0, "orientation", c.orientation.is_some()) {
            set_optional(&mut element, "orientation", c.orientation.as_ref());
        }
        if let Some(prompt) = &c.prompt {
            append_typed(m, &mut element, prompt)?;
        }
        for choice in &c.simple_choices {
            append_typed(m, &mut element, choice)?;
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let response_identifier = required_identifier(element, "responseIdentifier")?;
        let (prompt, children) = split_prompt(m, element)?;
        let simple_choices = children
            .into_iter()
            .map(|c| expect_typed::<SimpleChoice>(element, c))
            .collect::<Result<Vec<_>>>()?;
        if simple_choices.is_empty() {
            return Err(Error::unmarshalling(
                "A 'choiceInteraction' element must contain at least one 'simpleChoice' element, none given.",
            ));
        }

        let mut interaction = ChoiceInteraction::new(response_identifier, simple_choices);
        interaction.attributes = read_body_attributes(m, element)?;
        interaction.prompt = prompt;
        interaction.shuffle = boolean_or(element, "shuffle", false)?;
        interaction.max_choices = optional_integer(element, "maxChoices")?.unwrap_or(1);
        if readable_since(m, SchemaVersion::V2_1_0) {
            interaction.min_choices = optional_integer(element, "minChoices")?.unwrap_or(0);
            interaction.orientation = optional_enum::<Orientation>(element, "orientation")?;
        }
        Ok(interaction.into())
    }
}

/// `simpleChoice`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleChoiceMarshaller;

impl ElementMarshaller for SimpleChoiceMarshaller {
    fn name(&self) -> &'static str {
        "SimpleChoiceMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::SimpleChoice
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::SimpleChoice(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::SimpleChoice, ContentModel::Flow, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("identifier", c.identifier.as_str());
        set_boolean_unless(&mut element, "fixed", c.fixed, false);
        if writable_since(
            m,
            SchemaVersion::V2_1_0,
            "templateIdentifier",
            c.template_identifier.is_some(),
        ) {
            set_optional(&mut element, "templateIdentifier", c.template_identifier.as_ref());
        }
        if writable_since(m, SchemaVersion::V2_1_0, "showHide", c.show_hide != ShowHide::Show)
            && c.show_hide != ShowHide::Show
        {
            element.set_attribute("showHide", c.show_hide.to_string());
        }
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Flow)?;
        check_content(Phase::Unmarshall, QtiClass::SimpleChoice, ContentModel::Flow, &content)?;

        let mut choice = SimpleChoice::new(required_identifier(element, "identifier")?, content);
        choice.attributes = read_body_attributes(m, element)?;
        choice.fixed = boolean_or(element, "fixed", false)?;
        if readable_since(m, SchemaVersion::V2_1_0) {
            choice.template_identifier = optional_identifier(element, "templateIdentifier")?;
            choice.show_hide = optional_enum(element, "showHide")?.unwrap_or_default();
        }
        Ok(choice.into())
    }
}

/// `textEntryInteraction`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEntryInteractionMarshaller;

impl ElementMarshaller for TextEntryInteractionMarshaller {
    fn name(&self) -> &'static str {
        "TextEntryInteractionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::TextEntryInteraction
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::TextEntryInteraction(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("responseIdentifier", c.response_identifier.as_str());
        if c.base != 10 {
            element.set_attribute("base", c.base.to_string());
        }
        set_optional(&mut element, "stringIdentifier", c.string_identifier.as_ref());
        set_optional(&mut element, "expectedLength", c.expected_length.as_ref());
        set_optional(&mut element, "patternMask", c.pattern_mask.as_ref());
        if writable_since(
            m,
            SchemaVersion::V2_1_0,
            "placeholderText",
            c.placeholder_text.is_some(),
        ) {
            set_optional(&mut element, "placeholderText", c.placeholder_text.as_ref());
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let mut interaction =
            TextEntryInteraction::new(required_identifier(element, "responseIdentifier")?);
        interaction.attributes = read_body_attributes(m, element)?;
        interaction.base = optional_integer(element, "base")?.unwrap_or(10);
        interaction.string_identifier = optional_identifier(element, "stringIdentifier")?;
        interaction.expected_length = optional_integer(element, "expectedLength")?;
        interaction.pattern_mask = optional_string(element, "patternMask");
        if readable_since(m, SchemaVersion::V2_1_0) {
            interaction.placeholder_text = optional_string(element, "placeholderText");
        }
        Ok(interaction.into())
    }
}

/// `drawingInteraction`
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawingInteractionMarshaller;

impl ElementMarshaller for DrawingInteractionMarshaller {
    fn name(&self) -> &'static str {
        "DrawingInteractionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::DrawingInteraction
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::DrawingInteraction(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("responseIdentifier", c.response_identifier.as_str());
        if let Some(prompt) = &c.prompt {
            append_typed(m, &mut element, prompt)?;
        }
        append_typed(m, &mut element, &c.object)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let response_identifier = required_identifier(element, "responseIdentifier")?;
        let (prompt, children) = split_prompt(m, element)?;
        let object = single_object(element, children)?;

        let mut interaction = DrawingInteraction::new(response_identifier, object);
        interaction.attributes = read_body_attributes(m, element)?;
        interaction.prompt = prompt;
        Ok(interaction.into())
    }
}

/// `selectPointInteraction`
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectPointInteractionMarshaller;

impl ElementMarshaller for SelectPointInteractionMarshaller {
    fn name(&self) -> &'static str {
        "SelectPointInteractionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::SelectPointInteraction
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::SelectPointInteraction(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("responseIdentifier", c.response_identifier.as_str());
        element.set_attribute("maxChoices", c.max_choices.to_string());
        if writable_since(m, SchemaVersion::V2_1_0, "minChoices", c.min_choices != 0) && c.min_choices != 0 {
            element.set_attribute("minChoices", c.min_choices.to_string());
        }
        if let Some(prompt) = &c.prompt {
            append_typed(m, &mut element, prompt)?;
        }
        append_typed(m, &mut element, &c.object)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let response_identifier = required_identifier(element, "responseIdentifier")?;
        let max_choices = required_integer(element, "maxChoices")?;
        let (prompt, children) = split_prompt(m, element)?;
        let object = single_object(element, children)?;

        let mut interaction = SelectPointInteraction::new(response_identifier, object, max_choices);
        interaction.attributes = read_body_attributes(m, element)?;
        interaction.prompt = prompt;
        if readable_since(m, SchemaVersion::V2_1_0) {
            interaction.min_choices = optional_integer(element, "minChoices")?.unwrap_or(0);
        }
        Ok(interaction.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::datatypes::{Orientation, ShowHide};
    use crate::documents::Element;
    use crate::factory::MarshallerFactory;
    use crate::marshallers::MarshallingContext;
    use crate::model::*;
    use crate::version::SchemaVersion;

    fn unmarshall_with(version: SchemaVersion, xml: &str) -> crate::Result<Component> {
        let factory = MarshallerFactory::new(version);
        let element = Element::parse(xml)?;
        factory
            .create_marshaller(&element, MarshallingContext::default())?
            .unmarshall_element(&element)
    }

    fn marshall_with(version: SchemaVersion, component: Component) -> crate::Result<Element> {
        let factory = MarshallerFactory::new(version);
        factory
            .create_marshaller(&component, MarshallingContext::default())?
            .marshall_element(&component)
    }

    fn choices() -> Vec<SimpleChoice> {
        vec![
            SimpleChoice::new("ChoiceA", vec![Component::text("A")]),
            SimpleChoice::new("ChoiceB", vec![Component::text("B")]),
        ]
    }

    #[test]
    fn test_choice_interaction_always_writes_shuffle_and_max() {
        let interaction = ChoiceInteraction::new("RESPONSE", choices());
        let element = marshall_with(SchemaVersion::V2_1_0, interaction.into()).unwrap();
        assert_eq!(element.attribute("shuffle"), Some("false"));
        assert_eq!(element.attribute("maxChoices"), Some("1"));
        assert!(!element.has_attribute("minChoices"));
        assert_eq!(element.child_elements().count(), 2);
    }

    #[test]
    fn test_choice_interaction_gated_attributes() {
        let mut interaction = ChoiceInteraction::new("RESPONSE", choices());
        interaction.min_choices = 1;
        interaction.orientation = Some(Orientation::Horizontal);
        let element = marshall_with(SchemaVersion::V2_0_0, interaction.clone().into()).unwrap();
        assert!(!element.has_attribute("minChoices"));
        assert!(!element.has_attribute("orientation"));

        let element = marshall_with(SchemaVersion::V2_1_0, interaction.into()).unwrap();
        assert_eq!(element.attribute("minChoices"), Some("1"));
        assert_eq!(element.attribute("orientation"), Some("horizontal"));
    }

    #[test]
    fn test_choice_interaction_requires_choices() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<choiceInteraction responseIdentifier="RESPONSE" shuffle="true" maxChoices="1"><prompt>Pick</prompt></choiceInteraction>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "A 'choiceInteraction' element must contain at least one 'simpleChoice' element, none given."
        );
    }

    #[test]
    fn test_choice_interaction_with_prompt() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<choiceInteraction responseIdentifier="RESPONSE" shuffle="true" maxChoices="0">
                <prompt>Pick one</prompt>
                <simpleChoice identifier="A" fixed="true">Alpha</simpleChoice>
                <simpleChoice identifier="B">Beta</simpleChoice>
            </choiceInteraction>"#,
        )
        .unwrap();
        let interaction = ChoiceInteraction::try_from(component).unwrap();
        assert!(interaction.shuffle);
        assert_eq!(interaction.max_choices, 0);
        assert_eq!(interaction.prompt.unwrap().content, vec![Component::text("Pick one")]);
        assert!(interaction.simple_choices[0].fixed);
        assert_eq!(interaction.simple_choices[1].identifier, "B");
    }

    #[test]
    fn test_drawing_interaction_requires_object() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<drawingInteraction responseIdentifier="RESPONSE"><prompt>Draw</prompt></drawingInteraction>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "A 'drawingInteraction' element must contain exactly one 'object' element, none given."
        );
    }

    #[test]
    fn test_drawing_interaction_missing_identifier() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<drawingInteraction><object data="canvas.png" type="image/png"/></drawingInteraction>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "The mandatory 'responseIdentifier' attribute is missing from the 'drawingInteraction' element."
        );
    }

    #[test]
    fn test_select_point_interaction() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<selectPointInteraction responseIdentifier="RESPONSE" maxChoices="2" minChoices="1">
                <object data="map.png" type="image/png"/>
            </selectPointInteraction>"#,
        )
        .unwrap();
        let interaction = SelectPointInteraction::try_from(component).unwrap();
        assert_eq!(interaction.max_choices, 2);
        assert_eq!(interaction.min_choices, 1);
        assert_eq!(interaction.object.data, "map.png");
    }

    #[test]
    fn test_text_entry_placeholder_gated() {
        let mut interaction = TextEntryInteraction::new("RESPONSE");
        interaction.placeholder_text = Some("type here".to_string());
        interaction.expected_length = Some(12);
        let element = marshall_with(SchemaVersion::V2_0_0, interaction.clone().into()).unwrap();
        assert!(!element.has_attribute("placeholderText"));
        assert!(!element.has_attribute("base"));
        assert_eq!(element.attribute("expectedLength"), Some("12"));

        let element = marshall_with(SchemaVersion::V2_1_0, interaction.into()).unwrap();
        assert_eq!(element.attribute("placeholderText"), Some("type here"));
    }

    #[test]
    fn test_prompt_after_object_is_misplaced() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<drawingInteraction responseIdentifier="RESPONSE">
                <object data="canvas.png" type="image/png"/>
                <prompt>Draw</prompt>
            </drawingInteraction>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "The 'drawingInteraction' element cannot contain 'prompt' elements at this position."
        );
    }

    #[test]
    fn test_second_prompt_is_misplaced() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<choiceInteraction responseIdentifier="RESPONSE" maxChoices="1">
                <prompt>One</prompt>
                <simpleChoice identifier="A">Alpha</simpleChoice>
                <prompt>Two</prompt>
            </choiceInteraction>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "The 'choiceInteraction' element cannot contain 'prompt' elements at this position."
        );
    }

    #[test]
    fn test_choice_interaction_read_defaults() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<choiceInteraction responseIdentifier="RESPONSE">
                <simpleChoice identifier="A">Alpha</simpleChoice>
            </choiceInteraction>"#,
        )
        .unwrap();
        let interaction = ChoiceInteraction::try_from(component).unwrap();
        assert_eq!(interaction.max_choices, 1);
        assert_eq!(interaction.min_choices, 0);
        assert!(!interaction.shuffle);
        assert_eq!(interaction.orientation, None);

        let choice = &interaction.simple_choices[0];
        assert_eq!(choice.show_hide, ShowHide::Show);
        assert!(!choice.fixed);
        assert_eq!(choice.template_identifier, None);
    }
}
