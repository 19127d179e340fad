//! Body content marshallers

use crate::classes::QtiClass;
use crate::datatypes::{IntegerOrVariableRef, ParamType, QtiEnum, ShowHide, TrackKind, View};
use crate::documents::{Element, Node};
use crate::error::{Error, Result};
use crate::model::{
    Anchor, Br, Component, FeedbackInline, Figcaption, Figure, HtmlElement, HtmlKind, Img,
    ItemBody, Media, MediaKind, Object, Param, PrintedVariable, Prompt, QtiComponent, RubricBlock,
    Source, TemplateBlock, TemplateInline, TextRun, Track,
};
use crate::version::SchemaVersion;

use super::helpers::*;
use super::{ElementMarshaller, Marshaller};

/// Content check for containers accepting a content model plus a few
/// structural classes
fn check_content_with(
    phase: Phase,
    parent: QtiClass,
    model: ContentModel,
    extra: &[QtiClass],
    content: &[Component],
) -> Result<()> {
    for child in content {
        let class = child.qti_class();
        if !model.accepts(class) && !extra.contains(&class) {
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

// =============================================================================
// Text
// =============================================================================

/// Text runs, written as DOM text nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRunMarshaller;

impl ElementMarshaller for TextRunMarshaller {
    fn name(&self) -> &'static str {
        "TextRunMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::TextRun
    }

    fn marshall_element(&self, _m: &Marshaller<'_>, _component: &Component) -> Result<Element> {
        Err(Error::marshalling("A 'textRun' is written as a text node, not as an element."))
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Err(Error::unmarshalling(format!(
            "A 'textRun' is read from a text node, the '{}' element was given.",
            element.local_name()
        )))
    }

    fn marshall(&self, m: &Marshaller<'_>, component: &Component) -> Result<Node> {
        let Component::TextRun(c) = component else {
            return Err(unexpected_component(m, component));
        };
        Ok(Node::text(c.content.as_str()))
    }

    fn unmarshall(&self, m: &Marshaller<'_>, node: &Node) -> Result<Component> {
        match node {
            Node::Text(t) => Ok(TextRun::new(t.as_str()).into()),
            Node::Element(e) => self.unmarshall_element(m, e),
            Node::Comment(_) => Err(Error::unmarshalling(
                "A 'textRun' is read from a text node, a comment node was given.",
            )),
        }
    }
}

/// `p`, `div`, `span`, `em` and `strong`
#[derive(Debug, Clone, Copy)]
pub struct HtmlMarshaller {
    kind: HtmlKind,
}

impl HtmlMarshaller {
    /// Marshaller for one kind of text container
    pub fn new(kind: HtmlKind) -> Self {
        Self { kind }
    }

    fn content_model(&self) -> ContentModel {
        if self.kind.inline_only() {
            ContentModel::Inline
        } else {
            ContentModel::Flow
        }
    }
}

impl ElementMarshaller for HtmlMarshaller {
    fn name(&self) -> &'static str {
        "HtmlMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        self.kind.qti_class()
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Html(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, self.qti_class(), self.content_model(), &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, self.content_model())?;
        check_content(Phase::Unmarshall, self.qti_class(), self.content_model(), &content)?;
        Ok(HtmlElement {
            kind: self.kind,
            attributes: read_body_attributes(m, element)?,
            content,
        }
        .into())
    }
}

/// `a`
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorMarshaller;

impl ElementMarshaller for AnchorMarshaller {
    fn name(&self) -> &'static str {
        "AnchorMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::A
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Anchor(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::A, ContentModel::Inline, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("href", c.href.as_str());
        set_optional(&mut element, "type", c.mime_type.as_ref());
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Inline)?;
        check_content(Phase::Unmarshall, QtiClass::A, ContentModel::Inline, &content)?;
        Ok(Anchor {
            attributes: read_body_attributes(m, element)?,
            href: required_attribute(element, "href")?.to_string(),
            mime_type: optional_string(element, "type"),
            content,
        }
        .into())
    }
}

/// `br`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrMarshaller;

impl ElementMarshaller for BrMarshaller {
    fn name(&self) -> &'static str {
        "BrMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Br
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Br(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Br {
            attributes: read_body_attributes(m, element)?,
        }
        .into())
    }
}

/// `img`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImgMarshaller;

impl ElementMarshaller for ImgMarshaller {
    fn name(&self) -> &'static str {
        "ImgMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Img
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Img(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("src", c.src.as_str());
        element.set_attribute("alt", c.alt.as_str());
        set_optional(&mut element, "width", c.width.as_ref());
        set_optional(&mut element, "height", c.height.as_ref());
        set_optional(&mut element, "longdesc", c.longdesc.as_ref());
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Img {
            attributes: read_body_attributes(m, element)?,
            src: required_attribute(element, "src")?.to_string(),
            alt: required_attribute(element, "alt")?.to_string(),
            width: optional_string(element, "width"),
            height: optional_string(element, "height"),
            longdesc: optional_string(element, "longdesc"),
        }
        .into())
    }
}

/// `object`
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectMarshaller;

impl ElementMarshaller for ObjectMarshaller {
    fn name(&self) -> &'static str {
        "ObjectMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Object
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Object(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content_with(
            Phase::Marshall,
            QtiClass::Object,
            ContentModel::Flow,
            &[QtiClass::Param],
            &c.content,
        )?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("data", c.data.as_str());
        element.set_attribute("type", c.mime_type.as_str());
        set_optional(&mut element, "width", c.width.as_ref());
        set_optional(&mut element, "height", c.height.as_ref());
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Flow)?;
        check_content_with(
            Phase::Unmarshall,
            QtiClass::Object,
            ContentModel::Flow,
            &[QtiClass::Param],
            &content,
        )?;
        Ok(Object {
            attributes: read_body_attributes(m, element)?,
            data: required_attribute(element, "data")?.to_string(),
            mime_type: required_attribute(element, "type")?.to_string(),
            width: optional_string(element, "width"),
            height: optional_string(element, "height"),
            content,
        }
        .into())
    }
}

/// `param`
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamMarshaller;

impl ElementMarshaller for ParamMarshaller {
    fn name(&self) -> &'static str {
        "ParamMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Param
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Param(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m
            .new_element()
            .with_attribute("name", c.name.as_str())
            .with_attribute("value", c.value.as_str());
        if c.value_type != ParamType::Data {
            element.set_attribute("valuetype", c.value_type.as_str());
        }
        set_optional(&mut element, "type", c.mime_type.as_ref());
        Ok(element)
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Param {
            name: required_attribute(element, "name")?.to_string(),
            value: required_attribute(element, "value")?.to_string(),
            value_type: optional_enum(element, "valuetype")?.unwrap_or_default(),
            mime_type: optional_string(element, "type"),
        }
        .into())
    }
}

/// `printedVariable`
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintedVariableMarshaller;

impl ElementMarshaller for PrintedVariableMarshaller {
    fn name(&self) -> &'static str {
        "PrintedVariableMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::PrintedVariable
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::PrintedVariable(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        element.set_attribute("identifier", c.identifier.as_str());
        set_optional(&mut element, "format", c.format.as_ref());
        if c.base != IntegerOrVariableRef::Integer(10) {
            element.set_attribute("base", c.base.to_string());
        }
        if writable_since(m, SchemaVersion::V2_1_0, "index", c.index.is_some()) {
            set_optional(&mut element, "index", c.index.as_ref());
        }
        if writable_since(m, SchemaVersion::V2_1_0, "powerForm", c.power_form) {
            set_boolean_unless(&mut element, "powerForm", c.power_form, false);
        }
        if writable_since(m, SchemaVersion::V2_1_0, "field", c.field.is_some()) {
            set_optional(&mut element, "field", c.field.as_ref());
        }
        if writable_since(m, SchemaVersion::V2_1_0, "delimiter", c.delimiter.is_some()) {
            set_optional(&mut element, "delimiter", c.delimiter.as_ref());
        }
        if writable_since(
            m,
            SchemaVersion::V2_1_0,
            "mappingIndicator",
            c.mapping_indicator.is_some(),
        ) {
            set_optional(&mut element, "mappingIndicator", c.mapping_indicator.as_ref());
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let mut printed = PrintedVariable::new(required_identifier(element, "identifier")?);
        printed.attributes = read_body_attributes(m, element)?;
        printed.format = optional_string(element, "format");
        if let Some(base) = optional_integer_or_ref(element, "base")? {
            printed.base = base;
        }
        if readable_since(m, SchemaVersion::V2_1_0) {
            printed.index = optional_integer_or_ref(element, "index")?;
            printed.power_form = boolean_or(element, "powerForm", false)?;
            printed.field = optional_string(element, "field");
            printed.delimiter = optional_string(element, "delimiter");
            printed.mapping_indicator = optional_string(element, "mappingIndicator");
        }
        Ok(printed.into())
    }
}

/// `prompt`
///
/// Inline content only; hyperlinks are accepted from QTI 2.2.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptMarshaller;

fn check_prompt_links(m: &Marshaller<'_>, phase: Phase, content: &[Component]) -> Result<()> {
    if m.version() < SchemaVersion::V2_2_0 && content.iter().any(|c| c.qti_class() == QtiClass::A) {
        return Err(phase.error(
            "The 'a' element cannot be contained in a 'prompt' element prior to QTI 2.2.0.".to_string(),
        ));
    }
    Ok(())
}

impl ElementMarshaller for PromptMarshaller {
    fn name(&self) -> &'static str {
        "PromptMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Prompt
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Prompt(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::Prompt, ContentModel::Inline, &c.content)?;
        check_prompt_links(m, Phase::Marshall, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Inline)?;
        check_content(Phase::Unmarshall, QtiClass::Prompt, ContentModel::Inline, &content)?;
        check_prompt_links(m, Phase::Unmarshall, &content)?;
        Ok(Prompt {
            attributes: read_body_attributes(m, element)?,
            content,
        }
        .into())
    }
}

// =============================================================================
// Conditional content
// =============================================================================

/// Attributes of `templateInline`, `templateBlock` and `feedbackInline`
struct Visibility {
    variable: String,
    identifier: String,
    show_hide: ShowHide,
}

fn read_visibility(element: &Element, variable_attribute: &str) -> Result<Visibility> {
    Ok(Visibility {
        variable: required_identifier(element, variable_attribute)?,
        identifier: required_identifier(element, "identifier")?,
        show_hide: optional_enum(element, "showHide")?.unwrap_or_default(),
    })
}

fn write_visibility(element: &mut Element, variable_attribute: &str, visibility: Visibility) {
    element.set_attribute(variable_attribute, visibility.variable);
    element.set_attribute("identifier", visibility.identifier);
    if visibility.show_hide != ShowHide::Show {
        element.set_attribute("showHide", visibility.show_hide.as_str());
    }
}

/// `templateInline`
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateInlineMarshaller;

impl ElementMarshaller for TemplateInlineMarshaller {
    fn name(&self) -> &'static str {
        "TemplateInlineMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::TemplateInline
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::TemplateInline(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::TemplateInline, ContentModel::Inline, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        write_visibility(
            &mut element,
            "templateIdentifier",
            Visibility {
                variable: c.template_identifier.clone(),
                identifier: c.identifier.clone(),
                show_hide: c.show_hide,
            },
        );
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Inline)?;
        check_content(Phase::Unmarshall, QtiClass::TemplateInline, ContentModel::Inline, &content)?;
        let visibility = read_visibility(element, "templateIdentifier")?;
        Ok(TemplateInline {
            attributes: read_body_attributes(m, element)?,
            template_identifier: visibility.variable,
            identifier: visibility.identifier,
            show_hide: visibility.show_hide,
            content,
        }
        .into())
    }
}

/// `templateBlock`
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateBlockMarshaller;

impl ElementMarshaller for TemplateBlockMarshaller {
    fn name(&self) -> &'static str {
        "TemplateBlockMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::TemplateBlock
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::TemplateBlock(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::TemplateBlock, ContentModel::Block, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        write_visibility(
            &mut element,
            "templateIdentifier",
            Visibility {
                variable: c.template_identifier.clone(),
                identifier: c.identifier.clone(),
                show_hide: c.show_hide,
            },
        );
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Block)?;
        check_content(Phase::Unmarshall, QtiClass::TemplateBlock, ContentModel::Block, &content)?;
        let visibility = read_visibility(element, "templateIdentifier")?;
        Ok(TemplateBlock {
            attributes: read_body_attributes(m, element)?,
            template_identifier: visibility.variable,
            identifier: visibility.identifier,
            show_hide: visibility.show_hide,
            content,
        }
        .into())
    }
}

/// `feedbackInline`
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackInlineMarshaller;

impl ElementMarshaller for FeedbackInlineMarshaller {
    fn name(&self) -> &'static str {
        "FeedbackInlineMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::FeedbackInline
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::FeedbackInline(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::FeedbackInline, ContentModel::Inline, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        write_visibility(
            &mut element,
            "outcomeIdentifier",
            Visibility {
                variable: c.outcome_identifier.clone(),
                identifier: c.identifier.clone(),
                show_hide: c.show_hide,
            },
        );
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Inline)?;
        check_content(Phase::Unmarshall, QtiClass::FeedbackInline, ContentModel::Inline, &content)?;
        let visibility = read_visibility(element, "outcomeIdentifier")?;
        Ok(FeedbackInline {
            attributes: read_body_attributes(m, element)?,
            outcome_identifier: visibility.variable,
            identifier: visibility.identifier,
            show_hide: visibility.show_hide,
            content,
        }
        .into())
    }
}

// =============================================================================
// Block containers
// =============================================================================

/// `rubricBlock`
#[derive(Debug, Clone, Copy, Default)]
pub struct RubricBlockMarshaller;

impl ElementMarshaller for RubricBlockMarshaller {
    fn name(&self) -> &'static str {
        "RubricBlockMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::RubricBlock
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::RubricBlock(c) = component else {
            return Err(unexpected_component(m, component));
        };
        if c.views.is_empty() {
            return Err(Error::marshalling(
                "A 'rubricBlock' element must have at least one view.",
            ));
        }
        check_content(Phase::Marshall, QtiClass::RubricBlock, ContentModel::Block, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        set_list(&mut element, "view", &c.views);
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        required_attribute(element, "view")?;
        let views = enum_list::<View>(element, "view")?;
        let content = unmarshall_content(m, element, ContentModel::Block)?;
        check_content(Phase::Unmarshall, QtiClass::RubricBlock, ContentModel::Block, &content)?;
        Ok(RubricBlock {
            attributes: read_body_attributes(m, element)?,
            views,
            content,
        }
        .into())
    }
}

/// `itemBody`
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemBodyMarshaller;

impl ElementMarshaller for ItemBodyMarshaller {
    fn name(&self) -> &'static str {
        "ItemBodyMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::ItemBody
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::ItemBody(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::ItemBody, ContentModel::Block, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Block)?;
        check_content(Phase::Unmarshall, QtiClass::ItemBody, ContentModel::Block, &content)?;
        Ok(ItemBody {
            attributes: read_body_attributes(m, element)?,
            content,
        }
        .into())
    }
}

// =============================================================================
// HTML5 extension (2.2)
// =============================================================================

fn check_figure_content(phase: Phase, content: &[Component]) -> Result<()> {
    check_content_with(
        phase,
        QtiClass::Figure,
        ContentModel::Flow,
        &[QtiClass::Figcaption],
        content,
    )?;
    let captions = content
        .iter()
        .filter(|c| c.qti_class() == QtiClass::Figcaption)
        .count();
    if captions > 1 {
        return Err(phase.error(format!(
            "A 'figure' element must contain at most one 'figcaption' element, {} given.",
            captions
        )));
    }
    Ok(())
}

/// `figure`
#[derive(Debug, Clone, Copy, Default)]
pub struct FigureMarshaller;

impl ElementMarshaller for FigureMarshaller {
    fn name(&self) -> &'static str {
        "FigureMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Figure
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Figure(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_figure_content(Phase::Marshall, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Flow)?;
        check_figure_content(Phase::Unmarshall, &content)?;
        Ok(Figure {
            attributes: read_body_attributes(m, element)?,
            content,
        }
        .into())
    }
}

/// `figcaption`
#[derive(Debug, Clone, Copy, Default)]
pub struct FigcaptionMarshaller;

impl ElementMarshaller for FigcaptionMarshaller {
    fn name(&self) -> &'static str {
        "FigcaptionMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Figcaption
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Figcaption(c) = component else {
            return Err(unexpected_component(m, component));
        };
        check_content(Phase::Marshall, QtiClass::Figcaption, ContentModel::Inline, &c.content)?;
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        append_children(m, &mut element, &c.content)?;
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let content = unmarshall_content(m, element, ContentModel::Inline)?;
        check_content(Phase::Unmarshall, QtiClass::Figcaption, ContentModel::Inline, &content)?;
        Ok(Figcaption {
            attributes: read_body_attributes(m, element)?,
            content,
        }
        .into())
    }
}

/// `audio` and `video`
#[derive(Debug, Clone, Copy)]
pub struct MediaMarshaller {
    kind: MediaKind,
}

impl MediaMarshaller {
    /// Marshaller for one kind of media element
    pub fn new(kind: MediaKind) -> Self {
        Self { kind }
    }
}

impl ElementMarshaller for MediaMarshaller {
    fn name(&self) -> &'static str {
        "MediaMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        self.kind.qti_class()
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Media(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element();
        write_body_attributes(m, &mut element, &c.attributes);
        set_optional(&mut element, "src", c.src.as_ref());
        set_boolean_unless(&mut element, "autoplay", c.autoplay, false);
        set_boolean_unless(&mut element, "controls", c.controls, false);
        set_boolean_unless(&mut element, "loop", c.looping, false);
        set_boolean_unless(&mut element, "muted", c.muted, false);
        if self.kind == MediaKind::Video {
            set_optional(&mut element, "width", c.width.as_ref());
            set_optional(&mut element, "height", c.height.as_ref());
            set_optional(&mut element, "poster", c.poster.as_ref());
        }
        for source in &c.sources {
            append_typed(m, &mut element, source)?;
        }
        for track in &c.tracks {
            append_typed(m, &mut element, track)?;
        }
        Ok(element)
    }

    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        let children = unmarshall_child_elements(m, element)?;
        check_child_classes(
            Phase::Unmarshall,
            self.qti_class(),
            &[QtiClass::Source, QtiClass::Track],
            &children,
        )?;

        let mut media = Media::new(self.kind);
        media.attributes = read_body_attributes(m, element)?;
        media.src = optional_string(element, "src");
        media.autoplay = boolean_or(element, "autoplay", false)?;
        media.controls = boolean_or(element, "controls", false)?;
        media.looping = boolean_or(element, "loop", false)?;
        media.muted = boolean_or(element, "muted", false)?;
        if self.kind == MediaKind::Video {
            media.width = optional_string(element, "width");
            media.height = optional_string(element, "height");
            media.poster = optional_string(element, "poster");
        }
        for child in children {
            match child {
                Component::Source(s) => media.sources.push(s),
                Component::Track(t) => media.tracks.push(t),
                _ => {}
            }
        }
        Ok(media.into())
    }
}

/// `source`
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMarshaller;

impl ElementMarshaller for SourceMarshaller {
    fn name(&self) -> &'static str {
        "SourceMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Source
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Source(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element().with_attribute("src", c.src.as_str());
        set_optional(&mut element, "type", c.mime_type.as_ref());
        Ok(element)
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Source {
            src: required_attribute(element, "src")?.to_string(),
            mime_type: optional_string(element, "type"),
        }
        .into())
    }
}

/// `track`
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackMarshaller;

impl ElementMarshaller for TrackMarshaller {
    fn name(&self) -> &'static str {
        "TrackMarshaller"
    }

    fn qti_class(&self) -> QtiClass {
        QtiClass::Track
    }

    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element> {
        let Component::Track(c) = component else {
            return Err(unexpected_component(m, component));
        };
        let mut element = m.new_element().with_attribute("src", c.src.as_str());
        if c.kind != TrackKind::Subtitles {
            element.set_attribute("kind", c.kind.as_str());
        }
        set_optional(&mut element, "srclang", c.srclang.as_ref());
        set_optional(&mut element, "label", c.label.as_ref());
        set_boolean_unless(&mut element, "default", c.default, false);
        Ok(element)
    }

    fn unmarshall_element(&self, _m: &Marshaller<'_>, element: &Element) -> Result<Component> {
        Ok(Track {
            src: required_attribute(element, "src")?.to_string(),
            kind: optional_enum(element, "kind")?.unwrap_or_default(),
            srclang: optional_string(element, "srclang"),
            label: optional_string(element, "label"),
            default: boolean_or(element, "default", false)?,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use crate::datatypes::{Direction, IntegerOrVariableRef, ParamType, ShowHide, TrackKind};
    use crate::documents::{Element, Node};
    use crate::factory::MarshallerFactory;
    use crate::marshallers::MarshallingContext;
    use crate::model::*;
    use crate::namespaces::QTI_HTML5_NAMESPACE;
    use crate::version::SchemaVersion;

    fn unmarshall_with(version: SchemaVersion, xml: &str) -> crate::Result<Component> {
        let factory = MarshallerFactory::new(version);
        let element = Element::parse(xml)?;
        factory
            .create_marshaller(&element, MarshallingContext::default())?
            .unmarshall_element(&element)
    }

    fn marshall_with(version: SchemaVersion, component: &Component) -> crate::Result<Element> {
        let factory = MarshallerFactory::new(version);
        factory
            .create_marshaller(component, MarshallingContext::default())?
            .marshall_element(component)
    }

    #[test]
    fn test_text_runs_are_text_nodes() {
        let em = HtmlElement::new(HtmlKind::Em, vec![Component::text("world")]);
        let p = HtmlElement::new(HtmlKind::P, vec![Component::text("Hello "), em.into()]);
        let element = marshall_with(SchemaVersion::V2_1_0, &p.into()).unwrap();
        assert_eq!(element.children.len(), 2);
        assert_eq!(element.children[0], Node::text("Hello "));
        assert_eq!(element.child_elements().next().unwrap().local_name(), "em");
    }

    #[test]
    fn test_paragraph_rejects_block_content() {
        let err = unmarshall_with(SchemaVersion::V2_1_0, "<p>Text <div>block</div></p>").unwrap_err();
        assert_eq!(
            err.message(),
            "The 'p' element cannot contain 'div' elements: only inline content is allowed."
        );
    }

    #[test]
    fn test_item_body_skips_indentation() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            "<itemBody>\n  <p>One</p>\n  <!-- note -->\n  <p>Two</p>\n</itemBody>",
        )
        .unwrap();
        let body = ItemBody::try_from(component).unwrap();
        assert_eq!(body.content.len(), 2);
    }

    #[test]
    fn test_anchor_in_prompt_is_version_gated() {
        let xml = r#"<prompt>See <a href="https://example.org">this</a></prompt>"#;
        let err = unmarshall_with(SchemaVersion::V2_1_0, xml).unwrap_err();
        assert_eq!(
            err.message(),
            "The 'a' element cannot be contained in a 'prompt' element prior to QTI 2.2.0."
        );

        let prompt = Prompt::try_from(unmarshall_with(SchemaVersion::V2_2_0, xml).unwrap()).unwrap();
        assert_eq!(prompt.content.len(), 2);
    }

    #[test]
    fn test_dir_is_version_gated() {
        let xml = r#"<span dir="rtl">text</span>"#;
        let span = HtmlElement::try_from(unmarshall_with(SchemaVersion::V2_1_0, xml).unwrap()).unwrap();
        assert_eq!(span.attributes.dir, None);

        let span = HtmlElement::try_from(unmarshall_with(SchemaVersion::V2_2_0, xml).unwrap()).unwrap();
        assert_eq!(span.attributes.dir, Some(Direction::Rtl));

        let element = marshall_with(SchemaVersion::V2_1_0, &span.into()).unwrap();
        assert!(!element.has_attribute("dir"));
    }

    #[test]
    fn test_printed_variable_defaults() {
        let mut printed = PrintedVariable::new("SCORE");
        printed.power_form = true;
        let element = marshall_with(SchemaVersion::V2_1_0, &printed.clone().into()).unwrap();
        assert!(!element.has_attribute("base"));
        assert_eq!(element.attribute("powerForm"), Some("true"));

        let element = marshall_with(SchemaVersion::V2_0_0, &printed.into()).unwrap();
        assert!(!element.has_attribute("powerForm"));
    }

    #[test]
    fn test_template_inline_is_inline_only() {
        let err = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<templateInline templateIdentifier="T" identifier="A"><p>no</p></templateInline>"#,
        )
        .unwrap_err();
        assert!(err.message().contains("only inline content is allowed"));
    }

    #[test]
    fn test_figure_caption_limit() {
        let xml = format!(
            r#"<qh5:figure xmlns:qh5="{ns}"><qh5:figcaption>A</qh5:figcaption><qh5:figcaption>B</qh5:figcaption></qh5:figure>"#,
            ns = QTI_HTML5_NAMESPACE
        );
        let err = unmarshall_with(SchemaVersion::V2_2_0, &xml).unwrap_err();
        assert_eq!(
            err.message(),
            "A 'figure' element must contain at most one 'figcaption' element, 2 given."
        );
    }

    #[test]
    fn test_figure_written_with_prefix() {
        let figure = Figure {
            content: vec![Figcaption {
                content: vec![Component::text("Caption")],
                ..Figcaption::default()
            }
            .into()],
            ..Figure::default()
        };
        let element = marshall_with(SchemaVersion::V2_2_0, &figure.into()).unwrap();
        assert_eq!(element.qualified_name(), "qh5:figure");
        assert_eq!(element.namespace(), Some(QTI_HTML5_NAMESPACE));
    }

    #[test]
    fn test_media_children() {
        let xml = format!(
            r#"<qh5:video xmlns:qh5="{ns}" controls="true" width="320">
                <qh5:source src="movie.mp4" type="video/mp4"/>
                <qh5:track src="subs.vtt" kind="captions" srclang="en"/>
            </qh5:video>"#,
            ns = QTI_HTML5_NAMESPACE
        );
        let media = Media::try_from(unmarshall_with(SchemaVersion::V2_2_0, &xml).unwrap()).unwrap();
        assert_eq!(media.kind, MediaKind::Video);
        assert!(media.controls);
        assert_eq!(media.width.as_deref(), Some("320"));
        assert_eq!(media.sources[0].mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(media.tracks[0].kind, TrackKind::Captions);

        let xml = format!(
            r#"<qh5:audio xmlns:qh5="{ns}"><qh5:figcaption>x</qh5:figcaption></qh5:audio>"#,
            ns = QTI_HTML5_NAMESPACE
        );
        let err = unmarshall_with(SchemaVersion::V2_2_0, &xml).unwrap_err();
        assert!(err.message().contains("'source', 'track'"));
    }

    #[test]
    fn test_object_accepts_params() {
        let component = unmarshall_with(
            SchemaVersion::V2_1_0,
            r#"<object data="canvas.png" type="image/png"><param name="bg" value="white"/>fallback</object>"#,
        )
        .unwrap();
        let object = Object::try_from(component).unwrap();
        assert_eq!(object.content.len(), 2);
        assert_eq!(object.content[0].qti_class_name(), "param");
    }

    #[test]
    fn test_printed_variable_base_read_default() {
        let component =
            unmarshall_with(SchemaVersion::V2_1_0, r#"<printedVariable identifier="SCORE"/>"#).unwrap();
        let printed = PrintedVariable::try_from(component).unwrap();
        assert_eq!(printed.base, IntegerOrVariableRef::Integer(10));
        assert!(!printed.power_form);
    }

    #[test]
    fn test_show_hide_read_default() {
        let read = |xml: &str| unmarshall_with(SchemaVersion::V2_1_0, xml).unwrap();

        let inline = TemplateInline::try_from(read(
            r#"<templateInline templateIdentifier="T" identifier="A">x</templateInline>"#,
        ))
        .unwrap();
        assert_eq!(inline.show_hide, ShowHide::Show);

        let block = TemplateBlock::try_from(read(
            r#"<templateBlock templateIdentifier="T" identifier="A"><p>x</p></templateBlock>"#,
        ))
        .unwrap();
        assert_eq!(block.show_hide, ShowHide::Show);

        let feedback = FeedbackInline::try_from(read(
            r#"<feedbackInline outcomeIdentifier="FEEDBACK" identifier="A">x</feedbackInline>"#,
        ))
        .unwrap();
        assert_eq!(feedback.show_hide, ShowHide::Show);

        let hidden = FeedbackInline::try_from(read(
            r#"<feedbackInline outcomeIdentifier="FEEDBACK" identifier="A" showHide="hide">x</feedbackInline>"#,
        ))
        .unwrap();
        assert_eq!(hidden.show_hide, ShowHide::Hide);
    }

    #[test]
    fn test_param_valuetype_read_default() {
        let param = Param::try_from(
            unmarshall_with(SchemaVersion::V2_1_0, r#"<param name="bg" value="white"/>"#).unwrap(),
        )
        .unwrap();
        assert_eq!(param.value_type, ParamType::Data);
        assert_eq!(param.mime_type, None);
    }

    #[test]
    fn test_track_kind_read_default() {
        let xml = format!(
            r#"<qh5:video xmlns:qh5="{ns}"><qh5:source src="movie.mp4"/><qh5:track src="subs.vtt"/></qh5:video>"#,
            ns = QTI_HTML5_NAMESPACE
        );
        let media = Media::try_from(unmarshall_with(SchemaVersion::V2_2_0, &xml).unwrap()).unwrap();
        assert_eq!(media.tracks[0].kind, TrackKind::Subtitles);
        assert!(!media.tracks[0].default);
    }
}
