//! Body content
//!
//! XHTML-derived text containers, QTI specific inline and block elements,
//! the 2.2 HTML5 extension elements and the two foreign passthrough
//! wrappers.

use crate::classes::QtiClass;
use crate::datatypes::{Direction, IntegerOrVariableRef, ParamType, ShowHide, TrackKind, View};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::namespaces::{MATHML_NAMESPACE, XINCLUDE_NAMESPACE};

use super::{fixed_class, Component, QtiComponent};

/// Attributes shared by every body element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyAttributes {
    /// `id`
    pub id: Option<String>,
    /// `class`, split on whitespace
    pub classes: Vec<String>,
    /// `xml:lang`
    pub lang: Option<String>,
    /// `label`
    pub label: Option<String>,
    /// `dir` (2.2)
    pub dir: Option<Direction>,
}

impl BodyAttributes {
    /// Attributes with only an id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// A run of character data, written as a DOM text node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextRun {
    /// The text
    pub content: String,
}

impl TextRun {
    /// Create a text run
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// XHTML text containers sharing one shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HtmlKind {
    /// `p`, inline content
    P,
    /// `div`, flow content
    Div,
    /// `span`, inline content
    Span,
    /// `em`, inline content
    Em,
    /// `strong`, inline content
    Strong,
}

impl HtmlKind {
    /// Class this kind is marshalled as
    pub fn qti_class(self) -> QtiClass {
        match self {
            HtmlKind::P => QtiClass::P,
            HtmlKind::Div => QtiClass::Div,
            HtmlKind::Span => QtiClass::Span,
            HtmlKind::Em => QtiClass::Em,
            HtmlKind::Strong => QtiClass::Strong,
        }
    }

    /// Kind of a class, if it is one
    pub fn from_class(class: QtiClass) -> Option<Self> {
        match class {
            QtiClass::P => Some(HtmlKind::P),
            QtiClass::Div => Some(HtmlKind::Div),
            QtiClass::Span => Some(HtmlKind::Span),
            QtiClass::Em => Some(HtmlKind::Em),
            QtiClass::Strong => Some(HtmlKind::Strong),
            _ => None,
        }
    }

    /// Whether the content is restricted to inline elements
    pub fn inline_only(self) -> bool {
        self != HtmlKind::Div
    }
}

/// A `p`, `div`, `span`, `em` or `strong` element
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    /// Which element
    pub kind: HtmlKind,
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Children
    pub content: Vec<Component>,
}

impl HtmlElement {
    /// Create an element without attributes
    pub fn new(kind: HtmlKind, content: Vec<Component>) -> Self {
        Self {
            kind,
            attributes: BodyAttributes::default(),
            content,
        }
    }
}

impl QtiComponent for HtmlElement {
    fn qti_class(&self) -> QtiClass {
        self.kind.qti_class()
    }
}

/// Hyperlink
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Target URI
    pub href: String,
    /// `type`
    pub mime_type: Option<String>,
    /// Inline content
    pub content: Vec<Component>,
}

impl Anchor {
    /// Create a link
    pub fn new(href: impl Into<String>, content: Vec<Component>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            href: href.into(),
            mime_type: None,
            content,
        }
    }
}

/// Line break
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Br {
    /// Common body attributes
    pub attributes: BodyAttributes,
}

/// Image
#[derive(Debug, Clone, PartialEq)]
pub struct Img {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Image URI
    pub src: String,
    /// Alternative text
    pub alt: String,
    /// Width, kept as written (pixels or a percentage)
    pub width: Option<String>,
    /// Height, kept as written
    pub height: Option<String>,
    /// URI of a long description
    pub longdesc: Option<String>,
}

impl Img {
    /// Create an image
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            src: src.into(),
            alt: alt.into(),
            width: None,
            height: None,
            longdesc: None,
        }
    }
}

/// Embedded object
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Data URI
    pub data: String,
    /// MIME type (`type`)
    pub mime_type: String,
    /// Width, kept as written
    pub width: Option<String>,
    /// Height, kept as written
    pub height: Option<String>,
    /// Flow content and `param` children
    pub content: Vec<Component>,
}

impl Object {
    /// Create an object without fallback content
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            data: data.into(),
            mime_type: mime_type.into(),
            width: None,
            height: None,
            content: Vec::new(),
        }
    }
}

/// Parameter of an object
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Name
    pub name: String,
    /// Value
    pub value: String,
    /// `valuetype`, defaults to DATA
    pub value_type: ParamType,
    /// MIME type of a REF value
    pub mime_type: Option<String>,
}

impl Param {
    /// Create a DATA parameter
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            value_type: ParamType::Data,
            mime_type: None,
        }
    }
}

/// Displays the value of a variable
#[derive(Debug, Clone, PartialEq)]
pub struct PrintedVariable {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Variable identifier
    pub identifier: String,
    /// printf-style format
    pub format: Option<String>,
    /// Number base, defaults to 10
    pub base: IntegerOrVariableRef,
    /// Index into an ordered container (2.1)
    pub index: Option<IntegerOrVariableRef>,
    /// Whether exponents are rendered as powers (2.1)
    pub power_form: bool,
    /// Record field (2.1)
    pub field: Option<String>,
    /// Container delimiter (2.1)
    pub delimiter: Option<String>,
    /// Mapping indicator (2.1)
    pub mapping_indicator: Option<String>,
}

impl PrintedVariable {
    /// Create a printed variable with defaults
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            identifier: identifier.into(),
            format: None,
            base: IntegerOrVariableRef::Integer(10),
            index: None,
            power_form: false,
            field: None,
            delimiter: None,
            mapping_indicator: None,
        }
    }
}

/// Prompt of an interaction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prompt {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Inline content
    pub content: Vec<Component>,
}

impl Prompt {
    /// Create a prompt
    pub fn new(content: Vec<Component>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            content,
        }
    }
}

/// Inline content shown or hidden by a template variable
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateInline {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Template variable
    pub template_identifier: String,
    /// Value compared against the variable
    pub identifier: String,
    /// Visibility rule, defaults to show
    pub show_hide: ShowHide,
    /// Inline content
    pub content: Vec<Component>,
}

impl TemplateInline {
    /// Create an element shown on match
    pub fn new(
        template_identifier: impl Into<String>,
        identifier: impl Into<String>,
        content: Vec<Component>,
    ) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            template_identifier: template_identifier.into(),
            identifier: identifier.into(),
            show_hide: ShowHide::Show,
            content,
        }
    }
}

/// Block content shown or hidden by a template variable
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBlock {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Template variable
    pub template_identifier: String,
    /// Value compared against the variable
    pub identifier: String,
    /// Visibility rule, defaults to show
    pub show_hide: ShowHide,
    /// Block content
    pub content: Vec<Component>,
}

/// Inline feedback controlled by an outcome
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackInline {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Outcome variable
    pub outcome_identifier: String,
    /// Value compared against the outcome
    pub identifier: String,
    /// Visibility rule, defaults to show
    pub show_hide: ShowHide,
    /// Inline content
    pub content: Vec<Component>,
}

/// Instructions for a particular audience
#[derive(Debug, Clone, PartialEq)]
pub struct RubricBlock {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Intended views, at least one
    pub views: Vec<View>,
    /// Block content
    pub content: Vec<Component>,
}

impl RubricBlock {
    /// Create a rubric block
    pub fn new(views: Vec<View>, content: Vec<Component>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            views,
            content,
        }
    }
}

/// Body of an item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemBody {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Block content
    pub content: Vec<Component>,
}

/// MathML content kept as an opaque sub-tree
///
/// The root is checked on construction, so [`Math::xml`] always returns an
/// `m:math` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Math {
    xml: Element,
}

impl Math {
    /// Wrap a MathML `math` element
    pub fn new(xml: Element) -> Result<Self> {
        check_foreign_root(&xml, MATHML_NAMESPACE, "math")?;
        Ok(Self { xml })
    }

    /// The MathML element
    pub fn xml(&self) -> &Element {
        &self.xml
    }

    /// Unwrap the MathML element
    pub fn into_xml(self) -> Element {
        self.xml
    }
}

/// XInclude directive kept as an opaque sub-tree
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    xml: Element,
}

impl Include {
    /// Wrap an XInclude `include` element
    pub fn new(xml: Element) -> Result<Self> {
        check_foreign_root(&xml, XINCLUDE_NAMESPACE, "include")?;
        Ok(Self { xml })
    }

    /// The XInclude element
    pub fn xml(&self) -> &Element {
        &self.xml
    }

    /// Unwrap the XInclude element
    pub fn into_xml(self) -> Element {
        self.xml
    }

    /// The included resource
    pub fn href(&self) -> Option<&str> {
        self.xml.attribute("href")
    }
}

fn check_foreign_root(xml: &Element, namespace: &str, local_name: &str) -> Result<()> {
    if xml.namespace() != Some(namespace) {
        return Err(Error::InvalidArgument(format!(
            "The root element of the embedded document must be in the '{}' namespace, '{}' given.",
            namespace,
            xml.namespace().unwrap_or("")
        )));
    }
    if xml.local_name() != local_name {
        return Err(Error::InvalidArgument(format!(
            "The root element of the embedded document must be '{}', '{}' given.",
            local_name,
            xml.local_name()
        )));
    }
    Ok(())
}

/// Self-contained illustration (2.2)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Figure {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Flow content and at most one `figcaption`
    pub content: Vec<Component>,
}

/// Caption of a figure (2.2)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Figcaption {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Inline content
    pub content: Vec<Component>,
}

/// Audio or video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// `audio`
    Audio,
    /// `video`
    Video,
}

impl MediaKind {
    /// Class this kind is marshalled as
    pub fn qti_class(self) -> QtiClass {
        match self {
            MediaKind::Audio => QtiClass::Audio,
            MediaKind::Video => QtiClass::Video,
        }
    }
}

/// An `audio` or `video` element (2.2)
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    /// Which element
    pub kind: MediaKind,
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Media URI, when no `source` children are given
    pub src: Option<String>,
    /// `autoplay`
    pub autoplay: bool,
    /// `controls`
    pub controls: bool,
    /// `loop`
    pub looping: bool,
    /// `muted`
    pub muted: bool,
    /// Width, video only
    pub width: Option<String>,
    /// Height, video only
    pub height: Option<String>,
    /// Poster image, video only
    pub poster: Option<String>,
    /// Alternative sources
    pub sources: Vec<Source>,
    /// Text tracks
    pub tracks: Vec<Track>,
}

impl Media {
    /// Create an element without sources
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            attributes: BodyAttributes::default(),
            src: None,
            autoplay: false,
            controls: false,
            looping: false,
            muted: false,
            width: None,
            height: None,
            poster: None,
            sources: Vec::new(),
            tracks: Vec::new(),
        }
    }
}

impl QtiComponent for Media {
    fn qti_class(&self) -> QtiClass {
        self.kind.qti_class()
    }
}

/// Media source (2.2)
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// URI
    pub src: String,
    /// MIME type (`type`)
    pub mime_type: Option<String>,
}

impl Source {
    /// Create a source
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            mime_type: None,
        }
    }
}

/// Media text track (2.2)
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// URI
    pub src: String,
    /// Kind, defaults to subtitles
    pub kind: TrackKind,
    /// Language of the track
    pub srclang: Option<String>,
    /// Title
    pub label: Option<String>,
    /// Whether the track is enabled by default
    pub default: bool,
}

impl Track {
    /// Create a subtitles track
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            kind: TrackKind::Subtitles,
            srclang: None,
            label: None,
            default: false,
        }
    }
}

fixed_class! {
    TextRun => TextRun,
    Anchor => A,
    Br => Br,
    Img => Img,
    Object => Object,
    Param => Param,
    PrintedVariable => PrintedVariable,
    Prompt => Prompt,
    TemplateInline => TemplateInline,
    TemplateBlock => TemplateBlock,
    FeedbackInline => FeedbackInline,
    RubricBlock => RubricBlock,
    ItemBody => ItemBody,
    Math => Math,
    Include => Include,
    Figure => Figure,
    Figcaption => Figcaption,
    Source => Source,
    Track => Track,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::QTI_V2P1_NAMESPACE;

    #[test]
    fn test_math_checks_root() {
        let math = Math::new(Element::namespaced(MATHML_NAMESPACE, "math")).unwrap();
        assert_eq!(math.xml().local_name(), "math");

        let err = Math::new(Element::namespaced(QTI_V2P1_NAMESPACE, "math")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(Math::new(Element::namespaced(MATHML_NAMESPACE, "mi")).is_err());
    }

    #[test]
    fn test_include_href() {
        let xml = Element::namespaced(XINCLUDE_NAMESPACE, "include").with_attribute("href", "rubric.xml");
        let include = Include::new(xml).unwrap();
        assert_eq!(include.href(), Some("rubric.xml"));
        assert!(Include::new(Element::namespaced(MATHML_NAMESPACE, "include")).is_err());
    }

    #[test]
    fn test_html_kinds() {
        assert_eq!(HtmlKind::from_class(QtiClass::Em), Some(HtmlKind::Em));
        assert_eq!(HtmlKind::from_class(QtiClass::A), None);
        assert!(HtmlKind::P.inline_only());
        assert!(!HtmlKind::Div.inline_only());
        let media = Media::new(MediaKind::Video);
        assert_eq!(media.qti_class_name(), "video");
    }
}
