//! Marshallers
//!
//! One [`ElementMarshaller`] per QTI class converts between a [`Component`]
//! and its XML element. Marshallers are stateless; the factory they were
//! resolved from and the call-scoped [`MarshallingContext`] travel in the
//! [`Marshaller`] handle passed to every call, which is also how children
//! are resolved.

use std::fmt;
use std::sync::Arc;

use crate::classes::QtiClass;
use crate::datatypes::{BaseType, Cardinality};
use crate::documents::{Element, Node};
use crate::error::{Error, Result};
use crate::factory::MarshallerFactory;
use crate::model::{Component, HtmlKind, MediaKind, OperatorKind, QtiComponent};
use crate::version::{Profile, SchemaVersion};

pub(crate) mod helpers;

mod assessment;
mod compact;
mod content;
mod expressions;
mod foreign;
mod interactions;
mod rules;
mod variables;

pub use assessment::{
    AssessmentItemMarshaller, AssessmentItemRefMarshaller, AssessmentSectionMarshaller,
    AssessmentSectionRefMarshaller, WeightMarshaller,
};
pub use compact::{
    ExtendedAssessmentItemRefMarshaller, ExtendedAssessmentSectionMarshaller,
    RubricBlockRefMarshaller,
};
pub use content::{
    AnchorMarshaller, BrMarshaller, FeedbackInlineMarshaller, FigcaptionMarshaller,
    FigureMarshaller, HtmlMarshaller, ImgMarshaller, ItemBodyMarshaller, MediaMarshaller,
    ObjectMarshaller, ParamMarshaller, PrintedVariableMarshaller, PromptMarshaller,
    RubricBlockMarshaller, SourceMarshaller, TemplateBlockMarshaller, TemplateInlineMarshaller,
    TextRunMarshaller, TrackMarshaller,
};
pub use expressions::{
    AnyNMarshaller, BaseValueMarshaller, CorrectMarshaller, DefaultMarshaller,
    EqualMarshaller, EqualRoundedMarshaller, IndexMarshaller, MathConstantMarshaller,
    NullMarshaller, OperatorMarshaller, PatternMatchMarshaller, RandomIntegerMarshaller,
    RepeatMarshaller, RoundToMarshaller, StringMatchMarshaller, VariableMarshaller,
};
pub use foreign::{IncludeMarshaller, MathMarshaller};
pub use interactions::{
    ChoiceInteractionMarshaller, DrawingInteractionMarshaller, SelectPointInteractionMarshaller,
    SimpleChoiceMarshaller, TextEntryInteractionMarshaller,
};
pub use rules::{
    ExitResponseMarshaller, LookupOutcomeValueMarshaller, ResponseConditionMarshaller,
    ResponseElseIfMarshaller, ResponseElseMarshaller, ResponseIfMarshaller,
    ResponseProcessingMarshaller, SetOutcomeValueMarshaller,
};
pub use variables::{
    CorrectResponseMarshaller, DefaultValueMarshaller, MapEntryMarshaller, MappingMarshaller,
    OutcomeDeclarationMarshaller, ResponseDeclarationMarshaller, TemplateDeclarationMarshaller,
    ValueMarshaller,
};

/// Typing hints not derivable from the element itself
///
/// Declarations pass their base type and cardinality to the values,
/// mappings and map entries they contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarshallingContext {
    /// Base type of the enclosing declaration
    pub base_type: Option<BaseType>,
    /// Cardinality of the enclosing declaration
    pub cardinality: Option<Cardinality>,
}

impl MarshallingContext {
    /// An empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying a base type
    pub fn with_base_type(mut self, base_type: BaseType) -> Self {
        self.base_type = Some(base_type);
        self
    }

    /// Context carrying a cardinality
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }
}

/// Conversion strategy for one QTI class
pub trait ElementMarshaller: Send + Sync + fmt::Debug {
    /// Implementation name, e.g. `AnyNMarshaller`
    fn name(&self) -> &'static str;

    /// The class this marshaller handles
    fn qti_class(&self) -> QtiClass;

    /// Component to element
    fn marshall_element(&self, m: &Marshaller<'_>, component: &Component) -> Result<Element>;

    /// Element to component
    fn unmarshall_element(&self, m: &Marshaller<'_>, element: &Element) -> Result<Component>;

    /// Component to node; only text runs produce something other than an element
    fn marshall(&self, m: &Marshaller<'_>, component: &Component) -> Result<Node> {
        self.marshall_element(m, component).map(Node::Element)
    }

    /// Node to component
    fn unmarshall(&self, m: &Marshaller<'_>, node: &Node) -> Result<Component> {
        match node {
            Node::Element(e) => self.unmarshall_element(m, e),
            other => Err(Error::unmarshalling(format!(
                "The '{}' marshaller expects an element, a {} node was given.",
                self.name(),
                other.kind()
            ))),
        }
    }
}

/// A marshaller bound to its factory and context
///
/// Handles are cheap, created per call by
/// [`MarshallerFactory::create_marshaller`], and not meant to be shared.
#[derive(Debug, Clone)]
pub struct Marshaller<'f> {
    factory: &'f MarshallerFactory,
    inner: Arc<dyn ElementMarshaller>,
    context: MarshallingContext,
}

impl<'f> Marshaller<'f> {
    pub(crate) fn new(
        factory: &'f MarshallerFactory,
        inner: Arc<dyn ElementMarshaller>,
        context: MarshallingContext,
    ) -> Self {
        Self {
            factory,
            inner,
            context,
        }
    }

    /// Implementation name
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// The class this marshaller handles
    pub fn qti_class(&self) -> QtiClass {
        self.inner.qti_class()
    }

    /// The local name of the elements this marshaller reads and writes
    pub fn expected_qti_class_name(&self) -> &'static str {
        self.inner.qti_class().as_str()
    }

    /// Call-scoped typing hints
    pub fn context(&self) -> &MarshallingContext {
        &self.context
    }

    /// The owning factory
    pub fn factory(&self) -> &'f MarshallerFactory {
        self.factory
    }

    /// Version of the owning factory
    pub fn version(&self) -> SchemaVersion {
        self.factory.version()
    }

    /// Profile of the owning factory
    pub fn profile(&self) -> Profile {
        self.factory.profile()
    }

    /// Marshall a component of this marshaller's class
    pub fn marshall(&self, component: &Component) -> Result<Node> {
        if component.qti_class() != self.qti_class() {
            return Err(Error::marshalling(format!(
                "The '{}' marshaller cannot marshall '{}' components.",
                self.name(),
                component.qti_class_name()
            )));
        }

        self.inner.marshall(self, component).map_err(|e| match e {
            Error::Marshalling(inner) if inner.component.is_none() => {
                Error::Marshalling(inner.with_component(component.qti_class_name()))
            }
            other => other,
        })
    }

    /// Marshall a component that is written as an element
    pub fn marshall_element(&self, component: &Component) -> Result<Element> {
        match self.marshall(component)? {
            Node::Element(e) => Ok(e),
            other => Err(Error::marshalling(format!(
                "The '{}' marshaller produced a {} node where an element was expected.",
                self.name(),
                other.kind()
            ))),
        }
    }

    /// Unmarshall a node of this marshaller's class
    pub fn unmarshall(&self, node: &Node) -> Result<Component> {
        match node {
            Node::Element(e) => self.unmarshall_element(e),
            other => self.inner.unmarshall(self, other),
        }
    }

    /// Unmarshall an element of this marshaller's class
    pub fn unmarshall_element(&self, element: &Element) -> Result<Component> {
        if element.local_name() != self.expected_qti_class_name() {
            return Err(Error::unmarshalling(format!(
                "The '{}' marshaller expects a '{}' element, '{}' given.",
                self.name(),
                self.expected_qti_class_name(),
                element.local_name()
            )));
        }

        self.inner
            .unmarshall_element(self, element)
            .map_err(|e| match e {
                Error::Unmarshalling(inner) if inner.element.is_none() => {
                    Error::Unmarshalling(inner.with_element(element.local_name()))
                }
                other => other,
            })
    }

    /// Marshall a child component through the owning factory
    pub fn marshall_child(&self, component: &Component) -> Result<Node> {
        self.marshall_child_with(component, MarshallingContext::default())
    }

    /// Marshall a child component with a context
    pub fn marshall_child_with(
        &self,
        component: &Component,
        context: MarshallingContext,
    ) -> Result<Node> {
        self.factory
            .create_marshaller(component, context)?
            .marshall(component)
    }

    /// Unmarshall a child node through the owning factory
    pub fn unmarshall_child(&self, node: &Node) -> Result<Component> {
        self.unmarshall_child_with(node, MarshallingContext::default())
    }

    /// Unmarshall a child node with a context
    pub fn unmarshall_child_with(&self, node: &Node, context: MarshallingContext) -> Result<Component> {
        self.factory.create_marshaller(node, context)?.unmarshall(node)
    }

    /// A new, empty element for this marshaller's class
    pub fn new_element(&self) -> Element {
        let (namespace, prefix) = self.qti_class().element_namespace(self.version());
        let element = Element::namespaced(namespace, self.expected_qti_class_name());
        match prefix {
            Some(p) => element.with_prefix(p),
            None => element,
        }
    }
}

/// The standard marshaller of a class, None for classes only a profile defines
pub(crate) fn standard_marshaller(class: QtiClass) -> Option<Arc<dyn ElementMarshaller>> {
    use QtiClass::*;

    let marshaller: Arc<dyn ElementMarshaller> = match class {
        BaseValue => Arc::new(BaseValueMarshaller),
        Variable => Arc::new(VariableMarshaller),
        Correct => Arc::new(CorrectMarshaller),
        Default => Arc::new(DefaultMarshaller),
        Null => Arc::new(NullMarshaller),
        RandomInteger => Arc::new(RandomIntegerMarshaller),
        MathConstant => Arc::new(MathConstantMarshaller),
        AnyN => Arc::new(AnyNMarshaller),
        Equal => Arc::new(EqualMarshaller),
        EqualRounded => Arc::new(EqualRoundedMarshaller),
        RoundTo => Arc::new(RoundToMarshaller),
        PatternMatch => Arc::new(PatternMatchMarshaller),
        StringMatch => Arc::new(StringMatchMarshaller),
        Index => Arc::new(IndexMarshaller),
        Repeat => Arc::new(RepeatMarshaller),
        Multiple | Ordered | ContainerSize | IsNull | Random | Not | And | Or | Sum | Product
        | Subtract | Divide | Power | IntegerDivide | IntegerModulus | Truncate | Round
        | IntegerToFloat | Match | Member | Delete | Contains | Lt | Gt | Lte | Gte | DurationLt
        | DurationGte | Min | Max | Gcd | Lcm => {
            Arc::new(OperatorMarshaller::new(OperatorKind::from_class(class)?))
        }

        Value => Arc::new(ValueMarshaller),
        DefaultValue => Arc::new(DefaultValueMarshaller),
        CorrectResponse => Arc::new(CorrectResponseMarshaller),
        Mapping => Arc::new(MappingMarshaller),
        MapEntry => Arc::new(MapEntryMarshaller),
        ResponseDeclaration => Arc::new(ResponseDeclarationMarshaller),
        OutcomeDeclaration => Arc::new(OutcomeDeclarationMarshaller),
        TemplateDeclaration => Arc::new(TemplateDeclarationMarshaller),

        ResponseProcessing => Arc::new(ResponseProcessingMarshaller),
        ResponseCondition => Arc::new(ResponseConditionMarshaller),
        ResponseIf => Arc::new(ResponseIfMarshaller),
        ResponseElseIf => Arc::new(ResponseElseIfMarshaller),
        ResponseElse => Arc::new(ResponseElseMarshaller),
        SetOutcomeValue => Arc::new(SetOutcomeValueMarshaller),
        LookupOutcomeValue => Arc::new(LookupOutcomeValueMarshaller),
        ExitResponse => Arc::new(ExitResponseMarshaller),

        TextRun => Arc::new(TextRunMarshaller),
        P | Div | Span | Em | Strong => Arc::new(HtmlMarshaller::new(HtmlKind::from_class(class)?)),
        A => Arc::new(AnchorMarshaller),
        Br => Arc::new(BrMarshaller),
        Img => Arc::new(ImgMarshaller),
        Object => Arc::new(ObjectMarshaller),
        Param => Arc::new(ParamMarshaller),
        PrintedVariable => Arc::new(PrintedVariableMarshaller),
        Prompt => Arc::new(PromptMarshaller),
        TemplateInline => Arc::new(TemplateInlineMarshaller),
        TemplateBlock => Arc::new(TemplateBlockMarshaller),
        FeedbackInline => Arc::new(FeedbackInlineMarshaller),
        RubricBlock => Arc::new(RubricBlockMarshaller),
        ItemBody => Arc::new(ItemBodyMarshaller),
        Math => Arc::new(MathMarshaller),
        Include => Arc::new(IncludeMarshaller),
        Figure => Arc::new(FigureMarshaller),
        Figcaption => Arc::new(FigcaptionMarshaller),
        Audio => Arc::new(MediaMarshaller::new(MediaKind::Audio)),
        Video => Arc::new(MediaMarshaller::new(MediaKind::Video)),
        Source => Arc::new(SourceMarshaller),
        Track => Arc::new(TrackMarshaller),

        ChoiceInteraction => Arc::new(ChoiceInteractionMarshaller),
        SimpleChoice => Arc::new(SimpleChoiceMarshaller),
        TextEntryInteraction => Arc::new(TextEntryInteractionMarshaller),
        DrawingInteraction => Arc::new(DrawingInteractionMarshaller),
        SelectPointInteraction => Arc::new(SelectPointInteractionMarshaller),

        AssessmentItem => Arc::new(AssessmentItemMarshaller),
        AssessmentItemRef => Arc::new(AssessmentItemRefMarshaller),
        Weight => Arc::new(WeightMarshaller),
        AssessmentSectionRef => Arc::new(AssessmentSectionRefMarshaller),
        AssessmentSection => Arc::new(AssessmentSectionMarshaller),
        RubricBlockRef => return None,
    };

    Some(marshaller)
}

/// Marshallers the compact profile puts in front of the standard table
pub(crate) fn compact_overrides() -> Vec<Arc<dyn ElementMarshaller>> {
    vec![
        Arc::new(ExtendedAssessmentItemRefMarshaller),
        Arc::new(ExtendedAssessmentSectionMarshaller),
        Arc::new(RubricBlockRefMarshaller),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_complete() {
        for class in QtiClass::ALL {
            let marshaller = standard_marshaller(*class);
            if class.is_compact_only() {
                assert!(marshaller.is_none());
            } else {
                let marshaller = marshaller.unwrap();
                assert_eq!(marshaller.qti_class(), *class, "{}", marshaller.name());
            }
        }
    }

    #[test]
    fn test_compact_overrides() {
        let classes: Vec<QtiClass> = compact_overrides().iter().map(|m| m.qti_class()).collect();
        assert_eq!(
            classes,
            vec![
                QtiClass::AssessmentItemRef,
                QtiClass::AssessmentSection,
                QtiClass::RubricBlockRef
            ]
        );
    }

    #[test]
    fn test_context_builders() {
        let cx = MarshallingContext::new()
            .with_base_type(BaseType::Integer)
            .with_cardinality(Cardinality::Single);
        assert_eq!(cx.base_type, Some(BaseType::Integer));
        assert_eq!(cx.cardinality, Some(Cardinality::Single));
    }
}
