//! QTI component model
//!
//! Plain data holders for the element kinds this crate binds. Every payload
//! reports its [`QtiClass`]; [`Component`] is the closed sum of all payloads
//! and is what marshallers consume and produce.

mod assessment;
mod content;
mod expressions;
mod interactions;
mod rules;
mod variables;

pub use assessment::{
    AssessmentItem, AssessmentItemRef, AssessmentSection, AssessmentSectionRef,
    ExtendedAssessmentItemRef, ExtendedAssessmentSection, RubricBlockRef, Weight,
};
pub use content::{
    Anchor, BodyAttributes, Br, FeedbackInline, Figcaption, Figure, HtmlElement, HtmlKind, Img,
    Include, ItemBody, Math, Media, MediaKind, Object, Param, PrintedVariable, Prompt,
    RubricBlock, Source, TemplateBlock, TemplateInline, TextRun, Track,
};
pub use expressions::{
    expression_arity, AnyN, Arity, BaseValue, Correct, DefaultExpression, Equal, EqualRounded,
    Index, MathConstant, Null, Operator, OperatorKind, PatternMatch, RandomInteger, Repeat,
    RoundTo, StringMatch, Variable,
};
pub use interactions::{
    ChoiceInteraction, DrawingInteraction, SelectPointInteraction, SimpleChoice,
    TextEntryInteraction,
};
pub use rules::{
    ExitResponse, LookupOutcomeValue, ResponseCondition, ResponseElse, ResponseElseIf, ResponseIf,
    ResponseProcessing, SetOutcomeValue,
};
pub use variables::{
    CorrectResponse, DefaultValue, MapEntry, Mapping, OutcomeDeclaration, ResponseDeclaration,
    TemplateDeclaration, Value,
};

use crate::classes::QtiClass;

/// A typed node of the component graph
pub trait QtiComponent {
    /// The class this component is marshalled as
    fn qti_class(&self) -> QtiClass;

    /// The class name, identical to the element's local name
    fn qti_class_name(&self) -> &'static str {
        self.qti_class().as_str()
    }
}

/// Implements [`QtiComponent`] for payloads bound to a single class
macro_rules! fixed_class {
    ( $( $payload:ty => $class:ident ),+ $(,)? ) => {
        $(
            impl $crate::model::QtiComponent for $payload {
                fn qti_class(&self) -> $crate::classes::QtiClass {
                    $crate::classes::QtiClass::$class
                }
            }
        )+
    };
}
pub(crate) use fixed_class;

macro_rules! components {
    ( $( $variant:ident($payload:ty) ),+ $(,)? ) => {
        /// Any component
        #[derive(Debug, Clone, PartialEq)]
        pub enum Component {
            $(
                #[doc = concat!("A `", stringify!($payload), "`")]
                $variant($payload),
            )+
        }

        impl QtiComponent for Component {
            fn qti_class(&self) -> QtiClass {
                match self {
                    $( Component::$variant(c) => c.qti_class(), )+
                }
            }
        }

        $(
            impl From<$payload> for Component {
                fn from(c: $payload) -> Self {
                    Component::$variant(c)
                }
            }

            impl TryFrom<Component> for $payload {
                type Error = Component;

                fn try_from(c: Component) -> std::result::Result<Self, Component> {
                    match c {
                        Component::$variant(x) => Ok(x),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

components! {
    // Expressions
    BaseValue(BaseValue),
    Variable(Variable),
    Correct(Correct),
    Default(DefaultExpression),
    Null(Null),
    RandomInteger(RandomInteger),
    MathConstant(MathConstant),
    AnyN(AnyN),
    Equal(Equal),
    EqualRounded(EqualRounded),
    RoundTo(RoundTo),
    PatternMatch(PatternMatch),
    StringMatch(StringMatch),
    Index(Index),
    Repeat(Repeat),
    Operator(Operator),

    // Variables
    Value(Value),
    DefaultValue(DefaultValue),
    CorrectResponse(CorrectResponse),
    Mapping(Mapping),
    MapEntry(MapEntry),
    ResponseDeclaration(ResponseDeclaration),
    OutcomeDeclaration(OutcomeDeclaration),
    TemplateDeclaration(TemplateDeclaration),

    // Response processing
    ResponseProcessing(ResponseProcessing),
    ResponseCondition(ResponseCondition),
    ResponseIf(ResponseIf),
    ResponseElseIf(ResponseElseIf),
    ResponseElse(ResponseElse),
    SetOutcomeValue(SetOutcomeValue),
    LookupOutcomeValue(LookupOutcomeValue),
    ExitResponse(ExitResponse),

    // Content
    TextRun(TextRun),
    Html(HtmlElement),
    Anchor(Anchor),
    Br(Br),
    Img(Img),
    Object(Object),
    Param(Param),
    PrintedVariable(PrintedVariable),
    Prompt(Prompt),
    TemplateInline(TemplateInline),
    TemplateBlock(TemplateBlock),
    FeedbackInline(FeedbackInline),
    RubricBlock(RubricBlock),
    ItemBody(ItemBody),
    Math(Math),
    Include(Include),
    Figure(Figure),
    Figcaption(Figcaption),
    Media(Media),
    Source(Source),
    Track(Track),

    // Interactions
    ChoiceInteraction(ChoiceInteraction),
    SimpleChoice(SimpleChoice),
    TextEntryInteraction(TextEntryInteraction),
    DrawingInteraction(DrawingInteraction),
    SelectPointInteraction(SelectPointInteraction),

    // Assessment structure
    AssessmentItem(AssessmentItem),
    AssessmentItemRef(AssessmentItemRef),
    ExtendedAssessmentItemRef(ExtendedAssessmentItemRef),
    Weight(Weight),
    AssessmentSectionRef(AssessmentSectionRef),
    AssessmentSection(AssessmentSection),
    ExtendedAssessmentSection(ExtendedAssessmentSection),
    RubricBlockRef(RubricBlockRef),
}

impl Component {
    /// Shorthand for a text run
    pub fn text(text: impl Into<String>) -> Self {
        Component::TextRun(TextRun::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::QtiValue;

    #[test]
    fn test_component_reports_class() {
        let c: Component = BaseValue::new(QtiValue::Integer(1)).into();
        assert_eq!(c.qti_class(), QtiClass::BaseValue);
        assert_eq!(c.qti_class_name(), "baseValue");

        let c: Component = Operator::new(OperatorKind::Sum, vec![]).into();
        assert_eq!(c.qti_class_name(), "sum");

        let c = Component::text("hello");
        assert_eq!(c.qti_class(), QtiClass::TextRun);
    }

    #[test]
    fn test_extended_ref_shares_class_name() {
        let item_ref = AssessmentItemRef::new("Q01", "./Q01.xml");
        let extended: Component = ExtendedAssessmentItemRef::new(item_ref.clone()).into();
        let plain: Component = item_ref.into();
        assert_eq!(extended.qti_class_name(), plain.qti_class_name());
    }

    #[test]
    fn test_try_from_component() {
        let c: Component = Weight::new("W01", 2.0).into();
        let weight = Weight::try_from(c).unwrap();
        assert_eq!(weight.value, 2.0);

        let c: Component = Null.into();
        assert!(Weight::try_from(c).is_err());
    }
}
