//! QTI class names
//!
//! [`QtiClass`] is the closed set of element kinds this crate binds. Each
//! class knows its XML local name, the version that introduced it and the
//! content category that decides where it may be nested.

use std::fmt;

use crate::namespaces::{QTI_HTML5_NAMESPACE, QTI_HTML5_PREFIX};
use crate::version::SchemaVersion;

/// Where a class may appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    /// Only inside a specific parent
    Structural,
    /// An expression
    Expression,
    /// A response rule
    Rule,
    /// Inline content
    Inline,
    /// Block content
    Block,
    /// Both inline and block content
    Flow,
}

macro_rules! qti_classes {
    ( $( $variant:ident => $name:literal, $since:ident, $category:ident; )+ ) => {
        /// A QTI class name
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum QtiClass {
            $(
                #[doc = concat!("The `", $name, "` class")]
                $variant,
            )+
        }

        impl QtiClass {
            /// Every class, in declaration order
            pub const ALL: &'static [QtiClass] = &[ $( QtiClass::$variant, )+ ];

            /// The class name, identical to the XML local name
            pub fn as_str(self) -> &'static str {
                match self {
                    $( QtiClass::$variant => $name, )+
                }
            }

            /// Look up a class by name
            pub fn from_name(name: &str) -> Option<QtiClass> {
                match name {
                    $( $name => Some(QtiClass::$variant), )+
                    _ => None,
                }
            }

            /// First version defining this class
            pub fn introduced_in(self) -> SchemaVersion {
                match self {
                    $( QtiClass::$variant => SchemaVersion::$since, )+
                }
            }

            /// Content category of this class
            pub fn category(self) -> ContentCategory {
                match self {
                    $( QtiClass::$variant => ContentCategory::$category, )+
                }
            }
        }
    };
}

qti_classes! {
    // Expressions
    BaseValue => "baseValue", V2_0_0, Expression;
    Variable => "variable", V2_0_0, Expression;
    Correct => "correct", V2_0_0, Expression;
    Default => "default", V2_0_0, Expression;
    Null => "null", V2_0_0, Expression;
    RandomInteger => "randomInteger", V2_0_0, Expression;
    MathConstant => "mathConstant", V2_1_0, Expression;
    AnyN => "anyN", V2_0_0, Expression;
    Equal => "equal", V2_0_0, Expression;
    EqualRounded => "equalRounded", V2_0_0, Expression;
    RoundTo => "roundTo", V2_1_0, Expression;
    PatternMatch => "patternMatch", V2_0_0, Expression;
    StringMatch => "stringMatch", V2_0_0, Expression;
    Index => "index", V2_0_0, Expression;
    Repeat => "repeat", V2_1_0, Expression;
    Multiple => "multiple", V2_0_0, Expression;
    Ordered => "ordered", V2_0_0, Expression;
    ContainerSize => "containerSize", V2_0_0, Expression;
    IsNull => "isNull", V2_0_0, Expression;
    Random => "random", V2_0_0, Expression;
    Not => "not", V2_0_0, Expression;
    And => "and", V2_0_0, Expression;
    Or => "or", V2_0_0, Expression;
    Sum => "sum", V2_0_0, Expression;
    Product => "product", V2_0_0, Expression;
    Subtract => "subtract", V2_0_0, Expression;
    Divide => "divide", V2_0_0, Expression;
    Power => "power", V2_0_0, Expression;
    IntegerDivide => "integerDivide", V2_0_0, Expression;
    IntegerModulus => "integerModulus", V2_0_0, Expression;
    Truncate => "truncate", V2_0_0, Expression;
    Round => "round", V2_0_0, Expression;
    IntegerToFloat => "integerToFloat", V2_0_0, Expression;
    Match => "match", V2_0_0, Expression;
    Member => "member", V2_0_0, Expression;
    Delete => "delete", V2_0_0, Expression;
    Contains => "contains", V2_0_0, Expression;
    Lt => "lt", V2_0_0, Expression;
    Gt => "gt", V2_0_0, Expression;
    Lte => "lte", V2_0_0, Expression;
    Gte => "gte", V2_0_0, Expression;
    DurationLt => "durationLT", V2_0_0, Expression;
    DurationGte => "durationGTE", V2_0_0, Expression;
    Min => "min", V2_1_0, Expression;
    Max => "max", V2_1_0, Expression;
    Gcd => "gcd", V2_1_0, Expression;
    Lcm => "lcm", V2_1_0, Expression;

    // Variables
    Value => "value", V2_0_0, Structural;
    DefaultValue => "defaultValue", V2_0_0, Structural;
    CorrectResponse => "correctResponse", V2_0_0, Structural;
    Mapping => "mapping", V2_0_0, Structural;
    MapEntry => "mapEntry", V2_0_0, Structural;
    ResponseDeclaration => "responseDeclaration", V2_0_0, Structural;
    OutcomeDeclaration => "outcomeDeclaration", V2_0_0, Structural;
    TemplateDeclaration => "templateDeclaration", V2_0_0, Structural;

    // Response processing
    ResponseProcessing => "responseProcessing", V2_0_0, Structural;
    ResponseCondition => "responseCondition", V2_0_0, Rule;
    ResponseIf => "responseIf", V2_0_0, Structural;
    ResponseElseIf => "responseElseIf", V2_0_0, Structural;
    ResponseElse => "responseElse", V2_0_0, Structural;
    SetOutcomeValue => "setOutcomeValue", V2_0_0, Rule;
    LookupOutcomeValue => "lookupOutcomeValue", V2_0_0, Rule;
    ExitResponse => "exitResponse", V2_0_0, Rule;

    // Content
    TextRun => "textRun", V2_0_0, Inline;
    P => "p", V2_0_0, Block;
    Div => "div", V2_0_0, Block;
    Span => "span", V2_0_0, Inline;
    Em => "em", V2_0_0, Inline;
    Strong => "strong", V2_0_0, Inline;
    A => "a", V2_0_0, Inline;
    Br => "br", V2_0_0, Inline;
    Img => "img", V2_0_0, Inline;
    Object => "object", V2_0_0, Inline;
    Param => "param", V2_0_0, Structural;
    PrintedVariable => "printedVariable", V2_0_0, Inline;
    Prompt => "prompt", V2_0_0, Structural;
    TemplateInline => "templateInline", V2_0_0, Inline;
    TemplateBlock => "templateBlock", V2_0_0, Block;
    FeedbackInline => "feedbackInline", V2_0_0, Inline;
    RubricBlock => "rubricBlock", V2_0_0, Block;
    ItemBody => "itemBody", V2_0_0, Structural;
    Math => "math", V2_0_0, Flow;
    Include => "include", V2_0_0, Flow;
    Figure => "figure", V2_2_0, Block;
    Figcaption => "figcaption", V2_2_0, Structural;
    Audio => "audio", V2_2_0, Flow;
    Video => "video", V2_2_0, Flow;
    Source => "source", V2_2_0, Structural;
    Track => "track", V2_2_0, Structural;

    // Interactions
    ChoiceInteraction => "choiceInteraction", V2_0_0, Block;
    SimpleChoice => "simpleChoice", V2_0_0, Structural;
    TextEntryInteraction => "textEntryInteraction", V2_0_0, Inline;
    DrawingInteraction => "drawingInteraction", V2_0_0, Block;
    SelectPointInteraction => "selectPointInteraction", V2_0_0, Block;

    // Assessment structure
    AssessmentItem => "assessmentItem", V2_0_0, Structural;
    AssessmentItemRef => "assessmentItemRef", V2_0_0, Structural;
    Weight => "weight", V2_0_0, Structural;
    AssessmentSectionRef => "assessmentSectionRef", V2_0_0, Structural;
    AssessmentSection => "assessmentSection", V2_0_0, Structural;
    RubricBlockRef => "rubricBlockRef", V2_0_0, Structural;
}

impl QtiClass {
    /// Whether this class is available in `version`
    pub fn is_available_in(self, version: SchemaVersion) -> bool {
        version >= self.introduced_in()
    }

    /// Classes only the compact profile defines
    pub fn is_compact_only(self) -> bool {
        matches!(self, QtiClass::RubricBlockRef)
    }

    /// Whether this class may appear as inline content
    pub fn is_inline(self) -> bool {
        matches!(self.category(), ContentCategory::Inline | ContentCategory::Flow)
    }

    /// Whether this class may appear as block content
    pub fn is_block(self) -> bool {
        matches!(self.category(), ContentCategory::Block | ContentCategory::Flow)
    }

    /// Whether this class is an expression
    pub fn is_expression(self) -> bool {
        self.category() == ContentCategory::Expression
    }

    /// Whether this class is a response rule
    pub fn is_response_rule(self) -> bool {
        self.category() == ContentCategory::Rule
    }

    /// Whether this class lives in the QTI 2.2 HTML5 extension namespace
    pub fn is_html5(self) -> bool {
        matches!(
            self,
            QtiClass::Figure
                | QtiClass::Figcaption
                | QtiClass::Audio
                | QtiClass::Video
                | QtiClass::Source
                | QtiClass::Track
        )
    }

    /// Namespace and prefix of the element for this class in `version`
    pub fn element_namespace(self, version: SchemaVersion) -> (&'static str, Option<&'static str>) {
        if self.is_html5() {
            (QTI_HTML5_NAMESPACE, Some(QTI_HTML5_PREFIX))
        } else {
            (version.namespace(), None)
        }
    }
}

impl fmt::Display for QtiClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
