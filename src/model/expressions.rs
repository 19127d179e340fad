//! Expressions

use crate::classes::QtiClass;
use crate::datatypes::{
    BaseType, FloatOrVariableRef, IntegerOrVariableRef, MathConstantName, QtiValue, RoundingMode,
    StringOrVariableRef, ToleranceMode,
};

use super::{fixed_class, Component, QtiComponent};

/// Number of sub-expressions an operator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Minimum count
    pub min: usize,
    /// Maximum count, None when unbounded
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    /// Whether `count` sub-expressions are acceptable
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    /// Describes the constraint, e.g. "exactly 2 sub-expressions"
    pub fn describe(&self) -> String {
        let plural = |n: usize| if n == 1 { "sub-expression" } else { "sub-expressions" };
        match self.max {
            Some(max) if max == self.min => format!("exactly {} {}", max, plural(max)),
            Some(max) => format!("between {} and {} sub-expressions", self.min, max),
            None => format!("at least {} {}", self.min, plural(self.min)),
        }
    }
}

/// Sub-expression count accepted by an expression class, None for leaf expressions
pub fn expression_arity(class: QtiClass) -> Option<Arity> {
    use QtiClass::*;

    let arity = match class {
        Multiple | Ordered => Arity::at_least(0),
        ContainerSize | IsNull | Random | Not | Truncate | Round | IntegerToFloat | RoundTo
        | PatternMatch | Index | Repeat => Arity::exactly(1),
        And | Or | Sum | Product | Min | Max | Gcd | Lcm | AnyN => Arity::at_least(1),
        Subtract | Divide | Power | IntegerDivide | IntegerModulus | Match | Member | Delete
        | Contains | Lt | Gt | Lte | Gte | DurationLt | DurationGte | Equal | EqualRounded
        | StringMatch => Arity::exactly(2),
        _ => return None,
    };

    Some(arity)
}

/// A constant value
#[derive(Debug, Clone, PartialEq)]
pub struct BaseValue {
    /// The value, which also carries the base type
    pub value: QtiValue,
}

impl BaseValue {
    /// Create a base value
    pub fn new(value: QtiValue) -> Self {
        Self { value }
    }

    /// Base type of the value
    pub fn base_type(&self) -> BaseType {
        self.value.base_type()
    }
}

/// Value of an item or test variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variable {
    /// Variable identifier, possibly prefixed (`item.SCORE`)
    pub identifier: String,
    /// Weight applied to the value in a test context
    pub weight_identifier: Option<String>,
}

impl Variable {
    /// Create a variable reference
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            weight_identifier: None,
        }
    }
}

/// Correct value of a response variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Correct {
    /// Response variable identifier
    pub identifier: String,
}

/// Default value of a variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultExpression {
    /// Variable identifier
    pub identifier: String,
}

/// The NULL value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Null;

/// A random integer from a range
#[derive(Debug, Clone, PartialEq)]
pub struct RandomInteger {
    /// Lower bound, defaults to 0
    pub min: IntegerOrVariableRef,
    /// Upper bound
    pub max: IntegerOrVariableRef,
    /// Step, defaults to 1
    pub step: IntegerOrVariableRef,
}

impl RandomInteger {
    /// Create a range with the default minimum and step
    pub fn new(max: impl Into<IntegerOrVariableRef>) -> Self {
        Self {
            min: IntegerOrVariableRef::Integer(0),
            max: max.into(),
            step: IntegerOrVariableRef::Integer(1),
        }
    }
}

/// A mathematical constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MathConstant {
    /// Constant name
    pub name: MathConstantName,
}

/// True when between `min` and `max` sub-expressions are true
#[derive(Debug, Clone, PartialEq)]
pub struct AnyN {
    /// Minimum number of true sub-expressions
    pub min: IntegerOrVariableRef,
    /// Maximum number of true sub-expressions
    pub max: IntegerOrVariableRef,
    /// Sub-expressions
    pub expressions: Vec<Component>,
}

impl AnyN {
    /// Create an anyN operator
    pub fn new(
        expressions: Vec<Component>,
        min: impl Into<IntegerOrVariableRef>,
        max: impl Into<IntegerOrVariableRef>,
    ) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            expressions,
        }
    }
}

/// Numeric equality with optional tolerance
#[derive(Debug, Clone, PartialEq)]
pub struct Equal {
    /// Tolerance mode, defaults to exact
    pub tolerance_mode: ToleranceMode,
    /// One or two tolerance values; required unless the mode is exact
    pub tolerance: Vec<FloatOrVariableRef>,
    /// Whether the lower bound is included, defaults to true
    pub include_lower_bound: bool,
    /// Whether the upper bound is included, defaults to true
    pub include_upper_bound: bool,
    /// Sub-expressions
    pub expressions: Vec<Component>,
}

impl Equal {
    /// Create an exact comparison
    pub fn new(expressions: Vec<Component>) -> Self {
        Self {
            tolerance_mode: ToleranceMode::Exact,
            tolerance: Vec::new(),
            include_lower_bound: true,
            include_upper_bound: true,
            expressions,
        }
    }
}

/// Equality after rounding
#[derive(Debug, Clone, PartialEq)]
pub struct EqualRounded {
    /// Rounding mode, defaults to significant figures
    pub rounding_mode: RoundingMode,
    /// Number of figures
    pub figures: IntegerOrVariableRef,
    /// Sub-expressions
    pub expressions: Vec<Component>,
}

/// Rounds a value
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTo {
    /// Rounding mode, defaults to significant figures
    pub rounding_mode: RoundingMode,
    /// Number of figures
    pub figures: IntegerOrVariableRef,
    /// Sub-expression
    pub expressions: Vec<Component>,
}

/// Regular expression match
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// Pattern
    pub pattern: StringOrVariableRef,
    /// Sub-expression
    pub expressions: Vec<Component>,
}

/// String comparison
#[derive(Debug, Clone, PartialEq)]
pub struct StringMatch {
    /// Whether the comparison is case sensitive
    pub case_sensitive: bool,
    /// Whether the first string may be a substring of the second, defaults to false
    pub substring: bool,
    /// Sub-expressions
    pub expressions: Vec<Component>,
}

/// N-th value of an ordered container
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Index, 1-based
    pub n: IntegerOrVariableRef,
    /// Sub-expression
    pub expressions: Vec<Component>,
}

/// Repeats the sub-expressions into an ordered container
#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
    /// Number of repetitions
    pub number_repeats: IntegerOrVariableRef,
    /// Sub-expressions
    pub expressions: Vec<Component>,
}

/// Operators whose only content is their sub-expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum OperatorKind {
    Multiple,
    Ordered,
    ContainerSize,
    IsNull,
    Random,
    Not,
    And,
    Or,
    Sum,
    Product,
    Subtract,
    Divide,
    Power,
    IntegerDivide,
    IntegerModulus,
    Truncate,
    Round,
    IntegerToFloat,
    Match,
    Member,
    Delete,
    Contains,
    Lt,
    Gt,
    Lte,
    Gte,
    DurationLt,
    DurationGte,
    Min,
    Max,
    Gcd,
    Lcm,
}

impl OperatorKind {
    /// Every operator kind
    pub const ALL: [OperatorKind; 32] = [
        OperatorKind::Multiple,
        OperatorKind::Ordered,
        OperatorKind::ContainerSize,
        OperatorKind::IsNull,
        OperatorKind::Random,
        OperatorKind::Not,
        OperatorKind::And,
        OperatorKind::Or,
        OperatorKind::Sum,
        OperatorKind::Product,
        OperatorKind::Subtract,
        OperatorKind::Divide,
        OperatorKind::Power,
        OperatorKind::IntegerDivide,
        OperatorKind::IntegerModulus,
        OperatorKind::Truncate,
        OperatorKind::Round,
        OperatorKind::IntegerToFloat,
        OperatorKind::Match,
        OperatorKind::Member,
        OperatorKind::Delete,
        OperatorKind::Contains,
        OperatorKind::Lt,
        OperatorKind::Gt,
        OperatorKind::Lte,
        OperatorKind::Gte,
        OperatorKind::DurationLt,
        OperatorKind::DurationGte,
        OperatorKind::Min,
        OperatorKind::Max,
        OperatorKind::Gcd,
        OperatorKind::Lcm,
    ];

    /// Class this operator is marshalled as
    pub fn qti_class(self) -> QtiClass {
        match self {
            OperatorKind::Multiple => QtiClass::Multiple,
            OperatorKind::Ordered => QtiClass::Ordered,
            OperatorKind::ContainerSize => QtiClass::ContainerSize,
            OperatorKind::IsNull => QtiClass::IsNull,
            OperatorKind::Random => QtiClass::Random,
            OperatorKind::Not => QtiClass::Not,
            OperatorKind::And => QtiClass::And,
            OperatorKind::Or => QtiClass::Or,
            OperatorKind::Sum => QtiClass::Sum,
            OperatorKind::Product => QtiClass::Product,
            OperatorKind::Subtract => QtiClass::Subtract,
            OperatorKind::Divide => QtiClass::Divide,
            OperatorKind::Power => QtiClass::Power,
            OperatorKind::IntegerDivide => QtiClass::IntegerDivide,
            OperatorKind::IntegerModulus => QtiClass::IntegerModulus,
            OperatorKind::Truncate => QtiClass::Truncate,
            OperatorKind::Round => QtiClass::Round,
            OperatorKind::IntegerToFloat => QtiClass::IntegerToFloat,
            OperatorKind::Match => QtiClass::Match,
            OperatorKind::Member => QtiClass::Member,
            OperatorKind::Delete => QtiClass::Delete,
            OperatorKind::Contains => QtiClass::Contains,
            OperatorKind::Lt => QtiClass::Lt,
            OperatorKind::Gt => QtiClass::Gt,
            OperatorKind::Lte => QtiClass::Lte,
            OperatorKind::Gte => QtiClass::Gte,
            OperatorKind::DurationLt => QtiClass::DurationLt,
            OperatorKind::DurationGte => QtiClass::DurationGte,
            OperatorKind::Min => QtiClass::Min,
            OperatorKind::Max => QtiClass::Max,
            OperatorKind::Gcd => QtiClass::Gcd,
            OperatorKind::Lcm => QtiClass::Lcm,
        }
    }

    /// Operator kind of a class, if it is one
    pub fn from_class(class: QtiClass) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.qti_class() == class)
    }
}

/// An operator with no attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    /// Which operator
    pub kind: OperatorKind,
    /// Sub-expressions
    pub expressions: Vec<Component>,
}

impl Operator {
    /// Create an operator
    pub fn new(kind: OperatorKind, expressions: Vec<Component>) -> Self {
        Self { kind, expressions }
    }
}

impl QtiComponent for Operator {
    fn qti_class(&self) -> QtiClass {
        self.kind.qti_class()
    }
}

fixed_class! {
    BaseValue => BaseValue,
    Variable => Variable,
    Correct => Correct,
    DefaultExpression => Default,
    Null => Null,
    RandomInteger => RandomInteger,
    MathConstant => MathConstant,
    AnyN => AnyN,
    Equal => Equal,
    EqualRounded => EqualRounded,
    RoundTo => RoundTo,
    PatternMatch => PatternMatch,
    StringMatch => StringMatch,
    Index => Index,
    Repeat => Repeat,
}
