//! Response processing rules

use super::{fixed_class, Component};

/// Response processing of an item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseProcessing {
    /// URI of a standard processing template
    pub template: Option<String>,
    /// Location the template can be fetched from
    pub template_location: Option<String>,
    /// Response rules, in order
    pub response_rules: Vec<Component>,
}

impl ResponseProcessing {
    /// Processing made of rules
    pub fn new(response_rules: Vec<Component>) -> Self {
        Self {
            response_rules,
            ..Self::default()
        }
    }

    /// Processing delegated to a template
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            ..Self::default()
        }
    }
}

/// An if / else-if / else chain
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCondition {
    /// The if branch
    pub response_if: ResponseIf,
    /// Else-if branches, in order
    pub response_else_ifs: Vec<ResponseElseIf>,
    /// The else branch
    pub response_else: Option<ResponseElse>,
}

impl ResponseCondition {
    /// A condition with a single branch
    pub fn new(response_if: ResponseIf) -> Self {
        Self {
            response_if,
            response_else_ifs: Vec::new(),
            response_else: None,
        }
    }
}

/// Branch guarded by an expression
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseIf {
    /// Guard
    pub expression: Box<Component>,
    /// Rules run when the guard is true
    pub response_rules: Vec<Component>,
}

impl ResponseIf {
    /// Create a branch
    pub fn new(expression: impl Into<Component>, response_rules: Vec<Component>) -> Self {
        Self {
            expression: Box::new(expression.into()),
            response_rules,
        }
    }
}

/// Alternative branch guarded by an expression
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseElseIf {
    /// Guard
    pub expression: Box<Component>,
    /// Rules run when the guard is true
    pub response_rules: Vec<Component>,
}

impl ResponseElseIf {
    /// Create a branch
    pub fn new(expression: impl Into<Component>, response_rules: Vec<Component>) -> Self {
        Self {
            expression: Box::new(expression.into()),
            response_rules,
        }
    }
}

/// Fallback branch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseElse {
    /// Rules run when no guard matched
    pub response_rules: Vec<Component>,
}

/// Assigns an outcome
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcomeValue {
    /// Outcome identifier
    pub identifier: String,
    /// Value expression
    pub expression: Box<Component>,
}

impl SetOutcomeValue {
    /// Create an assignment
    pub fn new(identifier: impl Into<String>, expression: impl Into<Component>) -> Self {
        Self {
            identifier: identifier.into(),
            expression: Box::new(expression.into()),
        }
    }
}

/// Assigns an outcome through its lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcomeValue {
    /// Outcome identifier
    pub identifier: String,
    /// Source value expression
    pub expression: Box<Component>,
}

impl LookupOutcomeValue {
    /// Create a lookup
    pub fn new(identifier: impl Into<String>, expression: impl Into<Component>) -> Self {
        Self {
            identifier: identifier.into(),
            expression: Box::new(expression.into()),
        }
    }
}

/// Stops response processing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExitResponse;

fixed_class! {
    ResponseProcessing => ResponseProcessing,
    ResponseCondition => ResponseCondition,
    ResponseIf => ResponseIf,
    ResponseElseIf => ResponseElseIf,
    ResponseElse => ResponseElse,
    SetOutcomeValue => SetOutcomeValue,
    LookupOutcomeValue => LookupOutcomeValue,
    ExitResponse => ExitResponse,
}
