//! Variable declarations and values

use crate::datatypes::{BaseType, Cardinality, ExternalScored, QtiValue, View};

use super::fixed_class;

/// A single value of a declaration, a default or a correct response
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    /// The typed value
    pub value: QtiValue,
    /// Field name when the value belongs to a record
    pub field_identifier: Option<String>,
}

impl Value {
    /// Create a value
    pub fn new(value: QtiValue) -> Self {
        Self {
            value,
            field_identifier: None,
        }
    }

    /// Create a record field value
    pub fn field(field_identifier: impl Into<String>, value: QtiValue) -> Self {
        Self {
            value,
            field_identifier: Some(field_identifier.into()),
        }
    }

    /// Base type of the value
    pub fn base_type(&self) -> BaseType {
        self.value.base_type()
    }

    /// Whether the value is a field of a record
    pub fn is_part_of_record(&self) -> bool {
        self.field_identifier.is_some()
    }
}

/// Default value of a declaration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultValue {
    /// Human readable interpretation
    pub interpretation: Option<String>,
    /// Values, at least one
    pub values: Vec<Value>,
}

impl DefaultValue {
    /// Create a default value
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            interpretation: None,
            values,
        }
    }
}

/// Correct response of a response declaration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorrectResponse {
    /// Human readable interpretation
    pub interpretation: Option<String>,
    /// Values, at least one
    pub values: Vec<Value>,
}

impl CorrectResponse {
    /// Create a correct response
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            interpretation: None,
            values,
        }
    }
}

/// Maps response values to scores
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Lower bound of the mapped sum
    pub lower_bound: Option<f64>,
    /// Upper bound of the mapped sum
    pub upper_bound: Option<f64>,
    /// Score of unmapped values, defaults to 0
    pub default_value: f64,
    /// Entries, at least one
    pub map_entries: Vec<MapEntry>,
}

impl Mapping {
    /// Create a mapping with the default default value
    pub fn new(map_entries: Vec<MapEntry>) -> Self {
        Self {
            lower_bound: None,
            upper_bound: None,
            default_value: 0.0,
            map_entries,
        }
    }
}

/// One key of a mapping
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// Key, typed by the enclosing declaration
    pub map_key: QtiValue,
    /// Score
    pub mapped_value: f64,
    /// Whether string keys compare case sensitively, defaults to true
    pub case_sensitive: bool,
}

impl MapEntry {
    /// Create a case sensitive entry
    pub fn new(map_key: QtiValue, mapped_value: f64) -> Self {
        Self {
            map_key,
            mapped_value,
            case_sensitive: true,
        }
    }
}

/// Declares a response variable
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDeclaration {
    /// Identifier
    pub identifier: String,
    /// Cardinality
    pub cardinality: Cardinality,
    /// Base type, absent only for records
    pub base_type: Option<BaseType>,
    /// Default value
    pub default_value: Option<DefaultValue>,
    /// Correct response
    pub correct_response: Option<CorrectResponse>,
    /// Mapping
    pub mapping: Option<Mapping>,
}

impl ResponseDeclaration {
    /// Create a declaration without values
    pub fn new(identifier: impl Into<String>, cardinality: Cardinality, base_type: Option<BaseType>) -> Self {
        Self {
            identifier: identifier.into(),
            cardinality,
            base_type,
            default_value: None,
            correct_response: None,
            mapping: None,
        }
    }
}

/// Declares an outcome variable
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeDeclaration {
    /// Identifier
    pub identifier: String,
    /// Cardinality
    pub cardinality: Cardinality,
    /// Base type, absent only for records
    pub base_type: Option<BaseType>,
    /// Views the outcome is relevant to
    pub views: Vec<View>,
    /// Human readable interpretation
    pub interpretation: Option<String>,
    /// URI of an extended description
    pub long_interpretation: Option<String>,
    /// Normal maximum
    pub normal_maximum: Option<f64>,
    /// Normal minimum (2.1)
    pub normal_minimum: Option<f64>,
    /// Mastery value (2.1)
    pub mastery_value: Option<f64>,
    /// External scoring (2.2)
    pub external_scored: Option<ExternalScored>,
    /// Default value
    pub default_value: Option<DefaultValue>,
}

impl OutcomeDeclaration {
    /// Create a declaration without values
    pub fn new(identifier: impl Into<String>, cardinality: Cardinality, base_type: Option<BaseType>) -> Self {
        Self {
            identifier: identifier.into(),
            cardinality,
            base_type,
            views: Vec::new(),
            interpretation: None,
            long_interpretation: None,
            normal_maximum: None,
            normal_minimum: None,
            mastery_value: None,
            external_scored: None,
            default_value: None,
        }
    }
}

/// Declares a template variable
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDeclaration {
    /// Identifier
    pub identifier: String,
    /// Cardinality
    pub cardinality: Cardinality,
    /// Base type, absent only for records
    pub base_type: Option<BaseType>,
    /// Whether the value is substituted into object parameters
    pub param_variable: bool,
    /// Whether the value is substituted into MathML
    pub math_variable: bool,
    /// Default value
    pub default_value: Option<DefaultValue>,
}

impl TemplateDeclaration {
    /// Create a declaration without values
    pub fn new(identifier: impl Into<String>, cardinality: Cardinality, base_type: Option<BaseType>) -> Self {
        Self {
            identifier: identifier.into(),
            cardinality,
            base_type,
            param_variable: false,
            math_variable: false,
            default_value: None,
        }
    }
}

fixed_class! {
    Value => Value,
    DefaultValue => DefaultValue,
    CorrectResponse => CorrectResponse,
    Mapping => Mapping,
    MapEntry => MapEntry,
    ResponseDeclaration => ResponseDeclaration,
    OutcomeDeclaration => OutcomeDeclaration,
    TemplateDeclaration => TemplateDeclaration,
}
