//! QTI data types
//!
//! Enumerated attribute types, typed scalar values and the
//! literal-or-variable-reference attribute types. Every type here converts
//! to and from its canonical XML literal.

use std::fmt;

use crate::names::{is_valid_duration, is_valid_identifier, is_valid_variable_ref};

/// An enumerated attribute type with a closed set of XML literals
pub trait QtiEnum: Sized + Copy + fmt::Debug + 'static {
    /// Every variant, in schema order
    const VARIANTS: &'static [Self];

    /// XML literal of this variant
    fn as_str(&self) -> &'static str;

    /// Parse an XML literal
    fn from_qti_str(s: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.as_str() == s)
    }

    /// Comma separated list of the legal literals, for error messages
    fn expected() -> String {
        Self::VARIANTS
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! qti_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $literal:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl QtiEnum for $name {
            const VARIANTS: &'static [Self] = &[ $( $name::$variant, )+ ];

            fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $literal, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

qti_enum! {
    /// Scalar type of a QTI value
    pub enum BaseType {
        /// Identifier
        Identifier => "identifier",
        /// Boolean
        Boolean => "boolean",
        /// Integer
        Integer => "integer",
        /// Float
        Float => "float",
        /// String
        String => "string",
        /// Point, two integers
        Point => "point",
        /// Unordered pair of identifiers
        Pair => "pair",
        /// Ordered pair of identifiers
        DirectedPair => "directedPair",
        /// xs:duration
        Duration => "duration",
        /// File
        File => "file",
        /// URI
        Uri => "uri",
        /// Integer or identifier
        IntOrIdentifier => "intOrIdentifier",
    }
}

qti_enum! {
    /// Container shape of a QTI variable
    pub enum Cardinality {
        /// A single value
        Single => "single",
        /// An unordered collection
        Multiple => "multiple",
        /// An ordered collection
        Ordered => "ordered",
        /// A record of named fields
        Record => "record",
    }
}

qti_enum! {
    /// Visibility rule of template and feedback content
    pub enum ShowHide {
        /// Shown when the identifier matches
        Show => "show",
        /// Hidden when the identifier matches
        Hide => "hide",
    }
}

impl Default for ShowHide {
    fn default() -> Self {
        ShowHide::Show
    }
}

qti_enum! {
    /// Rounding mode of equalRounded and roundTo
    pub enum RoundingMode {
        /// Round to a number of significant figures
        SignificantFigures => "significantFigures",
        /// Round to a number of decimal places
        DecimalPlaces => "decimalPlaces",
    }
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::SignificantFigures
    }
}

qti_enum! {
    /// Tolerance mode of the equal operator
    pub enum ToleranceMode {
        /// Exact comparison
        Exact => "exact",
        /// Absolute tolerance
        Absolute => "absolute",
        /// Relative tolerance, in percent
        Relative => "relative",
    }
}

impl Default for ToleranceMode {
    fn default() -> Self {
        ToleranceMode::Exact
    }
}

qti_enum! {
    /// Layout hint for choice interactions
    pub enum Orientation {
        /// Vertical
        Vertical => "vertical",
        /// Horizontal
        Horizontal => "horizontal",
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Vertical
    }
}

qti_enum! {
    /// Intended audience of a rubric block
    pub enum View {
        /// Author
        Author => "author",
        /// Candidate
        Candidate => "candidate",
        /// Proctor
        Proctor => "proctor",
        /// Scorer
        Scorer => "scorer",
        /// Test constructor
        TestConstructor => "testConstructor",
        /// Tutor
        Tutor => "tutor",
    }
}

qti_enum! {
    /// Value type of an object parameter
    pub enum ParamType {
        /// The value is data
        Data => "DATA",
        /// The value is a reference
        Ref => "REF",
    }
}

impl Default for ParamType {
    fn default() -> Self {
        ParamType::Data
    }
}

qti_enum! {
    /// Who scores an outcome outside of response processing
    pub enum ExternalScored {
        /// A human scorer
        Human => "human",
        /// An external machine
        ExternalMachine => "externalMachine",
    }
}

qti_enum! {
    /// Name of a mathematical constant
    pub enum MathConstantName {
        /// Pi
        Pi => "pi",
        /// Euler's number
        E => "e",
    }
}

qti_enum! {
    /// Kind of a media text track
    pub enum TrackKind {
        /// Subtitles
        Subtitles => "subtitles",
        /// Captions
        Captions => "captions",
        /// Descriptions
        Descriptions => "descriptions",
        /// Chapters
        Chapters => "chapters",
        /// Metadata
        Metadata => "metadata",
    }
}

impl Default for TrackKind {
    fn default() -> Self {
        TrackKind::Subtitles
    }
}

qti_enum! {
    /// Text direction of a body element
    pub enum Direction {
        /// Left to right
        Ltr => "ltr",
        /// Right to left
        Rtl => "rtl",
        /// Determined by the content
        Auto => "auto",
    }
}

/// A point, two integer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Horizontal coordinate
    pub x: i64,
    /// Vertical coordinate
    pub y: i64,
}

/// A pair of identifiers (directed or not depending on the base type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// First identifier
    pub first: String,
    /// Second identifier
    pub second: String,
}

impl Pair {
    /// Create a pair
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

/// An integer or an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntOrIdentifier {
    /// Integer form
    Int(i64),
    /// Identifier form
    Identifier(String),
}

/// A typed scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum QtiValue {
    /// identifier
    Identifier(String),
    /// boolean
    Boolean(bool),
    /// integer
    Integer(i64),
    /// float
    Float(f64),
    /// string
    String(String),
    /// point
    Point(Point),
    /// pair
    Pair(Pair),
    /// directedPair
    DirectedPair(Pair),
    /// duration, kept as its xs:duration literal
    Duration(String),
    /// file
    File(String),
    /// uri
    Uri(String),
    /// intOrIdentifier
    IntOrIdentifier(IntOrIdentifier),
}

impl QtiValue {
    /// Base type this value belongs to
    pub fn base_type(&self) -> BaseType {
        match self {
            QtiValue::Identifier(_) => BaseType::Identifier,
            QtiValue::Boolean(_) => BaseType::Boolean,
            QtiValue::Integer(_) => BaseType::Integer,
            QtiValue::Float(_) => BaseType::Float,
            QtiValue::String(_) => BaseType::String,
            QtiValue::Point(_) => BaseType::Point,
            QtiValue::Pair(_) => BaseType::Pair,
            QtiValue::DirectedPair(_) => BaseType::DirectedPair,
            QtiValue::Duration(_) => BaseType::Duration,
            QtiValue::File(_) => BaseType::File,
            QtiValue::Uri(_) => BaseType::Uri,
            QtiValue::IntOrIdentifier(_) => BaseType::IntOrIdentifier,
        }
    }

    /// Parse an XML literal as a value of `base_type`
    ///
    /// String values keep their text verbatim; every other type ignores
    /// surrounding whitespace.
    pub fn parse(base_type: BaseType, text: &str) -> Option<QtiValue> {
        if base_type == BaseType::String {
            return Some(QtiValue::String(text.to_string()));
        }

        let text = text.trim();
        match base_type {
            BaseType::Identifier => {
                is_valid_identifier(text).then(|| QtiValue::Identifier(text.to_string()))
            }
            BaseType::Boolean => parse_boolean(text).map(QtiValue::Boolean),
            BaseType::Integer => text.parse().ok().map(QtiValue::Integer),
            BaseType::Float => parse_float(text).map(QtiValue::Float),
            BaseType::Point => {
                let (x, y) = split_two(text)?;
                Some(QtiValue::Point(Point {
                    x: x.parse().ok()?,
                    y: y.parse().ok()?,
                }))
            }
            BaseType::Pair | BaseType::DirectedPair => {
                let (a, b) = split_two(text)?;
                if !is_valid_identifier(a) || !is_valid_identifier(b) {
                    return None;
                }
                let pair = Pair::new(a, b);
                Some(if base_type == BaseType::Pair {
                    QtiValue::Pair(pair)
                } else {
                    QtiValue::DirectedPair(pair)
                })
            }
            BaseType::Duration => {
                is_valid_duration(text).then(|| QtiValue::Duration(text.to_string()))
            }
            BaseType::File => Some(QtiValue::File(text.to_string())),
            BaseType::Uri => Some(QtiValue::Uri(text.to_string())),
            BaseType::IntOrIdentifier => match text.parse() {
                Ok(i) => Some(QtiValue::IntOrIdentifier(IntOrIdentifier::Int(i))),
                Err(_) => is_valid_identifier(text)
                    .then(|| QtiValue::IntOrIdentifier(IntOrIdentifier::Identifier(text.to_string()))),
            },
            BaseType::String => unreachable!("handled above"),
        }
    }
}

impl fmt::Display for QtiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QtiValue::Identifier(s)
            | QtiValue::String(s)
            | QtiValue::Duration(s)
            | QtiValue::File(s)
            | QtiValue::Uri(s) => write!(f, "{}", s),
            QtiValue::Boolean(b) => write!(f, "{}", b),
            QtiValue::Integer(i) => write!(f, "{}", i),
            QtiValue::Float(v) => write!(f, "{}", format_float(*v)),
            QtiValue::Point(p) => write!(f, "{} {}", p.x, p.y),
            QtiValue::Pair(p) | QtiValue::DirectedPair(p) => write!(f, "{} {}", p.first, p.second),
            QtiValue::IntOrIdentifier(IntOrIdentifier::Int(i)) => write!(f, "{}", i),
            QtiValue::IntOrIdentifier(IntOrIdentifier::Identifier(s)) => write!(f, "{}", s),
        }
    }
}

fn split_two(text: &str) -> Option<(&str, &str)> {
    let mut parts = text.split_whitespace();
    let first = parts.next()?;
    let second = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

/// Parse an xs:boolean literal
pub fn parse_boolean(text: &str) -> Option<bool> {
    match text {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parse an xs:double literal
pub fn parse_float(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        // Rust accepts "inf" and "nan" spellings that XML does not
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => None,
        t => t.parse().ok(),
    }
}

/// Canonical xs:double literal: shortest form, no trailing zeros
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        format!("{}", value)
    }
}

fn parse_variable_ref(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    is_valid_variable_ref(inner).then_some(inner)
}

/// An integer literal or a reference to a template variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegerOrVariableRef {
    /// Literal
    Integer(i64),
    /// Variable reference
    VariableRef(String),
}

impl IntegerOrVariableRef {
    /// Parse `12`, `{VAR}` or a bare `VAR`
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(i) = text.parse() {
            return Some(Self::Integer(i));
        }
        if let Some(name) = parse_variable_ref(text) {
            return Some(Self::VariableRef(name.to_string()));
        }
        is_valid_variable_ref(text).then(|| Self::VariableRef(text.to_string()))
    }
}

impl From<i64> for IntegerOrVariableRef {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl fmt::Display for IntegerOrVariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::VariableRef(name) => write!(f, "{{{}}}", name),
        }
    }
}

/// A float literal or a reference to a template variable
#[derive(Debug, Clone, PartialEq)]
pub enum FloatOrVariableRef {
    /// Literal
    Float(f64),
    /// Variable reference
    VariableRef(String),
}

impl FloatOrVariableRef {
    /// Parse `0.5`, `{VAR}` or a bare `VAR`
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(v) = parse_float(text) {
            return Some(Self::Float(v));
        }
        if let Some(name) = parse_variable_ref(text) {
            return Some(Self::VariableRef(name.to_string()));
        }
        is_valid_variable_ref(text).then(|| Self::VariableRef(text.to_string()))
    }
}

impl From<f64> for FloatOrVariableRef {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl fmt::Display for FloatOrVariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", format_float(*v)),
            Self::VariableRef(name) => write!(f, "{{{}}}", name),
        }
    }
}

/// A string literal or a reference to a template variable
///
/// Only the braced `{VAR}` form is a reference; anything else is literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringOrVariableRef {
    /// Literal
    String(String),
    /// Variable reference
    VariableRef(String),
}

impl StringOrVariableRef {
    /// Parse a literal or `{VAR}`
    pub fn parse(text: &str) -> Self {
        match parse_variable_ref(text) {
            Some(name) => Self::VariableRef(name.to_string()),
            None => Self::String(text.to_string()),
        }
    }
}

impl fmt::Display for StringOrVariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::VariableRef(name) => write!(f, "{{{}}}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_literals() {
        assert_eq!(BaseType::from_qti_str("directedPair"), Some(BaseType::DirectedPair));
        assert_eq!(BaseType::from_qti_str("Integer"), None);
        assert_eq!(Cardinality::Record.as_str(), "record");
        assert_eq!(ParamType::from_qti_str("REF"), Some(ParamType::Ref));
        assert!(ShowHide::expected().contains("show, hide"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ShowHide::default(), ShowHide::Show);
        assert_eq!(RoundingMode::default(), RoundingMode::SignificantFigures);
        assert_eq!(ToleranceMode::default(), ToleranceMode::Exact);
        assert_eq!(TrackKind::default(), TrackKind::Subtitles);
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(QtiValue::parse(BaseType::Integer, " 25 "), Some(QtiValue::Integer(25)));
        assert_eq!(QtiValue::parse(BaseType::Boolean, "1"), Some(QtiValue::Boolean(true)));
        assert_eq!(QtiValue::parse(BaseType::Float, "3.45"), Some(QtiValue::Float(3.45)));
        assert_eq!(
            QtiValue::parse(BaseType::Point, "10 20"),
            Some(QtiValue::Point(Point { x: 10, y: 20 }))
        );
        assert_eq!(
            QtiValue::parse(BaseType::DirectedPair, "A B"),
            Some(QtiValue::DirectedPair(Pair::new("A", "B")))
        );
        assert_eq!(
            QtiValue::parse(BaseType::String, "  spaced  "),
            Some(QtiValue::String("  spaced  ".to_string()))
        );
        assert_eq!(
            QtiValue::parse(BaseType::IntOrIdentifier, "A1"),
            Some(QtiValue::IntOrIdentifier(IntOrIdentifier::Identifier("A1".to_string())))
        );
    }

    #[test]
    fn test_parse_invalid_values() {
        assert_eq!(QtiValue::parse(BaseType::Integer, "abc"), None);
        assert_eq!(QtiValue::parse(BaseType::Boolean, "yes"), None);
        assert_eq!(QtiValue::parse(BaseType::Float, "inf"), None);
        assert_eq!(QtiValue::parse(BaseType::Point, "1 2 3"), None);
        assert_eq!(QtiValue::parse(BaseType::Identifier, "999"), None);
        assert_eq!(QtiValue::parse(BaseType::Duration, "1 minute"), None);
    }

    #[test]
    fn test_canonical_literals() {
        assert_eq!(QtiValue::Float(1.0).to_string(), "1");
        assert_eq!(QtiValue::Float(3.45).to_string(), "3.45");
        assert_eq!(QtiValue::Boolean(false).to_string(), "false");
        assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
        assert_eq!(QtiValue::Pair(Pair::new("A", "B")).to_string(), "A B");
    }

    #[test]
    fn test_variable_refs() {
        assert_eq!(IntegerOrVariableRef::parse("3"), Some(IntegerOrVariableRef::Integer(3)));
        assert_eq!(
            IntegerOrVariableRef::parse("{FIGURES}"),
            Some(IntegerOrVariableRef::VariableRef("FIGURES".to_string()))
        );
        assert_eq!(
            IntegerOrVariableRef::parse("FIGURES"),
            Some(IntegerOrVariableRef::VariableRef("FIGURES".to_string()))
        );
        assert_eq!(IntegerOrVariableRef::parse("3.5"), None);
        assert_eq!(IntegerOrVariableRef::VariableRef("N".to_string()).to_string(), "{N}");

        assert_eq!(FloatOrVariableRef::parse("0.5"), Some(FloatOrVariableRef::Float(0.5)));
        assert_eq!(
            StringOrVariableRef::parse("[a-z]+"),
            StringOrVariableRef::String("[a-z]+".to_string())
        );
        assert_eq!(
            StringOrVariableRef::parse("{PATTERN}"),
            StringOrVariableRef::VariableRef("PATTERN".to_string())
        );
    }
}
