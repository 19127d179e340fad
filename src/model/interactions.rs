//! Interactions

use crate::datatypes::{Orientation, ShowHide};

use super::{fixed_class, BodyAttributes, Component, Object, Prompt};

/// Selection among simple choices
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceInteraction {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Response variable
    pub response_identifier: String,
    /// Whether choices are shuffled, defaults to false
    pub shuffle: bool,
    /// Maximum selections, defaults to 1 (0 is unlimited)
    pub max_choices: i64,
    /// Minimum selections, defaults to 0 (2.1)
    pub min_choices: i64,
    /// Layout hint (2.1)
    pub orientation: Option<Orientation>,
    /// Prompt
    pub prompt: Option<Prompt>,
    /// Choices, at least one
    pub simple_choices: Vec<SimpleChoice>,
}

impl ChoiceInteraction {
    /// Create an interaction with default counts
    pub fn new(response_identifier: impl Into<String>, simple_choices: Vec<SimpleChoice>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            response_identifier: response_identifier.into(),
            shuffle: false,
            max_choices: 1,
            min_choices: 0,
            orientation: None,
            prompt: None,
            simple_choices,
        }
    }
}

/// One choice of a choice interaction
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleChoice {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Choice identifier
    pub identifier: String,
    /// Whether the choice keeps its position when shuffling
    pub fixed: bool,
    /// Template variable controlling visibility (2.1)
    pub template_identifier: Option<String>,
    /// Visibility rule (2.1), defaults to show
    pub show_hide: ShowHide,
    /// Flow content
    pub content: Vec<Component>,
}

impl SimpleChoice {
    /// Create a choice
    pub fn new(identifier: impl Into<String>, content: Vec<Component>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            identifier: identifier.into(),
            fixed: false,
            template_identifier: None,
            show_hide: ShowHide::Show,
            content,
        }
    }
}

/// Inline text input
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntryInteraction {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Response variable
    pub response_identifier: String,
    /// Number base of numeric input, defaults to 10
    pub base: i64,
    /// Variable receiving the raw string
    pub string_identifier: Option<String>,
    /// Expected length hint
    pub expected_length: Option<i64>,
    /// Pattern the input must match
    pub pattern_mask: Option<String>,
    /// Placeholder (2.1)
    pub placeholder_text: Option<String>,
}

impl TextEntryInteraction {
    /// Create an interaction with base 10
    pub fn new(response_identifier: impl Into<String>) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            response_identifier: response_identifier.into(),
            base: 10,
            string_identifier: None,
            expected_length: None,
            pattern_mask: None,
            placeholder_text: None,
        }
    }
}

/// Drawing on a canvas image
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingInteraction {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Response variable
    pub response_identifier: String,
    /// Prompt
    pub prompt: Option<Prompt>,
    /// The canvas
    pub object: Object,
}

impl DrawingInteraction {
    /// Create an interaction
    pub fn new(response_identifier: impl Into<String>, object: Object) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            response_identifier: response_identifier.into(),
            prompt: None,
            object,
        }
    }
}

/// Selection of points on an image
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPointInteraction {
    /// Common body attributes
    pub attributes: BodyAttributes,
    /// Response variable
    pub response_identifier: String,
    /// Maximum points (0 is unlimited)
    pub max_choices: i64,
    /// Minimum points (2.1), defaults to 0
    pub min_choices: i64,
    /// Prompt
    pub prompt: Option<Prompt>,
    /// The image
    pub object: Object,
}

impl SelectPointInteraction {
    /// Create an interaction
    pub fn new(response_identifier: impl Into<String>, object: Object, max_choices: i64) -> Self {
        Self {
            attributes: BodyAttributes::default(),
            response_identifier: response_identifier.into(),
            max_choices,
            min_choices: 0,
            prompt: None,
            object,
        }
    }
}

fixed_class! {
    ChoiceInteraction => ChoiceInteraction,
    SimpleChoice => SimpleChoice,
    TextEntryInteraction => TextEntryInteraction,
    DrawingInteraction => DrawingInteraction,
    SelectPointInteraction => SelectPointInteraction,
}
