//! Items, references and sections

use crate::classes::QtiClass;

use super::{
    fixed_class, Component, ItemBody, OutcomeDeclaration, QtiComponent, ResponseDeclaration,
    ResponseProcessing, RubricBlock, TemplateDeclaration,
};

/// A complete item
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentItem {
    /// Identifier
    pub identifier: String,
    /// Title
    pub title: String,
    /// Label
    pub label: Option<String>,
    /// `xml:lang`
    pub lang: Option<String>,
    /// Whether the item is adaptive
    pub adaptive: bool,
    /// Whether the item is time dependent
    pub time_dependent: bool,
    /// Authoring tool name
    pub tool_name: Option<String>,
    /// Authoring tool version
    pub tool_version: Option<String>,
    /// Response declarations
    pub response_declarations: Vec<ResponseDeclaration>,
    /// Outcome declarations
    pub outcome_declarations: Vec<OutcomeDeclaration>,
    /// Template declarations
    pub template_declarations: Vec<TemplateDeclaration>,
    /// Item body
    pub item_body: Option<ItemBody>,
    /// Response processing
    pub response_processing: Option<ResponseProcessing>,
}

impl AssessmentItem {
    /// Create an empty item
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            label: None,
            lang: None,
            adaptive: false,
            time_dependent: false,
            tool_name: None,
            tool_version: None,
            response_declarations: Vec::new(),
            outcome_declarations: Vec::new(),
            template_declarations: Vec::new(),
            item_body: None,
            response_processing: None,
        }
    }
}

/// Reference from a section to an item document
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentItemRef {
    /// Identifier within the test
    pub identifier: String,
    /// Item document URI
    pub href: String,
    /// Whether the item must be selected
    pub required: bool,
    /// Whether the item keeps its position when shuffling
    pub fixed: bool,
    /// Categories, written space separated
    pub categories: Vec<String>,
    /// Weights
    pub weights: Vec<Weight>,
}

impl AssessmentItemRef {
    /// Create a reference
    pub fn new(identifier: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            href: href.into(),
            required: false,
            fixed: false,
            categories: Vec::new(),
            weights: Vec::new(),
        }
    }
}

/// Item reference carrying the referenced item's declarations inline
///
/// Only the compact profile writes the extra content.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedAssessmentItemRef {
    /// The plain reference
    pub item_ref: AssessmentItemRef,
    /// Inlined response declarations
    pub response_declarations: Vec<ResponseDeclaration>,
    /// Inlined outcome declarations
    pub outcome_declarations: Vec<OutcomeDeclaration>,
    /// Inlined template declarations
    pub template_declarations: Vec<TemplateDeclaration>,
    /// Inlined response processing
    pub response_processing: Option<ResponseProcessing>,
    /// Whether the referenced item is adaptive
    pub adaptive: bool,
    /// Whether the referenced item is time dependent
    pub time_dependent: bool,
}

impl ExtendedAssessmentItemRef {
    /// Extend a plain reference
    pub fn new(item_ref: AssessmentItemRef) -> Self {
        Self {
            item_ref,
            response_declarations: Vec::new(),
            outcome_declarations: Vec::new(),
            template_declarations: Vec::new(),
            response_processing: None,
            adaptive: false,
            time_dependent: false,
        }
    }

    /// Whether any compact-only data is set
    pub fn has_extended_content(&self) -> bool {
        !self.response_declarations.is_empty()
            || !self.outcome_declarations.is_empty()
            || !self.template_declarations.is_empty()
            || self.response_processing.is_some()
            || self.adaptive
            || self.time_dependent
    }
}

impl QtiComponent for ExtendedAssessmentItemRef {
    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentItemRef
    }
}

/// Weight applied to an item's outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct Weight {
    /// Identifier
    pub identifier: String,
    /// Factor
    pub value: f64,
}

impl Weight {
    /// Create a weight
    pub fn new(identifier: impl Into<String>, value: f64) -> Self {
        Self {
            identifier: identifier.into(),
            value,
        }
    }
}

/// Reference to a section document
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentSectionRef {
    /// Identifier within the test
    pub identifier: String,
    /// Section document URI
    pub href: String,
    /// Whether the section must be selected
    pub required: bool,
    /// Whether the section keeps its position when shuffling
    pub fixed: bool,
}

impl AssessmentSectionRef {
    /// Create a reference
    pub fn new(identifier: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            href: href.into(),
            required: false,
            fixed: false,
        }
    }
}

/// Section of a test
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentSection {
    /// Identifier
    pub identifier: String,
    /// Title
    pub title: String,
    /// Whether the section is visible to candidates
    pub visible: bool,
    /// Whether an invisible section keeps its parts together (2.1), defaults to true
    pub keep_together: bool,
    /// Whether the section must be selected
    pub required: bool,
    /// Whether the section keeps its position when shuffling
    pub fixed: bool,
    /// Rubric blocks
    pub rubric_blocks: Vec<RubricBlock>,
    /// Item references, nested sections, section references and includes
    pub section_parts: Vec<Component>,
}

impl AssessmentSection {
    /// Create an empty section
    pub fn new(identifier: impl Into<String>, title: impl Into<String>, visible: bool) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            visible,
            keep_together: true,
            required: false,
            fixed: false,
            rubric_blocks: Vec::new(),
            section_parts: Vec::new(),
        }
    }
}

/// Section that may reference shared rubric blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedAssessmentSection {
    /// The plain section
    pub section: AssessmentSection,
    /// Rubric block references
    pub rubric_block_refs: Vec<RubricBlockRef>,
}

impl ExtendedAssessmentSection {
    /// Extend a plain section
    pub fn new(section: AssessmentSection) -> Self {
        Self {
            section,
            rubric_block_refs: Vec::new(),
        }
    }
}

impl QtiComponent for ExtendedAssessmentSection {
    fn qti_class(&self) -> QtiClass {
        QtiClass::AssessmentSection
    }
}

/// Reference to a shared rubric block document
#[derive(Debug, Clone, PartialEq)]
pub struct RubricBlockRef {
    /// Identifier
    pub identifier: String,
    /// Rubric block document URI
    pub href: String,
}

impl RubricBlockRef {
    /// Create a reference
    pub fn new(identifier: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            href: href.into(),
        }
    }
}

fixed_class! {
    AssessmentItem => AssessmentItem,
    AssessmentItemRef => AssessmentItemRef,
    Weight => Weight,
    AssessmentSectionRef => AssessmentSectionRef,
    AssessmentSection => AssessmentSection,
    RubricBlockRef => RubricBlockRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_content_detection() {
        let mut item_ref = ExtendedAssessmentItemRef::new(AssessmentItemRef::new("Q01", "Q01.xml"));
        assert!(!item_ref.has_extended_content());
        item_ref.adaptive = true;
        assert!(item_ref.has_extended_content());
    }

    #[test]
    fn test_section_defaults() {
        let section = AssessmentSection::new("S01", "Section 1", true);
        assert!(section.keep_together);
        assert!(!section.required && !section.fixed);
        let extended = ExtendedAssessmentSection::new(section);
        assert_eq!(extended.qti_class(), QtiClass::AssessmentSection);
    }
}
