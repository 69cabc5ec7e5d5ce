//! The user facing problems found in the data, after the SHACL report has been translated
//! back into resources and properties.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProblemType {
    FileValueMissing,
    FileValueProhibited,
    FileDuplicate,
    MaxCard,
    MinCard,
    NonExistingCard,
    ValueTypeMismatch,
    InputRegex,
    LinkTargetTypeMismatch,
    InexistentLinkedResource,
    DuplicateValue,
    Generic,
}

impl ProblemType {
    /// The identifier used in logs and CSV exports.
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemType::FileValueMissing => "FILE_VALUE_MISSING",
            ProblemType::FileValueProhibited => "FILE_VALUE_PROHIBITED",
            ProblemType::FileDuplicate => "FILE_DUPLICATE",
            ProblemType::MaxCard => "MAX_CARD",
            ProblemType::MinCard => "MIN_CARD",
            ProblemType::NonExistingCard => "NON_EXISTING_CARD",
            ProblemType::ValueTypeMismatch => "VALUE_TYPE_MISMATCH",
            ProblemType::InputRegex => "INPUT_REGEX",
            ProblemType::LinkTargetTypeMismatch => "LINK_TARGET_TYPE_MISMATCH",
            ProblemType::InexistentLinkedResource => "INEXISTENT_LINKED_RESOURCE",
            ProblemType::DuplicateValue => "DUPLICATE_VALUE",
            ProblemType::Generic => "GENERIC",
        }
    }

    /// Whether the type adds nothing to the message of the problem and is left out when
    /// printing.
    pub fn is_self_explanatory(self) -> bool {
        matches!(
            self,
            ProblemType::Generic | ProblemType::FileValueMissing | ProblemType::FileDuplicate
        )
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProblemType::FileValueMissing => "A file is required for this resource",
            ProblemType::FileValueProhibited => "A file was added to the resource. This resource type must not have a file.",
            ProblemType::FileDuplicate => "This file is used more than once",
            ProblemType::MaxCard => "Maximum Cardinality Violation",
            ProblemType::MinCard => "Missing Cardinality",
            ProblemType::NonExistingCard => "The resource class does not have a cardinality for this property.",
            ProblemType::ValueTypeMismatch => "Value Type Mismatch",
            ProblemType::InputRegex => "Wrong Format of Input",
            ProblemType::LinkTargetTypeMismatch => "Linked Resource Type Mismatch",
            ProblemType::InexistentLinkedResource => "Linked Resource does not exist",
            ProblemType::DuplicateValue => "Your input is duplicated",
            ProblemType::Generic => "Violation",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Violation,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Violation => "VIOLATION",
        };
        write!(f, "{}", s)
    }
}

/// One problem in the data, located by resource id and property. Document level problems
/// have no `res_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InputProblem {
    pub problem_type: ProblemType,
    pub res_id: Option<String>,
    pub res_type: Option<String>,
    pub prop_name: String,
    pub severity: Severity,
    pub message: Option<String>,
    pub input_value: Option<String>,
    pub input_type: Option<String>,
    pub expected: Option<String>,
}

impl InputProblem {
    pub fn new(problem_type: ProblemType, prop_name: impl Into<String>, severity: Severity) -> Self {
        Self {
            problem_type,
            res_id: None,
            res_type: None,
            prop_name: prop_name.into(),
            severity,
            message: None,
            input_value: None,
            input_type: None,
            expected: None,
        }
    }

    /// Natural ordering of problems: resource id first, then property.
    pub fn sort_key(&self) -> (&str, &str) {
        (self.res_id.as_deref().unwrap_or(""), self.prop_name.as_str())
    }
}

/// A constraint component of a SHACL result that has no place in the classification table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnexpectedComponent {
    pub component_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllProblems {
    pub problems: Vec<InputProblem>,
    pub unexpected_results: Vec<UnexpectedComponent>,
}

impl AllProblems {
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty() && self.unexpected_results.is_empty()
    }
}

/// The problems split by how severe they are, as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SortedProblems {
    pub unique_violations: Vec<InputProblem>,
    pub user_warnings: Vec<InputProblem>,
    pub user_info: Vec<InputProblem>,
    pub unexpected_shacl_validation_components: Vec<String>,
}

impl SortedProblems {
    pub fn has_problems(&self) -> bool {
        !self.unique_violations.is_empty()
            || !self.user_warnings.is_empty()
            || !self.user_info.is_empty()
            || !self.unexpected_shacl_validation_components.is_empty()
    }
}

/// Files referenced more than once in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateFileWarning {
    pub problems: Vec<InputProblem>,
}
