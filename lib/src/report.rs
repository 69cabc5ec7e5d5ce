//! Sorts the problems by severity, removes redundant ones and renders the messages that are
//! shown to the user. Long reports are written to CSV files instead of the console.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::consts::DSP_RESOURCE_IRI_PREFIX;
use crate::options::ValidationSeverity;
use crate::problems::{
    AllProblems, DuplicateFileWarning, InputProblem, ProblemType, Severity, SortedProblems,
};

pub const LIST_SEPARATOR: &str = "\n    - ";
pub const GRAND_SEPARATOR: &str = "\n\n----------------------------\n";
/// More problems than this are written to CSV instead of printed.
pub const MAX_PRINTED_PROBLEMS: usize = 50;

const ABSOLUTE_IRI_MESSAGE: &str = "You used an absolute IRI to reference an existing resource in the DB. \
If this resource does not exist or is not of the correct type, an xmlupload will fail.";
const GENERIC_TEXT_VALUE: &str = "This property requires a TextValue";
const SIMPLE_TEXT_VALUE: &str = "TextValue without formatting";
const FORMATTED_TEXT_VALUE: &str = "TextValue with formatting";

fn ordered(problems: &mut [InputProblem]) {
    problems.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()).then_with(|| a.cmp(b)));
}

/// Splits the problems by severity. Links to absolute IRIs cannot be checked and become
/// info, duplicate files become warnings.
pub fn sort_user_problems(
    all_problems: AllProblems,
    duplicate_files: Option<DuplicateFileWarning>,
) -> SortedProblems {
    let (problems, with_iris) = separate_links_to_absolute_iris(all_problems.problems);
    let filtered = filter_out_duplicate_problems(problems);

    let mut sorted = SortedProblems::default();
    for problem in filtered {
        match problem.severity {
            Severity::Violation => sorted.unique_violations.push(problem),
            Severity::Warning => sorted.user_warnings.push(problem),
            Severity::Info => sorted.user_info.push(problem),
        }
    }
    if let Some(duplicates) = duplicate_files {
        sorted.user_warnings.extend(duplicates.problems);
    }
    sorted.user_info.extend(with_iris);

    let mut unexpected: Vec<String> = all_problems
        .unexpected_results
        .into_iter()
        .map(|u| u.component_type)
        .collect();
    unexpected.sort();
    unexpected.dedup();
    sorted.unexpected_shacl_validation_components = unexpected;

    ordered(&mut sorted.unique_violations);
    ordered(&mut sorted.user_warnings);
    ordered(&mut sorted.user_info);
    sorted
}

fn separate_links_to_absolute_iris(
    problems: Vec<InputProblem>,
) -> (Vec<InputProblem>, Vec<InputProblem>) {
    let mut no_iris = Vec::new();
    let mut iris = Vec::new();
    for mut problem in problems {
        let is_absolute = problem.problem_type == ProblemType::InexistentLinkedResource
            && problem
                .input_value
                .as_deref()
                .is_some_and(|v| v.starts_with(DSP_RESOURCE_IRI_PREFIX));
        if is_absolute {
            problem.message = Some(ABSOLUTE_IRI_MESSAGE.to_string());
            problem.severity = Severity::Info;
            iris.push(problem);
        } else {
            no_iris.push(problem);
        }
    }
    (no_iris, iris)
}

fn filter_out_duplicate_problems(problems: Vec<InputProblem>) -> Vec<InputProblem> {
    let mut without_res_id = Vec::new();
    let mut by_resource: BTreeMap<String, Vec<InputProblem>> = BTreeMap::new();
    for problem in problems {
        match problem.res_id.clone() {
            Some(res_id) => by_resource.entry(res_id).or_default().push(problem),
            None => without_res_id.push(problem),
        }
    }
    let mut filtered = without_res_id;
    for problems in by_resource.into_values() {
        let text_filtered = filter_out_duplicate_text_value_problems(problems);
        filtered.extend(merge_wrong_file_type_problems(text_filtered));
    }
    filtered
}

/// A text value of the wrong kind is found by two shapes. The precise message wins over the
/// generic one.
fn filter_out_duplicate_text_value_problems(problems: Vec<InputProblem>) -> Vec<InputProblem> {
    let (type_problems, mut filtered): (Vec<InputProblem>, Vec<InputProblem>) = problems
        .into_iter()
        .partition(|p| p.problem_type == ProblemType::ValueTypeMismatch);

    let mut by_prop: BTreeMap<String, Vec<InputProblem>> = BTreeMap::new();
    for problem in type_problems {
        by_prop.entry(problem.prop_name.clone()).or_default().push(problem);
    }
    for mut problems in by_prop.into_values() {
        let has = |msg: &str, problems: &[InputProblem]| {
            problems.iter().any(|p| p.expected.as_deref() == Some(msg))
        };
        let has_precise =
            has(SIMPLE_TEXT_VALUE, &problems) || has(FORMATTED_TEXT_VALUE, &problems);
        if has_precise {
            if let Some(idx) = problems
                .iter()
                .position(|p| p.expected.as_deref() == Some(GENERIC_TEXT_VALUE))
            {
                problems.remove(idx);
            }
        }
        filtered.extend(problems);
    }
    filtered
}

/// A file of the wrong type on a representation is both missing the right file and has a
/// prohibited one. Only the missing file is reported, with the input of the prohibited one.
fn merge_wrong_file_type_problems(mut problems: Vec<InputProblem>) -> Vec<InputProblem> {
    let missing = problems
        .iter()
        .position(|p| p.problem_type == ProblemType::FileValueMissing);
    let prohibited = problems
        .iter()
        .position(|p| p.problem_type == ProblemType::FileValueProhibited);
    let (Some(missing), Some(prohibited)) = (missing, prohibited) else {
        return problems;
    };
    let input_value = problems[prohibited].input_value.clone();
    let mut missing_problem = problems[missing].clone();
    missing_problem.input_value = input_value;
    let (first, second) = if missing > prohibited {
        (missing, prohibited)
    } else {
        (prohibited, missing)
    };
    problems.remove(first);
    problems.remove(second);
    problems.push(missing_problem);
    problems
}

/// A message block: a header and either a printed body or the rows for a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageComponents {
    pub header: String,
    pub body: Option<String>,
    pub csv_rows: Option<Vec<CsvRow>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPrintMessages {
    pub violations: Option<MessageComponents>,
    pub warnings: Option<MessageComponents>,
    pub infos: Option<MessageComponents>,
    pub unexpected_violations: Option<MessageComponents>,
}

/// Warnings and infos are only included when `severity` shows them.
pub fn get_user_message(sorted: &SortedProblems, severity: ValidationSeverity) -> UserPrintMessages {
    let too_many = are_there_too_many_to_print(sorted, severity);
    let block = |problems: &[InputProblem], header: String| {
        if problems.is_empty() {
            return None;
        }
        Some(if too_many {
            MessageComponents {
                header,
                body: None,
                csv_rows: Some(csv_rows(problems)),
            }
        } else {
            MessageComponents {
                header,
                body: Some(problem_print_message(problems)),
                csv_rows: None,
            }
        })
    };
    let violations = block(
        &sorted.unique_violations,
        format!(
            "During the validation of the data {} errors were found. \
             Until they are resolved an xmlupload is not possible.",
            sorted.unique_violations.len()
        ),
    );
    let no_problems: &[InputProblem] = &[];
    let warnings = block(
        if severity.shows_warnings() {
            &sorted.user_warnings
        } else {
            no_problems
        },
        format!(
            "During the validation of the data {} problems were found. \
             Warnings are allowed on test servers. \
             Please note that an xmlupload on a prod server will fail.",
            sorted.user_warnings.len()
        ),
    );
    let infos = block(
        if severity.shows_info() {
            &sorted.user_info
        } else {
            no_problems
        },
        format!(
            "During the validation of the data {} potential problems were found. \
             They will not impede an xmlupload.",
            sorted.user_info.len()
        ),
    );
    let unexpected_violations = (!sorted.unexpected_shacl_validation_components.is_empty()).then(|| {
        MessageComponents {
            header: "The following unknown violation types were found!".to_string(),
            body: Some(format!(
                "{}{}",
                LIST_SEPARATOR,
                sorted.unexpected_shacl_validation_components.join(LIST_SEPARATOR)
            )),
            csv_rows: None,
        }
    });
    UserPrintMessages {
        violations,
        warnings,
        infos,
        unexpected_violations,
    }
}

fn are_there_too_many_to_print(sorted: &SortedProblems, severity: ValidationSeverity) -> bool {
    let mut count = sorted.unique_violations.len();
    if severity.shows_warnings() {
        count += sorted.user_warnings.len();
    }
    if severity.shows_info() {
        count += sorted.user_info.len();
    }
    count > MAX_PRINTED_PROBLEMS
}

/// Document level problems first, then one paragraph per resource ordered by id.
pub fn problem_print_message(problems: &[InputProblem]) -> String {
    let mut without_res_id: Vec<&InputProblem> = Vec::new();
    let mut by_resource: BTreeMap<&str, Vec<&InputProblem>> = BTreeMap::new();
    for problem in problems {
        match problem.res_id.as_deref() {
            Some(res_id) => by_resource.entry(res_id).or_default().push(problem),
            None => without_res_id.push(problem),
        }
    }
    let mut messages = Vec::new();
    if !without_res_id.is_empty() {
        messages.push(message_for_one_resource(&without_res_id));
    }
    messages.extend(by_resource.values().map(|p| message_for_one_resource(p)));
    messages.join(GRAND_SEPARATOR)
}

fn message_for_one_resource(problems: &[&InputProblem]) -> String {
    let start = match problems.first() {
        Some(InputProblem {
            res_id: Some(res_id),
            res_type,
            ..
        }) => format!(
            "Resource ID: {} | Resource Type: {}",
            res_id,
            res_type.as_deref().unwrap_or_default()
        ),
        _ => String::new(),
    };
    // properties in order of their first problem
    let mut props: Vec<(&str, Vec<String>)> = Vec::new();
    for problem in problems {
        let detail = message_detail(problem);
        match props.iter_mut().find(|(name, _)| *name == problem.prop_name) {
            Some((_, details)) => details.push(detail),
            None => props.push((problem.prop_name.as_str(), vec![detail])),
        }
    }
    let props: Vec<String> = props
        .into_iter()
        .map(|(name, details)| format!("{}{}{}", name, LIST_SEPARATOR, details.join(LIST_SEPARATOR)))
        .collect();
    format!("{}\n{}", start, props.join("\n"))
}

fn message_detail(problem: &InputProblem) -> String {
    let mut parts = Vec::new();
    if let Some(message) = &problem.message {
        parts.push(message.clone());
    }
    if !problem.problem_type.is_self_explanatory() {
        parts.push(problem.problem_type.to_string());
    }
    if let Some(input) = shorten_input(problem.input_value.as_deref(), problem.problem_type) {
        parts.push(format!("Your input: '{}'", input));
    }
    if let Some(input_type) = &problem.input_type {
        parts.push(format!("Actual input type: '{}'", input_type));
    }
    if let Some(expected) = &problem.expected {
        parts.push(format!(
            "Expected{}: {}",
            expected_prefix(problem.problem_type),
            expected
        ));
    }
    parts.join(" | ")
}

fn expected_prefix(problem_type: ProblemType) -> &'static str {
    match problem_type {
        ProblemType::ValueTypeMismatch => " Value Type",
        ProblemType::InputRegex => " Input Format",
        ProblemType::LinkTargetTypeMismatch => " Resource Type",
        _ => "",
    }
}

/// Long inputs are cut to 50 characters. File names, links and IRIs are shown in full.
pub fn shorten_input(input: Option<&str>, problem_type: ProblemType) -> Option<String> {
    let input = input.filter(|i| !i.is_empty())?;
    let keep = matches!(
        problem_type,
        ProblemType::FileDuplicate
            | ProblemType::FileValueMissing
            | ProblemType::FileValueProhibited
            | ProblemType::LinkTargetTypeMismatch
            | ProblemType::InexistentLinkedResource
    ) || input.starts_with(DSP_RESOURCE_IRI_PREFIX)
        || input.starts_with(" / http://rdfh.ch/lists/");
    if keep || input.chars().count() <= 50 {
        return Some(input.to_string());
    }
    let short: String = input.chars().take(50).collect();
    Some(format!("{}[...]", short))
}

/// One line of a CSV report.
/// Fields in sort order; the columns are written with the resource id first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CsvRow {
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub property: String,
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub expected: Option<String>,
    pub message: Option<String>,
    pub problem: Option<String>,
}

fn csv_row(problem: &InputProblem) -> CsvRow {
    let prefix = expected_prefix(problem.problem_type).trim();
    let (expected, message) = match (&problem.expected, &problem.message) {
        (Some(expected), message) => {
            let expected = if prefix.is_empty() {
                expected.clone()
            } else {
                format!("{}: {}", prefix, expected)
            };
            (Some(expected), message.clone())
        }
        (None, message) => (message.clone(), None),
    };
    CsvRow {
        resource_type: problem.res_type.clone(),
        resource_id: problem.res_id.clone(),
        property: problem.prop_name.clone(),
        input: shorten_input(problem.input_value.as_deref(), problem.problem_type),
        input_type: problem.input_type.clone(),
        expected,
        message,
        problem: (!problem.problem_type.is_self_explanatory())
            .then(|| problem.problem_type.to_string()),
    }
}

/// Rows sorted by resource type, resource id and property.
pub fn csv_rows(problems: &[InputProblem]) -> Vec<CsvRow> {
    let mut rows: Vec<CsvRow> = problems.iter().map(csv_row).collect();
    rows.sort();
    rows
}

pub fn write_csv(rows: &[CsvRow], file: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(file)
        .with_context(|| format!("Failed to create {}", file.display()))?;
    writer.write_record([
        "Resource ID",
        "Resource Type",
        "Property",
        "Your Input",
        "Input Type",
        "Expected",
        "Message",
        "Problem",
    ])?;
    for row in rows {
        writer.write_record([
            row.resource_id.as_deref().unwrap_or_default(),
            row.resource_type.as_deref().unwrap_or_default(),
            row.property.as_str(),
            row.input.as_deref().unwrap_or_default(),
            row.input_type.as_deref().unwrap_or_default(),
            row.expected.as_deref().unwrap_or_default(),
            row.message.as_deref().unwrap_or_default(),
            row.problem.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    info!("Wrote {} problems to {}", rows.len(), file.display());
    Ok(())
}

impl UserPrintMessages {
    /// Renders the messages for the console. Blocks that only have CSV rows are written into
    /// `report_dir` as `<stem>_<kind>.csv` and the console text names the file.
    pub fn render(&self, report_dir: &Path, stem: &str) -> Result<String> {
        let blocks = [
            (&self.violations, "validation_errors"),
            (&self.warnings, "validation_warnings"),
            (&self.infos, "validation_info"),
            (&self.unexpected_violations, "unexpected_violations"),
        ];
        let mut out = Vec::new();
        for (block, kind) in blocks {
            let Some(block) = block else {
                continue;
            };
            let mut text = block.header.clone();
            if let Some(body) = &block.body {
                text.push_str("\n\n");
                text.push_str(body);
            }
            if let Some(rows) = &block.csv_rows {
                let file: PathBuf = report_dir.join(format!("{}_{}.csv", stem, kind));
                std::fs::create_dir_all(report_dir)
                    .with_context(|| format!("Failed to create {}", report_dir.display()))?;
                write_csv(rows, &file)?;
                text.push_str(&format!(
                    "\n\nThere are too many problems to print them. They were saved to: {}",
                    file.display()
                ));
            }
            out.push(text);
        }
        Ok(out.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::UnexpectedComponent;

    const FILE_PROP: &str = "bitstream / iiif-uri";

    fn problem(
        problem_type: ProblemType,
        res_id: Option<&str>,
        prop: &str,
        severity: Severity,
    ) -> InputProblem {
        let mut p = InputProblem::new(problem_type, prop, severity);
        p.res_id = res_id.map(str::to_string);
        p.res_type = res_id.map(|_| "onto:Book".to_string());
        p
    }

    #[test]
    fn absolute_iris_become_info() {
        let mut p = problem(
            ProblemType::InexistentLinkedResource,
            Some("book_1"),
            "onto:hasAuthor",
            Severity::Violation,
        );
        p.input_value = Some("http://rdfh.ch/9999/abc".to_string());
        let mut q = p.clone();
        q.input_value = Some("nobody".to_string());
        let sorted = sort_user_problems(
            AllProblems {
                problems: vec![p, q],
                unexpected_results: vec![],
            },
            None,
        );
        assert_eq!(sorted.unique_violations.len(), 1);
        assert_eq!(sorted.user_info.len(), 1);
        assert_eq!(
            sorted.user_info[0].message.as_deref(),
            Some(ABSOLUTE_IRI_MESSAGE)
        );
    }

    #[test]
    fn generic_text_value_problem_is_dropped() {
        let mut generic = problem(
            ProblemType::ValueTypeMismatch,
            Some("book_1"),
            "onto:hasTitle",
            Severity::Violation,
        );
        generic.expected = Some(GENERIC_TEXT_VALUE.to_string());
        let mut precise = generic.clone();
        precise.expected = Some(SIMPLE_TEXT_VALUE.to_string());
        let filtered = filter_out_duplicate_text_value_problems(vec![generic.clone(), precise.clone()]);
        assert_eq!(filtered, vec![precise]);
        let filtered = filter_out_duplicate_text_value_problems(vec![generic.clone()]);
        assert_eq!(filtered, vec![generic]);
    }

    #[test]
    fn wrong_file_type_is_one_problem() {
        let missing = problem(
            ProblemType::FileValueMissing,
            Some("audio_1"),
            "bitstream",
            Severity::Violation,
        );
        let mut prohibited = problem(
            ProblemType::FileValueProhibited,
            Some("audio_1"),
            "bitstream / iiif-uri",
            Severity::Violation,
        );
        prohibited.input_value = Some("http://data/value/x".to_string());
        let merged = merge_wrong_file_type_problems(vec![prohibited, missing]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].problem_type, ProblemType::FileValueMissing);
        assert_eq!(merged[0].input_value.as_deref(), Some("http://data/value/x"));
    }

    #[test]
    fn unexpected_components_are_unique() {
        let unexpected = UnexpectedComponent {
            component_type: "http://www.w3.org/ns/shacl#MaxLengthConstraintComponent".to_string(),
        };
        let sorted = sort_user_problems(
            AllProblems {
                problems: vec![],
                unexpected_results: vec![unexpected.clone(), unexpected],
            },
            None,
        );
        assert_eq!(sorted.unexpected_shacl_validation_components.len(), 1);
        let messages = get_user_message(&sorted, ValidationSeverity::Warning);
        let block = messages.unexpected_violations.unwrap();
        assert_eq!(block.header, "The following unknown violation types were found!");
        assert_eq!(
            block.body.unwrap(),
            "\n    - http://www.w3.org/ns/shacl#MaxLengthConstraintComponent"
        );
    }

    #[test]
    fn print_message_layout() {
        let mut a = problem(ProblemType::MinCard, Some("book_2"), "onto:hasTitle", Severity::Violation);
        a.expected = Some("Cardinality 1".to_string());
        let mut b = problem(
            ProblemType::ValueTypeMismatch,
            Some("book_1"),
            "onto:hasColor",
            Severity::Violation,
        );
        b.input_type = Some("TextValue".to_string());
        b.expected = Some("ColorValue".to_string());
        let mut c = problem(ProblemType::FileDuplicate, None, "bitstream / iiif-uri", Severity::Warning);
        c.message = Some("value used 2 times".to_string());
        c.input_value = Some("photo.jpg".to_string());

        let text = problem_print_message(&[a, b, c]);
        let expected = [
            "\nbitstream / iiif-uri\n    - value used 2 times | Your input: 'photo.jpg'",
            "Resource ID: book_1 | Resource Type: onto:Book\nonto:hasColor\n    - Value Type Mismatch | Actual input type: 'TextValue' | Expected Value Type: ColorValue",
            "Resource ID: book_2 | Resource Type: onto:Book\nonto:hasTitle\n    - Missing Cardinality | Expected: Cardinality 1",
        ]
        .join(GRAND_SEPARATOR);
        assert_eq!(text, expected);
    }

    #[test]
    fn long_inputs_are_shortened() {
        let long = "a".repeat(60);
        let short = shorten_input(Some(&long), ProblemType::Generic).unwrap();
        assert_eq!(short, format!("{}[...]", "a".repeat(50)));
        assert_eq!(
            shorten_input(Some(&long), ProblemType::InexistentLinkedResource).unwrap(),
            long
        );
        assert_eq!(shorten_input(Some(""), ProblemType::Generic), None);
    }

    #[test]
    fn too_many_problems_go_to_csv() {
        let problems: Vec<InputProblem> = (0..51)
            .map(|i| {
                let mut p = problem(
                    ProblemType::MinCard,
                    Some(&format!("book_{:02}", i)),
                    "onto:hasTitle",
                    Severity::Violation,
                );
                p.expected = Some("Cardinality 1".to_string());
                p
            })
            .collect();
        let sorted = sort_user_problems(
            AllProblems {
                problems,
                unexpected_results: vec![],
            },
            None,
        );
        let messages = get_user_message(&sorted, ValidationSeverity::Error);
        let violations = messages.violations.clone().unwrap();
        assert!(violations.body.is_none());
        let rows = violations.csv_rows.unwrap();
        assert_eq!(rows.len(), 51);
        assert_eq!(rows[0].expected.as_deref(), Some("Cardinality 1"));
        assert_eq!(rows[0].problem.as_deref(), Some("Missing Cardinality"));

        let dir = tempfile::tempdir().unwrap();
        let text = messages.render(dir.path(), "data").unwrap();
        assert!(text.contains("51 errors were found"));
        let csv = std::fs::read_to_string(dir.path().join("data_validation_errors.csv")).unwrap();
        assert!(csv.starts_with("Resource ID,Resource Type,Property,Your Input"));
        assert_eq!(csv.lines().count(), 52);
    }

    #[test]
    fn fifty_problems_are_printed() {
        let problems: Vec<InputProblem> = (0..50)
            .map(|i| {
                problem(
                    ProblemType::MinCard,
                    Some(&format!("book_{}", i)),
                    "onto:hasTitle",
                    Severity::Violation,
                )
            })
            .collect();
        let sorted = sort_user_problems(
            AllProblems {
                problems,
                unexpected_results: vec![],
            },
            None,
        );
        let messages = get_user_message(&sorted, ValidationSeverity::Info);
        assert!(messages.violations.unwrap().body.is_some());
    }

    #[test]
    fn warnings_are_hidden_at_error_severity() {
        let warning = problem(ProblemType::FileDuplicate, None, FILE_PROP, Severity::Warning);
        let info = problem(ProblemType::Generic, Some("book_1"), "onto:hasTitle", Severity::Info);
        let sorted = sort_user_problems(
            AllProblems {
                problems: vec![info],
                unexpected_results: vec![],
            },
            Some(DuplicateFileWarning {
                problems: vec![warning],
            }),
        );
        assert_eq!(sorted.user_warnings.len(), 1);
        let messages = get_user_message(&sorted, ValidationSeverity::Error);
        assert!(messages.warnings.is_none());
        assert!(messages.infos.is_none());
        let messages = get_user_message(&sorted, ValidationSeverity::Warning);
        assert!(messages.warnings.is_some());
        assert!(messages.infos.is_none());
    }
}
