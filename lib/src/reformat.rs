//! Turns classified validation results into the problems shown to the user: IRIs are
//! shortened, file and legal info problems are attached to the file element of the resource.

use anyhow::Result;
use log::debug;
use oxigraph::model::{Term, TermRef};

use crate::consts::{HAS_AUTHORSHIP, HAS_COPYRIGHT_HOLDER, HAS_LICENSE};
use crate::data::file_value_detail;
use crate::problems::{AllProblems, InputProblem, ProblemType};
use crate::query_results::{query_all_results, ValidationResult, ViolationType};
use crate::shacl::ValidationReportGraphs;
use crate::util::{reformat_any_iri, reformat_data_iri, reformat_onto_iri, term_value};

/// Property shown for problems about files and their legal info.
pub const FILE_PROP_NAME: &str = "bitstream / iiif-uri";
const SEQNUM_PROP_NAME: &str = "seqnum or isPartOf";

/// Reads the report and returns every problem found in it.
pub fn reformat_validation_graph(report: &ValidationReportGraphs) -> Result<AllProblems> {
    debug!("Reformatting validation results");
    let (results, unexpected_results) = query_all_results(report)?;
    let problems = results.iter().map(reformat_one_validation_result).collect();
    Ok(AllProblems {
        problems,
        unexpected_results,
    })
}

fn is_legal_or_file_property(property: Option<&Term>) -> bool {
    let Some(Term::NamedNode(n)) = property else {
        return false;
    };
    file_value_detail(n.as_str()).is_some()
        || [HAS_LICENSE, HAS_COPYRIGHT_HOLDER, HAS_AUTHORSHIP]
            .iter()
            .any(|p| p.as_str() == n.as_str())
}

pub fn reformat_one_validation_result(result: &ValidationResult) -> InputProblem {
    match result.violation_type {
        ViolationType::MinCard => reformat_min_card(result),
        ViolationType::MaxCard => reformat_generic(result, ProblemType::MaxCard, None),
        ViolationType::NonExistingCard => {
            reformat_generic(result, ProblemType::NonExistingCard, None)
        }
        ViolationType::Pattern => reformat_generic(result, ProblemType::InputRegex, None),
        ViolationType::UniqueValue => reformat_generic(result, ProblemType::DuplicateValue, None),
        ViolationType::ValueType => reformat_generic(result, ProblemType::ValueTypeMismatch, None),
        ViolationType::Generic => {
            let prop = is_legal_or_file_property(result.property.as_ref()).then_some(FILE_PROP_NAME);
            reformat_generic(result, ProblemType::Generic, prop)
        }
        ViolationType::FileValueProhibited => {
            reformat_generic(result, ProblemType::FileValueProhibited, Some(FILE_PROP_NAME))
        }
        ViolationType::FileDuplicate => {
            reformat_generic(result, ProblemType::FileDuplicate, Some(FILE_PROP_NAME))
        }
        ViolationType::SeqnumIsPartOf => {
            reformat_generic(result, ProblemType::Generic, Some(SEQNUM_PROP_NAME))
        }
        ViolationType::LinkTarget => reformat_link_target(result),
    }
}

/// The display form of a term; empty literals count as absent.
fn display(term: Option<&Term>) -> Option<String> {
    let term = term?;
    let value = match term.as_ref() {
        TermRef::NamedNode(n) => reformat_any_iri(n.as_str()),
        other => term_value(other),
    };
    (!value.is_empty()).then_some(value)
}

fn iri_str(term: &Term) -> String {
    term_value(term.as_ref())
}

fn base_problem(result: &ValidationResult, problem_type: ProblemType, prop_name: String) -> InputProblem {
    let mut problem = InputProblem::new(problem_type, prop_name, result.severity);
    problem.res_id = Some(reformat_data_iri(&iri_str(&result.res_iri)));
    problem.res_type = Some(reformat_onto_iri(&iri_str(&result.res_class)));
    problem
}

fn prop_name(result: &ValidationResult) -> String {
    result
        .property
        .as_ref()
        .map(|p| reformat_onto_iri(&iri_str(p)))
        .unwrap_or_default()
}

fn reformat_min_card(result: &ValidationResult) -> InputProblem {
    let file_detail = match &result.property {
        Some(Term::NamedNode(n)) => file_value_detail(n.as_str()),
        _ => None,
    };
    if let Some((tag, extensions)) = file_detail {
        let mut problem = base_problem(result, ProblemType::FileValueMissing, tag.to_string());
        problem.input_value = display(result.input_value.as_ref());
        problem.input_type = display(result.input_type.as_ref());
        problem.expected = Some(format!(
            "This resource requires a file with one of the following extensions: {}",
            extensions
        ));
        return problem;
    }
    let mut problem = base_problem(result, ProblemType::MinCard, prop_name(result));
    problem.message = display(result.message.as_ref());
    problem.input_value = display(result.input_value.as_ref());
    problem.input_type = display(result.input_type.as_ref());
    problem.expected = display(result.expected.as_ref());
    problem
}

fn reformat_generic(
    result: &ValidationResult,
    problem_type: ProblemType,
    prop_string: Option<&str>,
) -> InputProblem {
    let prop = prop_string
        .map(str::to_string)
        .unwrap_or_else(|| prop_name(result));
    let mut problem = base_problem(result, problem_type, prop);
    problem.message = display(result.message.as_ref());
    problem.input_value = display(result.input_value.as_ref());
    problem.input_type = display(result.input_type.as_ref());
    problem.expected = display(result.expected.as_ref());
    problem
}

/// A link to a resource of the wrong class, or to a resource that does not exist at all.
fn reformat_link_target(result: &ValidationResult) -> InputProblem {
    let problem_type = if result.input_type.is_some() {
        ProblemType::LinkTargetTypeMismatch
    } else {
        ProblemType::InexistentLinkedResource
    };
    let mut problem = base_problem(result, problem_type, prop_name(result));
    problem.input_value = result
        .input_value
        .as_ref()
        .map(|v| reformat_data_iri(&iri_str(v)));
    if let Some(input_type) = &result.input_type {
        problem.input_type = Some(reformat_onto_iri(&iri_str(input_type)));
        problem.expected = result
            .expected
            .as_ref()
            .map(|e| reformat_onto_iri(&iri_str(e)));
    }
    problem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::KNORA_API;
    use crate::problems::Severity;
    use oxigraph::model::{Literal, NamedNode};

    const ONTO: &str = "http://0.0.0.0:3333/ontology/9999/onto/v2#";

    fn iri(s: &str) -> Term {
        NamedNode::new(s).unwrap().into()
    }

    fn literal(s: &str) -> Term {
        Literal::new_simple_literal(s).into()
    }

    fn result(violation_type: ViolationType, property: &str) -> ValidationResult {
        ValidationResult {
            violation_type,
            res_iri: iri("http://data/book_1"),
            res_class: iri(&format!("{}Book", ONTO)),
            severity: Severity::Violation,
            property: Some(iri(property)),
            message: None,
            expected: None,
            input_value: None,
            input_type: None,
        }
    }

    #[test]
    fn min_card_is_located() {
        let mut r = result(ViolationType::MinCard, &format!("{}hasTitle", ONTO));
        r.expected = Some(literal("Cardinality 1"));
        let problem = reformat_one_validation_result(&r);
        assert_eq!(problem.problem_type, ProblemType::MinCard);
        assert_eq!(problem.res_id.as_deref(), Some("book_1"));
        assert_eq!(problem.res_type.as_deref(), Some("onto:Book"));
        assert_eq!(problem.prop_name, "onto:hasTitle");
        assert_eq!(problem.expected.as_deref(), Some("Cardinality 1"));
    }

    #[test]
    fn missing_file_names_the_extensions() {
        let r = result(
            ViolationType::MinCard,
            &format!("{}hasMovingImageFileValue", KNORA_API),
        );
        let problem = reformat_one_validation_result(&r);
        assert_eq!(problem.problem_type, ProblemType::FileValueMissing);
        assert_eq!(problem.prop_name, "bitstream");
        assert_eq!(
            problem.expected.as_deref(),
            Some("This resource requires a file with one of the following extensions: mp4")
        );
    }

    #[test]
    fn legal_info_is_shown_on_the_file() {
        let mut r = result(ViolationType::Generic, &format!("{}hasLicense", KNORA_API));
        r.message = Some(literal("Files and IIIF-URIs require a reference to a license."));
        let problem = reformat_one_validation_result(&r);
        assert_eq!(problem.prop_name, FILE_PROP_NAME);
        assert_eq!(
            problem.message.as_deref(),
            Some("Files and IIIF-URIs require a reference to a license.")
        );
    }

    #[test]
    fn link_targets() {
        let mut r = result(ViolationType::LinkTarget, &format!("{}hasAuthor", ONTO));
        r.input_value = Some(iri("http://data/book_2"));
        r.input_type = Some(iri(&format!("{}Book", ONTO)));
        r.expected = Some(literal(&format!("{}Person", ONTO)));
        let problem = reformat_one_validation_result(&r);
        assert_eq!(problem.problem_type, ProblemType::LinkTargetTypeMismatch);
        assert_eq!(problem.input_value.as_deref(), Some("book_2"));
        assert_eq!(problem.input_type.as_deref(), Some("onto:Book"));
        assert_eq!(problem.expected.as_deref(), Some("onto:Person"));

        let mut r = result(ViolationType::LinkTarget, &format!("{}hasAuthor", ONTO));
        r.input_value = Some(iri("http://data/nobody"));
        let problem = reformat_one_validation_result(&r);
        assert_eq!(problem.problem_type, ProblemType::InexistentLinkedResource);
        assert_eq!(problem.input_value.as_deref(), Some("nobody"));
        assert!(problem.expected.is_none());
    }

    #[test]
    fn empty_input_is_absent() {
        let mut r = result(ViolationType::Pattern, &format!("{}hasColor", ONTO));
        r.input_value = Some(literal(""));
        let problem = reformat_one_validation_result(&r);
        assert_eq!(problem.problem_type, ProblemType::InputRegex);
        assert!(problem.input_value.is_none());
    }

    #[test]
    fn seqnum_problems_name_both_properties() {
        let r = result(ViolationType::SeqnumIsPartOf, &format!("{}seqnum", KNORA_API));
        let problem = reformat_one_validation_result(&r);
        assert_eq!(problem.problem_type, ProblemType::Generic);
        assert_eq!(problem.prop_name, "seqnum or isPartOf");
    }
}
