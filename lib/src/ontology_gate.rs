//! Checks the project ontologies on their own before any data is validated. Data validated
//! against a broken ontology produces messages that the user cannot act on.

use std::fmt;

use anyhow::Result;
use log::{info, warn};
use oxigraph::model::{Graph, TermRef};

use crate::consts::{SH_FOCUS_NODE, SH_RESULT_MESSAGE, SH_VALIDATION_RESULT, TYPE};
use crate::shacl::ShaclValidator;
use crate::util::{first_object, parse_turtle, reformat_onto_iri, term_as_node, term_value};

const ONTOLOGY_SHAPES: &str = include_str!("../resources/ontology-shapes.ttl");

pub fn ontology_shapes() -> Result<Graph> {
    parse_turtle(ONTOLOGY_SHAPES)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OntologyResourceProblem {
    /// Shortened class IRI, e.g. `onto:Page`.
    pub res_iri: String,
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyValidationProblem {
    pub problems: Vec<OntologyResourceProblem>,
}

impl fmt::Display for OntologyValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The ontology structure contains errors that prevent the validation of the data."
        )?;
        writeln!(
            f,
            "Please correct the following errors and re-upload the corrected ontology."
        )?;
        writeln!(
            f,
            "Once those errors are fixed, it is possible that more problems are found in the data."
        )?;
        for problem in &self.problems {
            write!(
                f,
                "\n    - Resource Class: {} | Problem: {}",
                problem.res_iri, problem.msg
            )?;
        }
        Ok(())
    }
}

/// Runs the built-in ontology shapes against `onto`. `None` means the data may be validated.
pub fn validate_ontology(
    onto: &Graph,
    validator: &dyn ShaclValidator,
) -> Result<Option<OntologyValidationProblem>> {
    info!("Validating the ontology");
    let report = validator.validate(onto, &ontology_shapes()?)?;
    if report.conforms {
        return Ok(None);
    }
    let problems = ontology_problems(&report.validation_graph);
    warn!("The ontology has {} problems", problems.len());
    Ok(Some(OntologyValidationProblem { problems }))
}

fn ontology_problems(report: &Graph) -> Vec<OntologyResourceProblem> {
    let mut problems: Vec<OntologyResourceProblem> = report
        .subjects_for_predicate_object(TYPE, SH_VALIDATION_RESULT)
        .filter_map(|result| {
            let focus = first_object(report, result, SH_FOCUS_NODE)?;
            let msg = first_object(report, result, SH_RESULT_MESSAGE)
                .map(|m| term_value(m.as_ref()))
                .unwrap_or_default();
            let res_iri = match focus.as_ref() {
                TermRef::NamedNode(n) => reformat_onto_iri(n.as_str()),
                other => term_as_node(other)
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            };
            Some(OntologyResourceProblem { res_iri, msg })
        })
        .collect();
    problems.sort();
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shacl::ShaclReport;

    const REPORT: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix onto: <http://0.0.0.0:3333/ontology/9999/onto/v2#> .
        [] a sh:ValidationReport ;
           sh:conforms false ;
           sh:result _:r1 , _:r2 .
        _:r1 a sh:ValidationResult ;
           sh:focusNode onto:Page ;
           sh:resultMessage "seqnum must either have cardinality 1 or 0-1." .
        _:r2 a sh:ValidationResult ;
           sh:focusNode onto:Image ;
           sh:resultMessage "A class with a cardinality for isPartOf also requires a cardinality for seqnum." .
    "#;

    struct FixedReport(&'static str, bool);

    impl ShaclValidator for FixedReport {
        fn validate(&self, _data: &Graph, shapes: &Graph) -> Result<ShaclReport> {
            assert!(!shapes.is_empty());
            Ok(ShaclReport {
                conforms: self.1,
                validation_graph: parse_turtle(self.0)?,
            })
        }
    }

    #[test]
    fn shipped_shapes_parse() {
        assert!(!ontology_shapes().unwrap().is_empty());
    }

    #[test]
    fn conforming_ontology_passes() {
        let validator = FixedReport("", true);
        assert!(validate_ontology(&Graph::new(), &validator).unwrap().is_none());
    }

    #[test]
    fn problems_are_sorted_by_class() {
        let validator = FixedReport(REPORT, false);
        let problem = validate_ontology(&Graph::new(), &validator).unwrap().unwrap();
        assert_eq!(problem.problems.len(), 2);
        assert_eq!(problem.problems[0].res_iri, "onto:Image");
        assert_eq!(problem.problems[1].res_iri, "onto:Page");
        let text = problem.to_string();
        assert!(text.contains("Resource Class: onto:Page | Problem: seqnum must"));
    }
}
