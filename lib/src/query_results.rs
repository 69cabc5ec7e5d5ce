//! Reads a SHACL validation report and classifies every result by the constraint component
//! that produced it.
//!
//! A report knows nothing about resources and values: the focus node of a result may be a
//! value node, and nested shapes (`sh:node`) put the real cause into `sh:detail`. This module
//! walks back from the report into the data graph to find the resource and the property the
//! user wrote. Results produced by a component that is not in [`COMPONENTS`] are never
//! dropped, they come back as [`UnexpectedComponent`]s.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use lazy_static::lazy_static;
use log::debug;
use oxigraph::model::{
    Graph, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef,
};

use crate::consts::{
    DASH, HAS_AUTHORSHIP, HAS_COPYRIGHT_HOLDER, HAS_LICENSE, KNORA_FILE_VALUE,
    KNORA_REPRESENTATION, KNORA_VALUE, SH, SH_DETAIL, SH_FOCUS_NODE, SH_INFO, SH_RESULT_MESSAGE,
    SH_RESULT_PATH, SH_RESULT_SEVERITY, SH_SOURCE_CONSTRAINT_COMPONENT, SH_VALIDATION_RESULT,
    SH_VALUE, SH_VIOLATION, SH_WARNING, TYPE,
};
use crate::data::is_file_value_property;
use crate::errors::MalformedReportError;
use crate::problems::{Severity, UnexpectedComponent};
use crate::shacl::ValidationReportGraphs;
use crate::util::{first_object, is_subclass_of, merge_graphs, term_as_named_node, term_as_node};

/// The constraint components that the shipped and generated shapes can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    MinCount,
    MaxCount,
    Pattern,
    Class,
    Datatype,
    In,
    LessThan,
    MinExclusive,
    MinInclusive,
    Node,
    Sparql,
    ClosedByTypes,
    CoExistsWith,
    SingleLine,
    UniqueValueForClass,
}

lazy_static! {
    /// Constraint component IRI to [`Component`].
    pub static ref COMPONENTS: HashMap<String, Component> = {
        let sh = |local: &str| format!("{}{}", SH, local);
        let dash = |local: &str| format!("{}{}", DASH, local);
        HashMap::from([
            (sh("MinCountConstraintComponent"), Component::MinCount),
            (sh("MaxCountConstraintComponent"), Component::MaxCount),
            (sh("PatternConstraintComponent"), Component::Pattern),
            (sh("ClassConstraintComponent"), Component::Class),
            (sh("DatatypeConstraintComponent"), Component::Datatype),
            (sh("InConstraintComponent"), Component::In),
            (sh("LessThanConstraintComponent"), Component::LessThan),
            (sh("MinExclusiveConstraintComponent"), Component::MinExclusive),
            (sh("MinInclusiveConstraintComponent"), Component::MinInclusive),
            (sh("NodeConstraintComponent"), Component::Node),
            (sh("SPARQLConstraintComponent"), Component::Sparql),
            (dash("ClosedByTypesConstraintComponent"), Component::ClosedByTypes),
            (dash("CoExistsWithConstraintComponent"), Component::CoExistsWith),
            (dash("SingleLineConstraintComponent"), Component::SingleLine),
            (dash("UniqueValueForClassConstraintComponent"), Component::UniqueValueForClass),
        ])
    };
}

/// What went wrong, before it is turned into a user facing problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationType {
    MinCard,
    MaxCard,
    NonExistingCard,
    FileValueProhibited,
    Pattern,
    UniqueValue,
    ValueType,
    Generic,
    FileDuplicate,
    SeqnumIsPartOf,
    LinkTarget,
}

/// One classified result, still in terms of the RDF nodes of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub violation_type: ViolationType,
    pub res_iri: Term,
    pub res_class: Term,
    pub severity: Severity,
    pub property: Option<Term>,
    pub message: Option<Term>,
    pub expected: Option<Term>,
    pub input_value: Option<Term>,
    pub input_type: Option<Term>,
}

impl ValidationResult {
    fn new(violation_type: ViolationType, base: &BaseInfo) -> Self {
        Self {
            violation_type,
            res_iri: base.focus_iri.clone(),
            res_class: base.focus_type.clone(),
            severity: base.severity,
            property: base.path.clone(),
            message: None,
            expected: None,
            input_value: None,
            input_type: None,
        }
    }
}

#[derive(Debug, Clone)]
struct DetailInfo {
    node: NamedOrBlankNode,
    component: NamedNode,
}

/// The fields every result has, with the focus already moved from a value node to its
/// resource for results without detail.
#[derive(Debug, Clone)]
struct BaseInfo {
    result: NamedOrBlankNode,
    focus_iri: Term,
    focus_type: Term,
    path: Option<Term>,
    severity: Severity,
    detail: Option<DetailInfo>,
}

enum Classified {
    Result(ValidationResult),
    Unexpected(UnexpectedComponent),
    Ignored,
}

/// The graphs a report is read against.
struct ReportContext {
    results_and_onto: Graph,
    data_and_onto: Graph,
    value_types: HashSet<Term>,
}

fn is_legal_info_property(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::NamedNode(n))
        if [HAS_LICENSE, HAS_COPYRIGHT_HOLDER, HAS_AUTHORSHIP].contains(&n.as_ref()))
}

fn is_file_property(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::NamedNode(n)) if is_file_value_property(n.as_str()))
}

fn node(term: &Term) -> Option<NamedOrBlankNodeRef<'_>> {
    term_as_node(term.as_ref())
}

fn object_of(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Option<Term> {
    first_object(graph, node(subject)?, predicate)
}

fn required(
    graph: &Graph,
    subject: NamedOrBlankNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Result<Term> {
    first_object(graph, subject, predicate).ok_or_else(|| {
        MalformedReportError(format!("{} has no {}", subject, predicate)).into()
    })
}

fn component_of(graph: &Graph, subject: NamedOrBlankNodeRef<'_>) -> Result<NamedNode> {
    let term = required(graph, subject, SH_SOURCE_CONSTRAINT_COMPONENT)?;
    term_as_named_node(term.as_ref())
        .map(|n| n.into_owned())
        .ok_or_else(|| {
            MalformedReportError(format!("{} has a constraint component that is not an IRI", subject))
                .into()
        })
}

fn severity_of(graph: &Graph, subject: NamedOrBlankNodeRef<'_>) -> Result<Severity> {
    let term = required(graph, subject, SH_RESULT_SEVERITY)?;
    match term.as_ref() {
        TermRef::NamedNode(n) if n == SH_VIOLATION => Ok(Severity::Violation),
        TermRef::NamedNode(n) if n == SH_WARNING => Ok(Severity::Warning),
        TermRef::NamedNode(n) if n == SH_INFO => Ok(Severity::Info),
        other => Err(MalformedReportError(format!("unknown severity {}", other)).into()),
    }
}

/// Every type used in the data whose class hierarchy ends in `knora-api:Value`.
fn value_types(data_and_onto: &Graph) -> HashSet<Term> {
    let types: HashSet<NamedNode> = data_and_onto
        .triples_for_predicate(TYPE)
        .filter_map(|t| term_as_named_node(t.object).map(|n| n.into_owned()))
        .collect();
    types
        .into_iter()
        .filter(|t| is_subclass_of(data_and_onto, t.as_ref(), KNORA_VALUE))
        .map(Term::from)
        .collect()
}

/// Results that are not only the detail of another result.
fn main_results(results: &Graph) -> Vec<NamedOrBlankNode> {
    let details: HashSet<NamedOrBlankNode> = results
        .triples_for_predicate(SH_DETAIL)
        .filter_map(|t| term_as_node(t.object).map(|n| n.into_owned()))
        .collect();
    let mut main: Vec<NamedOrBlankNode> = results
        .subjects_for_predicate_object(TYPE, SH_VALIDATION_RESULT)
        .map(|s| s.into_owned())
        .filter(|s| !details.contains(s))
        .collect();
    main.sort_by_key(|n| n.to_string());
    main
}

/// Classifies all results of the report.
pub fn query_all_results(
    report: &ValidationReportGraphs,
) -> Result<(Vec<ValidationResult>, Vec<UnexpectedComponent>)> {
    let results_and_onto = merge_graphs([&report.validation_graph, &report.onto_graph]);
    let data_and_onto = merge_graphs([&report.onto_graph, &report.data_graph]);
    let value_types = value_types(&data_and_onto);
    let ctx = ReportContext {
        results_and_onto,
        data_and_onto,
        value_types,
    };

    let mut extracted = Vec::new();
    let mut unexpected = Vec::new();
    for result in main_results(&ctx.results_and_onto) {
        for base in ctx.base_info(result)? {
            let classified = match &base.detail {
                None => ctx.classify_without_detail(&base)?,
                Some(detail) => ctx.classify_with_detail(&base, detail)?,
            };
            match classified {
                Classified::Result(r) => extracted.push(r),
                Classified::Unexpected(u) => unexpected.push(u),
                Classified::Ignored => {}
            }
        }
    }
    debug!(
        "Classified {} results, {} unexpected components",
        extracted.len(),
        unexpected.len()
    );
    Ok((extracted, unexpected))
}

impl ReportContext {
    fn base_info(&self, result: NamedOrBlankNode) -> Result<Vec<BaseInfo>> {
        let graph = &self.results_and_onto;
        let focus_iri = required(graph, result.as_ref(), SH_FOCUS_NODE)?;
        let focus_type = object_of(&self.data_and_onto, &focus_iri, TYPE).ok_or_else(|| {
            MalformedReportError(format!("the focus node {} has no rdf:type", focus_iri))
        })?;
        let path = first_object(graph, result.as_ref(), SH_RESULT_PATH);
        let severity = severity_of(graph, result.as_ref())?;

        let details: Vec<NamedOrBlankNode> = graph
            .objects_for_subject_predicate(result.as_ref(), SH_DETAIL)
            .filter_map(|d| term_as_node(d).map(|n| n.into_owned()))
            .collect();
        if !details.is_empty() {
            let mut infos = Vec::with_capacity(details.len());
            for detail in details {
                let component = component_of(graph, detail.as_ref())?;
                infos.push(BaseInfo {
                    result: result.clone(),
                    focus_iri: focus_iri.clone(),
                    focus_type: focus_type.clone(),
                    path: path.clone(),
                    severity,
                    detail: Some(DetailInfo {
                        node: detail,
                        component,
                    }),
                });
            }
            return Ok(infos);
        }

        let mut base = BaseInfo {
            result,
            focus_iri,
            focus_type,
            path,
            severity,
            detail: None,
        };
        if self.value_types.contains(&base.focus_type) {
            self.move_focus_to_resource(&mut base)?;
        }
        Ok(vec![base])
    }

    /// A result about a value node is reported on the resource that holds the value, with
    /// the property the user wrote. Legal info keeps its own property.
    fn move_focus_to_resource(&self, base: &mut BaseInfo) -> Result<()> {
        let value_node = node(&base.focus_iri)
            .ok_or_else(|| MalformedReportError(format!("invalid focus node {}", base.focus_iri)))?;
        let pointer = self
            .data_and_onto
            .triples_for_object(value_node)
            .next()
            .map(|t| t.into_owned())
            .ok_or_else(|| {
                MalformedReportError(format!("no resource points to the value {}", base.focus_iri))
            })?;
        let resource: Term = pointer.subject.into();
        base.focus_type = object_of(&self.data_and_onto, &resource, TYPE).ok_or_else(|| {
            MalformedReportError(format!("the resource {} has no rdf:type", resource))
        })?;
        base.focus_iri = resource;
        if !is_legal_info_property(base.path.as_ref()) {
            base.path = Some(pointer.predicate.into());
        }
        Ok(())
    }

    fn message(&self, node: NamedOrBlankNodeRef<'_>) -> Option<Term> {
        first_object(&self.results_and_onto, node, SH_RESULT_MESSAGE)
    }

    fn value(&self, node: NamedOrBlankNodeRef<'_>) -> Option<Term> {
        first_object(&self.results_and_onto, node, SH_VALUE)
    }

    fn classify_without_detail(&self, base: &BaseInfo) -> Result<Classified> {
        let component = component_of(&self.results_and_onto, base.result.as_ref())?;
        let Some(known) = COMPONENTS.get(component.as_str()) else {
            return Ok(unexpected(&component));
        };
        let msg = self.message(base.result.as_ref());
        let result = match known {
            Component::Pattern => self.pattern_violation(base.result.as_ref(), base),
            Component::MinCount => {
                let violation = if is_legal_info_property(base.path.as_ref()) {
                    ViolationType::Generic
                } else {
                    ViolationType::MinCard
                };
                let mut r = ValidationResult::new(violation, base);
                r.expected = msg;
                r
            }
            Component::MaxCount => {
                let mut r = ValidationResult::new(ViolationType::MaxCard, base);
                r.expected = msg;
                r
            }
            Component::ClosedByTypes => match self.non_existing_cardinality(base) {
                Some(r) => r,
                None => return Ok(Classified::Ignored),
            },
            Component::Sparql => {
                let mut r = ValidationResult::new(ViolationType::UniqueValue, base);
                r.input_value = self.value(base.result.as_ref());
                r
            }
            Component::CoExistsWith => {
                let mut r = ValidationResult::new(ViolationType::SeqnumIsPartOf, base);
                r.message = msg;
                r
            }
            Component::Class => self.class_without_detail(base, msg),
            Component::Datatype => {
                let mut r = ValidationResult::new(ViolationType::ValueType, base);
                r.expected = msg;
                r.input_value = self.value(base.result.as_ref());
                r
            }
            Component::In
            | Component::LessThan
            | Component::MinExclusive
            | Component::MinInclusive
            | Component::SingleLine => {
                self.general_violation(base.result.as_ref(), base, ViolationType::Generic)
            }
            Component::UniqueValueForClass => {
                self.general_violation(base.result.as_ref(), base, ViolationType::FileDuplicate)
            }
            Component::Node => return Ok(unexpected(&component)),
        };
        Ok(Classified::Result(result))
    }

    fn classify_with_detail(&self, base: &BaseInfo, detail: &DetailInfo) -> Result<Classified> {
        let Some(known) = COMPONENTS.get(detail.component.as_str()) else {
            return Ok(unexpected(&detail.component));
        };
        let result = match known {
            Component::MinCount => {
                if is_file_property(base.path.as_ref()) {
                    self.general_violation(base.result.as_ref(), base, ViolationType::Generic)
                } else {
                    self.value_type_violation(base, detail)?
                }
            }
            Component::Pattern => self.pattern_violation(detail.node.as_ref(), base),
            Component::Class => {
                let detail_path = first_object(&self.results_and_onto, detail.node.as_ref(), SH_RESULT_PATH);
                if detail_path == Some(TYPE.into_owned().into()) {
                    self.value_type_violation(base, detail)?
                } else {
                    self.link_target_violation(base, detail)
                }
            }
            Component::In | Component::SingleLine => {
                self.general_violation(detail.node.as_ref(), base, ViolationType::Generic)
            }
            _ => return Ok(unexpected(&detail.component)),
        };
        Ok(Classified::Result(result))
    }

    fn pattern_violation(&self, node: NamedOrBlankNodeRef<'_>, base: &BaseInfo) -> ValidationResult {
        let mut r = ValidationResult::new(ViolationType::Pattern, base);
        r.expected = self.message(node);
        r.input_value = self.value(node);
        r
    }

    fn general_violation(
        &self,
        node: NamedOrBlankNodeRef<'_>,
        base: &BaseInfo,
        violation_type: ViolationType,
    ) -> ValidationResult {
        let mut r = ValidationResult::new(violation_type, base);
        r.message = self.message(node);
        r.input_value = self.value(node);
        r
    }

    /// A file value on a class that cannot hold one. Representations get a wrong file type
    /// reported through the missing cardinality instead.
    fn non_existing_cardinality(&self, base: &BaseInfo) -> Option<ValidationResult> {
        if is_file_property(base.path.as_ref()) {
            let is_representation = match &base.focus_type {
                Term::NamedNode(class) => {
                    is_subclass_of(&self.results_and_onto, class.as_ref(), KNORA_REPRESENTATION)
                }
                _ => false,
            };
            if is_representation {
                return None;
            }
            return Some(ValidationResult::new(ViolationType::FileValueProhibited, base));
        }
        Some(ValidationResult::new(ViolationType::NonExistingCard, base))
    }

    fn class_without_detail(&self, base: &BaseInfo, msg: Option<Term>) -> ValidationResult {
        let value = self.value(base.result.as_ref());
        let value_type = value
            .as_ref()
            .and_then(|v| object_of(&self.data_and_onto, v, TYPE));
        let is_file_value = |t: &Term| match t {
            Term::NamedNode(n) => is_subclass_of(&self.results_and_onto, n.as_ref(), KNORA_FILE_VALUE),
            _ => false,
        };
        match value_type {
            Some(value_type) if !is_file_value(&value_type) => {
                let mut r = ValidationResult::new(ViolationType::ValueType, base);
                r.expected = msg;
                r.input_type = Some(value_type);
                r
            }
            _ => {
                let mut r = ValidationResult::new(ViolationType::Generic, base);
                r.message = msg;
                r.input_value = value;
                r
            }
        }
    }

    fn value_type_violation(&self, base: &BaseInfo, detail: &DetailInfo) -> Result<ValidationResult> {
        let value = required(&self.results_and_onto, base.result.as_ref(), SH_VALUE)?;
        let mut r = ValidationResult::new(ViolationType::ValueType, base);
        r.expected = self.message(detail.node.as_ref());
        r.input_type = object_of(&self.data_and_onto, &value, TYPE);
        Ok(r)
    }

    fn link_target_violation(&self, base: &BaseInfo, detail: &DetailInfo) -> ValidationResult {
        let target = self.value(detail.node.as_ref());
        let mut r = ValidationResult::new(ViolationType::LinkTarget, base);
        r.expected = self.message(detail.node.as_ref());
        r.input_type = target
            .as_ref()
            .and_then(|t| object_of(&self.data_and_onto, t, TYPE));
        r.input_value = target;
        r
    }
}

fn unexpected(component: &NamedNode) -> Classified {
    debug!("Unexpected constraint component {}", component);
    Classified::Unexpected(UnexpectedComponent {
        component_type: component.as_str().to_string(),
    })
}
