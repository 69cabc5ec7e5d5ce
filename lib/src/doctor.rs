//! Provides functionality for diagnosing problems in a project definition before anything is
//! created on a server. Defines the `ProjectCheck` trait, the checks, and the `ProjectDoctor`
//! that runs them.

use crate::consts::KNORA_API;
use crate::dependency::{inheritance_cycles, mandatory_link_graph};
use crate::project::ParsedProject;
use crate::util::reformat_onto_iri;
use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// knora-api properties a project may use in its cardinalities.
pub const KNORA_PROPERTIES_FOR_DIRECT_USE: [&str; 10] = [
    "hasColor",
    "hasComment",
    "hasGeometry",
    "hasLinkTo",
    "hasValue",
    "isPartOf",
    "isRegionOf",
    "isSequenceOf",
    "hasSequenceBounds",
    "seqnum",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectProblemType {
    DuplicateClassName,
    DuplicatePropertyName,
    DuplicateListNodeName,
    UndefinedSuperClass,
    UndefinedSuperProperty,
    UndefinedPropertyInCardinality,
    CircularClassInheritance,
    CircularPropertyInheritance,
    MinCardinalityOneWithCircle,
}

impl fmt::Display for ProjectProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectProblemType::DuplicateClassName => "DUPLICATE_CLASS_NAME",
            ProjectProblemType::DuplicatePropertyName => "DUPLICATE_PROPERTY_NAME",
            ProjectProblemType::DuplicateListNodeName => "DUPLICATE_LIST_NODE_NAME",
            ProjectProblemType::UndefinedSuperClass => "UNDEFINED_SUPER_CLASS",
            ProjectProblemType::UndefinedSuperProperty => "UNDEFINED_SUPER_PROPERTY",
            ProjectProblemType::UndefinedPropertyInCardinality => {
                "UNDEFINED_PROPERTY_IN_CARDINALITY"
            }
            ProjectProblemType::CircularClassInheritance => "CIRCULAR_CLASS_INHERITANCE",
            ProjectProblemType::CircularPropertyInheritance => "CIRCULAR_PROPERTY_INHERITANCE",
            ProjectProblemType::MinCardinalityOneWithCircle => {
                "MIN_CARDINALITY_ONE_WITH_CIRCLE"
            }
        };
        f.write_str(s)
    }
}

/// A group of problems of one kind, with the explanation shown above them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProblem {
    pub problem_type: ProjectProblemType,
    pub message: String,
    pub details: Vec<String>,
}

impl fmt::Display for ProjectProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for detail in &self.details {
            write!(f, "\n    - {}", detail)?;
        }
        Ok(())
    }
}

pub trait ProjectCheck {
    fn name(&self) -> &str;
    fn check(&mut self, project: &ParsedProject, problems: &mut Vec<ProjectProblem>) -> Result<()>;
}

pub struct ProjectDoctor {
    checks: Vec<Box<dyn ProjectCheck>>,
}

impl Default for ProjectDoctor {
    fn default() -> Self {
        let mut doctor = Self::new();
        doctor.add_check(Box::new(DuplicateNames {}));
        doctor.add_check(Box::new(UndefinedSupers {}));
        doctor.add_check(Box::new(UndefinedCardinalityProperties {}));
        doctor.add_check(Box::new(CircularInheritance {}));
        doctor.add_check(Box::new(MandatoryLinkCycles {}));
        doctor
    }
}

impl ProjectDoctor {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn add_check(&mut self, check: Box<dyn ProjectCheck>) {
        self.checks.push(check);
    }

    pub fn run(&mut self, project: &ParsedProject) -> Result<Vec<ProjectProblem>> {
        let mut problems = Vec::new();
        for check in &mut self.checks {
            log::debug!("Running project check: {}", check.name());
            check.check(project, &mut problems)?;
        }
        Ok(problems)
    }
}

fn duplicates<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| reformat_onto_iri(name))
        .collect()
}

/// Project ontology IRIs, as opposed to knora-api and external vocabularies.
fn is_project_iri(iri: &str) -> bool {
    iri.contains("/ontology/") && !iri.starts_with("http://api.knora.org/")
}

pub struct DuplicateNames {}

impl ProjectCheck for DuplicateNames {
    fn name(&self) -> &str {
        "Duplicate Names"
    }

    fn check(&mut self, project: &ParsedProject, problems: &mut Vec<ProjectProblem>) -> Result<()> {
        let classes = duplicates(project.classes().map(|c| c.name.as_str()));
        if !classes.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::DuplicateClassName,
                message: "It is not permissible to have multiple classes with the same name in one ontology. \
                          The following names were used more than once:"
                    .to_string(),
                details: classes,
            });
        }
        let properties = duplicates(project.properties().map(|p| p.name.as_str()));
        if !properties.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::DuplicatePropertyName,
                message: "It is not permissible to have multiple properties with the same name in one ontology. \
                          The following names were used more than once:"
                    .to_string(),
                details: properties,
            });
        }
        let mut list_details = Vec::new();
        for list in &project.lists {
            let names = list.all_node_names();
            for node in duplicates(names.iter().map(String::as_str)) {
                list_details.push(format!("List '{}' / Node '{}'", list.name, node));
            }
        }
        let list_names = duplicates(project.lists.iter().map(|l| l.name.as_str()));
        list_details.extend(list_names.into_iter().map(|l| format!("List '{}'", l)));
        if !list_details.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::DuplicateListNodeName,
                message: "The names of lists and of the nodes within one list must be unique. \
                          The following names were used more than once:"
                    .to_string(),
                details: list_details,
            });
        }
        Ok(())
    }
}

pub struct UndefinedSupers {}

impl UndefinedSupers {
    fn undefined<'a>(
        items: impl Iterator<Item = (&'a str, &'a [String])>,
        defined: &HashSet<&str>,
        location: &str,
    ) -> Vec<String> {
        let mut details = Vec::new();
        for (name, supers) in items {
            let mut missing: Vec<String> = supers
                .iter()
                .filter(|s| is_project_iri(s) && !defined.contains(s.as_str()))
                .map(|s| reformat_onto_iri(s))
                .collect();
            if missing.is_empty() {
                continue;
            }
            missing.sort();
            details.push(format!(
                "{}: {} / Undefined-Super: {}",
                location,
                reformat_onto_iri(name),
                missing.join(", ")
            ));
        }
        details.sort();
        details
    }
}

impl ProjectCheck for UndefinedSupers {
    fn name(&self) -> &str {
        "Undefined Supers"
    }

    fn check(&mut self, project: &ParsedProject, problems: &mut Vec<ProjectProblem>) -> Result<()> {
        let props: HashSet<&str> = project.properties().map(|p| p.name.as_str()).collect();
        let details = Self::undefined(
            project
                .properties()
                .map(|p| (p.name.as_str(), p.supers.as_slice())),
            &props,
            "Property",
        );
        if !details.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::UndefinedSuperProperty,
                message: "The following Property have undefined supers:".to_string(),
                details,
            });
        }
        let classes: HashSet<&str> = project.classes().map(|c| c.name.as_str()).collect();
        let details = Self::undefined(
            project
                .classes()
                .map(|c| (c.name.as_str(), c.supers.as_slice())),
            &classes,
            "Class",
        );
        if !details.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::UndefinedSuperClass,
                message: "The following Class have undefined supers:".to_string(),
                details,
            });
        }
        Ok(())
    }
}

pub struct UndefinedCardinalityProperties {}

impl ProjectCheck for UndefinedCardinalityProperties {
    fn name(&self) -> &str {
        "Undefined Cardinality Properties"
    }

    fn check(&mut self, project: &ParsedProject, problems: &mut Vec<ProjectProblem>) -> Result<()> {
        let props: HashSet<&str> = project.properties().map(|p| p.name.as_str()).collect();
        let mut details = Vec::new();
        for class_cards in project.cardinalities() {
            for card in &class_cards.cards {
                let allowed = match card.propname.strip_prefix(KNORA_API) {
                    Some(local) => KNORA_PROPERTIES_FOR_DIRECT_USE.contains(&local),
                    None => !is_project_iri(&card.propname) || props.contains(card.propname.as_str()),
                };
                if !allowed {
                    details.push(format!(
                        "Class '{}' / Property '{}'",
                        reformat_onto_iri(&class_cards.class_iri),
                        reformat_onto_iri(&card.propname)
                    ));
                }
            }
        }
        if !details.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::UndefinedPropertyInCardinality,
                message: "The following classes have cardinalities for properties that do not exist:"
                    .to_string(),
                details,
            });
        }
        Ok(())
    }
}

pub struct CircularInheritance {}

impl ProjectCheck for CircularInheritance {
    fn name(&self) -> &str {
        "Circular Inheritance"
    }

    fn check(&mut self, project: &ParsedProject, problems: &mut Vec<ProjectProblem>) -> Result<()> {
        let classes = inheritance_cycles(
            project
                .classes()
                .map(|c| (c.name.as_str(), c.supers.as_slice())),
        );
        if !classes.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::CircularClassInheritance,
                message: "Your ontology contains circular inheritance dependencies in resource classes. \
                          This means that class A is a subclass of class B, and class B is \
                          (directly or indirectly) a subclass of class A. \
                          Circular inheritance is not allowed and will prevent the ontology from being created."
                    .to_string(),
                details: classes,
            });
        }
        let properties = inheritance_cycles(
            project
                .properties()
                .map(|p| (p.name.as_str(), p.supers.as_slice())),
        );
        if !properties.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::CircularPropertyInheritance,
                message: "Your ontology contains circular inheritance dependencies in properties. \
                          This means that property A is a subproperty of property B, and property B is \
                          (directly or indirectly) a subproperty of property A. \
                          Circular inheritance is not allowed and will prevent the ontology from being created."
                    .to_string(),
                details: properties,
            });
        }
        Ok(())
    }
}

pub struct MandatoryLinkCycles {}

pub const MANDATORY_LINK_CYCLE_MESSAGE: &str = "Your ontology contains properties derived from 'hasLinkTo' \
that allow circular references between resources. This is not a problem in itself, but if you try to upload \
data that actually contains circular references, these 'hasLinkTo' properties will be temporarily removed \
from the affected resources. Therefore, it is necessary that all involved 'hasLinkTo' properties have a \
cardinality of 0-1 or 0-n.\n\
Please make sure that the following properties have a cardinality of 0-1 or 0-n.\n\
Cycles are displayed in: Class -- Property --> Object Class";

impl ProjectCheck for MandatoryLinkCycles {
    fn name(&self) -> &str {
        "Mandatory Link Cycles"
    }

    fn check(&mut self, project: &ParsedProject, problems: &mut Vec<ProjectProblem>) -> Result<()> {
        let cycles = mandatory_link_graph(project).describe_cycles();
        if !cycles.is_empty() {
            problems.push(ProjectProblem {
                problem_type: ProjectProblemType::MinCardinalityOneWithCircle,
                message: MANDATORY_LINK_CYCLE_MESSAGE.to_string(),
                details: cycles,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::parse_project;

    fn project(properties: &str, resources: &str, lists: &str) -> ParsedProject {
        let json = format!(
            r#"{{"project": {{"shortcode": "9999", "shortname": "t", "lists": {},
                "ontologies": [{{"name": "onto", "label": "Onto", "properties": {}, "resources": {}}}]}}}}"#,
            lists, properties, resources
        );
        parse_project(&json, "http://0.0.0.0:3333").unwrap()
    }

    fn run(project: &ParsedProject) -> Vec<ProjectProblem> {
        ProjectDoctor::default().run(project).unwrap()
    }

    #[test]
    fn test_clean_project_has_no_problems() {
        let p = project(
            r#"[{"name": "hasText", "super": "hasValue", "object": "TextValue"}]"#,
            r#"[{"name": "Book", "super": "Resource",
                 "cardinalities": [{"propname": ":hasText", "cardinality": "1"},
                                   {"propname": "hasComment", "cardinality": "0-n"}]}]"#,
            "[]",
        );
        assert!(run(&p).is_empty());
    }

    #[test]
    fn test_duplicates_and_undefined() {
        let p = project(
            r#"[{"name": "hasText", "super": ":missingProp", "object": "TextValue"},
                {"name": "hasText", "super": "hasValue", "object": "TextValue"}]"#,
            r#"[{"name": "Book", "super": ":Missing",
                 "cardinalities": [{"propname": ":nope", "cardinality": "1"},
                                   {"propname": "hasFoo", "cardinality": "1"}]}]"#,
            r#"[{"name": "l", "nodes": [{"name": "a"}, {"name": "b", "nodes": [{"name": "a"}]}]}]"#,
        );
        let problems = run(&p);
        let types: Vec<_> = problems.iter().map(|p| p.problem_type).collect();
        assert_eq!(
            types,
            vec![
                ProjectProblemType::DuplicatePropertyName,
                ProjectProblemType::DuplicateListNodeName,
                ProjectProblemType::UndefinedSuperProperty,
                ProjectProblemType::UndefinedSuperClass,
                ProjectProblemType::UndefinedPropertyInCardinality,
            ]
        );
        assert_eq!(problems[0].details, vec!["onto:hasText"]);
        assert_eq!(problems[1].details, vec!["List 'l' / Node 'a'"]);
        assert_eq!(
            problems[3].details,
            vec!["Class: onto:Book / Undefined-Super: onto:Missing"]
        );
        assert_eq!(
            problems[4].details,
            vec![
                "Class 'onto:Book' / Property 'onto:nope'",
                "Class 'onto:Book' / Property 'hasFoo'"
            ]
        );
    }

    #[test]
    fn test_mandatory_link_cycle_is_reported() {
        let p = project(
            r#"[{"name": "linkA", "super": "hasLinkTo", "object": ":A", "gui_element": "Searchbox"},
                {"name": "linkB", "super": "hasLinkTo", "object": ":B", "gui_element": "Searchbox"}]"#,
            r#"[{"name": "A", "super": "Resource", "cardinalities": [{"propname": ":linkB", "cardinality": "1"}]},
                {"name": "B", "super": "Resource", "cardinalities": [{"propname": ":linkA", "cardinality": "1"}]}]"#,
            "[]",
        );
        let problems = run(&p);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].problem_type,
            ProjectProblemType::MinCardinalityOneWithCircle
        );
        let rendered = problems[0].to_string();
        assert!(rendered.contains("Cycles are displayed in: Class -- Property --> Object Class"));
        assert!(rendered.contains("onto:A -- onto:linkB --> onto:B"));
        assert!(rendered.contains("onto:B -- onto:linkA --> onto:A"));
    }

    #[test]
    fn test_circular_inheritance_is_reported() {
        let p = project(
            r#"[{"name": "p1", "super": ":p2", "object": "TextValue"},
                {"name": "p2", "super": ":p1", "object": "TextValue"}]"#,
            r#"[{"name": "A", "super": ":B"}, {"name": "B", "super": ":A"}]"#,
            "[]",
        );
        let problems = run(&p);
        let types: Vec<_> = problems.iter().map(|p| p.problem_type).collect();
        assert_eq!(
            types,
            vec![
                ProjectProblemType::CircularClassInheritance,
                ProjectProblemType::CircularPropertyInheritance
            ]
        );
        assert_eq!(problems[0].details, vec!["Cycle: onto:A -> onto:B -> onto:A"]);
    }
}
