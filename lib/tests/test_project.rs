use anyhow::{anyhow, Result};
use dsp_validate::dependency::{
    class_creation_order, create_classes_in_order, dependency_graph_to_dot, mandatory_link_graph,
    ClassCreator, CreationProblemType,
};
use dsp_validate::doctor::{ProjectDoctor, ProjectProblemType};
use dsp_validate::project::{parse_project_file, ParsedClass, ParsedProject};
use std::collections::HashMap;
use std::path::Path;

const API: &str = "http://0.0.0.0:3333";

fn load(name: &str) -> ParsedProject {
    parse_project_file(&Path::new("fixtures/projects").join(name), API).unwrap()
}

fn onto(local: &str) -> String {
    format!("{}/ontology/9999/onto/v2#{}", API, local)
}

#[test]
fn test_circular_mandatory_links() {
    let project = load("circular.json");
    let graph = mandatory_link_graph(&project);
    let cycles = graph.cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 2);

    let problems = ProjectDoctor::default().run(&project).unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(
        problems[0].problem_type,
        ProjectProblemType::MinCardinalityOneWithCircle
    );
    let text = problems[0].to_string();
    assert!(text.contains("onto:A -- onto:hasLinkToB --> onto:B"));
    assert!(text.contains("onto:B -- onto:hasLinkToA --> onto:A"));
}

#[test]
fn test_self_loop_is_a_cycle_of_one_edge() {
    let project = load("self_loop.json");
    let cycles = mandatory_link_graph(&project).cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 1);
    let dot = dependency_graph_to_dot(&project);
    assert!(dot.contains("onto:Node"));
    assert!(dot.contains("onto:hasParent"));
}

#[test]
fn test_clean_project() {
    let project = load("hierarchy.json");
    assert!(mandatory_link_graph(&project).cycles().is_empty());
    let problems = ProjectDoctor::default().run(&project).unwrap();
    assert!(problems.is_empty(), "{:?}", problems);
}

#[test]
fn test_superclasses_are_created_first() {
    let project = load("hierarchy.json");
    let classes: Vec<ParsedClass> = project.classes().cloned().collect();
    let order = class_creation_order(&classes).unwrap();
    assert_eq!(order.len(), classes.len());
    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();
    for class in &classes {
        for super_class in &class.supers {
            if let Some(s) = position.get(super_class.as_str()) {
                assert!(*s < position[class.name.as_str()], "{} before {}", super_class, class.name);
            }
        }
    }
    assert_eq!(order[0].name, onto("Book"));
}

/// Fails on one class and records the others.
struct FailingCreator {
    fail: String,
    created: Vec<String>,
}

impl ClassCreator for FailingCreator {
    fn create_class(&mut self, class: &ParsedClass) -> Result<()> {
        if class.name == self.fail {
            return Err(anyhow!("server error"));
        }
        self.created.push(class.name.clone());
        Ok(())
    }
}

#[test]
fn test_failed_superclass_cascades() {
    let project = load("hierarchy.json");
    let classes: Vec<ParsedClass> = project.classes().cloned().collect();
    let mut creator = FailingCreator {
        fail: onto("Book"),
        created: vec![],
    };
    let outcome = create_classes_in_order(&classes, &mut creator).unwrap();
    assert_eq!(creator.created, vec![onto("Text"), onto("Person")]);
    assert_eq!(outcome.created, creator.created);
    let failed: Vec<(String, CreationProblemType)> = outcome
        .problems
        .iter()
        .map(|p| (p.class_iri.clone(), p.problem_type))
        .collect();
    assert_eq!(
        failed,
        vec![
            (onto("Book"), CreationProblemType::ClassCreationFailed),
            (onto("Novel"), CreationProblemType::ClassSuperFailed),
            (onto("ShortNovel"), CreationProblemType::ClassSuperFailed),
        ]
    );
}
