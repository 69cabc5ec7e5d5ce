//! Dependency graphs between the classes and properties of a project.
//!
//! Two graphs are built here. The inheritance graph gives the order in which classes can be
//! created on the server, superclasses first. The mandatory link graph has an edge
//! `A --prop--> B` for every link property `prop` that class `A` requires (cardinality `1` or
//! `1-n`) and that points to class `B`; a cycle in it means that no resource of the classes on
//! the cycle could ever be created first.

use anyhow::{anyhow, Result};
use log::{debug, warn};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{EdgeIndex, Graph as DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::consts::KNORA_API;
use crate::project::{ParsedClass, ParsedProject};
use crate::util::reformat_onto_iri;

/// Orders classes so that every class comes after the superclasses defined in the same list.
/// Classes that do not depend on each other keep their input order. Fails if the inheritance
/// contains a cycle.
pub fn class_creation_order(classes: &[ParsedClass]) -> Result<Vec<&ParsedClass>> {
    let index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..classes.len()).map(|i| graph.add_node(i)).collect();
    for (i, class) in classes.iter().enumerate() {
        for super_class in &class.supers {
            if let Some(&s) = index.get(super_class.as_str()) {
                graph.update_edge(nodes[s], nodes[i], ());
            }
        }
    }

    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|n| {
            graph
                .neighbors_directed(*n, petgraph::Direction::Incoming)
                .count()
        })
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut order = Vec::with_capacity(classes.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(&classes[i]);
        for next in graph.neighbors_directed(nodes[i], petgraph::Direction::Outgoing) {
            let j = graph[next];
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.push(Reverse(j));
            }
        }
    }
    if order.len() != classes.len() {
        let blocked: Vec<String> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0)
            .map(|(i, _)| reformat_onto_iri(&classes[i].name))
            .collect();
        return Err(anyhow!(
            "The classes {} have circular inheritance, no creation order exists",
            blocked.join(", ")
        ));
    }
    Ok(order)
}

/// Creates one class on the server.
pub trait ClassCreator {
    fn create_class(&mut self, class: &ParsedClass) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationProblemType {
    ClassSuperFailed,
    ClassCreationFailed,
}

impl CreationProblemType {
    pub fn as_str(self) -> &'static str {
        match self {
            CreationProblemType::ClassSuperFailed => "CLASS_SUPER_FAILED",
            CreationProblemType::ClassCreationFailed => "CLASS_CREATION_FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationProblem {
    pub class_iri: String,
    pub problem_type: CreationProblemType,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCreationOutcome {
    pub created: Vec<String>,
    pub problems: Vec<CreationProblem>,
}

/// Creates all classes in dependency order. A class whose superclass failed is not attempted
/// and is itself counted as failed, so failures cascade down the hierarchy. The batch always
/// runs to the end.
pub fn create_classes_in_order(
    classes: &[ParsedClass],
    creator: &mut dyn ClassCreator,
) -> Result<ClassCreationOutcome> {
    let order = class_creation_order(classes)?;
    let mut failed: HashSet<&str> = HashSet::new();
    let mut outcome = ClassCreationOutcome::default();
    for class in order {
        let failed_supers: Vec<String> = class
            .supers
            .iter()
            .filter(|s| failed.contains(s.as_str()))
            .map(|s| reformat_onto_iri(s))
            .collect();
        if !failed_supers.is_empty() {
            debug!("Skipping {} because a superclass failed", class.name);
            failed.insert(class.name.as_str());
            outcome.problems.push(CreationProblem {
                class_iri: class.name.clone(),
                problem_type: CreationProblemType::ClassSuperFailed,
                message: format!(
                    "The class '{}' was not created because its superclass {} could not be created",
                    reformat_onto_iri(&class.name),
                    failed_supers.join(", ")
                ),
            });
            continue;
        }
        match creator.create_class(class) {
            Ok(()) => outcome.created.push(class.name.clone()),
            Err(e) => {
                warn!("Could not create class {}: {}", class.name, e);
                failed.insert(class.name.as_str());
                outcome.problems.push(CreationProblem {
                    class_iri: class.name.clone(),
                    problem_type: CreationProblemType::ClassCreationFailed,
                    message: format!(
                        "The class '{}' could not be created: {}",
                        reformat_onto_iri(&class.name),
                        e
                    ),
                });
            }
        }
    }
    Ok(outcome)
}

/// Graph of the mandatory links between classes. Nodes are class IRIs, edges are property IRIs.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    pub graph: DiGraph<String, String>,
}

impl LinkGraph {
    fn node(&mut self, indices: &mut HashMap<String, NodeIndex>, iri: &str) -> NodeIndex {
        if let Some(idx) = indices.get(iri) {
            return *idx;
        }
        let idx = self.graph.add_node(iri.to_string());
        indices.insert(iri.to_string(), idx);
        idx
    }

    /// Every simple cycle as its list of edges. A self loop is a cycle with one edge, and
    /// parallel edges between the same two classes give one cycle each.
    pub fn cycles(&self) -> Vec<Vec<EdgeIndex>> {
        let mut cycles = Vec::new();
        for node_cycle in simple_node_cycles(&self.graph) {
            cycles.extend(expand_parallel_edges(&self.graph, &node_cycle));
        }
        cycles
    }

    /// `Class -- property --> Object Class` for one edge.
    pub fn describe_edge(&self, edge: EdgeIndex) -> Option<String> {
        let (source, target) = self.graph.edge_endpoints(edge)?;
        Some(format!(
            "{} -- {} --> {}",
            reformat_onto_iri(&self.graph[source]),
            reformat_onto_iri(&self.graph[edge]),
            reformat_onto_iri(&self.graph[target])
        ))
    }

    /// One block per cycle with its edges sorted.
    pub fn describe_cycles(&self) -> Vec<String> {
        self.cycles()
            .iter()
            .map(|cycle| {
                let mut lines: Vec<String> =
                    cycle.iter().filter_map(|e| self.describe_edge(*e)).collect();
                lines.sort();
                format!("Cycle:\n    {}", lines.join("\n    "))
            })
            .collect()
    }

    pub fn to_dot(&self) -> String {
        let display = self
            .graph
            .map(|_, n| reformat_onto_iri(n), |_, e| reformat_onto_iri(e));
        let dot = petgraph::dot::Dot::with_config(&display, &[]);
        format!("{}", dot)
    }
}

/// Builds the graph of mandatory links. Link properties are the ones edited with a search box.
pub fn mandatory_link_graph(project: &ParsedProject) -> LinkGraph {
    let link_targets: HashMap<&str, &str> = project
        .properties()
        .filter(|p| p.is_link_property())
        .map(|p| (p.name.as_str(), p.object.as_str()))
        .collect();
    let mut link_graph = LinkGraph::default();
    let mut indices = HashMap::new();
    for class_cards in project.cardinalities() {
        for card in &class_cards.cards {
            if !card.cardinality.is_mandatory() {
                continue;
            }
            let Some(target) = link_targets.get(card.propname.as_str()) else {
                continue;
            };
            let source = link_graph.node(&mut indices, &class_cards.class_iri);
            let target = link_graph.node(&mut indices, target);
            link_graph
                .graph
                .add_edge(source, target, card.propname.clone());
        }
    }
    link_graph
}

pub fn dependency_graph_to_dot(project: &ParsedProject) -> String {
    mandatory_link_graph(project).to_dot()
}

/// A mandatory link to a generic `knora-api` class. Such links may still form cycles through
/// resources of any class, which can only be seen in the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotentialCircle {
    pub subject: String,
    pub prop: String,
    pub object_class: String,
    pub cardinality: String,
}

pub fn mandatory_links_to_knora_classes(project: &ParsedProject) -> Vec<PotentialCircle> {
    let knora_targets: HashMap<&str, &str> = project
        .properties()
        .filter(|p| p.is_link_property() && p.object.starts_with(KNORA_API))
        .map(|p| (p.name.as_str(), p.object.as_str()))
        .collect();
    let mut found = Vec::new();
    for class_cards in project.cardinalities() {
        for card in &class_cards.cards {
            if let Some(object) = knora_targets.get(card.propname.as_str()) {
                if card.cardinality.is_mandatory() {
                    found.push(PotentialCircle {
                        subject: reformat_onto_iri(&class_cards.class_iri),
                        prop: reformat_onto_iri(&card.propname),
                        object_class: reformat_onto_iri(object),
                        cardinality: card.cardinality.to_string(),
                    });
                }
            }
        }
    }
    found
}

/// Cycles in an inheritance hierarchy given as `(name, supers)`, rendered as
/// `Cycle: a -> b -> a`. Supers that are not in the list are ignored.
pub fn inheritance_cycles<'a>(items: impl IntoIterator<Item = (&'a str, &'a [String])>) -> Vec<String> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
    let items: Vec<_> = items.into_iter().collect();
    for (name, _) in &items {
        indices
            .entry(*name)
            .or_insert_with(|| graph.add_node(name.to_string()));
    }
    for (name, supers) in &items {
        for super_name in supers.iter() {
            if let Some(target) = indices.get(super_name.as_str()) {
                graph.update_edge(indices[name], *target, ());
            }
        }
    }
    let mut cycles: Vec<String> = simple_node_cycles(&graph)
        .iter()
        .map(|cycle| {
            let mut parts: Vec<String> = cycle.iter().map(|n| reformat_onto_iri(&graph[*n])).collect();
            parts.push(parts[0].clone());
            format!("Cycle: {}", parts.join(" -> "))
        })
        .collect();
    cycles.sort();
    cycles
}

/// All elementary circuits as node sequences. Each cycle is reported once, starting at its
/// node with the smallest index. Only nodes of the same strongly connected component are
/// explored.
fn simple_node_cycles<N, E>(graph: &DiGraph<N, E>) -> Vec<Vec<NodeIndex>> {
    let mut component = vec![0usize; graph.node_count()];
    for (i, scc) in tarjan_scc(graph).iter().enumerate() {
        for node in scc {
            component[node.index()] = i;
        }
    }
    let mut cycles = Vec::new();
    for start in graph.node_indices() {
        let mut path = vec![start];
        let mut on_path: HashSet<NodeIndex> = HashSet::from([start]);
        extend_path(graph, &component, start, start, &mut path, &mut on_path, &mut cycles);
    }
    cycles
}

fn extend_path<N, E>(
    graph: &DiGraph<N, E>,
    component: &[usize],
    start: NodeIndex,
    current: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut HashSet<NodeIndex>,
    cycles: &mut Vec<Vec<NodeIndex>>,
) {
    let mut successors: Vec<NodeIndex> = graph.neighbors(current).collect();
    successors.sort();
    successors.dedup();
    for next in successors {
        if next == start {
            cycles.push(path.clone());
        } else if next.index() > start.index()
            && component[next.index()] == component[start.index()]
            && !on_path.contains(&next)
        {
            path.push(next);
            on_path.insert(next);
            extend_path(graph, component, start, next, path, on_path, cycles);
            on_path.remove(&next);
            path.pop();
        }
    }
}

/// Turns a cycle of nodes into all cycles of edges it stands for.
fn expand_parallel_edges<N, E>(graph: &DiGraph<N, E>, nodes: &[NodeIndex]) -> Vec<Vec<EdgeIndex>> {
    let mut expanded: Vec<Vec<EdgeIndex>> = vec![Vec::new()];
    for (i, source) in nodes.iter().enumerate() {
        let target = nodes[(i + 1) % nodes.len()];
        let mut edges: Vec<EdgeIndex> = graph
            .edges_connecting(*source, target)
            .map(|e| e.id())
            .collect();
        edges.sort();
        expanded = expanded
            .iter()
            .flat_map(|prefix| {
                edges.iter().map(move |edge| {
                    let mut cycle = prefix.clone();
                    cycle.push(*edge);
                    cycle
                })
            })
            .collect();
    }
    expanded
}
