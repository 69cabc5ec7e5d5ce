//! Builds the two SHACL shape graphs that data is validated against.
//!
//! The cardinality shapes close every instantiable resource class over the properties it has
//! cardinalities for and check the counts. The content shapes check the type and the content
//! of every value. Both are derived from the project ontologies merged with `knora-api`, as
//! they are returned by the server (each class carries all its restrictions, including the
//! inherited ones).

use std::collections::BTreeSet;

use anyhow::Result;
use log::debug;
use oxigraph::model::vocab::xsd;
use oxigraph::model::{
    BlankNode, Graph, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef,
    Term, TermRef, Triple, TripleRef,
};

use crate::clients::OneList;
use crate::consts::{
    API_SHAPES, DASH_CLOSED_BY_TYPES, FIRST, GUI_ATTRIBUTE, GUI_ELEMENT, HAS_LICENSE,
    HAS_PERMISSIONS_CARDINALITY, HAS_STANDOFF_LINK_TO, IS_EDITABLE, IS_LINK_PROPERTY,
    IS_LINK_VALUE_PROPERTY, IS_PART_OF, IS_RESOURCE_CLASS, CAN_BE_INSTANTIATED,
    KNORA_FILE_VALUE, KNORA_LINK_VALUE, LABEL, LINK_VALUE_HAS_TARGET_ID, LIST_VALUE,
    LIST_VALUE_AS_LIST_NODE, NIL, OBJECT_TYPE, OWL_CARDINALITY, OWL_CLASS, OWL_MAX_CARDINALITY,
    OWL_MIN_CARDINALITY, OWL_OBJECT_PROPERTY, OWL_ON_PROPERTY, OWL_RESTRICTION, REST,
    SALSAH_GUI, SEQNUM, SEQNUM_PROP_SHAPE, SH_CLASS, SH_IN, SH_MAX_COUNT, SH_MESSAGE,
    SH_MIN_COUNT, SH_NODE, SH_NODE_SHAPE, SH_PATH, SH_PROPERTY, SH_PROPERTY_SHAPE, SH_SEVERITY,
    SH_TARGET_CLASS, SH_VIOLATION, SUB_CLASS_OF, TEXT_VALUE, TYPE,
};
use crate::util::{parse_turtle, term_as_named_node, term_as_node};

const API_SHAPES_TTL: &str = include_str!("../resources/api-shapes.ttl");

/// The shapes shipped with the library: value classes, text values, file values and the
/// generic resource checks.
pub fn api_shapes() -> Result<Graph> {
    parse_turtle(API_SHAPES_TTL)
}

/// Cardinality of one `owl:Restriction` as it matters for the shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestrictionCard {
    One,
    ZeroOrOne,
    OneOrMore,
    ZeroOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Restriction {
    property: NamedNode,
    card: Option<RestrictionCard>,
}

fn is_true(graph: &Graph, subject: NamedNodeRef<'_>, predicate: NamedNodeRef<'_>) -> bool {
    matches!(
        graph.object_for_subject_predicate(subject, predicate),
        Some(TermRef::Literal(l)) if l.value() == "true"
    )
}

fn literal_value(graph: &Graph, subject: NamedOrBlankNodeRef<'_>, predicate: NamedNodeRef<'_>) -> Option<String> {
    match graph.object_for_subject_predicate(subject, predicate)? {
        TermRef::Literal(l) => Some(l.value().to_string()),
        _ => None,
    }
}

/// Classes that can have instances in the data: `isResourceClass` and `canBeInstantiated`.
fn instantiable_resource_classes(onto: &Graph) -> Vec<NamedNode> {
    let mut classes: Vec<NamedNode> = onto
        .subjects_for_predicate_object(TYPE, OWL_CLASS)
        .filter_map(|s| match s {
            NamedOrBlankNodeRef::NamedNode(n) => Some(n),
            _ => None,
        })
        .filter(|c| is_true(onto, *c, IS_RESOURCE_CLASS) && is_true(onto, *c, CAN_BE_INSTANTIATED))
        .map(|c| c.into_owned())
        .collect();
    classes.sort();
    classes.dedup();
    classes
}

fn restrictions_of(onto: &Graph, class: NamedNodeRef<'_>) -> Vec<Restriction> {
    let mut restrictions = Vec::new();
    for parent in onto.objects_for_subject_predicate(class, SUB_CLASS_OF) {
        let Some(node) = term_as_node(parent) else {
            continue;
        };
        if !onto.contains(TripleRef::new(node, TYPE, OWL_RESTRICTION)) {
            continue;
        }
        let Some(property) = onto
            .object_for_subject_predicate(node, OWL_ON_PROPERTY)
            .and_then(term_as_named_node)
        else {
            continue;
        };
        let card = if literal_value(onto, node, OWL_CARDINALITY).as_deref() == Some("1") {
            Some(RestrictionCard::One)
        } else if literal_value(onto, node, OWL_MAX_CARDINALITY).as_deref() == Some("1") {
            Some(RestrictionCard::ZeroOrOne)
        } else {
            match literal_value(onto, node, OWL_MIN_CARDINALITY).as_deref() {
                Some("1") => Some(RestrictionCard::OneOrMore),
                Some("0") => Some(RestrictionCard::ZeroOrMore),
                _ => None,
            }
        };
        restrictions.push(Restriction {
            property: property.into_owned(),
            card,
        });
    }
    restrictions.sort_by(|a, b| a.property.cmp(&b.property));
    restrictions
}

/// Restrictions on properties a user can write: editable and not the `*Value` twin of a link
/// property.
fn editable_restrictions(onto: &Graph, class: NamedNodeRef<'_>) -> Vec<Restriction> {
    restrictions_of(onto, class)
        .into_iter()
        .filter(|r| {
            is_true(onto, r.property.as_ref(), IS_EDITABLE)
                && !is_true(onto, r.property.as_ref(), IS_LINK_VALUE_PROPERTY)
        })
        .collect()
}

fn integer(value: &str) -> Literal {
    Literal::new_typed_literal(value, xsd::INTEGER)
}

fn shape_iri(property: NamedNodeRef<'_>, suffix: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{}{}", property.as_str(), suffix))
}

/// Writes an `rdf:List` of the given terms and returns its head.
fn insert_rdf_list(graph: &mut Graph, items: Vec<Term>) -> NamedOrBlankNode {
    let mut head: NamedOrBlankNode = NIL.into_owned().into();
    for item in items.into_iter().rev() {
        let cell: NamedOrBlankNode = BlankNode::default().into();
        graph.insert(&Triple::new(cell.clone(), FIRST.into_owned(), item));
        graph.insert(&Triple::new(cell.clone(), REST.into_owned(), head));
        head = cell;
    }
    head
}

/// Adds an anonymous `sh:PropertyShape` to `parent` and returns its node.
fn insert_property_shape(graph: &mut Graph, parent: &NamedOrBlankNode, path: NamedNodeRef<'_>) -> NamedOrBlankNode {
    let shape: NamedOrBlankNode = BlankNode::default().into();
    graph.insert(&Triple::new(parent.clone(), SH_PROPERTY.into_owned(), shape.clone()));
    graph.insert(&Triple::new(shape.clone(), TYPE.into_owned(), SH_PROPERTY_SHAPE.into_owned()));
    graph.insert(&Triple::new(shape.clone(), SH_PATH.into_owned(), path.into_owned()));
    shape
}

fn insert_message(graph: &mut Graph, shape: &NamedOrBlankNode, message: &str) {
    graph.insert(&Triple::new(shape.clone(), SH_SEVERITY.into_owned(), SH_VIOLATION.into_owned()));
    graph.insert(&Triple::new(
        shape.clone(),
        SH_MESSAGE.into_owned(),
        Literal::new_simple_literal(message),
    ));
}

/// Node shapes for every instantiable resource class, closed by types, with one property
/// shape per cardinality.
pub fn construct_cardinality_shapes(onto: &Graph) -> Result<Graph> {
    debug!("Constructing cardinality shapes for the ontology.");
    let mut graph = Graph::new();
    let api = api_shapes()?;
    for triple in api.triples_for_subject(HAS_PERMISSIONS_CARDINALITY) {
        graph.insert(triple);
    }

    for class in instantiable_resource_classes(onto) {
        let node: NamedOrBlankNode = class.clone().into();
        graph.insert(&Triple::new(node.clone(), TYPE.into_owned(), SH_NODE_SHAPE.into_owned()));
        graph.insert(&Triple::new(
            node.clone(),
            DASH_CLOSED_BY_TYPES.into_owned(),
            Literal::new_typed_literal("true", xsd::BOOLEAN),
        ));
        graph.insert(&Triple::new(
            node.clone(),
            SH_PROPERTY.into_owned(),
            HAS_PERMISSIONS_CARDINALITY.into_owned(),
        ));
        let label = insert_property_shape(&mut graph, &node, LABEL);
        graph.insert(&Triple::new(label.clone(), SH_MIN_COUNT.into_owned(), integer("1")));
        graph.insert(&Triple::new(label.clone(), SH_MAX_COUNT.into_owned(), integer("1")));
        insert_message(&mut graph, &label, "A label is required");
        insert_property_shape(&mut graph, &node, HAS_STANDOFF_LINK_TO);

        for restriction in editable_restrictions(onto, class.as_ref()) {
            let shape = insert_property_shape(&mut graph, &node, restriction.property.as_ref());
            let (min, max, message) = match restriction.card {
                Some(RestrictionCard::One) => (Some("1"), Some("1"), "Cardinality 1"),
                Some(RestrictionCard::ZeroOrOne) => (Some("0"), Some("1"), "Cardinality 0-1"),
                Some(RestrictionCard::OneOrMore) => (Some("1"), None, "Cardinality 1-n"),
                // 0-n only declares the property for the closed check
                Some(RestrictionCard::ZeroOrMore) | None => continue,
            };
            if let Some(min) = min {
                graph.insert(&Triple::new(shape.clone(), SH_MIN_COUNT.into_owned(), integer(min)));
            }
            if let Some(max) = max {
                graph.insert(&Triple::new(shape.clone(), SH_MAX_COUNT.into_owned(), integer(max)));
            }
            insert_message(&mut graph, &shape, message);
        }
    }
    debug!("Cardinality shapes have {} triples", graph.len());
    Ok(graph)
}

/// Property shapes for the values, merged with the shipped api shapes.
pub fn construct_content_shapes(onto: &Graph, lists: &[OneList], licenses: &[String]) -> Result<Graph> {
    debug!("Constructing content shapes for the ontology.");
    let mut graph = api_shapes()?;
    let classes = instantiable_resource_classes(onto);

    let mut used_properties: BTreeSet<NamedNode> = BTreeSet::new();
    for class in &classes {
        let node: NamedOrBlankNode = class.clone().into();
        for restriction in editable_restrictions(onto, class.as_ref()) {
            graph.insert(&Triple::new(node.clone(), TYPE.into_owned(), SH_NODE_SHAPE.into_owned()));
            graph.insert(&Triple::new(
                node.clone(),
                SH_PROPERTY.into_owned(),
                shape_iri(restriction.property.as_ref(), "_PropShape"),
            ));
            used_properties.insert(restriction.property);
        }
        let has_seqnum_or_part_of = restrictions_of(onto, class.as_ref())
            .iter()
            .any(|r| r.property.as_ref() == SEQNUM || r.property.as_ref() == IS_PART_OF);
        if has_seqnum_or_part_of {
            graph.insert(&Triple::new(
                node.clone(),
                SH_PROPERTY.into_owned(),
                SEQNUM_PROP_SHAPE.into_owned(),
            ));
        }
    }

    for property in &used_properties {
        add_value_type_shape(&mut graph, onto, property.as_ref());
    }
    add_link_target_shapes(&mut graph, onto);
    add_text_value_shapes(&mut graph, onto);
    for list in lists {
        add_list_shapes(&mut graph, onto, list);
    }
    if !licenses.is_empty() {
        add_license_shape(&mut graph, licenses)?;
    }
    debug!("Content shapes have {} triples", graph.len());
    Ok(graph)
}

/// `<prop>_PropShape` checks the class of the value node.
fn add_value_type_shape(graph: &mut Graph, onto: &Graph, property: NamedNodeRef<'_>) {
    let shape: NamedOrBlankNode = shape_iri(property, "_PropShape").into();
    let (object_type, message) = if is_true(onto, property, IS_LINK_PROPERTY) {
        (
            KNORA_LINK_VALUE.into_owned(),
            "This property requires a LinkValue".to_string(),
        )
    } else {
        let Some(object_type) = onto
            .object_for_subject_predicate(property, OBJECT_TYPE)
            .and_then(term_as_named_node)
        else {
            return;
        };
        let local = object_type
            .as_str()
            .rsplit_once('#')
            .map(|(_, l)| l)
            .unwrap_or(object_type.as_str());
        (
            object_type.into_owned(),
            format!("This property requires a {}", local),
        )
    };
    graph.insert(&Triple::new(shape.clone(), TYPE.into_owned(), SH_PROPERTY_SHAPE.into_owned()));
    graph.insert(&Triple::new(shape.clone(), SH_PATH.into_owned(), property.into_owned()));
    graph.insert(&Triple::new(shape.clone(), SH_CLASS.into_owned(), object_type));
    graph.insert(&Triple::new(
        shape,
        SH_MESSAGE.into_owned(),
        Literal::new_simple_literal(message),
    ));
}

fn object_properties(onto: &Graph) -> Vec<NamedNode> {
    let mut props: Vec<NamedNode> = onto
        .subjects_for_predicate_object(TYPE, OWL_OBJECT_PROPERTY)
        .filter_map(|s| match s {
            NamedOrBlankNodeRef::NamedNode(n) => Some(n.into_owned()),
            _ => None,
        })
        .collect();
    props.sort();
    props.dedup();
    props
}

/// Link properties point through their value node to a resource of the range class. The
/// message of the nested shape is the IRI of the range class.
fn add_link_target_shapes(graph: &mut Graph, onto: &Graph) {
    for property in object_properties(onto) {
        if !is_true(onto, property.as_ref(), IS_LINK_PROPERTY) {
            continue;
        }
        let Some(range) = onto
            .object_for_subject_predicate(property.as_ref(), OBJECT_TYPE)
            .and_then(term_as_named_node)
            .map(|r| r.into_owned())
        else {
            continue;
        };
        let prop_shape: NamedOrBlankNode = shape_iri(property.as_ref(), "_PropShape").into();
        let node_shape: NamedOrBlankNode = shape_iri(property.as_ref(), "_NodeShape").into();
        graph.insert(&Triple::new(prop_shape.clone(), TYPE.into_owned(), SH_PROPERTY_SHAPE.into_owned()));
        graph.insert(&Triple::new(prop_shape.clone(), SH_PATH.into_owned(), property.clone()));
        graph.insert(&Triple::new(prop_shape, SH_NODE.into_owned(), node_shape.clone()));

        graph.insert(&Triple::new(node_shape.clone(), TYPE.into_owned(), SH_NODE_SHAPE.into_owned()));
        graph.insert(&Triple::new(node_shape.clone(), SH_SEVERITY.into_owned(), SH_VIOLATION.into_owned()));
        let target = insert_property_shape(graph, &node_shape, LINK_VALUE_HAS_TARGET_ID);
        graph.insert(&Triple::new(target.clone(), SH_CLASS.into_owned(), range.clone()));
        graph.insert(&Triple::new(
            target,
            SH_MESSAGE.into_owned(),
            Literal::new_simple_literal(range.as_str()),
        ));
    }
}

fn add_text_value_shapes(graph: &mut Graph, onto: &Graph) {
    let gui_to_shape = [
        ("SimpleText", "SimpleTextValue_ClassShape"),
        ("Textarea", "TextareaTextValue_ClassShape"),
        ("Richtext", "FormattedTextValue_ClassShape"),
    ];
    for property in object_properties(onto) {
        let object_type = onto.object_for_subject_predicate(property.as_ref(), OBJECT_TYPE);
        if object_type != Some(TermRef::NamedNode(TEXT_VALUE)) {
            continue;
        }
        let Some(gui_element) = onto
            .object_for_subject_predicate(property.as_ref(), GUI_ELEMENT)
            .and_then(term_as_named_node)
        else {
            continue;
        };
        let Some((_, shape)) = gui_to_shape
            .iter()
            .find(|(gui, _)| gui_element.as_str() == format!("{}{}", SALSAH_GUI, gui))
        else {
            continue;
        };
        let prop_shape: NamedOrBlankNode = shape_iri(property.as_ref(), "_PropShape").into();
        graph.insert(&Triple::new(prop_shape.clone(), TYPE.into_owned(), SH_PROPERTY_SHAPE.into_owned()));
        graph.insert(&Triple::new(prop_shape.clone(), SH_PATH.into_owned(), property.clone()));
        graph.insert(&Triple::new(
            prop_shape,
            SH_NODE.into_owned(),
            NamedNode::new_unchecked(format!("{}{}", API_SHAPES, shape)),
        ));
    }
}

/// A node shape named after the list that only accepts its nodes, and a reference to it from
/// every list property that uses the list.
fn add_list_shapes(graph: &mut Graph, onto: &Graph, list: &OneList) {
    let Ok(list_iri) = NamedNode::new(list.list_iri.as_str()) else {
        debug!("Skipping list with invalid IRI '{}'", list.list_iri);
        return;
    };
    let list_node: NamedOrBlankNode = list_iri.into();
    graph.insert(&Triple::new(list_node.clone(), TYPE.into_owned(), SH_NODE_SHAPE.into_owned()));
    let shape = insert_property_shape(graph, &list_node, LIST_VALUE_AS_LIST_NODE);
    let nodes = list
        .user_facing_nodes()
        .into_iter()
        .map(|n| Literal::new_simple_literal(n).into())
        .collect();
    let head = insert_rdf_list(graph, nodes);
    graph.insert(&Triple::new(shape.clone(), SH_IN.into_owned(), head));
    insert_message(
        graph,
        &shape,
        &format!(
            "A valid node from the list '{}' must be used with this property (input displayed in format 'listName / NodeName').",
            list.list_name
        ),
    );

    let hlist = list.hlist();
    for property in object_properties(onto) {
        let is_list_prop = onto.object_for_subject_predicate(property.as_ref(), OBJECT_TYPE)
            == Some(TermRef::NamedNode(LIST_VALUE));
        let uses_list = onto
            .objects_for_subject_predicate(property.as_ref(), GUI_ATTRIBUTE)
            .any(|attr| matches!(attr, TermRef::Literal(l) if l.value() == hlist));
        if !is_list_prop || !uses_list {
            continue;
        }
        let prop_shape: NamedOrBlankNode = shape_iri(property.as_ref(), "_PropShape").into();
        graph.insert(&Triple::new(prop_shape.clone(), TYPE.into_owned(), SH_PROPERTY_SHAPE.into_owned()));
        graph.insert(&Triple::new(prop_shape.clone(), SH_PATH.into_owned(), property.clone()));
        graph.insert(&Triple::new(prop_shape.clone(), SH_NODE.into_owned(), list_node.clone()));
        graph.insert(&Triple::new(prop_shape, SH_SEVERITY.into_owned(), SH_VIOLATION.into_owned()));
    }
}

fn add_license_shape(graph: &mut Graph, licenses: &[String]) -> Result<()> {
    let node: NamedOrBlankNode =
        NamedNode::new(format!("{}FileValueLicense_Shape", API_SHAPES))?.into();
    graph.insert(&Triple::new(node.clone(), TYPE.into_owned(), SH_NODE_SHAPE.into_owned()));
    graph.insert(&Triple::new(node.clone(), SH_TARGET_CLASS.into_owned(), KNORA_FILE_VALUE.into_owned()));
    let shape = insert_property_shape(graph, &node, HAS_LICENSE);
    let mut items = Vec::with_capacity(licenses.len());
    for license in licenses {
        items.push(NamedNode::new(license.as_str())?.into());
    }
    let head = insert_rdf_list(graph, items);
    graph.insert(&Triple::new(shape.clone(), SH_IN.into_owned(), head));
    insert_message(
        graph,
        &shape,
        "Files and IIIF-URIs require a license that is enabled for the project.",
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::OneNode;
    use crate::consts::KNORA_API;

    const ONTO: &str = include_str!("../fixtures/shapes_onto.ttl");

    fn onto() -> Graph {
        parse_turtle(ONTO).unwrap()
    }

    fn named(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn onto_iri(local: &str) -> NamedNode {
        named(&format!("http://0.0.0.0:3333/ontology/0001/onto/v2#{}", local))
    }

    fn message_of_path(graph: &Graph, path: NamedNodeRef<'_>) -> Vec<String> {
        let mut messages: Vec<String> = graph
            .subjects_for_predicate_object(SH_PATH, path)
            .filter_map(|shape| literal_value(graph, shape, SH_MESSAGE))
            .collect();
        messages.sort();
        messages
    }

    #[test]
    fn shipped_api_shapes_parse() {
        let graph = api_shapes().unwrap();
        assert!(graph.triples_for_subject(SEQNUM_PROP_SHAPE).next().is_some());
        assert!(graph
            .triples_for_subject(HAS_PERMISSIONS_CARDINALITY)
            .next()
            .is_some());
    }

    #[test]
    fn only_instantiable_classes_get_shapes() {
        let classes = instantiable_resource_classes(&onto());
        assert_eq!(classes, vec![onto_iri("Book"), onto_iri("Person")]);
    }

    #[test]
    fn cardinality_messages() {
        let shapes = construct_cardinality_shapes(&onto()).unwrap();
        assert_eq!(
            message_of_path(&shapes, onto_iri("hasTitle").as_ref()),
            vec!["Cardinality 1"]
        );
        assert_eq!(
            message_of_path(&shapes, onto_iri("hasAuthor").as_ref()),
            vec!["Cardinality 1-n"]
        );
        assert_eq!(
            message_of_path(&shapes, onto_iri("hasColor").as_ref()),
            vec!["Cardinality 0-1"]
        );
        // declared for the closed check but unconstrained
        assert_eq!(
            shapes
                .subjects_for_predicate_object(SH_PATH, onto_iri("hasGenre").as_ref())
                .count(),
            1
        );
        assert!(message_of_path(&shapes, onto_iri("hasGenre").as_ref()).is_empty());
        // link value twins and non-editable properties are not part of the shapes
        assert_eq!(
            shapes
                .subjects_for_predicate_object(SH_PATH, onto_iri("hasAuthorValue").as_ref())
                .count(),
            0
        );
        let version_date = named(&format!("{}versionDate", KNORA_API));
        assert_eq!(
            shapes
                .subjects_for_predicate_object(SH_PATH, version_date.as_ref())
                .count(),
            0
        );
    }

    #[test]
    fn classes_are_closed_by_types() {
        let shapes = construct_cardinality_shapes(&onto()).unwrap();
        let book = onto_iri("Book");
        assert!(is_true(&shapes, book.as_ref(), DASH_CLOSED_BY_TYPES));
        assert_eq!(message_of_path(&shapes, LABEL), vec!["A label is required", "A label is required"]);
        let label_shapes: Vec<_> = shapes.subjects_for_predicate_object(SH_PATH, LABEL).collect();
        assert!(label_shapes
            .iter()
            .all(|s| literal_value(&shapes, *s, SH_MIN_COUNT).as_deref() == Some("1")));
    }

    #[test]
    fn content_shapes_check_value_types() {
        let shapes = construct_content_shapes(&onto(), &[], &[]).unwrap();
        let color_shape = shape_iri(onto_iri("hasColor").as_ref(), "_PropShape");
        assert_eq!(
            literal_value(&shapes, color_shape.as_ref().into(), SH_MESSAGE).as_deref(),
            Some("This property requires a ColorValue")
        );
        let author_shape = shape_iri(onto_iri("hasAuthor").as_ref(), "_PropShape");
        assert_eq!(
            shapes.object_for_subject_predicate(author_shape.as_ref(), SH_CLASS),
            Some(TermRef::NamedNode(KNORA_LINK_VALUE))
        );
        let book = onto_iri("Book");
        assert!(shapes.contains(&Triple::new(
            book.clone(),
            SH_PROPERTY.into_owned(),
            SEQNUM_PROP_SHAPE.into_owned()
        )));
        assert!(shapes.contains(&Triple::new(
            book,
            SH_PROPERTY.into_owned(),
            color_shape
        )));
    }

    #[test]
    fn link_properties_check_the_target_class() {
        let shapes = construct_content_shapes(&onto(), &[], &[]).unwrap();
        let node_shape = shape_iri(onto_iri("hasAuthor").as_ref(), "_NodeShape");
        let target: Vec<_> = shapes
            .subjects_for_predicate_object(SH_PATH, LINK_VALUE_HAS_TARGET_ID)
            .collect();
        assert_eq!(target.len(), 1);
        assert_eq!(
            shapes.object_for_subject_predicate(target[0], SH_CLASS),
            Some(TermRef::NamedNode(onto_iri("Person").as_ref()))
        );
        assert!(shapes
            .objects_for_subject_predicate(node_shape.as_ref(), SH_PROPERTY)
            .any(|o| term_as_node(o) == Some(target[0])));
    }

    #[test]
    fn text_properties_get_the_gui_specific_shape() {
        let shapes = construct_content_shapes(&onto(), &[], &[]).unwrap();
        let title_shape = shape_iri(onto_iri("hasTitle").as_ref(), "_PropShape");
        let nodes: Vec<String> = shapes
            .objects_for_subject_predicate(title_shape.as_ref(), SH_NODE)
            .map(|o| o.to_string())
            .collect();
        assert_eq!(
            nodes,
            vec![format!("<{}SimpleTextValue_ClassShape>", API_SHAPES)]
        );
    }

    #[test]
    fn list_properties_only_accept_list_nodes() {
        let list = OneList {
            list_iri: "http://rdfh.ch/lists/0001/genres".to_string(),
            list_name: "genres".to_string(),
            nodes: vec![
                OneNode {
                    name: "novel".to_string(),
                    iri: "http://rdfh.ch/lists/0001/novel".to_string(),
                },
                OneNode {
                    name: "poem".to_string(),
                    iri: "http://rdfh.ch/lists/0001/poem".to_string(),
                },
            ],
        };
        let shapes = construct_content_shapes(&onto(), &[list], &[]).unwrap();
        let genre_shape = shape_iri(onto_iri("hasGenre").as_ref(), "_PropShape");
        let list_iri = named("http://rdfh.ch/lists/0001/genres");
        assert!(shapes.contains(&Triple::new(genre_shape, SH_NODE.into_owned(), list_iri.clone())));

        let in_shape = shapes
            .objects_for_subject_predicate(list_iri.as_ref(), SH_PROPERTY)
            .find_map(term_as_node)
            .unwrap();
        let mut head = shapes
            .object_for_subject_predicate(in_shape, SH_IN)
            .and_then(term_as_node)
            .unwrap();
        let mut values = Vec::new();
        while head != NIL.into() {
            values.push(literal_value(&shapes, head, FIRST).unwrap());
            head = shapes
                .object_for_subject_predicate(head, REST)
                .and_then(term_as_node)
                .unwrap();
        }
        assert_eq!(values, vec!["genres / novel", "genres / poem"]);
    }

    #[test]
    fn licenses_restrict_file_values() {
        let shapes = construct_content_shapes(
            &onto(),
            &[],
            &["http://rdfh.ch/licenses/cc-by-4.0".to_string()],
        )
        .unwrap();
        assert_eq!(
            message_of_path(&shapes, HAS_LICENSE),
            vec![
                "Files and IIIF-URIs require a license that is enabled for the project.",
                "Files and IIIF-URIs require a reference to a license."
            ]
        );
    }
}
