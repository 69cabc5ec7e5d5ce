//! Serialises ontology changes into the JSON-LD request bodies of the DSP API.
//!
//! Every request body has the same frame: the ontology node with its last modification date,
//! and an `@graph` holding the class, property or cardinality that is added. The graphs are
//! built as RDF first and then written out in expanded JSON-LD.

use anyhow::Result;
use oxigraph::model::{
    BlankNode, Graph, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef,
    TermRef, Triple,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::consts::{
    COMMENT, KNORA_API, LABEL, LAST_MODIFICATION_DATE, OBJECT_TYPE, OWL_CARDINALITY, OWL_CLASS,
    OWL_MAX_CARDINALITY, OWL_MIN_CARDINALITY, OWL_OBJECT_PROPERTY, OWL_ONTOLOGY, OWL_ON_PROPERTY,
    OWL_RESTRICTION, RDFS, SALSAH_GUI, SUB_CLASS_OF, SUB_PROPERTY_OF, TYPE, XSD,
};
use crate::project::{Cardinality, ParsedClass, ParsedOntology, ParsedProperty, ParsedPropertyCardinality};

fn named(iri: &str) -> Result<NamedNode> {
    Ok(NamedNode::new(iri)?)
}

fn integer(value: u32) -> Literal {
    Literal::new_typed_literal(value.to_string(), NamedNode::new_unchecked(format!("{}integer", XSD)))
}

fn add_lang_strings(
    graph: &mut Graph,
    subject: &NamedNode,
    predicate: NamedNodeRef<'_>,
    strings: &BTreeMap<String, String>,
) -> Result<()> {
    for (lang, text) in strings {
        let literal = Literal::new_language_tagged_literal(text.as_str(), lang.as_str())?;
        graph.insert(&Triple::new(subject.clone(), predicate, literal));
    }
    Ok(())
}

/// The ontology node with its type and last modification date.
pub fn make_ontology_base_graph(onto_iri: &str, last_modification_date: &str) -> Result<Graph> {
    let onto = named(onto_iri)?;
    let mut graph = Graph::new();
    graph.insert(&Triple::new(onto.clone(), TYPE, OWL_ONTOLOGY.into_owned()));
    graph.insert(&Triple::new(
        onto,
        LAST_MODIFICATION_DATE,
        Literal::new_typed_literal(
            last_modification_date,
            NamedNode::new_unchecked(format!("{}dateTimeStamp", XSD)),
        ),
    ));
    Ok(graph)
}

pub fn make_class_graph(class: &ParsedClass) -> Result<Graph> {
    let subject = named(&class.name)?;
    let mut graph = Graph::new();
    graph.insert(&Triple::new(subject.clone(), TYPE, OWL_CLASS.into_owned()));
    add_lang_strings(&mut graph, &subject, LABEL, &class.labels)?;
    if let Some(comments) = &class.comments {
        add_lang_strings(&mut graph, &subject, COMMENT, comments)?;
    }
    for super_class in &class.supers {
        graph.insert(&Triple::new(subject.clone(), SUB_CLASS_OF, named(super_class)?));
    }
    Ok(graph)
}

/// `list_iri` is the IRI of the list a list property points into, as created on the server.
pub fn make_property_graph(prop: &ParsedProperty, list_iri: Option<&str>) -> Result<Graph> {
    let subject = named(&prop.name)?;
    let mut graph = Graph::new();
    graph.insert(&Triple::new(subject.clone(), TYPE, OWL_OBJECT_PROPERTY.into_owned()));
    add_lang_strings(&mut graph, &subject, LABEL, &prop.labels)?;
    if let Some(comments) = &prop.comments {
        add_lang_strings(&mut graph, &subject, COMMENT, comments)?;
    }
    for super_prop in &prop.supers {
        graph.insert(&Triple::new(subject.clone(), SUB_PROPERTY_OF, named(super_prop)?));
    }
    graph.insert(&Triple::new(subject.clone(), OBJECT_TYPE, named(&prop.object)?));
    if let Some(subject_type) = &prop.subject {
        graph.insert(&Triple::new(
            subject.clone(),
            named(&format!("{}subjectType", KNORA_API))?,
            named(subject_type)?,
        ));
    }
    if let Some(gui_element) = &prop.gui_element {
        graph.insert(&Triple::new(
            subject.clone(),
            named(&format!("{}guiElement", SALSAH_GUI))?,
            named(gui_element)?,
        ));
    }
    if let Some(list_iri) = list_iri {
        graph.insert(&Triple::new(
            subject,
            named(&format!("{}guiAttribute", SALSAH_GUI))?,
            Literal::new_simple_literal(format!("hlist=<{}>", list_iri)),
        ));
    }
    Ok(graph)
}

pub fn make_cardinality_graph(card: &ParsedPropertyCardinality, class_iri: &str) -> Result<Graph> {
    let class = named(class_iri)?;
    let restriction = BlankNode::default();
    let mut graph = Graph::new();
    graph.insert(&Triple::new(class.clone(), TYPE, OWL_CLASS.into_owned()));
    graph.insert(&Triple::new(class, SUB_CLASS_OF, restriction.clone()));
    graph.insert(&Triple::new(restriction.clone(), TYPE, OWL_RESTRICTION.into_owned()));
    let (predicate, count) = match card.cardinality {
        Cardinality::One => (OWL_CARDINALITY, 1),
        Cardinality::ZeroOrOne => (OWL_MAX_CARDINALITY, 1),
        Cardinality::ZeroOrMore => (OWL_MIN_CARDINALITY, 0),
        Cardinality::OneOrMore => (OWL_MIN_CARDINALITY, 1),
    };
    graph.insert(&Triple::new(restriction.clone(), predicate, integer(count)));
    graph.insert(&Triple::new(restriction.clone(), OWL_ON_PROPERTY, named(&card.propname)?));
    if let Some(order) = card.gui_order {
        graph.insert(&Triple::new(
            restriction,
            named(&format!("{}guiOrder", SALSAH_GUI))?,
            integer(order),
        ));
    }
    Ok(graph)
}

pub fn serialise_class(class: &ParsedClass, onto_iri: &str, last_modification_date: &str) -> Result<Value> {
    request_body(onto_iri, last_modification_date, &make_class_graph(class)?)
}

pub fn serialise_property(
    prop: &ParsedProperty,
    list_iri: Option<&str>,
    onto_iri: &str,
    last_modification_date: &str,
) -> Result<Value> {
    request_body(
        onto_iri,
        last_modification_date,
        &make_property_graph(prop, list_iri)?,
    )
}

pub fn serialise_cardinality_graph(
    card: &ParsedPropertyCardinality,
    class_iri: &str,
    onto_iri: &str,
    last_modification_date: &str,
) -> Result<Value> {
    request_body(
        onto_iri,
        last_modification_date,
        &make_cardinality_graph(card, class_iri)?,
    )
}

/// The body to create an empty ontology.
pub fn serialise_ontology(onto: &ParsedOntology, project_iri: &str) -> Value {
    let mut body = json!({
        format!("{}attachedToProject", KNORA_API): {"@id": project_iri},
        format!("{}ontologyName", KNORA_API): onto.name,
        format!("{}label", RDFS): onto.label,
    });
    if let Some(comment) = &onto.comment {
        body[format!("{}comment", RDFS)] = Value::String(comment.clone());
    }
    body
}

fn request_body(onto_iri: &str, last_modification_date: &str, content: &Graph) -> Result<Value> {
    let base = make_ontology_base_graph(onto_iri, last_modification_date)?;
    let onto = named(onto_iri)?;
    let mut body = node_to_jsonld(&base, onto.as_ref().into());
    let nodes = graph_to_jsonld(content);
    if let Value::Object(map) = &mut body {
        map.insert("@graph".to_string(), Value::Array(nodes));
    }
    Ok(body)
}

fn node_id(node: NamedOrBlankNodeRef<'_>) -> String {
    match node {
        NamedOrBlankNodeRef::NamedNode(n) => n.as_str().to_string(),
        NamedOrBlankNodeRef::BlankNode(b) => format!("_:{}", b.as_str()),
    }
}

fn term_to_jsonld(term: TermRef<'_>) -> Value {
    match term {
        TermRef::NamedNode(n) => json!({"@id": n.as_str()}),
        TermRef::BlankNode(b) => json!({"@id": format!("_:{}", b.as_str())}),
        TermRef::Literal(l) => {
            if let Some(lang) = l.language() {
                return json!({"@language": lang, "@value": l.value()});
            }
            let datatype = l.datatype().as_str();
            if datatype == format!("{}string", XSD) {
                return json!({"@value": l.value()});
            }
            if datatype == format!("{}integer", XSD) {
                if let Ok(number) = l.value().parse::<i64>() {
                    return json!({"@type": datatype, "@value": number});
                }
            }
            json!({"@type": datatype, "@value": l.value()})
        }
        #[allow(unreachable_patterns)]
        other => Value::String(other.to_string()),
    }
}

/// One node in expanded JSON-LD: `@id`, `@type` and one array per predicate.
fn node_to_jsonld(graph: &Graph, subject: NamedOrBlankNodeRef<'_>) -> Value {
    let mut types = Vec::new();
    let mut predicates: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for triple in graph.triples_for_subject(subject) {
        if triple.predicate == TYPE {
            if let TermRef::NamedNode(t) = triple.object {
                types.push(Value::String(t.as_str().to_string()));
                continue;
            }
        }
        predicates
            .entry(triple.predicate.as_str().to_string())
            .or_default()
            .push(term_to_jsonld(triple.object));
    }
    let mut map = Map::new();
    map.insert("@id".to_string(), Value::String(node_id(subject)));
    if !types.is_empty() {
        map.insert("@type".to_string(), Value::Array(types));
    }
    for (predicate, objects) in predicates {
        map.insert(predicate, Value::Array(objects));
    }
    Value::Object(map)
}

/// All subjects of a graph as expanded JSON-LD nodes, ordered by id.
pub fn graph_to_jsonld(graph: &Graph) -> Vec<Value> {
    let mut subjects: Vec<NamedOrBlankNode> = graph
        .iter()
        .map(|t| t.subject.into_owned())
        .collect();
    subjects.sort_by_key(|s| node_id(s.as_ref()));
    subjects.dedup();
    subjects
        .iter()
        .map(|s| node_to_jsonld(graph, s.as_ref()))
        .collect()
}
