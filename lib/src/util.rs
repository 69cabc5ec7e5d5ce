use anyhow::{Context, Result};

use std::collections::HashSet;
use std::io::BufReader;
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{
    Graph, NamedNodeRef, NamedOrBlankNodeRef, Term, TermRef, Triple, TripleRef,
};

use log::{debug, info};

use crate::consts::{DATA, KNORA_API, RDFS, SUB_CLASS_OF, TURTLE_PREFIXES};

pub fn read_file(file: &Path) -> Result<Graph> {
    debug!("Reading file: {}", file.display());
    let filename = file;
    let file = std::fs::File::open(file)
        .with_context(|| format!("Failed to open {}", filename.display()))?;
    let content: BufReader<_> = BufReader::new(file);
    let content_type = filename.extension().and_then(|ext| ext.to_str());
    let content_type = content_type.and_then(|ext| match ext {
        "ttl" => Some(RdfFormat::Turtle),
        "xml" | "rdf" => Some(RdfFormat::RdfXml),
        "n3" => Some(RdfFormat::Turtle),
        "nt" => Some(RdfFormat::NTriples),
        _ => None,
    });
    let parser = RdfParser::from_format(content_type.unwrap_or(RdfFormat::Turtle));
    let mut graph = Graph::new();
    let parser = parser.for_reader(content);
    for quad in parser {
        let quad = quad?;
        let triple = Triple::new(quad.subject, quad.predicate, quad.object);
        graph.insert(&triple);
    }

    Ok(graph)
}

/// Parses a Turtle document held in memory.
pub fn parse_turtle(content: &str) -> Result<Graph> {
    let parser = RdfParser::from_format(RdfFormat::Turtle).for_reader(content.as_bytes());
    let mut graph = Graph::new();
    for quad in parser {
        let quad = quad.context("Failed to parse Turtle")?;
        let triple = Triple::new(quad.subject, quad.predicate, quad.object);
        graph.insert(&triple);
    }
    Ok(graph)
}

pub fn graph_to_turtle(graph: &Graph) -> Result<String> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
    for (prefix, namespace) in TURTLE_PREFIXES {
        serializer = serializer.with_prefix(prefix, namespace)?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for triple in graph.iter() {
        writer.serialize_triple(triple)?;
    }
    let bytes = writer.finish()?;
    Ok(String::from_utf8(bytes)?)
}

pub fn write_graph_to_file(graph: &Graph, file: &Path) -> Result<()> {
    info!(
        "Writing graph to file: {} with length {}",
        file.display(),
        graph.len()
    );
    let turtle = graph_to_turtle(graph)?;
    std::fs::write(file, turtle).with_context(|| format!("Failed to write {}", file.display()))?;
    Ok(())
}

/// Union of several graphs.
pub fn merge_graphs<'a>(graphs: impl IntoIterator<Item = &'a Graph>) -> Graph {
    let mut merged = Graph::new();
    for graph in graphs {
        for triple in graph.iter() {
            merged.insert(triple);
        }
    }
    merged
}

pub fn term_as_node(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(n) => Some(NamedOrBlankNodeRef::NamedNode(n)),
        TermRef::BlankNode(b) => Some(NamedOrBlankNodeRef::BlankNode(b)),
        _ => None,
    }
}

pub fn term_as_named_node(term: TermRef<'_>) -> Option<NamedNodeRef<'_>> {
    match term {
        TermRef::NamedNode(n) => Some(n),
        _ => None,
    }
}

/// The lexical value of a term: the IRI of a named node, the id of a blank node or the
/// value of a literal.
pub fn term_value(term: TermRef<'_>) -> String {
    match term {
        TermRef::NamedNode(n) => n.as_str().to_string(),
        TermRef::BlankNode(b) => b.as_str().to_string(),
        TermRef::Literal(l) => l.value().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

/// First object of `subject predicate ?o` as an owned term.
pub fn first_object<'a>(
    graph: &Graph,
    subject: impl Into<NamedOrBlankNodeRef<'a>>,
    predicate: impl Into<NamedNodeRef<'a>>,
) -> Option<Term> {
    graph
        .object_for_subject_predicate(subject, predicate)
        .map(|t| t.into_owned())
}

/// Follows `rdfs:subClassOf` transitively, starting with (and including) `class`.
pub fn super_classes(graph: &Graph, class: NamedNodeRef<'_>) -> HashSet<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut stack = vec![class.as_str().to_string()];
    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        let node = NamedNodeRef::new_unchecked(current.as_str());
        for parent in graph.objects_for_subject_predicate(node, SUB_CLASS_OF) {
            if let TermRef::NamedNode(p) = parent {
                stack.push(p.as_str().to_string());
            }
        }
    }
    seen
}

pub fn is_subclass_of(graph: &Graph, class: NamedNodeRef<'_>, ancestor: NamedNodeRef<'_>) -> bool {
    super_classes(graph, class).contains(ancestor.as_str())
}

/// `http://data/book_1` becomes `book_1`.
pub fn reformat_data_iri(iri: &str) -> String {
    iri.strip_prefix(DATA).unwrap_or(iri).to_string()
}

/// Shortens an ontology IRI for display: `http://0.0.0.0:3333/ontology/0001/onto/v2#Book`
/// becomes `onto:Book`, knora-api terms lose their prefix entirely.
pub fn reformat_onto_iri(iri: &str) -> String {
    if let Some(local) = iri.strip_prefix(RDFS) {
        return format!("rdfs:{}", local);
    }
    if let Some(local) = iri.strip_prefix(KNORA_API) {
        return local.to_string();
    }
    let Some((namespace, local)) = iri.rsplit_once('#') else {
        return iri.to_string();
    };
    let mut segments = namespace.rsplit('/');
    match (segments.next(), segments.next()) {
        (Some("v2"), Some(onto)) if namespace.contains("/ontology/") => {
            format!("{}:{}", onto, local)
        }
        _ => iri.to_string(),
    }
}

pub fn reformat_any_iri(iri: &str) -> String {
    if iri.starts_with(DATA) {
        return reformat_data_iri(iri);
    }
    if iri.contains("/ontology/") {
        return reformat_onto_iri(iri);
    }
    iri.to_string()
}

/// Display form of a term found in a report: IRIs are shortened, literals are shown as is.
pub fn reformat_term(term: TermRef<'_>) -> String {
    match term {
        TermRef::NamedNode(n) => reformat_any_iri(n.as_str()),
        other => term_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, NamedNode};

    #[test]
    fn test_reformat_iris() {
        assert_eq!(reformat_data_iri("http://data/book_1"), "book_1");
        assert_eq!(
            reformat_onto_iri("http://0.0.0.0:3333/ontology/9999/onto/v2#Book"),
            "onto:Book"
        );
        assert_eq!(
            reformat_onto_iri("http://api.knora.org/ontology/knora-api/v2#Region"),
            "Region"
        );
        assert_eq!(
            reformat_onto_iri("http://www.w3.org/2000/01/rdf-schema#label"),
            "rdfs:label"
        );
        assert_eq!(
            reformat_any_iri("http://rdfh.ch/9999/abc"),
            "http://rdfh.ch/9999/abc"
        );
    }

    #[test]
    fn test_turtle_roundtrip() {
        let mut graph = Graph::new();
        let s = NamedNode::new("http://data/res").unwrap();
        graph.insert(TripleRef::new(
            &s,
            crate::consts::LABEL,
            &Literal::new_simple_literal("Label"),
        ));
        let turtle = graph_to_turtle(&graph).unwrap();
        assert!(turtle.contains("data:res"));
        let parsed = parse_turtle(&turtle).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ttl");
        let graph = parse_turtle(
            "@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
             <http://ex/A> rdfs:subClassOf <http://ex/B> .\n\
             <http://ex/B> rdfs:subClassOf <http://ex/C> .\n",
        )
        .unwrap();
        write_graph_to_file(&graph, &path).unwrap();
        let read = read_file(&path).unwrap();
        assert_eq!(read.len(), 2);
        let supers = super_classes(&read, NamedNodeRef::new("http://ex/A").unwrap());
        assert!(supers.contains("http://ex/C"));
        assert!(read_file(&dir.path().join("missing.ttl")).is_err());
    }
}
