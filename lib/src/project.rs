//! The JSON project definition, as far as the ontology checks and the creation order need it.
//!
//! The raw JSON is read with serde into the `*Definition` structs, then every name is resolved
//! into an absolute IRI, which gives the `Parsed*` structs the rest of the crate works with.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::consts::SALSAH_GUI;
use crate::deserialise::NamespaceResolver;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    pub project: ProjectDefinition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDefinition {
    pub shortcode: String,
    pub shortname: String,
    #[serde(default)]
    pub longname: Option<String>,
    #[serde(default)]
    pub lists: Vec<ListDefinition>,
    #[serde(default)]
    pub ontologies: Vec<OntologyDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDefinition {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<ListDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OntologyDefinition {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
}

/// `"super"` may be written as a single string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "super", default)]
    pub supers: OneOrMany,
    pub object: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub comments: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub gui_element: Option<String>,
    #[serde(default)]
    pub gui_attributes: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    #[serde(rename = "super", default)]
    pub supers: OneOrMany,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub comments: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub cardinalities: Vec<CardinalityDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardinalityDefinition {
    pub propname: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub gui_order: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "0-1")]
    ZeroOrOne,
    #[serde(rename = "0-n")]
    ZeroOrMore,
    #[serde(rename = "1-n")]
    OneOrMore,
}

impl Cardinality {
    /// At least one value is required.
    pub fn is_mandatory(self) -> bool {
        matches!(self, Cardinality::One | Cardinality::OneOrMore)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::One => "1",
            Cardinality::ZeroOrOne => "0-1",
            Cardinality::ZeroOrMore => "0-n",
            Cardinality::OneOrMore => "1-n",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProject {
    pub shortcode: String,
    pub shortname: String,
    pub ontologies: Vec<ParsedOntology>,
    pub lists: Vec<ParsedList>,
}

impl ParsedProject {
    pub fn classes(&self) -> impl Iterator<Item = &ParsedClass> {
        self.ontologies.iter().flat_map(|o| o.classes.iter())
    }

    pub fn properties(&self) -> impl Iterator<Item = &ParsedProperty> {
        self.ontologies.iter().flat_map(|o| o.properties.iter())
    }

    pub fn cardinalities(&self) -> impl Iterator<Item = &ParsedClassCardinalities> {
        self.ontologies.iter().flat_map(|o| o.cardinalities.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOntology {
    pub name: String,
    pub label: String,
    pub comment: Option<String>,
    pub onto_iri: String,
    pub classes: Vec<ParsedClass>,
    pub properties: Vec<ParsedProperty>,
    pub cardinalities: Vec<ParsedClassCardinalities>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedClass {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub comments: Option<BTreeMap<String, String>>,
    pub supers: Vec<String>,
    pub onto_iri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProperty {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub comments: Option<BTreeMap<String, String>>,
    pub supers: Vec<String>,
    pub object: String,
    pub subject: Option<String>,
    pub gui_element: Option<String>,
    /// Name of the list a list property points into.
    pub list_name: Option<String>,
    pub onto_iri: String,
}

impl ParsedProperty {
    /// Link properties are the ones edited with a search box.
    pub fn is_link_property(&self) -> bool {
        self.gui_element.as_deref() == Some(format!("{}Searchbox", SALSAH_GUI).as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedClassCardinalities {
    pub class_iri: String,
    pub cards: Vec<ParsedPropertyCardinality>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPropertyCardinality {
    pub propname: String,
    pub cardinality: Cardinality,
    pub gui_order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedList {
    pub name: String,
    pub nodes: Vec<ParsedList>,
}

impl ParsedList {
    /// Names of all nodes below this one, depth first.
    pub fn all_node_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for node in &self.nodes {
            names.push(node.name.clone());
            names.extend(node.all_node_names());
        }
        names
    }
}

/// Resolves the names used in a project file. Unprefixed names in definitions belong to the
/// ontology that is being read, unprefixed references belong to `knora-api`.
struct ProjectResolver<'a> {
    prefixes: &'a BTreeMap<String, String>,
    inner: NamespaceResolver,
}

impl ProjectResolver<'_> {
    fn reference(&self, name: &str) -> Result<String> {
        if let Some((prefix, local)) = name.split_once(':') {
            if let Some(namespace) = self.prefixes.get(prefix) {
                return Ok(format!("{}{}", namespace, local));
            }
        }
        self.inner.resolve(name)
    }

    fn definition(&self, name: &str) -> Result<String> {
        self.inner.resolve(&format!(":{}", name))
    }
}

pub fn parse_project_file(file: &Path, api_url: &str) -> Result<ParsedProject> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read project file {}", file.display()))?;
    parse_project(&content, api_url)
        .with_context(|| format!("Failed to parse project file {}", file.display()))
}

pub fn parse_project(json: &str, api_url: &str) -> Result<ParsedProject> {
    let file: ProjectFile = serde_json::from_str(json)?;
    let project = &file.project;
    let mut ontologies = Vec::new();
    for onto in &project.ontologies {
        let resolver = ProjectResolver {
            prefixes: &file.prefixes,
            inner: NamespaceResolver::new(api_url, &project.shortcode, &onto.name),
        };
        ontologies.push(parse_ontology(onto, &resolver)?);
    }
    Ok(ParsedProject {
        shortcode: project.shortcode.clone(),
        shortname: project.shortname.clone(),
        ontologies,
        lists: project.lists.iter().map(parse_list).collect(),
    })
}

fn parse_list(list: &ListDefinition) -> ParsedList {
    ParsedList {
        name: list.name.clone(),
        nodes: list.nodes.iter().map(parse_list).collect(),
    }
}

fn parse_ontology(onto: &OntologyDefinition, resolver: &ProjectResolver) -> Result<ParsedOntology> {
    let onto_iri = resolver.inner.namespace(&onto.name);
    let onto_iri = onto_iri.trim_end_matches('#').to_string();
    let resolve_all = |names: Vec<String>| -> Result<Vec<String>> {
        names.iter().map(|n| resolver.reference(n)).collect()
    };

    let mut classes = Vec::new();
    let mut cardinalities = Vec::new();
    for res in &onto.resources {
        let name = resolver.definition(&res.name)?;
        classes.push(ParsedClass {
            name: name.clone(),
            labels: res.labels.clone(),
            comments: res.comments.clone(),
            supers: resolve_all(res.supers.to_vec())?,
            onto_iri: onto_iri.clone(),
        });
        if !res.cardinalities.is_empty() {
            let cards = res
                .cardinalities
                .iter()
                .map(|c| {
                    Ok(ParsedPropertyCardinality {
                        propname: resolver.reference(&c.propname)?,
                        cardinality: c.cardinality,
                        gui_order: c.gui_order,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            cardinalities.push(ParsedClassCardinalities {
                class_iri: name,
                cards,
            });
        }
    }

    let mut properties = Vec::new();
    for prop in &onto.properties {
        let list_name = prop
            .gui_attributes
            .as_ref()
            .and_then(|attrs| attrs.get("hlist"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        properties.push(ParsedProperty {
            name: resolver.definition(&prop.name)?,
            labels: prop.labels.clone(),
            comments: prop.comments.clone(),
            supers: resolve_all(prop.supers.to_vec())?,
            object: resolver.reference(&prop.object)?,
            subject: prop
                .subject
                .as_deref()
                .map(|s| resolver.reference(s))
                .transpose()?,
            gui_element: prop
                .gui_element
                .as_deref()
                .map(|g| format!("{}{}", SALSAH_GUI, g)),
            list_name,
            onto_iri: onto_iri.clone(),
        });
    }

    Ok(ParsedOntology {
        name: onto.name.clone(),
        label: onto.label.clone(),
        comment: onto.comment.clone(),
        onto_iri,
        classes,
        properties,
        cardinalities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::KNORA_API;

    const PROJECT: &str = r#"{
        "prefixes": {"foaf": "http://xmlns.com/foaf/0.1/"},
        "project": {
            "shortcode": "9999",
            "shortname": "test",
            "lists": [{"name": "colors", "nodes": [{"name": "red"}, {"name": "dark", "nodes": [{"name": "black"}]}]}],
            "ontologies": [{
                "name": "onto",
                "label": "Onto",
                "properties": [
                    {"name": "hasText", "super": ["hasValue"], "object": "TextValue",
                     "labels": {"en": "has text"}, "gui_element": "SimpleText"},
                    {"name": "linksTo", "super": "hasLinkTo", "object": ":Book",
                     "labels": {"en": "links to"}, "gui_element": "Searchbox"},
                    {"name": "hasColor", "super": ["hasValue"], "object": "ListValue",
                     "gui_element": "List", "gui_attributes": {"hlist": "colors"}}
                ],
                "resources": [
                    {"name": "Book", "super": "Resource", "labels": {"en": "Book"},
                     "cardinalities": [{"propname": ":hasText", "cardinality": "1"},
                                       {"propname": "foaf:name", "cardinality": "0-n"}]},
                    {"name": "Novel", "super": ":Book", "labels": {"en": "Novel"}}
                ]
            }]
        }
    }"#;

    fn onto(local: &str) -> String {
        format!("http://0.0.0.0:3333/ontology/9999/onto/v2#{}", local)
    }

    #[test]
    fn test_parse_project() {
        let project = parse_project(PROJECT, "http://0.0.0.0:3333").unwrap();
        assert_eq!(project.shortcode, "9999");
        let o = &project.ontologies[0];
        assert_eq!(o.onto_iri, "http://0.0.0.0:3333/ontology/9999/onto/v2");
        assert_eq!(o.classes[0].name, onto("Book"));
        assert_eq!(o.classes[0].supers, vec![format!("{}Resource", KNORA_API)]);
        assert_eq!(o.classes[1].supers, vec![onto("Book")]);
        assert_eq!(o.properties[0].object, format!("{}TextValue", KNORA_API));
        assert!(o.properties[1].is_link_property());
        assert!(!o.properties[0].is_link_property());
        assert_eq!(o.properties[2].list_name.as_deref(), Some("colors"));
        assert_eq!(o.cardinalities.len(), 1);
        assert_eq!(o.cardinalities[0].cards[0].propname, onto("hasText"));
        assert_eq!(
            o.cardinalities[0].cards[1].propname,
            "http://xmlns.com/foaf/0.1/name"
        );
        assert!(o.cardinalities[0].cards[0].cardinality.is_mandatory());
    }

    #[test]
    fn test_list_node_names() {
        let project = parse_project(PROJECT, "http://0.0.0.0:3333").unwrap();
        assert_eq!(
            project.lists[0].all_node_names(),
            vec!["red".to_string(), "dark".to_string(), "black".to_string()]
        );
    }

    #[test]
    fn test_invalid_cardinality_is_rejected() {
        let json = PROJECT.replace(r#""cardinality": "1""#, r#""cardinality": "2""#);
        assert!(parse_project(&json, "http://0.0.0.0:3333").is_err());
    }
}
