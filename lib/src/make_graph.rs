//! Builds the RDF data graph from deserialised resources.
//!
//! Each value becomes its own node `http://data/value/<value_uuid>`, linked from the resource
//! through the property the user wrote. Literals whose lexical form is not valid for their
//! XSD datatype are written as `xsd:string` so that the SHACL run reports them instead of the
//! RDF layer failing on them.

use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use lazy_static::lazy_static;
use log::debug;
use oxigraph::model::{Graph, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use regex::Regex;

use crate::consts::{DATA, DSP_RESOURCE_IRI_PREFIX, KNORA_API, TYPE, XSD};
use crate::data::{PropertyObject, ResourceDeserialised, TripleObjectType, ValueInformation};
use crate::errors::InputError;

lazy_static! {
    static ref INTEGER_RE: Regex = Regex::new(r"^[+-]?\d+$").expect("integer regex is valid");
    static ref DECIMAL_RE: Regex =
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal regex is valid");
}

/// IRI of the resource with the given id in the data namespace.
pub fn data_iri(res_id: &str) -> Result<NamedNode> {
    NamedNode::new(format!("{}{}", DATA, res_id)).map_err(|e| {
        InputError::new(format!(
            "The id '{}' cannot be used as a resource identifier: {}",
            res_id, e
        ))
        .into()
    })
}

pub fn value_node_iri(value_uuid: &str) -> Result<NamedNode> {
    Ok(NamedNode::new(format!("{}value/{}", DATA, value_uuid))?)
}

pub fn make_data_graph(resources: &[ResourceDeserialised]) -> Result<Graph> {
    let mut graph = Graph::new();
    for resource in resources {
        add_resource(&mut graph, resource)?;
    }
    debug!(
        "Built data graph with {} triples for {} resources",
        graph.len(),
        resources.len()
    );
    Ok(graph)
}

fn add_resource(graph: &mut Graph, resource: &ResourceDeserialised) -> Result<()> {
    let subject: NamedOrBlankNode = data_iri(&resource.res_id)?.into();
    for property_object in &resource.property_objects {
        add_property_object(graph, &subject, property_object)?;
    }
    for value in &resource.values {
        add_value(graph, &subject, value)?;
    }
    Ok(())
}

fn add_property_object(
    graph: &mut Graph,
    subject: &NamedOrBlankNode,
    property_object: &PropertyObject,
) -> Result<()> {
    let predicate = NamedNode::new(property_object.property_type.iri())?;
    let object = object_term(
        property_object.object_value.as_deref(),
        property_object.object_type,
    )?;
    graph.insert(&Triple::new(subject.clone(), predicate, object));
    Ok(())
}

fn add_value(graph: &mut Graph, resource: &NamedOrBlankNode, value: &ValueInformation) -> Result<()> {
    let node: NamedOrBlankNode = value_node_iri(&value.value_uuid)?.into();
    let property = NamedNode::new(value.user_facing_prop.as_str())?;
    let mapping = value.knora_type.mapping();

    graph.insert(&Triple::new(resource.clone(), property, node.clone()));
    graph.insert(&Triple::new(
        node.clone(),
        TYPE.into_owned(),
        NamedNode::new(format!("{}{}", KNORA_API, mapping.rdf_type))?,
    ));
    // intervals carry their bounds in the metadata, there is no main object
    if let Some(predicate) = mapping.value_predicate {
        let object = object_term(value.user_facing_value.as_deref(), mapping.object_type)?;
        graph.insert(&Triple::new(node.clone(), NamedNode::new(predicate)?, object));
    }
    for metadata in &value.value_metadata {
        add_property_object(graph, &node, metadata)?;
    }
    Ok(())
}

fn string_literal(value: &str) -> Term {
    Literal::new_typed_literal(value, NamedNode::new_unchecked(format!("{}string", XSD))).into()
}

/// The object of a triple. A missing value is the empty string so that the node still exists
/// for the SHACL checks.
pub fn object_term(value: Option<&str>, object_type: TripleObjectType) -> Result<Term> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(string_literal(""));
    };
    match object_type {
        TripleObjectType::InternalId => {
            if value.starts_with(DSP_RESOURCE_IRI_PREFIX) {
                return Ok(NamedNode::new(value)
                    .map(Term::from)
                    .unwrap_or_else(|_| string_literal(value)));
            }
            Ok(data_iri(value)?.into())
        }
        TripleObjectType::Iri => Ok(NamedNode::new(value)
            .map(Term::from)
            .unwrap_or_else(|_| string_literal(value))),
        _ => Ok(typed_literal(value, object_type)),
    }
}

/// A literal of the datatype of `object_type`, or `xsd:string` if `value` is not a valid
/// lexical form of that datatype.
fn typed_literal(value: &str, object_type: TripleObjectType) -> Term {
    let lexical = match object_type {
        TripleObjectType::Boolean => match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Some("true".to_string()),
            "false" | "0" => Some("false".to_string()),
            _ => None,
        },
        TripleObjectType::Integer => INTEGER_RE.is_match(value).then(|| value.to_string()),
        TripleObjectType::Decimal => DECIMAL_RE.is_match(value).then(|| value.to_string()),
        TripleObjectType::DateYyyyMmDd => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(|_| value.to_string()),
        TripleObjectType::Datetime => DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|_| value.to_string()),
        TripleObjectType::Uri => url::Url::parse(value).ok().map(|_| value.to_string()),
        TripleObjectType::String | TripleObjectType::Iri | TripleObjectType::InternalId => None,
    };
    match (lexical, object_type.datatype()) {
        (Some(lexical), Some(datatype)) => {
            Literal::new_typed_literal(lexical, NamedNode::new_unchecked(datatype)).into()
        }
        _ => string_literal(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{API_SHAPES, LABEL};
    use crate::data::{KnoraValueType, MigrationMetadata, TriplePropertyType};
    use oxigraph::model::{NamedNodeRef, TermRef};

    fn resource(res_id: &str, values: Vec<ValueInformation>) -> ResourceDeserialised {
        ResourceDeserialised {
            res_id: res_id.to_string(),
            property_objects: vec![
                PropertyObject::new(TriplePropertyType::RdfsLabel, "lbl", TripleObjectType::String),
                PropertyObject::new(
                    TriplePropertyType::RdfType,
                    "http://0.0.0.0:3333/ontology/9999/onto/v2#Book",
                    TripleObjectType::Iri,
                ),
            ],
            values,
            migration_metadata: MigrationMetadata::default(),
        }
    }

    fn datatype_of(graph: &Graph, value: &ValueInformation) -> String {
        let node = value_node_iri(&value.value_uuid).unwrap();
        let predicate = value.knora_type.mapping().value_predicate.unwrap();
        let object = graph
            .object_for_subject_predicate(&node, NamedNodeRef::new(&predicate).unwrap())
            .unwrap();
        match object {
            TermRef::Literal(l) => l.datatype().as_str().to_string(),
            other => panic!("expected literal, got {}", other),
        }
    }

    #[test]
    fn test_resource_triples() {
        let graph = make_data_graph(&[resource("book_1", vec![])]).unwrap();
        assert_eq!(graph.len(), 2);
        let subject = data_iri("book_1").unwrap();
        assert!(graph.object_for_subject_predicate(&subject, LABEL).is_some());
    }

    #[test]
    fn test_invalid_resource_id() {
        let err = make_data_graph(&[resource("has space", vec![])]).unwrap_err();
        assert!(err.downcast_ref::<InputError>().is_some());
    }

    #[test]
    fn test_malformed_date_falls_back_to_string() {
        let value = ValueInformation::new(
            "http://0.0.0.0:3333/ontology/9999/onto/v2#hasDate",
            Some("2020-13-40".to_string()),
            KnoraValueType::DateValue,
            vec![PropertyObject::new(
                TriplePropertyType::KnoraDateStart,
                "2020-13-40",
                TripleObjectType::DateYyyyMmDd,
            )],
        );
        let graph = make_data_graph(&[resource("b", vec![value.clone()])]).unwrap();
        let node = value_node_iri(&value.value_uuid).unwrap();
        let start = graph
            .object_for_subject_predicate(
                &node,
                NamedNodeRef::new(&format!("{}dateHasStart", API_SHAPES)).unwrap(),
            )
            .unwrap();
        match start {
            TermRef::Literal(l) => assert_eq!(l.datatype().as_str(), format!("{}string", XSD)),
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn test_literal_datatypes() {
        let values = vec![
            ValueInformation::new("http://ex/p", Some("1".into()), KnoraValueType::BooleanValue, vec![]),
            ValueInformation::new("http://ex/p", Some("yes".into()), KnoraValueType::BooleanValue, vec![]),
            ValueInformation::new("http://ex/p", Some("12".into()), KnoraValueType::IntValue, vec![]),
            ValueInformation::new("http://ex/p", Some("1.5x".into()), KnoraValueType::DecimalValue, vec![]),
            ValueInformation::new(
                "http://ex/p",
                Some("2019-10-23T13:45:12.01-14:00".into()),
                KnoraValueType::TimeValue,
                vec![],
            ),
        ];
        let graph = make_data_graph(&[resource("b", values.clone())]).unwrap();
        assert_eq!(datatype_of(&graph, &values[0]), format!("{}boolean", XSD));
        assert_eq!(datatype_of(&graph, &values[1]), format!("{}string", XSD));
        assert_eq!(datatype_of(&graph, &values[2]), format!("{}integer", XSD));
        assert_eq!(datatype_of(&graph, &values[3]), format!("{}string", XSD));
        assert_eq!(datatype_of(&graph, &values[4]), format!("{}dateTimeStamp", XSD));
    }

    #[test]
    fn test_empty_value_is_empty_string() {
        let value = ValueInformation::new("http://ex/p", None, KnoraValueType::IntValue, vec![]);
        let graph = make_data_graph(&[resource("b", vec![value.clone()])]).unwrap();
        assert_eq!(datatype_of(&graph, &value), format!("{}string", XSD));
    }

    #[test]
    fn test_links_and_intervals() {
        let link = ValueInformation::new(
            "http://ex/hasLink",
            Some("target".into()),
            KnoraValueType::LinkValue,
            vec![],
        );
        let absolute = ValueInformation::new(
            "http://ex/hasLink",
            Some("http://rdfh.ch/9999/abc".into()),
            KnoraValueType::LinkValue,
            vec![],
        );
        let interval = ValueInformation::new(
            "http://ex/hasInterval",
            None,
            KnoraValueType::IntervalValue,
            vec![
                PropertyObject::new(TriplePropertyType::KnoraIntervalStart, "1", TripleObjectType::Decimal),
                PropertyObject::new(TriplePropertyType::KnoraIntervalEnd, "2", TripleObjectType::Decimal),
            ],
        );
        let graph =
            make_data_graph(&[resource("b", vec![link.clone(), absolute.clone(), interval.clone()])])
                .unwrap();
        let target = |value: &ValueInformation| {
            let node = value_node_iri(&value.value_uuid).unwrap();
            graph
                .object_for_subject_predicate(&node, crate::consts::LINK_VALUE_HAS_TARGET_ID)
                .map(|t| t.to_string())
        };
        assert_eq!(target(&link).unwrap(), "<http://data/target>");
        assert_eq!(target(&absolute).unwrap(), "<http://rdfh.ch/9999/abc>");
        let node = value_node_iri(&interval.value_uuid).unwrap();
        // type + start + end
        assert_eq!(graph.triples_for_subject(&node).count(), 3);
    }

    #[test]
    fn test_empty_link_target_is_empty_string() {
        let link = ValueInformation::new("http://ex/hasLink", None, KnoraValueType::LinkValue, vec![]);
        let graph = make_data_graph(&[resource("b", vec![link.clone()])]).unwrap();
        let node = value_node_iri(&link.value_uuid).unwrap();
        match graph.object_for_subject_predicate(&node, crate::consts::LINK_VALUE_HAS_TARGET_ID) {
            Some(TermRef::Literal(l)) => assert_eq!(l.value(), ""),
            other => panic!("expected an empty literal, got {:?}", other),
        }
        assert!(graph
            .triples_for_object(NamedNodeRef::new(DATA).unwrap())
            .next()
            .is_none());
    }

    #[test]
    fn test_each_value_uuid_is_one_node() {
        let values: Vec<_> = (0..5)
            .map(|i| {
                ValueInformation::new("http://ex/p", Some(i.to_string()), KnoraValueType::IntValue, vec![])
            })
            .collect();
        let graph = make_data_graph(&[resource("b", values.clone())]).unwrap();
        for value in &values {
            let node = value_node_iri(&value.value_uuid).unwrap();
            assert_eq!(graph.triples_for_object(&node).count(), 1);
        }
    }
}
