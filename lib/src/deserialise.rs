//! Turns a DSP XML upload into the flat `ProjectDeserialised` representation.
//!
//! The XML is read with quick-xml into a small element tree first, because rich text values
//! have to be kept as XML strings and standoff links are searched inside them. Property and
//! class names are resolved to absolute IRIs on the way.

use anyhow::{Context, Result};
use log::{debug, warn};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::consts::{DSP_RESOURCE_IRI_PREFIX, KNORA_API};
use crate::data::{
    DataDeserialised, KnoraValueType, MigrationMetadata, ProjectDeserialised, ProjectInformation,
    PropertyObject, ResourceDeserialised, TripleObjectType, TriplePropertyType, ValueInformation,
};
use crate::dates::xsd_like_dates;
use crate::errors::InputError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Local name, without namespace prefix.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.context("Malformed XML attribute")?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value()?.to_string();
            attributes.push((key, value));
        }
        Ok(XmlElement {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required_attr(&self, key: &str) -> Result<&str> {
        self.attr(key).ok_or_else(|| {
            InputError::new(format!(
                "The element <{}> is missing the mandatory attribute '{}'",
                self.name, key
            ))
            .into()
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => out.push_str(&e.text()),
            }
        }
        out
    }

    /// The trimmed text content, `None` if it is empty.
    fn trimmed_text(&self) -> Option<String> {
        let text = self.text();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// The children serialised back to XML.
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }

    fn descendants<'a>(&'a self, out: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            out.push(child);
            child.descendants(out);
        }
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Text(t) => out.push_str(&escape(t.as_str())),
        XmlNode::Element(e) => {
            out.push('<');
            out.push_str(&e.name);
            for (k, v) in &e.attributes {
                out.push_str(&format!(" {}=\"{}\"", k, escape(v.as_str())));
            }
            if e.children.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in &e.children {
                    write_node(child, out);
                }
                out.push_str(&format!("</{}>", e.name));
            }
        }
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

/// Reads an XML document into an element tree. Comments and processing instructions are dropped.
pub fn parse_xml_tree(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(XmlElement::from_start(&e)?),
            Ok(Event::Empty(e)) => {
                let element = XmlElement::from_start(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| anyhow::anyhow!("Unbalanced closing tag in XML"))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(e.unescape()?.to_string()));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Error at position {} while reading XML: {}",
                    reader.error_position(),
                    e
                ))
            }
        }
    }
    root.ok_or_else(|| anyhow::anyhow!("The XML document has no root element"))
}

/// Resolves the prefixed names used in the XML into absolute IRIs.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    api_url: String,
    shortcode: String,
    default_ontology: String,
}

impl NamespaceResolver {
    pub fn new(api_url: &str, shortcode: &str, default_ontology: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            shortcode: shortcode.to_string(),
            default_ontology: default_ontology.to_string(),
        }
    }

    pub fn namespace(&self, ontology: &str) -> String {
        if ontology == "knora-api" {
            return KNORA_API.to_string();
        }
        format!("{}/ontology/{}/{}/v2#", self.api_url, self.shortcode, ontology)
    }

    /// `hasColor` is a knora-api property, `:hasTitle` is in the default ontology,
    /// `other:hasTitle` is in the ontology `other` of the same project.
    pub fn resolve(&self, name: &str) -> Result<String> {
        if name.starts_with("http://") || name.starts_with("https://") {
            return Ok(name.to_string());
        }
        let parts: Vec<&str> = name.split(':').collect();
        match parts.as_slice() {
            [local] => Ok(format!("{}{}", KNORA_API, local)),
            ["", local] => Ok(format!("{}{}", self.namespace(&self.default_ontology), local)),
            [prefix, local] => Ok(format!("{}{}", self.namespace(prefix), local)),
            _ => Err(InputError::new(format!(
                "The name '{}' contains more than one colon and cannot be resolved to an IRI",
                name
            ))
            .into()),
        }
    }
}

pub fn deserialise_file(file: &Path, api_url: &str) -> Result<ProjectDeserialised> {
    debug!("Reading XML file: {}", file.display());
    let xml = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    deserialise(&xml, api_url)
}

pub fn deserialise(xml: &str, api_url: &str) -> Result<ProjectDeserialised> {
    let root = parse_xml_tree(xml)?;
    deserialise_tree(&root, api_url)
}

pub fn deserialise_tree(root: &XmlElement, api_url: &str) -> Result<ProjectDeserialised> {
    let shortcode = root.required_attr("shortcode")?;
    let default_ontology = root.required_attr("default-ontology")?;
    let resolver = NamespaceResolver::new(api_url, shortcode, default_ontology);
    let authorships = authorship_lookup(root);
    let deserialiser = Deserialiser {
        resolver: &resolver,
        authorships: &authorships,
    };

    let mut resources = Vec::new();
    for element in root.elements() {
        let fixed_class = match element.name.as_str() {
            "resource" => None,
            "region" => Some("Region"),
            "link" => Some("LinkObj"),
            "annotation" => Some("Annotation"),
            "video-segment" => Some("VideoSegment"),
            "audio-segment" => Some("AudioSegment"),
            other => {
                debug!("Skipping top level element <{}>", other);
                continue;
            }
        };
        resources.push(deserialiser.resource(element, fixed_class)?);
    }
    debug!("Deserialised {} resources", resources.len());
    Ok(ProjectDeserialised {
        info: ProjectInformation {
            shortcode: shortcode.to_string(),
            default_ontology: default_ontology.to_string(),
        },
        data: DataDeserialised { resources },
    })
}

/// `<authorship id="a1"><author>Jane Doe</author></authorship>` definitions by id.
fn authorship_lookup(root: &XmlElement) -> HashMap<String, Vec<String>> {
    let mut lookup = HashMap::new();
    for element in root.elements().filter(|e| e.name == "authorship") {
        let Some(id) = element.attr("id") else {
            continue;
        };
        let authors = element
            .elements()
            .filter(|e| e.name == "author")
            .filter_map(|e| e.trimmed_text())
            .collect();
        lookup.insert(id.to_string(), authors);
    }
    lookup
}

struct Deserialiser<'a> {
    resolver: &'a NamespaceResolver,
    authorships: &'a HashMap<String, Vec<String>>,
}

impl Deserialiser<'_> {
    fn resource(
        &self,
        element: &XmlElement,
        fixed_class: Option<&str>,
    ) -> Result<ResourceDeserialised> {
        let res_id = element.required_attr("id")?.to_string();
        let label = element.required_attr("label")?;
        let res_type = match fixed_class {
            Some(class) => format!("{}{}", KNORA_API, class),
            None => self.resolver.resolve(element.required_attr("restype")?)?,
        };

        let is_segment = matches!(fixed_class, Some("VideoSegment") | Some("AudioSegment"));
        let mut values = Vec::new();
        for child in element.elements() {
            if is_segment {
                values.extend(self.segment_value(child, fixed_class)?);
            } else {
                values.extend(self.property_values(child)?);
            }
        }

        let mut property_objects = vec![
            PropertyObject::new(TriplePropertyType::RdfsLabel, label, TripleObjectType::String),
            PropertyObject::new(TriplePropertyType::RdfType, res_type, TripleObjectType::Iri),
        ];
        property_objects.extend(standoff_links(element));
        if let Some(permissions) = element.attr("permissions") {
            property_objects.push(PropertyObject::new(
                TriplePropertyType::KnoraPermissions,
                permissions,
                TripleObjectType::String,
            ));
        }

        Ok(ResourceDeserialised {
            res_id,
            property_objects,
            values,
            migration_metadata: MigrationMetadata {
                iri: element.attr("iri").map(str::to_string),
                ark: element.attr("ark").map(str::to_string),
                creation_date: element.attr("creation_date").map(str::to_string),
            },
        })
    }

    fn property_values(&self, prop: &XmlElement) -> Result<Vec<ValueInformation>> {
        let value_type = match prop.name.as_str() {
            "boolean-prop" => KnoraValueType::BooleanValue,
            "color-prop" => KnoraValueType::ColorValue,
            "date-prop" => KnoraValueType::DateValue,
            "decimal-prop" => KnoraValueType::DecimalValue,
            "geoname-prop" => KnoraValueType::GeonameValue,
            "integer-prop" => KnoraValueType::IntValue,
            "interval-prop" => KnoraValueType::IntervalValue,
            "resptr-prop" => KnoraValueType::LinkValue,
            "time-prop" => KnoraValueType::TimeValue,
            "uri-prop" => KnoraValueType::UriValue,
            "geometry-prop" => KnoraValueType::GeomValue,
            "list-prop" => return self.list_values(prop),
            "text-prop" => return self.text_values(prop),
            "bitstream" => return Ok(self.file_value(prop).into_iter().collect()),
            "iiif-uri" => {
                return Ok(vec![self.file_value_of_type(
                    prop,
                    KnoraValueType::StillImageIiif,
                )])
            }
            other => {
                debug!("Skipping unknown property element <{}>", other);
                return Ok(Vec::new());
            }
        };
        let prop_iri = self.resolver.resolve(prop.required_attr("name")?)?;
        let mut values = Vec::new();
        for value in prop.elements() {
            let user_value = value.trimmed_text();
            let mut metadata = value_metadata(value);
            let user_value = match value_type {
                KnoraValueType::DateValue => {
                    if let Some(date) = &user_value {
                        metadata.extend(xsd_like_dates(date));
                    }
                    user_value
                }
                KnoraValueType::IntervalValue => {
                    if let Some(interval) = &user_value {
                        metadata.splice(0..0, interval_bounds(interval));
                    }
                    None
                }
                KnoraValueType::GeomValue => user_value.and_then(|g| normalise_json(&g)),
                _ => user_value,
            };
            values.push(ValueInformation::new(
                prop_iri.clone(),
                user_value,
                value_type,
                metadata,
            ));
        }
        Ok(values)
    }

    fn list_values(&self, prop: &XmlElement) -> Result<Vec<ValueInformation>> {
        let prop_iri = self.resolver.resolve(prop.required_attr("name")?)?;
        let list_name = prop.attr("list").map(str::trim).filter(|s| !s.is_empty());
        let mut values = Vec::new();
        for value in prop.elements() {
            let node = value.trimmed_text();
            let user_value = match (list_name, node.as_deref()) {
                (None, None) => None,
                (list, node) => Some(
                    [list, node]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" / "),
                ),
            };
            values.push(ValueInformation::new(
                prop_iri.clone(),
                user_value,
                KnoraValueType::ListValue,
                value_metadata(value),
            ));
        }
        Ok(values)
    }

    fn text_values(&self, prop: &XmlElement) -> Result<Vec<ValueInformation>> {
        let prop_iri = self.resolver.resolve(prop.required_attr("name")?)?;
        let mut values = Vec::new();
        for value in prop.elements() {
            let (value_type, user_value) = match value.attr("encoding") {
                Some("utf8") => (KnoraValueType::SimpletextValue, value.trimmed_text()),
                Some("xml") => {
                    let xml = value.inner_xml();
                    let xml = xml.trim();
                    let user_value = if xml.is_empty() {
                        None
                    } else {
                        Some(xml.to_string())
                    };
                    (KnoraValueType::RichtextValue, user_value)
                }
                other => {
                    return Err(InputError::new(format!(
                        "The text value of the property '{}' has the encoding '{}'. \
                         Only 'utf8' and 'xml' are supported.",
                        prop_iri,
                        other.unwrap_or("")
                    ))
                    .into())
                }
            };
            values.push(ValueInformation::new(
                prop_iri.clone(),
                user_value,
                value_type,
                value_metadata(value),
            ));
        }
        Ok(values)
    }

    fn file_value(&self, element: &XmlElement) -> Option<ValueInformation> {
        let path = element.trimmed_text().unwrap_or_default();
        match KnoraValueType::from_file_extension(&path) {
            Some(file_type) => Some(self.file_value_of_type(element, file_type)),
            None => {
                warn!(
                    "The file '{}' has an extension that is not supported, it is ignored",
                    path
                );
                None
            }
        }
    }

    fn file_value_of_type(&self, element: &XmlElement, file_type: KnoraValueType) -> ValueInformation {
        let prop_iri = format!(
            "{}{}",
            KNORA_API,
            file_type.file_property().unwrap_or("hasFileValue")
        );
        let mut metadata = value_metadata(element);
        if let Some(license) = element.attr("license") {
            metadata.push(PropertyObject::new(
                TriplePropertyType::KnoraLicense,
                license,
                TripleObjectType::Iri,
            ));
        }
        if let Some(holder) = element.attr("copyright-holder") {
            metadata.push(PropertyObject::new(
                TriplePropertyType::KnoraCopyrightHolder,
                holder,
                TripleObjectType::String,
            ));
        }
        if let Some(authorship_id) = element.attr("authorship-id") {
            for author in self.authorships.get(authorship_id).into_iter().flatten() {
                metadata.push(PropertyObject::new(
                    TriplePropertyType::KnoraAuthorship,
                    author.clone(),
                    TripleObjectType::String,
                ));
            }
        }
        ValueInformation::new(prop_iri, element.trimmed_text(), file_type, metadata)
    }

    fn segment_value(
        &self,
        child: &XmlElement,
        segment_class: Option<&str>,
    ) -> Result<Vec<ValueInformation>> {
        let knora = |local: &str| format!("{}{}", KNORA_API, local);
        let value = match child.name.as_str() {
            "isSegmentOf" => {
                let prop = match segment_class {
                    Some("AudioSegment") => knora("isAudioSegmentOf"),
                    _ => knora("isVideoSegmentOf"),
                };
                ValueInformation::new(
                    prop,
                    child.trimmed_text(),
                    KnoraValueType::LinkValue,
                    value_metadata(child),
                )
            }
            "hasSegmentBounds" => {
                let mut metadata = Vec::new();
                if let Some(start) = child.attr("segment_start") {
                    metadata.push(PropertyObject::new(
                        TriplePropertyType::KnoraIntervalStart,
                        start,
                        TripleObjectType::Decimal,
                    ));
                }
                if let Some(end) = child.attr("segment_end") {
                    metadata.push(PropertyObject::new(
                        TriplePropertyType::KnoraIntervalEnd,
                        end,
                        TripleObjectType::Decimal,
                    ));
                }
                metadata.extend(value_metadata(child));
                ValueInformation::new(
                    knora("hasSegmentBounds"),
                    None,
                    KnoraValueType::IntervalValue,
                    metadata,
                )
            }
            "hasTitle" | "hasKeyword" => ValueInformation::new(
                knora(&child.name),
                child.trimmed_text(),
                KnoraValueType::SimpletextValue,
                value_metadata(child),
            ),
            "hasComment" | "hasDescription" => {
                let xml = child.inner_xml();
                let xml = xml.trim();
                ValueInformation::new(
                    knora(&child.name),
                    (!xml.is_empty()).then(|| xml.to_string()),
                    KnoraValueType::RichtextValue,
                    value_metadata(child),
                )
            }
            "relatesTo" => ValueInformation::new(
                knora("relatesTo"),
                child.trimmed_text(),
                KnoraValueType::LinkValue,
                value_metadata(child),
            ),
            other => {
                debug!("Skipping unknown segment element <{}>", other);
                return Ok(Vec::new());
            }
        };
        Ok(vec![value])
    }
}

fn value_metadata(value: &XmlElement) -> Vec<PropertyObject> {
    let mut metadata = Vec::new();
    if let Some(permissions) = value.attr("permissions") {
        metadata.push(PropertyObject::new(
            TriplePropertyType::KnoraPermissions,
            permissions,
            TripleObjectType::String,
        ));
    }
    if let Some(comment) = value.attr("comment") {
        metadata.push(PropertyObject::new(
            TriplePropertyType::KnoraCommentOnValue,
            comment,
            TripleObjectType::String,
        ));
    }
    metadata
}

/// `"1.5:3"` gives the start and end of an interval; missing parts are left out.
fn interval_bounds(interval: &str) -> Vec<PropertyObject> {
    let mut bounds = Vec::new();
    let (start, end) = interval.split_once(':').unwrap_or((interval, ""));
    if !start.trim().is_empty() {
        bounds.push(PropertyObject::new(
            TriplePropertyType::KnoraIntervalStart,
            start.trim(),
            TripleObjectType::Decimal,
        ));
    }
    if !end.trim().is_empty() {
        bounds.push(PropertyObject::new(
            TriplePropertyType::KnoraIntervalEnd,
            end.trim(),
            TripleObjectType::Decimal,
        ));
    }
    bounds
}

fn normalise_json(input: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(input)
        .ok()
        .map(|v| v.to_string())
}

/// Links to other resources found in the rich text of a resource:
/// `<a class="salsah-link" href="IRI:book_1:IRI">`.
fn standoff_links(resource: &XmlElement) -> Vec<PropertyObject> {
    let mut all = Vec::new();
    resource.descendants(&mut all);
    let hrefs: BTreeSet<&str> = all
        .into_iter()
        .filter(|e| e.name == "a" && e.attr("class") == Some("salsah-link"))
        .filter_map(|e| e.attr("href"))
        .collect();
    hrefs
        .into_iter()
        .map(|href| {
            let (link, object_type) = standoff_target(href);
            PropertyObject::new(TriplePropertyType::KnoraStandoffLink, link, object_type)
        })
        .collect()
}

fn standoff_target(href: &str) -> (String, TripleObjectType) {
    if let Some(inner) = href.strip_prefix("IRI:") {
        if let Some(id) = inner.split(":IRI").next() {
            return (id.to_string(), TripleObjectType::InternalId);
        }
    }
    if href.starts_with(DSP_RESOURCE_IRI_PREFIX) {
        return (href.to_string(), TripleObjectType::Iri);
    }
    (href.to_string(), TripleObjectType::InternalId)
}
