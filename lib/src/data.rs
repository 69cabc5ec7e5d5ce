//! The flat, typed representation of an XML upload that sits between the XML document and
//! the RDF data graph. Values are identified by a generated `value_uuid` so that a SHACL
//! result about a value node can be traced back to the XML element it came from.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::consts::{API_SHAPES, KNORA_API, RDF, RDFS, XSD};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDeserialised {
    pub info: ProjectInformation,
    pub data: DataDeserialised,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInformation {
    pub shortcode: String,
    pub default_ontology: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataDeserialised {
    pub resources: Vec<ResourceDeserialised>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDeserialised {
    pub res_id: String,
    pub property_objects: Vec<PropertyObject>,
    pub values: Vec<ValueInformation>,
    pub migration_metadata: MigrationMetadata,
}

/// Metadata of a resource that is migrated from another system.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MigrationMetadata {
    pub iri: Option<String>,
    pub ark: Option<String>,
    pub creation_date: Option<String>,
}

impl MigrationMetadata {
    pub fn is_empty(&self) -> bool {
        self.iri.is_none() && self.ark.is_none() && self.creation_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueInformation {
    /// Absolute IRI of the property as the user wrote it.
    pub user_facing_prop: String,
    /// `None` if the user input was empty or could not be read.
    pub user_facing_value: Option<String>,
    pub knora_type: KnoraValueType,
    pub value_metadata: Vec<PropertyObject>,
    pub value_uuid: String,
}

impl ValueInformation {
    pub fn new(
        user_facing_prop: impl Into<String>,
        user_facing_value: Option<String>,
        knora_type: KnoraValueType,
        value_metadata: Vec<PropertyObject>,
    ) -> Self {
        Self {
            user_facing_prop: user_facing_prop.into(),
            user_facing_value,
            knora_type,
            value_metadata,
            value_uuid: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyObject {
    pub property_type: TriplePropertyType,
    pub object_value: Option<String>,
    pub object_type: TripleObjectType,
}

impl PropertyObject {
    pub fn new(
        property_type: TriplePropertyType,
        object_value: impl Into<String>,
        object_type: TripleObjectType,
    ) -> Self {
        Self {
            property_type,
            object_value: Some(object_value.into()),
            object_type,
        }
    }

    pub fn empty(property_type: TriplePropertyType, object_type: TripleObjectType) -> Self {
        Self {
            property_type,
            object_value: None,
            object_type,
        }
    }
}

/// Predicates of the non-value triples attached to resources and value nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriplePropertyType {
    RdfType,
    RdfsLabel,
    KnoraCommentOnValue,
    KnoraPermissions,
    KnoraIntervalStart,
    KnoraIntervalEnd,
    KnoraStandoffLink,
    KnoraLicense,
    KnoraAuthorship,
    KnoraCopyrightHolder,
    KnoraDateStart,
    KnoraDateEnd,
}

impl TriplePropertyType {
    pub fn iri(self) -> String {
        match self {
            TriplePropertyType::RdfType => format!("{}type", RDF),
            TriplePropertyType::RdfsLabel => format!("{}label", RDFS),
            TriplePropertyType::KnoraCommentOnValue => format!("{}valueHasComment", KNORA_API),
            TriplePropertyType::KnoraPermissions => format!("{}hasPermissions", KNORA_API),
            TriplePropertyType::KnoraIntervalStart => {
                format!("{}intervalValueHasStart", KNORA_API)
            }
            TriplePropertyType::KnoraIntervalEnd => format!("{}intervalValueHasEnd", KNORA_API),
            TriplePropertyType::KnoraStandoffLink => format!("{}hasStandoffLinkTo", KNORA_API),
            TriplePropertyType::KnoraLicense => format!("{}hasLicense", KNORA_API),
            TriplePropertyType::KnoraAuthorship => format!("{}hasAuthorship", KNORA_API),
            TriplePropertyType::KnoraCopyrightHolder => {
                format!("{}hasCopyrightHolder", KNORA_API)
            }
            TriplePropertyType::KnoraDateStart => format!("{}dateHasStart", API_SHAPES),
            TriplePropertyType::KnoraDateEnd => format!("{}dateHasEnd", API_SHAPES),
        }
    }
}

/// How the object of a triple is written into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TripleObjectType {
    Boolean,
    Datetime,
    Decimal,
    Integer,
    String,
    DateYyyyMmDd,
    Uri,
    /// An absolute IRI.
    Iri,
    /// The id of a resource in the same upload, resolved into the data namespace.
    InternalId,
}

impl TripleObjectType {
    /// The XSD datatype of a literal of this kind; `None` for IRI objects.
    pub fn datatype(self) -> Option<String> {
        let local = match self {
            TripleObjectType::Boolean => "boolean",
            TripleObjectType::Datetime => "dateTimeStamp",
            TripleObjectType::Decimal => "decimal",
            TripleObjectType::Integer => "integer",
            TripleObjectType::String => "string",
            TripleObjectType::DateYyyyMmDd => "date",
            TripleObjectType::Uri => "anyURI",
            TripleObjectType::Iri | TripleObjectType::InternalId => return None,
        };
        Some(format!("{}{}", XSD, local))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KnoraValueType {
    BooleanValue,
    ColorValue,
    DateValue,
    DecimalValue,
    GeonameValue,
    GeomValue,
    IntValue,
    IntervalValue,
    LinkValue,
    ListValue,
    SimpletextValue,
    RichtextValue,
    TimeValue,
    UriValue,
    ArchiveFile,
    AudioFile,
    DocumentFile,
    MovingImageFile,
    StillImageFile,
    StillImageIiif,
    TextFile,
}

/// How the main object of a value node is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMapping {
    /// Local name of the `knora-api` value class.
    pub rdf_type: &'static str,
    /// Absolute IRI of the predicate pointing from the value node to the user input.
    /// `None` for values without a single main object (intervals).
    pub value_predicate: Option<String>,
    pub object_type: TripleObjectType,
}

impl KnoraValueType {
    pub fn mapping(self) -> ValueMapping {
        let knora = |local: &str| Some(format!("{}{}", KNORA_API, local));
        let (rdf_type, value_predicate, object_type) = match self {
            KnoraValueType::BooleanValue => (
                "BooleanValue",
                knora("booleanValueAsBoolean"),
                TripleObjectType::Boolean,
            ),
            KnoraValueType::ColorValue => (
                "ColorValue",
                knora("colorValueAsColor"),
                TripleObjectType::String,
            ),
            KnoraValueType::DateValue => {
                ("DateValue", knora("valueAsString"), TripleObjectType::String)
            }
            KnoraValueType::DecimalValue => (
                "DecimalValue",
                knora("decimalValueAsDecimal"),
                TripleObjectType::Decimal,
            ),
            KnoraValueType::GeonameValue => (
                "GeonameValue",
                knora("geonameValueAsGeonameCode"),
                TripleObjectType::String,
            ),
            KnoraValueType::GeomValue => (
                "GeomValue",
                knora("geometryValueAsGeometry"),
                TripleObjectType::String,
            ),
            KnoraValueType::IntValue => {
                ("IntValue", knora("intValueAsInt"), TripleObjectType::Integer)
            }
            KnoraValueType::IntervalValue => ("IntervalValue", None, TripleObjectType::Decimal),
            KnoraValueType::LinkValue => (
                "LinkValue",
                Some(format!("{}linkValueHasTargetID", API_SHAPES)),
                TripleObjectType::InternalId,
            ),
            KnoraValueType::ListValue => (
                "ListValue",
                knora("listValueAsListNode"),
                TripleObjectType::String,
            ),
            KnoraValueType::SimpletextValue => {
                ("TextValue", knora("valueAsString"), TripleObjectType::String)
            }
            KnoraValueType::RichtextValue => (
                "TextValue",
                knora("textValueAsXml"),
                TripleObjectType::String,
            ),
            KnoraValueType::TimeValue => (
                "TimeValue",
                knora("timeValueAsTimeStamp"),
                TripleObjectType::Datetime,
            ),
            KnoraValueType::UriValue => {
                ("UriValue", knora("uriValueAsUri"), TripleObjectType::Uri)
            }
            KnoraValueType::ArchiveFile => (
                "ArchiveFileValue",
                knora("fileValueHasFilename"),
                TripleObjectType::String,
            ),
            KnoraValueType::AudioFile => (
                "AudioFileValue",
                knora("fileValueHasFilename"),
                TripleObjectType::String,
            ),
            KnoraValueType::DocumentFile => (
                "DocumentFileValue",
                knora("fileValueHasFilename"),
                TripleObjectType::String,
            ),
            KnoraValueType::MovingImageFile => (
                "MovingImageFileValue",
                knora("fileValueHasFilename"),
                TripleObjectType::String,
            ),
            KnoraValueType::StillImageFile => (
                "StillImageFileValue",
                knora("fileValueHasFilename"),
                TripleObjectType::String,
            ),
            KnoraValueType::StillImageIiif => (
                "StillImageExternalFileValue",
                knora("stillImageFileValueHasExternalUrl"),
                TripleObjectType::Uri,
            ),
            KnoraValueType::TextFile => (
                "TextFileValue",
                knora("fileValueHasFilename"),
                TripleObjectType::String,
            ),
        };
        ValueMapping {
            rdf_type,
            value_predicate,
            object_type,
        }
    }

    pub fn is_file_value(self) -> bool {
        self.file_property().is_some()
    }

    /// The `knora-api` property that connects a resource to a file value of this kind.
    pub fn file_property(self) -> Option<&'static str> {
        match self {
            KnoraValueType::ArchiveFile => Some("hasArchiveFileValue"),
            KnoraValueType::AudioFile => Some("hasAudioFileValue"),
            KnoraValueType::DocumentFile => Some("hasDocumentFileValue"),
            KnoraValueType::MovingImageFile => Some("hasMovingImageFileValue"),
            KnoraValueType::StillImageFile | KnoraValueType::StillImageIiif => {
                Some("hasStillImageFileValue")
            }
            KnoraValueType::TextFile => Some("hasTextFileValue"),
            _ => None,
        }
    }

    /// Classifies a file name by its extension (case insensitive).
    pub fn from_file_extension(filename: &str) -> Option<KnoraValueType> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "zip" | "tar" | "gz" | "z" | "tgz" | "gzip" | "7z" => Some(KnoraValueType::ArchiveFile),
            "mp3" | "wav" => Some(KnoraValueType::AudioFile),
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => {
                Some(KnoraValueType::DocumentFile)
            }
            "mp4" => Some(KnoraValueType::MovingImageFile),
            "jpg" | "jpeg" | "jp2" | "png" | "tif" | "tiff" | "jpx" => {
                Some(KnoraValueType::StillImageFile)
            }
            "odd" | "rng" | "txt" | "xml" | "xsd" | "xsl" | "csv" | "json" => {
                Some(KnoraValueType::TextFile)
            }
            _ => None,
        }
    }
}

impl fmt::Display for KnoraValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// File value properties with the way they are written in XML and the accepted extensions.
pub const FILE_VALUE_DETAILS: [(&str, &str, &str); 6] = [
    ("hasArchiveFileValue", "bitstream", "zip, tar, gz, z, tgz, gzip, 7z"),
    ("hasAudioFileValue", "bitstream", "mp3, wav"),
    (
        "hasDocumentFileValue",
        "bitstream",
        "pdf, doc, docx, xls, xlsx, ppt, pptx",
    ),
    ("hasMovingImageFileValue", "bitstream", "mp4"),
    (
        "hasStillImageFileValue",
        "bitstream / iiif-uri",
        "jpg, jpeg, jp2, png, tif, tiff, jpx",
    ),
    (
        "hasTextFileValue",
        "bitstream",
        "odd, rng, txt, xml, xsd, xsl, csv, json",
    ),
];

/// Looks up `(xml tag, extensions)` for an absolute file value property IRI.
pub fn file_value_detail(property_iri: &str) -> Option<(&'static str, &'static str)> {
    let local = property_iri.strip_prefix(KNORA_API)?;
    FILE_VALUE_DETAILS
        .iter()
        .find(|(prop, _, _)| *prop == local)
        .map(|(_, tag, exts)| (*tag, *exts))
}

pub fn is_file_value_property(property_iri: &str) -> bool {
    file_value_detail(property_iri).is_some()
}
