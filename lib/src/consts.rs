//! Defines constant NamedNodeRefs and namespaces for the vocabularies used when building
//! data graphs, shape graphs and when reading SHACL validation reports: knora-api,
//! the api-shapes extension, SHACL, DASH, OWL and salsah-gui.

use oxigraph::model::NamedNodeRef;

pub const KNORA_API: &str = "http://api.knora.org/ontology/knora-api/v2#";
pub const API_SHAPES: &str = "http://api.knora.org/ontology/knora-api/shapes/v2#";
pub const SALSAH_GUI: &str = "http://api.knora.org/ontology/salsah-gui/v2#";
pub const DATA: &str = "http://data/";
pub const SH: &str = "http://www.w3.org/ns/shacl#";
pub const DASH: &str = "http://datashapes.org/dash#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Prefix of resource IRIs that already exist on a DSP server.
pub const DSP_RESOURCE_IRI_PREFIX: &str = "http://rdfh.ch/";

/// Prefix bindings used when serialising graphs to Turtle.
pub const TURTLE_PREFIXES: [(&str, &str); 10] = [
    ("knora-api", KNORA_API),
    ("api-shapes", API_SHAPES),
    ("salsah-gui", SALSAH_GUI),
    ("data", DATA),
    ("sh", SH),
    ("dash", DASH),
    ("owl", OWL),
    ("rdfs", RDFS),
    ("rdf", RDF),
    ("xsd", XSD),
];

pub const TYPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
pub const FIRST: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#first");
pub const REST: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#rest");
pub const NIL: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#nil");

// rdfs
pub const LABEL: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#label");
pub const COMMENT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#comment");
pub const SUB_CLASS_OF: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#subClassOf");
pub const SUB_PROPERTY_OF: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#subPropertyOf");

// owl
pub const OWL_ONTOLOGY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Ontology");
pub const OWL_CLASS: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
pub const OWL_OBJECT_PROPERTY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
pub const OWL_RESTRICTION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Restriction");
pub const OWL_ON_PROPERTY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#onProperty");
pub const OWL_CARDINALITY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#cardinality");
pub const OWL_MIN_CARDINALITY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#minCardinality");
pub const OWL_MAX_CARDINALITY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#maxCardinality");

// knora-api
pub const KNORA_VALUE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#Value");
pub const KNORA_FILE_VALUE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#FileValue");
pub const KNORA_LINK_VALUE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#LinkValue");
pub const KNORA_REPRESENTATION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#Representation");
pub const IS_RESOURCE_CLASS: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#isResourceClass");
pub const CAN_BE_INSTANTIATED: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#canBeInstantiated");
pub const IS_EDITABLE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#isEditable");
pub const IS_LINK_PROPERTY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#isLinkProperty");
pub const IS_LINK_VALUE_PROPERTY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#isLinkValueProperty");
pub const OBJECT_TYPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#objectType");
pub const LAST_MODIFICATION_DATE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
    "http://api.knora.org/ontology/knora-api/v2#lastModificationDate",
);
pub const HAS_LICENSE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#hasLicense");
pub const HAS_COPYRIGHT_HOLDER: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#hasCopyrightHolder");
pub const HAS_AUTHORSHIP: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#hasAuthorship");
pub const HAS_STANDOFF_LINK_TO: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#hasStandoffLinkTo");
pub const HAS_PERMISSIONS: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#hasPermissions");
pub const LIST_VALUE_AS_LIST_NODE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#listValueAsListNode");
pub const SEQNUM: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#seqnum");
pub const IS_PART_OF: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#isPartOf");
pub const TEXT_VALUE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#TextValue");
pub const LIST_VALUE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/knora-api/v2#ListValue");

// api-shapes
pub const LINK_VALUE_HAS_TARGET_ID: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
    "http://api.knora.org/ontology/knora-api/shapes/v2#linkValueHasTargetID",
);
pub const HAS_PERMISSIONS_CARDINALITY: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
    "http://api.knora.org/ontology/knora-api/shapes/v2#hasPermissions_Cardinality",
);
pub const SEQNUM_PROP_SHAPE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
    "http://api.knora.org/ontology/knora-api/shapes/v2#seqnum_PropShape",
);

// salsah-gui
pub const GUI_ELEMENT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/salsah-gui/v2#guiElement");
pub const GUI_ATTRIBUTE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/salsah-gui/v2#guiAttribute");
pub const GUI_SEARCHBOX: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://api.knora.org/ontology/salsah-gui/v2#Searchbox");

// shacl
pub const SH_NODE_SHAPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#NodeShape");
pub const SH_PROPERTY_SHAPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#PropertyShape");
pub const SH_PROPERTY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#property");
pub const SH_PATH: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#path");
pub const SH_NODE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#node");
pub const SH_CLASS: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#class");
pub const SH_TARGET_CLASS: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetClass");
pub const SH_IN: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#in");
pub const SH_MIN_COUNT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minCount");
pub const SH_MAX_COUNT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxCount");
pub const SH_MESSAGE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#message");
pub const SH_SEVERITY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#severity");
pub const SH_CONFORMS: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#conforms");
pub const SH_VALIDATION_REPORT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#ValidationReport");
pub const SH_VALIDATION_RESULT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#ValidationResult");
pub const SH_RESULT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#result");
pub const SH_FOCUS_NODE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#focusNode");
pub const SH_RESULT_PATH: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#resultPath");
pub const SH_RESULT_MESSAGE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#resultMessage");
pub const SH_RESULT_SEVERITY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#resultSeverity");
pub const SH_SOURCE_CONSTRAINT_COMPONENT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#sourceConstraintComponent");
pub const SH_SOURCE_SHAPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#sourceShape");
pub const SH_VALUE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#value");
pub const SH_DETAIL: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#detail");
pub const SH_VIOLATION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Violation");
pub const SH_WARNING: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Warning");
pub const SH_INFO: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Info");

// dash
pub const DASH_CLOSED_BY_TYPES: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://datashapes.org/dash#closedByTypes");
