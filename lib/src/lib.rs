//! Checks DSP XML data against the ontologies of a project before it is uploaded.
//!
//! The XML is turned into an RDF data graph, SHACL shapes are built from the ontologies and
//! an external SHACL engine validates the one against the other. The report is translated back
//! into problems that name the resources and properties of the XML. The project definition
//! (JSON) can be checked on its own for circular mandatory links and inheritance problems.

extern crate derive_builder;

pub mod api;
pub mod clients;
pub mod config;
pub mod consts;
pub mod data;
pub mod dates;
pub mod dependency;
pub mod deserialise;
pub mod doctor;
pub mod duplicate_files;
pub mod errors;
pub mod make_graph;
pub mod ontology;
pub mod ontology_gate;
pub mod options;
pub mod problems;
pub mod project;
pub mod query_results;
pub mod reformat;
pub mod report;
pub mod shacl;
pub mod shapes;
pub mod util;

pub use api::{init_logging, DataValidator, ValidationOutcome};
