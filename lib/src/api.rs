//! The validation pipeline behind `validate-data`.
//! `DataValidator` ties the collaborators together: the XML is deserialised, the project
//! ontologies are fetched and checked, the data is validated against the shapes built from
//! them and the results are turned into a message for the user.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use oxigraph::model::Graph;

use crate::clients::{ApiConnection, LegalInfoClient, ListClient, OntologyClient};
use crate::config::Config;
use crate::data::ProjectDeserialised;
use crate::deserialise::deserialise;
use crate::duplicate_files::check_for_duplicate_files;
use crate::make_graph::make_data_graph;
use crate::ontology_gate::{validate_ontology, OntologyValidationProblem};
use crate::problems::SortedProblems;
use crate::reformat::reformat_validation_graph;
use crate::report::{get_user_message, sort_user_problems};
use crate::shacl::{
    dump_graphs, validate_rdf_graphs, RDFGraphs, ShaclCliValidator, ShaclValidator,
    ValidationReportGraphs,
};
use crate::shapes::{construct_cardinality_shapes, construct_content_shapes};
use crate::util::{merge_graphs, parse_turtle};

const API_TIMEOUT: Duration = Duration::from_secs(60);

/// Initializes logging for the dsp-validate library.
///
/// If the `DSP_VALIDATE_LOG` environment variable is set, `RUST_LOG` is set to its value.
/// The logger itself (e.g. `env_logger::init()`) must be initialised after this call.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("DSP_VALIDATE_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}

/// The result of one validation run.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Whether an xmlupload to the configured server would be accepted.
    pub is_valid: bool,
    /// Set if the ontology itself is broken; the data was not validated.
    pub ontology_problem: Option<OntologyValidationProblem>,
    pub problems: SortedProblems,
    /// Graphs written for inspection because the report had unknown results.
    pub dumped_graphs: Vec<PathBuf>,
    /// The text shown to the user.
    pub message: String,
}

impl ValidationOutcome {
    /// Whether the run stopped on an error that the data cannot fix.
    pub fn is_fatal(&self) -> bool {
        self.ontology_problem.is_some()
    }
}

pub struct DataValidator {
    config: Config,
    ontology_client: Box<dyn OntologyClient>,
    list_client: Box<dyn ListClient>,
    legal_info_client: Box<dyn LegalInfoClient>,
    shacl: Box<dyn ShaclValidator>,
}

impl DataValidator {
    pub fn new(
        config: Config,
        ontology_client: Box<dyn OntologyClient>,
        list_client: Box<dyn ListClient>,
        legal_info_client: Box<dyn LegalInfoClient>,
        shacl: Box<dyn ShaclValidator>,
    ) -> Self {
        Self {
            config,
            ontology_client,
            list_client,
            legal_info_client,
            shacl,
        }
    }

    /// Talks to the server at `config.api_url` and runs the configured SHACL command.
    pub fn from_config(config: Config) -> Result<Self> {
        let connection = ApiConnection::new(config.api_url(), API_TIMEOUT)?;
        let shacl = ShaclCliValidator::from_config(&config);
        Ok(Self::new(
            config,
            Box::new(connection.clone()),
            Box::new(connection.clone()),
            Box::new(connection),
            Box::new(shacl),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validate_data(&self, xml_file: &Path) -> Result<ValidationOutcome> {
        info!("Validating {}", xml_file.display());
        let xml = std::fs::read_to_string(xml_file)
            .with_context(|| format!("Failed to read {}", xml_file.display()))?;
        let stem = xml_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        self.validate_xml(&xml, &stem)
    }

    /// Validates an XML document. `stem` names the saved graphs and CSV reports.
    pub fn validate_xml(&self, xml: &str, stem: &str) -> Result<ValidationOutcome> {
        let project = deserialise(xml, self.config.api_url())?;
        debug!(
            "Project {} has {} resources",
            project.info.shortcode,
            project.data.resources.len()
        );
        let graphs = self.get_graphs(&project)?;
        if let Some(dir) = &self.config.save_graph_dir {
            graphs.save(dir, stem)?;
        }

        if let Some(problem) = validate_ontology(&graphs.ontos, self.shacl.as_ref())? {
            error!("The ontology of project {} is invalid", project.info.shortcode);
            return Ok(ValidationOutcome {
                is_valid: false,
                message: problem.to_string(),
                ontology_problem: Some(problem),
                problems: SortedProblems::default(),
                dumped_graphs: vec![],
            });
        }

        let duplicate_files =
            check_for_duplicate_files(&project.data.resources, self.config.duplicate_files);
        let report = validate_rdf_graphs(self.shacl.as_ref(), &graphs)?;
        if report.conforms && duplicate_files.is_none() {
            info!("The data conforms to the ontology");
            return Ok(ValidationOutcome {
                is_valid: true,
                ontology_problem: None,
                problems: SortedProblems::default(),
                dumped_graphs: vec![],
                message: "Validation passed!".to_string(),
            });
        }

        let outcome = (|| -> Result<ValidationOutcome> {
            let all_problems = if report.conforms {
                Default::default()
            } else {
                reformat_validation_graph(&report)?
            };
            let sorted = sort_user_problems(all_problems, duplicate_files);
            self.outcome(sorted, &report, stem)
        })();
        if let Err(e) = &outcome {
            error!("Failed to process the validation report: {:#}", e);
            match dump_graphs(&self.config.graph_dump_dir, &report_graphs(&report)) {
                Ok(files) => {
                    for file in files {
                        error!("Saved {} for inspection", file.display());
                    }
                }
                Err(dump_error) => warn!("Failed to save the graphs: {:#}", dump_error),
            }
        }
        outcome
    }

    /// Parses the ontologies and builds every graph needed for the validation.
    pub fn get_graphs(&self, project: &ProjectDeserialised) -> Result<RDFGraphs> {
        let shortcode = project.info.shortcode.as_str();
        let knora_api = parse_turtle(&self.ontology_client.get_knora_api()?)
            .context("Failed to parse the knora-api ontology")?;
        let mut ontos = Graph::new();
        for turtle in self.ontology_client.get_ontologies(shortcode)? {
            let onto = parse_turtle(&turtle).context("Failed to parse a project ontology")?;
            ontos.extend(onto.iter());
        }
        let lists = self.list_client.get_lists(shortcode)?;
        let licenses = self.legal_info_client.get_licenses(shortcode)?;
        debug!(
            "Project {} has {} lists and {} enabled licenses",
            shortcode,
            lists.len(),
            licenses.len()
        );

        let onto_and_knora = merge_graphs([&ontos, &knora_api]);
        let cardinality_shapes = construct_cardinality_shapes(&onto_and_knora)?;
        let content_shapes = construct_content_shapes(&onto_and_knora, &lists, &licenses)?;
        let data = make_data_graph(&project.data.resources)?;
        Ok(RDFGraphs {
            data,
            ontos,
            knora_api,
            cardinality_shapes,
            content_shapes,
        })
    }

    fn outcome(
        &self,
        sorted: SortedProblems,
        report: &ValidationReportGraphs,
        stem: &str,
    ) -> Result<ValidationOutcome> {
        let messages = get_user_message(&sorted, self.config.severity);
        let mut message = messages.render(&self.config.report_dir, stem)?;

        let mut dumped_graphs = vec![];
        if !sorted.unexpected_shacl_validation_components.is_empty() {
            warn!(
                "The report contains {} unknown constraint components",
                sorted.unexpected_shacl_validation_components.len()
            );
            dumped_graphs = dump_graphs(&self.config.graph_dump_dir, &report_graphs(report))?;
            message.push_str(&format!(
                "\n\nThe graphs were saved to '{}'. Please contact the development team with \
                 this message and the saved files.",
                self.config.graph_dump_dir.display()
            ));
        }

        let blocked_by_warnings =
            self.config.server.is_production() && !sorted.user_warnings.is_empty();
        let is_valid = sorted.unique_violations.is_empty()
            && sorted.unexpected_shacl_validation_components.is_empty()
            && !blocked_by_warnings;
        if is_valid && message.is_empty() {
            message = "Validation passed!".to_string();
        }
        Ok(ValidationOutcome {
            is_valid,
            ontology_problem: None,
            problems: sorted,
            dumped_graphs,
            message,
        })
    }
}

fn report_graphs(report: &ValidationReportGraphs) -> [(&'static str, &Graph); 4] {
    [
        ("DATA", &report.data_graph),
        ("ONTO", &report.onto_graph),
        ("SHACL", &report.shacl_graph),
        ("REPORT", &report.validation_graph),
    ]
}
