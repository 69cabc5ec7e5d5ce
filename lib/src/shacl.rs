//! Runs an external SHACL engine over the data.
//!
//! The graphs are staged as Turtle files in a temporary directory, the configured command is
//! run with a timeout and the report it writes is read back. Nothing here knows how to check
//! a shape; any engine that reads Turtle and writes a `sh:ValidationReport` can be plugged in.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, error, info, warn};
use oxigraph::model::{Graph, TermRef};
use tempfile::TempDir;

use crate::config::Config;
use crate::consts::SH_CONFORMS;
use crate::errors::{MalformedReportError, ShaclEngineError};
use crate::util::{merge_graphs, read_file, write_graph_to_file};

/// All graphs of one validation run.
#[derive(Debug, Clone)]
pub struct RDFGraphs {
    pub data: Graph,
    pub ontos: Graph,
    pub knora_api: Graph,
    pub cardinality_shapes: Graph,
    pub content_shapes: Graph,
}

impl RDFGraphs {
    pub fn onto_and_knora(&self) -> Graph {
        merge_graphs([&self.ontos, &self.knora_api])
    }

    pub fn data_onto_and_knora(&self) -> Graph {
        merge_graphs([&self.data, &self.ontos, &self.knora_api])
    }

    pub fn cardinality_shapes_and_onto(&self) -> Graph {
        merge_graphs([&self.cardinality_shapes, &self.ontos, &self.knora_api])
    }

    pub fn content_shapes_and_onto(&self) -> Graph {
        merge_graphs([&self.content_shapes, &self.ontos, &self.knora_api])
    }

    /// Writes every graph into `dir`, each file starting with `stem`.
    pub fn save(&self, dir: &Path, stem: &str) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        info!("Saving graphs to {}", dir.display());
        let files = [
            ("DATA", &self.data),
            ("ONTO", &self.ontos),
            ("KNORA_API", &self.knora_api),
            ("CARDINALITY_SHAPES", &self.cardinality_shapes),
            ("CONTENT_SHAPES", &self.content_shapes),
        ];
        for (name, graph) in files {
            write_graph_to_file(graph, &dir.join(format!("{}_{}.ttl", stem, name)))?;
        }
        Ok(())
    }
}

/// What the engine answered for one pair of data and shapes.
#[derive(Debug, Clone)]
pub struct ShaclReport {
    pub conforms: bool,
    pub validation_graph: Graph,
}

/// The merged result of the validation runs together with the graphs needed to interpret it.
#[derive(Debug, Clone)]
pub struct ValidationReportGraphs {
    pub conforms: bool,
    pub validation_graph: Graph,
    pub shacl_graph: Graph,
    /// Project ontologies and `knora-api`.
    pub onto_graph: Graph,
    pub data_graph: Graph,
}

pub trait ShaclValidator {
    fn validate(&self, data: &Graph, shapes: &Graph) -> Result<ShaclReport>;
}

/// Validates with a command line SHACL engine.
pub struct ShaclCliValidator {
    command: String,
    timeout: Duration,
    dump_dir: PathBuf,
}

impl ShaclCliValidator {
    pub fn new(command: impl Into<String>, timeout: Duration, dump_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            timeout,
            dump_dir: dump_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.shacl_command.clone(),
            Duration::from_secs(config.shacl_timeout_secs),
            config.graph_dump_dir.clone(),
        )
    }

    /// The command line split into program and arguments, with the placeholders replaced.
    fn command_line(&self, shacl: &Path, data: &Path, report: &Path) -> Vec<String> {
        self.command
            .split_whitespace()
            .map(|part| {
                part.replace("{shacl}", &shacl.to_string_lossy())
                    .replace("{data}", &data.to_string_lossy())
                    .replace("{report}", &report.to_string_lossy())
            })
            .collect()
    }

    fn run(&self, dir: &Path) -> Result<ShaclReport> {
        let shacl = dir.join("shacl.ttl");
        let data = dir.join("data.ttl");
        let report = dir.join("report.ttl");
        let stderr_file = dir.join("stderr.log");

        let args = self.command_line(&shacl, &data, &report);
        let Some((program, rest)) = args.split_first() else {
            return Err(ShaclEngineError::Spawn {
                command: self.command.clone(),
                reason: "the command is empty".to_string(),
            }
            .into());
        };
        debug!("Running SHACL engine: {}", args.join(" "));
        let mut child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(File::create(&stderr_file)?))
            .spawn()
            .map_err(|e| ShaclEngineError::Spawn {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() > self.timeout {
                if let Err(e) = child.kill() {
                    warn!("Failed to stop the SHACL engine: {}", e);
                }
                if let Err(e) = child.wait() {
                    warn!("Failed to reap the stopped SHACL engine: {}", e);
                }
                return Err(ShaclEngineError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
                .into());
            }
            thread::sleep(Duration::from_millis(50));
        };
        debug!("SHACL engine finished after {:?}", started.elapsed());

        if !status.success() {
            let stderr = std::fs::read_to_string(&stderr_file).unwrap_or_default();
            return Err(ShaclEngineError::Failed {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            }
            .into());
        }
        if !report.exists() {
            return Err(ShaclEngineError::MissingReport(report).into());
        }
        let validation_graph = read_file(&report)
            .map_err(|e| MalformedReportError(format!("the report cannot be parsed: {}", e)))?;
        let conforms = report_conforms(&validation_graph)?;
        Ok(ShaclReport {
            conforms,
            validation_graph,
        })
    }
}

impl ShaclValidator for ShaclCliValidator {
    fn validate(&self, data: &Graph, shapes: &Graph) -> Result<ShaclReport> {
        let dir = TempDir::new().context("Failed to create a temporary directory")?;
        write_graph_to_file(shapes, &dir.path().join("shacl.ttl"))?;
        write_graph_to_file(data, &dir.path().join("data.ttl"))?;
        match self.run(dir.path()) {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("SHACL validation failed: {}", e);
                match copy_staged_files(dir.path(), &self.dump_dir) {
                    Ok(target) => error!("The staged graphs were saved in {}", target.display()),
                    Err(copy_err) => error!("The staged graphs could not be saved: {}", copy_err),
                }
                Err(e)
            }
        }
    }
}

/// Reads `sh:conforms` from a validation report.
pub fn report_conforms(report: &Graph) -> Result<bool> {
    let conforms = report
        .triples_for_predicate(SH_CONFORMS)
        .next()
        .ok_or_else(|| MalformedReportError("sh:conforms is missing".to_string()))?;
    match conforms.object {
        TermRef::Literal(l) => match l.value() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(MalformedReportError(format!("sh:conforms is '{}'", other)).into()),
        },
        other => Err(MalformedReportError(format!("sh:conforms is '{}'", other)).into()),
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H%M%S").to_string()
}

fn copy_staged_files(from: &Path, dump_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dump_dir)?;
    let stamp = timestamp();
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let name = entry.file_name();
        let target = dump_dir.join(format!("{}_{}", stamp, name.to_string_lossy()));
        std::fs::copy(entry.path(), target)?;
    }
    Ok(dump_dir.to_path_buf())
}

/// Saves graphs for a developer to look at, each as `<timestamp>_<name>.ttl`.
pub fn dump_graphs(dump_dir: &Path, graphs: &[(&str, &Graph)]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dump_dir)
        .with_context(|| format!("Failed to create {}", dump_dir.display()))?;
    let stamp = timestamp();
    let mut written = Vec::with_capacity(graphs.len());
    for (name, graph) in graphs {
        let file = dump_dir.join(format!("{}_{}.ttl", stamp, name));
        write_graph_to_file(graph, &file)?;
        written.push(file);
    }
    warn!("Saved {} graphs to {}", written.len(), dump_dir.display());
    Ok(written)
}

/// Validates the data twice: once against the cardinality shapes, once against the content
/// shapes. The two reports are merged.
pub fn validate_rdf_graphs(
    validator: &dyn ShaclValidator,
    graphs: &RDFGraphs,
) -> Result<ValidationReportGraphs> {
    let data = graphs.data_onto_and_knora();
    info!("Validating the cardinalities");
    let card = validator.validate(&data, &graphs.cardinality_shapes_and_onto())?;
    info!("Validating the content of the values");
    let content = validator.validate(&data, &graphs.content_shapes_and_onto())?;
    debug!(
        "Cardinality report conforms: {}, content report conforms: {}",
        card.conforms, content.conforms
    );
    Ok(ValidationReportGraphs {
        conforms: card.conforms && content.conforms,
        validation_graph: merge_graphs([&card.validation_graph, &content.validation_graph]),
        shacl_graph: merge_graphs([&graphs.cardinality_shapes, &graphs.content_shapes]),
        onto_graph: graphs.onto_and_knora(),
        data_graph: graphs.data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_turtle;
    use std::cell::RefCell;

    const CONFORMING: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        [] a sh:ValidationReport ; sh:conforms true .
    "#;

    const VIOLATING: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        [] a sh:ValidationReport ; sh:conforms false ; sh:result [ a sh:ValidationResult ] .
    "#;

    struct CannedValidator {
        reports: RefCell<Vec<&'static str>>,
    }

    impl ShaclValidator for CannedValidator {
        fn validate(&self, _data: &Graph, _shapes: &Graph) -> Result<ShaclReport> {
            let ttl = self.reports.borrow_mut().remove(0);
            let validation_graph = parse_turtle(ttl)?;
            Ok(ShaclReport {
                conforms: report_conforms(&validation_graph)?,
                validation_graph,
            })
        }
    }

    fn empty_graphs() -> RDFGraphs {
        RDFGraphs {
            data: Graph::new(),
            ontos: Graph::new(),
            knora_api: Graph::new(),
            cardinality_shapes: Graph::new(),
            content_shapes: Graph::new(),
        }
    }

    #[test]
    fn conforms_is_read_from_the_report() {
        assert!(report_conforms(&parse_turtle(CONFORMING).unwrap()).unwrap());
        assert!(!report_conforms(&parse_turtle(VIOLATING).unwrap()).unwrap());
        let err = report_conforms(&Graph::new()).unwrap_err();
        assert!(err.downcast_ref::<MalformedReportError>().is_some());
    }

    #[test]
    fn both_runs_must_conform() {
        let validator = CannedValidator {
            reports: RefCell::new(vec![CONFORMING, VIOLATING]),
        };
        let report = validate_rdf_graphs(&validator, &empty_graphs()).unwrap();
        assert!(!report.conforms);
        assert!(!report.validation_graph.is_empty());

        let validator = CannedValidator {
            reports: RefCell::new(vec![CONFORMING, CONFORMING]),
        };
        assert!(validate_rdf_graphs(&validator, &empty_graphs()).unwrap().conforms);
    }

    #[test]
    fn placeholders_are_replaced() {
        let validator = ShaclCliValidator::new(
            "shacl validate --shacl {shacl} --data {data} --report {report}",
            Duration::from_secs(1),
            "dump",
        );
        let line = validator.command_line(Path::new("/t/s.ttl"), Path::new("/t/d.ttl"), Path::new("/t/r.ttl"));
        assert_eq!(
            line,
            vec![
                "shacl", "validate", "--shacl", "/t/s.ttl", "--data", "/t/d.ttl", "--report", "/t/r.ttl"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_engine_dumps_the_staged_graphs() {
        let dump = tempfile::tempdir().unwrap();
        let validator = ShaclCliValidator::new("false {shacl}", Duration::from_secs(10), dump.path());
        let err = validator.validate(&Graph::new(), &Graph::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShaclEngineError>(),
            Some(ShaclEngineError::Failed { .. })
        ));
        let dumped: Vec<String> = std::fs::read_dir(dump.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(dumped.iter().any(|name| name.ends_with("_shacl.ttl")));
        assert!(dumped.iter().any(|name| name.ends_with("_data.ttl")));
    }

    #[cfg(unix)]
    #[test]
    fn engine_without_report_is_an_error() {
        let dump = tempfile::tempdir().unwrap();
        let validator = ShaclCliValidator::new("true", Duration::from_secs(10), dump.path());
        let err = validator.validate(&Graph::new(), &Graph::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShaclEngineError>(),
            Some(ShaclEngineError::MissingReport(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn slow_engine_times_out() {
        let dump = tempfile::tempdir().unwrap();
        let validator = ShaclCliValidator::new("sleep 5", Duration::from_millis(200), dump.path());
        let err = validator.validate(&Graph::new(), &Graph::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShaclEngineError>(),
            Some(ShaclEngineError::Timeout { .. })
        ));
    }
}
