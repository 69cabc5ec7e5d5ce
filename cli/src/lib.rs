use anyhow::{anyhow, Error, Result};
use clap::{Parser, Subcommand};
use dsp_validate::api::DataValidator;
use dsp_validate::config::{Config, DEFAULT_API_URL, DEFAULT_SHACL_COMMAND, DEFAULT_SHACL_TIMEOUT_SECS};
use dsp_validate::dependency::{class_creation_order, dependency_graph_to_dot, mandatory_links_to_knora_classes};
use dsp_validate::doctor::ProjectDoctor;
use dsp_validate::options::{DuplicateFileCheck, ServerKind, ValidationSeverity};
use dsp_validate::project::{parse_project_file, ParsedClass};
use dsp_validate::util::reformat_onto_iri;
use log::{error, info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "dsp-validate")]
#[command(about = "Validates DSP XML data and project definitions before an upload")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Base URL of the DSP API
    #[clap(long, short, default_value = DEFAULT_API_URL, global = true)]
    server: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate an XML file against the ontologies of its project
    ValidateData {
        /// The XML file to validate
        xml_file: PathBuf,
        /// Minimum severity of the problems that are printed: info, warning or error
        #[clap(long, default_value = "warning")]
        severity: ValidationSeverity,
        /// The data is meant for a production server, where warnings prevent an upload
        #[clap(long, action, default_value = "false")]
        prod: bool,
        /// Save the data, ontology and shape graphs next to the XML file
        #[clap(long, action, default_value = "false")]
        save_graphs: bool,
        /// Do not warn about files that are used more than once
        #[clap(long, action, default_value = "false")]
        ignore_duplicate_files: bool,
        /// Command line of the SHACL engine, with {shacl}, {data} and {report} placeholders
        #[clap(long, default_value = DEFAULT_SHACL_COMMAND)]
        shacl_command: String,
        /// Seconds after which the SHACL engine is stopped
        #[clap(long, default_value_t = DEFAULT_SHACL_TIMEOUT_SECS)]
        timeout: u64,
        /// Directory for CSV reports, defaults to the directory of the XML file
        #[clap(long)]
        report_dir: Option<PathBuf>,
        /// Print the outcome as JSON instead of the text message
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// Check a project definition (JSON) and print the order in which its classes are created
    CheckProject {
        /// The project definition file
        project_file: PathBuf,
    },
    /// Write the graph of mandatory links between the classes of a project in DOT format
    LinkGraph {
        /// The project definition file
        project_file: PathBuf,
        /// The file to write the graph to, defaults to stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Prints the version of the dsp-validate binary
    Version,
}

pub fn run() -> Result<()> {
    dsp_validate::api::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    dsp_validate::api::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    // The RUST_LOG env var is set by `init_logging` if DSP_VALIDATE_LOG is present.
    // CLI flags for verbosity take precedence. If nothing is set, we default to "warn".
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    match cmd.command {
        Commands::ValidateData {
            xml_file,
            severity,
            prod,
            save_graphs,
            ignore_duplicate_files,
            shacl_command,
            timeout,
            report_dir,
            json,
        } => {
            let xml_dir = xml_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let mut builder = Config::builder();
            builder
                .api_url(cmd.server)
                .severity(severity)
                .server(ServerKind::from(prod))
                .duplicate_files(DuplicateFileCheck::from(ignore_duplicate_files))
                .shacl_command(shacl_command)
                .shacl_timeout_secs(timeout)
                .report_dir(report_dir.unwrap_or_else(|| xml_dir.clone()));
            if save_graphs {
                builder.save_graph_dir(xml_dir.join("graphs"));
            }
            let config = builder.build()?;
            if cmd.verbose || cmd.debug {
                config.print();
            }
            validate_data(config, &xml_file, json)
        }
        Commands::CheckProject { project_file } => check_project(&project_file, &cmd.server),
        Commands::LinkGraph {
            project_file,
            output,
        } => {
            let project = parse_project_file(&project_file, &cmd.server)?;
            let dot = dependency_graph_to_dot(&project);
            match output {
                Some(path) => {
                    std::fs::write(&path, dot)?;
                    info!("Wrote the link graph to {}", path.display());
                }
                None => println!("{dot}"),
            }
            Ok(())
        }
        Commands::Version => {
            println!("dsp-validate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_data(config: Config, xml_file: &Path, json: bool) -> Result<()> {
    let validator = DataValidator::from_config(config)?;
    let outcome = validator.validate_data(xml_file)?;
    if json {
        let value = serde_json::json!({
            "file": xml_file.display().to_string(),
            "is_valid": outcome.is_valid,
            "ontology_problem": outcome.ontology_problem.as_ref().map(|p| p.to_string()),
            "problems": outcome.problems,
            "dumped_graphs": outcome.dumped_graphs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", outcome.message);
    }
    if outcome.is_fatal() {
        error!("Stopped the validation of {}", xml_file.display());
        return Err(anyhow!("The ontology of the project is invalid"));
    }
    if outcome.is_valid {
        info!("{} can be uploaded", xml_file.display());
    } else {
        warn!("{} cannot be uploaded in its current state", xml_file.display());
    }
    Ok(())
}

fn check_project(project_file: &Path, api_url: &str) -> Result<()> {
    let project = parse_project_file(project_file, api_url)?;
    let problems = ProjectDoctor::default().run(&project)?;
    for potential in mandatory_links_to_knora_classes(&project) {
        warn!(
            "{} -- {} --> {} (cardinality {}) may form a circle in the data",
            potential.subject, potential.prop, potential.object_class, potential.cardinality
        );
    }
    if !problems.is_empty() {
        println!("Found {} problems:", problems.len());
        for problem in &problems {
            println!("{problem}");
        }
        return Err(anyhow!(
            "The project definition {} is invalid",
            project_file.display()
        ));
    }

    let classes: Vec<ParsedClass> = project.classes().cloned().collect();
    let order = class_creation_order(&classes)?;
    println!("The project definition is valid. Classes are created in this order:");
    for (i, class) in order.iter().enumerate() {
        println!("{:>4}. {}", i + 1, reformat_onto_iri(&class.name));
    }
    Ok(())
}
