//! Defines the configuration of one validation run.
//! The `Config` is read once at startup (usually from command line flags) and passed by
//! reference through the pipeline; nothing in it changes while a run is in progress.

use crate::options::{DuplicateFileCheck, ServerKind, ValidationSeverity};
use anyhow::Result;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://0.0.0.0:3333";
pub const DEFAULT_SHACL_COMMAND: &str = "shacl validate --shacl {shacl} --data {data} --report {report}";
pub const DEFAULT_SHACL_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_GRAPH_DUMP_DIR: &str = "validation-graphs";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[builder(setter(into), default)]
pub struct Config {
    /// Base URL of the DSP API, without trailing slash.
    pub api_url: String,
    /// Minimum severity of the problems that are printed.
    pub severity: ValidationSeverity,
    pub server: ServerKind,
    /// If set, the data, ontology and shape graphs are written into this directory.
    #[builder(setter(into, strip_option))]
    pub save_graph_dir: Option<PathBuf>,
    pub duplicate_files: DuplicateFileCheck,
    /// Command line of the SHACL engine. `{shacl}`, `{data}` and `{report}` are replaced by
    /// the paths of the staged files.
    pub shacl_command: String,
    pub shacl_timeout_secs: u64,
    /// Where the staged graphs are copied when a run fails unexpectedly.
    pub graph_dump_dir: PathBuf,
    /// Where CSV reports are written when there are too many problems to print.
    pub report_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            severity: ValidationSeverity::default(),
            server: ServerKind::default(),
            save_graph_dir: None,
            duplicate_files: DuplicateFileCheck::default(),
            shacl_command: DEFAULT_SHACL_COMMAND.to_string(),
            shacl_timeout_secs: DEFAULT_SHACL_TIMEOUT_SECS,
            graph_dump_dir: PathBuf::from(DEFAULT_GRAPH_DUMP_DIR),
            report_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The API URL with any trailing slash removed, as used in ontology namespaces.
    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Prints out the current Config in a clear and readable way for command line output.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  API URL: {}", self.api_url());
        println!("  Severity: {}", self.severity);
        println!("  Production server: {}", self.server.is_production());
        if let Some(dir) = &self.save_graph_dir {
            println!("  Save graphs to: {}", dir.display());
        }
        println!(
            "  Ignore duplicate files: {}",
            self.duplicate_files.is_ignored()
        );
        println!("  SHACL command: {}", self.shacl_command);
        println!("  SHACL timeout: {}s", self.shacl_timeout_secs);
        println!("  Graph dump directory: {}", self.graph_dump_dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_defaults() {
        let config = Config::builder()
            .api_url("https://api.test.dasch.swiss/")
            .build()
            .unwrap();
        assert_eq!(config.api_url(), "https://api.test.dasch.swiss");
        assert_eq!(config.shacl_command, DEFAULT_SHACL_COMMAND);
        assert_eq!(config.severity, ValidationSeverity::Warning);
        assert!(config.save_graph_dir.is_none());
    }

    #[test]
    fn config_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::builder()
            .severity(ValidationSeverity::Info)
            .save_graph_dir(dir.path().to_path_buf())
            .build()
            .unwrap();
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }
}
