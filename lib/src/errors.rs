// Error kinds that callers may want to tell apart; everything else travels as anyhow::Error

use std::path::PathBuf;
use thiserror::Error;

/// A problem with the user input that makes the whole run impossible, e.g. a
/// `<resource>` without an `id` attribute.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InputError {
    pub message: String,
}

impl InputError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external SHACL engine could not produce a report.
#[derive(Debug, Error)]
pub enum ShaclEngineError {
    #[error("Failed to start the SHACL engine `{command}`: {reason}")]
    Spawn { command: String, reason: String },
    #[error("The SHACL engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("The SHACL engine did not finish within {seconds} seconds")]
    Timeout { seconds: u64 },
    #[error("The SHACL engine did not write a report to {0}")]
    MissingReport(PathBuf),
}

/// The validation report graph does not have the expected structure.
#[derive(Debug, Error)]
#[error("Malformed validation report: {0}")]
pub struct MalformedReportError(pub String);

/// A collaborator endpoint answered with a non-OK status code.
#[derive(Debug, Error)]
#[error("NON-OK RESPONSE | Request: {request} | Code: {status} | Message: {body}")]
pub struct ApiResponseError {
    pub request: String,
    pub status: u16,
    pub body: String,
}
