//! Shared option types that replace boolean flag parameters in the Rust API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum severity of the validation problems shown to the user.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Info,
    #[default]
    Warning,
    Error,
}

impl ValidationSeverity {
    pub fn shows_warnings(self) -> bool {
        self <= ValidationSeverity::Warning
    }

    pub fn shows_info(self) -> bool {
        self == ValidationSeverity::Info
    }
}

impl FromStr for ValidationSeverity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(ValidationSeverity::Info),
            "warning" => Ok(ValidationSeverity::Warning),
            "error" => Ok(ValidationSeverity::Error),
            other => Err(anyhow::anyhow!(
                "Unknown severity '{}', expected one of: info, warning, error",
                other
            )),
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationSeverity::Info => "info",
            ValidationSeverity::Warning => "warning",
            ValidationSeverity::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Which kind of server the data is going to be uploaded to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Default)]
pub enum ServerKind {
    /// Warnings block an upload.
    Production,
    /// Warnings are reported but do not block an upload.
    #[default]
    Test,
}

impl ServerKind {
    pub fn is_production(self) -> bool {
        matches!(self, ServerKind::Production)
    }
}

impl From<bool> for ServerKind {
    fn from(value: bool) -> Self {
        if value {
            ServerKind::Production
        } else {
            ServerKind::Test
        }
    }
}

impl From<ServerKind> for bool {
    fn from(value: ServerKind) -> Self {
        value.is_production()
    }
}

/// Whether files referenced more than once are reported.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Default)]
pub enum DuplicateFileCheck {
    #[default]
    Report,
    Ignore,
}

impl DuplicateFileCheck {
    pub fn is_ignored(self) -> bool {
        matches!(self, DuplicateFileCheck::Ignore)
    }
}

impl From<bool> for DuplicateFileCheck {
    /// `true` means the user asked to ignore the duplicate file warning.
    fn from(value: bool) -> Self {
        if value {
            DuplicateFileCheck::Ignore
        } else {
            DuplicateFileCheck::Report
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_controls_visibility() {
        assert!(ValidationSeverity::Info.shows_warnings());
        assert!(ValidationSeverity::Info.shows_info());
        assert!(ValidationSeverity::Warning.shows_warnings());
        assert!(!ValidationSeverity::Warning.shows_info());
        assert!(!ValidationSeverity::Error.shows_warnings());
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!(
            "ERROR".parse::<ValidationSeverity>().unwrap(),
            ValidationSeverity::Error
        );
        assert!("loud".parse::<ValidationSeverity>().is_err());
    }

    #[test]
    fn server_kind_from_flag() {
        assert_eq!(ServerKind::from(true), ServerKind::Production);
        assert!(!bool::from(ServerKind::Test));
    }
}
