//! Finds files that are referenced by more than one resource. Uploading the same file twice
//! is allowed but usually a mistake, so it is reported as a warning.

use std::collections::BTreeMap;

use log::debug;

use crate::data::ResourceDeserialised;
use crate::options::DuplicateFileCheck;
use crate::problems::{DuplicateFileWarning, InputProblem, ProblemType, Severity};
use crate::reformat::FILE_PROP_NAME;

/// One document level `FILE_DUPLICATE` warning per file path that occurs more than once.
pub fn check_for_duplicate_files(
    resources: &[ResourceDeserialised],
    check: DuplicateFileCheck,
) -> Option<DuplicateFileWarning> {
    if check.is_ignored() {
        debug!("Skipping the check for duplicate files");
        return None;
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in resources.iter().flat_map(|r| r.values.iter()) {
        if !value.knora_type.is_file_value() {
            continue;
        }
        if let Some(path) = value.user_facing_value.as_deref().filter(|p| !p.is_empty()) {
            *counts.entry(path).or_default() += 1;
        }
    }
    let problems: Vec<InputProblem> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(path, count)| {
            let mut problem =
                InputProblem::new(ProblemType::FileDuplicate, FILE_PROP_NAME, Severity::Warning);
            problem.input_value = Some(path.to_string());
            problem.message = Some(format!("value used {} times", count));
            problem
        })
        .collect();
    if problems.is_empty() {
        return None;
    }
    debug!("{} files are used more than once", problems.len());
    Some(DuplicateFileWarning { problems })
}
