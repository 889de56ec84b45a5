//! Line coverage as written by coverage.py (`pytest --cov --cov-report=json`).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverageReport {
    files: BTreeMap<String, FileCoverage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileCoverage {
    #[serde(default)]
    executed_lines: BTreeSet<usize>,
}

impl CoverageReport {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_lines<'a>(files: impl IntoIterator<Item = (&'a str, Vec<usize>)>) -> Self {
        let files = files
            .into_iter()
            .map(|(module, lines)| {
                let coverage = FileCoverage {
                    executed_lines: lines.into_iter().collect(),
                };
                (module.to_string(), coverage)
            })
            .collect();
        CoverageReport { files }
    }

    /// Lines executed in `module`, or `None` if the module never ran.
    pub fn executed_lines(&self, module: &str) -> Option<&BTreeSet<usize>> {
        self.files.get(module).map(|f| &f.executed_lines)
    }

    /// True if some line in `start_line..=end_line` of `module` was executed.
    /// Modules missing from the report count as not executed at all.
    pub fn is_covered(&self, module: &str, start_line: usize, end_line: usize) -> bool {
        if start_line > end_line {
            return false;
        }
        self.executed_lines(module)
            .is_some_and(|lines| lines.range(start_line..=end_line).next().is_some())
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}
