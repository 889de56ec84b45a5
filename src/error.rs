use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by discovery, application and the coverage filter.
///
/// Contract violations inside an operator (mutating a node the operator never
/// offered) are not represented here: they panic.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} is required")]
    MissingInput(&'static str),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load the Python grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("failed to parse Python source")]
    Parse,

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{operator}' has no occurrence {occurrence} in {module}")]
    OccurrenceNotFound {
        operator: String,
        occurrence: usize,
        module: String,
    },

    #[error("mutated node is not part of the module")]
    DetachedNode,
}

impl Error {
    /// True for errors caused by input that could not be found at all, as
    /// opposed to input that exists but could not be loaded.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::MissingInput(_) => true,
            Error::Read { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
