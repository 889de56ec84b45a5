use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::syntax::{NodeId, Position, Span};

/// A region one operator can mutate, as found while walking a parsed module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationCandidate {
    pub operator_name: String,
    pub node: NodeId,
    pub span: Span,
    /// Ordinal of this candidate among all of the operator's candidates in
    /// the module.
    pub occurrence: usize,
    /// Variant index passed to `Operator::mutate` for `node`.
    pub index: usize,
}

/// A mutation as recorded in the work store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationDescriptor {
    pub operator_name: String,
    pub occurrence: usize,
    pub module_path: Utf8PathBuf,
    pub start_pos: Position,
    pub end_pos: Position,
}

impl MutationDescriptor {
    pub fn span(&self) -> Span {
        Span::new(self.start_pos, self.end_pos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub job_id: String,
    pub mutations: Vec<MutationDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerOutcome {
    Pending,
    Skipped,
    Normal,
    Exception,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    pub output: String,
    pub worker_outcome: WorkerOutcome,
}

/// One generated mutant of a module.
#[derive(Debug, Clone)]
pub struct Mutant {
    pub mutation: MutationDescriptor,
    pub outcome: MutantOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutantOutcome {
    Generated { source: String, diff: String },
    /// The operator panicked while building this mutant.
    Failed(String),
}
