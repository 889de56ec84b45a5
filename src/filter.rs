//! Coverage-based triage of pending mutation jobs.
//!
//! Jobs whose mutated region was never executed by the test suite cannot be
//! killed, so they are marked skipped before any tests run. Jobs using an
//! operator outside the supported family are skipped as well.

use std::fmt;
use std::path::Path;

use crate::coverage::CoverageReport;
use crate::error::Result;
use crate::mutants::{MutationDescriptor, WorkItem, WorkResult, WorkerOutcome};
use crate::registry::PROVIDER_NAME;
use crate::state::WorkStore;

pub const SKIP_OUTPUT: &str = "Filtered no covered.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedOperator,
    NotCovered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedOperator => f.write_str("unsupported operator"),
            SkipReason::NotCovered => f.write_str("region not exercised"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub job_id: String,
    pub reason: SkipReason,
    /// The first mutation of the job that failed a check.
    pub mutation: MutationDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub kept: Vec<String>,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Debug, Clone)]
pub struct CoverageFilter {
    operator_prefix: String,
}

impl Default for CoverageFilter {
    fn default() -> Self {
        CoverageFilter::new(format!("{PROVIDER_NAME}/"))
    }
}

impl CoverageFilter {
    /// `operator_prefix` selects the supported operator family, e.g. `cr_xmt/`.
    pub fn new(operator_prefix: impl Into<String>) -> Self {
        CoverageFilter {
            operator_prefix: operator_prefix.into(),
        }
    }

    pub fn operator_prefix(&self) -> &str {
        &self.operator_prefix
    }

    /// Checks the mutations of `item` in order and stops at the first one
    /// that fails. `None` means the job should run.
    pub fn check_item<'a>(
        &self,
        item: &'a WorkItem,
        coverage: &CoverageReport,
    ) -> Option<(SkipReason, &'a MutationDescriptor)> {
        for mutation in &item.mutations {
            if !mutation.operator_name.starts_with(&self.operator_prefix) {
                return Some((SkipReason::UnsupportedOperator, mutation));
            }
            let covered = coverage.is_covered(
                mutation.module_path.as_str(),
                mutation.start_pos.line,
                mutation.end_pos.line,
            );
            if !covered {
                return Some((SkipReason::NotCovered, mutation));
            }
        }
        None
    }

    pub fn classify(&self, items: &[WorkItem], coverage: &CoverageReport) -> FilterReport {
        let mut report = FilterReport::default();
        for item in items {
            match self.check_item(item, coverage) {
                Some((reason, mutation)) => {
                    log::info!(
                        "skipping {} ({}): {} {} {} {}..{}",
                        item.job_id,
                        reason,
                        mutation.operator_name,
                        mutation.occurrence,
                        mutation.module_path,
                        mutation.start_pos,
                        mutation.end_pos,
                    );
                    report.skipped.push(SkippedItem {
                        job_id: item.job_id.clone(),
                        reason,
                        mutation: mutation.clone(),
                    });
                }
                None => report.kept.push(item.job_id.clone()),
            }
        }
        report
    }

    /// Classifies every pending job, then records all skips in a single
    /// bulk write. Kept jobs are not touched.
    pub fn apply<S: WorkStore + ?Sized>(
        &self,
        store: &mut S,
        coverage: &CoverageReport,
    ) -> Result<FilterReport> {
        let pending = store.pending_work_items()?;
        let report = self.classify(&pending, coverage);

        if !report.skipped.is_empty() {
            let job_ids: Vec<String> = report.skipped.iter().map(|s| s.job_id.clone()).collect();
            store.set_multiple_results(
                &job_ids,
                &WorkResult {
                    output: SKIP_OUTPUT.to_string(),
                    worker_outcome: WorkerOutcome::Skipped,
                },
            )?;
        }
        log::info!(
            "coverage filter: {} kept, {} skipped of {} pending",
            report.kept.len(),
            report.skipped.len(),
            pending.len()
        );
        Ok(report)
    }

    /// Loads the coverage report at `coverage_path` and applies the filter.
    /// A report that cannot be loaded aborts before any job is examined.
    pub fn run<S: WorkStore + ?Sized>(&self, store: &mut S, coverage_path: &Path) -> Result<FilterReport> {
        let coverage = CoverageReport::load(coverage_path)?;
        self.apply(store, &coverage)
    }
}
