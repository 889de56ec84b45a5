use std::panic::{self, AssertUnwindSafe};

use camino::Utf8Path;

use crate::error::{Error, Result};
use crate::mutants::{Mutant, MutantOutcome, MutationCandidate, MutationDescriptor, WorkItem};
use crate::parser;
use crate::registry::OperatorRegistry;
use crate::syntax::{Span, SyntaxTree};

/// Every candidate of every registered operator, grouped by operator and in
/// document order within each operator.
pub fn discover_candidates(tree: &SyntaxTree, registry: &OperatorRegistry) -> Vec<MutationCandidate> {
    let mut candidates = Vec::new();
    for (name, op) in registry.iter() {
        let mut occurrence = 0;
        for node in tree.descendants(tree.root()) {
            for (index, span) in op.mutation_positions(tree, node).into_iter().enumerate() {
                candidates.push(MutationCandidate {
                    operator_name: name.to_string(),
                    node,
                    span,
                    occurrence,
                    index,
                });
                occurrence += 1;
            }
        }
        log::debug!("{name}: {occurrence} candidates");
    }
    candidates
}

pub fn discover_mutations(
    source: &str,
    module_path: &Utf8Path,
    registry: &OperatorRegistry,
) -> Result<Vec<MutationDescriptor>> {
    let tree = parser::parse(source)?;
    Ok(discover_candidates(&tree, registry)
        .into_iter()
        .map(|c| describe(&c, module_path))
        .collect())
}

fn describe(candidate: &MutationCandidate, module_path: &Utf8Path) -> MutationDescriptor {
    MutationDescriptor {
        operator_name: candidate.operator_name.clone(),
        occurrence: candidate.occurrence,
        module_path: module_path.to_path_buf(),
        start_pos: candidate.span.start,
        end_pos: candidate.span.end,
    }
}

/// Source of `source` with the mutation described by `mutation` applied.
pub fn apply_mutation(
    source: &str,
    mutation: &MutationDescriptor,
    registry: &OperatorRegistry,
) -> Result<String> {
    let (mutated, span) = apply_occurrence(
        source,
        &mutation.operator_name,
        mutation.occurrence,
        &mutation.module_path,
        registry,
    )?;
    if span != mutation.span() {
        log::warn!(
            "{} occurrence {} now spans {}, recorded as {}; was {} edited?",
            mutation.operator_name,
            mutation.occurrence,
            span,
            mutation.span(),
            mutation.module_path,
        );
    }
    Ok(mutated)
}

/// Applies occurrence `occurrence` of `operator_name` and returns the mutated
/// source together with the span that was replaced.
pub fn apply_occurrence(
    source: &str,
    operator_name: &str,
    occurrence: usize,
    module_path: &Utf8Path,
    registry: &OperatorRegistry,
) -> Result<(String, Span)> {
    let op = registry
        .get(operator_name)
        .ok_or_else(|| Error::UnknownOperator(operator_name.to_string()))?;
    let mut tree = parser::parse(source)?;
    let candidate = discover_candidates(&tree, registry)
        .into_iter()
        .find(|c| c.operator_name == operator_name && c.occurrence == occurrence)
        .ok_or_else(|| Error::OccurrenceNotFound {
            operator: operator_name.to_string(),
            occurrence,
            module: module_path.to_string(),
        })?;

    let root = tree.root();
    let mutated = op.mutate(&mut tree, candidate.node, candidate.index);
    let new_root = tree
        .replace_in(root, candidate.node, mutated)
        .ok_or(Error::DetachedNode)?;
    Ok((tree.render_module(new_root), candidate.span))
}

/// Builds every mutant of a module. A candidate whose operator panics is
/// reported as failed; the remaining candidates are still generated.
pub fn generate_mutants(
    source: &str,
    module_path: &Utf8Path,
    registry: &OperatorRegistry,
) -> Result<Vec<Mutant>> {
    let mut tree = parser::parse(source)?;
    let root = tree.root();
    let candidates = discover_candidates(&tree, registry);

    let mut mutants = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let Some(op) = registry.get(&candidate.operator_name) else {
            continue;
        };
        let checkpoint = tree.checkpoint();
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            let mutated = op.mutate(&mut tree, candidate.node, candidate.index);
            tree.replace_in(root, candidate.node, mutated)
                .map(|new_root| tree.render_module(new_root))
        }));
        tree.rollback(checkpoint);

        let outcome = match rendered {
            Ok(Some(mutated)) => MutantOutcome::Generated {
                diff: generate_diff(source, &mutated),
                source: mutated,
            },
            Ok(None) => MutantOutcome::Failed(Error::DetachedNode.to_string()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!(
                    "{} occurrence {} in {}: {}",
                    candidate.operator_name,
                    candidate.occurrence,
                    module_path,
                    message
                );
                MutantOutcome::Failed(message)
            }
        };
        mutants.push(Mutant {
            mutation: describe(candidate, module_path),
            outcome,
        });
    }
    Ok(mutants)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operator panicked".to_string()
    }
}

/// One pending job per mutation.
pub fn init_work_items(mutations: Vec<MutationDescriptor>) -> Vec<WorkItem> {
    mutations
        .into_iter()
        .map(|mutation| WorkItem {
            job_id: generate_job_id(),
            mutations: vec![mutation],
        })
        .collect()
}

fn generate_job_id() -> String {
    format!("{:016x}{:016x}", fastrand::u64(..), fastrand::u64(..))
}

pub fn generate_diff(original: &str, mutated: &str) -> String {
    use similar::TextDiff;
    let diff = TextDiff::from_lines(original, mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                output.push_str(&format!("- {}", change));
            }
            similar::ChangeTag::Insert => {
                output.push_str(&format!("+ {}", change));
            }
            _ => {}
        }
    }
    output
}
