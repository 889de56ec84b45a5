use std::path::Path;

use xmt_mutator::Error;
use xmt_mutator::operators::{Example, FunctionReturn, Operator};
use xmt_mutator::registry::{self, OperatorRegistry, Provider};
use xmt_mutator::syntax::{NodeId, Span, SyntaxTree};

#[test]
fn detect_python() {
    assert!(xmt_mutator::is_python_source(Path::new("src/target.py")));
}

#[test]
fn detect_non_python() {
    assert!(!xmt_mutator::is_python_source(Path::new("foo.rs")));
    assert!(!xmt_mutator::is_python_source(Path::new("foo.pyc")));
    assert!(!xmt_mutator::is_python_source(Path::new("foo")));
}

#[test]
fn builtin_registry_holds_function_return() {
    let registry = OperatorRegistry::builtin();
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names, ["cr_xmt/xmt/function-return"]);

    let op = registry.get("cr_xmt/xmt/function-return").unwrap();
    assert_eq!(op.name(), FunctionReturn::NAME);
}

#[test]
fn lookup_of_unregistered_name_fails() {
    let registry = OperatorRegistry::builtin();
    assert!(registry.get("xmt/function-return").is_none());
    assert!(registry.get("core/NumberReplacer").is_none());
}

struct Noop;

impl Operator for Noop {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn examples(&self) -> Vec<Example> {
        vec![]
    }

    fn mutation_positions(&self, _tree: &SyntaxTree, _node: NodeId) -> Vec<Span> {
        vec![]
    }

    fn mutate(&self, _tree: &mut SyntaxTree, node: NodeId, _index: usize) -> NodeId {
        node
    }
}

#[test]
fn registry_qualifies_names_per_provider() {
    let registry = OperatorRegistry::new([
        Provider::xmt(),
        Provider::new("extra", vec![Box::new(Noop)]),
    ]);
    assert_eq!(registry.len(), 2);
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names, ["cr_xmt/xmt/function-return", "extra/noop"]);
    assert_eq!(registry::qualified_name("extra", "noop"), "extra/noop");
}

#[test]
fn every_provider_contributes_its_operators() {
    let providers = [Provider::xmt(), Provider::new("extra", vec![Box::new(Noop), Box::new(FunctionReturn)])];
    assert_eq!(providers[0].name(), "cr_xmt");
    assert_eq!(providers[1].name(), "extra");

    let registry = OperatorRegistry::new(providers);
    let names: Vec<_> = registry.names().collect();
    assert_eq!(
        names,
        ["cr_xmt/xmt/function-return", "extra/noop", "extra/xmt/function-return"]
    );
}

#[test]
fn duplicate_registration_keeps_one_entry() {
    let registry = OperatorRegistry::new([Provider::xmt(), Provider::xmt()]);
    assert_eq!(registry.len(), 1);
    assert!(registry.get("cr_xmt/xmt/function-return").is_some());
}

#[test]
fn missing_input_counts_as_not_found() {
    let err = Error::MissingInput("coverage_json");
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "coverage_json is required");
}

#[test]
fn detached_node_is_not_reported_as_parse_failure() {
    let err = Error::DetachedNode;
    assert!(!err.is_not_found());
    assert_eq!(err.to_string(), "mutated node is not part of the module");
    assert_ne!(err.to_string(), Error::Parse.to_string());
}
