//! Mutation operators.
//!
//! An operator finds the regions of a tree it can rewrite and builds the
//! rewritten node. It never touches source text directly; the caller splices
//! the returned node into the module and renders it.

use crate::syntax::{NodeId, NodeKind, Position, Span, SyntaxTree};

/// A before/after pair showing what an operator does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    pub source: &'static str,
    pub mutated: &'static str,
}

pub trait Operator: Send + Sync {
    /// Name within the providing package, e.g. `xmt/function-return`.
    fn name(&self) -> &'static str;

    fn examples(&self) -> Vec<Example>;

    /// Regions of `node` this operator can mutate, one per variant.
    fn mutation_positions(&self, tree: &SyntaxTree, node: NodeId) -> Vec<Span>;

    /// Builds variant `index` of the mutation of `node` and returns the new
    /// node. `node` itself is left untouched.
    ///
    /// Panics if `node`/`index` is not something `mutation_positions` offered.
    fn mutate(&self, tree: &mut SyntaxTree, node: NodeId, index: usize) -> NodeId;
}

const DEFAULT_INDENT: usize = 4;

/// True if any leaf below `node` is the `yield` keyword.
///
/// Nested `def`s and lambdas are not treated as boundaries: a `yield` inside
/// an inner function marks the outer one as a generator too.
pub fn has_yield(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.children(node).iter().any(|&child| {
        tree.value(child) == Some("yield") || has_yield(tree, child)
    })
}

/// The body of a function: its last `Suite` child, with its child index.
pub fn function_body(tree: &SyntaxTree, function: NodeId) -> Option<(usize, NodeId)> {
    tree.children(function)
        .iter()
        .enumerate()
        .rev()
        .find(|&(_, &child)| tree.kind(child) == NodeKind::Suite)
        .map(|(index, &child)| (index, child))
}

/// Replaces a function body with `return None`, or with `pass` when the body
/// contains `yield`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionReturn;

impl FunctionReturn {
    pub const NAME: &'static str = "xmt/function-return";
}

impl Operator for FunctionReturn {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn examples(&self) -> Vec<Example> {
        vec![
            Example {
                source: "def foo():\n    return 1\n",
                mutated: "def foo():\n    return None\n",
            },
            Example {
                source: "def gen():\n    yield 1\n",
                mutated: "def gen():\n    pass\n",
            },
        ]
    }

    fn mutation_positions(&self, tree: &SyntaxTree, node: NodeId) -> Vec<Span> {
        if tree.kind(node) != NodeKind::Function {
            return vec![];
        }
        match function_body(tree, node) {
            Some((index, body)) if !is_inline_body(tree, node, index, body) => vec![tree.span(body)],
            _ => vec![],
        }
    }

    fn mutate(&self, tree: &mut SyntaxTree, node: NodeId, index: usize) -> NodeId {
        assert_eq!(
            tree.kind(node),
            NodeKind::Function,
            "{} can only mutate function definitions",
            Self::NAME
        );
        assert_eq!(index, 0, "{} has a single variant", Self::NAME);
        let Some((slot, body)) = function_body(tree, node) else {
            panic!("function definition without a body");
        };

        let indent = tree
            .first_leaf(body)
            .map_or(DEFAULT_INDENT, |leaf| tree.start_pos(leaf).column);
        let line = header_end_line(tree, node, slot).map_or(tree.start_pos(body).line, |l| l + 1);
        let at = Position::new(line, indent);

        let new_body = if has_yield(tree, body) {
            suite_empty(tree, at)
        } else {
            suite_with_return(tree, at, "None")
        };
        tree.with_child(node, slot, new_body)
    }
}

/// Line of the last token before the body (the header's `:`).
fn header_end_line(tree: &SyntaxTree, function: NodeId, slot: usize) -> Option<usize> {
    tree.children(function)[..slot]
        .iter()
        .rev()
        .find_map(|&child| tree.last_leaf(child))
        .map(|leaf| tree.end_pos(leaf).line)
}

/// `def f(): return 1`: the body shares the header's line.
fn is_inline_body(tree: &SyntaxTree, function: NodeId, slot: usize, body: NodeId) -> bool {
    match (tree.first_leaf(body), header_end_line(tree, function, slot)) {
        (Some(first), Some(header)) => tree.start_pos(first).line == header,
        _ => false,
    }
}

fn statement_prefix(at: Position) -> String {
    format!("\n{}", " ".repeat(at.column))
}

fn suite_with_return(tree: &mut SyntaxTree, at: Position, expr: &'static str) -> NodeId {
    let keyword = tree.new_leaf("return", statement_prefix(at), "return", at);
    let value_at = Position::new(at.line, at.column + "return ".len());
    let value = tree.new_leaf("none", " ", expr, value_at);
    let stmt = tree.new_node(NodeKind::ReturnStmt, "return_statement", vec![keyword, value], at);
    tree.new_node(NodeKind::Suite, "block", vec![stmt], at)
}

fn suite_empty(tree: &mut SyntaxTree, at: Position) -> NodeId {
    let keyword = tree.new_leaf("pass", statement_prefix(at), "pass", at);
    let stmt = tree.new_node(NodeKind::Other, "pass_statement", vec![keyword], at);
    tree.new_node(NodeKind::Suite, "block", vec![stmt], at)
}
