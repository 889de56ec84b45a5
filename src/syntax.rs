//! Arena-backed syntax tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Nothing
//! is ever modified in place: substituting a child allocates a new node that
//! shares every other child with the original, so a parsed tree stays valid
//! while mutants are built on top of it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A source position. Lines are 1-based, columns are 0-based byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl From<(usize, usize)> for Position {
    fn from((line, column): (usize, usize)) -> Self {
        Position { line, column }
    }
}

impl From<Position> for (usize, usize) {
    fn from(pos: Position) -> Self {
        (pos.line, pos.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open region `[start, end)` of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "span start {start} after end {end}");
        Span { start, end }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A named `def` (sync or async). Lambdas are `Other`.
    Function,
    /// An indented statement block.
    Suite,
    ReturnStmt,
    YieldExpr,
    /// A token. Only leaves carry text.
    Leaf,
    Other,
}

#[derive(Debug, Clone)]
struct Token {
    prefix: String,
    value: String,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    grammar_kind: &'static str,
    children: Vec<NodeId>,
    span: Span,
    token: Option<Token>,
}

/// Marks an arena length to return to with [`SyntaxTree::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    tail: String,
}

impl SyntaxTree {
    /// An empty arena; [`SyntaxTree::set_root`] must be called once the
    /// module node has been allocated.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        SyntaxTree {
            nodes: Vec::with_capacity(capacity),
            root: NodeId(0),
            tail: String::new(),
        }
    }

    pub(crate) fn set_root(&mut self, root: NodeId, tail: String) {
        self.root = root;
        self.tail = tail;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.data(id).kind
    }

    /// The tree-sitter node kind this node was built from, e.g. `"block"`.
    pub fn grammar_kind(&self, id: NodeId) -> &'static str {
        self.data(id).grammar_kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.data(id).span
    }

    pub fn start_pos(&self, id: NodeId) -> Position {
        self.data(id).span.start
    }

    pub fn end_pos(&self, id: NodeId) -> Position {
        self.data(id).span.end
    }

    /// Literal text of a leaf; `None` for inner nodes.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.data(id).token.as_ref().map(|t| t.value.as_str())
    }

    /// Source text between the previous leaf and this one.
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.data(id).token.as_ref().map(|t| t.prefix.as_str())
    }

    /// Leaves below `id` in source order.
    pub fn leaves(&self, id: NodeId) -> Leaves<'_> {
        Leaves {
            tree: self,
            stack: vec![id],
        }
    }

    pub fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        self.leaves(id).next()
    }

    pub fn last_leaf(&self, id: NodeId) -> Option<NodeId> {
        let data = self.data(id);
        if data.token.is_some() {
            return Some(id);
        }
        data.children.iter().rev().find_map(|&child| self.last_leaf(child))
    }

    /// Leaf following `leaf` among the leaves of `within`.
    pub fn next_leaf(&self, within: NodeId, leaf: NodeId) -> Option<NodeId> {
        let mut leaves = self.leaves(within);
        leaves.find(|&l| l == leaf)?;
        leaves.next()
    }

    /// Nodes below `id` (inclusive) in pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    pub(crate) fn alloc_leaf(
        &mut self,
        grammar_kind: &'static str,
        prefix: impl Into<String>,
        value: impl Into<String>,
        span: Span,
    ) -> NodeId {
        self.push(NodeData {
            kind: NodeKind::Leaf,
            grammar_kind,
            children: Vec::new(),
            span,
            token: Some(Token {
                prefix: prefix.into(),
                value: value.into(),
            }),
        })
    }

    /// Allocates a single-line leaf starting at `start`.
    pub fn new_leaf(
        &mut self,
        grammar_kind: &'static str,
        prefix: impl Into<String>,
        value: impl Into<String>,
        start: Position,
    ) -> NodeId {
        let value = value.into();
        let end = Position::new(start.line, start.column + value.len());
        self.alloc_leaf(grammar_kind, prefix, value, Span::new(start, end))
    }

    /// Allocates an inner node. Its span runs from the first child's start to
    /// the last child's end, or is empty at `fallback` when there are none.
    pub fn new_node(
        &mut self,
        kind: NodeKind,
        grammar_kind: &'static str,
        children: Vec<NodeId>,
        fallback: Position,
    ) -> NodeId {
        let span = self.span_of_children(&children, Span::new(fallback, fallback));
        self.push(NodeData {
            kind,
            grammar_kind,
            children,
            span,
            token: None,
        })
    }

    pub(crate) fn alloc_node_with_span(
        &mut self,
        kind: NodeKind,
        grammar_kind: &'static str,
        children: Vec<NodeId>,
        span: Span,
    ) -> NodeId {
        self.push(NodeData {
            kind,
            grammar_kind,
            children,
            span,
            token: None,
        })
    }

    /// Span from the first leaf to the last leaf under `nodes`, if any.
    pub(crate) fn leaves_span(&self, nodes: &[NodeId]) -> Option<Span> {
        let first = nodes.iter().find_map(|&n| self.first_leaf(n))?;
        let last = nodes.iter().rev().find_map(|&n| self.last_leaf(n))?;
        Some(Span::new(self.start_pos(first), self.end_pos(last)))
    }

    fn span_of_children(&self, children: &[NodeId], fallback: Span) -> Span {
        match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => Span::new(self.start_pos(first), self.end_pos(last)),
            _ => fallback,
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    /// Copy of `node` with child `index` swapped for `child`. All other
    /// children are shared with `node`.
    pub fn with_child(&mut self, node: NodeId, index: usize, child: NodeId) -> NodeId {
        let mut data = self.data(node).clone();
        data.children[index] = child;
        data.span = self.span_of_children(&data.children, data.span);
        self.push(data)
    }

    /// Rebuilds the path from `root` down to `target`, with `target` replaced
    /// by `replacement`. Returns the new root, or `None` if `target` is not
    /// below `root`.
    pub fn replace_in(&mut self, root: NodeId, target: NodeId, replacement: NodeId) -> Option<NodeId> {
        let path = self.path_to(root, target)?;
        let mut current = replacement;
        for (parent, index) in path.into_iter().rev() {
            current = self.with_child(parent, index, current);
        }
        Some(current)
    }

    /// `(parent, child index)` steps leading from `root` to `target`.
    fn path_to(&self, root: NodeId, target: NodeId) -> Option<Vec<(NodeId, usize)>> {
        if root == target {
            return Some(Vec::new());
        }
        for (index, &child) in self.children(root).iter().enumerate() {
            if let Some(mut rest) = self.path_to(child, target) {
                rest.insert(0, (root, index));
                return Some(rest);
            }
        }
        None
    }

    /// Source text of `id`, including the prefix of its first leaf.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        for leaf in self.leaves(id) {
            if let Some(token) = &self.data(leaf).token {
                out.push_str(&token.prefix);
                out.push_str(&token.value);
            }
        }
        out
    }

    /// Source text of a whole module rooted at `root`, including whatever
    /// followed the last token of the parsed file.
    pub fn render_module(&self, root: NodeId) -> String {
        let mut out = self.render(root);
        out.push_str(&self.tail);
        out
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.nodes.len())
    }

    /// Drops every node allocated since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.nodes.truncate(checkpoint.0);
    }
}

pub struct Leaves<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Leaves<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let data = self.tree.data(id);
            if data.token.is_some() {
                return Some(id);
            }
            self.stack.extend(data.children.iter().rev());
        }
        None
    }
}

pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // x = 1
    fn assignment() -> SyntaxTree {
        let mut tree = SyntaxTree::with_capacity(8);
        let x = tree.new_leaf("identifier", "", "x", Position::new(1, 0));
        let eq = tree.new_leaf("=", " ", "=", Position::new(1, 2));
        let one = tree.new_leaf("integer", " ", "1", Position::new(1, 4));
        let assign = tree.new_node(NodeKind::Other, "assignment", vec![x, eq, one], Position::new(1, 0));
        let root = tree.new_node(NodeKind::Other, "module", vec![assign], Position::new(1, 0));
        tree.set_root(root, "\n".to_string());
        tree
    }

    #[test]
    fn renders_prefixes_and_tail() {
        let tree = assignment();
        assert_eq!(tree.render_module(tree.root()), "x = 1\n");
    }

    #[test]
    fn span_covers_children() {
        let tree = assignment();
        let span = tree.span(tree.root());
        assert_eq!(span.start, Position::new(1, 0));
        assert_eq!(span.end, Position::new(1, 5));
    }

    #[test]
    fn replace_in_leaves_original_intact() {
        let mut tree = assignment();
        let root = tree.root();
        let one = tree.last_leaf(root).unwrap();
        let two = tree.new_leaf("integer", " ", "2", Position::new(1, 4));
        let new_root = tree.replace_in(root, one, two).unwrap();

        assert_eq!(tree.render_module(new_root), "x = 2\n");
        assert_eq!(tree.render_module(root), "x = 1\n");
    }

    #[test]
    fn rollback_discards_new_nodes() {
        let mut tree = assignment();
        let cp = tree.checkpoint();
        let before = tree.len();
        tree.new_leaf("integer", "", "3", Position::new(1, 0));
        assert_eq!(tree.len(), before + 1);
        tree.rollback(cp);
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn next_leaf_walks_forward() {
        let tree = assignment();
        let root = tree.root();
        let x = tree.first_leaf(root).unwrap();
        let eq = tree.next_leaf(root, x).unwrap();
        assert_eq!(tree.value(eq), Some("="));
        let one = tree.next_leaf(root, eq).unwrap();
        assert_eq!(tree.next_leaf(root, one), None);
    }

    #[test]
    fn position_serializes_as_pair() {
        let json = serde_json::to_string(&Position::new(3, 4)).unwrap();
        assert_eq!(json, "[3,4]");
        let back: Position = serde_json::from_str("[7,0]").unwrap();
        assert_eq!(back, Position::new(7, 0));
    }
}
