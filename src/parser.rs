use tree_sitter::{Node, Parser};

use crate::error::{Error, Result};
use crate::syntax::{NodeId, NodeKind, Position, Span, SyntaxTree};

/// Parse Python source into an arena tree.
///
/// Syntax errors do not fail the parse: tree-sitter recovers and the damaged
/// region ends up in `ERROR` nodes, which no operator targets.
pub fn parse(source: &str) -> Result<SyntaxTree> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser.set_language(&language.into())?;

    let ts_tree = parser.parse(source, None).ok_or(Error::Parse)?;
    let root = ts_tree.root_node();
    if root.has_error() {
        log::warn!("source contains syntax errors; affected regions will not be mutated");
    }

    let mut builder = Builder {
        source,
        cursor: 0,
        tree: SyntaxTree::with_capacity(source.len() / 2),
    };
    let root_id = builder.convert(root);
    let tail = source.get(builder.cursor..).unwrap_or_default().to_string();
    let mut tree = builder.tree;
    tree.set_root(root_id, tail);
    Ok(tree)
}

struct Builder<'s> {
    source: &'s str,
    /// Byte offset just past the last leaf emitted so far.
    cursor: usize,
    tree: SyntaxTree,
}

impl Builder<'_> {
    fn convert(&mut self, node: Node) -> NodeId {
        // Strings are single tokens; their inner pieces are never separate leaves.
        if node.child_count() == 0 || node.kind() == "string" {
            return self.leaf(node);
        }

        let mut children = Vec::new();
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                children.push(self.convert(child));
            }
        }

        let span = self.tree.leaves_span(&children).unwrap_or_else(|| {
            Span::new(position(node.start_position()), position(node.end_position()))
        });
        self.tree
            .alloc_node_with_span(classify(node), node.kind(), children, span)
    }

    fn leaf(&mut self, node: Node) -> NodeId {
        let start = node.start_byte().max(self.cursor);
        let end = node.end_byte().max(start);
        let prefix = self.source.get(self.cursor..start).unwrap_or_default();
        let value = self.source.get(start..end).unwrap_or_default();
        self.cursor = end;

        let span = Span::new(position(node.start_position()), position(node.end_position()));
        self.tree.alloc_leaf(node.kind(), prefix, value, span)
    }
}

fn classify(node: Node) -> NodeKind {
    match node.kind() {
        "function_definition" => NodeKind::Function,
        "block" => NodeKind::Suite,
        "return_statement" => NodeKind::ReturnStmt,
        "yield" if node.is_named() => NodeKind::YieldExpr,
        _ => NodeKind::Other,
    }
}

fn position(point: tree_sitter::Point) -> Position {
    Position::new(point.row + 1, point.column)
}
