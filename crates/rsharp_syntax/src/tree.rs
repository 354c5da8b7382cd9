//! The syntax tree: a node arena over a token vector.

use crate::node::{Ident, Node, NodeId, NodeKind};
use crate::token::{Comment, Directive, Token, TokenId};
use rsharp_core::arena::Arena;
use rsharp_core::text::{LineMap, SourcePosition, TextSpan};
use rsharp_diagnostics::Location;
use rustc_hash::FxHashMap;

/// A parsed source file.
///
/// Nodes are appended bottom-up while parsing; pushing a node links every
/// child's `parent` to it, so the topology is fixed once the production
/// that created a node returns.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub file_name: String,
    pub source: String,
    pub nodes: Arena<NodeId, Node>,
    pub tokens: Vec<Token>,
    pub root: NodeId,
    pub comments: Vec<Comment>,
    pub directives: Vec<Directive>,
    doc_comments: FxHashMap<NodeId, String>,
    line_map: LineMap,
}

impl SyntaxTree {
    pub fn new(file_name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_map = LineMap::new(&source);
        Self {
            file_name: file_name.into(),
            source,
            nodes: Arena::new(),
            tokens: Vec::new(),
            root: NodeId(0),
            comments: Vec::new(),
            directives: Vec::new(),
            doc_comments: FxHashMap::default(),
            line_map,
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Append a node covering tokens `start..=end` and adopt its children.
    pub fn alloc(&mut self, kind: NodeKind, start: TokenId, end: TokenId) -> NodeId {
        let children = kind.children();
        let id = self.nodes.alloc(Node {
            kind,
            parent: None,
            start,
            end,
        });
        for child in children {
            self.nodes[child].parent = Some(id);
        }
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn attach_doc_comment(&mut self, node: NodeId, text: String) {
        self.doc_comments.insert(node, text);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    #[inline]
    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.0 as usize]
    }

    /// The name an identifier denotes, or `""` for a missing identifier.
    pub fn ident_text(&self, ident: Ident) -> &str {
        ident.map(|t| self.token(t).value()).unwrap_or("")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id].kind.children()
    }

    /// Parents of `id`, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// `id` and everything below it, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            let mut children = self.children(n);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Byte span from the first token's start to the last token's end.
    pub fn span(&self, id: NodeId) -> TextSpan {
        let node = &self.nodes[id];
        let start = self.token(node.start).pos;
        let end = self.token(node.end).end.max(start);
        TextSpan::from_bounds(start, end)
    }

    /// Source text covered by a node.
    pub fn text(&self, id: NodeId) -> &str {
        self.source.get(self.span(id).to_range()).unwrap_or("")
    }

    pub fn position(&self, id: NodeId) -> SourcePosition {
        self.token(self.nodes[id].start).position()
    }

    /// Line/column of an arbitrary byte offset.
    pub fn position_of(&self, pos: u32) -> SourcePosition {
        self.line_map.position_of(pos)
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Diagnostic location of a node (its first token).
    pub fn location(&self, id: NodeId) -> Location {
        self.token_location(self.nodes[id].start)
    }

    pub fn token_location(&self, id: TokenId) -> Location {
        let token = self.token(id);
        Location::new(self.file_name.clone(), token.span(), token.position())
    }

    /// Location of a declaration's name, falling back to the node start.
    pub fn name_location(&self, id: NodeId) -> Location {
        match self.kind(id).declared_name() {
            Some(name) => self.token_location(name),
            None => self.location(id),
        }
    }

    /// The documentation comment attached to a declaration.
    pub fn doc_comment(&self, id: NodeId) -> Option<&str> {
        self.doc_comments.get(&id).map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every node whose children are not contained in its token range.
    pub fn check_spans(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(id, node)| {
                let span = self.span(*id);
                node.start > node.end
                    || self.children(*id).into_iter().any(|child| {
                        let child_span = self.span(child);
                        child_span.start < span.start || child_span.end() > span.end()
                    })
            })
            .map(|(id, _)| id)
            .collect()
    }

    // ========================================================================
    // Type text
    // ========================================================================

    /// Normalized display text of a type node: `A.B<int, T[]>`,
    /// `global::N.C`, `int?`, `char*`.
    pub fn type_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_type_text(id, &mut out);
        out
    }

    fn write_type_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::PredefinedType { keyword } => out.push_str(&self.token(*keyword).text),
            NodeKind::NamedType { alias, segments } => {
                if alias.is_some() {
                    out.push_str(self.ident_text(*alias));
                    out.push_str("::");
                }
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(self.ident_text(segment.name));
                    if !segment.type_arguments.is_empty() {
                        out.push('<');
                        for (j, arg) in segment.type_arguments.iter().enumerate() {
                            if j > 0 {
                                out.push_str(", ");
                            }
                            self.write_type_text(*arg, out);
                        }
                        out.push('>');
                    }
                }
            }
            NodeKind::NullableType { element } => {
                self.write_type_text(*element, out);
                out.push('?');
            }
            NodeKind::PointerType { element } => {
                self.write_type_text(*element, out);
                out.push('*');
            }
            NodeKind::ArrayType { element, ranks } => {
                self.write_type_text(*element, out);
                for rank in ranks {
                    out.push('[');
                    for _ in 1..*rank {
                        out.push(',');
                    }
                    out.push(']');
                }
            }
            NodeKind::ImplicitType => out.push_str("var"),
            _ => out.push('?'),
        }
    }

    /// Indented outline of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let span = self.span(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(node.kind.name());
        if let Some(name) = node.kind.declared_name() {
            out.push(' ');
            out.push_str(self.token(name).value());
        }
        out.push_str(&format!(" {}\n", span));
        for child in self.children(id) {
            self.dump_node(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TypeSegment;
    use crate::token_kind::TokenKind;

    fn tree_with_tokens(words: &[(&str, TokenKind)]) -> SyntaxTree {
        let source = words.iter().map(|(w, _)| *w).collect::<Vec<_>>().join(" ");
        let mut tree = SyntaxTree::new("test.cs", source);
        let mut pos = 0u32;
        for (word, kind) in words {
            let end = pos + word.len() as u32;
            tree.tokens.push(Token::new(*kind, pos, end, 1, pos + 1, word.to_string()));
            pos = end + 1;
        }
        tree
    }

    #[test]
    fn test_alloc_sets_parents() {
        let mut tree = tree_with_tokens(&[("int", TokenKind::IntKeyword), ("?", TokenKind::Question)]);
        let int = tree.alloc(NodeKind::PredefinedType { keyword: TokenId(0) }, TokenId(0), TokenId(0));
        let nullable = tree.alloc(NodeKind::NullableType { element: int }, TokenId(0), TokenId(1));
        assert_eq!(tree.parent(int), Some(nullable));
        assert_eq!(tree.ancestors(int).collect::<Vec<_>>(), vec![nullable]);
        assert_eq!(tree.text(nullable), "int ?");
        assert_eq!(tree.type_text(nullable), "int?");
        assert!(tree.check_spans().is_empty());
    }

    #[test]
    fn test_check_spans_reports_escaping_child() {
        let mut tree = tree_with_tokens(&[("a", TokenKind::Identifier), ("b", TokenKind::Identifier)]);
        let b = tree.alloc(
            NodeKind::NamedType {
                alias: None,
                segments: vec![TypeSegment { name: Some(TokenId(1)), type_arguments: vec![] }],
            },
            TokenId(1),
            TokenId(1),
        );
        let outer = tree.alloc(NodeKind::NullableType { element: b }, TokenId(0), TokenId(0));
        assert_eq!(tree.check_spans(), vec![outer]);
    }

    #[test]
    fn test_generic_type_text() {
        let mut tree = tree_with_tokens(&[
            ("Dictionary", TokenKind::Identifier),
            ("<", TokenKind::LessThan),
            ("string", TokenKind::StringKeyword),
            (",", TokenKind::Comma),
            ("T", TokenKind::Identifier),
            (">", TokenKind::GreaterThan),
        ]);
        let s = tree.alloc(NodeKind::PredefinedType { keyword: TokenId(2) }, TokenId(2), TokenId(2));
        let t = tree.alloc(
            NodeKind::NamedType {
                alias: None,
                segments: vec![TypeSegment { name: Some(TokenId(4)), type_arguments: vec![] }],
            },
            TokenId(4),
            TokenId(4),
        );
        let t_array = tree.alloc(NodeKind::ArrayType { element: t, ranks: vec![2] }, TokenId(4), TokenId(4));
        let dict = tree.alloc(
            NodeKind::NamedType {
                alias: None,
                segments: vec![TypeSegment { name: Some(TokenId(0)), type_arguments: vec![s, t_array] }],
            },
            TokenId(0),
            TokenId(5),
        );
        assert_eq!(tree.type_text(dict), "Dictionary<string, T[,]>");
        assert_eq!(tree.descendants(dict), vec![dict, s, t_array, t]);
    }
}
