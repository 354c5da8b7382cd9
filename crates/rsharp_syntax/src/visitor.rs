//! Syntax tree visitor.
//!
//! `SyntaxVisitor` has one method per node category. Every method defaults
//! to the matching `walk_*` function, which visits the node's children in
//! source order, so an implementor overrides only the categories it cares
//! about and calls the walker to keep descending.

use crate::node::{NodeCategory, NodeId};
use crate::tree::SyntaxTree;

pub trait SyntaxVisitor {
    fn visit_compilation_unit(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_compilation_unit(self, tree, node);
    }

    /// Namespace declarations, `using` directives and `extern alias`.
    fn visit_namespace(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_namespace(self, tree, node);
    }

    /// Classes, structs, interfaces, enums and delegates.
    fn visit_type_declaration(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_type_declaration(self, tree, node);
    }

    fn visit_member(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_member(self, tree, node);
    }

    fn visit_type(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_type(self, tree, node);
    }

    fn visit_statement(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_statement(self, tree, node);
    }

    fn visit_expression(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_expression(self, tree, node);
    }

    fn visit_query_clause(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_query_clause(self, tree, node);
    }

    /// Parameters, attributes, accessors, declarators, clauses and the
    /// other helper productions.
    fn visit_other(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_children(self, tree, node);
    }
}

/// Dispatch `node` to the visitor method for its category.
pub fn visit_node<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    match tree.kind(node).category() {
        NodeCategory::CompilationUnit => visitor.visit_compilation_unit(tree, node),
        NodeCategory::Namespace => visitor.visit_namespace(tree, node),
        NodeCategory::TypeDeclaration => visitor.visit_type_declaration(tree, node),
        NodeCategory::Member => visitor.visit_member(tree, node),
        NodeCategory::Type => visitor.visit_type(tree, node),
        NodeCategory::Statement => visitor.visit_statement(tree, node),
        NodeCategory::Expression => visitor.visit_expression(tree, node),
        NodeCategory::QueryClause => visitor.visit_query_clause(tree, node),
        NodeCategory::Other => visitor.visit_other(tree, node),
    }
}

/// Visit a whole tree from its root.
pub fn visit_tree<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree) {
    visit_node(visitor, tree, tree.root);
}

/// Visit every child of `node` in source order.
pub fn walk_children<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    for child in tree.children(node) {
        visit_node(visitor, tree, child);
    }
}

pub fn walk_compilation_unit<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

pub fn walk_namespace<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

pub fn walk_type_declaration<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

pub fn walk_member<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

pub fn walk_type<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

pub fn walk_statement<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

pub fn walk_expression<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

pub fn walk_query_clause<V: SyntaxVisitor + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    walk_children(visitor, tree, node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, TypeSegment};
    use crate::token::{Token, TokenId};
    use crate::token_kind::TokenKind;

    #[derive(Default)]
    struct Counter {
        types: usize,
        statements: usize,
        expressions: usize,
    }

    impl SyntaxVisitor for Counter {
        fn visit_type(&mut self, tree: &SyntaxTree, node: NodeId) {
            self.types += 1;
            walk_type(self, tree, node);
        }

        fn visit_statement(&mut self, tree: &SyntaxTree, node: NodeId) {
            self.statements += 1;
            walk_statement(self, tree, node);
        }

        fn visit_expression(&mut self, _tree: &SyntaxTree, _node: NodeId) {
            // Do not descend.
            self.expressions += 1;
        }
    }

    #[test]
    fn test_visitor_dispatch_by_category() {
        // { Foo x; x; }
        let mut tree = SyntaxTree::new("t.cs", "{ Foo x; x; }");
        for (i, (text, kind)) in [
            ("{", TokenKind::OpenBrace),
            ("Foo", TokenKind::Identifier),
            ("x", TokenKind::Identifier),
            (";", TokenKind::Semicolon),
            ("x", TokenKind::Identifier),
            (";", TokenKind::Semicolon),
            ("}", TokenKind::CloseBrace),
        ]
        .iter()
        .enumerate()
        {
            tree.tokens.push(Token::new(*kind, i as u32 * 2, i as u32 * 2 + 1, 1, 1, text.to_string()));
        }
        let foo = tree.alloc(
            NodeKind::NamedType {
                alias: None,
                segments: vec![TypeSegment { name: Some(TokenId(1)), type_arguments: vec![] }],
            },
            TokenId(1),
            TokenId(1),
        );
        let declarator = tree.alloc(
            NodeKind::VariableDeclarator { name: Some(TokenId(2)), initializer: None },
            TokenId(2),
            TokenId(2),
        );
        let local = tree.alloc(
            NodeKind::LocalDeclaration { constant: false, ty: foo, declarators: vec![declarator] },
            TokenId(1),
            TokenId(3),
        );
        let x = tree.alloc(NodeKind::SimpleName { name: Some(TokenId(4)), type_arguments: vec![] }, TokenId(4), TokenId(4));
        let stmt = tree.alloc(NodeKind::ExpressionStatement { expression: x }, TokenId(4), TokenId(5));
        let block = tree.alloc(NodeKind::Block { statements: vec![local, stmt] }, TokenId(0), TokenId(6));
        tree.set_root(block);

        let mut counter = Counter::default();
        visit_tree(&mut counter, &tree);
        assert_eq!(counter.types, 1);
        assert_eq!(counter.statements, 3);
        assert_eq!(counter.expressions, 1);
    }
}
