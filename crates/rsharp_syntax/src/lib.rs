//! rsharp_syntax: Concrete syntax tree definitions for the C# front-end.
//!
//! Defines token kinds and the keyword table, tokens and trivia, declaration
//! modifiers, the node arena with parent back-links, and the category-based
//! visitor used by every later stage.

pub mod modifiers;
pub mod node;
pub mod token;
pub mod token_kind;
pub mod tree;
pub mod visitor;

// Re-export key types
pub use modifiers::{ModifierList, Modifiers};
pub use node::*;
pub use token::{Comment, CommentKind, Directive, DirectiveKind, Token, TokenId};
pub use token_kind::{check_literal, contextual, TokenKind};
pub use tree::SyntaxTree;
pub use visitor::{visit_node, visit_tree, walk_children, SyntaxVisitor};
