//! Types, type-argument lists, and the scan-ahead recognizers built on the
//! type grammar.
//!
//! The `scan_*` methods walk the peek cursor: `pt` is the token under
//! examination and the cursor always sits just after it. They report
//! whether the input has the expected shape and leave `pt` on the first
//! token past it. No node is created while scanning.

use super::{Parser, MAX_RECURSION_DEPTH};
use crate::sets::{self, TokenSet};
use rsharp_diagnostics::messages;
use rsharp_syntax::{contextual, NodeId, NodeKind, TokenId, TokenKind, TypeSegment};

/// Where a type is parsed; decides how a trailing `?`, `*` or `[` is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TypeContext {
    /// Declarations and casts: every suffix belongs to the type.
    Declaration,
    /// After `is`/`as`: `?` is nullable only when no operand follows it.
    Expression,
    /// After `new` or `stackalloc`: stops before `[` so sizes can follow.
    Creation,
}

const GREATER_THAN: TokenSet = TokenSet::of(&[TokenKind::GreaterThan]);

/// Contextual query keywords; an identifier spelled like one of these
/// after `)` does not make the parentheses a cast.
const QUERY_KEYWORDS: &[&str] = &[
    contextual::WHERE,
    contextual::SELECT,
    contextual::ORDERBY,
    contextual::GROUP,
    contextual::JOIN,
    contextual::LET,
    contextual::INTO,
    contextual::ON,
    contextual::EQUALS,
    contextual::BY,
    contextual::ASCENDING,
    contextual::DESCENDING,
];

impl Parser {
    // ========================================================================
    // Parsing
    // ========================================================================

    pub(super) fn parse_type(&mut self, context: TypeContext) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let ty = self.parse_type_inner(context);
        self.leave();
        ty
    }

    fn parse_type_inner(&mut self, context: TypeContext) -> NodeId {
        let start = self.la;
        let kind = self.la_kind();
        let mut ty = if kind.is_predefined_type() || kind == TokenKind::VoidKeyword {
            self.get();
            self.finish(NodeKind::PredefinedType { keyword: self.t }, start)
        } else if kind == TokenKind::Identifier {
            self.parse_named_type()
        } else {
            self.syn_err(&messages::TYPE_EXPECTED, &[]);
            return self.error_node();
        };

        loop {
            match self.la_kind() {
                TokenKind::Question if self.is_nullable_suffix(context) => {
                    self.get();
                    ty = self.finish(NodeKind::NullableType { element: ty }, start);
                }
                TokenKind::Asterisk if context != TypeContext::Expression => {
                    self.get();
                    ty = self.finish(NodeKind::PointerType { element: ty }, start);
                }
                TokenKind::OpenBracket if context != TypeContext::Creation && self.rank_specifier_follows() => {
                    let ranks = self.parse_rank_specifiers();
                    ty = self.finish(NodeKind::ArrayType { element: ty, ranks }, start);
                }
                _ => break,
            }
        }
        ty
    }

    fn is_nullable_suffix(&mut self, context: TypeContext) -> bool {
        match context {
            TypeContext::Expression => !sets::EXPRESSION_START.contains(self.peek_kind(1)),
            _ => true,
        }
    }

    /// `[` followed by `]` or `,`.
    pub(super) fn rank_specifier_follows(&mut self) -> bool {
        self.at(TokenKind::OpenBracket) && matches!(self.peek_kind(1), TokenKind::CloseBracket | TokenKind::Comma)
    }

    /// `[]`, `[,]`, ... repeated; one rank per bracket pair.
    pub(super) fn parse_rank_specifiers(&mut self) -> Vec<u32> {
        let mut ranks = Vec::new();
        while self.rank_specifier_follows() {
            self.get();
            let mut rank = 1;
            while self.eat(TokenKind::Comma) {
                rank += 1;
            }
            self.expect(TokenKind::CloseBracket);
            ranks.push(rank);
        }
        ranks
    }

    /// `[alias::] Name [<args>] {. Name [<args>]}`
    pub(super) fn parse_named_type(&mut self) -> NodeId {
        let start = self.la;
        let mut alias = None;
        if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::ColonColon {
            alias = self.ident();
            self.get();
        }
        let mut segments = Vec::new();
        loop {
            let name = self.ident();
            let type_arguments = if self.at(TokenKind::LessThan) {
                self.parse_type_argument_list()
            } else {
                Vec::new()
            };
            segments.push(TypeSegment { name, type_arguments });
            if self.at(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Identifier {
                self.get();
            } else {
                break;
            }
        }
        self.finish(NodeKind::NamedType { alias, segments }, start)
    }

    /// `< type {, type} >`
    pub(super) fn parse_type_argument_list(&mut self) -> Vec<NodeId> {
        let mut arguments = Vec::new();
        self.expect(TokenKind::LessThan);
        loop {
            arguments.push(self.parse_type(TypeContext::Declaration));
            if !self.weak_separator(TokenKind::Comma, sets::TYPE_START, GREATER_THAN) {
                break;
            }
        }
        self.expect(TokenKind::GreaterThan);
        arguments
    }

    // ========================================================================
    // Scanning ahead
    // ========================================================================

    pub(super) fn scan_type(&mut self, pt: &mut TokenId) -> bool {
        self.scan_type_at_depth(pt, 0)
    }

    fn scan_type_at_depth(&mut self, pt: &mut TokenId, depth: u32) -> bool {
        let kind = self.kind(*pt);
        if kind.is_predefined_type() || kind == TokenKind::VoidKeyword {
            self.advance(pt);
        } else if kind == TokenKind::Identifier {
            self.advance(pt);
            if !self.scan_named_type_rest_at_depth(pt, depth) {
                return false;
            }
        } else {
            return false;
        }
        self.scan_type_suffixes(pt)
    }

    /// The rest of a named type whose first identifier is behind `pt`.
    pub(super) fn scan_named_type_rest(&mut self, pt: &mut TokenId) -> bool {
        self.scan_named_type_rest_at_depth(pt, 0)
    }

    fn scan_named_type_rest_at_depth(&mut self, pt: &mut TokenId, depth: u32) -> bool {
        if self.kind(*pt) == TokenKind::ColonColon {
            self.advance(pt);
            if self.kind(*pt) != TokenKind::Identifier {
                return false;
            }
            self.advance(pt);
        }
        if !self.scan_type_argument_list_at_depth(pt, depth) {
            return false;
        }
        while self.kind(*pt) == TokenKind::Dot {
            self.advance(pt);
            if self.kind(*pt) != TokenKind::Identifier {
                return false;
            }
            self.advance(pt);
            if !self.scan_type_argument_list_at_depth(pt, depth) {
                return false;
            }
        }
        true
    }

    /// `?`, `*` and rank specifiers. A `[` that does not open a rank
    /// specifier fails the scan.
    pub(super) fn scan_type_suffixes(&mut self, pt: &mut TokenId) -> bool {
        loop {
            match self.kind(*pt) {
                TokenKind::Question | TokenKind::Asterisk => self.advance(pt),
                TokenKind::OpenBracket => {
                    self.advance(pt);
                    while self.kind(*pt) == TokenKind::Comma {
                        self.advance(pt);
                    }
                    if self.kind(*pt) != TokenKind::CloseBracket {
                        return false;
                    }
                    self.advance(pt);
                }
                _ => return true,
            }
        }
    }

    /// An optional `< type {, type} >`; succeeds trivially without `<`.
    pub(super) fn scan_type_argument_list(&mut self, pt: &mut TokenId) -> bool {
        self.scan_type_argument_list_at_depth(pt, 0)
    }

    fn scan_type_argument_list_at_depth(&mut self, pt: &mut TokenId, depth: u32) -> bool {
        if self.kind(*pt) != TokenKind::LessThan {
            return true;
        }
        if depth >= MAX_RECURSION_DEPTH {
            return false;
        }
        self.advance(pt);
        loop {
            if !self.scan_type_at_depth(pt, depth + 1) {
                return false;
            }
            if self.kind(*pt) != TokenKind::Comma {
                break;
            }
            self.advance(pt);
        }
        if self.kind(*pt) != TokenKind::GreaterThan {
            return false;
        }
        self.advance(pt);
        true
    }

    // ========================================================================
    // Disambiguation
    // ========================================================================

    /// At `(`: a type, `)`, and then either a predefined type inside or an
    /// operand that cannot continue a parenthesized expression.
    pub(super) fn is_cast(&mut self) -> bool {
        let mut pt = self.start_scan();
        self.advance(&mut pt);
        let first = self.kind(pt);
        if !self.scan_type(&mut pt) || self.kind(pt) != TokenKind::CloseParen {
            return false;
        }
        self.advance(&mut pt);
        if first.is_predefined_type() {
            return true;
        }
        let after = self.token(pt);
        if after.kind == TokenKind::Identifier && QUERY_KEYWORDS.iter().any(|w| after.is_contextual(w)) {
            return false;
        }
        sets::CAST_FOLLOW.contains(after.kind)
    }

    /// At `<` after a name: a type-argument list closed by `>` and followed
    /// by a token that may follow a type in an expression.
    pub(super) fn is_generic_argument_list(&mut self) -> bool {
        let mut pt = self.start_scan();
        self.scan_type_argument_list(&mut pt) && sets::TYPE_ARGUMENT_FOLLOW.contains(self.kind(pt))
    }

    /// A lambda parameter list followed by `) =>`, opening `offset` tokens
    /// after the lookahead.
    pub(super) fn is_parenthesized_lambda(&mut self, offset: usize) -> bool {
        let mut pt = self.start_scan();
        for _ in 0..=offset {
            self.advance(&mut pt);
        }
        if self.kind(pt) == TokenKind::CloseParen {
            self.advance(&mut pt);
            return self.kind(pt) == TokenKind::EqualsGreaterThan;
        }
        loop {
            if matches!(
                self.kind(pt),
                TokenKind::RefKeyword | TokenKind::OutKeyword | TokenKind::InKeyword | TokenKind::ParamsKeyword
            ) {
                self.advance(&mut pt);
            }
            if self.kind(pt) == TokenKind::Identifier {
                self.advance(&mut pt);
                if !matches!(self.kind(pt), TokenKind::Comma | TokenKind::CloseParen) {
                    // The identifier began a parameter type.
                    if !self.scan_named_type_rest(&mut pt)
                        || !self.scan_type_suffixes(&mut pt)
                        || self.kind(pt) != TokenKind::Identifier
                    {
                        return false;
                    }
                    self.advance(&mut pt);
                }
            } else {
                if !self.scan_type(&mut pt) || self.kind(pt) != TokenKind::Identifier {
                    return false;
                }
                self.advance(&mut pt);
            }
            match self.kind(pt) {
                TokenKind::Comma => self.advance(&mut pt),
                TokenKind::CloseParen => {
                    self.advance(&mut pt);
                    return self.kind(pt) == TokenKind::EqualsGreaterThan;
                }
                _ => return false,
            }
        }
    }

    /// A type followed by an identifier starts a local declaration.
    pub(super) fn is_local_declaration(&mut self) -> bool {
        let mut pt = self.start_scan();
        self.scan_type(&mut pt) && self.kind(pt) == TokenKind::Identifier
    }

    /// At `from`: `from x in` or `from Type x`.
    pub(super) fn is_query_start(&mut self) -> bool {
        let mut pt = self.start_scan();
        self.advance(&mut pt);
        if self.kind(pt) == TokenKind::Identifier {
            self.advance(&mut pt);
            if self.kind(pt) == TokenKind::InKeyword {
                return true;
            }
        }
        let mut pt = self.start_scan();
        self.advance(&mut pt);
        self.scan_type(&mut pt) && self.kind(pt) == TokenKind::Identifier
    }
}
