//! Query expressions.
//!
//! The clause keywords are contextual: they are identifiers everywhere
//! else, so each clause is recognized by spelling on an identifier token.

use super::types::TypeContext;
use super::Parser;
use rsharp_diagnostics::messages;
use rsharp_syntax::{contextual, NodeId, NodeKind, OrderDirection, TokenKind};

impl Parser {
    /// `from_clause query_body`; the lookahead is `from`.
    pub(super) fn parse_query_expression(&mut self) -> NodeId {
        let start = self.la;
        let from = self.parse_from_clause();
        let body = self.parse_query_body();
        self.finish(NodeKind::Query { from, body }, start)
    }

    /// `from [type] name in expression`
    fn parse_from_clause(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let ty = self.parse_range_variable_type();
        let name = self.ident();
        self.expect(TokenKind::InKeyword);
        let expression = self.parse_expression();
        self.finish(NodeKind::FromClause { ty, name, expression }, start)
    }

    /// The optional explicit type of a range variable in `from` or `join`.
    fn parse_range_variable_type(&mut self) -> Option<NodeId> {
        if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::InKeyword {
            None
        } else {
            Some(self.parse_type(TypeContext::Declaration))
        }
    }

    fn parse_query_body(&mut self) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let start = self.la;
        let mut clauses = Vec::new();
        loop {
            let clause = if self.at_contextual(contextual::FROM) {
                self.parse_from_clause()
            } else if self.at_contextual(contextual::LET) {
                self.parse_let_clause()
            } else if self.at_contextual(contextual::WHERE) {
                let clause_start = self.la;
                self.get();
                let condition = self.parse_expression();
                self.finish(NodeKind::WhereClause { condition }, clause_start)
            } else if self.at_contextual(contextual::JOIN) {
                self.parse_join_clause()
            } else if self.at_contextual(contextual::ORDERBY) {
                self.parse_orderby_clause()
            } else {
                break;
            };
            clauses.push(clause);
        }

        let result = self.parse_select_or_group();

        let continuation = if self.at_contextual(contextual::INTO) {
            let continuation_start = self.la;
            self.get();
            let name = self.ident();
            let body = self.parse_query_body();
            Some(self.finish(NodeKind::QueryContinuation { name, body }, continuation_start))
        } else {
            None
        };
        self.leave();
        self.finish(
            NodeKind::QueryBody {
                clauses,
                result,
                continuation,
            },
            start,
        )
    }

    /// `let name = expression`
    fn parse_let_clause(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let name = self.ident();
        self.expect(TokenKind::Equals);
        let expression = self.parse_expression();
        self.finish(NodeKind::LetClause { name, expression }, start)
    }

    /// `join [type] name in source on left equals right [into name]`
    fn parse_join_clause(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let ty = self.parse_range_variable_type();
        let name = self.ident();
        self.expect(TokenKind::InKeyword);
        let source = self.parse_expression();
        self.expect_contextual(contextual::ON);
        let left = self.parse_expression();
        self.expect_contextual(contextual::EQUALS);
        let right = self.parse_expression();
        let into = if self.at_contextual(contextual::INTO) {
            self.get();
            self.ident()
        } else {
            None
        };
        self.finish(
            NodeKind::JoinClause {
                ty,
                name,
                source,
                left,
                right,
                into,
            },
            start,
        )
    }

    /// `orderby expression [ascending|descending] {, ...}`
    fn parse_orderby_clause(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let mut orderings = Vec::new();
        loop {
            let ordering_start = self.la;
            let expression = self.parse_expression();
            let direction = if self.at_contextual(contextual::ASCENDING) {
                self.get();
                OrderDirection::Ascending
            } else if self.at_contextual(contextual::DESCENDING) {
                self.get();
                OrderDirection::Descending
            } else {
                OrderDirection::Unspecified
            };
            orderings.push(self.finish(NodeKind::Ordering { expression, direction }, ordering_start));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.finish(NodeKind::OrderByClause { orderings }, start)
    }

    /// `select expression` or `group element by key`. A body without
    /// either gets an error node in their place.
    fn parse_select_or_group(&mut self) -> NodeId {
        let start = self.la;
        if self.at_contextual(contextual::SELECT) {
            self.get();
            let expression = self.parse_expression();
            return self.finish(NodeKind::SelectClause { expression }, start);
        }
        if self.at_contextual(contextual::GROUP) {
            self.get();
            let element = self.parse_expression();
            self.expect_contextual(contextual::BY);
            let key = self.parse_expression();
            return self.finish(NodeKind::GroupClause { element, key }, start);
        }
        self.syn_err(&messages::QUERY_BODY_MUST_END_WITH_SELECT_OR_GROUP, &[]);
        self.error_node()
    }

    /// Consume a contextual keyword or report it missing.
    fn expect_contextual(&mut self, word: &str) {
        if self.at_contextual(word) {
            self.get();
        } else {
            self.syn_err(&messages::SYNTAX_ERROR_0_EXPECTED, &[word]);
        }
    }
}
