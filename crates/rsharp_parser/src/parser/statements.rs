//! Blocks and statements.

use super::types::TypeContext;
use super::Parser;
use crate::sets::{self, TokenSet};
use rsharp_diagnostics::messages;
use rsharp_syntax::{contextual, GotoTarget, Ident, NodeId, NodeKind, TokenId, TokenKind};

const DECLARATOR_FOLLOW: TokenSet = sets::SYNC.with(TokenKind::CloseParen);
const IDENTIFIER: TokenSet = TokenSet::of(&[TokenKind::Identifier]);
const CLOSE_PAREN: TokenSet = TokenSet::of(&[TokenKind::CloseParen]);

impl Parser {
    // ========================================================================
    // Blocks
    // ========================================================================

    pub(super) fn parse_block(&mut self) -> NodeId {
        let start = self.la;
        self.expect(TokenKind::OpenBrace);
        let statements = self.parse_statement_list(false);
        self.expect(TokenKind::CloseBrace);
        self.finish(NodeKind::Block { statements }, start)
    }

    /// Statements up to `}`. A token that only starts a member ends the
    /// list, so an unclosed body leaves its siblings to the type body.
    /// Switch sections also stop at the next label.
    fn parse_statement_list(&mut self, in_switch: bool) -> Vec<NodeId> {
        let mut statements = Vec::new();
        loop {
            let kind = self.la_kind();
            if kind == TokenKind::CloseBrace || kind == TokenKind::EndOfFile || sets::MEMBER_ONLY_START.contains(kind) {
                break;
            }
            if in_switch && self.at_switch_label() {
                break;
            }
            if sets::STATEMENT_START.contains(kind) {
                let before = self.la;
                statements.push(self.parse_statement());
                if self.la == before {
                    self.get();
                }
            } else {
                self.invalid_term();
                self.get();
            }
        }
        statements
    }

    fn at_switch_label(&mut self) -> bool {
        self.at(TokenKind::CaseKeyword) || (self.at(TokenKind::DefaultKeyword) && self.peek_kind(1) == TokenKind::Colon)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// A statement where declarations and labels are allowed.
    pub(super) fn parse_statement(&mut self) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let statement = if self.at_declaration_statement() {
            self.parse_declaration_statement()
        } else {
            self.parse_embedded_statement_inner()
        };
        self.leave();
        statement
    }

    /// The body of `if`, `while`, `for` and friends. A declaration there is
    /// reported and parsed anyway.
    pub(super) fn parse_embedded_statement(&mut self) -> NodeId {
        if self.at_declaration_statement() {
            self.report(self.la, &messages::EMBEDDED_STATEMENT_CANNOT_BE_DECLARATION, &[]);
        }
        self.parse_statement()
    }

    fn at_declaration_statement(&mut self) -> bool {
        match self.la_kind() {
            TokenKind::ConstKeyword => true,
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::Colon => true,
            kind if sets::TYPE_START.contains(kind) => self.starts_local_declaration(),
            _ => false,
        }
    }

    fn starts_local_declaration(&mut self) -> bool {
        if self.in_async && self.at_contextual(contextual::AWAIT) {
            return false;
        }
        self.is_local_declaration()
    }

    fn parse_declaration_statement(&mut self) -> NodeId {
        let start = self.la;
        if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Colon {
            let label = self.ident();
            self.get();
            let statement = self.parse_statement();
            return self.finish(NodeKind::LabeledStatement { label, statement }, start);
        }
        self.parse_local_declaration(true)
    }

    /// `[const] type declarators`, with the `;` when `terminated`.
    fn parse_local_declaration(&mut self, terminated: bool) -> NodeId {
        let start = self.la;
        let constant = self.eat(TokenKind::ConstKeyword);
        let ty = self.parse_local_type(constant);
        let declarators = self.parse_variable_declarators();
        if terminated {
            self.expect(TokenKind::Semicolon);
        }
        self.finish(
            NodeKind::LocalDeclaration {
                constant,
                ty,
                declarators,
            },
            start,
        )
    }

    /// `var` before a name is an implicit type; anything else is parsed as a
    /// type.
    fn parse_local_type(&mut self, constant: bool) -> NodeId {
        if !constant && self.at_contextual(contextual::VAR) && self.peek_kind(1) == TokenKind::Identifier {
            let start = self.la;
            self.get();
            return self.finish(NodeKind::ImplicitType, start);
        }
        self.parse_type(TypeContext::Declaration)
    }

    /// `name [= initializer] {, name [= initializer]}`
    pub(super) fn parse_variable_declarators(&mut self) -> Vec<NodeId> {
        let mut declarators = Vec::new();
        loop {
            let start = self.la;
            let name = self.ident();
            declarators.push(self.parse_variable_declarator_rest(start, name));
            if !self.weak_separator(TokenKind::Comma, IDENTIFIER, DECLARATOR_FOLLOW) {
                break;
            }
        }
        declarators
    }

    pub(super) fn parse_variable_declarator_rest(&mut self, start: TokenId, name: Ident) -> NodeId {
        let initializer = if self.eat(TokenKind::Equals) {
            Some(self.parse_variable_initializer())
        } else {
            None
        };
        self.finish(NodeKind::VariableDeclarator { name, initializer }, start)
    }

    fn parse_embedded_statement_inner(&mut self) -> NodeId {
        let start = self.la;
        match self.la_kind() {
            TokenKind::OpenBrace => self.parse_block(),
            TokenKind::Semicolon => {
                self.get();
                self.finish(NodeKind::EmptyStatement, start)
            }
            TokenKind::IfKeyword => self.parse_if_statement(),
            TokenKind::SwitchKeyword => self.parse_switch_statement(),
            TokenKind::WhileKeyword => {
                self.get();
                let condition = self.parse_parenthesized_condition();
                let body = self.parse_embedded_statement();
                self.finish(NodeKind::WhileStatement { condition, body }, start)
            }
            TokenKind::DoKeyword => {
                self.get();
                let body = self.parse_embedded_statement();
                self.expect(TokenKind::WhileKeyword);
                let condition = self.parse_parenthesized_condition();
                self.expect(TokenKind::Semicolon);
                self.finish(NodeKind::DoStatement { body, condition }, start)
            }
            TokenKind::ForKeyword => self.parse_for_statement(),
            TokenKind::ForeachKeyword => self.parse_foreach_statement(),
            TokenKind::BreakKeyword => {
                self.get();
                self.expect(TokenKind::Semicolon);
                self.finish(NodeKind::BreakStatement, start)
            }
            TokenKind::ContinueKeyword => {
                self.get();
                self.expect(TokenKind::Semicolon);
                self.finish(NodeKind::ContinueStatement, start)
            }
            TokenKind::GotoKeyword => self.parse_goto_statement(),
            TokenKind::ReturnKeyword => {
                self.get();
                let expression = self.parse_optional_expression();
                self.expect(TokenKind::Semicolon);
                self.finish(NodeKind::ReturnStatement { expression }, start)
            }
            TokenKind::ThrowKeyword => {
                self.get();
                let expression = self.parse_optional_expression();
                self.expect(TokenKind::Semicolon);
                self.finish(NodeKind::ThrowStatement { expression }, start)
            }
            TokenKind::TryKeyword => self.parse_try_statement(),
            kind @ (TokenKind::CheckedKeyword | TokenKind::UncheckedKeyword)
                if self.peek_kind(1) == TokenKind::OpenBrace =>
            {
                self.get();
                let block = self.parse_block();
                self.finish(
                    NodeKind::CheckedStatement {
                        checked: kind == TokenKind::CheckedKeyword,
                        block,
                    },
                    start,
                )
            }
            TokenKind::LockKeyword => {
                self.get();
                let expression = self.parse_parenthesized_condition();
                let body = self.parse_embedded_statement();
                self.finish(NodeKind::LockStatement { expression, body }, start)
            }
            TokenKind::UsingKeyword => self.parse_using_statement(),
            TokenKind::UnsafeKeyword => {
                self.get();
                let block = self.parse_block();
                self.finish(NodeKind::UnsafeStatement { block }, start)
            }
            TokenKind::FixedKeyword => self.parse_fixed_statement(),
            TokenKind::Identifier
                if self.at_contextual(contextual::YIELD)
                    && matches!(self.peek_kind(1), TokenKind::ReturnKeyword | TokenKind::BreakKeyword) =>
            {
                self.parse_yield_statement()
            }
            _ => {
                let expression = self.parse_expression();
                self.expect(TokenKind::Semicolon);
                self.finish(NodeKind::ExpressionStatement { expression }, start)
            }
        }
    }

    fn parse_optional_expression(&mut self) -> Option<NodeId> {
        if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression())
        }
    }

    /// `( expression )`
    fn parse_parenthesized_condition(&mut self) -> NodeId {
        self.expect(TokenKind::OpenParen);
        let expression = self.parse_expression();
        self.expect(TokenKind::CloseParen);
        expression
    }

    fn parse_if_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let condition = self.parse_parenthesized_condition();
        let then_branch = self.parse_embedded_statement();
        let else_branch = if self.eat(TokenKind::ElseKeyword) {
            Some(self.parse_embedded_statement())
        } else {
            None
        };
        self.finish(
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            },
            start,
        )
    }

    fn parse_switch_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let expression = self.parse_parenthesized_condition();
        let mut sections = Vec::new();
        if self.expect(TokenKind::OpenBrace) {
            while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
                if self.at_switch_label() {
                    sections.push(self.parse_switch_section());
                } else if self.at_set(sets::MEMBER_ONLY_START) {
                    break;
                } else {
                    self.syn_err(&messages::SYNTAX_ERROR_0_EXPECTED, &["case"]);
                    self.get();
                }
            }
            self.expect(TokenKind::CloseBrace);
        }
        self.finish(NodeKind::SwitchStatement { expression, sections }, start)
    }

    fn parse_switch_section(&mut self) -> NodeId {
        let start = self.la;
        let mut labels = Vec::new();
        while self.at_switch_label() {
            let label_start = self.la;
            let value = if self.eat(TokenKind::CaseKeyword) {
                Some(self.parse_expression())
            } else {
                self.get();
                None
            };
            self.expect(TokenKind::Colon);
            labels.push(self.finish(NodeKind::SwitchLabel { value }, label_start));
        }
        let statements = self.parse_statement_list(true);
        self.finish(NodeKind::SwitchSection { labels, statements }, start)
    }

    fn parse_for_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        self.expect(TokenKind::OpenParen);

        let mut initializers = Vec::new();
        if !self.at(TokenKind::Semicolon) {
            if self.at_set(sets::TYPE_START) && self.starts_local_declaration() {
                initializers.push(self.parse_local_declaration(false));
            } else {
                initializers = self.parse_statement_expression_list(TokenKind::Semicolon);
            }
        }
        self.expect(TokenKind::Semicolon);

        let condition = self.parse_optional_expression();
        self.expect(TokenKind::Semicolon);

        let iterators = if self.at(TokenKind::CloseParen) {
            Vec::new()
        } else {
            self.parse_statement_expression_list(TokenKind::CloseParen)
        };
        self.expect(TokenKind::CloseParen);

        let body = self.parse_embedded_statement();
        self.finish(
            NodeKind::ForStatement {
                initializers,
                condition,
                iterators,
                body,
            },
            start,
        )
    }

    fn parse_statement_expression_list(&mut self, terminator: TokenKind) -> Vec<NodeId> {
        let rep_fol = TokenSet::of(&[terminator]).union(CLOSE_PAREN);
        let mut expressions = Vec::new();
        loop {
            expressions.push(self.parse_expression());
            if !self.weak_separator(TokenKind::Comma, sets::EXPRESSION_START, rep_fol) {
                break;
            }
        }
        expressions
    }

    fn parse_foreach_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        self.expect(TokenKind::OpenParen);
        let ty = self.parse_local_type(false);
        let name = self.ident();
        self.expect(TokenKind::InKeyword);
        let expression = self.parse_expression();
        self.expect(TokenKind::CloseParen);
        let body = self.parse_embedded_statement();
        self.finish(
            NodeKind::ForeachStatement {
                ty,
                name,
                expression,
                body,
            },
            start,
        )
    }

    fn parse_goto_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let target = match self.la_kind() {
            TokenKind::CaseKeyword => {
                self.get();
                GotoTarget::Case(self.parse_expression())
            }
            TokenKind::DefaultKeyword => {
                self.get();
                GotoTarget::Default
            }
            _ => GotoTarget::Label(self.ident()),
        };
        self.expect(TokenKind::Semicolon);
        self.finish(NodeKind::GotoStatement { target }, start)
    }

    fn parse_try_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let block = self.parse_block();
        let mut catches = Vec::new();
        while self.at(TokenKind::CatchKeyword) {
            catches.push(self.parse_catch_clause());
        }
        let finally = if self.eat(TokenKind::FinallyKeyword) {
            Some(self.parse_block())
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            self.syn_err(&messages::SYNTAX_ERROR_0_EXPECTED, &["finally"]);
        }
        self.finish(
            NodeKind::TryStatement {
                block,
                catches,
                finally,
            },
            start,
        )
    }

    /// `catch [( type [name] )] [when ( filter )] block`
    fn parse_catch_clause(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let mut ty = None;
        let mut name = None;
        if self.eat(TokenKind::OpenParen) {
            ty = Some(self.parse_type(TypeContext::Declaration));
            if self.at(TokenKind::Identifier) {
                name = self.ident();
            }
            self.expect(TokenKind::CloseParen);
        }
        let filter = if self.at_contextual(contextual::WHEN) {
            self.get();
            Some(self.parse_parenthesized_condition())
        } else {
            None
        };
        let block = self.parse_block();
        self.finish(NodeKind::CatchClause { ty, name, filter, block }, start)
    }

    fn parse_using_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        self.expect(TokenKind::OpenParen);
        let resource = if self.at_set(sets::TYPE_START) && self.starts_local_declaration() {
            self.parse_local_declaration(false)
        } else {
            self.parse_expression()
        };
        self.expect(TokenKind::CloseParen);
        let body = self.parse_embedded_statement();
        self.finish(NodeKind::UsingStatement { resource, body }, start)
    }

    fn parse_fixed_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        self.expect(TokenKind::OpenParen);
        let ty = self.parse_type(TypeContext::Declaration);
        let declarators = self.parse_variable_declarators();
        self.expect(TokenKind::CloseParen);
        let body = self.parse_embedded_statement();
        self.finish(NodeKind::FixedStatement { ty, declarators, body }, start)
    }

    /// `yield return expr;` or `yield break;`
    fn parse_yield_statement(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let expression = if self.eat(TokenKind::ReturnKeyword) {
            Some(self.parse_expression())
        } else {
            self.get();
            None
        };
        self.expect(TokenKind::Semicolon);
        self.finish(NodeKind::YieldStatement { expression }, start)
    }
}
