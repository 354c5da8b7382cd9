//! Expressions: assignment, conditional, binary operators by precedence
//! climbing, unary operators and casts, primaries and their postfix
//! chains, lambdas, object and array creation.

use super::types::TypeContext;
use super::Parser;
use crate::precedence::{binary_operator_from_token, get_binary_operator_precedence, OperatorPrecedence};
use crate::sets::{self, TokenSet};
use rsharp_syntax::{
    contextual, ArgumentModifier, AssignmentOperator, BinaryOperator, InitializerKind, NodeId, NodeKind, Parameter,
    ParameterModifier, TokenId, TokenKind, TypeTestOperator,
};

const CLOSE_BRACE: TokenSet = TokenSet::of(&[TokenKind::CloseBrace]);
const CLOSE_PAREN: TokenSet = TokenSet::of(&[TokenKind::CloseParen]);
const CLOSE_BRACKET: TokenSet = TokenSet::of(&[TokenKind::CloseBracket]);
const INITIALIZER_START: TokenSet = sets::EXPRESSION_START.with(TokenKind::OpenBrace);
const LAMBDA_PARAMETER_START: TokenSet = sets::PARAMETER_START
    .without(TokenKind::ThisKeyword)
    .without(TokenKind::OpenBracket);

impl Parser {
    // ========================================================================
    // Assignment and conditional
    // ========================================================================

    pub(super) fn parse_expression(&mut self) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let start = self.la;
        let left = self.parse_conditional_expression();
        let expression = match self.assignment_operator() {
            Some((operator, width)) => {
                for _ in 0..width {
                    self.get();
                }
                let right = self.parse_expression();
                self.finish(NodeKind::Assignment { operator, left, right }, start)
            }
            None => left,
        };
        self.leave();
        expression
    }

    /// The assignment operator at the lookahead and its token count. `>>=`
    /// is scanned as `>` followed by `>=`.
    fn assignment_operator(&mut self) -> Option<(AssignmentOperator, usize)> {
        let kind = self.la_kind();
        if let Some(operator) = AssignmentOperator::from_token(kind) {
            return Some((operator, 1));
        }
        if kind == TokenKind::GreaterThan && self.joined_with_next(TokenKind::GreaterThanEquals) {
            return Some((AssignmentOperator::RightShift, 2));
        }
        None
    }

    /// Whether the token after the lookahead is `kind` with no space between.
    fn joined_with_next(&mut self, kind: TokenKind) -> bool {
        let next = self.peek_at(1);
        self.kind(next) == kind && self.token(self.la).touches(self.token(next))
    }

    fn parse_conditional_expression(&mut self) -> NodeId {
        let start = self.la;
        let condition = self.parse_binary_expression(OperatorPrecedence::Conditional);
        if !self.eat(TokenKind::Question) {
            return condition;
        }
        let when_true = self.parse_expression();
        self.expect(TokenKind::Colon);
        let when_false = self.parse_expression();
        self.finish(
            NodeKind::Conditional {
                condition,
                when_true,
                when_false,
            },
            start,
        )
    }

    // ========================================================================
    // Binary operators
    // ========================================================================

    fn parse_binary_expression(&mut self, min_precedence: OperatorPrecedence) -> NodeId {
        let start = self.la;
        let mut left = self.parse_unary_expression();

        loop {
            if matches!(self.la_kind(), TokenKind::IsKeyword | TokenKind::AsKeyword) {
                if OperatorPrecedence::Relational <= min_precedence {
                    break;
                }
                let operator = if self.at(TokenKind::IsKeyword) {
                    TypeTestOperator::Is
                } else {
                    TypeTestOperator::As
                };
                self.get();
                let ty = self.parse_type(TypeContext::Expression);
                left = self.finish(
                    NodeKind::TypeTest {
                        operator,
                        expression: left,
                        ty,
                    },
                    start,
                );
                continue;
            }

            let Some((operator, width)) = self.binary_operator() else {
                break;
            };
            let precedence = get_binary_operator_precedence(operator);
            if precedence <= min_precedence {
                break;
            }
            for _ in 0..width {
                self.get();
            }
            // `??` is right-associative.
            let right = if operator == BinaryOperator::Coalesce {
                self.parse_nested_binary(OperatorPrecedence::Conditional)
            } else {
                self.parse_binary_expression(precedence)
            };
            left = self.finish(NodeKind::Binary { operator, left, right }, start);
        }

        left
    }

    fn parse_nested_binary(&mut self, min_precedence: OperatorPrecedence) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let expression = self.parse_binary_expression(min_precedence);
        self.leave();
        expression
    }

    /// The binary operator at the lookahead and its token count. Two
    /// touching `>` make a right shift; `>` touching `>=` is left to the
    /// assignment.
    fn binary_operator(&mut self) -> Option<(BinaryOperator, usize)> {
        let kind = self.la_kind();
        if kind == TokenKind::GreaterThan {
            if self.joined_with_next(TokenKind::GreaterThan) {
                return Some((BinaryOperator::RightShift, 2));
            }
            if self.joined_with_next(TokenKind::GreaterThanEquals) {
                return None;
            }
        }
        binary_operator_from_token(kind).map(|operator| (operator, 1))
    }

    // ========================================================================
    // Unary
    // ========================================================================

    fn parse_unary_expression(&mut self) -> NodeId {
        let start = self.la;
        let kind = self.la_kind();
        if sets::UNARY_OPERATOR.contains(kind) {
            self.get();
            let operand = self.parse_nested_unary();
            return self.finish(NodeKind::PrefixUnary { operator: kind, operand }, start);
        }
        if kind == TokenKind::OpenParen && self.is_cast() {
            return self.parse_cast_expression();
        }
        if self.in_async && self.at_contextual(contextual::AWAIT) {
            self.get();
            let expression = self.parse_nested_unary();
            return self.finish(NodeKind::Await { expression }, start);
        }
        self.parse_primary_expression()
    }

    fn parse_nested_unary(&mut self) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let operand = self.parse_unary_expression();
        self.leave();
        operand
    }

    fn parse_cast_expression(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let ty = self.parse_type(TypeContext::Declaration);
        self.expect(TokenKind::CloseParen);
        let expression = self.parse_nested_unary();
        self.finish(NodeKind::Cast { ty, expression }, start)
    }

    // ========================================================================
    // Primary
    // ========================================================================

    fn parse_primary_expression(&mut self) -> NodeId {
        let start = self.la;
        let mut expression = self.parse_primary_start();
        loop {
            match self.la_kind() {
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = self.at(TokenKind::Arrow);
                    self.get();
                    let name = self.ident();
                    let type_arguments = self.parse_optional_type_arguments();
                    expression = self.finish(
                        NodeKind::MemberAccess {
                            expression,
                            arrow,
                            name,
                            type_arguments,
                        },
                        start,
                    );
                }
                TokenKind::OpenParen => {
                    let arguments = self.parse_argument_list(TokenKind::CloseParen);
                    expression = self.finish(NodeKind::Invocation { expression, arguments }, start);
                }
                TokenKind::OpenBracket => {
                    let arguments = self.parse_argument_list(TokenKind::CloseBracket);
                    expression = self.finish(NodeKind::ElementAccess { expression, arguments }, start);
                }
                kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                    self.get();
                    expression = self.finish(
                        NodeKind::PostfixUnary {
                            operator: kind,
                            operand: expression,
                        },
                        start,
                    );
                }
                _ => break,
            }
        }
        expression
    }

    fn parse_primary_start(&mut self) -> NodeId {
        let start = self.la;
        match self.la_kind() {
            kind if sets::LITERAL.contains(kind) => {
                self.get();
                self.finish(NodeKind::Literal { token: self.t }, start)
            }
            TokenKind::Identifier => self.parse_identifier_expression(),
            kind if kind.is_predefined_type() => {
                // `int.MaxValue`, `string.Empty`
                self.get();
                self.finish(NodeKind::PredefinedType { keyword: self.t }, start)
            }
            TokenKind::OpenParen if self.is_parenthesized_lambda(0) => self.parse_parenthesized_lambda(start, false),
            TokenKind::OpenParen => {
                self.get();
                let expression = self.parse_expression();
                self.expect(TokenKind::CloseParen);
                self.finish(NodeKind::Parenthesized { expression }, start)
            }
            TokenKind::ThisKeyword => {
                self.get();
                self.finish(NodeKind::This, start)
            }
            TokenKind::BaseKeyword => {
                self.get();
                self.finish(NodeKind::Base, start)
            }
            TokenKind::NewKeyword => self.parse_new_expression(),
            TokenKind::TypeofKeyword => {
                let ty = self.parse_parenthesized_type();
                self.finish(NodeKind::TypeOf { ty }, start)
            }
            TokenKind::SizeofKeyword => {
                let ty = self.parse_parenthesized_type();
                self.finish(NodeKind::SizeOf { ty }, start)
            }
            TokenKind::DefaultKeyword if self.peek_kind(1) == TokenKind::OpenParen => {
                let ty = self.parse_parenthesized_type();
                self.finish(NodeKind::DefaultValue { ty }, start)
            }
            TokenKind::DefaultKeyword => {
                self.get();
                self.finish(NodeKind::Literal { token: self.t }, start)
            }
            kind @ (TokenKind::CheckedKeyword | TokenKind::UncheckedKeyword) => {
                self.get();
                self.expect(TokenKind::OpenParen);
                let expression = self.parse_expression();
                self.expect(TokenKind::CloseParen);
                self.finish(
                    NodeKind::CheckedExpression {
                        checked: kind == TokenKind::CheckedKeyword,
                        expression,
                    },
                    start,
                )
            }
            TokenKind::DelegateKeyword => self.parse_anonymous_method(start, false),
            TokenKind::StackallocKeyword => {
                self.get();
                let ty = self.parse_type(TypeContext::Creation);
                self.expect(TokenKind::OpenBracket);
                let size = self.parse_expression();
                self.expect(TokenKind::CloseBracket);
                self.finish(NodeKind::StackAlloc { ty, size }, start)
            }
            _ => {
                self.invalid_term();
                self.error_node()
            }
        }
    }

    /// `keyword ( type )` for `typeof`, `sizeof` and `default`.
    fn parse_parenthesized_type(&mut self) -> NodeId {
        self.get();
        self.expect(TokenKind::OpenParen);
        let ty = self.parse_type(TypeContext::Declaration);
        self.expect(TokenKind::CloseParen);
        ty
    }

    fn parse_identifier_expression(&mut self) -> NodeId {
        let start = self.la;
        if self.peek_kind(1) == TokenKind::EqualsGreaterThan {
            return self.parse_simple_lambda(start, false);
        }
        if self.at_contextual(contextual::ASYNC) {
            match self.peek_kind(1) {
                TokenKind::Identifier if self.peek_kind(2) == TokenKind::EqualsGreaterThan => {
                    self.get();
                    return self.parse_simple_lambda(start, true);
                }
                TokenKind::OpenParen if self.is_parenthesized_lambda(1) => {
                    self.get();
                    return self.parse_parenthesized_lambda(start, true);
                }
                TokenKind::DelegateKeyword => {
                    self.get();
                    return self.parse_anonymous_method(start, true);
                }
                _ => {}
            }
        }
        if self.at_contextual(contextual::FROM) && self.is_query_start() {
            return self.parse_query_expression();
        }
        if self.peek_kind(1) == TokenKind::ColonColon {
            let alias = self.ident();
            self.get();
            let name = self.ident();
            let type_arguments = self.parse_optional_type_arguments();
            return self.finish(
                NodeKind::QualifiedAliasMember {
                    alias,
                    name,
                    type_arguments,
                },
                start,
            );
        }
        let name = self.ident();
        let type_arguments = self.parse_optional_type_arguments();
        self.finish(NodeKind::SimpleName { name, type_arguments }, start)
    }

    fn parse_optional_type_arguments(&mut self) -> Vec<NodeId> {
        if self.at(TokenKind::LessThan) && self.is_generic_argument_list() {
            self.parse_type_argument_list()
        } else {
            Vec::new()
        }
    }

    /// `( args )` or `[ args ]`; the lookahead is the opening token.
    fn parse_argument_list(&mut self, close: TokenKind) -> Vec<NodeId> {
        self.get();
        let mut arguments = Vec::new();
        if !self.at(close) {
            let rep_fol = if close == TokenKind::CloseParen { CLOSE_PAREN } else { CLOSE_BRACKET };
            loop {
                arguments.push(self.parse_argument());
                if !self.weak_separator(TokenKind::Comma, sets::ARGUMENT_START, rep_fol) {
                    break;
                }
            }
        }
        self.expect(close);
        arguments
    }

    /// `[name:] [ref|out|in] expression`
    pub(super) fn parse_argument(&mut self) -> NodeId {
        let start = self.la;
        let mut name = None;
        if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Colon {
            name = self.ident();
            self.get();
        }
        let modifier = match self.la_kind() {
            TokenKind::RefKeyword => ArgumentModifier::Ref,
            TokenKind::OutKeyword => ArgumentModifier::Out,
            TokenKind::InKeyword => ArgumentModifier::In,
            _ => ArgumentModifier::None,
        };
        if modifier != ArgumentModifier::None {
            self.get();
        }
        let expression = self.parse_expression();
        self.finish(
            NodeKind::Argument {
                name,
                modifier,
                expression,
            },
            start,
        )
    }

    // ========================================================================
    // Lambdas and anonymous methods
    // ========================================================================

    /// `x => body`; the lookahead is the parameter.
    fn parse_simple_lambda(&mut self, start: TokenId, asynchronous: bool) -> NodeId {
        let parameter_start = self.la;
        let name = self.ident();
        let parameter = self.finish(
            NodeKind::Parameter(Parameter {
                attributes: Vec::new(),
                modifier: ParameterModifier::None,
                ty: None,
                name,
                default_value: None,
            }),
            parameter_start,
        );
        self.expect(TokenKind::EqualsGreaterThan);
        let body = self.parse_lambda_body(asynchronous);
        self.finish(
            NodeKind::Lambda {
                asynchronous,
                parameters: vec![parameter],
                body,
            },
            start,
        )
    }

    /// `(a, b) => body` or `(int a, ref T b) => body`.
    fn parse_parenthesized_lambda(&mut self, start: TokenId, asynchronous: bool) -> NodeId {
        self.expect(TokenKind::OpenParen);
        let mut parameters = Vec::new();
        if !self.at(TokenKind::CloseParen) {
            loop {
                parameters.push(self.parse_lambda_parameter());
                if !self.weak_separator(TokenKind::Comma, LAMBDA_PARAMETER_START, CLOSE_PAREN) {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParen);
        self.expect(TokenKind::EqualsGreaterThan);
        let body = self.parse_lambda_body(asynchronous);
        self.finish(
            NodeKind::Lambda {
                asynchronous,
                parameters,
                body,
            },
            start,
        )
    }

    fn parse_lambda_parameter(&mut self) -> NodeId {
        let start = self.la;
        let modifier = self.parse_parameter_modifier();
        let implicit =
            self.at(TokenKind::Identifier) && matches!(self.peek_kind(1), TokenKind::Comma | TokenKind::CloseParen);
        let ty = if implicit {
            None
        } else {
            Some(self.parse_type(TypeContext::Declaration))
        };
        let name = self.ident();
        self.finish(
            NodeKind::Parameter(Parameter {
                attributes: Vec::new(),
                modifier,
                ty,
                name,
                default_value: None,
            }),
            start,
        )
    }

    fn parse_lambda_body(&mut self, asynchronous: bool) -> NodeId {
        let outer = std::mem::replace(&mut self.in_async, asynchronous);
        let body = if self.at(TokenKind::OpenBrace) {
            self.parse_block()
        } else {
            self.parse_expression()
        };
        self.in_async = outer;
        body
    }

    /// `delegate [( parameters )] block`; the lookahead is `delegate`.
    fn parse_anonymous_method(&mut self, start: TokenId, asynchronous: bool) -> NodeId {
        self.get();
        let parameters = if self.at(TokenKind::OpenParen) {
            self.parse_formal_parameter_list(TokenKind::OpenParen, TokenKind::CloseParen)
        } else {
            Vec::new()
        };
        let outer = std::mem::replace(&mut self.in_async, asynchronous);
        let body = self.parse_block();
        self.in_async = outer;
        self.finish(
            NodeKind::AnonymousMethod {
                asynchronous,
                parameters,
                body,
            },
            start,
        )
    }

    // ========================================================================
    // Object and array creation
    // ========================================================================

    fn parse_new_expression(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        match self.la_kind() {
            TokenKind::OpenBrace => self.parse_anonymous_object(start),
            TokenKind::OpenBracket => {
                // `new[] { ... }`
                let ranks = self.parse_rank_specifiers();
                if ranks.is_empty() {
                    self.expected(TokenKind::CloseBracket);
                }
                let initializer = Some(self.parse_array_initializer());
                self.finish(
                    NodeKind::ArrayCreation {
                        element: None,
                        sizes: Vec::new(),
                        ranks,
                        initializer,
                    },
                    start,
                )
            }
            _ => {
                let ty = self.parse_type(TypeContext::Creation);
                if self.at(TokenKind::OpenBracket) {
                    self.parse_array_creation(start, ty)
                } else {
                    self.parse_object_creation(start, ty)
                }
            }
        }
    }

    fn parse_array_creation(&mut self, start: TokenId, element: NodeId) -> NodeId {
        let mut sizes = Vec::new();
        let mut ranks = Vec::new();
        if !self.rank_specifier_follows() {
            self.get();
            loop {
                sizes.push(self.parse_expression());
                if !self.weak_separator(TokenKind::Comma, sets::EXPRESSION_START, CLOSE_BRACKET) {
                    break;
                }
            }
            self.expect(TokenKind::CloseBracket);
            ranks.push(sizes.len() as u32);
        }
        ranks.extend(self.parse_rank_specifiers());
        let initializer = if self.at(TokenKind::OpenBrace) {
            Some(self.parse_array_initializer())
        } else {
            None
        };
        if sizes.is_empty() && initializer.is_none() {
            self.expected(TokenKind::OpenBrace);
        }
        self.finish(
            NodeKind::ArrayCreation {
                element: Some(element),
                sizes,
                ranks,
                initializer,
            },
            start,
        )
    }

    fn parse_object_creation(&mut self, start: TokenId, ty: NodeId) -> NodeId {
        let has_arguments = self.at(TokenKind::OpenParen);
        let arguments = if has_arguments {
            self.parse_argument_list(TokenKind::CloseParen)
        } else {
            Vec::new()
        };
        let initializer = if self.at(TokenKind::OpenBrace) {
            Some(self.parse_object_or_collection_initializer())
        } else {
            None
        };
        if !has_arguments && initializer.is_none() {
            self.expected(TokenKind::OpenParen);
        }
        self.finish(
            NodeKind::ObjectCreation {
                ty,
                arguments,
                initializer,
            },
            start,
        )
    }

    /// `new { A = 1, b.C }`
    fn parse_anonymous_object(&mut self, start: TokenId) -> NodeId {
        self.get();
        let members = self.parse_initializer_elements(Self::parse_anonymous_member);
        self.expect(TokenKind::CloseBrace);
        self.finish(NodeKind::AnonymousObjectCreation { members }, start)
    }

    fn parse_anonymous_member(&mut self) -> NodeId {
        let start = self.la;
        let mut name = None;
        if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Equals {
            name = self.ident();
            self.get();
        }
        let expression = self.parse_expression();
        self.finish(NodeKind::AnonymousMember { name, expression }, start)
    }

    /// A field or local initializer: an expression or `{ ... }`.
    pub(super) fn parse_variable_initializer(&mut self) -> NodeId {
        if self.at(TokenKind::OpenBrace) {
            self.parse_array_initializer()
        } else {
            self.parse_expression()
        }
    }

    pub(super) fn parse_array_initializer(&mut self) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let start = self.la;
        self.expect(TokenKind::OpenBrace);
        let elements = self.parse_initializer_elements(Self::parse_variable_initializer);
        self.expect(TokenKind::CloseBrace);
        self.leave();
        self.finish(
            NodeKind::Initializer {
                kind: InitializerKind::Array,
                elements,
            },
            start,
        )
    }

    /// `{ A = 1, B = { ... } }` or `{ 1, { k, v } }` after `new T`.
    fn parse_object_or_collection_initializer(&mut self) -> NodeId {
        if !self.enter() {
            return self.error_node();
        }
        let start = self.la;
        self.expect(TokenKind::OpenBrace);
        let object = self.at(TokenKind::CloseBrace)
            || (self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Equals);
        let elements = if object {
            self.parse_initializer_elements(Self::parse_member_initializer)
        } else {
            self.parse_initializer_elements(Self::parse_collection_element)
        };
        self.expect(TokenKind::CloseBrace);
        self.leave();
        let kind = if object {
            InitializerKind::Object
        } else {
            InitializerKind::Collection
        };
        self.finish(NodeKind::Initializer { kind, elements }, start)
    }

    fn parse_member_initializer(&mut self) -> NodeId {
        let start = self.la;
        let name = self.ident();
        self.expect(TokenKind::Equals);
        let value = if self.at(TokenKind::OpenBrace) {
            self.parse_object_or_collection_initializer()
        } else {
            self.parse_expression()
        };
        self.finish(NodeKind::MemberInitializer { name, value }, start)
    }

    fn parse_collection_element(&mut self) -> NodeId {
        if !self.at(TokenKind::OpenBrace) {
            return self.parse_expression();
        }
        if !self.enter() {
            return self.error_node();
        }
        let start = self.la;
        self.get();
        let elements = self.parse_initializer_elements(Self::parse_expression);
        self.expect(TokenKind::CloseBrace);
        self.leave();
        self.finish(
            NodeKind::Initializer {
                kind: InitializerKind::Collection,
                elements,
            },
            start,
        )
    }

    /// Comma-separated elements up to `}`; a trailing comma is allowed.
    fn parse_initializer_elements(&mut self, element: fn(&mut Self) -> NodeId) -> Vec<NodeId> {
        let mut elements = Vec::new();
        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
            let before = self.la;
            elements.push(element(self));
            if !self.weak_separator(TokenKind::Comma, INITIALIZER_START, CLOSE_BRACE) || self.la == before {
                break;
            }
        }
        elements
    }
}
