//! Compilation units, namespaces, type declarations and their members.

use super::types::TypeContext;
use super::Parser;
use crate::sets::{self, TokenSet};
use rsharp_core::arena::ArenaIndex;
use rsharp_diagnostics::messages;
use rsharp_syntax::{
    contextual, Accessor, AccessorKind, ArgumentModifier, CompilationUnit, ConstraintKind, ConstructorDeclaration, ConversionKind,
    DelegateDeclaration, DestructorDeclaration, EnumDeclaration, EventDeclaration, FieldDeclaration, Ident,
    IndexerDeclaration, MethodDeclaration, ModifierList, Modifiers, NamespaceDeclaration, NodeId, NodeKind,
    OperatorDeclaration, Parameter, ParameterModifier, PropertyDeclaration, TokenId, TokenKind, TypeDeclaration,
    TypeDeclarationKind, TypeSegment, Variance,
};

const CLOSE_BRACKET: TokenSet = TokenSet::of(&[TokenKind::CloseBracket]);
const CLOSE_PAREN: TokenSet = TokenSet::of(&[TokenKind::CloseParen]);
const GREATER_THAN: TokenSet = TokenSet::of(&[TokenKind::GreaterThan]);
const MEMBER_FOLLOW: TokenSet = sets::MEMBER_START.with(TokenKind::CloseBrace);
const ATTRIBUTE_START: TokenSet = TokenSet::of(&[TokenKind::Identifier]);
const TYPE_PARAMETER_START: TokenSet = TokenSet::of(&[
    TokenKind::Identifier,
    TokenKind::OpenBracket,
    TokenKind::InKeyword,
    TokenKind::OutKeyword,
]);

/// What precedes a member's name: attributes, modifiers and the first
/// token, which carries the doc comment.
struct MemberHeader {
    start: TokenId,
    attributes: Vec<NodeId>,
    modifiers: ModifierList,
}

/// A member name with an optional explicit interface qualifier, e.g.
/// `IEnumerable<T>.GetEnumerator` or `IList.this`.
struct MemberName {
    explicit_interface: Option<NodeId>,
    name: Ident,
    type_parameters: Vec<NodeId>,
    /// The qualifier ended in `this`: an explicitly implemented indexer.
    indexer: bool,
}

impl Parser {
    // ========================================================================
    // Compilation unit and namespaces
    // ========================================================================

    pub(super) fn parse_compilation_unit(&mut self) -> NodeId {
        let mut unit = CompilationUnit::default();
        self.parse_externs_and_usings(&mut unit.externs, &mut unit.usings);
        while self.at_global_attribute() {
            unit.attributes.push(self.parse_attribute_section());
        }
        self.parse_namespace_members(&mut unit.usings, &mut unit.members, true);
        let eof = self.la;
        self.tree
            .alloc(NodeKind::CompilationUnit(unit), TokenId::from_usize(0), eof)
    }

    fn parse_externs_and_usings(&mut self, externs: &mut Vec<NodeId>, usings: &mut Vec<NodeId>) {
        while self.at_extern_alias() {
            externs.push(self.parse_extern_alias());
        }
        while self.at(TokenKind::UsingKeyword) {
            usings.push(self.parse_using_directive());
        }
    }

    fn at_extern_alias(&mut self) -> bool {
        if !self.at(TokenKind::ExternKeyword) {
            return false;
        }
        let next = self.peek_at(1);
        self.token(next).is_contextual(contextual::ALIAS)
    }

    /// `[assembly: ...]` or `[module: ...]`.
    fn at_global_attribute(&mut self) -> bool {
        if !self.at(TokenKind::OpenBracket) {
            return false;
        }
        let target = self.peek_at(1);
        let global = {
            let token = self.token(target);
            token.is_contextual(contextual::ASSEMBLY) || token.is_contextual(contextual::MODULE)
        };
        global && self.peek_kind(2) == TokenKind::Colon
    }

    /// Namespace and type declarations up to `}` (or end of file at the top
    /// level). A `using` here is misplaced but still recorded.
    fn parse_namespace_members(&mut self, usings: &mut Vec<NodeId>, members: &mut Vec<NodeId>, top_level: bool) {
        loop {
            let before = self.la;
            match self.la_kind() {
                TokenKind::EndOfFile => break,
                TokenKind::CloseBrace if !top_level => break,
                TokenKind::UsingKeyword => {
                    self.report(self.la, &messages::USING_MUST_PRECEDE_OTHER_ELEMENTS, &[]);
                    usings.push(self.parse_using_directive());
                }
                TokenKind::NamespaceKeyword => members.push(self.parse_namespace_declaration()),
                kind if sets::NAMESPACE_MEMBER_START.contains(kind) => {
                    if let Some(member) = self.parse_type_member(true) {
                        members.push(member);
                    }
                }
                _ => self.syn_err(&messages::NAMESPACE_MEMBER_EXPECTED, &[]),
            }
            if self.la == before {
                self.get();
            }
        }
    }

    fn parse_namespace_declaration(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let mut name = Vec::new();
        loop {
            if let Some(part) = self.ident() {
                name.push(part);
            }
            if !self.eat(TokenKind::Dot) {
                break;
            }
        }
        let mut externs = Vec::new();
        let mut usings = Vec::new();
        let mut members = Vec::new();
        if self.expect(TokenKind::OpenBrace) {
            self.parse_externs_and_usings(&mut externs, &mut usings);
            self.parse_namespace_members(&mut usings, &mut members, false);
            self.expect(TokenKind::CloseBrace);
        }
        self.eat(TokenKind::Semicolon);
        self.finish(
            NodeKind::NamespaceDeclaration(NamespaceDeclaration {
                name,
                externs,
                usings,
                members,
            }),
            start,
        )
    }

    /// `extern alias name;`
    fn parse_extern_alias(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        self.get();
        let name = self.ident();
        self.expect(TokenKind::Semicolon);
        self.finish(NodeKind::ExternAlias { name }, start)
    }

    /// `using A.B;` or `using X = A.B<C>;`
    fn parse_using_directive(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let kind = if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Equals {
            let alias = self.ident();
            self.get();
            let target = self.parse_named_type();
            NodeKind::UsingAlias { alias, target }
        } else {
            NodeKind::UsingNamespace {
                name: self.parse_named_type(),
            }
        };
        self.expect(TokenKind::Semicolon);
        self.finish(kind, start)
    }

    // ========================================================================
    // Attributes and modifiers
    // ========================================================================

    fn parse_attribute_sections(&mut self) -> Vec<NodeId> {
        let mut sections = Vec::new();
        while self.at(TokenKind::OpenBracket) {
            sections.push(self.parse_attribute_section());
        }
        sections
    }

    /// `[ [target:] attribute {, attribute} [,] ]`
    fn parse_attribute_section(&mut self) -> NodeId {
        let start = self.la;
        self.get();
        let mut target = None;
        if (self.at(TokenKind::Identifier) || self.la_kind().is_keyword()) && self.peek_kind(1) == TokenKind::Colon {
            self.get();
            target = Some(self.t);
            self.get();
        }
        let mut attributes = Vec::new();
        while !self.at(TokenKind::CloseBracket) {
            attributes.push(self.parse_attribute());
            if !self.weak_separator(TokenKind::Comma, ATTRIBUTE_START, CLOSE_BRACKET) {
                break;
            }
        }
        self.expect(TokenKind::CloseBracket);
        self.finish(NodeKind::AttributeSection { target, attributes }, start)
    }

    fn parse_attribute(&mut self) -> NodeId {
        let start = self.la;
        let name = self.parse_named_type();
        let mut arguments = Vec::new();
        if self.eat(TokenKind::OpenParen) {
            while !self.at(TokenKind::CloseParen) {
                arguments.push(self.parse_attribute_argument());
                if !self.weak_separator(TokenKind::Comma, sets::EXPRESSION_START, CLOSE_PAREN) {
                    break;
                }
            }
            self.expect(TokenKind::CloseParen);
        }
        self.finish(NodeKind::Attribute { name, arguments }, start)
    }

    /// A positional argument, or a named one written `Name = value` or
    /// `name: value`.
    fn parse_attribute_argument(&mut self) -> NodeId {
        let start = self.la;
        let mut name = None;
        if self.at(TokenKind::Identifier) && matches!(self.peek_kind(1), TokenKind::Equals | TokenKind::Colon) {
            name = self.ident();
            self.get();
        }
        let expression = self.parse_expression();
        self.finish(
            NodeKind::Argument {
                name,
                modifier: ArgumentModifier::None,
                expression,
            },
            start,
        )
    }

    fn parse_modifiers(&mut self) -> ModifierList {
        let mut modifiers = ModifierList::default();
        while let Some(flag) = Modifiers::from_token(self.token(self.la)) {
            if self.at(TokenKind::Identifier) && !self.contextual_modifier_applies(flag) {
                break;
            }
            self.get();
            modifiers.push(self.t, flag);
        }
        modifiers
    }

    /// `partial` and `async` are modifiers only where an identifier could
    /// not be meant: `partial class`, `async Task M()`.
    fn contextual_modifier_applies(&mut self, flag: Modifiers) -> bool {
        let next = self.peek_kind(1);
        if flag == Modifiers::PARTIAL {
            return matches!(
                next,
                TokenKind::ClassKeyword
                    | TokenKind::StructKeyword
                    | TokenKind::InterfaceKeyword
                    | TokenKind::VoidKeyword
            ) || sets::MODIFIER.contains(next)
                || (sets::TYPE_START.contains(next)
                    && self.peek_kind(2) == TokenKind::Identifier
                    && self.peek_kind(3) == TokenKind::OpenParen);
        }
        let declares = sets::TYPE_START.contains(next) || sets::MODIFIER.contains(next) || next == TokenKind::DelegateKeyword;
        declares
            && !matches!(
                self.peek_kind(2),
                TokenKind::Equals | TokenKind::Semicolon | TokenKind::Comma | TokenKind::CloseParen
            )
    }

    fn parse_member_header(&mut self) -> (MemberHeader, Option<String>) {
        let start = self.la;
        let doc = self.doc_comment_before(start);
        let attributes = self.parse_attribute_sections();
        let modifiers = self.parse_modifiers();
        (
            MemberHeader {
                start,
                attributes,
                modifiers,
            },
            doc,
        )
    }

    // ========================================================================
    // Type declarations
    // ========================================================================

    /// A class, struct, interface, enum or delegate declaration. Inside a
    /// type body (`namespace_level` false) any other member is accepted too.
    fn parse_type_member(&mut self, namespace_level: bool) -> Option<NodeId> {
        let (header, doc) = self.parse_member_header();
        let node = match self.la_kind() {
            TokenKind::ClassKeyword | TokenKind::StructKeyword | TokenKind::InterfaceKeyword => {
                self.parse_type_declaration(header)
            }
            TokenKind::EnumKeyword => self.parse_enum_declaration(header),
            TokenKind::DelegateKeyword => self.parse_delegate_declaration(header),
            _ if namespace_level => {
                self.syn_err(&messages::NAMESPACE_MEMBER_EXPECTED, &[]);
                return None;
            }
            _ => self.parse_class_member(header)?,
        };
        self.attach_doc_comment(node, doc);
        Some(node)
    }

    fn parse_type_declaration(&mut self, header: MemberHeader) -> NodeId {
        let kind = match self.la_kind() {
            TokenKind::ClassKeyword => TypeDeclarationKind::Class,
            TokenKind::StructKeyword => TypeDeclarationKind::Struct,
            _ => TypeDeclarationKind::Interface,
        };
        self.get();
        let name = self.ident();
        let type_parameters = self.parse_optional_type_parameter_list();
        let mut base_list = Vec::new();
        if self.eat(TokenKind::Colon) {
            loop {
                base_list.push(self.parse_type(TypeContext::Declaration));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let constraints = self.parse_constraint_clauses();
        let mut members = Vec::new();
        if self.expect(TokenKind::OpenBrace) {
            members = self.parse_type_body();
            self.expect(TokenKind::CloseBrace);
        }
        self.eat(TokenKind::Semicolon);
        self.finish(
            NodeKind::TypeDeclaration(TypeDeclaration {
                kind,
                attributes: header.attributes,
                modifiers: header.modifiers,
                name,
                type_parameters,
                base_list,
                constraints,
                members,
            }),
            header.start,
        )
    }

    fn parse_type_body(&mut self) -> Vec<NodeId> {
        let mut members = Vec::new();
        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
            let before = self.la;
            if self.at_set(sets::MEMBER_START) {
                if let Some(member) = self.parse_type_member(false) {
                    members.push(member);
                }
            } else {
                let text = self.token(self.la).text.clone();
                self.syn_err(&messages::INVALID_TOKEN_IN_MEMBER_DECLARATION, &[&text]);
            }
            if self.la == before {
                self.get();
            }
        }
        members
    }

    fn parse_enum_declaration(&mut self, header: MemberHeader) -> NodeId {
        self.get();
        let name = self.ident();
        let underlying_type = if self.eat(TokenKind::Colon) {
            Some(self.parse_type(TypeContext::Declaration))
        } else {
            None
        };
        let mut members = Vec::new();
        if self.expect(TokenKind::OpenBrace) {
            while self.at(TokenKind::Identifier) || self.at(TokenKind::OpenBracket) {
                members.push(self.parse_enum_member());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseBrace);
        }
        self.eat(TokenKind::Semicolon);
        self.finish(
            NodeKind::EnumDeclaration(EnumDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                name,
                underlying_type,
                members,
            }),
            header.start,
        )
    }

    fn parse_enum_member(&mut self) -> NodeId {
        let start = self.la;
        let doc = self.doc_comment_before(start);
        let attributes = self.parse_attribute_sections();
        let name = self.ident();
        let value = if self.eat(TokenKind::Equals) {
            Some(self.parse_expression())
        } else {
            None
        };
        let member = self.finish(NodeKind::EnumMember { attributes, name, value }, start);
        self.attach_doc_comment(member, doc);
        member
    }

    fn parse_delegate_declaration(&mut self, header: MemberHeader) -> NodeId {
        self.get();
        let return_type = self.parse_type(TypeContext::Declaration);
        let name = self.ident();
        let type_parameters = self.parse_optional_type_parameter_list();
        let parameters = self.parse_formal_parameter_list(TokenKind::OpenParen, TokenKind::CloseParen);
        let constraints = self.parse_constraint_clauses();
        self.expect(TokenKind::Semicolon);
        self.finish(
            NodeKind::DelegateDeclaration(DelegateDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                return_type,
                name,
                type_parameters,
                parameters,
                constraints,
            }),
            header.start,
        )
    }

    // ========================================================================
    // Type parameters and constraints
    // ========================================================================

    fn parse_optional_type_parameter_list(&mut self) -> Vec<NodeId> {
        if self.at(TokenKind::LessThan) {
            self.parse_type_parameter_list()
        } else {
            Vec::new()
        }
    }

    /// `< [attributes] [in|out] T {, ...} >`
    fn parse_type_parameter_list(&mut self) -> Vec<NodeId> {
        self.get();
        let mut parameters = Vec::new();
        loop {
            let start = self.la;
            let attributes = self.parse_attribute_sections();
            let variance = if self.eat(TokenKind::InKeyword) {
                Variance::In
            } else if self.eat(TokenKind::OutKeyword) {
                Variance::Out
            } else {
                Variance::None
            };
            let name = self.ident();
            parameters.push(self.finish(
                NodeKind::TypeParameter {
                    attributes,
                    variance,
                    name,
                },
                start,
            ));
            if !self.weak_separator(TokenKind::Comma, TYPE_PARAMETER_START, GREATER_THAN) {
                break;
            }
        }
        self.expect(TokenKind::GreaterThan);
        parameters
    }

    /// `where T : class, IFoo, new()` repeated.
    fn parse_constraint_clauses(&mut self) -> Vec<NodeId> {
        let mut clauses = Vec::new();
        while self.at_contextual(contextual::WHERE) && self.peek_kind(1) == TokenKind::Identifier {
            let start = self.la;
            self.get();
            let name = self.ident();
            self.expect(TokenKind::Colon);
            let mut constraints = Vec::new();
            loop {
                constraints.push(self.parse_constraint());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            clauses.push(self.finish(NodeKind::ConstraintClause { name, constraints }, start));
        }
        clauses
    }

    fn parse_constraint(&mut self) -> NodeId {
        let start = self.la;
        let kind = match self.la_kind() {
            TokenKind::ClassKeyword => {
                self.get();
                ConstraintKind::Class
            }
            TokenKind::StructKeyword => {
                self.get();
                ConstraintKind::Struct
            }
            TokenKind::NewKeyword => {
                self.get();
                self.expect(TokenKind::OpenParen);
                self.expect(TokenKind::CloseParen);
                ConstraintKind::Constructor
            }
            _ => ConstraintKind::Type(self.parse_type(TypeContext::Declaration)),
        };
        self.finish(NodeKind::Constraint(kind), start)
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Any member other than a nested type. `None` when the lookahead
    /// cannot start one; the caller skips it.
    fn parse_class_member(&mut self, header: MemberHeader) -> Option<NodeId> {
        let node = match self.la_kind() {
            TokenKind::Tilde => self.parse_destructor(header),
            TokenKind::EventKeyword => self.parse_event_declaration(header),
            TokenKind::ImplicitKeyword | TokenKind::ExplicitKeyword => self.parse_conversion_operator(header),
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::OpenParen => self.parse_constructor(header),
            kind if sets::TYPE_START.contains(kind) => self.parse_typed_member(header),
            _ => {
                let text = self.token(self.la).text.clone();
                self.syn_err(&messages::INVALID_TOKEN_IN_MEMBER_DECLARATION, &[&text]);
                return None;
            }
        };
        Some(node)
    }

    /// Members that begin with a type: fields, constants, methods,
    /// properties, indexers and operators.
    fn parse_typed_member(&mut self, header: MemberHeader) -> NodeId {
        let ty = self.parse_type(TypeContext::Declaration);
        if self.at(TokenKind::OperatorKeyword) {
            return self.parse_operator_declaration(header, ty);
        }
        if self.eat(TokenKind::ThisKeyword) {
            return self.parse_indexer(header, ty, None);
        }

        let member = self.parse_member_name();
        if member.indexer {
            return self.parse_indexer(header, ty, member.explicit_interface);
        }
        match self.la_kind() {
            TokenKind::OpenParen => self.parse_method_declaration(header, ty, member),
            TokenKind::OpenBrace | TokenKind::EqualsGreaterThan => self.parse_property_declaration(header, ty, member),
            _ => self.parse_field_declaration(header, ty, member),
        }
    }

    /// `name`, `I.name`, `N.I<T>.name<U>`, or `I.this`. A `<` on a segment
    /// is a type-argument list only when a `.` follows its `>`; otherwise it
    /// opens the member's type parameters.
    fn parse_member_name(&mut self) -> MemberName {
        let start = self.la;
        let mut segments = Vec::new();
        let mut qualifier_end = None;
        let mut type_parameters = Vec::new();
        let mut indexer = false;
        let name = loop {
            let name = self.ident();
            let mut type_arguments = Vec::new();
            if self.at(TokenKind::LessThan) {
                if self.type_arguments_precede_dot() {
                    type_arguments = self.parse_type_argument_list();
                } else {
                    type_parameters = self.parse_type_parameter_list();
                    break name;
                }
            }
            if !self.at(TokenKind::Dot) {
                break name;
            }
            segments.push(TypeSegment { name, type_arguments });
            qualifier_end = Some(self.t);
            self.get();
            if self.eat(TokenKind::ThisKeyword) {
                indexer = true;
                break None;
            }
        };
        // A qualifier whose names were all missing consumed no token.
        let explicit_interface = qualifier_end.filter(|&end| end >= start).map(|end| {
            self.tree
                .alloc(NodeKind::NamedType { alias: None, segments }, start, end)
        });
        MemberName {
            explicit_interface,
            name,
            type_parameters,
            indexer,
        }
    }

    fn type_arguments_precede_dot(&mut self) -> bool {
        let mut pt = self.start_scan();
        self.scan_type_argument_list(&mut pt) && self.kind(pt) == TokenKind::Dot
    }

    fn parse_field_declaration(&mut self, header: MemberHeader, ty: NodeId, member: MemberName) -> NodeId {
        if member.explicit_interface.is_some() {
            // Only methods, properties, indexers and events implement
            // interface members explicitly.
            self.syn_err(&messages::SYNTAX_ERROR_0_EXPECTED, &["("]);
        }
        let declarators = self.parse_declarators_after(member.name);
        self.expect_weak(TokenKind::Semicolon, MEMBER_FOLLOW);
        let constant = header.modifiers.contains(Modifiers::CONST);
        self.finish(
            NodeKind::FieldDeclaration(FieldDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                constant,
                ty,
                explicit_interface: member.explicit_interface,
                declarators,
            }),
            header.start,
        )
    }

    /// Declarators whose first name has already been consumed.
    fn parse_declarators_after(&mut self, first: Ident) -> Vec<NodeId> {
        let first_start = first.unwrap_or(self.la);
        let mut declarators = vec![self.parse_variable_declarator_rest(first_start, first)];
        if self.eat(TokenKind::Comma) {
            declarators.extend(self.parse_variable_declarators());
        }
        declarators
    }

    fn parse_method_declaration(&mut self, header: MemberHeader, return_type: NodeId, member: MemberName) -> NodeId {
        let parameters = self.parse_formal_parameter_list(TokenKind::OpenParen, TokenKind::CloseParen);
        let constraints = self.parse_constraint_clauses();
        let body = self.parse_member_body(header.modifiers.contains(Modifiers::ASYNC));
        self.finish(
            NodeKind::MethodDeclaration(MethodDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                return_type,
                explicit_interface: member.explicit_interface,
                name: member.name,
                type_parameters: member.type_parameters,
                parameters,
                constraints,
                body,
            }),
            header.start,
        )
    }

    /// A block, `=> expression;`, or `;`.
    fn parse_member_body(&mut self, asynchronous: bool) -> Option<NodeId> {
        let outer = std::mem::replace(&mut self.in_async, asynchronous);
        let body = match self.la_kind() {
            TokenKind::OpenBrace => Some(self.parse_block()),
            TokenKind::EqualsGreaterThan => {
                self.get();
                let expression = self.parse_expression();
                self.expect(TokenKind::Semicolon);
                Some(expression)
            }
            _ => {
                self.expect(TokenKind::Semicolon);
                None
            }
        };
        self.in_async = outer;
        body
    }

    fn parse_constructor(&mut self, header: MemberHeader) -> NodeId {
        let name = self.ident();
        let parameters = self.parse_formal_parameter_list(TokenKind::OpenParen, TokenKind::CloseParen);
        let initializer = if self.eat(TokenKind::Colon) {
            let start = self.la;
            let this = match self.la_kind() {
                TokenKind::ThisKeyword => {
                    self.get();
                    true
                }
                TokenKind::BaseKeyword => {
                    self.get();
                    false
                }
                _ => {
                    self.syn_err(&messages::SYNTAX_ERROR_0_EXPECTED, &["base"]);
                    false
                }
            };
            let arguments = if self.at(TokenKind::OpenParen) {
                self.parse_call_arguments()
            } else {
                self.expected(TokenKind::OpenParen);
                Vec::new()
            };
            Some(self.finish(NodeKind::ConstructorInitializer { this, arguments }, start))
        } else {
            None
        };
        let body = self.parse_member_body(false);
        self.finish(
            NodeKind::ConstructorDeclaration(ConstructorDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                name,
                parameters,
                initializer,
                body,
            }),
            header.start,
        )
    }

    /// `( arguments )` for a constructor initializer.
    fn parse_call_arguments(&mut self) -> Vec<NodeId> {
        self.get();
        let mut arguments = Vec::new();
        while !self.at(TokenKind::CloseParen) {
            arguments.push(self.parse_argument());
            if !self.weak_separator(TokenKind::Comma, sets::ARGUMENT_START, CLOSE_PAREN) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen);
        arguments
    }

    /// `~Name() body`
    fn parse_destructor(&mut self, header: MemberHeader) -> NodeId {
        self.get();
        let name = self.ident();
        self.expect(TokenKind::OpenParen);
        self.expect(TokenKind::CloseParen);
        let body = self.parse_member_body(false);
        self.finish(
            NodeKind::DestructorDeclaration(DestructorDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                name,
                body,
            }),
            header.start,
        )
    }

    fn parse_property_declaration(&mut self, header: MemberHeader, ty: NodeId, member: MemberName) -> NodeId {
        let mut accessors = Vec::new();
        let mut expression_body = None;
        let mut initializer = None;
        if self.eat(TokenKind::EqualsGreaterThan) {
            expression_body = Some(self.parse_expression());
            self.expect(TokenKind::Semicolon);
        } else {
            accessors = self.parse_accessor_list(false);
            if self.eat(TokenKind::Equals) {
                initializer = Some(self.parse_variable_initializer());
                self.expect(TokenKind::Semicolon);
            }
        }
        self.finish(
            NodeKind::PropertyDeclaration(PropertyDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                ty,
                explicit_interface: member.explicit_interface,
                name: member.name,
                accessors,
                expression_body,
                initializer,
            }),
            header.start,
        )
    }

    /// `this [ parameters ] { accessors }`; `this` has been consumed.
    fn parse_indexer(&mut self, header: MemberHeader, ty: NodeId, explicit_interface: Option<NodeId>) -> NodeId {
        let parameters = self.parse_formal_parameter_list(TokenKind::OpenBracket, TokenKind::CloseBracket);
        let mut accessors = Vec::new();
        let mut expression_body = None;
        if self.eat(TokenKind::EqualsGreaterThan) {
            expression_body = Some(self.parse_expression());
            self.expect(TokenKind::Semicolon);
        } else {
            accessors = self.parse_accessor_list(false);
        }
        self.finish(
            NodeKind::IndexerDeclaration(IndexerDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                ty,
                explicit_interface,
                parameters,
                accessors,
                expression_body,
            }),
            header.start,
        )
    }

    /// `event T a, b;` or `event T Name { add {...} remove {...} }`.
    fn parse_event_declaration(&mut self, header: MemberHeader) -> NodeId {
        self.get();
        let ty = self.parse_type(TypeContext::Declaration);
        let member = self.parse_member_name();
        let (name, declarators, accessors) = if self.at(TokenKind::OpenBrace) {
            (member.name, Vec::new(), self.parse_accessor_list(true))
        } else {
            let declarators = self.parse_declarators_after(member.name);
            self.expect(TokenKind::Semicolon);
            (None, declarators, Vec::new())
        };
        self.finish(
            NodeKind::EventDeclaration(EventDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                ty,
                explicit_interface: member.explicit_interface,
                name,
                declarators,
                accessors,
            }),
            header.start,
        )
    }

    /// `{ [attributes] [modifiers] get|set|add|remove body ... }`
    fn parse_accessor_list(&mut self, event: bool) -> Vec<NodeId> {
        let mut accessors = Vec::new();
        if !self.expect(TokenKind::OpenBrace) {
            return accessors;
        }
        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
            let before = self.la;
            if self.at(TokenKind::OpenBracket) || self.at(TokenKind::Identifier) || self.at_set(sets::MODIFIER) {
                accessors.push(self.parse_accessor(event));
            } else {
                self.accessor_expected(event);
            }
            if self.la == before {
                self.get();
            }
            if self.at_set(sets::MEMBER_ONLY_START) && !self.at_accessor_start() {
                break;
            }
        }
        self.expect(TokenKind::CloseBrace);
        accessors
    }

    /// Attributes, or modifiers followed by an accessor name. A modifier
    /// that starts anything else belongs to the next member.
    fn at_accessor_start(&mut self) -> bool {
        if self.at(TokenKind::OpenBracket) {
            return true;
        }
        let mut pt = self.start_scan();
        while sets::MODIFIER.contains(self.kind(pt)) {
            self.advance(&mut pt);
        }
        let token = self.token(pt);
        token.kind == TokenKind::Identifier
            && matches!(
                token.text.as_str(),
                contextual::GET | contextual::SET | contextual::ADD | contextual::REMOVE
            )
    }

    fn accessor_expected(&mut self, event: bool) {
        let message = if event {
            &messages::EVENT_ACCESSOR_EXPECTED
        } else {
            &messages::ACCESSOR_EXPECTED
        };
        self.syn_err(message, &[]);
    }

    fn parse_accessor(&mut self, event: bool) -> NodeId {
        let start = self.la;
        let attributes = self.parse_attribute_sections();
        let modifiers = self.parse_modifiers();
        let token = self.token(self.la);
        let kind = match token.text.as_str() {
            _ if token.kind != TokenKind::Identifier => AccessorKind::Unknown,
            contextual::GET => AccessorKind::Get,
            contextual::SET => AccessorKind::Set,
            contextual::ADD => AccessorKind::Add,
            contextual::REMOVE => AccessorKind::Remove,
            _ => AccessorKind::Unknown,
        };
        let valid = match kind {
            AccessorKind::Get | AccessorKind::Set => !event,
            AccessorKind::Add | AccessorKind::Remove => event,
            AccessorKind::Unknown => false,
        };
        if !valid {
            self.accessor_expected(event);
        }
        let keyword = if self.eat(TokenKind::Identifier) {
            Some(self.t)
        } else {
            None
        };
        let body = self.parse_member_body(false);
        self.finish(
            NodeKind::Accessor(Accessor {
                attributes,
                modifiers,
                kind,
                keyword,
                body,
            }),
            start,
        )
    }

    /// `T operator + (T a, T b) body`; the lookahead is `operator`.
    fn parse_operator_declaration(&mut self, header: MemberHeader, return_type: NodeId) -> NodeId {
        self.get();
        let mut operator = Vec::new();
        if self.la_kind().is_overloadable_operator() {
            self.get();
            operator.push(self.t);
            let joined_shift = self.kind(self.t) == TokenKind::GreaterThan
                && self.at(TokenKind::GreaterThan)
                && self.token(self.t).touches(self.token(self.la));
            if joined_shift {
                self.get();
                operator.push(self.t);
            }
        } else {
            self.syn_err(&messages::OVERLOADABLE_OPERATOR_EXPECTED, &[]);
        }
        let parameters = self.parse_formal_parameter_list(TokenKind::OpenParen, TokenKind::CloseParen);
        let body = self.parse_member_body(false);
        self.finish(
            NodeKind::OperatorDeclaration(OperatorDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                conversion: None,
                return_type,
                operator,
                parameters,
                body,
            }),
            header.start,
        )
    }

    /// `implicit operator T (S s) body` or the `explicit` form.
    fn parse_conversion_operator(&mut self, header: MemberHeader) -> NodeId {
        let conversion = if self.at(TokenKind::ImplicitKeyword) {
            ConversionKind::Implicit
        } else {
            ConversionKind::Explicit
        };
        self.get();
        self.expect(TokenKind::OperatorKeyword);
        let return_type = self.parse_type(TypeContext::Declaration);
        let parameters = self.parse_formal_parameter_list(TokenKind::OpenParen, TokenKind::CloseParen);
        let body = self.parse_member_body(false);
        self.finish(
            NodeKind::OperatorDeclaration(OperatorDeclaration {
                attributes: header.attributes,
                modifiers: header.modifiers,
                conversion: Some(conversion),
                return_type,
                operator: Vec::new(),
                parameters,
                body,
            }),
            header.start,
        )
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// `open parameter {, parameter} close` for methods (`(`…`)`) and
    /// indexers (`[`…`]`).
    pub(super) fn parse_formal_parameter_list(&mut self, open: TokenKind, close: TokenKind) -> Vec<NodeId> {
        let mut parameters = Vec::new();
        if !self.expect(open) {
            return parameters;
        }
        let rep_fol = if close == TokenKind::CloseParen { CLOSE_PAREN } else { CLOSE_BRACKET };
        while !self.at(close) {
            parameters.push(self.parse_formal_parameter());
            if !self.weak_separator(TokenKind::Comma, sets::PARAMETER_START, rep_fol) {
                break;
            }
        }
        self.expect(close);
        parameters
    }

    fn parse_formal_parameter(&mut self) -> NodeId {
        let start = self.la;
        let attributes = self.parse_attribute_sections();
        let modifier = self.parse_parameter_modifier();
        let ty = Some(self.parse_type(TypeContext::Declaration));
        let name = self.ident();
        let default_value = if self.eat(TokenKind::Equals) {
            Some(self.parse_expression())
        } else {
            None
        };
        self.finish(
            NodeKind::Parameter(Parameter {
                attributes,
                modifier,
                ty,
                name,
                default_value,
            }),
            start,
        )
    }

    pub(super) fn parse_parameter_modifier(&mut self) -> ParameterModifier {
        let modifier = match self.la_kind() {
            TokenKind::RefKeyword => ParameterModifier::Ref,
            TokenKind::OutKeyword => ParameterModifier::Out,
            TokenKind::InKeyword => ParameterModifier::In,
            TokenKind::ParamsKeyword => ParameterModifier::Params,
            TokenKind::ThisKeyword => ParameterModifier::This,
            _ => return ParameterModifier::None,
        };
        self.get();
        modifier
    }
}
