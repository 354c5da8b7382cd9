//! Concrete syntax tree node definitions.
//!
//! Nodes live in the tree's arena and refer to their children through
//! [`NodeId`] handles and to tokens through [`TokenId`] handles. Every
//! payload lists its children in source order; [`NodeKind::children`]
//! is the single place that knows the layout.

use crate::modifiers::ModifierList;
use crate::token::TokenId;
use crate::token_kind::TokenKind;

rsharp_core::define_index! {
    /// Handle of a node in a [`crate::SyntaxTree`].
    pub struct NodeId;
}

/// An identifier token, or `None` when the parser reported it missing.
pub type Ident = Option<TokenId>;

/// A node: its payload, its parent, and the inclusive token range it covers.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub start: TokenId,
    pub end: TokenId,
}

/// Coarse grouping used by the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    CompilationUnit,
    Namespace,
    TypeDeclaration,
    Member,
    Type,
    Statement,
    Expression,
    QueryClause,
    Other,
}

// ============================================================================
// Payload helpers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDeclarationKind {
    Class,
    Struct,
    Interface,
}

impl TypeDeclarationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeDeclarationKind::Class => "class",
            TypeDeclarationKind::Struct => "struct",
            TypeDeclarationKind::Interface => "interface",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    None,
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Class,
    Struct,
    Constructor,
    /// A type constraint; the type is the node's only child.
    Type(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterModifier {
    None,
    Ref,
    Out,
    In,
    Params,
    This,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentModifier {
    None,
    Ref,
    Out,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Get,
    Set,
    Add,
    Remove,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Implicit,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Coalesce,
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    ExclusiveOr,
    BitwiseAnd,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    LeftShift,
    RightShift,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn text(self) -> &'static str {
        match self {
            BinaryOperator::Coalesce => "??",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::ExclusiveOr => "^",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
}

impl AssignmentOperator {
    pub fn from_token(kind: TokenKind) -> Option<AssignmentOperator> {
        Some(match kind {
            TokenKind::Equals => AssignmentOperator::Assign,
            TokenKind::PlusEquals => AssignmentOperator::Add,
            TokenKind::MinusEquals => AssignmentOperator::Subtract,
            TokenKind::AsteriskEquals => AssignmentOperator::Multiply,
            TokenKind::SlashEquals => AssignmentOperator::Divide,
            TokenKind::PercentEquals => AssignmentOperator::Modulo,
            TokenKind::AmpersandEquals => AssignmentOperator::And,
            TokenKind::BarEquals => AssignmentOperator::Or,
            TokenKind::CaretEquals => AssignmentOperator::ExclusiveOr,
            TokenKind::LessThanLessThanEquals => AssignmentOperator::LeftShift,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTestOperator {
    Is,
    As,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitializerKind {
    /// `{ A = 1, B = 2 }` after `new T`.
    Object,
    /// `{ 1, 2 }` after `new T`, or a nested `{ k, v }` element.
    Collection,
    /// `{ 1, 2 }` in an array creation or field/local initializer.
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Unspecified,
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GotoTarget {
    Label(Ident),
    /// `goto case expr;`, the expression is the node's only child.
    Case(NodeId),
    Default,
}

/// One dotted segment of a named type: `List<int>` in `System.List<int>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSegment {
    pub name: Ident,
    pub type_arguments: Vec<NodeId>,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub externs: Vec<NodeId>,
    pub usings: Vec<NodeId>,
    pub attributes: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct NamespaceDeclaration {
    /// Dotted name parts, `A.B` gives two tokens.
    pub name: Vec<TokenId>,
    pub externs: Vec<NodeId>,
    pub usings: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub kind: TypeDeclarationKind,
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub name: Ident,
    pub type_parameters: Vec<NodeId>,
    pub base_list: Vec<NodeId>,
    pub constraints: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct EnumDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub name: Ident,
    pub underlying_type: Option<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct DelegateDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub return_type: NodeId,
    pub name: Ident,
    pub type_parameters: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub constraints: Vec<NodeId>,
}

/// A field or a constant (`constant` set) with one or more declarators.
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub constant: bool,
    pub ty: NodeId,
    /// Only present in erroneous input (`int I.x;`).
    pub explicit_interface: Option<NodeId>,
    pub declarators: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub return_type: NodeId,
    pub explicit_interface: Option<NodeId>,
    pub name: Ident,
    pub type_parameters: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub constraints: Vec<NodeId>,
    /// A block, or an expression for `=> expr;` bodies. `None` for `;`.
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ConstructorDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub name: Ident,
    pub parameters: Vec<NodeId>,
    pub initializer: Option<NodeId>,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct DestructorDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub name: Ident,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct PropertyDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub ty: NodeId,
    pub explicit_interface: Option<NodeId>,
    pub name: Ident,
    pub accessors: Vec<NodeId>,
    pub expression_body: Option<NodeId>,
    pub initializer: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct IndexerDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub ty: NodeId,
    pub explicit_interface: Option<NodeId>,
    pub parameters: Vec<NodeId>,
    pub accessors: Vec<NodeId>,
    pub expression_body: Option<NodeId>,
}

/// An event. Field-like events have declarators and no accessors.
#[derive(Debug, Clone)]
pub struct EventDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub ty: NodeId,
    pub explicit_interface: Option<NodeId>,
    pub name: Ident,
    pub declarators: Vec<NodeId>,
    pub accessors: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct OperatorDeclaration {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    /// Set for `implicit operator T` / `explicit operator T`.
    pub conversion: Option<ConversionKind>,
    /// The return type, or the target type of a conversion.
    pub return_type: NodeId,
    /// The operator symbol tokens (two for a joined `>>`).
    pub operator: Vec<TokenId>,
    pub parameters: Vec<NodeId>,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Accessor {
    pub attributes: Vec<NodeId>,
    pub modifiers: ModifierList,
    pub kind: AccessorKind,
    pub keyword: Ident,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub attributes: Vec<NodeId>,
    pub modifier: ParameterModifier,
    /// `None` for implicitly typed lambda parameters.
    pub ty: Option<NodeId>,
    pub name: Ident,
    pub default_value: Option<NodeId>,
}

// ============================================================================
// Node kinds
// ============================================================================

/// One variant per grammar production.
#[derive(Debug, Clone)]
pub enum NodeKind {
    // -- Compilation unit and namespaces --
    CompilationUnit(CompilationUnit),
    NamespaceDeclaration(NamespaceDeclaration),
    ExternAlias { name: Ident },
    UsingNamespace { name: NodeId },
    UsingAlias { alias: Ident, target: NodeId },
    AttributeSection { target: Ident, attributes: Vec<NodeId> },
    Attribute { name: NodeId, arguments: Vec<NodeId> },

    // -- Type declarations --
    TypeDeclaration(TypeDeclaration),
    EnumDeclaration(EnumDeclaration),
    DelegateDeclaration(DelegateDeclaration),
    TypeParameter { attributes: Vec<NodeId>, variance: Variance, name: Ident },
    ConstraintClause { name: Ident, constraints: Vec<NodeId> },
    Constraint(ConstraintKind),

    // -- Members --
    FieldDeclaration(FieldDeclaration),
    MethodDeclaration(MethodDeclaration),
    ConstructorDeclaration(ConstructorDeclaration),
    ConstructorInitializer { this: bool, arguments: Vec<NodeId> },
    DestructorDeclaration(DestructorDeclaration),
    PropertyDeclaration(PropertyDeclaration),
    IndexerDeclaration(IndexerDeclaration),
    EventDeclaration(EventDeclaration),
    OperatorDeclaration(OperatorDeclaration),
    Accessor(Accessor),
    EnumMember { attributes: Vec<NodeId>, name: Ident, value: Option<NodeId> },
    Parameter(Parameter),
    VariableDeclarator { name: Ident, initializer: Option<NodeId> },

    // -- Types --
    PredefinedType { keyword: TokenId },
    NamedType { alias: Ident, segments: Vec<TypeSegment> },
    NullableType { element: NodeId },
    ArrayType { element: NodeId, ranks: Vec<u32> },
    PointerType { element: NodeId },
    /// `var` in an implicitly typed local.
    ImplicitType,

    // -- Statements --
    Block { statements: Vec<NodeId> },
    EmptyStatement,
    LabeledStatement { label: Ident, statement: NodeId },
    LocalDeclaration { constant: bool, ty: NodeId, declarators: Vec<NodeId> },
    ExpressionStatement { expression: NodeId },
    IfStatement { condition: NodeId, then_branch: NodeId, else_branch: Option<NodeId> },
    SwitchStatement { expression: NodeId, sections: Vec<NodeId> },
    SwitchSection { labels: Vec<NodeId>, statements: Vec<NodeId> },
    /// `case value:`, or `default:` when `value` is `None`.
    SwitchLabel { value: Option<NodeId> },
    WhileStatement { condition: NodeId, body: NodeId },
    DoStatement { body: NodeId, condition: NodeId },
    ForStatement { initializers: Vec<NodeId>, condition: Option<NodeId>, iterators: Vec<NodeId>, body: NodeId },
    ForeachStatement { ty: NodeId, name: Ident, expression: NodeId, body: NodeId },
    BreakStatement,
    ContinueStatement,
    GotoStatement { target: GotoTarget },
    ReturnStatement { expression: Option<NodeId> },
    ThrowStatement { expression: Option<NodeId> },
    TryStatement { block: NodeId, catches: Vec<NodeId>, finally: Option<NodeId> },
    CatchClause { ty: Option<NodeId>, name: Ident, filter: Option<NodeId>, block: NodeId },
    CheckedStatement { checked: bool, block: NodeId },
    LockStatement { expression: NodeId, body: NodeId },
    /// The resource is a local declaration or an expression.
    UsingStatement { resource: NodeId, body: NodeId },
    /// `yield return expr;`, or `yield break;` when `expression` is `None`.
    YieldStatement { expression: Option<NodeId> },
    UnsafeStatement { block: NodeId },
    FixedStatement { ty: NodeId, declarators: Vec<NodeId>, body: NodeId },

    // -- Expressions --
    Literal { token: TokenId },
    SimpleName { name: Ident, type_arguments: Vec<NodeId> },
    QualifiedAliasMember { alias: Ident, name: Ident, type_arguments: Vec<NodeId> },
    MemberAccess { expression: NodeId, arrow: bool, name: Ident, type_arguments: Vec<NodeId> },
    Invocation { expression: NodeId, arguments: Vec<NodeId> },
    ElementAccess { expression: NodeId, arguments: Vec<NodeId> },
    Argument { name: Ident, modifier: ArgumentModifier, expression: NodeId },
    PrefixUnary { operator: TokenKind, operand: NodeId },
    PostfixUnary { operator: TokenKind, operand: NodeId },
    Binary { operator: BinaryOperator, left: NodeId, right: NodeId },
    Assignment { operator: AssignmentOperator, left: NodeId, right: NodeId },
    Conditional { condition: NodeId, when_true: NodeId, when_false: NodeId },
    Cast { ty: NodeId, expression: NodeId },
    TypeTest { operator: TypeTestOperator, expression: NodeId, ty: NodeId },
    Parenthesized { expression: NodeId },
    This,
    Base,
    ObjectCreation { ty: NodeId, arguments: Vec<NodeId>, initializer: Option<NodeId> },
    /// `new T[n] {..}`, `new T[] {..}`, or `new[] {..}` (no element type).
    ArrayCreation { element: Option<NodeId>, sizes: Vec<NodeId>, ranks: Vec<u32>, initializer: Option<NodeId> },
    AnonymousObjectCreation { members: Vec<NodeId> },
    AnonymousMember { name: Ident, expression: NodeId },
    Initializer { kind: InitializerKind, elements: Vec<NodeId> },
    MemberInitializer { name: Ident, value: NodeId },
    TypeOf { ty: NodeId },
    DefaultValue { ty: NodeId },
    SizeOf { ty: NodeId },
    CheckedExpression { checked: bool, expression: NodeId },
    StackAlloc { ty: NodeId, size: NodeId },
    Lambda { asynchronous: bool, parameters: Vec<NodeId>, body: NodeId },
    AnonymousMethod { asynchronous: bool, parameters: Vec<NodeId>, body: NodeId },
    Await { expression: NodeId },
    Query { from: NodeId, body: NodeId },

    // -- Query clauses --
    FromClause { ty: Option<NodeId>, name: Ident, expression: NodeId },
    LetClause { name: Ident, expression: NodeId },
    WhereClause { condition: NodeId },
    JoinClause {
        ty: Option<NodeId>,
        name: Ident,
        source: NodeId,
        left: NodeId,
        right: NodeId,
        into: Ident,
    },
    OrderByClause { orderings: Vec<NodeId> },
    Ordering { expression: NodeId, direction: OrderDirection },
    SelectClause { expression: NodeId },
    GroupClause { element: NodeId, key: NodeId },
    /// Clauses, the final `select`/`group`, and an optional `into` continuation.
    QueryBody { clauses: Vec<NodeId>, result: NodeId, continuation: Option<NodeId> },
    QueryContinuation { name: Ident, body: NodeId },

    /// Placeholder produced by error recovery.
    Error,
}

impl NodeKind {
    pub fn category(&self) -> NodeCategory {
        use NodeKind as K;
        match self {
            K::CompilationUnit(_) => NodeCategory::CompilationUnit,
            K::NamespaceDeclaration(_) | K::ExternAlias { .. } | K::UsingNamespace { .. } | K::UsingAlias { .. } => {
                NodeCategory::Namespace
            }
            K::TypeDeclaration(_) | K::EnumDeclaration(_) | K::DelegateDeclaration(_) => NodeCategory::TypeDeclaration,
            K::FieldDeclaration(_)
            | K::MethodDeclaration(_)
            | K::ConstructorDeclaration(_)
            | K::DestructorDeclaration(_)
            | K::PropertyDeclaration(_)
            | K::IndexerDeclaration(_)
            | K::EventDeclaration(_)
            | K::OperatorDeclaration(_)
            | K::EnumMember { .. } => NodeCategory::Member,
            K::PredefinedType { .. }
            | K::NamedType { .. }
            | K::NullableType { .. }
            | K::ArrayType { .. }
            | K::PointerType { .. }
            | K::ImplicitType => NodeCategory::Type,
            K::Block { .. }
            | K::EmptyStatement
            | K::LabeledStatement { .. }
            | K::LocalDeclaration { .. }
            | K::ExpressionStatement { .. }
            | K::IfStatement { .. }
            | K::SwitchStatement { .. }
            | K::WhileStatement { .. }
            | K::DoStatement { .. }
            | K::ForStatement { .. }
            | K::ForeachStatement { .. }
            | K::BreakStatement
            | K::ContinueStatement
            | K::GotoStatement { .. }
            | K::ReturnStatement { .. }
            | K::ThrowStatement { .. }
            | K::TryStatement { .. }
            | K::CheckedStatement { .. }
            | K::LockStatement { .. }
            | K::UsingStatement { .. }
            | K::YieldStatement { .. }
            | K::UnsafeStatement { .. }
            | K::FixedStatement { .. } => NodeCategory::Statement,
            K::Literal { .. }
            | K::SimpleName { .. }
            | K::QualifiedAliasMember { .. }
            | K::MemberAccess { .. }
            | K::Invocation { .. }
            | K::ElementAccess { .. }
            | K::PrefixUnary { .. }
            | K::PostfixUnary { .. }
            | K::Binary { .. }
            | K::Assignment { .. }
            | K::Conditional { .. }
            | K::Cast { .. }
            | K::TypeTest { .. }
            | K::Parenthesized { .. }
            | K::This
            | K::Base
            | K::ObjectCreation { .. }
            | K::ArrayCreation { .. }
            | K::AnonymousObjectCreation { .. }
            | K::Initializer { .. }
            | K::TypeOf { .. }
            | K::DefaultValue { .. }
            | K::SizeOf { .. }
            | K::CheckedExpression { .. }
            | K::StackAlloc { .. }
            | K::Lambda { .. }
            | K::AnonymousMethod { .. }
            | K::Await { .. }
            | K::Query { .. } => NodeCategory::Expression,
            K::FromClause { .. }
            | K::LetClause { .. }
            | K::WhereClause { .. }
            | K::JoinClause { .. }
            | K::OrderByClause { .. }
            | K::Ordering { .. }
            | K::SelectClause { .. }
            | K::GroupClause { .. }
            | K::QueryBody { .. }
            | K::QueryContinuation { .. } => NodeCategory::QueryClause,
            K::AttributeSection { .. }
            | K::Attribute { .. }
            | K::TypeParameter { .. }
            | K::ConstraintClause { .. }
            | K::Constraint(_)
            | K::ConstructorInitializer { .. }
            | K::Accessor(_)
            | K::Parameter(_)
            | K::VariableDeclarator { .. }
            | K::SwitchSection { .. }
            | K::SwitchLabel { .. }
            | K::CatchClause { .. }
            | K::Argument { .. }
            | K::AnonymousMember { .. }
            | K::MemberInitializer { .. }
            | K::Error => NodeCategory::Other,
        }
    }

    /// Short name of the variant, used by tree dumps.
    pub fn name(&self) -> &'static str {
        use NodeKind as K;
        match self {
            K::CompilationUnit(_) => "CompilationUnit",
            K::NamespaceDeclaration(_) => "NamespaceDeclaration",
            K::ExternAlias { .. } => "ExternAlias",
            K::UsingNamespace { .. } => "UsingNamespace",
            K::UsingAlias { .. } => "UsingAlias",
            K::AttributeSection { .. } => "AttributeSection",
            K::Attribute { .. } => "Attribute",
            K::TypeDeclaration(decl) => match decl.kind {
                TypeDeclarationKind::Class => "ClassDeclaration",
                TypeDeclarationKind::Struct => "StructDeclaration",
                TypeDeclarationKind::Interface => "InterfaceDeclaration",
            },
            K::EnumDeclaration(_) => "EnumDeclaration",
            K::DelegateDeclaration(_) => "DelegateDeclaration",
            K::TypeParameter { .. } => "TypeParameter",
            K::ConstraintClause { .. } => "ConstraintClause",
            K::Constraint(_) => "Constraint",
            K::FieldDeclaration(f) if f.constant => "ConstantDeclaration",
            K::FieldDeclaration(_) => "FieldDeclaration",
            K::MethodDeclaration(_) => "MethodDeclaration",
            K::ConstructorDeclaration(_) => "ConstructorDeclaration",
            K::ConstructorInitializer { .. } => "ConstructorInitializer",
            K::DestructorDeclaration(_) => "DestructorDeclaration",
            K::PropertyDeclaration(_) => "PropertyDeclaration",
            K::IndexerDeclaration(_) => "IndexerDeclaration",
            K::EventDeclaration(_) => "EventDeclaration",
            K::OperatorDeclaration(_) => "OperatorDeclaration",
            K::Accessor(_) => "Accessor",
            K::EnumMember { .. } => "EnumMember",
            K::Parameter(_) => "Parameter",
            K::VariableDeclarator { .. } => "VariableDeclarator",
            K::PredefinedType { .. } => "PredefinedType",
            K::NamedType { .. } => "NamedType",
            K::NullableType { .. } => "NullableType",
            K::ArrayType { .. } => "ArrayType",
            K::PointerType { .. } => "PointerType",
            K::ImplicitType => "ImplicitType",
            K::Block { .. } => "Block",
            K::EmptyStatement => "EmptyStatement",
            K::LabeledStatement { .. } => "LabeledStatement",
            K::LocalDeclaration { .. } => "LocalDeclaration",
            K::ExpressionStatement { .. } => "ExpressionStatement",
            K::IfStatement { .. } => "IfStatement",
            K::SwitchStatement { .. } => "SwitchStatement",
            K::SwitchSection { .. } => "SwitchSection",
            K::SwitchLabel { .. } => "SwitchLabel",
            K::WhileStatement { .. } => "WhileStatement",
            K::DoStatement { .. } => "DoStatement",
            K::ForStatement { .. } => "ForStatement",
            K::ForeachStatement { .. } => "ForeachStatement",
            K::BreakStatement => "BreakStatement",
            K::ContinueStatement => "ContinueStatement",
            K::GotoStatement { .. } => "GotoStatement",
            K::ReturnStatement { .. } => "ReturnStatement",
            K::ThrowStatement { .. } => "ThrowStatement",
            K::TryStatement { .. } => "TryStatement",
            K::CatchClause { .. } => "CatchClause",
            K::CheckedStatement { .. } => "CheckedStatement",
            K::LockStatement { .. } => "LockStatement",
            K::UsingStatement { .. } => "UsingStatement",
            K::YieldStatement { .. } => "YieldStatement",
            K::UnsafeStatement { .. } => "UnsafeStatement",
            K::FixedStatement { .. } => "FixedStatement",
            K::Literal { .. } => "Literal",
            K::SimpleName { .. } => "SimpleName",
            K::QualifiedAliasMember { .. } => "QualifiedAliasMember",
            K::MemberAccess { .. } => "MemberAccess",
            K::Invocation { .. } => "Invocation",
            K::ElementAccess { .. } => "ElementAccess",
            K::Argument { .. } => "Argument",
            K::PrefixUnary { .. } => "PrefixUnary",
            K::PostfixUnary { .. } => "PostfixUnary",
            K::Binary { .. } => "Binary",
            K::Assignment { .. } => "Assignment",
            K::Conditional { .. } => "Conditional",
            K::Cast { .. } => "Cast",
            K::TypeTest { .. } => "TypeTest",
            K::Parenthesized { .. } => "Parenthesized",
            K::This => "This",
            K::Base => "Base",
            K::ObjectCreation { .. } => "ObjectCreation",
            K::ArrayCreation { .. } => "ArrayCreation",
            K::AnonymousObjectCreation { .. } => "AnonymousObjectCreation",
            K::AnonymousMember { .. } => "AnonymousMember",
            K::Initializer { .. } => "Initializer",
            K::MemberInitializer { .. } => "MemberInitializer",
            K::TypeOf { .. } => "TypeOf",
            K::DefaultValue { .. } => "DefaultValue",
            K::SizeOf { .. } => "SizeOf",
            K::CheckedExpression { .. } => "CheckedExpression",
            K::StackAlloc { .. } => "StackAlloc",
            K::Lambda { .. } => "Lambda",
            K::AnonymousMethod { .. } => "AnonymousMethod",
            K::Await { .. } => "Await",
            K::Query { .. } => "Query",
            K::FromClause { .. } => "FromClause",
            K::LetClause { .. } => "LetClause",
            K::WhereClause { .. } => "WhereClause",
            K::JoinClause { .. } => "JoinClause",
            K::OrderByClause { .. } => "OrderByClause",
            K::Ordering { .. } => "Ordering",
            K::SelectClause { .. } => "SelectClause",
            K::GroupClause { .. } => "GroupClause",
            K::QueryBody { .. } => "QueryBody",
            K::QueryContinuation { .. } => "QueryContinuation",
            K::Error => "Error",
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.push_children(&mut out);
        out
    }

    fn push_children(&self, out: &mut Vec<NodeId>) {
        use NodeKind as K;
        match self {
            K::CompilationUnit(cu) => {
                out.extend(&cu.externs);
                out.extend(&cu.usings);
                out.extend(&cu.attributes);
                out.extend(&cu.members);
            }
            K::NamespaceDeclaration(ns) => {
                out.extend(&ns.externs);
                out.extend(&ns.usings);
                out.extend(&ns.members);
            }
            K::ExternAlias { .. } | K::PredefinedType { .. } | K::ImplicitType | K::EmptyStatement => {}
            K::UsingNamespace { name } => out.push(*name),
            K::UsingAlias { target, .. } => out.push(*target),
            K::AttributeSection { attributes, .. } => out.extend(attributes),
            K::Attribute { name, arguments } => {
                out.push(*name);
                out.extend(arguments);
            }
            K::TypeDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.extend(&decl.type_parameters);
                out.extend(&decl.base_list);
                out.extend(&decl.constraints);
                out.extend(&decl.members);
            }
            K::EnumDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.extend(decl.underlying_type);
                out.extend(&decl.members);
            }
            K::DelegateDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.push(decl.return_type);
                out.extend(&decl.type_parameters);
                out.extend(&decl.parameters);
                out.extend(&decl.constraints);
            }
            K::TypeParameter { attributes, .. } => out.extend(attributes),
            K::ConstraintClause { constraints, .. } => out.extend(constraints),
            K::Constraint(kind) => {
                if let ConstraintKind::Type(ty) = kind {
                    out.push(*ty);
                }
            }
            K::FieldDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.push(decl.ty);
                out.extend(decl.explicit_interface);
                out.extend(&decl.declarators);
            }
            K::MethodDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.push(decl.return_type);
                out.extend(decl.explicit_interface);
                out.extend(&decl.type_parameters);
                out.extend(&decl.parameters);
                out.extend(&decl.constraints);
                out.extend(decl.body);
            }
            K::ConstructorDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.extend(&decl.parameters);
                out.extend(decl.initializer);
                out.extend(decl.body);
            }
            K::ConstructorInitializer { arguments, .. } => out.extend(arguments),
            K::DestructorDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.extend(decl.body);
            }
            K::PropertyDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.push(decl.ty);
                out.extend(decl.explicit_interface);
                out.extend(&decl.accessors);
                out.extend(decl.expression_body);
                out.extend(decl.initializer);
            }
            K::IndexerDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.push(decl.ty);
                out.extend(decl.explicit_interface);
                out.extend(&decl.parameters);
                out.extend(&decl.accessors);
                out.extend(decl.expression_body);
            }
            K::EventDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.push(decl.ty);
                out.extend(decl.explicit_interface);
                out.extend(&decl.declarators);
                out.extend(&decl.accessors);
            }
            K::OperatorDeclaration(decl) => {
                out.extend(&decl.attributes);
                out.push(decl.return_type);
                out.extend(&decl.parameters);
                out.extend(decl.body);
            }
            K::Accessor(acc) => {
                out.extend(&acc.attributes);
                out.extend(acc.body);
            }
            K::EnumMember { attributes, value, .. } => {
                out.extend(attributes);
                out.extend(*value);
            }
            K::Parameter(param) => {
                out.extend(&param.attributes);
                out.extend(param.ty);
                out.extend(param.default_value);
            }
            K::VariableDeclarator { initializer, .. } => out.extend(*initializer),
            K::NamedType { segments, .. } => {
                for segment in segments {
                    out.extend(&segment.type_arguments);
                }
            }
            K::NullableType { element } | K::ArrayType { element, .. } | K::PointerType { element } => out.push(*element),
            K::Block { statements } => out.extend(statements),
            K::LabeledStatement { statement, .. } => out.push(*statement),
            K::LocalDeclaration { ty, declarators, .. } => {
                out.push(*ty);
                out.extend(declarators);
            }
            K::ExpressionStatement { expression } => out.push(*expression),
            K::IfStatement { condition, then_branch, else_branch } => {
                out.push(*condition);
                out.push(*then_branch);
                out.extend(*else_branch);
            }
            K::SwitchStatement { expression, sections } => {
                out.push(*expression);
                out.extend(sections);
            }
            K::SwitchSection { labels, statements } => {
                out.extend(labels);
                out.extend(statements);
            }
            K::SwitchLabel { value } => out.extend(*value),
            K::WhileStatement { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            K::DoStatement { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            K::ForStatement { initializers, condition, iterators, body } => {
                out.extend(initializers);
                out.extend(*condition);
                out.extend(iterators);
                out.push(*body);
            }
            K::ForeachStatement { ty, expression, body, .. } => {
                out.push(*ty);
                out.push(*expression);
                out.push(*body);
            }
            K::BreakStatement | K::ContinueStatement | K::This | K::Base | K::Literal { .. } | K::Error => {}
            K::GotoStatement { target } => {
                if let GotoTarget::Case(value) = target {
                    out.push(*value);
                }
            }
            K::ReturnStatement { expression } | K::ThrowStatement { expression } | K::YieldStatement { expression } => {
                out.extend(*expression)
            }
            K::TryStatement { block, catches, finally } => {
                out.push(*block);
                out.extend(catches);
                out.extend(*finally);
            }
            K::CatchClause { ty, filter, block, .. } => {
                out.extend(*ty);
                out.extend(*filter);
                out.push(*block);
            }
            K::CheckedStatement { block, .. } | K::UnsafeStatement { block } => out.push(*block),
            K::LockStatement { expression, body } => {
                out.push(*expression);
                out.push(*body);
            }
            K::UsingStatement { resource, body } => {
                out.push(*resource);
                out.push(*body);
            }
            K::FixedStatement { ty, declarators, body } => {
                out.push(*ty);
                out.extend(declarators);
                out.push(*body);
            }
            K::SimpleName { type_arguments, .. } | K::QualifiedAliasMember { type_arguments, .. } => {
                out.extend(type_arguments)
            }
            K::MemberAccess { expression, type_arguments, .. } => {
                out.push(*expression);
                out.extend(type_arguments);
            }
            K::Invocation { expression, arguments } | K::ElementAccess { expression, arguments } => {
                out.push(*expression);
                out.extend(arguments);
            }
            K::Argument { expression, .. }
            | K::Parenthesized { expression }
            | K::CheckedExpression { expression, .. }
            | K::Await { expression }
            | K::AnonymousMember { expression, .. } => out.push(*expression),
            K::PrefixUnary { operand, .. } | K::PostfixUnary { operand, .. } => out.push(*operand),
            K::Binary { left, right, .. } | K::Assignment { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            K::Conditional { condition, when_true, when_false } => {
                out.push(*condition);
                out.push(*when_true);
                out.push(*when_false);
            }
            K::Cast { ty, expression } => {
                out.push(*ty);
                out.push(*expression);
            }
            K::TypeTest { expression, ty, .. } => {
                out.push(*expression);
                out.push(*ty);
            }
            K::ObjectCreation { ty, arguments, initializer } => {
                out.push(*ty);
                out.extend(arguments);
                out.extend(*initializer);
            }
            K::ArrayCreation { element, sizes, initializer, .. } => {
                out.extend(*element);
                out.extend(sizes);
                out.extend(*initializer);
            }
            K::AnonymousObjectCreation { members } => out.extend(members),
            K::Initializer { elements, .. } => out.extend(elements),
            K::MemberInitializer { value, .. } => out.push(*value),
            K::TypeOf { ty } | K::DefaultValue { ty } | K::SizeOf { ty } => out.push(*ty),
            K::StackAlloc { ty, size } => {
                out.push(*ty);
                out.push(*size);
            }
            K::Lambda { parameters, body, .. } | K::AnonymousMethod { parameters, body, .. } => {
                out.extend(parameters);
                out.push(*body);
            }
            K::Query { from, body } => {
                out.push(*from);
                out.push(*body);
            }
            K::FromClause { ty, expression, .. } => {
                out.extend(*ty);
                out.push(*expression);
            }
            K::LetClause { expression, .. } | K::SelectClause { expression } | K::Ordering { expression, .. } => {
                out.push(*expression)
            }
            K::WhereClause { condition } => out.push(*condition),
            K::JoinClause { ty, source, left, right, .. } => {
                out.extend(*ty);
                out.push(*source);
                out.push(*left);
                out.push(*right);
            }
            K::OrderByClause { orderings } => out.extend(orderings),
            K::GroupClause { element, key } => {
                out.push(*element);
                out.push(*key);
            }
            K::QueryBody { clauses, result, continuation } => {
                out.extend(clauses);
                out.push(*result);
                out.extend(*continuation);
            }
            K::QueryContinuation { body, .. } => out.push(*body),
        }
    }

    /// The declared name token of a declaration node.
    pub fn declared_name(&self) -> Ident {
        use NodeKind as K;
        match self {
            K::TypeDeclaration(decl) => decl.name,
            K::EnumDeclaration(decl) => decl.name,
            K::DelegateDeclaration(decl) => decl.name,
            K::MethodDeclaration(decl) => decl.name,
            K::ConstructorDeclaration(decl) => decl.name,
            K::DestructorDeclaration(decl) => decl.name,
            K::PropertyDeclaration(decl) => decl.name,
            K::EventDeclaration(decl) => decl.name,
            K::EnumMember { name, .. }
            | K::TypeParameter { name, .. }
            | K::VariableDeclarator { name, .. }
            | K::ExternAlias { name }
            | K::UsingAlias { alias: name, .. } => *name,
            K::Parameter(param) => param.name,
            _ => None,
        }
    }

    /// The written modifiers of a declaration node.
    pub fn modifiers(&self) -> Option<&ModifierList> {
        use NodeKind as K;
        match self {
            K::TypeDeclaration(decl) => Some(&decl.modifiers),
            K::EnumDeclaration(decl) => Some(&decl.modifiers),
            K::DelegateDeclaration(decl) => Some(&decl.modifiers),
            K::FieldDeclaration(decl) => Some(&decl.modifiers),
            K::MethodDeclaration(decl) => Some(&decl.modifiers),
            K::ConstructorDeclaration(decl) => Some(&decl.modifiers),
            K::DestructorDeclaration(decl) => Some(&decl.modifiers),
            K::PropertyDeclaration(decl) => Some(&decl.modifiers),
            K::IndexerDeclaration(decl) => Some(&decl.modifiers),
            K::EventDeclaration(decl) => Some(&decl.modifiers),
            K::OperatorDeclaration(decl) => Some(&decl.modifiers),
            K::Accessor(acc) => Some(&acc.modifiers),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NodeKind::Error)
    }
}
