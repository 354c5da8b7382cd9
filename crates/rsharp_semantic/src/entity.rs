//! Semantic entities: namespaces, types and their members.

use crate::type_ref::TypeRefId;
use rsharp_core::collections::FxIndexMap;
use rsharp_core::define_index;
use rsharp_syntax::{Modifiers, NodeId, ParameterModifier};

define_index! {
    /// Handle of an entity in a [`crate::SemanticGraph`].
    pub struct EntityId;
}

define_index! {
    /// Index of a syntax tree in the slice the graph was built from.
    pub struct FileId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Field,
    Constant,
    Method,
    Constructor,
    Destructor,
    Property,
    Indexer,
    Event,
    Operator,
    EnumMember,
}

impl EntityKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            EntityKind::Class | EntityKind::Struct | EntityKind::Interface | EntityKind::Enum | EntityKind::Delegate
        )
    }

    /// Kinds whose declarations may be split into `partial` parts.
    pub fn is_partial_capable(self) -> bool {
        matches!(self, EntityKind::Class | EntityKind::Struct | EntityKind::Interface)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            EntityKind::Namespace => "namespace",
            EntityKind::Class => "class",
            EntityKind::Struct => "struct",
            EntityKind::Interface => "interface",
            EntityKind::Enum => "enum",
            EntityKind::Delegate => "delegate",
            EntityKind::Field => "field",
            EntityKind::Constant => "constant",
            EntityKind::Method => "method",
            EntityKind::Constructor => "constructor",
            EntityKind::Destructor => "destructor",
            EntityKind::Property => "property",
            EntityKind::Indexer => "indexer",
            EntityKind::Event => "event",
            EntityKind::Operator => "operator",
            EntityKind::EnumMember => "enum member",
        }
    }
}

/// One syntax node that declares (part of) an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationRef {
    pub file: FileId,
    pub node: NodeId,
}

impl DeclarationRef {
    pub fn new(file: FileId, node: NodeId) -> Self {
        Self { file, node }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: String,
    pub modifier: ParameterModifier,
    /// `None` when the parameter type is missing from the source.
    pub ty: Option<TypeRefId>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub parent: Option<EntityId>,
    /// Every declaring node; several for partial types and namespaces.
    pub declarations: Vec<DeclarationRef>,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<String>,
    /// Child namespaces by simple name.
    pub namespaces: FxIndexMap<String, EntityId>,
    /// Types reachable by name from this container, keyed by name and
    /// arity. Orphaned duplicates are not listed.
    pub types: FxIndexMap<(String, u32), EntityId>,
    /// Types and members in declaration order, duplicates included.
    pub members: Vec<EntityId>,
    /// The written base list of each declaring part, in part order.
    pub base_lists: Vec<Vec<TypeRefId>>,
    /// The base class, set once base lists are resolved.
    pub base_type: Option<TypeRefId>,
    pub interfaces: Vec<TypeRefId>,
    /// Field, property, event and constant type; method, operator and
    /// delegate return type; enum underlying type.
    pub ty: Option<TypeRefId>,
    pub parameters: Vec<ParameterInfo>,
    /// Set when a declaration error makes the entity unusable.
    pub invalid: bool,
    /// A duplicate type left out of its container's scope.
    pub orphaned: bool,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>, parent: Option<EntityId>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent,
            declarations: Vec::new(),
            modifiers: Modifiers::NONE,
            type_parameters: Vec::new(),
            namespaces: FxIndexMap::default(),
            types: FxIndexMap::default(),
            members: Vec::new(),
            base_lists: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            ty: None,
            parameters: Vec::new(),
            invalid: false,
            orphaned: false,
        }
    }

    pub fn arity(&self) -> u32 {
        self.type_parameters.len() as u32
    }

    pub fn is_partial(&self) -> bool {
        self.modifiers.contains(Modifiers::PARTIAL)
    }

    /// The single declaring node of a non-partial entity, or the first part.
    pub fn primary_declaration(&self) -> Option<DeclarationRef> {
        self.declarations.first().copied()
    }
}
