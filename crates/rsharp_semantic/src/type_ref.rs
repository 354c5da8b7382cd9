//! Type references and their resolution state.

use crate::entity::{EntityId, FileId};
use rsharp_core::define_index;
use rsharp_syntax::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

define_index! {
    /// Handle of a type reference in a [`crate::SemanticGraph`].
    pub struct TypeRefId;
}

/// A written type: the syntax node plus what it resolved to.
///
/// The node may be an array, pointer or nullable type; the state then
/// describes its element. Type arguments get references of their own,
/// listed in `arguments` once the reference is resolved.
#[derive(Debug, Clone)]
pub struct TypeReference {
    pub file: FileId,
    pub node: NodeId,
    pub state: ResolutionState,
    pub arguments: Vec<TypeRefId>,
}

impl TypeReference {
    pub fn new(file: FileId, node: NodeId) -> Self {
        Self {
            file,
            node,
            state: ResolutionState::Unresolved,
            arguments: Vec::new(),
        }
    }
}

/// `Unresolved` moves to exactly one of the other states and stays there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    ResolvedToType(TypeTarget),
    ResolvedToTypeParameter { owner: EntityId, index: u32 },
    Error,
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResolutionState::Unresolved)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResolutionState::Error)
    }

    pub fn target(&self) -> Option<&TypeTarget> {
        match self {
            ResolutionState::ResolvedToType(target) => Some(target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTarget {
    /// A type declared in the sources of this compilation.
    Entity(EntityId),
    /// A type provided by an assembly or a referenced compilation unit.
    External(ExternalType),
    /// A keyword type such as `int`, `object` or `void`.
    Predefined(String),
}

/// A type known only through an external scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalType {
    /// Name of the assembly or compilation unit that provides the type.
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub arity: u32,
    pub kind: ExternalTypeKind,
    #[serde(default)]
    pub sealed: bool,
}

impl ExternalType {
    /// `System.Collections.Generic.List`1`
    pub fn full_name(&self) -> String {
        let mut name = if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        };
        if self.arity > 0 {
            name.push_str(&format!("`{}", self.arity));
        }
        name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalTypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

impl fmt::Display for ExternalTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExternalTypeKind::Class => "class",
            ExternalTypeKind::Struct => "struct",
            ExternalTypeKind::Interface => "interface",
            ExternalTypeKind::Enum => "enum",
            ExternalTypeKind::Delegate => "delegate",
        };
        f.write_str(text)
    }
}
