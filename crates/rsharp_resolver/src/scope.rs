//! Lexical scopes: namespace bodies with their using directives, type
//! bodies and generic methods.

use rsharp_core::arena::Arena;
use rsharp_core::collections::FxIndexMap;
use rsharp_core::define_index;
use rsharp_semantic::{DeclarationRef, EntityId, FileId, TypeRefId};
use rsharp_syntax::{NodeId, SyntaxTree};
use rustc_hash::FxHashMap;

define_index! {
    pub struct ScopeId;
}

#[derive(Debug, Clone)]
pub enum ScopeKind {
    /// A compilation unit or one segment of a namespace declaration.
    Namespace(NamespaceScope),
    Type(EntityId),
    Method(EntityId),
}

#[derive(Debug, Clone)]
pub struct NamespaceScope {
    /// Full dotted name; empty for the global namespace.
    pub name: String,
    pub aliases: FxIndexMap<String, UsingAlias>,
    pub imports: Vec<UsingImport>,
    pub extern_aliases: Vec<String>,
}

impl NamespaceScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: FxIndexMap::default(),
            imports: Vec::new(),
            extern_aliases: Vec::new(),
        }
    }
}

/// `using A = B.C;`
#[derive(Debug, Clone)]
pub struct UsingAlias {
    pub node: NodeId,
    pub target: NodeId,
    pub resolved: Option<AliasTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    Namespace(String),
    Type(TypeRefId),
    Error,
}

/// `using A.B;`
#[derive(Debug, Clone)]
pub struct UsingImport {
    pub node: NodeId,
    pub name: NodeId,
    /// The imported namespace once resolved; `None` when it failed.
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub file: FileId,
}

/// All scopes of a compilation, indexed by the node that opens them.
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: Arena<ScopeId, Scope>,
    by_node: FxHashMap<DeclarationRef, ScopeId>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scope: Scope, opened_by: Option<DeclarationRef>) -> ScopeId {
        let id = self.scopes.alloc(scope);
        if let Some(declaration) = opened_by {
            self.by_node.insert(declaration, id);
        }
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes.ids()
    }

    pub fn opened_by(&self, file: FileId, node: NodeId) -> Option<ScopeId> {
        self.by_node.get(&DeclarationRef::new(file, node)).copied()
    }

    /// The innermost scope enclosing `node`, the node itself included.
    pub fn enclosing(&self, tree: &SyntaxTree, file: FileId, node: NodeId) -> Option<ScopeId> {
        std::iter::once(node)
            .chain(tree.ancestors(node))
            .find_map(|n| self.opened_by(file, n))
    }

    /// `id` and its parents, innermost first.
    pub fn chain(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |&s| self.scopes[s].parent)
    }

    pub fn namespace(&self, id: ScopeId) -> Option<&NamespaceScope> {
        match &self.scopes[id].kind {
            ScopeKind::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn namespace_mut(&mut self, id: ScopeId) -> Option<&mut NamespaceScope> {
        match &mut self.scopes[id].kind {
            ScopeKind::Namespace(ns) => Some(ns),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsharp_core::arena::ArenaIndex;

    #[test]
    fn test_chain_runs_outward() {
        let mut table = ScopeTable::new();
        let file = FileId(0);
        let global = table.add(
            Scope {
                kind: ScopeKind::Namespace(NamespaceScope::new("")),
                parent: None,
                file,
            },
            Some(DeclarationRef::new(file, NodeId(0))),
        );
        let inner = table.add(
            Scope {
                kind: ScopeKind::Type(EntityId::from_usize(1)),
                parent: Some(global),
                file,
            },
            Some(DeclarationRef::new(file, NodeId(4))),
        );
        assert_eq!(table.chain(inner).collect::<Vec<_>>(), vec![inner, global]);
        assert_eq!(table.opened_by(file, NodeId(4)), Some(inner));
        assert_eq!(table.opened_by(FileId(1), NodeId(4)), None);
        assert!(table.namespace(global).is_some());
        assert!(table.namespace(inner).is_none());
    }
}
