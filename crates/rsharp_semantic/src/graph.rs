//! The semantic graph: an entity arena rooted at the global namespace,
//! the type-reference table, and the links back to syntax.

use crate::entity::{DeclarationRef, Entity, EntityId, EntityKind, FileId};
use crate::type_ref::{ResolutionState, TypeRefId, TypeReference, TypeTarget};
use rsharp_core::arena::Arena;
use rsharp_syntax::NodeId;
use rustc_hash::FxHashMap;
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct SemanticGraph {
    pub entities: Arena<EntityId, Entity>,
    pub type_refs: Arena<TypeRefId, TypeReference>,
    pub root: EntityId,
    declarations: FxHashMap<DeclarationRef, EntityId>,
    type_ref_index: FxHashMap<DeclarationRef, TypeRefId>,
}

impl Default for SemanticGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticGraph {
    pub fn new() -> Self {
        let mut entities = Arena::new();
        let root = entities.alloc(Entity::new(EntityKind::Namespace, "", None));
        Self {
            entities,
            type_refs: Arena::new(),
            root,
            declarations: FxHashMap::default(),
            type_ref_index: FxHashMap::default(),
        }
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id]
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.alloc(entity)
    }

    /// Record that `node` in `file` declares `entity`.
    pub fn link(&mut self, declaration: DeclarationRef, entity: EntityId) {
        self.declarations.insert(declaration, entity);
    }

    /// The entity a declaration node belongs to.
    pub fn entity_of(&self, file: FileId, node: NodeId) -> Option<EntityId> {
        self.declarations.get(&DeclarationRef::new(file, node)).copied()
    }

    /// The namespace with the given dotted name, if declared.
    pub fn namespace(&self, full_name: &str) -> Option<EntityId> {
        let mut current = self.root;
        if full_name.is_empty() {
            return Some(current);
        }
        for part in full_name.split('.') {
            current = *self.entities[current].namespaces.get(part)?;
        }
        Some(current)
    }

    /// The namespace with the given dotted name, created on demand.
    pub fn namespace_or_insert(&mut self, full_name: &str) -> EntityId {
        let mut current = self.root;
        if full_name.is_empty() {
            return current;
        }
        for part in full_name.split('.') {
            current = match self.entities[current].namespaces.get(part) {
                Some(&child) => child,
                None => {
                    let child = self.entities.alloc(Entity::new(EntityKind::Namespace, part, Some(current)));
                    self.entities[current].namespaces.insert(part.to_string(), child);
                    child
                }
            };
        }
        current
    }

    /// A type declared directly in `container` (namespace or type).
    pub fn lookup_type(&self, container: EntityId, name: &str, arity: u32) -> Option<EntityId> {
        self.entities[container].types.get(&(name.to_string(), arity)).copied()
    }

    /// Arities under which `name` is declared in `container`.
    pub fn arities(&self, container: EntityId, name: &str) -> Vec<u32> {
        self.entities[container]
            .types
            .keys()
            .filter(|(n, _)| n == name)
            .map(|(_, arity)| *arity)
            .collect()
    }

    /// Dotted name from the global namespace, e.g. `A.B.Outer.Inner`.
    pub fn full_name(&self, id: EntityId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(entity_id) = current {
            let entity = &self.entities[entity_id];
            if !entity.name.is_empty() {
                parts.push(entity.name.as_str());
            }
            current = entity.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Name used in messages: `<global namespace>` for the root.
    pub fn display_name(&self, id: EntityId) -> String {
        if id == self.root {
            "<global namespace>".to_string()
        } else {
            self.full_name(id)
        }
    }

    /// The innermost enclosing namespace of an entity.
    pub fn enclosing_namespace(&self, id: EntityId) -> EntityId {
        let mut current = id;
        loop {
            let entity = &self.entities[current];
            match entity.parent {
                Some(parent) if entity.kind != EntityKind::Namespace => current = parent,
                _ => return current,
            }
        }
    }

    /// Every class, struct, interface, enum and delegate.
    pub fn types(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.kind.is_type())
            .map(|(id, _)| id)
    }

    /// Entities with the given dotted name, orphans excluded.
    pub fn find_type(&self, full_name: &str) -> Option<EntityId> {
        self.types()
            .find(|&id| !self.entities[id].orphaned && self.full_name(id) == full_name)
    }

    // ========================================================================
    // Type references
    // ========================================================================

    /// The reference for a type node, created unresolved on first use.
    pub fn type_ref_for(&mut self, file: FileId, node: NodeId) -> TypeRefId {
        let key = DeclarationRef::new(file, node);
        if let Some(&id) = self.type_ref_index.get(&key) {
            return id;
        }
        let id = self.type_refs.alloc(TypeReference::new(file, node));
        self.type_ref_index.insert(key, id);
        id
    }

    pub fn type_ref(&self, id: TypeRefId) -> &TypeReference {
        &self.type_refs[id]
    }

    pub fn type_ref_mut(&mut self, id: TypeRefId) -> &mut TypeReference {
        &mut self.type_refs[id]
    }

    /// Display name of a resolution target.
    pub fn target_name(&self, target: &TypeTarget) -> String {
        match target {
            TypeTarget::Entity(id) => self.full_name(*id),
            TypeTarget::External(ty) => {
                if ty.namespace.is_empty() {
                    ty.name.clone()
                } else {
                    format!("{}.{}", ty.namespace, ty.name)
                }
            }
            TypeTarget::Predefined(keyword) => keyword.clone(),
        }
    }

    /// Count of references in each state: unresolved, type, type parameter, error.
    pub fn resolution_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for reference in self.type_refs.values() {
            let slot = match reference.state {
                ResolutionState::Unresolved => 0,
                ResolutionState::ResolvedToType(_) => 1,
                ResolutionState::ResolvedToTypeParameter { .. } => 2,
                ResolutionState::Error => 3,
            };
            counts[slot] += 1;
        }
        counts
    }

    // ========================================================================
    // Dump
    // ========================================================================

    /// Indented outline of the namespace tree, one entity per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_entity(self.root, 0, &mut out);
        out
    }

    fn dump_entity(&self, id: EntityId, depth: usize, out: &mut String) {
        let entity = &self.entities[id];
        let indent = "  ".repeat(depth);
        let name = if id == self.root { "<global>" } else { entity.name.as_str() };
        let _ = write!(out, "{indent}{} {name}", entity.kind.keyword());
        if !entity.type_parameters.is_empty() {
            let _ = write!(out, "<{}>", entity.type_parameters.join(", "));
        }
        if entity.declarations.len() > 1 && entity.kind != EntityKind::Namespace {
            let _ = write!(out, " [{} parts]", entity.declarations.len());
        }
        if let Some(base) = entity.base_type {
            if let Some(target) = self.type_refs[base].state.target() {
                let _ = write!(out, " : {}", self.target_name(target));
            }
        }
        if entity.orphaned {
            out.push_str(" (orphaned)");
        } else if entity.invalid {
            out.push_str(" (invalid)");
        }
        out.push('\n');
        for &child in entity.namespaces.values() {
            self.dump_entity(child, depth + 1, out);
        }
        for &member in &entity.members {
            self.dump_entity(member, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_chain() {
        let mut graph = SemanticGraph::new();
        let inner = graph.namespace_or_insert("A.B.C");
        assert_eq!(graph.full_name(inner), "A.B.C");
        assert_eq!(graph.namespace("A.B"), graph.entity(inner).parent);
        assert_eq!(graph.namespace_or_insert("A.B.C"), inner);
        assert_eq!(graph.namespace(""), Some(graph.root));
        assert_eq!(graph.namespace("A.X"), None);
        assert_eq!(graph.display_name(graph.root), "<global namespace>");
    }

    #[test]
    fn test_type_lookup_by_arity() {
        let mut graph = SemanticGraph::new();
        let ns = graph.namespace_or_insert("N");
        let mut list = Entity::new(EntityKind::Class, "List", Some(ns));
        list.type_parameters.push("T".into());
        let list = graph.add_entity(list);
        graph.entity_mut(ns).types.insert(("List".into(), 1), list);
        assert_eq!(graph.lookup_type(ns, "List", 1), Some(list));
        assert_eq!(graph.lookup_type(ns, "List", 0), None);
        assert_eq!(graph.arities(ns, "List"), vec![1]);
        assert_eq!(graph.enclosing_namespace(list), ns);
        assert_eq!(graph.find_type("N.List"), Some(list));
    }

    #[test]
    fn test_type_ref_for_is_shared() {
        let mut graph = SemanticGraph::new();
        let a = graph.type_ref_for(FileId(0), NodeId(3));
        let b = graph.type_ref_for(FileId(0), NodeId(3));
        let c = graph.type_ref_for(FileId(1), NodeId(3));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(graph.resolution_counts(), [2, 0, 0, 0]);
    }
}
