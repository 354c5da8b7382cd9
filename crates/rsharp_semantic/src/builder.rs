//! The merge phase: turns collected parts into the entity graph.
//!
//! Parts are processed in canonical order (file index, then source
//! position), so the resulting graph and the reported diagnostics do not
//! depend on the order in which files were collected. Partial types merge
//! into one entity; duplicate non-partial types become orphaned entities
//! that stay in the arena but are not reachable by name.

use crate::collect::{collect_all, FileParts, MemberPart, TypePart};
use crate::entity::{DeclarationRef, Entity, EntityId, EntityKind, FileId, ParameterInfo};
use crate::graph::SemanticGraph;
use rsharp_core::arena::ArenaIndex;
use rsharp_core::collections::FxIndexMap;
use rsharp_core::{CancellationToken, Cancelled};
use rsharp_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use rsharp_syntax::{NodeId, NodeKind, SyntaxTree, TokenId};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// The graph built from a set of trees and the declaration diagnostics.
#[derive(Debug)]
pub struct BuildOutput {
    pub graph: SemanticGraph,
    pub diagnostics: DiagnosticCollection,
}

/// Build the entity graph for `trees`. File ids are indices into `trees`.
pub fn build(trees: &[SyntaxTree]) -> BuildOutput {
    let builder = SemanticBuilder::new(trees);
    let parts = collect_all(trees);
    builder.finish(parts)
}

/// Builder with optional cooperative cancellation between type groups.
pub struct SemanticBuilder<'a> {
    trees: &'a [SyntaxTree],
    pub(crate) graph: SemanticGraph,
    pub(crate) diagnostics: DiagnosticCollection,
    cancellation: Option<CancellationToken>,
}

/// How a member name is already used inside one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameUse {
    Type,
    Method,
    Other,
}

#[derive(Debug, Default)]
struct SignatureUse {
    partial: bool,
    defining: bool,
    implementing: bool,
}

enum MemberItem {
    Member(MemberPart),
    Nested(Vec<TypePart>),
}

impl<'a> SemanticBuilder<'a> {
    pub fn new(trees: &'a [SyntaxTree]) -> Self {
        Self {
            trees,
            graph: SemanticGraph::new(),
            diagnostics: DiagnosticCollection::new(),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Collect and merge, checking for cancellation between type groups.
    pub fn build(self) -> Result<BuildOutput, Cancelled> {
        let parts = collect_all(self.trees);
        self.merge(parts)
    }

    /// Merge already collected parts.
    pub fn merge(mut self, parts: Vec<FileParts>) -> Result<BuildOutput, Cancelled> {
        let mut namespaces = Vec::new();
        let mut types = Vec::new();
        for file in parts {
            namespaces.extend(file.namespaces);
            types.extend(file.types);
        }

        namespaces.sort_by_key(|part| (part.declaration.file, part.position));
        for part in namespaces {
            let id = self.graph.namespace_or_insert(&part.name);
            self.graph.entity_mut(id).declarations.push(part.declaration);
            self.graph.link(part.declaration, id);
        }

        let groups = group_types(types);
        debug!(groups = groups.len(), "merging top-level types");
        for group in groups {
            if let Some(token) = &self.cancellation {
                token.check()?;
            }
            let namespace = self.graph.namespace_or_insert(&group[0].namespace);
            self.merge_type_group(namespace, group);
        }

        debug!(
            entities = self.graph.entities.len(),
            diagnostics = self.diagnostics.len(),
            "semantic graph built"
        );
        Ok(BuildOutput {
            graph: self.graph,
            diagnostics: self.diagnostics,
        })
    }

    fn finish(self, parts: Vec<FileParts>) -> BuildOutput {
        match self.merge(parts) {
            Ok(output) => output,
            // Without a token the merge never stops early.
            Err(Cancelled) => BuildOutput {
                graph: SemanticGraph::new(),
                diagnostics: DiagnosticCollection::new(),
            },
        }
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    pub(crate) fn tree(&self, file: FileId) -> &'a SyntaxTree {
        &self.trees[file.index()]
    }

    pub(crate) fn report(&mut self, at: DeclarationRef, message: &DiagnosticMessage, args: &[&str]) {
        let location = self.tree(at.file).name_location(at.node);
        self.diagnostics.add(Diagnostic::at(location, message, args));
    }

    pub(crate) fn report_token(&mut self, file: FileId, token: TokenId, message: &DiagnosticMessage, args: &[&str]) {
        let location = self.tree(file).token_location(token);
        self.diagnostics.add(Diagnostic::at(location, message, args));
    }

    fn report_duplicate(&mut self, container: EntityId, at: DeclarationRef, name: &str) {
        let container_name = self.graph.display_name(container);
        let message = if self.graph.entity(container).kind == EntityKind::Namespace {
            &messages::NAMESPACE_ALREADY_CONTAINS_DEFINITION
        } else {
            &messages::TYPE_ALREADY_CONTAINS_DEFINITION
        };
        self.report(at, message, &[&container_name, name]);
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Merge the parts of one (container, name, arity) group.
    fn merge_type_group(&mut self, container: EntityId, group: Vec<TypePart>) {
        let base_kind = group.iter().find(|p| p.is_partial()).map(|p| p.kind);
        let mergeable = group.len() > 1 && base_kind.is_some_and(EntityKind::is_partial_capable);
        if !mergeable {
            let mut parts = group.into_iter();
            if let Some(first) = parts.next() {
                self.check_namespace_clash(container, &first);
                self.create_type(container, vec![first], false);
            }
            for duplicate in parts {
                self.report_duplicate(container, duplicate.declaration, &duplicate.name);
                self.create_type(container, vec![duplicate], true);
            }
            return;
        }

        let Some(base_kind) = base_kind else {
            return;
        };
        let (merged, orphans): (Vec<TypePart>, Vec<TypePart>) =
            group.into_iter().partition(|part| part.kind == base_kind);

        if let Some(first) = merged.first() {
            let full_name = self.qualified(container, &first.name);
            for part in &merged {
                if !part.is_partial() {
                    self.report(part.declaration, &messages::MISSING_PARTIAL_MODIFIER, &[&full_name]);
                }
            }
            self.check_namespace_clash(container, first);
        }
        if !merged.is_empty() {
            self.create_type(container, merged, false);
        }
        for part in orphans {
            let full_name = self.qualified(container, &part.name);
            self.report(part.declaration, &messages::PARTIAL_DECLARATIONS_DIFFERENT_KINDS, &[&full_name]);
            self.create_type(container, vec![part], true);
        }
    }

    fn qualified(&self, container: EntityId, name: &str) -> String {
        let prefix = self.graph.full_name(container);
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    }

    /// A non-generic type may not share its name with a sibling namespace.
    fn check_namespace_clash(&mut self, container: EntityId, part: &TypePart) {
        let entity = self.graph.entity(container);
        if entity.kind == EntityKind::Namespace && part.arity() == 0 && entity.namespaces.contains_key(&part.name) {
            self.report_duplicate(container, part.declaration, &part.name);
        }
    }

    fn create_type(&mut self, container: EntityId, parts: Vec<TypePart>, orphaned: bool) -> EntityId {
        let first = &parts[0];
        let file = first.declaration.file;
        let mut entity = Entity::new(first.kind, first.name.clone(), Some(container));
        entity.type_parameters = first.type_parameters.clone();
        entity.orphaned = orphaned;
        entity.invalid = orphaned;
        for part in &parts {
            entity.modifiers |= part.modifiers.flags;
            entity.declarations.push(part.declaration);
        }
        let key = (first.name.clone(), first.arity());
        let id = self.graph.add_entity(entity);
        for part in &parts {
            self.graph.link(part.declaration, id);
        }
        if !orphaned {
            self.graph.entity_mut(container).types.insert(key, id);
        }
        self.graph.entity_mut(container).members.push(id);
        if parts.len() > 1 {
            trace!(name = %self.graph.full_name(id), parts = parts.len(), "merged partial type");
        }

        self.check_partial_accessibility(id, &parts);
        for part in &parts {
            self.check_type_modifiers(container, part);
        }
        self.check_class_modifiers(id);

        for part in &parts {
            let file = part.declaration.file;
            let bases = part.bases.iter().map(|&node| self.graph.type_ref_for(file, node)).collect();
            self.graph.entity_mut(id).base_lists.push(bases);
        }
        let ty = parts[0].ty.map(|node| self.graph.type_ref_for(file, node));
        let parameters = self.parameter_infos(file, &parts[0].parameters);
        let entity = self.graph.entity_mut(id);
        entity.ty = ty;
        entity.parameters = parameters;

        self.build_members(id, parts);
        id
    }

    fn parameter_infos(&mut self, file: FileId, parameters: &[NodeId]) -> Vec<ParameterInfo> {
        let tree = self.tree(file);
        parameters
            .iter()
            .filter_map(|&node| match tree.kind(node) {
                NodeKind::Parameter(param) => Some(ParameterInfo {
                    name: tree.ident_text(param.name).to_string(),
                    modifier: param.modifier,
                    ty: param.ty.map(|ty| self.graph.type_ref_for(file, ty)),
                }),
                _ => None,
            })
            .collect()
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn build_members(&mut self, type_id: EntityId, parts: Vec<TypePart>) {
        let type_name = self.graph.entity(type_id).name.clone();
        let mut items: Vec<((FileId, u32), MemberItem)> = Vec::new();
        let mut nested = Vec::new();
        for part in parts {
            items.extend(part.members.into_iter().map(|m| (m.sort_key(), MemberItem::Member(m))));
            nested.extend(part.nested);
        }
        items.extend(
            group_types(nested)
                .into_iter()
                .map(|group| (group[0].sort_key(), MemberItem::Nested(group))),
        );
        items.sort_by_key(|(key, _)| *key);

        let mut names: FxHashMap<String, NameUse> = FxHashMap::default();
        let mut signatures: FxHashMap<String, SignatureUse> = FxHashMap::default();
        for (_, item) in items {
            match item {
                MemberItem::Member(member) => {
                    self.add_member(type_id, &type_name, member, &mut names, &mut signatures);
                }
                MemberItem::Nested(group) => {
                    for part in &group {
                        if part.name == type_name {
                            self.report(part.declaration, &messages::MEMBER_NAME_SAME_AS_ENCLOSING_TYPE, &[&part.name]);
                        }
                    }
                    let name = group[0].name.clone();
                    match names.get(&name) {
                        Some(NameUse::Type) => {}
                        Some(_) => self.report_duplicate(type_id, group[0].declaration, &name),
                        None => {
                            names.insert(name, NameUse::Type);
                        }
                    }
                    self.merge_type_group(type_id, group);
                }
            }
        }
    }

    fn add_member(
        &mut self,
        type_id: EntityId,
        type_name: &str,
        member: MemberPart,
        names: &mut FxHashMap<String, NameUse>,
        signatures: &mut FxHashMap<String, SignatureUse>,
    ) {
        let file = member.declaration.file;
        let mut entity = Entity::new(member.kind, member.name.clone(), Some(type_id));
        entity.modifiers = member.modifiers.flags;
        entity.declarations.push(member.declaration);
        entity.type_parameters = member.type_parameters.clone();
        entity.ty = member.ty.map(|node| self.graph.type_ref_for(file, node));
        entity.parameters = self.parameter_infos(file, &member.parameters);
        let id = self.graph.add_entity(entity);
        self.graph.link(member.declaration, id);
        self.graph.entity_mut(type_id).members.push(id);

        if !matches!(
            member.kind,
            EntityKind::Constructor | EntityKind::Destructor | EntityKind::EnumMember
        ) && member.name == type_name
        {
            self.report(member.declaration, &messages::MEMBER_NAME_SAME_AS_ENCLOSING_TYPE, &[&member.name]);
        }

        let mut invalid = false;
        let named = !matches!(
            member.kind,
            EntityKind::Constructor | EntityKind::Destructor | EntityKind::Indexer | EntityKind::Operator
        );
        if named {
            let usage = if member.kind == EntityKind::Method { NameUse::Method } else { NameUse::Other };
            match names.get(&member.name) {
                Some(&NameUse::Method) if usage == NameUse::Method => {}
                Some(_) => {
                    self.report_duplicate(type_id, member.declaration, &member.name);
                    invalid = true;
                }
                None => {
                    names.insert(member.name.clone(), usage);
                }
            }
        }
        if !invalid {
            if let Some(signature) = &member.signature {
                invalid = self.check_signature(type_id, &member, signature, signatures);
            }
        }

        self.check_member(type_id, &member);
        if invalid {
            self.graph.entity_mut(id).invalid = true;
        }
    }

    /// Returns true when the member duplicates an earlier signature.
    fn check_signature(
        &mut self,
        type_id: EntityId,
        member: &MemberPart,
        signature: &str,
        signatures: &mut FxHashMap<String, SignatureUse>,
    ) -> bool {
        let partial = member.kind == EntityKind::Method && member.modifiers.contains(rsharp_syntax::Modifiers::PARTIAL);
        let Some(existing) = signatures.get_mut(signature) else {
            signatures.insert(
                signature.to_string(),
                SignatureUse {
                    partial,
                    defining: partial && !member.has_body,
                    implementing: partial && member.has_body,
                },
            );
            return false;
        };

        if partial && existing.partial {
            if member.has_body {
                if existing.implementing {
                    self.report(member.declaration, &messages::PARTIAL_METHOD_MULTIPLE_IMPLEMENTING, &[]);
                    return true;
                }
                existing.implementing = true;
            } else {
                if existing.defining {
                    self.report(member.declaration, &messages::PARTIAL_METHOD_MULTIPLE_DEFINING, &[]);
                    return true;
                }
                existing.defining = true;
            }
            return false;
        }

        let type_name = self.graph.full_name(type_id);
        self.report(member.declaration, &messages::MEMBER_WITH_SAME_PARAMETER_TYPES, &[&type_name, &member.name]);
        true
    }
}

/// Sort parts canonically and group them by (namespace, name, arity).
/// Groups are ordered by their first part.
fn group_types(mut parts: Vec<TypePart>) -> Vec<Vec<TypePart>> {
    parts.sort_by_key(TypePart::sort_key);
    let mut groups: FxIndexMap<(String, String, u32), Vec<TypePart>> = FxIndexMap::default();
    for part in parts {
        groups
            .entry((part.namespace.clone(), part.name.clone(), part.arity()))
            .or_default()
            .push(part);
    }
    groups.into_values().collect()
}
