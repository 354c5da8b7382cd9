//! Two-pass type-reference resolution.
//!
//! The declare pass builds every scope of every tree and records the
//! using directives; no type reference is looked at. The resolve pass then
//! visits each type node and binds it by walking the scope chain
//! innermost-first. Finally the base lists of every type are split into a
//! base class and an interface list.

use crate::external::ExternalScope;
use crate::scope::{AliasTarget, NamespaceScope, Scope, ScopeId, ScopeKind, ScopeTable, UsingAlias, UsingImport};
use rsharp_core::arena::ArenaIndex;
use rsharp_core::{CancellationToken, Cancelled};
use rsharp_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use rsharp_semantic::{
    DeclarationRef, EntityId, EntityKind, ExternalTypeKind, FileId, ResolutionState, SemanticGraph, TypeRefId,
    TypeTarget,
};
use rsharp_syntax::visitor::{walk_compilation_unit, walk_namespace, walk_type_declaration};
use rsharp_syntax::{visit_node, visit_tree, walk_children, NodeId, NodeKind, SyntaxTree, SyntaxVisitor};
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolve every type reference in `trees` against `graph` and the
/// external scopes, returning the resolution diagnostics.
pub fn resolve(
    trees: &[SyntaxTree],
    graph: &mut SemanticGraph,
    externals: &[Arc<dyn ExternalScope>],
) -> DiagnosticCollection {
    let mut resolver = Resolver::new(trees, graph, externals);
    // Without a token, run never stops early.
    match resolver.run() {
        Ok(()) | Err(Cancelled) => resolver.into_diagnostics(),
    }
}

/// What a name denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Namespace(String),
    Type(TypeTarget),
    TypeParameter { owner: EntityId, index: u32 },
}

enum Lookup {
    Found(Symbol),
    Ambiguous(TypeTarget, TypeTarget),
    /// The failure was already reported.
    Failed,
    NotFound { other_arity: Option<(String, u32)> },
}

/// Kind and sealedness of a resolved type, whatever its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TargetInfo {
    kind: ExternalTypeKind,
    sealed: bool,
}

pub struct Resolver<'a> {
    trees: &'a [SyntaxTree],
    graph: &'a mut SemanticGraph,
    externals: &'a [Arc<dyn ExternalScope>],
    scopes: ScopeTable,
    diagnostics: DiagnosticCollection,
    cancellation: Option<CancellationToken>,
    declared: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(trees: &'a [SyntaxTree], graph: &'a mut SemanticGraph, externals: &'a [Arc<dyn ExternalScope>]) -> Self {
        Self {
            trees,
            graph,
            externals,
            scopes: ScopeTable::new(),
            diagnostics: DiagnosticCollection::new(),
            cancellation: None,
            declared: false,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> DiagnosticCollection {
        self.diagnostics
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    /// Both passes, then base-list finalization. Cancellation is checked
    /// before each top-level declaration.
    pub fn run(&mut self) -> Result<(), Cancelled> {
        self.declare();
        self.resolve_directives();
        for index in 0..self.trees.len() {
            let file = FileId::from_usize(index);
            let tree = self.tree(file);
            for child in tree.children(tree.root) {
                if let Some(token) = &self.cancellation {
                    token.check()?;
                }
                let mut visitor = ResolveVisitor { resolver: self, file };
                visit_node(&mut visitor, tree, child);
            }
        }
        self.finalize_types();

        let [unresolved, types, parameters, errors] = self.graph.resolution_counts();
        debug!(unresolved, types, parameters, errors, "resolve pass finished");
        Ok(())
    }

    fn tree(&self, file: FileId) -> &'a SyntaxTree {
        &self.trees[file.index()]
    }

    fn report_node(&mut self, file: FileId, node: NodeId, message: &DiagnosticMessage, args: &[&str]) {
        let location = self.tree(file).location(node);
        self.diagnostics.add(Diagnostic::at(location, message, args));
    }

    fn report_declaration(&mut self, at: DeclarationRef, message: &DiagnosticMessage, args: &[&str]) {
        let location = self.tree(at.file).name_location(at.node);
        self.diagnostics.add(Diagnostic::at(location, message, args));
    }

    // ========================================================================
    // Declare pass
    // ========================================================================

    /// Build the scopes of every tree. Runs once; later calls do nothing.
    pub fn declare(&mut self) {
        if self.declared {
            return;
        }
        self.declared = true;
        for index in 0..self.trees.len() {
            let file = FileId::from_usize(index);
            let tree = self.tree(file);
            let mut visitor = DeclareVisitor {
                file,
                graph: &*self.graph,
                scopes: &mut self.scopes,
                diagnostics: &mut self.diagnostics,
                stack: Vec::new(),
            };
            visit_tree(&mut visitor, tree);
        }
        debug!(scopes = self.scopes.len(), "declare pass finished");
    }

    /// Bind using-namespace directives and alias targets. Each is resolved
    /// as if its own namespace body had no directives.
    fn resolve_directives(&mut self) {
        let scope_ids: Vec<ScopeId> = self.scopes.ids().collect();
        for scope in scope_ids {
            let file = self.scopes.get(scope).file;
            let Some(ns) = self.scopes.namespace(scope) else {
                continue;
            };
            let imports: Vec<NodeId> = ns.imports.iter().map(|import| import.name).collect();
            let aliases: Vec<String> = ns.aliases.keys().cloned().collect();

            for (index, name) in imports.into_iter().enumerate() {
                let (symbol, _) = self.resolve_name(file, scope, name, Some(scope));
                let namespace = match symbol {
                    Some(Symbol::Namespace(namespace)) => Some(namespace),
                    Some(_) => {
                        let text = self.tree(file).type_text(name);
                        self.report_node(file, name, &messages::USING_NAMESPACE_IS_A_TYPE, &[&text]);
                        None
                    }
                    None => None,
                };
                if let Some(ns) = self.scopes.namespace_mut(scope) {
                    ns.imports[index].namespace = namespace;
                }
            }
            for alias in aliases {
                self.resolve_alias(scope, &alias);
            }
        }
    }

    fn resolve_alias(&mut self, scope: ScopeId, alias: &str) -> AliasTarget {
        let file = self.scopes.get(scope).file;
        let Some(entry) = self.scopes.namespace(scope).and_then(|ns| ns.aliases.get(alias)) else {
            return AliasTarget::Error;
        };
        if let Some(resolved) = &entry.resolved {
            return resolved.clone();
        }
        let target = entry.target;
        // Guards `using A = A;`.
        self.set_alias(scope, alias, AliasTarget::Error);

        let (symbol, arguments) = self.resolve_name(file, scope, target, Some(scope));
        let result = match symbol {
            Some(Symbol::Namespace(namespace)) => AliasTarget::Namespace(namespace),
            Some(Symbol::Type(target_type)) => {
                let id = self.graph.type_ref_for(file, target);
                let reference = self.graph.type_ref_mut(id);
                reference.state = ResolutionState::ResolvedToType(target_type);
                reference.arguments = arguments;
                AliasTarget::Type(id)
            }
            _ => AliasTarget::Error,
        };
        self.set_alias(scope, alias, result.clone());
        result
    }

    fn set_alias(&mut self, scope: ScopeId, alias: &str, target: AliasTarget) {
        if let Some(entry) = self.scopes.namespace_mut(scope).and_then(|ns| ns.aliases.get_mut(alias)) {
            entry.resolved = Some(target);
        }
    }

    // ========================================================================
    // Resolve pass
    // ========================================================================

    /// Resolve one reference. A terminal state is returned as is, without
    /// new diagnostics.
    pub fn resolve_type_ref(&mut self, id: TypeRefId) -> ResolutionState {
        let reference = self.graph.type_ref(id);
        if reference.state.is_terminal() {
            return reference.state.clone();
        }
        let (file, node) = (reference.file, reference.node);
        let tree = self.tree(file);
        let (state, arguments) = match self.scopes.enclosing(tree, file, node) {
            Some(scope) => self.resolve_type_node(file, scope, node),
            None => (ResolutionState::Error, Vec::new()),
        };
        trace!(file = file.index(), node = node.0, ?state, "type reference resolved");
        let reference = self.graph.type_ref_mut(id);
        reference.state = state.clone();
        reference.arguments = arguments;
        state
    }

    fn resolve_type_node(&mut self, file: FileId, scope: ScopeId, node: NodeId) -> (ResolutionState, Vec<TypeRefId>) {
        let tree = self.tree(file);
        match tree.kind(node) {
            NodeKind::PredefinedType { keyword } => {
                let keyword = tree.token(*keyword).text.clone();
                (ResolutionState::ResolvedToType(TypeTarget::Predefined(keyword)), Vec::new())
            }
            NodeKind::NullableType { element }
            | NodeKind::PointerType { element }
            | NodeKind::ArrayType { element, .. } => self.resolve_type_node(file, scope, *element),
            NodeKind::NamedType { .. } => {
                let (symbol, arguments) = self.resolve_name(file, scope, node, None);
                let state = match symbol {
                    Some(Symbol::Type(target)) => ResolutionState::ResolvedToType(target),
                    Some(Symbol::TypeParameter { owner, index }) => {
                        ResolutionState::ResolvedToTypeParameter { owner, index }
                    }
                    Some(Symbol::Namespace(namespace)) => {
                        self.report_node(file, node, &messages::NAMESPACE_USED_AS_TYPE, &[&namespace]);
                        ResolutionState::Error
                    }
                    None => ResolutionState::Error,
                };
                (state, arguments)
            }
            _ => (ResolutionState::Error, Vec::new()),
        }
    }

    /// Resolve a (possibly qualified, possibly alias-qualified) name to a
    /// namespace or type. Type arguments of every segment get references
    /// of their own, resolved even when the name itself fails.
    fn resolve_name(
        &mut self,
        file: FileId,
        scope: ScopeId,
        node: NodeId,
        skip_directives: Option<ScopeId>,
    ) -> (Option<Symbol>, Vec<TypeRefId>) {
        let tree = self.tree(file);
        let NodeKind::NamedType { alias, segments } = tree.kind(node) else {
            return (None, Vec::new());
        };

        let mut arguments = Vec::new();
        for segment in segments {
            for &argument in &segment.type_arguments {
                let id = self.graph.type_ref_for(file, argument);
                self.resolve_type_ref(id);
                arguments.push(id);
            }
        }

        let Some(first) = segments.first() else {
            return (None, arguments);
        };
        let first_name = tree.ident_text(first.name);
        if first_name.is_empty() {
            return (None, arguments);
        }
        let first_arity = first.type_arguments.len() as u32;

        let lookup = match alias {
            Some(_) => {
                let alias_name = tree.ident_text(*alias);
                match self.alias_namespace(scope, alias_name) {
                    Some(namespace) => self.member_of(&Symbol::Namespace(namespace), first_name, first_arity),
                    None => {
                        self.report_node(file, node, &messages::ALIAS_NOT_FOUND, &[alias_name]);
                        return (None, arguments);
                    }
                }
            }
            None => self.lookup(scope, first_name, first_arity, skip_directives),
        };
        let Some(mut current) = self.accept(file, node, lookup, first_name, None) else {
            return (None, arguments);
        };
        if matches!(current, Symbol::TypeParameter { .. }) && first_arity > 0 {
            self.report_node(file, node, &messages::TYPE_PARAMETER_WITH_TYPE_ARGUMENTS, &[first_name]);
            return (None, arguments);
        }

        for segment in &segments[1..] {
            let name = tree.ident_text(segment.name);
            if name.is_empty() {
                return (None, arguments);
            }
            let arity = segment.type_arguments.len() as u32;
            let lookup = self.member_of(&current, name, arity);
            match self.accept(file, node, lookup, name, Some(&current)) {
                Some(symbol) => current = symbol,
                None => return (None, arguments),
            }
        }
        (Some(current), arguments)
    }

    /// Turn a lookup result into a symbol, reporting the failure otherwise.
    fn accept(
        &mut self,
        file: FileId,
        node: NodeId,
        lookup: Lookup,
        name: &str,
        container: Option<&Symbol>,
    ) -> Option<Symbol> {
        match lookup {
            Lookup::Found(symbol) => Some(symbol),
            Lookup::Failed => None,
            Lookup::Ambiguous(a, b) => {
                let (a, b) = (self.graph.target_name(&a), self.graph.target_name(&b));
                self.report_node(file, node, &messages::AMBIGUOUS_REFERENCE, &[name, &a, &b]);
                None
            }
            Lookup::NotFound {
                other_arity: Some((display, arity)),
            } => {
                self.report_node(file, node, &messages::WRONG_NUMBER_OF_TYPE_ARGUMENTS, &[&display, &arity.to_string()]);
                None
            }
            Lookup::NotFound { other_arity: None } => {
                match container {
                    None => self.report_node(file, node, &messages::TYPE_OR_NAMESPACE_NOT_FOUND, &[name]),
                    Some(Symbol::Namespace(namespace)) => {
                        let display = if namespace.is_empty() {
                            "<global namespace>".to_string()
                        } else {
                            namespace.clone()
                        };
                        self.report_node(file, node, &messages::NAME_DOES_NOT_EXIST_IN_NAMESPACE, &[name, &display]);
                    }
                    Some(Symbol::Type(target)) => {
                        let display = self.graph.target_name(target);
                        self.report_node(file, node, &messages::NAME_DOES_NOT_EXIST_IN_TYPE, &[name, &display]);
                    }
                    Some(Symbol::TypeParameter { owner, index }) => {
                        let display = self
                            .graph
                            .entity(*owner)
                            .type_parameters
                            .get(*index as usize)
                            .cloned()
                            .unwrap_or_default();
                        self.report_node(file, node, &messages::NAME_DOES_NOT_EXIST_IN_TYPE, &[name, &display]);
                    }
                }
                None
            }
        }
    }

    /// The namespace an `alias::` qualifier names.
    fn alias_namespace(&mut self, scope: ScopeId, alias: &str) -> Option<String> {
        if alias == "global" {
            return Some(String::new());
        }
        let chain: Vec<ScopeId> = self.scopes.chain(scope).collect();
        for id in chain {
            let Some(ns) = self.scopes.namespace(id) else {
                continue;
            };
            if ns.aliases.contains_key(alias) {
                return match self.resolve_alias(id, alias) {
                    AliasTarget::Namespace(namespace) => Some(namespace),
                    _ => None,
                };
            }
            // Extern aliases name referenced units, whose types all live
            // under the global namespace.
            if ns.extern_aliases.iter().any(|a| a == alias) {
                return Some(String::new());
            }
        }
        None
    }

    /// Simple-name lookup along the scope chain, innermost first.
    fn lookup(&mut self, scope: ScopeId, name: &str, arity: u32, skip_directives: Option<ScopeId>) -> Lookup {
        trace!(name, arity, "scope lookup");
        let mut other_arity = None;
        let chain: Vec<ScopeId> = self.scopes.chain(scope).collect();
        for id in chain {
            match self.scopes.get(id).kind.clone() {
                ScopeKind::Method(owner) => {
                    if let Some(symbol) = self.type_parameter(owner, name) {
                        return Lookup::Found(symbol);
                    }
                }
                ScopeKind::Type(owner) => {
                    if let Some(symbol) = self.type_parameter(owner, name) {
                        return Lookup::Found(symbol);
                    }
                    if let Some(nested) = self.graph.lookup_type(owner, name, arity) {
                        return Lookup::Found(Symbol::Type(TypeTarget::Entity(nested)));
                    }
                    if other_arity.is_none() {
                        other_arity = self
                            .graph
                            .arities(owner, name)
                            .into_iter()
                            .next()
                            .map(|a| (self.qualified(&self.graph.full_name(owner), name), a));
                    }
                }
                ScopeKind::Namespace(ns) => {
                    if let Some(target) = self.type_in_namespace(&ns.name, name, arity) {
                        return Lookup::Found(Symbol::Type(target));
                    }
                    let child = self.qualified(&ns.name, name);
                    if arity == 0 && self.namespace_exists(&child) {
                        return Lookup::Found(Symbol::Namespace(child));
                    }
                    if other_arity.is_none() {
                        other_arity = self.other_arity_in_namespace(&ns.name, name, arity);
                    }
                    if skip_directives == Some(id) {
                        continue;
                    }
                    match self.lookup_directives(id, &ns, name, arity, &mut other_arity) {
                        Lookup::NotFound { .. } => {}
                        found => return found,
                    }
                }
            }
        }
        Lookup::NotFound { other_arity }
    }

    /// Aliases, then imported namespaces, of one namespace body.
    fn lookup_directives(
        &mut self,
        scope: ScopeId,
        ns: &NamespaceScope,
        name: &str,
        arity: u32,
        other_arity: &mut Option<(String, u32)>,
    ) -> Lookup {
        if arity == 0 && ns.aliases.contains_key(name) {
            return match self.resolve_alias(scope, name) {
                AliasTarget::Namespace(namespace) => Lookup::Found(Symbol::Namespace(namespace)),
                AliasTarget::Type(id) => match self.graph.type_ref(id).state.target() {
                    Some(target) => Lookup::Found(Symbol::Type(target.clone())),
                    None => Lookup::Failed,
                },
                AliasTarget::Error => Lookup::Failed,
            };
        }

        let mut matches: Vec<TypeTarget> = Vec::new();
        for import in &ns.imports {
            let Some(imported) = &import.namespace else {
                continue;
            };
            match self.type_in_namespace(imported, name, arity) {
                Some(target) if !matches.contains(&target) => matches.push(target),
                Some(_) => {}
                None if other_arity.is_none() => *other_arity = self.other_arity_in_namespace(imported, name, arity),
                None => {}
            }
        }
        let mut matches = matches.into_iter();
        match (matches.next(), matches.next()) {
            (Some(a), Some(b)) => Lookup::Ambiguous(a, b),
            (Some(a), None) => Lookup::Found(Symbol::Type(a)),
            _ => Lookup::NotFound { other_arity: None },
        }
    }

    /// `name` as a member of a namespace or type.
    fn member_of(&self, container: &Symbol, name: &str, arity: u32) -> Lookup {
        match container {
            Symbol::Namespace(namespace) => {
                if let Some(target) = self.type_in_namespace(namespace, name, arity) {
                    return Lookup::Found(Symbol::Type(target));
                }
                let child = self.qualified(namespace, name);
                if arity == 0 && self.namespace_exists(&child) {
                    return Lookup::Found(Symbol::Namespace(child));
                }
                Lookup::NotFound {
                    other_arity: self.other_arity_in_namespace(namespace, name, arity),
                }
            }
            Symbol::Type(TypeTarget::Entity(owner)) => match self.graph.lookup_type(*owner, name, arity) {
                Some(nested) => Lookup::Found(Symbol::Type(TypeTarget::Entity(nested))),
                None => Lookup::NotFound {
                    other_arity: self
                        .graph
                        .arities(*owner, name)
                        .into_iter()
                        .next()
                        .map(|a| (self.qualified(&self.graph.full_name(*owner), name), a)),
                },
            },
            _ => Lookup::NotFound { other_arity: None },
        }
    }

    /// Arity is not part of the match; `T<int>` finds `T` and is
    /// reported by the caller.
    fn type_parameter(&self, owner: EntityId, name: &str) -> Option<Symbol> {
        let index = self.graph.entity(owner).type_parameters.iter().position(|p| p == name)?;
        Some(Symbol::TypeParameter {
            owner,
            index: index as u32,
        })
    }

    /// Source types first, then external scopes in reference order.
    fn type_in_namespace(&self, namespace: &str, name: &str, arity: u32) -> Option<TypeTarget> {
        if let Some(id) = self
            .graph
            .namespace(namespace)
            .and_then(|ns| self.graph.lookup_type(ns, name, arity))
        {
            return Some(TypeTarget::Entity(id));
        }
        self.externals
            .iter()
            .find_map(|scope| scope.lookup_type(namespace, name, arity))
            .map(TypeTarget::External)
    }

    fn other_arity_in_namespace(&self, namespace: &str, name: &str, arity: u32) -> Option<(String, u32)> {
        let mut arities = self
            .graph
            .namespace(namespace)
            .map(|ns| self.graph.arities(ns, name))
            .unwrap_or_default();
        for scope in self.externals {
            arities.extend(scope.arities(namespace, name));
        }
        arities
            .into_iter()
            .find(|&a| a != arity)
            .map(|a| (self.qualified(namespace, name), a))
    }

    fn namespace_exists(&self, namespace: &str) -> bool {
        self.graph.namespace(namespace).is_some() || self.externals.iter().any(|scope| scope.has_namespace(namespace))
    }

    fn qualified(&self, prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    }

    // ========================================================================
    // Base lists
    // ========================================================================

    fn target_info(&self, target: &TypeTarget) -> TargetInfo {
        match target {
            TypeTarget::Entity(id) => {
                let entity = self.graph.entity(*id);
                let kind = match entity.kind {
                    EntityKind::Struct => ExternalTypeKind::Struct,
                    EntityKind::Interface => ExternalTypeKind::Interface,
                    EntityKind::Enum => ExternalTypeKind::Enum,
                    EntityKind::Delegate => ExternalTypeKind::Delegate,
                    _ => ExternalTypeKind::Class,
                };
                let sealed = kind != ExternalTypeKind::Interface
                    && (kind != ExternalTypeKind::Class
                        || entity.modifiers.intersects(rsharp_syntax::Modifiers::SEALED | rsharp_syntax::Modifiers::STATIC));
                TargetInfo { kind, sealed }
            }
            TypeTarget::External(ty) => TargetInfo {
                kind: ty.kind,
                sealed: ty.sealed || !matches!(ty.kind, ExternalTypeKind::Class | ExternalTypeKind::Interface),
            },
            TypeTarget::Predefined(keyword) => match keyword.as_str() {
                "object" | "dynamic" => TargetInfo {
                    kind: ExternalTypeKind::Class,
                    sealed: false,
                },
                "string" => TargetInfo {
                    kind: ExternalTypeKind::Class,
                    sealed: true,
                },
                _ => TargetInfo {
                    kind: ExternalTypeKind::Struct,
                    sealed: true,
                },
            },
        }
    }

    fn finalize_types(&mut self) {
        let types: Vec<EntityId> = self.graph.types().collect();
        for &id in &types {
            self.finalize_bases(id);
        }
        self.check_base_cycles(&types);
    }

    /// Split the written base lists of a type into its base class and
    /// its deduplicated interfaces.
    fn finalize_bases(&mut self, id: EntityId) {
        let entity = self.graph.entity(id);
        let is_class = entity.kind == EntityKind::Class;
        let base_lists = entity.base_lists.clone();
        let declarations = entity.declarations.clone();
        let full_name = self.graph.full_name(id);

        let mut base: Option<(TypeRefId, TypeTarget)> = None;
        let mut conflict_reported = false;
        let mut interfaces = Vec::new();
        let mut seen: Vec<TypeTarget> = Vec::new();

        for (part, list) in base_lists.iter().enumerate() {
            for (position, &reference) in list.iter().enumerate() {
                let (file, node) = {
                    let r = self.graph.type_ref(reference);
                    (r.file, r.node)
                };
                let Some(target) = self.graph.type_ref(reference).state.target().cloned() else {
                    if matches!(
                        self.graph.type_ref(reference).state,
                        ResolutionState::ResolvedToTypeParameter { .. }
                    ) {
                        let text = self.tree(file).type_text(node);
                        self.report_node(file, node, &messages::NOT_AN_INTERFACE_IN_INTERFACE_LIST, &[&text]);
                    }
                    continue;
                };
                let info = self.target_info(&target);
                let name = self.graph.target_name(&target);

                if info.kind != ExternalTypeKind::Interface {
                    if !(is_class && position == 0) {
                        self.report_node(file, node, &messages::NOT_AN_INTERFACE_IN_INTERFACE_LIST, &[&name]);
                        continue;
                    }
                    match &base {
                        None => {
                            if info.sealed {
                                self.report_node(file, node, &messages::CANNOT_DERIVE_FROM_SEALED_TYPE, &[&full_name, &name]);
                            }
                            if info.kind == ExternalTypeKind::Class {
                                base = Some((reference, target));
                            }
                        }
                        Some((_, existing)) if *existing != target && !conflict_reported => {
                            conflict_reported = true;
                            if let Some(&declaration) = declarations.get(part) {
                                self.report_declaration(
                                    declaration,
                                    &messages::PARTIAL_DECLARATIONS_DIFFERENT_BASE_CLASSES,
                                    &[&full_name],
                                );
                            }
                        }
                        Some(_) => {}
                    }
                    continue;
                }

                if !seen.contains(&target) {
                    seen.push(target);
                    interfaces.push(reference);
                }
            }
        }

        let entity = self.graph.entity_mut(id);
        entity.base_type = base.map(|(reference, _)| reference);
        entity.interfaces = interfaces;
    }

    fn base_entity(&self, id: EntityId) -> Option<EntityId> {
        let base = self.graph.entity(id).base_type?;
        match self.graph.type_ref(base).state.target()? {
            TypeTarget::Entity(entity) => Some(*entity),
            _ => None,
        }
    }

    /// Report every class whose base chain leads back to itself, then cut
    /// those chains so later walks terminate.
    fn check_base_cycles(&mut self, types: &[EntityId]) {
        let limit = types.len();
        let mut cyclic = Vec::new();
        for &id in types {
            let mut current = id;
            for _ in 0..=limit {
                match self.base_entity(current) {
                    Some(next) if next == id => {
                        cyclic.push(id);
                        break;
                    }
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        for &id in &cyclic {
            let Some(base) = self.base_entity(id) else {
                continue;
            };
            let (name, base_name) = (self.graph.full_name(id), self.graph.full_name(base));
            if let Some(declaration) = self.graph.entity(id).primary_declaration() {
                self.report_declaration(declaration, &messages::CIRCULAR_BASE_CLASS, &[&name, &base_name]);
            }
        }
        for id in cyclic {
            self.graph.entity_mut(id).base_type = None;
        }
    }
}

// ============================================================================
// Visitors
// ============================================================================

struct DeclareVisitor<'r> {
    file: FileId,
    graph: &'r SemanticGraph,
    scopes: &'r mut ScopeTable,
    diagnostics: &'r mut DiagnosticCollection,
    stack: Vec<ScopeId>,
}

impl DeclareVisitor<'_> {
    fn open(&mut self, kind: ScopeKind, opened_by: Option<NodeId>) -> ScopeId {
        let scope = Scope {
            kind,
            parent: self.stack.last().copied(),
            file: self.file,
        };
        let id = self
            .scopes
            .add(scope, opened_by.map(|node| DeclarationRef::new(self.file, node)));
        self.stack.push(id);
        id
    }

    fn current_namespace(&self) -> Option<ScopeId> {
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|&id| self.scopes.namespace(id).is_some())
    }

    fn report(&mut self, tree: &SyntaxTree, node: NodeId, message: &DiagnosticMessage, args: &[&str]) {
        self.diagnostics.add(Diagnostic::at(tree.location(node), message, args));
    }

    fn add_import(&mut self, tree: &SyntaxTree, node: NodeId, name: NodeId) {
        let Some(scope) = self.current_namespace() else {
            return;
        };
        let text = tree.type_text(name);
        let Some(ns) = self.scopes.namespace_mut(scope) else {
            return;
        };
        if ns.imports.iter().any(|import| tree.type_text(import.name) == text) {
            self.report(tree, name, &messages::DUPLICATE_USING_DIRECTIVE, &[&text]);
            return;
        }
        ns.imports.push(UsingImport {
            node,
            name,
            namespace: None,
        });
    }

    fn add_alias(&mut self, tree: &SyntaxTree, node: NodeId, alias: &str, target: NodeId) {
        let Some(scope) = self.current_namespace() else {
            return;
        };
        let Some(ns) = self.scopes.namespace_mut(scope) else {
            return;
        };
        if alias.is_empty() {
            return;
        }
        if ns.aliases.contains_key(alias) {
            let location = tree.name_location(node);
            self.diagnostics
                .add(Diagnostic::at(location, &messages::DUPLICATE_USING_ALIAS, &[alias]));
            return;
        }
        ns.aliases.insert(
            alias.to_string(),
            UsingAlias {
                node,
                target,
                resolved: None,
            },
        );

        let namespace_name = ns.name.clone();
        if let Some(namespace) = self.graph.namespace(&namespace_name) {
            let entity = self.graph.entity(namespace);
            if entity.namespaces.contains_key(alias) || self.graph.lookup_type(namespace, alias, 0).is_some() {
                let display = self.graph.display_name(namespace);
                let location = tree.name_location(node);
                self.diagnostics.add(Diagnostic::at(
                    location,
                    &messages::ALIAS_CONFLICTS_WITH_DECLARATION,
                    &[&display, alias],
                ));
            }
        }
    }
}

impl SyntaxVisitor for DeclareVisitor<'_> {
    fn visit_compilation_unit(&mut self, tree: &SyntaxTree, node: NodeId) {
        self.open(ScopeKind::Namespace(NamespaceScope::new("")), Some(node));
        walk_compilation_unit(self, tree, node);
        self.stack.pop();
    }

    fn visit_namespace(&mut self, tree: &SyntaxTree, node: NodeId) {
        match tree.kind(node) {
            NodeKind::NamespaceDeclaration(decl) => {
                let mut name = self
                    .current_namespace()
                    .and_then(|id| self.scopes.namespace(id))
                    .map(|ns| ns.name.clone())
                    .unwrap_or_default();
                let last = decl.name.len().saturating_sub(1);
                for (i, &token) in decl.name.iter().enumerate() {
                    if !name.is_empty() {
                        name.push('.');
                    }
                    name.push_str(tree.ident_text(Some(token)));
                    let opened_by = (i == last).then_some(node);
                    self.open(ScopeKind::Namespace(NamespaceScope::new(name.clone())), opened_by);
                }
                walk_namespace(self, tree, node);
                for _ in &decl.name {
                    self.stack.pop();
                }
            }
            NodeKind::UsingNamespace { name } => self.add_import(tree, node, *name),
            NodeKind::UsingAlias { alias, target } => {
                let alias = tree.ident_text(*alias).to_string();
                self.add_alias(tree, node, &alias, *target);
            }
            NodeKind::ExternAlias { name } => {
                let name = tree.ident_text(*name).to_string();
                if let Some(ns) = self.current_namespace().and_then(|id| self.scopes.namespace_mut(id)) {
                    ns.extern_aliases.push(name);
                }
            }
            _ => {}
        }
    }

    fn visit_type_declaration(&mut self, tree: &SyntaxTree, node: NodeId) {
        match self.graph.entity_of(self.file, node) {
            Some(entity) => {
                self.open(ScopeKind::Type(entity), Some(node));
                walk_type_declaration(self, tree, node);
                self.stack.pop();
            }
            None => walk_type_declaration(self, tree, node),
        }
    }

    fn visit_member(&mut self, tree: &SyntaxTree, node: NodeId) {
        let NodeKind::MethodDeclaration(method) = tree.kind(node) else {
            return;
        };
        if method.type_parameters.is_empty() {
            return;
        }
        if let Some(entity) = self.graph.entity_of(self.file, node) {
            self.open(ScopeKind::Method(entity), Some(node));
            self.stack.pop();
        }
    }

    fn visit_type(&mut self, _tree: &SyntaxTree, _node: NodeId) {}

    fn visit_statement(&mut self, _tree: &SyntaxTree, _node: NodeId) {}

    fn visit_expression(&mut self, _tree: &SyntaxTree, _node: NodeId) {}

    fn visit_other(&mut self, _tree: &SyntaxTree, _node: NodeId) {}
}

struct ResolveVisitor<'r, 'a> {
    resolver: &'r mut Resolver<'a>,
    file: FileId,
}

impl SyntaxVisitor for ResolveVisitor<'_, '_> {
    fn visit_namespace(&mut self, tree: &SyntaxTree, node: NodeId) {
        // Directives were bound before this pass.
        if matches!(tree.kind(node), NodeKind::NamespaceDeclaration(_)) {
            walk_namespace(self, tree, node);
        }
    }

    fn visit_type(&mut self, tree: &SyntaxTree, node: NodeId) {
        if matches!(tree.kind(node), NodeKind::ImplicitType) {
            return;
        }
        let id = self.resolver.graph.type_ref_for(self.file, node);
        self.resolver.resolve_type_ref(id);
    }

    fn visit_other(&mut self, tree: &SyntaxTree, node: NodeId) {
        // Attribute names are not resolved; their arguments are.
        if let NodeKind::Attribute { arguments, .. } = tree.kind(node) {
            for &argument in arguments {
                visit_node(self, tree, argument);
            }
            return;
        }
        walk_children(self, tree, node);
    }
}
