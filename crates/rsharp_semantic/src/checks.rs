//! Declaration checks run while merging: modifier validity, partial
//! accessibility agreement, abstract and body rules, partial methods.

use crate::builder::SemanticBuilder;
use crate::collect::{MemberPart, TypePart};
use crate::entity::{DeclarationRef, EntityId, EntityKind};
use rsharp_diagnostics::messages;
use rsharp_syntax::{ModifierList, Modifiers};

const ACCESS: Modifiers = Modifiers::ACCESSIBILITY;

/// Modifiers a type declaration may carry.
pub fn allowed_type_modifiers(kind: EntityKind, nested: bool) -> Modifiers {
    let mut allowed = Modifiers::PUBLIC | Modifiers::INTERNAL | Modifiers::UNSAFE;
    if nested {
        allowed |= Modifiers::NEW | Modifiers::PROTECTED | Modifiers::PRIVATE;
    }
    match kind {
        EntityKind::Class => allowed | Modifiers::ABSTRACT | Modifiers::SEALED | Modifiers::STATIC | Modifiers::PARTIAL,
        EntityKind::Struct | EntityKind::Interface => allowed | Modifiers::PARTIAL,
        _ => allowed,
    }
}

/// Modifiers a member may carry inside a container of `container` kind.
pub fn allowed_member_modifiers(kind: EntityKind, container: EntityKind) -> Modifiers {
    if container == EntityKind::Interface {
        return Modifiers::NEW;
    }
    let overridable = Modifiers::VIRTUAL | Modifiers::SEALED | Modifiers::OVERRIDE | Modifiers::ABSTRACT;
    let allowed = match kind {
        EntityKind::Field => {
            Modifiers::NEW | ACCESS | Modifiers::STATIC | Modifiers::READONLY | Modifiers::VOLATILE | Modifiers::UNSAFE
        }
        EntityKind::Constant => Modifiers::NEW | ACCESS | Modifiers::CONST,
        EntityKind::Method => {
            Modifiers::NEW
                | ACCESS
                | Modifiers::STATIC
                | overridable
                | Modifiers::EXTERN
                | Modifiers::UNSAFE
                | Modifiers::PARTIAL
                | Modifiers::ASYNC
        }
        EntityKind::Property | EntityKind::Event => {
            Modifiers::NEW | ACCESS | Modifiers::STATIC | overridable | Modifiers::EXTERN | Modifiers::UNSAFE
        }
        EntityKind::Indexer => Modifiers::NEW | ACCESS | overridable | Modifiers::EXTERN | Modifiers::UNSAFE,
        EntityKind::Constructor => ACCESS | Modifiers::STATIC | Modifiers::EXTERN | Modifiers::UNSAFE,
        EntityKind::Destructor => Modifiers::EXTERN | Modifiers::UNSAFE,
        EntityKind::Operator => Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::EXTERN | Modifiers::UNSAFE,
        _ => Modifiers::NONE,
    };
    if container == EntityKind::Struct {
        allowed - (Modifiers::ABSTRACT | Modifiers::VIRTUAL | Modifiers::PROTECTED)
    } else {
        allowed
    }
}

impl SemanticBuilder<'_> {
    /// Repeats, disallowed modifiers and accessibility combinations.
    fn check_modifier_list(&mut self, at: DeclarationRef, list: &ModifierList, allowed: Modifiers) {
        let tree = self.tree(at.file);
        let mut seen = Modifiers::NONE;
        let mut rejected = Modifiers::NONE;
        for &token in &list.tokens {
            let Some(flag) = Modifiers::from_token(tree.token(token)) else {
                continue;
            };
            let text = tree.token(token).text.clone();
            if seen.contains(flag) {
                self.report_token(at.file, token, &messages::DUPLICATE_MODIFIER, &[&text]);
                continue;
            }
            seen |= flag;
            if !allowed.contains(flag) && !rejected.contains(flag) {
                rejected |= flag;
                self.report_token(at.file, token, &messages::MODIFIER_NOT_VALID_FOR_ITEM, &[&text]);
            }
        }
        let access = seen.accessibility();
        if access.bits().count_ones() > 1 && access != (Modifiers::PROTECTED | Modifiers::INTERNAL) {
            self.report(at, &messages::MORE_THAN_ONE_PROTECTION_MODIFIER, &[]);
        }
    }

    /// Each part of a partial type that states an accessibility must state
    /// the same one. Reported once per type.
    pub(crate) fn check_partial_accessibility(&mut self, id: EntityId, parts: &[TypePart]) {
        let mut first = None;
        for part in parts {
            let access = part.modifiers.flags.accessibility();
            if access.is_empty() {
                continue;
            }
            match first {
                None => first = Some(access),
                Some(expected) if expected != access => {
                    let name = self.graph.full_name(id);
                    self.report(
                        part.declaration,
                        &messages::PARTIAL_DECLARATIONS_CONFLICTING_ACCESSIBILITY,
                        &[&name],
                    );
                    return;
                }
                Some(_) => {}
            }
        }
    }

    pub(crate) fn check_type_modifiers(&mut self, container: EntityId, part: &TypePart) {
        let nested = self.graph.entity(container).kind.is_type();
        let allowed = allowed_type_modifiers(part.kind, nested);
        self.check_modifier_list(part.declaration, &part.modifiers, allowed);
    }

    /// Combinations judged on the merged modifiers of a class.
    pub(crate) fn check_class_modifiers(&mut self, id: EntityId) {
        let entity = self.graph.entity(id);
        if entity.kind != EntityKind::Class {
            return;
        }
        let flags = entity.modifiers;
        let Some(at) = entity.primary_declaration() else {
            return;
        };
        let name = self.graph.full_name(id);
        if flags.contains(Modifiers::ABSTRACT) && flags.intersects(Modifiers::SEALED | Modifiers::STATIC) {
            self.report(at, &messages::ABSTRACT_CLASS_SEALED_OR_STATIC, &[&name]);
        }
        if flags.contains(Modifiers::STATIC | Modifiers::SEALED) {
            self.report(at, &messages::STATIC_CLASS_SEALED, &[&name]);
        }
    }

    pub(crate) fn check_member(&mut self, type_id: EntityId, member: &MemberPart) {
        let container = self.graph.entity(type_id);
        let container_kind = container.kind;
        let container_abstract = container.modifiers.contains(Modifiers::ABSTRACT);
        let allowed = allowed_member_modifiers(member.kind, container_kind);
        self.check_modifier_list(member.declaration, &member.modifiers, allowed);
        if container_kind == EntityKind::Interface || member.kind == EntityKind::EnumMember {
            return;
        }

        let type_name = self.graph.full_name(type_id);
        let display = format!("{type_name}.{}", member.name);
        let flags = member.modifiers.flags;
        match member.kind {
            EntityKind::Method | EntityKind::Property | EntityKind::Indexer | EntityKind::Event
                if flags.contains(Modifiers::ABSTRACT) =>
            {
                if member.has_body {
                    self.report(member.declaration, &messages::ABSTRACT_MEMBER_WITH_BODY, &[&display]);
                }
                if container_kind == EntityKind::Class && !container_abstract {
                    self.report(
                        member.declaration,
                        &messages::ABSTRACT_MEMBER_IN_NON_ABSTRACT_CLASS,
                        &[&display, &type_name],
                    );
                }
                if member.kind == EntityKind::Method && flags.contains(Modifiers::VIRTUAL) {
                    self.report(member.declaration, &messages::ABSTRACT_MEMBER_MARKED_VIRTUAL, &[&display]);
                }
            }
            EntityKind::Method | EntityKind::Constructor | EntityKind::Destructor | EntityKind::Operator
                if !member.has_body
                    && !flags.intersects(Modifiers::EXTERN | Modifiers::ABSTRACT | Modifiers::PARTIAL) =>
            {
                self.report(member.declaration, &messages::MEMBER_MUST_DECLARE_BODY, &[&display]);
            }
            _ => {}
        }

        if member.kind == EntityKind::Method && flags.contains(Modifiers::PARTIAL) {
            if !member.returns_void {
                self.report(member.declaration, &messages::PARTIAL_METHOD_MUST_RETURN_VOID, &[]);
            }
            if member.has_out_parameter {
                self.report(member.declaration, &messages::PARTIAL_METHOD_OUT_PARAMETER, &[]);
            }
        }
    }
}
