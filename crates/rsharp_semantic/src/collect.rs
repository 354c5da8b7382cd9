//! The collection phase: a read-only walk over one syntax tree that records
//! every namespace, type and member declaration as a part. Nothing is
//! merged or checked here.

use crate::entity::{DeclarationRef, EntityKind, FileId};
use crate::signature::signature_key;
use rsharp_core::arena::ArenaIndex;
use rsharp_syntax::visitor::{walk_namespace, walk_type_declaration};
use rsharp_syntax::{
    visit_tree, ConversionKind, ModifierList, NodeId, NodeKind, SyntaxTree, SyntaxVisitor, TokenKind,
    TypeDeclarationKind,
};

/// Parts declared by one file.
#[derive(Debug, Clone)]
pub struct FileParts {
    pub file: FileId,
    pub namespaces: Vec<NamespacePart>,
    /// Types declared directly in a namespace; nested types hang off
    /// their enclosing part.
    pub types: Vec<TypePart>,
}

#[derive(Debug, Clone)]
pub struct NamespacePart {
    pub declaration: DeclarationRef,
    pub position: u32,
    /// Full dotted name, including enclosing namespace declarations.
    pub name: String,
}

/// One declaration of a type. Several parts merge into one entity when
/// the type is partial.
#[derive(Debug, Clone)]
pub struct TypePart {
    pub declaration: DeclarationRef,
    pub position: u32,
    /// Full dotted name of the enclosing namespace.
    pub namespace: String,
    pub kind: EntityKind,
    pub name: String,
    pub modifiers: ModifierList,
    pub type_parameters: Vec<String>,
    pub bases: Vec<NodeId>,
    /// Delegate return type or enum underlying type.
    pub ty: Option<NodeId>,
    pub parameters: Vec<NodeId>,
    pub members: Vec<MemberPart>,
    pub nested: Vec<TypePart>,
}

impl TypePart {
    pub fn arity(&self) -> u32 {
        self.type_parameters.len() as u32
    }

    pub fn sort_key(&self) -> (FileId, u32) {
        (self.declaration.file, self.position)
    }

    pub fn is_partial(&self) -> bool {
        self.modifiers.contains(rsharp_syntax::Modifiers::PARTIAL)
    }
}

/// One member declaration. Multi-declarator fields and events give one
/// part per declarator.
#[derive(Debug, Clone)]
pub struct MemberPart {
    pub declaration: DeclarationRef,
    pub position: u32,
    pub kind: EntityKind,
    pub name: String,
    pub modifiers: ModifierList,
    pub ty: Option<NodeId>,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<NodeId>,
    /// Overload key for methods, constructors, destructors, indexers and
    /// operators; `None` for members identified by name alone.
    pub signature: Option<String>,
    pub has_body: bool,
    pub returns_void: bool,
    pub has_out_parameter: bool,
}

impl MemberPart {
    pub fn sort_key(&self) -> (FileId, u32) {
        (self.declaration.file, self.position)
    }
}

/// Collect the declaration parts of one tree.
pub fn collect(file: FileId, tree: &SyntaxTree) -> FileParts {
    let mut collector = Collector {
        file,
        namespace: Vec::new(),
        stack: Vec::new(),
        parts: FileParts {
            file,
            namespaces: Vec::new(),
            types: Vec::new(),
        },
    };
    visit_tree(&mut collector, tree);
    collector.parts
}

struct Collector {
    file: FileId,
    namespace: Vec<String>,
    stack: Vec<TypePart>,
    parts: FileParts,
}

impl Collector {
    fn declaration(&self, node: NodeId) -> DeclarationRef {
        DeclarationRef::new(self.file, node)
    }

    fn type_part(&self, tree: &SyntaxTree, node: NodeId) -> Option<TypePart> {
        let mut part = TypePart {
            declaration: self.declaration(node),
            position: tree.span(node).start,
            namespace: self.namespace.join("."),
            kind: EntityKind::Class,
            name: tree.ident_text(tree.kind(node).declared_name()).to_string(),
            modifiers: ModifierList::default(),
            type_parameters: Vec::new(),
            bases: Vec::new(),
            ty: None,
            parameters: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
        };
        match tree.kind(node) {
            NodeKind::TypeDeclaration(decl) => {
                part.kind = match decl.kind {
                    TypeDeclarationKind::Class => EntityKind::Class,
                    TypeDeclarationKind::Struct => EntityKind::Struct,
                    TypeDeclarationKind::Interface => EntityKind::Interface,
                };
                part.modifiers = decl.modifiers.clone();
                part.type_parameters = type_parameter_names(tree, &decl.type_parameters);
                part.bases = decl.base_list.clone();
            }
            NodeKind::EnumDeclaration(decl) => {
                part.kind = EntityKind::Enum;
                part.modifiers = decl.modifiers.clone();
                part.ty = decl.underlying_type;
            }
            NodeKind::DelegateDeclaration(decl) => {
                part.kind = EntityKind::Delegate;
                part.modifiers = decl.modifiers.clone();
                part.type_parameters = type_parameter_names(tree, &decl.type_parameters);
                part.ty = Some(decl.return_type);
                part.parameters = decl.parameters.clone();
            }
            _ => return None,
        }
        Some(part)
    }

    fn member_parts(&self, tree: &SyntaxTree, node: NodeId) -> Vec<MemberPart> {
        let base = |kind: EntityKind, decl_node: NodeId, name: String, modifiers: &ModifierList| MemberPart {
            declaration: self.declaration(decl_node),
            position: tree.span(decl_node).start,
            kind,
            name,
            modifiers: modifiers.clone(),
            ty: None,
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            signature: None,
            has_body: false,
            returns_void: false,
            has_out_parameter: false,
        };

        match tree.kind(node) {
            NodeKind::FieldDeclaration(decl) => {
                let kind = if decl.constant { EntityKind::Constant } else { EntityKind::Field };
                decl.declarators
                    .iter()
                    .map(|&declarator| {
                        let name = tree.ident_text(tree.kind(declarator).declared_name()).to_string();
                        MemberPart {
                            ty: Some(decl.ty),
                            ..base(kind, declarator, name, &decl.modifiers)
                        }
                    })
                    .collect()
            }
            NodeKind::MethodDeclaration(decl) => {
                let name = qualified_member_name(tree, decl.explicit_interface, tree.ident_text(decl.name));
                let type_parameters = type_parameter_names(tree, &decl.type_parameters);
                let signature = signature_key(tree, &name, &type_parameters, &decl.parameters);
                vec![MemberPart {
                    ty: Some(decl.return_type),
                    signature: Some(signature),
                    has_body: decl.body.is_some(),
                    returns_void: is_void(tree, decl.return_type),
                    has_out_parameter: has_out_parameter(tree, &decl.parameters),
                    parameters: decl.parameters.clone(),
                    type_parameters,
                    ..base(EntityKind::Method, node, name, &decl.modifiers)
                }]
            }
            NodeKind::ConstructorDeclaration(decl) => {
                let name = tree.ident_text(decl.name).to_string();
                let key_name = if decl.modifiers.contains(rsharp_syntax::Modifiers::STATIC) {
                    ".cctor"
                } else {
                    ".ctor"
                };
                vec![MemberPart {
                    signature: Some(signature_key(tree, key_name, &[], &decl.parameters)),
                    has_body: decl.body.is_some(),
                    parameters: decl.parameters.clone(),
                    ..base(EntityKind::Constructor, node, name, &decl.modifiers)
                }]
            }
            NodeKind::DestructorDeclaration(decl) => {
                let name = format!("~{}", tree.ident_text(decl.name));
                vec![MemberPart {
                    signature: Some("Finalize()".to_string()),
                    has_body: decl.body.is_some(),
                    ..base(EntityKind::Destructor, node, name, &decl.modifiers)
                }]
            }
            NodeKind::PropertyDeclaration(decl) => {
                let name = qualified_member_name(tree, decl.explicit_interface, tree.ident_text(decl.name));
                vec![MemberPart {
                    ty: Some(decl.ty),
                    has_body: decl.expression_body.is_some() || accessors_have_bodies(tree, &decl.accessors),
                    ..base(EntityKind::Property, node, name, &decl.modifiers)
                }]
            }
            NodeKind::IndexerDeclaration(decl) => {
                let name = qualified_member_name(tree, decl.explicit_interface, "this");
                vec![MemberPart {
                    ty: Some(decl.ty),
                    signature: Some(signature_key(tree, &name, &[], &decl.parameters)),
                    has_body: decl.expression_body.is_some() || accessors_have_bodies(tree, &decl.accessors),
                    parameters: decl.parameters.clone(),
                    ..base(EntityKind::Indexer, node, name, &decl.modifiers)
                }]
            }
            NodeKind::EventDeclaration(decl) if decl.declarators.is_empty() => {
                let name = qualified_member_name(tree, decl.explicit_interface, tree.ident_text(decl.name));
                vec![MemberPart {
                    ty: Some(decl.ty),
                    has_body: accessors_have_bodies(tree, &decl.accessors),
                    ..base(EntityKind::Event, node, name, &decl.modifiers)
                }]
            }
            NodeKind::EventDeclaration(decl) => decl
                .declarators
                .iter()
                .map(|&declarator| {
                    let name = tree.ident_text(tree.kind(declarator).declared_name()).to_string();
                    MemberPart {
                        ty: Some(decl.ty),
                        ..base(EntityKind::Event, declarator, name, &decl.modifiers)
                    }
                })
                .collect(),
            NodeKind::OperatorDeclaration(decl) => {
                let name = match decl.conversion {
                    Some(ConversionKind::Implicit) => format!("implicit operator {}", tree.type_text(decl.return_type)),
                    Some(ConversionKind::Explicit) => format!("explicit operator {}", tree.type_text(decl.return_type)),
                    None => {
                        let symbol: String = decl.operator.iter().map(|&t| tree.token(t).text.as_str()).collect();
                        format!("operator {symbol}")
                    }
                };
                vec![MemberPart {
                    ty: Some(decl.return_type),
                    signature: Some(signature_key(tree, &name, &[], &decl.parameters)),
                    has_body: decl.body.is_some(),
                    parameters: decl.parameters.clone(),
                    ..base(EntityKind::Operator, node, name, &decl.modifiers)
                }]
            }
            NodeKind::EnumMember { name, .. } => {
                let name = tree.ident_text(*name).to_string();
                vec![base(EntityKind::EnumMember, node, name, &ModifierList::default())]
            }
            _ => Vec::new(),
        }
    }
}

impl SyntaxVisitor for Collector {
    fn visit_namespace(&mut self, tree: &SyntaxTree, node: NodeId) {
        let NodeKind::NamespaceDeclaration(decl) = tree.kind(node) else {
            return;
        };
        let pushed = decl.name.len();
        self.namespace
            .extend(decl.name.iter().map(|&token| tree.ident_text(Some(token)).to_string()));
        self.parts.namespaces.push(NamespacePart {
            declaration: self.declaration(node),
            position: tree.span(node).start,
            name: self.namespace.join("."),
        });
        walk_namespace(self, tree, node);
        self.namespace.truncate(self.namespace.len() - pushed);
    }

    fn visit_type_declaration(&mut self, tree: &SyntaxTree, node: NodeId) {
        let Some(part) = self.type_part(tree, node) else {
            return;
        };
        self.stack.push(part);
        walk_type_declaration(self, tree, node);
        let Some(part) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(enclosing) => enclosing.nested.push(part),
            None => self.parts.types.push(part),
        }
    }

    fn visit_member(&mut self, tree: &SyntaxTree, node: NodeId) {
        let parts = self.member_parts(tree, node);
        if let Some(owner) = self.stack.last_mut() {
            owner.members.extend(parts);
        }
    }

    fn visit_type(&mut self, _tree: &SyntaxTree, _node: NodeId) {}

    fn visit_statement(&mut self, _tree: &SyntaxTree, _node: NodeId) {}

    fn visit_expression(&mut self, _tree: &SyntaxTree, _node: NodeId) {}
}

fn type_parameter_names(tree: &SyntaxTree, parameters: &[NodeId]) -> Vec<String> {
    parameters
        .iter()
        .map(|&p| tree.ident_text(tree.kind(p).declared_name()).to_string())
        .collect()
}

/// `IComparable<T>.CompareTo` for explicit implementations, else `name`.
fn qualified_member_name(tree: &SyntaxTree, explicit_interface: Option<NodeId>, name: &str) -> String {
    match explicit_interface {
        Some(interface) => format!("{}.{}", tree.type_text(interface), name),
        None => name.to_string(),
    }
}

fn is_void(tree: &SyntaxTree, ty: NodeId) -> bool {
    matches!(tree.kind(ty), NodeKind::PredefinedType { keyword } if tree.token(*keyword).kind == TokenKind::VoidKeyword)
}

fn has_out_parameter(tree: &SyntaxTree, parameters: &[NodeId]) -> bool {
    parameters.iter().any(|&p| {
        matches!(tree.kind(p), NodeKind::Parameter(param) if param.modifier == rsharp_syntax::ParameterModifier::Out)
    })
}

fn accessors_have_bodies(tree: &SyntaxTree, accessors: &[NodeId]) -> bool {
    accessors
        .iter()
        .any(|&a| matches!(tree.kind(a), NodeKind::Accessor(accessor) if accessor.body.is_some()))
}

/// Parts of every tree, with file ids given by position in `trees`.
pub fn collect_all(trees: &[SyntaxTree]) -> Vec<FileParts> {
    trees
        .iter()
        .enumerate()
        .map(|(index, tree)| collect(FileId::from_usize(index), tree))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsharp_parser::parse_text;

    fn parts(source: &str) -> FileParts {
        let result = parse_text("t.cs", source, std::iter::empty::<&str>()).unwrap();
        collect(FileId(0), &result.tree)
    }

    #[test]
    fn test_collect_namespaces_and_nesting() {
        let parts = parts("namespace A.B { class C { class D {} int x, y; } } namespace A { struct S {} }");
        let names: Vec<&str> = parts.namespaces.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A.B", "A"]);
        assert_eq!(parts.types.len(), 2);
        let c = &parts.types[0];
        assert_eq!((c.namespace.as_str(), c.name.as_str(), c.kind), ("A.B", "C", EntityKind::Class));
        assert_eq!(c.nested.len(), 1);
        let fields: Vec<&str> = c.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "y"]);
        assert_eq!(parts.types[1].kind, EntityKind::Struct);
    }

    #[test]
    fn test_collect_member_shapes() {
        let parts = parts(
            "class C<T> : B { C() {} ~C() {} partial void P(out int x); int this[int i] { get { return 0; } } \
             public static C<T> operator +(C<T> a, C<T> b) { return a; } event E Changed; void I.M() {} }",
        );
        let c = &parts.types[0];
        assert_eq!(c.type_parameters, vec!["T".to_string()]);
        assert_eq!(c.bases.len(), 1);
        let summary: Vec<(EntityKind, &str)> = c.members.iter().map(|m| (m.kind, m.name.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (EntityKind::Constructor, "C"),
                (EntityKind::Destructor, "~C"),
                (EntityKind::Method, "P"),
                (EntityKind::Indexer, "this"),
                (EntityKind::Operator, "operator +"),
                (EntityKind::Event, "Changed"),
                (EntityKind::Method, "I.M"),
            ]
        );
        let partial = &c.members[2];
        assert!(partial.returns_void);
        assert!(partial.has_out_parameter);
        assert!(!partial.has_body);
        assert!(c.members[3].has_body);
        assert!(c.members[5].signature.is_none());
    }

    #[test]
    fn test_collect_enum_and_delegate() {
        let parts = parts("enum E : byte { A, B } delegate T D<T>(int x);");
        assert_eq!(parts.types[0].kind, EntityKind::Enum);
        assert_eq!(parts.types[0].members.len(), 2);
        assert!(parts.types[0].ty.is_some());
        assert_eq!(parts.types[1].kind, EntityKind::Delegate);
        assert_eq!(parts.types[1].arity(), 1);
        assert_eq!(parts.types[1].parameters.len(), 1);
    }
}
