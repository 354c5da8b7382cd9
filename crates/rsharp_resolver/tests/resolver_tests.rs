//! Type-reference resolution integration tests.
//!
//! Each test parses, builds and resolves a small compilation against the
//! built-in core library and checks the bound references and the
//! diagnostic codes of both phases.

use proptest::prelude::*;
use rsharp_core::CancellationToken;
use rsharp_parser::parse_text;
use rsharp_resolver::{core_library, resolve, AssemblyReference, ExternalScope, ReferencedUnit, Resolver};
use rsharp_semantic::{build, EntityId, ResolutionState, SemanticGraph, TypeRefId, TypeTarget};
use rsharp_syntax::SyntaxTree;
use std::sync::Arc;

struct Compiled {
    graph: SemanticGraph,
    codes: Vec<u32>,
}

/// Helper: parse each source as its own file.
fn parse_all(sources: &[&str]) -> Vec<SyntaxTree> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let result = parse_text(&format!("file{i}.cs"), *source, std::iter::empty::<&str>()).unwrap();
            assert!(
                result.diagnostics.is_empty(),
                "unexpected syntax errors in {source}: {:?}",
                result.diagnostics.diagnostics()
            );
            result.tree
        })
        .collect()
}

fn core() -> Vec<Arc<dyn ExternalScope>> {
    vec![Arc::new(core_library())]
}

fn compile_with(sources: &[&str], externals: &[Arc<dyn ExternalScope>]) -> Compiled {
    let trees = parse_all(sources);
    let output = build(&trees);
    let mut graph = output.graph;
    let mut codes: Vec<u32> = output.diagnostics.diagnostics().iter().map(|d| d.code).collect();
    let diagnostics = resolve(&trees, &mut graph, externals);
    codes.extend(diagnostics.diagnostics().iter().map(|d| d.code));
    Compiled { graph, codes }
}

fn compile(sources: &[&str]) -> Compiled {
    compile_with(sources, &core())
}

fn member(graph: &SemanticGraph, type_name: &str, member: &str) -> EntityId {
    let owner = graph.find_type(type_name).unwrap();
    graph
        .entity(owner)
        .members
        .iter()
        .copied()
        .find(|&m| graph.entity(m).name == member)
        .unwrap()
}

fn member_type(graph: &SemanticGraph, type_name: &str, name: &str) -> TypeRefId {
    graph.entity(member(graph, type_name, name)).ty.unwrap()
}

fn state(graph: &SemanticGraph, id: TypeRefId) -> ResolutionState {
    graph.type_ref(id).state.clone()
}

fn target_name(graph: &SemanticGraph, id: TypeRefId) -> String {
    graph.target_name(graph.type_ref(id).state.target().unwrap())
}

fn base_name(graph: &SemanticGraph, type_name: &str) -> Option<String> {
    let id = graph.find_type(type_name).unwrap();
    graph.entity(id).base_type.map(|base| target_name(graph, base))
}

fn interface_names(graph: &SemanticGraph, type_name: &str) -> Vec<String> {
    let id = graph.find_type(type_name).unwrap();
    graph
        .entity(id)
        .interfaces
        .iter()
        .map(|&i| target_name(graph, i))
        .collect()
}

// ============================================================================
// Partial base classes
// ============================================================================

#[test]
fn test_partial_parts_with_same_base() {
    let compiled = compile(&["partial class A : B {}", "partial class A : B {}", "class B {}"]);
    assert!(compiled.codes.is_empty());
    assert_eq!(base_name(&compiled.graph, "A").as_deref(), Some("B"));
}

#[test]
fn test_partial_parts_with_different_bases() {
    let compiled = compile(&["partial class A : B {}", "partial class A : C {}", "class B {} class C {}"]);
    assert_eq!(compiled.codes, vec![263]);
}

#[test]
fn test_base_and_interfaces_split_across_parts() {
    let compiled = compile(&[
        "partial class A : B, I {}",
        "partial class A : J, I {}",
        "class B {} interface I {} interface J {}",
    ]);
    assert!(compiled.codes.is_empty());
    assert_eq!(base_name(&compiled.graph, "A").as_deref(), Some("B"));
    assert_eq!(interface_names(&compiled.graph, "A"), vec!["I", "J"]);
}

#[test]
fn test_class_base_out_of_position() {
    let compiled = compile(&["class B {} interface I {} class A : I, B {} struct S : B {}"]);
    assert_eq!(compiled.codes, vec![527, 527]);
    assert_eq!(base_name(&compiled.graph, "A"), None);
}

#[test]
fn test_sealed_and_value_type_bases() {
    let compiled = compile(&["sealed class B {} class A : B {} class C : string {} class D : int {}"]);
    assert_eq!(compiled.codes, vec![509, 509, 509]);
}

#[test]
fn test_circular_base_classes() {
    let compiled = compile(&["class A : B {} class B : A {} class C : A {}"]);
    assert_eq!(compiled.codes, vec![146, 146]);
    assert_eq!(base_name(&compiled.graph, "A"), None);
    assert_eq!(base_name(&compiled.graph, "C").as_deref(), Some("A"));
}

// ============================================================================
// Simple and qualified names
// ============================================================================

#[test]
fn test_unresolved_type_is_reported_once() {
    let compiled = compile(&["class C { Foo x; void M() { x.Bar(); } }"]);
    assert_eq!(compiled.codes, vec![246]);
    let x = member_type(&compiled.graph, "C", "x");
    assert_eq!(state(&compiled.graph, x), ResolutionState::Error);
}

#[test]
fn test_resolution_is_idempotent() {
    let trees = parse_all(&["class C { Foo x; int y; }"]);
    let mut graph = build(&trees).graph;
    let externals = core();
    let x = member_type(&graph, "C", "x");
    let y = member_type(&graph, "C", "y");

    let mut resolver = Resolver::new(&trees, &mut graph, &externals);
    resolver.run().unwrap();
    let reported = resolver.diagnostics().len();
    assert_eq!(resolver.resolve_type_ref(x), ResolutionState::Error);
    assert_eq!(
        resolver.resolve_type_ref(y),
        ResolutionState::ResolvedToType(TypeTarget::Predefined("int".into()))
    );
    assert_eq!(resolver.diagnostics().len(), reported);
}

#[test]
fn test_generic_external_type_with_arguments() {
    let compiled = compile(&["using System.Collections.Generic; class C { List<int> xs; }"]);
    assert!(compiled.codes.is_empty());
    let graph = &compiled.graph;
    let xs = member_type(graph, "C", "xs");
    match state(graph, xs) {
        ResolutionState::ResolvedToType(TypeTarget::External(ty)) => {
            assert_eq!(ty.name, "List");
            assert_eq!(ty.unit, "mscorlib");
        }
        other => panic!("unexpected state {other:?}"),
    }
    let arguments = &graph.type_ref(xs).arguments;
    assert_eq!(arguments.len(), 1);
    assert_eq!(target_name(graph, arguments[0]), "int");
}

#[test]
fn test_wrong_number_of_type_arguments() {
    let compiled = compile(&["class C { System.Collections.Generic.List<int, string> xs; }"]);
    assert_eq!(compiled.codes, vec![305]);
}

#[test]
fn test_missing_name_in_namespace_and_type() {
    let compiled = compile(&["class A {} class C { System.Nope x; A.B y; }"]);
    assert_eq!(compiled.codes, vec![234, 426]);
}

#[test]
fn test_namespace_used_as_type() {
    let compiled = compile(&["namespace N {} class C { N x; }"]);
    assert_eq!(compiled.codes, vec![118]);
}

#[test]
fn test_type_parameters_bind_to_their_owner() {
    let compiled = compile(&["class C<T> { T x; void M<U>(U u, T t) {} }"]);
    assert!(compiled.codes.is_empty());
    let graph = &compiled.graph;
    let c = graph.find_type("C").unwrap();
    let x = member_type(graph, "C", "x");
    assert_eq!(state(graph, x), ResolutionState::ResolvedToTypeParameter { owner: c, index: 0 });

    let m = member(graph, "C", "M");
    let parameters = &graph.entity(m).parameters;
    assert_eq!(
        state(graph, parameters[0].ty.unwrap()),
        ResolutionState::ResolvedToTypeParameter { owner: m, index: 0 }
    );
    assert_eq!(
        state(graph, parameters[1].ty.unwrap()),
        ResolutionState::ResolvedToTypeParameter { owner: c, index: 0 }
    );
}

#[test]
fn test_type_parameter_with_type_arguments() {
    let compiled = compile(&["class C<T> { T<int> x; }"]);
    assert_eq!(compiled.codes, vec![307]);
}

#[test]
fn test_nested_types_by_simple_and_qualified_name() {
    let compiled = compile(&["class Outer { class Inner {} Inner i; } class Other { Outer.Inner j; }"]);
    assert!(compiled.codes.is_empty());
    let j = member_type(&compiled.graph, "Other", "j");
    assert_eq!(target_name(&compiled.graph, j), "Outer.Inner");
}

#[test]
fn test_inner_declaration_hides_outer() {
    let compiled = compile(&["class X {} namespace N { class X {} class C { global::X a; X b; } }"]);
    assert!(compiled.codes.is_empty());
    let graph = &compiled.graph;
    assert_eq!(target_name(graph, member_type(graph, "N.C", "a")), "X");
    assert_eq!(target_name(graph, member_type(graph, "N.C", "b")), "N.X");
}

// ============================================================================
// Using directives
// ============================================================================

#[test]
fn test_ambiguous_imported_names() {
    let compiled = compile(&[
        "namespace A { class X {} } namespace B { class X {} }",
        "namespace C { using A; using B; class D { X x; } }",
    ]);
    assert_eq!(compiled.codes, vec![104]);
}

#[test]
fn test_declared_type_wins_over_imports() {
    let compiled = compile(&[
        "namespace A { class X {} } namespace B { class X {} }",
        "namespace C { using A; using B; class X {} class D { X x; } }",
    ]);
    assert!(compiled.codes.is_empty());
    assert_eq!(target_name(&compiled.graph, member_type(&compiled.graph, "C.D", "x")), "C.X");
}

#[test]
fn test_using_resolves_relative_to_enclosing_namespace() {
    let compiled = compile(&["namespace A.B { class X {} } namespace A { using B; class C { X x; } }"]);
    assert!(compiled.codes.is_empty());
    assert_eq!(target_name(&compiled.graph, member_type(&compiled.graph, "A.C", "x")), "A.B.X");
}

#[test]
fn test_using_directive_errors() {
    let compiled = compile(&["using System; using System; using System.Console; using Nowhere; class C {}"]);
    assert_eq!(compiled.codes, vec![105, 138, 246]);
}

#[test]
fn test_aliases() {
    let compiled = compile(&[
        "using L = System.Collections.Generic.List<int>; using Sys = System; class C { L a; Sys.String b; Sys::Object c; }",
    ]);
    assert!(compiled.codes.is_empty());
    let graph = &compiled.graph;
    assert_eq!(target_name(graph, member_type(graph, "C", "a")), "System.Collections.Generic.List");
    assert_eq!(target_name(graph, member_type(graph, "C", "b")), "System.String");
    assert_eq!(target_name(graph, member_type(graph, "C", "c")), "System.Object");
}

#[test]
fn test_alias_errors() {
    let compiled = compile(&[
        "using A = System; using A = System.Text; namespace N { using X = System.String; class X {} } class C { Missing::Y y; }",
    ]);
    assert_eq!(compiled.codes, vec![1537, 576, 432]);
}

#[test]
fn test_self_referencing_alias_does_not_loop() {
    let compiled = compile(&["using A = A; class C { A x; }"]);
    assert_eq!(compiled.codes, vec![246]);
}

// ============================================================================
// External scopes
// ============================================================================

#[test]
fn test_assembly_manifest_types() {
    let manifest = r#"{ "name": "Acme.Widgets", "types": [
        { "namespace": "Acme", "name": "Widget", "kind": "class" },
        { "namespace": "Acme", "name": "IPart", "kind": "interface" }
    ] }"#;
    let reference = AssemblyReference::from_json("acme.json", manifest).unwrap();
    let externals: Vec<Arc<dyn ExternalScope>> = vec![Arc::new(core_library()), Arc::new(reference)];
    let compiled = compile_with(&["using Acme; class C : Widget, IPart {}"], &externals);
    assert!(compiled.codes.is_empty());
    let graph = &compiled.graph;
    let c = graph.entity(graph.find_type("C").unwrap());
    match state(graph, c.base_type.unwrap()) {
        ResolutionState::ResolvedToType(TypeTarget::External(ty)) => assert_eq!(ty.unit, "Acme.Widgets"),
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(interface_names(graph, "C"), vec!["Acme.IPart"]);
}

#[test]
fn test_without_core_library_system_is_unknown() {
    let compiled = compile_with(&["using System; class C { int x; }"], &[]);
    assert_eq!(compiled.codes, vec![246]);
}

#[test]
fn test_referenced_compilation_unit() {
    let library = build(&parse_all(&["namespace Shared { public class Service {} }"])).graph;
    let externals: Vec<Arc<dyn ExternalScope>> = vec![Arc::new(ReferencedUnit::new("shared", library))];
    let compiled = compile_with(&["using Shared; class C { Service s; }"], &externals);
    assert!(compiled.codes.is_empty());
    assert_eq!(target_name(&compiled.graph, member_type(&compiled.graph, "C", "s")), "Shared.Service");
}

// ============================================================================
// Cancellation and order independence
// ============================================================================

#[test]
fn test_cancelled_resolution_stops() {
    let trees = parse_all(&["class C { int x; }"]);
    let mut graph = build(&trees).graph;
    let externals = core();
    let token = CancellationToken::new();
    token.cancel();
    let mut resolver = Resolver::new(&trees, &mut graph, &externals).with_cancellation(token);
    assert!(resolver.run().is_err());
}

const PARTS: &[&str] = &[
    "partial class A : B, I {}",
    "partial class A : J {}",
    "partial class A : I, K {}",
    "class B {} interface I {} interface J {} interface K {}",
];

fn base_summary(order: &[usize]) -> (Option<String>, Vec<String>, Vec<u32>) {
    let sources: Vec<&str> = order.iter().map(|&i| PARTS[i]).collect();
    let compiled = compile(&sources);
    let mut interfaces = interface_names(&compiled.graph, "A");
    interfaces.sort();
    (base_name(&compiled.graph, "A"), interfaces, compiled.codes)
}

proptest! {
    #[test]
    fn prop_base_merge_is_order_independent(order in Just((0..PARTS.len()).collect::<Vec<_>>()).prop_shuffle()) {
        let expected = base_summary(&[0, 1, 2, 3]);
        prop_assert_eq!(base_summary(&order), expected);
    }
}
