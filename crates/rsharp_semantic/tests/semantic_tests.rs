//! Entity builder integration tests.
//!
//! Tests the parse -> collect -> merge pipeline and the declaration
//! diagnostics it reports.

use proptest::prelude::*;
use rsharp_parser::parse_text;
use rsharp_semantic::collect::collect_all;
use rsharp_semantic::{build, BuildOutput, EntityKind, SemanticBuilder, SemanticGraph};
use rsharp_syntax::{Modifiers, SyntaxTree};

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

fn build_sources(sources: &[&str]) -> (Vec<SyntaxTree>, BuildOutput) {
    let trees = parse_all(sources);
    let output = build(&trees);
    (trees, output)
}

fn codes(output: &BuildOutput) -> Vec<u32> {
    output.diagnostics.diagnostics().iter().map(|d| d.code).collect()
}

fn member_names(graph: &SemanticGraph, full_name: &str) -> Vec<String> {
    let id = graph.find_type(full_name).unwrap();
    graph
        .entity(id)
        .members
        .iter()
        .map(|&m| graph.entity(m).name.clone())
        .collect()
}

// ============================================================================
// Namespaces and types
// ============================================================================

#[test]
fn test_build_empty_file() {
    let (_, output) = build_sources(&[""]);
    assert!(codes(&output).is_empty());
    let root = output.graph.entity(output.graph.root);
    assert!(root.types.is_empty());
    assert!(root.namespaces.is_empty());
}

#[test]
fn test_namespaces_merge_across_files() {
    let (_, output) = build_sources(&[
        "namespace Shop.Orders { class Order {} }",
        "namespace Shop { namespace Orders { class Line {} } }",
    ]);
    assert!(codes(&output).is_empty());
    let graph = &output.graph;
    let orders = graph.namespace("Shop.Orders").unwrap();
    assert_eq!(graph.entity(orders).declarations.len(), 2);
    assert!(graph.find_type("Shop.Orders.Order").is_some());
    assert!(graph.find_type("Shop.Orders.Line").is_some());
}

#[test]
fn test_generic_arity_is_part_of_the_key() {
    let (_, output) = build_sources(&["class List {} class List<T> {} class List<K, V> {}"]);
    assert!(codes(&output).is_empty());
    let graph = &output.graph;
    assert_eq!(graph.arities(graph.root, "List"), vec![0, 1, 2]);
}

#[test]
fn test_duplicate_type_in_namespace() {
    let (_, output) = build_sources(&["namespace N { class A {} }", "namespace N { struct A {} }"]);
    assert_eq!(codes(&output), vec![101]);
    let graph = &output.graph;
    let ns = graph.namespace("N").unwrap();
    let kept = graph.lookup_type(ns, "A", 0).unwrap();
    assert_eq!(graph.entity(kept).kind, EntityKind::Class);
    let orphans: Vec<_> = graph.types().filter(|&id| graph.entity(id).orphaned).collect();
    assert_eq!(orphans.len(), 1);
    assert_eq!(graph.entity(orphans[0]).kind, EntityKind::Struct);
}

#[test]
fn test_duplicate_message_names_global_namespace() {
    let (_, output) = build_sources(&["class A {} class A {}"]);
    let diagnostic = &output.diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.code, 101);
    assert!(diagnostic.message_text.contains("<global namespace>"));
    assert_eq!(diagnostic.position().map(|p| (p.line, p.column)), Some((1, 18)));
}

#[test]
fn test_type_named_like_sibling_namespace() {
    let (_, output) = build_sources(&["namespace N.M {} namespace N { class M {} }"]);
    assert_eq!(codes(&output), vec![101]);
}

// ============================================================================
// Partial types
// ============================================================================

#[test]
fn test_partial_parts_merge() {
    let (_, output) = build_sources(&[
        "namespace N { public partial class A { int x; } }",
        "namespace N { partial class A { void M() {} } }",
    ]);
    assert!(codes(&output).is_empty());
    let graph = &output.graph;
    let a = graph.find_type("N.A").unwrap();
    let entity = graph.entity(a);
    assert_eq!(entity.declarations.len(), 2);
    assert!(entity.modifiers.contains(Modifiers::PUBLIC | Modifiers::PARTIAL));
    assert_eq!(member_names(graph, "N.A"), vec!["x", "M"]);
}

#[test]
fn test_missing_partial_modifier() {
    let (_, output) = build_sources(&["partial class A {}", "class A {}"]);
    assert_eq!(codes(&output), vec![260]);
    assert_eq!(output.graph.entity(output.graph.find_type("A").unwrap()).declarations.len(), 2);
}

#[test]
fn test_partial_parts_of_different_kinds() {
    let (_, output) = build_sources(&["partial class A {}", "partial struct A {}"]);
    assert_eq!(codes(&output), vec![261]);
}

#[test]
fn test_partial_accessibility_conflict_reported_once() {
    let (_, output) = build_sources(&[
        "public partial class A {}",
        "internal partial class A {}",
        "private partial class A {}",
    ]);
    let count = codes(&output).iter().filter(|&&c| c == 262).count();
    assert_eq!(count, 1);
}

#[test]
fn test_partial_bases_recorded_per_part() {
    let (_, output) = build_sources(&["partial class A : B {}", "partial class A : B, I {}"]);
    assert!(codes(&output).is_empty());
    let graph = &output.graph;
    let a = graph.entity(graph.find_type("A").unwrap());
    let lengths: Vec<usize> = a.base_lists.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![1, 2]);
}

// ============================================================================
// Members
// ============================================================================

#[test]
fn test_nested_type_named_like_enclosing_type() {
    let (_, output) = build_sources(&["class A { class A { } }"]);
    assert_eq!(codes(&output), vec![542]);
}

#[test]
fn test_member_named_like_enclosing_type() {
    let (_, output) = build_sources(&["class A { int A; A() {} }"]);
    assert_eq!(codes(&output), vec![542]);
}

#[test]
fn test_duplicate_signature_marks_second_invalid() {
    let (_, output) = build_sources(&["class C { void M(int a) {} void M(int b) {} void M(string s) {} }"]);
    assert_eq!(codes(&output), vec![111]);
    let graph = &output.graph;
    let c = graph.entity(graph.find_type("C").unwrap());
    let invalid: Vec<bool> = c.members.iter().map(|&m| graph.entity(m).invalid).collect();
    assert_eq!(invalid, vec![false, true, false]);
}

#[test]
fn test_generic_method_overloads() {
    let (_, output) = build_sources(&["class C { void M<T>(T x) {} void M<U>(U y) {} void M(int x) {} }"]);
    assert_eq!(codes(&output), vec![111]);
}

#[test]
fn test_ref_and_out_collide() {
    let (_, output) = build_sources(&["class C { void M(ref int x) {} void M(out int x) { x = 0; } void M(int x) {} }"]);
    assert_eq!(codes(&output), vec![111]);
}

#[test]
fn test_name_collisions() {
    let (_, output) = build_sources(&["class C { int X; string X; void M() {} int M; class N {} void N() {} }"]);
    assert_eq!(codes(&output), vec![102, 102, 102]);
}

#[test]
fn test_constructor_and_indexer_overloads() {
    let (_, output) = build_sources(&[
        "class C { C() {} C(int x) {} static C() {} int this[int i] { get { return i; } } int this[string s] { get { return 0; } } }",
    ]);
    assert!(codes(&output).is_empty());
}

#[test]
fn test_partial_method_rules() {
    let (_, output) = build_sources(&[
        "partial class C { partial void A(); partial void A() {} partial int B(); partial void D(out int x); }",
    ]);
    assert_eq!(codes(&output), vec![766, 752]);
}

#[test]
fn test_partial_method_repeated_declarations() {
    let (_, output) = build_sources(&[
        "partial class C { partial void A(); partial void A(); }",
        "partial class C { partial void A() {} partial void A() {} }",
    ]);
    assert_eq!(codes(&output), vec![756, 757]);
}

// ============================================================================
// Modifiers and bodies
// ============================================================================

#[test]
fn test_duplicate_and_invalid_modifiers() {
    let (_, output) = build_sources(&["class C { public public int x; readonly void M() {} }"]);
    assert_eq!(codes(&output), vec![1004, 106]);
}

#[test]
fn test_protection_modifiers() {
    let (_, output) = build_sources(&["class C { public private int x; protected internal int y; }"]);
    assert_eq!(codes(&output), vec![107]);
}

#[test]
fn test_class_modifier_combinations() {
    let (_, output) = build_sources(&["abstract sealed class A {} static sealed class B {}"]);
    assert_eq!(codes(&output), vec![418, 441]);
}

#[test]
fn test_abstract_member_rules() {
    let (_, output) = build_sources(&[
        "class C { abstract void A(); } abstract class D { abstract void B() {} abstract virtual void E(); }",
    ]);
    assert_eq!(codes(&output), vec![513, 500, 503]);
}

#[test]
fn test_missing_bodies() {
    let (_, output) = build_sources(&[
        "class C { void A(); extern void B(); C(); } interface I { void M(); int P { get; } }",
    ]);
    assert_eq!(codes(&output), vec![501, 501]);
}

#[test]
fn test_interface_member_modifiers() {
    let (_, output) = build_sources(&["interface I { public void M(); new void N(); }"]);
    assert_eq!(codes(&output), vec![106]);
}

// ============================================================================
// Order independence
// ============================================================================

const PARTS: &[&str] = &[
    "namespace N { public partial class A : B { int x; void M(int a) {} class Inner {} } }",
    "namespace N { partial class A : I, J { void M(string s) {} partial void P(); } }",
    "namespace N { partial class A { void M(int b) {} partial void P() {} class Inner {} } class B {} }",
    "namespace N { interface I {} interface J {} partial class A : I { } }",
];

fn summary(output: &BuildOutput) -> (String, Vec<u32>) {
    (output.graph.dump(), codes(output))
}

#[test]
fn test_cancellation_token_unset_builds_normally() {
    let trees = parse_all(PARTS);
    let token = rsharp_core::CancellationToken::new();
    let output = SemanticBuilder::new(&trees).with_cancellation(token).build().unwrap();
    assert_eq!(summary(&output), summary(&build(&trees)));
}

proptest! {
    #[test]
    fn prop_merge_is_order_independent(order in Just((0..PARTS.len()).collect::<Vec<_>>()).prop_shuffle()) {
        let trees = parse_all(PARTS);
        let expected = summary(&build(&trees));

        let collected = collect_all(&trees);
        let shuffled = order.iter().map(|&i| collected[i].clone()).collect();
        let output = SemanticBuilder::new(&trees).merge(shuffled).unwrap();
        prop_assert_eq!(summary(&output), expected);
    }
}
