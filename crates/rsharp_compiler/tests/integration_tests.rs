//! Compiler integration tests.
//!
//! End-to-end tests for the compilation pipeline: parse -> build ->
//! declare -> resolve, plus project files and referenced projects.

use rsharp_compiler::{CompileError, Compilation, Program};
use rsharp_core::CancellationToken;
use rsharp_options::CompilerOptions;
use std::path::{Path, PathBuf};

/// Helper: compile sources named `file0.cs`, `file1.cs`, ...
fn compile_with(sources: &[&str], options: CompilerOptions) -> Compilation {
    let mut program = Program::new(options);
    for (i, source) in sources.iter().enumerate() {
        program.add_source(format!("file{i}.cs"), *source);
    }
    program.compile().unwrap()
}

fn compile(sources: &[&str]) -> Compilation {
    compile_with(sources, CompilerOptions::default())
}

fn codes(compilation: &Compilation) -> Vec<u32> {
    compilation.diagnostics.diagnostics().iter().map(|d| d.code).collect()
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

// ============================================================================
// Basic Compilation
// ============================================================================

#[test]
fn test_compile_empty_file() {
    let compilation = compile(&[""]);
    assert!(compilation.succeeded());
    assert_eq!(compilation.trees.len(), 1);
}

#[test]
fn test_compile_small_program() {
    let compilation = compile(&[r#"
        using System;
        using System.Collections.Generic;

        namespace Shop
        {
            public interface IPriced { decimal Price { get; } }

            public class Item : IPriced
            {
                private readonly List<string> tags = new List<string>();
                public decimal Price { get; private set; }
                public Item(decimal price) { Price = price; }
                public IEnumerable<string> Tags { get { return tags; } }
                public override string ToString() { return "Item " + Price; }
            }
        }
    "#]);
    assert!(compilation.succeeded(), "{:?}", compilation.diagnostics.diagnostics());
    assert!(compilation.graph.find_type("Shop.Item").is_some());
}

#[test]
fn test_trees_keep_source_order() {
    let compilation = compile(&["class A {}", "class B {}", "class C {}"]);
    let names: Vec<&str> = compilation.trees.iter().map(|t| t.file_name.as_str()).collect();
    assert_eq!(names, vec!["file0.cs", "file1.cs", "file2.cs"]);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_preprocessor_grouping_selects_else_branch() {
    let compilation = compile(&["#if true || false && false\nclass A {}\n#else\nclass B {}\n#endif\n"]);
    assert!(compilation.succeeded());
    assert!(compilation.graph.find_type("A").is_none());
    assert!(compilation.graph.find_type("B").is_some());
}

#[test]
fn test_defines_reach_every_file() {
    let options = CompilerOptions {
        defines: vec!["FEATURE".into()],
        ..Default::default()
    };
    let compilation = compile_with(&["#if FEATURE\nclass A {}\n#endif\n", "#if !FEATURE\nclass B {}\n#endif\n"], options);
    assert!(compilation.graph.find_type("A").is_some());
    assert!(compilation.graph.find_type("B").is_none());
}

#[test]
fn test_partial_class_same_base() {
    let compilation = compile(&["partial class A : B {}", "partial class A : B {} class B {}"]);
    assert!(compilation.succeeded());
    let graph = &compilation.graph;
    let a = graph.entity(graph.find_type("A").unwrap());
    let base = graph.type_ref(a.base_type.unwrap());
    assert_eq!(graph.target_name(base.state.target().unwrap()), "B");
}

#[test]
fn test_partial_class_conflicting_bases() {
    let compilation = compile(&["partial class A : B {}", "partial class A : C {} class B {} class C {}"]);
    assert_eq!(codes(&compilation), vec![263]);
    assert!(!compilation.succeeded());
}

#[test]
fn test_nested_type_named_like_container() {
    let compilation = compile(&["class A { class A { } }"]);
    assert_eq!(codes(&compilation), vec![542]);
}

#[test]
fn test_unresolved_type_with_dependent_expression() {
    let compilation = compile(&["class C { Foo x; void M() { x.Bar(); } }"]);
    assert_eq!(codes(&compilation), vec![246]);
    let diagnostic = &compilation.diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.file(), Some("file0.cs"));
    assert!(diagnostic.message_text.contains("'Foo'"));
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_diagnostics_sorted_by_file_and_position() {
    let compilation = compile(&["class A { Y y; X x; }", "class B { Z z; W w; }"]);
    let located: Vec<(String, u32)> = compilation
        .diagnostics
        .diagnostics()
        .iter()
        .map(|d| {
            let location = d.location.as_ref().unwrap();
            (location.file.clone(), location.span.start)
        })
        .collect();
    let mut sorted = located.clone();
    sorted.sort();
    assert_eq!(located, sorted);
    assert_eq!(located.len(), 4);
}

#[test]
fn test_warnings_do_not_fail_unless_promoted() {
    let source = "using System; using System; class C {}";
    let compilation = compile(&[source]);
    assert_eq!(codes(&compilation), vec![105]);
    assert!(compilation.succeeded());

    let options = CompilerOptions {
        warnings_as_errors: true,
        ..Default::default()
    };
    assert!(!compile_with(&[source], options).succeeded());
}

#[test]
fn test_no_std_lib_hides_system() {
    let options = CompilerOptions {
        no_std_lib: true,
        ..Default::default()
    };
    let compilation = compile_with(&["using System; class C {}"], options);
    assert_eq!(codes(&compilation), vec![246]);
}

// ============================================================================
// Sources and references
// ============================================================================

#[test]
fn test_source_bytes_with_byte_order_mark() {
    let mut program = Program::new(CompilerOptions::default());
    program.add_source_bytes("bom.cs", b"\xEF\xBB\xBFclass A {}".to_vec());
    assert_eq!(program.source_count(), 1);
    let compilation = program.compile().unwrap();
    assert!(compilation.succeeded());
    assert!(compilation.graph.find_type("A").is_some());
}

#[test]
fn test_malformed_byte_order_mark_fails_only_that_file() {
    let mut program = Program::new(CompilerOptions::default());
    program.add_source_bytes("bad.cs", vec![0xEF, 0xBB, 0x41]);
    program.add_source("good.cs", "class A {}");
    let compilation = program.compile().unwrap();
    assert_eq!(codes(&compilation), vec![2001]);
    assert!(!compilation.succeeded());
    assert_eq!(compilation.trees.len(), 1);
    assert!(compilation.graph.find_type("A").is_some());
}

#[test]
fn test_missing_root_file() {
    let mut program = Program::new(CompilerOptions::default()).with_root_files([PathBuf::from("/nonexistent/a.cs")]);
    assert!(matches!(program.load_root_files(), Err(CompileError::Io { .. })));
}

#[test]
fn test_assembly_manifest_reference() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "acme.json",
        r#"{ "name": "Acme", "types": [ { "namespace": "Acme.Parts", "name": "Gear", "arity": 1, "kind": "class" } ] }"#,
    );
    let options = CompilerOptions {
        references: vec![dir.path().join("acme.json").to_string_lossy().into_owned()],
        ..Default::default()
    };
    let compilation = compile_with(&["using Acme.Parts; class C { Gear<int> g; }"], options);
    assert!(compilation.succeeded(), "{:?}", compilation.diagnostics.diagnostics());
}

#[test]
fn test_unreadable_manifest_is_skipped() {
    let options = CompilerOptions {
        references: vec!["/nonexistent/manifest.json".into()],
        ..Default::default()
    };
    assert!(compile_with(&["class C {}"], options).succeeded());
}

#[test]
fn test_project_with_referenced_project() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "shared/rsharp.json", r#"{ "files": ["Shared.cs"] }"#);
    write(dir.path(), "shared/Shared.cs", "namespace Shared { public class Service {} }");
    write(
        dir.path(),
        "app/rsharp.json",
        r#"{ "compilerOptions": { "defines": ["APP"] }, "files": ["src/Main.cs"], "references": ["../shared"] }"#,
    );
    write(
        dir.path(),
        "app/src/Main.cs",
        "using Shared;\n#if APP\nclass Main { Service service; }\n#endif\n",
    );

    let mut program = Program::from_project(&dir.path().join("app"), &CompilerOptions::default()).unwrap();
    assert_eq!(program.options.defines, vec!["APP"]);
    program.load_root_files().unwrap();
    let compilation = program.compile().unwrap();
    assert!(compilation.succeeded(), "{:?}", compilation.diagnostics.diagnostics());
    assert!(compilation.graph.find_type("Main").is_some());
}

#[test]
fn test_circular_project_references() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a/rsharp.json", r#"{ "references": ["../b"] }"#);
    write(dir.path(), "b/rsharp.json", r#"{ "references": ["../a"] }"#);
    let result = Program::from_project(&dir.path().join("a"), &CompilerOptions::default());
    assert!(matches!(result, Err(CompileError::Config(_))));
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancelled_compilation() {
    let token = CancellationToken::new();
    token.cancel();
    let mut program = Program::new(CompilerOptions::default()).with_cancellation(token);
    program.add_source("a.cs", "class A {}");
    assert!(matches!(program.compile(), Err(CompileError::Cancelled(_))));
}

#[test]
fn test_nested_expression_parses_on_worker_threads() {
    let depth = 120;
    let expression = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let source = format!("class C {{ int x = {expression}; }}");
    let compilation = compile(&[&source]);
    assert!(compilation.succeeded());
}
