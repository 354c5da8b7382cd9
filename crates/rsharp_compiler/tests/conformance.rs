//! Corpus test harness.
//!
//! Runs the whole front end over every `.cs` file of an external corpus
//! and checks that nothing panics. Diagnostics are counted, not asserted:
//! corpus files may use language features outside the supported subset.
//!
//! Set `RSHARP_CORPUS_PATH` to a directory of C# sources to run it:
//!   RSHARP_CORPUS_PATH=/path/to/sources cargo test -p rsharp_compiler --test conformance
//!
//! Without this variable, the corpus test is skipped.

use rsharp_compiler::Program;
use rsharp_options::CompilerOptions;
use std::path::{Path, PathBuf};

fn corpus_path() -> Option<PathBuf> {
    std::env::var("RSHARP_CORPUS_PATH").ok().map(PathBuf::from)
}

fn collect_cs_files(dir: &Path, files: &mut Vec<PathBuf>, max_files: usize) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if files.len() >= max_files {
            return;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_cs_files(&path, files, max_files);
        } else if path.extension().is_some_and(|ext| ext == "cs") {
            files.push(path);
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Clean,
    Diagnostics(usize),
    Failed(String),
    Panicked(String),
}

fn run_file(path: &Path) -> Outcome {
    let result = std::panic::catch_unwind(|| {
        let mut program = Program::new(CompilerOptions::default()).with_root_files([path.to_path_buf()]);
        program.load_root_files()?;
        program.compile()
    });
    match result {
        Ok(Ok(compilation)) if compilation.diagnostics.is_empty() => Outcome::Clean,
        Ok(Ok(compilation)) => Outcome::Diagnostics(compilation.diagnostics.len()),
        Ok(Err(error)) => Outcome::Failed(error.to_string()),
        Err(panic) => Outcome::Panicked(
            panic
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown panic".to_string()),
        ),
    }
}

#[test]
fn test_corpus() {
    let Some(root) = corpus_path() else {
        eprintln!("Skipping corpus test: RSHARP_CORPUS_PATH not set.");
        return;
    };
    let max_files = std::env::var("RSHARP_CORPUS_MAX_FILES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(500);

    let mut files = Vec::new();
    collect_cs_files(&root, &mut files, max_files);
    if files.is_empty() {
        eprintln!("No .cs files found in {root:?}");
        return;
    }

    let (mut clean, mut with_diagnostics, mut panics) = (0, 0, Vec::new());
    for file in &files {
        match run_file(file) {
            Outcome::Clean => clean += 1,
            Outcome::Diagnostics(_) | Outcome::Failed(_) => with_diagnostics += 1,
            Outcome::Panicked(message) => panics.push((file.clone(), message)),
        }
    }

    println!("\n=== Corpus Results ===");
    println!("Files:            {}", files.len());
    println!("Clean:            {clean}");
    println!("With diagnostics: {with_diagnostics}");
    println!("Panics:           {}", panics.len());
    for (file, message) in panics.iter().take(10) {
        println!("  {file:?}: {}", &message[..message.len().min(100)]);
    }
    assert!(panics.is_empty(), "the front end panicked on {} corpus files", panics.len());
}

// ============================================================================
// Built-in Samples (always run)
// ============================================================================

fn compile_clean(samples: &[&str]) {
    for sample in samples {
        let mut program = Program::new(CompilerOptions::default());
        program.add_source("sample.cs", *sample);
        let compilation = program.compile().unwrap();
        assert!(
            compilation.diagnostics.is_empty(),
            "diagnostics for {sample}: {:?}",
            compilation.diagnostics.diagnostics()
        );
    }
}

#[test]
fn test_type_declaration_samples() {
    compile_clean(&[
        "class A {}",
        "public sealed class B : System.Exception {}",
        "abstract class C { public abstract void M(); protected virtual int P { get { return 0; } } }",
        "struct S { public int X; public S(int x) { X = x; } }",
        "interface I<in T, out U> { U Convert(T value); }",
        "enum E : byte { A = 1, B, C = A | B }",
        "delegate void Handler(object sender, System.EventArgs e);",
        "static class Ext { public static int Twice(this int x) { return x * 2; } }",
        "class G<T> where T : class, new() { T Make() { return new T(); } }",
    ]);
}

#[test]
fn test_member_samples() {
    compile_clean(&[
        "class C { const int N = 3; static readonly string[] Names = { \"a\", \"b\" }; }",
        "class C { int this[int i] { get { return i; } set { } } }",
        "class C { public static C operator +(C a, C b) { return a; } public static implicit operator int(C c) { return 0; } }",
        "class C { event System.EventHandler Changed { add { } remove { } } }",
        "class C { ~C() { } static C() { } }",
    ]);
}

#[test]
fn test_statement_and_expression_samples() {
    compile_clean(&[
        "class C { void M(int[] xs) { foreach (var x in xs) { if (x > 0) continue; else break; } } }",
        "class C { int M(object o) { switch (o as string) { case \"a\": return 1; default: return 0; } } }",
        "class C { void M() { try { throw new System.Exception(); } catch (System.Exception e) { } finally { } } }",
        "class C { void M() { System.Func<int, int> f = x => x + 1; var g = (int)f(2); } }",
        "class C { void M() { using (var d = (System.IDisposable)null) { lock (this) { } } } }",
        "using System.Linq; class C { void M(int[] xs) { var q = from x in xs where x > 1 orderby x descending select x * 2; } }",
        "class C { unsafe void M(int* p) { int v = *p; fixed (int* q = &v) { } } }",
    ]);
}
