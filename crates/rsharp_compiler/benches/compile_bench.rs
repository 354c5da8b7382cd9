//! Benchmark harness for the rsharp front end.
//!
//! Run with: cargo bench -p rsharp_compiler

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rsharp_compiler::Program;
use rsharp_options::CompilerOptions;
use rsharp_parser::parse_text;
use rsharp_resolver::{core_library, resolve, ExternalScope};
use rsharp_semantic::build;
use std::sync::Arc;

const MEDIUM_SOURCE: &str = r#"
using System;
using System.Collections.Generic;

namespace Inventory
{
    public interface IStock<T> { int Count(T item); void Put(T item, int amount); }

    public partial class Warehouse : IStock<string>
    {
        private readonly Dictionary<string, int> counts = new Dictionary<string, int>();

        public int Count(string item)
        {
            int value;
            return counts.TryGetValue(item, out value) ? value : 0;
        }

        public void Put(string item, int amount)
        {
            counts[item] = Count(item) + amount;
        }
    }

    public partial class Warehouse
    {
        public IEnumerable<string> Items { get { return counts.Keys; } }
        public event EventHandler Changed;
    }

    public struct Shelf { public int Row; public int Column; }
    public enum Zone { Cold, Dry, Bulk }
}
"#;

/// `classes` classes of `members` methods each, spread over namespaces.
fn generate_source(classes: usize, members: usize) -> String {
    let mut out = String::from("using System;\nusing System.Collections.Generic;\n");
    for c in 0..classes {
        out.push_str(&format!("namespace Generated.N{} {{\n  public class C{c} {{\n", c % 8));
        for m in 0..members {
            out.push_str(&format!(
                "    public List<int> M{m}(int a, string b) {{ var r = new List<int>(); r.Add(a + {m}); return r; }}\n"
            ));
        }
        out.push_str("  }\n}\n");
    }
    out
}

fn core() -> Vec<Arc<dyn ExternalScope>> {
    vec![Arc::new(core_library())]
}

// ============================================================================
// Phase Benchmarks
// ============================================================================

fn bench_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("phases");
    let large = generate_source(40, 20);

    group.bench_function("parse_large", |b| {
        b.iter(|| parse_text("bench.cs", black_box(&large), std::iter::empty::<&str>()).unwrap());
    });

    let trees = vec![parse_text("bench.cs", &large, std::iter::empty::<&str>()).unwrap().tree];
    group.bench_function("build_large", |b| {
        b.iter(|| build(black_box(&trees)));
    });

    let externals = core();
    group.bench_function("build_and_resolve_large", |b| {
        b.iter(|| {
            let mut graph = build(&trees).graph;
            resolve(black_box(&trees), &mut graph, &externals)
        });
    });

    group.finish();
}

// ============================================================================
// Program Benchmarks
// ============================================================================

fn bench_program_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("program_compile");

    group.bench_function("single_file", |b| {
        b.iter(|| {
            let mut program = Program::new(CompilerOptions::default());
            program.add_source("bench.cs", MEDIUM_SOURCE);
            black_box(program.compile().unwrap())
        });
    });

    for files in [1, 8, 32] {
        group.bench_with_input(BenchmarkId::new("parallel_files", files), &files, |b, &files| {
            b.iter(|| {
                let mut program = Program::new(CompilerOptions::default());
                for i in 0..files {
                    program.add_source(format!("file_{i}.cs"), MEDIUM_SOURCE.replace("Inventory", &format!("Inventory{i}")));
                }
                black_box(program.compile().unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_phases, bench_program_compile);
criterion_main!(benches);
