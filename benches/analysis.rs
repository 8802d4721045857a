//! Benchmarks for the ownership analyses.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use zenc_lib::Compiler;

/// A translation unit with many functions, each exercising scoped borrows
/// and control-flow forks.
fn synthetic_source(functions: usize) -> String {
    let mut source = String::from("struct S { f: int }\n");
    for i in 0..functions {
        source.push_str(&format!(
            "fn worker_{i}() {{\n\
             let mut x: int = 0;\n\
             {{ let r: &mut int = &mut x; *r = {i}; }}\n\
             let s: S = make();\n\
             if cond {{ consume(s); }} else {{ keep(); }}\n\
             for (let j: int = 0; j < 8; j = j + 1) {{ emit(j); }}\n\
             }}\n"
        ));
    }
    source
}

fn bench_check(c: &mut Criterion) {
    let source = synthetic_source(64);
    let compiler = Compiler::new();

    c.bench_function("check_64_functions", |b| {
        b.iter(|| {
            let report = compiler
                .check_string("bench.zen", black_box(&source))
                .unwrap();
            black_box(report.summary)
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let source = synthetic_source(64);
    let compiler = Compiler::new();

    c.bench_function("parse_64_functions", |b| {
        b.iter(|| black_box(compiler.parse_source(black_box(&source)).unwrap()))
    });
}

criterion_group!(benches, bench_check, bench_parse);
criterion_main!(benches);
