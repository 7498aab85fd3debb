//! Benchmarks du lexer Sable (Criterion).
//!
//! Corpus synthétique : affectations, nombres par radix, chaînes et
//! commentaires, à 64/512/2048 instructions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sable_benches::synthetic_source;
use sable_core::diag::Diagnostics;
use sable_lexer::Lexer;
use sable_source::SourceBuffer;

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    for statements in [64usize, 512, 2048] {
        let source = synthetic_source(statements);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(statements),
            &source,
            |b, source| {
                b.iter(|| {
                    let mut r = Diagnostics::new();
                    let buffer = SourceBuffer::load(&mut r, source).expect("chargement");
                    let mut lexer = Lexer::new(&buffer);
                    let tokens = lexer.tokenize(&mut r).expect("tokenisation");
                    black_box(tokens.len())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);
