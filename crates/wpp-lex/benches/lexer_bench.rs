//! Lexer benchmarks.
//!
//! Run with: `cargo bench --package wpp-lex`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wpp_lex::{Lexer, Mode, TokenKind};
use wpp_util::FileId;

fn token_count(source: &[u8]) -> usize {
    let mut lexer = Lexer::new(source, FileId(0));
    let mut count = 0;
    loop {
        match lexer.next(Mode::Normal) {
            Ok(token) if token.kind == TokenKind::Eof => break,
            Ok(_) => count += 1,
            Err(_) => break,
        }
    }
    count
}

fn bench_lexer_simple(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let source: &[u8] = b"let greet(name) prefix(name) .. suffix  greet(other)";
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("simple_let", |b| {
        b.iter(|| token_count(black_box(b"let x y")))
    });

    group.bench_function("definition_and_call", |b| {
        b.iter(|| token_count(black_box(source)))
    });

    group.finish();
}

fn bench_lexer_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_document");

    // A larger document with comments and nested blocks.
    let mut source = Vec::new();
    for i in 0..100 {
        source.extend_from_slice(b"#[ definition ] let item");
        source.extend_from_slice(i.to_string().as_bytes());
        source.extend_from_slice(b"(x, y) { var local x local .. y }\n");
    }
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("hundred_definitions", |b| {
        b.iter(|| token_count(black_box(&source)))
    });

    group.finish();
}

criterion_group!(benches, bench_lexer_simple, bench_lexer_document);
criterion_main!(benches);
