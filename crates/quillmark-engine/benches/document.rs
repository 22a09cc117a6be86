use criterion::{Criterion, criterion_group, criterion_main};
use quillmark_engine::render::render_blocks;
use quillmark_engine::serialize::raw;
use std::hint::black_box;
mod common;

fn bench_document_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_queries");
    group.sample_size(20);

    let doc = common::generate_document(100);
    let last_block = doc.leaf_blocks().last().map(|b| b.key).unwrap();
    let last_text = doc.texts().last().map(|t| t.key).unwrap();

    group.bench_function("path_to_last_block", |b| {
        b.iter(|| {
            let path = doc.path_to(black_box(last_block));
            black_box(path);
        });
    });

    group.bench_function("closest_block", |b| {
        b.iter(|| {
            let block = doc.closest_block(black_box(last_text));
            black_box(block);
        });
    });

    group.bench_function("texts", |b| {
        b.iter(|| {
            let texts = doc.texts();
            black_box(texts);
        });
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    group.sample_size(20);

    let doc = common::generate_document(100);
    let json = raw::to_json_string(&doc).unwrap();

    group.bench_function("to_json_string", |b| {
        b.iter(|| {
            let out = raw::to_json_string(black_box(&doc)).unwrap();
            black_box(out);
        });
    });

    group.bench_function("from_json_str", |b| {
        b.iter(|| {
            let doc = raw::from_json_str(black_box(&json)).unwrap();
            black_box(doc);
        });
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(20);

    let doc = common::generate_document(100);

    group.bench_function("render_blocks", |b| {
        b.iter(|| {
            let blocks = render_blocks(black_box(&doc));
            black_box(blocks);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_document_queries,
    bench_serialization,
    bench_render
);
criterion_main!(benches);
