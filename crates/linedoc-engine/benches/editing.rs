use criterion::{Criterion, criterion_group, criterion_main};
use linedoc_engine::{CaretPosition, Document};
use std::hint::black_box;
mod common;

fn bench_document_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_creation");
    group.sample_size(20);

    let content = common::generate_script(500);
    group.bench_function("from_text", |b| {
        b.iter(|| {
            let doc = Document::from_text(black_box(&content));
            black_box(doc);
        });
    });

    group.finish();
}

fn bench_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("edits");
    group.sample_size(20);

    let content = common::generate_script(500);

    group.bench_function("insert_with_anchors", |b| {
        let mut doc = Document::from_text(&content);
        common::anchor_every_input(&mut doc);
        b.iter(|| {
            doc.insert(black_box(CaretPosition::new(1, 0)), " ");
            doc.undo();
        });
    });

    group.bench_function("split_line_with_anchors", |b| {
        let mut doc = Document::from_text(&content);
        common::anchor_every_input(&mut doc);
        b.iter(|| {
            doc.insert(black_box(CaretPosition::new(1, 5)), "\n  1,X");
            doc.undo();
        });
    });

    group.bench_function("text", |b| {
        let doc = Document::from_text(&content);
        b.iter(|| black_box(doc.text()));
    });

    group.finish();
}

criterion_group!(benches, bench_document_creation, bench_edits);
criterion_main!(benches);
