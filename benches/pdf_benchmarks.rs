// Performance benchmarks for page reorganization
//
// Run benchmarks with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, Stream};
use pdfreorg::editor::SequenceEditor;
use pdfreorg::export::ExportPipeline;
use pdfreorg::i18n::Locale;
use pdfreorg::pdf::PdfDocument;
use pdfreorg::ports::{DocumentWriter, SourceBytes};
use pdfreorg::writer::PdfWriter;

fn editor_with(pages: usize) -> SequenceEditor {
    let mut editor = SequenceEditor::new(pages, Locale::En);
    for i in 0..pages {
        editor.append_original(i, RgbaImage::new(1, 1)).unwrap();
    }
    editor
}

fn document_with(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for i in 0..pages {
        let text = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), text.into_bytes()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(pages as i64)),
            ("Kids", Object::Array(kids)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ]),
            ),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Benchmark relabeling after an edit
fn bench_renumber(c: &mut Criterion) {
    let mut group = c.benchmark_group("renumber");
    for pages in [10, 100, 500] {
        let mut editor = editor_with(pages);
        group.bench_with_input(BenchmarkId::from_parameter(pages), &pages, |b, _| {
            b.iter(|| editor.renumber())
        });
    }
    group.finish();
}

/// Benchmark a full reversal of the sequence
fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder");
    for pages in [10, 100, 500] {
        let mut editor = editor_with(pages);
        let mut order = editor.sequence().ids();
        order.reverse();
        group.bench_with_input(BenchmarkId::from_parameter(pages), &pages, |b, _| {
            b.iter(|| editor.reorder(black_box(&order)).unwrap())
        });
    }
    group.finish();
}

/// Benchmark parsing an upload into page geometry
fn bench_parse(c: &mut Criterion) {
    let bytes = document_with(50);
    c.bench_function("parse_50_pages", |b| {
        b.iter(|| PdfDocument::load_from_bytes(black_box(&bytes)).unwrap())
    });
}

/// Benchmark export of a reversed document with blank pages interleaved
fn bench_export(c: &mut Criterion) {
    let writer = PdfWriter::new();
    let mut group = c.benchmark_group("export");
    for pages in [10, 50] {
        let source = writer.open(&SourceBytes::new(document_with(pages))).unwrap();
        let mut editor = editor_with(pages);
        let mut order = editor.sequence().ids();
        order.reverse();
        editor.reorder(&order).unwrap();
        for id in order.iter().step_by(5) {
            editor.insert_blank(Some(*id)).unwrap();
        }
        let pipeline = ExportPipeline::new(&writer);
        group.bench_with_input(BenchmarkId::from_parameter(pages), &pages, |b, _| {
            b.iter(|| pipeline.run(editor.sequence(), &source).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_renumber, bench_reorder, bench_parse, bench_export);
criterion_main!(benches);
