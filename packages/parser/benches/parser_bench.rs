use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cpacs_parser::{parse, serialize};

fn generated_document(wings: usize, sections: usize) -> String {
    let mut source = String::from("<cpacs><vehicles><aircraft><model uID=\"M\"><wings>");
    for w in 0..wings {
        source.push_str(&format!("<wing uID=\"W{}\"><name>wing {}</name><sections>", w, w));
        for s in 0..sections {
            source.push_str(&format!(
                "<section uID=\"W{w}S{s}\"><name>S{s}</name><elements><element uID=\"W{w}S{s}E\"><airfoilUID>NACA0012</airfoilUID></element></elements></section>"
            ));
        }
        source.push_str("</sections></wing>");
    }
    source.push_str("</wings></model></aircraft></vehicles></cpacs>");
    source
}

fn parse_small_document(c: &mut Criterion) {
    let source = generated_document(2, 4);
    c.bench_function("parse_small_document", |b| b.iter(|| parse(black_box(&source))));
}

fn parse_large_document(c: &mut Criterion) {
    let source = generated_document(20, 50);
    c.bench_function("parse_large_document", |b| b.iter(|| parse(black_box(&source))));
}

fn serialize_large_document(c: &mut Criterion) {
    let doc = parse(&generated_document(20, 50)).unwrap();
    c.bench_function("serialize_large_document", |b| b.iter(|| serialize(black_box(&doc))));
}

criterion_group!(
    benches,
    parse_small_document,
    parse_large_document,
    serialize_large_document
);
criterion_main!(benches);
