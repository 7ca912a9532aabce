#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use std::io;

use docencode::{Boundary, CopyEncoder, Document, DocumentEncoder, EncoderFlags, Range, Selection};

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates an article with `sections` headed sections of formatted text.
fn make_article(sections: usize) -> String {
    let mut html = String::from("<body>");
    for i in 0..sections {
        let _ = write!(
            html,
            "<section id=\"s{i}\"><h2>Section {i}</h2>\
             <p>Some <b>bold</b> and <i>italic</i> text with a <a href=\"/p/{i}\">link</a>.</p>\
             <ul><li>one</li><li>two</li><li>three</li></ul></section>"
        );
    }
    html.push_str("</body>");
    html
}

/// Generates a table with `rows` rows of three cells.
fn make_table(rows: usize) -> String {
    let mut html = String::from("<table id=\"t\"><tbody>");
    for i in 0..rows {
        let _ = write!(
            html,
            "<tr id=\"r{i}\"><td>{i}</td><td>name {i}</td><td>{}</td></tr>",
            i * 7
        );
    }
    html.push_str("</tbody></table>");
    html
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_encode_document_html(c: &mut Criterion) {
    let doc = Document::parse_html(&make_article(200)).expect("failed to parse article");
    c.bench_function("encode_document_html", |b| {
        b.iter(|| {
            let mut encoder = DocumentEncoder::new();
            encoder.init(black_box(&doc), "text/html", EncoderFlags::empty());
            encoder.encode().expect("encode failed")
        });
    });
}

fn bench_encode_document_text(c: &mut Criterion) {
    let doc = Document::parse_html(&make_article(200)).expect("failed to parse article");
    c.bench_function("encode_document_text", |b| {
        b.iter(|| {
            let mut encoder = DocumentEncoder::new();
            encoder.init(black_box(&doc), "text/plain", EncoderFlags::OUTPUT_WRAP);
            encoder.encode().expect("encode failed")
        });
    });
}

fn bench_encode_range(c: &mut Criterion) {
    let doc = Document::parse_html(&make_article(200)).expect("failed to parse article");
    let start = doc.element_by_id("s10").expect("missing s10");
    let end = doc.element_by_id("s150").expect("missing s150");
    let range = Range::new(Boundary::new(start, 1), Boundary::new(end, 1));
    c.bench_function("encode_range", |b| {
        b.iter(|| {
            let mut encoder = DocumentEncoder::new();
            encoder.init(&doc, "text/html", EncoderFlags::empty());
            encoder.set_range(black_box(range));
            encoder.encode().expect("encode failed")
        });
    });
}

fn bench_stream_to_sink(c: &mut Criterion) {
    let doc = Document::parse_html(&make_article(500)).expect("failed to parse article");
    c.bench_function("stream_windows_1252", |b| {
        b.iter(|| {
            let mut encoder = DocumentEncoder::new();
            encoder.init(&doc, "text/html", EncoderFlags::empty());
            encoder.set_charset("windows-1252").expect("charset");
            encoder.encode_to_stream(&mut io::sink()).expect("stream failed");
        });
    });
}

fn bench_copy_table_rows(c: &mut Criterion) {
    let doc = Document::parse_html(&make_table(300)).expect("failed to parse table");
    let selection: Selection = (0..300)
        .filter_map(|i| doc.element_by_id(&format!("r{i}")))
        .map(|row| Range::select_node_contents(&doc, row))
        .collect();
    c.bench_function("copy_table_rows", |b| {
        b.iter(|| {
            let mut encoder = CopyEncoder::new();
            encoder.init(&doc, "text/html", EncoderFlags::empty());
            encoder.set_selection(black_box(&selection)).expect("promotion failed");
            encoder.encode_with_context().expect("encode failed")
        });
    });
}

criterion_group!(documents, bench_encode_document_html, bench_encode_document_text);

criterion_group!(ranges, bench_encode_range, bench_copy_table_rows);

criterion_group!(streaming, bench_stream_to_sink);

criterion_main!(documents, ranges, streaming);
